//! Escape-correct CSV export.
//!
//! Output is UTF-8 with a BOM and CRLF line endings in the fixed column
//! order `title,username,password,url,category,tags,notes` — the shape
//! spreadsheet apps and our own importer both accept unmodified.

use crate::reader::CsvRecord;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const HEADER: &str = "title,username,password,url,category,tags,notes";

/// Quote a field when it contains a delimiter, quote or line break;
/// inner quotes are doubled.
fn escape(value: &str) -> String {
    let needs_quotes = value.contains([',', '"', '\n', '\r']);
    let escaped = value.replace('"', "\"\"");
    if needs_quotes {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize records to CSV bytes.
pub fn export(records: &[CsvRecord]) -> Vec<u8> {
    let mut out = String::with_capacity(records.len() * 128 + HEADER.len());
    out.push_str(HEADER);
    out.push_str("\r\n");

    for record in records {
        let fields = [
            escape(&record.title),
            escape(&record.username),
            escape(&record.password),
            escape(&record.url),
            escape(&record.category),
            escape(&join_tags(&record.tags)),
            escape(&record.notes),
        ];
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }

    let mut bytes = Vec::with_capacity(BOM.len() + out.len());
    bytes.extend_from_slice(BOM);
    bytes.extend_from_slice(out.as_bytes());
    bytes
}
