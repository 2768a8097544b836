//! Delimiter sniffing, the quote state machine, and row filtering.

use toolbox_password::host_from_url;

use crate::error::CsvError;

pub(crate) const PASSWORD_ALIASES: &[&str] = &["password", "pass"];
pub(crate) const USERNAME_ALIASES: &[&str] = &["username", "user", "login", "login_username"];
pub(crate) const URL_ALIASES: &[&str] = &["url", "website", "origin", "formactionorigin"];
pub(crate) const TITLE_ALIASES: &[&str] = &["title", "name"];
pub(crate) const NOTES_ALIASES: &[&str] = &["notes", "note", "comment"];
pub(crate) const CATEGORY_ALIASES: &[&str] = &["category", "folder", "group"];
pub(crate) const TAGS_ALIASES: &[&str] = &["tags", "tag"];

/// One plaintext credential row from a CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRecord {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub category: String,
    pub notes: String,
    pub tags: Vec<String>,
}

/// Parsed rows plus the skip counters the import report surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvParseResult {
    pub entries: Vec<CsvRecord>,
    pub total_rows: usize,
    pub skipped_empty: usize,
    pub skipped_invalid: usize,
    pub warnings: Vec<String>,
}

pub(crate) struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Decode raw bytes as UTF-8 (tolerantly) and strip an optional BOM.
pub(crate) fn decode(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Pick the delimiter from the header line by character counts.
pub(crate) fn detect_delimiter(first_line: &str) -> char {
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    let tabs = first_line.matches('\t').count();

    if tabs >= commas && tabs >= semicolons && tabs > 0 {
        '\t'
    } else if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Two-state (in-quote / not-in-quote) record parser. `""` inside quotes
/// emits a literal quote; `\r` is ignored everywhere outside quotes.
pub(crate) fn parse_table(text: &str, delimiter: char) -> Result<Table, CsvError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        if ch == '"' {
            in_quotes = true;
        } else if ch == delimiter {
            row.push(std::mem::take(&mut field));
        } else if ch == '\n' {
            row.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut row));
        } else if ch != '\r' {
            field.push(ch);
        }
    }

    if in_quotes {
        return Err(CsvError::UnbalancedQuotes);
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(CsvError::MissingHeader);
    }

    let header = rows.remove(0);
    Ok(Table { header, rows })
}

/// Index of the first header cell matching any alias, case-insensitively.
pub(crate) fn header_index(header: &[String], aliases: &[&str]) -> Option<usize> {
    header.iter().position(|cell| {
        let cell = cell.trim().to_lowercase();
        aliases.contains(&cell.as_str())
    })
}

fn value_at(row: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Split a combined tag cell on ASCII and fullwidth separators.
fn split_tags(text: &str) -> Vec<String> {
    text.split([',', ';', '，', '；'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// A usable title for a row that came without one: the URL's host, or the
/// raw URL text when it does not parse.
fn derive_title(url: &str) -> String {
    if let Some(host) = host_from_url(url) {
        return host;
    }
    url.trim().to_string()
}

/// Parse a password CSV into records plus skip counters.
pub fn parse(data: &[u8]) -> Result<CsvParseResult, CsvError> {
    let text = decode(data);
    let delimiter = detect_delimiter(text.lines().next().unwrap_or_default());
    let table = parse_table(&text, delimiter)?;

    let password_idx =
        header_index(&table.header, PASSWORD_ALIASES).ok_or(CsvError::MissingPasswordColumn)?;
    let username_idx = header_index(&table.header, USERNAME_ALIASES);
    let url_idx = header_index(&table.header, URL_ALIASES);
    let title_idx = header_index(&table.header, TITLE_ALIASES);
    let notes_idx = header_index(&table.header, NOTES_ALIASES);
    let category_idx = header_index(&table.header, CATEGORY_ALIASES);
    let tags_idx = header_index(&table.header, TAGS_ALIASES);

    let mut result = CsvParseResult {
        total_rows: table.rows.len(),
        ..CsvParseResult::default()
    };

    for row in &table.rows {
        let mut record = CsvRecord {
            title: value_at(row, title_idx),
            username: value_at(row, username_idx),
            password: value_at(row, Some(password_idx)),
            url: value_at(row, url_idx),
            category: value_at(row, category_idx),
            notes: value_at(row, notes_idx),
            tags: split_tags(&value_at(row, tags_idx)),
        };

        if record.title.is_empty() {
            record.title = derive_title(&record.url);
        }

        if record.password.is_empty() {
            result.skipped_empty += 1;
            continue;
        }
        if record.title.is_empty() {
            result.skipped_invalid += 1;
            continue;
        }

        result.entries.push(record);
    }

    if title_idx.is_none() {
        result
            .warnings
            .push("csv has no title column; titles were derived from urls".to_string());
    }
    if url_idx.is_none() {
        result
            .warnings
            .push("csv has no url column; site matching will be unavailable".to_string());
    }

    Ok(result)
}
