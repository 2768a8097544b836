//! Source-format detection from the header row.

use crate::{
    error::CsvError,
    reader::{
        self, CATEGORY_ALIASES, PASSWORD_ALIASES, URL_ALIASES, USERNAME_ALIASES, header_index,
    },
};

/// Recognized export dialects, by their characteristic header sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    KeePassXc,
    Chrome,
    Toolbox,
    Unknown,
}

/// What a quick pre-import inspection reports to the caller.
#[derive(Debug, Clone)]
pub struct CsvInfo {
    pub delimiter: char,
    pub header: Vec<String>,
    pub format: CsvFormat,
    pub has_category_like_column: bool,
}

/// Inspect a CSV's header without materializing its rows.
pub fn detect(data: &[u8]) -> Result<CsvInfo, CsvError> {
    let text = reader::decode(data);
    let delimiter = reader::detect_delimiter(text.lines().next().unwrap_or_default());
    let table = reader::parse_table(&text, delimiter)?;
    let header = table.header;

    let has_password = header_index(&header, PASSWORD_ALIASES).is_some();
    let has_username = header_index(&header, USERNAME_ALIASES).is_some();
    let has_url = header_index(&header, URL_ALIASES).is_some();
    let has_title = header_index(&header, &["title"]).is_some();
    let has_name = header_index(&header, &["name"]).is_some();
    let has_group = header_index(&header, &["group"]).is_some();
    let has_category_like_column = header_index(&header, CATEGORY_ALIASES).is_some();

    let format = if has_group && has_title && has_username && has_password && has_url {
        CsvFormat::KeePassXc
    } else if has_name && has_username && has_password && has_url {
        CsvFormat::Chrome
    } else if has_title && has_password {
        CsvFormat::Toolbox
    } else {
        CsvFormat::Unknown
    };

    Ok(CsvInfo {
        delimiter,
        header,
        format,
        has_category_like_column,
    })
}
