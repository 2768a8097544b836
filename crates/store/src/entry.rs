//! Entry models shared across the repository and workers.

/// The always-present root group.
pub const ROOT_GROUP_ID: i64 = 1;

/// Kind of credential a row holds. Stored as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    #[default]
    WebLogin,
    DesktopClient,
    ApiKeyToken,
    DatabaseCredential,
    ServerSsh,
    DeviceWifi,
}

impl EntryType {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::WebLogin => 0,
            Self::DesktopClient => 1,
            Self::ApiKeyToken => 2,
            Self::DatabaseCredential => 3,
            Self::ServerSsh => 4,
            Self::DeviceWifi => 5,
        }
    }

    /// Unknown discriminants fall back to [`EntryType::WebLogin`].
    pub fn from_i64(value: i64) -> Self {
        match value {
            1 => Self::DesktopClient,
            2 => Self::ApiKeyToken,
            3 => Self::DatabaseCredential,
            4 => Self::ServerSsh,
            5 => Self::DeviceWifi,
            _ => Self::WebLogin,
        }
    }
}

/// Non-secret entry fields. What listings return; secrets stay sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub group_id: i64,
    pub entry_type: EntryType,
    pub title: String,
    pub username: String,
    pub url: String,
    pub category: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<String>,
}

/// An entry together with its decrypted secrets. Exists only transiently
/// inside an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySecrets {
    pub entry: Entry,
    pub password: String,
    pub notes: String,
}

/// A raw row with sealed blobs, as read from `password_entries`.
#[derive(Debug, Clone)]
pub struct EntryRow {
    pub entry: Entry,
    pub password_enc: Vec<u8>,
    pub notes_enc: Vec<u8>,
}

/// Field set for inserting a row. Blobs are already sealed.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub group_id: i64,
    pub entry_type: EntryType,
    pub title: String,
    pub username: String,
    pub url: String,
    pub category: String,
    pub password_enc: Vec<u8>,
    pub notes_enc: Vec<u8>,
    pub created_at: i64,
    pub updated_at: i64,
}
