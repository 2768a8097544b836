//! Per-entry health findings.

/// One scanned entry with its flags. Secrets never appear here; the item
/// carries only what a findings table displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthItem {
    pub entry_id: i64,
    pub group_id: i64,
    pub title: String,
    pub username: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
    pub updated_at: i64,

    /// Strength score 0..=100; 0 when the password failed to decrypt.
    pub strength_score: u8,
    /// Score below the weak threshold, or the entry is corrupted.
    pub weak: bool,

    /// The sealed password failed its tag check.
    pub corrupted: bool,

    /// Password shared with at least one other entry.
    pub reused: bool,
    /// Size of the reuse group this entry belongs to.
    pub reuse_count: usize,

    pub days_since_update: i64,
    /// Last update at least 90 days ago.
    pub stale: bool,

    /// Found in the breach corpus.
    pub pwned: bool,
    /// Occurrence count reported by the breach corpus.
    pub pwned_count: i64,
    /// Whether a breach lookup actually resolved for this entry.
    pub pwned_checked: bool,
}
