//! The scan itself: decrypt + score, reuse grouping, breach lookup.

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    tokio::sync::mpsc::UnboundedSender,
    toolbox_crypto::{envelope, hash},
    toolbox_password::strength,
    toolbox_store::{
        caches::{self, PWNED_PREFIX_TTL_SECS},
        db, entries, now_secs,
    },
    tracing::{info, warn},
    zeroize::Zeroizing,
};

use crate::{
    error::HealthError,
    pwned::{PwnedClient, parse_range_body},
    types::HealthItem,
};

/// Entries not updated for this many days count as stale.
const STALE_DAYS: i64 = 90;

/// Scores below this mark an entry weak.
const WEAK_SCORE: u8 = 40;

/// Progress tick: `value` of `total` units. The total grows once when the
/// breach phase adds its prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub value: usize,
    pub total: usize,
}

type HealthRow = (i64, i64, String, String, String, String, i64, Vec<u8>, Option<String>);

pub struct HealthAnalyzer {
    db_path: PathBuf,
    master_key: Zeroizing<[u8; 32]>,
    enable_pwned_check: bool,
    allow_network: bool,
    cancel: Arc<AtomicBool>,
}

impl HealthAnalyzer {
    pub fn new(
        db_path: PathBuf,
        master_key: Zeroizing<[u8; 32]>,
        enable_pwned_check: bool,
        allow_network: bool,
    ) -> Self {
        Self {
            db_path,
            master_key,
            enable_pwned_check,
            allow_network,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag checked at row and prefix boundaries. Cancelling
    /// returns the locally completed items instead of failing.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Scan the vault and return one [`HealthItem`] per entry reached,
    /// most recently updated first.
    pub async fn run(
        self,
        progress: UnboundedSender<Progress>,
    ) -> Result<Vec<HealthItem>, HealthError> {
        let pool = db::open_worker_pool(&self.db_path).await?;
        let mut conn = pool.acquire().await?;

        let total = entries::count(&mut conn).await?.max(0) as usize;
        let _ = progress.send(Progress { value: 0, total });

        let rows: Vec<HealthRow> = sqlx::query_as(
            "SELECT e.id, e.group_id, e.title, e.username, e.url, e.category,
                    e.updated_at, e.password_enc,
                    GROUP_CONCAT(t.name, ',') AS tags_csv
             FROM password_entries e
             LEFT JOIN entry_tags et ON et.entry_id = e.id
             LEFT JOIN tags t ON t.id = et.tag_id
             GROUP BY e.id
             ORDER BY e.updated_at DESC",
        )
        .fetch_all(&mut *conn)
        .await?;

        let now = now_secs();
        let mut items: Vec<HealthItem> = Vec::with_capacity(rows.len());
        let mut sha256s: Vec<Option<[u8; 32]>> = Vec::with_capacity(rows.len());
        let mut sha1s: Vec<Option<String>> = Vec::with_capacity(rows.len());

        // Phase 1: decrypt, score, hash.
        for (id, group_id, title, username, url, category, updated_at, password_enc, tags_csv) in
            rows
        {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }

            let days_since_update = if updated_at > 0 {
                ((now - updated_at) / 86_400).max(0)
            } else {
                0
            };

            let mut item = HealthItem {
                entry_id: id,
                group_id,
                title,
                username,
                url,
                category,
                tags: split_tags_csv(tags_csv.as_deref()),
                updated_at,
                days_since_update,
                stale: days_since_update >= STALE_DAYS,
                ..HealthItem::default()
            };

            match envelope::open(self.master_key.as_slice(), &password_enc) {
                None => {
                    item.corrupted = true;
                    item.strength_score = 0;
                    item.weak = true;
                    sha256s.push(None);
                    sha1s.push(None);
                },
                Some(plain) => {
                    let password = String::from_utf8_lossy(&plain);
                    let evaluated = strength::evaluate(&password);
                    item.strength_score = evaluated.score;
                    item.weak = evaluated.score < WEAK_SCORE;
                    sha256s.push(Some(hash::sha256(&plain)));
                    sha1s.push(Some(hash::sha1_hex_upper(&plain)));
                },
            }

            items.push(item);
            let _ = progress.send(Progress {
                value: items.len(),
                total,
            });
        }

        // Phase 2: reuse classes over the non-corrupted entries.
        let mut counts: HashMap<[u8; 32], usize> = HashMap::new();
        for digest in sha256s.iter().flatten() {
            *counts.entry(*digest).or_insert(0) += 1;
        }
        for (item, digest) in items.iter_mut().zip(&sha256s) {
            if let Some(digest) = digest
                && let Some(&count) = counts.get(digest)
                && count >= 2
            {
                item.reused = true;
                item.reuse_count = count;
            }
        }

        // Phase 3: breach lookup, prefix by prefix.
        if self.enable_pwned_check && !self.cancel.load(Ordering::Relaxed) {
            let scanned = items.len();
            let mut prefixes: BTreeMap<String, Vec<usize>> = BTreeMap::new();
            for (index, sha1) in sha1s.iter().enumerate() {
                if let Some(hex) = sha1
                    && hex.len() == 40
                {
                    prefixes.entry(hex[..5].to_string()).or_default().push(index);
                }
            }

            if !prefixes.is_empty() {
                let extended_total = scanned + prefixes.len();
                let _ = progress.send(Progress {
                    value: scanned,
                    total: extended_total,
                });

                let client = if self.allow_network {
                    match PwnedClient::new() {
                        Ok(client) => Some(client),
                        Err(err) => {
                            warn!(%err, "breach client unavailable; cache only");
                            None
                        },
                    }
                } else {
                    None
                };

                let mut done = 0usize;
                for (prefix, indices) in &prefixes {
                    if self.cancel.load(Ordering::Relaxed) {
                        break;
                    }

                    let now = now_secs();
                    let mut body: Option<Vec<u8>> = None;

                    if let Some(cached) = caches::load_pwned_prefix(&mut conn, prefix).await? {
                        if caches::is_fresh(cached.fetched_at, now, PWNED_PREFIX_TTL_SECS) {
                            body = Some(cached.body);
                        }
                    }

                    if body.is_none()
                        && let Some(client) = &client
                    {
                        match client.fetch_range(prefix).await {
                            Ok(fetched) => {
                                caches::save_pwned_prefix(&mut conn, prefix, &fetched, now)
                                    .await?;
                                body = Some(fetched);
                            },
                            Err(err) => {
                                // Affected entries stay pwned_checked=false.
                                warn!(prefix, %err, "breach range fetch failed");
                            },
                        }
                    }

                    if let Some(body) = body {
                        let suffix_counts = parse_range_body(&body);
                        for &index in indices {
                            let Some(Some(hex)) = sha1s.get(index) else {
                                continue;
                            };
                            items[index].pwned_checked = true;

                            let suffix = hex[5..].to_uppercase();
                            if let Some(&count) = suffix_counts.get(suffix.as_str())
                                && count >= 1
                            {
                                items[index].pwned = true;
                                items[index].pwned_count = count;
                            }
                        }
                    }

                    done += 1;
                    let _ = progress.send(Progress {
                        value: scanned + done,
                        total: extended_total,
                    });
                }
            }
        }

        info!(items = items.len(), "health scan finished");
        Ok(items)
    }
}

fn split_tags_csv(tags_csv: Option<&str>) -> Vec<String> {
    tags_csv
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
