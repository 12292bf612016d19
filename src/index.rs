use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local};

/// A stored application. Never changed after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub input: String,
    pub amount: u64,
    pub timestamp: DateTime<Local>,
}

/// Append-only log of applications per article code.
///
/// Nothing is ever evicted, so memory grows with every ingested record for
/// as long as the process runs.
#[derive(Debug, Default)]
pub struct ApplicationIndex {
    by_article: RwLock<HashMap<String, Vec<ApplicationRecord>>>,
}

impl ApplicationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, article: &str, record: ApplicationRecord) {
        self.extend(article, std::iter::once(record));
    }

    /// Append several records for one article under a single write lock.
    pub fn extend<I>(&self, article: &str, records: I)
    where
        I: IntoIterator<Item = ApplicationRecord>,
    {
        let mut records = records.into_iter().peekable();
        if records.peek().is_none() {
            return;
        }
        let mut map = self.by_article.write().unwrap_or_else(PoisonError::into_inner);
        map.entry(article.to_string()).or_default().extend(records);
    }

    /// Snapshot of the records stored for `article`, in insertion order.
    pub fn get(&self, article: &str) -> Vec<ApplicationRecord> {
        let map = self.by_article.read().unwrap_or_else(PoisonError::into_inner);
        map.get(article).cloned().unwrap_or_default()
    }

    pub fn article_count(&self) -> usize {
        self.by_article
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn record_count(&self) -> usize {
        self.by_article
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}
