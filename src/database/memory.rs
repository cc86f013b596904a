use log::info;
use parking_lot::Mutex;

use super::{ResponseRecord, ResponseStore, Result};

/// Process-local response table. Used by tests and by local runs without a
/// configured database; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<ResponseRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl ResponseStore for InMemoryStore {
    async fn insert(&self, record: &ResponseRecord) -> Result<()> {
        let mut rows = self.rows.lock();
        rows.push(record.clone());
        info!("Stored response {} in memory ({} total)", record.id, rows.len());
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<ResponseRecord>> {
        let mut rows = self.rows.lock().clone();
        // Insertion order breaks ties between equal timestamps.
        rows.reverse();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{Answers, FieldValue};
    use chrono::{Duration, Utc};

    fn record_at(email: &str, minutes_ago: i64) -> ResponseRecord {
        let mut record = ResponseRecord::new(
            [("email", FieldValue::from(email))].into_iter().collect::<Answers>(),
        );
        record.submitted_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    #[tokio::test]
    async fn test_query_all_is_newest_first() {
        let store = InMemoryStore::new();
        store.insert(&record_at("old@x.com", 30)).await.unwrap();
        store.insert(&record_at("new@x.com", 1)).await.unwrap();
        store.insert(&record_at("mid@x.com", 10)).await.unwrap();

        let emails: Vec<String> = store
            .query_all()
            .await
            .unwrap()
            .iter()
            .filter_map(|r| r.answers.text("email").map(String::from))
            .collect();

        assert_eq!(emails, vec!["new@x.com", "mid@x.com", "old@x.com"]);
        assert_eq!(store.len(), 3);
    }
}
