use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StoreError;
use crate::survey::Answers;

/// A completed survey as it is persisted: the answers plus the id and
/// timestamp assigned at submission. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub answers: Answers,
}

impl ResponseRecord {
    pub fn new(answers: Answers) -> Self {
        Self {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            answers,
        }
    }
}

/// Flat table row shared by the PostgreSQL and REST backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub height: Option<i64>,
    pub weight: Option<i64>,
    pub preference_1: Option<String>,
    pub preference_2: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub raw_answers: serde_json::Value,
}

impl ResponseRow {
    pub fn from_record(record: &ResponseRecord) -> std::result::Result<Self, StoreError> {
        let text = |key: &str| record.answers.get(key).map(|value| value.to_string());
        let integer = |key: &str| record.answers.integer(key);

        let raw_answers = serde_json::to_value(&record.answers)
            .map_err(|e| StoreError::Decode(format!("Failed to encode answers: {}", e)))?;

        Ok(ResponseRow {
            id: record.id,
            email: text("email"),
            name: text("name"),
            gender: text("gender"),
            age: integer("age"),
            height: integer("height"),
            weight: integer("weight"),
            preference_1: text("preference_1"),
            preference_2: text("preference_2"),
            submitted_at: record.submitted_at,
            raw_answers,
        })
    }
}

impl TryFrom<ResponseRow> for ResponseRecord {
    type Error = StoreError;

    fn try_from(row: ResponseRow) -> std::result::Result<Self, Self::Error> {
        let answers: Answers = serde_json::from_value(row.raw_answers)
            .map_err(|e| StoreError::Decode(format!("raw_answers of {}: {}", row.id, e)))?;

        Ok(ResponseRecord {
            id: row.id,
            submitted_at: row.submitted_at,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::FieldValue;

    #[test]
    fn test_row_projects_known_columns() {
        let answers: Answers = [
            ("email", FieldValue::from("a@b.com")),
            ("name", FieldValue::from("Kim")),
            ("age", FieldValue::from(30)),
            ("preference_1", FieldValue::from("482")),
        ]
        .into_iter()
        .collect();
        let record = ResponseRecord::new(answers);

        let row = ResponseRow::from_record(&record).unwrap();
        assert_eq!(row.email.as_deref(), Some("a@b.com"));
        assert_eq!(row.age, Some(30));
        assert_eq!(row.height, None);
        assert_eq!(row.preference_2, None);
        assert_eq!(row.raw_answers["name"], "Kim");

        let back = ResponseRecord::try_from(row).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_row_with_malformed_snapshot_is_rejected() {
        let record = ResponseRecord::new(Answers::new());
        let mut row = ResponseRow::from_record(&record).unwrap();
        row.raw_answers = serde_json::json!(["not", "a", "map"]);

        assert!(matches!(ResponseRecord::try_from(row), Err(StoreError::Decode(_))));
    }
}
