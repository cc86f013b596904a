use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::ResponseRecord;
use super::{Answers, FieldValue};

const ID_KEY: &str = "submission_id";
const TIMESTAMP_KEY: &str = "submitted_at";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExportError {
    #[error("Answer key {0:?} cannot be written to a key-value document")]
    UnsupportedKey(String),
    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Document has no {0} entry")]
    MissingEntry(&'static str),
}

/// Renders a completed response as a flat `key = value` document.
///
/// Text values are written as JSON string literals and integers bare, so
/// `parse_document` gives back exactly the same answers.
pub fn render_document(record: &ResponseRecord) -> Result<String, ExportError> {
    let mut out = String::from("# taste survey response\n");
    out.push_str(&format!("{} = {}\n", ID_KEY, quote(&record.id.to_string())));
    out.push_str(&format!("{} = {}\n", TIMESTAMP_KEY, quote(&record.submitted_at.to_rfc3339())));

    for (key, value) in record.answers.iter() {
        if !is_plain_key(key) || key == ID_KEY || key == TIMESTAMP_KEY {
            return Err(ExportError::UnsupportedKey(key.to_string()));
        }
        let rendered = match value {
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Text(text) => quote(text),
        };
        out.push_str(&format!("{} = {}\n", key, rendered));
    }

    Ok(out)
}

pub fn parse_document(document: &str) -> Result<ResponseRecord, ExportError> {
    let mut id = None;
    let mut submitted_at = None;
    let mut answers = Answers::new();

    for (index, raw) in document.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let malformed = |reason: String| ExportError::Malformed { line: line_no, reason };

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| malformed("expected `key = value`".to_string()))?;
        let key = key.trim();
        let value = parse_value(value.trim()).map_err(malformed)?;

        match key {
            ID_KEY => {
                let text = value.as_text().ok_or_else(|| malformed("id must be text".to_string()))?;
                id = Some(Uuid::parse_str(text).map_err(|e| malformed(e.to_string()))?);
            }
            TIMESTAMP_KEY => {
                let text = value.as_text().ok_or_else(|| malformed("timestamp must be text".to_string()))?;
                let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| malformed(e.to_string()))?;
                submitted_at = Some(parsed.with_timezone(&Utc));
            }
            _ if !is_plain_key(key) => return Err(malformed(format!("bad key {:?}", key))),
            _ => {
                if answers.insert(key, value).is_some() {
                    return Err(malformed(format!("duplicate key {:?}", key)));
                }
            }
        }
    }

    Ok(ResponseRecord {
        id: id.ok_or(ExportError::MissingEntry(ID_KEY))?,
        submitted_at: submitted_at.ok_or(ExportError::MissingEntry(TIMESTAMP_KEY))?,
        answers,
    })
}

fn quote(text: &str) -> String {
    // Serialising a str cannot fail.
    serde_json::to_string(text).unwrap_or_default()
}

fn parse_value(raw: &str) -> Result<FieldValue, String> {
    if raw.starts_with('"') {
        serde_json::from_str::<String>(raw)
            .map(FieldValue::Text)
            .map_err(|e| format!("bad string literal: {}", e))
    } else {
        raw.parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| format!("expected a quoted string or an integer, got {:?}", raw))
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('#')
        && key.chars().all(|c| !c.is_whitespace() && c != '=')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResponseRecord {
        let answers: Answers = [
            ("email", FieldValue::from("a@b.com")),
            ("name", FieldValue::from("Kim \"Jay\"\nsecond line")),
            ("gender", FieldValue::from("남")),
            ("age", FieldValue::from(30)),
            ("preference_1", FieldValue::from("518")),
        ]
        .into_iter()
        .collect();
        ResponseRecord::new(answers)
    }

    #[test]
    fn test_document_reconstructs_every_answer() {
        let record = sample();
        let document = render_document(&record).unwrap();

        assert!(document.contains("age = 30\n"));
        assert!(document.contains("preference_1 = \"518\"\n"));
        // One line per entry even when a value contains a newline.
        assert_eq!(document.lines().count(), 1 + 2 + record.answers.len());

        let parsed = parse_document(&document).unwrap();
        assert_eq!(parsed.answers, record.answers);
        assert_eq!(parsed.id, record.id);
        assert_eq!(parsed.submitted_at, record.submitted_at);
    }

    #[test]
    fn test_numeric_text_stays_text() {
        let record = sample();
        let parsed = parse_document(&render_document(&record).unwrap()).unwrap();
        assert_eq!(parsed.answers.get("preference_1"), Some(&FieldValue::from("518")));
    }

    #[test]
    fn test_reserved_key_is_refused() {
        let mut record = sample();
        record.answers.insert("submitted_at", "yesterday");
        assert_eq!(
            render_document(&record),
            Err(ExportError::UnsupportedKey("submitted_at".to_string()))
        );
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let document = "submission_id = \"not-a-uuid\"\n";
        assert!(matches!(parse_document(document), Err(ExportError::Malformed { line: 1, .. })));

        let document = format!(
            "submission_id = \"{}\"\nsubmitted_at = \"2026-10-19T09:00:00+00:00\"\nage = thirty\n",
            Uuid::new_v4()
        );
        assert!(matches!(parse_document(&document), Err(ExportError::Malformed { line: 3, .. })));

        assert_eq!(parse_document("# empty\n"), Err(ExportError::MissingEntry("submission_id")));
    }
}
