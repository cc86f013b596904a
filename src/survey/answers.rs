use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single answer. Numbers stay numbers so the stored snapshot keeps
/// `age: 30` rather than `age: "30"`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    /// Whitespace-only text counts as empty; integers never do.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Integer(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Text without surrounding whitespace.
    pub fn trimmed(self) -> Self {
        match self {
            FieldValue::Text(text) if text.trim().len() != text.len() => {
                FieldValue::Text(text.trim().to_string())
            }
            other => other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

/// Field key → value. Used both for the values of one submitted step and for
/// the answers a session has accumulated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, FieldValue>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_integer)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Every text value trimmed, so what is checked is what gets stored.
    pub fn normalized(self) -> Self {
        Answers(self.0.into_iter().map(|(k, v)| (k, v.trimmed())).collect())
    }

    /// Later values win for keys present in both.
    pub fn merge(&mut self, other: Answers) {
        self.0.extend(other.0);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K, V> FromIterator<(K, V)> for Answers
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Answers(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_only_shared_keys() {
        let mut answers: Answers = [("name", FieldValue::from("Kim")), ("age", FieldValue::from(30))]
            .into_iter()
            .collect();
        answers.merge([("name", "Lee")].into_iter().collect());

        assert_eq!(answers.text("name"), Some("Lee"));
        assert_eq!(answers.integer("age"), Some(30));
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_json_keeps_value_kinds() {
        let answers: Answers = [("gender", FieldValue::from("남")), ("age", FieldValue::from(30))]
            .into_iter()
            .collect();

        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({"age": 30, "gender": "남"}));

        let back: Answers = serde_json::from_value(json).unwrap();
        assert_eq!(back, answers);
    }

    #[test]
    fn test_normalized_trims_text_only() {
        let answers: Answers = [
            ("email", FieldValue::from(" a@b.com\t")),
            ("name", FieldValue::from("Kim")),
            ("age", FieldValue::from(30)),
        ]
        .into_iter()
        .collect();

        let answers = answers.normalized();
        assert_eq!(answers.text("email"), Some("a@b.com"));
        assert_eq!(answers.text("name"), Some("Kim"));
        assert_eq!(answers.integer("age"), Some(30));
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert!(FieldValue::from("   ").is_empty());
        assert!(!FieldValue::from("x").is_empty());
        assert!(!FieldValue::from(0).is_empty());
    }
}
