use serde::{Serialize, Deserialize};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

use super::{FieldValue, SchemaError, WizardError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    FreeText,
    Email,
    SingleChoice { options: Vec<String> },
    Integer { min: i64, max: i64 },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn free_text(key: &str, label: &str) -> Self {
        Self::with_kind(key, label, FieldKind::FreeText)
    }

    pub fn email(key: &str, label: &str) -> Self {
        Self::with_kind(key, label, FieldKind::Email)
    }

    pub fn single_choice(key: &str, label: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::with_kind(key, label, FieldKind::SingleChoice { options })
    }

    pub fn integer(key: &str, label: &str, min: i64, max: i64) -> Self {
        Self::with_kind(key, label, FieldKind::Integer { min, max })
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn with_kind(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: true,
        }
    }

    /// Checks a non-empty value against the field kind. The error is a
    /// human-readable reason.
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        match (&self.kind, value) {
            (FieldKind::FreeText, FieldValue::Text(_)) => Ok(()),
            (FieldKind::Email, FieldValue::Text(text)) => {
                if validator::validate_email(text.trim()) {
                    Ok(())
                } else {
                    Err(format!("{:?} is not a valid email address", text))
                }
            }
            (FieldKind::SingleChoice { options }, FieldValue::Text(text)) => {
                if options.iter().any(|o| o == text) {
                    Ok(())
                } else {
                    Err(format!("{:?} is not one of {}", text, options.join(", ")))
                }
            }
            (FieldKind::Integer { min, max }, FieldValue::Integer(n)) => {
                if (*min..=*max).contains(n) {
                    Ok(())
                } else {
                    Err(format!("{} is outside {}..={}", n, min, max))
                }
            }
            (FieldKind::Integer { .. }, FieldValue::Text(_)) => Err("expected a whole number".to_string()),
            (_, FieldValue::Integer(_)) => Err("expected text".to_string()),
        }
    }

    /// Turns raw presenter input into a value of this field's kind. Integer
    /// fields fall back to text when the input does not parse, which `check`
    /// then reports.
    pub fn parse_input(&self, input: &str) -> FieldValue {
        let input = input.trim();
        match self.kind {
            FieldKind::Integer { .. } => input
                .parse::<i64>()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::from(input)),
            _ => FieldValue::from(input),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StepDefinition {
    pub key: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub next_step: Option<usize>,
    pub prev_step: Option<usize>,
}

impl StepDefinition {
    /// A step without a successor ends the wizard.
    pub fn is_terminal(&self) -> bool {
        self.next_step.is_none()
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Immutable description of every step of one questionnaire.
///
/// Deserialising goes through `FormSchema::new`, so a loaded schema holds the
/// same guarantees as a constructed one.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "RawSchema")]
pub struct FormSchema {
    steps: Vec<StepDefinition>,
}

#[derive(Deserialize)]
struct RawSchema {
    steps: Vec<StepDefinition>,
}

impl TryFrom<RawSchema> for FormSchema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        FormSchema::new(raw.steps)
    }
}

impl FormSchema {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::Empty);
        }

        let last = steps.len() - 1;
        let mut seen_keys = HashSet::new();

        for (index, step) in steps.iter().enumerate() {
            match step.next_step {
                None if index != last => return Err(SchemaError::TerminalNotLast(step.key.clone())),
                Some(_) if index == last => return Err(SchemaError::NoTerminal),
                Some(next) if next > last || next == index => {
                    return Err(SchemaError::BadLink { step: step.key.clone(), target: next })
                }
                _ => {}
            }
            if let Some(prev) = step.prev_step {
                if prev > last || prev == index {
                    return Err(SchemaError::BadLink { step: step.key.clone(), target: prev });
                }
            }

            for field in &step.fields {
                if !seen_keys.insert(field.key.as_str()) {
                    return Err(SchemaError::DuplicateField(field.key.clone()));
                }
                match &field.kind {
                    FieldKind::SingleChoice { options } if options.is_empty() => {
                        return Err(SchemaError::NoOptions(field.key.clone()))
                    }
                    FieldKind::Integer { min, max } if min > max => {
                        return Err(SchemaError::EmptyRange(field.key.clone()))
                    }
                    _ => {}
                }
            }
        }

        Ok(Self { steps })
    }

    /// The built-in taste preference questionnaire, built once per process.
    pub fn taste_preference() -> Arc<FormSchema> {
        TASTE_PREFERENCE.clone()
    }

    pub fn get_step(&self, index: usize) -> Result<&StepDefinition, WizardError> {
        self.steps.get(index).ok_or(WizardError::UnknownStep(index))
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn terminal_index(&self) -> usize {
        self.steps.len() - 1
    }
}

static TASTE_PREFERENCE: Lazy<Arc<FormSchema>> = Lazy::new(|| {
    // Same steps FormSchema::new accepts in test_builtin_schema_is_valid.
    Arc::new(FormSchema { steps: taste_preference_steps() })
});

fn taste_preference_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            key: "intro".to_string(),
            title: "설문 안내".to_string(),
            fields: vec![FieldSpec::email("email", "이메일")],
            next_step: Some(1),
            prev_step: None,
        },
        StepDefinition {
            key: "basic_info".to_string(),
            title: "기본 정보".to_string(),
            fields: vec![
                FieldSpec::free_text("name", "이름"),
                FieldSpec::single_choice("gender", "성별", &["남", "여"]),
                FieldSpec::integer("age", "나이", 1, 120),
                FieldSpec::integer("height", "키 (cm)", 50, 250).optional(),
                FieldSpec::integer("weight", "몸무게 (kg)", 10, 300).optional(),
            ],
            next_step: Some(2),
            prev_step: Some(0),
        },
        StepDefinition {
            key: "sweet".to_string(),
            title: "단맛 평가".to_string(),
            fields: vec![FieldSpec::single_choice(
                "preference_1",
                "가장 선호하는 단맛 시료",
                &["374", "518", "926"],
            )],
            next_step: Some(3),
            prev_step: Some(1),
        },
        StepDefinition {
            key: "salty".to_string(),
            title: "짠맛 평가".to_string(),
            fields: vec![FieldSpec::single_choice(
                "preference_2",
                "가장 선호하는 짠맛 시료",
                &["153", "687", "249"],
            )],
            next_step: Some(4),
            prev_step: Some(2),
        },
        StepDefinition {
            key: "complete".to_string(),
            title: "설문 완료".to_string(),
            fields: Vec::new(),
            next_step: None,
            prev_step: Some(3),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(key: &str, fields: Vec<FieldSpec>, next: Option<usize>, prev: Option<usize>) -> StepDefinition {
        StepDefinition {
            key: key.to_string(),
            title: key.to_string(),
            fields,
            next_step: next,
            prev_step: prev,
        }
    }

    #[test]
    fn test_builtin_schema_is_valid() {
        let schema = FormSchema::new(taste_preference_steps()).unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.terminal_index(), 4);
        assert!(schema.get_step(4).unwrap().is_terminal());
        assert_eq!(*FormSchema::taste_preference(), schema);
    }

    #[test]
    fn test_get_step_out_of_range() {
        let schema = FormSchema::taste_preference();
        assert!(matches!(schema.get_step(5), Err(WizardError::UnknownStep(5))));
    }

    #[test]
    fn test_schema_rejects_duplicate_keys() {
        let steps = vec![
            step("a", vec![FieldSpec::free_text("name", "Name")], Some(1), None),
            step("b", vec![FieldSpec::free_text("name", "Name again")], None, Some(0)),
        ];
        assert_eq!(FormSchema::new(steps), Err(SchemaError::DuplicateField("name".to_string())));
    }

    #[test]
    fn test_schema_requires_single_trailing_terminal() {
        let early_end = vec![step("a", vec![], None, None), step("b", vec![], None, Some(0))];
        assert_eq!(FormSchema::new(early_end), Err(SchemaError::TerminalNotLast("a".to_string())));

        let no_end = vec![step("a", vec![], Some(1), None), step("b", vec![], Some(0), Some(0))];
        assert_eq!(FormSchema::new(no_end), Err(SchemaError::NoTerminal));

        assert_eq!(FormSchema::new(Vec::new()), Err(SchemaError::Empty));
    }

    #[test]
    fn test_schema_rejects_dangling_links_and_empty_choices() {
        let dangling = vec![step("a", vec![], Some(7), None), step("b", vec![], None, Some(0))];
        assert_eq!(
            FormSchema::new(dangling),
            Err(SchemaError::BadLink { step: "a".to_string(), target: 7 })
        );

        let no_options = vec![step("a", vec![FieldSpec::single_choice("pick", "Pick", &[])], None, None)];
        assert_eq!(FormSchema::new(no_options), Err(SchemaError::NoOptions("pick".to_string())));
    }

    #[test]
    fn test_deserialize_runs_schema_checks() {
        let err = serde_json::from_str::<FormSchema>(r#"{"steps":[]}"#).unwrap_err();
        assert!(err.to_string().contains("Schema has no steps"), "{}", err);

        let dangling = serde_json::json!({
            "steps": [
                {"key": "a", "title": "A", "fields": [], "next_step": 3, "prev_step": null},
                {"key": "b", "title": "B", "fields": [], "next_step": null, "prev_step": 0}
            ]
        });
        assert!(serde_json::from_value::<FormSchema>(dangling).is_err());
    }

    #[test]
    fn test_builtin_schema_survives_json() {
        let json = serde_json::to_string(&*FormSchema::taste_preference()).unwrap();
        let loaded: FormSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, *FormSchema::taste_preference());
    }

    #[test]
    fn test_field_checks() {
        let gender = FieldSpec::single_choice("gender", "성별", &["남", "여"]);
        assert!(gender.check(&FieldValue::from("남")).is_ok());
        assert!(gender.check(&FieldValue::from("other")).is_err());

        let age = FieldSpec::integer("age", "나이", 1, 120);
        assert!(age.check(&FieldValue::from(30)).is_ok());
        assert!(age.check(&FieldValue::from(0)).is_err());
        assert!(age.check(&FieldValue::from("thirty")).is_err());

        let email = FieldSpec::email("email", "이메일");
        assert!(email.check(&FieldValue::from("a@b.com")).is_ok());
        assert!(email.check(&FieldValue::from("not-an-email")).is_err());
        assert!(email.check(&FieldValue::from(5)).is_err());
    }

    #[test]
    fn test_parse_input_follows_kind() {
        let age = FieldSpec::integer("age", "나이", 1, 120);
        assert_eq!(age.parse_input(" 42 "), FieldValue::Integer(42));
        assert_eq!(age.parse_input("forty"), FieldValue::from("forty"));

        let name = FieldSpec::free_text("name", "이름");
        assert_eq!(name.parse_input("123"), FieldValue::from("123"));
    }
}
