//! Owner-defined application form fields: definition checks when an opportunity is
//! saved, and answer checks when someone applies.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::opportunity::{CustomField, FieldKind};

/// Rejects malformed field definitions: blank ids or labels, duplicate ids,
/// and select fields without options.
pub fn validate_field_definitions(fields: &[CustomField]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.id.trim().is_empty() {
            return Err(AppError::Validation(
                "customFields: every field needs an id".to_string(),
            ));
        }
        if field.label.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "customFields: field '{}' needs a label",
                field.id
            )));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(AppError::Validation(format!(
                "customFields: duplicate field id '{}'",
                field.id
            )));
        }
        if let FieldKind::Select { options } = &field.kind {
            if options.iter().all(|o| o.trim().is_empty()) {
                return Err(AppError::Validation(format!(
                    "customFields: select field '{}' needs at least one option",
                    field.id
                )));
            }
        }
    }
    Ok(())
}

/// Checks an applicant's answers against the field definitions and returns the
/// cleaned map. Blank optional answers are dropped.
pub fn validate_responses(
    fields: &[CustomField],
    responses: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, AppError> {
    if let Some(unknown) = responses
        .keys()
        .find(|k| !fields.iter().any(|f| &f.id == *k))
    {
        return Err(AppError::Validation(format!(
            "responses: unknown field '{unknown}'"
        )));
    }

    let mut cleaned = BTreeMap::new();
    for field in fields {
        let value = responses
            .get(&field.id)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());

        let Some(value) = value else {
            if field.required {
                return Err(AppError::Validation(format!(
                    "responses: '{}' is required",
                    field.label
                )));
            }
            continue;
        };

        check_value(field, value)?;
        cleaned.insert(field.id.clone(), value.to_string());
    }
    Ok(cleaned)
}

fn check_value(field: &CustomField, value: &str) -> Result<(), AppError> {
    let ok = match &field.kind {
        FieldKind::Text | FieldKind::Textarea => true,
        FieldKind::Number => value.parse::<f64>().is_ok_and(|n| n.is_finite()),
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        FieldKind::Url => is_http_url(value),
        FieldKind::Select { options } => options.iter().any(|o| o == value),
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "responses: '{}' has an invalid value",
            field.label
        )))
    }
}

pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.contains(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, required: bool, kind: FieldKind) -> CustomField {
        CustomField {
            id: id.to_string(),
            label: id.to_uppercase(),
            required,
            kind,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let fields = vec![
            field("gpa", false, FieldKind::Number),
            field("gpa", false, FieldKind::Text),
        ];
        assert!(validate_field_definitions(&fields).is_err());
    }

    #[test]
    fn test_select_without_options_rejected() {
        let fields = vec![field("level", true, FieldKind::Select { options: vec![] })];
        assert!(validate_field_definitions(&fields).is_err());
    }

    #[test]
    fn test_missing_required_answer() {
        let fields = vec![field("essay", true, FieldKind::Textarea)];
        let err = validate_responses(&fields, &answers(&[("essay", "   ")])).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_optional_blank_answer_dropped() {
        let fields = vec![field("portfolio", false, FieldKind::Url)];
        let cleaned = validate_responses(&fields, &answers(&[("portfolio", "")])).unwrap();
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_typed_answers_checked() {
        let fields = vec![
            field("gpa", true, FieldKind::Number),
            field("start", true, FieldKind::Date),
            field(
                "level",
                true,
                FieldKind::Select {
                    options: vec!["Bachelor".into(), "Master".into()],
                },
            ),
        ];
        let good = answers(&[("gpa", "3.7"), ("start", "2025-09-01"), ("level", "Master")]);
        assert_eq!(validate_responses(&fields, &good).unwrap().len(), 3);

        let bad_date = answers(&[("gpa", "3.7"), ("start", "next fall"), ("level", "Master")]);
        assert!(validate_responses(&fields, &bad_date).is_err());

        let bad_option = answers(&[("gpa", "3.7"), ("start", "2025-09-01"), ("level", "PhD")]);
        assert!(validate_responses(&fields, &bad_option).is_err());
    }

    #[test]
    fn test_unknown_answer_key_rejected() {
        let fields = vec![field("essay", false, FieldKind::Text)];
        assert!(validate_responses(&fields, &answers(&[("salary", "lots")])).is_err());
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://astra.example/apply"));
        assert!(!is_http_url("ftp://astra.example"));
        assert!(!is_http_url("https://"));
    }
}
