//! Shapes struct-level validation failures into one `Validation` error.

use std::borrow::Cow;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::error::{AppResult, DomainError};

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: String,
    pub rule: String,
    pub param: Option<String>,
}

impl FieldFailure {
    #[must_use]
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            param: None,
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Render with the per-rule template.
    #[must_use]
    pub fn render(&self) -> String {
        let field = self.field.to_lowercase();
        let param = self.param.as_deref().unwrap_or_default();
        match self.rule.as_str() {
            "required" => format!("{field}: must be provided"),
            "email" => format!("{field}: must be a valid email address"),
            "min" => format!("{field}: must be at least {param} characters"),
            "max" => format!("{field}: must be at most {param} characters"),
            rule => format!("{field}: failed validation: {rule}"),
        }
    }
}

/// Join all failures into a single error. `None` when nothing failed.
#[must_use]
pub fn shape(failures: &[FieldFailure]) -> Option<DomainError> {
    if failures.is_empty() {
        return None;
    }
    let details = failures
        .iter()
        .map(FieldFailure::render)
        .collect::<Vec<_>>()
        .join("; ");
    Some(DomainError::validation(details))
}

/// Flatten a `validator` report into ordered failures.
///
/// Fields are ordered by name and only the first failed rule of each field
/// is kept. Nested structs and lists are flattened with dotted / indexed
/// paths (`user.email`, `users[2].name`). `length` failures become `min` or
/// `max` depending on which bound the value broke.
#[must_use]
pub fn failures_from(errors: &ValidationErrors) -> Vec<FieldFailure> {
    let mut failures = Vec::new();
    collect_failures("", errors, &mut failures);
    failures
}

fn collect_failures(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldFailure>) {
    let mut fields: Vec<(&str, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.as_ref(), kind))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = format!("{prefix}{field}");
        match kind {
            ValidationErrorsKind::Field(errors) => {
                if let Some(first) = errors.first() {
                    out.push(field_failure(&path, first));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_failures(&format!("{path}."), inner, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_failures(&format!("{path}[{index}]."), inner, out);
                }
            }
        }
    }
}

fn field_failure(field: &str, error: &validator::ValidationError) -> FieldFailure {
    match error.code.as_ref() {
        "length" => length_failure(field, error),
        code => FieldFailure::new(field, code),
    }
}

fn length_failure(field: &str, error: &validator::ValidationError) -> FieldFailure {
    let bound = |name: &str| error.params.get(name).and_then(serde_json::Value::as_u64);
    let actual = error.params.get("value").and_then(|value| match value {
        serde_json::Value::String(s) => Some(s.chars().count() as u64),
        serde_json::Value::Array(items) => Some(items.len() as u64),
        _ => None,
    });

    match (bound("min"), bound("max"), actual) {
        (Some(min), _, Some(len)) if len < min => {
            FieldFailure::new(field, "min").with_param(min.to_string())
        }
        (_, Some(max), _) => FieldFailure::new(field, "max").with_param(max.to_string()),
        (Some(min), None, _) => FieldFailure::new(field, "min").with_param(min.to_string()),
        (None, None, _) => FieldFailure::new(field, "length"),
    }
}

/// Run derive-based validation and shape any failures.
pub fn validate_input<T: Validate>(input: &T) -> AppResult<()> {
    match input.validate() {
        Ok(()) => Ok(()),
        Err(errors) => Err(shape(&failures_from(&errors))
            .unwrap_or_else(|| DomainError::validation(Cow::Borrowed("invalid input")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{CODE_VALIDATION_ERROR, ErrorKind};

    #[derive(Validate)]
    struct Probe {
        #[validate(required, length(min = 2, max = 5))]
        name: Option<String>,
        #[validate(required, email)]
        email: Option<String>,
    }

    #[test]
    fn test_shape_joins_messages_in_order() {
        let failures = vec![
            FieldFailure::new("email", "required"),
            FieldFailure::new("name", "min").with_param("2"),
        ];
        let err = shape(&failures).unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), CODE_VALIDATION_ERROR);
        assert_eq!(
            err.details(),
            Some("email: must be provided; name: must be at least 2 characters")
        );
    }

    #[test]
    fn test_shape_empty_is_none() {
        assert!(shape(&[]).is_none());
    }

    #[test]
    fn test_rule_templates() {
        assert_eq!(
            FieldFailure::new("Email", "email").render(),
            "email: must be a valid email address"
        );
        assert_eq!(
            FieldFailure::new("name", "max").with_param("100").render(),
            "name: must be at most 100 characters"
        );
        assert_eq!(
            FieldFailure::new("phone", "phone").render(),
            "phone: failed validation: phone"
        );
    }

    #[test]
    fn test_validate_input_missing_and_short() {
        let probe = Probe {
            name: Some("a".to_string()),
            email: None,
        };
        let err = validate_input(&probe).unwrap_err();
        assert_eq!(
            err.details(),
            Some("email: must be provided; name: must be at least 2 characters")
        );
    }

    #[test]
    fn test_validate_input_too_long_and_bad_email() {
        let probe = Probe {
            name: Some("abcdefgh".to_string()),
            email: Some("not-an-email".to_string()),
        };
        let err = validate_input(&probe).unwrap_err();
        assert_eq!(
            err.details(),
            Some("email: must be a valid email address; name: must be at most 5 characters")
        );
    }

    #[derive(Validate)]
    struct Wrapper {
        #[validate(nested)]
        probe: Probe,
    }

    #[test]
    fn test_nested_paths() {
        let wrapper = Wrapper {
            probe: Probe {
                name: Some("Ann".to_string()),
                email: None,
            },
        };
        let err = validate_input(&wrapper).unwrap_err();
        assert_eq!(err.details(), Some("probe.email: must be provided"));
    }

    #[test]
    fn test_validate_input_ok() {
        let probe = Probe {
            name: Some("Ann".to_string()),
            email: Some("ann@example.com".to_string()),
        };
        assert!(validate_input(&probe).is_ok());
    }
}
