//! Checks for scalar field values.

use codemeta_jsonld::node::{is_url, is_url_or_blank_node_id};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::sink::is_iso_date;

type Check = Result<(), ValidationError>;

fn field_error(message: String) -> Check {
    Err(ValidationError::Field(message))
}

/// Runs `check` on every element of an array, or on the value itself.
pub(super) fn list_or_single(value: &Value, mut check: impl FnMut(&Value) -> Check) -> Check {
    match value {
        Value::Array(items) => items.iter().try_for_each(check),
        other => check(other),
    }
}

pub(super) fn url(field: &str, value: &Value) -> Check {
    match value.as_str() {
        Some(s) if is_url(s) => Ok(()),
        _ => field_error(format!("Invalid URL in field \"{field}\": {value}")),
    }
}

pub(super) fn urls(field: &str, value: &Value) -> Check {
    list_or_single(value, |item| url(field, item))
}

pub(super) fn url_or_blank_node(field: &str, value: &Value) -> Check {
    match value.as_str() {
        Some(s) if is_url_or_blank_node_id(s) => Ok(()),
        _ => field_error(format!("Invalid URL in field \"{field}\": {value}")),
    }
}

pub(super) fn text(field: &str, value: &Value) -> Check {
    match value.as_str() {
        Some("") => field_error(format!("\"{field}\" must not be an empty text.")),
        Some(_) => Ok(()),
        None => field_error(format!("\"{field}\" must be text, not {value}")),
    }
}

pub(super) fn texts(field: &str, value: &Value) -> Check {
    match value {
        Value::String(_) => Ok(()),
        Value::Array(items) => match items.iter().find(|item| !item.is_string()) {
            Some(item) => field_error(format!("\"{field}\" must be a list of texts, not {item}")),
            None => Ok(()),
        },
        other => field_error(format!(
            "\"{field}\" must be a text or a list of texts, not {other}"
        )),
    }
}

/// Texts and URLs are both strings once compacted.
pub(super) fn texts_or_urls(field: &str, value: &Value) -> Check {
    match value {
        Value::String(_) => Ok(()),
        Value::Array(items) => match items.iter().find(|item| !item.is_string()) {
            Some(item) => field_error(format!(
                "\"{field}\" must be a list of texts/URLs, not {item}"
            )),
            None => Ok(()),
        },
        other => field_error(format!(
            "\"{field}\" must be a text/URL or a list of texts/URLs, not {other}"
        )),
    }
}

pub(super) fn number_or_text(field: &str, value: &Value) -> Check {
    match value {
        Value::String(_) | Value::Number(_) => Ok(()),
        other => field_error(format!("\"{field}\" must be text or a number, not {other}")),
    }
}

pub(super) fn numbers(field: &str, value: &Value) -> Check {
    list_or_single(value, |item| {
        if item.is_number() {
            Ok(())
        } else {
            field_error(format!(
                "\"{field}\" must be a number or a list of numbers, not {item}"
            ))
        }
    })
}

pub(super) fn boolean(field: &str, value: &Value) -> Check {
    match value {
        Value::Bool(_) => Ok(()),
        Value::String(s) if s == "true" || s == "false" => Ok(()),
        other => field_error(format!(
            "\"{field}\" must be a boolean (ie. \"true\" or \"false\"), not {other}"
        )),
    }
}

pub(super) fn date(field: &str, value: &Value) -> Check {
    match value.as_str() {
        Some(s) if is_iso_date(s) => Ok(()),
        Some(_) => field_error(format!(
            "\"{field}\" must be a date in the format YYYY-MM-DD, not {value}"
        )),
        None => field_error(format!("\"{field}\" must be a date, not {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(check: Check) -> String {
        check.unwrap_err().to_string()
    }

    #[test]
    fn urls_accept_single_and_list() {
        assert!(urls("codeRepository", &json!("https://example.org")).is_ok());
        assert!(urls("codeRepository", &json!(["https://a.example.org", "https://b.example.org"])).is_ok());
        assert_eq!(
            message(urls("codeRepository", &json!(["https://a.example.org", "foo"]))),
            "Invalid URL in field \"codeRepository\": \"foo\""
        );
    }

    #[test]
    fn text_rejects_non_strings() {
        assert_eq!(message(text("name", &json!(3))), "\"name\" must be text, not 3");
        assert_eq!(message(text("name", &json!(""))), "\"name\" must not be an empty text.");
    }

    #[test]
    fn texts_reports_bad_element() {
        assert!(texts("runtimePlatform", &json!(["Linux", "macOS"])).is_ok());
        assert_eq!(
            message(texts("runtimePlatform", &json!(["Linux", {"a": 1}]))),
            "\"runtimePlatform\" must be a list of texts, not {\"a\":1}"
        );
    }

    #[test]
    fn dates() {
        assert!(date("dateCreated", &json!("2024-05-01")).is_ok());
        assert_eq!(
            message(date("dateCreated", &json!("01/05/2024"))),
            "\"dateCreated\" must be a date in the format YYYY-MM-DD, not \"01/05/2024\""
        );
        assert_eq!(
            message(date("dateCreated", &json!(2024))),
            "\"dateCreated\" must be a date, not 2024"
        );
    }

    #[test]
    fn booleans_and_numbers() {
        assert!(boolean("isAccessibleForFree", &json!(true)).is_ok());
        assert!(boolean("isAccessibleForFree", &json!("false")).is_ok());
        assert!(boolean("isAccessibleForFree", &json!("yes")).is_err());
        assert!(numbers("copyrightYear", &json!([2020, 2021])).is_ok());
        assert!(number_or_text("version", &json!(2)).is_ok());
        assert!(number_or_text("version", &json!(null)).is_err());
    }
}
