//! Argument helpers for MCP tool and prompt calls.
//!
//! Each helper returns a ready-to-send `INVALID_PARAMS` response on failure so
//! callers can use `?` inside a `Result<_, Response>` block.

use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::mcp::protocol::{error_codes, Response};

fn invalid(req_id: &Value, message: String) -> Response {
    Response::error(req_id.clone(), error_codes::INVALID_PARAMS, message)
}

/// Helper function to extract a required argument from a JSON object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null))
        .map_err(|_| invalid(req_id, format!("Missing or invalid required argument: '{}'", key)))
}

/// `None` when the key is absent or `null`; an error when present with the wrong type.
pub fn get_optional_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<Option<T>, Response> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => from_value(v.clone())
            .map(Some)
            .map_err(|_| invalid(req_id, format!("Invalid argument: '{}'", key))),
    }
}

/// Accepts a JSON number or a numeric string; must be a positive integer.
pub fn positive_int(value: &Value, key: &str, req_id: &Value) -> Result<u64, Response> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| *n > 0)
        .ok_or_else(|| invalid(req_id, format!("Invalid argument: '{}' must be a positive integer", key)))
}

/// Accepts a string or a number and renders it as text (e.g. chain ids).
pub fn string_or_number(value: &Value, key: &str, req_id: &Value) -> Result<String, Response> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(req_id, format!("Invalid argument: '{}' must be a string or number", key))),
    }
}

/// Renders a JSON scalar the way it should appear in a query string.
pub fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positive_int_accepts_numeric_strings() {
        let id = json!(1);
        assert_eq!(positive_int(&json!(25), "limit", &id).unwrap(), 25);
        assert_eq!(positive_int(&json!("10"), "limit", &id).unwrap(), 10);
        assert!(positive_int(&json!(0), "limit", &id).is_err());
        assert!(positive_int(&json!("-3"), "limit", &id).is_err());
        assert!(positive_int(&json!(1.5), "limit", &id).is_err());
    }

    #[test]
    fn required_arg_reports_key() {
        let err = get_required_arg::<String>(&json!({}), "walletAddress", &json!(9)).unwrap_err();
        let err = err.error.unwrap();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert!(err.message.contains("walletAddress"));
    }

    #[test]
    fn optional_arg_distinguishes_absent_from_wrong_type() {
        let id = json!(1);
        assert_eq!(get_optional_arg::<String>(&json!({}), "q", &id).unwrap(), None);
        assert_eq!(get_optional_arg::<String>(&json!({"q": null}), "q", &id).unwrap(), None);
        assert!(get_optional_arg::<String>(&json!({"q": 5}), "q", &id).is_err());
    }

    #[test]
    fn chain_ids_may_be_numbers() {
        let id = json!(1);
        assert_eq!(string_or_number(&json!(137), "chainId", &id).unwrap(), "137");
        assert_eq!(string_or_number(&json!(" 1 "), "chainId", &id).unwrap(), "1");
        assert!(string_or_number(&json!(true), "chainId", &id).is_err());
    }
}
