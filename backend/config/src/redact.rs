//! Config redaction: a display-safe copy of the config with secrets masked.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "accessToken",
    "apiKey",
    "token",
    "secret",
    "password",
    "webhookSecret",
    "verifyToken",
];

/// Bare phone numbers anywhere in the tree.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Replace secret values with their first four characters plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_under(value, "")
}

fn redact_under(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if !s.is_empty() && (is_sensitive_key(key) || PHONE_PATTERN.is_match(s)) => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".into())
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_under(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_under(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_access_token() {
        let v = json!({"channel": {"accessToken": "EAAB-very-secret", "phoneNumberId": "1234"}});
        let out = redact(&v);
        assert_eq!(out["channel"]["accessToken"], "EAAB***");
        assert_eq!(out["channel"]["phoneNumberId"], "1234");
    }

    #[test]
    fn masks_phone_numbers_in_values() {
        let v = json!({"points": [{"details": "3242156679"}]});
        assert_eq!(redact(&v)["points"][0]["details"], "3242***");
    }

    #[test]
    fn leaves_plain_values() {
        let v = json!({"logging": {"level": "debug"}, "session": {"historyLimit": 50}});
        assert_eq!(redact(&v), v);
    }
}
