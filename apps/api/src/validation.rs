// Field helpers shared by the request validators.

use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

/// `deserialize_with` for `Option<Option<T>>` fields paired with
/// `#[serde(default)]`: absent gives `None`, `null` gives `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims a free-text field; blank becomes `None`. Length is counted in chars.
pub fn optional_text(
    raw: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        cap: Option<Option<i32>>,
    }

    #[test]
    fn test_nullable_tells_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.cap, None);
        let cleared: Patch = serde_json::from_str(r#"{"cap": null}"#).unwrap();
        assert_eq!(cleared.cap, Some(None));
        let set: Patch = serde_json::from_str(r#"{"cap": 4}"#).unwrap();
        assert_eq!(set.cap, Some(Some(4)));
    }

    #[test]
    fn test_blank_and_missing_become_none() {
        assert_eq!(optional_text(None, "bio", 10).unwrap(), None);
        assert_eq!(optional_text(Some("   "), "bio", 10).unwrap(), None);
    }

    #[test]
    fn test_value_is_trimmed() {
        assert_eq!(
            optional_text(Some("  Oakland \n"), "city", 10).unwrap(),
            Some("Oakland".to_string())
        );
    }

    #[test]
    fn test_limit_counts_chars_after_trimming() {
        assert!(optional_text(Some("  ñññ  "), "city", 3).is_ok());
        let err = optional_text(Some("abcd"), "city", 3).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "city must be at most 3 characters"));
    }
}
