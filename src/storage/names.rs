use crate::error::ValidationError;

use super::store::SHEET_EXTENSION;

/// Normalize a user-chosen identifier into a file stem. Anything that could
/// escape the data directory is rejected, not rewritten.
pub fn sheet_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    let stem = trimmed
        .strip_suffix(&format!(".{SHEET_EXTENSION}"))
        .unwrap_or(trimmed)
        .trim();

    let invalid = stem.is_empty()
        || stem.starts_with('.')
        || stem.ends_with(&format!(".{SHEET_EXTENSION}"))
        || stem
            .chars()
            .any(|ch| matches!(ch, '/' | '\\' | ':') || ch.is_control());

    if invalid {
        Err(ValidationError::InvalidName(trimmed.to_string()))
    } else {
        Ok(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_extension() {
        assert_eq!(sheet_name("  day-1.json ").unwrap(), "day-1");
        assert_eq!(sheet_name("Day 1 (reshoot)").unwrap(), "Day 1 (reshoot)");
    }

    #[test]
    fn rejects_names_that_leave_the_data_dir() {
        for bad in [
            "",
            "   ",
            ".json",
            "../escape",
            "a/b",
            "a\\b",
            ".hidden",
            "c:drive",
            "week.json.json",
        ] {
            assert_eq!(
                sheet_name(bad),
                Err(ValidationError::InvalidName(bad.trim().to_string())),
                "{bad:?} should be rejected"
            );
        }
    }
}
