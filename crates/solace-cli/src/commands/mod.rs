pub mod init;
pub mod journal;
pub mod migrate;
pub mod misc;
pub mod mood;
pub mod security;
pub mod settings;
pub mod status;

use chrono::{DateTime, Local, Utc};
use solace_core::storage::MoodTag;

/// Timestamp in the local timezone, minute precision.
pub(crate) fn format_local(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

pub(crate) fn format_mood(mood: &MoodTag, unicode: bool) -> String {
    if unicode {
        format!("{} {}", mood.emoji, mood.label)
    } else {
        format!("{} ({})", mood.label, mood.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::storage::MoodLevel;

    #[test]
    fn test_format_mood() {
        let tag = MoodLevel::Good.tag();
        assert_eq!(format_mood(&tag, false), "Good (4)");
        assert!(format_mood(&tag, true).ends_with(" Good"));
    }
}
