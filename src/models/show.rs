//! Show record structure.

use std::fmt;

/// One event listing extracted from the afisha page.
///
/// Records are created fresh on every poll cycle and never mutated; the
/// only durable trace of a show is its identity key in the novelty store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    /// Show date as displayed on the page
    pub date: String,

    /// Show time as displayed on the page. Empty only when the fallback
    /// layout could not split the combined date-time string.
    pub time: String,

    /// Show title
    pub name: String,

    /// Full URL to the show page. Empty only when the fallback layout
    /// carries no link.
    pub url: String,
}

impl Show {
    /// Composite key uniquely identifying this show instance for dedup.
    ///
    /// Two records are the same event iff this key matches exactly; no
    /// normalization is applied beyond the trimming done at extraction.
    pub fn identity_key(&self) -> String {
        format!("{}|{}|{}|{}", self.date, self.time, self.name, self.url)
    }

    /// Notification message body for this show.
    pub fn message(&self) -> String {
        format!(
            "🎭 {}\n📅 {}\n⏰ {}\n🔗 {}",
            self.name, self.date, self.time, self.url
        )
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} — {}", self.date, self.time, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_show() -> Show {
        Show {
            date: "01.12.2024".to_string(),
            time: "19:00".to_string(),
            name: "Show A".to_string(),
            url: "https://x/a".to_string(),
        }
    }

    #[test]
    fn test_identity_key() {
        assert_eq!(
            sample_show().identity_key(),
            "01.12.2024|19:00|Show A|https://x/a"
        );
    }

    #[test]
    fn test_identity_key_is_exact() {
        let mut other = sample_show();
        other.name = "show a".to_string();
        assert_ne!(sample_show().identity_key(), other.identity_key());
    }

    #[test]
    fn test_message_has_four_lines() {
        let message = sample_show().message();
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "🎭 Show A");
        assert_eq!(lines[1], "📅 01.12.2024");
        assert_eq!(lines[2], "⏰ 19:00");
        assert_eq!(lines[3], "🔗 https://x/a");
    }
}
