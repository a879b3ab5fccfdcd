/// Result of scoring a candidate password on the registration form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strength {
    pub score: u8,
    pub label: &'static str,
    /// Hex display color, empty when the score is 0
    pub color: &'static str,
}

const LABELS: [&str; 5] = ["", "Weak", "Fair", "Good", "Strong"];
const COLORS: [&str; 5] = ["", "#ef4444", "#f59e0b", "#3b82f6", "#22c55e"];

pub const MIN_LENGTH: usize = 8;

/// Score a password 0-4, one point for each satisfied criterion:
/// length, an uppercase letter, a digit, and a non-alphanumeric character.
pub fn strength(password: &str) -> Strength {
    let criteria = [
        password.chars().count() >= MIN_LENGTH,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = criteria.iter().filter(|met| **met).count() as u8;

    Strength {
        score,
        label: LABELS[score as usize],
        color: COLORS[score as usize],
    }
}

impl Strength {
    /// Filled fraction of the strength bar, 0-100
    pub fn percent(&self) -> u16 {
        u16::from(self.score) * 25
    }

    /// Parse the hex color into RGB components for terminal rendering
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.color.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lowercase_scores_zero() {
        let s = strength("abc");
        assert_eq!(s.score, 0);
        assert_eq!(s.label, "");
        assert_eq!(s.color, "");
    }

    #[test]
    fn empty_password_scores_zero() {
        assert_eq!(strength("").score, 0);
    }

    #[test]
    fn length_upper_digit_is_good() {
        let s = strength("Abcdefg1");
        assert_eq!(s.score, 3);
        assert_eq!(s.label, "Good");
        assert_eq!(s.color, "#3b82f6");
    }

    #[test]
    fn all_criteria_is_strong() {
        let s = strength("Abcdefg1!");
        assert_eq!(s.score, 4);
        assert_eq!(s.label, "Strong");
        assert_eq!(s.percent(), 100);
    }

    #[test]
    fn criteria_are_independent() {
        assert_eq!(strength("abcdefgh").label, "Weak");
        assert_eq!(strength("A").label, "Weak");
        assert_eq!(strength("1").label, "Weak");
        assert_eq!(strength("!").label, "Weak");
        assert_eq!(strength("A1").label, "Fair");
    }

    #[test]
    fn whitespace_counts_as_symbol() {
        assert_eq!(strength("a b").score, 1);
    }

    #[test]
    fn rgb_parses_hex_color() {
        assert_eq!(strength("Abcdefg1!").rgb(), Some((0x22, 0xc5, 0x5e)));
        assert_eq!(strength("abc").rgb(), None);
    }
}
