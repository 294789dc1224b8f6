//! Separator skeletons such as `999-99-9999` or `(999) 999-9999`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One position of a [`FormatPattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSlot {
    /// Any decimal digit.
    Digit,
    /// This exact character.
    Literal(char),
}

/// Ordered sequence of digit placeholders and literal separators.
///
/// Every ASCII digit in the template text is a placeholder; every other
/// character is a literal that must appear verbatim at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPattern {
    slots: Vec<PatternSlot>,
}

impl FormatPattern {
    /// Parse a template. Returns `None` for an empty or blank template.
    pub fn parse(template: &str) -> Option<Self> {
        let template = template.trim();
        if template.is_empty() {
            return None;
        }
        let slots = template
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    PatternSlot::Digit
                } else {
                    PatternSlot::Literal(c)
                }
            })
            .collect();
        Some(Self { slots })
    }

    /// The pattern's slots, in order.
    pub fn slots(&self) -> &[PatternSlot] {
        &self.slots
    }

    /// Number of digit placeholders.
    pub fn digit_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, PatternSlot::Digit))
            .count()
    }

    /// `true` if `value` has exactly this shape.
    pub fn matches(&self, value: &str) -> bool {
        let mut chars = value.chars();
        for slot in &self.slots {
            let ok = match (slot, chars.next()) {
                (PatternSlot::Digit, Some(c)) => c.is_ascii_digit(),
                (PatternSlot::Literal(l), Some(c)) => *l == c,
                (_, None) => false,
            };
            if !ok {
                return false;
            }
        }
        chars.next().is_none()
    }
}

impl fmt::Display for FormatPattern {
    /// Renders digit placeholders as `9`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            match slot {
                PatternSlot::Digit => f.write_str("9")?,
                PatternSlot::Literal(c) => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FormatPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FormatPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        FormatPattern::parse(&text)
            .ok_or_else(|| serde::de::Error::custom("format pattern must not be empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssn_pattern() {
        let p = FormatPattern::parse("999-99-9999").unwrap();
        assert_eq!(p.digit_slots(), 9);
        assert!(p.matches("123-45-6789"));
        assert!(!p.matches("123456789"));
        assert!(!p.matches("123-45-678"));
        assert!(!p.matches("123-45-67890"));
        assert!(!p.matches("12a-45-6789"));
    }

    #[test]
    fn phone_pattern_with_space_and_parens() {
        let p = FormatPattern::parse("(999) 999-9999").unwrap();
        assert!(p.matches("(555) 123-4567"));
        assert!(!p.matches("555-123-4567"));
    }

    #[test]
    fn any_digit_is_a_placeholder() {
        let p = FormatPattern::parse("12/34/5678").unwrap();
        assert_eq!(p.to_string(), "99/99/9999");
        assert!(p.matches("01/02/1999"));
    }

    #[test]
    fn blank_template_is_none() {
        assert!(FormatPattern::parse("").is_none());
        assert!(FormatPattern::parse("   ").is_none());
    }

    #[test]
    fn template_is_trimmed() {
        let p = FormatPattern::parse("  99999999 ").unwrap();
        assert_eq!(p.slots().len(), 8);
    }

    #[test]
    fn serde_uses_template_text() {
        let p: FormatPattern = serde_json::from_str("\"9999-9999\"").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"9999-9999\"");
        assert!(serde_json::from_str::<FormatPattern>("\"\"").is_err());
    }
}
