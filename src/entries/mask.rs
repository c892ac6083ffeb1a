//! Key Mask Matching
//!
//! Glob-style key masks: `*` matches any run of characters (including none),
//! `?` matches exactly one character, everything else matches literally.
//! Matching is case-sensitive and anchored at both ends.

use regex::Regex;

const WILDCARDS: [char; 2] = ['*', '?'];

/// Whether a key contains a wildcard character
pub fn has_wildcard(key: &str) -> bool {
    key.contains(WILDCARDS)
}

/// A compiled key mask
#[derive(Debug, Clone)]
pub struct KeyMask {
    mask: String,
    regex: Regex,
}

impl KeyMask {
    /// Compile a mask into an anchored matcher
    pub fn compile(mask: &str) -> Result<Self, regex::Error> {
        let mut pattern = String::with_capacity(mask.len() * 2 + 8);
        pattern.push_str("(?s)^");

        let mut previous_star = false;
        for ch in mask.chars() {
            match ch {
                '*' => {
                    // consecutive stars collapse into one
                    if !previous_star {
                        pattern.push_str(".*");
                    }
                }
                '?' => pattern.push('.'),
                other => {
                    let mut buf = [0u8; 4];
                    pattern.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
            previous_star = ch == '*';
        }
        pattern.push('$');

        Ok(Self {
            mask: mask.to_string(),
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.mask
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(mask: &str, key: &str) -> bool {
        KeyMask::compile(mask).unwrap().matches(key)
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("svc.*"));
        assert!(has_wildcard("svc.?"));
        assert!(!has_wildcard("svc.a"));
        assert!(!has_wildcard(""));
    }

    #[test]
    fn test_compiled_mask_keeps_source() {
        let mask = KeyMask::compile("svc.*.port").unwrap();
        assert_eq!(mask.as_str(), "svc.*.port");
        assert!(mask.matches("svc.web.port"));
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(matches("svc.*", "svc.a"));
        assert!(matches("svc.*", "svc."));
        assert!(matches("svc.*", "svc.a.b"));
        assert!(!matches("svc.*", "svc"));
        assert!(matches("ot*er", "other"));
        assert!(matches("ot*er", "oter"));
        assert!(matches("*", ""));
        assert!(matches("**", "anything.at.all"));
    }

    #[test]
    fn test_question_matches_one_char() {
        assert!(matches("svc.?", "svc.a"));
        assert!(!matches("svc.?", "svc.ab"));
        assert!(!matches("svc.?", "svc."));
        assert!(matches("a?c", "a€c"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert!(!matches("svc.*", "svcxa"));
        assert!(matches("a+b(*)", "a+b(1)"));
        assert!(!matches("a+b(*)", "aab(1)"));
        assert!(matches("[x]*", "[x]y"));
        assert!(matches("$price*", "$price.usd"));
    }

    #[test]
    fn test_case_sensitive_and_anchored() {
        assert!(!matches("svc.*", "SVC.a"));
        assert!(!matches("vc.*", "svc.a"));
        assert!(!matches("svc.?", "svc.a.extra"));
    }
}
