//! G-code line tokenizer
//!
//! Stateless: turns one line of text into a command kind plus the axis
//! words it carries. Anything that cannot be recognised is skipped rather
//! than reported, so malformed input only ever thins out the result.

use regex::Regex;
use std::sync::OnceLock;

/// Command recognised at the start of a (comment-stripped) line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Linear move (G0, G1, G00, G01)
    Motion,
    /// Circular move (G2, G3, G02, G03); recognised but never interpolated
    Arc,
    /// Absolute positioning (G90)
    Absolute,
    /// Relative positioning (G91)
    Relative,
    /// Absolute extrusion (M82)
    ExtrudeAbsolute,
    /// Relative extrusion (M83)
    ExtrudeRelative,
    /// Position reset (G92)
    SetPosition,
    /// Anything else with content
    Other,
}

/// Axis words found on a line
///
/// A later word for the same letter replaces an earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisWords {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub r: Option<f64>,
}

impl AxisWords {
    fn set(&mut self, letter: char, value: f64) {
        match letter.to_ascii_uppercase() {
            'X' => self.x = Some(value),
            'Y' => self.y = Some(value),
            'Z' => self.z = Some(value),
            'E' => self.e = Some(value),
            'I' => self.i = Some(value),
            'J' => self.j = Some(value),
            'R' => self.r = Some(value),
            _ => {}
        }
    }

    /// At least one of X, Y or Z is present
    pub fn has_xyz(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }

    /// At least one of X or Y is present
    pub fn has_xy(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of tokenizing a line that had content after comment removal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenizedLine {
    pub kind: LineKind,
    pub words: AxisWords,
}

fn comment_regex() -> &'static Regex {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    COMMENT_REGEX.get_or_init(|| Regex::new(r"\(.*?\)|;.*$").expect("invalid regex pattern"))
}

fn motion_regex() -> &'static Regex {
    static MOTION_REGEX: OnceLock<Regex> = OnceLock::new();
    MOTION_REGEX.get_or_init(|| Regex::new(r"^(?:G0|G1|G00|G01)\b").expect("invalid regex pattern"))
}

fn arc_regex() -> &'static Regex {
    static ARC_REGEX: OnceLock<Regex> = OnceLock::new();
    ARC_REGEX.get_or_init(|| Regex::new(r"^(?:G2|G3|G02|G03)\b").expect("invalid regex pattern"))
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"(?i)([XYEIJRZ])([-+]?[0-9]*\.?[0-9]+)").expect("invalid regex pattern")
    })
}

/// Remove `( ... )` and `; ...` comments and trim the remainder
pub fn strip_comments(line: &str) -> String {
    comment_regex().replace_all(line, "").trim().to_string()
}

/// Classify an already comment-stripped line
pub fn classify(line: &str) -> LineKind {
    if motion_regex().is_match(line) {
        LineKind::Motion
    } else if arc_regex().is_match(line) {
        LineKind::Arc
    } else if line.starts_with("G90") {
        LineKind::Absolute
    } else if line.starts_with("G91") {
        LineKind::Relative
    } else if line.starts_with("M82") {
        LineKind::ExtrudeAbsolute
    } else if line.starts_with("M83") {
        LineKind::ExtrudeRelative
    } else if line.starts_with("G92") {
        LineKind::SetPosition
    } else {
        LineKind::Other
    }
}

/// Extract axis words from an already comment-stripped line
pub fn parse_words(line: &str) -> AxisWords {
    let mut words = AxisWords::default();
    for caps in word_regex().captures_iter(line) {
        let letter = caps[1].chars().next().unwrap_or(' ');
        if let Ok(value) = caps[2].parse::<f64>() {
            words.set(letter, value);
        }
    }
    words
}

/// Tokenize one raw line
///
/// Returns `None` for blank and comment-only lines.
pub fn tokenize(line: &str) -> Option<TokenizedLine> {
    let cleaned = strip_comments(line);
    if cleaned.is_empty() {
        return None;
    }

    Some(TokenizedLine {
        kind: classify(&cleaned),
        words: parse_words(&cleaned),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_both_comment_styles() {
        assert_eq!(strip_comments("G1 X1 (first) Y2 ; trailing"), "G1 X1  Y2");
        assert_eq!(strip_comments("   ; only a comment"), "");
        assert_eq!(strip_comments("(a)(b)G0 X3"), "G0 X3");
    }

    #[test]
    fn test_comment_only_line_is_none() {
        assert!(tokenize("; layer 1").is_none());
        assert!(tokenize("(setup)").is_none());
        assert!(tokenize("   ").is_none());
    }

    #[test]
    fn test_motion_variants() {
        for line in ["G0 X1", "G1 X1", "G00 X1", "G01 X1", "G1"] {
            assert_eq!(tokenize(line).unwrap().kind, LineKind::Motion, "{line}");
        }
    }

    #[test]
    fn test_motion_requires_word_boundary_and_case() {
        assert_eq!(tokenize("G10 L2 P1").unwrap().kind, LineKind::Other);
        assert_eq!(tokenize("g1 x5").unwrap().kind, LineKind::Other);
        assert_eq!(tokenize("G1X5").unwrap().kind, LineKind::Other);
    }

    #[test]
    fn test_mode_lines() {
        assert_eq!(tokenize("G90").unwrap().kind, LineKind::Absolute);
        assert_eq!(tokenize("G91 ; relative").unwrap().kind, LineKind::Relative);
        assert_eq!(tokenize("M82").unwrap().kind, LineKind::ExtrudeAbsolute);
        assert_eq!(tokenize("M83").unwrap().kind, LineKind::ExtrudeRelative);
        assert_eq!(tokenize("G92 E0").unwrap().kind, LineKind::SetPosition);
        assert_eq!(tokenize("G2 X1 Y1 I0.5 J0").unwrap().kind, LineKind::Arc);
    }

    #[test]
    fn test_words_signed_and_fractional() {
        let words = tokenize("G1 X-1.5 Y+.25 Z3 E0.04 F1200").unwrap().words;
        assert_eq!(words.x, Some(-1.5));
        assert_eq!(words.y, Some(0.25));
        assert_eq!(words.z, Some(3.0));
        assert_eq!(words.e, Some(0.04));
        assert!(words.i.is_none());
    }

    #[test]
    fn test_words_case_insensitive_last_wins() {
        let words = parse_words("G1 x1 X2 r4 i-1 j2");
        assert_eq!(words.x, Some(2.0));
        assert_eq!(words.r, Some(4.0));
        assert_eq!(words.i, Some(-1.0));
        assert_eq!(words.j, Some(2.0));
    }

    #[test]
    fn test_malformed_words_skipped() {
        let words = parse_words("G1 X Y.. Zabc");
        assert!(words.is_empty());
        assert!(!words.has_xyz());
    }

    #[test]
    fn test_commented_axis_ignored() {
        let words = tokenize("G1 X1 (Y9) ; Z7").unwrap().words;
        assert_eq!(words.x, Some(1.0));
        assert!(words.y.is_none());
        assert!(words.z.is_none());
    }
}
