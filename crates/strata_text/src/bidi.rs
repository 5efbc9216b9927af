//! Bidirectional text helpers
//!
//! Line layout measures text in logical order. Drawing glyph by glyph needs
//! visual order, and per-glyph placement (circular text) needs segments that
//! keep right-to-left letter clusters together.

use unicode_bidi::{bidi_class, BidiClass, BidiInfo, Level};

/// A visual-order piece of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text in logical order
    pub text: String,
    pub rtl: bool,
}

pub fn is_rtl_char(c: char) -> bool {
    matches!(bidi_class(c), BidiClass::R | BidiClass::AL)
}

pub fn has_rtl(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

fn base_level(base_rtl: bool) -> Level {
    if base_rtl {
        Level::rtl()
    } else {
        Level::ltr()
    }
}

/// Characters of `text` in the order they appear on screen
pub fn visual_text(text: &str, base_rtl: bool) -> String {
    if text.is_empty() || (!base_rtl && !has_rtl(text)) {
        return text.to_string();
    }
    let info = BidiInfo::new(text, Some(base_level(base_rtl)));
    let mut out = String::with_capacity(text.len());
    for para in &info.paragraphs {
        out.push_str(&info.reorder_line(para, para.range.clone()));
    }
    out
}

/// Split into visual-order segments: one per character for left-to-right
/// runs, one per word for right-to-left runs
pub fn segments(text: &str, base_rtl: bool) -> Vec<Segment> {
    if text.is_empty() {
        return Vec::new();
    }
    if !base_rtl && !has_rtl(text) {
        return text
            .chars()
            .map(|c| Segment {
                text: c.to_string(),
                rtl: false,
            })
            .collect();
    }

    let info = BidiInfo::new(text, Some(base_level(base_rtl)));
    let mut out = Vec::new();
    for para in &info.paragraphs {
        let (levels, runs) = info.visual_runs(para, para.range.clone());
        for run in runs {
            let rtl = levels[run.start].is_rtl();
            let slice = &text[run];
            if rtl {
                // Words keep their letters together; words themselves flip
                let mut words: Vec<&str> = split_keep_spaces(slice);
                words.reverse();
                out.extend(words.into_iter().map(|w| Segment {
                    text: w.to_string(),
                    rtl: true,
                }));
            } else {
                out.extend(slice.chars().map(|c| Segment {
                    text: c.to_string(),
                    rtl: false,
                }));
            }
        }
    }
    out
}

/// Split into words and the single whitespace characters between them
fn split_keep_spaces(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if start < i {
                parts.push(&s[start..i]);
            }
            parts.push(&s[i..i + c.len_utf8()]);
            start = i + c.len_utf8();
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ltr_passthrough() {
        assert_eq!(visual_text("hello", false), "hello");
        let segs = segments("ab", false);
        assert_eq!(segs.len(), 2);
        assert!(!segs[0].rtl);
    }

    #[test]
    fn test_rtl_detection() {
        assert!(has_rtl("abc שלום"));
        assert!(!has_rtl("abc"));
    }

    #[test]
    fn test_rtl_run_reversed_visually() {
        // Hebrew letters alef, bet, gimel
        let text = "\u{05D0}\u{05D1}\u{05D2}";
        assert_eq!(visual_text(text, false), "\u{05D2}\u{05D1}\u{05D0}");
    }

    #[test]
    fn test_rtl_words_stay_clustered() {
        let text = "\u{05D0}\u{05D1} \u{05D2}\u{05D3}";
        let segs = segments(text, true);
        let words: Vec<&str> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(words, vec!["\u{05D2}\u{05D3}", " ", "\u{05D0}\u{05D1}"]);
        assert!(segs.iter().all(|s| s.rtl));
    }
}
