//! Text layout engine
//!
//! Turns (optionally marked-up) text into positioned lines of styled
//! chunks:
//!
//! 1. split on explicit line breaks and tokenize each line
//! 2. resolve chunk styles through a stack of open directives (the stack
//!    carries over line breaks)
//! 3. apply the oversized policy against `max_width`
//! 4. stack lines vertically and align them horizontally
//! 5. apply `fit` / `hide` against the whole block
//!
//! Degenerate boxes never error: they produce hidden lines or a hidden block.

use std::collections::VecDeque;
use std::str::FromStr;

use strata_core::Bounds;
use tracing::trace;

use crate::bidi;
use crate::markup::{parse_markup, MarkupOptions, MarkupToken};
use crate::measure::TextMeasurer;
use crate::style::{FontSpec, TextAlign, TextStyle};
use crate::Result;

const EPSILON: f32 = 1e-3;

/// What to do with content that exceeds the box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Oversized {
    #[default]
    None,
    Truncate,
    Wrap,
    WrapNoBreak,
    Fit,
    Hide,
}

impl FromStr for Oversized {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Oversized::None),
            "truncate" => Ok(Oversized::Truncate),
            "wrap" => Ok(Oversized::Wrap),
            "wrap-no-break" => Ok(Oversized::WrapNoBreak),
            "fit" => Ok(Oversized::Fit),
            "hide" => Ok(Oversized::Hide),
            other => Err(format!("unknown oversized behavior '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl FromStr for TextDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "ltr" => Ok(TextDirection::Ltr),
            "rtl" => Ok(TextDirection::Rtl),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Layout options
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub oversized: Oversized,
    /// Appended to truncated lines
    pub ellipsis: String,
    /// Break inside words when truncating or wrapping
    pub break_words: bool,
    /// Below this `fit` scale the block is hidden instead
    pub min_scale: f32,
    /// Line height multiplier over ascent + descent
    pub line_height: f32,
    /// Extra space between lines separated by an explicit break
    pub paragraph_gap: f32,
    pub text_align: TextAlign,
    pub direction: TextDirection,
    pub markup: MarkupOptions,
    /// Treat brackets as plain text
    pub ignore_formatting: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            oversized: Oversized::None,
            ellipsis: "…".to_string(),
            break_words: false,
            min_scale: 0.0,
            line_height: 1.2,
            paragraph_gap: 0.0,
            text_align: TextAlign::Start,
            direction: TextDirection::Ltr,
            markup: MarkupOptions::default(),
            ignore_formatting: false,
        }
    }
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_max_height(mut self, height: f32) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn with_oversized(mut self, oversized: Oversized) -> Self {
        self.oversized = oversized;
        self
    }

    pub fn with_ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.ellipsis = ellipsis.into();
        self
    }

    pub fn with_break_words(mut self, break_words: bool) -> Self {
        self.break_words = break_words;
        self
    }

    pub fn with_min_scale(mut self, min_scale: f32) -> Self {
        self.min_scale = min_scale;
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.text_align = align;
        self
    }

    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// A styled, measured piece of one line
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Text in visual order
    pub text: String,
    pub style: TextStyle,
    /// Left edge, relative to the block
    pub x: f32,
    /// Baseline, relative to the block top (includes baseline shift)
    pub baseline: f32,
    /// Offset of the glyphs inside a fixed-width chunk
    pub text_offset: f32,
    pub width: f32,
    pub height: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// One laid-out line
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub chunks: Vec<TextChunk>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Nothing on this line could be placed
    pub hidden: bool,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Layout result of a text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    /// Width of the widest line, unscaled
    pub width: f32,
    /// Total height, unscaled
    pub height: f32,
    /// Width lines were aligned in
    pub align_width: f32,
    /// Uniform scale from `fit`, 1.0 otherwise
    pub scale: f32,
    pub hidden: bool,
    pub truncated: bool,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            width: 0.0,
            height: 0.0,
            align_width: 0.0,
            scale: 1.0,
            hidden: false,
            truncated: false,
        }
    }
}

impl TextBlock {
    /// Visible text, one `\n`-separated entry per visible line
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.hidden)
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn chunks(&self) -> impl Iterator<Item = &TextChunk> {
        self.lines.iter().flat_map(|l| l.chunks.iter())
    }

    /// Local bounds of the painted content, scale applied; empty when hidden
    pub fn bounds(&self) -> Bounds {
        if self.hidden {
            return Bounds::EMPTY;
        }
        let mut bounds = Bounds::EMPTY;
        for line in self.lines.iter().filter(|l| !l.hidden) {
            bounds.include_xy(line.x * self.scale, line.y * self.scale);
            bounds.include_xy(
                (line.x + line.width) * self.scale,
                (line.y + line.height) * self.scale,
            );
        }
        bounds
    }
}

type Run = (String, TextStyle);

struct RawLine {
    runs: Vec<Run>,
    hidden: bool,
    paragraph_start: bool,
}

impl RawLine {
    fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            hidden: false,
            paragraph_start: false,
        }
    }

    fn hidden() -> Self {
        Self {
            runs: Vec::new(),
            hidden: true,
            paragraph_start: false,
        }
    }
}

/// Lay out `text` with `base` as the default style
pub fn layout_text(
    text: &str,
    base: &TextStyle,
    options: &LayoutOptions,
    measurer: &dyn TextMeasurer,
) -> Result<TextBlock> {
    let source_lines = resolve_runs(text, base, options)?;
    let max_width = options.max_width.filter(|w| w.is_finite());
    let engine = Engine { options, measurer };

    let mut raw_lines = Vec::new();
    let mut truncated = false;
    for (index, runs) in source_lines.into_iter().enumerate() {
        let start = raw_lines.len();
        match (options.oversized, max_width) {
            (Oversized::Truncate, Some(w)) => {
                let (line, cut) = engine.truncate_line(runs, w);
                truncated |= cut;
                raw_lines.push(line);
            }
            (Oversized::Wrap | Oversized::WrapNoBreak, Some(w)) => {
                raw_lines.extend(engine.wrap_line(runs, w));
            }
            _ => raw_lines.push(RawLine::new(runs)),
        }
        if index > 0 {
            if let Some(first) = raw_lines.get_mut(start) {
                first.paragraph_start = true;
            }
        }
    }

    let mut block = engine.stack(raw_lines, base, max_width);
    block.truncated |= truncated;

    let max_height = options.max_height.filter(|h| h.is_finite());
    let overflows = max_width.is_some_and(|w| block.width > w + EPSILON)
        || max_height.is_some_and(|h| block.height > h + EPSILON);
    match options.oversized {
        Oversized::Fit if overflows => {
            let sx = max_width.map_or(1.0, |w| w / block.width.max(EPSILON));
            let sy = max_height.map_or(1.0, |h| h / block.height.max(EPSILON));
            block.scale = sx.min(sy).clamp(0.0, 1.0);
            if block.scale < options.min_scale || block.scale <= 0.0 {
                trace!(scale = block.scale, "fit scale below minimum, hiding text");
                block.hidden = true;
            }
        }
        Oversized::Hide if overflows => block.hidden = true,
        _ => {}
    }
    Ok(block)
}

/// Tokenize and resolve the style of every run, per source line
fn resolve_runs(text: &str, base: &TextStyle, options: &LayoutOptions) -> Result<Vec<Vec<Run>>> {
    if options.ignore_formatting {
        return Ok(text
            .split('\n')
            .map(|l| {
                let l = l.strip_suffix('\r').unwrap_or(l);
                if l.is_empty() {
                    Vec::new()
                } else {
                    vec![(l.to_string(), base.clone())]
                }
            })
            .collect());
    }

    let lines = parse_markup(text, &options.markup)?;
    let mut stack: Vec<TextStyle> = vec![base.clone()];
    let mut out = Vec::with_capacity(lines.len());
    for tokens in lines {
        let mut runs = Vec::new();
        for token in tokens {
            match token {
                MarkupToken::Text(t) => {
                    let style = stack.last().cloned().unwrap_or_else(|| base.clone());
                    runs.push((t, style));
                }
                MarkupToken::Open(directives) => {
                    let mut style = stack.last().cloned().unwrap_or_else(|| base.clone());
                    for d in &directives {
                        style.apply(d);
                    }
                    stack.push(style);
                }
                MarkupToken::Close => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
            }
        }
        out.push(runs);
    }
    Ok(out)
}

struct Engine<'a> {
    options: &'a LayoutOptions,
    measurer: &'a dyn TextMeasurer,
}

impl Engine<'_> {
    fn width(&self, text: &str, style: &TextStyle) -> f32 {
        style
            .fixed_width
            .unwrap_or_else(|| self.measurer.width(text, &style.font()))
    }

    /// Byte length of the longest prefix of `text` no wider than `avail`
    fn fit_prefix(&self, text: &str, font: &FontSpec, avail: f32) -> usize {
        let ends: Vec<usize> = text
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();
        let (mut lo, mut hi) = (0usize, ends.len());
        // Invariant: ends[..lo] fit, ends[hi..] do not
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.measurer.width(&text[..ends[mid]], font) <= avail + EPSILON {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            0
        } else {
            ends[lo - 1]
        }
    }

    /// Cut `text` so it fits `avail`, preferring the last word boundary
    ///
    /// When the window has no non-alphanumeric character at all the cut
    /// falls back to the raw character count.
    fn truncate_text<'t>(&self, text: &'t str, font: &FontSpec, avail: f32) -> &'t str {
        if avail <= 0.0 {
            return "";
        }
        let n = self.fit_prefix(text, font, avail);
        if n == 0 || self.options.break_words {
            return &text[..n];
        }
        if text[n..].chars().next().map_or(true, |c| !c.is_alphanumeric()) {
            return &text[..n];
        }
        match text[..n].char_indices().rev().find(|(_, c)| !c.is_alphanumeric()) {
            Some((i, _)) => &text[..i],
            None => &text[..n],
        }
    }

    fn truncate_line(&self, runs: Vec<Run>, max_width: f32) -> (RawLine, bool) {
        let mut out = Vec::with_capacity(runs.len());
        let mut used = 0.0;
        for (text, style) in runs {
            let w = self.width(&text, &style);
            if used + w <= max_width + EPSILON {
                used += w;
                out.push((text, style));
                continue;
            }
            let font = style.font();
            let ellipsis_width = self.measurer.width(&self.options.ellipsis, &font);
            let avail = max_width - used - ellipsis_width;
            let kept = if style.fixed_width.is_some() {
                ""
            } else {
                self.truncate_text(&text, &font, avail)
            };
            let mut cut = kept.trim_end().to_string();
            cut.push_str(&self.options.ellipsis);
            trace!(original = %text, truncated = %cut, "line truncated");
            let mut style = style;
            style.fixed_width = None;
            out.push((cut, style));
            return (RawLine::new(out), true);
        }
        (RawLine::new(out), false)
    }

    /// Byte offset to break `text` at so the head fits `avail`
    fn wrap_split(&self, text: &str, font: &FontSpec, avail: f32, line_empty: bool) -> Option<usize> {
        if avail <= 0.0 {
            return None;
        }
        let no_break = self.options.oversized == Oversized::WrapNoBreak;
        let n = self.fit_prefix(text, font, avail);
        if n == 0 {
            return None;
        }
        if self.options.break_words && !no_break {
            return Some(n);
        }
        let has_content = |b: usize| !text[..b].trim().is_empty();
        if text[n..].chars().next().is_some_and(char::is_whitespace) && has_content(n) {
            return Some(n);
        }
        let boundary = text[..n].char_indices().rev().find_map(|(i, c)| {
            if c.is_whitespace() {
                Some(i)
            } else if c == '-' && i + 1 < n {
                Some(i + 1)
            } else {
                None
            }
        });
        match boundary {
            Some(b) if has_content(b) => Some(b),
            _ if line_empty && !no_break => Some(n),
            _ => None,
        }
    }

    fn wrap_line(&self, runs: Vec<Run>, max_width: f32) -> Vec<RawLine> {
        let mut lines = Vec::new();
        let mut current: Vec<Run> = Vec::new();
        let mut used = 0.0;
        let mut queue: VecDeque<Run> = runs.into();

        while let Some((text, style)) = queue.pop_front() {
            if text.is_empty() {
                continue;
            }
            let w = self.width(&text, &style);
            if used + w <= max_width + EPSILON {
                used += w;
                current.push((text, style));
                continue;
            }

            let line_empty = current.is_empty();
            let split = if style.fixed_width.is_some() {
                None
            } else {
                self.wrap_split(&text, &style.font(), max_width - used, line_empty)
            };

            match split {
                Some(at) => {
                    let (head, tail) = text.split_at(at);
                    let head = head.trim_end();
                    if !head.is_empty() {
                        current.push((head.to_string(), style.clone()));
                    }
                    lines.push(RawLine::new(std::mem::take(&mut current)));
                    used = 0.0;
                    let tail = tail.trim_start();
                    if !tail.is_empty() {
                        queue.push_front((tail.to_string(), style));
                    }
                }
                None if !line_empty => {
                    lines.push(RawLine::new(std::mem::take(&mut current)));
                    used = 0.0;
                    let rest = text.trim_start();
                    if !rest.is_empty() {
                        queue.push_front((rest.to_string(), style));
                    }
                }
                None => {
                    if self.options.oversized == Oversized::WrapNoBreak || style.fixed_width.is_some() {
                        // Place the first word whole and let it overflow
                        let end = if style.fixed_width.is_some() {
                            text.len()
                        } else {
                            text.find(char::is_whitespace).unwrap_or(text.len())
                        };
                        let (head, tail) = text.split_at(end);
                        current.push((head.to_string(), style.clone()));
                        lines.push(RawLine::new(std::mem::take(&mut current)));
                        used = 0.0;
                        let tail = tail.trim_start();
                        if !tail.is_empty() {
                            queue.push_front((tail.to_string(), style));
                        }
                    } else {
                        trace!(text = %text, max_width, "no wrap progress possible, hiding line");
                        lines.push(RawLine::hidden());
                        break;
                    }
                }
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(RawLine::new(current));
        }
        lines
    }

    /// Measure chunks, stack lines and align them
    fn stack(&self, raw_lines: Vec<RawLine>, base: &TextStyle, max_width: Option<f32>) -> TextBlock {
        let options = self.options;
        let base_metrics = self.measurer.measure("", &base.font());
        let rtl = options.direction == TextDirection::Rtl;
        let clip_height = match options.oversized {
            Oversized::Wrap | Oversized::WrapNoBreak | Oversized::Truncate => {
                options.max_height.filter(|h| h.is_finite())
            }
            _ => None,
        };

        let mut block = TextBlock::default();
        let mut y = 0.0f32;
        for raw in raw_lines {
            if raw.paragraph_start {
                y += options.paragraph_gap;
            }

            let mut chunks = Vec::with_capacity(raw.runs.len());
            let mut ascent = 0.0f32;
            let mut descent = 0.0f32;
            let mut x = 0.0f32;
            for (text, style) in raw.runs {
                let m = self.measurer.measure(&text, &style.font());
                let width = style.fixed_width.unwrap_or(m.width);
                let text_offset = match (style.fixed_width, style.fixed_align) {
                    (Some(w), TextAlign::Center) => (w - m.width) / 2.0,
                    (Some(w), TextAlign::End) => w - m.width,
                    _ => 0.0,
                };
                let shift = style.baseline_offset();
                ascent = ascent.max(m.ascent - shift);
                descent = descent.max(m.descent + shift);
                let visual = if rtl || bidi::has_rtl(&text) {
                    bidi::visual_text(&text, rtl)
                } else {
                    text
                };
                chunks.push(TextChunk {
                    text: visual,
                    style,
                    x,
                    baseline: shift,
                    text_offset,
                    width,
                    height: m.height(),
                    ascent: m.ascent,
                    descent: m.descent,
                });
                x += width;
            }
            if chunks.is_empty() {
                ascent = base_metrics.ascent;
                descent = base_metrics.descent;
            }

            let content = ascent + descent;
            let height = content * options.line_height;
            if clip_height.is_some_and(|h| y + height > h + EPSILON) {
                block.truncated = true;
                break;
            }
            let baseline = y + (height - content) / 2.0 + ascent;
            for chunk in &mut chunks {
                chunk.baseline += baseline;
            }
            if rtl {
                // Visual order runs right to left
                chunks.reverse();
                let mut cx = 0.0;
                for chunk in &mut chunks {
                    chunk.x = cx;
                    cx += chunk.width;
                }
            }

            block.width = block.width.max(x);
            block.lines.push(TextLine {
                chunks,
                x: 0.0,
                y,
                width: x,
                height,
                ascent,
                descent,
                hidden: raw.hidden,
            });
            y += height;
        }
        block.height = y;

        let align_width = max_width.unwrap_or(block.width);
        block.align_width = align_width;
        let align = match (options.text_align, rtl) {
            (TextAlign::Start, true) => TextAlign::End,
            (TextAlign::End, true) => TextAlign::Start,
            (a, _) => a,
        };
        for line in &mut block.lines {
            let offset = match align {
                TextAlign::Start => 0.0,
                TextAlign::Center => (align_width - line.width) / 2.0,
                TextAlign::End => align_width - line.width,
            };
            line.x = offset;
            for chunk in &mut line.chunks {
                chunk.x += offset;
            }
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::EstimatedTextMeasurer;
    use crate::style::FontWeight;

    // 10px font: every character is 5.5px wide, ascent 8, descent 2
    fn base() -> TextStyle {
        TextStyle::new(10.0)
    }

    fn layout(text: &str, options: &LayoutOptions) -> TextBlock {
        layout_text(text, &base(), options, &EstimatedTextMeasurer).unwrap()
    }

    #[test]
    fn test_bold_and_regular_chunks() {
        let block = layout("[bold]Hi[/] there", &LayoutOptions::default());
        assert_eq!(block.lines.len(), 1);
        let chunks = &block.lines[0].chunks;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Hi");
        assert_eq!(chunks[0].style.weight, FontWeight::Bold);
        assert_eq!(chunks[1].text, " there");
        assert_eq!(chunks[1].style.weight, FontWeight::Regular);
        let sum: f32 = chunks.iter().map(|c| c.width).sum();
        assert!((block.lines[0].width - sum).abs() < 1e-4);
        assert!((chunks[1].x - chunks[0].width).abs() < 1e-4);
    }

    #[test]
    fn test_none_never_truncates() {
        let text = "a fairly long line of text that goes on";
        let options = LayoutOptions::default().with_max_width(20.0);
        let block = layout(text, &options);
        assert_eq!(block.text(), text);
        assert!(!block.truncated);
    }

    #[test]
    fn test_truncate_at_word_boundary() {
        // 11 chars fit in 60.5px; ellipsis takes one
        let options = LayoutOptions::default()
            .with_max_width(60.5)
            .with_oversized(Oversized::Truncate);
        let block = layout("hello wonderful world", &options);
        assert!(block.truncated);
        assert_eq!(block.text(), "hello…");
    }

    #[test]
    fn test_truncate_long_token_falls_back_to_characters() {
        let options = LayoutOptions::default()
            .with_max_width(33.0)
            .with_oversized(Oversized::Truncate);
        let block = layout("abcdefghijklmnop", &options);
        assert_eq!(block.text(), "abcde…");
    }

    #[test]
    fn test_truncate_keeps_fitting_text() {
        let options = LayoutOptions::default()
            .with_max_width(100.0)
            .with_oversized(Oversized::Truncate);
        let block = layout("short", &options);
        assert!(!block.truncated);
        assert_eq!(block.text(), "short");
    }

    #[test]
    fn test_truncate_output_never_longer() {
        let text = "one two three four five six seven";
        for width in [5.0, 12.0, 30.0, 55.0, 90.0, 150.0] {
            let options = LayoutOptions::default()
                .with_max_width(width)
                .with_oversized(Oversized::Truncate);
            let block = layout(text, &options);
            let out = block.text();
            assert!(out.chars().count() <= text.chars().count());
            if block.truncated {
                assert!(out.ends_with('…'), "{out:?}");
            }
        }
    }

    #[test]
    fn test_wrap_words() {
        // 10 chars per line
        let options = LayoutOptions::default()
            .with_max_width(55.0)
            .with_oversized(Oversized::Wrap);
        let block = layout("the quick brown fox", &options);
        let lines: Vec<String> = block.lines.iter().map(TextLine::text).collect();
        assert_eq!(lines, vec!["the quick", "brown fox"]);
        assert!(block.lines[1].y > block.lines[0].y);
    }

    #[test]
    fn test_wrap_preserves_style_across_break() {
        let options = LayoutOptions::default()
            .with_max_width(55.0)
            .with_oversized(Oversized::Wrap);
        let block = layout("[bold]the quick brown[/] fox", &options);
        assert_eq!(block.lines.len(), 2);
        let second = &block.lines[1].chunks;
        assert_eq!(second[0].text, "brown");
        assert_eq!(second[0].style.weight, FontWeight::Bold);
        assert_eq!(second[1].style.weight, FontWeight::Regular);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let options = LayoutOptions::default()
            .with_max_width(22.0)
            .with_oversized(Oversized::Wrap);
        let block = layout("abcdefghij", &options);
        let lines: Vec<String> = block.lines.iter().map(TextLine::text).collect();
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_no_break_overflows_long_word() {
        let options = LayoutOptions::default()
            .with_max_width(22.0)
            .with_oversized(Oversized::WrapNoBreak);
        let block = layout("abcdefghij xy", &options);
        let lines: Vec<String> = block.lines.iter().map(TextLine::text).collect();
        assert_eq!(lines, vec!["abcdefghij", "xy"]);
    }

    #[test]
    fn test_wrap_zero_progress_hides_line() {
        let options = LayoutOptions::default()
            .with_max_width(2.0)
            .with_oversized(Oversized::Wrap);
        let block = layout("abc\ndef", &options);
        assert_eq!(block.lines.len(), 2);
        assert!(block.lines.iter().all(|l| l.hidden));
        assert_eq!(block.text(), "");
    }

    #[test]
    fn test_fit_scales_down() {
        let options = LayoutOptions::default()
            .with_max_width(27.5)
            .with_oversized(Oversized::Fit);
        let block = layout("abcdefghij", &options);
        assert!((block.scale - 0.5).abs() < 1e-4);
        assert!(!block.hidden);
        assert!((block.bounds().width() - 27.5).abs() < 1e-3);
    }

    #[test]
    fn test_fit_below_min_scale_hides() {
        let options = LayoutOptions::default()
            .with_max_width(27.5)
            .with_oversized(Oversized::Fit)
            .with_min_scale(0.75);
        let block = layout("abcdefghij", &options);
        assert!(block.hidden);
        assert!(block.bounds().is_empty());
    }

    #[test]
    fn test_hide_when_oversized() {
        let options = LayoutOptions::default()
            .with_max_width(10.0)
            .with_oversized(Oversized::Hide);
        assert!(layout("abcdefghij", &options).hidden);
        assert!(!layout("a", &options).hidden);
    }

    #[test]
    fn test_line_heights_and_alignment() {
        let options = LayoutOptions::default()
            .with_max_width(100.0)
            .with_align(TextAlign::Center);
        let block = layout("ab\nabcd", &options);
        // (8 + 2) * 1.2
        assert!((block.lines[0].height - 12.0).abs() < 1e-4);
        assert!((block.lines[1].y - 12.0).abs() < 1e-4);
        assert!((block.height - 24.0).abs() < 1e-4);
        assert!((block.lines[0].x - (100.0 - 11.0) / 2.0).abs() < 1e-4);
        assert!((block.lines[1].x - (100.0 - 22.0) / 2.0).abs() < 1e-4);
        // Baseline sits ascent below the half leading
        assert!((block.lines[0].chunks[0].baseline - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_end_alignment_without_box_uses_widest_line() {
        let options = LayoutOptions::default().with_align(TextAlign::End);
        let block = layout("ab\nabcd", &options);
        assert!((block.lines[0].x - 11.0).abs() < 1e-4);
        assert_eq!(block.lines[1].x, 0.0);
    }

    #[test]
    fn test_styles_carry_over_explicit_breaks() {
        let block = layout("[italic]a\nb[/]c", &LayoutOptions::default());
        let second = &block.lines[1].chunks;
        assert_eq!(second[0].style.style, crate::style::FontStyle::Italic);
        assert_eq!(second[1].style.style, crate::style::FontStyle::Normal);
    }

    #[test]
    fn test_fixed_width_chunk() {
        let block = layout("[width: 50 text-align: end]ab[/]c", &LayoutOptions::default());
        let chunks = &block.lines[0].chunks;
        assert_eq!(chunks[0].width, 50.0);
        assert!((chunks[0].text_offset - 39.0).abs() < 1e-4);
        assert_eq!(chunks[1].x, 50.0);
    }

    #[test]
    fn test_malformed_markup_is_error() {
        let result = layout_text("[nonsense]x", &base(), &LayoutOptions::default(), &EstimatedTextMeasurer);
        assert!(result.is_err());
    }

    #[test]
    fn test_ignore_formatting() {
        let options = LayoutOptions {
            ignore_formatting: true,
            ..Default::default()
        };
        assert_eq!(layout("[nonsense]x", &options).text(), "[nonsense]x");
    }

    #[test]
    fn test_max_height_drops_lines_when_wrapping() {
        let options = LayoutOptions::default()
            .with_max_width(55.0)
            .with_max_height(12.0)
            .with_oversized(Oversized::Wrap);
        let block = layout("the quick brown fox", &options);
        assert_eq!(block.lines.len(), 1);
        assert!(block.truncated);
    }

    #[test]
    fn test_rtl_direction_flips_alignment() {
        let options = LayoutOptions::default()
            .with_max_width(100.0)
            .with_direction(TextDirection::Rtl);
        let block = layout("ab", &options);
        assert!((block.lines[0].x - 89.0).abs() < 1e-4);
    }
}
