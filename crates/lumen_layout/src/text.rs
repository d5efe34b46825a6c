//! Text measurement for layout
//!
//! Shaping belongs to an external font service; layout only needs advances.
//! A [`TextMeasurer`] measures single lines, and [`layout_text`] breaks a
//! paragraph into lines at Unicode line-break opportunities.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::style::{Style, WhiteSpace};

/// Text layout options that affect measurement
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayoutOptions {
    /// Line height multiplier
    pub line_height: f32,
    /// Extra spacing between letters in pixels
    pub letter_spacing: f32,
    /// Maximum width for wrapping (None = no wrapping)
    pub max_width: Option<f32>,
    pub font_family: String,
    pub white_space: WhiteSpace,
}

impl Default for TextLayoutOptions {
    fn default() -> Self {
        Self {
            line_height: 1.2,
            letter_spacing: 0.0,
            max_width: None,
            font_family: String::new(),
            white_space: WhiteSpace::Normal,
        }
    }
}

impl TextLayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options taken from a resolved style
    pub fn from_style(style: &Style) -> Self {
        Self {
            line_height: style.font.line_height,
            font_family: style.font.family.clone(),
            white_space: style.white_space,
            ..Self::default()
        }
    }

    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_line_height(mut self, height: f32) -> Self {
        self.line_height = height;
        self
    }
}

/// Single line measurement result
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    /// Line box height
    pub height: f32,
    /// Distance from the top of the line box to the baseline
    pub ascender: f32,
    /// Distance below the baseline, negative
    pub descender: f32,
}

/// Measures text advances
pub trait TextMeasurer: Send + Sync {
    /// Measure one line of text, ignoring `max_width`
    fn measure_line(&self, text: &str, font_size: f32, options: &TextLayoutOptions) -> TextMetrics;
}

/// Measurer used when no font service is attached.
///
/// Every character advances 0.55 em; line boxes are `line_height` em tall.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTextMeasurer;

impl TextMeasurer for EstimatedTextMeasurer {
    fn measure_line(&self, text: &str, font_size: f32, options: &TextLayoutOptions) -> TextMetrics {
        let chars = text.chars().count() as f32;
        let width = chars * (font_size * 0.55 + options.letter_spacing);
        let height = font_size * options.line_height;
        TextMetrics {
            width,
            height,
            ascender: font_size * 0.8 + (height - font_size) / 2.0,
            descender: -font_size * 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

/// A paragraph broken into lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<TextLine>,
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
}

impl TextLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Break `text` into lines no wider than `options.max_width` where possible.
///
/// A segment that does not fit on an empty line overflows on its own line.
pub fn layout_text(
    measurer: &dyn TextMeasurer,
    text: &str,
    font_size: f32,
    options: &TextLayoutOptions,
) -> TextLayout {
    let line_height = font_size * options.line_height;
    let wrap_at = match options.white_space {
        WhiteSpace::Normal => options.max_width,
        WhiteSpace::NoWrap | WhiteSpace::Pre => None,
    };
    let measure = |s: &str| measurer.measure_line(s, font_size, options).width;

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (pos, opportunity) in linebreaks(text) {
        let segment = &text[start..pos];
        start = pos;
        let mandatory = opportunity == BreakOpportunity::Mandatory;

        match wrap_at {
            Some(max) if !current.is_empty() => {
                let candidate = format!("{current}{segment}");
                if measure(candidate.trim_end()) > max {
                    lines.push(std::mem::take(&mut current));
                }
                current.push_str(segment);
            }
            _ => current.push_str(segment),
        }

        if mandatory && pos < text.len() {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    let lines: Vec<TextLine> = lines
        .into_iter()
        .map(|l| {
            let text = l.trim_end_matches(['\n', '\r']).trim_end().to_string();
            let width = measure(&text);
            TextLine { text, width }
        })
        .collect();
    let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
    TextLayout {
        height: line_height * lines.len() as f32,
        width,
        line_height,
        lines,
    }
}

/// Width of the widest unbreakable segment, the narrowest a paragraph can wrap to
pub fn min_content_width(
    measurer: &dyn TextMeasurer,
    text: &str,
    font_size: f32,
    options: &TextLayoutOptions,
) -> f32 {
    if options.white_space != WhiteSpace::Normal {
        return layout_text(measurer, text, font_size, options).width;
    }
    let mut start = 0;
    let mut widest: f32 = 0.0;
    for (pos, _) in linebreaks(text) {
        let word = text[start..pos].trim_end();
        widest = widest.max(measurer.measure_line(word, font_size, options).width);
        start = pos;
    }
    widest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(max: Option<f32>) -> TextLayoutOptions {
        TextLayoutOptions {
            max_width: max,
            ..TextLayoutOptions::default()
        }
    }

    #[test]
    fn estimated_advance() {
        let m = EstimatedTextMeasurer.measure_line("abcd", 10.0, &opts(None));
        assert!((m.width - 22.0).abs() < 1e-4);
        assert!((m.height - 12.0).abs() < 1e-4);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // 10px font: 5.5px per char, so "hello world" (60.5px) does not fit in 50px
        let layout = layout_text(&EstimatedTextMeasurer, "hello world again", 10.0, &opts(Some(50.0)));
        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world", "again"]);
        assert!((layout.height - 36.0).abs() < 1e-4);

        let wide = layout_text(&EstimatedTextMeasurer, "hello world again", 10.0, &opts(Some(200.0)));
        assert_eq!(wide.line_count(), 1);
        assert_eq!(wide.lines[0].text, "hello world again");
    }

    #[test]
    fn overlong_word_overflows_alone() {
        let layout = layout_text(&EstimatedTextMeasurer, "a supercalifragilistic b", 10.0, &opts(Some(30.0)));
        assert_eq!(layout.lines[1].text, "supercalifragilistic");
        assert!(layout.width > 30.0);
    }

    #[test]
    fn mandatory_breaks_split_lines() {
        let layout = layout_text(&EstimatedTextMeasurer, "one\ntwo", 10.0, &opts(None));
        assert_eq!(layout.line_count(), 2);
    }

    #[test]
    fn min_width_is_longest_word() {
        let w = min_content_width(&EstimatedTextMeasurer, "ab abcd abc", 10.0, &opts(None));
        assert!((w - 22.0).abs() < 1e-4);
    }
}
