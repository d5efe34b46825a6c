//! Text label

use lumen_core::{Point, Size};
use lumen_paint::TextRun;

use crate::style::{Style, TextAlign, WhiteSpace};
use crate::text::{layout_text, min_content_width, TextLayout, TextLayoutOptions, TextMeasurer};
use crate::widget::{MeasureCx, RenderCx, Widget};

/// Widest a paragraph grows before the parent has allocated space, in em
const NATURAL_WRAP_EM: f32 = 30.0;

/// A run of text that wraps to the width it is given
#[derive(Clone, Debug, Default)]
pub struct Text {
    text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text; the caller is responsible for requesting layout
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    fn shape(&self, measurer: &dyn TextMeasurer, style: &Style, width: Option<f32>) -> TextLayout {
        let size = style.font_size();
        let opts = TextLayoutOptions::from_style(style);
        if style.white_space != WhiteSpace::Normal {
            return layout_text(measurer, &self.text, size, &opts);
        }
        let narrowest = min_content_width(measurer, &self.text, size, &opts);
        let wrap = match width {
            Some(w) => w,
            None => {
                let natural = measurer.measure_line(&self.text, size, &opts).width;
                natural.min(size * NATURAL_WRAP_EM)
            }
        };
        layout_text(measurer, &self.text, size, &opts.with_max_width(wrap.max(narrowest)))
    }
}

impl Widget for Text {
    fn type_name(&self) -> &'static str {
        "text"
    }

    fn content_size(&self, cx: &MeasureCx<'_>, width: Option<f32>) -> Size {
        let layout = self.shape(cx.measurer, cx.style, width);
        Size::new(layout.width, layout.height)
    }

    fn is_flexible(&self, style: &Style) -> bool {
        style.white_space == WhiteSpace::Normal
    }

    fn render(&self, cx: &mut RenderCx<'_, '_>) {
        let content = cx.geom.content;
        let layout = self.shape(cx.measurer, cx.style, Some(content.width()));
        let style = cx.style;
        for (i, line) in layout.lines.iter().enumerate() {
            let free = (content.width() - line.width).max(0.0);
            let dx = match style.text_align {
                TextAlign::Start => 0.0,
                TextAlign::Center => free / 2.0,
                TextAlign::End => free,
            };
            cx.paint.draw_text(&TextRun {
                text: line.text.clone(),
                origin: Point::new(content.x() + dx, content.y() + layout.line_height * i as f32),
                font_size: style.font_size(),
                line_height: layout.line_height,
                family: style.font.family.clone(),
                weight: style.font.weight,
                color: style.color,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::EstimatedTextMeasurer;

    fn measure(text: &Text, style: &Style, width: Option<f32>) -> Size {
        text.content_size(
            &MeasureCx {
                measurer: &EstimatedTextMeasurer,
                style,
            },
            width,
        )
    }

    #[test]
    fn wraps_to_allocated_width() {
        let mut style = Style::default();
        style.font.size = lumen_core::Length::px(10.0);
        style.to_dots(&lumen_core::UnitContext::default());
        let text = Text::new("hello world again");
        assert_eq!(measure(&text, &style, None).height, 12.0);
        let narrow = measure(&text, &style, Some(50.0));
        assert_eq!(narrow.height, 36.0);
        // never narrower than the longest word
        let tiny = measure(&text, &style, Some(1.0));
        assert!((tiny.width - 27.5).abs() < 1e-4);
    }

    #[test]
    fn nowrap_ignores_width() {
        let mut style = Style::default();
        style.white_space = WhiteSpace::NoWrap;
        let text = Text::new("hello world");
        assert!(!text.is_flexible(&style));
        let a = measure(&text, &style, Some(10.0));
        let b = measure(&text, &style, None);
        assert_eq!(a, b);
    }
}
