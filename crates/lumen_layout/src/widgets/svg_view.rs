//! SVG image widget
//!
//! The document is rasterized into a backing image the size of the content
//! box and redrawn only when that size changes.

use std::cell::RefCell;
use std::path::Path;

use lumen_core::Size;
use lumen_paint::Pixmap;
use lumen_svg::SvgDocument;
use tracing::warn;

use crate::error::Result;
use crate::widget::{MeasureCx, RenderCx, Widget};

pub struct SvgView {
    doc: RefCell<SvgDocument>,
    cache: RefCell<Option<Pixmap>>,
}

impl SvgView {
    pub fn new(doc: SvgDocument) -> Self {
        Self {
            doc: RefCell::new(doc),
            cache: RefCell::new(None),
        }
    }

    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self::new(SvgDocument::parse(source)?))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(SvgDocument::from_file(path)?))
    }

    /// Edit the document; the backing image is redrawn on the next render
    pub fn edit(&mut self, f: impl FnOnce(&mut SvgDocument)) {
        f(self.doc.get_mut());
        *self.cache.get_mut() = None;
    }

    pub fn document(&self) -> SvgDocument {
        self.doc.borrow().clone()
    }

    /// Whether a backing image is currently cached
    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }
}

impl Widget for SvgView {
    fn type_name(&self) -> &'static str {
        "svg"
    }

    fn content_size(&self, _cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        self.doc.borrow().size()
    }

    fn render(&self, cx: &mut RenderCx<'_, '_>) {
        let dest = cx.geom.content;
        let (w, h) = (dest.width().round() as u32, dest.height().round() as u32);
        if w == 0 || h == 0 {
            return;
        }
        let mut cache = self.cache.borrow_mut();
        let stale = cache.as_ref().map_or(true, |p| p.width() != w || p.height() != h);
        if stale {
            match self.doc.borrow_mut().render(w, h) {
                Ok(p) => *cache = Some(p),
                Err(err) => {
                    warn!("svg render failed: {err}");
                    *cache = None;
                    return;
                }
            }
        }
        if let Some(p) = cache.as_ref() {
            cx.paint.draw_image(p, dest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str =
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"><rect width="24" height="24" fill="red"/></svg>"#;

    #[test]
    fn intrinsic_size_is_document_size() {
        let view = SvgView::parse(SQUARE).unwrap();
        let style = crate::style::Style::default();
        let size = view.content_size(
            &MeasureCx {
                measurer: &crate::text::EstimatedTextMeasurer,
                style: &style,
            },
            None,
        );
        assert_eq!(size, Size::new(24.0, 24.0));
    }

    #[test]
    fn malformed_source_is_a_format_error() {
        let err = SvgView::parse("<svg").err().unwrap();
        assert!(matches!(err, crate::error::LayoutError::Format(_)));
    }
}
