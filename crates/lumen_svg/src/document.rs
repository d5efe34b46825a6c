//! SVG document type and loading

use std::fs;
use std::path::Path as FilePath;
use std::str::FromStr;

use lumen_core::{Rect, Size};
use lumen_paint::{PaintContext, Pixmap};
use tracing::debug;

use crate::error::{Result, SvgError};
use crate::reader::read_svg;
use crate::render::render_tree;
use crate::tree::SvgTree;
use crate::writer::write_svg;

/// A loaded SVG document
#[derive(Clone, Debug)]
pub struct SvgDocument {
    tree: SvgTree,
    /// Viewport the bounds were last computed for
    laid_out: Option<Size>,
    next_id: u32,
}

impl SvgDocument {
    /// Wrap an existing tree
    pub fn new(tree: SvgTree) -> Self {
        Self {
            tree,
            laid_out: None,
            next_id: 0,
        }
    }

    /// Load an SVG document from a file
    pub fn from_file(path: impl AsRef<FilePath>) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_data(&data)
    }

    /// Load an SVG document from raw bytes
    pub fn from_data(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|e| SvgError::Parse(e.to_string()))?;
        Self::parse(text)
    }

    /// Load an SVG document from text
    pub fn parse(text: &str) -> Result<Self> {
        let tree = read_svg(text)?;
        debug!(nodes = tree.len(), "svg document loaded");
        Ok(Self::new(tree))
    }

    pub fn tree(&self) -> &SvgTree {
        &self.tree
    }

    /// Mutable access; bounds are recomputed before the next render
    pub fn tree_mut(&mut self) -> &mut SvgTree {
        self.laid_out = None;
        &mut self.tree
    }

    /// Intrinsic size of the document
    pub fn size(&self) -> Size {
        self.tree.size()
    }

    /// Bounds of the drawn content in document pixels
    pub fn bounds(&mut self) -> Rect {
        let size = self.size();
        self.layout(size);
        self.tree
            .get(self.tree.root())
            .map_or(Rect::ZERO, |n| n.bounds.world)
    }

    /// Serialize back to SVG text
    pub fn to_svg_string(&self) -> String {
        write_svg(&self.tree)
    }

    pub fn save(&self, path: impl AsRef<FilePath>) -> Result<()> {
        fs::write(path, self.to_svg_string())?;
        Ok(())
    }

    /// An element id not used anywhere in the document, e.g. `grad3`
    pub fn unique_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("{prefix}{}", self.next_id);
            if self.tree.find(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn layout(&mut self, viewport: Size) {
        if self.laid_out != Some(viewport) {
            self.tree.compute_bounds(viewport);
            self.laid_out = Some(viewport);
        }
    }

    /// Draw the document scaled into `rect` of an existing context
    pub fn render_into(&mut self, ctx: &mut PaintContext<'_>, rect: Rect) {
        self.layout(rect.size);
        render_tree(&self.tree, ctx, rect);
    }

    /// Rasterize into a new transparent image of the given size
    pub fn render(&mut self, width: u32, height: u32) -> Result<Pixmap> {
        let mut pixmap = Pixmap::new(width, height).ok_or(SvgError::Target(width, height))?;
        {
            let mut ctx = PaintContext::new(&mut pixmap);
            self.render_into(&mut ctx, Rect::new(0.0, 0.0, width as f32, height as f32));
        }
        Ok(pixmap)
    }
}

impl FromStr for SvgDocument {
    type Err = SvgError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_paint::pixel_at;

    const GRADIENT_SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
        <defs>
            <linearGradient id="g" x1="0" y1="0" x2="1" y2="0">
                <stop offset="0" stop-color="white"/>
                <stop offset="1" stop-color="black"/>
            </linearGradient>
        </defs>
        <rect width="100" height="100" fill="url(#g)"/>
    </svg>"#;

    fn gray(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        let [r, g, b, a] = pixel_at(pixmap, x, y).unwrap();
        assert_eq!(a, 255);
        assert!(r == g && g == b, "not gray: {r} {g} {b}");
        r
    }

    #[test]
    fn linear_gradient_in_bounding_box_units() {
        let mut doc = SvgDocument::parse(GRADIENT_SQUARE).unwrap();
        let pixmap = doc.render(100, 100).unwrap();
        let mid = gray(&pixmap, 50, 50);
        assert!((116..=132).contains(&mid), "mid = {mid}");
        assert!(gray(&pixmap, 0, 50) >= 250);
        assert!(gray(&pixmap, 99, 50) <= 5);
    }

    #[test]
    fn percent_gradient_vector_matches() {
        let text = GRADIENT_SQUARE.replace(r#"x2="1""#, r#"x2="100%""#);
        let mut doc = SvgDocument::parse(&text).unwrap();
        let pixmap = doc.render(100, 100).unwrap();
        assert!((116..=132).contains(&gray(&pixmap, 50, 50)));
    }

    #[test]
    fn view_box_scales_to_target() {
        let mut doc = SvgDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
                <rect x="5" width="5" height="10" fill="red"/>
            </svg>"#,
        )
        .unwrap();
        let pixmap = doc.render(40, 40).unwrap();
        assert_eq!(pixel_at(&pixmap, 30, 20), Some([255, 0, 0, 255]));
        assert_eq!(pixel_at(&pixmap, 10, 20), Some([0, 0, 0, 0]));
        assert_eq!(doc.bounds(), Rect::new(5.0, 0.0, 5.0, 10.0));
    }

    #[test]
    fn clip_path_limits_fill() {
        let mut doc = SvgDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
                <clipPath id="left"><rect width="10" height="20"/></clipPath>
                <rect width="20" height="20" fill="blue" clip-path="url(#left)"/>
            </svg>"#,
        )
        .unwrap();
        let pixmap = doc.render(20, 20).unwrap();
        assert_eq!(pixel_at(&pixmap, 5, 10), Some([0, 0, 255, 255]));
        assert_eq!(pixel_at(&pixmap, 15, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn markers_are_drawn_at_vertices() {
        let mut doc = SvgDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
                <marker id="m" refX="2" refY="2" markerWidth="4" markerHeight="4" markerUnits="userSpaceOnUse">
                    <rect width="4" height="4" fill="lime"/>
                </marker>
                <polyline points="5,10 20,10 35,10" fill="none" stroke="none" marker-mid="url(#m)"/>
            </svg>"#,
        )
        .unwrap();
        let pixmap = doc.render(40, 20).unwrap();
        assert_eq!(pixel_at(&pixmap, 20, 10), Some([0, 255, 0, 255]));
        assert_eq!(pixel_at(&pixmap, 5, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn use_cycle_terminates() {
        let mut doc = SvgDocument::parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
                <g id="a"><use href="#b"/></g>
                <g id="b"><use href="#a"/><rect width="10" height="10" fill="red"/></g>
            </svg>"##,
        )
        .unwrap();
        let pixmap = doc.render(10, 10).unwrap();
        assert_eq!(pixel_at(&pixmap, 5, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn unique_ids_skip_existing() {
        let mut doc = SvgDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="grad1"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.unique_id("grad"), "grad2");
        assert_eq!(doc.unique_id("grad"), "grad3");
    }
}
