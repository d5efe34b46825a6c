//! SVG loading, editing, saving and rendering for Lumen
//!
//! Documents are parsed with `roxmltree` into an editable [`SvgTree`] arena.
//! Elements the toolkit does not model (text, filters, ...) are kept verbatim,
//! so writing a document back produces an equivalent file.
//!
//! # Example
//!
//! ```rust
//! use lumen_svg::SvgDocument;
//!
//! let mut doc: SvgDocument =
//!     r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8"/></svg>"#
//!         .parse()
//!         .unwrap();
//! let pixmap = doc.render(16, 16).unwrap();
//! assert_eq!(pixmap.width(), 16);
//! ```

mod document;
mod error;
pub mod path_data;
mod reader;
mod render;
pub mod style;
pub mod tree;
mod writer;

pub use document::SvgDocument;
pub use error::{Result, SvgError};
pub use path_data::{format_path_data, parse_path_data, PathDataError};
pub use reader::{read_svg, SVG_NS};
pub use render::render_tree;
pub use style::{PaintValue, ResolvedStyle, SvgStyle};
pub use tree::{NodeBounds, SvgKind, SvgNode, SvgNodeId, SvgTree};
pub use writer::write_svg;
