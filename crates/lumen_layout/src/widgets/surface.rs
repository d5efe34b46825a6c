//! Direct-upload surface
//!
//! The surface paints nothing into its scene. Its image is handed to the
//! drawer in a slot of its own, placed at the widget's total box.

use lumen_core::Size;
use lumen_paint::Pixmap;

use crate::error::{LayoutError, Result};
use crate::widget::{MeasureCx, Widget};

pub struct Surface {
    image: Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let image = Pixmap::new(width, height)
            .ok_or_else(|| LayoutError::Format(format!("cannot allocate a {width}x{height} surface")))?;
        Ok(Self { image })
    }

    pub fn from_image(image: Pixmap) -> Self {
        Self { image }
    }

    /// The image to draw into; the scene picks it up on the next frame
    pub fn image_mut(&mut self) -> &mut Pixmap {
        &mut self.image
    }
}

impl Widget for Surface {
    fn type_name(&self) -> &'static str {
        "surface"
    }

    fn content_size(&self, _cx: &MeasureCx<'_>, _width: Option<f32>) -> Size {
        Size::new(self.image.width() as f32, self.image.height() as f32)
    }

    fn direct_upload(&self) -> Option<&Pixmap> {
        Some(&self.image)
    }
}
