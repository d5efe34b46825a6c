//! Compositing stage images onto a window's Drawer
//!
//! Every frame the main stages are submitted bottom to top, each followed
//! by its popups in their stacking order. A modal stage that does not fill
//! the window is preceded by a backdrop dimming everything below it. Each
//! scene image and each direct upload takes one drawer slot; the last slot
//! is reserved for sprites.

use lumen_core::{Affine2D, Color, Rect};
use lumen_platform::{DrawOp, Drawer, PlatformError};
use tracing::{trace, warn};

use crate::manager::StageManager;
use crate::stage::{Stage, StageId};

/// Dimming drawn under a modal dialog or sheet
pub const BACKDROP: Color = Color::rgba(0.0, 0.0, 0.0, 0.3);

/// One image submitted to the drawer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderEntry {
    pub stage: StageId,
    /// Position in the submission order, 0 at the bottom
    pub z: usize,
    pub slot: usize,
    /// Destination in window pixels
    pub dest: Rect,
    /// A direct upload rather than the stage's scene image
    pub upload: bool,
}

/// What the last frame submitted
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderScenes {
    pub entries: Vec<RenderEntry>,
    /// Stages preceded by a backdrop
    pub backdrops: Vec<StageId>,
    /// Images left out for lack of slots
    pub dropped: usize,
}

impl RenderScenes {
    pub fn stages(&self) -> impl Iterator<Item = StageId> + '_ {
        self.entries.iter().filter(|e| !e.upload).map(|e| e.stage)
    }
}

/// Slot bookkeeping for one drawer
#[derive(Debug, Default)]
pub struct Compositor {
    /// Size each slot was last configured with
    slots: Vec<Option<(u32, u32)>>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget slot geometry; the next frame reconfigures every slot
    pub fn release(&mut self) {
        self.slots.clear();
    }

    /// Submit one frame. Returns `None` when the drawer has no surface.
    pub fn composite(
        &mut self,
        drawer: &mut dyn Drawer,
        stages: &StageManager,
    ) -> Result<Option<RenderScenes>, PlatformError> {
        let bounds = drawer.dest_bounds();
        if !drawer.start_draw(0) {
            trace!("drawer surface unavailable");
            return Ok(None);
        }
        drawer.fill(Color::TRANSPARENT, Affine2D::IDENTITY, bounds, DrawOp::Src);

        let mut frame = Frame {
            drawer,
            slots: &mut self.slots,
            scenes: RenderScenes::default(),
        };
        let result = frame.submit(stages, bounds);
        frame.drawer.end_draw();
        result?;

        let scenes = frame.scenes;
        if scenes.dropped > 0 {
            warn!(dropped = scenes.dropped, "not enough drawer slots");
        }
        trace!(entries = scenes.entries.len(), "composited");
        Ok(Some(scenes))
    }
}

struct Frame<'a> {
    drawer: &'a mut dyn Drawer,
    slots: &'a mut Vec<Option<(u32, u32)>>,
    scenes: RenderScenes,
}

impl Frame<'_> {
    fn submit(&mut self, stages: &StageManager, bounds: Rect) -> Result<(), PlatformError> {
        for stage in stages.iter() {
            if stage.modal && !stage.full_window {
                self.drawer.fill(BACKDROP, Affine2D::IDENTITY, bounds, DrawOp::Over);
                self.scenes.backdrops.push(stage.id());
            }
            self.stage(stage)?;
            if let Some(popups) = stage.popups() {
                for popup in popups.in_render_order() {
                    self.stage(popup)?;
                }
            }
        }
        Ok(())
    }

    /// Claim the next free slot for an image of the given size
    fn claim(&mut self, width: u32, height: u32) -> Result<Option<usize>, PlatformError> {
        let slot = self.scenes.entries.len();
        let usable = self.drawer.max_textures().saturating_sub(1);
        if slot >= usable {
            self.scenes.dropped += 1;
            return Ok(None);
        }
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        if self.slots[slot] != Some((width, height)) {
            self.drawer.config_image(slot, width, height, 1)?;
            self.slots[slot] = Some((width, height));
        }
        Ok(Some(slot))
    }

    fn stage(&mut self, stage: &Stage) -> Result<(), PlatformError> {
        let Some(image) = stage.scene().image() else {
            return Ok(());
        };
        let (w, h) = (image.width(), image.height());
        if let Some(slot) = self.claim(w, h)? {
            let src = Rect::new(0.0, 0.0, w as f32, h as f32);
            self.drawer.set_image(slot, 0, image, false)?;
            self.drawer.copy(slot, 0, stage.pos, src, DrawOp::Over, false)?;
            self.scenes.entries.push(RenderEntry {
                stage: stage.id(),
                z: self.scenes.entries.len(),
                slot,
                dest: Rect::from_origin_size(stage.pos, src.size),
                upload: false,
            });
        }

        for upload in stage.scene().uploads() {
            let (w, h) = (upload.image.width(), upload.image.height());
            let Some(slot) = self.claim(w, h)? else {
                continue;
            };
            let origin = stage.to_window(upload.rect.origin);
            let dest = Rect::from_origin_size(origin, upload.rect.size);
            self.drawer.set_image(slot, 0, &upload.image, false)?;
            self.drawer
                .scale(slot, 0, dest, Rect::new(0.0, 0.0, w as f32, h as f32), DrawOp::Over, false)?;
            self.scenes.entries.push(RenderEntry {
                stage: stage.id(),
                z: self.scenes.entries.len(),
                slot,
                dest,
                upload: true,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::{Point, Size};
    use lumen_layout::{PopupOrder, Scene, Settings};
    use lumen_platform::{ImageDrawer, NoopDrawer};

    use super::*;
    use crate::stage::StageKind;

    fn painted(kind: StageKind, w: f32, h: f32, color: Color) -> Stage {
        let mut scene = Scene::new("s", Settings::default()).with_background(color);
        scene.resize(Size::new(w, h));
        scene.frame();
        Stage::new(kind, scene)
    }

    #[test]
    fn dialogs_get_a_backdrop_and_popups_follow_their_stage() {
        let mut drawer = ImageDrawer::new(100, 100).unwrap();
        let capture = drawer.capture();
        let mut stages = StageManager::main(PopupOrder::default());
        let base = stages.push(painted(StageKind::Window, 100.0, 100.0, Color::WHITE)).unwrap();
        let tip = stages
            .top_mut()
            .and_then(|s| s.popups_mut())
            .map(|p| p.push(painted(StageKind::Tooltip, 10.0, 10.0, Color::BLACK).at(Point::new(80.0, 80.0))))
            .unwrap()
            .unwrap();
        let dialog = stages
            .push(painted(StageKind::Dialog, 20.0, 20.0, Color::RED).at(Point::new(40.0, 40.0)))
            .unwrap();

        let mut compositor = Compositor::new();
        let scenes = compositor.composite(&mut drawer, &stages).unwrap().unwrap();
        let order: Vec<StageId> = scenes.stages().collect();
        assert_eq!(order, vec![base, tip, dialog]);
        assert_eq!(scenes.backdrops, vec![dialog]);

        let frame = capture.latest().unwrap();
        let outside = frame.pixel(5, 5).unwrap();
        assert!(outside.red() < 200 && outside.red() > 150);
        let inside = frame.pixel(50, 50).unwrap();
        assert_eq!((inside.red(), inside.green()), (255, 0));
    }

    #[test]
    fn slots_run_out_gracefully() {
        let mut drawer = NoopDrawer::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        drawer.set_max_textures(2);
        let mut stages = StageManager::main(PopupOrder::default());
        stages.push(painted(StageKind::Window, 10.0, 10.0, Color::WHITE)).unwrap();
        stages.push(painted(StageKind::Dialog, 5.0, 5.0, Color::WHITE)).unwrap();

        let scenes = Compositor::new().composite(&mut drawer, &stages).unwrap().unwrap();
        assert_eq!(scenes.entries.len(), 1);
        assert_eq!(scenes.dropped, 1);
    }
}
