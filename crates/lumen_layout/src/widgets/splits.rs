//! Resizable panes
//!
//! Panes are ordinary children sized by grow factors that the splits widget
//! owns. Dragging in the gap between two panes moves weight from one to the
//! other.

use std::cell::RefCell;
use std::rc::Rc;

use lumen_core::{Color, Dim, Length};
use lumen_platform::Cursor;

use crate::error::Result;
use crate::events::EventType;
use crate::flags::Abilities;
use crate::style::{Direction, Style};
use crate::tree::{SceneTree, WidgetId};
use crate::widget::{Widget, WidgetMut};

/// Handle thickness in dp
const HANDLE_DP: f32 = 6.0;
/// Smallest share a pane can be dragged down to
const MIN_SHARE: f32 = 0.05;

pub struct Splits {
    direction: Direction,
    weights: Rc<RefCell<Vec<f32>>>,
    /// Gap being dragged and the weights when the drag began
    dragging: Option<(usize, Vec<f32>)>,
}

impl Splits {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            weights: Rc::new(RefCell::new(Vec::new())),
            dragging: None,
        }
    }

    /// Current pane shares, normalized to sum to 1
    pub fn shares(&self) -> Vec<f32> {
        let w = self.weights.borrow();
        let total: f32 = w.iter().sum();
        if total <= 0.0 {
            return vec![0.0; w.len()];
        }
        w.iter().map(|v| v / total).collect()
    }

    /// Move the boundary after pane `gap` by `frac` of the total
    pub fn move_handle(&mut self, gap: usize, from: &[f32], frac: f32) -> bool {
        let mut w = self.weights.borrow_mut();
        if gap + 1 >= w.len() || from.len() != w.len() {
            return false;
        }
        let total: f32 = from.iter().sum();
        let pair = from[gap] + from[gap + 1];
        let min = MIN_SHARE * total;
        let a = (from[gap] + frac * total).clamp(min, (pair - min).max(min));
        w.copy_from_slice(from);
        w[gap] = a;
        w[gap + 1] = pair - a;
        true
    }
}

/// Add a pane with relative `weight` to a splits widget
pub fn add_pane(
    tree: &mut SceneTree,
    splits: WidgetId,
    name: &str,
    pane: impl Widget,
    weight: f32,
) -> Result<WidgetId> {
    let (weights, dim) = match tree.widget::<Splits>(splits) {
        Some(s) => (s.weights.clone(), s.direction.dim()),
        None => return Err(crate::error::LayoutError::InvalidNode(splits)),
    };
    let index = {
        let mut w = weights.borrow_mut();
        w.push(weight.max(0.0));
        w.len() - 1
    };
    let id = tree.add(splits, name, pane)?;
    tree.get_mut(id)?.stylers.first.push(Rc::new(move |s: &mut Style| {
        let share = weights.borrow().get(index).copied().unwrap_or(0.0);
        s.grow.set_dim(dim, share);
        s.grow.set_dim(dim.other(), 1.0);
    }));
    Ok(id)
}

impl Widget for Splits {
    fn type_name(&self) -> &'static str {
        "splits"
    }

    fn init(&mut self, w: &mut WidgetMut<'_>) {
        w.set_abilities(Abilities::SLIDEABLE);
        let direction = self.direction;
        w.styler(move |s| {
            s.direction = direction;
            s.set_gap(Length::dp(HANDLE_DP));
            s.set_background(Color::from_hex(0xd0d0d0));
            s.cursor = match direction {
                Direction::Row => Cursor::ResizeEW,
                Direction::Column => Cursor::ResizeNS,
            };
        });
        w.on(EventType::SlideStart, |cx, ev| {
            let id = cx.id();
            let dim = match cx.widget::<Splits>() {
                Some(s) => s.direction.dim(),
                None => return,
            };
            let at = ev.start_pos.dim(dim);
            let children = cx.tree().children(id).to_vec();
            let tree = cx.tree();
            let panes: Vec<(f32, f32)> = children
                .iter()
                .filter_map(|&c| tree.get(c).ok().map(|n| n.geom.total_bbox))
                .map(|r| (r.origin.dim(dim), r.origin.dim(dim) + r.size.dim(dim)))
                .collect();
            let gap = panes
                .windows(2)
                .position(|p| at >= p[0].1 && at <= p[1].0);
            if let Some(s) = cx.widget_mut::<Splits>() {
                s.dragging = gap.map(|g| (g, s.weights.borrow().clone()));
            }
            if gap.is_some() {
                ev.set_handled();
            }
        });
        w.on(EventType::SlideMove, |cx, ev| {
            let Some(dim) = cx.widget::<Splits>().map(|s| s.direction.dim()) else {
                return;
            };
            let extent = cx.geom().map_or(0.0, |g| g.content.size.dim(dim));
            let delta = match dim {
                Dim::X => ev.delta.x,
                Dim::Y => ev.delta.y,
            };
            let moved = extent > 0.0
                && cx.widget_mut::<Splits>().is_some_and(|s| match s.dragging.clone() {
                    Some((gap, from)) => s.move_handle(gap, &from, delta / extent),
                    None => false,
                });
            if moved {
                cx.restyle_all();
                ev.set_handled();
            }
        });
        w.on(EventType::SlideStop, |cx, _| {
            if let Some(s) = cx.widget_mut::<Splits>() {
                s.dragging = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_moves_weight_between_neighbors() {
        let mut s = Splits::new(Direction::Row);
        *s.weights.borrow_mut() = vec![1.0, 1.0, 2.0];
        let from = s.weights.borrow().clone();
        assert!(s.move_handle(0, &from, 0.125));
        let shares = s.shares();
        assert!((shares[0] - 0.375).abs() < 1e-6);
        assert!((shares[1] - 0.125).abs() < 1e-6);
        assert!((shares[2] - 0.5).abs() < 1e-6);
        // clamped so the neighbor keeps a minimum share
        assert!(s.move_handle(0, &from, 1.0));
        assert!((s.shares()[1] - MIN_SHARE).abs() < 1e-6);
        assert!(!s.move_handle(2, &from, 0.1));
    }
}
