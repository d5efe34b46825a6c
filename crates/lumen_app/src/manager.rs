//! Stage stacks
//!
//! A render window holds one main manager (windows, dialogs, sheets). Every
//! main stage gets its own popup manager (menus, tooltips, snackbars,
//! completers) when it is pushed.

use std::time::Instant;

use lumen_layout::PopupOrder;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::stage::{Stage, StageId, StageKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerRole {
    Main,
    Popup,
}

impl ManagerRole {
    fn name(self) -> &'static str {
        match self {
            ManagerRole::Main => "main",
            ManagerRole::Popup => "popup",
        }
    }
}

#[derive(Debug)]
pub struct StageManager {
    role: ManagerRole,
    order: PopupOrder,
    stack: Vec<Stage>,
}

impl StageManager {
    pub fn main(order: PopupOrder) -> Self {
        Self {
            role: ManagerRole::Main,
            order,
            stack: Vec::new(),
        }
    }

    pub fn popup(order: PopupOrder) -> Self {
        Self {
            role: ManagerRole::Popup,
            order,
            stack: Vec::new(),
        }
    }

    pub fn role(&self) -> ManagerRole {
        self.role
    }

    /// Push a stage on top. Main stages get a popup manager of their own.
    pub fn push(&mut self, mut stage: Stage) -> Result<StageId> {
        let fits = match self.role {
            ManagerRole::Main => stage.kind().is_main(),
            ManagerRole::Popup => stage.kind().is_popup(),
        };
        if !fits {
            return Err(AppError::StageKind {
                kind: stage.kind(),
                manager: self.role.name(),
            });
        }
        if self.role == ManagerRole::Main && stage.popups.is_none() {
            stage.popups = Some(StageManager::popup(self.order));
        }
        let id = stage.id();
        debug!(stage = ?id, kind = ?stage.kind(), manager = self.role.name(), "push");
        self.stack.push(stage);
        Ok(id)
    }

    pub fn pop(&mut self) -> Option<Stage> {
        let stage = self.stack.pop()?;
        debug!(stage = ?stage.id(), kind = ?stage.kind(), "pop");
        Some(stage)
    }

    pub fn top(&self) -> Option<&Stage> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Stage> {
        self.stack.last_mut()
    }

    pub fn top_is_modal(&self) -> bool {
        self.top().is_some_and(|s| s.modal)
    }

    /// Remove every stage, top first
    pub fn close_all(&mut self) -> Vec<Stage> {
        let mut closed = Vec::with_capacity(self.stack.len());
        while let Some(stage) = self.pop() {
            closed.push(stage);
        }
        closed
    }

    pub fn remove(&mut self, id: StageId) -> Option<Stage> {
        let index = self.stack.iter().position(|s| s.id() == id)?;
        let stage = self.stack.remove(index);
        debug!(stage = ?id, kind = ?stage.kind(), "remove");
        Some(stage)
    }

    /// Remove the stages `pred` selects, keeping the order of the rest
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Stage) -> bool) -> Vec<Stage> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.stack.len());
        for stage in self.stack.drain(..) {
            if pred(&stage) {
                removed.push(stage);
            } else {
                kept.push(stage);
            }
        }
        self.stack = kept;
        removed
    }

    /// Close stages whose expiry has passed
    pub fn expire(&mut self, now: Instant) -> Vec<Stage> {
        self.remove_where(|s| s.is_expired(now))
    }

    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stack.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        self.stack.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Stages in push order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Stage> {
        self.stack.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Stage> {
        self.stack.iter_mut()
    }

    /// Stack indices bottom to top as they composite. Main stages keep push
    /// order; popups follow the [`PopupOrder`], with tooltips always last.
    pub fn render_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.stack.len()).collect();
        if self.role == ManagerRole::Popup {
            match self.order {
                PopupOrder::LastOnTop => order.sort_by_key(|&i| {
                    u8::from(self.stack[i].kind() == StageKind::Tooltip)
                }),
                PopupOrder::KindPriority => {
                    order.sort_by_key(|&i| self.stack[i].kind().popup_rank())
                }
            }
        }
        order
    }

    pub fn in_render_order(&self) -> impl Iterator<Item = &Stage> {
        self.render_order().into_iter().map(move |i| &self.stack[i])
    }

    /// Ids top to bottom, the order input is offered in
    pub fn hit_order(&self) -> Vec<StageId> {
        self.render_order()
            .into_iter()
            .rev()
            .map(|i| self.stack[i].id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use lumen_layout::{Scene, Settings};

    use super::*;

    fn stage(kind: StageKind) -> Stage {
        Stage::new(kind, Scene::new("s", Settings::default()))
    }

    #[test]
    fn main_manager_rejects_popups() {
        let mut main = StageManager::main(PopupOrder::default());
        let window = main.push(stage(StageKind::Window)).unwrap();
        assert!(matches!(
            main.push(stage(StageKind::Menu)),
            Err(AppError::StageKind { kind: StageKind::Menu, .. })
        ));
        assert!(main.get(window).unwrap().popups().is_some());
        assert!(!main.top_is_modal());

        main.push(stage(StageKind::Dialog)).unwrap();
        assert!(main.top_is_modal());
        assert_eq!(main.pop().map(|s| s.kind()), Some(StageKind::Dialog));
        assert_eq!(main.top().map(|s| s.id()), Some(window));
    }

    #[test]
    fn close_all_empties_top_first() {
        let mut main = StageManager::main(PopupOrder::default());
        main.push(stage(StageKind::Window)).unwrap();
        main.push(stage(StageKind::Sheet)).unwrap();
        let closed = main.close_all();
        let kinds: Vec<_> = closed.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![StageKind::Sheet, StageKind::Window]);
        assert!(main.is_empty());
    }

    #[test]
    fn popup_order_modes() {
        let kinds = [StageKind::Tooltip, StageKind::Snackbar, StageKind::Menu];

        let mut last = StageManager::popup(PopupOrder::LastOnTop);
        for k in kinds {
            last.push(stage(k)).unwrap();
        }
        let order: Vec<_> = last.render_order().into_iter().map(|i| kinds[i]).collect();
        assert_eq!(order, vec![StageKind::Snackbar, StageKind::Menu, StageKind::Tooltip]);

        let mut ranked = StageManager::popup(PopupOrder::KindPriority);
        for k in kinds {
            ranked.push(stage(k)).unwrap();
        }
        let order: Vec<_> = ranked.render_order().into_iter().map(|i| kinds[i]).collect();
        assert_eq!(order, vec![StageKind::Menu, StageKind::Snackbar, StageKind::Tooltip]);
        assert_eq!(ranked.hit_order().len(), 3);
    }

    #[test]
    fn expired_snackbars_close() {
        let t0 = Instant::now();
        let mut popups = StageManager::popup(PopupOrder::default());
        popups
            .push(stage(StageKind::Snackbar).expires_at(t0 + std::time::Duration::from_secs(1)))
            .unwrap();
        popups.push(stage(StageKind::Menu)).unwrap();
        assert!(popups.expire(t0).is_empty());
        let gone = popups.expire(t0 + std::time::Duration::from_secs(2));
        assert_eq!(gone.len(), 1);
        assert_eq!(popups.top().map(|s| s.kind()), Some(StageKind::Menu));
    }
}
