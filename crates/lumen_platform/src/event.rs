//! Wire events delivered by a backend, and the per-window FIFO carrying them

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use lumen_core::{Key, KeyChord, KeyState, Modifiers, MouseButton, Point, Vec2};
use tokio::sync::mpsc;

use crate::error::{PlatformError, Result};

bitflags::bitflags! {
    /// Mouse buttons held down while a pointer event happened
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Buttons: u8 {
        const LEFT = 0b001;
        const RIGHT = 0b010;
        const MIDDLE = 0b100;
    }
}

impl Buttons {
    pub fn from_button(button: MouseButton) -> Buttons {
        match button {
            MouseButton::Left => Buttons::LEFT,
            MouseButton::Right => Buttons::RIGHT,
            MouseButton::Middle => Buttons::MIDDLE,
            _ => Buttons::empty(),
        }
    }
}

/// Low-level pointer event kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Scroll,
    /// Pointer entered the window
    Enter,
    /// Pointer left the window
    Leave,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Window coordinates in device pixels
    pub pos: Point,
    /// Button that changed state (Down/Up)
    pub button: MouseButton,
    /// Buttons held after this event
    pub buttons: Buttons,
    pub modifiers: Modifiers,
    /// Scroll amount for [`PointerKind::Scroll`]
    pub delta: Vec2,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, pos: Point, time: Instant) -> Self {
        Self {
            kind,
            pos,
            button: MouseButton::Left,
            buttons: Buttons::empty(),
            modifiers: Modifiers::NONE,
            delta: Vec2::ZERO,
            time,
        }
    }

    pub fn down(pos: Point, button: MouseButton, time: Instant) -> Self {
        Self {
            button,
            buttons: Buttons::from_button(button),
            ..Self::new(PointerKind::Down, pos, time)
        }
    }

    pub fn up(pos: Point, button: MouseButton, time: Instant) -> Self {
        Self {
            button,
            ..Self::new(PointerKind::Up, pos, time)
        }
    }

    /// A move with `buttons` held
    pub fn moved(pos: Point, buttons: Buttons, time: Instant) -> Self {
        Self {
            buttons,
            ..Self::new(PointerKind::Move, pos, time)
        }
    }

    pub fn scroll(pos: Point, delta: Vec2, time: Instant) -> Self {
        Self {
            delta,
            ..Self::new(PointerKind::Scroll, pos, time)
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyEvent {
    pub chord: KeyChord,
    /// Text produced by the key, if any
    pub text: Option<char>,
    pub state: KeyState,
    pub time: Instant,
}

impl KeyEvent {
    pub fn pressed(chord: KeyChord, time: Instant) -> Self {
        let text = match chord.key {
            Key::Char(c) if chord.modifiers.is_empty() || chord.modifiers.shift_only() => {
                Some(if chord.modifiers.shift {
                    c.to_ascii_uppercase()
                } else {
                    c
                })
            }
            Key::Space if chord.modifiers.is_empty() => Some(' '),
            _ => None,
        };
        Self {
            chord,
            text,
            state: KeyState::Pressed,
            time,
        }
    }

    pub fn released(chord: KeyChord, time: Instant) -> Self {
        Self {
            chord,
            text: None,
            state: KeyState::Released,
            time,
        }
    }
}

/// Window-level notifications
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowEvent {
    /// New size in device pixels
    Resize { width: u32, height: u32 },
    /// Paint tick
    Paint,
    Show,
    /// Close was requested; the application may veto it
    Close,
    Minimize,
    Move { x: i32, y: i32 },
    Focus(bool),
    /// Screen DPI or geometry changed
    ScreenUpdate,
}

/// Application payload injected from a background task
#[derive(Clone)]
pub struct CustomEvent {
    /// Raw id of the widget that should receive it; `None` broadcasts to the scene root
    pub target: Option<u64>,
    pub payload: Arc<dyn Any + Send + Sync>,
}

impl CustomEvent {
    pub fn new<T: Any + Send + Sync>(target: Option<u64>, payload: T) -> Self {
        Self {
            target,
            payload: Arc::new(payload),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for CustomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomEvent")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// An event as it crosses the backend boundary
#[derive(Clone, Debug)]
pub enum WireEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
    Window(WindowEvent),
    Custom(CustomEvent),
}

impl WireEvent {
    pub fn time(&self) -> Option<Instant> {
        match self {
            WireEvent::Pointer(p) => Some(p.time),
            WireEvent::Key(k) => Some(k.time),
            _ => None,
        }
    }
}

impl From<PointerEvent> for WireEvent {
    fn from(e: PointerEvent) -> Self {
        WireEvent::Pointer(e)
    }
}

impl From<KeyEvent> for WireEvent {
    fn from(e: KeyEvent) -> Self {
        WireEvent::Key(e)
    }
}

impl From<WindowEvent> for WireEvent {
    fn from(e: WindowEvent) -> Self {
        WireEvent::Window(e)
    }
}

/// Create a connected sender/queue pair
pub fn event_channel() -> (EventSender, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventQueue { rx })
}

/// Producer side of a window's event FIFO; cheap to clone and `Send`
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<WireEvent>,
}

impl EventSender {
    pub fn send(&self, event: impl Into<WireEvent>) -> Result<()> {
        self.tx
            .send(event.into())
            .map_err(|_| PlatformError::Closed)
    }

    /// Deliver `payload` to the `Custom` listeners of `target`
    pub fn send_custom<T: Any + Send + Sync>(&self, target: Option<u64>, payload: T) -> Result<()> {
        self.send(WireEvent::Custom(CustomEvent::new(target, payload)))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a window's event FIFO
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<WireEvent>,
}

impl EventQueue {
    /// Next event without blocking
    pub fn poll(&mut self) -> Option<WireEvent> {
        self.rx.try_recv().ok()
    }

    /// Block the current thread until an event arrives.
    ///
    /// Returns `None` once every sender is dropped. Must not be called from
    /// inside an async runtime; use [`EventQueue::next`] there.
    pub fn next_blocking(&mut self) -> Option<WireEvent> {
        self.rx.blocking_recv()
    }

    pub async fn next(&mut self) -> Option<WireEvent> {
        self.rx.recv().await
    }

    /// Drain everything queued right now
    pub fn drain(&mut self) -> Vec<WireEvent> {
        std::iter::from_fn(|| self.poll()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let (tx, mut rx) = event_channel();
        let t = Instant::now();
        tx.send(PointerEvent::down(Point::new(1.0, 2.0), MouseButton::Left, t))
            .unwrap();
        tx.send(WindowEvent::Paint).unwrap();
        tx.send_custom(Some(7), 42u32).unwrap();

        assert!(matches!(rx.poll(), Some(WireEvent::Pointer(p)) if p.kind == PointerKind::Down));
        assert!(matches!(rx.poll(), Some(WireEvent::Window(WindowEvent::Paint))));
        match rx.poll() {
            Some(WireEvent::Custom(c)) => {
                assert_eq!(c.target, Some(7));
                assert_eq!(c.downcast_ref::<u32>(), Some(&42));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.poll().is_none());
    }

    #[test]
    fn send_fails_after_queue_dropped() {
        let (tx, rx) = event_channel();
        drop(rx);
        assert!(matches!(tx.send(WindowEvent::Show), Err(PlatformError::Closed)));
    }

    #[test]
    fn key_text() {
        let t = Instant::now();
        let e = KeyEvent::pressed("Shift+a".parse().unwrap(), t);
        assert_eq!(e.text, Some('A'));
        let e = KeyEvent::pressed("Ctrl+a".parse().unwrap(), t);
        assert_eq!(e.text, None);
    }

    #[tokio::test]
    async fn async_next() {
        let (tx, mut rx) = event_channel();
        tokio::spawn(async move {
            tx.send(WindowEvent::Show).unwrap();
        });
        assert!(matches!(rx.next().await, Some(WireEvent::Window(WindowEvent::Show))));
    }
}
