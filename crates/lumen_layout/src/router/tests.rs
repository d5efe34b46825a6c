use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use lumen_core::{Length, Sides, Size};
use lumen_platform::{Buttons, CustomEvent, WireEvent};

use super::*;
use crate::scene::Scene;
use crate::settings::Settings;
use crate::style::{Overflow, Style};
use crate::widget::{Widget, WidgetMut};
use crate::widgets::{Button, Frame, Slider};

fn scene() -> Scene {
    let mut scene = Scene::new("test", Settings::default());
    scene.resize(Size::new(300.0, 200.0));
    scene
}

fn add(scene: &mut Scene, parent: WidgetId, name: &str, w: f32, h: f32, widget: impl Widget) -> WidgetId {
    let id = scene.add(parent, name, widget).unwrap();
    scene.tree_mut().get_mut(id).unwrap().stylers.main.push(Rc::new(move |s: &mut Style| {
        s.set_size(Length::px(w), Length::px(h));
        s.padding = Sides::all(Length::ZERO);
    }));
    id
}

fn counter(scene: &mut Scene, id: WidgetId, kind: EventType) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    scene
        .tree_mut()
        .get_mut(id)
        .unwrap()
        .listeners
        .on(kind, move |_, _| c.set(c.get() + 1));
    count
}

fn ms(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}

fn press(scene: &mut Scene, x: f32, y: f32, button: MouseButton, t: Instant) {
    scene.handle(&PointerEvent::down(Point::new(x, y), button, t).into());
}

fn release(scene: &mut Scene, x: f32, y: f32, button: MouseButton, t: Instant) {
    scene.handle(&PointerEvent::up(Point::new(x, y), button, t).into());
}

fn hover(scene: &mut Scene, x: f32, y: f32, t: Instant) {
    scene.handle(&PointerEvent::moved(Point::new(x, y), Buttons::empty(), t).into());
}

fn drag(scene: &mut Scene, x: f32, y: f32, t: Instant) {
    scene.handle(&PointerEvent::moved(Point::new(x, y), Buttons::LEFT, t).into());
}

fn key(scene: &mut Scene, chord: KeyChord, t: Instant) {
    scene.handle(&KeyEvent::pressed(chord, t).into());
}

fn state(scene: &Scene, id: WidgetId, flag: StateFlags) -> bool {
    scene.tree().get(id).unwrap().is(flag)
}

#[test]
fn button_press_and_release_clicks_once() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 100.0, 40.0, Button::new("OK"));
    let clicks = counter(&mut scene, ok, EventType::Click);
    scene.frame();
    let t0 = Instant::now();

    hover(&mut scene, 50.0, 20.0, t0);
    press(&mut scene, 50.0, 20.0, MouseButton::Left, t0);
    assert!(state(&scene, ok, StateFlags::ACTIVE));
    release(&mut scene, 50.0, 20.0, MouseButton::Left, ms(t0, 40));

    assert_eq!(clicks.get(), 1);
    assert!(!state(&scene, ok, StateFlags::ACTIVE));
    assert!(state(&scene, ok, StateFlags::HOVERED));
    assert_eq!(scene.focused(), Some(ok));
}

#[test]
fn activatable_alone_is_enough_to_be_pressed() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 100.0, 40.0, Button::new("OK"));
    let clicks = counter(&mut scene, ok, EventType::Click);
    scene.frame();
    let node = scene.tree().get(ok).unwrap();
    assert!(!node.can(Abilities::PRESSABLE));
    assert!(node.can_any(Abilities::PRESS_TARGET));
    let t0 = Instant::now();

    press(&mut scene, 50.0, 20.0, MouseButton::Left, t0);
    release(&mut scene, 50.0, 20.0, MouseButton::Left, ms(t0, 40));
    assert_eq!(clicks.get(), 1);
}

#[test]
fn release_elsewhere_is_not_a_click() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 100.0, 40.0, Button::new("OK"));
    let clicks = counter(&mut scene, ok, EventType::Click);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 50.0, 20.0, MouseButton::Left, t0);
    release(&mut scene, 250.0, 150.0, MouseButton::Left, ms(t0, 30));
    assert_eq!(clicks.get(), 0);
    assert!(!state(&scene, ok, StateFlags::ACTIVE));
}

#[test]
fn slider_follows_the_pointer() {
    let mut scene = scene();
    let root = scene.root();
    let slider = add(&mut scene, root, "volume", 200.0, 20.0, Slider::new(0.0, 100.0, 0.0));
    let changes = counter(&mut scene, slider, EventType::Change);
    let inputs = counter(&mut scene, slider, EventType::Input);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 10.0, 10.0, MouseButton::Left, t0);
    drag(&mut scene, 110.0, 10.0, ms(t0, 16));
    assert!(state(&scene, slider, StateFlags::SLIDING));
    release(&mut scene, 110.0, 10.0, MouseButton::Left, ms(t0, 32));

    let value = scene.tree().widget::<Slider>(slider).unwrap().value;
    assert!((value - 50.0).abs() < 0.5, "value {value}");
    assert_eq!(changes.get(), 1);
    assert!(inputs.get() >= 1);
    assert!(!state(&scene, slider, StateFlags::SLIDING));
}

#[test]
fn slide_commits_change_only_when_it_stops() {
    let mut scene = scene();
    let root = scene.root();
    let slider = add(&mut scene, root, "volume", 200.0, 20.0, Slider::new(0.0, 100.0, 0.0));
    let changes = counter(&mut scene, slider, EventType::Change);
    let inputs = counter(&mut scene, slider, EventType::Input);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 10.0, 10.0, MouseButton::Left, t0);
    drag(&mut scene, 60.0, 10.0, ms(t0, 16));
    drag(&mut scene, 150.0, 10.0, ms(t0, 32));
    assert_eq!(changes.get(), 0);
    assert!(inputs.get() >= 1);

    release(&mut scene, 150.0, 10.0, MouseButton::Left, ms(t0, 48));
    assert_eq!(changes.get(), 1);
}

#[test]
fn tab_cycles_through_focusable_widgets() {
    let mut scene = scene();
    let root = scene.root();
    let mut focusable = Vec::new();
    for i in 0..4 {
        focusable.push(add(&mut scene, root, &format!("b{i}"), 40.0, 20.0, Button::new("B")));
    }
    add(&mut scene, root, "plain", 20.0, 20.0, Frame::new());
    let off = add(&mut scene, root, "off", 40.0, 20.0, Button::new("Off"));
    scene.tree_mut().get_mut(off).unwrap().state.insert(StateFlags::DISABLED);
    scene.frame();
    let t0 = Instant::now();

    scene.focus_first();
    let origin = scene.focused();
    assert_eq!(origin, Some(focusable[0]));

    let mut seen = Vec::new();
    for i in 0..focusable.len() {
        key(&mut scene, KeyChord::plain(Key::Tab), ms(t0, i as u64));
        seen.push(scene.focused().unwrap());
    }
    assert_eq!(scene.focused(), origin);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), focusable.len());
    assert!(!seen.contains(&off));
    assert!(state(&scene, focusable[0], StateFlags::FOCUSED));
    assert!(!state(&scene, focusable[3], StateFlags::FOCUSED));

    key(&mut scene, KeyChord::new(Key::Tab, Modifiers::SHIFT), ms(t0, 10));
    assert_eq!(scene.focused(), Some(focusable[3]));
}

#[test]
fn hovered_flags_match_the_pointer() {
    let mut scene = scene();
    let root = scene.root();
    let outer = add(&mut scene, root, "outer", 100.0, 100.0, Frame::new());
    add(&mut scene, outer, "inner", 40.0, 40.0, Frame::new());
    add(&mut scene, root, "side", 50.0, 50.0, Frame::new());
    scene.frame();
    let t0 = Instant::now();

    let points = [(10.0, 10.0), (60.0, 60.0), (120.0, 20.0), (250.0, 150.0), (20.0, 30.0)];
    for (i, (x, y)) in points.into_iter().enumerate() {
        hover(&mut scene, x, y, ms(t0, i as u64 * 10));
        let pos = Point::new(x, y);
        for (id, node) in scene.tree().iter() {
            assert_eq!(
                node.is(StateFlags::HOVERED),
                node.geom.content_bbox.contains(pos),
                "{} at {x},{y}",
                node.name
            );
            assert_eq!(scene.router().is_hovered(id), node.is(StateFlags::HOVERED));
        }
    }
}

#[test]
fn shortcut_clicks_its_target() {
    let mut scene = scene();
    let root = scene.root();
    let save = add(&mut scene, root, "save", 60.0, 20.0, Button::new("Save"));
    let clicks = counter(&mut scene, save, EventType::Click);
    scene.frame();
    let chord = KeyChord::new(Key::Char('s'), Modifiers::CTRL);
    scene.set_shortcut(chord, save);

    key(&mut scene, chord, Instant::now());
    assert_eq!(clicks.get(), 1);
}

#[test]
fn enter_activates_the_focused_button() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 60.0, 20.0, Button::new("OK"));
    let clicks = counter(&mut scene, ok, EventType::Click);
    scene.frame();
    scene.focus(Some(ok));

    key(&mut scene, KeyChord::plain(Key::Enter), Instant::now());
    assert_eq!(clicks.get(), 1);
}

#[test]
fn unhandled_escape_requests_dismiss() {
    let mut scene = scene();
    scene.frame();
    key(&mut scene, KeyChord::plain(Key::Escape), Instant::now());
    let requests = scene.take_requests();
    assert!(requests.iter().any(|r| matches!(r, SceneRequest::Dismiss)));
}

#[test]
fn right_press_opens_the_context_menu() {
    let mut scene = scene();
    let root = scene.root();
    let area = add(&mut scene, root, "area", 100.0, 100.0, Frame::new());
    WidgetMut::new(scene.tree_mut(), area).context_menu(|m| {
        m.item("Copy").item("Paste");
    });
    scene.frame();

    press(&mut scene, 30.0, 40.0, MouseButton::Right, Instant::now());
    let requests = scene.take_requests();
    let opened = requests.iter().find_map(|r| match r {
        SceneRequest::OpenMenu { owner, menu, pos } => Some((*owner, menu.len(), *pos)),
        _ => None,
    });
    assert_eq!(opened, Some((area, 2, Point::new(30.0, 40.0))));
}

#[test]
fn wheel_scrolls_the_deepest_scroller() {
    let mut scene = scene();
    let root = scene.root();
    let list = add(&mut scene, root, "list", 100.0, 100.0, Frame::column());
    scene.tree_mut().get_mut(list).unwrap().stylers.main.push(Rc::new(|s: &mut Style| {
        s.overflow.y = Overflow::Auto;
    }));
    add(&mut scene, list, "content", 80.0, 1000.0, Frame::new());
    scene.frame();

    scene.handle(&PointerEvent::scroll(Point::new(50.0, 50.0), Vec2::new(0.0, 120.0), Instant::now()).into());
    assert!(scene.needs().contains(SceneNeeds::POSITION));
    scene.update();
    assert_eq!(scene.tree().get(list).unwrap().geom.scroll.y, 120.0);
}

#[test]
fn long_press_fires_from_tick_and_suppresses_click() {
    let mut scene = scene();
    let root = scene.root();
    let pad = add(&mut scene, root, "pad", 100.0, 100.0, Frame::new());
    WidgetMut::new(scene.tree_mut(), pad).set_abilities(Abilities::LONG_PRESSABLE | Abilities::ACTIVATABLE);
    let long = counter(&mut scene, pad, EventType::LongPress);
    let clicks = counter(&mut scene, pad, EventType::Click);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 50.0, 50.0, MouseButton::Left, t0);
    scene.tick(ms(t0, 100));
    assert_eq!(long.get(), 0);
    scene.tick(ms(t0, 600));
    assert_eq!(long.get(), 1);
    scene.tick(ms(t0, 900));
    assert_eq!(long.get(), 1);
    release(&mut scene, 50.0, 50.0, MouseButton::Left, ms(t0, 950));
    assert_eq!(clicks.get(), 0);
}

#[test]
fn long_hover_shows_the_tooltip() {
    let mut scene = scene();
    let root = scene.root();
    let tip = add(&mut scene, root, "tip", 100.0, 100.0, Frame::new());
    WidgetMut::new(scene.tree_mut(), tip).tooltip("Saves the file");
    scene.frame();
    let t0 = Instant::now();

    hover(&mut scene, 20.0, 20.0, t0);
    scene.tick(ms(t0, 600));
    assert!(state(&scene, tip, StateFlags::LONG_HOVERED));
    let shown = scene.take_requests().into_iter().find_map(|r| match r {
        SceneRequest::ShowTooltip { owner, text, .. } => Some((owner, text)),
        _ => None,
    });
    assert_eq!(shown, Some((tip, "Saves the file".to_string())));

    hover(&mut scene, 250.0, 150.0, ms(t0, 700));
    assert!(!state(&scene, tip, StateFlags::LONG_HOVERED));
    assert!(scene
        .take_requests()
        .iter()
        .any(|r| matches!(r, SceneRequest::HideTooltip)));
}

#[test]
fn second_click_in_time_is_a_double_click() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 100.0, 40.0, Button::new("OK"));
    let doubles = counter(&mut scene, ok, EventType::DoubleClick);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 20.0, 20.0, MouseButton::Left, t0);
    release(&mut scene, 20.0, 20.0, MouseButton::Left, ms(t0, 30));
    press(&mut scene, 21.0, 20.0, MouseButton::Left, ms(t0, 150));
    release(&mut scene, 21.0, 20.0, MouseButton::Left, ms(t0, 180));
    assert_eq!(doubles.get(), 1);

    press(&mut scene, 21.0, 20.0, MouseButton::Left, ms(t0, 2000));
    release(&mut scene, 21.0, 20.0, MouseButton::Left, ms(t0, 2030));
    assert_eq!(doubles.get(), 1);
}

#[test]
fn disabled_widgets_ignore_presses() {
    let mut scene = scene();
    let root = scene.root();
    let ok = add(&mut scene, root, "ok", 100.0, 40.0, Button::new("OK"));
    scene.tree_mut().get_mut(ok).unwrap().state.insert(StateFlags::DISABLED);
    let clicks = counter(&mut scene, ok, EventType::Click);
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 50.0, 20.0, MouseButton::Left, t0);
    release(&mut scene, 50.0, 20.0, MouseButton::Left, ms(t0, 20));
    assert_eq!(clicks.get(), 0);
    assert_eq!(scene.focused(), None);
}

#[test]
fn drag_ends_in_a_drop_on_the_target() {
    let mut scene = scene();
    let root = scene.root();
    let source = add(&mut scene, root, "source", 50.0, 50.0, Frame::new());
    let target = add(&mut scene, root, "target", 50.0, 50.0, Frame::new());
    WidgetMut::new(scene.tree_mut(), source).set_abilities(Abilities::DRAGGABLE);
    WidgetMut::new(scene.tree_mut(), target).set_abilities(Abilities::DROPPABLE);
    let from = Rc::new(Cell::new(None));
    let seen = from.clone();
    scene
        .tree_mut()
        .get_mut(target)
        .unwrap()
        .listeners
        .on(EventType::Drop, move |_, ev| seen.set(ev.source));
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 25.0, 25.0, MouseButton::Left, t0);
    drag(&mut scene, 75.0, 25.0, ms(t0, 250));
    assert!(state(&scene, source, StateFlags::DRAGGING));
    release(&mut scene, 75.0, 25.0, MouseButton::Left, ms(t0, 300));

    assert_eq!(from.get(), Some(source));
    assert!(!state(&scene, source, StateFlags::DRAGGING));
}

#[test]
fn custom_events_reach_their_target() {
    let mut scene = scene();
    let root = scene.root();
    let sink = add(&mut scene, root, "sink", 10.0, 10.0, Frame::new());
    let got = Rc::new(Cell::new(0u32));
    let g = got.clone();
    scene
        .tree_mut()
        .get_mut(sink)
        .unwrap()
        .listeners
        .on(EventType::Custom, move |_, ev| {
            if let Some(v) = ev.payload::<u32>() {
                g.set(*v);
            }
        });
    scene.frame();

    scene.handle(&WireEvent::Custom(CustomEvent::new(Some(sink.to_raw()), 42u32)));
    assert_eq!(got.get(), 42);
}

#[test]
fn priority_ancestors_see_events_first() {
    let mut scene = scene();
    let root = scene.root();
    let panel = add(&mut scene, root, "panel", 100.0, 100.0, Frame::new());
    let ok = add(&mut scene, panel, "ok", 50.0, 20.0, Button::new("OK"));
    let clicks = counter(&mut scene, ok, EventType::Click);
    WidgetMut::new(scene.tree_mut(), panel)
        .priority(EventType::Click)
        .on(EventType::Click, |_, ev| ev.set_handled_stop());
    scene.frame();
    let t0 = Instant::now();

    press(&mut scene, 10.0, 10.0, MouseButton::Left, t0);
    release(&mut scene, 10.0, 10.0, MouseButton::Left, ms(t0, 20));
    assert_eq!(clicks.get(), 0);
}
