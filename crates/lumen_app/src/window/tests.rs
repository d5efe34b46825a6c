use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use lumen_core::{Key, KeyChord, Length, MouseButton, Sides};
use lumen_layout::widgets::Frame;
use lumen_layout::{EventType, Style};
use lumen_platform::offscreen::{headless_screen, OffscreenWindow};
use lumen_platform::{Buttons, FrameCapture, MemoryClipboard, WindowConfig};

use super::*;

fn window(w: u32, h: u32) -> (RenderWindow, FrameCapture) {
    let config = WindowConfig::new("test").with_size(w, h);
    let backend = OffscreenWindow::new(&config, headless_screen(w as f32, h as f32, 160.0)).unwrap();
    let capture = backend.capture();
    let mut rw = RenderWindow::new(
        WindowId(1),
        "test",
        Box::new(backend),
        &AppConfig::default(),
        Arc::new(MemoryClipboard::new()),
    );
    let scene = rw.new_scene("main");
    rw.push(Stage::window(scene)).unwrap();
    rw.show();
    (rw, capture)
}

fn sized(scene: &mut Scene, id: WidgetId, w: f32, h: f32) {
    scene.tree_mut().get_mut(id).unwrap().stylers.main.push(Rc::new(move |s: &mut Style| {
        s.set_size(Length::px(w), Length::px(h));
        s.padding = Sides::all(Length::ZERO);
    }));
}

fn block(scene: &mut Scene, name: &str, w: f32, h: f32) -> WidgetId {
    let root = scene.root();
    let id = scene.add(root, name, Frame::new()).unwrap();
    sized(scene, id, w, h);
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

fn click(rw: &mut RenderWindow, x: f32, y: f32, t: Instant) {
    let pos = Point::new(x, y);
    rw.dispatch(&PointerEvent::moved(pos, Buttons::empty(), t).into());
    rw.dispatch(&PointerEvent::down(pos, MouseButton::Left, t).into());
    rw.dispatch(&PointerEvent::up(pos, MouseButton::Left, t).into());
}

fn popup_kinds(rw: &RenderWindow) -> Vec<StageKind> {
    rw.stages()
        .top()
        .and_then(Stage::popups)
        .map(|p| p.iter().map(Stage::kind).collect())
        .unwrap_or_default()
}

#[test]
fn modal_dialog_swallows_presses_outside_it() {
    let (mut rw, capture) = window(200, 200);
    let scene = rw.main_scene_mut().unwrap();
    let below = block(scene, "below", 100.0, 40.0);
    let below_downs = counter(scene, below, EventType::MouseDown);

    let mut dialog = rw.new_scene("dialog");
    let root = dialog.root();
    sized(&mut dialog, root, 80.0, 50.0);
    let ok = block(&mut dialog, "ok", 40.0, 20.0);
    let ok_downs = counter(&mut dialog, ok, EventType::MouseDown);
    let dialog = rw.open_dialog(dialog).unwrap();
    assert_eq!(rw.stage(dialog).unwrap().rect(), Rect::new(60.0, 75.0, 80.0, 50.0));

    let t0 = Instant::now();
    rw.pump(t0);
    click(&mut rw, 10.0, 10.0, t0);
    assert_eq!(below_downs.get(), 0);
    assert_eq!(ok_downs.get(), 0);

    click(&mut rw, 70.0, 80.0, t0);
    assert_eq!(ok_downs.get(), 1);
    assert_eq!(below_downs.get(), 0);

    assert_eq!(rw.render_scenes().backdrops, vec![dialog]);
    let frame = capture.latest().unwrap();
    let dimmed = frame.pixel(150, 150).unwrap();
    assert!(dimmed.red() > 150 && dimmed.red() < 200, "backdrop missing: {dimmed:?}");

    rw.close_stage(dialog);
    click(&mut rw, 10.0, 10.0, t0);
    assert_eq!(below_downs.get(), 1);
}

#[test]
fn menu_choice_reaches_its_owner() {
    let (mut rw, _) = window(300, 200);
    let scene = rw.main_scene_mut().unwrap();
    let owner = block(scene, "owner", 100.0, 40.0);
    let chosen: Rc<RefCell<Option<MenuChoice>>> = Rc::default();
    let node = scene.tree_mut().get_mut(owner).unwrap();
    node.listeners.on(EventType::MouseDown, |cx, ev| {
        let mut menu = Menu::new();
        menu.item("Cut").item("Copy");
        cx.request(SceneRequest::OpenMenu {
            owner: cx.id(),
            menu,
            pos: ev.pos,
        });
    });
    let seen = chosen.clone();
    node.listeners.on(EventType::Custom, move |_, ev| {
        *seen.borrow_mut() = ev.payload::<MenuChoice>().cloned();
    });

    let t0 = Instant::now();
    rw.pump(t0);
    click(&mut rw, 10.0, 10.0, t0);
    assert_eq!(popup_kinds(&rw), vec![StageKind::Menu]);
    rw.paint();

    let menu = rw.stages().top().and_then(Stage::popups).and_then(StageManager::top).unwrap();
    assert_eq!(menu.anchor.map(|a| a.widget), Some(owner));
    let at = menu.to_window(Point::new(12.0, 10.0));
    click(&mut rw, at.x, at.y, t0);

    assert!(popup_kinds(&rw).is_empty());
    assert_eq!(
        chosen.borrow().clone(),
        Some(MenuChoice {
            index: 0,
            label: "Cut".to_string()
        })
    );
}

#[test]
fn press_outside_a_menu_closes_it_and_is_spent() {
    let (mut rw, _) = window(300, 200);
    let scene = rw.main_scene_mut().unwrap();
    let owner = block(scene, "owner", 100.0, 40.0);
    let far = block(scene, "far", 100.0, 40.0);
    let far_downs = counter(scene, far, EventType::MouseDown);
    scene.tree_mut().get_mut(owner).unwrap().listeners.on(EventType::MouseDown, |cx, ev| {
        let mut menu = Menu::new();
        menu.item("Only");
        cx.request(SceneRequest::OpenMenu {
            owner: cx.id(),
            menu,
            pos: ev.pos,
        });
    });

    let t0 = Instant::now();
    rw.pump(t0);
    click(&mut rw, 10.0, 10.0, t0);
    assert_eq!(popup_kinds(&rw), vec![StageKind::Menu]);

    // the root lays children out in a row
    click(&mut rw, 150.0, 10.0, t0);
    assert!(popup_kinds(&rw).is_empty());
    assert_eq!(far_downs.get(), 0);
    click(&mut rw, 150.0, 10.0, t0);
    assert_eq!(far_downs.get(), 1);
}

#[test]
fn snackbars_expire_and_replace_each_other() {
    let (mut rw, _) = window(300, 200);
    let t0 = Instant::now();
    rw.snackbar("Saved").unwrap();
    rw.snackbar("Saved again").unwrap();
    assert_eq!(popup_kinds(&rw), vec![StageKind::Snackbar]);

    let bar = rw.stages().top().and_then(Stage::popups).and_then(StageManager::top).unwrap();
    assert!(bar.rect().max_y() <= 200.0);

    rw.tick(t0 + Duration::from_millis(100));
    assert_eq!(popup_kinds(&rw).len(), 1);
    rw.tick(t0 + Duration::from_secs(5));
    assert!(popup_kinds(&rw).is_empty());
}

#[test]
fn escape_dismisses_the_dialog_but_not_the_window() {
    let (mut rw, _) = window(200, 200);
    let dialog = rw.new_scene("dialog");
    rw.open_dialog(dialog).unwrap();
    let t0 = Instant::now();
    let escape = || WireEvent::Key(KeyEvent::pressed(KeyChord::plain(Key::Escape), t0));

    rw.dispatch(&escape());
    assert_eq!(rw.stages().len(), 1);
    rw.dispatch(&escape());
    assert_eq!(rw.stages().len(), 1);
    assert!(!rw.is_closed());
}

#[test]
fn close_requests_can_be_vetoed() {
    let (mut rw, _) = window(100, 100);
    let allow = Rc::new(Cell::new(false));
    let asked = Rc::new(Cell::new(0));
    let (a, n) = (allow.clone(), asked.clone());
    rw.set_close_req(move |_| {
        n.set(n.get() + 1);
        a.get()
    });
    let sender = rw.sender();
    let t0 = Instant::now();

    sender.send(WindowEvent::Close).unwrap();
    assert!(rw.pump(t0));
    assert_eq!(asked.get(), 1);

    allow.set(true);
    sender.send(WindowEvent::Close).unwrap();
    assert!(!rw.pump(t0));
    assert!(rw.is_closed());
    assert!(rw.window().is_closed());
    assert!(rw.stages().is_empty());
}

#[test]
fn resize_keeps_stages_placed() {
    let (mut rw, _) = window(200, 200);
    let mut dialog = rw.new_scene("dialog");
    let root = dialog.root();
    sized(&mut dialog, root, 80.0, 50.0);
    let dialog = rw.open_dialog(dialog).unwrap();

    rw.window.resize(400, 300);
    rw.pump(Instant::now());
    assert_eq!(rw.main_scene().unwrap().size(), Size::new(400.0, 300.0));
    assert_eq!(rw.stage(dialog).unwrap().pos, Point::new(160.0, 125.0));
}
