//! End-to-end runs of an app on the offscreen platform

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use lumen_app::prelude::*;
use lumen_app::{WindowGeometry, WindowPrefs};
use lumen_core::{MouseButton, Sides};
use lumen_layout::widgets::Frame;
use lumen_platform::offscreen::OffscreenPlatform;
use lumen_platform::{Buttons, PointerEvent, WindowEvent};

fn temp_prefs(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lumen-{name}-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn config(prefs: &PathBuf) -> AppConfig {
    let text = format!(
        r##"
name = "flow"
prefs_file = "{}"

[window]
title = "main"
width = 320
height = 240
background = "#ffffff"

[settings]
fps = 30
"##,
        prefs.display()
    );
    AppConfig::from_toml_str(&text).unwrap()
}

fn sized(style: &mut Style, w: f32, h: f32) {
    style.set_size(Length::px(w), Length::px(h));
    style.padding = Sides::all(Length::ZERO);
}

#[test]
fn window_geometry_survives_a_restart() {
    init_logging();
    let prefs = temp_prefs("restart");

    let mut app = App::new(OffscreenPlatform::default(), config(&prefs)).unwrap();
    let id = app.main_window(|_| Ok(())).unwrap();
    let sender = app.window(id).unwrap().sender();
    let now = Instant::now();
    assert!(app.step(now));
    assert!(app.window(id).unwrap().frames() >= 1);

    sender.send(WindowEvent::Move { x: 40, y: 30 }).unwrap();
    sender.send(WindowEvent::Close).unwrap();
    assert!(!app.step(now + Duration::from_millis(40)));

    let saved = WindowPrefs::load(&prefs).unwrap();
    assert_eq!(
        saved.get("main"),
        Some(WindowGeometry {
            x: 40,
            y: 30,
            width: 320,
            height: 240,
            fullscreen: false,
        })
    );

    let mut again = WindowPrefs::load(&prefs).unwrap();
    again.set(
        "main",
        WindowGeometry {
            width: 500,
            height: 400,
            ..Default::default()
        },
    );
    again.save(&prefs).unwrap();
    let mut app = App::new(OffscreenPlatform::default(), config(&prefs)).unwrap();
    let id = app.main_window(|_| Ok(())).unwrap();
    assert_eq!(app.window(id).unwrap().size(), Size::new(500.0, 400.0));

    let _ = std::fs::remove_file(&prefs);
}

#[test]
fn dialog_takes_input_until_dismissed() {
    init_logging();
    let prefs = temp_prefs("dialog");
    let mut app = App::new(OffscreenPlatform::default(), config(&prefs)).unwrap();

    let below = Rc::new(Cell::new(0));
    let b = below.clone();
    let id = app
        .main_window(move |scene| {
            let root = scene.root();
            let block = scene.add(root, "block", Frame::new())?;
            scene.edit(block)?.styler(|s| sized(s, 320.0, 240.0)).on(EventType::MouseDown, move |_, _| {
                b.set(b.get() + 1);
            });
            Ok(())
        })
        .unwrap();

    let inside = Rc::new(Cell::new(0));
    let i = inside.clone();
    app.open_dialog(move |scene| {
        let root = scene.root();
        scene.edit(root)?.styler(|s| sized(s, 100.0, 60.0));
        let ok = scene.add(root, "ok", Frame::new())?;
        scene.edit(ok)?.styler(|s| sized(s, 100.0, 60.0)).on(EventType::MouseDown, move |_, _| {
            i.set(i.get() + 1);
        });
        Ok(())
    })
    .unwrap();

    let sender = app.window(id).unwrap().sender();
    let t0 = Instant::now();
    app.step(t0);

    let press = |x: f32, y: f32| {
        let pos = Point::new(x, y);
        sender.send(PointerEvent::moved(pos, Buttons::empty(), t0)).unwrap();
        sender.send(PointerEvent::down(pos, MouseButton::Left, t0)).unwrap();
        sender.send(PointerEvent::up(pos, MouseButton::Left, t0)).unwrap();
    };

    // dialog is centered: (110, 90) to (210, 150)
    press(5.0, 5.0);
    press(160.0, 120.0);
    app.step(t0 + Duration::from_millis(40));
    assert_eq!(below.get(), 0);
    assert_eq!(inside.get(), 1);

    let window = app.window_mut(id).unwrap();
    let dialog = window.stages().top().map(Stage::id).unwrap();
    window.close_stage(dialog);
    press(5.0, 5.0);
    app.step(t0 + Duration::from_millis(80));
    assert_eq!(below.get(), 1);

    let _ = std::fs::remove_file(&prefs);
}
