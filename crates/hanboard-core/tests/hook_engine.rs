mod common;

use common::fake_engine;
use hanboard_core::area::{ActiveArea, AreaOwnerId, ScreenOffset};
use hanboard_core::error::HookError;
use hanboard_core::hook::{StartOutcome, StopOutcome, WM_KEYDOWN};
use hanboard_core::settings::MouseSuppression;
use hanboard_core::types::{
    HookDecision, KeyCode, MouseMessage, Point, RawKeyEvent, RawMouseEvent, Rect,
};
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const WM_MOUSEMOVE: u32 = 0x0200;

fn mouse(message: u32, x: i32, y: i32) -> RawMouseEvent {
    RawMouseEvent {
        message,
        point: Point::new(x, y),
    }
}

fn ime_key(pointer: Option<Point>) -> RawKeyEvent {
    RawKeyEvent {
        message: WM_KEYDOWN,
        vk_code: 229,
        flags: 0x8000_0000,
        pointer,
        injected: false,
    }
}

/// 100x50 area placed at (200, 100) on screen.
fn area() -> ActiveArea {
    ActiveArea::new(
        Rect::new(0.0, 0.0, 100.0, 50.0),
        Arc::new(ScreenOffset::new(Point::new(200, 100))),
    )
}

#[test]
fn start_and_stop_are_idempotent() {
    let (engine, hooks) = fake_engine();

    assert_eq!(engine.start(), Ok(StartOutcome::Started));
    assert_eq!(engine.start(), Ok(StartOutcome::AlreadyRunning));
    assert_eq!(hooks.installs.load(Ordering::SeqCst), 1);
    assert!(engine.is_running());

    assert_eq!(engine.stop(), StopOutcome::Stopped);
    assert_eq!(engine.stop(), StopOutcome::NotRunning);
    assert_eq!(hooks.uninstalls.load(Ordering::SeqCst), 1);
    assert!(!hooks.installed());
}

#[test]
fn failed_install_leaves_engine_stopped() {
    let (engine, hooks) = fake_engine();
    hooks.fail.store(true, Ordering::SeqCst);

    assert_eq!(
        engine.start(),
        Err(HookError::KeyboardHook("access denied".into()))
    );
    assert!(!engine.is_running());
    assert!(engine.acquire().is_err());
    assert_eq!(engine.lease_count(), 0);

    hooks.fail.store(false, Ordering::SeqCst);
    assert_eq!(engine.start(), Ok(StartOutcome::Started));
}

#[test]
fn last_lease_stops_the_hooks() {
    let (engine, hooks) = fake_engine();

    let first = engine.acquire().unwrap();
    let second = engine.acquire().unwrap();
    assert_eq!(engine.lease_count(), 2);
    assert_eq!(hooks.installs.load(Ordering::SeqCst), 1);

    drop(first);
    assert!(engine.is_running());
    drop(second);
    assert!(!engine.is_running());
    assert_eq!(engine.lease_count(), 0);
    assert_eq!(hooks.uninstalls.load(Ordering::SeqCst), 1);
}

#[test]
fn backend_sink_feeds_key_clicks() {
    let (engine, hooks) = fake_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    engine.on_key_click(move |c| s.lock().push((c.code, c.injected)));
    engine.start().unwrap();

    let sink = hooks.sink().expect("installed sink");
    let decision = sink.on_keyboard(&RawKeyEvent {
        message: WM_KEYDOWN,
        vk_code: 0x14,
        flags: 0,
        pointer: None,
        injected: true,
    });

    assert_eq!(decision, HookDecision::Pass);
    assert_eq!(*seen.lock(), vec![(KeyCode::CAPITAL, true)]);
}

#[test]
fn removed_key_observer_stops_receiving() {
    let (engine, _hooks) = fake_engine();
    let seen = Arc::new(Mutex::new(0));
    let s = seen.clone();
    let id = engine.on_key_click(move |_| *s.lock() += 1);

    let down = RawKeyEvent {
        message: WM_KEYDOWN,
        vk_code: 0x41,
        flags: 0,
        pointer: None,
        injected: false,
    };
    engine.handle_keyboard(&down);
    assert!(engine.remove_key_click(id));
    assert!(!engine.remove_key_click(id));
    engine.handle_keyboard(&down);
    assert_eq!(*seen.lock(), 1);
}

#[test]
fn left_down_inside_area_is_swallowed() {
    let (engine, _hooks) = fake_engine();
    let owner = AreaOwnerId::next();
    engine.register_area(owner, area());

    let clicks = Arc::new(Mutex::new(Vec::new()));
    let c = clicks.clone();
    engine.on_mouse_click(move |m| c.lock().push(m.message));

    let down = MouseMessage::WM_LBUTTONDOWN;
    let up = MouseMessage::WM_LBUTTONUP;
    assert_eq!(engine.handle_mouse(&mouse(down, 250, 120)), HookDecision::Block);
    assert_eq!(engine.handle_mouse(&mouse(up, 250, 120)), HookDecision::Pass);
    assert_eq!(engine.handle_mouse(&mouse(down, 10, 10)), HookDecision::Pass);
    assert_eq!(engine.handle_mouse(&mouse(down, 300, 150)), HookDecision::Block);

    assert_eq!(
        *clicks.lock(),
        vec![
            MouseMessage::LeftButtonDown,
            MouseMessage::LeftButtonUp,
            MouseMessage::LeftButtonDown,
            MouseMessage::LeftButtonDown,
        ]
    );
}

#[test]
fn without_area_every_left_down_is_swallowed() {
    let (engine, _hooks) = fake_engine();
    assert!(engine.is_hooking_area(Point::new(-5000, 7000)));
    assert_eq!(
        engine.handle_mouse(&mouse(MouseMessage::WM_LBUTTONDOWN, 1, 1)),
        HookDecision::Block
    );
}

#[test]
fn suppress_all_ignores_the_area() {
    let (engine, _hooks) = fake_engine();
    engine.register_area(AreaOwnerId::next(), area());
    engine.set_mouse_suppression(MouseSuppression::All);

    assert_eq!(
        engine.handle_mouse(&mouse(MouseMessage::WM_LBUTTONDOWN, 10, 10)),
        HookDecision::Block
    );
    assert_eq!(
        engine.handle_mouse(&mouse(MouseMessage::WM_LBUTTONUP, 10, 10)),
        HookDecision::Pass
    );
}

#[test]
fn global_mouse_off_passes_and_publishes_nothing() {
    let (engine, _hooks) = fake_engine();
    engine.register_area(AreaOwnerId::next(), area());
    engine.set_use_global(false);

    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    engine.on_mouse_click(move |_| *c.lock() += 1);

    assert_eq!(
        engine.handle_mouse(&mouse(MouseMessage::WM_LBUTTONDOWN, 250, 120)),
        HookDecision::Pass
    );
    assert_eq!(*count.lock(), 0);
}

#[test]
fn other_mouse_messages_only_track_the_pointer() {
    let (engine, _hooks) = fake_engine();
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    engine.on_mouse_click(move |_| *c.lock() += 1);

    assert_eq!(
        engine.handle_mouse(&mouse(WM_MOUSEMOVE, 42, 43)),
        HookDecision::Pass
    );
    assert_eq!(engine.last_pointer(), Some(Point::new(42, 43)));
    assert_eq!(*count.lock(), 0);
}

#[test]
fn ime_process_key_inside_area_is_swallowed() {
    let (engine, _hooks) = fake_engine();
    engine.register_area(AreaOwnerId::next(), area());

    assert_eq!(
        engine.handle_keyboard(&ime_key(Some(Point::new(210, 110)))),
        HookDecision::Block
    );
    assert_eq!(
        engine.handle_keyboard(&ime_key(Some(Point::new(10, 10)))),
        HookDecision::Pass
    );

    // No position on the record: fall back to the last mouse position.
    engine.handle_mouse(&mouse(WM_MOUSEMOVE, 220, 130));
    assert_eq!(engine.handle_keyboard(&ime_key(None)), HookDecision::Block);
    engine.handle_mouse(&mouse(WM_MOUSEMOVE, 900, 900));
    assert_eq!(engine.handle_keyboard(&ime_key(None)), HookDecision::Pass);
}

#[test]
fn ime_process_key_without_area_is_swallowed() {
    let (engine, _hooks) = fake_engine();
    let mut ev = ime_key(None);
    ev.flags = 0x8000_0001;
    assert_eq!(engine.handle_keyboard(&ev), HookDecision::Block);
    ev.flags = 0x8000_0000;
    assert_eq!(engine.handle_keyboard(&ev), HookDecision::Block);
}

#[test]
fn engine_state_is_readable_while_uninstalling() {
    let (engine, hooks) = fake_engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let engine = engine.clone();
        let seen = seen.clone();
        *hooks.on_uninstall.lock() = Some(Box::new(move || {
            seen.lock().push((engine.is_running(), engine.lease_count()));
        }));
    }

    let lease = engine.acquire().unwrap();
    drop(lease);
    engine.start().unwrap();
    assert_eq!(engine.stop(), StopOutcome::Stopped);

    assert_eq!(*seen.lock(), vec![(false, 0), (false, 0)]);
    assert_eq!(hooks.uninstalls.load(Ordering::SeqCst), 2);
    // Break the engine <-> backend cycle.
    *hooks.on_uninstall.lock() = None;
}

#[test]
fn ordinary_keys_are_never_swallowed() {
    let (engine, _hooks) = fake_engine();
    // Empty registry means everywhere is inside.
    let mut ev = ime_key(Some(Point::new(0, 0)));
    ev.vk_code = 0x41;
    assert_eq!(engine.handle_keyboard(&ev), HookDecision::Pass);
    ev.vk_code = 229;
    ev.flags = 0;
    assert_eq!(engine.handle_keyboard(&ev), HookDecision::Pass);
}

#[test]
fn latest_area_wins_until_unregistered() {
    let (engine, _hooks) = fake_engine();
    let first = AreaOwnerId::next();
    let second = AreaOwnerId::next();

    engine.register_area(first, area());
    engine.register_area(
        second,
        ActiveArea::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Arc::new(ScreenOffset::new(Point::new(0, 0))),
        ),
    );
    assert_eq!(engine.active_area_owner(), Some(second));
    assert!(engine.is_hooking_area(Point::new(5, 5)));
    assert!(!engine.is_hooking_area(Point::new(250, 120)));

    assert!(engine.unregister_area(second));
    assert_eq!(engine.active_area_owner(), Some(first));
    assert!(engine.is_hooking_area(Point::new(250, 120)));
    assert!(!engine.is_hooking_area(Point::new(5, 5)));
}
