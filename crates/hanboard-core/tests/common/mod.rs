#![allow(dead_code)]

use hanboard_core::dispatcher::InputDispatcher;
use hanboard_core::error::HookError;
use hanboard_core::hook::{HookBackend, HookEngine, RawEventSink};
use hanboard_core::types::{InputEvent, KeyCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts installs and keeps the sink so tests can feed native events.
#[derive(Default)]
pub struct FakeHooks {
    pub installs: AtomicUsize,
    pub uninstalls: AtomicUsize,
    pub fail: AtomicBool,
    /// Runs inside `uninstall`, where a real backend joins the hook thread.
    pub on_uninstall: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    sink: Mutex<Option<Arc<dyn RawEventSink>>>,
}

impl FakeHooks {
    pub fn installed(&self) -> bool {
        self.sink.lock().is_some()
    }

    pub fn sink(&self) -> Option<Arc<dyn RawEventSink>> {
        self.sink.lock().clone()
    }
}

pub struct FakeBackend(pub Arc<FakeHooks>);

impl HookBackend for FakeBackend {
    fn install(&self, sink: Arc<dyn RawEventSink>) -> Result<(), HookError> {
        if self.0.fail.load(Ordering::SeqCst) {
            return Err(HookError::KeyboardHook("access denied".into()));
        }
        self.0.installs.fetch_add(1, Ordering::SeqCst);
        *self.0.sink.lock() = Some(sink);
        Ok(())
    }

    fn uninstall(&self) {
        if let Some(f) = self.0.on_uninstall.lock().as_ref() {
            f();
        }
        if self.0.sink.lock().take().is_some() {
            self.0.uninstalls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn fake_engine() -> (HookEngine, Arc<FakeHooks>) {
    let hooks = Arc::new(FakeHooks::default());
    let engine = HookEngine::with_backend(Box::new(FakeBackend(hooks.clone())));
    (engine, hooks)
}

/// Records every synthesized event; toggle state is set by the test.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub toggles: Mutex<HashMap<KeyCode, bool>>,
    pub events: Mutex<Vec<InputEvent>>,
    /// Replays each synthesized key-down through this engine, like an OS hook would.
    pub echo: Mutex<Option<HookEngine>>,
}

impl RecordingDispatcher {
    pub fn set_toggle(&self, code: KeyCode, on: bool) {
        self.toggles.lock().insert(code, on);
    }

    pub fn take_events(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn echo(&self, code: KeyCode) {
        let engine = self.echo.lock().clone();
        if let Some(engine) = engine {
            engine.handle_keyboard(&hanboard_core::types::RawKeyEvent {
                message: hanboard_core::hook::WM_KEYDOWN,
                vk_code: u32::from(code.0),
                flags: 0,
                pointer: None,
                injected: false,
            });
        }
    }
}

impl InputDispatcher for RecordingDispatcher {
    fn key_down(&self, code: KeyCode) {
        self.events.lock().push(InputEvent::KeyDown(code));
        self.echo(code);
    }

    fn key_up(&self, code: KeyCode) {
        self.events.lock().push(InputEvent::KeyUp(code));
    }

    fn key_press(&self, code: KeyCode) {
        self.events.lock().push(InputEvent::KeyPress(code));
        self.echo(code);
    }

    fn is_toggle_active(&self, code: KeyCode) -> bool {
        self.toggles.lock().get(&code).copied().unwrap_or(false)
    }
}
