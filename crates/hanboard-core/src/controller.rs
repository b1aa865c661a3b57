//! On-screen keyboard instance: keeps Shift / Caps Lock / IME in step with the OS,
//! turns key activations into synthesized input, and refreshes the key labels.

use crate::area::{ActiveArea, AreaOwnerId, CoordinateSpace};
use crate::dispatcher::InputDispatcher;
use crate::error::HookError;
use crate::hook::{HookEngine, HookLease};
use crate::observer::{ObserverId, Observers};
use crate::panel::KeyPanel;
use crate::settings::Settings;
use crate::types::{InputEvent, KeyClick, KeyCode, ModifierState, MouseClick, MouseMessage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

type CommitHandler = Arc<dyn Fn() -> bool + Send + Sync>;

/// Input a single on-screen activation sends, updating `mods` on the way.
///
/// Caps Lock and Hangul are pressed and released. Shift is latched: the first
/// activation holds it down, the next releases it. Any other key pressed while
/// Shift is latched consumes the latch and releases Shift after the key.
pub fn plan_activation(mods: &mut ModifierState, code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::CAPITAL => {
            mods.caps_lock = !mods.caps_lock;
            vec![InputEvent::KeyPress(KeyCode::CAPITAL)]
        }
        KeyCode::SHIFT => {
            mods.shift = !mods.shift;
            if mods.shift {
                vec![InputEvent::KeyDown(KeyCode::SHIFT)]
            } else {
                vec![InputEvent::KeyUp(KeyCode::SHIFT)]
            }
        }
        KeyCode::HANGUL => {
            mods.ime = !mods.ime;
            vec![InputEvent::KeyPress(KeyCode::HANGUL)]
        }
        _ if mods.shift => {
            mods.shift = false;
            vec![
                InputEvent::KeyPress(code),
                InputEvent::KeyUp(KeyCode::SHIFT),
            ]
        }
        _ => vec![InputEvent::KeyPress(code)],
    }
}

struct KeyboardState {
    modifiers: ModifierState,
    panel: KeyPanel,
    visible: bool,
    last_pressed: Option<usize>,
}

impl KeyboardState {
    fn refresh(&mut self) {
        let mods = self.modifiers;
        self.panel.refresh(mods);
    }

    /// Sticky keys look pressed exactly while their modifier is on.
    fn sync_sticky(&mut self) {
        for idx in 0..self.panel.len() {
            let pressed = match self.panel.key(idx).map(|k| k.code) {
                Some(KeyCode::SHIFT) => self.modifiers.shift,
                Some(KeyCode::CAPITAL) => self.modifiers.caps_lock,
                _ => continue,
            };
            self.panel.set_pressed(idx, pressed);
        }
    }
}

/// Clears the re-entrancy latch on drop.
struct Latch<'a>(&'a AtomicBool);

impl<'a> Latch<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Latch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct KeyboardCore {
    state: Mutex<KeyboardState>,
    dispatcher: Arc<dyn InputDispatcher>,
    owner: Arc<dyn CoordinateSpace>,
    owner_id: AreaOwnerId,
    /// Set while this keyboard is synthesizing input.
    synthesizing: AtomicBool,
    activated: Observers<KeyCode>,
    commit_handler: Mutex<Option<CommitHandler>>,
}

impl KeyboardCore {
    fn on_key_clicked(&self, click: &KeyClick) {
        if self.synthesizing.load(Ordering::Acquire) || click.injected {
            trace!("Ignoring self-generated key {:?}", click.code);
            return;
        }

        // The OS flips the toggle after the hook sees the key, so the observed state
        // is inverted to get the state that is about to apply.
        let observed = match click.code {
            KeyCode::HANGUL => Some(!self.dispatcher.is_toggle_active(KeyCode::HANGUL)),
            KeyCode::CAPITAL => Some(!self.dispatcher.is_toggle_active(KeyCode::CAPITAL)),
            KeyCode::LSHIFT | KeyCode::RSHIFT => {
                Some(!self.dispatcher.is_toggle_active(KeyCode::SHIFT))
            }
            _ => None,
        };

        let mut state = self.state.lock();
        if let Some(active) = observed {
            match click.code {
                KeyCode::HANGUL => state.modifiers.ime = active,
                KeyCode::CAPITAL => state.modifiers.caps_lock = active,
                _ => state.modifiers.shift = active,
            }
            state.sync_sticky();
            debug!(
                "Physical {:?} -> modifiers {:?}",
                click.code, state.modifiers
            );
        }
        if state.visible {
            state.refresh();
        }
    }

    fn on_mouse_clicked(&self, click: &MouseClick) {
        let local = self.owner.point_from_screen(click.point);
        let mut state = self.state.lock();
        let Some(idx) = state.panel.hit_test(local) else {
            return;
        };
        let Some(key) = state.panel.key(idx).cloned() else {
            return;
        };

        match click.message {
            MouseMessage::LeftButtonDown => {
                state.last_pressed = Some(idx);
                state.panel.set_pressed(idx, true);
                drop(state);
                self.activate(key.code);
            }
            MouseMessage::LeftButtonUp => {
                if !key.is_sticky() {
                    if let Some(prev) = state.last_pressed.take() {
                        state.panel.set_pressed(prev, false);
                    }
                    state.panel.set_pressed(idx, false);
                }
            }
        }
    }

    fn activate(&self, code: KeyCode) {
        let Some(_latch) = Latch::acquire(&self.synthesizing) else {
            debug!("Ignoring re-entrant activation of {:?}", code);
            return;
        };

        let plan = {
            let mut state = self.state.lock();
            plan_activation(&mut state.modifiers, code)
        };

        if code == KeyCode::RETURN {
            self.commit_focused_text();
        }

        for event in &plan {
            self.dispatcher.dispatch(*event);
        }

        {
            let mut state = self.state.lock();
            state.sync_sticky();
            state.refresh();
        }

        debug!("Activated {:?} -> {:?}", code, plan);
        self.activated.notify(&code);
    }

    fn commit_focused_text(&self) {
        let handler = self.commit_handler.lock().clone();
        if let Some(handler) = handler {
            let committed = handler();
            debug!("Enter: focused text field committed = {}", committed);
        }
    }

    fn register_area(&self, engine: &HookEngine) {
        let bounds = self.state.lock().panel.bounds();
        if bounds.is_empty() {
            debug!("Panel has no bounds, active area not registered");
            return;
        }
        engine.register_area(self.owner_id, ActiveArea::new(bounds, self.owner.clone()));
    }

    fn resync_toggles(&self) {
        let ime = self.dispatcher.is_toggle_active(KeyCode::HANGUL);
        let caps_lock = self.dispatcher.is_toggle_active(KeyCode::CAPITAL);
        let mut state = self.state.lock();
        state.modifiers.ime = ime;
        state.modifiers.caps_lock = caps_lock;
        state.sync_sticky();
    }
}

struct Attachment {
    engine: HookEngine,
    key_sub: ObserverId,
    mouse_sub: ObserverId,
    _lease: HookLease,
}

/// One on-screen keyboard.
pub struct VirtualKeyboard {
    core: Arc<KeyboardCore>,
    attachment: Mutex<Option<Attachment>>,
}

impl VirtualKeyboard {
    /// `owner` maps screen coordinates into the panel's coordinates.
    pub fn new(
        panel: KeyPanel,
        owner: Arc<dyn CoordinateSpace>,
        dispatcher: Arc<dyn InputDispatcher>,
    ) -> Self {
        Self {
            core: Arc::new(KeyboardCore {
                state: Mutex::new(KeyboardState {
                    modifiers: ModifierState::default(),
                    panel,
                    visible: true,
                    last_pressed: None,
                }),
                dispatcher,
                owner,
                owner_id: AreaOwnerId::next(),
                synthesizing: AtomicBool::new(false),
                activated: Observers::new(),
                commit_handler: Mutex::new(None),
            }),
            attachment: Mutex::new(None),
        }
    }

    pub fn owner_id(&self) -> AreaOwnerId {
        self.core.owner_id
    }

    /// Hook up to `engine`: registers the panel as the active area, subscribes to the
    /// key and mouse channels and holds a hook lease. A visible keyboard then reads
    /// Caps Lock and Hangul from the OS. A no-op when already attached.
    pub fn attach(&self, engine: &HookEngine, settings: &Settings) -> Result<(), HookError> {
        let mut slot = self.attachment.lock();
        if slot.is_some() {
            debug!("Keyboard {:?} already attached", self.core.owner_id);
            return Ok(());
        }

        self.core.register_area(engine);
        engine.set_use_global(settings.use_global);
        engine.set_mouse_suppression(settings.mouse_suppression);

        let weak = Arc::downgrade(&self.core);
        let key_sub = engine.on_key_click(move |click| {
            if let Some(core) = weak.upgrade() {
                core.on_key_clicked(click);
            }
        });
        let weak = Arc::downgrade(&self.core);
        let mouse_sub = engine.on_mouse_click(move |click| {
            if let Some(core) = weak.upgrade() {
                core.on_mouse_clicked(click);
            }
        });

        let lease = match engine.acquire() {
            Ok(lease) => lease,
            Err(e) => {
                engine.remove_key_click(key_sub);
                engine.remove_mouse_click(mouse_sub);
                engine.unregister_area(self.core.owner_id);
                return Err(e);
            }
        };

        *slot = Some(Attachment {
            engine: engine.clone(),
            key_sub,
            mouse_sub,
            _lease: lease,
        });
        drop(slot);

        if self.is_visible() {
            self.core.resync_toggles();
            self.refresh_labels();
        }
        info!("Keyboard {:?} attached to global hooks", self.core.owner_id);
        Ok(())
    }

    /// Returns false if the keyboard was not attached.
    pub fn detach(&self) -> bool {
        let Some(att) = self.attachment.lock().take() else {
            return false;
        };
        att.engine.remove_key_click(att.key_sub);
        att.engine.remove_mouse_click(att.mouse_sub);
        att.engine.unregister_area(self.core.owner_id);
        info!("Keyboard {:?} detached from global hooks", self.core.owner_id);
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }

    pub fn apply_settings(&self, engine: &HookEngine, settings: &Settings) -> Result<(), HookError> {
        self.set_visible(settings.show_on_start);
        if settings.hook_enabled {
            self.attach(engine, settings)
        } else {
            self.detach();
            Ok(())
        }
    }

    /// Becoming visible while attached re-reads Caps Lock and Hangul from the OS and
    /// re-registers the active area.
    pub fn set_visible(&self, visible: bool) {
        self.core.state.lock().visible = visible;
        if !visible {
            return;
        }
        let engine = self.attachment.lock().as_ref().map(|a| a.engine.clone());
        if let Some(engine) = engine {
            self.core.resync_toggles();
            self.core.register_area(&engine);
        }
        self.refresh_labels();
    }

    pub fn is_visible(&self) -> bool {
        self.core.state.lock().visible
    }

    pub fn modifiers(&self) -> ModifierState {
        self.core.state.lock().modifiers
    }

    pub fn panel(&self) -> KeyPanel {
        self.core.state.lock().panel.clone()
    }

    pub fn label_of(&self, code: KeyCode) -> Option<String> {
        self.core
            .state
            .lock()
            .panel
            .label_of(code)
            .map(str::to_string)
    }

    pub fn refresh_labels(&self) {
        self.core.state.lock().refresh();
    }

    /// On-screen activation of `code`.
    pub fn activate(&self, code: KeyCode) {
        self.core.activate(code);
    }

    pub fn handle_key_click(&self, click: &KeyClick) {
        self.core.on_key_clicked(click);
    }

    pub fn handle_mouse_click(&self, click: &MouseClick) {
        self.core.on_mouse_clicked(click);
    }

    /// Called after every activation with the activated key.
    pub fn on_activated(&self, f: impl Fn(&KeyCode) + Send + Sync + 'static) -> ObserverId {
        self.core.activated.subscribe(f)
    }

    pub fn remove_activated(&self, id: ObserverId) -> bool {
        self.core.activated.unsubscribe(id)
    }

    /// Runs before Enter is sent; returns whether a focused text field was committed.
    pub fn set_commit_handler(&self, f: impl Fn() -> bool + Send + Sync + 'static) {
        *self.core.commit_handler.lock() = Some(Arc::new(f));
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_lock_press_toggles() {
        let mut mods = ModifierState::default();
        assert_eq!(
            plan_activation(&mut mods, KeyCode::CAPITAL),
            vec![InputEvent::KeyPress(KeyCode::CAPITAL)]
        );
        assert!(mods.caps_lock);
        plan_activation(&mut mods, KeyCode::CAPITAL);
        assert!(!mods.caps_lock);
    }

    #[test]
    fn shift_is_held_then_released() {
        let mut mods = ModifierState::default();
        assert_eq!(
            plan_activation(&mut mods, KeyCode::SHIFT),
            vec![InputEvent::KeyDown(KeyCode::SHIFT)]
        );
        assert!(mods.shift);
        assert_eq!(
            plan_activation(&mut mods, KeyCode::SHIFT),
            vec![InputEvent::KeyUp(KeyCode::SHIFT)]
        );
        assert!(!mods.shift);
    }

    #[test]
    fn latched_shift_applies_once() {
        let mut mods = ModifierState::new(true, false, false);
        assert_eq!(
            plan_activation(&mut mods, KeyCode::A),
            vec![
                InputEvent::KeyPress(KeyCode::A),
                InputEvent::KeyUp(KeyCode::SHIFT)
            ]
        );
        assert!(!mods.shift);
        assert_eq!(
            plan_activation(&mut mods, KeyCode::A),
            vec![InputEvent::KeyPress(KeyCode::A)]
        );
    }

    #[test]
    fn hangul_toggles_ime() {
        let mut mods = ModifierState::new(false, true, false);
        assert_eq!(
            plan_activation(&mut mods, KeyCode::HANGUL),
            vec![InputEvent::KeyPress(KeyCode::HANGUL)]
        );
        assert_eq!(mods, ModifierState::new(false, true, true));
    }

    #[test]
    fn latch_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = Latch::acquire(&flag);
        assert!(first.is_some());
        assert!(Latch::acquire(&flag).is_none());
        drop(first);
        assert!(Latch::acquire(&flag).is_some());
    }
}
