//! Process-wide hook session: lifecycle, raw event decoding, area suppression and
//! the key-click / mouse-click broadcast channels.

use crate::area::{ActiveArea, AreaOwnerId, AreaRegistry};
use crate::error::HookError;
use crate::observer::{ObserverId, Observers};
use crate::settings::MouseSuppression;
use crate::types::{
    HookDecision, KeyClick, KeyCode, MouseClick, MouseMessage, Point, RawKeyEvent, RawMouseEvent,
};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// WM_KEYDOWN.
pub const WM_KEYDOWN: u32 = 256;

/// Flag values (read as signed 32-bit) that mark the IME-processing pseudo key.
pub const IME_PROCESS_FLAGS: [i32; 2] = [-2147483647, -2147483648];

/// Receives decoded native hook notifications. Runs on the hook thread.
pub trait RawEventSink: Send + Sync {
    fn on_keyboard(&self, ev: &RawKeyEvent) -> HookDecision;
    fn on_mouse(&self, ev: &RawMouseEvent) -> HookDecision;
}

/// Native installer for the low-level keyboard + mouse hook pair.
pub trait HookBackend: Send + Sync {
    /// Install both hooks and route their events to `sink`.
    /// On error nothing may stay installed.
    fn install(&self, sink: Arc<dyn RawEventSink>) -> Result<(), HookError>;

    /// Remove both hooks. A no-op when nothing is installed.
    fn uninstall(&self);
}

/// Backend for hosts without global input hooks.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl HookBackend for UnsupportedBackend {
    fn install(&self, _sink: Arc<dyn RawEventSink>) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }

    fn uninstall(&self) {}
}

pub fn platform_backend() -> Box<dyn HookBackend> {
    #[cfg(windows)]
    {
        Box::new(crate::keyboard_hook::Win32Backend::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(UnsupportedBackend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Default)]
struct Session {
    running: bool,
    /// Set while the backend is being uninstalled with the session lock released.
    stopping: bool,
    leases: usize,
}

struct EngineShared {
    backend: Box<dyn HookBackend>,
    session: Mutex<Session>,
    settled: Condvar,
    use_global: AtomicBool,
    mouse_suppression: Mutex<MouseSuppression>,
    areas: Mutex<AreaRegistry>,
    last_pointer: Mutex<Option<Point>>,
    key_clicked: Observers<KeyClick>,
    mouse_clicked: Observers<MouseClick>,
}

fn is_ime_process_key(ev: &RawKeyEvent) -> bool {
    ev.vk_code == u32::from(KeyCode::PROCESSKEY.0) && IME_PROCESS_FLAGS.contains(&(ev.flags as i32))
}

impl RawEventSink for EngineShared {
    fn on_keyboard(&self, ev: &RawKeyEvent) -> HookDecision {
        if ev.message == WM_KEYDOWN {
            match KeyCode::from_native(ev.vk_code) {
                Some(code) => self.key_clicked.notify(&KeyClick {
                    code,
                    injected: ev.injected,
                }),
                None => trace!("Ignoring out-of-range vk={:#X}", ev.vk_code),
            }
        }

        if is_ime_process_key(ev) {
            // Keyboard records have no position of their own.
            let point = ev
                .pointer
                .or(*self.last_pointer.lock())
                .unwrap_or_default();
            if self.areas.lock().is_inside(point) {
                trace!("Swallowed IME process key at {:?}", point);
                return HookDecision::Block;
            }
        }

        HookDecision::Pass
    }

    fn on_mouse(&self, ev: &RawMouseEvent) -> HookDecision {
        *self.last_pointer.lock() = Some(ev.point);

        if !self.use_global.load(Ordering::Acquire) {
            return HookDecision::Pass;
        }
        let Some(message) = MouseMessage::from_native(ev.message) else {
            return HookDecision::Pass;
        };

        self.mouse_clicked.notify(&MouseClick {
            point: ev.point,
            message,
        });

        if message == MouseMessage::LeftButtonDown {
            let swallow = match *self.mouse_suppression.lock() {
                MouseSuppression::All => true,
                MouseSuppression::InArea => self.areas.lock().is_inside(ev.point),
            };
            if swallow {
                trace!("Swallowed left button down at {:?}", ev.point);
                return HookDecision::Block;
            }
        }

        HookDecision::Pass
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_ENGINE: HookEngine = HookEngine::with_backend(platform_backend());
}

/// Handle to a hook session. Clones share the same session.
#[derive(Clone)]
pub struct HookEngine {
    shared: Arc<EngineShared>,
}

impl HookEngine {
    /// The process-wide engine on the platform backend.
    pub fn global() -> HookEngine {
        GLOBAL_ENGINE.clone()
    }

    pub fn with_backend(backend: Box<dyn HookBackend>) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                backend,
                session: Mutex::new(Session::default()),
                settled: Condvar::new(),
                use_global: AtomicBool::new(true),
                mouse_suppression: Mutex::new(MouseSuppression::default()),
                areas: Mutex::new(AreaRegistry::new()),
                last_pointer: Mutex::new(None),
                key_clicked: Observers::new(),
                mouse_clicked: Observers::new(),
            }),
        }
    }

    /// Install the keyboard and mouse hooks. Idempotent.
    ///
    /// Waits for an in-progress stop to finish, so it must not be called from a hook
    /// observer while the session is being torn down.
    pub fn start(&self) -> Result<StartOutcome, HookError> {
        let mut session = self.settled_session();
        self.start_locked(&mut session)
    }

    fn settled_session(&self) -> MutexGuard<'_, Session> {
        let mut session = self.shared.session.lock();
        while session.stopping {
            self.shared.settled.wait(&mut session);
        }
        session
    }

    /// Marks the session stopped and uninstalls with the session lock released.
    fn shut_down(&self, mut session: MutexGuard<'_, Session>) {
        session.running = false;
        session.stopping = true;
        drop(session);

        self.shared.backend.uninstall();

        self.shared.session.lock().stopping = false;
        self.shared.settled.notify_all();
    }

    fn start_locked(&self, session: &mut Session) -> Result<StartOutcome, HookError> {
        if session.running {
            debug!("Hooks already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!("Installing keyboard and mouse hooks...");
        let sink: Arc<dyn RawEventSink> = self.shared.clone();
        match self.shared.backend.install(sink) {
            Ok(()) => {
                session.running = true;
                info!("Keyboard and mouse hooks installed.");
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                error!("Failed to install hooks: {}", e);
                Err(e)
            }
        }
    }

    /// Remove both hooks. Idempotent.
    pub fn stop(&self) -> StopOutcome {
        let session = self.settled_session();
        if !session.running {
            return StopOutcome::NotRunning;
        }
        if session.leases > 0 {
            warn!(
                "Stopping hooks with {} lease(s) still held",
                session.leases
            );
        }
        self.shut_down(session);
        info!("Keyboard and mouse hooks uninstalled.");
        StopOutcome::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.shared.session.lock().running
    }

    /// Shared use of the session: the first lease starts the hooks and dropping the
    /// last one stops them.
    pub fn acquire(&self) -> Result<HookLease, HookError> {
        let mut session = self.settled_session();
        self.start_locked(&mut session)?;
        session.leases += 1;
        debug!("Hook lease acquired ({} held)", session.leases);
        Ok(HookLease {
            engine: self.clone(),
        })
    }

    pub fn lease_count(&self) -> usize {
        self.shared.session.lock().leases
    }

    fn release_lease(&self) {
        let mut session = self.shared.session.lock();
        session.leases = session.leases.saturating_sub(1);
        debug!("Hook lease released ({} held)", session.leases);
        if session.leases == 0 && session.running {
            self.shut_down(session);
            info!("Last lease released, hooks uninstalled.");
        }
    }

    pub fn set_use_global(&self, use_global: bool) {
        self.shared.use_global.store(use_global, Ordering::Release);
    }

    pub fn use_global(&self) -> bool {
        self.shared.use_global.load(Ordering::Acquire)
    }

    pub fn set_mouse_suppression(&self, mode: MouseSuppression) {
        *self.shared.mouse_suppression.lock() = mode;
    }

    pub fn mouse_suppression(&self) -> MouseSuppression {
        *self.shared.mouse_suppression.lock()
    }

    pub fn register_area(&self, owner: AreaOwnerId, area: ActiveArea) {
        self.shared.areas.lock().register(owner, area);
    }

    pub fn unregister_area(&self, owner: AreaOwnerId) -> bool {
        self.shared.areas.lock().unregister(owner)
    }

    pub fn active_area_owner(&self) -> Option<AreaOwnerId> {
        self.shared.areas.lock().active_owner()
    }

    /// Suppression test used by both callbacks.
    pub fn is_hooking_area(&self, screen: Point) -> bool {
        self.shared.areas.lock().is_inside(screen)
    }

    pub fn last_pointer(&self) -> Option<Point> {
        *self.shared.last_pointer.lock()
    }

    pub fn on_key_click(&self, f: impl Fn(&KeyClick) + Send + Sync + 'static) -> ObserverId {
        self.shared.key_clicked.subscribe(f)
    }

    pub fn remove_key_click(&self, id: ObserverId) -> bool {
        self.shared.key_clicked.unsubscribe(id)
    }

    pub fn on_mouse_click(&self, f: impl Fn(&MouseClick) + Send + Sync + 'static) -> ObserverId {
        self.shared.mouse_clicked.subscribe(f)
    }

    pub fn remove_mouse_click(&self, id: ObserverId) -> bool {
        self.shared.mouse_clicked.unsubscribe(id)
    }

    /// Keyboard callback body, as invoked by the backend.
    pub fn handle_keyboard(&self, ev: &RawKeyEvent) -> HookDecision {
        self.shared.on_keyboard(ev)
    }

    /// Mouse callback body, as invoked by the backend.
    pub fn handle_mouse(&self, ev: &RawMouseEvent) -> HookDecision {
        self.shared.on_mouse(ev)
    }
}

/// Keeps the hook session alive while held.
#[must_use = "dropping the lease releases the hook session"]
pub struct HookLease {
    engine: HookEngine,
}

impl HookLease {
    pub fn engine(&self) -> &HookEngine {
        &self.engine
    }
}

impl Drop for HookLease {
    fn drop(&mut self) {
        self.engine.release_lease();
    }
}
