//! Win32 low-level keyboard + mouse hooks and the `SendInput` dispatcher.

use crate::dispatcher::InputDispatcher;
use crate::error::HookError;
use crate::hook::{HookBackend, RawEventSink};
use crate::ime;
use crate::types::{HookDecision, KeyCode, Point, RawKeyEvent, RawMouseEvent};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetCursorPos, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, UnhookWindowsHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, MSG,
    MSLLHOOKSTRUCT, PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL, WM_QUIT,
};

/// Magic number to identify our own injected events.
pub const INJECTED_EXTRA_INFO: usize = 0x4841_4E42;

lazy_static::lazy_static! {
    /// Where the native callbacks deliver events. One backend may claim it at a time.
    static ref ROUTE: RwLock<Option<Arc<dyn RawEventSink>>> = RwLock::new(None);
}

struct HookPair {
    keyboard: HHOOK,
    mouse: HHOOK,
}

impl HookPair {
    unsafe fn install() -> Result<Self, HookError> {
        let module = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| HookError::ModuleHandle(e.to_string()))?;
        let hmod = HINSTANCE(module.0);

        let keyboard = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), hmod, 0)
            .map_err(|e| HookError::KeyboardHook(e.to_string()))?;
        if keyboard.is_invalid() {
            return Err(HookError::KeyboardHook("null hook handle".into()));
        }

        let mouse = match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), hmod, 0) {
            Ok(h) if !h.is_invalid() => h,
            Ok(_) => {
                let _ = UnhookWindowsHookEx(keyboard);
                return Err(HookError::MouseHook("null hook handle".into()));
            }
            Err(e) => {
                let _ = UnhookWindowsHookEx(keyboard);
                return Err(HookError::MouseHook(e.to_string()));
            }
        };

        Ok(Self { keyboard, mouse })
    }

    unsafe fn remove(self) {
        let _ = UnhookWindowsHookEx(self.keyboard);
        let _ = UnhookWindowsHookEx(self.mouse);
    }
}

/// Installs both hooks, reports back, then pumps messages until WM_QUIT.
/// Hook callbacks are delivered on this thread.
fn hook_thread(ready: Sender<Result<u32, HookError>>) {
    let thread_id = unsafe { GetCurrentThreadId() };
    let hooks = match unsafe { HookPair::install() } {
        Ok(h) => h,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut msg = MSG::default();
    unsafe {
        // Force message queue creation so WM_QUIT can be posted to us.
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }
    let _ = ready.send(Ok(thread_id));

    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {}
        hooks.remove();
    }
    debug!("Hook thread message loop exited.");
}

struct HookThread {
    thread_id: u32,
    handle: JoinHandle<()>,
}

/// Native backend: a dedicated thread owning the WH_KEYBOARD_LL / WH_MOUSE_LL pair.
pub struct Win32Backend {
    thread: Mutex<Option<HookThread>>,
}

impl Win32Backend {
    pub fn new() -> Self {
        Self {
            thread: Mutex::new(None),
        }
    }
}

impl Default for Win32Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl HookBackend for Win32Backend {
    fn install(&self, sink: Arc<dyn RawEventSink>) -> Result<(), HookError> {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            return Ok(());
        }
        {
            let mut route = ROUTE.write();
            if route.is_some() {
                return Err(HookError::AlreadyClaimed);
            }
            *route = Some(sink);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = match thread::Builder::new()
            .name("hanboard-hook".into())
            .spawn(move || hook_thread(tx))
        {
            Ok(h) => h,
            Err(e) => {
                *ROUTE.write() = None;
                return Err(HookError::HookThread(e.to_string()));
            }
        };

        let result = match rx.recv() {
            Ok(Ok(thread_id)) => {
                info!("Hook thread {} running", thread_id);
                *slot = Some(HookThread { thread_id, handle });
                return Ok(());
            }
            Ok(Err(e)) => e,
            Err(_) => HookError::HookThread("hook thread exited before reporting".into()),
        };
        let _ = handle.join();
        *ROUTE.write() = None;
        Err(result)
    }

    fn uninstall(&self) {
        let Some(t) = self.thread.lock().take() else {
            return;
        };
        unsafe {
            if let Err(e) = PostThreadMessageW(t.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                error!("Failed to stop hook thread {}: {}", t.thread_id, e);
            }
        }
        if unsafe { GetCurrentThreadId() } == t.thread_id {
            // Called from inside a hook callback; the loop exits once it returns.
            debug!("Uninstall requested on the hook thread, not joining");
        } else if t.handle.join().is_err() {
            warn!("Hook thread panicked");
        }
        *ROUTE.write() = None;
    }
}

impl Drop for Win32Backend {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn cursor_pos() -> Option<Point> {
    let mut pt = POINT::default();
    unsafe { GetCursorPos(&mut pt) }.ok()?;
    Some(Point::new(pt.x, pt.y))
}

/// Never lets a panic unwind into the OS; a failed sink passes the event on.
fn route<F>(f: F) -> HookDecision
where
    F: FnOnce(&dyn RawEventSink) -> HookDecision,
{
    let Some(sink) = ROUTE.read().clone() else {
        return HookDecision::Pass;
    };
    catch_unwind(AssertUnwindSafe(|| f(sink.as_ref()))).unwrap_or_else(|_| {
        error!("Hook sink panicked; passing the event on");
        HookDecision::Pass
    })
}

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code != HC_ACTION as i32 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    let ev = RawKeyEvent {
        message: wparam.0 as u32,
        vk_code: kbd.vkCode,
        flags: kbd.flags.0,
        // Only the IME process key needs a position.
        pointer: if kbd.vkCode == u32::from(KeyCode::PROCESSKEY.0) {
            cursor_pos()
        } else {
            None
        },
        injected: kbd.dwExtraInfo == INJECTED_EXTRA_INFO,
    };

    match route(|sink| sink.on_keyboard(&ev)) {
        HookDecision::Block => LRESULT(1),
        HookDecision::Pass => CallNextHookEx(None, code, wparam, lparam),
    }
}

unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let ms = &*(lparam.0 as *const MSLLHOOKSTRUCT);
    let ev = RawMouseEvent {
        message: wparam.0 as u32,
        point: Point::new(ms.pt.x, ms.pt.y),
    };

    match route(|sink| sink.on_mouse(&ev)) {
        HookDecision::Block => LRESULT(1),
        HookDecision::Pass => CallNextHookEx(None, code, wparam, lparam),
    }
}

fn key_input(code: KeyCode, up: bool) -> INPUT {
    let flags = if up {
        KEYEVENTF_KEYUP
    } else {
        KEYBD_EVENT_FLAGS(0)
    };
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(code.0),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTED_EXTRA_INFO,
            },
        },
    }
}

fn send(inputs: &[INPUT]) {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        warn!("SendInput accepted {} of {} events", sent, inputs.len());
    }
}

/// Injects virtual-key events with `SendInput`, tagged with [`INJECTED_EXTRA_INFO`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputDispatcher;

impl InputDispatcher for SendInputDispatcher {
    fn key_down(&self, code: KeyCode) {
        send(&[key_input(code, false)]);
    }

    fn key_up(&self, code: KeyCode) {
        send(&[key_input(code, true)]);
    }

    fn key_press(&self, code: KeyCode) {
        send(&[key_input(code, false), key_input(code, true)]);
    }

    fn is_toggle_active(&self, code: KeyCode) -> bool {
        if code == KeyCode::HANGUL {
            if let Some(hangul) = ime::is_hangul_mode() {
                return hangul;
            }
        }
        unsafe { GetKeyState(i32::from(code.0)) & 1 != 0 }
    }
}
