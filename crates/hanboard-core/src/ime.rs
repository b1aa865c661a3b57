//! Hangul mode query through the foreground window's default IME window.

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::Input::Ime::ImmGetDefaultIMEWnd;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, SendMessageW, WM_IME_CONTROL};

const IMC_GETCONVERSIONMODE: usize = 0x0001;
const IME_CMODE_NATIVE: isize = 0x0001;

fn non_null(hwnd: HWND) -> Option<HWND> {
    (hwnd.0 != 0).then_some(hwnd)
}

fn foreground_ime_window() -> Option<HWND> {
    let foreground = non_null(unsafe { GetForegroundWindow() })?;
    non_null(unsafe { ImmGetDefaultIMEWnd(foreground) })
}

fn conversion_mode(ime_window: HWND) -> isize {
    let mode = unsafe {
        SendMessageW(
            ime_window,
            WM_IME_CONTROL,
            WPARAM(IMC_GETCONVERSIONMODE),
            LPARAM(0),
        )
    };
    mode.0
}

/// `None` when the foreground window has no IME to ask.
pub fn is_hangul_mode() -> Option<bool> {
    foreground_ime_window().map(|w| conversion_mode(w) & IME_CMODE_NATIVE != 0)
}
