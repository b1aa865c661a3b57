use serde::{Deserialize, Serialize};

/// Windows virtual-key code identifying a physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const BACK: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const RETURN: KeyCode = KeyCode(0x0D);
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CAPITAL: KeyCode = KeyCode(0x14);
    /// Hangul / English toggle (VK_HANGUL, same code as VK_KANA).
    pub const HANGUL: KeyCode = KeyCode(0x15);
    pub const SPACE: KeyCode = KeyCode(0x20);

    pub const DIGIT_0: KeyCode = KeyCode(0x30);
    pub const DIGIT_1: KeyCode = KeyCode(0x31);
    pub const DIGIT_2: KeyCode = KeyCode(0x32);
    pub const DIGIT_3: KeyCode = KeyCode(0x33);
    pub const DIGIT_4: KeyCode = KeyCode(0x34);
    pub const DIGIT_5: KeyCode = KeyCode(0x35);
    pub const DIGIT_6: KeyCode = KeyCode(0x36);
    pub const DIGIT_7: KeyCode = KeyCode(0x37);
    pub const DIGIT_8: KeyCode = KeyCode(0x38);
    pub const DIGIT_9: KeyCode = KeyCode(0x39);

    pub const A: KeyCode = KeyCode(0x41);
    pub const B: KeyCode = KeyCode(0x42);
    pub const C: KeyCode = KeyCode(0x43);
    pub const D: KeyCode = KeyCode(0x44);
    pub const E: KeyCode = KeyCode(0x45);
    pub const F: KeyCode = KeyCode(0x46);
    pub const G: KeyCode = KeyCode(0x47);
    pub const H: KeyCode = KeyCode(0x48);
    pub const I: KeyCode = KeyCode(0x49);
    pub const J: KeyCode = KeyCode(0x4A);
    pub const K: KeyCode = KeyCode(0x4B);
    pub const L: KeyCode = KeyCode(0x4C);
    pub const M: KeyCode = KeyCode(0x4D);
    pub const N: KeyCode = KeyCode(0x4E);
    pub const O: KeyCode = KeyCode(0x4F);
    pub const P: KeyCode = KeyCode(0x50);
    pub const Q: KeyCode = KeyCode(0x51);
    pub const R: KeyCode = KeyCode(0x52);
    pub const S: KeyCode = KeyCode(0x53);
    pub const T: KeyCode = KeyCode(0x54);
    pub const U: KeyCode = KeyCode(0x55);
    pub const V: KeyCode = KeyCode(0x56);
    pub const W: KeyCode = KeyCode(0x57);
    pub const X: KeyCode = KeyCode(0x58);
    pub const Y: KeyCode = KeyCode(0x59);
    pub const Z: KeyCode = KeyCode(0x5A);

    pub const NUMPAD0: KeyCode = KeyCode(0x60);
    pub const NUMPAD1: KeyCode = KeyCode(0x61);
    pub const NUMPAD2: KeyCode = KeyCode(0x62);
    pub const NUMPAD3: KeyCode = KeyCode(0x63);
    pub const NUMPAD4: KeyCode = KeyCode(0x64);
    pub const NUMPAD5: KeyCode = KeyCode(0x65);
    pub const NUMPAD6: KeyCode = KeyCode(0x66);
    pub const NUMPAD7: KeyCode = KeyCode(0x67);
    pub const NUMPAD8: KeyCode = KeyCode(0x68);
    pub const NUMPAD9: KeyCode = KeyCode(0x69);

    pub const LSHIFT: KeyCode = KeyCode(0xA0);
    pub const RSHIFT: KeyCode = KeyCode(0xA1);

    pub const OEM_1: KeyCode = KeyCode(0xBA); // ; :
    pub const OEM_PLUS: KeyCode = KeyCode(0xBB); // = +
    pub const OEM_COMMA: KeyCode = KeyCode(0xBC); // , <
    pub const OEM_MINUS: KeyCode = KeyCode(0xBD); // - _
    pub const OEM_PERIOD: KeyCode = KeyCode(0xBE); // . >
    pub const OEM_2: KeyCode = KeyCode(0xBF); // / ?
    pub const OEM_3: KeyCode = KeyCode(0xC0); // ` ~
    pub const OEM_4: KeyCode = KeyCode(0xDB); // [ {
    pub const OEM_5: KeyCode = KeyCode(0xDC); // \ |
    pub const OEM_6: KeyCode = KeyCode(0xDD); // ] }
    pub const OEM_7: KeyCode = KeyCode(0xDE); // ' "

    /// VK_PROCESSKEY: the IME consumed the real key.
    pub const PROCESSKEY: KeyCode = KeyCode(0xE5);

    pub const fn new(vk: u16) -> Self {
        Self(vk)
    }

    /// Decode a native 32-bit virtual-key code. Codes outside the 16-bit range are rejected.
    pub fn from_native(vk: u32) -> Option<Self> {
        u16::try_from(vk).ok().map(Self)
    }

    pub const fn is_letter(self) -> bool {
        self.0 >= Self::A.0 && self.0 <= Self::Z.0
    }

    pub const fn is_shift(self) -> bool {
        matches!(self.0, 0x10 | 0xA0 | 0xA1)
    }
}

/// Shift / Caps Lock / IME flags held by one keyboard instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierState {
    pub shift: bool,
    pub caps_lock: bool,
    pub ime: bool,
}

impl ModifierState {
    pub const fn new(shift: bool, caps_lock: bool, ime: bool) -> Self {
        Self {
            shift,
            caps_lock,
            ime,
        }
    }
}

/// Screen point in physical pixels, as delivered by the mouse hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Point in an owner's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in an owner's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edges count as inside.
    pub fn contains(&self, p: PointF) -> bool {
        !self.is_empty()
            && p.x >= self.x
            && p.x <= self.right()
            && p.y >= self.y
            && p.y <= self.bottom()
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Left-button messages republished by the mouse hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseMessage {
    LeftButtonDown,
    LeftButtonUp,
}

impl MouseMessage {
    pub const WM_LBUTTONDOWN: u32 = 0x0201;
    pub const WM_LBUTTONUP: u32 = 0x0202;

    pub fn from_native(msg: u32) -> Option<Self> {
        match msg {
            Self::WM_LBUTTONDOWN => Some(Self::LeftButtonDown),
            Self::WM_LBUTTONUP => Some(Self::LeftButtonUp),
            _ => None,
        }
    }
}

/// Raw low-level keyboard notification, already copied out of the native record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    /// Window message (wParam), e.g. 256 for WM_KEYDOWN.
    pub message: u32,
    pub vk_code: u32,
    pub flags: u32,
    /// Cursor position at the time of the event, if the backend could read it.
    pub pointer: Option<Point>,
    /// Event carries our own injection marker.
    pub injected: bool,
}

/// Raw low-level mouse notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMouseEvent {
    pub message: u32,
    pub point: Point,
}

/// What the hook callback tells the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Forward to the next hook in the chain.
    Pass,
    /// Swallow the event.
    Block,
}

/// Published on the key-click channel for every physical key-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyClick {
    pub code: KeyCode,
    pub injected: bool,
}

/// Published on the mouse-click channel for left-button down/up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseClick {
    pub point: Point,
    pub message: MouseMessage,
}

/// Event to be handed to the input dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Down followed by up.
    KeyPress(KeyCode),
}
