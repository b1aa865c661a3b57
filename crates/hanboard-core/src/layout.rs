use crate::types::KeyCode;
use std::collections::HashMap;

/// Glyph variants of one physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyVariant {
    pub default: &'static str,
    pub shifted: Option<&'static str>,
    pub ime_base: Option<&'static str>,
    pub ime_shifted: Option<&'static str>,
}

impl KeyVariant {
    const fn label(default: &'static str) -> Self {
        Self {
            default,
            shifted: None,
            ime_base: None,
            ime_shifted: None,
        }
    }

    const fn shifted(default: &'static str, shifted: &'static str) -> Self {
        Self {
            default,
            shifted: Some(shifted),
            ime_base: None,
            ime_shifted: None,
        }
    }

    const fn letter(default: &'static str, ime: &'static str) -> Self {
        Self {
            default,
            shifted: None,
            ime_base: Some(ime),
            ime_shifted: None,
        }
    }

    const fn letter_ime_shifted(
        default: &'static str,
        ime: &'static str,
        ime_shifted: &'static str,
    ) -> Self {
        Self {
            default,
            shifted: None,
            ime_base: Some(ime),
            ime_shifted: Some(ime_shifted),
        }
    }

    pub fn has_shifted(&self) -> bool {
        self.shifted.is_some_and(|s| !s.trim().is_empty())
    }
}

/// US keyboard with the Korean 2-set (dubeolsik) jamo on the letter keys.
pub const US_HANGUL_LAYOUT: &[(KeyCode, KeyVariant)] = &[
    // Number row
    (KeyCode::DIGIT_1, KeyVariant::shifted("1", "!")),
    (KeyCode::DIGIT_2, KeyVariant::shifted("2", "@")),
    (KeyCode::DIGIT_3, KeyVariant::shifted("3", "#")),
    (KeyCode::DIGIT_4, KeyVariant::shifted("4", "$")),
    (KeyCode::DIGIT_5, KeyVariant::shifted("5", "%")),
    (KeyCode::DIGIT_6, KeyVariant::shifted("6", "^")),
    (KeyCode::DIGIT_7, KeyVariant::shifted("7", "&")),
    (KeyCode::DIGIT_8, KeyVariant::shifted("8", "*")),
    (KeyCode::DIGIT_9, KeyVariant::shifted("9", "(")),
    (KeyCode::DIGIT_0, KeyVariant::shifted("0", ")")),
    // Letters
    (KeyCode::A, KeyVariant::letter("a", "ㅁ")),
    (KeyCode::B, KeyVariant::letter("b", "ㅠ")),
    (KeyCode::C, KeyVariant::letter("c", "ㅊ")),
    (KeyCode::D, KeyVariant::letter("d", "ㅇ")),
    (KeyCode::E, KeyVariant::letter_ime_shifted("e", "ㄷ", "ㄸ")),
    (KeyCode::F, KeyVariant::letter("f", "ㄹ")),
    (KeyCode::G, KeyVariant::letter("g", "ㅎ")),
    (KeyCode::H, KeyVariant::letter("h", "ㅗ")),
    (KeyCode::I, KeyVariant::letter("i", "ㅑ")),
    (KeyCode::J, KeyVariant::letter("j", "ㅓ")),
    (KeyCode::K, KeyVariant::letter("k", "ㅏ")),
    (KeyCode::L, KeyVariant::letter("l", "ㅣ")),
    (KeyCode::M, KeyVariant::letter("m", "ㅡ")),
    (KeyCode::N, KeyVariant::letter("n", "ㅜ")),
    (KeyCode::O, KeyVariant::letter_ime_shifted("o", "ㅐ", "ㅒ")),
    (KeyCode::P, KeyVariant::letter_ime_shifted("p", "ㅔ", "ㅖ")),
    (KeyCode::Q, KeyVariant::letter_ime_shifted("q", "ㅂ", "ㅃ")),
    (KeyCode::R, KeyVariant::letter_ime_shifted("r", "ㄱ", "ㄲ")),
    (KeyCode::S, KeyVariant::letter("s", "ㄴ")),
    (KeyCode::T, KeyVariant::letter_ime_shifted("t", "ㅅ", "ㅆ")),
    (KeyCode::U, KeyVariant::letter("u", "ㅕ")),
    (KeyCode::V, KeyVariant::letter("v", "ㅍ")),
    (KeyCode::W, KeyVariant::letter_ime_shifted("w", "ㅈ", "ㅉ")),
    (KeyCode::X, KeyVariant::letter("x", "ㅌ")),
    (KeyCode::Y, KeyVariant::letter("y", "ㅛ")),
    (KeyCode::Z, KeyVariant::letter("z", "ㅋ")),
    // Punctuation
    (KeyCode::OEM_3, KeyVariant::shifted("`", "~")),
    (KeyCode::OEM_MINUS, KeyVariant::shifted("-", "_")),
    (KeyCode::OEM_PLUS, KeyVariant::shifted("=", "+")),
    (KeyCode::OEM_4, KeyVariant::shifted("[", "{")),
    (KeyCode::OEM_6, KeyVariant::shifted("]", "}")),
    (KeyCode::OEM_5, KeyVariant::shifted("￦", "|")), // won sign instead of backslash
    (KeyCode::OEM_1, KeyVariant::shifted(";", ":")),
    (KeyCode::OEM_7, KeyVariant::shifted("'", "″")),
    (KeyCode::OEM_COMMA, KeyVariant::shifted(",", "<")),
    (KeyCode::OEM_PERIOD, KeyVariant::shifted(".", ">")),
    (KeyCode::OEM_2, KeyVariant::shifted("/", "?")),
    // Control keys
    (KeyCode::BACK, KeyVariant::label("Backspace")),
    (KeyCode::TAB, KeyVariant::label("Tab")),
    (KeyCode::CAPITAL, KeyVariant::label("Caps Lock")),
    (KeyCode::RETURN, KeyVariant::label("Enter")),
    (KeyCode::SHIFT, KeyVariant::label("Shift")),
    (KeyCode::HANGUL, KeyVariant::label("한/영")),
    (KeyCode::SPACE, KeyVariant::label("Space")),
    // Numpad
    (KeyCode::NUMPAD0, KeyVariant::label("0")),
    (KeyCode::NUMPAD1, KeyVariant::label("1")),
    (KeyCode::NUMPAD2, KeyVariant::label("2")),
    (KeyCode::NUMPAD3, KeyVariant::label("3")),
    (KeyCode::NUMPAD4, KeyVariant::label("4")),
    (KeyCode::NUMPAD5, KeyVariant::label("5")),
    (KeyCode::NUMPAD6, KeyVariant::label("6")),
    (KeyCode::NUMPAD7, KeyVariant::label("7")),
    (KeyCode::NUMPAD8, KeyVariant::label("8")),
    (KeyCode::NUMPAD9, KeyVariant::label("9")),
];

lazy_static::lazy_static! {
    static ref LAYOUT_INDEX: HashMap<KeyCode, KeyVariant> =
        US_HANGUL_LAYOUT.iter().copied().collect();
}

/// Glyph variants for `code`, or `None` if the key has no label.
pub fn lookup(code: KeyCode) -> Option<&'static KeyVariant> {
    LAYOUT_INDEX.get(&code)
}

/// Table entries in declaration order.
pub fn entries() -> impl Iterator<Item = &'static (KeyCode, KeyVariant)> {
    US_HANGUL_LAYOUT.iter()
}
