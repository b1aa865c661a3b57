//! Label resolution for a single key under the current modifier state.

use crate::layout::{self, KeyVariant};
use crate::types::{KeyCode, ModifierState};

/// Letter keys whose Hangul jamo has a doubled (tense) form under Shift.
const IME_SHIFTED_LETTERS: [KeyCode; 7] = [
    KeyCode::Q,
    KeyCode::W,
    KeyCode::E,
    KeyCode::R,
    KeyCode::T,
    KeyCode::O,
    KeyCode::P,
];

/// Resolve the label `code` shows (and types) under `mods`.
///
/// Returns `None` when the key is not in the layout table; callers keep whatever
/// label they had.
///
/// Caps Lock together with Shift yields lowercase letters: Shift inverts Caps Lock.
/// IME state never changes non-letter glyphs.
pub fn resolve(code: KeyCode, mods: ModifierState) -> Option<String> {
    let variant = layout::lookup(code)?;
    let label = if code.is_letter() {
        resolve_letter(code, variant, mods)
    } else {
        resolve_other(variant, mods)
    };
    Some(label)
}

fn resolve_letter(code: KeyCode, v: &KeyVariant, mods: ModifierState) -> String {
    if mods.ime {
        let base = v.ime_base.unwrap_or(v.default);
        if mods.shift && IME_SHIFTED_LETTERS.contains(&code) {
            return v.ime_shifted.unwrap_or(base).to_string();
        }
        return base.to_string();
    }

    if mods.shift && !mods.caps_lock {
        return v.default.to_uppercase();
    }

    if mods.caps_lock {
        let upper = v.default.to_uppercase();
        if mods.shift {
            return upper.to_lowercase();
        }
        return upper;
    }

    v.default.to_string()
}

fn resolve_other(v: &KeyVariant, mods: ModifierState) -> String {
    match v.shifted {
        Some(shifted) if mods.shift && v.has_shifted() => shifted.to_string(),
        _ => v.default.to_string(),
    }
}
