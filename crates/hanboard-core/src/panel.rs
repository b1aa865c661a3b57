use crate::resolver::resolve;
use crate::types::{KeyCode, ModifierState, PointF, Rect};

/// One on-screen key: what it sends, where it sits, what it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyButton {
    pub code: KeyCode,
    pub rect: Rect,
    pub label: String,
    pub pressed: bool,
}

impl KeyButton {
    pub fn new(code: KeyCode, rect: Rect) -> Self {
        let label = resolve(code, ModifierState::default()).unwrap_or_default();
        Self {
            code,
            rect,
            label,
            pressed: false,
        }
    }

    /// Caps Lock and Shift stay visually pressed after the button is released.
    pub fn is_sticky(&self) -> bool {
        self.code == KeyCode::CAPITAL || self.code == KeyCode::SHIFT
    }
}

/// Rows of (key, width in key units) for the bundled US/Hangul board.
const STANDARD_ROWS: &[&[(KeyCode, f64)]] = &[
    &[
        (KeyCode::OEM_3, 1.0),
        (KeyCode::DIGIT_1, 1.0),
        (KeyCode::DIGIT_2, 1.0),
        (KeyCode::DIGIT_3, 1.0),
        (KeyCode::DIGIT_4, 1.0),
        (KeyCode::DIGIT_5, 1.0),
        (KeyCode::DIGIT_6, 1.0),
        (KeyCode::DIGIT_7, 1.0),
        (KeyCode::DIGIT_8, 1.0),
        (KeyCode::DIGIT_9, 1.0),
        (KeyCode::DIGIT_0, 1.0),
        (KeyCode::OEM_MINUS, 1.0),
        (KeyCode::OEM_PLUS, 1.0),
        (KeyCode::BACK, 2.0),
    ],
    &[
        (KeyCode::TAB, 1.5),
        (KeyCode::Q, 1.0),
        (KeyCode::W, 1.0),
        (KeyCode::E, 1.0),
        (KeyCode::R, 1.0),
        (KeyCode::T, 1.0),
        (KeyCode::Y, 1.0),
        (KeyCode::U, 1.0),
        (KeyCode::I, 1.0),
        (KeyCode::O, 1.0),
        (KeyCode::P, 1.0),
        (KeyCode::OEM_4, 1.0),
        (KeyCode::OEM_6, 1.0),
        (KeyCode::OEM_5, 1.5),
    ],
    &[
        (KeyCode::CAPITAL, 1.75),
        (KeyCode::A, 1.0),
        (KeyCode::S, 1.0),
        (KeyCode::D, 1.0),
        (KeyCode::F, 1.0),
        (KeyCode::G, 1.0),
        (KeyCode::H, 1.0),
        (KeyCode::J, 1.0),
        (KeyCode::K, 1.0),
        (KeyCode::L, 1.0),
        (KeyCode::OEM_1, 1.0),
        (KeyCode::OEM_7, 1.0),
        (KeyCode::RETURN, 2.25),
    ],
    &[
        (KeyCode::SHIFT, 2.25),
        (KeyCode::Z, 1.0),
        (KeyCode::X, 1.0),
        (KeyCode::C, 1.0),
        (KeyCode::V, 1.0),
        (KeyCode::B, 1.0),
        (KeyCode::N, 1.0),
        (KeyCode::M, 1.0),
        (KeyCode::OEM_COMMA, 1.0),
        (KeyCode::OEM_PERIOD, 1.0),
        (KeyCode::OEM_2, 1.0),
        (KeyCode::SHIFT, 2.75),
    ],
    &[
        (KeyCode::HANGUL, 1.5),
        (KeyCode::SPACE, 8.0),
    ],
];

/// Geometric model of the on-screen keys, in owner coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyPanel {
    keys: Vec<KeyButton>,
}

impl KeyPanel {
    pub fn new(keys: Vec<KeyButton>) -> Self {
        Self { keys }
    }

    /// The bundled board laid out on a grid of `unit`-sized cells from (0, 0).
    pub fn standard(unit: f64) -> Self {
        let mut keys = Vec::new();
        for (row, cells) in STANDARD_ROWS.iter().enumerate() {
            let y = row as f64 * unit;
            let mut x = 0.0;
            for &(code, width) in cells.iter() {
                keys.push(KeyButton::new(code, Rect::new(x, y, width * unit, unit)));
                x += width * unit;
            }
        }
        Self::new(keys)
    }

    pub fn keys(&self) -> &[KeyButton] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Union of all key rectangles.
    pub fn bounds(&self) -> Rect {
        self.keys
            .iter()
            .fold(Rect::default(), |acc, k| acc.union(&k.rect))
    }

    /// Index of the key under `p`. The first match wins where rectangles touch.
    pub fn hit_test(&self, p: PointF) -> Option<usize> {
        self.keys.iter().position(|k| k.rect.contains(p))
    }

    pub fn key(&self, idx: usize) -> Option<&KeyButton> {
        self.keys.get(idx)
    }

    pub fn set_pressed(&mut self, idx: usize, pressed: bool) {
        if let Some(k) = self.keys.get_mut(idx) {
            k.pressed = pressed;
        }
    }

    /// First label shown for `code`.
    pub fn label_of(&self, code: KeyCode) -> Option<&str> {
        self.keys
            .iter()
            .find(|k| k.code == code)
            .map(|k| k.label.as_str())
    }

    /// Re-resolve every label. Keys missing from the layout keep their label.
    pub fn refresh(&mut self, mods: ModifierState) {
        for key in &mut self.keys {
            if let Some(label) = resolve(key.code, mods) {
                key.label = label;
            }
        }
    }
}
