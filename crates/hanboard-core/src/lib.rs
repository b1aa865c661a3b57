pub mod area;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod hook;
#[cfg(windows)]
pub mod ime;
#[cfg(windows)]
pub mod keyboard_hook;
pub mod layout;
pub mod observer;
pub mod panel;
pub mod resolver;
pub mod settings;
pub mod types;

pub use area::{ActiveArea, AreaOwnerId, CoordinateSpace, ScreenOffset};
pub use controller::VirtualKeyboard;
pub use dispatcher::InputDispatcher;
pub use error::HookError;
pub use hook::{HookEngine, HookLease, StartOutcome, StopOutcome};
pub use layout::KeyVariant;
pub use panel::{KeyButton, KeyPanel};
pub use resolver::resolve;
pub use settings::{MouseSuppression, Settings};
pub use types::{HookDecision, KeyClick, KeyCode, ModifierState, MouseClick, Point, PointF, Rect};
