use thiserror::Error;

/// Reasons the global hook session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("global input hooks are not supported on this platform")]
    Unsupported,
    #[error("another hook engine already owns the native hook route")]
    AlreadyClaimed,
    #[error("failed to get the module handle: {0}")]
    ModuleHandle(String),
    #[error("failed to install the low-level keyboard hook: {0}")]
    KeyboardHook(String),
    #[error("failed to install the low-level mouse hook: {0}")]
    MouseHook(String),
    #[error("hook thread failed: {0}")]
    HookThread(String),
}
