use thiserror::Error;

use crate::platform::WindowHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("Target window not found: no '{class}' in handoff or window tree")]
    NotFound { class: String },
    #[error("Window {0} is no longer alive")]
    WindowGone(WindowHandle),
    #[error("{op} failed, GetLastError: {code} ({code:#X})")]
    Platform { op: &'static str, code: u32 },
    #[error("Chaining rejected on {target}: {source}")]
    PlatformRejected {
        target: WindowHandle,
        #[source]
        source: Box<HookError>,
    },
    #[error("Install failed on {target} (chaining: {chained}; replacement: {replaced})")]
    InstallFailed {
        target: WindowHandle,
        chained: String,
        replaced: String,
    },
    #[error("Uninstall on {target} was best-effort: {source}")]
    UninstallBestEffort {
        target: WindowHandle,
        #[source]
        source: Box<HookError>,
    },
    #[error("Attach already attempted in this process")]
    AlreadyAttempted,
    #[error("Config: {0}")]
    Config(String),
}

pub type HookResult<T> = Result<T, HookError>;
