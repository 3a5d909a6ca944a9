//! OS seam for the interception core.
//!
//! Everything that touches real windows goes through [`WindowSystem`] and
//! [`HandoffSource`]. The Win32 implementation lives in `win32.rs`; tests use
//! the in-crate fake desktop.

use std::fmt;

use crate::error::HookResult;
use crate::handoff::RawHandoff;

/// Opaque window reference (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

/// Address of a window procedure, as stored in `GWLP_WNDPROC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddr(pub isize);

impl fmt::Display for ProcAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

pub trait WindowSystem {
    fn is_window(&self, hwnd: WindowHandle) -> bool;
    fn foreground_window(&self) -> Option<WindowHandle>;
    fn first_child(&self, hwnd: WindowHandle) -> Option<WindowHandle>;
    fn next_sibling(&self, hwnd: WindowHandle) -> Option<WindowHandle>;
    fn class_name(&self, hwnd: WindowHandle) -> Option<String>;

    /// Any window with this class, top-level first, then nested.
    fn find_window_by_class(&self, class: &str) -> Option<WindowHandle>;

    /// `(thread_id, process_id)` of the window's owner.
    fn window_owner(&self, hwnd: WindowHandle) -> (u32, u32);
    fn current_thread_id(&self) -> u32;

    /// Chain our interceptor ahead of the window's pipeline.
    fn set_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()>;
    fn remove_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()>;

    fn window_procedure(&self, hwnd: WindowHandle) -> Option<ProcAddr>;

    /// Swap the active procedure, returning the one it displaced.
    fn replace_window_procedure(&self, hwnd: WindowHandle, proc: ProcAddr) -> HookResult<ProcAddr>;

    /// Procedure installed by the replacement fallback.
    fn substitute_procedure(&self) -> ProcAddr;
}

pub trait HandoffSource {
    /// Map `name` read-only, copy one record out and release the mapping.
    fn read_record(&self, name: &str) -> Option<RawHandoff>;
}
