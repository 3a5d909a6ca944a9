//! Per-message decision taken inside the intercepted window procedure.
//!
//! Runs inline with the host's message delivery, so it only touches the
//! suppression flag and never blocks.

use log::info;

const WM_USER: u32 = 0x0400;

pub const WM_MOUSELEAVE: u32 = 0x02A3;

/// Diagnostic only; installation happens at attach.
pub const WM_INSTALL_HOOK: u32 = WM_USER + 1;
pub const WM_UNINSTALL_HOOK: u32 = WM_USER + 2;
pub const WM_ENABLE_LEAVE_EVENTS: u32 = WM_USER + 3;
pub const WM_DISABLE_LEAVE_EVENTS: u32 = WM_USER + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the message to the rest of the window's pipeline.
    Forward,
    /// Return 0 without forwarding.
    Consume,
}

/// What the lifecycle must do after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pass(Verdict),
    Uninstall,
}

pub fn filter(message: u32, suppress_leave: &mut bool) -> Action {
    match message {
        WM_ENABLE_LEAVE_EVENTS => {
            *suppress_leave = false;
            info!("[filter] WM_ENABLE_LEAVE_EVENTS received - leave events enabled");
            Action::Pass(Verdict::Consume)
        }
        WM_DISABLE_LEAVE_EVENTS => {
            *suppress_leave = true;
            info!("[filter] WM_DISABLE_LEAVE_EVENTS received - leave events suppressed");
            Action::Pass(Verdict::Consume)
        }
        WM_INSTALL_HOOK => {
            info!("[filter] WM_INSTALL_HOOK received (diagnostic only)");
            Action::Pass(Verdict::Consume)
        }
        WM_UNINSTALL_HOOK => Action::Uninstall,
        WM_MOUSELEAVE if *suppress_leave => Action::Pass(Verdict::Consume),
        _ => Action::Pass(Verdict::Forward),
    }
}
