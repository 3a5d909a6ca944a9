//! Attach/detach the interception layer on one window.
//!
//! Chaining (`SetWindowSubclass`) is tried first. Any refusal falls back to
//! swapping `GWLP_WNDPROC` for our substitute procedure, remembering the
//! displaced one so it can be written back.

use log::{error, info, warn};

use crate::error::{HookError, HookResult};
use crate::platform::{ProcAddr, WindowHandle, WindowSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstalledMethod {
    None,
    Chained,
    /// Carries the procedure that was active right before the swap.
    Replaced(ProcAddr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookState {
    pub target: WindowHandle,
    pub owner_thread_id: u32,
    pub owner_process_id: u32,
    /// Identity token for the chained interceptor.
    pub subclass_id: usize,
    pub method: InstalledMethod,
    pub suppress_leave_events: bool,
}

impl HookState {
    pub fn is_active(&self) -> bool {
        self.method != InstalledMethod::None
    }

    pub fn saved_procedure(&self) -> Option<ProcAddr> {
        match self.method {
            InstalledMethod::Replaced(saved) => Some(saved),
            InstalledMethod::None | InstalledMethod::Chained => None,
        }
    }
}

pub fn install<W: WindowSystem>(
    windows: &W,
    target: WindowHandle,
    subclass_id: usize,
) -> HookResult<HookState> {
    if target.is_null() || !windows.is_window(target) {
        error!("[install] {} is not a live window", target);
        return Err(HookError::WindowGone(target));
    }

    let (owner_thread_id, owner_process_id) = windows.window_owner(target);
    let caller = windows.current_thread_id();
    info!(
        "[install] Target {} class '{}' pid {} owner tid {}, caller tid {}",
        target,
        windows.class_name(target).unwrap_or_default(),
        owner_process_id,
        owner_thread_id,
        caller
    );
    if caller != owner_thread_id {
        info!("[install] Not on the owner thread, installing anyway");
    }

    let state = |method: InstalledMethod| HookState {
        target,
        owner_thread_id,
        owner_process_id,
        subclass_id,
        method,
        suppress_leave_events: false,
    };

    let rejected = match windows.set_subclass(target, subclass_id) {
        Ok(()) => {
            info!("[install] Subclass installed on {}", target);
            return Ok(state(InstalledMethod::Chained));
        }
        Err(e) => HookError::PlatformRejected {
            target,
            source: Box::new(e),
        },
    };
    warn!("[install] {}; trying procedure replacement", rejected);

    match replace_procedure(windows, target) {
        Ok(saved) => {
            info!(
                "[install] Procedure replaced on {}, saved {}",
                target, saved
            );
            Ok(state(InstalledMethod::Replaced(saved)))
        }
        Err(e) => {
            let err = HookError::InstallFailed {
                target,
                chained: rejected.to_string(),
                replaced: e.to_string(),
            };
            error!("[install] {}", err);
            Err(err)
        }
    }
}

fn replace_procedure<W: WindowSystem>(windows: &W, target: WindowHandle) -> HookResult<ProcAddr> {
    let current = windows.window_procedure(target).ok_or(HookError::Platform {
        op: "GetWindowLongPtrW",
        code: 0,
    })?;
    let displaced = windows.replace_window_procedure(target, windows.substitute_procedure())?;
    if displaced != current {
        warn!(
            "[install] Procedure on {} changed between read ({}) and swap ({})",
            target, current, displaced
        );
    }
    Ok(displaced)
}

/// Reverse whatever `install` did. Local bookkeeping is always cleared, even
/// when the platform call fails; the error is for logging only.
pub fn uninstall<W: WindowSystem>(windows: &W, state: &mut HookState) -> HookResult<()> {
    let target = state.target;
    let method = std::mem::replace(&mut state.method, InstalledMethod::None);

    let outcome = match method {
        InstalledMethod::None => return Ok(()),
        _ if !windows.is_window(target) => Err(HookError::WindowGone(target)),
        InstalledMethod::Chained => windows.remove_subclass(target, state.subclass_id),
        InstalledMethod::Replaced(saved) => restore_procedure(windows, target, saved),
    };

    match outcome {
        Ok(()) => {
            info!("[uninstall] Interception removed from {}", target);
            Ok(())
        }
        Err(e) => Err(HookError::UninstallBestEffort {
            target,
            source: Box::new(e),
        }),
    }
}

fn restore_procedure<W: WindowSystem>(
    windows: &W,
    target: WindowHandle,
    saved: ProcAddr,
) -> HookResult<()> {
    let ours = windows.substitute_procedure();
    if let Some(active) = windows.window_procedure(target) {
        if active != ours {
            warn!(
                "[uninstall] Procedure on {} is {} not ours ({}); restoring {} anyway",
                target, active, ours, saved
            );
        }
    }
    windows.replace_window_procedure(target, saved).map(|_| ())
}
