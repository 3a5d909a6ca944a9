//! Attach/detach orchestration and runtime control messages.
//!
//! One `Lifecycle` lives for one process load. It owns the [`HookState`] of
//! the single active interception, if any.

use log::{error, info, warn};

use crate::config::HookConfig;
use crate::error::{HookError, HookResult};
use crate::filter::{self, Action, Verdict};
use crate::handoff;
use crate::installer::{self, HookState};
use crate::locator::TargetLocator;
use crate::platform::{HandoffSource, WindowHandle, WindowSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Detached,
    Attached,
}

pub struct Lifecycle<P> {
    platform: P,
    config: HookConfig,
    hook: Option<HookState>,
    attempted: bool,
}

impl<P> Lifecycle<P>
where
    P: WindowSystem + HandoffSource,
{
    pub fn new(platform: P, config: HookConfig) -> Self {
        Self {
            platform,
            config,
            hook: None,
            attempted: false,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn hook(&self) -> Option<&HookState> {
        self.hook.as_ref()
    }

    pub fn phase(&self) -> Phase {
        match &self.hook {
            Some(state) if state.is_active() => Phase::Attached,
            _ => Phase::Detached,
        }
    }

    /// Detached → Attached. Runs at most once per process load; failures
    /// leave the hook inactive.
    pub fn attach(&mut self) -> HookResult<WindowHandle> {
        if self.attempted {
            warn!("[lifecycle] Attach already attempted, ignoring");
            return Err(HookError::AlreadyAttempted);
        }
        self.attempted = true;

        let target = match self.find_target() {
            Some(hwnd) => hwnd,
            None => {
                let err = HookError::NotFound {
                    class: self.config.target_class.clone(),
                };
                error!("[lifecycle] {}", err);
                return Err(err);
            }
        };

        let state = installer::install(&self.platform, target, self.config.subclass_id)?;
        info!(
            "[lifecycle] Attached to {} via {:?}",
            state.target, state.method
        );
        self.hook = Some(state);
        Ok(target)
    }

    fn find_target(&self) -> Option<WindowHandle> {
        if let Some(record) = handoff::try_read(&self.platform, &self.config.segment_name) {
            return Some(record.target);
        }
        info!("[lifecycle] No usable handoff, searching window tree");
        TargetLocator::new(
            &self.platform,
            &self.config.target_class,
            self.config.max_depth,
        )
        .locate()
    }

    /// Attached → Detached. The uninstall result is logged, never returned.
    pub fn detach(&mut self) {
        let Some(mut state) = self.hook.take() else {
            return;
        };
        match installer::uninstall(&self.platform, &mut state) {
            Ok(()) => info!("[lifecycle] Detached from {}", state.target),
            Err(e) => warn!("[lifecycle] {}", e),
        }
    }

    /// Filter one message delivered to the hooked window.
    pub fn on_message(&mut self, message: u32) -> Verdict {
        let Some(state) = self.hook.as_mut().filter(|s| s.is_active()) else {
            return Verdict::Forward;
        };
        match filter::filter(message, &mut state.suppress_leave_events) {
            Action::Pass(verdict) => verdict,
            Action::Uninstall => {
                info!("[lifecycle] WM_UNINSTALL_HOOK received");
                self.detach();
                Verdict::Consume
            }
        }
    }
}
