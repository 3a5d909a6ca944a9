//! Injectable module that suppresses spurious WM_MOUSELEAVE on a render window.
//!
//! Once loaded into the browser process it locates the target window (handle
//! published by the host in shared memory, otherwise a search below the
//! foreground window for `Chrome_RenderWidgetHostHWND`), subclasses it and
//! swallows WM_MOUSELEAVE while suppression is on. If the subclass cannot be
//! installed from our thread the window procedure is swapped instead.
//!
//! Control messages posted to the target window by the host:
//! - `WM_DISABLE_LEAVE_EVENTS` / `WM_ENABLE_LEAVE_EVENTS`: toggle suppression
//! - `WM_UNINSTALL_HOOK`: remove the interception now
//! - `WM_INSTALL_HOOK`: accepted and logged only
//!
//! Everything except `win32` is platform-independent so the decision logic
//! can be tested against a synthetic desktop.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod handoff;
pub mod installer;
pub mod lifecycle;
pub mod locator;
pub mod platform;

#[cfg(target_os = "windows")]
mod win32;

#[cfg(test)]
mod testing;

pub use error::{HookError, HookResult};
pub use filter::{
    WM_DISABLE_LEAVE_EVENTS, WM_ENABLE_LEAVE_EVENTS, WM_INSTALL_HOOK, WM_MOUSELEAVE,
    WM_UNINSTALL_HOOK,
};

#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{BOOL, HINSTANCE, HMODULE};
#[cfg(target_os = "windows")]
use windows::Win32::System::LibraryLoader::DisableThreadLibraryCalls;
#[cfg(target_os = "windows")]
use windows::Win32::System::SystemServices::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};

/// Heavy work is kept off the loader lock: attach runs on its own thread.
#[cfg(target_os = "windows")]
#[no_mangle]
#[allow(non_snake_case)]
pub extern "system" fn DllMain(hinst: HINSTANCE, reason: u32, reserved: *mut core::ffi::c_void) -> BOOL {
    match reason {
        DLL_PROCESS_ATTACH => {
            let _ = unsafe { DisableThreadLibraryCalls(HMODULE::from(hinst)) };
            std::thread::spawn(win32::attach);
        }
        DLL_PROCESS_DETACH if tears_down_on_detach(reserved) => win32::detach(),
        _ => {}
    }
    BOOL(1)
}

/// Non-null `reserved` on detach means the process is exiting: other threads
/// are already gone and the window goes away with the process.
#[cfg(any(target_os = "windows", test))]
fn tears_down_on_detach(reserved: *const core::ffi::c_void) -> bool {
    reserved.is_null()
}
