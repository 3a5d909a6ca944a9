//! Win32 backing for the platform seam, plus the two window procedures we
//! install and the process-wide slot they reach the lifecycle through.

use std::ffi::c_void;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Mutex, TryLockError};

use log::{debug, error, info, warn};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{
    CloseHandle, GetLastError, SetLastError, BOOL, HANDLE, HWND, LPARAM, LRESULT, WIN32_ERROR,
    WPARAM,
};
use windows::Win32::System::Memory::{
    MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS,
};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::HookConfig;
use crate::diagnostics;
use crate::error::{HookError, HookResult};
use crate::filter::Verdict;
use crate::handoff::RawHandoff;
use crate::lifecycle::Lifecycle;
use crate::platform::{HandoffSource, ProcAddr, WindowHandle, WindowSystem};

static LIFECYCLE: Mutex<Option<Lifecycle<Win32>>> = Mutex::new(None);

/// Continuation for `substitute_wndproc`, readable without the lock.
static FORWARD_TO: AtomicIsize = AtomicIsize::new(0);

pub struct Win32;

fn to_hwnd(hwnd: WindowHandle) -> HWND {
    HWND(hwnd.0 as *mut c_void)
}

fn from_hwnd(hwnd: HWND) -> Option<WindowHandle> {
    (!hwnd.is_invalid()).then(|| WindowHandle(hwnd.0 as isize))
}

fn last_error(op: &'static str) -> HookError {
    HookError::Platform {
        op,
        code: unsafe { GetLastError() }.0,
    }
}

fn class_of(hwnd: HWND) -> Option<String> {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    (len > 0).then(|| String::from_utf16_lossy(&buf[..len as usize]))
}

// ============================================================================
// Nested class lookup
// ============================================================================

struct NestedSearch {
    class: String,
    found: Option<HWND>,
}

unsafe extern "system" fn nested_child_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut NestedSearch);
    if class_of(hwnd).as_deref() == Some(search.class.as_str()) {
        search.found = Some(hwnd);
        return BOOL(0);
    }
    BOOL(1)
}

unsafe extern "system" fn nested_top_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let _ = EnumChildWindows(hwnd, Some(nested_child_cb), lparam);
    let search = &*(lparam.0 as *const NestedSearch);
    BOOL(search.found.is_none() as i32)
}

fn find_nested(class: &str) -> Option<WindowHandle> {
    let mut search = NestedSearch {
        class: class.to_string(),
        found: None,
    };
    let _ = unsafe {
        EnumWindows(
            Some(nested_top_cb),
            LPARAM(&mut search as *mut NestedSearch as isize),
        )
    };
    search.found.and_then(from_hwnd)
}

// ============================================================================
// Platform seam
// ============================================================================

impl WindowSystem for Win32 {
    fn is_window(&self, hwnd: WindowHandle) -> bool {
        unsafe { IsWindow(to_hwnd(hwnd)) }.as_bool()
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        from_hwnd(unsafe { GetForegroundWindow() })
    }

    fn first_child(&self, hwnd: WindowHandle) -> Option<WindowHandle> {
        unsafe { GetWindow(to_hwnd(hwnd), GW_CHILD) }
            .ok()
            .and_then(from_hwnd)
    }

    fn next_sibling(&self, hwnd: WindowHandle) -> Option<WindowHandle> {
        unsafe { GetWindow(to_hwnd(hwnd), GW_HWNDNEXT) }
            .ok()
            .and_then(from_hwnd)
    }

    fn class_name(&self, hwnd: WindowHandle) -> Option<String> {
        class_of(to_hwnd(hwnd))
    }

    fn find_window_by_class(&self, class: &str) -> Option<WindowHandle> {
        let wide = HSTRING::from(class);
        unsafe { FindWindowW(PCWSTR(wide.as_ptr()), PCWSTR::null()) }
            .ok()
            .and_then(from_hwnd)
            .or_else(|| find_nested(class))
    }

    fn window_owner(&self, hwnd: WindowHandle) -> (u32, u32) {
        let mut pid = 0u32;
        let tid = unsafe { GetWindowThreadProcessId(to_hwnd(hwnd), Some(&mut pid)) };
        (tid, pid)
    }

    fn current_thread_id(&self) -> u32 {
        unsafe { GetCurrentThreadId() }
    }

    fn set_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()> {
        let ok = unsafe { SetWindowSubclass(to_hwnd(hwnd), Some(subclass_proc), id, 0) };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(last_error("SetWindowSubclass"))
        }
    }

    fn remove_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()> {
        let ok = unsafe { RemoveWindowSubclass(to_hwnd(hwnd), Some(subclass_proc), id) };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(last_error("RemoveWindowSubclass"))
        }
    }

    fn window_procedure(&self, hwnd: WindowHandle) -> Option<ProcAddr> {
        let raw = unsafe { GetWindowLongPtrW(to_hwnd(hwnd), GWLP_WNDPROC) };
        (raw != 0).then_some(ProcAddr(raw))
    }

    fn replace_window_procedure(&self, hwnd: WindowHandle, proc: ProcAddr) -> HookResult<ProcAddr> {
        let ours = proc == self.substitute_procedure();
        if ours {
            // Our procedure may run before SetWindowLongPtrW returns.
            let current = unsafe { GetWindowLongPtrW(to_hwnd(hwnd), GWLP_WNDPROC) };
            FORWARD_TO.store(current, Ordering::Release);
        }

        let previous = unsafe {
            SetLastError(WIN32_ERROR(0));
            SetWindowLongPtrW(to_hwnd(hwnd), GWLP_WNDPROC, proc.0)
        };
        if previous == 0 {
            return Err(last_error("SetWindowLongPtrW"));
        }
        if ours {
            FORWARD_TO.store(previous, Ordering::Release);
        }
        Ok(ProcAddr(previous))
    }

    fn substitute_procedure(&self) -> ProcAddr {
        ProcAddr(substitute_wndproc as usize as isize)
    }
}

struct Mapping(HANDLE);

impl Drop for Mapping {
    fn drop(&mut self) {
        let _ = unsafe { CloseHandle(self.0) };
    }
}

struct View(MEMORY_MAPPED_VIEW_ADDRESS);

impl Drop for View {
    fn drop(&mut self) {
        let _ = unsafe { UnmapViewOfFile(self.0) };
    }
}

impl HandoffSource for Win32 {
    fn read_record(&self, name: &str) -> Option<RawHandoff> {
        let wide = HSTRING::from(name);
        let mapping = match unsafe {
            OpenFileMappingW(FILE_MAP_READ.0, BOOL::from(false), PCWSTR(wide.as_ptr()))
        } {
            Ok(handle) => Mapping(handle),
            Err(e) => {
                debug!("[handoff] OpenFileMappingW('{}') failed: {}", name, e);
                return None;
            }
        };

        let view = View(unsafe {
            MapViewOfFile(
                mapping.0,
                FILE_MAP_READ,
                0,
                0,
                std::mem::size_of::<RawHandoff>(),
            )
        });
        if view.0.Value.is_null() {
            warn!("[handoff] {}", last_error("MapViewOfFile"));
            return None;
        }

        Some(unsafe { std::ptr::read_unaligned(view.0.Value as *const RawHandoff) })
    }
}

// ============================================================================
// Window procedures
// ============================================================================

/// Never blocks: a contended lock means the message passes through untouched.
fn route(message: u32) -> Verdict {
    match LIFECYCLE.try_lock() {
        Ok(mut slot) => slot
            .as_mut()
            .map_or(Verdict::Forward, |lifecycle| lifecycle.on_message(message)),
        Err(_) => Verdict::Forward,
    }
}

unsafe extern "system" fn subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _id: usize,
    _ref_data: usize,
) -> LRESULT {
    match route(msg) {
        Verdict::Consume => LRESULT(0),
        Verdict::Forward => DefSubclassProc(hwnd, msg, wparam, lparam),
    }
}

unsafe extern "system" fn substitute_wndproc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if route(msg) == Verdict::Consume {
        return LRESULT(0);
    }
    match FORWARD_TO.load(Ordering::Acquire) {
        0 => DefWindowProcW(hwnd, msg, wparam, lparam),
        raw => {
            let previous: WNDPROC = std::mem::transmute(raw);
            CallWindowProcW(previous, hwnd, msg, wparam, lparam)
        }
    }
}

// ============================================================================
// Process attach / detach
// ============================================================================

/// Runs on the setup thread spawned from `DllMain`.
pub fn attach() {
    let (config, config_err) = match HookConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (HookConfig::default(), Some(e)),
    };
    diagnostics::init_logging(&config);

    info!(
        "[attach] DLL_PROCESS_ATTACH, pid {}, config {}",
        std::process::id(),
        serde_json::to_string(&config).unwrap_or_default()
    );
    if let Some(e) = config_err {
        warn!("[attach] {}; using defaults", e);
    }

    let mut slot = match LIFECYCLE.lock() {
        Ok(slot) => slot,
        Err(_) => {
            error!("[attach] Hook state lock poisoned");
            return;
        }
    };
    let lifecycle = slot.get_or_insert_with(|| Lifecycle::new(Win32, config));
    if let Err(e) = lifecycle.attach() {
        warn!("[attach] Interception inactive: {}", e);
    }
}

/// Never waits on the slot: a holder that died mid-callback would hang unload.
pub fn detach() {
    info!("[detach] DLL_PROCESS_DETACH - DLL unloading");
    let mut slot = match LIFECYCLE.try_lock() {
        Ok(slot) => slot,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => {
            warn!("[detach] Hook state busy, skipping teardown");
            return;
        }
    };
    if let Some(mut lifecycle) = slot.take() {
        lifecycle.detach();
    }
}
