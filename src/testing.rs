//! In-memory desktop used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::error::{HookError, HookResult};
use crate::filter::Verdict;
use crate::handoff::RawHandoff;
use crate::lifecycle::Lifecycle;
use crate::platform::{HandoffSource, ProcAddr, WindowHandle, WindowSystem};

pub const OWNER_THREAD: u32 = 100;
pub const OWNER_PROCESS: u32 = 4242;
pub const CALLER_THREAD: u32 = 7;
pub const SUBSTITUTE: ProcAddr = ProcAddr(0x5B5B);

struct FakeWindow {
    class: String,
    parent: Option<WindowHandle>,
    children: Vec<WindowHandle>,
    alive: bool,
}

#[derive(Default)]
pub struct FakeDesktop {
    windows: HashMap<WindowHandle, FakeWindow>,
    top_level: Vec<WindowHandle>,
    forced_next: HashMap<WindowHandle, WindowHandle>,
    next_handle: isize,
    foreground: Option<WindowHandle>,
    handoff: Option<RawHandoff>,
    procs: RefCell<HashMap<WindowHandle, ProcAddr>>,
    subclasses: RefCell<HashSet<(WindowHandle, usize)>>,
    pub reject_subclass: Cell<bool>,
    pub reject_replace: Cell<bool>,
    pub replace_calls: Cell<usize>,
}

/// What happened to one message handed to [`deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No interceptor on the window; the message never reached us.
    Bypassed,
    Forwarded,
    Consumed,
}

impl FakeDesktop {
    pub const SEGMENT: &'static str = "TestHandoff";

    pub fn new() -> Self {
        Self {
            next_handle: 0x100,
            ..Default::default()
        }
    }

    fn alloc(&mut self, class: &str, parent: Option<WindowHandle>) -> WindowHandle {
        let hwnd = WindowHandle(self.next_handle);
        self.next_handle += 0x10;
        self.windows.insert(
            hwnd,
            FakeWindow {
                class: class.to_string(),
                parent,
                children: Vec::new(),
                alive: true,
            },
        );
        self.procs
            .borrow_mut()
            .insert(hwnd, ProcAddr(0x10_0000 + hwnd.0));
        hwnd
    }

    pub fn add_top_level(&mut self, class: &str) -> WindowHandle {
        let hwnd = self.alloc(class, None);
        self.top_level.push(hwnd);
        hwnd
    }

    pub fn add_child(&mut self, parent: WindowHandle, class: &str) -> WindowHandle {
        let hwnd = self.alloc(class, Some(parent));
        if let Some(p) = self.windows.get_mut(&parent) {
            p.children.push(hwnd);
        }
        hwnd
    }

    /// Chain of `depth` nested windows below `root`; the last one gets `leaf_class`.
    pub fn add_chain(&mut self, root: WindowHandle, depth: usize, leaf_class: &str) -> WindowHandle {
        let mut parent = root;
        for level in 1..=depth {
            let class = if level == depth {
                leaf_class.to_string()
            } else {
                format!("Level{level}")
            };
            parent = self.add_child(parent, &class);
        }
        parent
    }

    pub fn set_foreground(&mut self, hwnd: WindowHandle) {
        self.foreground = Some(hwnd);
    }

    pub fn force_next_sibling(&mut self, from: WindowHandle, to: WindowHandle) {
        self.forced_next.insert(from, to);
    }

    pub fn publish_handoff(&mut self, raw: RawHandoff) {
        self.handoff = Some(raw);
    }

    pub fn destroy(&mut self, hwnd: WindowHandle) {
        if let Some(w) = self.windows.get_mut(&hwnd) {
            w.alive = false;
        }
    }

    pub fn procedure_of(&self, hwnd: WindowHandle) -> Option<ProcAddr> {
        self.procs.borrow().get(&hwnd).copied()
    }

    pub fn has_subclass(&self, hwnd: WindowHandle) -> bool {
        self.subclasses.borrow().iter().any(|(h, _)| *h == hwnd)
    }

    fn live(&self, hwnd: WindowHandle) -> Option<&FakeWindow> {
        self.windows.get(&hwnd).filter(|w| w.alive)
    }

    fn siblings_of(&self, hwnd: WindowHandle) -> &[WindowHandle] {
        match self.live(hwnd).and_then(|w| w.parent) {
            Some(parent) => self
                .windows
                .get(&parent)
                .map(|p| p.children.as_slice())
                .unwrap_or(&[]),
            None => self.top_level.as_slice(),
        }
    }

    fn search_nested(&self, parent: WindowHandle, class: &str) -> Option<WindowHandle> {
        let w = self.live(parent)?;
        w.children.iter().copied().find_map(|child| {
            if self.live(child).is_some_and(|c| c.class == class) {
                Some(child)
            } else {
                self.search_nested(child, class)
            }
        })
    }
}

impl WindowSystem for FakeDesktop {
    fn is_window(&self, hwnd: WindowHandle) -> bool {
        self.live(hwnd).is_some()
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground
    }

    fn first_child(&self, hwnd: WindowHandle) -> Option<WindowHandle> {
        self.live(hwnd)?.children.first().copied()
    }

    fn next_sibling(&self, hwnd: WindowHandle) -> Option<WindowHandle> {
        if let Some(forced) = self.forced_next.get(&hwnd) {
            return Some(*forced);
        }
        let siblings = self.siblings_of(hwnd);
        let pos = siblings.iter().position(|h| *h == hwnd)?;
        siblings.get(pos + 1).copied()
    }

    fn class_name(&self, hwnd: WindowHandle) -> Option<String> {
        self.live(hwnd).map(|w| w.class.clone())
    }

    fn find_window_by_class(&self, class: &str) -> Option<WindowHandle> {
        let top = self
            .top_level
            .iter()
            .copied()
            .find(|h| self.live(*h).is_some_and(|w| w.class == class));
        top.or_else(|| {
            self.top_level
                .iter()
                .find_map(|h| self.search_nested(*h, class))
        })
    }

    fn window_owner(&self, _hwnd: WindowHandle) -> (u32, u32) {
        (OWNER_THREAD, OWNER_PROCESS)
    }

    fn current_thread_id(&self) -> u32 {
        CALLER_THREAD
    }

    fn set_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()> {
        if self.reject_subclass.get() || !self.is_window(hwnd) {
            return Err(HookError::Platform {
                op: "SetWindowSubclass",
                code: 5,
            });
        }
        self.subclasses.borrow_mut().insert((hwnd, id));
        Ok(())
    }

    fn remove_subclass(&self, hwnd: WindowHandle, id: usize) -> HookResult<()> {
        if self.subclasses.borrow_mut().remove(&(hwnd, id)) {
            Ok(())
        } else {
            Err(HookError::Platform {
                op: "RemoveWindowSubclass",
                code: 0,
            })
        }
    }

    fn window_procedure(&self, hwnd: WindowHandle) -> Option<ProcAddr> {
        self.live(hwnd)?;
        self.procedure_of(hwnd)
    }

    fn replace_window_procedure(&self, hwnd: WindowHandle, proc: ProcAddr) -> HookResult<ProcAddr> {
        self.replace_calls.set(self.replace_calls.get() + 1);
        if self.reject_replace.get() || !self.is_window(hwnd) {
            return Err(HookError::Platform {
                op: "SetWindowLongPtrW",
                code: 1400,
            });
        }
        self.procs
            .borrow_mut()
            .insert(hwnd, proc)
            .ok_or(HookError::Platform {
                op: "SetWindowLongPtrW",
                code: 1400,
            })
    }

    fn substitute_procedure(&self) -> ProcAddr {
        SUBSTITUTE
    }
}

impl HandoffSource for FakeDesktop {
    fn read_record(&self, name: &str) -> Option<RawHandoff> {
        if name == Self::SEGMENT {
            self.handoff
        } else {
            None
        }
    }
}

/// Route one message to `hwnd` through whatever interceptor is installed.
pub fn deliver(lifecycle: &mut Lifecycle<FakeDesktop>, hwnd: WindowHandle, message: u32) -> Delivery {
    let desk = lifecycle.platform();
    let intercepted =
        desk.has_subclass(hwnd) || desk.procedure_of(hwnd) == Some(desk.substitute_procedure());
    if !intercepted {
        return Delivery::Bypassed;
    }
    match lifecycle.on_message(message) {
        Verdict::Forward => Delivery::Forwarded,
        Verdict::Consume => Delivery::Consumed,
    }
}
