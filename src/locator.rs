//! Target window search.
//!
//! Phase 1 walks the foreground window's descendants in pre-order (each child
//! is fully explored before its next sibling). Direct children are depth 0
//! and the walk stops below depth `max_depth`.
//! Phase 2 asks the OS for any window with the target class.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::platform::{WindowHandle, WindowSystem};

pub struct TargetLocator<'a, W> {
    windows: &'a W,
    class: &'a str,
    max_depth: usize,
}

impl<'a, W: WindowSystem> TargetLocator<'a, W> {
    pub fn new(windows: &'a W, class: &'a str, max_depth: usize) -> Self {
        Self {
            windows,
            class,
            max_depth,
        }
    }

    pub fn locate(&self) -> Option<WindowHandle> {
        info!("[locate] Searching for {} window...", self.class);

        if let Some(root) = self.windows.foreground_window() {
            let (tid, pid) = self.windows.window_owner(root);
            info!(
                "[locate] Foreground window {} class '{}' pid {} tid {}",
                root,
                self.windows.class_name(root).unwrap_or_default(),
                pid,
                tid
            );
            if let Some(found) = self.scoped_search(root) {
                return Some(found);
            }
        }

        info!(
            "[locate] {} not under foreground window, trying global lookup",
            self.class
        );
        match self.windows.find_window_by_class(self.class) {
            Some(hwnd) => {
                let (_, pid) = self.windows.window_owner(hwnd);
                info!(
                    "[locate] Found {} via global lookup: {} pid {}",
                    self.class, hwnd, pid
                );
                Some(hwnd)
            }
            None => {
                warn!("[locate] No {} window found", self.class);
                None
            }
        }
    }

    /// First descendant of `root` whose class matches exactly. Direct
    /// children are depth 0; descendants down to depth `max_depth` are
    /// examined.
    pub fn scoped_search(&self, root: WindowHandle) -> Option<WindowHandle> {
        let mut pending: Vec<(WindowHandle, usize)> = Vec::new();
        let mut seen: HashSet<WindowHandle> = HashSet::new();

        if let Some(child) = self.windows.first_child(root) {
            pending.push((child, 0));
        }

        while let Some((hwnd, depth)) = pending.pop() {
            if !seen.insert(hwnd) {
                debug!("[locate] {} already visited, skipping", hwnd);
                continue;
            }

            let class = self.windows.class_name(hwnd).unwrap_or_default();
            debug!(
                "[locate] {:indent$}Checking child {} class '{}'",
                "",
                hwnd,
                class,
                indent = depth * 2
            );
            if class == self.class {
                info!("[locate] Found {} at depth {}: {}", self.class, depth, hwnd);
                return Some(hwnd);
            }

            // Sibling goes under the child so the subtree is exhausted first.
            if let Some(next) = self.windows.next_sibling(hwnd) {
                pending.push((next, depth));
            }
            if depth < self.max_depth {
                if let Some(child) = self.windows.first_child(hwnd) {
                    pending.push((child, depth + 1));
                }
            }
        }
        None
    }
}
