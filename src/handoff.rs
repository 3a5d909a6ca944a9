//! Shared-memory handoff from the companion process.

use log::{info, warn};

use crate::platform::{HandoffSource, WindowHandle, WindowSystem};

/// Wire layout written by the companion: `{ HWND, DWORD, BOOL }`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawHandoff {
    pub target_hwnd: isize,
    pub process_id: u32,
    pub is_valid: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffRecord {
    pub target: WindowHandle,
    pub owner_process_id: u32,
    pub is_valid: bool,
}

impl From<RawHandoff> for HandoffRecord {
    fn from(raw: RawHandoff) -> Self {
        Self {
            target: WindowHandle(raw.target_hwnd),
            owner_process_id: raw.process_id,
            is_valid: raw.is_valid != 0,
        }
    }
}

/// One-shot read of the handoff segment.
///
/// Returns the record only when the companion flagged it valid and the handle
/// still names a live window. Absence is a normal condition.
pub fn try_read<P>(platform: &P, segment: &str) -> Option<HandoffRecord>
where
    P: HandoffSource + WindowSystem,
{
    let Some(raw) = platform.read_record(segment) else {
        info!("[handoff] Segment '{}' not available", segment);
        return None;
    };
    let record = HandoffRecord::from(raw);

    if !record.is_valid {
        info!("[handoff] Record in '{}' is flagged invalid", segment);
        return None;
    }
    if record.target.is_null() || !platform.is_window(record.target) {
        warn!(
            "[handoff] Record names {} which is not a live window",
            record.target
        );
        return None;
    }

    let (_, actual_pid) = platform.window_owner(record.target);
    if actual_pid != record.owner_process_id {
        warn!(
            "[handoff] Owner pid mismatch for {}: record says {}, window belongs to {}",
            record.target, record.owner_process_id, actual_pid
        );
    }

    info!("[handoff] Target HWND from shared memory: {}", record.target);
    Some(record)
}
