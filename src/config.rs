//! Hook settings: defaults, then an optional JSON file, then env overrides.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HookError, HookResult};

pub const CONFIG_ENV: &str = "MOUSELEAVE_HOOK_CONFIG";
pub const SEGMENT_ENV: &str = "MOUSELEAVE_HOOK_SEGMENT";
pub const CLASS_ENV: &str = "MOUSELEAVE_HOOK_CLASS";
pub const LOG_ENV: &str = "MOUSELEAVE_HOOK_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HookConfig {
    /// Name the companion publishes the handoff record under.
    pub segment_name: String,
    pub target_class: String,
    pub max_depth: usize,
    pub subclass_id: usize,
    pub log_file: PathBuf,
    /// `error`..`trace`; unset means debug in debug builds, info otherwise.
    pub log_level: Option<String>,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            segment_name: "PigAssistantSharedMemory".to_string(),
            target_class: "Chrome_RenderWidgetHostHWND".to_string(),
            max_depth: 10,
            subclass_id: 0x4D57_504C, // "MWPL"
            log_file: std::env::temp_dir().join("mouseleave_hook.log"),
            log_level: None,
        }
    }
}

impl HookConfig {
    pub fn from_json(text: &str) -> HookResult<Self> {
        serde_json::from_str(text).map_err(|e| HookError::Config(e.to_string()))
    }

    /// Defaults, then the JSON file named by `MOUSELEAVE_HOOK_CONFIG`, then
    /// single-field env overrides.
    pub fn load() -> HookResult<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|e| {
                    HookError::Config(format!("{}: {}", PathBuf::from(&path).display(), e))
                })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(segment) = lookup(SEGMENT_ENV).filter(|s| !s.is_empty()) {
            self.segment_name = segment;
        }
        if let Some(class) = lookup(CLASS_ENV).filter(|s| !s.is_empty()) {
            self.target_class = class;
        }
        if let Some(log) = lookup(LOG_ENV).filter(|s| !s.is_empty()) {
            self.log_file = PathBuf::from(log);
        }
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(if cfg!(debug_assertions) {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            })
    }
}
