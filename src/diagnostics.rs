//! Best-effort append-only text log. Nothing here may affect interception.

use std::fs::OpenOptions;

use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::HookConfig;

/// Returns whether the logger was installed.
pub fn init_logging(config: &HookConfig) -> bool {
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    else {
        return false;
    };

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(log::LevelFilter::Error)
        .build();

    WriteLogger::init(config.level_filter(), log_config, file).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unopenable_log_path_is_ignored() {
        let dir = std::env::temp_dir().join("mouseleave_hook_missing_dir_7f3a");
        let config = HookConfig {
            log_file: dir.join("hook.log"),
            ..HookConfig::default()
        };

        assert!(!init_logging(&config));
        assert!(!dir.exists());
    }
}
