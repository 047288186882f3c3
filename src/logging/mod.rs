//! Structured logging via `tracing`.
//!
//! Provides:
//! - Level-based filtering with per-module overrides
//! - `RUST_LOG` taking precedence over the configured filter
//! - Idempotent initialization (first call wins)
//!
//! Bevy's own `LogPlugin` installs a global subscriber too; apps that use
//! [`LoggingPlugin`] should disable it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Installs the tracing subscriber when the app is built.
#[derive(Default)]
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

/// Log level for the tethered core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_timestamps: bool,
    pub show_thread_ids: bool,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("tethered_core::dash".to_string(), LogLevel::Info),
                ("tethered_core::aim_assist".to_string(), LogLevel::Info),
                ("tethered_core::hotreload".to_string(), LogLevel::Info),
                ("tethered_core::movement".to_string(), LogLevel::Warn),
                ("wgpu".to_string(), LogLevel::Error),
                ("naga".to_string(), LogLevel::Warn),
            ],
            show_timestamps: true,
            show_thread_ids: false,
            show_targets: true,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }

    /// Same config with `module` raised or lowered to `level`.
    pub fn with_module(mut self, module: &str, level: LogLevel) -> Self {
        match self.module_filters.iter_mut().find(|(name, _)| name == module) {
            Some((_, existing)) => *existing = level,
            None => self.module_filters.push((module.to_string(), level)),
        }
        self
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with default settings (idempotent)
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing with custom config. Idempotent, the first call wins.
pub fn init_tracing(config: &TracingConfig) {
    let config = config.clone();
    TRACING_INIT.call_once(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.to_env_filter_string()));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_targets)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line);

        // Ignore error if a global subscriber is already set (e.g., by Bevy)
        let _ = if config.show_timestamps {
            builder.compact().try_init()
        } else {
            builder.without_time().compact().try_init()
        };
    });
}
