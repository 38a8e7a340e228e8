//! Concrete adapter implementations for ports.

pub mod fanout_log_adapter;
pub mod file_config_adapter;
pub mod history_log_adapter;
pub mod svg_chart_adapter;
pub mod tracing_log_adapter;
