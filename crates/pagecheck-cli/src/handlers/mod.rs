//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests against the in-memory driver

pub mod config;
pub mod live;

pub use config::{execute_config, render_config};
pub use live::{
    check_screenshot, converge, execute_converge, execute_records, execute_screenshot,
    predicate_from_args, read_records, validate_url,
};
