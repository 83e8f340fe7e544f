//! Shared utilities

pub mod config;
pub mod context;
pub mod fs;
pub mod paths;
pub mod process;

pub use config::ToolchainConfig;
pub use context::GlobalContext;
