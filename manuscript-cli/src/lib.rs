// All analysis lives in manuscript-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod logging;
pub mod paths;

// Re-export core types for convenience
pub use manuscript_core::*;

// Re-export CLI utilities
pub use paths::DataDirs;
