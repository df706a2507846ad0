// Public modules
pub mod error;
pub mod guard;
pub mod workspace;

// Internal modules - not part of public API
pub(crate) mod config;

// Re-export common types for convenience
pub use config::GuardConfig;
pub use error::{Error, Result};
pub use workspace::GuardContext;
