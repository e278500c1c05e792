//! swap-core: Shared types, errors, and configuration
//!
//! This crate provides the foundational types used across the workspace:
//! chains, tokens and bridge pairs, smallest-unit amount conversion, the
//! error taxonomy, and the single-writer publish points that mirror the
//! latest observed on-chain and backend values.

pub mod amount;
pub mod config;
pub mod errors;
pub mod journal;
pub mod publish;
pub mod report;
pub mod types;

pub use amount::*;
pub use config::*;
pub use errors::*;
pub use journal::Journal;
pub use publish::Published;
pub use report::{ErrorReporter, LogReporter};
pub use types::*;
