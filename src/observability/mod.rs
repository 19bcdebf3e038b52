//! Tracing setup and failure reporting.
//!
//! Every component logs through `tracing` macros; this module owns the
//! subscriber installation and the record keeping for failures the runtime
//! catches at its boundaries.
//!
//! # Architecture
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → stderr
//! caught failure → ErrorLog → RuntimeEvent::Error + ErrorReporter
//! ```
//!
//! # Configuration
//!
//! Trace level is controlled via the `traceLevel` config option, defaulting
//! to `"info"`.
//!
//! # Usage
//!
//! ```rust
//! use layerkit::observability::init_tracing;
//! use layerkit::Config;
//!
//! init_tracing(&Config::default());
//! tracing::debug!("runtime initialized");
//! ```
//!
//! # Modules
//!
//! - [`init`]: Tracing initialization and subscriber setup
//! - [`reporter`]: Error log and the external reporter boundary

mod init;
pub mod reporter;

pub use init::init_tracing;
pub use reporter::{ErrorLog, ErrorReporter, TracingReporter, MAX_ERROR_RECORDS};
