//! Utility Functions
//!
//! User-facing error formatting for the binary:
//!
//! ```rust,ignore
//! use lamco_head_pointer::utils::format_user_error;
//!
//! if let Err(e) = run().await {
//!     eprintln!("{}", format_user_error(&e));
//! }
//! ```
//!
//! Categories with context-aware help:
//! - Trace errors → JSONL layout, record types, required sample fields
//! - Target errors → unmeasured elements, empty ids
//! - Config errors → TOML syntax, value ranges, confirm modes
//! - IO errors → trace path, stdin

pub mod errors;

pub use errors::format_user_error;
