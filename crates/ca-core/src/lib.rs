//! Core types and traits for the certificate authority admin client.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - **Types**: Strongly-typed mirrors of the backend's OpenAPI schema
//! - **Errors**: Error handling with [`CaError`]
//! - **Storage**: The [`SessionStorage`] abstraction behind UI preferences and
//!   persisted login sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use ca_core::{ClientDto, Result};
//!
//! fn describe(client: &ClientDto) -> Result<()> {
//!     println!("{} ({})", client.display_name, client.id);
//!     println!("active: {}", client.active);
//!     Ok(())
//! }
//! ```

mod error;
pub mod storage;
pub mod types;

pub use error::{CaError, Result};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use types::*;
