//! Data loading for the certificate authority admin views.
//!
//! - [`loaders`] - per-route loaders that resolve page data or a redirect
//! - [`preferences`] - UI preferences persisted in session storage
//! - [`util`] - small formatting and file helpers

pub mod loaders;
pub mod preferences;
pub mod util;

pub use loaders::{LoadError, LoadResult, Loaders};
pub use preferences::{PreferenceKey, PreferenceStore, Preferences};
