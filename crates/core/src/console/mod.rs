//! God-mode SQL console guard.

pub mod error;
pub mod query;

pub use error::ConsoleError;
pub use query::{QueryKind, ReadOnlyQuery};
