//! # filegate – core
//!
//! Backend-independent pieces of the filegate client:
//!   • Error taxonomy with operation/path context
//!   • Remote path normalisation
//!   • Case-insensitive file-name patterns for bulk operations
//!   • The `ProtocolAdapter` capability trait
//!   • Folder creation / recursive deletion shared by all backends
//!   • Size verification and rollback around transfers

pub mod adapter;
pub mod entry;
pub mod error;
pub mod folders;
pub mod path;
pub mod pattern;
pub mod verify;

pub use adapter::{ProtocolAdapter, RemoteOps};
pub use entry::{EntryKind, RemoteEntry};
pub use error::{Error, ErrorKind, Operation, Result};
pub use pattern::NameMatcher;
