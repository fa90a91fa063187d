//! Haystack Client - high-level object model over a tag-data session
//!
//! Entities come back from a session as plain id + tag mappings; this
//! crate layers browsing conveniences on top: a [`Site`] behaves like a
//! container of the equipment that references it, an [`Equip`] like a
//! container of its points, and any entity carrying a `siteRef` can
//! resolve the site it belongs to.
//!
//! Transport is out of scope. Queries go through the [`HaystackSession`]
//! trait; [`MemorySession`] is the bundled in-process implementation used
//! by tests and demos.

pub mod config;
pub mod entity;
pub mod equip;
pub mod error;
pub mod memory;
pub mod session;
pub mod site;

// Re-exports for convenience
pub use config::ClientConfig;
pub use entity::Entity;
pub use equip::Equip;
pub use error::{Error, Result};
pub use memory::MemorySession;
pub use session::{HaystackSession, SessionHandle};
pub use site::{Lookup, Resolved, Site};
