//! Session contract.
//!
//! A session owns the connection to a tag-data server (or an in-process
//! store) and materializes [`Entity`] values from query results. The
//! convenience layers in [`crate::site`] and [`crate::equip`] only ever
//! talk to this trait.
//!
//! All operations are future-returning; awaiting gives the blocking call
//! style, spawning gives the completion-callback style. Single-result
//! lookups are distinct operations rather than a boolean parameter on the
//! multi-result one.

use async_trait::async_trait;
use std::sync::Arc;

use haystack_types::Ref;

use crate::entity::Entity;
use crate::error::{Error, Result};

/// Shared handle entities keep back to their owning session.
pub type SessionHandle = Arc<dyn HaystackSession>;

/// Query surface of a tag-data session.
///
/// `filter` is a filter expression in the server's tag-query grammar.
/// Implementations own filter validation; a malformed expression fails
/// with whatever the implementation raises ([`Error::Filter`] or a
/// transport-level kind).
#[async_trait]
pub trait HaystackSession: Send + Sync {
    /// Find all entities matching a filter expression, up to `limit` rows.
    async fn find_entities(&self, filter: &str, limit: Option<usize>) -> Result<Vec<Entity>>;

    /// Find the single entity matching a filter expression.
    ///
    /// Default implementation takes the first row; no row at all is
    /// [`Error::NotFound`].
    async fn find_entity(&self, filter: &str) -> Result<Entity> {
        self.find_entities(filter, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(filter.to_string()))
    }

    /// Resolve one entity by its identifier.
    async fn get_entity(&self, entity_ref: &Ref) -> Result<Entity>;
}
