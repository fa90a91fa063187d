//! Equip capability: an equipment entity as a container of its points.
//!
//! Same shape as the site capability one level down: queries scoped by
//! `equipRef`, a fetch-once point cache, and site resolution through the
//! wrapped entity's `siteRef`.

use parking_lot::Mutex;
use tracing::debug;

use haystack_types::Ref;

use crate::entity::Entity;
use crate::error::Result;
use crate::site::{ChildCache, scoped_filter};

/// An entity carrying the `equip` marker, browsable as a container of
/// the points that reference it.
pub struct Equip {
    entity: Entity,
    points: Mutex<ChildCache>,
}

impl Equip {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            points: Mutex::new(ChildCache::Unloaded),
        }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn id(&self) -> &Ref {
        self.entity.id()
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }

    /// Find entities linked to this equipment (`equipRef` scope).
    pub async fn find_entities(
        &self,
        filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Entity>> {
        let scoped = scoped_filter("equipRef", self.entity.id(), filter);
        self.entity.session().find_entities(&scoped, limit).await
    }

    /// The equipment's points, in query-result order.
    ///
    /// Memoized like [`crate::Site::equipments`]: one query on first
    /// access, cached until [`Equip::refresh`] or [`Equip::invalidate`].
    pub async fn points(&self) -> Result<Vec<Entity>> {
        if let Some(list) = self.points.lock().cached() {
            return Ok(list);
        }
        self.load_points().await
    }

    /// Discard and rebuild the point cache unconditionally.
    pub async fn refresh(&self) -> Result<()> {
        self.points.lock().invalidate();
        self.load_points().await?;
        Ok(())
    }

    /// Mark the cache stale without fetching; the next access rebuilds.
    pub fn invalidate(&self) {
        self.points.lock().invalidate();
    }

    /// Resolve the site this equipment belongs to via its `siteRef`.
    pub async fn get_site(&self) -> Result<Entity> {
        self.entity.get_site().await
    }

    async fn load_points(&self) -> Result<Vec<Entity>> {
        debug!(equip = %self.entity.id(), "loading point list");
        let list = self.find_entities(Some("point"), None).await?;
        self.points.lock().store(list.clone());
        Ok(list)
    }
}

impl std::fmt::Debug for Equip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Equip")
            .field("entity", &self.entity)
            .field("points", &*self.points.lock())
            .finish()
    }
}
