//! Site capability: a site entity as a container of its equipment.
//!
//! A [`Site`] wraps an entity carrying the `site` marker and adds scoped
//! queries plus a lazily-built equipment cache. The cache is fetch-once:
//! it reflects the query result at build time and is only ever rebuilt
//! whole, by [`Site::refresh`].

use parking_lot::Mutex;
use tracing::{debug, trace};

use haystack_types::{Ref, TagValue, dump_scalar};

use crate::entity::Entity;
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Child cache
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a cached child-entity list.
///
/// `Invalidated` keeps the distinction from `Unloaded` visible in debug
/// output; both states cause a reload on next access.
#[derive(Debug)]
pub(crate) enum ChildCache {
    Unloaded,
    Loaded(Vec<Entity>),
    Invalidated,
}

impl ChildCache {
    pub(crate) fn cached(&self) -> Option<Vec<Entity>> {
        match self {
            ChildCache::Loaded(list) => Some(list.clone()),
            ChildCache::Unloaded | ChildCache::Invalidated => None,
        }
    }

    pub(crate) fn store(&mut self, list: Vec<Entity>) {
        *self = ChildCache::Loaded(list);
    }

    pub(crate) fn invalidate(&mut self) {
        *self = ChildCache::Invalidated;
    }
}

/// Filter scoping a query to entities referencing `target` via `ref_tag`,
/// conjoined with the caller's filter when one is supplied.
pub(crate) fn scoped_filter(ref_tag: &str, target: &Ref, filter: Option<&str>) -> String {
    // A materialized ref may carry a display string; only the bare id
    // belongs inside a filter expression.
    let id = dump_scalar(&TagValue::Ref(Ref::new(&target.id)));
    match filter {
        None => format!("{ref_tag}=={id}"),
        Some(f) => format!("({ref_tag}=={id}) and ({f})"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution results
// ─────────────────────────────────────────────────────────────────────────────

/// Result of resolving a key locally against a site.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The key named a tag directly on the site.
    Tag(TagValue),
    /// The key matched a child equipment (by id or display name).
    Equipment(Entity),
    /// Nothing local matched.
    NotFound,
}

/// Result of a full lookup, including the remote fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Tag(TagValue),
    Equipment(Entity),
    /// Nothing local matched; the key was sent to the session as a
    /// scoped filter expression and these are the rows it returned.
    Matches(Vec<Entity>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Site
// ─────────────────────────────────────────────────────────────────────────────

/// An entity carrying the `site` marker, browsable as a container of the
/// equipment that references it.
pub struct Site {
    entity: Entity,
    equipments: Mutex<ChildCache>,
}

impl Site {
    pub(crate) fn new(entity: Entity) -> Self {
        Self {
            entity,
            equipments: Mutex::new(ChildCache::Unloaded),
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

    /// Find entities linked to this site.
    ///
    /// Convenience around the session finder: the filter is scoped to
    /// `siteRef==<this site>` and conjoined with `filter` when one is
    /// given. The caller's filter is not validated locally; a malformed
    /// expression fails however the session fails.
    pub async fn find_entities(
        &self,
        filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Entity>> {
        let scoped = scoped_filter("siteRef", self.entity.id(), filter);
        self.entity.session().find_entities(&scoped, limit).await
    }

    /// Single-result form of [`Site::find_entities`].
    pub async fn find_entity(&self, filter: Option<&str>) -> Result<Entity> {
        let scoped = scoped_filter("siteRef", self.entity.id(), filter);
        self.entity.session().find_entity(&scoped).await
    }

    /// The site's equipment, in query-result order.
    ///
    /// First access queries the session for entities tagged `equip` and
    /// scoped to this site, then memoizes the list; later accesses return
    /// it without a query. Only [`Site::refresh`] (or
    /// [`Site::invalidate`]) picks up added or removed equipment.
    pub async fn equipments(&self) -> Result<Vec<Entity>> {
        if let Some(list) = self.equipments.lock().cached() {
            return Ok(list);
        }
        self.load_equipments().await
    }

    /// Discard and rebuild the equipment cache unconditionally.
    pub async fn refresh(&self) -> Result<()> {
        self.equipments.lock().invalidate();
        self.load_equipments().await?;
        Ok(())
    }

    /// Mark the cache stale without fetching; the next access rebuilds.
    pub fn invalidate(&self) {
        self.equipments.lock().invalidate();
    }

    /// Resolve a key against this site, first match wins:
    ///
    /// 1. a tag named `key` directly on the site,
    /// 2. a child equipment whose id equals `key` (`@` sigil ignored),
    /// 3. a child equipment whose `dis` or `navName` equals `key`.
    ///
    /// Strategies 2 and 3 populate the equipment cache on first use.
    /// Display names are not required to be unique; on a collision the
    /// first equipment in cache order wins silently.
    pub async fn resolve(&self, key: &str) -> Result<Resolved> {
        if let Some(value) = self.entity.tag(key) {
            trace!(site = %self.entity.id(), key, "resolved as tag");
            return Ok(Resolved::Tag(value.clone()));
        }

        let equips = self.equipments().await?;
        for equip in &equips {
            if equip.id().matches(key) {
                trace!(site = %self.entity.id(), key, "resolved as equipment id");
                return Ok(Resolved::Equipment(equip.clone()));
            }
        }
        for equip in &equips {
            let named = ["dis", "navName"]
                .into_iter()
                .any(|t| equip.tag(t).and_then(|v| v.as_str()) == Some(key));
            if named {
                trace!(site = %self.entity.id(), key, "resolved as equipment name");
                return Ok(Resolved::Equipment(equip.clone()));
            }
        }

        Ok(Resolved::NotFound)
    }

    /// [`Site::resolve`], falling back to a remote query.
    ///
    /// When nothing local matches, `key` is sent to the session as a
    /// scoped filter expression (a last-resort remote lookup, not a
    /// local one). A key that is not a well-formed filter fails however
    /// the underlying query fails.
    pub async fn lookup(&self, key: &str) -> Result<Lookup> {
        match self.resolve(key).await? {
            Resolved::Tag(value) => Ok(Lookup::Tag(value)),
            Resolved::Equipment(equip) => Ok(Lookup::Equipment(equip)),
            Resolved::NotFound => {
                debug!(site = %self.entity.id(), key, "no local match, querying session");
                let rows = self.find_entities(Some(key), None).await?;
                Ok(Lookup::Matches(rows))
            }
        }
    }

    /// Fetch the equipment list and store it.
    ///
    /// Queries through the same scoped path as `lookup("equip")` would
    /// (the emitted filter is identical), but calls the finder directly
    /// so the cache mutex is never re-entered. The mutex is not held
    /// across the await.
    async fn load_equipments(&self) -> Result<Vec<Entity>> {
        debug!(site = %self.entity.id(), "loading equipment list");
        let list = self.find_entities(Some("equip"), None).await?;
        self.equipments.lock().store(list.clone());
        Ok(list)
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("entity", &self.entity)
            .field("equipments", &*self.equipments.lock())
            .finish()
    }
}
