//! Entities: tag-graph nodes materialized from query results.

use std::collections::BTreeMap;
use std::fmt;

use haystack_types::{Ref, TagValue};

use crate::equip::Equip;
use crate::error::{Error, Result};
use crate::session::SessionHandle;
use crate::site::Site;

/// A node in the tag graph: an id plus a tag mapping.
///
/// Entities are created by their owning session when query results are
/// materialized, and keep a handle back to it so further queries can be
/// issued (resolving `siteRef`, browsing children). The handle is used
/// for nothing else.
#[derive(Clone)]
pub struct Entity {
    id: Ref,
    tags: BTreeMap<String, TagValue>,
    session: SessionHandle,
}

impl Entity {
    pub fn new(id: Ref, tags: BTreeMap<String, TagValue>, session: SessionHandle) -> Self {
        Self { id, tags, session }
    }

    pub fn id(&self) -> &Ref {
        &self.id
    }

    pub fn tags(&self) -> &BTreeMap<String, TagValue> {
        &self.tags
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Value of a tag, if present.
    pub fn tag(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    /// Whether a marker tag is present.
    pub fn has_marker(&self, name: &str) -> bool {
        matches!(self.tags.get(name), Some(TagValue::Marker))
    }

    /// Display name: `dis` tag, else `navName`, else the id.
    pub fn dis(&self) -> String {
        for name in ["dis", "navName"] {
            if let Some(TagValue::Str(s)) = self.tags.get(name) {
                return s.clone();
            }
        }
        self.id.to_string()
    }

    /// Resolve the site this entity belongs to.
    ///
    /// Reads the entity's own `siteRef` tag and asks the owning session
    /// for the referenced entity via a single-result lookup. Fails with
    /// [`Error::MissingTag`] when the tag is absent and with whatever the
    /// session raises when the reference does not resolve.
    pub async fn get_site(&self) -> Result<Entity> {
        let value = self.tag("siteRef").ok_or_else(|| Error::MissingTag {
            entity: self.id.to_string(),
            tag: "siteRef".to_string(),
        })?;
        let site_ref = value.as_ref_value().ok_or_else(|| Error::NotARef {
            entity: self.id.to_string(),
            tag: "siteRef".to_string(),
        })?;
        self.session.get_entity(site_ref).await
    }

    /// Treat this entity as a site. Requires the `site` marker.
    pub fn into_site(self) -> Result<Site> {
        if !self.has_marker("site") {
            return Err(Error::MissingTag {
                entity: self.id.to_string(),
                tag: "site".to_string(),
            });
        }
        Ok(Site::new(self))
    }

    /// Treat this entity as an equipment. Requires the `equip` marker.
    pub fn into_equip(self) -> Result<Equip> {
        if !self.has_marker("equip") {
            return Err(Error::MissingTag {
                entity: self.id.to_string(),
                tag: "equip".to_string(),
            });
        }
        Ok(Equip::new(self))
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Session handle elided; it is not Debug and not data.
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .finish()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tags == other.tags
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.dis(), self.id)
    }
}
