//! Tag scalar values and entity references.
//!
//! A tag maps a name to one of the scalar kinds below. Marker tags carry
//! no payload; their presence on an entity is the signal (`site`, `equip`,
//! `point`). Reference tags (`siteRef`, `equipRef`) point at another
//! entity by id.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Entity references
// ─────────────────────────────────────────────────────────────────────────────

/// An entity identifier.
///
/// The id is stored without the `@` sigil; `Display` renders the sigil
/// back (`@ahu-1`). An optional display string may ride along, as in the
/// zinc form `@ahu-1 "AHU 1"`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dis: Option<String>,
}

impl Ref {
    /// Create a reference, stripping a leading `@` if present.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            id: id.strip_prefix('@').unwrap_or(&id).to_string(),
            dis: None,
        }
    }

    /// Attach a display string.
    pub fn with_dis(mut self, dis: impl Into<String>) -> Self {
        self.dis = Some(dis.into());
        self
    }

    /// Id comparison that ignores the `@` sigil on the other side.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key.strip_prefix('@').unwrap_or(key)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.id)
    }
}

/// Error for a reference that cannot be parsed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid ref: {0:?}")]
pub struct InvalidRef(pub String);

impl FromStr for Ref {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.strip_prefix('@').unwrap_or(s);
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '~'))
        {
            return Err(InvalidRef(s.to_string()));
        }
        Ok(Ref {
            id: id.to_string(),
            dis: None,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag values
// ─────────────────────────────────────────────────────────────────────────────

/// The scalar kinds a tag value can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum TagValue {
    /// Presence-only tag (`site`, `equip`, `point`).
    Marker,
    Bool(bool),
    /// Number with an optional unit symbol (`72.5`, unit `°F`).
    Number { value: f64, unit: Option<String> },
    Str(String),
    Ref(Ref),
    Uri(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    /// Geographic coordinate in decimal degrees.
    Coord { lat: f64, lng: f64 },
}

impl TagValue {
    /// Number without a unit.
    pub fn number(value: f64) -> Self {
        TagValue::Number { value, unit: None }
    }

    /// Number with a unit symbol.
    pub fn number_with_unit(value: f64, unit: impl Into<String>) -> Self {
        TagValue::Number {
            value,
            unit: Some(unit.into()),
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        TagValue::Str(s.into())
    }

    /// Reference to another entity by id.
    pub fn make_ref(id: impl Into<String>) -> Self {
        TagValue::Ref(Ref::new(id))
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, TagValue::Marker)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            TagValue::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::scalar::dump_scalar(self))
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Bool(b)
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::number(v)
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Str(s.to_string())
    }
}

impl From<Ref> for TagValue {
    fn from(r: Ref) -> Self {
        TagValue::Ref(r)
    }
}
