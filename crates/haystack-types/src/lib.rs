//! Haystack tag-value model and zinc scalar serialization.
//!
//! Everything a tag-graph client needs to talk about tag values without
//! pulling in transport or grid handling: the [`TagValue`] scalar kinds,
//! entity references ([`Ref`]), and the canonical zinc text form used
//! inside filter expressions ([`dump_scalar`]).

pub mod scalar;
pub mod value;

pub use scalar::dump_scalar;
pub use value::{InvalidRef, Ref, TagValue};
