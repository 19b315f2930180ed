//! # `metatree_types`
//!
//! Plain data types shared by `metatree`.
//!
//! These carry no parsing logic of their own. The parsers live in `metatree`,
//! and they produce (or consume) the types defined here.

#![forbid(unsafe_code)]

pub mod consts;
pub mod geo;
pub mod tag;
pub mod tree;

pub use geo::GeoPosition;
pub use tag::TagValue;
pub use tree::{MetadataTagTree, TagKeyError, TagPathError};
