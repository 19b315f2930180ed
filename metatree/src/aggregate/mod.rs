//! Gathers a media file's metadata into one dictionary.
//!
//! Reading files is someone else's job. Callers implement [`ImageSource`] or
//! [`VideoSource`] on top of their platform's imaging framework, and we take
//! it from there: grouping, XMP parsing, location lookup, and writing
//! changes back.
//!
//! Output is a [`MetadataDictionary`], keyed by group names like `EXIF` and
//! `XMP` (see [`metatree_types::consts`]).

use std::collections::BTreeMap;

use metatree_types::{
    MetadataTagTree, TagValue,
    consts::{EXIF, WEBP},
};

use crate::native::{NativeTag, NativeValue};

mod cache;
pub mod error;
mod image;
mod transaction;
mod video;

pub use error::{AggregateError, SourceError};
pub use image::ImageMetadata;
pub use transaction::Transaction;
pub use video::{VideoMetadata, VideoMetadataItem};

/// Metadata from every group, keyed by group name.
///
/// Each value is a `Mapping`.
pub type MetadataDictionary = BTreeMap<String, TagValue>;

/// An image file, as seen by a platform imaging framework.
///
/// The write methods have defaults that refuse, so read-only sources only
/// need the first two.
pub trait ImageSource {
    /// The image's property dictionary, grouped by namespace.
    ///
    /// Group keys may come in the framework's style, like `{Exif}` or
    /// `{GPS}`. Other top-level properties, like `PixelWidth`, may sit
    /// beside them.
    fn properties(&self) -> Result<Vec<(String, NativeValue)>, SourceError>;

    /// The image's XMP-like tags.
    fn metadata_tags(&self) -> Result<Vec<NativeTag>, SourceError>;

    /// Replaces the image's XMP metadata with `tree`.
    fn write_metadata(&mut self, tree: &MetadataTagTree) -> Result<(), SourceError> {
        _ = tree;
        Err(SourceError::Unsupported("writing XMP metadata".into()))
    }

    /// Sets one property in a group, like `LensMake` in `EXIF`.
    fn write_property(
        &mut self,
        group: &str,
        tag: &str,
        value: &TagValue,
    ) -> Result<(), SourceError> {
        _ = (group, tag, value);
        Err(SourceError::Unsupported("writing properties".into()))
    }
}

/// A video file's metadata items, as seen by a platform media framework.
pub trait VideoSource {
    fn items(&self) -> Result<Vec<VideoMetadataItem>, SourceError>;
}

/// Groups that may be written through [`ImageSource::write_property`].
pub const PROPERTY_GROUPS: [&str; 13] = [
    "EXIF", "IPTC", "TIFF", "GPS", "WEBP", "HEIC", "CIFF", "DNG", "GIF", "JFIF", "PNG", "TGA",
    "8BIM",
];

/// Turns a framework group key into ours.
///
/// Surrounding braces are removed (`{IPTC}` becomes `IPTC`), and the two
/// mixed-case names are uppercased to match the rest.
pub fn normalize_group_key(key: &str) -> String {
    let key = key
        .strip_prefix('{')
        .and_then(|k| k.strip_suffix('}'))
        .unwrap_or(key);

    match key {
        "Exif" => EXIF.into(),
        "WebP" => WEBP.into(),
        other => other.into(),
    }
}
