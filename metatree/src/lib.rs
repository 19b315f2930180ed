//! # `metatree`
//!
//! A library to parse, edit, and serialize media metadata as tag trees.
//!
//! ## What's here?
//!
//! - [`xmp`]: turns XMP packets into [`MetadataTagTree`]s, and back again.
//! - [`native`]: converts the loosely-typed trees that platform media
//!   frameworks hand out into [`TagValue`]s.
//! - [`iso6709`]: parses location strings like `+48.8577+002.295/`.
//! - [`aggregate`]: gathers an image's (or video's) metadata groups into one
//!   dictionary, and writes edits back through a source you provide.
//!
//! Reading and writing actual files is left to those sources. This crate
//! only sees the values they hand over.
//!
//! ## Example
//!
//! ```
//! use metatree::xmp;
//!
//! let packet = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
//!   <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!     <rdf:Description rdf:about="" xmlns:xmp="http://ns.adobe.com/xap/1.0/"
//!       xmp:Rating="5"/>
//!   </rdf:RDF>
//! </x:xmpmeta>"#;
//!
//! let tree = xmp::parse(packet).unwrap();
//! assert_eq!(tree.get("xmp:Rating").and_then(|v| v.as_text()), Some("5"));
//! ```
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the MIT License at your option.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod iso6709;
pub mod native;
pub mod xmp;

pub use metatree_types::{GeoPosition, MetadataTagTree, TagValue, consts};

/// Internal utility methods.
pub(crate) mod util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }
}
