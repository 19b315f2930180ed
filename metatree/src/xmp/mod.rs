//! Implements an XMP codec.
//!
//! This module parses XMP (Extensible Metadata Platform) packets into
//! [`MetadataTagTree`]s, and writes them back out. XMP is, as the name
//! implies, extensible, so we don't use a schema. Instead, we look at the
//! shape of each element to decide whether it holds text, a list, or a
//! struct.
//!
//! Before parsing, input is cleaned up in two steps, both on by default:
//!
//! 1. single quotes are normalized to double quotes, and
//! 2. `<?xpacket ...?>` framing is stripped.
//!
//! Writing goes the other way: [`serialize`] makes a bare body, and
//! [`add_framing`] (or [`dumps`]) wraps it for embedding.

use metatree_types::{
    MetadataTagTree,
    consts::{RDF_NAMESPACE, X_NAMESPACE},
};
use xmltree::Element;

use crate::xmp::{
    error::XmpError,
    heuristics::{XmpElementHeuristicsExt as _, is_field_attribute},
    value::{Bindings, XmpElementExt as _, attribute_key},
};

pub mod error;
mod heuristics;
mod packet;
mod serialize;
mod value;

pub use packet::{add_framing, is_xmp_packet, normalize_quotes, strip_framing};
pub use serialize::serialize;

/// Controls the cleanup done before parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XmpParseOptions {
    /// Swap unescaped `'` for `"`. See [`normalize_quotes`].
    pub normalize_quotes: bool,

    /// Remove `<?xpacket ...?>` framing. See [`strip_framing`].
    pub strip_framing: bool,
}

impl Default for XmpParseOptions {
    fn default() -> Self {
        Self {
            normalize_quotes: true,
            strip_framing: true,
        }
    }
}

/// Parses an XMP packet with the default options.
///
/// # Errors
///
/// Malformed input is always an error. We never hand back an empty tree for
/// something we couldn't read.
pub fn parse(input: impl AsRef<[u8]>) -> Result<MetadataTagTree, XmpError> {
    parse_with_options(input, XmpParseOptions::default())
}

/// Parses an XMP packet.
pub fn parse_with_options(
    input: impl AsRef<[u8]>,
    options: XmpParseOptions,
) -> Result<MetadataTagTree, XmpError> {
    Xmp::with_options(input, options)?.parse()
}

/// Serializes a tree, then adds packet framing if `with_header` is set.
///
/// This is what a sidecar `.xmp` file holds.
pub fn dumps(tree: &MetadataTagTree, with_header: bool) -> Result<String, XmpError> {
    let body = String::from_utf8(serialize(tree)?).map_err(|e| {
        log::error!("XML writer produced invalid UTF-8. err: {e}");
        XmpError::Serialization(e.to_string())
    })?;

    Ok(add_framing(&body, with_header))
}

/// An XMP parser.
pub struct Xmp {
    document: Element,
}

impl Xmp {
    /// Reads the given raw XMP into an XML document, with the default
    /// options.
    pub fn new(raw: impl AsRef<[u8]>) -> Result<Self, XmpError> {
        Self::with_options(raw, XmpParseOptions::default())
    }

    /// Reads the given raw XMP into an XML document.
    pub fn with_options(raw: impl AsRef<[u8]>, options: XmpParseOptions) -> Result<Self, XmpError> {
        let raw = core::str::from_utf8(raw.as_ref()).map_err(|e| {
            log::error!("XMP packet isn't UTF-8. err: {e}");
            XmpError::NotUtf8
        })?;

        // a lone byte order mark sometimes sits in front of the packet
        let raw = raw.trim_start_matches('\u{FEFF}');

        let body = match options.strip_framing {
            true => strip_framing(raw),
            false => raw.trim(),
        };

        if body.is_empty() {
            log::error!("XMP packet had no body.");
            return Err(XmpError::Empty);
        }

        // grab the document from XML
        let document = match options.normalize_quotes {
            true => Element::parse(normalize_quotes(body).as_bytes())?,
            false => Element::parse(body.as_bytes())?,
        };

        // save it in the struct for use in the parsing stage
        Ok(Self { document })
    }

    /// Returns the underlying XML document.
    pub fn document(&self) -> &Element {
        &self.document
    }

    /// Parses the XMP document into a tag tree.
    pub fn parse(&self) -> Result<MetadataTagTree, XmpError> {
        parse_xmp(self.document())
    }
}

/// Parses the XMP document.
fn parse_xmp(document: &Element) -> Result<MetadataTagTree, XmpError> {
    // let's start by trying to grab the elements before the descriptions.
    //
    // the first one is optional: `x:xmpmeta`
    let parent = match document.name == "xmpmeta" {
        true => Some(document),
        false => document.get_child("xmpmeta"),
    }
    .and_then(|c| {
        // ensure that only `x:xmpmeta` makes it
        match c.namespace.clone()?.as_str() {
            X_NAMESPACE => Some(c),
            other => {
                log::warn!(
                    "Found `xmpmeta` element, but with wrong namespace!
                        - expected: `{X_NAMESPACE}`
                        - got: `{other}`"
                );
                None
            }
        }
    })
    .inspect(|_| log::debug!("Found an `x:xmpmeta` element."))
    .unwrap_or(document);

    // now, we need to get the required `rdf:RDF` element.
    //
    // note: sometimes, the document's "root" is the `rdf:RDF` element, so
    // we've gotta check first
    let rdf = if parent.name == "RDF" {
        Some(parent)
    } else {
        parent.get_child("RDF")
    }
    .filter(|rdf| {
        // ensure it has the right namespace
        let ok = rdf.is_rdf("RDF");
        if !ok {
            log::warn!(
                "Found `RDF` element, but with wrong namespace!
                    - expected: `{RDF_NAMESPACE}`
                    - got: `{:?}`",
                rdf.namespace
            );
        }
        ok
    })
    .ok_or_else(|| {
        log::error!("Couldn't find an `rdf:RDF` element in the document.");
        XmpError::NoRdfElement
    })?;

    // the `rdf:RDF` element should contain "one or more" `rdf:Description`
    // elements.
    let descriptions = rdf
        .child_elements()
        .filter(|child| child.is_rdf_description())
        .collect::<Vec<_>>();

    // if we've got no descriptions, we can't continue
    if descriptions.is_empty() {
        log::warn!("No `rdf:Description` elements found in the `rdf:RDF` element.");
        return Err(XmpError::NoDescriptionElements);
    }

    let mut tree = MetadataTagTree::new();
    let mut bindings = Bindings::default();

    for description in descriptions {
        // attributes come first, since they're first in the document.
        //
        // `rdf:about` is an informational marker w/o data, so skip it (and
        // any other rdf syntax)
        let mut attrs = description
            .attributes
            .iter()
            .filter(|(key, _)| is_field_attribute(key))
            .collect::<Vec<_>>();
        attrs.sort_by(|(a, _), (b, _)| {
            (&a.prefix, &a.local_name).cmp(&(&b.prefix, &b.local_name))
        });

        for (key, value) in attrs {
            log::debug!("Parsing attribute `{key}` with value `{value}`.");
            match attribute_key(key, &mut bindings) {
                Ok(k) => insert(&mut tree, k, value.as_str().into()),
                Err(e) => log::warn!("Skipping attribute on `rdf:Description`. err: {e}"),
            }
        }

        // now, parse the sub-elements of the `rdf:Description` element
        for child in description.child_elements() {
            let parsed = child
                .key(&mut bindings)
                .and_then(|k| Ok((k, child.value_generic(&mut bindings)?)));

            match parsed {
                Ok((k, value)) => insert(&mut tree, k, value),
                Err(e) => log::error!("Failed to parse element `{}`! err: {e}", child.name),
            }
        }
    }

    for (prefix, uri) in bindings.into_inner() {
        tree.set_namespace(prefix, uri);
    }

    Ok(tree)
}

fn insert(tree: &mut MetadataTagTree, key: String, value: metatree_types::TagValue) {
    match tree.insert(key, value) {
        Ok(Some(_)) => log::debug!("A tag appeared twice. The last one wins."),
        Ok(None) => (),
        // keys were already checked while building them
        Err(e) => log::warn!("Skipping tag with an invalid key. err: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use metatree_types::{MetadataTagTree, TagValue};

    use crate::xmp::{Xmp, XmpParseOptions, error::XmpError, parse, parse_with_options};

    /// We're fine with a blank description... right?
    #[test]
    fn blank_description_is_ok() {
        crate::util::logger();

        let xmp = Xmp::new(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:ns="ns:myName/" /></rdf:RDF>"#,
        )
        .expect("`xmltree` should parse the XML correctly");

        let parsed = xmp
            .parse()
            .expect("`metatree` should be able to parse blank `rdf:Description`");

        assert_eq!(parsed, MetadataTagTree::new());
    }

    /// `rdf:Description` is recommended to be serialized with an `rdf:about`
    /// attribute.
    ///
    /// Let's make sure we're not parsing that as a potential value...
    #[test]
    fn respects_rdf_about_attribute() {
        crate::util::logger();

        let parsed = parse(
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
        <rdf:Description rdf:about="uuid:1234" xmlns:ns="ns:myName/" ns:Rating="5">
        </rdf:Description>
    </rdf:RDF>"#,
        )
        .expect("`metatree` should parse XMP correctly");

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("ns:Rating"), Some(&TagValue::from("5")));
        assert_eq!(parsed.namespace_uri("ns"), Some("ns:myName/"));
    }

    #[test]
    fn missing_rdf_is_an_error() {
        crate::util::logger();

        assert!(matches!(
            parse(r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"></x:xmpmeta>"#),
            Err(XmpError::NoRdfElement)
        ));
        assert!(matches!(
            parse(r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/>"#),
            Err(XmpError::NoDescriptionElements)
        ));
    }

    #[test]
    fn empty_input_is_an_error() {
        crate::util::logger();

        assert!(matches!(parse(""), Err(XmpError::Empty)));
        assert!(matches!(parse("   \n"), Err(XmpError::Empty)));
        assert!(matches!(parse([0xff, 0xfe, 0x00]), Err(XmpError::NotUtf8)));
        assert!(matches!(parse("<not xml"), Err(XmpError::XmlParseError(_))));
    }

    #[test]
    fn single_quoted_attributes_parse() {
        crate::util::logger();

        let xmp = "<x:xmpmeta xmlns:x='adobe:ns:meta/'>\
            <rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>\
            <rdf:Description rdf:about='' xmlns:dc='http://purl.org/dc/elements/1.1/' \
            dc:format='image/png'/></rdf:RDF></x:xmpmeta>";

        let tree = parse(xmp).expect("single quotes are fine");
        assert_eq!(tree.get("dc:format"), Some(&TagValue::from("image/png")));

        // ...and still fine without normalization, since XML allows them
        let raw = parse_with_options(
            xmp,
            XmpParseOptions {
                normalize_quotes: false,
                strip_framing: true,
            },
        )
        .expect("xml allows single-quoted attributes");
        assert_eq!(raw, tree);
    }

    #[test]
    fn framing_is_optional() {
        crate::util::logger();

        let body = "<rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>\
            <rdf:Description rdf:about='' xmlns:xmp='http://ns.adobe.com/xap/1.0/' \
            xmp:Rating='3'/></rdf:RDF>";
        let framed = format!(
            "<?xpacket begin='\u{FEFF}' id='W5M0MpCehiHzreSzNTczkc9d'?>\n{body}\n<?xpacket end='w'?>"
        );

        let from_body = parse(body).expect("bare body parses");
        let from_packet = parse(&framed).expect("framed packet parses");
        assert_eq!(from_body, from_packet);
        assert_eq!(from_body.get("xmp:Rating"), Some(&TagValue::from("3")));
    }
}
