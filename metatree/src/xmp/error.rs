use std::sync::Arc;

use metatree_types::{TagKeyError, TagValue};

pub type XmpValueResult = Result<TagValue, XmpParsingError>;

/// This is an error that happened while we were parsing (or writing) XMP.
#[derive(Clone, Debug)]
pub enum XmpError {
    /// The input was empty, or only whitespace and packet framing.
    ///
    /// That's corrupt input, not "no XMP", so we refuse to hand back an
    /// empty tree for it.
    Empty,

    /// The input bytes weren't UTF-8.
    NotUtf8,

    /// `xmltree` failed to parse the XML.
    XmlParseError(
        // note: `Arc` allows us to impl `Clone`
        Arc<xmltree::ParseError>,
    ),

    /// Initial XML scanning failed - no `rdf:Rdf` element was found.
    NoRdfElement,

    /// We couldn't find any `rdf:Description` elements in the `rdf:Rdf`
    /// element.
    NoDescriptionElements,

    /// While serializing, we found a prefix with no known namespace URI.
    UnknownNamespacePrefix(String),

    /// While serializing, we found a key that isn't a `prefix:name` pair.
    InvalidKey(TagKeyError),

    /// The XML writer failed.
    Serialization(String),
}

impl core::fmt::Display for XmpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            XmpError::Empty => f.write_str("The XMP packet was empty."),

            XmpError::NotUtf8 => f.write_str("The XMP packet isn't valid UTF-8."),

            XmpError::XmlParseError(e) => {
                write!(f, "Encountered error while parsing XML. err: {}", e)
            }

            XmpError::NoRdfElement => {
                f.write_str("The XML is missing the `rdf:Rdf` element, which is required.")
            }

            XmpError::NoDescriptionElements => f.write_str(
                "The `rdf:Rdf` element has no `rdf:Description` elements. \
                    One or more are required.",
            ),

            XmpError::UnknownNamespacePrefix(prefix) => write!(
                f,
                "Can't declare namespace prefix `{prefix}`: its URI is unknown. \
                    Record it on the tree with `set_namespace`."
            ),

            XmpError::InvalidKey(e) => write!(f, "Can't write tag. err: {e}"),

            XmpError::Serialization(e) => write!(f, "Failed to write XML. err: {e}"),
        }
    }
}

impl core::error::Error for XmpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmpError::XmlParseError(e) => Some(e.as_ref()),
            XmpError::InvalidKey(e) => Some(e),
            XmpError::Empty
            | XmpError::NotUtf8
            | XmpError::NoRdfElement
            | XmpError::NoDescriptionElements
            | XmpError::UnknownNamespacePrefix(_)
            | XmpError::Serialization(_) => None,
        }
    }
}

impl From<xmltree::ParseError> for XmpError {
    fn from(value: xmltree::ParseError) -> Self {
        XmpError::XmlParseError(value.into())
    }
}

impl From<TagKeyError> for XmpError {
    fn from(value: TagKeyError) -> Self {
        XmpError::InvalidKey(value)
    }
}

/// This error occurred in internal parsing.
///
/// We use it for better diagnostics. Note that these are usually converted
/// into `None` with `.inspect_err(log::error!(/* ... */)).ok()`, which
/// provides logs, but doesn't give the user direct error values to sift
/// through.
#[derive(Clone, Debug)]
pub enum XmpParsingError {
    /// An element had no namespace, so it can't become a `prefix:name` key.
    ElementNoNamespace { element_name: String },

    /// Same as above, except the element lacks a prefix.
    ElementNoPrefix { element_name: String },

    /// An attribute had no namespace, so it can't become a `prefix:name` key.
    AttributeNoNamespace { attribute_name: String },

    /// An attribute had a namespace, but no prefix.
    AttributeNoPrefix { attribute_name: String },

    /// The prefix and name didn't form a valid key.
    InvalidKey(TagKeyError),
}

impl core::fmt::Display for XmpParsingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            XmpParsingError::ElementNoNamespace { element_name } => write!(
                f,
                "The XML element `{element_name}` has no namespace. \
                    Couldn't create a tag key.",
            ),
            XmpParsingError::ElementNoPrefix { element_name } => write!(
                f,
                "The XML element `{element_name}` has a namespace, but no prefix. \
                    Couldn't create a tag key.",
            ),
            XmpParsingError::AttributeNoNamespace { attribute_name } => write!(
                f,
                "Attribute `{attribute_name}` has no namespace. \
                    Couldn't create a tag key.",
            ),
            XmpParsingError::AttributeNoPrefix { attribute_name } => write!(
                f,
                "Attribute `{attribute_name}` has a namespace, but no prefix. \
                    This is an unexpected situation. Please report it!",
            ),
            XmpParsingError::InvalidKey(e) => write!(f, "Tag key was invalid. err: {e}"),
        }
    }
}

impl core::error::Error for XmpParsingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmpParsingError::InvalidKey(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TagKeyError> for XmpParsingError {
    fn from(value: TagKeyError) -> Self {
        XmpParsingError::InvalidKey(value)
    }
}
