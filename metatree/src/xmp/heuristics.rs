//! This module assists in guessing the shape of an XML element.
//!
//! XMP doesn't come with a schema we can rely on, so we look at each
//! element's attributes and children to decide what kind of value it holds.

use metatree_types::consts::{RDF_NAMESPACE, XML_NAMESPACE};
use xmltree::{AttributeName, Element};

pub trait XmpElementHeuristicsExt {
    /// Checks if this is `rdf:{name}`.
    fn is_rdf(&self, name: &str) -> bool;

    fn is_rdf_description(&self) -> bool;

    /// Whether we carry `rdf:parseType="Resource"`.
    fn is_resource(&self) -> bool;

    /// Finds the first `rdf:Bag`, `rdf:Seq`, or `rdf:Alt` child.
    fn collection(&self) -> Option<(&Element, CollectionKind)>;

    /// Finds an inner `rdf:Description` child.
    fn description_child(&self) -> Option<&Element>;

    /// Element children, skipping text, comments, and the like.
    fn child_elements(&self) -> impl Iterator<Item = &Element>;

    /// Grabs the value of the `rdf:{name}` attribute.
    fn rdf_attribute(&self, name: &str) -> Option<&str>;

    /// Whether any attribute could be a struct field.
    fn has_field_attributes(&self) -> bool;

    /// Whether we hold any non-whitespace text.
    fn has_text(&self) -> bool;
}

impl XmpElementHeuristicsExt for Element {
    fn is_rdf(&self, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(RDF_NAMESPACE)
    }

    fn is_rdf_description(&self) -> bool {
        self.is_rdf("Description")
    }

    fn is_resource(&self) -> bool {
        self.rdf_attribute("parseType") == Some("Resource")
    }

    fn collection(&self) -> Option<(&Element, CollectionKind)> {
        self.child_elements()
            .filter(|c| c.namespace.as_deref() == Some(RDF_NAMESPACE))
            .find_map(|c| match c.name.as_str() {
                "Alt" => Some((c, CollectionKind::Alternatives)),
                "Bag" => Some((c, CollectionKind::Unordered)),
                "Seq" => Some((c, CollectionKind::Ordered)),
                _ => None,
            })
    }

    fn description_child(&self) -> Option<&Element> {
        self.child_elements().find(|c| c.is_rdf_description())
    }

    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().flat_map(|c| c.as_element())
    }

    fn rdf_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.local_name == name && is_rdf_attribute(key))
            .map(|(_, value)| value.as_str())
    }

    fn has_field_attributes(&self) -> bool {
        self.attributes.iter().any(|(key, _)| is_field_attribute(key))
    }

    fn has_text(&self) -> bool {
        self.get_text().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Checks if an attribute lives in the RDF namespace.
pub fn is_rdf_attribute(key: &AttributeName) -> bool {
    key.namespace_ref().is_some_and(|ns| ns == RDF_NAMESPACE)
}

/// Checks if an attribute is an `xml:` qualifier, like `xml:lang`.
pub fn is_xml_attribute(key: &AttributeName) -> bool {
    key.prefix.as_deref() == Some("xml") || key.namespace_ref() == Some(XML_NAMESPACE)
}

/// Attributes that hold data, rather than RDF syntax or XML qualifiers.
pub fn is_field_attribute(key: &AttributeName) -> bool {
    !is_rdf_attribute(key) && !is_xml_attribute(key)
}

/// The kind of collection we've detected.
///
/// All three become lists. We only tell them apart for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Alternatives,
    Unordered,
    Ordered,
}

#[cfg(test)]
mod tests {
    use xmltree::Element;

    use super::{CollectionKind, XmpElementHeuristicsExt as _};

    fn element(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).expect("test xml is well-formed")
    }

    #[test]
    fn finds_collections_and_resources() {
        let bag = element(
            r#"<dc:subject xmlns:dc="http://purl.org/dc/elements/1.1/"
                xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Bag><rdf:li>a</rdf:li></rdf:Bag>
            </dc:subject>"#,
        );
        assert_eq!(
            bag.collection().map(|(_, kind)| kind),
            Some(CollectionKind::Unordered)
        );
        assert!(!bag.is_resource());

        let resource = element(
            r#"<ns:s xmlns:ns="ns:x/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                rdf:parseType="Resource"><ns:f>v</ns:f></ns:s>"#,
        );
        assert!(resource.is_resource());
        assert!(resource.collection().is_none());
    }

    #[test]
    fn language_qualifiers_arent_fields() {
        let li = element(
            r#"<rdf:li xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                xml:lang="x-default">hello</rdf:li>"#,
        );
        assert!(!li.has_field_attributes());
        assert!(li.has_text());

        let shorthand = element(r#"<ns:s xmlns:ns="ns:x/" ns:a="1" ns:b="2"/>"#);
        assert!(shorthand.has_field_attributes());
        assert!(!shorthand.has_text());
    }
}
