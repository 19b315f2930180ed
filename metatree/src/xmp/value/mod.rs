use std::collections::BTreeMap;

use metatree_types::TagValue;
use xmltree::{AttributeName, Element};

use crate::xmp::{
    error::{XmpParsingError, XmpValueResult},
    heuristics::XmpElementHeuristicsExt as _,
    value::{arrays::value_array, structs::value_struct},
};

pub mod arrays;
pub mod structs;

/// Namespace prefixes we've seen while walking a document, mapped to their
/// URIs.
#[derive(Clone, Debug, Default)]
pub struct Bindings(BTreeMap<String, String>);

impl Bindings {
    fn record(&mut self, prefix: &str, namespace: &str) {
        if let Some(old) = self.0.get(prefix) {
            if old != namespace {
                log::warn!(
                    "Prefix `{prefix}` is bound to more than one namespace. \
                    Keeping `{old}`, ignoring `{namespace}`."
                );
            }
            return;
        }

        self.0.insert(prefix.into(), namespace.into());
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

pub trait XmpElementExt {
    /// Grabs a value from an element by looking at its shape.
    ///
    /// In order:
    ///
    /// 1. `rdf:parseType="Resource"` makes a mapping of our children,
    /// 2. an `rdf:Bag`, `rdf:Seq`, or `rdf:Alt` child makes a list,
    /// 3. an `rdf:Description` child makes a mapping of its fields,
    /// 4. other child elements make a mapping of those (lenient),
    /// 5. field attributes, with no text, make a mapping of the attributes,
    /// 6. `rdf:resource` makes text from the URI,
    /// 7. and anything else becomes its inner text, or an empty string.
    fn value_generic(&self, bindings: &mut Bindings) -> XmpValueResult;

    /// Creates the `prefix:name` key for this element, recording its
    /// namespace binding.
    fn key(&self, bindings: &mut Bindings) -> Result<String, XmpParsingError>;
}

impl XmpElementExt for Element {
    fn value_generic(&self, bindings: &mut Bindings) -> XmpValueResult {
        log::trace!("Parsing element: `{}`", self.name);

        // 1.
        if self.is_resource() {
            return value_struct(self, self, bindings);
        }

        // 2.
        if let Some((collection, kind)) = self.collection() {
            return value_array(self, collection, kind, bindings);
        }

        // 3.
        if let Some(description) = self.description_child() {
            return value_struct(self, description, bindings);
        }

        // 4.
        if self.child_elements().next().is_some() {
            log::debug!(
                "Element `{}` has child elements, but no `rdf:parseType`. \
                Treating it as a struct anyway.",
                self.name
            );
            return value_struct(self, self, bindings);
        }

        // 5.
        if self.has_field_attributes() && !self.has_text() {
            return value_struct(self, self, bindings);
        }

        // 6.
        if let Some(uri) = self.rdf_attribute("resource") {
            return Ok(TagValue::Text(uri.into()));
        }

        // 7.
        Ok(TagValue::Text(
            self.get_text().map(|t| t.into_owned()).unwrap_or_default(),
        ))
    }

    fn key(&self, bindings: &mut Bindings) -> Result<String, XmpParsingError> {
        // namespace is required
        let Some(ref namespace) = self.namespace else {
            log::warn!("Can't create key - no namespace on element `{}`.", self.name);
            return Err(XmpParsingError::ElementNoNamespace {
                element_name: self.name.clone(),
            });
        };

        // prefix is required
        let Some(ref prefix) = self.prefix else {
            log::warn!("Can't create key - no prefix on element `{}`.", self.name);
            return Err(XmpParsingError::ElementNoPrefix {
                element_name: self.name.clone(),
            });
        };

        let key = format!("{prefix}:{}", self.name);
        metatree_types::tree::split_key(&key)?;
        bindings.record(prefix, namespace);
        Ok(key)
    }
}

/// Creates the `prefix:name` key for an attribute.
pub fn attribute_key(
    attribute: &AttributeName,
    bindings: &mut Bindings,
) -> Result<String, XmpParsingError> {
    let Some(namespace) = attribute.namespace_ref() else {
        return Err(XmpParsingError::AttributeNoNamespace {
            attribute_name: attribute.local_name.clone(),
        });
    };

    let Some(ref prefix) = attribute.prefix else {
        return Err(XmpParsingError::AttributeNoPrefix {
            attribute_name: attribute.local_name.clone(),
        });
    };

    let key = format!("{prefix}:{}", attribute.local_name);
    metatree_types::tree::split_key(&key)?;
    bindings.record(prefix, namespace);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use metatree_types::TagValue;
    use xmltree::Element;

    use super::{Bindings, XmpElementExt as _};

    fn walk(xml: &str) -> (String, TagValue, Bindings) {
        let element = Element::parse(xml.as_bytes()).expect("test xml is well-formed");
        let mut bindings = Bindings::default();
        let key = element.key(&mut bindings).expect("test element has a key");
        let value = element
            .value_generic(&mut bindings)
            .expect("test element has a value");
        (key, value, bindings)
    }

    #[test]
    fn plain_text() {
        let (key, value, bindings) = walk(r#"<dc:format xmlns:dc="dc:ns/">image/jpeg</dc:format>"#);
        assert_eq!(key, "dc:format");
        assert_eq!(value, TagValue::from("image/jpeg"));
        assert_eq!(
            bindings.into_inner().get("dc").map(String::as_str),
            Some("dc:ns/")
        );
    }

    #[test]
    fn empty_element_is_empty_text() {
        let (_, value, _) = walk(r#"<ns:Nothing xmlns:ns="ns:x/"/>"#);
        assert_eq!(value, TagValue::from(""));
    }

    #[test]
    fn resource_uri_becomes_text() {
        let (_, value, _) = walk(
            r#"<ns:Link xmlns:ns="ns:x/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                rdf:resource="https://example.com/"/>"#,
        );
        assert_eq!(value, TagValue::from("https://example.com/"));
    }

    #[test]
    fn unqualified_element_has_no_key() {
        let element = Element::parse(&b"<plain>text</plain>"[..]).expect("well-formed");
        assert!(element.key(&mut Bindings::default()).is_err());
    }
}
