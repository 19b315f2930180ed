use metatree_types::TagValue;
use xmltree::Element;

use crate::xmp::{
    error::XmpValueResult,
    heuristics::{CollectionKind, XmpElementHeuristicsExt as _},
    value::{Bindings, XmpElementExt as _},
};

/// Parses an element's value as a list.
///
/// All three RDF collections end up here. An unordered array looks like
/// this:
///
/// ```xml
/// <ns:element>
///      <rdf:Bag>
///          <rdf:li>oswald</rdf:li>
///          <rdf:li>miranda</rdf:li>
///          <rdf:li>natalie</rdf:li>
///      </rdf:Bag>
/// </ns:element>
/// ```
///
/// `rdf:Seq` looks the same, but keeps its order. `rdf:Alt` gives each
/// `rdf:li` an `xml:lang` qualifier, which we drop, keeping every
/// alternative in document order.
///
/// Each `rdf:li` is parsed with the same rules as any other element, so
/// lists may hold structs or other lists.
pub fn value_array(
    element: &Element,
    collection: &Element,
    kind: CollectionKind,
    bindings: &mut Bindings,
) -> XmpValueResult {
    log::trace!(
        "Parsing `{}` as a list. (collection: `{kind:?}`)",
        element.name
    );

    let mut items = Vec::new();
    for child in collection.child_elements() {
        if !child.is_rdf("li") {
            log::warn!(
                "Sub-element of a collection was expected to be `rdf:li`. \
                Skipping it. element name: `{}`",
                child.name
            );
            continue;
        }

        items.push(child.value_generic(bindings)?);
    }

    Ok(TagValue::List(items))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use metatree_types::TagValue;
    use xmltree::Element;

    use crate::xmp::value::{Bindings, XmpElementExt as _};

    fn parse(xml: &str) -> TagValue {
        crate::util::logger();

        Element::parse(xml.as_bytes())
            .expect("test xml is well-formed")
            .value_generic(&mut Bindings::default())
            .expect("element parses")
    }

    #[test]
    fn bag_keeps_document_order() {
        assert_eq!(
            parse(
                r#"<dc:subject xmlns:dc="http://purl.org/dc/elements/1.1/"
                    xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                    <rdf:Bag>
                        <rdf:li>fruit</rdf:li>
                        <rdf:li>tree</rdf:li>
                    </rdf:Bag>
                </dc:subject>"#
            ),
            TagValue::List(vec!["fruit".into(), "tree".into()])
        );
    }

    #[test]
    fn alternatives_drop_language_qualifiers() {
        assert_eq!(
            parse(
                r#"<dc:title xmlns:dc="http://purl.org/dc/elements/1.1/"
                    xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                    <rdf:Alt>
                        <rdf:li xml:lang="x-default">XMP - Extensible Metadata Platform</rdf:li>
                        <rdf:li xml:lang="it-it">XMP - Piattaforma Estendibile di Metadata</rdf:li>
                    </rdf:Alt>
                </dc:title>"#
            ),
            TagValue::List(vec![
                "XMP - Extensible Metadata Platform".into(),
                "XMP - Piattaforma Estendibile di Metadata".into(),
            ])
        );
    }

    #[test]
    fn lists_hold_structs_and_lists() {
        assert_eq!(
            parse(
                r#"<xmpMM:History xmlns:xmpMM="http://ns.adobe.com/xap/1.0/mm/"
                    xmlns:stEvt="http://ns.adobe.com/xap/1.0/sType/ResourceEvent#"
                    xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                    <rdf:Seq>
                        <rdf:li stEvt:action="saved" stEvt:when="2024-01-01"/>
                        <rdf:li>
                            <rdf:Bag><rdf:li>nested</rdf:li></rdf:Bag>
                        </rdf:li>
                    </rdf:Seq>
                </xmpMM:History>"#
            ),
            TagValue::List(vec![
                TagValue::Mapping(BTreeMap::from([
                    ("stEvt:action".to_string(), TagValue::from("saved")),
                    ("stEvt:when".to_string(), TagValue::from("2024-01-01")),
                ])),
                TagValue::List(vec!["nested".into()]),
            ])
        );
    }

    #[test]
    fn empty_collection_is_empty_list() {
        assert_eq!(
            parse(
                r#"<dc:subject xmlns:dc="http://purl.org/dc/elements/1.1/"
                    xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Seq/></dc:subject>"#
            ),
            TagValue::List(vec![])
        );
    }
}
