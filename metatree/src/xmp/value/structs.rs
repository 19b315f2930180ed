use std::collections::BTreeMap;

use metatree_types::TagValue;
use xmltree::Element;

use crate::xmp::{
    error::XmpValueResult,
    heuristics::{XmpElementHeuristicsExt as _, is_field_attribute},
    value::{Bindings, XmpElementExt as _, attribute_key},
};

/// Parses an element as a struct, creating a mapping from its fields.
///
/// `container` is the element holding the fields. That's either `element`
/// itself or its inner `rdf:Description`.
///
/// Fields come from both the container's attributes and its child elements.
/// Each child is parsed recursively. Fields we can't make a key for are
/// logged and skipped.
pub fn value_struct(
    element: &Element,
    container: &Element,
    bindings: &mut Bindings,
) -> XmpValueResult {
    let mut fields = BTreeMap::new();

    // attributes, skipping `rdf:parseType` and `xml:lang` and friends
    for (attr, value) in container.attributes.iter() {
        if !is_field_attribute(attr) {
            continue;
        }

        match attribute_key(attr, bindings) {
            Ok(key) => {
                fields.insert(key, TagValue::Text(value.clone()));
            }
            Err(e) => log::warn!(
                "Skipping attribute field on struct `{}`. err: {e}",
                element.name
            ),
        }
    }

    // sub-elements
    for child in container.child_elements() {
        log::trace!(
            "Parsing inner field `{inner_field_name}` on struct `{struct_name}`...",
            inner_field_name = &child.name,
            struct_name = &element.name
        );

        let field = child
            .key(bindings)
            .and_then(|key| Ok((key, child.value_generic(bindings)?)));

        match field {
            Ok((key, value)) => {
                if fields.insert(key, value).is_some() {
                    log::debug!(
                        "Struct `{}` repeats field `{}`. The last one wins.",
                        element.name,
                        child.name
                    );
                }
            }
            Err(e) => log::warn!("Skipping field on struct `{}`. err: {e}", element.name),
        }
    }

    Ok(TagValue::Mapping(fields))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use metatree_types::TagValue;
    use xmltree::Element;

    use crate::xmp::value::{Bindings, XmpElementExt as _};

    /// The parser should be able to handle several different layouts of
    /// structs.
    ///
    /// Adobe's XMP specification lays out an example similar to the one below:
    #[test]
    fn several_struct_types() {
        crate::util::logger();

        let outer = Element::parse(
            r#"<rdf:Description rdf:about="" xmlns:ns="ns:myName/"
                xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">

          <!-- struct 1: regular syntax -->
          <ns:Struct1>
              <rdf:Description>
                  <ns:Field1>value1</ns:Field1>
                  <ns:Field2>value2</ns:Field2>
              </rdf:Description>
          </ns:Struct1>

          <!-- struct 2: condensed (no inner rdf:Description tag) -->
          <ns:Struct2 rdf:parseType="Resource">
              <ns:Field1>value1</ns:Field1>
              <ns:Field2>value2</ns:Field2>
          </ns:Struct2>

          <!--- struct 3: fields as desc attributes (shorthand) -->
          <ns:Struct3>
              <rdf:Description ns:Field1="value1" ns:Field2="value2"/>
          </ns:Struct3>

          <!--- struct 4: fields as self atttributes (shorthand) -->
          <ns:Struct4 ns:Field1="value1" ns:Field2="value2"/>

          <!--- struct 5 -->
          <ns:Struct5>
              <rdf:Description ns:Field1="value1">
                  <ns:Field2>value2</ns:Field2>
              </rdf:Description>
          </ns:Struct5>
      </rdf:Description>"#
                .as_bytes(),
        )
        .expect("test xml is well-formed");

        let expected = TagValue::Mapping(BTreeMap::from([
            ("ns:Field1".to_string(), TagValue::from("value1")),
            ("ns:Field2".to_string(), TagValue::from("value2")),
        ]));

        let mut bindings = Bindings::default();
        let structs = outer
            .children
            .iter()
            .flat_map(|c| c.as_element())
            .map(|e| e.value_generic(&mut bindings).expect("struct parses"))
            .collect::<Vec<_>>();

        assert_eq!(structs.len(), 5);
        for s in structs {
            assert_eq!(s, expected);
        }
    }

    #[test]
    fn empty_description_is_empty_struct() {
        crate::util::logger();

        let element = Element::parse(
            r#"<my_ns:MyStruct xmlns:my_ns="https://github.com/onkoe"
                xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Description />
            </my_ns:MyStruct>"#
                .as_bytes(),
        )
        .expect("test xml is well-formed");

        assert_eq!(
            element.value_generic(&mut Bindings::default()).ok(),
            Some(TagValue::Mapping(BTreeMap::new()))
        );
    }
}
