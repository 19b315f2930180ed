//! Writes tag trees back out as XMP.
//!
//! Output always has the same shape: an `x:xmpmeta` root holding `rdf:RDF`,
//! which holds a single `rdf:Description`. Every tag in the tree becomes a
//! child of that description, in tree order.
//!
//! - `Text` becomes element text (CDATA when it is only whitespace),
//! - `Bytes` becomes base64 text,
//! - `List` becomes an `rdf:Seq` of `rdf:li` items,
//! - and `Mapping` becomes an `rdf:parseType="Resource"` struct.

use std::collections::{BTreeMap, BTreeSet};

use metatree_types::{
    MetadataTagTree, TagValue,
    consts::{RDF_NAMESPACE, X_NAMESPACE, well_known_namespace},
    tree::split_key,
};
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesCData, BytesEnd, BytesStart, BytesText, Event},
};

use crate::xmp::error::XmpError;

/// Prefixes that are declared on the wrapper elements, or never declared.
const IMPLICIT_PREFIXES: [&str; 3] = ["rdf", "x", "xml"];

/// Serializes a tree to an XMP body, without packet framing.
///
/// The output is always UTF-8.
///
/// # Errors
///
/// Fails if a key (at any depth) isn't a valid `prefix:name` pair, or if a
/// prefix's namespace URI isn't recorded on the tree and isn't well-known.
pub fn serialize(tree: &MetadataTagTree) -> Result<Vec<u8>, XmpError> {
    let namespaces = declarations(tree)?;
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut xmpmeta = BytesStart::new("x:xmpmeta");
    xmpmeta.push_attribute(("xmlns:x", X_NAMESPACE));
    write(&mut writer, Event::Start(xmpmeta))?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NAMESPACE));
    write(&mut writer, Event::Start(rdf))?;

    let mut description = BytesStart::new("rdf:Description");
    description.push_attribute(("rdf:about", ""));
    for (prefix, uri) in &namespaces {
        let attr = format!("xmlns:{prefix}");
        description.push_attribute((attr.as_str(), *uri));
    }

    if tree.is_empty() {
        write(&mut writer, Event::Empty(description))?;
    } else {
        write(&mut writer, Event::Start(description))?;
        for (key, value) in tree.iter() {
            write_property(&mut writer, key, value)?;
        }
        write(&mut writer, Event::End(BytesEnd::new("rdf:Description")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("rdf:RDF")))?;
    write(&mut writer, Event::End(BytesEnd::new("x:xmpmeta")))?;

    Ok(writer.into_inner())
}

/// Finds the namespace declaration for every prefix used in the tree.
fn declarations(tree: &MetadataTagTree) -> Result<BTreeMap<&str, &str>, XmpError> {
    let mut prefixes = BTreeSet::new();
    for (key, value) in tree.iter() {
        collect_prefixes(key, value, &mut prefixes)?;
    }

    prefixes
        .into_iter()
        .filter(|prefix| !IMPLICIT_PREFIXES.contains(prefix))
        .map(|prefix| -> Result<(&str, &str), XmpError> {
            let uri = tree
                .namespace_uri(prefix)
                .or_else(|| well_known_namespace(prefix))
                .ok_or_else(|| {
                    log::error!("No namespace URI known for prefix `{prefix}`.");
                    XmpError::UnknownNamespacePrefix(prefix.into())
                })?;
            Ok((prefix, uri))
        })
        .collect()
}

fn collect_prefixes<'t>(
    key: &'t str,
    value: &'t TagValue,
    prefixes: &mut BTreeSet<&'t str>,
) -> Result<(), XmpError> {
    let (prefix, _) = split_key(key)?;
    prefixes.insert(prefix);

    match value {
        TagValue::Text(_) | TagValue::Bytes(_) => Ok(()),
        // list items are `rdf:li`, so only their contents have keys
        TagValue::List(items) => items
            .iter()
            .try_for_each(|item| collect_prefixes("rdf:li", item, prefixes)),
        TagValue::Mapping(fields) => fields
            .iter()
            .try_for_each(|(k, v)| collect_prefixes(k, v, prefixes)),
    }
}

/// Writes one element named `name`, holding `value`.
fn write_property(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &TagValue,
) -> Result<(), XmpError> {
    match value {
        TagValue::Text(text) => write_text(writer, name, text),

        TagValue::Bytes(bytes) => write_text(
            writer,
            name,
            &base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes),
        ),

        TagValue::List(items) => {
            write(writer, Event::Start(BytesStart::new(name)))?;
            if items.is_empty() {
                write(writer, Event::Empty(BytesStart::new("rdf:Seq")))?;
            } else {
                write(writer, Event::Start(BytesStart::new("rdf:Seq")))?;
                for item in items {
                    write_property(writer, "rdf:li", item)?;
                }
                write(writer, Event::End(BytesEnd::new("rdf:Seq")))?;
            }
            write(writer, Event::End(BytesEnd::new(name)))
        }

        TagValue::Mapping(fields) => {
            let mut start = BytesStart::new(name);
            start.push_attribute(("rdf:parseType", "Resource"));

            if fields.is_empty() {
                return write(writer, Event::Empty(start));
            }

            write(writer, Event::Start(start))?;
            for (key, field) in fields {
                write_property(writer, key, field)?;
            }
            write(writer, Event::End(BytesEnd::new(name)))
        }
    }
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), XmpError> {
    if text.is_empty() {
        return write(writer, Event::Empty(BytesStart::new(name)));
    }

    write(writer, Event::Start(BytesStart::new(name)))?;
    if text.trim().is_empty() {
        // readers drop whitespace-only character data, but keep CDATA
        write(writer, Event::CData(BytesCData::new(text)))?;
    } else {
        // apostrophes must come out as `&apos;`, or quote normalization would
        // change them on the way back in
        write(writer, Event::Text(BytesText::from_escaped(escape(text))))?;
    }
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmpError> {
    writer.write_event(event).map_err(|e| {
        log::error!("Failed to write XML event. err: {e}");
        XmpError::Serialization(e.to_string())
    })
}
