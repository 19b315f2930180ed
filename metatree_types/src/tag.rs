//! The value half of a tag tree.

use std::collections::BTreeMap;

/// One metadata value.
///
/// Leaves are always [`TagValue::Text`] or [`TagValue::Bytes`]. Containers
/// own their children, so a value can't refer back to itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagValue {
    /// Plain text.
    Text(String),

    /// A binary blob, like an embedded thumbnail or a raw tag payload.
    ///
    /// The bytes are kept exactly as they were given to us.
    Bytes(Vec<u8>),

    /// An ordered sequence.
    ///
    /// XMP's `rdf:Seq`, `rdf:Bag`, and `rdf:Alt` all become lists, in the
    /// order their items were found.
    List(Vec<TagValue>),

    /// A nested, structured record.
    ///
    /// In XMP, keys are `prefix:name` pairs, just like the top level of a
    /// [`crate::MetadataTagTree`].
    Mapping(BTreeMap<String, TagValue>),
}

impl TagValue {
    /// Creates an empty mapping.
    pub fn mapping() -> Self {
        TagValue::Mapping(BTreeMap::new())
    }

    /// Returns the inner text, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Returns the inner bytes, if this is a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Returns the list items, if this is a `List`.
    pub fn as_list(&self) -> Option<&[TagValue]> {
        match self {
            TagValue::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Returns the record's fields, if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, TagValue>> {
        match self {
            TagValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable version of [`TagValue::as_mapping`].
    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, TagValue>> {
        match self {
            TagValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this value is a leaf (`Text` or `Bytes`).
    pub fn is_leaf(&self) -> bool {
        matches!(self, TagValue::Text(_) | TagValue::Bytes(_))
    }

    /// Whether this value, or anything below it, holds `Bytes`.
    pub fn contains_bytes(&self) -> bool {
        match self {
            TagValue::Text(_) => false,
            TagValue::Bytes(_) => true,
            TagValue::List(l) => l.iter().any(TagValue::contains_bytes),
            TagValue::Mapping(m) => m.values().any(TagValue::contains_bytes),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(value: Vec<u8>) -> Self {
        TagValue::Bytes(value)
    }
}

impl From<Vec<TagValue>> for TagValue {
    fn from(value: Vec<TagValue>) -> Self {
        TagValue::List(value)
    }
}

impl From<BTreeMap<String, TagValue>> for TagValue {
    fn from(value: BTreeMap<String, TagValue>) -> Self {
        TagValue::Mapping(value)
    }
}

impl<V: Into<TagValue>> FromIterator<V> for TagValue {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        TagValue::List(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::TagValue;

    #[test]
    fn accessors_match_variants() {
        let text = TagValue::from("fruit");
        assert_eq!(text.as_text(), Some("fruit"));
        assert!(text.as_list().is_none());
        assert!(text.is_leaf());

        let list: TagValue = ["fruit", "tree"].into_iter().collect();
        assert_eq!(
            list.as_list(),
            Some([TagValue::from("fruit"), TagValue::from("tree")].as_slice())
        );
        assert!(!list.is_leaf());

        let bytes = TagValue::from(vec![0xff_u8, 0xd8]);
        assert_eq!(bytes.as_bytes(), Some([0xff_u8, 0xd8].as_slice()));
    }

    #[test]
    fn finds_nested_bytes() {
        let mut inner = BTreeMap::new();
        inner.insert("ns:Thumb".to_string(), TagValue::Bytes(vec![1, 2, 3]));

        let nested = TagValue::List(vec![TagValue::from("a"), TagValue::Mapping(inner)]);
        assert!(nested.contains_bytes());
        assert!(!TagValue::from("a").contains_bytes());
    }
}
