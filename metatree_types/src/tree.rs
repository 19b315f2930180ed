//! A flat-ish tree of metadata tags, keyed by `prefix:name`.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::tag::TagValue;

/// A mapping from `"{prefix}:{name}"` keys to [`TagValue`]s.
///
/// Entries keep the order in which they were inserted, so trees parsed from
/// the same source always iterate the same way.
///
/// The tree also remembers which namespace URI each prefix was bound to
/// while parsing. That bookkeeping isn't part of equality: two trees are
/// equal when they hold the same keys with the same values.
#[derive(Clone, Debug, Default)]
pub struct MetadataTagTree {
    entries: Vec<(String, TagValue)>,
    index: FxHashMap<String, usize>,
    namespaces: BTreeMap<String, String>,
}

impl MetadataTagTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of top-level tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no tags at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a tag, returning the value it replaced, if any.
    ///
    /// A replaced tag keeps its original position.
    ///
    /// # Errors
    ///
    /// Fails if `key` isn't a valid `prefix:name` pair.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: TagValue,
    ) -> Result<Option<TagValue>, TagKeyError> {
        let key: String = key.into();
        split_key(&key)?;

        if let Some(&i) = self.index.get(&key) {
            return Ok(Some(core::mem::replace(&mut self.entries[i].1, value)));
        }

        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(None)
    }

    /// Grabs the value stored at `key`.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Grabs a mutable reference to the value stored at `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut TagValue> {
        self.index.get(key).map(|&i| &mut self.entries[i].1)
    }

    /// Whether a tag with this key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes a tag, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);

        // everything after the removed entry slid down by one
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }

        Some(value)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The namespace URI bound to `prefix`, if one was recorded.
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Records the namespace URI for `prefix`.
    ///
    /// The serializer uses these when declaring namespaces.
    pub fn set_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let (prefix, uri) = (prefix.into(), uri.into());
        if let Some(old) = self.namespaces.get(&prefix) {
            if *old != uri {
                log::warn!(
                    "Prefix `{prefix}` was rebound!
                        - old: `{old}`
                        - new: `{uri}`"
                );
            }
        }
        self.namespaces.insert(prefix, uri);
    }

    /// All recorded `(prefix, uri)` bindings.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Converts the whole tree into one [`TagValue::Mapping`].
    pub fn into_mapping(self) -> TagValue {
        TagValue::Mapping(self.entries.into_iter().collect())
    }

    /// Looks up a value by XMP-style path.
    ///
    /// Paths look like `dc:subject[2]` or
    /// `Iptc4xmpCore:CreatorContactInfo/Iptc4xmpCore:CiAdrCity`. Array
    /// indices start at one.
    pub fn get_path(&self, path: &str) -> Option<&TagValue> {
        let steps = parse_path(path).ok()?;
        let (PathStep::Key(first), rest) = steps.split_first()? else {
            return None;
        };

        rest.iter()
            .try_fold(self.get(first)?, |value, step| match (step, value) {
                (PathStep::Key(k), TagValue::Mapping(map)) => map.get(*k),
                (PathStep::Index(i), TagValue::List(list)) => list.get(i.checked_sub(1)?),
                _ => None,
            })
    }

    /// Sets a value by XMP-style path.
    ///
    /// Missing mappings along the way are created. An index one past the end
    /// of a list appends to it.
    ///
    /// # Errors
    ///
    /// Fails when the path is malformed, an index is out of range, or a step
    /// tries to go inside a value that isn't the right kind of container.
    pub fn set_path(&mut self, path: &str, value: TagValue) -> Result<(), TagPathError> {
        let steps = parse_path(path)?;
        let Some((PathStep::Key(first), rest)) = steps.split_first() else {
            return Err(TagPathError::Malformed(path.into()));
        };

        if rest.is_empty() {
            self.insert(*first, value)?;
            return Ok(());
        }

        // work on a copy, so a failed step leaves the tree alone
        let mut slot = self
            .get(first)
            .cloned()
            .unwrap_or_else(|| container_for(rest));
        set_in_value(&mut slot, rest, value, path)?;
        self.insert(*first, slot)?;
        Ok(())
    }
}

impl PartialEq for MetadataTagTree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl FromIterator<(String, TagValue)> for MetadataTagTree {
    /// Builds a tree, silently skipping pairs with invalid keys.
    fn from_iter<T: IntoIterator<Item = (String, TagValue)>>(iter: T) -> Self {
        let mut tree = MetadataTagTree::new();
        for (key, value) in iter {
            if let Err(e) = tree.insert(key, value) {
                log::warn!("Skipping tag with invalid key. err: {e}");
            }
        }
        tree
    }
}

impl<'a> IntoIterator for &'a MetadataTagTree {
    type Item = &'a (String, TagValue);
    type IntoIter = core::slice::Iter<'a, (String, TagValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Splits a `prefix:name` key into its two halves.
///
/// # Errors
///
/// Both halves must be non-empty XML names without a colon (`NCName`s), so
/// no whitespace, no markup characters, and no leading digit, `-`, or `.`.
pub fn split_key(key: &str) -> Result<(&str, &str), TagKeyError> {
    let Some((prefix, name)) = key.split_once(':') else {
        return Err(TagKeyError::MissingSeparator(key.into()));
    };

    if prefix.is_empty() {
        return Err(TagKeyError::EmptyPrefix(key.into()));
    }
    if name.is_empty() {
        return Err(TagKeyError::EmptyName(key.into()));
    }

    if let Some(character) = [prefix, name].into_iter().find_map(bad_name_char) {
        return Err(TagKeyError::InvalidCharacter {
            key: key.into(),
            character,
        });
    }

    Ok((prefix, name))
}

/// The first character keeping `part` from being an `NCName`, if any.
fn bad_name_char(part: &str) -> Option<char> {
    let mut chars = part.chars();
    let first = chars.next()?;
    if !is_name_start_char(first) {
        return Some(first);
    }
    chars.find(|&c| !is_name_char(c))
}

/// `NameStartChar` from XML 1.0, minus the colon.
fn is_name_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// One step through a tag path.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PathStep<'p> {
    Key(&'p str),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<PathStep<'_>>, TagPathError> {
    let malformed = || TagPathError::Malformed(path.into());
    let mut steps = Vec::new();

    for segment in path.split('/') {
        // the key comes first, then any number of `[n]` indices
        let (key, mut indices) = match segment.find('[') {
            Some(open) => (&segment[..open], &segment[open..]),
            None => (segment, ""),
        };

        split_key(key).map_err(|_| malformed())?;
        steps.push(PathStep::Key(key));

        while !indices.is_empty() {
            let close = indices.find(']').ok_or_else(malformed)?;
            let number = indices
                .get(1..close)
                .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
                .ok_or_else(malformed)?;
            steps.push(PathStep::Index(number.parse().map_err(|_| malformed())?));
            indices = &indices[close + 1..];

            if !indices.is_empty() && !indices.starts_with('[') {
                return Err(malformed());
            }
        }
    }

    Ok(steps)
}

/// An empty container matching what the next step expects.
fn container_for(rest: &[PathStep<'_>]) -> TagValue {
    match rest.first() {
        Some(PathStep::Key(_)) => TagValue::mapping(),
        Some(PathStep::Index(_)) => TagValue::List(Vec::new()),
        None => TagValue::Text(String::new()),
    }
}

fn set_in_value(
    slot: &mut TagValue,
    steps: &[PathStep<'_>],
    value: TagValue,
    path: &str,
) -> Result<(), TagPathError> {
    let Some((step, rest)) = steps.split_first() else {
        *slot = value;
        return Ok(());
    };

    let child: &mut TagValue = match (step, slot) {
        (PathStep::Key(k), TagValue::Mapping(map)) => map
            .entry((*k).to_owned())
            .or_insert_with(|| container_for(rest)),

        (PathStep::Index(i), TagValue::List(list)) => {
            let (i, len) = (*i, list.len());
            if i == 0 || i > len + 1 {
                return Err(TagPathError::IndexOutOfRange {
                    path: path.into(),
                    index: i,
                    len,
                });
            }
            if i == len + 1 {
                list.push(container_for(rest));
            }
            &mut list[i - 1]
        }

        _ => return Err(TagPathError::NotAContainer(path.into())),
    };

    set_in_value(child, rest, value, path)
}

/// A tag key wasn't a valid `prefix:name` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagKeyError {
    /// There was no `:` in the key.
    MissingSeparator(String),

    /// Nothing came before the `:`.
    EmptyPrefix(String),

    /// Nothing came after the `:`.
    EmptyName(String),

    /// The key held a character that can't appear in an XML name.
    InvalidCharacter { key: String, character: char },
}

impl core::fmt::Display for TagKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TagKeyError::MissingSeparator(key) => {
                write!(f, "Tag key `{key}` has no `prefix:` part.")
            }
            TagKeyError::EmptyPrefix(key) => write!(f, "Tag key `{key}` has an empty prefix."),
            TagKeyError::EmptyName(key) => write!(f, "Tag key `{key}` has an empty name."),
            TagKeyError::InvalidCharacter { key, character } => {
                write!(f, "Tag key `{key}` contains the invalid character `{character}`.")
            }
        }
    }
}

impl core::error::Error for TagKeyError {}

/// A tag path couldn't be followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagPathError {
    /// The path didn't follow the `prefix:Name[n]/prefix:Field` syntax.
    Malformed(String),

    /// The top-level key was invalid.
    Key(TagKeyError),

    /// A list index was zero, or more than one past the end.
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A step tried to go inside a value of the wrong kind.
    NotAContainer(String),
}

impl core::fmt::Display for TagPathError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TagPathError::Malformed(path) => write!(f, "Tag path `{path}` is malformed."),
            TagPathError::Key(e) => write!(f, "Tag path has a bad key. err: {e}"),
            TagPathError::IndexOutOfRange { path, index, len } => write!(
                f,
                "Index `{index}` in tag path `{path}` is out of range. \
                    The list has `{len}` items, and indices start at 1."
            ),
            TagPathError::NotAContainer(path) => write!(
                f,
                "Tag path `{path}` goes inside a value that can't hold that step."
            ),
        }
    }
}

impl core::error::Error for TagPathError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TagPathError::Key(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TagKeyError> for TagPathError {
    fn from(value: TagKeyError) -> Self {
        TagPathError::Key(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{MetadataTagTree, TagKeyError, TagPathError, split_key};
    use crate::tag::TagValue;

    #[test]
    fn keys_need_both_halves() {
        assert_eq!(split_key("dc:subject"), Ok(("dc", "subject")));
        assert!(matches!(
            split_key("subject"),
            Err(TagKeyError::MissingSeparator(_))
        ));
        assert!(matches!(split_key(":subject"), Err(TagKeyError::EmptyPrefix(_))));
        assert!(matches!(split_key("dc:"), Err(TagKeyError::EmptyName(_))));
        assert!(matches!(
            split_key("dc:sub ject"),
            Err(TagKeyError::InvalidCharacter { character: ' ', .. })
        ));
    }

    #[test]
    fn keys_must_be_xml_names() {
        for (key, bad) in [
            ("dc:a<b", '<'),
            ("dc:a&b", '&'),
            ("dc:1x", '1'),
            ("2x:title", '2'),
            ("dc:-x", '-'),
            ("dc:a\"b", '"'),
        ] {
            assert_eq!(
                split_key(key),
                Err(TagKeyError::InvalidCharacter {
                    key: key.into(),
                    character: bad,
                }),
                "`{key}` isn't an XML name"
            );
        }

        // digits, dots, and dashes are fine after the first character
        assert_eq!(split_key("exif:GPSVersion1.0-b"), Ok(("exif", "GPSVersion1.0-b")));
        assert_eq!(split_key("_x:Année"), Ok(("_x", "Année")));

        let mut tree = MetadataTagTree::new();
        assert!(tree.insert("dc:a<b", "v".into()).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut tree = MetadataTagTree::new();
        tree.insert("dc:title", "a".into()).unwrap();
        tree.insert("xmp:Rating", "5".into()).unwrap();
        tree.insert("dc:creator", "b".into()).unwrap();

        // replacing keeps the slot
        let old = tree.insert("xmp:Rating", "4".into()).unwrap();
        assert_eq!(old, Some(TagValue::from("5")));

        assert_eq!(
            tree.keys().collect::<Vec<_>>(),
            vec!["dc:title", "xmp:Rating", "dc:creator"]
        );
    }

    #[test]
    fn remove_reindexes() {
        let mut tree = MetadataTagTree::new();
        tree.insert("a:one", "1".into()).unwrap();
        tree.insert("a:two", "2".into()).unwrap();
        tree.insert("a:three", "3".into()).unwrap();

        assert_eq!(tree.remove("a:one"), Some(TagValue::from("1")));
        assert_eq!(tree.get("a:three"), Some(&TagValue::from("3")));
        assert_eq!(tree.get("a:two"), Some(&TagValue::from("2")));
        assert_eq!(tree.len(), 2);
        assert!(tree.remove("a:one").is_none());
    }

    #[test]
    fn equality_ignores_order_and_namespaces() {
        let mut left = MetadataTagTree::new();
        left.insert("a:one", "1".into()).unwrap();
        left.insert("a:two", "2".into()).unwrap();
        left.set_namespace("a", "ns:a/");

        let mut right = MetadataTagTree::new();
        right.insert("a:two", "2".into()).unwrap();
        right.insert("a:one", "1".into()).unwrap();

        assert_eq!(left, right);

        right.insert("a:three", "3".into()).unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn paths_create_and_find_nested_values() {
        let mut tree = MetadataTagTree::new();
        tree.set_path(
            "Iptc4xmpCore:CreatorContactInfo/Iptc4xmpCore:CiAdrCity",
            "Paris".into(),
        )
        .unwrap();
        tree.set_path("dc:subject[1]", "fruit".into()).unwrap();
        tree.set_path("dc:subject[2]", "tree".into()).unwrap();

        assert_eq!(
            tree.get_path("Iptc4xmpCore:CreatorContactInfo/Iptc4xmpCore:CiAdrCity"),
            Some(&TagValue::from("Paris"))
        );
        assert_eq!(tree.get_path("dc:subject[2]"), Some(&TagValue::from("tree")));
        assert_eq!(tree.get_path("dc:subject[3]"), None);
        assert_eq!(tree.get_path("dc:subject[0]"), None);

        // overwrite in place
        tree.set_path("dc:subject[1]", "apple".into()).unwrap();
        assert_eq!(
            tree.get("dc:subject"),
            Some(&TagValue::List(vec!["apple".into(), "tree".into()]))
        );
    }

    #[test]
    fn bad_paths_error() {
        let mut tree = MetadataTagTree::new();
        tree.insert("dc:title", "leaf".into()).unwrap();
        let before = tree.clone();

        assert!(matches!(
            tree.set_path("dc:title/dc:inner", "x".into()),
            Err(TagPathError::NotAContainer(_))
        ));
        assert!(matches!(
            tree.set_path("dc:subject[2]", "x".into()),
            Err(TagPathError::IndexOutOfRange { index: 2, len: 0, .. })
        ));
        assert!(matches!(
            tree.set_path("dc:subject[x]", "x".into()),
            Err(TagPathError::Malformed(_))
        ));
        assert!(matches!(
            tree.set_path("nocolon", "x".into()),
            Err(TagPathError::Malformed(_))
        ));

        // nested steps that fail don't leave half-built containers behind
        assert!(matches!(
            tree.set_path("Iptc4xmpCore:CreatorContactInfo/Iptc4xmpCore:Phones[3]", "x".into()),
            Err(TagPathError::IndexOutOfRange { index: 3, len: 0, .. })
        ));

        assert_eq!(tree, before);
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["dc:title"]);
    }
}
