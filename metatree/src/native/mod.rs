//! Converts "native" metadata trees into tag trees, and back.
//!
//! Media frameworks hand out metadata as loosely-typed trees: dictionaries,
//! arrays, strings, blobs, numbers, and references to other tags. Callers
//! describe those trees with [`NativeValue`], and this module turns them into
//! [`TagValue`]s.
//!
//! Conversion applies these rules, in order:
//!
//! 1. strings become `Text`,
//! 2. dictionaries become `Mapping`s (recursively),
//! 3. arrays become `List`s (recursively, keeping order),
//! 4. data blobs become `Bytes`, untouched, and
//! 5. everything else is either dereferenced (tag references) and run through
//!    these rules again, or falls back to its string form.
//!
//! That last rule is lossy on purpose: numbers and booleans become text.
//! It lets us pull *something* out of the long tail of odd encodings instead
//! of failing the whole tree.

use metatree_types::{MetadataTagTree, TagValue, tree::split_key};

pub mod error;

use error::NativeConversionError;

/// One node in a native metadata tree.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeValue {
    String(String),
    Dictionary(Vec<(String, NativeValue)>),
    Array(Vec<NativeValue>),
    Data(Vec<u8>),

    /// A reference to another tag. We look through it to its value.
    Tag(Box<NativeTag>),

    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(String),

    /// Some other object the framework gave us.
    Opaque {
        /// The object's type name, like `CFNull`.
        type_name: String,

        /// The object's description, if it has one.
        description: Option<String>,
    },
}

/// A single tag from a native metadata object.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeTag {
    /// The namespace prefix, like `dc`.
    pub prefix: String,

    /// The namespace URI, if the framework tells us.
    pub namespace: Option<String>,

    /// The tag's local name, like `subject`.
    pub name: String,

    pub value: NativeValue,
}

impl NativeTag {
    /// Creates a tag without a namespace URI.
    pub fn new(prefix: impl Into<String>, name: impl Into<String>, value: NativeValue) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: None,
            name: name.into(),
            value,
        }
    }

    /// The `prefix:name` key this tag gets in a tree.
    pub fn key(&self) -> String {
        format!("{}:{}", self.prefix, self.name)
    }
}

/// What to do with a leaf that has no conversion rule and no string form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LeafFallback {
    /// Use the leaf's type name as its text, and log a warning.
    #[default]
    Stringify,

    /// Fail with [`NativeConversionError::UnsupportedTagType`].
    Reject,
}

/// Options for converting native values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NativeConversionOptions {
    pub leaf_fallback: LeafFallback,
}

/// Converts one native value into a [`TagValue`].
///
/// # Errors
///
/// This only fails when `options` asks us to reject leaves we can't
/// represent.
pub fn try_to_tag_value(
    value: &NativeValue,
    options: NativeConversionOptions,
) -> Result<TagValue, NativeConversionError> {
    Ok(match value {
        // 1.
        NativeValue::String(s) => TagValue::Text(s.clone()),

        // 2.
        NativeValue::Dictionary(entries) => TagValue::Mapping(
            entries
                .iter()
                .map(|(k, v)| try_to_tag_value(v, options).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()?,
        ),

        // 3.
        NativeValue::Array(items) => TagValue::List(
            items
                .iter()
                .map(|v| try_to_tag_value(v, options))
                .collect::<Result<_, _>>()?,
        ),

        // 4.
        NativeValue::Data(bytes) => TagValue::Bytes(bytes.clone()),

        // 5. look through the reference, then start over
        NativeValue::Tag(tag) => {
            log::trace!("Dereferencing tag `{}` to its value.", tag.key());
            return try_to_tag_value(&tag.value, options);
        }

        // 5. string fallbacks
        NativeValue::Integer(i) => TagValue::Text(i.to_string()),
        NativeValue::Real(r) => TagValue::Text(r.to_string()),
        NativeValue::Boolean(b) => TagValue::Text(if *b { "True" } else { "False" }.into()),
        NativeValue::Date(d) => TagValue::Text(d.clone()),
        NativeValue::Opaque {
            type_name,
            description,
        } => match (description, options.leaf_fallback) {
            (Some(description), _) => TagValue::Text(description.clone()),
            (None, LeafFallback::Stringify) => {
                log::warn!(
                    "Native value of type `{type_name}` has no string form. \
                    Using its type name instead."
                );
                TagValue::Text(format!("<{type_name}>"))
            }
            (None, LeafFallback::Reject) => {
                log::error!("Rejecting native value of unsupported type `{type_name}`.");
                return Err(NativeConversionError::UnsupportedTagType {
                    type_name: type_name.clone(),
                });
            }
        },
    })
}

impl From<&NativeValue> for TagValue {
    fn from(value: &NativeValue) -> Self {
        try_to_tag_value(value, NativeConversionOptions::default())
            .unwrap_or_else(|e| unreachable!("stringify fallback can't fail. but err: {e}"))
    }
}

impl From<NativeValue> for TagValue {
    fn from(value: NativeValue) -> Self {
        (&value).into()
    }
}

impl From<TagValue> for NativeValue {
    fn from(value: TagValue) -> Self {
        match value {
            TagValue::Text(t) => NativeValue::String(t),
            TagValue::Bytes(b) => NativeValue::Data(b),
            TagValue::List(l) => NativeValue::Array(l.into_iter().map(Into::into).collect()),
            TagValue::Mapping(m) => {
                NativeValue::Dictionary(m.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Builds a tag tree from a native object's tags.
///
/// Each tag lands at `prefix:name`. If two tags share a key, the later one
/// wins. Tags with an empty prefix or name are skipped.
///
/// # Errors
///
/// Only fails when `options` rejects an unsupported leaf.
pub fn tree_from_native_tags(
    tags: impl IntoIterator<Item = NativeTag>,
    options: NativeConversionOptions,
) -> Result<MetadataTagTree, NativeConversionError> {
    let mut tree = MetadataTagTree::new();

    for tag in tags {
        let key = tag.key();
        let value = try_to_tag_value(&tag.value, options)?;

        if let Err(e) = tree.insert(key, value) {
            log::warn!("Skipping native tag with an unusable key. err: {e}");
            continue;
        }

        if let Some(uri) = tag.namespace {
            tree.set_namespace(tag.prefix, uri);
        }
    }

    Ok(tree)
}

/// Turns a tag tree back into native tags, in tree order.
pub fn to_native_tags(tree: &MetadataTagTree) -> Vec<NativeTag> {
    tree.iter()
        .flat_map(|(key, value)| {
            // tree keys are always valid, so this never skips anything
            let (prefix, name) = split_key(key).ok()?;
            Some(NativeTag {
                prefix: prefix.into(),
                namespace: tree.namespace_uri(prefix).map(Into::into),
                name: name.into(),
                value: value.clone().into(),
            })
        })
        .collect()
}
