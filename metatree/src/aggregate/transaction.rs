use metatree_types::{MetadataTagTree, TagValue, consts::XMP};

use crate::aggregate::{AggregateError, ImageMetadata, ImageSource, PROPERTY_GROUPS};

/// A batch of edits to an image's metadata.
///
/// Edits land on a private copy. Nothing touches the [`ImageMetadata`] (or
/// its source) until [`commit`](Self::commit), so dropping a transaction
/// throws its edits away.
///
/// Usually, you'll get one through [`ImageMetadata::transaction`].
pub struct Transaction<'a, S: ImageSource> {
    metadata: &'a mut ImageMetadata<S>,
    tree: MetadataTagTree,
    tree_changed: bool,
    properties: Vec<(String, String, TagValue)>,
}

impl<'a, S: ImageSource> Transaction<'a, S> {
    /// Starts a transaction with a copy of the image's current XMP tree.
    pub fn begin(metadata: &'a mut ImageMetadata<S>) -> Result<Self, AggregateError> {
        let tree = metadata.xmp()?;
        log::trace!("Began a transaction with {} XMP tags.", tree.len());

        Ok(Self {
            metadata,
            tree,
            tree_changed: false,
            properties: Vec::new(),
        })
    }

    /// The working XMP tree.
    pub fn tree(&self) -> &MetadataTagTree {
        &self.tree
    }

    /// The working XMP tree, for direct edits.
    pub fn tree_mut(&mut self) -> &mut MetadataTagTree {
        self.tree_changed = true;
        &mut self.tree
    }

    /// Sets a value in the working XMP tree, by path.
    pub fn set_path(&mut self, path: &str, value: impl Into<TagValue>) -> Result<(), AggregateError> {
        self.tree.set_path(path, value.into())?;
        self.tree_changed = true;
        Ok(())
    }

    /// Queues a property write, like `LensMake` in `EXIF`.
    pub fn set_property(
        &mut self,
        group: &str,
        tag: &str,
        value: impl Into<TagValue>,
    ) -> Result<(), AggregateError> {
        let group = group.to_ascii_uppercase();

        if group == XMP {
            return self.set_path(tag, value);
        }

        if !PROPERTY_GROUPS.contains(&group.as_str()) {
            log::error!("Can't set `{tag}` in unknown group `{group}`.");
            return Err(AggregateError::UnknownGroup(group));
        }

        self.properties.push((group, tag.into(), value.into()));
        Ok(())
    }

    /// Hands every edit to the image, then writes it to the source.
    pub fn commit(self) -> Result<(), AggregateError> {
        let Self {
            metadata,
            tree,
            tree_changed,
            properties,
        } = self;

        log::debug!(
            "Committing a transaction. properties: {}, XMP changed: {tree_changed}",
            properties.len()
        );

        for (group, tag, value) in properties {
            metadata.set(&group, &tag, value)?;
        }

        if tree_changed {
            metadata.stage_xmp(tree);
        }

        metadata.write()
    }
}
