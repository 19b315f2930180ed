use std::collections::BTreeMap;

use metatree_types::{
    MetadataTagTree, TagValue,
    consts::{EXIF, GPS, IPTC, TIFF, WEBP, XMP},
};

use crate::{
    aggregate::{
        AggregateError, ImageSource, MetadataDictionary, PROPERTY_GROUPS, SourceError,
        Transaction, cache::Cached, normalize_group_key,
    },
    native::{NativeConversionOptions, tree_from_native_tags, try_to_tag_value},
    xmp,
};

/// Edits made with [`ImageMetadata::set`] that haven't been written yet.
#[derive(Clone, Debug, Default)]
struct Pending {
    properties: Vec<(String, String, TagValue)>,
    xmp: bool,
}

/// An image's metadata, loaded lazily from an [`ImageSource`].
///
/// Properties and XMP are each read from the source once, then cached until
/// the next [`write`](Self::write).
pub struct ImageMetadata<S: ImageSource> {
    source: S,
    options: NativeConversionOptions,
    properties: Cached<MetadataDictionary>,
    xmp: Cached<MetadataTagTree>,
    pending: Pending,
}

impl<S: ImageSource> ImageMetadata<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, NativeConversionOptions::default())
    }

    /// Uses `options` when converting the source's native values.
    pub fn with_options(source: S, options: NativeConversionOptions) -> Self {
        Self {
            source,
            options,
            properties: Cached::default(),
            xmp: Cached::default(),
            pending: Pending::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Gives the source back.
    ///
    /// Unwritten edits are dropped.
    pub fn into_source(self) -> S {
        self.source
    }

    /// All properties, with group keys normalized.
    pub fn properties(&self) -> Result<MetadataDictionary, AggregateError> {
        self.properties
            .get_or_load("image properties", || self.load_properties())
    }

    /// One property group, or an empty map if the image doesn't have it.
    pub fn group(&self, group: &str) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        Ok(match self.properties()?.remove(group) {
            Some(TagValue::Mapping(m)) => m,
            Some(other) => {
                log::warn!("Property `{group}` isn't a group. Ignoring it. value: {other:?}");
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        })
    }

    pub fn exif(&self) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        self.group(EXIF)
    }

    pub fn iptc(&self) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        self.group(IPTC)
    }

    pub fn tiff(&self) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        self.group(TIFF)
    }

    pub fn gps(&self) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        self.group(GPS)
    }

    pub fn webp(&self) -> Result<BTreeMap<String, TagValue>, AggregateError> {
        self.group(WEBP)
    }

    /// The image's XMP metadata, keyed `prefix:name`.
    pub fn xmp(&self) -> Result<MetadataTagTree, AggregateError> {
        self.xmp.get_or_load("XMP metadata", || self.load_xmp())
    }

    /// Everything, keyed by group.
    ///
    /// `XMP` is always present. Other groups only show up when they hold
    /// something. Top-level properties that aren't groups are left out.
    pub fn asdict(&self) -> Result<MetadataDictionary, AggregateError> {
        let mut dict: MetadataDictionary = self
            .properties()?
            .into_iter()
            .filter(|(_, v)| v.as_mapping().is_some_and(|m| !m.is_empty()))
            .collect();

        dict.insert(XMP.into(), self.xmp()?.into_mapping());
        Ok(dict)
    }

    /// Serializes the XMP metadata, for a sidecar file.
    pub fn xmp_dumps(&self, with_header: bool) -> Result<String, AggregateError> {
        Ok(xmp::dumps(&self.xmp()?, with_header)?)
    }

    /// Replaces the XMP metadata with a parsed packet.
    ///
    /// Like [`set`](Self::set), this takes effect on disk after
    /// [`write`](Self::write).
    pub fn xmp_loads(&mut self, packet: impl AsRef<[u8]>) -> Result<(), AggregateError> {
        let tree = xmp::parse(packet)?;
        log::debug!("Loaded {} XMP tags from a packet.", tree.len());
        self.stage_xmp(tree);
        Ok(())
    }

    /// Finds the image's latitude and longitude, in signed degrees.
    ///
    /// # Errors
    ///
    /// [`AggregateError::NoGpsData`] when there's no `GPS` group, or
    /// [`AggregateError::MissingCoordinates`] when it lacks usable
    /// coordinates.
    pub fn location(&self) -> Result<(f64, f64), AggregateError> {
        let gps = self.gps()?;
        if gps.is_empty() {
            log::debug!("No GPS group found.");
            return Err(AggregateError::NoGpsData);
        }

        let coordinate = |key: &str, negative_ref: &str| -> Result<f64, AggregateError> {
            let value = gps
                .get(key)
                .and_then(TagValue::as_text)
                .and_then(|t| t.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    log::warn!("GPS group has no usable `{key}`.");
                    AggregateError::MissingCoordinates
                })?;

            let reference = format!("{key}Ref");
            Ok(match gps.get(&reference).and_then(TagValue::as_text) {
                Some(r) if r == negative_ref => -value,
                _ => value,
            })
        };

        Ok((coordinate("Latitude", "S")?, coordinate("Longitude", "W")?))
    }

    /// Sets one tag in memory.
    ///
    /// For the `XMP` group, `tag` is a path (see
    /// [`MetadataTagTree::set_path`]). For property groups, it's the plain
    /// property name. The group name is case-insensitive.
    ///
    /// Nothing reaches the source until [`write`](Self::write).
    pub fn set(
        &mut self,
        group: &str,
        tag: &str,
        value: impl Into<TagValue>,
    ) -> Result<(), AggregateError> {
        let group = group.to_ascii_uppercase();
        let value = value.into();

        if group == XMP {
            self.xmp
                .with_mut("XMP metadata", || self.load_xmp(), |tree| {
                    tree.set_path(tag, value)
                })??;
            self.pending.xmp = true;
            return Ok(());
        }

        if !PROPERTY_GROUPS.contains(&group.as_str()) {
            log::error!("Can't set `{tag}` in unknown group `{group}`.");
            return Err(AggregateError::UnknownGroup(group));
        }

        self.properties.with_mut(
            "image properties",
            || self.load_properties(),
            |props| {
                let entry = props.entry(group.clone()).or_insert_with(TagValue::mapping);
                match entry.as_mapping_mut() {
                    Some(m) => {
                        m.insert(tag.into(), value.clone());
                    }
                    None => log::warn!("Property `{group}` isn't a group. Not caching the edit."),
                }
            },
        )?;

        self.pending.properties.push((group, tag.into(), value));
        Ok(())
    }

    /// Writes pending edits to the source, then reloads.
    ///
    /// If the source fails, whatever it didn't take stays queued, and the
    /// caches keep the edits. Calling `write` again retries them.
    pub fn write(&mut self) -> Result<(), AggregateError> {
        let mut sent = 0;
        let result = self
            .pending
            .properties
            .iter()
            .try_for_each(|(group, tag, value)| {
                log::debug!("Writing property `{tag}` in group `{group}`.");
                self.source.write_property(group, tag, value)?;
                sent += 1;
                Ok::<_, SourceError>(())
            });
        self.pending.properties.drain(..sent);
        if let Err(e) = result {
            log::error!(
                "Source refused a property write. {} left queued. err: {e}",
                self.pending.properties.len()
            );
            return Err(e.into());
        }

        if self.pending.xmp {
            let tree = self.xmp()?;
            log::debug!("Writing {} XMP tags.", tree.len());
            self.source.write_metadata(&tree)?;
            self.pending.xmp = false;
        }

        self.reload();
        Ok(())
    }

    /// Drops cached values, so the next access re-reads the source.
    pub fn reload(&self) {
        log::trace!("Dropping cached image metadata.");
        self.properties.invalidate();
        self.xmp.invalidate();
    }

    /// Runs `f` on a [`Transaction`], then commits it if `f` succeeded.
    ///
    /// If `f` fails, nothing is written.
    pub fn transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Transaction<'_, S>) -> Result<R, AggregateError>,
    ) -> Result<R, AggregateError> {
        let mut tx = Transaction::begin(self)?;

        match f(&mut tx) {
            Ok(out) => {
                tx.commit()?;
                Ok(out)
            }
            Err(e) => {
                log::warn!("Transaction failed, so nothing was written. err: {e}");
                Err(e)
            }
        }
    }

    /// Replaces the cached XMP tree, and marks it for writing.
    pub(super) fn stage_xmp(&mut self, tree: MetadataTagTree) {
        self.xmp.set(tree);
        self.pending.xmp = true;
    }

    fn load_properties(&self) -> Result<MetadataDictionary, AggregateError> {
        let mut dict = MetadataDictionary::new();
        for (key, value) in self.source.properties()? {
            dict.insert(normalize_group_key(&key), try_to_tag_value(&value, self.options)?);
        }
        Ok(dict)
    }

    fn load_xmp(&self) -> Result<MetadataTagTree, AggregateError> {
        Ok(tree_from_native_tags(
            self.source.metadata_tags()?,
            self.options,
        )?)
    }
}
