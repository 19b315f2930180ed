use std::collections::BTreeMap;

use metatree_types::{
    GeoPosition, MetadataTagTree, TagValue,
    consts::{MDTA, UDTA, XMP},
};

use crate::{
    aggregate::{AggregateError, MetadataDictionary, VideoSource},
    iso6709,
    native::{NativeConversionOptions, NativeValue, try_to_tag_value},
    xmp,
};

/// One metadata item from a video container.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadataItem {
    /// Where the item's key lives, like `udta` or `mdta`.
    pub key_space: Option<String>,

    /// The framework's common key, like `location` or `creationDate`.
    pub common_key: Option<String>,

    pub value: Option<NativeValue>,
}

impl VideoMetadataItem {
    pub fn new(
        key_space: impl Into<String>,
        common_key: impl Into<String>,
        value: NativeValue,
    ) -> Self {
        Self {
            key_space: Some(key_space.into()),
            common_key: Some(common_key.into()),
            value: Some(value),
        }
    }
}

/// A video's metadata, read all at once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoMetadata {
    dictionary: MetadataDictionary,
    xmp: MetadataTagTree,
    xmp_packet: Option<String>,
    location: Option<GeoPosition>,
}

impl VideoMetadata {
    /// Reads every item from `source`.
    pub fn new(source: &impl VideoSource) -> Result<Self, AggregateError> {
        Self::from_items(source.items()?, NativeConversionOptions::default())
    }

    /// Groups items by key space.
    ///
    /// An XMP packet found in user data becomes the `XMP` group, and a
    /// `Location` in QuickTime metadata is split into its parts.
    ///
    /// # Errors
    ///
    /// Fails if an embedded XMP packet is broken, or if `options` rejects a
    /// value.
    pub fn from_items(
        items: impl IntoIterator<Item = VideoMetadataItem>,
        options: NativeConversionOptions,
    ) -> Result<Self, AggregateError> {
        let mut out = Self::default();

        for item in items {
            let key_space = item.key_space.unwrap_or_default();
            let key = item.common_key.as_deref().map(capitalize).unwrap_or_default();

            // the group exists even if its items are all empty
            let group = out
                .dictionary
                .entry(key_space.clone())
                .or_insert_with(TagValue::mapping);

            let Some(value) = item.value else {
                log::trace!("Skipping empty video item `{key}` in `{key_space}`.");
                continue;
            };

            let stored = match (key_space.as_str(), key.as_str()) {
                (UDTA, "") => match packet_bytes(&value).filter(|b| xmp::is_xmp_packet(b)) {
                    Some(bytes) => {
                        log::debug!("Found an XMP packet in video user data.");
                        out.xmp = xmp::parse(bytes)?;
                        out.xmp_packet = Some(String::from_utf8_lossy(bytes).into_owned());
                        continue;
                    }
                    None => try_to_tag_value(&value, options)?,
                },

                (MDTA, "Location") => {
                    let text = try_to_tag_value(&value, options)?;
                    match text.as_text().map(iso6709::parse) {
                        Some(Ok(position)) => {
                            let mapping = location_mapping(&position);
                            out.location = Some(position);
                            mapping
                        }
                        Some(Err(e)) => {
                            log::warn!("Keeping unparsable video location as text. err: {e}");
                            text
                        }
                        None => {
                            log::warn!("Video location isn't text. Keeping it as-is.");
                            text
                        }
                    }
                }

                _ => try_to_tag_value(&value, options)?,
            };

            match group.as_mapping_mut() {
                Some(m) => {
                    m.insert(key, stored);
                }
                None => log::warn!("Video group `{key_space}` isn't a mapping. Dropping `{key}`."),
            }
        }

        if out.xmp_packet.is_some() {
            out.dictionary
                .insert(XMP.into(), out.xmp.clone().into_mapping());
        }

        Ok(out)
    }

    /// Everything, keyed by key space, plus `XMP` if there was a packet.
    pub fn asdict(&self) -> &MetadataDictionary {
        &self.dictionary
    }

    /// The embedded XMP metadata. Empty if there wasn't any.
    pub fn xmp(&self) -> &MetadataTagTree {
        &self.xmp
    }

    /// The embedded XMP packet, as it was found.
    pub fn xmp_packet(&self) -> Option<&str> {
        self.xmp_packet.as_deref()
    }

    /// Where the video was recorded, if it says.
    pub fn location(&self) -> Option<&GeoPosition> {
        self.location.as_ref()
    }
}

/// `creationDate` -> `CreationDate`
fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn packet_bytes(value: &NativeValue) -> Option<&[u8]> {
    match value {
        NativeValue::Data(bytes) => Some(bytes),
        NativeValue::String(s) => Some(s.as_bytes()),
        _ => None,
    }
}

fn location_mapping(position: &GeoPosition) -> TagValue {
    let mut m = BTreeMap::new();
    m.insert("Latitude".into(), position.latitude().to_string().into());
    m.insert("Longitude".into(), position.longitude().to_string().into());
    if let Some(height) = position.altitude() {
        m.insert("Height".into(), height.to_string().into());
    }
    if let Some(crs) = position.reference_system() {
        m.insert("CRS".into(), crs.into());
    }
    TagValue::Mapping(m)
}

#[cfg(test)]
mod tests {
    use super::capitalize;

    #[test]
    fn capitalized_keys() {
        assert_eq!(capitalize("location"), "Location");
        assert_eq!(capitalize("m"), "M");
        assert_eq!(capitalize("Make"), "Make");
        assert_eq!(capitalize(""), "");
    }
}
