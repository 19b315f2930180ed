use metatree_types::TagPathError;

use crate::{native::error::NativeConversionError, xmp::error::XmpError};

/// An error reported by an [`ImageSource`](super::ImageSource) or
/// [`VideoSource`](super::VideoSource).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceError {
    /// The source couldn't be read.
    Read(String),

    /// The source couldn't be written.
    Write(String),

    /// The source can't do this at all, like writing to a read-only format.
    Unsupported(String),
}

impl core::fmt::Display for SourceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SourceError::Read(e) => write!(f, "Failed to read metadata from source. err: {e}"),
            SourceError::Write(e) => write!(f, "Failed to write metadata to source. err: {e}"),
            SourceError::Unsupported(what) => write!(f, "Source doesn't support this: {what}"),
        }
    }
}

impl core::error::Error for SourceError {}

/// An error that happened while gathering (or writing) a file's metadata.
#[derive(Clone, Debug)]
pub enum AggregateError {
    /// The source failed.
    Source(SourceError),

    /// An XMP packet couldn't be parsed or written.
    Xmp(XmpError),

    /// A native value couldn't be converted.
    Conversion(NativeConversionError),

    /// A tag path was bad, or pointed somewhere we can't write.
    Path(TagPathError),

    /// The image has no GPS group.
    NoGpsData,

    /// The GPS group lacks a usable latitude or longitude.
    MissingCoordinates,

    /// Someone asked to set a tag in a group we don't know.
    UnknownGroup(String),
}

impl core::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AggregateError::Source(e) => write!(f, "{e}"),
            AggregateError::Xmp(e) => write!(f, "XMP error. err: {e}"),
            AggregateError::Conversion(e) => write!(f, "Native conversion failed. err: {e}"),
            AggregateError::Path(e) => write!(f, "Bad tag path. err: {e}"),
            AggregateError::NoGpsData => f.write_str("This image does not contain GPS data."),
            AggregateError::MissingCoordinates => f.write_str(
                "Could not extract latitude and/or longitude from GPS data.",
            ),
            AggregateError::UnknownGroup(group) => {
                write!(f, "Unknown metadata group `{group}`.")
            }
        }
    }
}

impl core::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::Source(e) => Some(e),
            AggregateError::Xmp(e) => Some(e),
            AggregateError::Conversion(e) => Some(e),
            AggregateError::Path(e) => Some(e),
            AggregateError::NoGpsData
            | AggregateError::MissingCoordinates
            | AggregateError::UnknownGroup(_) => None,
        }
    }
}

impl From<SourceError> for AggregateError {
    fn from(value: SourceError) -> Self {
        AggregateError::Source(value)
    }
}

impl From<XmpError> for AggregateError {
    fn from(value: XmpError) -> Self {
        AggregateError::Xmp(value)
    }
}

impl From<NativeConversionError> for AggregateError {
    fn from(value: NativeConversionError) -> Self {
        AggregateError::Conversion(value)
    }
}

impl From<TagPathError> for AggregateError {
    fn from(value: TagPathError) -> Self {
        AggregateError::Path(value)
    }
}
