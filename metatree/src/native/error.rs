/// An error that happened while converting a native value tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeConversionError {
    /// A leaf had no conversion rule and no string form, and the conversion
    /// options asked us to reject those instead of guessing.
    UnsupportedTagType {
        /// The native type name of the leaf.
        type_name: String,
    },
}

impl core::fmt::Display for NativeConversionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NativeConversionError::UnsupportedTagType { type_name } => write!(
                f,
                "Native value of type `{type_name}` has no conversion rule \
                    and no string form."
            ),
        }
    }
}

impl core::error::Error for NativeConversionError {}
