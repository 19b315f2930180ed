/// An ISO 6709 string we couldn't read.
///
/// Both variants carry the original input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Iso6709Error {
    /// The string doesn't match the position grammar.
    Malformed { input: String },

    /// A `CRS` suffix showed up, but there was no altitude before it.
    CrsWithoutAltitude { input: String },
}

impl Iso6709Error {
    /// The string that failed to parse.
    pub fn input(&self) -> &str {
        match self {
            Iso6709Error::Malformed { input } | Iso6709Error::CrsWithoutAltitude { input } => input,
        }
    }
}

impl core::fmt::Display for Iso6709Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Iso6709Error::Malformed { input } => {
                write!(f, "Invalid ISO 6709 location string: `{input}`")
            }
            Iso6709Error::CrsWithoutAltitude { input } => {
                write!(f, "CRS cannot be present without an altitude: `{input}`")
            }
        }
    }
}

impl core::error::Error for Iso6709Error {}
