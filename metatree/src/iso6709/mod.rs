//! Parses ISO 6709 location strings, like `+27.5916+086.5640+8850CRSWGS_84/`.
//!
//! The grammar we accept:
//!
//! ```text
//! position  := latitude longitude [ altitude [ "CRS" crs ] ] ["/"]
//! latitude  := sign digits ["." digits]
//! longitude := sign digits ["." digits]
//! altitude  := [sign] digits ["." digits]
//! ```
//!
//! Coordinates are plain signed degrees. The `CRS` suffix isn't in the
//! standard, but cameras and phones write it anyway.
//!
//! Numbers are matched greedily, so each component takes every digit it can.

use metatree_types::GeoPosition;
use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{eof, opt, preceded},
    error::EmptyError,
    token::{one_of, rest},
};

pub mod error;

use error::Iso6709Error;

/// Parses an ISO 6709 string into a position.
///
/// The whole string must match. Whitespace isn't allowed anywhere.
///
/// An empty CRS (`...CRS/`) counts as no CRS, and one trailing `/` is
/// removed from the CRS text.
pub fn parse(s: &str) -> Result<GeoPosition, Iso6709Error> {
    let mut input = s;

    let parts = position.parse_next(&mut input).map_err(|_| {
        log::error!("Invalid ISO 6709 location string: `{s}`");
        Iso6709Error::Malformed { input: s.into() }
    })?;

    let reference_system = parts
        .crs
        .map(|crs| crs.strip_suffix('/').unwrap_or(crs))
        .filter(|crs| !crs.is_empty());

    let mut out = GeoPosition::new(parts.latitude, parts.longitude);

    match (parts.altitude, reference_system) {
        (Some(altitude), crs) => {
            out = out.with_altitude(altitude);
            if let Some(crs) = crs {
                out = out.with_reference_system(crs);
            }
        }
        (None, Some(_)) => {
            log::error!("CRS cannot be present without an altitude: `{s}`");
            return Err(Iso6709Error::CrsWithoutAltitude { input: s.into() });
        }
        (None, None) => (),
    }

    log::trace!("Parsed ISO 6709 string `{s}` into: {out:?}");
    Ok(out)
}

/// The pieces of a position, before validation.
struct Parts<'s> {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    crs: Option<&'s str>,
}

fn position<'s>(input: &mut &'s str) -> Result<Parts<'s>, EmptyError> {
    let (latitude, longitude, altitude, crs, _, _) = (
        signed,
        signed,
        opt(maybe_signed),
        opt(preceded("CRS", rest)),
        opt('/'),
        eof,
    )
        .parse_next(input)?;

    Ok(Parts {
        latitude,
        longitude,
        altitude,
        crs,
    })
}

/// `sign digits ["." digits]`
fn signed(input: &mut &str) -> Result<f64, EmptyError> {
    (one_of(['+', '-']), number)
        .take()
        .parse_to()
        .parse_next(input)
}

/// `[sign] digits ["." digits]`
fn maybe_signed(input: &mut &str) -> Result<f64, EmptyError> {
    (opt(one_of(['+', '-'])), number)
        .take()
        .parse_to()
        .parse_next(input)
}

fn number<'s>(input: &mut &'s str) -> Result<&'s str, EmptyError> {
    (digit1, opt(('.', digit1))).take().parse_next(input)
}
