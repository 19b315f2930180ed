//! Geographic positions, as found in ISO 6709 strings.

/// A point on (or above) the Earth.
///
/// This is what the ISO 6709 parser in `metatree` produces. Once built, it
/// isn't meant to change, so fields are only exposed through getters.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    reference_system: Option<String>,
}

impl GeoPosition {
    /// Creates a position with no altitude or reference system.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            reference_system: None,
        }
    }

    /// Adds an altitude, in meters.
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Adds a coordinate reference system identifier, like `WGS_84`.
    pub fn with_reference_system(mut self, crs: impl Into<String>) -> Self {
        self.reference_system = Some(crs.into());
        self
    }

    /// Latitude in signed degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in signed degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in meters, if known.
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    /// The coordinate reference system identifier, if any.
    pub fn reference_system(&self) -> Option<&str> {
        self.reference_system.as_deref()
    }
}

/// Writes the position back out in ISO 6709 form.
///
/// Latitude gets two integer digits, longitude three. The output always ends
/// with the `/` terminator.
impl core::fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write_coordinate(f, self.latitude, 2)?;
        write_coordinate(f, self.longitude, 3)?;

        if let Some(altitude) = self.altitude {
            write_coordinate(f, altitude, 1)?;

            if let Some(ref crs) = self.reference_system {
                write!(f, "CRS{crs}")?;
            }
        }

        f.write_str("/")
    }
}

fn write_coordinate(
    f: &mut core::fmt::Formatter<'_>,
    value: f64,
    int_width: usize,
) -> core::fmt::Result {
    let sign = if value.is_sign_negative() { '-' } else { '+' };
    let digits = value.abs().to_string();

    match digits.split_once('.') {
        Some((int, frac)) => write!(f, "{sign}{int:0>int_width$}.{frac}"),
        None => write!(f, "{sign}{digits:0>int_width$}"),
    }
}

#[cfg(test)]
mod tests {
    use super::GeoPosition;

    #[test]
    fn displays_as_iso_6709() {
        assert_eq!(
            GeoPosition::new(48.8577, 2.295).to_string(),
            "+48.8577+002.295/"
        );
        assert_eq!(
            GeoPosition::new(-90.0, 0.0)
                .with_altitude(2800.0)
                .with_reference_system("WGS_84")
                .to_string(),
            "-90+000+2800CRSWGS_84/"
        );
        assert_eq!(
            GeoPosition::new(40.6894, -74.0447).to_string(),
            "+40.6894-074.0447/"
        );
    }

    #[test]
    fn crs_is_only_written_with_altitude() {
        let p = GeoPosition::new(1.0, 2.0).with_reference_system("WGS_84");
        assert_eq!(p.to_string(), "+01+002/");
        assert_eq!(p.reference_system(), Some("WGS_84"));
    }
}
