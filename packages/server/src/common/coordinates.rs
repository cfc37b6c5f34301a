//! Caller-reported GPS position.

/// A latitude/longitude pair in decimal degrees.
///
/// Only constructible through [`Coordinates::new`] or [`Coordinates::parse`],
/// both of which reject non-finite and out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }

    /// Parse the `"lat,lng"` form used by tool arguments.
    ///
    /// Blank or malformed input yields `None`.
    pub fn parse(input: &str) -> Option<Self> {
        let (lat, lng) = input.trim().split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Self::new(lat, lng)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_pair() {
        let coords = Coordinates::parse(" 50.0614, 19.9366 ").unwrap();
        assert_eq!(coords.lat(), 50.0614);
        assert_eq!(coords.lng(), 19.9366);
        assert_eq!(coords.to_string(), "50.0614,19.9366");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert_eq!(Coordinates::parse(""), None);
        assert_eq!(Coordinates::parse("   "), None);
        assert_eq!(Coordinates::parse("50.06"), None);
        assert_eq!(Coordinates::parse("north,east"), None);
        assert_eq!(Coordinates::parse("NaN,19.9"), None);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert_eq!(Coordinates::new(91.0, 0.0), None);
        assert_eq!(Coordinates::new(0.0, -180.5), None);
        assert!(Coordinates::new(-90.0, 180.0).is_some());
    }
}
