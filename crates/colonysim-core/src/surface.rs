//! Surface illumination queried by EVA tasks.

use std::f64::consts::PI;

use colonysim_logic::time::{MarsTime, MILLISOLS_PER_SOL};

use crate::components::Coordinates;

/// Solar conditions at a point on the surface.
pub trait SurfaceFeatures {
    /// Solar irradiance in W/m² at `coordinates` and `time`.
    fn solar_irradiance(&self, coordinates: Coordinates, time: MarsTime) -> f64;

    /// True where the sun does not rise for the season (polar night).
    fn in_dark_polar_region(&self, coordinates: Coordinates) -> bool;
}

/// Diurnal model: irradiance follows the cosine of the solar hour angle,
/// scaled by the cosine of latitude. Solar noon is at 500 millisols on the
/// prime meridian and shifts with longitude.
#[derive(Debug, Clone, Copy)]
pub struct MarsSurface {
    /// Peak irradiance at the surface under a clear sky.
    pub peak_irradiance: f64,
    /// Latitudes poleward of this are in polar night.
    pub polar_night_latitude: f64,
}

impl Default for MarsSurface {
    fn default() -> Self {
        Self {
            peak_irradiance: 590.0,
            polar_night_latitude: 80.0,
        }
    }
}

impl SurfaceFeatures for MarsSurface {
    fn solar_irradiance(&self, coordinates: Coordinates, time: MarsTime) -> f64 {
        if self.in_dark_polar_region(coordinates) {
            return 0.0;
        }
        let local = (time.millisol() + coordinates.longitude / 360.0 * MILLISOLS_PER_SOL)
            .rem_euclid(MILLISOLS_PER_SOL);
        let hour_angle = (local - MILLISOLS_PER_SOL / 2.0) / MILLISOLS_PER_SOL * 2.0 * PI;
        let latitude = coordinates.latitude.to_radians();
        (self.peak_irradiance * hour_angle.cos() * latitude.cos()).max(0.0)
    }

    fn in_dark_polar_region(&self, coordinates: Coordinates) -> bool {
        coordinates.latitude.abs() >= self.polar_night_latitude
    }
}

/// Constant illumination everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSurface {
    pub irradiance: f64,
    pub dark_polar: bool,
}

impl FixedSurface {
    pub fn daylight() -> Self {
        Self {
            irradiance: 500.0,
            dark_polar: false,
        }
    }

    pub fn night() -> Self {
        Self {
            irradiance: 0.0,
            dark_polar: false,
        }
    }
}

impl SurfaceFeatures for FixedSurface {
    fn solar_irradiance(&self, _coordinates: Coordinates, _time: MarsTime) -> f64 {
        self.irradiance
    }

    fn in_dark_polar_region(&self, _coordinates: Coordinates) -> bool {
        self.dark_polar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noon_and_midnight() {
        let surface = MarsSurface::default();
        let equator = Coordinates::new(0.0, 0.0);
        let noon = surface.solar_irradiance(equator, MarsTime::from_millisols(500.0));
        let midnight = surface.solar_irradiance(equator, MarsTime::from_millisols(0.0));
        assert!((noon - 590.0).abs() < 1e-6);
        assert_eq!(midnight, 0.0);
    }

    #[test]
    fn test_longitude_shifts_noon() {
        let surface = MarsSurface::default();
        // 90°E reaches local noon 250 millisols earlier
        let east = Coordinates::new(0.0, 90.0);
        let value = surface.solar_irradiance(east, MarsTime::from_millisols(250.0));
        assert!((value - 590.0).abs() < 1e-6);
    }

    #[test]
    fn test_polar_night() {
        let surface = MarsSurface::default();
        let pole = Coordinates::new(85.0, 0.0);
        assert!(surface.in_dark_polar_region(pole));
        assert_eq!(surface.solar_irradiance(pole, MarsTime::from_millisols(500.0)), 0.0);
    }
}
