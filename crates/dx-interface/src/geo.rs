//! Geographic discretization onto the store's regular lat/lon grid.
//!
//! The grid has 0.25 degree cells with its origin at (-60, -180), giving
//! 600 latitude rows and 1440 longitude columns.

use dx_common::{ArrayBox, DxError, DxResult};
use serde::{Deserialize, Serialize};

/// Cell size in degrees, both axes.
pub const RESOLUTION: f64 = 0.25;

pub const MIN_LAT: f64 = -60.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Points at or past this latitude are pulled back into the last row.
const LAT_EDGE: f64 = 89.875;
/// Points at or past this longitude are pulled back into the last column.
const LON_EDGE: f64 = 179.875;
const EDGE_NUDGE: f64 = 0.125;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Integer grid position of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub lat: i64,
    pub lon: i64,
}

/// Map a point to the grid cell containing it.
pub fn discretize(point: GeoPoint) -> DxResult<GridIndex> {
    let GeoPoint { mut lat, mut lon } = point;

    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(DxError::CoordinateOutOfRange(format!(
            "latitude {} outside [{}, {}]",
            lat, MIN_LAT, MAX_LAT
        )));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(DxError::CoordinateOutOfRange(format!(
            "longitude {} outside [{}, {}]",
            lon, MIN_LON, MAX_LON
        )));
    }

    if lat >= LAT_EDGE {
        lat -= EDGE_NUDGE;
    }
    if lon >= LON_EDGE {
        lon -= EDGE_NUDGE;
    }

    Ok(GridIndex {
        lat: ((lat - MIN_LAT) / RESOLUTION).floor() as i64,
        lon: ((lon - MIN_LON) / RESOLUTION).floor() as i64,
    })
}

/// A geographic box given by its lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lower: GeoPoint,
    pub upper: GeoPoint,
}

impl Default for GeoBounds {
    /// The whole grid.
    fn default() -> Self {
        Self {
            lower: GeoPoint::new(MIN_LAT, MIN_LON),
            upper: GeoPoint::new(MAX_LAT, MAX_LON),
        }
    }
}

impl GeoBounds {
    pub fn new(lower: impl Into<GeoPoint>, upper: impl Into<GeoPoint>) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    /// Discretize both corners, in (lower, upper) order.
    pub fn grid_corners(&self) -> DxResult<(GridIndex, GridIndex)> {
        let lb = discretize(self.lower)?;
        let ub = discretize(self.upper)?;
        if lb.lat > ub.lat || lb.lon > ub.lon {
            return Err(DxError::InvalidGeoBounds(format!(
                "lower corner ({}, {}) lies above upper corner ({}, {})",
                self.lower.lat, self.lower.lon, self.upper.lat, self.upper.lon
            )));
        }
        Ok((lb, ub))
    }

    /// The (lat, lon) index box covering these bounds.
    pub fn to_box(&self) -> DxResult<ArrayBox> {
        let (lb, ub) = self.grid_corners()?;
        ArrayBox::from_bounds(&[lb.lat, lb.lon], &[ub.lat, ub.lon])
    }
}

/// Latitudes and longitudes of the lower edge of each cell between two
/// corners, inclusive.
pub fn grid_axes(lb: GridIndex, ub: GridIndex) -> (Vec<f64>, Vec<f64>) {
    let lats = (lb.lat..=ub.lat)
        .map(|i| MIN_LAT + i as f64 * RESOLUTION)
        .collect();
    let lons = (lb.lon..=ub.lon)
        .map(|i| MIN_LON + i as f64 * RESOLUTION)
        .collect();
    (lats, lons)
}
