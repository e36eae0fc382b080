// ── Map snapshot extent ──
//
// The frame a printed map is zoomed to: union of the selected features'
// extents, buffered and padded. Coordinates are in the query's output
// spatial reference (Web Mercator meters by default).

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Feature, Geometry};
use crate::selection::SelectedLocations;

/// Buffer added on every side, in map units.
pub const SNAPSHOT_BUFFER: f64 = 500.0;

/// Padding factor applied about the center after buffering.
pub const SNAPSHOT_EXPAND: f64 = 1.2;

const ACTION: &str = "map snapshot";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Bounding box of a geometry; `None` for empty or unknown shapes.
    pub fn of(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Point { x, y } => Some(Self {
                xmin: *x,
                ymin: *y,
                xmax: *x,
                ymax: *y,
            }),
            Geometry::Envelope {
                xmin,
                ymin,
                xmax,
                ymax,
            } => Some(Self {
                xmin: *xmin,
                ymin: *ymin,
                xmax: *xmax,
                ymax: *ymax,
            }),
            Geometry::Multipoint { points } => Self::of_coords(points.iter()),
            Geometry::Polyline { paths: parts } | Geometry::Polygon { rings: parts } => {
                Self::of_coords(parts.iter().flatten())
            }
            Geometry::Other(_) => None,
        }
    }

    fn of_coords<'a>(coords: impl Iterator<Item = &'a Vec<f64>>) -> Option<Self> {
        coords
            .filter_map(|c| match c.as_slice() {
                [x, y, ..] => Some(Self {
                    xmin: *x,
                    ymin: *y,
                    xmax: *x,
                    ymax: *y,
                }),
                _ => None,
            })
            .reduce(|a, b| a.union(&b))
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    #[must_use]
    pub fn buffer(&self, distance: f64) -> Self {
        Self {
            xmin: self.xmin - distance,
            ymin: self.ymin - distance,
            xmax: self.xmax + distance,
            ymax: self.ymax + distance,
        }
    }

    /// Scale width and height by `factor` about the center.
    #[must_use]
    pub fn expand(&self, factor: f64) -> Self {
        let (cx, cy) = self.center();
        let half_w = self.width() * factor / 2.0;
        let half_h = self.height() * factor / 2.0;
        Self {
            xmin: cx - half_w,
            ymin: cy - half_h,
            xmax: cx + half_w,
            ymax: cy + half_h,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }
}

/// Extent a map snapshot of the selected features should show.
pub fn snapshot_extent(selected: &SelectedLocations, features: &[Feature]) -> Result<Extent, CoreError> {
    if selected.is_empty() {
        return Err(CoreError::NoSelection {
            action: ACTION.into(),
        });
    }
    if features.is_empty() {
        return Err(CoreError::NoData {
            action: ACTION.into(),
        });
    }

    features
        .iter()
        .filter_map(|f| f.geometry.as_ref().and_then(Extent::of))
        .reduce(|a, b| a.union(&b))
        .map(|extent| extent.buffer(SNAPSHOT_BUFFER).expand(SNAPSHOT_EXPAND))
        .ok_or(CoreError::NoGeometry)
}
