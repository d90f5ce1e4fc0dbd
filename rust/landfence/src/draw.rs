//! # Draw Engine
//!
//! Turns a stream of map clicks into a finished parcel boundary.
//!
//! A [`DrawSession`] is either idle or drawing. While drawing, every click is
//! resolved in a fixed order:
//!
//! 1. **Double click** - a click within the double-click window of the
//!    previous one finishes the ring once 3 points are committed, wherever it
//!    lands.
//! 2. **Close on start** - a click within the pixel threshold of the first
//!    point finishes the ring. The closing click itself is not added.
//! 3. **Rectangle** - in rectangle mode the second click is the opposite
//!    corner; the four corners are synthesized and the ring finishes.
//! 4. Otherwise the click becomes the next vertex.
//!
//! Closing is measured in screen pixels through an injected [`Projection`] so
//! "close enough to the start marker" means the same thing at every zoom.
//!
//! The session is owned by one caller and returns [`DrawEvent`]s instead of
//! calling back into the UI.
//!
//! ## Example
//! ```
//! use std::time::{Duration, Instant};
//! use landfence::{DrawEvent, DrawSession, GeoPoint, ScreenPoint, ShapeMode};
//!
//! // 1 degree = 1 pixel, good enough for a sketch
//! let projection = |p: &GeoPoint| ScreenPoint::new(p.longitude, p.latitude);
//!
//! let mut session = DrawSession::new();
//! session.start(ShapeMode::Rectangle);
//!
//! let t0 = Instant::now();
//! let a = GeoPoint::new(31.50, 74.30);
//! let b = GeoPoint::new(31.51, 74.32);
//! session.click(a, ShapeMode::Rectangle, &projection, t0);
//! let event = session.click(b, ShapeMode::Rectangle, &projection, t0 + Duration::from_secs(1));
//!
//! match event {
//!     DrawEvent::Finished(ring) => assert_eq!(ring.len(), 4),
//!     other => panic!("unexpected {:?}", other),
//! }
//! assert!(!session.is_active());
//! ```

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{LandfenceError, Result};
use crate::field::MIN_RING_POINTS;
use crate::GeoPoint;

// ============================================================================
// Projection
// ============================================================================

/// A position on the map widget in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Maps geographic points to screen pixels (the map's `latLngToContainerPoint`).
pub trait Projection {
    fn project(&self, point: &GeoPoint) -> ScreenPoint;
}

impl<F> Projection for F
where
    F: Fn(&GeoPoint) -> ScreenPoint,
{
    fn project(&self, point: &GeoPoint) -> ScreenPoint {
        self(point)
    }
}

/// Tile size in pixels used by slippy maps.
const TILE_SIZE: f64 = 256.0;

/// Spherical Web Mercator projection at a (possibly fractional) zoom level.
///
/// `origin` is the world-pixel position of the container's top-left corner,
/// so projected points are relative to the visible map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
    pub origin: ScreenPoint,
}

impl WebMercator {
    pub fn new(zoom: f64, origin: ScreenPoint) -> Self {
        Self { zoom, origin }
    }

    /// Projection whose container is centered on `center` with the given size.
    pub fn centered_on(center: &GeoPoint, zoom: f64, width: f64, height: f64) -> Self {
        let world = Self::new(zoom, ScreenPoint::new(0.0, 0.0)).project(center);
        Self::new(
            zoom,
            ScreenPoint::new(world.x - width / 2.0, world.y - height / 2.0),
        )
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2.0_f64.powf(self.zoom)
    }
}

impl Projection for WebMercator {
    fn project(&self, point: &GeoPoint) -> ScreenPoint {
        let size = self.world_size();
        let lat_rad = point.latitude.to_radians();
        let x = (point.longitude + 180.0) / 360.0 * size;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
        ScreenPoint::new(x - self.origin.x, y - self.origin.y)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Click heuristics for the draw engine.
///
/// The defaults come from the field mapping UI and have not been tuned
/// against usability testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawConfig {
    /// Two clicks closer together than this finish the ring.
    /// Default: 350 ms
    pub double_click_window_ms: u64,

    /// A click within this many pixels of the first point closes the ring.
    /// Default: 25 px
    pub close_pixel_threshold: f64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            double_click_window_ms: 350,
            close_pixel_threshold: 25.0,
        }
    }
}

impl DrawConfig {
    /// Load a config from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.double_click_window_ms == 0 {
            return Err(LandfenceError::InvalidConfig {
                message: "double_click_window_ms must be positive".to_string(),
            });
        }
        if !self.close_pixel_threshold.is_finite() || self.close_pixel_threshold <= 0.0 {
            return Err(LandfenceError::InvalidConfig {
                message: format!(
                    "close_pixel_threshold must be positive, got {}",
                    self.close_pixel_threshold
                ),
            });
        }
        Ok(())
    }

    fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_window_ms)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Shape being drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMode {
    /// Any number of clicked vertices
    #[default]
    Polygon,
    /// Two clicks at opposite corners
    Rectangle,
}

/// Outcome of a draw operation, for the owner of the session to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    /// Still drawing; the click was committed as a vertex.
    Continue,
    /// A ring of at least 3 points was produced and the session is idle again.
    Finished(Vec<GeoPoint>),
    /// A finish was attempted with too few points; nothing was produced and
    /// the session is idle again.
    Discarded,
    /// Drawing was abandoned.
    Cancelled,
    /// No session is active; the click was not for us.
    Ignored,
}

/// Transient polygon drawing state.
#[derive(Debug, Clone, Default)]
pub struct DrawSession {
    points: Vec<GeoPoint>,
    active: bool,
    shape: ShapeMode,
    last_click: Option<Instant>,
    config: DrawConfig,
}

impl DrawSession {
    /// Create an idle session with default click heuristics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle session with custom click heuristics.
    pub fn with_config(config: DrawConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Begin drawing. Calling this while already drawing starts over.
    pub fn start(&mut self, shape: ShapeMode) {
        if self.active {
            debug!(
                "[DrawSession] Restarting, dropping {} points",
                self.points.len()
            );
        }
        self.points.clear();
        self.last_click = None;
        self.shape = shape;
        self.active = true;
    }

    /// Commit a vertex directly (e.g. from typed coordinates).
    ///
    /// Returns [`LandfenceError::NotDrawing`] when no session is active.
    pub fn add_point(&mut self, point: GeoPoint) -> Result<()> {
        if !self.active {
            return Err(LandfenceError::NotDrawing);
        }
        self.points.push(point);
        Ok(())
    }

    /// Remove the last committed vertex, if any.
    pub fn undo_point(&mut self) {
        self.points.pop();
    }

    /// Resolve a map click made at `at`.
    pub fn click<P: Projection + ?Sized>(
        &mut self,
        point: GeoPoint,
        shape: ShapeMode,
        projection: &P,
        at: Instant,
    ) -> DrawEvent {
        if !self.active {
            return DrawEvent::Ignored;
        }
        self.shape = shape;
        let previous = self.last_click.replace(at);
        let committed = self.points.len();

        if committed >= MIN_RING_POINTS {
            // Checked before proximity: the second click of a double click lands anywhere.
            if let Some(previous) = previous {
                if at.saturating_duration_since(previous) < self.config.double_click_window() {
                    debug!("[DrawSession] Double click, finishing with {} points", committed);
                    return self.finish_current();
                }
            }

            let click_px = projection.project(&point);
            let first_px = projection.project(&self.points[0]);
            if click_px.distance_to(&first_px) <= self.config.close_pixel_threshold {
                debug!("[DrawSession] Closed on first point with {} points", committed);
                return self.finish_current();
            }
        }

        if shape == ShapeMode::Rectangle && committed >= 1 {
            let ring = rectangle_from_corners(&self.points[0], &point);
            return self.finish(ring.to_vec());
        }

        self.points.push(point);
        DrawEvent::Continue
    }

    /// Finish with an explicit ring and return to idle.
    ///
    /// Rings with fewer than 3 points are discarded without error.
    pub fn finish(&mut self, ring: Vec<GeoPoint>) -> DrawEvent {
        self.reset();
        if ring.len() < MIN_RING_POINTS {
            debug!("[DrawSession] Discarding ring with {} points", ring.len());
            return DrawEvent::Discarded;
        }
        info!("[DrawSession] Finished ring with {} points", ring.len());
        DrawEvent::Finished(ring)
    }

    /// Finish with the committed points (the toolbar "done" action).
    pub fn finish_current(&mut self) -> DrawEvent {
        let ring = std::mem::take(&mut self.points);
        self.finish(ring)
    }

    /// Abandon drawing.
    pub fn cancel(&mut self) -> DrawEvent {
        debug!("[DrawSession] Cancelled with {} points", self.points.len());
        self.reset();
        DrawEvent::Cancelled
    }

    /// Committed vertices, for rendering in-progress markers and lines.
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn shape(&self) -> ShapeMode {
        self.shape
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    fn reset(&mut self) {
        self.points.clear();
        self.last_click = None;
        self.active = false;
    }
}

/// Four axis-aligned corners spanned by two diagonal points, counter-clockwise
/// from the south-west corner.
pub fn rectangle_from_corners(a: &GeoPoint, b: &GeoPoint) -> [GeoPoint; 4] {
    let min_lat = a.latitude.min(b.latitude);
    let max_lat = a.latitude.max(b.latitude);
    let min_lng = a.longitude.min(b.longitude);
    let max_lng = a.longitude.max(b.longitude);
    [
        GeoPoint::new(min_lat, min_lng),
        GeoPoint::new(min_lat, max_lng),
        GeoPoint::new(max_lat, max_lng),
        GeoPoint::new(max_lat, min_lng),
    ]
}
