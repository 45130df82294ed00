//! Geographic to screen projection for the map the markers sit on.
//!
//! A [`Viewport`] projects longitude/latitude into canvas pixels for its
//! current camera and lets observers learn when the camera moves.
//! [`MercatorViewport`] implements it with the Web Mercator projection used
//! by slippy-map tile servers.

use std::f64::consts::PI;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Edge length of one map tile at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude at which Web Mercator becomes a square world; points past it
/// are pinned to the edge.
pub const MAX_VALID_LATITUDE: f64 = 85.051129;

/// A position on the canvas, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// What the map shows: where it is centered, how far it is zoomed and how
/// large the canvas is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

/// Receives camera changes published by a [`Viewport`].
pub struct ViewportSubscription(watch::Receiver<Camera>);

impl ViewportSubscription {
    /// Returns `true` once per camera change since the last call.
    pub fn take_change(&mut self) -> bool {
        match self.0.has_changed() {
            Ok(true) => {
                let _ = self.0.borrow_and_update();
                true
            }
            _ => false,
        }
    }
}

pub trait Viewport {
    fn project(&self, lon: f64, lat: f64) -> ScreenPoint;
    fn subscribe(&self) -> ViewportSubscription;
}

/// Initial camera and zoom limits.
#[derive(Debug, Clone, Copy)]
pub struct MapOptions {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center_lon: -71.0756790,
            center_lat: 42.3616692,
            zoom: 12.0,
            min_zoom: 5.0,
            max_zoom: 18.0,
            width: 1024.0,
            height: 768.0,
        }
    }
}

pub struct MercatorViewport {
    camera: watch::Sender<Camera>,
    min_zoom: f64,
    max_zoom: f64,
}

impl MercatorViewport {
    pub fn new(options: MapOptions) -> Self {
        let camera = Camera {
            center_lon: options.center_lon,
            center_lat: options.center_lat,
            zoom: options.zoom.clamp(options.min_zoom, options.max_zoom),
            width: options.width,
            height: options.height,
        };
        let (camera, _) = watch::channel(camera);
        Self {
            camera,
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
        }
    }

    pub fn camera(&self) -> Camera {
        *self.camera.borrow()
    }

    pub fn pan_to(&self, lon: f64, lat: f64) {
        self.update(|c| {
            c.center_lon = lon;
            c.center_lat = lat;
        });
    }

    pub fn zoom_to(&self, zoom: f64) {
        let zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update(|c| c.zoom = zoom);
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.update(|c| {
            c.width = width;
            c.height = height;
        });
    }

    fn update(&self, change: impl FnOnce(&mut Camera)) {
        self.camera.send_modify(change);
        debug!(camera = ?self.camera(), "Viewport changed");
    }
}

/// World pixel coordinates of a point at `zoom`.
fn world_point(lon: f64, lat: f64, zoom: f64) -> ScreenPoint {
    let world_size = TILE_SIZE * 2f64.powf(zoom);
    let lat = lat.clamp(-MAX_VALID_LATITUDE, MAX_VALID_LATITUDE);
    let x = (180.0 + lon) / 360.0;
    let y = (180.0 - (180.0 / PI) * (PI / 4.0 + lat * PI / 360.0).tan().ln()) / 360.0;
    ScreenPoint {
        x: x * world_size,
        y: y * world_size,
    }
}

impl Viewport for MercatorViewport {
    fn project(&self, lon: f64, lat: f64) -> ScreenPoint {
        let camera = self.camera();
        let center = world_point(camera.center_lon, camera.center_lat, camera.zoom);
        let point = world_point(lon, lat, camera.zoom);
        ScreenPoint {
            x: point.x - center.x + camera.width / 2.0,
            y: point.y - center.y + camera.height / 2.0,
        }
    }

    fn subscribe(&self) -> ViewportSubscription {
        ViewportSubscription(self.camera.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_center_projects_to_canvas_center() {
        let viewport = MercatorViewport::new(MapOptions::default());
        let p = viewport.project(-71.0756790, 42.3616692);
        assert!(close(p.x, 512.0));
        assert!(close(p.y, 384.0));
    }

    #[test]
    fn test_east_is_right_and_north_is_up() {
        let viewport = MercatorViewport::new(MapOptions::default());
        let center = viewport.project(-71.0756790, 42.3616692);
        let east = viewport.project(-71.05, 42.3616692);
        let north = viewport.project(-71.0756790, 42.38);

        assert!(east.x > center.x);
        assert!(close(east.y, center.y));
        assert!(north.y < center.y);
    }

    #[test]
    fn test_world_point_at_zoom_zero() {
        let origin = world_point(0.0, 0.0, 0.0);
        assert!(close(origin.x, 256.0));
        assert!(close(origin.y, 256.0));
    }

    #[test]
    fn test_poles_project_to_world_edges() {
        let viewport = MercatorViewport::new(MapOptions::default());
        let south = viewport.project(-71.0, -90.0);
        let north = viewport.project(-71.0, 90.0);
        assert!(south.y.is_finite());
        assert!(north.y.is_finite());

        let world_size = TILE_SIZE * 2f64.powf(12.0);
        assert!((world_point(0.0, 90.0, 12.0).y).abs() < 0.1);
        assert!((world_point(0.0, -90.0, 12.0).y - world_size).abs() < 0.1);
        assert_eq!(
            viewport.project(-71.0, -90.0),
            viewport.project(-71.0, -MAX_VALID_LATITUDE)
        );
    }

    #[test]
    fn test_zoom_is_clamped() {
        let viewport = MercatorViewport::new(MapOptions::default());
        viewport.zoom_to(25.0);
        assert_eq!(viewport.camera().zoom, 18.0);
        viewport.zoom_to(1.0);
        assert_eq!(viewport.camera().zoom, 5.0);
    }

    #[test]
    fn test_subscription_sees_each_change_once() {
        let viewport = MercatorViewport::new(MapOptions::default());
        let mut subscription = viewport.subscribe();
        assert!(!subscription.take_change());

        viewport.pan_to(-71.1, 42.35);
        assert!(subscription.take_change());
        assert!(!subscription.take_change());

        viewport.resize(800.0, 600.0);
        viewport.zoom_to(14.0);
        assert!(subscription.take_change());
        assert!(!subscription.take_change());
    }

    #[test]
    fn test_zoom_doubles_distances() {
        let viewport = MercatorViewport::new(MapOptions::default());
        let center = viewport.project(-71.0756790, 42.3616692);
        let before = viewport.project(-71.05, 42.3616692).x - center.x;
        viewport.zoom_to(13.0);
        let after = viewport.project(-71.05, 42.3616692).x - center.x;
        assert!(close(after, before * 2.0));
    }
}
