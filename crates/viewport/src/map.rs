use std::cell::RefCell;

use foundation::bounds::{GeoBounds, LngLat};
use serde::{Deserialize, Serialize};

/// Camera animation parameters for selection-driven flights.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyToParams {
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub speed: f64,
    pub curve: f64,
}

impl Default for FlyToParams {
    fn default() -> Self {
        Self {
            zoom: 12.0,
            pitch: 50.0,
            bearing: 0.0,
            speed: 1.5,
            curve: 1.8,
        }
    }
}

/// One camera command.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlyTo {
    pub center: LngLat,
    pub params: FlyToParams,
}

/// The map/rendering collaborator.
///
/// Handles are shared with the UI, so methods take `&self`; implementations
/// use interior mutability for camera state.
pub trait MapView {
    /// Visible rectangle, or `None` before the map has a size.
    fn current_bounds(&self) -> Option<GeoBounds>;
    fn current_zoom(&self) -> f64;
    fn fly_to(&self, command: FlyTo);
}

/// In-memory map that records camera commands.
///
/// A flight moves the recorded camera immediately: center and zoom change,
/// and the visible rectangle is recomputed around the new center.
#[derive(Debug)]
pub struct RecordingMap {
    camera: RefCell<Camera>,
    flights: RefCell<Vec<FlyTo>>,
}

#[derive(Debug, Copy, Clone)]
struct Camera {
    bounds: Option<GeoBounds>,
    zoom: f64,
}

impl RecordingMap {
    pub fn new(bounds: Option<GeoBounds>, zoom: f64) -> Self {
        Self {
            camera: RefCell::new(Camera { bounds, zoom }),
            flights: RefCell::new(Vec::new()),
        }
    }

    /// Simulates the user panning or zooming.
    pub fn set_view(&self, bounds: Option<GeoBounds>, zoom: f64) {
        *self.camera.borrow_mut() = Camera { bounds, zoom };
    }

    pub fn flights(&self) -> Vec<FlyTo> {
        self.flights.borrow().clone()
    }
}

impl MapView for RecordingMap {
    fn current_bounds(&self) -> Option<GeoBounds> {
        self.camera.borrow().bounds
    }

    fn current_zoom(&self) -> f64 {
        self.camera.borrow().zoom
    }

    fn fly_to(&self, command: FlyTo) {
        // Half-extent of the view in degrees halves with every zoom level.
        let half = 180.0 / 2f64.powf(command.params.zoom);
        let c = command.center;
        *self.camera.borrow_mut() = Camera {
            bounds: Some(GeoBounds::new(c.lat + half, c.lat - half, c.lon + half, c.lon - half)),
            zoom: command.params.zoom,
        };
        self.flights.borrow_mut().push(command);
    }
}
