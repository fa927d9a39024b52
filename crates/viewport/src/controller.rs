use std::time::Duration;

use filters::selection::SelectionCoordinator;
use foundation::bounds::{GeoBounds, LngLat};
use foundation::ids::EventId;
use foundation::time::Millis;
use runtime::debounce::{Debouncer, TimerId};
use tracing::debug;

use crate::map::{FlyTo, FlyToParams, MapView};

pub const VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const MIN_BBOX_ZOOM: f64 = 3.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportSettings {
    pub debounce: Duration,
    /// Below this zoom the visible rectangle is not used as a filter.
    pub min_zoom: f64,
    pub fly: FlyToParams,
    pub camera_sync: bool,
    pub bbox_sync: bool,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            debounce: VIEWPORT_DEBOUNCE,
            min_zoom: MIN_BBOX_ZOOM,
            fly: FlyToParams::default(),
            camera_sync: true,
            bbox_sync: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    PendingRecalc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClearReason {
    LowZoom,
    FullWrap,
    /// Bounds missing or containing non-finite numbers.
    NoBounds,
    SyncDisabled,
}

/// What a settled viewport means for `FilterState.bbox`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BboxDecision {
    Clear(ClearReason),
    Set(GeoBounds),
}

impl BboxDecision {
    pub fn bbox(self) -> Option<GeoBounds> {
        match self {
            BboxDecision::Clear(_) => None,
            BboxDecision::Set(b) => Some(b),
        }
    }
}

/// Result of a selection change as seen by the camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlyOutcome {
    Flew,
    /// A manual fly already targets this event; the suppression slot was consumed.
    Suppressed,
    CameraSyncDisabled,
    NoSelection,
    /// The selected event has no known position in the current results.
    NoTarget,
}

/// Keeps the map viewport and the bbox filter in step without feedback loops.
///
/// Viewport events arm a debounce timer (`PendingRecalc`); when the last
/// timer of a burst fires the controller reads zoom and bounds from the map
/// and produces a [`BboxDecision`]. Selection changes fly the camera at
/// most once: a manual fly arms the selection's suppression slot with its
/// target id and the automatic fly consumes it instead of flying again.
#[derive(Debug, Clone)]
pub struct ViewportSyncController {
    timer: Debouncer,
    min_zoom: f64,
    fly: FlyToParams,
    camera_sync: bool,
    bbox_sync: bool,
}

impl Default for ViewportSyncController {
    fn default() -> Self {
        Self::new(ViewportSettings::default())
    }
}

impl ViewportSyncController {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            timer: Debouncer::new(settings.debounce),
            min_zoom: settings.min_zoom,
            fly: settings.fly,
            camera_sync: settings.camera_sync,
            bbox_sync: settings.bbox_sync,
        }
    }

    pub fn state(&self) -> SyncState {
        if self.timer.is_armed() {
            SyncState::PendingRecalc
        } else {
            SyncState::Idle
        }
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    pub fn debounce(&self) -> Duration {
        self.timer.delay()
    }

    pub fn camera_sync(&self) -> bool {
        self.camera_sync
    }

    pub fn bbox_sync(&self) -> bool {
        self.bbox_sync
    }

    /// Raw viewport-changed event. Re-arms the debounce timer and returns the
    /// id a waiter must present to [`Self::fire`]; `None` while bbox sync is off.
    pub fn on_viewport_changed(&mut self, now: Millis) -> Option<TimerId> {
        if !self.bbox_sync {
            return None;
        }
        let id = self.timer.schedule(now);
        debug!(timer = id.0, "viewport recalc armed");
        Some(id)
    }

    /// Fires timer `id` if it is still the armed one and due.
    pub fn fire(&mut self, id: TimerId, now: Millis, map: &dyn MapView) -> Option<BboxDecision> {
        if !self.timer.fire(id, now) {
            return None;
        }
        Some(self.recalc(map))
    }

    /// Fires whatever timer is armed once its deadline has passed.
    pub fn poll(&mut self, now: Millis, map: &dyn MapView) -> Option<BboxDecision> {
        self.timer.fire_if_due(now)?;
        Some(self.recalc(map))
    }

    fn recalc(&self, map: &dyn MapView) -> BboxDecision {
        let decision = self.decide(map.current_zoom(), map.current_bounds());
        debug!(?decision, "viewport settled");
        decision
    }

    /// Pure bbox rule for a settled viewport.
    pub fn decide(&self, zoom: f64, bounds: Option<GeoBounds>) -> BboxDecision {
        // NaN zoom fails this test too and clears.
        if !(zoom >= self.min_zoom) {
            return BboxDecision::Clear(ClearReason::LowZoom);
        }
        match bounds {
            Some(b) if !b.is_finite() => BboxDecision::Clear(ClearReason::NoBounds),
            Some(b) if b.is_full_wrap() => BboxDecision::Clear(ClearReason::FullWrap),
            Some(b) => BboxDecision::Set(b),
            None => BboxDecision::Clear(ClearReason::NoBounds),
        }
    }

    pub fn set_camera_sync(&mut self, enabled: bool) {
        self.camera_sync = enabled;
    }

    /// Disabling cancels a pending recalculation and clears the bbox.
    pub fn set_bbox_sync(&mut self, enabled: bool) -> Option<BboxDecision> {
        if self.bbox_sync == enabled {
            return None;
        }
        self.bbox_sync = enabled;
        if enabled {
            return None;
        }
        self.timer.cancel();
        Some(BboxDecision::Clear(ClearReason::SyncDisabled))
    }

    /// Cancels any pending recalculation, e.g. when filters are cleared.
    pub fn cancel_pending(&mut self) -> Option<TimerId> {
        self.timer.cancel()
    }

    /// Automatic camera follow after the selection changed.
    ///
    /// `target` is the selected event's position in the published results.
    pub fn on_selection_changed(
        &mut self,
        selection: &mut SelectionCoordinator,
        target: Option<LngLat>,
        map: &dyn MapView,
    ) -> FlyOutcome {
        let Some(id) = selection.selected().cloned() else {
            return FlyOutcome::NoSelection;
        };
        if selection.take_suppression_for(&id) {
            debug!(%id, "fly suppressed; manual flight in progress");
            return FlyOutcome::Suppressed;
        }
        if !self.camera_sync {
            return FlyOutcome::CameraSyncDisabled;
        }
        let Some(center) = target else {
            return FlyOutcome::NoTarget;
        };
        self.fly_camera(map, center);
        FlyOutcome::Flew
    }

    /// Manual "fly to source/target": selects `id` and flies to `anchor`.
    ///
    /// Returns `true` if the selection changed. The suppression slot is armed
    /// only when it will be consumed by that selection change, so it never
    /// lingers for an event that was already selected.
    pub fn fly_to_anchor(
        &mut self,
        selection: &mut SelectionCoordinator,
        id: EventId,
        anchor: LngLat,
        map: &dyn MapView,
    ) -> bool {
        let changed = if selection.selected() == Some(&id) {
            false
        } else {
            selection.arm_suppression(id.clone());
            selection.select(Some(id))
        };
        if changed {
            self.on_selection_changed(selection, Some(anchor), map);
        }
        self.fly_camera(map, anchor);
        changed
    }

    fn fly_camera(&self, map: &dyn MapView, center: LngLat) {
        debug!(lon = center.lon, lat = center.lat, "fly to");
        map.fly_to(FlyTo {
            center,
            params: self.fly,
        });
    }
}
