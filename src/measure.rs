use log::{debug, info};

use crate::permission::{GateView, Permission, PermissionGate, PermissionStatus};

/// Divisor from on-screen pixels to (approximate) millimetres.
pub const CALIBRATION_FACTOR: f64 = 3.0;

pub const TAP_PROMPT: &str = "Tap two points on the screen";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Computed in `f64`; `f32` error flips results sitting on a rounding edge.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn estimate_mm(a: &Point2D, b: &Point2D) -> f64 {
    round1(a.distance_to(b) / CALIBRATION_FACTOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TapState {
    #[default]
    Empty,
    OnePoint(Point2D),
    TwoPoints {
        first: Point2D,
        second: Point2D,
        distance_mm: f64,
    },
}

/// Two-tap distance estimator. Holds at most two points; a tap after a
/// finished pair starts a new one.
#[derive(Debug, Default)]
pub struct TapEstimator {
    state: TapState,
}

impl TapEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TapState {
        self.state
    }

    pub fn tap(&mut self, x: f32, y: f32) -> TapState {
        let point = Point2D::new(x, y);
        self.state = match self.state {
            TapState::Empty | TapState::TwoPoints { .. } => TapState::OnePoint(point),
            TapState::OnePoint(first) => {
                let distance_mm = estimate_mm(&first, &point);
                info!("estimated distance: {distance_mm:.1} mm");
                TapState::TwoPoints {
                    first,
                    second: point,
                    distance_mm,
                }
            }
        };
        debug!("tap ({x}, {y}) -> {:?}", self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = TapState::Empty;
    }

    pub fn points(&self) -> Vec<Point2D> {
        match self.state {
            TapState::Empty => vec![],
            TapState::OnePoint(p) => vec![p],
            TapState::TwoPoints { first, second, .. } => vec![first, second],
        }
    }

    pub fn distance_mm(&self) -> Option<f64> {
        match self.state {
            TapState::TwoPoints { distance_mm, .. } => Some(distance_mm),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self.distance_mm() {
            Some(d) => format!("Estimated distance: {d:.1} mm"),
            None => TAP_PROMPT.to_string(),
        }
    }
}

/// Touch-measure screen: the camera gate in front of the estimator.
pub struct MeasureScreen {
    gate: PermissionGate,
    estimator: TapEstimator,
}

impl MeasureScreen {
    pub fn new(gate: PermissionGate) -> Self {
        debug_assert_eq!(gate.permission(), Permission::Camera);
        Self {
            gate,
            estimator: TapEstimator::new(),
        }
    }

    pub fn gate_mut(&mut self) -> &mut PermissionGate {
        &mut self.gate
    }

    pub fn view(&self) -> GateView {
        self.gate.view()
    }

    /// The measure surface only exists once camera access is granted.
    pub fn surface_mounted(&self) -> bool {
        self.gate.status() == PermissionStatus::Granted
    }

    pub fn tap(&mut self, x: f32, y: f32) -> Option<TapState> {
        if !self.surface_mounted() {
            debug!("tap ignored, camera gate is {:?}", self.gate.status());
            return None;
        }
        Some(self.estimator.tap(x, y))
    }

    pub fn reset(&mut self) {
        self.estimator.reset();
    }

    pub fn estimator(&self) -> &TapEstimator {
        &self.estimator
    }
}
