use bevy_ecs::prelude::Component;
use rapier2d::math::{Real, Vector};

/// Position (world pixels) and rotation (radians) of a body.
///
/// Written by the simulation loop after every step from the engine's state;
/// nothing else should modify it.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector<Real>,
    pub angle: Real,
}

impl Pose {
    pub fn new(x: Real, y: Real, angle: Real) -> Self {
        Self {
            position: Vector::new(x, y),
            angle,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.angle.is_finite()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}
