use bevy_ecs::prelude::Component;
use rapier2d::math::{Real, Vector};
use rapier2d::na::Rotation2;

use crate::components::pose::Pose;

/// Rectangle geometry of a body, stored as half extents in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxShape {
    pub half_width: Real,
    pub half_height: Real,
}

impl BoxShape {
    /// Create a shape from its full width and height.
    pub fn new(width: Real, height: Real) -> Self {
        Self {
            half_width: width * 0.5,
            half_height: height * 0.5,
        }
    }

    pub fn width(&self) -> Real {
        self.half_width * 2.0
    }

    pub fn height(&self) -> Real {
        self.half_height * 2.0
    }

    /// World-space corners for the given pose, counter-clockwise starting at
    /// the local (-hw, -hh) corner.
    pub fn corners(&self, pose: &Pose) -> [Vector<Real>; 4] {
        let rot = Rotation2::new(pose.angle);
        let (hw, hh) = (self.half_width, self.half_height);
        [
            Vector::new(-hw, -hh),
            Vector::new(hw, -hh),
            Vector::new(hw, hh),
            Vector::new(-hw, hh),
        ]
        .map(|local| pose.position + rot * local)
    }
}
