use bevy::math::{Quat, Vec3};
use bevy::prelude::{Component, Transform};

/// Position and orientation without scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Reflects the pose across the YZ plane, turning right hand data into left hand data.
    ///
    /// Only the quaternion's y and z components are negated, which is the reflection of a
    /// rotation across that plane, not its conjugate. Applying it twice yields the input.
    pub fn mirrored(&self) -> Self {
        Self {
            position: Vec3::new(-self.position.x, self.position.y, self.position.z),
            rotation: Quat::from_xyzw(
                self.rotation.x,
                -self.rotation.y,
                -self.rotation.z,
                self.rotation.w,
            ),
        }
    }

    pub fn lerp(&self, to: &Pose, t: f32) -> Self {
        Self {
            position: self.position.lerp(to.position, t),
            rotation: self.rotation.slerp(to.rotation, t),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Pose> for Transform {
    fn from(pose: Pose) -> Self {
        Transform::from_translation(pose.position).with_rotation(pose.rotation)
    }
}

impl From<Transform> for Pose {
    fn from(transform: Transform) -> Self {
        Self::new(transform.translation, transform.rotation)
    }
}

#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Component)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub const BOTH: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub const fn index(&self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Tracked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_is_an_involution() {
        let pose = Pose::new(
            Vec3::new(0.03, -0.01, 0.07),
            Quat::from_euler(bevy::math::EulerRot::YXZ, 0.4, -0.2, 1.1),
        );
        let twice = pose.mirrored().mirrored();
        assert_eq!(twice, pose);
    }

    #[test]
    fn mirror_flips_lateral_axis_only() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_xyzw(0.1, 0.2, 0.3, 0.9));
        let mirrored = pose.mirrored();
        assert_eq!(mirrored.position, Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(mirrored.rotation, Quat::from_xyzw(0.1, -0.2, -0.3, 0.9));
    }

    #[test]
    fn lerp_endpoints() {
        let from = Pose::IDENTITY;
        let to = Pose::new(Vec3::X, Quat::from_rotation_y(1.0));
        assert_eq!(from.lerp(&to, 0.0).position, from.position);
        assert!(from.lerp(&to, 1.0).position.abs_diff_eq(to.position, 1e-6));
        assert!(from.lerp(&to, 1.0).rotation.abs_diff_eq(to.rotation, 1e-6));
    }
}
