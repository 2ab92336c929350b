use bevy::math::{Quat, Vec2, Vec3};
use bevy::prelude::{Component, Transform};

/// The active camera's projection and the rig it is mounted on.
///
/// Screen positions are `(x, y)` in logical pixels from the top left corner plus `z`, the
/// distance in front of the camera along its forward axis.
pub trait CameraProvider {
    fn screen_to_world(&self, screen: Vec3) -> Vec3;
    /// `None` if the point is not in front of the camera.
    fn world_to_screen(&self, world: Vec3) -> Option<Vec3>;
    fn camera_transform(&self) -> Transform;
    fn rig_transform(&self) -> Transform;

    fn camera_rotation(&self) -> Quat {
        self.camera_transform().rotation
    }

    fn camera_forward(&self) -> Vec3 {
        self.camera_rotation() * Vec3::NEG_Z
    }
}

/// Marks the camera whose viewport the simulated hands are projected through.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HandSimulationCamera;

/// Marks the rig entity hand root poses are expressed relative to.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HandSimulationRig;

/// Pinhole perspective camera snapshot, taken once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationCamera {
    /// World transform of the camera. Scale is ignored.
    pub transform: Transform,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub viewport_size: Vec2,
    pub rig: Transform,
}

impl SimulationCamera {
    /// False while the viewport has no area, e.g. for a minimized window. Projecting through
    /// such a camera yields NaN.
    pub fn has_viewport(&self) -> bool {
        self.viewport_size.x > 0.0 && self.viewport_size.y > 0.0
    }

    fn half_extents(&self) -> Vec2 {
        let tan = (self.fov * 0.5).tan();
        let aspect = self.viewport_size.x / self.viewport_size.y;
        Vec2::new(tan * aspect, tan)
    }

    fn pose_only(&self) -> Transform {
        Transform::from_translation(self.transform.translation)
            .with_rotation(self.transform.rotation)
    }
}

impl CameraProvider for SimulationCamera {
    fn screen_to_world(&self, screen: Vec3) -> Vec3 {
        let ndc = Vec2::new(
            2.0 * screen.x / self.viewport_size.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport_size.y,
        );
        let extents = self.half_extents() * ndc * screen.z;
        self.pose_only()
            .transform_point(Vec3::new(extents.x, extents.y, -screen.z))
    }

    fn world_to_screen(&self, world: Vec3) -> Option<Vec3> {
        let local = self.pose_only().compute_affine().inverse().transform_point3(world);
        let depth = -local.z;
        if depth <= f32::EPSILON {
            return None;
        }
        let ndc = Vec2::new(local.x, local.y) / (self.half_extents() * depth);
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport_size.x,
            (1.0 - ndc.y) * 0.5 * self.viewport_size.y,
            depth,
        ))
    }

    fn camera_transform(&self) -> Transform {
        self.transform
    }

    fn rig_transform(&self) -> Transform {
        self.rig
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn camera() -> SimulationCamera {
        SimulationCamera {
            transform: Transform::from_xyz(1.0, 1.5, 2.0)
                .with_rotation(Quat::from_rotation_y(0.3)),
            fov: FRAC_PI_2,
            viewport_size: Vec2::new(800.0, 600.0),
            rig: Transform::IDENTITY,
        }
    }

    #[test]
    fn viewport_center_lies_on_forward_axis() {
        let camera = camera();
        let world = camera.screen_to_world(Vec3::new(400.0, 300.0, 2.0));
        let expected = camera.transform.translation + camera.camera_forward() * 2.0;
        assert!(world.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn projection_round_trips() {
        let camera = camera();
        let screen = Vec3::new(120.0, 455.0, 0.7);
        let back = camera
            .world_to_screen(camera.screen_to_world(screen))
            .unwrap();
        assert!(back.abs_diff_eq(screen, 1e-3));
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        let camera = camera();
        let behind = camera.transform.translation - camera.camera_forward();
        assert!(camera.world_to_screen(behind).is_none());
    }

    #[test]
    fn top_of_screen_is_up() {
        let camera = SimulationCamera {
            transform: Transform::IDENTITY,
            ..camera()
        };
        let top = camera.screen_to_world(Vec3::new(400.0, 0.0, 1.0));
        assert!(top.y > 0.0);
        assert!((top.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn minimized_viewport_is_unusable() {
        assert!(camera().has_viewport());
        for viewport_size in [Vec2::ZERO, Vec2::new(800.0, 0.0), Vec2::new(-1.0, 600.0)] {
            let camera = SimulationCamera {
                viewport_size,
                ..camera()
            };
            assert!(!camera.has_viewport());
        }
    }
}
