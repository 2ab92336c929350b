use std::sync::Arc;

use bevy::log::debug;
use bevy::math::{EulerRot, Quat, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::camera::CameraProvider;
use crate::error::{Result, SimulationError};
use crate::input::{KeyInput, SimulationInput};
use crate::types::{Handedness, Pose, TrackingState};

use super::{
    blend::{BlendPhase, BlendState, PoseState},
    pose_library::{PoseDefinition, PoseLibrary},
    HandData, HAND_JOINT_COUNT,
};

/// Closest the hand may be pushed towards the camera with the depth keys.
const MIN_HAND_DISTANCE: f32 = 0.05;

/// Where the simulated hand root is and how it is turned.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandRootState {
    pub screen_position: Vec3,
    /// Euler degrees, applied yaw (y) then pitch (x) then roll (z). Cumulative until reset.
    pub rotation_euler: Vec3,
    /// Random offset added in screen space, resampled every tick.
    pub jitter_offset: Vec3,
    /// Distance the depth keys moved the hand along the camera's forward axis.
    pub depth_offset: f32,
}

/// Turns pointer and keyboard input into posed hand data for one hand.
pub struct SimulatedHandDataConverter {
    handedness: Handedness,
    library: Arc<PoseLibrary>,
    animation_speed: f32,
    jitter_amount: f32,
    default_distance: f32,
    initial_pose_id: String,
    blend: BlendState,
    root: HandRootState,
    rng: StdRng,
    #[cfg(test)]
    resets: usize,
}

impl SimulatedHandDataConverter {
    pub fn new(
        handedness: Handedness,
        library: Arc<PoseLibrary>,
        animation_speed: f32,
        jitter_amount: f32,
        default_distance: f32,
    ) -> Result<Self> {
        Self::with_rng(
            handedness,
            library,
            animation_speed,
            jitter_amount,
            default_distance,
            StdRng::from_entropy(),
        )
    }

    /// Same as [`Self::new`] with a fixed jitter sequence.
    pub fn with_seed(
        handedness: Handedness,
        library: Arc<PoseLibrary>,
        animation_speed: f32,
        jitter_amount: f32,
        default_distance: f32,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            handedness,
            library,
            animation_speed,
            jitter_amount,
            default_distance,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        handedness: Handedness,
        library: Arc<PoseLibrary>,
        animation_speed: f32,
        jitter_amount: f32,
        default_distance: f32,
        rng: StdRng,
    ) -> Result<Self> {
        if library.is_empty() {
            return Err(SimulationError::Configuration(
                "there is no default simulated hand pose defined".into(),
            ));
        }
        let initial_pose_id = library.default_pose().id.clone();
        let blend = BlendState::settled(library.default_pose());
        let mut converter = Self {
            handedness,
            initial_pose_id,
            blend,
            library,
            animation_speed,
            jitter_amount,
            default_distance,
            root: HandRootState::default(),
            rng,
            #[cfg(test)]
            resets: 0,
        };
        converter.reset_converter();
        Ok(converter)
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn root_state(&self) -> &HandRootState {
        &self.root
    }

    pub fn blend_state(&self) -> &BlendState {
        &self.blend
    }

    /// The currently shown, possibly half blended, pose.
    pub fn pose(&self) -> &PoseState {
        &self.blend.current
    }

    pub fn phase(&self) -> BlendPhase {
        self.blend.phase(&self.initial_pose_id)
    }

    /// Advances the simulation by one tick.
    ///
    /// `position` is the pointer position in screen pixels with the depth key movement of this
    /// tick in `z`. `delta_rotation` is the yaw/pitch/roll change of this tick in Euler degrees.
    pub fn get_simulated_hand_data(
        &mut self,
        position: Vec3,
        delta_rotation: Vec3,
        input: &SimulationInput,
    ) -> HandData {
        let pose_animation_delta = self.animation_speed * input.clock.delta_seconds();
        let timestamp = input.clock.elapsed();

        let library = Arc::clone(&self.library);
        let new_target = select_target_pose(&library, input.keys);

        self.handle_simulation_input(position, delta_rotation, input.camera);

        if self.blend.advance(new_target, pose_animation_delta) {
            debug!("{:?} hand blending to '{}'", self.handedness, new_target.id);
        }

        let mut hand_data = self.update_pose_frame(input.camera);
        hand_data.updated_at = timestamp;
        hand_data.tracking_state = TrackingState::Tracked;
        hand_data
    }

    fn handle_simulation_input(
        &mut self,
        position: Vec3,
        delta_rotation: Vec3,
        camera: &dyn CameraProvider,
    ) {
        self.root.depth_offset =
            (self.root.depth_offset + position.z).max(MIN_HAND_DISTANCE - self.default_distance);

        // x / y are applied in screen space, depth along the camera's forward axis in world space
        let screen = Vec3::new(position.x, position.y, self.default_distance);
        let world =
            camera.screen_to_world(screen) + camera.camera_forward() * self.root.depth_offset;
        self.root.screen_position = camera.world_to_screen(world).unwrap_or(Vec3::new(
            screen.x,
            screen.y,
            self.default_distance + self.root.depth_offset,
        ));

        self.root.rotation_euler = wrap_degrees(self.root.rotation_euler + delta_rotation);
        self.root.jitter_offset = self.sample_jitter();
    }

    fn update_pose_frame(&self, camera: &dyn CameraProvider) -> HandData {
        let euler = self.root.rotation_euler;
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            euler.y.to_radians(),
            euler.x.to_radians(),
            euler.z.to_radians(),
        );
        let position = camera.screen_to_world(self.root.screen_position + self.root.jitter_offset);

        // the root pose is known in world space, move it into the camera rig's local space
        let rig = camera.rig_transform();
        let position = rig.compute_affine().inverse().transform_point3(position);
        // NOTE: this reduces to `rotation`, the rig orientation is not removed yet
        let rotation = rig.rotation.inverse() * rig.rotation * rotation;

        let joint_poses = compute_joint_poses(
            &self.blend.current,
            self.handedness,
            camera.camera_rotation(),
        );
        HandData::new(Pose::new(position, rotation), joint_poses)
    }

    fn sample_jitter(&mut self) -> Vec3 {
        if self.jitter_amount <= 0.0 {
            return Vec3::ZERO;
        }
        loop {
            let candidate = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            if candidate.length_squared() <= 1.0 {
                return candidate * self.jitter_amount;
            }
        }
    }

    /// Puts the hand back at the screen origin, unrotated and resting in the initial pose.
    pub fn reset_converter(&mut self) {
        #[cfg(test)]
        {
            self.resets += 1;
        }
        self.root = HandRootState::default();
        match self.library.try_get_by_name(&self.initial_pose_id) {
            Some(initial) => self.blend = BlendState::settled(initial),
            None => debug!(
                "initial hand pose '{}' is no longer registered",
                self.initial_pose_id
            ),
        }
    }

    /// Times [`Self::reset_converter`] ran, construction included.
    #[cfg(test)]
    pub(crate) fn reset_count(&self) -> usize {
        self.resets
    }
}

/// First pose in declaration order whose key is held, the default pose otherwise.
pub fn select_target_pose<'a>(library: &'a PoseLibrary, keys: &dyn KeyInput) -> &'a PoseDefinition {
    library
        .poses()
        .iter()
        .find(|pose| pose.key_binding.is_some_and(|key| keys.pressed(key)))
        .unwrap_or_else(|| library.default_pose())
}

/// Pose offsets are authored for the right hand, the left hand gets them mirrored.
pub fn compute_joint_poses(
    pose: &PoseState,
    handedness: Handedness,
    camera_rotation: Quat,
) -> [Pose; HAND_JOINT_COUNT] {
    let mut joint_poses = [Pose::IDENTITY; HAND_JOINT_COUNT];
    for (out, local) in joint_poses.iter_mut().zip(pose.local_joint_poses.iter()) {
        let local = match handedness {
            Handedness::Left => local.mirrored(),
            Handedness::Right => *local,
        };
        *out = Pose::new(camera_rotation * local.position, camera_rotation * local.rotation);
    }
    joint_poses
}

fn wrap_degrees(euler: Vec3) -> Vec3 {
    Vec3::new(
        euler.x.rem_euclid(360.0),
        euler.y.rem_euclid(360.0),
        euler.z.rem_euclid(360.0),
    )
}
