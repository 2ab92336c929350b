use std::time::Duration;

use bevy::input::keyboard::KeyCode;
use bevy::prelude::Resource;

use crate::controllers::ControllerMappingProfile;
use crate::error::{Result, SimulationError};
use crate::hands::{hand_poses::builtin_poses, pose_library::PoseDefinition};
use crate::types::Handedness;

/// System wide hand controller defaults, shared by every hand controller module.
#[derive(Resource, Debug, Clone)]
pub struct HandControllerSettings {
    pub tracked_poses: Vec<PoseDefinition>,
    /// Grip strength at or above which a hand counts as gripping, within `[0.5, 1]`.
    pub grip_threshold: f32,
    /// Pose blend progress per second.
    pub animation_speed: f32,
}

impl Default for HandControllerSettings {
    fn default() -> Self {
        Self {
            tracked_poses: builtin_poses(),
            grip_threshold: 0.8,
            animation_speed: 8.0,
        }
    }
}

/// Per instance settings of the simulated hand controller module.
///
/// The `Option` fields override their [`HandControllerSettings`] counterpart when set.
#[derive(Resource, Debug, Clone)]
pub struct SimulatedHandControllerProfile {
    /// Minimum time between two key scans deciding attach and detach, in milliseconds.
    pub simulated_update_frequency: f64,
    /// Distance of the hand in front of the camera, in meters.
    pub default_distance: f32,
    /// Depth key movement per second, in meters.
    pub depth_multiplier: f32,
    /// Radius of the per tick positional noise, sampled in screen space. The same radius is
    /// read as pixels on x and y but as meters on depth.
    pub jitter_amount: f32,
    /// Degrees per second while a rotation key is held.
    pub rotation_speed: f32,
    pub toggle_left_persistent_key: KeyCode,
    pub left_controller_tracked_key: KeyCode,
    pub toggle_right_persistent_key: KeyCode,
    pub right_controller_tracked_key: KeyCode,
    pub left_controller_mapping: Option<ControllerMappingProfile>,
    pub right_controller_mapping: Option<ControllerMappingProfile>,
    pub hand_pose_animation_speed: Option<f32>,
    pub grip_threshold: Option<f32>,
    pub tracked_poses: Option<Vec<PoseDefinition>>,
}

impl Default for SimulatedHandControllerProfile {
    fn default() -> Self {
        Self {
            simulated_update_frequency: 0.0,
            default_distance: 0.5,
            depth_multiplier: 0.1,
            jitter_amount: 0.0,
            rotation_speed: 90.0,
            toggle_left_persistent_key: KeyCode::KeyT,
            left_controller_tracked_key: KeyCode::ShiftLeft,
            toggle_right_persistent_key: KeyCode::KeyY,
            right_controller_tracked_key: KeyCode::Space,
            left_controller_mapping: Some(ControllerMappingProfile::default()),
            right_controller_mapping: Some(ControllerMappingProfile::default()),
            hand_pose_animation_speed: None,
            grip_threshold: None,
            tracked_poses: None,
        }
    }
}

impl SimulatedHandControllerProfile {
    /// Merges this profile with the system defaults and validates the outcome.
    pub fn resolve(
        &self,
        settings: &HandControllerSettings,
    ) -> Result<ResolvedHandSimulationConfig> {
        let animation_speed = self
            .hand_pose_animation_speed
            .unwrap_or(settings.animation_speed);
        let grip_threshold = self.grip_threshold.unwrap_or(settings.grip_threshold);
        let tracked_poses = match &self.tracked_poses {
            Some(poses) if !poses.is_empty() => poses.clone(),
            _ => settings.tracked_poses.clone(),
        };

        if tracked_poses.is_empty() {
            return Err(config_error("no tracked hand poses are configured"));
        }
        if !animation_speed.is_finite() || animation_speed <= 0.0 {
            return Err(config_error(format!(
                "hand pose animation speed must be positive, got {animation_speed}"
            )));
        }
        if !(0.5..=1.0).contains(&grip_threshold) {
            return Err(config_error(format!(
                "grip threshold must be within [0.5, 1], got {grip_threshold}"
            )));
        }
        if self.jitter_amount.is_nan() || self.jitter_amount < 0.0 {
            return Err(config_error("jitter amount must not be negative"));
        }
        if self.default_distance.is_nan() || self.default_distance < 0.0 {
            return Err(config_error("default distance must not be negative"));
        }
        if !self.simulated_update_frequency.is_finite() || self.simulated_update_frequency < 0.0 {
            return Err(config_error(
                "simulated update frequency must be a non negative number of milliseconds",
            ));
        }

        let update_period = Duration::try_from_secs_f64(self.simulated_update_frequency / 1000.0)
            .map_err(|e| config_error(format!("simulated update frequency out of range: {e}")))?;

        Ok(ResolvedHandSimulationConfig {
            update_period,
            default_distance: self.default_distance,
            depth_multiplier: self.depth_multiplier,
            jitter_amount: self.jitter_amount,
            rotation_speed: self.rotation_speed,
            animation_speed,
            grip_threshold,
            tracked_poses,
            toggle_keys: [
                self.toggle_left_persistent_key,
                self.toggle_right_persistent_key,
            ],
            track_keys: [
                self.left_controller_tracked_key,
                self.right_controller_tracked_key,
            ],
            controller_mappings: [
                self.left_controller_mapping.clone(),
                self.right_controller_mapping.clone(),
            ],
        })
    }
}

fn config_error(reason: impl Into<String>) -> SimulationError {
    SimulationError::Configuration(reason.into())
}

/// Validated settings, fixed for the lifetime of a module.
#[derive(Debug, Clone)]
pub struct ResolvedHandSimulationConfig {
    pub update_period: Duration,
    pub default_distance: f32,
    pub depth_multiplier: f32,
    pub jitter_amount: f32,
    pub rotation_speed: f32,
    pub animation_speed: f32,
    pub grip_threshold: f32,
    pub tracked_poses: Vec<PoseDefinition>,
    toggle_keys: [KeyCode; 2],
    track_keys: [KeyCode; 2],
    controller_mappings: [Option<ControllerMappingProfile>; 2],
}

impl ResolvedHandSimulationConfig {
    /// Key flipping whether the hand stays visible while untracked.
    pub fn toggle_key(&self, handedness: Handedness) -> KeyCode {
        self.toggle_keys[handedness.index()]
    }

    /// Key tracking the hand while held.
    pub fn track_key(&self, handedness: Handedness) -> KeyCode {
        self.track_keys[handedness.index()]
    }

    pub fn controller_mapping(&self, handedness: Handedness) -> Option<&ControllerMappingProfile> {
        self.controller_mappings[handedness.index()].as_ref()
    }
}
