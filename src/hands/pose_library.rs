use std::collections::HashMap;

use bevy::input::keyboard::KeyCode;
use bevy::log::debug;

use crate::error::{Result, SimulationError};
use crate::types::Pose;

use super::HAND_JOINT_COUNT;

/// A named right hand pose. Joint poses are relative to the hand root.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseDefinition {
    pub id: String,
    pub key_binding: Option<KeyCode>,
    pub is_default: bool,
    pub local_joint_poses: [Pose; HAND_JOINT_COUNT],
}

impl PoseDefinition {
    pub fn new(id: impl Into<String>, local_joint_poses: [Pose; HAND_JOINT_COUNT]) -> Self {
        Self {
            id: id.into(),
            key_binding: None,
            is_default: false,
            local_joint_poses,
        }
    }

    pub fn with_key(mut self, key: KeyCode) -> Self {
        self.key_binding = Some(key);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Lookup of configured poses by id, with exactly one designated default.
#[derive(Debug, Clone, Default)]
pub struct PoseLibrary {
    poses: Vec<PoseDefinition>,
    by_id: HashMap<String, usize>,
    default_index: usize,
}

impl PoseLibrary {
    pub fn new(poses: &[PoseDefinition]) -> Result<Self> {
        let mut library = Self::default();
        library.initialize(poses)?;
        Ok(library)
    }

    /// Replaces the whole registry. On error the previous contents are left untouched.
    pub fn initialize(&mut self, poses: &[PoseDefinition]) -> Result<()> {
        if poses.is_empty() {
            return Err(SimulationError::Configuration(
                "the tracked pose list is empty".into(),
            ));
        }

        let mut by_id = HashMap::with_capacity(poses.len());
        let mut default_index = None;
        for (i, pose) in poses.iter().enumerate() {
            if by_id.insert(pose.id.clone(), i).is_some() {
                return Err(SimulationError::Configuration(format!(
                    "hand pose '{}' is defined more than once",
                    pose.id
                )));
            }
            if pose.is_default {
                if let Some(previous) = default_index.replace(i) {
                    return Err(SimulationError::Configuration(format!(
                        "both '{}' and '{}' are marked as the default hand pose",
                        poses[previous].id, pose.id
                    )));
                }
            }
        }
        let Some(default_index) = default_index else {
            return Err(SimulationError::Configuration(
                "there is no default simulated hand pose defined".into(),
            ));
        };

        debug!(
            "registered {} simulated hand poses, default '{}'",
            poses.len(),
            poses[default_index].id
        );
        self.poses = poses.to_vec();
        self.by_id = by_id;
        self.default_index = default_index;
        Ok(())
    }

    pub fn get_by_name(&self, id: &str) -> Result<&PoseDefinition> {
        self.try_get_by_name(id)
            .ok_or_else(|| SimulationError::NotFound(id.to_owned()))
    }

    pub fn try_get_by_name(&self, id: &str) -> Option<&PoseDefinition> {
        self.by_id.get(id).map(|&i| &self.poses[i])
    }

    /// Panics if the library was never initialized.
    pub fn default_pose(&self) -> &PoseDefinition {
        &self.poses[self.default_index]
    }

    /// Poses in declaration order.
    pub fn poses(&self) -> &[PoseDefinition] {
        &self.poses
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}
