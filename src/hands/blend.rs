use crate::types::Pose;

use super::{pose_library::PoseDefinition, HAND_JOINT_COUNT};

/// Joint layout currently shown for a hand, tagged with the pose it last fully reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseState {
    pub id: String,
    pub local_joint_poses: [Pose; HAND_JOINT_COUNT],
}

impl From<&PoseDefinition> for PoseState {
    fn from(definition: &PoseDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            local_joint_poses: definition.local_joint_poses,
        }
    }
}

/// Interpolates every joint of `from` towards `to`: positions linearly, rotations spherically.
///
/// `t` is expected to already be within `[0, 1]`.
pub fn lerp(out: &mut PoseState, from: &PoseState, to: &PoseState, t: f32) {
    for ((out, from), to) in out
        .local_joint_poses
        .iter_mut()
        .zip(from.local_joint_poses.iter())
        .zip(to.local_joint_poses.iter())
    {
        *out = from.lerp(to, t);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPhase {
    IdleAtDefault,
    Blending,
    HoldingAtTarget,
}

#[derive(Debug, Clone)]
pub struct BlendState {
    pub current: PoseState,
    pub previous: PoseState,
    pub target: PoseState,
    /// Blend progress already applied to `current`.
    pub current_blend: f32,
    /// Blend progress requested so far, never decreases until the target changes.
    pub target_blend: f32,
}

impl BlendState {
    /// A hand resting at `pose` with no blend in flight.
    pub fn settled(pose: &PoseDefinition) -> Self {
        let state = PoseState::from(pose);
        Self {
            current: state.clone(),
            previous: state.clone(),
            target: state,
            current_blend: 1.0,
            target_blend: 1.0,
        }
    }

    pub fn phase(&self, default_pose_id: &str) -> BlendPhase {
        if self.current_blend < 1.0 {
            BlendPhase::Blending
        } else if self.current.id == default_pose_id {
            BlendPhase::IdleAtDefault
        } else {
            BlendPhase::HoldingAtTarget
        }
    }

    /// Moves one tick towards `new_target`, `blend_delta` being animation speed times elapsed time.
    /// Returns true if a new target was picked up this tick.
    pub fn advance(&mut self, new_target: &PoseDefinition, blend_delta: f32) -> bool {
        let mut retargeted = false;
        if new_target.id != self.current.id || self.current_blend < 1.0 {
            self.previous = self.current.clone();
            retargeted = self.set_target(new_target);
        }

        self.target_blend = (self.target_blend + blend_delta)
            .max(self.target_blend)
            .min(1.0);

        if self.target_blend > self.current_blend {
            let range = (1.0 - self.current_blend).clamp(0.0, 1.0);
            let lerp_factor = if range > 0.0 {
                (self.target_blend - self.current_blend) / range
            } else {
                1.0
            };
            if lerp_factor >= 1.0 {
                self.current.local_joint_poses = self.target.local_joint_poses;
            } else {
                lerp(&mut self.current, &self.previous, &self.target, lerp_factor);
            }
        }

        self.current_blend = self.target_blend;
        if self.current_blend >= 1.0 {
            self.current.id.clone_from(&self.target.id);
        }
        retargeted
    }

    fn set_target(&mut self, target: &PoseDefinition) -> bool {
        if target.id == self.target.id {
            return false;
        }
        self.target = PoseState::from(target);
        // the blend restarts from whatever is currently shown
        self.target_blend = 0.0;
        self.current_blend = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};

    use super::*;
    use crate::hands::hand_poses::{builtin_poses, curled_hand_joints, FingerCurls};

    fn definition(id: &str, curl: f32) -> PoseDefinition {
        PoseDefinition::new(id, curled_hand_joints(FingerCurls::splat(curl)))
    }

    #[test]
    fn blending_is_monotonic() {
        let from = PoseState::from(&definition("open", 0.0));
        let to = PoseState::from(&definition("fist", 1.0));
        let mut previous = from.clone();
        let mut out = from.clone();
        for step in 1..=10 {
            let t = step as f32 / 10.0;
            lerp(&mut out, &from, &to, t);
            for i in 0..HAND_JOINT_COUNT {
                let target = to.local_joint_poses[i];
                let before = previous.local_joint_poses[i];
                let after = out.local_joint_poses[i];
                assert!(
                    after.position.distance(target.position)
                        <= before.position.distance(target.position) + 1e-6
                );
                assert!(
                    after.rotation.angle_between(target.rotation)
                        <= before.rotation.angle_between(target.rotation) + 1e-4
                );
            }
            previous = out.clone();
        }
    }

    #[test]
    fn lerp_leaves_inputs_untouched() {
        let from = PoseState::from(&definition("open", 0.0));
        let to = PoseState::from(&definition("fist", 1.0));
        let (from_copy, to_copy) = (from.clone(), to.clone());
        let mut out = from.clone();
        lerp(&mut out, &from, &to, 0.3);
        assert_eq!(from, from_copy);
        assert_eq!(to, to_copy);
    }

    #[test]
    fn one_large_step_reaches_target() {
        let poses = builtin_poses();
        let mut state = BlendState::settled(&poses[0]);
        assert_eq!(state.phase("open"), BlendPhase::IdleAtDefault);
        assert!(state.advance(&poses[1], 2.0));
        assert_eq!(state.current_blend, 1.0);
        assert_eq!(state.current.id, poses[1].id);
        assert_eq!(state.current.local_joint_poses, poses[1].local_joint_poses);
        assert_eq!(state.phase("open"), BlendPhase::HoldingAtTarget);
    }

    #[test]
    fn small_steps_blend_over_several_ticks() {
        let open = definition("open", 0.0);
        let fist = definition("fist", 1.0);
        let mut state = BlendState::settled(&open);

        state.advance(&fist, 0.25);
        assert_eq!(state.phase("open"), BlendPhase::Blending);
        assert_eq!(state.current_blend, 0.25);
        let quarter = state.current.local_joint_poses[10].position;
        let expected = open.local_joint_poses[10]
            .position
            .lerp(fist.local_joint_poses[10].position, 0.25);
        assert!(quarter.abs_diff_eq(expected, 1e-5));

        state.advance(&fist, 0.25);
        let half = state.current.local_joint_poses[10].position;
        let expected = open.local_joint_poses[10]
            .position
            .lerp(fist.local_joint_poses[10].position, 0.5);
        assert!(half.abs_diff_eq(expected, 1e-5));

        state.advance(&fist, 0.25);
        state.advance(&fist, 0.25);
        assert_eq!(state.current.id, "fist");
        assert_eq!(state.current.local_joint_poses, fist.local_joint_poses);
    }

    #[test]
    fn target_blend_never_decreases_for_same_target() {
        let open = definition("open", 0.0);
        let fist = definition("fist", 1.0);
        let mut state = BlendState::settled(&open);
        state.advance(&fist, 0.4);
        state.advance(&fist, -0.3);
        assert_eq!(state.target_blend, 0.4);
        assert!(state.current_blend <= state.target_blend);
    }

    #[test]
    fn releasing_mid_blend_returns_to_default() {
        let open = definition("open", 0.0);
        let fist = definition("fist", 1.0);
        let mut state = BlendState::settled(&open);
        state.advance(&fist, 0.5);
        assert!(state.advance(&open, 0.5));
        state.advance(&open, 0.5);
        assert_eq!(state.current.id, "open");
        assert_eq!(state.current.local_joint_poses, open.local_joint_poses);
    }

    #[test]
    fn zero_delta_holds_pose() {
        let mut pose = definition("open", 0.0);
        pose.local_joint_poses[3] = Pose::new(Vec3::X, Quat::from_rotation_z(0.5));
        let mut state = BlendState::settled(&pose);
        state.advance(&pose, 0.0);
        assert_eq!(state.current.local_joint_poses, pose.local_joint_poses);
    }
}
