use std::time::Duration;

use bevy::prelude::Component;

use crate::types::{Pose, TrackingState};

pub mod blend;
pub mod converter;
pub mod hand_poses;
pub mod pose_library;
pub mod post_process;

pub const HAND_JOINT_COUNT: usize = 26;

/// Joints of a hand skeleton, ordered as in XR_EXT_hand_tracking.
#[repr(u8)]
#[derive(Clone, Copy, Component, Debug, PartialEq, Eq, Hash)]
pub enum HandBone {
    Palm = 0,
    Wrist = 1,
    ThumbMetacarpal = 2,
    ThumbProximal = 3,
    ThumbDistal = 4,
    ThumbTip = 5,
    IndexMetacarpal = 6,
    IndexProximal = 7,
    IndexIntermediate = 8,
    IndexDistal = 9,
    IndexTip = 10,
    MiddleMetacarpal = 11,
    MiddleProximal = 12,
    MiddleIntermediate = 13,
    MiddleDistal = 14,
    MiddleTip = 15,
    RingMetacarpal = 16,
    RingProximal = 17,
    RingIntermediate = 18,
    RingDistal = 19,
    RingTip = 20,
    LittleMetacarpal = 21,
    LittleProximal = 22,
    LittleIntermediate = 23,
    LittleDistal = 24,
    LittleTip = 25,
}

impl HandBone {
    pub const fn index(&self) -> usize {
        *self as usize
    }

    pub const fn is_finger(&self) -> bool {
        !matches!(self, HandBone::Wrist | HandBone::Palm)
    }

    pub const fn is_metacarpal(&self) -> bool {
        matches!(
            self,
            HandBone::ThumbMetacarpal
                | HandBone::IndexMetacarpal
                | HandBone::MiddleMetacarpal
                | HandBone::RingMetacarpal
                | HandBone::LittleMetacarpal
        )
    }

    pub const fn is_tip(&self) -> bool {
        matches!(
            self,
            HandBone::ThumbTip
                | HandBone::IndexTip
                | HandBone::MiddleTip
                | HandBone::RingTip
                | HandBone::LittleTip
        )
    }

    pub const fn is_thumb(&self) -> bool {
        matches!(
            self,
            HandBone::ThumbMetacarpal
                | HandBone::ThumbProximal
                | HandBone::ThumbDistal
                | HandBone::ThumbTip
        )
    }

    pub const fn get_all_bones() -> [HandBone; HAND_JOINT_COUNT] {
        [
            HandBone::Palm,
            HandBone::Wrist,
            HandBone::ThumbMetacarpal,
            HandBone::ThumbProximal,
            HandBone::ThumbDistal,
            HandBone::ThumbTip,
            HandBone::IndexMetacarpal,
            HandBone::IndexProximal,
            HandBone::IndexIntermediate,
            HandBone::IndexDistal,
            HandBone::IndexTip,
            HandBone::MiddleMetacarpal,
            HandBone::MiddleProximal,
            HandBone::MiddleIntermediate,
            HandBone::MiddleDistal,
            HandBone::MiddleTip,
            HandBone::RingMetacarpal,
            HandBone::RingProximal,
            HandBone::RingIntermediate,
            HandBone::RingDistal,
            HandBone::RingTip,
            HandBone::LittleMetacarpal,
            HandBone::LittleProximal,
            HandBone::LittleIntermediate,
            HandBone::LittleDistal,
            HandBone::LittleTip,
        ]
    }
}

/// A fully posed hand as produced for one simulation tick.
///
/// `root_pose` is expressed in the camera rig's local space. `joint_poses` are offsets from the
/// root, already rotated into camera orientation. The grip, pinch, point and recognized pose
/// fields stay at their defaults until a [`post_process::HandDataPostProcessor`] fills them in.
#[derive(Debug, Clone, PartialEq)]
pub struct HandData {
    pub root_pose: Pose,
    pub joint_poses: [Pose; HAND_JOINT_COUNT],
    pub tracking_state: TrackingState,
    pub updated_at: Duration,
    pub grip_strength: f32,
    pub is_gripping: bool,
    pub is_pinching: bool,
    pub is_pointing: bool,
    pub recognized_pose: Option<String>,
}

impl HandData {
    pub fn new(root_pose: Pose, joint_poses: [Pose; HAND_JOINT_COUNT]) -> Self {
        Self {
            root_pose,
            joint_poses,
            tracking_state: TrackingState::NotTracked,
            updated_at: Duration::ZERO,
            grip_strength: 0.0,
            is_gripping: false,
            is_pinching: false,
            is_pointing: false,
            recognized_pose: None,
        }
    }

    pub fn joint(&self, bone: HandBone) -> &Pose {
        &self.joint_poses[bone.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bone_order_matches_index() {
        for (i, bone) in HandBone::get_all_bones().iter().enumerate() {
            assert_eq!(bone.index(), i);
        }
    }

    #[test]
    fn five_tips_and_metacarpals() {
        let bones = HandBone::get_all_bones();
        assert_eq!(bones.iter().filter(|b| b.is_tip()).count(), 5);
        assert_eq!(bones.iter().filter(|b| b.is_metacarpal()).count(), 5);
        assert_eq!(bones.iter().filter(|b| !b.is_finger()).count(), 2);
    }
}
