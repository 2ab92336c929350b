use std::f32::consts::PI;

use bevy::input::keyboard::KeyCode;
use bevy::math::{Quat, Vec3};

use crate::types::Pose;

use super::{pose_library::PoseDefinition, HandBone, HAND_JOINT_COUNT};

pub const OPEN_POSE: &str = "open";
pub const FIST_POSE: &str = "fist";
pub const PINCH_POSE: &str = "pinch";
pub const POINT_POSE: &str = "point";
pub const GRAB_POSE: &str = "grab";

/// How far each finger is bent, 0 being straight and 1 fully curled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FingerCurls {
    pub thumb: f32,
    pub index: f32,
    pub middle: f32,
    pub ring: f32,
    pub little: f32,
}

impl FingerCurls {
    pub const fn splat(curl: f32) -> Self {
        Self {
            thumb: curl,
            index: curl,
            middle: curl,
            ring: curl,
            little: curl,
        }
    }
}

/// Open right hand, each entry is the offset from the previous joint of the same finger
/// (metacarpals and the wrist are relative to the palm). Fingers extend along +y, the palm
/// faces -z and the thumb sits on -x.
const OPEN_HAND_OFFSETS: [Vec3; HAND_JOINT_COUNT] = [
    Vec3::new(0.0, 0.0, 0.0),       //palm
    Vec3::new(0.0, -0.04, 0.0),     //wrist
    Vec3::new(-0.02, 0.015, 0.0),   //thumb
    Vec3::new(0.0, 0.03, 0.0),
    Vec3::new(0.0, 0.024, 0.0),
    Vec3::new(0.0, 0.024, 0.0),
    Vec3::new(-0.01, 0.0155, -0.015), //index
    Vec3::new(0.0, 0.064, 0.0),
    Vec3::new(0.0, 0.037, 0.0),
    Vec3::new(0.0, 0.02, 0.0),
    Vec3::new(0.0, 0.01, 0.0),
    Vec3::new(0.0, 0.016, -0.02), //middle
    Vec3::new(0.0, 0.064, 0.0),
    Vec3::new(0.0, 0.037, 0.0),
    Vec3::new(0.0, 0.02, 0.0),
    Vec3::new(0.0, 0.01, 0.0),
    Vec3::new(0.01, 0.015, -0.015), //ring
    Vec3::new(0.0, 0.064, 0.0),
    Vec3::new(0.0, 0.037, 0.0),
    Vec3::new(0.0, 0.02, 0.0),
    Vec3::new(0.0, 0.01, 0.0),
    Vec3::new(0.02, 0.015, -0.01), //little
    Vec3::new(0.0, 0.064, 0.0),
    Vec3::new(0.0, 0.037, 0.0),
    Vec3::new(0.0, 0.02, 0.0),
    Vec3::new(0.0, 0.01, 0.0),
];

const THUMB: [HandBone; 4] = [
    HandBone::ThumbMetacarpal,
    HandBone::ThumbProximal,
    HandBone::ThumbDistal,
    HandBone::ThumbTip,
];
const INDEX: [HandBone; 5] = [
    HandBone::IndexMetacarpal,
    HandBone::IndexProximal,
    HandBone::IndexIntermediate,
    HandBone::IndexDistal,
    HandBone::IndexTip,
];
const MIDDLE: [HandBone; 5] = [
    HandBone::MiddleMetacarpal,
    HandBone::MiddleProximal,
    HandBone::MiddleIntermediate,
    HandBone::MiddleDistal,
    HandBone::MiddleTip,
];
const RING: [HandBone; 5] = [
    HandBone::RingMetacarpal,
    HandBone::RingProximal,
    HandBone::RingIntermediate,
    HandBone::RingDistal,
    HandBone::RingTip,
];
const LITTLE: [HandBone; 5] = [
    HandBone::LittleMetacarpal,
    HandBone::LittleProximal,
    HandBone::LittleIntermediate,
    HandBone::LittleDistal,
    HandBone::LittleTip,
];

/// Bend applied at a joint, affecting every segment after it. Tips never bend.
fn get_bone_curl_angle(bone: HandBone, curl: f32) -> f32 {
    let degrees = match bone {
        HandBone::ThumbProximal => 35.0,
        HandBone::ThumbDistal => 50.0,
        HandBone::IndexProximal
        | HandBone::MiddleProximal
        | HandBone::RingProximal
        | HandBone::LittleProximal => 70.0,
        HandBone::IndexIntermediate
        | HandBone::MiddleIntermediate
        | HandBone::RingIntermediate
        | HandBone::LittleIntermediate => 90.0,
        HandBone::IndexDistal
        | HandBone::MiddleDistal
        | HandBone::RingDistal
        | HandBone::LittleDistal => 60.0,
        _ => 0.0,
    };
    curl.clamp(0.0, 1.0) * degrees * PI / 180.0
}

fn curl_rotation(bone: HandBone, curl: f32) -> Quat {
    let angle = get_bone_curl_angle(bone, curl);
    if bone.is_thumb() {
        // thumb folds across the palm towards the little finger
        Quat::from_rotation_z(-angle)
    } else {
        // fingers fold towards the palm normal
        Quat::from_rotation_x(-angle)
    }
}

/// Walks one finger from its metacarpal to its tip, writing root relative joint poses.
fn pose_finger(joints: &mut [Pose; HAND_JOINT_COUNT], bones: &[HandBone], splay: Quat, curl: f32) {
    let Some((metacarpal, rest)) = bones.split_first() else {
        return;
    };
    let mut position = OPEN_HAND_OFFSETS[metacarpal.index()];
    let mut rotation = splay;
    joints[metacarpal.index()] = Pose::new(position, rotation);
    for bone in rest {
        position += rotation.mul_vec3(OPEN_HAND_OFFSETS[bone.index()]);
        rotation = rotation.mul_quat(curl_rotation(*bone, curl));
        joints[bone.index()] = Pose::new(position, rotation);
    }
}

/// Builds a right hand joint layout relative to the palm for the given finger curls.
pub fn curled_hand_joints(curls: FingerCurls) -> [Pose; HAND_JOINT_COUNT] {
    let mut joints = [Pose::IDENTITY; HAND_JOINT_COUNT];
    joints[HandBone::Palm.index()] = Pose::IDENTITY;
    joints[HandBone::Wrist.index()] =
        Pose::new(OPEN_HAND_OFFSETS[HandBone::Wrist.index()], Quat::IDENTITY);

    let splay = |degrees: f32| Quat::from_rotation_z(degrees * PI / 180.0);
    let thumb_splay = splay(30.0).mul_quat(Quat::from_rotation_x(-35.0 * PI / 180.0));
    pose_finger(&mut joints, &THUMB, thumb_splay, curls.thumb);
    pose_finger(&mut joints, &INDEX, splay(10.0), curls.index);
    pose_finger(&mut joints, &MIDDLE, splay(0.0), curls.middle);
    pose_finger(&mut joints, &RING, splay(-10.0), curls.ring);
    pose_finger(&mut joints, &LITTLE, splay(-20.0), curls.little);
    joints
}

/// The stock pose set: an open default hand plus fist, pinch, point and grab on the number keys.
pub fn builtin_poses() -> Vec<PoseDefinition> {
    vec![
        PoseDefinition::new(OPEN_POSE, curled_hand_joints(FingerCurls::splat(0.0))).as_default(),
        PoseDefinition::new(FIST_POSE, curled_hand_joints(FingerCurls::splat(1.0)))
            .with_key(KeyCode::Digit1),
        PoseDefinition::new(
            PINCH_POSE,
            curled_hand_joints(FingerCurls {
                thumb: 0.7,
                index: 0.6,
                middle: 0.15,
                ring: 0.1,
                little: 0.05,
            }),
        )
        .with_key(KeyCode::Digit2),
        PoseDefinition::new(
            POINT_POSE,
            curled_hand_joints(FingerCurls {
                thumb: 1.0,
                index: 0.0,
                middle: 1.0,
                ring: 1.0,
                little: 1.0,
            }),
        )
        .with_key(KeyCode::Digit3),
        PoseDefinition::new(GRAB_POSE, curled_hand_joints(FingerCurls::splat(0.5)))
            .with_key(KeyCode::Digit4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip_to_palm(joints: &[Pose; HAND_JOINT_COUNT], tip: HandBone) -> f32 {
        joints[tip.index()].position.distance(joints[HandBone::Palm.index()].position)
    }

    #[test]
    fn open_hand_fingers_point_up() {
        let joints = curled_hand_joints(FingerCurls::splat(0.0));
        for tip in [HandBone::IndexTip, HandBone::MiddleTip, HandBone::RingTip] {
            assert!(joints[tip.index()].position.y > 0.1);
        }
        assert!(joints[HandBone::ThumbTip.index()].position.x < 0.0);
    }

    #[test]
    fn curling_pulls_tips_towards_palm() {
        let open = curled_hand_joints(FingerCurls::splat(0.0));
        let fist = curled_hand_joints(FingerCurls::splat(1.0));
        for tip in [
            HandBone::IndexTip,
            HandBone::MiddleTip,
            HandBone::RingTip,
            HandBone::LittleTip,
        ] {
            assert!(tip_to_palm(&fist, tip) < tip_to_palm(&open, tip));
        }
    }

    #[test]
    fn builtin_set_has_single_default() {
        let poses = builtin_poses();
        assert_eq!(poses.iter().filter(|p| p.is_default).count(), 1);
        assert_eq!(poses[0].id, OPEN_POSE);
        assert!(poses[0].key_binding.is_none());
    }
}
