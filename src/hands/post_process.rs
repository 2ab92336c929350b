use crate::types::{Handedness, Pose};

use super::{pose_library::PoseLibrary, HandBone, HandData, HAND_JOINT_COUNT};

/// Tip to palm distance of a fully closed finger, relative to the same finger held open.
const CLOSED_FINGER_RATIO: f32 = 0.5;
/// Thumb and index tips closer than this count as pinching, in meters.
const PINCH_DISTANCE: f32 = 0.03;
/// Mean per joint deviation under which a configured pose is considered matched, in meters.
const RECOGNITION_TOLERANCE: f32 = 0.01;

const FINGER_TIPS: [HandBone; 4] = [
    HandBone::IndexTip,
    HandBone::MiddleTip,
    HandBone::RingTip,
    HandBone::LittleTip,
];

/// Classifies freshly simulated hand data before it reaches the controller.
pub trait HandDataPostProcessor: Send + Sync {
    fn post_process(&mut self, handedness: Handedness, hand_data: HandData) -> HandData;
}

type PoseSignature = [f32; HAND_JOINT_COUNT];

/// Distance of every joint from the palm, unaffected by hand rotation and mirroring.
fn signature(joints: &[Pose; HAND_JOINT_COUNT]) -> PoseSignature {
    let palm = joints[HandBone::Palm.index()].position;
    let mut signature = [0.0; HAND_JOINT_COUNT];
    for (out, joint) in signature.iter_mut().zip(joints.iter()) {
        *out = joint.position.distance(palm);
    }
    signature
}

/// Grip, pinch and point detection plus recognition of the configured poses.
pub struct GripPostProcessor {
    grip_threshold: f32,
    open_signature: PoseSignature,
    known_poses: Vec<(String, PoseSignature)>,
}

impl GripPostProcessor {
    /// Finger curl is measured against the library's default pose, which is assumed to be open.
    pub fn new(library: &PoseLibrary, grip_threshold: f32) -> Self {
        Self {
            grip_threshold,
            open_signature: signature(&library.default_pose().local_joint_poses),
            known_poses: library
                .poses()
                .iter()
                .map(|pose| (pose.id.clone(), signature(&pose.local_joint_poses)))
                .collect(),
        }
    }

    fn finger_curl(&self, current: &PoseSignature, tip: HandBone) -> f32 {
        let open = self.open_signature[tip.index()].max(f32::EPSILON);
        let closed = open * CLOSED_FINGER_RATIO;
        ((open - current[tip.index()]) / (open - closed)).clamp(0.0, 1.0)
    }

    fn recognize(&self, current: &PoseSignature) -> Option<String> {
        self.known_poses
            .iter()
            .map(|(id, known)| {
                let deviation = known
                    .iter()
                    .zip(current.iter())
                    .map(|(a, b)| (a - b).abs())
                    .sum::<f32>()
                    / HAND_JOINT_COUNT as f32;
                (id, deviation)
            })
            .filter(|(_, deviation)| *deviation <= RECOGNITION_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.clone())
    }
}

impl HandDataPostProcessor for GripPostProcessor {
    fn post_process(&mut self, _handedness: Handedness, mut hand_data: HandData) -> HandData {
        let current = signature(&hand_data.joint_poses);
        let curls = FINGER_TIPS.map(|tip| self.finger_curl(&current, tip));

        hand_data.grip_strength = curls.iter().sum::<f32>() / curls.len() as f32;
        hand_data.is_gripping = hand_data.grip_strength >= self.grip_threshold;

        let thumb = hand_data.joint(HandBone::ThumbTip).position;
        let index = hand_data.joint(HandBone::IndexTip).position;
        hand_data.is_pinching = thumb.distance(index) <= PINCH_DISTANCE;

        let [index_curl, others @ ..] = curls;
        hand_data.is_pointing = index_curl < 0.3 && others.iter().all(|curl| *curl > 0.6);

        hand_data.recognized_pose = self.recognize(&current);
        hand_data
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::{Quat, Vec3};

    use super::*;
    use crate::hands::hand_poses::{builtin_poses, FIST_POSE, GRAB_POSE, OPEN_POSE, POINT_POSE};

    fn processor() -> (PoseLibrary, GripPostProcessor) {
        let library = PoseLibrary::new(&builtin_poses()).unwrap();
        let processor = GripPostProcessor::new(&library, 0.8);
        (library, processor)
    }

    fn data_for(library: &PoseLibrary, id: &str) -> HandData {
        HandData::new(
            Pose::IDENTITY,
            library.get_by_name(id).unwrap().local_joint_poses,
        )
    }

    #[test]
    fn open_hand_is_not_gripping() {
        let (library, mut processor) = processor();
        let data = processor.post_process(Handedness::Right, data_for(&library, OPEN_POSE));
        assert!(data.grip_strength < 0.01);
        assert!(!data.is_gripping);
        assert!(!data.is_pointing);
        assert_eq!(data.recognized_pose.as_deref(), Some(OPEN_POSE));
    }

    #[test]
    fn fist_is_gripping() {
        let (library, mut processor) = processor();
        let data = processor.post_process(Handedness::Right, data_for(&library, FIST_POSE));
        assert!(data.is_gripping);
        assert_eq!(data.recognized_pose.as_deref(), Some(FIST_POSE));
    }

    #[test]
    fn half_curl_stays_below_threshold() {
        let (library, mut processor) = processor();
        let data = processor.post_process(Handedness::Right, data_for(&library, GRAB_POSE));
        assert!(data.grip_strength > 0.0);
        assert!(!data.is_gripping);
    }

    #[test]
    fn point_is_detected() {
        let (library, mut processor) = processor();
        let data = processor.post_process(Handedness::Right, data_for(&library, POINT_POSE));
        assert!(data.is_pointing);
        assert_eq!(data.recognized_pose.as_deref(), Some(POINT_POSE));
    }

    #[test]
    fn recognition_ignores_mirroring_and_rotation() {
        let (library, mut processor) = processor();
        let rotation = Quat::from_rotation_x(0.7) * Quat::from_rotation_y(-1.2);
        let mut data = data_for(&library, FIST_POSE);
        for joint in data.joint_poses.iter_mut() {
            let mirrored = joint.mirrored();
            *joint = Pose::new(rotation * mirrored.position, rotation * mirrored.rotation);
        }
        let data = processor.post_process(Handedness::Left, data);
        assert!(data.is_gripping);
        assert_eq!(data.recognized_pose.as_deref(), Some(FIST_POSE));
    }

    #[test]
    fn touching_tips_pinch() {
        let (library, mut processor) = processor();
        let mut data = data_for(&library, OPEN_POSE);
        let index = data.joint(HandBone::IndexTip).position;
        data.joint_poses[HandBone::ThumbTip.index()].position = index + Vec3::new(0.01, 0.0, 0.0);
        let data = processor.post_process(Handedness::Right, data);
        assert!(data.is_pinching);
        assert_ne!(data.recognized_pose.as_deref(), Some(FIST_POSE));
    }
}
