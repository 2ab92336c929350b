pub use crate::camera::{CameraProvider, HandSimulationCamera, HandSimulationRig, SimulationCamera};
pub use crate::config::{
    HandControllerSettings, ResolvedHandSimulationConfig, SimulatedHandControllerProfile,
};
pub use crate::controllers::{
    lifecycle::{ControllerEvent, SimulatedHandControllerModule},
    ActiveController, ControllerFactory, ControllerMappingProfile, InteractionMapping,
    SimulatedController, SimulatedHandController, SimulationAction,
};
pub use crate::error::SimulationError;
pub use crate::hands::{
    hand_poses::builtin_poses,
    pose_library::{PoseDefinition, PoseLibrary},
    post_process::HandDataPostProcessor,
    HandBone, HandData,
};
pub use crate::input::{Clock, KeyInput, PointerInput, SimulationInput};
pub use crate::types::{Handedness, Pose, TrackingState};
pub use crate::{HandSimulationPlugin, SimulatedHand};
