use bevy::input::keyboard::KeyCode;
use bevy::math::{Vec2, Vec3};

use crate::error::{Result, SimulationError};
use crate::hands::HandData;
use crate::input::{KeyInput, SimulationInput};
use crate::types::{Handedness, TrackingState};

pub mod lifecycle;

/// Keyboard driven adjustments of a simulated controller's root pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimulationAction {
    YawClockwise,
    YawCounterClockwise,
    PitchClockwise,
    PitchCounterClockwise,
    RollClockwise,
    RollCounterClockwise,
    MoveAway,
    MoveCloser,
}

impl SimulationAction {
    pub const COUNT: usize = 8;

    /// Evaluation order. When opposing actions are both held the later one wins.
    pub const ALL: [SimulationAction; Self::COUNT] = [
        SimulationAction::YawClockwise,
        SimulationAction::YawCounterClockwise,
        SimulationAction::PitchClockwise,
        SimulationAction::PitchCounterClockwise,
        SimulationAction::RollClockwise,
        SimulationAction::RollCounterClockwise,
        SimulationAction::MoveAway,
        SimulationAction::MoveCloser,
    ];

    pub const fn index(&self) -> usize {
        *self as usize
    }

    pub const fn default_key(&self) -> KeyCode {
        match self {
            SimulationAction::YawClockwise => KeyCode::KeyE,
            SimulationAction::YawCounterClockwise => KeyCode::KeyQ,
            SimulationAction::PitchClockwise => KeyCode::KeyF,
            SimulationAction::PitchCounterClockwise => KeyCode::KeyR,
            SimulationAction::RollClockwise => KeyCode::KeyX,
            SimulationAction::RollCounterClockwise => KeyCode::KeyZ,
            SimulationAction::MoveAway => KeyCode::PageUp,
            SimulationAction::MoveCloser => KeyCode::PageDown,
        }
    }
}

/// Binds a key to a simulation action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionMapping {
    pub action: SimulationAction,
    pub key: KeyCode,
}

impl InteractionMapping {
    pub const fn new(action: SimulationAction, key: KeyCode) -> Self {
        Self { action, key }
    }
}

/// Key bindings of one simulated controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerMappingProfile {
    pub interactions: Vec<InteractionMapping>,
}

impl Default for ControllerMappingProfile {
    fn default() -> Self {
        Self {
            interactions: SimulationAction::ALL
                .iter()
                .map(|action| InteractionMapping::new(*action, action.default_key()))
                .collect(),
        }
    }
}

/// The two capabilities the lifecycle manager needs from any simulated controller.
pub trait SimulatedController {
    fn handedness(&self) -> Handedness;

    /// Yaw (y), pitch (x) and roll (z) change for this tick, in Euler degrees.
    fn get_delta_rotation(&mut self, rotation_speed: f32, input: &SimulationInput) -> Vec3;

    /// Pointer position in screen pixels, with this tick's depth key movement in `z`.
    fn get_position(&mut self, depth_multiplier: f32, input: &SimulationInput) -> Vec3;
}

/// Simulated articulated hand, fed with post processed hand data every tracked tick.
#[derive(Debug, Clone)]
pub struct SimulatedHandController {
    handedness: Handedness,
    tracking_state: TrackingState,
    mapping: ControllerMappingProfile,
    action_states: [bool; SimulationAction::COUNT],
    last_pointer: Vec2,
    hand_data: Option<HandData>,
    select: bool,
    grip: bool,
    point: bool,
}

impl SimulatedHandController {
    pub fn new(
        handedness: Handedness,
        tracking_state: TrackingState,
        mapping: ControllerMappingProfile,
    ) -> Self {
        Self {
            handedness,
            tracking_state,
            mapping,
            action_states: [false; SimulationAction::COUNT],
            last_pointer: Vec2::ZERO,
            hand_data: None,
            select: false,
            grip: false,
            point: false,
        }
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.tracking_state
    }

    pub fn mapping(&self) -> &ControllerMappingProfile {
        &self.mapping
    }

    /// Latest hand data, `None` until the hand was tracked at least once.
    pub fn hand_data(&self) -> Option<&HandData> {
        self.hand_data.as_ref()
    }

    /// Select is pressed while the hand pinches.
    pub fn is_selecting(&self) -> bool {
        self.select
    }

    pub fn is_gripping(&self) -> bool {
        self.grip
    }

    pub fn is_pointing(&self) -> bool {
        self.point
    }

    pub fn is_action_active(&self, action: SimulationAction) -> bool {
        self.action_states[action.index()]
    }

    pub fn update_controller(&mut self, hand_data: HandData) {
        self.tracking_state = hand_data.tracking_state;
        self.select = hand_data.is_pinching;
        self.grip = hand_data.is_gripping;
        self.point = hand_data.is_pointing;
        self.hand_data = Some(hand_data);
    }

    fn update_simulation_mappings(&mut self, keys: &dyn KeyInput) {
        self.action_states = [false; SimulationAction::COUNT];
        for interaction in &self.mapping.interactions {
            if keys.pressed(interaction.key) {
                self.action_states[interaction.action.index()] = true;
            }
        }
    }
}

impl SimulatedController for SimulatedHandController {
    fn handedness(&self) -> Handedness {
        self.handedness
    }

    fn get_delta_rotation(&mut self, rotation_speed: f32, input: &SimulationInput) -> Vec3 {
        self.update_simulation_mappings(input.keys);

        let rotation_delta = rotation_speed * input.clock.delta_seconds();
        let mut euler = Vec3::ZERO;
        for action in SimulationAction::ALL {
            if !self.is_action_active(action) {
                continue;
            }
            match action {
                SimulationAction::YawClockwise => euler.y = rotation_delta,
                SimulationAction::YawCounterClockwise => euler.y = -rotation_delta,
                SimulationAction::PitchClockwise => euler.x = -rotation_delta,
                SimulationAction::PitchCounterClockwise => euler.x = rotation_delta,
                SimulationAction::RollClockwise => euler.z = -rotation_delta,
                SimulationAction::RollCounterClockwise => euler.z = rotation_delta,
                SimulationAction::MoveAway | SimulationAction::MoveCloser => {}
            }
        }
        euler
    }

    fn get_position(&mut self, depth_multiplier: f32, input: &SimulationInput) -> Vec3 {
        self.update_simulation_mappings(input.keys);

        if let Some(cursor) = input.pointer.cursor_position() {
            self.last_pointer = cursor;
        }
        let mut position = self.last_pointer.extend(0.0);

        let depth_delta = input.clock.delta_seconds() * depth_multiplier;
        if self.is_action_active(SimulationAction::MoveAway) {
            position.z += depth_delta;
        }
        if self.is_action_active(SimulationAction::MoveCloser) {
            position.z -= depth_delta;
        }
        position
    }
}

/// Every kind of controller the simulation can attach.
#[derive(Debug, Clone)]
pub enum ActiveController {
    Hand(SimulatedHandController),
}

impl ActiveController {
    pub fn as_hand(&self) -> Option<&SimulatedHandController> {
        match self {
            ActiveController::Hand(hand) => Some(hand),
        }
    }

    pub fn update_controller(&mut self, hand_data: HandData) {
        match self {
            ActiveController::Hand(hand) => hand.update_controller(hand_data),
        }
    }
}

impl SimulatedController for ActiveController {
    fn handedness(&self) -> Handedness {
        match self {
            ActiveController::Hand(hand) => hand.handedness(),
        }
    }

    fn get_delta_rotation(&mut self, rotation_speed: f32, input: &SimulationInput) -> Vec3 {
        match self {
            ActiveController::Hand(hand) => hand.get_delta_rotation(rotation_speed, input),
        }
    }

    fn get_position(&mut self, depth_multiplier: f32, input: &SimulationInput) -> Vec3 {
        match self {
            ActiveController::Hand(hand) => hand.get_position(depth_multiplier, input),
        }
    }
}

/// Creates the controller attached when a hand becomes visible.
pub trait ControllerFactory: Send + Sync {
    fn create_controller(
        &self,
        handedness: Handedness,
        mapping: Option<&ControllerMappingProfile>,
    ) -> Result<ActiveController>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedHandControllerFactory;

impl ControllerFactory for SimulatedHandControllerFactory {
    fn create_controller(
        &self,
        handedness: Handedness,
        mapping: Option<&ControllerMappingProfile>,
    ) -> Result<ActiveController> {
        let mapping = mapping.ok_or_else(|| SimulationError::ControllerCreation {
            handedness,
            reason: "no controller mapping profile is configured".into(),
        })?;
        Ok(ActiveController::Hand(SimulatedHandController::new(
            handedness,
            TrackingState::Tracked,
            mapping.clone(),
        )))
    }
}
