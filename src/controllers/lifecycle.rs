use std::sync::Arc;
use std::time::Duration;

use bevy::log::{debug, error, info};
use bevy::prelude::{Event, Resource};

use crate::config::ResolvedHandSimulationConfig;
use crate::error::Result;
use crate::hands::{
    converter::SimulatedHandDataConverter,
    pose_library::PoseLibrary,
    post_process::{GripPostProcessor, HandDataPostProcessor},
};
use crate::input::SimulationInput;
use crate::types::Handedness;

use super::{
    ActiveController, ControllerFactory, SimulatedController, SimulatedHandControllerFactory,
};

/// Raised when a simulated controller is attached or removed.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    SourceDetected(Handedness),
    SourceLost(Handedness),
}

#[derive(Debug, Default, Clone, Copy)]
struct HandFlags {
    /// Sticky, flipped by the toggle key.
    always_visible: bool,
    /// Follows the track key.
    tracked: bool,
}

/// Attaches, updates and removes the simulated hand controllers of both hands.
#[derive(Resource)]
pub struct SimulatedHandControllerModule {
    config: ResolvedHandSimulationConfig,
    library: Arc<PoseLibrary>,
    converters: [SimulatedHandDataConverter; 2],
    post_processor: Box<dyn HandDataPostProcessor>,
    factory: Box<dyn ControllerFactory>,
    controllers: [Option<ActiveController>; 2],
    flags: [HandFlags; 2],
    last_refresh: Option<Duration>,
    enabled: bool,
    events: Vec<ControllerEvent>,
}

impl SimulatedHandControllerModule {
    pub fn new(config: ResolvedHandSimulationConfig) -> Result<Self> {
        Self::with_factory(config, Box::new(SimulatedHandControllerFactory))
    }

    pub fn with_factory(
        config: ResolvedHandSimulationConfig,
        factory: Box<dyn ControllerFactory>,
    ) -> Result<Self> {
        let library = Arc::new(PoseLibrary::new(&config.tracked_poses)?);
        let converter = |handedness| {
            SimulatedHandDataConverter::new(
                handedness,
                Arc::clone(&library),
                config.animation_speed,
                config.jitter_amount,
                config.default_distance,
            )
        };
        let converters = [converter(Handedness::Left)?, converter(Handedness::Right)?];
        let post_processor = Box::new(GripPostProcessor::new(&library, config.grip_threshold));

        Ok(Self {
            config,
            library,
            converters,
            post_processor,
            factory,
            controllers: [None, None],
            flags: [HandFlags::default(); 2],
            last_refresh: None,
            enabled: false,
            events: Vec::new(),
        })
    }

    /// Replaces the grip post processor.
    pub fn with_post_processor(mut self, post_processor: Box<dyn HandDataPostProcessor>) -> Self {
        self.post_processor = post_processor;
        self
    }

    pub fn config(&self) -> &ResolvedHandSimulationConfig {
        &self.config
    }

    pub fn library(&self) -> &Arc<PoseLibrary> {
        &self.library
    }

    pub fn converter(&self, handedness: Handedness) -> &SimulatedHandDataConverter {
        &self.converters[handedness.index()]
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_always_visible(&self, handedness: Handedness) -> bool {
        self.flags[handedness.index()].always_visible
    }

    pub fn is_tracked(&self, handedness: Handedness) -> bool {
        self.flags[handedness.index()].tracked
    }

    pub fn try_get_controller(&self, handedness: Handedness) -> Option<&ActiveController> {
        self.controllers[handedness.index()].as_ref()
    }

    pub fn active_controllers(&self) -> impl Iterator<Item = &ActiveController> {
        self.controllers.iter().flatten()
    }

    /// Attach and detach events raised since the last call, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = ControllerEvent> + '_ {
        self.events.drain(..)
    }

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.last_refresh = None;
        info!("Simulated hand controllers enabled");
    }

    /// Removes every attached controller regardless of the key state.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.remove_all_controllers();
        self.flags = [HandFlags::default(); 2];
        self.enabled = false;
        info!("Simulated hand controllers disabled");
    }

    /// Runs one frame: attach and detach decisions first, then posing of the tracked hands.
    pub fn update(&mut self, input: &SimulationInput) {
        if !self.enabled {
            return;
        }

        self.refresh_simulated_devices(input);

        for handedness in Handedness::BOTH {
            self.update_simulated_controller(handedness, input);
        }
    }

    fn refresh_simulated_devices(&mut self, input: &SimulationInput) {
        let now = input.clock.elapsed();
        if let Some(last) = self.last_refresh {
            if now.saturating_sub(last) <= self.config.update_period {
                debug!("skipping simulated device refresh, last one ran at {last:?}");
                return;
            }
        }

        for handedness in Handedness::BOTH {
            let flags = &mut self.flags[handedness.index()];
            if input.keys.just_pressed(self.config.toggle_key(handedness)) {
                flags.always_visible = !flags.always_visible;
            }
            flags.tracked = input.keys.pressed(self.config.track_key(handedness));

            if flags.always_visible || flags.tracked {
                if self.controllers[handedness.index()].is_none() {
                    self.create_and_register_controller(handedness);
                }
            } else {
                self.remove_controller(handedness);
            }
        }

        self.last_refresh = Some(now);
    }

    fn create_and_register_controller(&mut self, handedness: Handedness) {
        let mapping = self.config.controller_mapping(handedness);
        match self.factory.create_controller(handedness, mapping) {
            Ok(controller) => {
                info!("Simulated {handedness:?} hand controller detected");
                self.events.push(ControllerEvent::SourceDetected(handedness));
                self.controllers[handedness.index()] = Some(controller);
            }
            Err(e) => error!("Failed to create simulated {handedness:?} hand controller: {e}"),
        }
    }

    fn remove_controller(&mut self, handedness: Handedness) {
        let index = handedness.index();
        if self.controllers[index].is_none() {
            return;
        }
        self.converters[index].reset_converter();
        self.events.push(ControllerEvent::SourceLost(handedness));
        self.controllers[index] = None;
        info!("Simulated {handedness:?} hand controller lost");
    }

    fn remove_all_controllers(&mut self) {
        for handedness in Handedness::BOTH {
            self.remove_controller(handedness);
        }
    }

    fn update_simulated_controller(&mut self, handedness: Handedness, input: &SimulationInput) {
        let index = handedness.index();
        // visible but untracked hands keep their last pose
        if !self.flags[index].tracked {
            return;
        }
        let Some(controller) = self.controllers[index].as_mut() else {
            return;
        };

        let position = controller.get_position(self.config.depth_multiplier, input);
        let delta_rotation = controller.get_delta_rotation(self.config.rotation_speed, input);
        let hand_data =
            self.converters[index].get_simulated_hand_data(position, delta_rotation, input);
        let hand_data = self.post_processor.post_process(handedness, hand_data);
        controller.update_controller(hand_data);
    }
}
