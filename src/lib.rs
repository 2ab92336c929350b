pub mod camera;
pub mod config;
pub mod controllers;
pub mod error;
pub mod hands;
pub mod input;
pub mod prelude;
pub mod types;

use bevy::input::InputSystem;
use bevy::log::warn_once;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use camera::{HandSimulationCamera, HandSimulationRig, SimulationCamera};
use config::{HandControllerSettings, SimulatedHandControllerProfile};
use controllers::{
    lifecycle::{ControllerEvent, SimulatedHandControllerModule},
    ActiveController, SimulatedHandController,
};
use hands::HandBone;
use input::SimulationInput;
use types::Handedness;

/// Simulates articulated hand controllers from mouse and keyboard input.
///
/// Needs a camera marked with [`HandSimulationCamera`]. Hand roots are parented to the entity
/// marked with [`HandSimulationRig`] when there is one.
#[derive(Default)]
pub struct HandSimulationPlugin;

impl Plugin for HandSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HandControllerSettings>();
        app.init_resource::<SimulatedHandControllerProfile>();
        app.add_event::<ControllerEvent>();
        app.add_systems(Startup, setup_hand_simulation.map(bevy::utils::error));
        app.add_systems(
            PreUpdate,
            (
                update_simulated_hands,
                handle_controller_events,
                sync_hand_entities,
            )
                .chain()
                .after(InputSystem)
                .run_if(resource_exists::<SimulatedHandControllerModule>),
        );
    }
}

/// Root entity of a simulated hand, with one [`HandBone`] child per joint.
#[derive(Component, Debug, Clone, Copy)]
pub struct SimulatedHand;

fn setup_hand_simulation(
    mut commands: Commands,
    settings: Res<HandControllerSettings>,
    profile: Res<SimulatedHandControllerProfile>,
) -> error::Result<()> {
    let config = profile.resolve(&settings)?;
    let mut module = SimulatedHandControllerModule::new(config)?;
    module.enable();
    commands.insert_resource(module);
    Ok(())
}

fn simulation_camera(
    cameras: &Query<(&Camera, &GlobalTransform, &Projection), With<HandSimulationCamera>>,
    rigs: &Query<&GlobalTransform, With<HandSimulationRig>>,
) -> Option<SimulationCamera> {
    let Ok((camera, transform, projection)) = cameras.get_single() else {
        warn_once!("no single camera marked with HandSimulationCamera, hand simulation paused");
        return None;
    };
    let Projection::Perspective(perspective) = projection else {
        warn_once!("hand simulation needs a perspective camera");
        return None;
    };
    let viewport_size = camera.logical_viewport_size()?;
    let rig = rigs
        .get_single()
        .map(GlobalTransform::compute_transform)
        .unwrap_or(Transform::IDENTITY);

    let camera = SimulationCamera {
        transform: transform.compute_transform(),
        fov: perspective.fov,
        viewport_size,
        rig,
    };
    if !camera.has_viewport() {
        warn_once!("hand simulation viewport has no area, hand simulation paused");
        return None;
    }
    Some(camera)
}

fn update_simulated_hands(
    mut module: ResMut<SimulatedHandControllerModule>,
    mut events: EventWriter<ControllerEvent>,
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform, &Projection), With<HandSimulationCamera>>,
    rigs: Query<&GlobalTransform, With<HandSimulationRig>>,
) {
    if let Some(camera) = simulation_camera(&cameras, &rigs) {
        let pointer = windows.get_single().ok().and_then(Window::cursor_position);
        let input = SimulationInput {
            clock: &*time,
            pointer: &pointer,
            keys: &*keys,
            camera: &camera,
        };
        module.update(&input);
    }
    // also forwards what a direct disable() raised
    events.send_batch(module.drain_events());
}

fn handle_controller_events(
    mut commands: Commands,
    mut events: EventReader<ControllerEvent>,
    hands: Query<(Entity, &Handedness), With<SimulatedHand>>,
    rigs: Query<Entity, With<HandSimulationRig>>,
) {
    for event in events.read() {
        match *event {
            ControllerEvent::SourceDetected(handedness) => {
                let root = commands
                    .spawn((
                        Name::new(format!("Simulated {:?} Hand", handedness)),
                        SpatialBundle::default(),
                        SimulatedHand,
                        handedness,
                    ))
                    .with_children(|parent| {
                        for bone in HandBone::get_all_bones() {
                            parent.spawn((
                                Name::new(format!("{:?} {:?}", handedness, bone)),
                                SpatialBundle::default(),
                                bone,
                                handedness,
                            ));
                        }
                    })
                    .id();
                if let Ok(rig) = rigs.get_single() {
                    commands.entity(rig).add_child(root);
                }
            }
            ControllerEvent::SourceLost(handedness) => {
                for (entity, hand) in &hands {
                    if *hand == handedness {
                        commands.entity(entity).despawn_recursive();
                    }
                }
            }
        }
    }
}

/// Copies the latest hand data onto the spawned hand entities. Joint poses become the local
/// transforms of the bone entities.
fn sync_hand_entities(
    module: Res<SimulatedHandControllerModule>,
    hands: Query<(Entity, &Handedness, &Children), With<SimulatedHand>>,
    mut transforms: Query<(&mut Transform, Option<&HandBone>)>,
) {
    for (root, handedness, children) in &hands {
        let Some(hand_data) = module
            .try_get_controller(*handedness)
            .and_then(ActiveController::as_hand)
            .and_then(SimulatedHandController::hand_data)
        else {
            continue;
        };

        if let Ok((mut transform, _)) = transforms.get_mut(root) {
            *transform = hand_data.root_pose.into();
        }
        for child in children.iter() {
            if let Ok((mut transform, Some(bone))) = transforms.get_mut(*child) {
                *transform = (*hand_data.joint(*bone)).into();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(settings: HandControllerSettings) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<ButtonInput<KeyCode>>();
        app.insert_resource(settings);
        app.add_plugins(HandSimulationPlugin);
        app
    }

    #[test]
    fn startup_installs_enabled_module() {
        let mut app = app(HandControllerSettings::default());
        app.update();
        let module = app.world().resource::<SimulatedHandControllerModule>();
        assert!(module.is_enabled());
        assert_eq!(module.library().poses().len(), 5);
    }

    #[test]
    fn invalid_configuration_aborts_startup() {
        let mut app = app(HandControllerSettings {
            tracked_poses: Vec::new(),
            ..Default::default()
        });
        app.update();
        assert!(app
            .world()
            .get_resource::<SimulatedHandControllerModule>()
            .is_none());
        // the rest of the app keeps running
        app.update();
    }

    #[test]
    fn hand_entities_follow_controller_events() {
        let mut app = app(HandControllerSettings::default());
        app.update();

        app.world_mut()
            .send_event(ControllerEvent::SourceDetected(Handedness::Left));
        app.update();
        let mut bones = app.world_mut().query::<(&HandBone, &Handedness)>();
        assert_eq!(bones.iter(app.world()).count(), 26);
        let mut roots = app.world_mut().query::<(&SimulatedHand, &Children)>();
        let (_, children) = roots.single(app.world());
        assert_eq!(children.len(), 26);

        app.world_mut()
            .send_event(ControllerEvent::SourceLost(Handedness::Left));
        app.update();
        assert_eq!(bones.iter(app.world()).count(), 0);
        assert_eq!(roots.iter(app.world()).count(), 0);
    }
}
