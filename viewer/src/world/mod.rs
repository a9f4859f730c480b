pub mod grid;

use bevy::light::{CascadeShadowConfigBuilder, GlobalAmbientLight};
use bevy::prelude::*;
use grid::{GroundGrid, GroundGridConfig, draw_ground_grid};

const BACKGROUND: Color = Color::srgb(0.933, 0.933, 0.933);
const GROUND_COLOR: Color = Color::srgb(0.749, 0.749, 0.749);
const GROUND_SIZE: f32 = 200.0;

/// Directional light whose shadows follow the graphics settings.
#[derive(Component)]
pub struct StageSun;

#[derive(Component)]
pub struct Landmark;

/// Box size and the position of its base centre.
const LANDMARKS: [(Vec3, Vec3); 5] = [
    (Vec3::new(1.5, 1.5, 1.5), Vec3::new(3.0, 0.0, -3.0)),
    (Vec3::new(1.5, 3.0, 1.5), Vec3::new(-4.0, 0.0, -8.0)),
    (Vec3::new(8.0, 0.4, 2.0), Vec3::new(0.0, 0.0, -6.0)),
    (Vec3::new(0.4, 1.0, 0.4), Vec3::new(3.0, 0.0, 4.0)),
    (Vec3::new(0.4, 1.0, 0.4), Vec3::new(-3.0, 0.0, 4.0)),
];

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BACKGROUND))
            .insert_resource(GlobalAmbientLight {
                color: Color::srgb(0.85, 0.88, 1.0),
                brightness: 300.0,
                affects_lightmapped_meshes: true,
            })
            .insert_resource(GroundGrid::new(GroundGridConfig::default()))
            .add_systems(Startup, spawn_stage)
            .add_systems(Update, draw_ground_grid);
    }
}

fn spawn_stage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        StageSun,
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            num_cascades: 2,
            minimum_distance: 0.1,
            maximum_distance: 60.0,
            first_cascade_far_bound: 12.0,
            overlap_proportion: 0.15,
        }
        .build(),
        Transform::from_xyz(6.0, 12.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: GROUND_COLOR,
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::default(),
    ));

    let landmark_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.6, 0.68),
        perceptual_roughness: 0.7,
        ..default()
    });
    for (size, base) in LANDMARKS {
        commands.spawn((
            Landmark,
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(landmark_material.clone()),
            Transform::from_translation(base + Vec3::Y * size.y * 0.5),
        ));
    }
}
