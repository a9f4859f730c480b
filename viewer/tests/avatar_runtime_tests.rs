use bevy::prelude::*;
use rig::{HumanoidBone, Kinematics};
use viewer::avatar::pipeline::bind_avatar_rig;
use viewer::avatar::{AvatarState, AvatarStatus, PendingRig, VrmHumanBone, VrmHumanoid, VrmVersion};
use viewer::character::{
    AvatarAnimation, AvatarMount, PlayerController, PlayerRoot, apply_mount_pose, drive_avatar_animation,
};
use viewer::settings::{SettingsResource, ViewerSettings};

const BONES: [(HumanoidBone, &str); 6] = [
    (HumanoidBone::Hips, "J_Bip_C_Hips"),
    (HumanoidBone::Spine, "J_Bip_C_Spine"),
    (HumanoidBone::LeftUpperArm, "J_Bip_L_UpperArm"),
    (HumanoidBone::RightUpperArm, "J_Bip_R_UpperArm"),
    (HumanoidBone::LeftUpperLeg, "J_Bip_L_UpperLeg"),
    (HumanoidBone::RightUpperLeg, "J_Bip_R_UpperLeg"),
];

const WALKING: Kinematics = Kinematics {
    speed: 2.0,
    stride: 1.0,
    moving: true,
    ..Kinematics::AT_REST
};

fn viewer_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(SettingsResource::new(ViewerSettings::default()))
        .init_resource::<AvatarState>()
        .add_systems(
            Update,
            (bind_avatar_rig, drive_avatar_animation, apply_mount_pose).chain(),
        );
    app
}

fn humanoid() -> VrmHumanoid {
    VrmHumanoid {
        version: VrmVersion::V1,
        bones: BONES
            .iter()
            .enumerate()
            .map(|(node, (bone, name))| VrmHumanBone {
                bone: *bone,
                node,
                node_name: name.to_string(),
            })
            .collect(),
    }
}

fn spawn_player(world: &mut World) -> (Entity, Entity) {
    let player = world
        .spawn((
            PlayerRoot,
            PlayerController::new(Default::default()),
            Transform::default(),
        ))
        .id();
    let mount = world
        .spawn((AvatarMount, Transform::default(), ChildOf(player)))
        .id();
    (player, mount)
}

/// Avatar scene whose bones hang in a single chain under the scene root.
fn spawn_avatar_scene(world: &mut World, mount: Entity) -> (Entity, Vec<Entity>) {
    let scene = world
        .spawn((
            Transform::default(),
            ChildOf(mount),
            PendingRig {
                humanoid: humanoid(),
            },
        ))
        .id();

    let mut parent = scene;
    let mut bones = Vec::new();
    for (_, name) in BONES {
        let bone = world
            .spawn((Name::new(name), Transform::default(), ChildOf(parent)))
            .id();
        bones.push(bone);
        parent = bone;
    }
    (scene, bones)
}

fn set_walking(app: &mut App, player: Entity) {
    let mut controller = app.world_mut().get_mut::<PlayerController>(player).unwrap();
    controller.kinematics = WALKING;
    controller.frame_dt = 0.016;
}

#[test]
fn spawned_scene_binds_into_a_rig() {
    let mut app = viewer_app();
    let (player, mount) = spawn_player(app.world_mut());
    let (scene, bones) = spawn_avatar_scene(app.world_mut(), mount);

    app.update();

    let animation = app.world().get::<AvatarAnimation>(player).unwrap();
    assert_eq!(animation.rig.len(), BONES.len());
    assert_eq!(animation.rig.handle_by_node_name("J_Bip_C_Hips"), Some(bones[0]));
    assert!(app.world().get::<PendingRig>(scene).is_none());
    assert_eq!(
        app.world().resource::<AvatarState>().status,
        AvatarStatus::Ready { bones: BONES.len() }
    );
}

#[test]
fn binding_waits_for_the_hierarchy() {
    let mut app = viewer_app();
    let (player, mount) = spawn_player(app.world_mut());
    let scene = app
        .world_mut()
        .spawn((
            Transform::default(),
            ChildOf(mount),
            PendingRig {
                humanoid: humanoid(),
            },
        ))
        .id();

    app.update();

    assert!(app.world().get::<AvatarAnimation>(player).is_none());
    assert!(app.world().get::<PendingRig>(scene).is_some());
}

#[test]
fn walking_poses_bones_and_bobs_the_mount() {
    let mut app = viewer_app();
    let (player, mount) = spawn_player(app.world_mut());
    let (_, bones) = spawn_avatar_scene(app.world_mut(), mount);
    app.update();

    set_walking(&mut app, player);
    for _ in 0..30 {
        app.update();
    }

    let left_arm = app.world().get::<Transform>(bones[2]).unwrap();
    assert!(left_arm.rotation.angle_between(Quat::IDENTITY) > 1e-3);

    let bob = app.world().get::<AvatarAnimation>(player).unwrap().mount.bob;
    let mount_transform = app.world().get::<Transform>(mount).unwrap();
    assert_eq!(mount_transform.translation.y, bob);
}

#[test]
fn avatar_swap_starts_from_a_fresh_context() {
    let mut app = viewer_app();
    let (player, mount) = spawn_player(app.world_mut());
    let (first_scene, first_bones) = spawn_avatar_scene(app.world_mut(), mount);
    app.update();

    set_walking(&mut app, player);
    for _ in 0..30 {
        app.update();
    }
    let old_walk_time = app
        .world()
        .get::<AvatarAnimation>(player)
        .unwrap()
        .context
        .animator()
        .phase()
        .walk_time();

    app.world_mut().entity_mut(player).remove::<AvatarAnimation>();
    app.world_mut().entity_mut(first_scene).despawn();
    let (_, second_bones) = spawn_avatar_scene(app.world_mut(), mount);
    app.update();

    let animation = app.world().get::<AvatarAnimation>(player).unwrap();
    assert_eq!(animation.rig.handle_by_node_name("J_Bip_C_Hips"), Some(second_bones[0]));
    assert!(animation.context.rest().get(first_bones[0]).is_none());
    assert!(animation.context.rest().get(second_bones[0]).is_some());
    assert!(animation.context.animator().phase().walk_time() < old_walk_time);
}
