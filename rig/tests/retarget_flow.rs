use bevy::math::{EulerRot, Quat, Vec3};
use rig::{
    AnimationContext, BoundClip, Clip, ClipRetargeter, HumanoidBone, HumanoidRig, Keyframes, Kinematics, LocalPose,
    MotionPlayer, MountPose, Track,
};
use std::collections::HashMap;

fn vroid_avatar() -> (HumanoidRig<u16>, HashMap<u16, LocalPose>) {
    let bones = [
        (HumanoidBone::Hips, "J_Bip_C_Hips"),
        (HumanoidBone::Spine, "J_Bip_C_Spine"),
        (HumanoidBone::Chest, "J_Bip_C_Chest"),
        (HumanoidBone::UpperChest, "J_Bip_C_UpperChest"),
        (HumanoidBone::LeftUpperLeg, "J_Bip_L_UpperLeg"),
        (HumanoidBone::RightUpperLeg, "J_Bip_R_UpperLeg"),
        (HumanoidBone::RightFoot, "J_Bip_R_Foot"),
    ];
    let mut rig = HumanoidRig::new();
    let mut poses = HashMap::new();
    for (index, (bone, name)) in bones.into_iter().enumerate() {
        rig.insert(bone, index as u16, name);
        poses.insert(index as u16, LocalPose::IDENTITY);
    }
    (rig, poses)
}

fn mixamo_clip() -> Clip {
    let times = vec![0.0, 0.5, 1.0];
    let keys = vec![
        Quat::IDENTITY,
        Quat::from_rotation_y(0.2),
        Quat::IDENTITY,
    ];
    let rotation = |node: &str| Track::rotations(format!("{node}.quaternion"), times.clone(), keys.clone()).unwrap();
    Clip::new(
        "Walking",
        1.0,
        vec![
            rotation("mixamorigHips"),
            Track::vectors("mixamorigHips.position", times.clone(), vec![Vec3::ZERO; 3]).unwrap(),
            rotation("Hips"),
            rotation("Spine2"),
            rotation("Spine3"),
            rotation("RightUpLeg"),
            rotation("LeftUpLeg"),
            rotation("RightFoot"),
            rotation("LeftFoot"),
            Track::vectors("Spine.scale", times.clone(), vec![Vec3::ONE; 3]).unwrap(),
        ],
    )
}

#[test]
fn retargeted_clip_targets_avatar_nodes() {
    let (rig, _) = vroid_avatar();
    let (clip, report) = ClipRetargeter::default().retarget_with_report(&mixamo_clip(), &rig);
    let clip = clip.unwrap();

    let names: Vec<_> = clip.tracks.iter().map(Track::name).collect();
    assert_eq!(
        names,
        vec![
            "J_Bip_C_Hips.quaternion",
            "J_Bip_C_UpperChest.quaternion",
            "J_Bip_C_UpperChest.quaternion",
            "J_Bip_R_UpperLeg.quaternion",
            "J_Bip_L_UpperLeg.quaternion",
            "J_Bip_R_Foot.quaternion",
        ]
    );
    assert_eq!(report.source_bones.len(), 9);
    assert_eq!(report.mapped_bones.len(), 6);

    let flip = Quat::from_euler(EulerRot::XYZ, std::f32::consts::PI, 0.0, 0.0);
    let Keyframes::Rotations(right_leg) = clip.tracks[3].keyframes() else {
        panic!("rotation keys expected");
    };
    assert!(right_leg[1].angle_between(flip * Quat::from_rotation_y(0.2)) < 1e-5);

    let Keyframes::Rotations(left_leg) = clip.tracks[4].keyframes() else {
        panic!("rotation keys expected");
    };
    assert!(left_leg[1].angle_between(Quat::from_rotation_y(0.2)) < 1e-5);
}

#[test]
fn retargeted_clip_drives_the_avatar_through_the_context() {
    let (rig, mut poses) = vroid_avatar();
    let clip = ClipRetargeter::default()
        .retarget(&mixamo_clip(), &rig)
        .unwrap();
    let bound = BoundClip::bind(&clip, |name| rig.handle_by_node_name(name)).unwrap();
    assert_eq!(bound.channels().len(), 6);

    let mut context = AnimationContext::new(MotionPlayer::new());
    context.play(bound);

    let mut mount = None;
    for _ in 0..60 {
        mount = Some(context.update(1.0 / 60.0, &Kinematics::AT_REST, &rig, &mut poses));
    }
    assert_eq!(mount, Some(MountPose::REST));
    assert_eq!(context.rest().len(), 7);
    assert_eq!(context.motion().weight(), 1.0);

    // Hips carry the quarter-turn correction once fully faded in.
    let hips = poses[&0].rotation;
    let upright = Quat::from_euler(EulerRot::XYZ, std::f32::consts::FRAC_PI_2, 0.0, 0.0);
    assert!(hips.angle_between(upright) < 0.25);
}

#[test]
fn clip_without_rotations_leaves_procedural_control() {
    let (rig, _) = vroid_avatar();
    let clip = Clip::new(
        "Root",
        1.0,
        vec![Track::vectors("Hips.position", vec![0.0], vec![Vec3::X]).unwrap()],
    );
    assert!(ClipRetargeter::default().retarget(&clip, &rig).is_none());
}

#[test]
fn stopping_a_clip_returns_to_the_original_rest_pose() {
    const DT: f32 = 1.0 / 60.0;
    let (rig, start) = vroid_avatar();

    let mut untouched = start.clone();
    let mut idle = AnimationContext::new(MotionPlayer::new());
    for _ in 0..600 {
        idle.update(DT, &Kinematics::AT_REST, &rig, &mut untouched);
    }

    let bent = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
    let track = Track::rotations("J_Bip_C_Hips.quaternion", vec![0.0, 1.0], vec![bent, bent]).unwrap();
    let clip = Clip::new("Bow", 1.0, vec![track]);

    let mut handed_back = start.clone();
    let mut context = AnimationContext::new(MotionPlayer::new());
    context.play(BoundClip::bind(&clip, |name| rig.handle_by_node_name(name)).unwrap());
    for _ in 0..30 {
        context.update(DT, &Kinematics::AT_REST, &rig, &mut handed_back);
    }
    assert!(handed_back[&0].rotation.angle_between(bent) < 0.1);

    context.stop();
    for _ in 0..600 {
        context.update(DT, &Kinematics::AT_REST, &rig, &mut handed_back);
    }

    assert!(!context.motion().is_blending());
    assert_eq!(context.rest().get(0), Some(LocalPose::IDENTITY));
    for (handle, pose) in &untouched {
        let angle = handed_back[handle].rotation.angle_between(pose.rotation);
        assert!(angle < 1e-3, "bone {handle} differs by {angle}");
    }
}
