//! Rename rotation tracks authored for a HIK/Mixamo-style rig onto a humanoid.

use crate::clip::{Clip, Track};
use crate::humanoid::{Humanoid, HumanoidBone};
use crate::offset::euler_xyz;
use bevy::math::{Quat, Vec3};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

/// Lowercase source bone name to humanoid bone.
#[derive(Debug, Clone, PartialEq)]
pub struct RetargetMap {
    entries: HashMap<String, HumanoidBone>,
}

impl RetargetMap {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The HIK/Mixamo table, unprefixed (`hips`, `leftupleg`, `rightthumb2`, ...).
    pub fn standard() -> Self {
        use HumanoidBone::*;

        let mut map = Self::empty();
        for (source, target) in [
            ("hips", Hips),
            ("spine", Spine),
            ("spine1", Chest),
            ("spine2", UpperChest),
            ("spine3", UpperChest),
            ("spine4", UpperChest),
            ("neck", Neck),
            ("neck1", Neck),
            ("head", Head),
        ] {
            map.insert(source, target);
        }

        for side in [Side::Left, Side::Right] {
            let p = side.prefix();
            let pick = |left, right| side.pick(left, right);

            map.insert(format!("{p}upleg"), pick(LeftUpperLeg, RightUpperLeg));
            map.insert(format!("{p}leg"), pick(LeftLowerLeg, RightLowerLeg));
            map.insert(format!("{p}foot"), pick(LeftFoot, RightFoot));
            map.insert(format!("{p}toebase"), pick(LeftToes, RightToes));
            map.insert(format!("{p}toe"), pick(LeftToes, RightToes));
            map.insert(format!("{p}shoulder"), pick(LeftShoulder, RightShoulder));
            map.insert(format!("{p}arm"), pick(LeftUpperArm, RightUpperArm));
            map.insert(format!("{p}forearm"), pick(LeftLowerArm, RightLowerArm));
            map.insert(format!("{p}hand"), pick(LeftHand, RightHand));
            for carpal in ["index", "middle", "ring", "pinky"] {
                map.insert(format!("{p}inhand{carpal}"), pick(LeftHand, RightHand));
            }

            let digits = [
                ("thumb", pick(LeftThumbMetacarpal, RightThumbMetacarpal), pick(LeftThumbProximal, RightThumbProximal), pick(LeftThumbDistal, RightThumbDistal)),
                ("index", pick(LeftIndexProximal, RightIndexProximal), pick(LeftIndexIntermediate, RightIndexIntermediate), pick(LeftIndexDistal, RightIndexDistal)),
                ("middle", pick(LeftMiddleProximal, RightMiddleProximal), pick(LeftMiddleIntermediate, RightMiddleIntermediate), pick(LeftMiddleDistal, RightMiddleDistal)),
                ("ring", pick(LeftRingProximal, RightRingProximal), pick(LeftRingIntermediate, RightRingIntermediate), pick(LeftRingDistal, RightRingDistal)),
                ("pinky", pick(LeftLittleProximal, RightLittleProximal), pick(LeftLittleIntermediate, RightLittleIntermediate), pick(LeftLittleDistal, RightLittleDistal)),
            ];
            for (digit, first, second, third) in digits {
                map.insert(format!("{p}{digit}1"), first);
                map.insert(format!("{p}{digit}2"), second);
                map.insert(format!("{p}{digit}3"), third);
            }
        }

        map
    }

    pub fn insert(&mut self, source: impl Into<String>, target: HumanoidBone) {
        self.entries.insert(source.into().to_lowercase(), target);
    }

    /// Case-insensitive lookup of a source bone name.
    pub fn get(&self, source: &str) -> Option<HumanoidBone> {
        self.entries.get(&source.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RetargetMap {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    fn pick(self, left: HumanoidBone, right: HumanoidBone) -> HumanoidBone {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

/// Corrective rotations premultiplied onto every key of a target bone.
#[derive(Debug, Clone, PartialEq)]
pub struct RetargetProfile {
    corrections: HashMap<HumanoidBone, Quat>,
}

impl RetargetProfile {
    pub fn uncorrected() -> Self {
        Self {
            corrections: HashMap::new(),
        }
    }

    /// Hips pitched forward a quarter turn, right leg flipped half a turn.
    /// Left leg and right foot carry explicit identity entries.
    pub fn fbx_to_gltf() -> Self {
        Self::uncorrected()
            .with(HumanoidBone::Hips, euler_xyz(Vec3::new(FRAC_PI_2, 0.0, 0.0)))
            .with(HumanoidBone::LeftUpperLeg, Quat::IDENTITY)
            .with(HumanoidBone::RightUpperLeg, euler_xyz(Vec3::new(PI, 0.0, 0.0)))
            .with(HumanoidBone::RightFoot, Quat::IDENTITY)
    }

    pub fn with(mut self, bone: HumanoidBone, correction: Quat) -> Self {
        self.corrections.insert(bone, correction);
        self
    }

    pub fn correction(&self, bone: HumanoidBone) -> Option<Quat> {
        self.corrections.get(&bone).copied()
    }
}

impl Default for RetargetProfile {
    fn default() -> Self {
        Self::fbx_to_gltf()
    }
}

/// Source and target bone names seen by one retarget pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetargetReport {
    /// Distinct source node names, in track order.
    pub source_bones: Vec<String>,
    /// Target node name of every surviving track.
    pub mapped_bones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipRetargeter {
    map: RetargetMap,
    profile: RetargetProfile,
}

impl ClipRetargeter {
    pub fn new(map: RetargetMap, profile: RetargetProfile) -> Self {
        Self { map, profile }
    }

    pub fn map(&self) -> &RetargetMap {
        &self.map
    }

    pub fn profile(&self) -> &RetargetProfile {
        &self.profile
    }

    /// Rotation-only copy of `clip` addressed to `humanoid`'s nodes.
    ///
    /// `None` when no track survives; callers treat that as "no motion".
    pub fn retarget<H: Humanoid>(&self, clip: &Clip, humanoid: &H) -> Option<Clip> {
        self.retarget_with_report(clip, humanoid).0
    }

    pub fn retarget_with_report<H: Humanoid>(&self, clip: &Clip, humanoid: &H) -> (Option<Clip>, RetargetReport) {
        let mut report = RetargetReport::default();
        let mut tracks = Vec::new();

        for track in &clip.tracks {
            let source = track.node();
            if !report.source_bones.iter().any(|seen| seen == source) {
                report.source_bones.push(source.to_string());
            }

            // Position and scale tracks are dropped.
            let property = track.property();
            if !property.to_lowercase().contains("quaternion") {
                continue;
            }
            let Some(target) = self.map.get(source) else {
                continue;
            };
            let Some(node) = humanoid.node_name(target) else {
                continue;
            };

            let renamed = track.renamed(format!("{node}.{property}"));
            let retargeted = match self.profile.correction(target) {
                Some(correction) => renamed.map_rotations(|key| correction * key),
                None => renamed,
            };
            report.mapped_bones.push(node.to_string());
            tracks.push(retargeted);
        }

        if tracks.is_empty() {
            return (None, report);
        }
        let retargeted = Clip {
            name: clip.name.clone(),
            duration: clip.duration,
            tracks,
        };
        (Some(retargeted), report)
    }
}

/// Track-name form of a node name: whitespace becomes `_`, `[]:./` are removed.
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            '[' | ']' | ':' | '.' | '/' => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanoid::HumanoidRig;

    fn avatar() -> HumanoidRig<u32> {
        HumanoidRig::new()
            .with(HumanoidBone::Hips, 0, "J_Bip_C_Hips")
            .with(HumanoidBone::Spine, 1, "J_Bip_C_Spine")
            .with(HumanoidBone::RightUpperLeg, 2, "J_Bip_R_UpperLeg")
            .with(HumanoidBone::LeftUpperLeg, 3, "J_Bip_L_UpperLeg")
            .with(HumanoidBone::LeftHand, 4, "J_Bip_L_Hand")
    }

    fn rotation_clip(node: &str, keys: Vec<Quat>) -> Clip {
        let times = (0..keys.len()).map(|i| i as f32).collect();
        let track = Track::rotations(format!("{node}.quaternion"), times, keys).unwrap();
        Clip::new("motion", 1.5, vec![track])
    }

    #[test]
    fn standard_map_covers_table() {
        let map = RetargetMap::standard();
        assert_eq!(map.get("Hips"), Some(HumanoidBone::Hips));
        assert_eq!(map.get("Spine3"), Some(HumanoidBone::UpperChest));
        assert_eq!(map.get("LeftUpLeg"), Some(HumanoidBone::LeftUpperLeg));
        assert_eq!(map.get("RightToe_End"), None);
        assert_eq!(map.get("rightinhandpinky"), Some(HumanoidBone::RightHand));
        assert_eq!(map.get("LeftThumb1"), Some(HumanoidBone::LeftThumbMetacarpal));
        assert_eq!(map.get("RightPinky3"), Some(HumanoidBone::RightLittleDistal));
        assert_eq!(map.get("leftring2"), Some(HumanoidBone::LeftRingIntermediate));
        assert_eq!(map.len(), 65);
    }

    #[test]
    fn scale_only_clip_is_dropped() {
        let track = Track::vectors("Hips.scale", vec![0.0], vec![Vec3::ONE]).unwrap();
        let clip = Clip::new("motion", 1.0, vec![track]);
        assert!(ClipRetargeter::default().retarget(&clip, &avatar()).is_none());
    }

    #[test]
    fn unmapped_bone_is_dropped() {
        let clip = rotation_clip("Tail", vec![Quat::IDENTITY]);
        assert!(ClipRetargeter::default().retarget(&clip, &avatar()).is_none());
    }

    #[test]
    fn bone_missing_on_target_is_dropped() {
        let clip = rotation_clip("Neck", vec![Quat::IDENTITY]);
        assert!(ClipRetargeter::default().retarget(&clip, &avatar()).is_none());
    }

    #[test]
    fn hips_keys_are_corrected_and_renamed() {
        let keys = vec![Quat::from_rotation_y(0.3), Quat::from_rotation_z(-0.7)];
        let clip = rotation_clip("Hips", keys.clone());

        let out = ClipRetargeter::default().retarget(&clip, &avatar()).unwrap();
        assert_eq!(out.name, "motion");
        assert_eq!(out.duration, 1.5);
        assert_eq!(out.tracks.len(), 1);
        assert_eq!(out.tracks[0].name(), "J_Bip_C_Hips.quaternion");

        let correction = Quat::from_euler(bevy::math::EulerRot::XYZ, FRAC_PI_2, 0.0, 0.0);
        let crate::clip::Keyframes::Rotations(values) = out.tracks[0].keyframes() else {
            panic!("expected rotation keys");
        };
        for (got, key) in values.iter().zip(&keys) {
            assert!(got.angle_between(correction * *key) < 1e-5);
        }
    }

    #[test]
    fn source_clip_is_left_untouched() {
        let keys = vec![Quat::from_rotation_x(0.2)];
        let clip = rotation_clip("RightUpLeg", keys.clone());
        let before = clip.clone();

        let retargeter = ClipRetargeter::default();
        let first = retargeter.retarget(&clip, &avatar()).unwrap();
        let second = retargeter.retarget(&clip, &avatar()).unwrap();

        assert_eq!(clip, before);
        assert_eq!(first, second);
    }

    #[test]
    fn uncorrected_bones_keep_their_keys() {
        let keys = vec![Quat::from_rotation_x(0.2)];
        let clip = rotation_clip("Spine", keys.clone());
        let out = ClipRetargeter::default().retarget(&clip, &avatar()).unwrap();
        assert_eq!(out.tracks[0].keyframes(), &crate::clip::Keyframes::Rotations(keys));
    }

    #[test]
    fn report_lists_sources_and_targets() {
        let tracks = vec![
            Track::rotations("Hips.quaternion", vec![0.0], vec![Quat::IDENTITY]).unwrap(),
            Track::vectors("Hips.position", vec![0.0], vec![Vec3::ZERO]).unwrap(),
            Track::rotations("LeftInHandIndex.quaternion", vec![0.0], vec![Quat::IDENTITY]).unwrap(),
            Track::rotations("Tail.quaternion", vec![0.0], vec![Quat::IDENTITY]).unwrap(),
        ];
        let clip = Clip::new("motion", 1.0, tracks);

        let (out, report) = ClipRetargeter::default().retarget_with_report(&clip, &avatar());
        assert_eq!(out.map(|clip| clip.tracks.len()), Some(2));
        assert_eq!(report.source_bones, vec!["Hips", "LeftInHandIndex", "Tail"]);
        assert_eq!(report.mapped_bones, vec!["J_Bip_C_Hips", "J_Bip_L_Hand"]);
    }

    #[test]
    fn node_names_are_sanitized_like_track_bindings() {
        assert_eq!(sanitize_node_name("mixamorig:Hips"), "mixamorigHips");
        assert_eq!(sanitize_node_name("Left Arm [1].x/y"), "Left_Arm_1xy");
    }
}
