//! Humanoid bone vocabulary and the lookup capability the animation layers use.
//!
//! Names follow the VRM 1.0 humanoid specification (`hips`, `leftUpperArm`,
//! `leftIndexProximal`, ...). Skeletons are not required to expose every bone;
//! callers always branch on absence.

use std::collections::HashMap;
use std::hash::Hash;

macro_rules! humanoid_bones {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Canonical humanoid joint.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum HumanoidBone {
            $($variant),*
        }

        impl HumanoidBone {
            pub const ALL: &'static [HumanoidBone] = &[$(HumanoidBone::$variant),*];

            /// camelCase VRM name, e.g. `leftUpperArm`.
            pub fn name(self) -> &'static str {
                match self {
                    $(HumanoidBone::$variant => $name),*
                }
            }

            /// Parse a VRM 1.0 bone name. Matching is exact (case sensitive).
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(HumanoidBone::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

humanoid_bones! {
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",
    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",
    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl HumanoidBone {
    /// Parse a VRM 0.x bone name.
    ///
    /// VRM 0.x shifts the thumb chain by one segment relative to 1.0
    /// (`thumbProximal` is the 1.0 metacarpal, `thumbIntermediate` the 1.0
    /// proximal). Every other name is shared between the two versions.
    pub fn from_vrm0_name(name: &str) -> Option<Self> {
        match name {
            "leftThumbProximal" => Some(HumanoidBone::LeftThumbMetacarpal),
            "leftThumbIntermediate" => Some(HumanoidBone::LeftThumbProximal),
            "rightThumbProximal" => Some(HumanoidBone::RightThumbMetacarpal),
            "rightThumbIntermediate" => Some(HumanoidBone::RightThumbProximal),
            "leftThumbMetacarpal" | "rightThumbMetacarpal" => None,
            other => Self::from_name(other),
        }
    }
}

/// Finger joints that stay curled while the procedural layer is active.
///
/// The thumb metacarpal is left alone so the thumb keeps its rest opposition.
pub const CURLED_FINGERS: [HumanoidBone; 28] = [
    HumanoidBone::LeftThumbProximal,
    HumanoidBone::LeftThumbDistal,
    HumanoidBone::LeftIndexProximal,
    HumanoidBone::LeftIndexIntermediate,
    HumanoidBone::LeftIndexDistal,
    HumanoidBone::LeftMiddleProximal,
    HumanoidBone::LeftMiddleIntermediate,
    HumanoidBone::LeftMiddleDistal,
    HumanoidBone::LeftRingProximal,
    HumanoidBone::LeftRingIntermediate,
    HumanoidBone::LeftRingDistal,
    HumanoidBone::LeftLittleProximal,
    HumanoidBone::LeftLittleIntermediate,
    HumanoidBone::LeftLittleDistal,
    HumanoidBone::RightThumbProximal,
    HumanoidBone::RightThumbDistal,
    HumanoidBone::RightIndexProximal,
    HumanoidBone::RightIndexIntermediate,
    HumanoidBone::RightIndexDistal,
    HumanoidBone::RightMiddleProximal,
    HumanoidBone::RightMiddleIntermediate,
    HumanoidBone::RightMiddleDistal,
    HumanoidBone::RightRingProximal,
    HumanoidBone::RightRingIntermediate,
    HumanoidBone::RightRingDistal,
    HumanoidBone::RightLittleProximal,
    HumanoidBone::RightLittleIntermediate,
    HumanoidBone::RightLittleDistal,
];

/// Bone lookup capability exposed by a loaded avatar.
pub trait Humanoid {
    type Bone: Copy + Eq + Hash;

    fn resolve_bone(&self, bone: HumanoidBone) -> Option<Self::Bone>;

    /// Scene node name backing `bone`; retargeted tracks are addressed by it.
    fn node_name(&self, bone: HumanoidBone) -> Option<&str>;

    /// First bone of `chain` the skeleton exposes.
    fn resolve_first(&self, chain: &[HumanoidBone]) -> Option<Self::Bone> {
        chain.iter().find_map(|&bone| self.resolve_bone(bone))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RigBone<B> {
    handle: B,
    node_name: String,
}

/// Humanoid bone table for one skeleton instance.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanoidRig<B> {
    bones: HashMap<HumanoidBone, RigBone<B>>,
}

impl<B> Default for HumanoidRig<B> {
    fn default() -> Self {
        Self {
            bones: HashMap::new(),
        }
    }
}

impl<B: Copy + Eq + Hash> HumanoidRig<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bone: HumanoidBone, handle: B, node_name: impl Into<String>) {
        self.bones.insert(
            bone,
            RigBone {
                handle,
                node_name: node_name.into(),
            },
        );
    }

    pub fn with(mut self, bone: HumanoidBone, handle: B, node_name: impl Into<String>) -> Self {
        self.insert(bone, handle, node_name);
        self
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn contains(&self, bone: HumanoidBone) -> bool {
        self.bones.contains_key(&bone)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HumanoidBone, B, &str)> {
        self.bones
            .iter()
            .map(|(bone, entry)| (*bone, entry.handle, entry.node_name.as_str()))
    }

    /// Handle of the node called `node_name`, if it backs a humanoid bone.
    pub fn handle_by_node_name(&self, node_name: &str) -> Option<B> {
        self.bones
            .values()
            .find(|entry| entry.node_name == node_name)
            .map(|entry| entry.handle)
    }
}

impl<B: Copy + Eq + Hash> Humanoid for HumanoidRig<B> {
    type Bone = B;

    fn resolve_bone(&self, bone: HumanoidBone) -> Option<B> {
        self.bones.get(&bone).map(|entry| entry.handle)
    }

    fn node_name(&self, bone: HumanoidBone) -> Option<&str> {
        self.bones.get(&bone).map(|entry| entry.node_name.as_str())
    }
}
