use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, AsyncReadExt, LoadContext};
use bevy::prelude::*;
use rig::HumanoidBone;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::f32::consts::PI;
use thiserror::Error;

const VRM_EXTENSION: &str = "vrm";
const GLB_MAGIC: &[u8; 4] = b"glTF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrmVersion {
    /// `VRM` extension; models face -Z.
    V0,
    /// `VRMC_vrm` extension; models face +Z.
    V1,
}

impl VrmVersion {
    /// Rotation that turns the model to face -Z, the player's forward.
    pub fn forward_correction(self) -> Quat {
        match self {
            Self::V0 => Quat::IDENTITY,
            Self::V1 => Quat::from_rotation_y(PI),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::V0 => "VRM 0.x",
            Self::V1 => "VRM 1.0",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrmHumanBone {
    pub bone: HumanoidBone,
    pub node: usize,
    /// Name the glTF scene loader gives the node.
    pub node_name: String,
}

/// Humanoid bone table of a VRM file; the scene itself is loaded as glTF.
#[derive(Asset, TypePath, Debug, Clone)]
pub struct VrmHumanoid {
    pub version: VrmVersion,
    pub bones: Vec<VrmHumanBone>,
}

impl VrmHumanoid {
    pub fn node_name(&self, bone: HumanoidBone) -> Option<&str> {
        self.bones
            .iter()
            .find(|entry| entry.bone == bone)
            .map(|entry| entry.node_name.as_str())
    }
}

#[derive(Debug, Error)]
pub enum VrmLoaderError {
    #[error("Could not load VRM: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not read GLB container: {0}")]
    Glb(#[from] gltf::Error),
    #[error("Could not parse glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("file has no VRM humanoid extension")]
    NotVrm,
}

#[derive(Debug, Deserialize)]
struct GltfDocument {
    #[serde(default)]
    nodes: Vec<GltfNode>,
    #[serde(default)]
    extensions: DocumentExtensions,
}

#[derive(Debug, Deserialize)]
struct GltfNode {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentExtensions {
    #[serde(rename = "VRMC_vrm")]
    vrm1: Option<Vrm1Extension>,
    #[serde(rename = "VRM")]
    vrm0: Option<Vrm0Extension>,
}

#[derive(Debug, Deserialize)]
struct Vrm1Extension {
    humanoid: Vrm1Humanoid,
}

#[derive(Debug, Deserialize)]
struct Vrm1Humanoid {
    #[serde(rename = "humanBones", default)]
    human_bones: BTreeMap<String, Vrm1HumanBone>,
}

#[derive(Debug, Deserialize)]
struct Vrm1HumanBone {
    node: usize,
}

#[derive(Debug, Deserialize)]
struct Vrm0Extension {
    humanoid: Vrm0Humanoid,
}

#[derive(Debug, Deserialize)]
struct Vrm0Humanoid {
    #[serde(rename = "humanBones", default)]
    human_bones: Vec<Vrm0HumanBone>,
}

#[derive(Debug, Deserialize)]
struct Vrm0HumanBone {
    bone: String,
    #[serde(default)]
    node: Option<i64>,
}

/// Parse the humanoid table from GLB bytes or plain glTF JSON.
///
/// Unknown bone names and out-of-range nodes are skipped.
pub fn parse_vrm_humanoid(bytes: &[u8]) -> Result<VrmHumanoid, VrmLoaderError> {
    let document: GltfDocument = if bytes.starts_with(GLB_MAGIC) {
        let glb = gltf::Glb::from_slice(bytes)?;
        serde_json::from_slice(&glb.json)?
    } else {
        serde_json::from_slice(bytes)?
    };

    let node_name = |index: usize| -> Option<String> {
        let node = document.nodes.get(index)?;
        Some(node.name.clone().unwrap_or_else(|| format!("GltfNode{index}")))
    };

    let (version, pairs): (VrmVersion, Vec<(HumanoidBone, usize)>) =
        match (&document.extensions.vrm1, &document.extensions.vrm0) {
            (Some(vrm1), _) => (
                VrmVersion::V1,
                vrm1.humanoid
                    .human_bones
                    .iter()
                    .filter_map(|(name, entry)| Some((HumanoidBone::from_name(name)?, entry.node)))
                    .collect(),
            ),
            (None, Some(vrm0)) => (
                VrmVersion::V0,
                vrm0.humanoid
                    .human_bones
                    .iter()
                    .filter_map(|entry| {
                        let node = usize::try_from(entry.node?).ok()?;
                        Some((HumanoidBone::from_vrm0_name(&entry.bone)?, node))
                    })
                    .collect(),
            ),
            (None, None) => return Err(VrmLoaderError::NotVrm),
        };

    let bones = pairs
        .into_iter()
        .filter_map(|(bone, node)| {
            Some(VrmHumanBone {
                bone,
                node,
                node_name: node_name(node)?,
            })
        })
        .collect();

    Ok(VrmHumanoid { version, bones })
}

#[derive(Default, TypePath)]
pub struct VrmHumanoidLoader;

impl AssetLoader for VrmHumanoidLoader {
    type Asset = VrmHumanoid;
    type Settings = ();
    type Error = VrmLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        parse_vrm_humanoid(&bytes)
    }

    fn extensions(&self) -> &[&str] {
        &[VRM_EXTENSION]
    }
}
