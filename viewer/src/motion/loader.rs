use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, AsyncReadExt, LoadContext};
use bevy::prelude::*;
use gltf::animation::Interpolation;
use gltf::animation::util::ReadOutputs;
use rig::{Clip, ClipError, Track, sanitize_node_name};
use thiserror::Error;

const MOTION_EXTENSION: &str = "motion.glb";

/// First animation of a glTF file, tracks named after source-rig nodes.
#[derive(Asset, TypePath, Debug, Clone)]
pub struct MotionClip(pub Clip);

#[derive(Debug, Error)]
pub enum MotionLoaderError {
    #[error("Could not load motion: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("file contains no animation")]
    NoAnimation,
    #[error("malformed animation channel: {0}")]
    Clip(#[from] ClipError),
}

/// Read the first animation of a self-contained GLB into a [`Clip`].
///
/// Channels whose data lives in external buffers and morph-weight channels
/// are skipped. Cubic-spline outputs keep only their value element.
pub fn parse_motion_glb(bytes: &[u8]) -> Result<Clip, MotionLoaderError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let blob = gltf.blob.as_deref();
    let buffers: Vec<Option<&[u8]>> = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => blob,
            gltf::buffer::Source::Uri(_) => None,
        })
        .collect();

    let animation = gltf.animations().next().ok_or(MotionLoaderError::NoAnimation)?;
    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let node = channel.target().node();
        let node_name = node
            .name()
            .map(sanitize_node_name)
            .unwrap_or_else(|| format!("GltfNode{}", node.index()));
        let cubic = matches!(channel.sampler().interpolation(), Interpolation::CubicSpline);

        let reader = channel.reader(|buffer| buffers.get(buffer.index()).copied().flatten());
        let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();

        let track = match outputs {
            ReadOutputs::Rotations(rotations) => Track::rotations(
                format!("{node_name}.quaternion"),
                times,
                spline_values(rotations.into_f32().map(Quat::from_array).collect(), cubic),
            )?,
            ReadOutputs::Translations(translations) => Track::vectors(
                format!("{node_name}.position"),
                times,
                spline_values(translations.map(Vec3::from_array).collect(), cubic),
            )?,
            ReadOutputs::Scales(scales) => Track::vectors(
                format!("{node_name}.scale"),
                times,
                spline_values(scales.map(Vec3::from_array).collect(), cubic),
            )?,
            ReadOutputs::MorphTargetWeights(_) => continue,
        };
        tracks.push(track);
    }

    let name = animation.name().unwrap_or("motion");
    Ok(Clip::new(name, -1.0, tracks))
}

fn spline_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if !cubic {
        return values;
    }
    values.chunks_exact(3).map(|triple| triple[1]).collect()
}

#[derive(Default, TypePath)]
pub struct MotionClipLoader;

impl AssetLoader for MotionClipLoader {
    type Asset = MotionClip;
    type Settings = ();
    type Error = MotionLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(MotionClip(parse_motion_glb(&bytes)?))
    }

    fn extensions(&self) -> &[&str] {
        &[MOTION_EXTENSION]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_spline_keeps_value_element() {
        let values = vec![0, 1, 2, 10, 11, 12];
        assert_eq!(spline_values(values.clone(), true), vec![1, 11]);
        assert_eq!(spline_values(values, false).len(), 6);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(parse_motion_glb(b"not a gltf"), Err(MotionLoaderError::Gltf(_))));
    }
}
