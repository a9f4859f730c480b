use crate::clip::{Clip, Track};
use crate::pose::BonePoses;
use std::hash::Hash;

pub const DEFAULT_FADE_IN: f32 = 0.25;
pub const DEFAULT_FADE_OUT: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundChannel<B> {
    pub bone: B,
    pub track: Track,
}

/// Rotation tracks of a clip resolved to bone handles.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundClip<B> {
    name: String,
    duration: f32,
    channels: Vec<BoundChannel<B>>,
}

impl<B: Copy + Eq + Hash> BoundClip<B> {
    /// Resolve every rotation track by its node name.
    ///
    /// Tracks whose node cannot be resolved are skipped; `None` if none remain.
    /// Several tracks may resolve to the same bone; they are applied in clip
    /// order, so the last one wins at full weight.
    pub fn bind(clip: &Clip, mut resolve: impl FnMut(&str) -> Option<B>) -> Option<Self> {
        let channels: Vec<_> = clip
            .tracks
            .iter()
            .filter(|track| track.is_rotation())
            .filter_map(|track| {
                let bone = resolve(track.node())?;
                Some(BoundChannel {
                    bone,
                    track: track.clone(),
                })
            })
            .collect();

        if channels.is_empty() {
            return None;
        }
        Some(Self {
            name: clip.name.clone(),
            duration: clip.duration,
            channels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn channels(&self) -> &[BoundChannel<B>] {
        &self.channels
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fade {
    Steady,
    In { duration: f32 },
    Out { duration: f32 },
}

impl Fade {
    /// Weight change over `dt`; a zero-length fade completes in one step.
    fn step(duration: f32, dt: f32) -> f32 {
        if duration > 0.0 { dt / duration } else { 1.0 }
    }
}

#[derive(Debug, Clone)]
struct Layer<B> {
    clip: BoundClip<B>,
    time: f32,
    weight: f32,
    fade: Fade,
}

impl<B: Copy + Eq + Hash> Layer<B> {
    fn advance(&mut self, dt: f32) {
        self.time += dt;
        if self.clip.duration > 0.0 {
            self.time = self.time.rem_euclid(self.clip.duration);
        }
        match self.fade {
            Fade::Steady => {}
            Fade::In { duration } => {
                self.weight = (self.weight + Fade::step(duration, dt)).min(1.0);
                if self.weight >= 1.0 {
                    self.fade = Fade::Steady;
                }
            }
            Fade::Out { duration } => {
                self.weight = (self.weight - Fade::step(duration, dt)).max(0.0);
            }
        }
    }

    fn fade_out(&mut self, duration: f32) {
        if duration <= 0.0 {
            self.weight = 0.0;
        }
        self.fade = Fade::Out { duration };
    }

    fn finished(&self) -> bool {
        matches!(self.fade, Fade::Out { .. }) && self.weight <= 0.0
    }

    fn apply<P: BonePoses<B> + ?Sized>(&self, poses: &mut P) {
        if self.weight <= 0.0 {
            return;
        }
        for channel in &self.clip.channels {
            let (Some(key), Some(current)) = (
                channel.track.sample_rotation(self.time),
                poses.rotation(channel.bone),
            ) else {
                continue;
            };
            poses.set_rotation(channel.bone, current.slerp(key, self.weight));
        }
    }
}

/// Looping clip playback with cross-fades.
///
/// Layers are blended over whatever pose the bones already hold, so a
/// fading layer eases out of the pose written before it.
#[derive(Debug, Clone)]
pub struct MotionPlayer<B> {
    fade_in: f32,
    fade_out: f32,
    active: Option<Layer<B>>,
    fading: Vec<Layer<B>>,
}

impl<B> Default for MotionPlayer<B> {
    fn default() -> Self {
        Self {
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
            active: None,
            fading: Vec::new(),
        }
    }
}

impl<B: Copy + Eq + Hash> MotionPlayer<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fades(fade_in: f32, fade_out: f32) -> Self {
        Self {
            fade_in: fade_in.max(0.0),
            fade_out: fade_out.max(0.0),
            ..Self::default()
        }
    }

    /// Start `clip` from its first frame, fading out whatever was playing.
    pub fn play(&mut self, clip: BoundClip<B>) {
        if let Some(mut previous) = self.active.take() {
            previous.fade_out(self.fade_out);
            self.fading.push(previous);
        }
        let (weight, fade) = if self.fade_in > 0.0 {
            (
                0.0,
                Fade::In {
                    duration: self.fade_in,
                },
            )
        } else {
            (1.0, Fade::Steady)
        };
        self.active = Some(Layer {
            clip,
            time: 0.0,
            weight,
            fade,
        });
    }

    /// Fade the current clip out and hand control back.
    pub fn stop(&mut self) {
        if let Some(mut previous) = self.active.take() {
            previous.fade_out(self.fade_out);
            self.fading.push(previous);
        }
    }

    /// Whether a clip is in control of the skeleton.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Anything left to blend, including clips that are fading out.
    pub fn is_blending(&self) -> bool {
        self.active.is_some() || !self.fading.is_empty()
    }

    pub fn current(&self) -> Option<&BoundClip<B>> {
        self.active.as_ref().map(|layer| &layer.clip)
    }

    pub fn weight(&self) -> f32 {
        self.active.as_ref().map_or(0.0, |layer| layer.weight)
    }

    /// Playback position of the current clip in seconds.
    pub fn time(&self) -> Option<f32> {
        self.active.as_ref().map(|layer| layer.time)
    }

    /// Advance every layer by `dt` and write the blended rotations.
    pub fn advance<P: BonePoses<B> + ?Sized>(&mut self, dt: f32, poses: &mut P) {
        let dt = dt.max(0.0);
        for layer in &mut self.fading {
            layer.advance(dt);
        }
        self.fading.retain(|layer| !layer.finished());
        if let Some(layer) = &mut self.active {
            layer.advance(dt);
        }

        for layer in self.fading.iter().chain(self.active.as_ref()) {
            layer.apply(poses);
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.fading.clear();
    }
}
