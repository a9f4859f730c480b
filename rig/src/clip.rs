use bevy::math::{Quat, Vec3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClipError {
    #[error("track `{track}` has {times} key times but {values} values")]
    KeyCountMismatch {
        track: String,
        times: usize,
        values: usize,
    },
    #[error("track `{track}` key times are not sorted at index {index}")]
    UnsortedTimes { track: String, index: usize },
    #[error("track `{track}` has a non-finite key time at index {index}")]
    NonFiniteTime { track: String, index: usize },
    #[error("track name `{0}` has no property part")]
    MissingProperty(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyframes {
    Rotations(Vec<Quat>),
    /// Translation or scale values.
    Vectors(Vec<Vec3>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Keyframes::Rotations(values) => values.len(),
            Keyframes::Vectors(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed values for one property of one node, named `<node>.<property>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    name: String,
    times: Vec<f32>,
    keyframes: Keyframes,
}

impl Track {
    pub fn new(name: impl Into<String>, times: Vec<f32>, keyframes: Keyframes) -> Result<Self, ClipError> {
        let name = name.into();
        if !name.contains('.') {
            return Err(ClipError::MissingProperty(name));
        }
        if times.len() != keyframes.len() {
            return Err(ClipError::KeyCountMismatch {
                track: name,
                times: times.len(),
                values: keyframes.len(),
            });
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(ClipError::NonFiniteTime { track: name, index });
        }
        if let Some(index) = times.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(ClipError::UnsortedTimes {
                track: name,
                index: index + 1,
            });
        }
        Ok(Self {
            name,
            times,
            keyframes,
        })
    }

    pub fn rotations(name: impl Into<String>, times: Vec<f32>, values: Vec<Quat>) -> Result<Self, ClipError> {
        Self::new(name, times, Keyframes::Rotations(values))
    }

    pub fn vectors(name: impl Into<String>, times: Vec<f32>, values: Vec<Vec3>) -> Result<Self, ClipError> {
        Self::new(name, times, Keyframes::Vectors(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node part of the name, before the first `.`.
    pub fn node(&self) -> &str {
        self.split().0
    }

    /// Property part of the name, after the first `.`.
    pub fn property(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        self.name.split_once('.').unwrap_or((self.name.as_str(), ""))
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn keyframes(&self) -> &Keyframes {
        &self.keyframes
    }

    pub fn is_rotation(&self) -> bool {
        matches!(self.keyframes, Keyframes::Rotations(_))
    }

    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Same keys under another name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            times: self.times.clone(),
            keyframes: self.keyframes.clone(),
        }
    }

    /// New track whose rotation keys are `f(key)`; vector tracks are copied.
    pub fn map_rotations(&self, f: impl Fn(Quat) -> Quat) -> Self {
        let keyframes = match &self.keyframes {
            Keyframes::Rotations(values) => Keyframes::Rotations(values.iter().map(|&q| f(q)).collect()),
            Keyframes::Vectors(values) => Keyframes::Vectors(values.clone()),
        };
        Self {
            name: self.name.clone(),
            times: self.times.clone(),
            keyframes,
        }
    }

    /// Rotation at `time`, clamped to the first and last key.
    pub fn sample_rotation(&self, time: f32) -> Option<Quat> {
        let Keyframes::Rotations(values) = &self.keyframes else {
            return None;
        };
        let (lo, hi, t) = self.bracket(time)?;
        Some(values[lo].slerp(values[hi], t))
    }

    pub fn sample_vector(&self, time: f32) -> Option<Vec3> {
        let Keyframes::Vectors(values) = &self.keyframes else {
            return None;
        };
        let (lo, hi, t) = self.bracket(time)?;
        Some(values[lo].lerp(values[hi], t))
    }

    fn bracket(&self, time: f32) -> Option<(usize, usize, f32)> {
        let last = self.times.len().checked_sub(1)?;
        if time <= self.times[0] {
            return Some((0, 0, 0.0));
        }
        if time >= self.times[last] {
            return Some((last, last, 0.0));
        }
        let hi = self.times.partition_point(|&t| t <= time);
        let lo = hi - 1;
        let span = self.times[hi] - self.times[lo];
        let t = if span > 0.0 {
            (time - self.times[lo]) / span
        } else {
            0.0
        };
        Some((lo, hi, t))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    /// Seconds; never shorter than the longest track.
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl Clip {
    /// A negative `duration` is derived from the tracks.
    pub fn new(name: impl Into<String>, duration: f32, tracks: Vec<Track>) -> Self {
        let end = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        let duration = if duration < 0.0 { end } else { duration.max(end) };
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
