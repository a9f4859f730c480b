use bevy::prelude::*;

pub const GRID_COLOR: Color = Color::srgba(0.25, 0.25, 0.25, 0.35);
pub const AXIS_LENGTH: f32 = 2.0;

#[derive(Clone, Copy, Debug)]
pub struct GroundGridConfig {
    pub size: f32,
    pub divisions: u32,
    /// Lift above the ground plane to avoid z-fighting.
    pub y_offset: f32,
    pub color: Color,
}

impl Default for GroundGridConfig {
    fn default() -> Self {
        Self {
            size: 200.0,
            divisions: 200,
            y_offset: 0.002,
            color: GRID_COLOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLineSegment {
    pub start: Vec3,
    pub end: Vec3,
}

/// Full-length lines of a square grid centred on the origin.
pub fn build_grid_lines(config: GroundGridConfig) -> Vec<GridLineSegment> {
    if config.size <= 0.0 || config.divisions == 0 {
        return Vec::new();
    }

    let half = config.size * 0.5;
    let step = config.size / config.divisions as f32;
    let y = config.y_offset;
    let mut lines = Vec::with_capacity((config.divisions as usize + 1) * 2);
    for i in 0..=config.divisions {
        let offset = -half + i as f32 * step;
        lines.push(GridLineSegment {
            start: Vec3::new(-half, y, offset),
            end: Vec3::new(half, y, offset),
        });
        lines.push(GridLineSegment {
            start: Vec3::new(offset, y, -half),
            end: Vec3::new(offset, y, half),
        });
    }
    lines
}

#[derive(Resource, Debug, Clone)]
pub struct GroundGrid {
    pub lines: Vec<GridLineSegment>,
    pub color: Color,
}

impl GroundGrid {
    pub fn new(config: GroundGridConfig) -> Self {
        Self {
            lines: build_grid_lines(config),
            color: config.color,
        }
    }
}

pub fn draw_ground_grid(mut gizmos: Gizmos, grid: Res<GroundGrid>) {
    for segment in &grid.lines {
        gizmos.line(segment.start, segment.end, grid.color);
    }

    let y = Vec3::Y * 0.004;
    gizmos.line(y, y + Vec3::X * AXIS_LENGTH, Color::srgb(1.0, 0.0, 0.0));
    gizmos.line(y, y + Vec3::Y * AXIS_LENGTH, Color::srgb(0.0, 1.0, 0.0));
    gizmos.line(y, y + Vec3::Z * AXIS_LENGTH, Color::srgb(0.0, 0.0, 1.0));
}
