//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Same color with a different alpha
pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

/// Colors for game elements
pub mod colors {
    use crate::sim::{ObstacleKind, PowerupKind};

    pub const BACKGROUND: [f32; 4] = [0.04, 0.04, 0.1, 1.0];
    pub const STAR: [f32; 4] = [1.0, 1.0, 1.0, 0.6];

    pub const PLAYER: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const PLAYER_SHIELD: [f32; 4] = [0.0, 1.0, 0.53, 1.0];
    pub const PLAYER_INVINCIBLE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const PLAYER_SHRUNK: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    pub const PLAYER_EVADE: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
    pub const HITBOX: [f32; 4] = [1.0, 1.0, 1.0, 0.8];
    pub const MAGNET_AURA: [f32; 4] = [1.0, 0.0, 1.0, 0.15];

    pub const FRAGMENT: [f32; 4] = [0.53, 1.0, 0.53, 1.0];
    pub const POPUP: [f32; 4] = [1.0, 0.9, 0.2, 1.0];
    pub const DANGER: [f32; 4] = [1.0, 0.0, 0.2, 1.0];

    pub fn obstacle(kind: ObstacleKind) -> [f32; 4] {
        match kind {
            ObstacleKind::Normal => [1.0, 0.2, 0.4, 1.0],
            ObstacleKind::Fast => [1.0, 0.53, 0.0, 1.0],
            ObstacleKind::Large => [0.8, 0.0, 0.2, 1.0],
            ObstacleKind::Homing => [1.0, 0.0, 1.0, 1.0],
            ObstacleKind::Splitter => [0.0, 1.0, 0.0, 1.0],
            ObstacleKind::Wave => [0.0, 1.0, 1.0, 1.0],
            ObstacleKind::Ghost => [0.53, 0.53, 1.0, 1.0],
            ObstacleKind::Laser => [1.0, 1.0, 0.0, 1.0],
        }
    }

    pub fn powerup(kind: PowerupKind) -> [f32; 4] {
        match kind {
            PowerupKind::Shield => [0.0, 1.0, 0.53, 1.0],
            PowerupKind::Slow => [0.53, 0.53, 1.0, 1.0],
            PowerupKind::Shrink => [1.0, 1.0, 0.0, 1.0],
            PowerupKind::Magnet => [1.0, 0.0, 1.0, 1.0],
            PowerupKind::TimeBonus => [1.0, 0.8, 0.0, 1.0],
        }
    }
}
