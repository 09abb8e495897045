//! WebGPU rendering module
//!
//! The scene is built on the CPU as one triangle list in play-area pixels,
//! then mapped to NDC and drawn with a single flat-color pipeline.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderInitError, RenderState, screen_to_ndc};
pub use scene::{Effects, build_scene};
pub use vertex::Vertex;
