pub mod compositor;
pub mod context;

pub use compositor::{LayerCompositor, LayerUniforms, compute_layer_uniforms};
pub use context::GpuContext;
