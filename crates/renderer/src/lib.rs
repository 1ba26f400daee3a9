//! Renderer: records the car model into a display list and hands it to a
//! graphics backend together with the uploaded skin.
//!
//! Backends: [`RecordingBackend`] keeps everything in memory (headless, used
//! by tests), [`WgpuBackend`] bakes polygons into GPU vertex buffers.

pub mod backend;
pub mod bake;
pub mod display_list;
pub mod gpu;
pub mod loader;
pub mod recording;

pub use backend::{ListHandle, RenderBackend, TextureHandle};
pub use bake::{BakedMesh, BakedVertex, Batch, bake};
pub use display_list::{
    Capability, DisplayList, DisplayListBuilder, DrawCommand, Primitive, Winding, record_mesh,
};
pub use gpu::{GpuDisplayList, GpuTexture, RenderTargets, WgpuBackend};
pub use loader::{Loader, LoaderConfig};
pub use recording::{RecordedTexture, RecordingBackend};
