pub mod context;
pub mod pipeline;
pub mod renderer;

#[cfg(feature = "egui")]
pub mod egui_surface;

#[cfg(feature = "wasm")]
pub mod canvas_surface;

// Re-export main types
pub use context::{Color, DrawCommand, DrawSurface, RecordingSurface, Stroke};
pub use pipeline::{RedrawReason, RenderPipeline};
pub use renderer::{MapRenderer, MapTheme, RenderScene, RenderStats};

#[cfg(feature = "egui")]
pub use egui_surface::EguiSurface;

#[cfg(feature = "wasm")]
pub use canvas_surface::CanvasSurface;
