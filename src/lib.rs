pub mod config;
pub mod demo_scene;
pub mod sss;
pub mod utils;

#[cfg(feature = "gpu")]
pub mod render_graph;
#[cfg(feature = "gpu")]
pub mod vk_ctx;
#[cfg(feature = "gpu")]
pub mod vk_utils;
