mod image_layout_utils;
mod render_graph_resources;
mod sss_blur_ubo;

pub use self::image_layout_utils::*;
pub use self::render_graph_resources::*;
pub use self::sss_blur_ubo::*;
