// mostly inspired by:
// - https://github.com/zeux/niagara/tree/master/src
// - https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L256
mod create_barrier;
mod create_framebuffer;
mod create_sampler;
mod debug;
mod device;
mod load_shader;
mod pipeline;
mod render_pass;
mod uniforms;
mod vk_buffer;
mod vk_memory_resource;
mod vk_texture;
mod vk_texture_sync;

pub use self::create_barrier::*;
pub use self::create_framebuffer::*;
pub use self::create_sampler::*;
pub use self::debug::*;
pub use self::device::*;
pub use self::load_shader::*;
pub use self::pipeline::*;
pub use self::render_pass::*;
pub use self::uniforms::*;
pub use self::vk_buffer::*;
pub use self::vk_memory_resource::*;
pub use self::vk_texture::*;
pub use self::vk_texture_sync::*;
