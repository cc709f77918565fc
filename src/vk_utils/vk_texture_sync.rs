use log::trace;

use ash;
use ash::vk;

use super::create_image_barrier;
use super::VkTexture;
use crate::config::Config;

/// Previous op that could have touched the image in this layout.
fn access_mask_for_layout(layout: vk::ImageLayout) -> vk::AccessFlags {
  match layout {
    vk::ImageLayout::UNDEFINED => vk::AccessFlags::empty(),
    vk::ImageLayout::TRANSFER_DST_OPTIMAL => vk::AccessFlags::TRANSFER_WRITE,
    vk::ImageLayout::TRANSFER_SRC_OPTIMAL => vk::AccessFlags::TRANSFER_READ,
    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
    vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => {
      vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
    }
    vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
      vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    }
    _ => vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
  }
}

impl VkTexture {
  /// ## Docs
  /// * https://github.com/KhronosGroup/Vulkan-Docs/wiki/Synchronization-Examples-(Legacy-synchronization-APIs)
  /// * https://www.khronos.org/blog/understanding-vulkan-synchronization
  /// * https://vulkan-tutorial.com/Texture_mapping/Images#page_Transition-barrier-masks
  ///
  /// ## Params:
  /// * `new_layout` - next layout to set to e.g. `COLOR_ATTACHMENT_OPTIMAL`
  ///     or `SHADER_READ_ONLY_OPTIMAL`
  /// * `dst_access_mask` - op we will do e.g. `COLOR_ATTACHMENT_WRITE`
  pub fn barrier_prepare_for_layout_transition(
    &mut self,
    new_layout: vk::ImageLayout,
    dst_access_mask: vk::AccessFlags,
  ) -> vk::ImageMemoryBarrier {
    self.trace_log_layout_transition(new_layout);

    let barrier = create_image_barrier(
      self.image,
      self.aspect_flags(),
      self.layout,
      new_layout,
      access_mask_for_layout(self.layout),
      dst_access_mask,
    );

    self.layout = new_layout;
    barrier
  }

  pub fn barrier_prepare_for_shader_read(&mut self) -> vk::ImageMemoryBarrier {
    self.barrier_prepare_for_layout_transition(
      vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
      vk::AccessFlags::SHADER_READ,
    )
  }

  pub fn barrier_prepare_attachment_for_write(&mut self) -> vk::ImageMemoryBarrier {
    if self.is_color() {
      self.barrier_prepare_for_layout_transition(
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
      )
    } else if self.is_depth_stencil() {
      self.barrier_prepare_for_layout_transition(
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
          | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
      )
    } else {
      panic!("Tried to transition texture {} for shader write, but it's neither color or depth-stencil texture.", self.get_name());
    }
  }

  pub fn barrier_prepare_for_transfer_dst(&mut self) -> vk::ImageMemoryBarrier {
    self.barrier_prepare_for_layout_transition(
      vk::ImageLayout::TRANSFER_DST_OPTIMAL,
      vk::AccessFlags::TRANSFER_WRITE,
    )
  }

  pub fn barrier_prepare_for_transfer_src(&mut self) -> vk::ImageMemoryBarrier {
    self.barrier_prepare_for_layout_transition(
      vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
      vk::AccessFlags::TRANSFER_READ,
    )
  }

  /// Record barriers created by `prepare_barrier` for every texture.
  ///
  /// Stage masks are coarse (`ALL_COMMANDS`), there are only a handful of
  /// barriers per submit.
  pub unsafe fn cmd_transition_barriers(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    textures: &mut [&mut VkTexture],
    prepare_barrier: impl Fn(&mut VkTexture) -> vk::ImageMemoryBarrier,
  ) {
    let barriers = textures
      .iter_mut()
      .map(|tex| prepare_barrier(&mut **tex))
      .collect::<Vec<_>>();

    device.cmd_pipeline_barrier(
      command_buffer,
      vk::PipelineStageFlags::ALL_COMMANDS,
      vk::PipelineStageFlags::ALL_COMMANDS,
      vk::DependencyFlags::empty(),
      &[],
      &[],
      &barriers,
    );
  }

  pub unsafe fn cmd_transition_attachments_for_read_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    textures: &mut [&mut VkTexture],
  ) {
    Self::cmd_transition_barriers(device, command_buffer, textures, |tex| {
      tex.barrier_prepare_for_shader_read()
    });
  }

  pub unsafe fn cmd_transition_attachments_for_write_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    textures: &mut [&mut VkTexture],
  ) {
    Self::cmd_transition_barriers(device, command_buffer, textures, |tex| {
      tex.barrier_prepare_attachment_for_write()
    });
  }

  fn trace_log_layout_transition(&self, new_layout: vk::ImageLayout) {
    if Config::DEBUG_LAYOUT_TRANSITIONS {
      trace!(
        "VkTexture::LayoutTransition '{}' ({:?} -> {:?})",
        self.get_name(),
        self.layout,
        new_layout
      );
    }
  }
}
