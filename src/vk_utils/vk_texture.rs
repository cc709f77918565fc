use log::trace;
use vma::Alloc;

use ash;
use ash::vk;

use super::{determine_gpu_allocation_info, VkBuffer, VkMemoryPreference};

pub struct VkTexture {
  // For debugging
  name: String,
  pub width: u32,
  pub height: u32,
  pub format: vk::Format,
  /// Native Vulkan image
  pub image: vk::Image,
  image_view: vk::ImageView,
  aspect_flags: vk::ImageAspectFlags,
  pub layout: vk::ImageLayout,
  pub allocation: vma::Allocation,
}

impl VkTexture {
  /// Linear depth and SSS strength.
  pub const SINGLE_CHANNEL_FLOAT_FORMAT: vk::Format = vk::Format::R32_SFLOAT;

  /// Content is undefined until the first write.
  pub fn empty(
    device: &ash::Device,
    allocator: &vma::Allocator,
    name: String,
    size: vk::Extent2D,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
    aspect: vk::ImageAspectFlags,
  ) -> VkTexture {
    trace!("Allocating texture '{}' {:?} {:?}", name, size, format);
    let create_info = vk::ImageCreateInfo::builder()
      .image_type(vk::ImageType::TYPE_2D)
      .extent(vk::Extent3D {
        width: size.width,
        height: size.height,
        depth: 1,
      })
      .format(format)
      .tiling(vk::ImageTiling::OPTIMAL)
      .usage(usage)
      .initial_layout(vk::ImageLayout::UNDEFINED)
      // verbose properties, but vulkan requires
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .samples(vk::SampleCountFlags::TYPE_1)
      .mip_levels(1)
      .array_layers(1)
      .build();

    let alloc_info = determine_gpu_allocation_info(&VkMemoryPreference::GpuOnly);

    let (image, allocation) = unsafe {
      allocator
        .create_image(&create_info, &alloc_info)
        .unwrap_or_else(|_| panic!("Failed allocating GPU memory for texture '{}'", name))
    };

    let view_info = vk::ImageViewCreateInfo::builder()
      .image(image)
      .view_type(vk::ImageViewType::TYPE_2D)
      .format(format)
      .subresource_range(vk::ImageSubresourceRange {
        aspect_mask: aspect,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
      });
    let image_view = unsafe {
      device
        .create_image_view(&view_info, None)
        .unwrap_or_else(|_| panic!("Failed creating image view for texture '{}'", name))
    };

    VkTexture {
      name: create_texture_name(name, size.width, size.height),
      width: size.width,
      height: size.height,
      format,
      image,
      allocation,
      layout: create_info.initial_layout,
      image_view,
      aspect_flags: aspect,
    }
  }

  pub fn image_view(&self) -> vk::ImageView {
    self.image_view
  }

  pub fn size(&self) -> vk::Extent2D {
    vk::Extent2D {
      width: self.width,
      height: self.height,
    }
  }

  pub fn get_name(&self) -> &String {
    &self.name
  }

  pub fn aspect_flags(&self) -> vk::ImageAspectFlags {
    self.aspect_flags
  }

  pub fn is_color(&self) -> bool {
    self.aspect_flags.contains(vk::ImageAspectFlags::COLOR)
  }

  pub fn is_depth_stencil(&self) -> bool {
    self
      .aspect_flags
      .contains(vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL)
  }

  fn copy_region(&self, aspect: vk::ImageAspectFlags) -> vk::BufferImageCopy {
    vk::BufferImageCopy::builder()
      .buffer_offset(0)
      .buffer_row_length(0) // tightly packed
      .buffer_image_height(0)
      .image_subresource(vk::ImageSubresourceLayers {
        aspect_mask: aspect,
        mip_level: 0,
        base_array_layer: 0,
        layer_count: 1,
      })
      .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
      .image_extent(vk::Extent3D {
        width: self.width,
        height: self.height,
        depth: 1,
      })
      .build()
  }

  /// Texture has to be in `TRANSFER_DST_OPTIMAL`.
  /// * `aspect` - single aspect, e.g. only `STENCIL` of a depth-stencil texture
  pub unsafe fn cmd_copy_from_buffer(
    &self,
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    buffer: &VkBuffer,
    aspect: vk::ImageAspectFlags,
  ) {
    device.cmd_copy_buffer_to_image(
      command_buffer,
      buffer.buffer,
      self.image,
      vk::ImageLayout::TRANSFER_DST_OPTIMAL,
      &[self.copy_region(aspect)],
    );
  }

  /// Texture has to be in `TRANSFER_SRC_OPTIMAL`.
  /// * `aspect` - single aspect, e.g. only `STENCIL` of a depth-stencil texture
  pub unsafe fn cmd_copy_to_buffer(
    &self,
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    buffer: &VkBuffer,
    aspect: vk::ImageAspectFlags,
  ) {
    device.cmd_copy_image_to_buffer(
      command_buffer,
      self.image,
      vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
      buffer.buffer,
      &[self.copy_region(aspect)],
    );
  }

  pub unsafe fn delete(&mut self, device: &ash::Device, allocator: &vma::Allocator) {
    device.destroy_image_view(self.image_view, None);
    allocator.destroy_image(self.image, &mut self.allocation)
  }
}

fn create_texture_name(name: String, width: u32, height: u32) -> String {
  format!("VkTexture({}, {}x{})", name, width, height)
}
