use ash;
use ash::extensions::khr::PushDescriptor;
use ash::vk;

use super::{VkBuffer, VkTexture};

// Uses VK_KHR_push_descriptor, so there are no descriptor pools or descriptor sets to manage.
// Every pass pushes its resources right before the draw.

////////////////////////////////
/// Layout utils
////////////////////////////////

/// Create layout for a single uniform buffer object.
/// That layout will be one of layouts gathered in DescriptorSetLayout.
pub fn create_ubo_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  vk::DescriptorSetLayoutBinding::builder()
    .binding(binding)
    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
    .descriptor_count(1)
    .stage_flags(stage_flags)
    .build()
}

/// Create layout for a single texture/sampler object.
/// That layout will be one of layouts gathered in DescriptorSetLayout.
pub fn create_texture_binding(
  binding: u32,
  stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding {
  vk::DescriptorSetLayoutBinding::builder()
    .binding(binding)
    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
    .descriptor_count(1)
    .stage_flags(stage_flags)
    .build()
}

pub fn create_push_descriptor_layout(
  device: &ash::Device,
  bindings: Vec<vk::DescriptorSetLayoutBinding>,
) -> vk::DescriptorSetLayout {
  let create_info = vk::DescriptorSetLayoutCreateInfo::builder()
    .flags(vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR)
    .bindings(&bindings)
    .build();

  unsafe {
    device
      .create_descriptor_set_layout(&create_info, None)
      .expect("Failed to create DescriptorSetLayout")
  }
}

////////////////////////////////
/// Resource binding
////////////////////////////////

/// Pack stuff into struct to make it more palatable as param
pub struct ResouceBinder<'a> {
  pub push_descriptor: &'a PushDescriptor,
  pub command_buffer: vk::CommandBuffer,
  pub pipeline_layout: vk::PipelineLayout,
}

pub enum BindableResource<'a> {
  Uniform {
    binding: u32,
    buffer: &'a VkBuffer,
  },
  /// Texture has to be in the layout it will be read in.
  Texture {
    binding: u32,
    texture: &'a VkTexture,
    sampler: vk::Sampler,
  },
}

pub unsafe fn bind_resources_to_descriptors(
  binder: &ResouceBinder,
  descriptor_set: u32,
  resources_to_bind: &[BindableResource],
) {
  // vk::WriteDescriptorSet has POINTERS to these. Preallocated so that
  // pushing does not move the content.
  let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::with_capacity(resources_to_bind.len());
  let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::with_capacity(resources_to_bind.len());

  let next_descriptors: Vec<vk::WriteDescriptorSet> = resources_to_bind
    .iter()
    .map(|resource| match resource {
      BindableResource::Uniform { binding, buffer } => {
        buffer_infos.push(vk::DescriptorBufferInfo {
          buffer: buffer.buffer,
          offset: 0,
          range: vk::WHOLE_SIZE,
        });
        let data_slice = &buffer_infos[(buffer_infos.len() - 1)..buffer_infos.len()];
        vk::WriteDescriptorSet::builder()
          .dst_binding(*binding)
          .dst_array_element(0)
          .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
          .buffer_info(data_slice)
          .build()
      }
      BindableResource::Texture {
        binding,
        texture,
        sampler,
      } => {
        image_infos.push(vk::DescriptorImageInfo {
          image_layout: texture.layout,
          image_view: texture.image_view(),
          sampler: *sampler,
        });
        let data_slice = &image_infos[(image_infos.len() - 1)..image_infos.len()];
        vk::WriteDescriptorSet::builder()
          .dst_binding(*binding)
          .dst_array_element(0)
          .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
          .image_info(data_slice)
          .build()
      }
    })
    .collect();

  binder.push_descriptor.cmd_push_descriptor_set(
    binder.command_buffer,
    vk::PipelineBindPoint::GRAPHICS,
    binder.pipeline_layout,
    descriptor_set,
    next_descriptors.as_slice(),
  );
}
