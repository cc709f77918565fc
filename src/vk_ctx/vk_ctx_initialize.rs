use log::{info, trace};
use std::mem::ManuallyDrop;

use ash;
use ash::extensions::khr::PushDescriptor;
use ash::vk;

use super::*;
use crate::vk_utils::*;

fn create_allocator(
  instance: &ash::Instance,
  device: &ash::Device,
  phys_device: vk::PhysicalDevice,
) -> vma::Allocator {
  let create_info = vma::AllocatorCreateInfo::new(instance, device, phys_device);
  vma::Allocator::new(create_info).expect("Failed creating memory allocator")
}

/// Create headless Vulkan context.
/// * `graphics_debugging` - enable validation layers, their messages go to the logger
pub fn vk_ctx_initialize(graphics_debugging: bool) -> VkCtx {
  info!(
    "Initializing Vulkan (validation layers: {})",
    graphics_debugging
  );
  let (entry, instance) = create_instance(graphics_debugging);
  let debug_utils = if graphics_debugging {
    Some(setup_debug_reporting(&entry, &instance))
  } else {
    None
  };

  // device
  let (phys_device, queue_family_index) = pick_physical_device_and_queue_family_idx(&instance);
  let (device, queue) = pick_device_and_queue(&instance, phys_device, queue_family_index);
  let depth_stencil_format = pick_depth_stencil_format(&instance, phys_device);
  trace!("Depth-stencil format: {:?}", depth_stencil_format);

  let command_buffers = VkCtxCommandBuffers::new(&device, queue_family_index);

  let pipeline_cache = create_pipeline_cache(&device);
  let allocator = create_allocator(&instance, &device, phys_device);
  let push_descriptor = PushDescriptor::new(&instance, &device);

  let default_texture_sampler_linear =
    create_sampler(&device, vk::Filter::LINEAR, vk::Filter::LINEAR);
  let default_texture_sampler_nearest =
    create_sampler(&device, vk::Filter::NEAREST, vk::Filter::NEAREST);

  VkCtx {
    entry,
    instance,
    device: VkCtxDevice {
      phys_device,
      queue_family_index,
      device,
      queue,
      depth_stencil_format,
    },
    command_buffers,
    pipeline_cache,
    allocator: ManuallyDrop::new(allocator),
    push_descriptor,
    default_texture_sampler_linear,
    default_texture_sampler_nearest,
    debug_utils,
  }
}
