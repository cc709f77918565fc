use log::info;
use std::mem::ManuallyDrop;

use ash;
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::PushDescriptor;
use ash::vk;

use super::*;

/// Kitchen sink for Vulkan stuff. Headless, there is no window or swapchain,
/// results are read back to the CPU.
pub struct VkCtx {
  pub entry: ash::Entry,
  pub instance: ash::Instance,
  pub device: VkCtxDevice,
  pub command_buffers: VkCtxCommandBuffers,
  pub pipeline_cache: vk::PipelineCache,
  /// Destroyed explicitly in `destroy()`, before the device.
  pub allocator: ManuallyDrop<vma::Allocator>,
  pub push_descriptor: PushDescriptor,

  // samplers
  pub default_texture_sampler_linear: vk::Sampler,
  pub default_texture_sampler_nearest: vk::Sampler,

  // debug
  pub debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VkCtx {
  pub fn vk_device(&self) -> &ash::Device {
    &self.device.device
  }

  pub unsafe fn destroy(&mut self) {
    info!("VkCtx::destroy()");
    let device = &self.device.device;
    device
      .device_wait_idle()
      .expect("Failed device_wait_idle() before destroy");

    device.destroy_sampler(self.default_texture_sampler_linear, None);
    device.destroy_sampler(self.default_texture_sampler_nearest, None);
    self.command_buffers.destroy(device);
    device.destroy_pipeline_cache(self.pipeline_cache, None);
    ManuallyDrop::drop(&mut self.allocator);

    self.device.destroy();

    if let Some((debug_utils_loader, debug_messenger)) = self.debug_utils.take() {
      debug_utils_loader.destroy_debug_utils_messenger(debug_messenger, None);
    }
    self.instance.destroy_instance(None);
    info!("VkCtx::destroy() finished");
  }
}

pub trait WithSetupCmdBuffer {
  /// Record commands and block until the GPU has executed them.
  fn with_setup_cb(&self, callback: impl FnOnce(&ash::Device, vk::CommandBuffer));
}

impl WithSetupCmdBuffer for VkCtx {
  fn with_setup_cb(&self, callback: impl FnOnce(&ash::Device, vk::CommandBuffer)) {
    let device = &self.device;
    unsafe {
      self
        .command_buffers
        .submit_and_wait(&device.device, device.queue, callback)
    };
  }
}
