use ash;
use ash::vk;

pub struct VkCtxDevice {
  pub phys_device: vk::PhysicalDevice,
  pub queue_family_index: u32,
  pub device: ash::Device,
  pub queue: vk::Queue,
  /// Format of the stencil texture. Only the stencil aspect is ever used.
  pub depth_stencil_format: vk::Format,
}

impl VkCtxDevice {
  pub unsafe fn destroy(&mut self) {
    self.device.destroy_device(None);
  }
}
