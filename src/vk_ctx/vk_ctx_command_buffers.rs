use ash;
use ash::vk;
use log::trace;

pub struct VkCtxCommandBuffers {
  pub pool: vk::CommandPool,
  /// Used for uploads, blur passes and readback. Every submit waits for the device.
  pub setup_cb: vk::CommandBuffer,
}

impl VkCtxCommandBuffers {
  pub fn new(device: &ash::Device, queue_family_index: u32) -> Self {
    let pool_info = vk::CommandPoolCreateInfo::builder()
      .queue_family_index(queue_family_index)
      .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER | vk::CommandPoolCreateFlags::TRANSIENT);
    let pool = unsafe {
      device
        .create_command_pool(&pool_info, None)
        .expect("Failed creating command pool")
    };

    let alloc_info = vk::CommandBufferAllocateInfo::builder()
      .command_pool(pool)
      .level(vk::CommandBufferLevel::PRIMARY)
      .command_buffer_count(1);
    let setup_cb = unsafe {
      device
        .allocate_command_buffers(&alloc_info)
        .expect("Failed allocating setup command buffer")[0]
    };

    Self { pool, setup_cb }
  }

  /// Record `callback` into the setup command buffer, submit it, and block until
  /// the device is idle. Beginning the buffer also resets it.
  pub unsafe fn submit_and_wait(
    &self,
    device: &ash::Device,
    queue: vk::Queue,
    callback: impl FnOnce(&ash::Device, vk::CommandBuffer),
  ) {
    let cmd_buf = self.setup_cb;
    let begin_info =
      vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    device
      .begin_command_buffer(cmd_buf, &begin_info)
      .expect("Failed begin_command_buffer() for setup command buffer");

    callback(device, cmd_buf);

    device
      .end_command_buffer(cmd_buf)
      .expect("Failed end_command_buffer() for setup command buffer");
    let submit_info = vk::SubmitInfo::builder().command_buffers(std::slice::from_ref(&cmd_buf));
    device
      .queue_submit(queue, &[submit_info.build()], vk::Fence::null())
      .expect("Failed queue_submit() for setup command buffer");

    trace!("Setup command buffer submitted, waiting for the device");
    device
      .device_wait_idle()
      .expect("Failed device_wait_idle() after setup command buffer");
  }

  pub unsafe fn destroy(&self, device: &ash::Device) {
    device.destroy_command_pool(self.pool, None);
  }
}
