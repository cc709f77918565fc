use ash::vk;
use log::trace;
use vma::Alloc;

use super::{
  determine_gpu_allocation_info, get_persistently_mapped_pointer, MemoryMapPointer,
  VkMemoryPreference, VkMemoryResource,
};

// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/quick_start.html
// https://github.com/expenses/vulkan-base/blob/main/ash-helpers/src/lib.rs

pub struct VkBuffer {
  // For debugging
  pub name: String,
  /// Size in bytes
  pub size: usize,
  /// Native Vulkan buffer
  pub buffer: vk::Buffer,
  pub allocation: vma::Allocation,
  mapped_pointer: Option<MemoryMapPointer>,
}

impl VkBuffer {
  /// Allocate empty vulkan buffer. Everything except `VkMemoryPreference::GpuOnly`
  /// is persistently mapped.
  pub fn empty(
    allocator: &vma::Allocator,
    name: String,
    size: usize,
    usage: vk::BufferUsageFlags,
    memory_pref: VkMemoryPreference,
  ) -> Self {
    trace!("Allocating buffer '{}' ({} bytes)", name, size);
    let buffer_info = vk::BufferCreateInfo::builder()
      .size(size as u64)
      .usage(usage)
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .build();
    let alloc_info = determine_gpu_allocation_info(&memory_pref);

    let (buffer, allocation) = unsafe {
      allocator
        .create_buffer(&buffer_info, &alloc_info)
        .unwrap_or_else(|_| panic!("Failed allocating buffer '{}' ({} bytes)", name, size))
    };
    let mapped_pointer = get_persistently_mapped_pointer(allocator, &allocation);

    Self {
      name,
      size,
      buffer,
      allocation,
      mapped_pointer,
    }
  }

  /// Staging buffer filled with `bytes`, used as a copy source.
  pub fn staging_from_data(allocator: &vma::Allocator, name: String, bytes: &[u8]) -> Self {
    let buffer = VkBuffer::empty(
      allocator,
      name,
      bytes.len(),
      vk::BufferUsageFlags::TRANSFER_SRC,
      VkMemoryPreference::ScratchTransfer,
    );
    buffer.write_to_mapped(bytes);
    buffer
  }

  /// Buffer to copy GPU results into, read with `read_from_mapped()` after the submit.
  pub fn readback(allocator: &vma::Allocator, name: String, size: usize) -> Self {
    VkBuffer::empty(
      allocator,
      name,
      size,
      vk::BufferUsageFlags::TRANSFER_DST,
      VkMemoryPreference::Readback,
    )
  }

  pub unsafe fn delete(&mut self, allocator: &vma::Allocator) {
    allocator.destroy_buffer(self.buffer, &mut self.allocation)
  }
}

impl VkMemoryResource for VkBuffer {
  fn get_name(&self) -> &String {
    &self.name
  }

  fn get_size_bytes(&self) -> usize {
    self.size
  }

  fn get_mapped_pointer(&self) -> Option<MemoryMapPointer> {
    self.mapped_pointer
  }
}
