use std::marker::{Send, Sync};

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum VkMemoryPreference {
  /// Usage: render targets, sampled textures.
  GpuOnly,
  /// CPU-mapped memory that is read on GPU (e.g. uniforms).
  /// Will be persistently mapped.
  GpuMappable,
  /// Temporary allocation used when copying CPU data to GPU-only memory.
  /// No guarantee if it's CPU or GPU. Nor should you care.
  ///
  /// Will be persistently mapped.
  ScratchTransfer,
  /// Temporary allocation used when copying GPU results back to CPU.
  /// Will be persistently mapped.
  Readback,
}

pub fn determine_gpu_allocation_info(
  memory_pref: &VkMemoryPreference,
) -> vma::AllocationCreateInfo {
  match memory_pref {
    VkMemoryPreference::GpuOnly => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      ..Default::default()
    },
    VkMemoryPreference::GpuMappable => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferDevice,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE
        | vma::AllocationCreateFlags::MAPPED,
      ..Default::default()
    },
    VkMemoryPreference::ScratchTransfer => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::Auto,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_SEQUENTIAL_WRITE
        | vma::AllocationCreateFlags::MAPPED,
      ..Default::default()
    },
    VkMemoryPreference::Readback => vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::AutoPreferHost,
      flags: vma::AllocationCreateFlags::HOST_ACCESS_RANDOM | vma::AllocationCreateFlags::MAPPED,
      ..Default::default()
    },
  }
}

pub fn get_persistently_mapped_pointer(
  allocator: &vma::Allocator,
  allocation: &vma::Allocation,
) -> Option<MemoryMapPointer> {
  let alloc_info = allocator.get_allocation_info(allocation);
  let ptr = alloc_info.mapped_data;
  if ptr.is_null() {
    None
  } else {
    Some(MemoryMapPointer(ptr))
  }
}

/// Wrapper over a raw pointer to make it moveable and accessible from other threads
#[derive(Clone, Copy)]
pub struct MemoryMapPointer(pub *mut ::std::os::raw::c_void);
unsafe impl Send for MemoryMapPointer {}
unsafe impl Sync for MemoryMapPointer {}

pub trait VkMemoryResource {
  fn get_name(&self) -> &String;
  fn get_size_bytes(&self) -> usize;
  fn get_mapped_pointer(&self) -> Option<MemoryMapPointer>;

  fn write_to_mapped(&self, bytes: &[u8]) {
    let size = bytes.len();
    if size > self.get_size_bytes() {
      panic!(
        "Tried to write {} bytes to '{}' ({} bytes)",
        size,
        self.get_name(),
        self.get_size_bytes()
      );
    }

    match self.get_mapped_pointer() {
      Some(pointer) => {
        let slice = unsafe { std::slice::from_raw_parts_mut(pointer.0 as *mut u8, size) };
        slice.copy_from_slice(bytes);
      }
      None => panic!(
        "Tried to write {} bytes to unmapped '{}'",
        size,
        self.get_name()
      ),
    }
  }

  /// Copy of the whole mapped memory.
  fn read_from_mapped(&self) -> Vec<u8> {
    let size = self.get_size_bytes();
    match self.get_mapped_pointer() {
      Some(pointer) => {
        let slice = unsafe { std::slice::from_raw_parts(pointer.0 as *const u8, size) };
        slice.to_vec()
      }
      None => panic!("Tried to read from unmapped '{}'", self.get_name()),
    }
  }
}
