use log::{info, trace, warn};
use std::ffi::{CStr, CString};

use ash::extensions::{ext::DebugUtils, khr::PushDescriptor};
use ash::vk;

fn from_c_str(s: &[std::os::raw::c_char]) -> &CStr {
  unsafe { CStr::from_ptr(s.as_ptr()) }
}

fn get_app_version() -> u32 {
  let to_u32 = |s: &str| s.parse::<u32>().unwrap_or(0);

  vk::make_api_version(
    0,
    to_u32(env!("CARGO_PKG_VERSION_MAJOR")),
    to_u32(env!("CARGO_PKG_VERSION_MINOR")),
    to_u32(env!("CARGO_PKG_VERSION_PATCH")),
  )
}

fn get_layer_names(graphics_debugging: bool) -> Vec<&'static CStr> {
  let mut layer_names = Vec::new();
  if graphics_debugging {
    layer_names.push(unsafe {
      CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0")
    });
  }
  layer_names
}

/// Headless, no surface extensions.
fn get_extension_names(graphics_debugging: bool) -> Vec<*const std::os::raw::c_char> {
  let mut names = Vec::new();
  if graphics_debugging {
    names.push(DebugUtils::name().as_ptr());
  }
  names
}

pub fn create_instance(graphics_debugging: bool) -> (ash::Entry, ash::Instance) {
  let entry = unsafe { ash::Entry::load().expect("Failed to create ash::Entry") };

  let app_name =
    CString::new(env!("CARGO_PKG_NAME")).expect("Package name contains a NUL character");

  let app_info = vk::ApplicationInfo::builder()
    .application_name(&app_name)
    .application_version(get_app_version())
    .api_version(vk::make_api_version(0, 1, 2, 0))
    .build();

  let layer_names = get_layer_names(graphics_debugging);
  let layers_names_raw: Vec<*const std::os::raw::c_char> =
    layer_names.iter().map(|name| name.as_ptr()).collect();
  let extension_names_raw = get_extension_names(graphics_debugging);

  let create_info = vk::InstanceCreateInfo::builder()
    .application_info(&app_info)
    .enabled_layer_names(&layers_names_raw)
    .enabled_extension_names(&extension_names_raw)
    .build();

  let instance: ash::Instance = unsafe {
    entry
      .create_instance(&create_info, None)
      .expect("Failed to create ash::Instance")
  };

  trace!("Ash instance created");
  (entry, instance)
}

fn find_queue_family(instance: &ash::Instance, phys_device: vk::PhysicalDevice) -> Option<usize> {
  let q_props = unsafe { instance.get_physical_device_queue_family_properties(phys_device) };

  q_props.iter().position(|q| {
    q.queue_flags.contains(vk::QueueFlags::GRAPHICS)
      && q.queue_flags.contains(vk::QueueFlags::TRANSFER)
  })
}

fn has_push_descriptor(instance: &ash::Instance, phys_device: vk::PhysicalDevice) -> bool {
  let extensions = unsafe {
    instance
      .enumerate_device_extension_properties(phys_device)
      .unwrap_or_default()
  };
  extensions
    .iter()
    .any(|ext| from_c_str(&ext.extension_name) == PushDescriptor::name())
}

/// Picks physical device e.g. "GeForce GTX 1050 Ti" and graphic queue family index.
/// Discrete GPUs are preferred, but anything with a graphic queue will do.
pub fn pick_physical_device_and_queue_family_idx(
  instance: &ash::Instance,
) -> (vk::PhysicalDevice, u32) {
  let phys_devices = unsafe {
    instance
      .enumerate_physical_devices()
      .expect("Failed to enumerate physical devices")
  };
  trace!("Found {} physical devices", phys_devices.len());

  // list of devices that satisfy our conditions
  let mut candidates = phys_devices
    .iter()
    .filter(|&&phys_device| has_push_descriptor(instance, phys_device))
    .filter_map(|&phys_device| {
      find_queue_family(instance, phys_device).map(|idx| (phys_device, idx as u32))
    })
    .collect::<Vec<_>>();
  candidates.sort_by_key(|(phys_device, _)| {
    let props = unsafe { instance.get_physical_device_properties(*phys_device) };
    props.device_type != vk::PhysicalDeviceType::DISCRETE_GPU
  });

  match candidates.first() {
    None => panic!("No Vulkan device with graphic queue and VK_KHR_push_descriptor found"),
    Some(&(p_device, idx)) => {
      let props = unsafe { instance.get_physical_device_properties(p_device) };
      let device_name = from_c_str(&props.device_name);
      info!("Using physical device: {:?}", device_name);
      (p_device, idx)
    }
  }
}

/// First of the formats that can be used as depth-stencil attachment
/// and support transfers. Stencil is uploaded and read back by the CPU.
pub fn pick_depth_stencil_format(
  instance: &ash::Instance,
  phys_device: vk::PhysicalDevice,
) -> vk::Format {
  let candidates = [
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
  ];
  let required = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
    | vk::FormatFeatureFlags::TRANSFER_SRC
    | vk::FormatFeatureFlags::TRANSFER_DST;

  let format = candidates.iter().copied().find(|&format| {
    let props = unsafe { instance.get_physical_device_format_properties(phys_device, format) };
    props.optimal_tiling_features.contains(required)
  });
  match format {
    Some(f) => f,
    None => {
      warn!("No depth-stencil format supports transfers, stencil readback may fail");
      vk::Format::D32_SFLOAT_S8_UINT
    }
  }
}

/// Pick logical device
pub fn pick_device_and_queue(
  instance: &ash::Instance,
  phys_device: vk::PhysicalDevice,
  queue_family_index: u32,
) -> (ash::Device, vk::Queue) {
  trace!("Will pick logical device");
  let queue_prio = [1.0f32]; // only one queue
  let queue_create_infos = [vk::DeviceQueueCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .queue_priorities(&queue_prio)
    .build()];

  let device_extension_names_raw = [PushDescriptor::name().as_ptr()];
  let features = vk::PhysicalDeviceFeatures::default();

  let device_create_info = vk::DeviceCreateInfo::builder()
    .queue_create_infos(&queue_create_infos)
    .enabled_extension_names(&device_extension_names_raw)
    .enabled_features(&features)
    .build();

  let device: ash::Device = unsafe {
    instance
      .create_device(phys_device, &device_create_info, None)
      .expect("Failed to create (logical) device")
  };
  trace!("Logical device selected");

  let queue = unsafe { device.get_device_queue(queue_family_index, 0) }; // only one queue created above
  trace!("Queue on logical device selected");

  (device, queue)
}
