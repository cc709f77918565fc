use log::{debug, error, info, warn};
use std::ffi::CStr;

use ash::extensions::ext::DebugUtils;
use ash::vk;

/// Validation layer reports push descriptors (VK_KHR_push_descriptor) as unbound sets,
/// even though the shader sees them just fine.
const IGNORED_MESSAGES: [&str; 1] = [
  "a descriptor set must have been bound to n at the same pipeline bind point",
];

fn is_message_ignored(message: &str) -> bool {
  IGNORED_MESSAGES.iter().any(|m| message.contains(m))
}

// called on validation layer message
extern "system" fn vulkan_debug_callback(
  message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
  message_type: vk::DebugUtilsMessageTypeFlagsEXT,
  p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
  _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
  let message = unsafe {
    let callback_data = *p_callback_data;
    CStr::from_ptr(callback_data.p_message).to_string_lossy()
  };
  if is_message_ignored(&message) {
    return vk::FALSE;
  }

  let message_str = format!("[VK_dbg_callback, {:?}]: {}", message_type, message);
  match message_severity {
    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => error!("{}", message_str),
    vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => warn!("{}", message_str),
    vk::DebugUtilsMessageSeverityFlagsEXT::INFO => info!("{}", message_str),
    _ => debug!("{}", message_str),
  };

  vk::FALSE
}

/// Route validation layer messages to the `log` crate.
pub fn setup_debug_reporting(
  entry: &ash::Entry,
  instance: &ash::Instance,
) -> (DebugUtils, vk::DebugUtilsMessengerEXT) {
  let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
    .message_severity(
      vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
        | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
      // VERBOSE spams about extensions
    )
    .message_type(
      vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
        | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
    )
    .pfn_user_callback(Some(vulkan_debug_callback))
    .build();

  let debug_utils_loader = DebugUtils::new(entry, instance);

  let debug_messenger = unsafe {
    debug_utils_loader
      .create_debug_utils_messenger(&debug_info, None)
      .expect("Failed to create debug messenger")
  };

  (debug_utils_loader, debug_messenger)
}
