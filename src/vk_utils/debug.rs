use log::{log, Level};
use std::borrow::Cow;
use std::ffi::CStr;

use ash::extensions::ext::DebugUtils;
use ash::vk;

// Validation layer messages routed into the `log` crate so they interleave
// with our own output.

fn severity_to_log_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Level {
  match severity {
    vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => Level::Error,
    vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => Level::Warn,
    vk::DebugUtilsMessageSeverityFlagsEXT::INFO => Level::Info,
    _ => Level::Debug,
  }
}

extern "system" fn debug_utils_callback(
  message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
  message_type: vk::DebugUtilsMessageTypeFlagsEXT,
  p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
  _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
  let callback_data = unsafe { *p_callback_data };
  let message = unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() };
  let message_id = if callback_data.p_message_id_name.is_null() {
    Cow::from("-")
  } else {
    unsafe { CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy() }
  };

  log!(
    severity_to_log_level(message_severity),
    "[VK][{:?}][{}] {}",
    message_type,
    message_id,
    message
  );

  vk::FALSE
}

pub fn setup_debug_messenger(
  entry: &ash::Entry,
  instance: &ash::Instance,
) -> (DebugUtils, vk::DebugUtilsMessengerEXT) {
  // no VERBOSE, it is mostly loader chatter about extensions
  let severities = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO;
  let types = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
  let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
    .message_severity(severities)
    .message_type(types)
    .pfn_user_callback(Some(debug_utils_callback));

  let debug_utils_loader = DebugUtils::new(entry, instance);
  let messenger = unsafe {
    debug_utils_loader
      .create_debug_utils_messenger(&create_info, None)
      .expect("Failed to create vulkan debug messenger")
  };

  (debug_utils_loader, messenger)
}
