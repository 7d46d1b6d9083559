use log::{info, trace};
use std::ffi::{CStr, CString};

use ash::extensions::{
  ext::DebugUtils,
  khr::{Surface, Swapchain},
};
use ash::vk;
use raw_window_handle::HasRawDisplayHandle;

pub fn create_instance(
  window: &winit::window::Window,
  graphics_debugging: bool,
) -> (ash::Entry, ash::Instance) {
  let entry = unsafe { ash::Entry::load().expect("Failed to load vulkan library") };

  let app_name = CString::new(env!("CARGO_PKG_NAME")).unwrap();
  let app_version = {
    let ver = |s: &str| s.parse::<u32>().unwrap();
    vk::make_api_version(
      0,
      ver(env!("CARGO_PKG_VERSION_MAJOR")),
      ver(env!("CARGO_PKG_VERSION_MINOR")),
      ver(env!("CARGO_PKG_VERSION_PATCH")),
    )
  };
  let app_info = vk::ApplicationInfo::builder()
    .application_name(&app_name)
    .application_version(app_version)
    .api_version(vk::make_api_version(0, 1, 1, 0));

  let validation_layer = CString::new("VK_LAYER_KHRONOS_validation").unwrap();
  let mut layer_names_raw: Vec<*const i8> = Vec::new();
  if graphics_debugging {
    layer_names_raw.push(validation_layer.as_ptr());
  }

  // surface + platform-specific surface (xlib/wayland/win32/metal)
  let mut extension_names_raw =
    ash_window::enumerate_required_extensions(window.raw_display_handle())
      .expect("This platform has no Vulkan surface extensions")
      .to_vec();
  if graphics_debugging {
    extension_names_raw.push(DebugUtils::name().as_ptr());
  }

  let create_info = vk::InstanceCreateInfo::builder()
    .application_info(&app_info)
    .enabled_layer_names(&layer_names_raw)
    .enabled_extension_names(&extension_names_raw);

  let instance = unsafe {
    entry
      .create_instance(&create_info, None)
      .expect("Failed to create vulkan instance")
  };
  trace!("Vulkan instance created");

  (entry, instance)
}

fn find_graphics_present_queue_family(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> Option<u32> {
  let queue_families =
    unsafe { instance.get_physical_device_queue_family_properties(phys_device) };

  for (index, family) in queue_families.iter().enumerate() {
    if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
      continue;
    }
    let supports_present = unsafe {
      surface_loader
        .get_physical_device_surface_support(phys_device, index as u32, surface_khr)
        .expect("Failed checking if physical device can present on our surface")
    };
    if supports_present {
      return Some(index as u32);
    }
  }
  None
}

/// Picks physical device e.g. "GeForce GTX 1050 Ti" and the queue family that
/// can both draw and present on our surface. Prefers a discrete GPU, settles
/// for whatever else qualifies.
pub fn pick_physical_device_and_queue_family_idx(
  instance: &ash::Instance,
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
) -> (vk::PhysicalDevice, u32) {
  let phys_devices = unsafe {
    instance
      .enumerate_physical_devices()
      .expect("Failed to enumerate physical devices")
  };
  trace!("Found {} physical devices", phys_devices.len());

  let mut discrete: Option<(vk::PhysicalDevice, u32)> = None;
  let mut fallback: Option<(vk::PhysicalDevice, u32)> = None;

  for &phys_device in &phys_devices {
    let queue_family =
      match find_graphics_present_queue_family(instance, surface_loader, surface_khr, phys_device)
      {
        Some(idx) => idx,
        None => continue,
      };

    let props = unsafe { instance.get_physical_device_properties(phys_device) };
    if props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU && discrete.is_none() {
      discrete = Some((phys_device, queue_family));
    }
    if fallback.is_none() {
      fallback = Some((phys_device, queue_family));
    }
  }

  let (phys_device, queue_family_index) = discrete
    .or(fallback)
    .expect("No devices capable of both graphics and presentation found");

  let props = unsafe { instance.get_physical_device_properties(phys_device) };
  let device_name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) };
  info!("Using physical device: {:?}", device_name);

  (phys_device, queue_family_index)
}

/// Create logical device with a single graphics+present queue.
pub fn pick_device_and_queue(
  instance: &ash::Instance,
  phys_device: vk::PhysicalDevice,
  queue_family_index: u32,
) -> (ash::Device, vk::Queue) {
  let queue_priorities = [1.0f32];
  let queue_create_infos = [vk::DeviceQueueCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .queue_priorities(&queue_priorities)
    .build()];

  let device_extensions = [Swapchain::name().as_ptr()];
  // drawing a vertex-colored mesh needs no optional features
  let features = vk::PhysicalDeviceFeatures::default();

  let device_create_info = vk::DeviceCreateInfo::builder()
    .queue_create_infos(&queue_create_infos)
    .enabled_extension_names(&device_extensions)
    .enabled_features(&features);

  let device = unsafe {
    instance
      .create_device(phys_device, &device_create_info, None)
      .expect("Failed to create (logical) device")
  };
  trace!("Logical device created");

  let queue = unsafe { device.get_device_queue(queue_family_index, 0) }; // queue index 0, we only asked for one
  (device, queue)
}
