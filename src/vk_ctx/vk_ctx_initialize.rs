use log::trace;
use std::mem::ManuallyDrop;

use ash::extensions::khr::{Surface, Swapchain};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use crate::config::Config;
use crate::vk_ctx::vk_ctx::VkCtx;
use crate::vk_ctx::vk_ctx_device::VkCtxDevice;
use crate::vk_utils::*;

/// One-time Vulkan setup, straight-line and fail-fast. The swapchain, its
/// framebuffers and the pipeline are NOT created here - the frame driver
/// builds them lazily on the first frame through the same path it uses for
/// every recreation.
///
/// https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L332
pub fn vk_ctx_initialize(window: &winit::window::Window, config: &Config) -> VkCtx {
  let (entry, instance) = create_instance(window, config.graphics_debugging);
  let debug_utils = if config.graphics_debugging {
    Some(setup_debug_messenger(&entry, &instance))
  } else {
    None
  };

  // surface data
  let surface_loader = Surface::new(&entry, &instance); // generic OS-independent thing
  let surface_khr = unsafe {
    // real OS-backed thing
    ash_window::create_surface(
      &entry,
      &instance,
      window.raw_display_handle(),
      window.raw_window_handle(),
      None,
    )
    .expect("Failed to create window surface")
  };
  trace!("Surface created");

  // devices
  let (phys_device, queue_family_index) =
    pick_physical_device_and_queue_family_idx(&instance, &surface_loader, surface_khr);
  let (device, queue) = pick_device_and_queue(&instance, phys_device, queue_family_index);

  // swapchain extension loader. The swapchain itself is per swap target
  let swapchain_loader = Swapchain::new(&instance, &device);

  // command pool. Command buffers are allocated per swap target generation
  let command_pool = create_command_pool(&device, queue_family_index);

  // gpu memory allocator
  let allocator = unsafe {
    vma::Allocator::new(vma::AllocatorCreateInfo::new(&instance, &device, phys_device))
      .expect("Failed creating memory allocator (VMA lib init)")
  };

  // pipelines
  let pipeline_cache = create_pipeline_cache(&device);

  VkCtx {
    entry,
    instance,
    device: VkCtxDevice {
      phys_device,
      queue_family_index,
      device,
      queue,
    },
    swapchain_loader,
    command_pool,
    pipeline_cache,
    allocator: ManuallyDrop::new(allocator),
    surface_loader,
    surface_khr,
    debug_utils,
  }
}
