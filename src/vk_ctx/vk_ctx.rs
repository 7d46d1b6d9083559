use log::info;
use std::mem::ManuallyDrop;

use ash;
use ash::extensions::ext::DebugUtils;
use ash::extensions::khr::{Surface, Swapchain};
use ash::vk;

use super::VkCtxDevice;

/** Kitchen sink for the long-lived Vulkan stuff. Everything that survives a
swapchain recreation lives here; per-generation resources live in `SwapTarget`
and `MeshPipeline`. */
pub struct VkCtx {
  pub entry: ash::Entry,
  pub instance: ash::Instance,
  pub device: VkCtxDevice,
  /// Extension loader, reused for every swap target generation.
  pub swapchain_loader: Swapchain,
  pub command_pool: vk::CommandPool,
  pub pipeline_cache: vk::PipelineCache,
  pub allocator: ManuallyDrop<vma::Allocator>,

  // surface
  pub surface_loader: Surface,
  pub surface_khr: vk::SurfaceKHR,

  // debug, present when graphics_debugging is on
  pub debug_utils: Option<(DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VkCtx {
  /// Full synchronization barrier. Nothing submitted before this call can
  /// still reference a resource after it returns.
  pub fn wait_idle(&self) {
    unsafe {
      self
        .device
        .device
        .device_wait_idle()
        .expect("Failed device_wait_idle()");
    }
  }

  pub unsafe fn destroy(&mut self) {
    info!("VkCtx::destroy()");
    let device = &self.device.device;

    device.destroy_command_pool(self.command_pool, None);
    device.destroy_pipeline_cache(self.pipeline_cache, None);
    // allocator's drop needs a live device
    ManuallyDrop::drop(&mut self.allocator);
    self.surface_loader.destroy_surface(self.surface_khr, None);

    if let Some((debug_utils_loader, debug_messenger)) = &self.debug_utils {
      debug_utils_loader.destroy_debug_utils_messenger(*debug_messenger, None);
    }

    self.device.destroy();
    self.instance.destroy_instance(None);
    info!("VkCtx::destroy() finished");
  }
}
