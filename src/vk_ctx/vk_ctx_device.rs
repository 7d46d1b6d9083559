use ash;
use ash::vk;

/// Physical device plus the one logical device/queue this app ever creates.
/// Destroyed explicitly from `VkCtx::destroy`, after everything that was
/// allocated from it.
pub struct VkCtxDevice {
  pub phys_device: vk::PhysicalDevice,
  pub queue_family_index: u32,
  pub device: ash::Device,
  pub queue: vk::Queue,
}

impl VkCtxDevice {
  pub unsafe fn destroy(&self) {
    self.device.destroy_device(None);
  }
}
