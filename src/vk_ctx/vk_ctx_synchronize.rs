use ash;
use ash::vk;

use crate::error::{RenderError, RenderResult};
use crate::vk_utils::{create_fences, create_semaphores};

/**
Per-swapchain-image synchronization. Lives and dies with one swap target
generation, never shared across recreations.

https://www.khronos.org/assets/uploads/developers/library/2016-vulkan-devday-uk/7-Keeping-your-GPU-fed.pdf
*/
pub struct SwapTargetSynchronize {
  // one of each per swapchain image:
  pub image_available_semaphores: Vec<vk::Semaphore>,
  pub render_finished_semaphores: Vec<vk::Semaphore>,
  pub in_flight_fences: Vec<vk::Fence>,
}

impl SwapTargetSynchronize {
  pub fn new(device: &ash::Device, frames_in_flight: usize) -> RenderResult<Self> {
    let as_create_err =
      |e: vk::Result| RenderError::CreateSwapTarget(format!("sync primitives: {}", e));

    Ok(Self {
      image_available_semaphores: create_semaphores(device, frames_in_flight)
        .map_err(as_create_err)?,
      render_finished_semaphores: create_semaphores(device, frames_in_flight)
        .map_err(as_create_err)?,
      in_flight_fences: create_fences(device, frames_in_flight).map_err(as_create_err)?,
    })
  }

  pub unsafe fn destroy(&self, device: &ash::Device) {
    let semaphores = self
      .image_available_semaphores
      .iter()
      .chain(self.render_finished_semaphores.iter());
    for &semaphore in semaphores {
      device.destroy_semaphore(semaphore, None);
    }
    for &fence in &self.in_flight_fences {
      device.destroy_fence(fence, None);
    }
  }
}
