use log::trace;

use ash::extensions::khr::{Surface, Swapchain};
use ash::prelude::VkResult;
use ash::vk;

use crate::vk_utils::create_image_view;

pub fn size_to_rect_vk(size: &vk::Extent2D) -> vk::Rect2D {
  vk::Rect2D {
    offset: vk::Offset2D { x: 0, y: 0 },
    extent: *size,
  }
}

/// Swapchain format: B8G8R8A8_UNORM in SRGB_NONLINEAR color space. UNORM, so
/// the fragment shader output is written as-is, with no srgb encode.
/// https://stackoverflow.com/questions/66401081/vulkan-swapchain-format-unorm-vs-srgb
pub fn get_swapchain_format(
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> Option<vk::SurfaceFormatKHR> {
  let surface_formats = unsafe {
    surface_loader
      .get_physical_device_surface_formats(phys_device, surface_khr)
      .ok()?
  };

  surface_formats.into_iter().find(|surface_fmt| {
    surface_fmt.format == vk::Format::B8G8R8A8_UNORM
      && surface_fmt.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
  })
}

/// Surface capabilities change with window size, re-queried before every
/// swapchain rebuild.
pub fn get_surface_capabilities(
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
) -> VkResult<vk::SurfaceCapabilitiesKHR> {
  let capabilities =
    unsafe { surface_loader.get_physical_device_surface_capabilities(phys_device, surface_khr)? };
  trace!("Surface capabilities: {:?}", capabilities);
  Ok(capabilities)
}

fn get_pre_transform(capabilities: &vk::SurfaceCapabilitiesKHR) -> vk::SurfaceTransformFlagsKHR {
  if capabilities
    .supported_transforms
    .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
  {
    vk::SurfaceTransformFlagsKHR::IDENTITY
  } else {
    capabilities.current_transform
  }
}

fn get_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
  let count = capabilities.min_image_count + 1;
  if capabilities.max_image_count == 0 {
    count // max_image_count == 0 means no limit
  } else {
    count.min(capabilities.max_image_count)
  }
}

/// https://registry.khronos.org/vulkan/specs/1.3-extensions/man/html/VkPresentModeKHR.html
/// https://github.com/EmbarkStudios/kajiya/blob/main/crates/lib/kajiya-backend/src/vulkan/swapchain.rs#L85
pub fn get_present_mode(
  surface_loader: &Surface,
  surface_khr: vk::SurfaceKHR,
  phys_device: vk::PhysicalDevice,
  vsync: bool,
) -> VkResult<vk::PresentModeKHR> {
  let preference: &[vk::PresentModeKHR] = if vsync {
    &[vk::PresentModeKHR::FIFO_RELAXED, vk::PresentModeKHR::FIFO]
  } else {
    &[vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
  };

  let available = unsafe {
    surface_loader.get_physical_device_surface_present_modes(phys_device, surface_khr)?
  };

  let present_mode = preference
    .iter()
    .copied()
    .find(|mode| available.contains(mode))
    .unwrap_or(vk::PresentModeKHR::FIFO); // only FIFO support is mandatory
  trace!("Present mode: {:?} (vsync={})", present_mode, vsync);
  Ok(present_mode)
}

/// Creates the swapchain. `old_swapchain` is the retired predecessor (if any),
/// given to the driver so it may recycle its internals. The caller still has
/// to destroy the old handle afterwards.
pub fn create_swapchain_khr(
  swapchain_loader: &Swapchain,
  surface_khr: vk::SurfaceKHR,
  surface_format: &vk::SurfaceFormatKHR,
  capabilities: &vk::SurfaceCapabilitiesKHR,
  size: &vk::Extent2D,
  queue_family_index: u32,
  present_mode: vk::PresentModeKHR,
  old_swapchain: vk::SwapchainKHR,
) -> VkResult<vk::SwapchainKHR> {
  let queue_family_indices = [queue_family_index];
  let create_info = vk::SwapchainCreateInfoKHR::builder()
    .surface(surface_khr)
    .min_image_count(get_image_count(capabilities))
    .image_format(surface_format.format)
    .image_color_space(surface_format.color_space)
    .image_extent(*size)
    .image_array_layers(1)
    .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
    .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
    .queue_family_indices(&queue_family_indices)
    .present_mode(present_mode)
    .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
    .pre_transform(get_pre_transform(capabilities))
    .clipped(true)
    .old_swapchain(old_swapchain);

  let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };
  trace!("Swapchain created ({}x{})", size.width, size.height);
  Ok(swapchain)
}

pub fn create_swapchain_images(
  swapchain_loader: &Swapchain,
  swapchain: vk::SwapchainKHR,
  device: &ash::Device,
  image_format: vk::Format,
) -> VkResult<(Vec<vk::Image>, Vec<vk::ImageView>)> {
  // images are owned by the swapchain, only the views are ours to destroy
  let swapchain_images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
  trace!("Will create {} swapchain image views", swapchain_images.len());

  let mut swapchain_image_views = Vec::with_capacity(swapchain_images.len());
  for &swapchain_image in &swapchain_images {
    swapchain_image_views.push(create_image_view(device, swapchain_image, image_format)?);
  }

  Ok((swapchain_images, swapchain_image_views))
}
