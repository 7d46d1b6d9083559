use ash::prelude::VkResult;
use ash::vk;

// https://github.com/zeux/niagara/blob/master/src/resources.cpp

/// Plain color view over a single 2D image, no mips.
pub fn create_image_view(
  device: &ash::Device,
  image: vk::Image,
  image_format: vk::Format,
) -> VkResult<vk::ImageView> {
  let subresource_range = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
  };

  let create_info = vk::ImageViewCreateInfo::builder()
    .image(image)
    .view_type(vk::ImageViewType::TYPE_2D)
    .format(image_format)
    .subresource_range(subresource_range);

  unsafe { device.create_image_view(&create_info, None) }
}

pub fn create_semaphores(device: &ash::Device, count: usize) -> VkResult<Vec<vk::Semaphore>> {
  let create_info = vk::SemaphoreCreateInfo::default();
  (0..count)
    .map(|_| unsafe { device.create_semaphore(&create_info, None) })
    .collect()
}

/// Fences start signaled, so the first wait on them does not deadlock.
pub fn create_fences(device: &ash::Device, count: usize) -> VkResult<Vec<vk::Fence>> {
  let create_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
  (0..count)
    .map(|_| unsafe { device.create_fence(&create_info, None) })
    .collect()
}

pub fn create_viewport(size: &vk::Extent2D) -> vk::Viewport {
  // vertex data is already in vulkan NDC (y-down), no flip needed
  vk::Viewport {
    x: 0f32,
    y: 0f32,
    width: size.width as f32,
    height: size.height as f32,
    min_depth: 0f32,
    max_depth: 1.0f32,
  }
}

pub fn create_command_pool(device: &ash::Device, queue_family_index: u32) -> vk::CommandPool {
  // RESET_COMMAND_BUFFER: the implicit reset in begin_command_buffer needs it
  let create_info = vk::CommandPoolCreateInfo::builder()
    .queue_family_index(queue_family_index)
    .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

  unsafe {
    device
      .create_command_pool(&create_info, None)
      .expect("Failed creating command pool")
  }
}

pub fn create_command_buffers(
  device: &ash::Device,
  cmd_pool: vk::CommandPool,
  count: usize,
) -> VkResult<Vec<vk::CommandBuffer>> {
  let alloc_info = vk::CommandBufferAllocateInfo::builder()
    .command_buffer_count(count as u32)
    .command_pool(cmd_pool)
    .level(vk::CommandBufferLevel::PRIMARY);

  unsafe { device.allocate_command_buffers(&alloc_info) }
}

pub fn create_framebuffer(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  image_views: &[vk::ImageView],
  size: &vk::Extent2D,
) -> VkResult<vk::Framebuffer> {
  let create_info = vk::FramebufferCreateInfo::builder()
    .render_pass(render_pass)
    .attachments(image_views)
    .width(size.width)
    .height(size.height)
    .layers(1);

  unsafe { device.create_framebuffer(&create_info, None) }
}
