use log::info;

use ash;
use ash::vk;

use crate::error::{RenderError, RenderResult};
use crate::frame_driver::{Acquire, Present};
use crate::vk_ctx::vk_ctx::VkCtx;
use crate::vk_ctx::vk_ctx_synchronize::SwapTargetSynchronize;
use crate::vk_utils::*;

/// One swapchain generation: presentable images, their views and framebuffers,
/// the render pass they are drawn through and per-image synchronization.
/// Rebuilt from scratch whenever the window changes size or presentation
/// reports staleness; the retired instance seeds `old_swapchain` so the driver
/// can recycle its internals.
pub struct SwapTarget {
  pub swapchain: vk::SwapchainKHR,
  pub size: vk::Extent2D,
  pub surface_format: vk::SurfaceFormatKHR,
  /// Render target descriptor. Pipelines are compiled against this exact
  /// object and die with the generation.
  pub render_pass: vk::RenderPass,

  // All fields below have capabilites.min_images + 1 entries
  pub images: Vec<vk::Image>,
  pub image_views: Vec<vk::ImageView>,
  pub framebuffers: Vec<vk::Framebuffer>,
  pub synchronize: SwapTargetSynchronize,

  /// Rotating slot into the per-image sync arrays.
  sync_idx: usize,
}

fn create_render_pass(
  device: &ash::Device,
  image_format: vk::Format,
) -> Result<vk::RenderPass, vk::Result> {
  let color_attachments = [vk::AttachmentDescription::builder()
    .format(image_format)
    .samples(vk::SampleCountFlags::TYPE_1) // single sampled
    .load_op(vk::AttachmentLoadOp::CLEAR)
    .store_op(vk::AttachmentStoreOp::STORE)
    .initial_layout(vk::ImageLayout::UNDEFINED)
    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
    .build()];

  let color_attachment_refs = [vk::AttachmentReference {
    attachment: 0, // index into `color_attachments`
    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
  }];

  let subpasses = [vk::SubpassDescription::builder()
    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
    .color_attachments(&color_attachment_refs)
    .build()];

  // wait until the presentation engine releases the image before writing color
  let dependencies = [vk::SubpassDependency::builder()
    .src_subpass(vk::SUBPASS_EXTERNAL)
    .dst_subpass(0)
    .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .src_access_mask(vk::AccessFlags::empty())
    .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
    .build()];

  let create_info = vk::RenderPassCreateInfo::builder()
    .attachments(&color_attachments)
    .subpasses(&subpasses)
    .dependencies(&dependencies);

  unsafe { device.create_render_pass(&create_info, None) }
}

impl SwapTarget {
  /// Build a swapchain generation sized to `size`. `previous` (if any) is
  /// consumed: its swapchain handle is passed as the `old_swapchain` reuse
  /// hint and the whole retired bundle is destroyed before returning, success
  /// or not. Caller must have waited for device idle first.
  pub fn new(
    vk_ctx: &VkCtx,
    size: &vk::Extent2D,
    vsync: bool,
    previous: Option<SwapTarget>,
  ) -> RenderResult<SwapTarget> {
    let result = Self::create(vk_ctx, size, vsync, previous.as_ref());

    // The retired generation is never referenced again, even on error.
    if let Some(mut old) = previous {
      unsafe { old.destroy(vk_ctx) };
    }

    result
  }

  fn create(
    vk_ctx: &VkCtx,
    size: &vk::Extent2D,
    vsync: bool,
    previous: Option<&SwapTarget>,
  ) -> RenderResult<SwapTarget> {
    let device = &vk_ctx.device.device;
    let as_create_err = |e: vk::Result| RenderError::CreateSwapTarget(e.to_string());

    let surface_format = get_swapchain_format(
      &vk_ctx.surface_loader,
      vk_ctx.surface_khr,
      vk_ctx.device.phys_device,
    )
    .ok_or_else(|| {
      RenderError::CreateSwapTarget("no B8G8R8A8_UNORM surface format".to_string())
    })?;
    let surface_capabilities = get_surface_capabilities(
      &vk_ctx.surface_loader,
      vk_ctx.surface_khr,
      vk_ctx.device.phys_device,
    )
    .map_err(as_create_err)?;
    let present_mode = get_present_mode(
      &vk_ctx.surface_loader,
      vk_ctx.surface_khr,
      vk_ctx.device.phys_device,
      vsync,
    )
    .map_err(as_create_err)?;

    let old_swapchain = previous.map_or(vk::SwapchainKHR::null(), |t| t.swapchain);
    let swapchain = create_swapchain_khr(
      &vk_ctx.swapchain_loader,
      vk_ctx.surface_khr,
      &surface_format,
      &surface_capabilities,
      size,
      vk_ctx.device.queue_family_index,
      present_mode,
      old_swapchain,
    )
    .map_err(as_create_err)?;

    let (images, image_views) = create_swapchain_images(
      &vk_ctx.swapchain_loader,
      swapchain,
      device,
      surface_format.format,
    )
    .map_err(as_create_err)?;
    info!(
      "Swap target: {} images, {}x{}",
      images.len(),
      size.width,
      size.height
    );

    let render_pass = create_render_pass(device, surface_format.format).map_err(as_create_err)?;

    let mut framebuffers = Vec::with_capacity(image_views.len());
    for &image_view in &image_views {
      let fb =
        create_framebuffer(device, render_pass, &[image_view], size).map_err(as_create_err)?;
      framebuffers.push(fb);
    }

    let synchronize = SwapTargetSynchronize::new(device, image_views.len())?;

    Ok(SwapTarget {
      swapchain,
      size: *size,
      surface_format,
      render_pass,
      images,
      image_views,
      framebuffers,
      synchronize,
      sync_idx: 0,
    })
  }

  pub fn image_count(&self) -> usize {
    self.image_views.len()
  }

  /// Get the next presentable image. Blocks on the slot's fence so the sync
  /// objects are free for reuse before the swapchain hands them out again.
  pub fn acquire_image(&mut self, vk_ctx: &VkCtx) -> RenderResult<Acquire> {
    let device = &vk_ctx.device.device;
    let fence = self.synchronize.in_flight_fences[self.sync_idx];
    let acquire_semaphore = self.synchronize.image_available_semaphores[self.sync_idx];

    unsafe {
      device
        .wait_for_fences(&[fence], true, u64::MAX)
        .map_err(RenderError::AcquireImage)?;
    }

    let result = unsafe {
      vk_ctx.swapchain_loader.acquire_next_image(
        self.swapchain,
        u64::MAX,
        acquire_semaphore,
        vk::Fence::null(),
      )
    };

    match result {
      Ok((image_index, suboptimal)) => Ok(Acquire::Image {
        index: image_index,
        suboptimal,
      }),
      Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Acquire::OutOfDate),
      Err(e) => Err(RenderError::AcquireImage(e)),
    }
  }

  /// Submit the recorded commands for `image_index` and hand the image to the
  /// presentation engine.
  pub fn submit_and_present(
    &mut self,
    vk_ctx: &VkCtx,
    command_buffer: vk::CommandBuffer,
    image_index: u32,
  ) -> RenderResult<Present> {
    let device = &vk_ctx.device.device;
    let queue = vk_ctx.device.queue;
    let fence = self.synchronize.in_flight_fences[self.sync_idx];
    let acquire_semaphore = self.synchronize.image_available_semaphores[self.sync_idx];
    let render_semaphore = self.synchronize.render_finished_semaphores[self.sync_idx];

    unsafe {
      device.reset_fences(&[fence]).map_err(RenderError::Submit)?;

      let wait_semaphores = [acquire_semaphore];
      let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
      let command_buffers = [command_buffer];
      let signal_semaphores = [render_semaphore];
      let submit_info = vk::SubmitInfo::builder()
        .wait_semaphores(&wait_semaphores)
        .wait_dst_stage_mask(&wait_stages)
        .command_buffers(&command_buffers)
        .signal_semaphores(&signal_semaphores);
      device
        .queue_submit(queue, &[submit_info.build()], fence)
        .map_err(RenderError::Submit)?;

      let present_wait_semaphores = [render_semaphore];
      let swapchains = [self.swapchain];
      let image_indices = [image_index];
      let present_info = vk::PresentInfoKHR::builder()
        .wait_semaphores(&present_wait_semaphores)
        .swapchains(&swapchains)
        .image_indices(&image_indices);
      let present_result = vk_ctx.swapchain_loader.queue_present(queue, &present_info);

      self.sync_idx = (self.sync_idx + 1) % self.image_count();

      match present_result {
        Ok(false) => Ok(Present::Done { suboptimal: false }),
        Ok(true) => Ok(Present::Done { suboptimal: true }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Present::OutOfDate),
        Err(e) => Err(RenderError::Present(e)),
      }
    }
  }

  pub unsafe fn destroy(&mut self, vk_ctx: &VkCtx) {
    let device = &vk_ctx.device.device;

    self.synchronize.destroy(device);

    for &framebuffer in &self.framebuffers {
      device.destroy_framebuffer(framebuffer, None);
    }

    for &image_view in &self.image_views {
      device.destroy_image_view(image_view, None);
    }

    // Will also destroy images. From validation layers:
    // VK_OBJECT_TYPE_IMAGE; is a presentable image and it is controlled by the implementation and is destroyed with vkDestroySwapchainKHR.
    vk_ctx
      .swapchain_loader
      .destroy_swapchain(self.swapchain, None);

    device.destroy_render_pass(self.render_pass, None);
  }
}
