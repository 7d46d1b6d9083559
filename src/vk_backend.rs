use log::info;

use ash::vk;

use crate::config::Config;
use crate::error::{RenderError, RenderResult};
use crate::frame_driver::{Acquire, Present, RenderBackend};
use crate::mesh::TriangleMesh;
use crate::vk_ctx::*;
use crate::vk_utils::*;

/** Everything GPU-side: the Vulkan context, the uploaded mesh and the
recording of one frame. The frame driver decides when, this type knows how. */
pub struct VulkanBackend {
  pub ctx: VkCtx,
  mesh: TriangleMesh,
  clear_color: vk::ClearColorValue,
  vsync: bool,
  shader_vs: &'static str,
  shader_fs: &'static str,
}

impl VulkanBackend {
  pub fn new(window: &winit::window::Window, config: &Config) -> Self {
    let ctx = vk_ctx_initialize(window, config);
    let mesh = TriangleMesh::new(&config.mesh, &ctx.allocator, ctx.device.queue_family_index);

    Self {
      ctx,
      mesh,
      clear_color: config.clear_color_value(),
      vsync: config.vsync,
      shader_vs: config.shader_vs,
      shader_fs: config.shader_fs,
    }
  }

  pub unsafe fn destroy(&mut self) {
    info!("VulkanBackend::destroy()");
    self.mesh.destroy(&self.ctx.allocator);
    self.ctx.destroy();
  }
}

impl RenderBackend for VulkanBackend {
  type Target = SwapTarget;
  type Pipeline = MeshPipeline;
  type Recording = vk::CommandBuffer;

  fn create_swap_target(
    &mut self,
    extent: (u32, u32),
    previous: Option<SwapTarget>,
  ) -> RenderResult<SwapTarget> {
    let size = vk::Extent2D {
      width: extent.0,
      height: extent.1,
    };
    SwapTarget::new(&self.ctx, &size, self.vsync, previous)
  }

  fn destroy_swap_target(&mut self, mut target: SwapTarget) {
    unsafe { target.destroy(&self.ctx) };
  }

  fn image_count(&self, target: &SwapTarget) -> usize {
    target.image_count()
  }

  fn create_pipeline(&mut self, target: &SwapTarget) -> RenderResult<MeshPipeline> {
    MeshPipeline::new(&self.ctx, target.render_pass, self.shader_vs, self.shader_fs)
  }

  fn destroy_pipeline(&mut self, pipeline: MeshPipeline) {
    unsafe { pipeline.destroy(&self.ctx.device.device) };
  }

  fn allocate_recordings(&mut self, count: usize) -> RenderResult<Vec<vk::CommandBuffer>> {
    create_command_buffers(&self.ctx.device.device, self.ctx.command_pool, count)
      .map_err(RenderError::AllocateRecordings)
  }

  fn release_recordings(&mut self, recordings: Vec<vk::CommandBuffer>) {
    unsafe {
      self
        .ctx
        .device
        .device
        .free_command_buffers(self.ctx.command_pool, &recordings)
    };
  }

  fn acquire_image(&mut self, target: &mut SwapTarget) -> RenderResult<Acquire> {
    target.acquire_image(&self.ctx)
  }

  fn record_frame(
    &mut self,
    target: &SwapTarget,
    pipeline: &MeshPipeline,
    recording: &vk::CommandBuffer,
    image_index: u32,
  ) -> RenderResult<()> {
    let device = &self.ctx.device.device;
    let command_buffer = *recording;
    let render_area = size_to_rect_vk(&target.size);
    let viewport = create_viewport(&target.size);
    let clear_values = [vk::ClearValue {
      color: self.clear_color,
    }];

    let cmd_buf_begin_info = vk::CommandBufferBeginInfo::builder()
      // We will rerecord cmds before next submit
      .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
      .build();

    let render_pass_begin_info = vk::RenderPassBeginInfo::builder()
      .render_pass(target.render_pass)
      .framebuffer(target.framebuffers[image_index as usize])
      .render_area(render_area)
      .clear_values(&clear_values)
      .build();

    unsafe {
      device
        .begin_command_buffer(command_buffer, &cmd_buf_begin_info) // also resets command buffer
        .map_err(RenderError::RecordCommands)?;

      device.cmd_begin_render_pass(
        command_buffer,
        &render_pass_begin_info,
        vk::SubpassContents::INLINE,
      );

      device.cmd_set_viewport(command_buffer, 0, &[viewport]);
      device.cmd_set_scissor(command_buffer, 0, &[render_area]);
      pipeline.cmd_bind(device, command_buffer);
      self.mesh.cmd_bind_and_draw(device, command_buffer);

      device.cmd_end_render_pass(command_buffer);
      device
        .end_command_buffer(command_buffer)
        .map_err(RenderError::RecordCommands)?;
    }

    Ok(())
  }

  fn submit_and_present(
    &mut self,
    target: &mut SwapTarget,
    recording: &vk::CommandBuffer,
    image_index: u32,
  ) -> RenderResult<Present> {
    target.submit_and_present(&self.ctx, *recording, image_index)
  }

  fn wait_idle(&mut self) {
    self.ctx.wait_idle();
  }
}
