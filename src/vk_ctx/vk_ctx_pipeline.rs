use log::trace;

use ash;
use ash::vk;

use crate::error::{RenderError, RenderResult};
use crate::mesh::Vertex;
use crate::vk_ctx::vk_ctx::VkCtx;
use crate::vk_utils::*;

/// Graphics pipeline that rasterizes the vertex-colored mesh. Compiled
/// against a single render pass, so every swap target generation gets a fresh
/// instance.
pub struct MeshPipeline {
  pub pipeline: vk::Pipeline,
  pub pipeline_layout: vk::PipelineLayout,
}

impl MeshPipeline {
  pub fn new(
    vk_ctx: &VkCtx,
    render_pass: vk::RenderPass,
    shader_vs: &str,
    shader_fs: &str,
  ) -> RenderResult<MeshPipeline> {
    let device = &vk_ctx.device.device;

    // no uniforms, no push constants
    let pipeline_layout = unsafe {
      device
        .create_pipeline_layout(&vk::PipelineLayoutCreateInfo::builder().build(), None)
        .map_err(|e| RenderError::CreatePipeline(format!("pipeline layout: {}", e)))?
    };

    let shaders = load_render_shaders(device, shader_vs, shader_fs);
    let (module_vs, stage_vs, module_fs, stage_fs) = match shaders {
      Ok(s) => s,
      Err(e) => {
        unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
        return Err(e);
      }
    };
    trace!("Shaders: OK! ({}, {})", shader_vs, shader_fs);

    // All states bound to locals, `create_info` refers into them.
    let stages = [stage_vs, stage_fs];
    let vertex_desc = Vertex::get_vertex_description();
    let input_assembly_state = ps_ia_triangle_list();
    let viewport_state = ps_viewport_single_dynamic();
    let rasterization_state = ps_raster_polygons(vk::CullModeFlags::NONE);
    let multisample_state = ps_multisample_disabled();
    let color_attachments = ps_color_attachments_write_all(1);
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
      .attachments(&color_attachments)
      .build();
    let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dynamic_state = ps_dynamic_state(&dynamic_states);

    let create_info = vk::GraphicsPipelineCreateInfo::builder()
      .stages(&stages)
      .vertex_input_state(&vertex_desc)
      .input_assembly_state(&input_assembly_state)
      .viewport_state(&viewport_state)
      .rasterization_state(&rasterization_state)
      .multisample_state(&multisample_state)
      .color_blend_state(&color_blend_state)
      .dynamic_state(&dynamic_state)
      .layout(pipeline_layout)
      .render_pass(render_pass)
      .build();
    let pipeline_result = create_graphics_pipeline(device, vk_ctx.pipeline_cache, create_info);

    unsafe {
      device.destroy_shader_module(module_vs, None);
      device.destroy_shader_module(module_fs, None);
    }

    match pipeline_result {
      Ok(pipeline) => Ok(MeshPipeline {
        pipeline,
        pipeline_layout,
      }),
      Err(e) => {
        unsafe { device.destroy_pipeline_layout(pipeline_layout, None) };
        Err(RenderError::CreatePipeline(e.to_string()))
      }
    }
  }

  pub unsafe fn cmd_bind(&self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
    device.cmd_bind_pipeline(
      command_buffer,
      vk::PipelineBindPoint::GRAPHICS,
      self.pipeline,
    );
  }

  pub unsafe fn destroy(&self, device: &ash::Device) {
    device.destroy_pipeline(self.pipeline, None);
    device.destroy_pipeline_layout(self.pipeline_layout, None);
  }
}
