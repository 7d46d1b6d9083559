use ash;
use ash::vk;

// Presets for the repetitive parts of `vk::GraphicsPipelineCreateInfo`.
// Anything not listed keeps the vulkan default.

pub fn create_pipeline_cache(device: &ash::Device) -> vk::PipelineCache {
  let create_info = vk::PipelineCacheCreateInfo::default();
  unsafe {
    device
      .create_pipeline_cache(&create_info, None)
      .expect("Failed to create pipeline cache")
  }
}

/// `create_graphics_pipelines` is a batch API with a batch error type,
/// unwrap it for our single pipeline.
pub fn create_graphics_pipeline(
  device: &ash::Device,
  pipeline_cache: vk::PipelineCache,
  pipeline_create_info: vk::GraphicsPipelineCreateInfo,
) -> Result<vk::Pipeline, vk::Result> {
  let pipelines =
    unsafe { device.create_graphics_pipelines(pipeline_cache, &[pipeline_create_info], None) };
  match pipelines {
    Ok(ps) if !ps.is_empty() => Ok(ps[0]),
    Ok(_) => Err(vk::Result::ERROR_UNKNOWN),
    Err((_, err_code)) => Err(err_code),
  }
}

pub fn ps_ia_triangle_list() -> vk::PipelineInputAssemblyStateCreateInfo {
  vk::PipelineInputAssemblyStateCreateInfo {
    topology: vk::PrimitiveTopology::TRIANGLE_LIST,
    ..Default::default()
  }
}

/// One viewport + one scissor, values set at draw time. The pipeline survives
/// window resizes this way.
pub fn ps_viewport_single_dynamic() -> vk::PipelineViewportStateCreateInfo {
  // counts must be 1 even when the values themselves are dynamic
  vk::PipelineViewportStateCreateInfo {
    viewport_count: 1,
    scissor_count: 1,
    ..Default::default()
  }
}

/// Filled polygons, caller picks the cull mode.
pub fn ps_raster_polygons(cull_mode: vk::CullModeFlags) -> vk::PipelineRasterizationStateCreateInfo {
  vk::PipelineRasterizationStateCreateInfo {
    polygon_mode: vk::PolygonMode::FILL,
    cull_mode,
    front_face: vk::FrontFace::COUNTER_CLOCKWISE,
    line_width: 1.0, // has to be exactly 1.0 unless wideLines is enabled
    ..Default::default()
  }
}

pub fn ps_multisample_disabled() -> vk::PipelineMultisampleStateCreateInfo {
  vk::PipelineMultisampleStateCreateInfo {
    rasterization_samples: vk::SampleCountFlags::TYPE_1,
    ..Default::default()
  }
}

/// Straight overwrite of every color attachment, no blending.
pub fn ps_color_attachments_write_all(
  attachment_count: usize,
) -> Vec<vk::PipelineColorBlendAttachmentState> {
  let write_all = vk::PipelineColorBlendAttachmentState {
    color_write_mask: vk::ColorComponentFlags::RGBA,
    blend_enable: vk::FALSE,
    ..Default::default()
  };
  vec![write_all; attachment_count]
}

/// The states listed here are set by `cmd_*` calls during command recording
/// instead of being baked into the pipeline.
pub fn ps_dynamic_state(states: &[vk::DynamicState]) -> vk::PipelineDynamicStateCreateInfo {
  vk::PipelineDynamicStateCreateInfo::builder()
    .dynamic_states(states)
    .build()
}
