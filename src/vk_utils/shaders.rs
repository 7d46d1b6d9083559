use log::trace;

use ash;
use ash::vk;

use crate::error::{RenderError, RenderResult};

// https://github.com/zeux/niagara/blob/master/src/shaders.cpp

fn load_shader_module(
  device: &ash::Device,
  path: &std::path::Path,
) -> RenderResult<vk::ShaderModule> {
  trace!("Loading shader from {}", path.to_string_lossy());

  let mut file = std::fs::File::open(path).map_err(|e| {
    RenderError::CreatePipeline(format!("could not open '{}': {}", path.to_string_lossy(), e))
  })?;
  let spirv_code = ash::util::read_spv(&mut file).map_err(|e| {
    RenderError::CreatePipeline(format!("invalid SPIR-V in '{}': {}", path.to_string_lossy(), e))
  })?;
  let create_info = vk::ShaderModuleCreateInfo::builder()
    .code(&spirv_code)
    .build();

  let shader_module = unsafe {
    device.create_shader_module(&create_info, None).map_err(|e| {
      RenderError::CreatePipeline(format!(
        "shader module from '{}': {}",
        path.to_string_lossy(),
        e
      ))
    })?
  };

  Ok(shader_module)
}

pub fn load_shader(
  device: &ash::Device,
  stage: vk::ShaderStageFlags,
  path: &std::path::Path,
) -> RenderResult<(vk::ShaderModule, vk::PipelineShaderStageCreateInfo)> {
  let shader_fn_name = unsafe { std::ffi::CStr::from_ptr("main\0".as_ptr() as *const i8) };

  let shader_module = load_shader_module(device, path)?;

  let shader_stage = vk::PipelineShaderStageCreateInfo::builder()
    .stage(stage)
    .module(shader_module)
    .name(shader_fn_name)
    .build();
  trace!("Shader {:?} loaded from {}", stage, path.to_string_lossy());

  Ok((shader_module, shader_stage))
}

/// Loads the (vertex, fragment) shader pair for a draw pipeline.
pub fn load_render_shaders(
  device: &ash::Device,
  vertex_path: &str,
  fragment_path: &str,
) -> RenderResult<(
  vk::ShaderModule,
  vk::PipelineShaderStageCreateInfo,
  vk::ShaderModule,
  vk::PipelineShaderStageCreateInfo,
)> {
  let (module_vs, stage_vs) = load_shader(
    device,
    vk::ShaderStageFlags::VERTEX,
    std::path::Path::new(vertex_path),
  )?;

  let fs = load_shader(
    device,
    vk::ShaderStageFlags::FRAGMENT,
    std::path::Path::new(fragment_path),
  );
  match fs {
    Ok((module_fs, stage_fs)) => Ok((module_vs, stage_vs, module_fs, stage_fs)),
    Err(e) => {
      unsafe { device.destroy_shader_module(module_vs, None) };
      Err(e)
    }
  }
}
