use ash::vk;
use glam::{vec3, Vec3};

/// Geometry uploaded to the vertex buffer at startup.
pub enum MeshSource {
  /// The classic RGB triangle.
  Triangle,
  /// Sierpinski fractal, `3^depth` leaf triangles.
  Sierpinski { depth: u32 },
}

pub struct Config {
  // window
  pub window_title: &'static str,
  pub window_width: f64,
  pub window_height: f64,
  // clear colors
  pub clear_color: Vec3,
  // swapchain
  pub vsync: bool,
  // vulkan validation layers + debug callback
  pub graphics_debugging: bool,
  // shaders (SPIR-V, see compile command in `main.rs`)
  pub shader_vs: &'static str,
  pub shader_fs: &'static str,
  // mesh
  pub mesh: MeshSource,
}

impl Config {
  pub fn new() -> Config {
    Config {
      // window
      window_title: "Vulkan Tutorial",
      window_width: 800f64,
      window_height: 600f64,
      // clear colors
      clear_color: vec3(0.1, 0.1, 0.1),
      // swapchain
      vsync: true,
      // debug
      graphics_debugging: cfg!(debug_assertions),
      // shaders
      shader_vs: "./src/shaders-compiled/triangle.vert.spv",
      shader_fs: "./src/shaders-compiled/triangle.frag.spv",
      // mesh
      mesh: MeshSource::Triangle,
      // mesh: MeshSource::Sierpinski { depth: 7 },
    }
  }

  pub fn clear_color_value(&self) -> vk::ClearColorValue {
    vk::ClearColorValue {
      float32: [self.clear_color.x, self.clear_color.y, self.clear_color.z, 1f32],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clear_color_is_opaque() {
    let config = Config::new();
    let value = config.clear_color_value();
    let rgba = unsafe { value.float32 };
    assert_eq!(rgba[0], config.clear_color.x);
    assert_eq!(rgba[3], 1.0);
  }
}
