use ash::vk;
use bytemuck;
use glam::{vec2, vec3, Vec2, Vec3};
use log::info;

use crate::config::MeshSource;
use crate::vk_utils::VkBuffer;

/// Vertex layout for the mesh: clip-space position + vertex color.
#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct Vertex {
  pub position: Vec2,
  pub color: Vec3,
}
unsafe impl bytemuck::Zeroable for Vertex {}
unsafe impl bytemuck::Pod for Vertex {}

impl Vertex {
  const BINDINGS_DESC: [vk::VertexInputBindingDescription; 1] =
    [vk::VertexInputBindingDescription {
      binding: 0,
      input_rate: vk::VertexInputRate::VERTEX,
      stride: std::mem::size_of::<Vertex>() as u32,
    }];

  const ATTRIBUTES_DESC: [vk::VertexInputAttributeDescription; 2] = [
    // position
    vk::VertexInputAttributeDescription {
      binding: 0,
      location: 0,
      format: vk::Format::R32G32_SFLOAT,
      offset: 0, // offsetof(Vertex, position)
    },
    // color
    vk::VertexInputAttributeDescription {
      binding: 0,
      location: 1,
      format: vk::Format::R32G32B32_SFLOAT,
      // offsetted by 'position' from beginning of structure
      offset: std::mem::size_of::<Vec2>() as u32,
    },
  ];

  pub fn new(pos: (f32, f32), col: (f32, f32, f32)) -> Vertex {
    Vertex {
      position: Vec2::new(pos.0, pos.1),
      color: Vec3::new(col.0, col.1, col.2),
    }
  }

  pub fn get_vertex_description() -> vk::PipelineVertexInputStateCreateInfo {
    vk::PipelineVertexInputStateCreateInfo::builder()
      .vertex_attribute_descriptions(&Self::ATTRIBUTES_DESC)
      .vertex_binding_descriptions(&Self::BINDINGS_DESC)
      .build()
  }
}

/// The classic RGB triangle.
pub fn triangle_vertices() -> Vec<Vertex> {
  vec![
    Vertex::new((0.0, -0.5), (1.0, 0.0, 0.0)),
    Vertex::new((0.5, 0.5), (0.0, 1.0, 0.0)),
    Vertex::new((-0.5, 0.5), (0.0, 0.0, 1.0)),
  ]
}

/// Sierpinski fractal over a fixed outer triangle. Pure function, every call
/// regenerates the full vertex list from scratch. Returns `3 * 3^depth`
/// vertices, leaf corners colored red/green/blue.
pub fn sierpinski_vertices(depth: u32) -> Vec<Vertex> {
  let mut vertices = Vec::with_capacity(3 * 3usize.pow(depth));
  sierpinski_split(
    &mut vertices,
    depth,
    vec2(0.0, -0.9),
    vec2(0.9, 0.9),
    vec2(-0.9, 0.9),
  );
  vertices
}

fn sierpinski_split(out: &mut Vec<Vertex>, depth: u32, top: Vec2, right: Vec2, left: Vec2) {
  if depth == 0 {
    out.push(Vertex { position: top, color: vec3(1.0, 0.0, 0.0) });
    out.push(Vertex { position: right, color: vec3(0.0, 1.0, 0.0) });
    out.push(Vertex { position: left, color: vec3(0.0, 0.0, 1.0) });
  } else {
    let top_right = 0.5 * (top + right);
    let left_top = 0.5 * (left + top);
    let right_left = 0.5 * (right + left);
    sierpinski_split(out, depth - 1, top, top_right, left_top);
    sierpinski_split(out, depth - 1, right, right_left, top_right);
    sierpinski_split(out, depth - 1, left, left_top, right_left);
  }
}

pub fn mesh_vertices(source: &MeshSource) -> Vec<Vertex> {
  match source {
    MeshSource::Triangle => triangle_vertices(),
    MeshSource::Sierpinski { depth } => sierpinski_vertices(*depth),
  }
}

/// The one static mesh this app renders. Uploaded once at startup, never
/// touched by swapchain recreation.
pub struct TriangleMesh {
  pub vertex_buffer: VkBuffer,
  pub vertex_count: u32,
}

impl TriangleMesh {
  pub fn new(source: &MeshSource, allocator: &vma::Allocator, queue_family_index: u32) -> Self {
    let vertices = mesh_vertices(source);
    let vertices_bytes: &[u8] = bytemuck::cast_slice(&vertices);
    info!(
      "Mesh: {} vertices ({} bytes)",
      vertices.len(),
      vertices_bytes.len()
    );

    let vertex_buffer = VkBuffer::from_data(
      "triangle_mesh.vertices".to_string(),
      vertices_bytes,
      vk::BufferUsageFlags::VERTEX_BUFFER,
      allocator,
      queue_family_index,
    );

    Self {
      vertex_buffer,
      vertex_count: vertices.len() as u32,
    }
  }

  /// Bind the vertex buffer and issue one draw over the whole mesh.
  pub unsafe fn cmd_bind_and_draw(&self, device: &ash::Device, command_buffer: vk::CommandBuffer) {
    device.cmd_bind_vertex_buffers(command_buffer, 0, &[self.vertex_buffer.buffer], &[0]);
    device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
  }

  pub unsafe fn destroy(&mut self, allocator: &vma::Allocator) {
    self.vertex_buffer.delete(allocator);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn vertex_layout_matches_shader_inputs() {
    assert_eq!(std::mem::size_of::<Vertex>(), 20);
    assert_eq!(Vertex::ATTRIBUTES_DESC[0].offset, 0);
    assert_eq!(Vertex::ATTRIBUTES_DESC[1].offset, 8);
    assert_eq!(Vertex::BINDINGS_DESC[0].stride, 20);
  }

  #[test]
  fn triangle_has_three_colored_vertices() {
    let verts = triangle_vertices();
    assert_eq!(verts.len(), 3);
    assert_eq!(verts[0].position, vec2(0.0, -0.5));
    assert_eq!(verts[0].color, vec3(1.0, 0.0, 0.0));
    assert_eq!(verts[2].color, vec3(0.0, 0.0, 1.0));
  }

  #[test]
  fn sierpinski_depth_0_is_the_outer_triangle() {
    let verts = sierpinski_vertices(0);
    assert_eq!(verts.len(), 3);
    assert_eq!(verts[0].position, vec2(0.0, -0.9));
    assert_eq!(verts[1].position, vec2(0.9, 0.9));
    assert_eq!(verts[2].position, vec2(-0.9, 0.9));
  }

  #[test]
  fn sierpinski_vertex_count_triples_per_level() {
    for depth in 0..5 {
      let verts = sierpinski_vertices(depth);
      assert_eq!(verts.len(), 3 * 3usize.pow(depth));
    }
  }

  #[test]
  fn sierpinski_is_restartable() {
    let a = sierpinski_vertices(3);
    let b = sierpinski_vertices(3);
    assert_eq!(a.len(), b.len());
    for (va, vb) in a.iter().zip(b.iter()) {
      assert_eq!(va.position, vb.position);
      assert_eq!(va.color, vb.color);
    }
  }
}
