use ash::vk;
use vma::Alloc;

// https://gpuopen-librariesandsdks.github.io/VulkanMemoryAllocator/html/quick_start.html

/// Host-visible vertex buffer. Mesh data is written once during init, so we
/// skip staging and map-copy-unmap directly.
pub struct VkBuffer {
  /// For debugging
  pub name: String,
  /// Size in bytes
  pub size: usize,
  /// Native Vulkan buffer
  pub buffer: vk::Buffer,
  pub allocation: vma::Allocation,
}

impl VkBuffer {
  /// Allocate a mappable vulkan buffer and fill it with data.
  pub fn from_data(
    name: String,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
    allocator: &vma::Allocator,
    queue_family: u32,
  ) -> Self {
    let size = bytes.len();
    let label = format!("Buffer '{}' ({} bytes)", name, size);

    let queue_family_indices = [queue_family];
    let buffer_info = vk::BufferCreateInfo::builder()
      .size(size as u64)
      .usage(usage)
      .sharing_mode(vk::SharingMode::EXCLUSIVE)
      .queue_family_indices(&queue_family_indices);

    // GPU memory that the CPU is allowed to write into
    #[allow(deprecated)]
    let alloc_info = vma::AllocationCreateInfo {
      usage: vma::MemoryUsage::GpuOnly,
      required_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
        | vk::MemoryPropertyFlags::HOST_COHERENT,
      ..Default::default()
    };

    let (buffer, allocation) = unsafe {
      let (buffer, mut allocation) = allocator
        .create_buffer(&buffer_info, &alloc_info)
        .expect(&format!("Failed allocating: {}", label));

      let pointer = allocator
        .map_memory(&mut allocation)
        .expect(&format!("Failed mapping: {}", label));
      std::slice::from_raw_parts_mut(pointer, size).copy_from_slice(bytes);
      allocator.unmap_memory(&mut allocation);

      (buffer, allocation)
    };

    Self {
      name,
      size,
      buffer,
      allocation,
    }
  }

  pub unsafe fn delete(&mut self, allocator: &vma::Allocator) {
    allocator.destroy_buffer(self.buffer, &mut self.allocation)
  }
}
