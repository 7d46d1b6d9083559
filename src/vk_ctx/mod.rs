mod vk_ctx;
mod vk_ctx_device;
mod vk_ctx_initialize;
mod vk_ctx_pipeline;
mod vk_ctx_swap_target;
mod vk_ctx_synchronize;

pub use vk_ctx::*;
pub use vk_ctx_device::*;
pub use vk_ctx_initialize::*;
pub use vk_ctx_pipeline::*;
pub use vk_ctx_swap_target::*;
pub use vk_ctx_synchronize::*;
