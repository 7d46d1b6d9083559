// mostly inspired by:
// - https://github.com/zeux/niagara/tree/master/src
// - https://github.com/MaikKlein/ash/blob/master/examples/src/lib.rs#L256
mod debug;
mod device;
mod pipeline;
mod resources;
mod shaders;
mod swapchain;
mod vk_buffer;

pub use self::debug::*;
pub use self::device::*;
pub use self::pipeline::*;
pub use self::resources::*;
pub use self::shaders::*;
pub use self::swapchain::*;
pub use self::vk_buffer::*;
