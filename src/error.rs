use ash::vk;

pub type RenderResult<T> = Result<T, RenderError>;

/// Fatal conditions only. Swapchain staleness (out of date, suboptimal) is not
/// an error, it is a normal signal that the frame driver handles by rebuilding
/// the swap target.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
  #[error("swap target creation failed: {0}")]
  CreateSwapTarget(String),
  #[error("render pipeline creation failed: {0}")]
  CreatePipeline(String),
  #[error("command buffer allocation failed: {0}")]
  AllocateRecordings(vk::Result),
  #[error("image acquisition failed: {0}")]
  AcquireImage(vk::Result),
  #[error("command recording failed: {0}")]
  RecordCommands(vk::Result),
  #[error("queue submit failed: {0}")]
  Submit(vk::Result),
  #[error("presentation failed: {0}")]
  Present(vk::Result),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_messages_name_the_failed_operation() {
    let e = RenderError::CreateSwapTarget("no compatible surface format".to_string());
    assert!(e.to_string().contains("swap target"));

    let e = RenderError::AcquireImage(vk::Result::ERROR_DEVICE_LOST);
    assert!(e.to_string().contains("acquisition"));
  }
}
