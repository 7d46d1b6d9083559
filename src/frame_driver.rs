use log::{info, trace};

use crate::error::RenderResult;

/// Outcome of asking the presentation engine for the next image.
/// `OutOfDate` is not an error, it is a signal to rebuild the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
  /// `index` is valid for exactly one recording slot.
  Image { index: u32, suboptimal: bool },
  /// No image was handed out, the frame has to be dropped.
  OutOfDate,
}

/// Outcome of handing a finished image back to the presentation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Present {
  /// Image was queued. `suboptimal` means it will show, but the swapchain
  /// no longer matches the surface exactly.
  Done { suboptimal: bool },
  OutOfDate,
}

/// Window-side collaborator. Answers how big the drawable area currently is
/// and whether the user asked for a new size.
pub trait PresentSurface {
  /// (width, height) in pixels, polled fresh every call.
  fn current_extent(&self) -> (u32, u32);
  fn resize_was_requested(&self) -> bool;
  fn clear_resize_request(&mut self);
  /// True once the user asked to quit (close button, Escape). Checked by the
  /// outer loop between frames, never mid-frame.
  fn should_stop(&self) -> bool;
  /// Handle every already-queued event, then return. Never blocks.
  fn pump_events(&mut self);
  /// Block until the window delivers at least one event. Used while the
  /// drawable area is zero (minimized), where spinning would burn CPU.
  fn wait_events(&mut self);
}

/// GPU-side collaborator. The driver never touches device handles itself,
/// it only sequences these calls.
pub trait RenderBackend {
  /// One swapchain generation: images, framebuffers, per-image sync.
  type Target;
  /// Compiled against a single generation's render pass.
  type Pipeline;
  /// Re-recorded every frame, one per swapchain image.
  type Recording;

  /// Build a swapchain generation for `extent`. `previous` is consumed:
  /// its internals may seed the new one, and it is destroyed either way.
  /// The device is idle when this is called.
  fn create_swap_target(
    &mut self,
    extent: (u32, u32),
    previous: Option<Self::Target>,
  ) -> RenderResult<Self::Target>;
  fn destroy_swap_target(&mut self, target: Self::Target);
  fn image_count(&self, target: &Self::Target) -> usize;

  fn create_pipeline(&mut self, target: &Self::Target) -> RenderResult<Self::Pipeline>;
  fn destroy_pipeline(&mut self, pipeline: Self::Pipeline);

  fn allocate_recordings(&mut self, count: usize) -> RenderResult<Vec<Self::Recording>>;
  fn release_recordings(&mut self, recordings: Vec<Self::Recording>);

  fn acquire_image(&mut self, target: &mut Self::Target) -> RenderResult<Acquire>;
  fn record_frame(
    &mut self,
    target: &Self::Target,
    pipeline: &Self::Pipeline,
    recording: &Self::Recording,
    image_index: u32,
  ) -> RenderResult<()>;
  fn submit_and_present(
    &mut self,
    target: &mut Self::Target,
    recording: &Self::Recording,
    image_index: u32,
  ) -> RenderResult<Present>;

  /// Block until the GPU finished all submitted work.
  fn wait_idle(&mut self);
}

/** Owns the swapchain lifecycle and drives one rendered frame per call.

The swapchain, the recordings and the pipeline always belong to the same
generation. Whenever the surface reports staleness (out of date, suboptimal
present, resize request) the whole trio is rebuilt before the next frame.
*/
pub struct FrameDriver<B: RenderBackend> {
  swap_target: Option<B::Target>,
  pipeline: Option<B::Pipeline>,
  /// Indexed by swapchain image index.
  recordings: Vec<B::Recording>,
}

impl<B: RenderBackend> FrameDriver<B> {
  /// Starts empty. The first `advance_frame` call builds the swapchain
  /// from the surface's current extent.
  pub fn new() -> Self {
    Self {
      swap_target: None,
      pipeline: None,
      recordings: Vec::new(),
    }
  }

  /// Render and present a single frame:
  /// 1. acquire an image (rebuild + drop the frame when out of date),
  /// 2. record commands for exactly that image,
  /// 3. submit and present,
  /// 4. rebuild afterwards if presentation was stale or a resize is pending.
  ///
  /// `Err` means the device failed, there is no point calling again.
  pub fn advance_frame<S: PresentSurface>(
    &mut self,
    backend: &mut B,
    surface: &mut S,
  ) -> RenderResult<()> {
    if self.swap_target.is_none() {
      self.recreate(backend, surface)?;
    }

    let acquired = {
      let target = self
        .swap_target
        .as_mut()
        .expect("Swap target missing after recreation");
      backend.acquire_image(target)?
    };

    let image_index = match acquired {
      Acquire::Image { index, suboptimal } => {
        if suboptimal {
          // Presentation engine still accepts the image. Rebuild waits for
          // the post-present signal.
          trace!("Acquired image {} from suboptimal swapchain", index);
        }
        index
      }
      Acquire::OutOfDate => {
        // The image was never handed out, so nothing to record or present.
        // Next call renders into the rebuilt swapchain.
        trace!("Swapchain out of date at acquire, recreating");
        self.recreate(backend, surface)?;
        return Ok(());
      }
    };

    let recording = &self.recordings[image_index as usize];
    let pipeline = self
      .pipeline
      .as_ref()
      .expect("Pipeline missing after recreation");
    let target = self
      .swap_target
      .as_mut()
      .expect("Swap target missing after recreation");
    backend.record_frame(target, pipeline, recording, image_index)?;
    let present_status = backend.submit_and_present(target, recording, image_index)?;

    let is_stale = match present_status {
      Present::OutOfDate => true,
      Present::Done { suboptimal } => suboptimal,
    };
    if is_stale || surface.resize_was_requested() {
      // Rebuild first, ack the resize request second. An error during the
      // rebuild leaves the request pending.
      self.recreate(backend, surface)?;
      surface.clear_resize_request();
    }

    Ok(())
  }

  /// Tear down the previous swapchain generation (if any) and build a new
  /// one sized to the surface. Recordings are only reallocated when the
  /// image count changed, the pipeline is rebuilt every time.
  fn recreate<S: PresentSurface>(&mut self, backend: &mut B, surface: &mut S) -> RenderResult<()> {
    let mut extent = surface.current_extent();
    while extent.0 == 0 || extent.1 == 0 {
      // Minimized. Nothing can be presented, so sleep until the window
      // wakes us instead of polling in a hot loop.
      trace!("Drawable area is {}x{}, waiting for events", extent.0, extent.1);
      surface.wait_events();
      extent = surface.current_extent();
    }

    backend.wait_idle();

    let previous = self.swap_target.take();
    info!(
      "{} swap target ({}x{})",
      if previous.is_some() { "Recreating" } else { "Creating" },
      extent.0,
      extent.1
    );
    let target = backend.create_swap_target(extent, previous)?;
    self.swap_target = Some(target);

    if let Some(target) = &self.swap_target {
      let image_count = backend.image_count(target);
      if self.recordings.len() != image_count {
        trace!(
          "Image count changed {} -> {}, reallocating recordings",
          self.recordings.len(),
          image_count
        );
        let old = std::mem::replace(&mut self.recordings, Vec::new());
        if !old.is_empty() {
          backend.release_recordings(old);
        }
        self.recordings = backend.allocate_recordings(image_count)?;
      }

      if let Some(old) = self.pipeline.take() {
        backend.destroy_pipeline(old);
      }
      self.pipeline = Some(backend.create_pipeline(target)?);
    }

    Ok(())
  }

  /// Release everything in an order safe for the GPU: wait for idle first,
  /// then the swapchain generation, the pipeline and the recordings.
  pub fn shutdown(&mut self, backend: &mut B) {
    backend.wait_idle();

    if let Some(target) = self.swap_target.take() {
      backend.destroy_swap_target(target);
    }
    if let Some(pipeline) = self.pipeline.take() {
      backend.destroy_pipeline(pipeline);
    }
    let recordings = std::mem::replace(&mut self.recordings, Vec::new());
    if !recordings.is_empty() {
      backend.release_recordings(recordings);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::RenderError;
  use ash::vk;
  use std::collections::VecDeque;

  struct FakeSurface {
    extent: (u32, u32),
    /// Applied one by one, each `wait_events` call pops the next.
    pending_extents: VecDeque<(u32, u32)>,
    resize_requested: bool,
    wait_calls: u32,
    clear_calls: u32,
  }

  impl FakeSurface {
    fn new(extent: (u32, u32)) -> Self {
      Self {
        extent,
        pending_extents: VecDeque::new(),
        resize_requested: false,
        wait_calls: 0,
        clear_calls: 0,
      }
    }
  }

  impl PresentSurface for FakeSurface {
    fn current_extent(&self) -> (u32, u32) {
      self.extent
    }
    fn resize_was_requested(&self) -> bool {
      self.resize_requested
    }
    fn clear_resize_request(&mut self) {
      self.resize_requested = false;
      self.clear_calls += 1;
    }
    fn should_stop(&self) -> bool {
      false
    }
    fn pump_events(&mut self) {}
    fn wait_events(&mut self) {
      self.wait_calls += 1;
      match self.pending_extents.pop_front() {
        Some(extent) => self.extent = extent,
        None => panic!("wait_events called but no extent change was scripted"),
      }
    }
  }

  struct FakeTarget {
    generation: u32,
    image_count: usize,
  }

  struct FakePipeline {
    generation: u32,
  }

  struct FakeRecording {
    slot: usize,
  }

  struct FakeBackend {
    image_count_for_next: usize,
    rotation: u32,

    acquire_calls: u32,
    present_calls: u32,
    // 1-based call numbers at which the scripted status is returned
    out_of_date_acquires: Vec<u32>,
    suboptimal_acquires: Vec<u32>,
    out_of_date_presents: Vec<u32>,
    suboptimal_presents: Vec<u32>,
    device_lost_at_acquire: Option<u32>,
    device_lost_at_submit: Option<u32>,

    created_targets: u32,
    destroyed_targets: u32,
    created_pipelines: u32,
    destroyed_pipelines: u32,
    allocated_batches: u32,
    released_batches: u32,
    last_allocated: usize,
    wait_idle_calls: u32,
    create_extents: Vec<(u32, u32)>,
    old_swapchain_hints: Vec<bool>,
    /// (target generation, image index) per recorded frame
    recorded: Vec<(u32, u32)>,
    presented: Vec<u32>,
  }

  impl FakeBackend {
    fn new(image_count: usize) -> Self {
      Self {
        image_count_for_next: image_count,
        rotation: 0,
        acquire_calls: 0,
        present_calls: 0,
        out_of_date_acquires: Vec::new(),
        suboptimal_acquires: Vec::new(),
        out_of_date_presents: Vec::new(),
        suboptimal_presents: Vec::new(),
        device_lost_at_acquire: None,
        device_lost_at_submit: None,
        created_targets: 0,
        destroyed_targets: 0,
        created_pipelines: 0,
        destroyed_pipelines: 0,
        allocated_batches: 0,
        released_batches: 0,
        last_allocated: 0,
        wait_idle_calls: 0,
        create_extents: Vec::new(),
        old_swapchain_hints: Vec::new(),
        recorded: Vec::new(),
        presented: Vec::new(),
      }
    }
  }

  impl RenderBackend for FakeBackend {
    type Target = FakeTarget;
    type Pipeline = FakePipeline;
    type Recording = FakeRecording;

    fn create_swap_target(
      &mut self,
      extent: (u32, u32),
      previous: Option<FakeTarget>,
    ) -> RenderResult<FakeTarget> {
      assert_eq!(
        self.wait_idle_calls,
        self.created_targets + 1,
        "device must be idle exactly once before every creation"
      );
      self.old_swapchain_hints.push(previous.is_some());
      if previous.is_some() {
        self.destroyed_targets += 1;
      }
      self.created_targets += 1;
      self.create_extents.push(extent);
      Ok(FakeTarget {
        generation: self.created_targets,
        image_count: self.image_count_for_next,
      })
    }

    fn destroy_swap_target(&mut self, _target: FakeTarget) {
      self.destroyed_targets += 1;
    }

    fn image_count(&self, target: &FakeTarget) -> usize {
      target.image_count
    }

    fn create_pipeline(&mut self, target: &FakeTarget) -> RenderResult<FakePipeline> {
      self.created_pipelines += 1;
      Ok(FakePipeline {
        generation: target.generation,
      })
    }

    fn destroy_pipeline(&mut self, _pipeline: FakePipeline) {
      self.destroyed_pipelines += 1;
    }

    fn allocate_recordings(&mut self, count: usize) -> RenderResult<Vec<FakeRecording>> {
      self.allocated_batches += 1;
      self.last_allocated = count;
      Ok((0..count).map(|slot| FakeRecording { slot }).collect())
    }

    fn release_recordings(&mut self, recordings: Vec<FakeRecording>) {
      assert!(!recordings.is_empty(), "releasing an empty batch");
      self.released_batches += 1;
    }

    fn acquire_image(&mut self, target: &mut FakeTarget) -> RenderResult<Acquire> {
      self.acquire_calls += 1;
      if self.device_lost_at_acquire == Some(self.acquire_calls) {
        return Err(RenderError::AcquireImage(vk::Result::ERROR_DEVICE_LOST));
      }
      if self.out_of_date_acquires.contains(&self.acquire_calls) {
        return Ok(Acquire::OutOfDate);
      }
      let index = self.rotation % target.image_count as u32;
      self.rotation += 1;
      Ok(Acquire::Image {
        index,
        suboptimal: self.suboptimal_acquires.contains(&self.acquire_calls),
      })
    }

    fn record_frame(
      &mut self,
      target: &FakeTarget,
      pipeline: &FakePipeline,
      recording: &FakeRecording,
      image_index: u32,
    ) -> RenderResult<()> {
      assert_eq!(
        target.generation, pipeline.generation,
        "pipeline compiled for a different swapchain generation"
      );
      assert_eq!(
        recording.slot, image_index as usize,
        "recording does not belong to the acquired image"
      );
      assert!((image_index as usize) < target.image_count);
      self.recorded.push((target.generation, image_index));
      Ok(())
    }

    fn submit_and_present(
      &mut self,
      _target: &mut FakeTarget,
      _recording: &FakeRecording,
      image_index: u32,
    ) -> RenderResult<Present> {
      self.present_calls += 1;
      if self.device_lost_at_submit == Some(self.present_calls) {
        return Err(RenderError::Submit(vk::Result::ERROR_DEVICE_LOST));
      }
      self.presented.push(image_index);
      if self.out_of_date_presents.contains(&self.present_calls) {
        return Ok(Present::OutOfDate);
      }
      Ok(Present::Done {
        suboptimal: self.suboptimal_presents.contains(&self.present_calls),
      })
    }

    fn wait_idle(&mut self) {
      self.wait_idle_calls += 1;
    }
  }

  fn setup() -> (FrameDriver<FakeBackend>, FakeBackend, FakeSurface) {
    (
      FrameDriver::new(),
      FakeBackend::new(3),
      FakeSurface::new((800, 600)),
    )
  }

  #[test]
  fn first_frame_builds_swapchain_on_demand() {
    let (mut driver, mut backend, mut surface) = setup();
    assert_eq!(backend.created_targets, 0);

    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.created_targets, 1);
    assert_eq!(backend.created_pipelines, 1);
    assert_eq!(backend.recorded.len(), 1, "first call already draws");
  }

  #[test]
  fn steady_state_renders_one_frame_per_call() {
    let (mut driver, mut backend, mut surface) = setup();
    for _ in 0..100 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    assert_eq!(backend.created_targets, 1);
    assert_eq!(backend.created_pipelines, 1);
    assert_eq!(backend.allocated_batches, 1);
    assert_eq!(backend.recorded.len(), 100);
    assert_eq!(backend.presented.len(), 100);
    assert!(backend
      .recorded
      .iter()
      .all(|&(generation, index)| generation == 1 && index < 3));
  }

  #[test]
  fn out_of_date_acquire_rebuilds_and_drops_the_frame() {
    let (mut driver, mut backend, mut surface) = setup();
    backend.out_of_date_acquires = vec![50];
    for _ in 0..100 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    assert_eq!(backend.created_targets, 2);
    assert_eq!(backend.recorded.len(), 99, "the stale frame draws nothing");
    assert_eq!(backend.presented.len(), 99);
    assert_eq!(backend.recorded[48].0, 1);
    assert_eq!(backend.recorded[49].0, 2, "next frame uses the new swapchain");
  }

  #[test]
  fn resize_request_rebuilds_after_presenting() {
    let (mut driver, mut backend, mut surface) = setup();
    for _ in 0..3 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    surface.extent = (400, 300);
    surface.resize_requested = true;
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.recorded.len(), 4, "the resized frame still draws");
    assert_eq!(backend.presented.len(), 4);
    assert_eq!(backend.created_targets, 2);
    assert_eq!(backend.create_extents[1], (400, 300));
    assert!(!surface.resize_requested);
    assert_eq!(surface.clear_calls, 1);

    driver.advance_frame(&mut backend, &mut surface).unwrap();
    assert_eq!(backend.created_targets, 2, "acked request does not rebuild again");
  }

  #[test]
  fn rebuild_waits_out_zero_area_window() {
    let (mut driver, mut backend, mut surface) = setup();
    surface.extent = (0, 0);
    surface.pending_extents = VecDeque::from(vec![(0, 0), (0, 0), (640, 480)]);

    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(surface.wait_calls, 3);
    assert_eq!(backend.created_targets, 1);
    assert_eq!(backend.create_extents[0], (640, 480));
    assert_eq!(backend.recorded.len(), 1);
  }

  #[test]
  fn zero_width_or_height_counts_as_zero_area() {
    for &degenerate in [(0, 600), (800, 0)].iter() {
      let (mut driver, mut backend, mut surface) = setup();
      surface.extent = degenerate;
      surface.pending_extents = VecDeque::from(vec![(800, 600)]);

      driver.advance_frame(&mut backend, &mut surface).unwrap();

      assert_eq!(surface.wait_calls, 1);
      assert_eq!(backend.create_extents[0], (800, 600));
    }
  }

  #[test]
  fn suboptimal_acquire_keeps_the_swapchain() {
    let (mut driver, mut backend, mut surface) = setup();
    backend.suboptimal_acquires = vec![2];
    for _ in 0..3 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    assert_eq!(backend.created_targets, 1);
    assert_eq!(backend.presented.len(), 3);
  }

  #[test]
  fn suboptimal_present_rebuilds_the_swapchain() {
    let (mut driver, mut backend, mut surface) = setup();
    backend.suboptimal_presents = vec![2];
    for _ in 0..3 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    assert_eq!(backend.created_targets, 2);
    assert_eq!(backend.recorded.len(), 3, "the suboptimal frame completes");
    assert_eq!(backend.recorded[2].0, 2);
  }

  #[test]
  fn out_of_date_present_rebuilds_the_swapchain() {
    let (mut driver, mut backend, mut surface) = setup();
    backend.out_of_date_presents = vec![2];
    for _ in 0..3 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    assert_eq!(backend.created_targets, 2);
    assert_eq!(backend.present_calls, 3);
  }

  #[test]
  fn rebuild_reuses_the_previous_swapchain() {
    let (mut driver, mut backend, mut surface) = setup();
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    surface.resize_requested = true;
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.old_swapchain_hints, vec![false, true]);
  }

  #[test]
  fn image_count_change_reallocates_recordings() {
    let (mut driver, mut backend, mut surface) = setup();
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    backend.image_count_for_next = 4;
    surface.resize_requested = true;
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.allocated_batches, 2);
    assert_eq!(backend.released_batches, 1);
    assert_eq!(backend.last_allocated, 4);

    for _ in 0..8 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }
    assert!(backend.recorded.iter().any(|&(_, index)| index == 3));
  }

  #[test]
  fn stable_image_count_keeps_recordings() {
    let (mut driver, mut backend, mut surface) = setup();
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    surface.resize_requested = true;
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.created_targets, 2);
    assert_eq!(backend.allocated_batches, 1);
    assert_eq!(backend.released_batches, 0);
  }

  #[test]
  fn pipeline_is_rebuilt_with_each_swapchain() {
    let (mut driver, mut backend, mut surface) = setup();
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    surface.resize_requested = true;
    driver.advance_frame(&mut backend, &mut surface).unwrap();
    driver.advance_frame(&mut backend, &mut surface).unwrap();

    assert_eq!(backend.created_pipelines, 2);
    assert_eq!(backend.destroyed_pipelines, 1);
    assert_eq!(backend.recorded[0].0, 1);
    assert_eq!(backend.recorded[2].0, 2);
  }

  #[test]
  fn device_loss_surfaces_as_an_error() {
    let (mut driver, mut backend, mut surface) = setup();
    backend.device_lost_at_submit = Some(1);
    let result = driver.advance_frame(&mut backend, &mut surface);
    assert!(matches!(result, Err(RenderError::Submit(_))));

    let (mut driver, mut backend, mut surface) = setup();
    backend.device_lost_at_acquire = Some(1);
    let result = driver.advance_frame(&mut backend, &mut surface);
    assert!(matches!(result, Err(RenderError::AcquireImage(_))));
  }

  #[test]
  fn shutdown_releases_all_resources() {
    let (mut driver, mut backend, mut surface) = setup();
    for _ in 0..2 {
      driver.advance_frame(&mut backend, &mut surface).unwrap();
    }

    driver.shutdown(&mut backend);

    assert_eq!(backend.destroyed_targets, 1);
    assert_eq!(backend.destroyed_pipelines, 1);
    assert_eq!(backend.released_batches, 1);
    assert_eq!(backend.wait_idle_calls, 2);
  }
}
