use std::{collections::VecDeque, time::Instant};

// Delta times are filtered over _this many_ frames.
const DT_FILTER_WIDTH: usize = 20;

pub type FrameIdx = u64;

/// Frame counter + moving-average frame time.
/// https://github.com/EmbarkStudios/kajiya/blob/main/crates/lib/kajiya-simple/src/main_loop.rs#L329
pub struct AppTimer {
  frame_idx: FrameIdx,
  /// Report a fake `delta time` for _this many_ initial frames. Keeps one slow
  /// startup frame from skewing the early logs.
  warmup_frames_left: u32,
  last_frame_start: Instant,
  delta_time: f32,
  dt_window: VecDeque<f32>,
  dt_window_sum: f32,
}

impl AppTimer {
  pub fn new() -> Self {
    Self {
      frame_idx: 0,
      warmup_frames_left: 2 * (DT_FILTER_WIDTH as u32),
      last_frame_start: Instant::now(),
      delta_time: 0.0,
      dt_window: VecDeque::with_capacity(DT_FILTER_WIDTH),
      dt_window_sum: 0.0,
    }
  }

  /// Number of the frame most recently started. Frames count from 0,
  /// only valid after the first `mark_start_frame`.
  pub fn frame_idx(&self) -> FrameIdx {
    self.frame_idx.saturating_sub(1)
  }

  /// @return filtered delta time in seconds
  pub fn mark_start_frame(&mut self) -> f32 {
    let now = Instant::now();
    let dt_raw = (now - self.last_frame_start).as_secs_f32();
    self.last_frame_start = now;

    self.delta_time = if self.warmup_frames_left > 0 {
      self.warmup_frames_left -= 1;
      dt_raw.min(1.0 / 60.0)
    } else {
      self.dt_window.push_back(dt_raw);
      self.dt_window_sum += dt_raw;
      while self.dt_window.len() > DT_FILTER_WIDTH {
        if let Some(oldest) = self.dt_window.pop_front() {
          self.dt_window_sum -= oldest;
        }
      }
      self.dt_window_sum / (self.dt_window.len() as f32)
    };

    self.frame_idx = self
      .frame_idx
      .checked_add(1)
      .expect("Integer overflow in AppTimer. How long did the app run?!");
    self.delta_time
  }

  pub fn delta_time_ms(&self) -> f32 {
    self.delta_time * 1000.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_frames_from_zero() {
    let mut timer = AppTimer::new();
    timer.mark_start_frame();
    assert_eq!(timer.frame_idx(), 0);
    timer.mark_start_frame();
    timer.mark_start_frame();
    assert_eq!(timer.frame_idx(), 2);
  }

  #[test]
  fn warmup_frames_use_clamped_delta_time() {
    let mut timer = AppTimer::new();
    let dt = timer.mark_start_frame();
    assert!(dt >= 0.0);
    assert!(dt <= 1.0 / 60.0);
  }
}
