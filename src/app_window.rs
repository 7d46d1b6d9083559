use log::trace;

use winit::{
  dpi::LogicalSize,
  event::{Event, VirtualKeyCode, WindowEvent},
  event_loop::{ControlFlow, EventLoop},
  platform::run_return::EventLoopExtRunReturn,
  window::{Window, WindowBuilder},
};

use crate::config::Config;
use crate::frame_driver::PresentSurface;

/// Window plus its event loop, pumped manually once per frame instead of
/// handing the whole program over to a winit closure.
pub struct AppWindow {
  event_loop: EventLoop<()>,
  pub window: Window,
  close_requested: bool,
  resize_requested: bool,
}

fn handle_window_event(event: &WindowEvent, close_requested: &mut bool, resize_requested: &mut bool) {
  match event {
    // on clicked 'x'
    WindowEvent::CloseRequested => {
      *close_requested = true;
    }
    // on keyboard
    WindowEvent::KeyboardInput { input, .. } => {
      if input.virtual_keycode == Some(VirtualKeyCode::Escape) {
        *close_requested = true;
      }
    }
    WindowEvent::Resized(new_size) => {
      trace!("Window resized to {}x{}", new_size.width, new_size.height);
      *resize_requested = true;
    }
    WindowEvent::ScaleFactorChanged { .. } => {
      *resize_requested = true;
    }
    _ => (),
  }
}

impl AppWindow {
  pub fn new(config: &Config) -> Self {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
      .with_title(config.window_title)
      .with_resizable(true)
      .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
      .build(&event_loop)
      .unwrap();

    Self {
      event_loop,
      window,
      close_requested: false,
      resize_requested: false,
    }
  }
}

impl PresentSurface for AppWindow {
  fn current_extent(&self) -> (u32, u32) {
    let size = self.window.inner_size();
    (size.width, size.height)
  }

  fn resize_was_requested(&self) -> bool {
    self.resize_requested
  }

  fn clear_resize_request(&mut self) {
    self.resize_requested = false;
  }

  fn should_stop(&self) -> bool {
    self.close_requested
  }

  /// Handle every already-queued event, then return. Never blocks.
  fn pump_events(&mut self) {
    let AppWindow {
      event_loop,
      close_requested,
      resize_requested,
      ..
    } = self;

    event_loop.run_return(|event, _, control_flow| {
      *control_flow = ControlFlow::Poll;
      match event {
        Event::WindowEvent { event, .. } => {
          handle_window_event(&event, close_requested, resize_requested);
        }
        Event::MainEventsCleared => {
          *control_flow = ControlFlow::Exit;
        }
        _ => (),
      }
    });
  }

  /// Sleep until the window reports something (restore, resize, ...),
  /// handle that batch, then return.
  fn wait_events(&mut self) {
    let AppWindow {
      event_loop,
      close_requested,
      resize_requested,
      ..
    } = self;

    let mut saw_window_event = false;
    event_loop.run_return(|event, _, control_flow| {
      *control_flow = ControlFlow::Wait;
      match event {
        Event::WindowEvent { event, .. } => {
          saw_window_event = true;
          handle_window_event(&event, close_requested, resize_requested);
        }
        Event::MainEventsCleared => {
          if saw_window_event {
            *control_flow = ControlFlow::Exit;
          }
        }
        _ => (),
      }
    });
  }
}
