//! Frame scheduling.
//!
//! The [`FrameClock`] replaces a self-rescheduling animation callback with an
//! explicit, cancellable schedule. The event loop asks it on every redraw
//! whether a frame should be produced and whether the next one should be
//! requested.

use instant::{Duration, Instant};

#[derive(Debug)]
pub struct FrameClock {
    running: bool,
    last_frame: Option<Instant>,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            running: false,
            last_frame: None,
            frames: 0,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            log::info!("frame clock started");
        }
        self.running = true;
        self.last_frame = None;
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("frame clock stopped after {} frames", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Begin a frame at `now`. Returns the time since the previous frame, or
    /// `None` when the clock is stopped and no frame should be drawn.
    pub fn begin_frame(&mut self, now: Instant) -> Option<Duration> {
        if !self.running {
            return None;
        }
        let dt = self
            .last_frame
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        self.frames += 1;
        Some(dt)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
