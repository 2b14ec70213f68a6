use std::time::{Duration, Instant};

const COUNTER_INTERVAL: Duration = Duration::from_secs(1);

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    interval_start: Instant,
    frames_in_interval: u32,
    pub frame_dt: f32,
    ms_per_frame: u32,
}

impl FrameTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame_time: None,
            interval_start: now,
            frames_in_interval: 0,
            frame_dt: 0.0,
            ms_per_frame: 0,
        }
    }

    /// Milliseconds per frame over the last full second.
    pub fn ms_per_frame(&self) -> u32 {
        self.ms_per_frame
    }

    pub fn update(&mut self, now: Instant) {
        let dt_duration = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => now.saturating_duration_since(self.interval_start),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32();

        self.frames_in_interval = self.frames_in_interval.saturating_add(1);
        if now.saturating_duration_since(self.interval_start) >= COUNTER_INTERVAL {
            self.ms_per_frame = 1000 / self.frames_in_interval;
            self.frames_in_interval = 0;
            // Advance by a whole interval so a slow frame does not shift the window.
            self.interval_start += COUNTER_INTERVAL;
        }
    }
}
