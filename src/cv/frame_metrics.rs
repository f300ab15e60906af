use log::{debug, info};
use std::time::{Duration, Instant};

/// Frame-rate bookkeeping for the display loops.
pub struct FrameMetrics {
    last_frame_time: Instant,
    fps: f32,
    frame_count: usize,
    min_fps: f32,
    max_fps: f32,
    start_time: Instant,
    log_every: usize,
}

impl FrameMetrics {
    pub fn new(log_every: usize) -> Self {
        debug!("Initializing frame metrics tracker");
        let now = Instant::now();
        FrameMetrics {
            last_frame_time: now,
            fps: 0.0,
            frame_count: 0,
            min_fps: f32::MAX,
            max_fps: 0.0,
            start_time: now,
            log_every: log_every.max(1),
        }
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame_time);
        let secs = elapsed.as_secs_f32();
        let current_fps = if secs > 0.0 { 1.0 / secs } else { 0.0 };

        self.fps = current_fps;
        self.frame_count += 1;
        self.min_fps = self.min_fps.min(current_fps);
        self.max_fps = self.max_fps.max(current_fps);

        if self.frame_count % self.log_every == 0 {
            info!("{}", self.summary());
        } else {
            debug!(
                "Frame #{}: {:.1} FPS (frame time: {}ms)",
                self.frame_count,
                self.fps,
                elapsed.as_millis()
            );
        }

        self.last_frame_time = now;
    }

    pub fn avg_fps(&self) -> f32 {
        let runtime = self.runtime().as_secs_f32();
        if runtime > 0.0 {
            self.frame_count as f32 / runtime
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn runtime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn summary(&self) -> String {
        if self.frame_count == 0 {
            return "No frames processed".to_owned();
        }
        format!(
            "{} frames: Current: {:.1} FPS, Avg: {:.1} FPS, Min: {:.1} FPS, Max: {:.1} FPS",
            self.frame_count,
            self.fps,
            self.avg_fps(),
            self.min_fps,
            self.max_fps
        )
    }
}
