//! Frame clock: converts wall time into simulation frames and tracks time of day

/// Minutes in one in-game day
pub const MINUTES_PER_DAY: f32 = 24.0 * 60.0;

/// Accumulates real time into whole and fractional frames.
///
/// The VMs are frame-stepped; every `advance` takes elapsed frames, which
/// may be fractional. The clock also carries the in-game time of day used by
/// time gates and sky anchors.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Frames per real-time second
    pub frame_rate: f32,
    /// In-game minutes that pass per frame
    pub minutes_per_frame: f32,
    /// Total frames advanced
    pub total_frames: f64,
    /// Frames advanced by the last tick
    pub delta_frames: f32,
    minutes_of_day: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            minutes_per_frame: 1.0 / 60.0,
            total_frames: 0.0,
            delta_frames: 0.0,
            minutes_of_day: 12.0 * 60.0,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &sigil_core::SimConfig) -> Self {
        Self {
            frame_rate: config.frame_rate,
            minutes_per_frame: config.game_minutes_per_frame,
            ..Self::default()
        }
    }

    /// Advance by real seconds; returns the elapsed frames for this tick.
    /// Long stalls are clamped to a quarter second.
    pub fn tick_seconds(&mut self, seconds: f64) -> f32 {
        let clamped = seconds.clamp(0.0, 0.25);
        self.tick_frames(clamped as f32 * self.frame_rate)
    }

    /// Advance by a frame count directly
    pub fn tick_frames(&mut self, frames: f32) -> f32 {
        let frames = frames.max(0.0);
        self.delta_frames = frames;
        self.total_frames += frames as f64;
        self.minutes_of_day =
            (self.minutes_of_day + frames * self.minutes_per_frame).rem_euclid(MINUTES_PER_DAY);
        frames
    }

    /// In-game time of day in minutes since midnight, `[0, 1440)`
    pub fn minutes_of_day(&self) -> f32 {
        self.minutes_of_day
    }

    pub fn set_minutes_of_day(&mut self, minutes: f32) {
        self.minutes_of_day = minutes.rem_euclid(MINUTES_PER_DAY);
    }

    /// Whether the time of day lies in `[start, end)`, wrapping past midnight
    pub fn in_window(&self, start_minute: u16, end_minute: u16) -> bool {
        let now = self.minutes_of_day;
        let (start, end) = (start_minute as f32, end_minute as f32);
        if start <= end {
            now >= start && now < end
        } else {
            now >= start || now < end
        }
    }

    /// Frames until the time of day next reaches `minute`
    pub fn frames_until(&self, minute: u16) -> f32 {
        if self.minutes_per_frame <= 0.0 {
            return f32::INFINITY;
        }
        let wait = (minute as f32 - self.minutes_of_day).rem_euclid(MINUTES_PER_DAY);
        wait / self.minutes_per_frame
    }
}
