//! Scalar curves over particle and generator age

/// 0 at birth rising to 1 after `frames`
pub fn fade_in(age: f32, frames: f32) -> f32 {
    if frames <= 0.0 {
        return 1.0;
    }
    (age / frames).clamp(0.0, 1.0)
}

/// 1 until the last `frames` of life, then falling to 0 at `max_age`
pub fn fade_out(age: f32, max_age: f32, frames: f32) -> f32 {
    if frames <= 0.0 {
        return 1.0;
    }
    ((max_age - age) / frames).clamp(0.0, 1.0)
}

/// Parabolic lift peaking at `height` halfway along `t` in `[0, 1]`
pub fn arc_lift(t: f32, height: f32) -> f32 {
    4.0 * height * t * (1.0 - t)
}
