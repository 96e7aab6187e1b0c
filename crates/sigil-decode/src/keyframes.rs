//! Key-frame set resources: piecewise-linear curves over normalized particle age

use crate::cursor::ByteCursor;
use serde::Serialize;
use sigil_core::{ResourceId, Result, SigilError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyFrame {
    /// Normalized age in `[0, 1]`
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFrameSet {
    pub id: ResourceId,
    pub keys: Vec<KeyFrame>,
}

impl KeyFrameSet {
    pub fn new(id: ResourceId, mut keys: Vec<KeyFrame>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { id, keys }
    }

    /// Sample the curve at normalized age `t`, clamping outside the key range.
    /// An empty set samples as 1.0.
    pub fn sample(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 1.0;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                return a.value + (b.value - a.value) * ((t - a.time) / span);
            }
        }
        last.value
    }
}

/// Decode a key-frame set resource.
pub fn decode_key_frames(id: ResourceId, bytes: &[u8]) -> Result<KeyFrameSet> {
    let mut cursor = ByteCursor::new(bytes);
    let count = cursor.read_u32()? as usize;
    let needed = count.saturating_mul(8);
    if needed > cursor.remaining() {
        return Err(SigilError::InvalidHeader(format!(
            "key-frame set {id} declares {count} keys but holds {} bytes",
            cursor.remaining()
        )));
    }

    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        let time = cursor.read_f32()?;
        let value = cursor.read_f32()?;
        keys.push(KeyFrame { time, value });
    }
    if !cursor.is_at_end() {
        tracing::warn!(
            set = %id,
            trailing = cursor.remaining(),
            "trailing bytes after key-frame set"
        );
    }
    Ok(KeyFrameSet::new(id, keys))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(keys: &[(f32, f32)]) -> Vec<u8> {
        let mut bytes = (keys.len() as u32).to_le_bytes().to_vec();
        for (t, v) in keys {
            bytes.extend_from_slice(&t.to_le_bytes());
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn sample_interpolates_and_clamps() {
        let set = decode_key_frames(
            ResourceId::from_name("fade"),
            &encode(&[(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]),
        )
        .unwrap();
        assert!((set.sample(-1.0) - 0.0).abs() < 1e-6);
        assert!((set.sample(0.25) - 0.5).abs() < 1e-6);
        assert!((set.sample(0.5) - 1.0).abs() < 1e-6);
        assert!((set.sample(0.75) - 0.5).abs() < 1e-6);
        assert!((set.sample(2.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn keys_are_sorted_by_time() {
        let set = decode_key_frames(
            ResourceId::from_name("ord"),
            &encode(&[(1.0, 4.0), (0.0, 2.0)]),
        )
        .unwrap();
        assert!((set.keys[0].time - 0.0).abs() < 1e-6);
        assert!((set.sample(0.5) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn overlong_count_is_rejected() {
        let mut bytes = encode(&[(0.0, 1.0)]);
        bytes[0] = 9;
        assert!(matches!(
            decode_key_frames(ResourceId::from_name("bad"), &bytes),
            Err(SigilError::InvalidHeader(_))
        ));
    }

    #[test]
    fn empty_set_samples_one() {
        let set = KeyFrameSet::new(ResourceId::from_name("none"), Vec::new());
        assert!((set.sample(0.3) - 1.0).abs() < 1e-6);
    }
}
