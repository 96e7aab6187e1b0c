//! Little-endian byte cursor over an instruction stream

use glam::Vec3;
use sigil_core::{ResourceId, Result, Rgba, SigilError};

/// Forward-only reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Move to an absolute offset. Offsets past the end clamp to the end.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.data.len());
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.remaining() < N {
            return Err(SigilError::UnexpectedEnd {
                offset: self.pos,
                wanted: N,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_id(&mut self) -> Result<ResourceId> {
        Ok(ResourceId::new(self.take()?))
    }

    pub fn read_rgba(&mut self) -> Result<Rgba> {
        Ok(Rgba::from_packed(self.read_u32()?))
    }

    /// Read `count` raw words, used when logging unrecognised instructions.
    pub fn read_words(&mut self, count: usize) -> Result<Vec<u32>> {
        (0..count).map(|_| self.read_u32()).collect()
    }
}
