use match_wire::{read_struct, DecodeError, Follow, InlineSize, Scalar, WireStruct};
use serde::{Deserialize, Serialize};

/// A point or displacement on the map: two f32 coordinates, 8 bytes, stored
/// inline wherever it is used.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when `self` is at or below `other` on both axes.
    pub fn le_both(self, other: Vec2) -> bool {
        self.x <= other.x && self.y <= other.y
    }
}

impl WireStruct for Vec2 {
    const SIZE: usize = 8;
    const ALIGN: usize = 4;

    fn write_to(&self, dst: &mut [u8]) {
        self.x.write_le(&mut dst[0..4]);
        self.y.write_le(&mut dst[4..8]);
    }

    fn read_from(src: &[u8]) -> Self {
        Self {
            x: f32::read_le(&src[0..4]),
            y: f32::read_le(&src[4..8]),
        }
    }
}

impl<'buf> Follow<'buf> for Vec2 {
    type Inner = Vec2;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        read_struct::<Vec2>(buf, loc)
    }
}

impl InlineSize for Vec2 {
    const INLINE_SIZE: usize = <Vec2 as WireStruct>::SIZE;
}
