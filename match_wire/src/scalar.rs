//! Little-endian scalars and fixed-layout structs.

use crate::error::DecodeError;

/// A fixed-width little-endian value that can sit in a table slot or a vector.
pub trait Scalar: Copy + PartialEq {
    const SIZE: usize;

    fn write_le(self, dst: &mut [u8]);
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn write_le(self, dst: &mut [u8]) {
                    dst[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                fn read_le(src: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn write_le(self, dst: &mut [u8]) {
        dst[0] = u8::from(self);
    }

    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}

/// A fixed-size, fixed-layout value embedded inline in tables and vectors.
///
/// Structs have no vtable and no optional fields; `SIZE` must already include
/// any trailing padding so that consecutive vector elements stay aligned.
pub trait WireStruct: Copy {
    const SIZE: usize;
    const ALIGN: usize;

    fn write_to(&self, dst: &mut [u8]);
    fn read_from(src: &[u8]) -> Self;
}

/// Borrow `len` bytes starting at `loc`, or report the overrun.
pub fn slice_at(buf: &[u8], loc: usize, len: usize) -> Result<&[u8], DecodeError> {
    loc.checked_add(len)
        .and_then(|end| buf.get(loc..end))
        .ok_or(DecodeError::OutOfBounds {
            position: loc,
            len,
            buffer_len: buf.len(),
        })
}

pub fn read_scalar<T: Scalar>(buf: &[u8], loc: usize) -> Result<T, DecodeError> {
    slice_at(buf, loc, T::SIZE).map(T::read_le)
}

pub fn read_struct<S: WireStruct>(buf: &[u8], loc: usize) -> Result<S, DecodeError> {
    slice_at(buf, loc, S::SIZE).map(S::read_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_little_endian() {
        let mut raw = [0u8; 4];
        450i32.write_le(&mut raw);
        assert_eq!(raw, [0xC2, 0x01, 0x00, 0x00]);
        assert_eq!(i32::read_le(&raw), 450);

        let mut raw = [0u8; 4];
        (-1.5f32).write_le(&mut raw);
        assert_eq!(f32::read_le(&raw), -1.5);
    }

    #[test]
    fn read_past_end_is_out_of_bounds() {
        let buf = [1u8, 2, 3];
        assert_eq!(read_scalar::<u16>(&buf, 1), Ok(0x0302));
        assert_eq!(
            read_scalar::<u32>(&buf, 1),
            Err(DecodeError::OutOfBounds {
                position: 1,
                len: 4,
                buffer_len: 3
            })
        );
        assert!(read_scalar::<u8>(&buf, usize::MAX).is_err());
    }
}
