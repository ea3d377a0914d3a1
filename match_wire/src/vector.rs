//! Length-prefixed vectors, strings and forward offsets.

use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::scalar::{read_scalar, slice_at, Scalar};
use crate::UOFFSET_SIZE;

/// Resolve a value of type `Self` stored at `loc`.
///
/// Implementations only touch the bytes they need; nothing is cached, so a
/// follow is a pure function of `(buf, loc)`.
pub trait Follow<'buf> {
    type Inner;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError>;
}

/// Width of one vector slot holding `Self`.
pub trait InlineSize {
    const INLINE_SIZE: usize;
}

macro_rules! impl_follow_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'buf> Follow<'buf> for $ty {
                type Inner = $ty;

                fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
                    read_scalar::<$ty>(buf, loc)
                }
            }

            impl InlineSize for $ty {
                const INLINE_SIZE: usize = <$ty as Scalar>::SIZE;
            }
        )*
    };
}

impl_follow_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, bool);

/// Read the u32 stored at `loc` and return the position it points to.
pub fn resolve_offset(buf: &[u8], loc: usize) -> Result<usize, DecodeError> {
    let relative = read_scalar::<u32>(buf, loc)?;
    if relative == 0 {
        return Err(DecodeError::Corrupt {
            what: "zero offset",
            position: loc,
        });
    }
    let target = loc.checked_add(relative as usize).ok_or(DecodeError::Corrupt {
        what: "offset",
        position: loc,
    })?;
    if target >= buf.len() {
        return Err(DecodeError::OutOfBounds {
            position: target,
            len: 0,
            buffer_len: buf.len(),
        });
    }
    Ok(target)
}

/// A slot holding a u32 offset, relative to the slot, to a `T`.
pub struct ForwardsOffset<T>(PhantomData<T>);

impl<'buf, T: Follow<'buf>> Follow<'buf> for ForwardsOffset<T> {
    type Inner = T::Inner;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let target = resolve_offset(buf, loc)?;
        T::follow(buf, target)
    }
}

impl<T> InlineSize for ForwardsOffset<T> {
    const INLINE_SIZE: usize = UOFFSET_SIZE;
}

impl<'buf> Follow<'buf> for &'buf [u8] {
    type Inner = &'buf [u8];

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let len = read_scalar::<u32>(buf, loc)? as usize;
        slice_at(buf, loc + UOFFSET_SIZE, len)
    }
}

/// Strings carry no terminator inside their counted length.
impl<'buf> Follow<'buf> for &'buf str {
    type Inner = &'buf str;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let bytes = <&[u8]>::follow(buf, loc)?;
        std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { position: loc })
    }
}

/// A borrowed view over a vector in a finished buffer.
pub struct Vector<'buf, T> {
    buf: &'buf [u8],
    loc: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<'buf, T> Clone for Vector<'buf, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'buf, T> Copy for Vector<'buf, T> {}

impl<'buf, T> fmt::Debug for Vector<'buf, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vector")
            .field("loc", &self.loc)
            .field("len", &self.len)
            .finish()
    }
}

impl<'buf, T> Vector<'buf, T> {
    /// The value an absent vector field decodes to.
    pub fn empty() -> Self {
        Self {
            buf: &[],
            loc: 0,
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer position of the first slot.
    pub fn location(&self) -> usize {
        self.loc
    }
}

impl<'buf, T: Follow<'buf> + InlineSize> Vector<'buf, T> {
    /// Decode slot `index`. Only that slot (and whatever it points to) is read.
    pub fn get(&self, index: usize) -> Result<T::Inner, DecodeError> {
        if index >= self.len {
            return Err(DecodeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        T::follow(self.buf, self.loc + index * T::INLINE_SIZE)
    }

    pub fn iter(&self) -> VectorIter<'buf, T> {
        VectorIter {
            vector: *self,
            next: 0,
        }
    }
}

impl<'buf> Vector<'buf, u8> {
    pub fn as_bytes(&self) -> &'buf [u8] {
        &self.buf[self.loc..self.loc + self.len]
    }
}

impl<'buf, T: InlineSize> Follow<'buf> for Vector<'buf, T> {
    type Inner = Vector<'buf, T>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        let len = read_scalar::<u32>(buf, loc)? as usize;
        let start = loc + UOFFSET_SIZE;
        let byte_len = len.checked_mul(T::INLINE_SIZE).ok_or(DecodeError::Corrupt {
            what: "vector length",
            position: loc,
        })?;
        slice_at(buf, start, byte_len)?;
        Ok(Vector {
            buf,
            loc: start,
            len,
            _marker: PhantomData,
        })
    }
}

pub struct VectorIter<'buf, T> {
    vector: Vector<'buf, T>,
    next: usize,
}

impl<'buf, T: Follow<'buf> + InlineSize> Iterator for VectorIter<'buf, T> {
    type Item = Result<T::Inner, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<'buf, T: Follow<'buf> + InlineSize> ExactSizeIterator for VectorIter<'buf, T> {}

impl<'buf, T: Follow<'buf> + InlineSize> IntoIterator for Vector<'buf, T> {
    type Item = Result<T::Inner, DecodeError>;
    type IntoIter = VectorIter<'buf, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
