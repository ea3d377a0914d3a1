//! Wire format core for match replays.
//!
//! A buffer is a graph of tables, vectors, strings and inline structs linked by
//! offsets that are relative to the slot storing them, so a buffer can be
//! copied or memory-mapped anywhere without rewriting it. Everything is
//! little-endian:
//!
//! * header: u32 offset from byte 0 to the root table
//! * table: i32 vtable offset (`vtable = table - value`), then field slots
//! * vtable: u16 vtable byte length, u16 table inline size, one u16 per field
//!   (0 = absent; trailing absent fields are not written)
//! * vector: u32 element count, then inline elements or u32 offsets
//! * string: a byte vector whose count excludes the trailing NUL
//!
//! [`Builder`] writes buffers back to front; [`Table`] and [`Vector`] read them
//! lazily, one field at a time.

mod builder;
mod config;
mod error;
mod scalar;
mod table;
mod vector;

pub use builder::{Builder, Offset};
pub use config::{BuilderOptions, BUILTIN_BUILDER_OPTIONS};
pub use error::{BuildError, ConfigError, DecodeError};
pub use scalar::{read_scalar, read_struct, slice_at, Scalar, WireStruct};
pub use table::{Table, VTable};
pub use vector::{resolve_offset, Follow, ForwardsOffset, InlineSize, Vector, VectorIter};

pub const UOFFSET_SIZE: usize = 4;
pub const SOFFSET_SIZE: usize = 4;
pub const VOFFSET_SIZE: usize = 2;
pub const VTABLE_HEADER_SIZE: usize = 2 * VOFFSET_SIZE;
/// Offsets are stored as u32 but the vtable offset is signed.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Byte position of `field`'s entry inside a vtable.
pub fn field_slot(field: u16) -> usize {
    VTABLE_HEADER_SIZE + field as usize * VOFFSET_SIZE
}

/// Resolve the root of a finished buffer as `T`. Only the 4-byte header is read.
pub fn root<'buf, T: Follow<'buf>>(buf: &'buf [u8]) -> Result<T::Inner, DecodeError> {
    let loc = resolve_offset(buf, 0)?;
    T::follow(buf, loc)
}

pub fn root_table(buf: &[u8]) -> Result<Table<'_>, DecodeError> {
    root::<Table<'_>>(buf)
}

/// Split one size-prefixed buffer off the front of `stream`, returning the
/// buffer (without its prefix) and the remaining bytes.
pub fn split_size_prefixed(stream: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    let size = read_scalar::<u32>(stream, 0)? as usize;
    let body = slice_at(stream, UOFFSET_SIZE, size)?;
    Ok((body, &stream[UOFFSET_SIZE + size..]))
}
