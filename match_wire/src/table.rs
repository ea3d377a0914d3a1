//! Lazy, field-at-a-time access to tables.

use crate::error::DecodeError;
use crate::scalar::{read_scalar, read_struct, slice_at, Scalar, WireStruct};
use crate::vector::{resolve_offset, Follow, ForwardsOffset, InlineSize, Vector};
use crate::{field_slot, SOFFSET_SIZE, UOFFSET_SIZE, VOFFSET_SIZE, VTABLE_HEADER_SIZE};

/// A table positioned at `loc` inside a finished buffer.
///
/// Constructing a table reads nothing; every accessor goes back to the bytes.
#[derive(Debug, Clone, Copy)]
pub struct Table<'buf> {
    buf: &'buf [u8],
    loc: usize,
}

/// The field-offset table a [`Table`] points at.
#[derive(Debug, Clone, Copy)]
pub struct VTable<'buf> {
    buf: &'buf [u8],
    loc: usize,
    byte_len: u16,
    inline_size: u16,
}

impl<'buf> Table<'buf> {
    pub fn new(buf: &'buf [u8], loc: usize) -> Self {
        Self { buf, loc }
    }

    pub fn buffer(&self) -> &'buf [u8] {
        self.buf
    }

    pub fn location(&self) -> usize {
        self.loc
    }

    pub fn vtable(&self) -> Result<VTable<'buf>, DecodeError> {
        let soffset = read_scalar::<i32>(self.buf, self.loc)?;
        let position = self.loc as i64 - i64::from(soffset);
        if position < 0 || position as usize >= self.buf.len() {
            return Err(DecodeError::Corrupt {
                what: "vtable offset",
                position: self.loc,
            });
        }
        let position = position as usize;
        let byte_len = read_scalar::<u16>(self.buf, position)?;
        let inline_size = read_scalar::<u16>(self.buf, position + VOFFSET_SIZE)?;
        if (byte_len as usize) < VTABLE_HEADER_SIZE
            || byte_len as usize % VOFFSET_SIZE != 0
            || (inline_size as usize) < SOFFSET_SIZE
        {
            return Err(DecodeError::Corrupt {
                what: "vtable header",
                position,
            });
        }
        slice_at(self.buf, position, byte_len as usize)?;
        slice_at(self.buf, self.loc, inline_size as usize)?;
        Ok(VTable {
            buf: self.buf,
            loc: position,
            byte_len,
            inline_size,
        })
    }

    /// Absolute buffer position of `field`, or `None` when it is absent.
    pub fn field_location(&self, field: u16) -> Result<Option<usize>, DecodeError> {
        self.field_span(field, 1)
    }

    /// Like [`Table::field_location`], but the `width` bytes of the value
    /// must also lie inside the table's inline data.
    pub fn field_span(&self, field: u16, width: usize) -> Result<Option<usize>, DecodeError> {
        let offset = self.vtable()?.field_range(field, width)?;
        Ok(offset.map(|offset| self.loc + offset as usize))
    }

    pub fn has_field(&self, field: u16) -> Result<bool, DecodeError> {
        Ok(self.field_location(field)?.is_some())
    }

    pub fn get<T: Scalar>(&self, field: u16, default: T) -> Result<T, DecodeError> {
        match self.field_span(field, T::SIZE)? {
            Some(position) => read_scalar::<T>(self.buf, position),
            None => Ok(default),
        }
    }

    pub fn get_struct<S: WireStruct>(&self, field: u16) -> Result<Option<S>, DecodeError> {
        self.field_span(field, S::SIZE)?
            .map(|position| read_struct::<S>(self.buf, position))
            .transpose()
    }

    /// Follow the offset stored in `field`.
    pub fn get_offset<T: Follow<'buf>>(&self, field: u16) -> Result<Option<T::Inner>, DecodeError> {
        self.field_span(field, UOFFSET_SIZE)?
            .map(|position| ForwardsOffset::<T>::follow(self.buf, position))
            .transpose()
    }

    pub fn get_str(&self, field: u16) -> Result<Option<&'buf str>, DecodeError> {
        self.get_offset::<&'buf str>(field)
    }

    pub fn get_table(&self, field: u16) -> Result<Option<Table<'buf>>, DecodeError> {
        self.get_offset::<Table<'buf>>(field)
    }

    /// Absent vectors decode as empty.
    pub fn get_vector<T: InlineSize>(&self, field: u16) -> Result<Vector<'buf, T>, DecodeError> {
        Ok(self
            .get_offset::<Vector<'buf, T>>(field)?
            .unwrap_or_else(Vector::empty))
    }

    /// Position of the record an offset field points at, without reading it.
    pub fn offset_target(&self, field: u16) -> Result<Option<usize>, DecodeError> {
        self.field_span(field, UOFFSET_SIZE)?
            .map(|position| resolve_offset(self.buf, position))
            .transpose()
    }
}

impl<'buf> Follow<'buf> for Table<'buf> {
    type Inner = Table<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Table::new(buf, loc))
    }
}

impl<'buf> VTable<'buf> {
    pub fn location(&self) -> usize {
        self.loc
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len as usize
    }

    /// Inline size of the tables using this vtable, vtable offset included.
    pub fn inline_size(&self) -> usize {
        self.inline_size as usize
    }

    /// Number of field entries actually stored. Trailing absent fields are
    /// not written, so this may be smaller than the record's declared count.
    pub fn entry_count(&self) -> usize {
        (self.byte_len as usize - VTABLE_HEADER_SIZE) / VOFFSET_SIZE
    }

    /// Offset of `field` from the table start, `None` when absent.
    pub fn field_offset(&self, field: u16) -> Result<Option<u16>, DecodeError> {
        self.field_range(field, 1)
    }

    /// Offset of a `width`-byte field, rejected unless the whole value fits
    /// before the end of the inline data.
    pub fn field_range(&self, field: u16, width: usize) -> Result<Option<u16>, DecodeError> {
        let slot = field_slot(field);
        if slot + VOFFSET_SIZE > self.byte_len as usize {
            return Ok(None);
        }
        let entry = read_scalar::<u16>(self.buf, self.loc + slot)?;
        if entry == 0 {
            return Ok(None);
        }
        if (entry as usize) < SOFFSET_SIZE || entry as usize + width > self.inline_size as usize {
            return Err(DecodeError::Corrupt {
                what: "vtable entry",
                position: self.loc + slot,
            });
        }
        Ok(Some(entry))
    }
}
