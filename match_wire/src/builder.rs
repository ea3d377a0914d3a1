//! Back-to-front buffer construction.
//!
//! The builder prepends bytes in front of everything written so far. An
//! object's handle is its distance from the *end* of the buffer, which never
//! changes as more bytes are prepended, so a handle stays valid until
//! [`Builder::reset`]. Leaves (strings, vectors, child tables) are therefore
//! built before the tables that point at them.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::config::BuilderOptions;
use crate::error::BuildError;
use crate::scalar::{Scalar, WireStruct};
use crate::vector::{ForwardsOffset, Vector};
use crate::{field_slot, MAX_BUFFER_SIZE, SOFFSET_SIZE, UOFFSET_SIZE, VOFFSET_SIZE, VTABLE_HEADER_SIZE};

const MIN_CAPACITY: usize = 64;

/// Handle to a finished object, typed by what the reader will find there.
pub struct Offset<T> {
    value: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Offset<T> {
    pub fn new(value: u32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(self) -> u32 {
        self.value
    }

    /// Reinterpret the handle, e.g. a table handle as a union member.
    pub fn retype<U>(self) -> Offset<U> {
        Offset::new(self.value)
    }
}

impl<T> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Offset<T> {}

impl<T> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Offset<T> {}

impl<T> fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldLoc {
    field: u16,
    offset: usize,
    size: usize,
}

#[derive(Debug)]
struct OpenTable {
    declared: u16,
    written: Vec<bool>,
}

pub struct Builder<'fbb> {
    buf: Vec<u8>,
    head: usize,
    min_align: usize,
    field_locs: Vec<FieldLoc>,
    open_table: Option<OpenTable>,
    vtables: HashMap<Vec<u8>, usize, RandomState>,
    force_defaults: bool,
    max_buffer_size: usize,
    finished: bool,
    _lifetime: PhantomData<&'fbb ()>,
}

impl<'fbb> Default for Builder<'fbb> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'fbb> Builder<'fbb> {
    pub fn new() -> Self {
        Self::with_options(&BuilderOptions::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_options(&BuilderOptions {
            initial_capacity: capacity,
            ..BuilderOptions::default()
        })
    }

    pub fn with_options(options: &BuilderOptions) -> Self {
        let max_buffer_size = options.max_buffer_size.min(MAX_BUFFER_SIZE);
        let capacity = options.initial_capacity.min(max_buffer_size);
        Self {
            buf: vec![0u8; capacity],
            head: capacity,
            min_align: 1,
            field_locs: Vec::new(),
            open_table: None,
            vtables: HashMap::with_hasher(RandomState::new()),
            force_defaults: options.force_defaults,
            max_buffer_size,
            finished: false,
            _lifetime: PhantomData,
        }
    }

    /// Write scalar fields even when they equal their declared default.
    pub fn force_defaults(&mut self, force: bool) {
        self.force_defaults = force;
    }

    /// Drop everything built so far and keep the allocation. Handles from
    /// before the reset become dangling.
    pub fn reset(&mut self) {
        self.head = self.buf.len();
        self.min_align = 1;
        self.field_locs.clear();
        self.open_table = None;
        self.vtables.clear();
        self.finished = false;
    }

    pub fn used_space(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Distinct vtables emitted into the current buffer.
    pub fn vtable_count(&self) -> usize {
        self.vtables.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    // ── tables ──────────────────────────────────────────────────────

    /// Open a table with `field_count` declared fields.
    pub fn start_table(&mut self, field_count: u16) -> Result<(), BuildError> {
        self.ensure_idle("table")?;
        self.field_locs.clear();
        self.open_table = Some(OpenTable {
            declared: field_count,
            written: vec![false; field_count as usize],
        });
        Ok(())
    }

    /// Write a scalar field, eliding it when it equals `default`.
    pub fn push_slot<T: Scalar>(&mut self, field: u16, value: T, default: T) -> Result<(), BuildError> {
        self.claim_field(field)?;
        if value == default && !self.force_defaults {
            return Ok(());
        }
        self.write_slot(field, value)
    }

    pub fn push_slot_always<T: Scalar>(&mut self, field: u16, value: T) -> Result<(), BuildError> {
        self.claim_field(field)?;
        self.write_slot(field, value)
    }

    pub fn push_struct_slot<S: WireStruct>(&mut self, field: u16, value: &S) -> Result<(), BuildError> {
        self.claim_field(field)?;
        self.prep(S::ALIGN, S::SIZE)?;
        let at = self.make_space(S::SIZE)?;
        value.write_to(&mut self.buf[at..at + S::SIZE]);
        self.field_locs.push(FieldLoc {
            field,
            offset: self.used_space(),
            size: S::SIZE,
        });
        Ok(())
    }

    pub fn push_offset_slot<T>(&mut self, field: u16, target: Offset<T>) -> Result<(), BuildError> {
        self.check_reference(target.value())?;
        self.claim_field(field)?;
        let offset = self.push_uoffset(target.value())?;
        self.field_locs.push(FieldLoc {
            field,
            offset,
            size: UOFFSET_SIZE,
        });
        Ok(())
    }

    /// Close the open table: emit its vtable offset, then either reuse an
    /// identical vtable or write a new one in front of the table.
    pub fn end_table<T>(&mut self) -> Result<Offset<T>, BuildError> {
        self.open_table.take().ok_or(BuildError::NoOpenTable)?;
        self.push::<i32>(0)?;
        let object_offset = self.used_space();
        // Padding in front of the first field belongs to whatever was built
        // before the table, so it is not counted in the inline size.
        let data_start = self
            .field_locs
            .iter()
            .map(|loc| loc.offset - loc.size)
            .min()
            .unwrap_or(object_offset - SOFFSET_SIZE);
        let inline_size = object_offset - data_start;
        if inline_size > u16::MAX as usize {
            return Err(BuildError::TableTooLarge { size: inline_size });
        }

        let entries = self
            .field_locs
            .iter()
            .map(|loc| loc.field as usize + 1)
            .max()
            .unwrap_or(0);
        let vtable_len = VTABLE_HEADER_SIZE + entries * VOFFSET_SIZE;
        let mut vtable = vec![0u8; vtable_len];
        (vtable_len as u16).write_le(&mut vtable[0..]);
        (inline_size as u16).write_le(&mut vtable[VOFFSET_SIZE..]);
        for loc in self.field_locs.drain(..) {
            let entry = (object_offset - loc.offset) as u16;
            entry.write_le(&mut vtable[field_slot(loc.field)..]);
        }

        let vtable_offset = match self.vtables.get(&vtable) {
            Some(&existing) => {
                trace!(len = vtable_len, "wire.vtable.reuse");
                existing
            }
            None => {
                // object_offset is 4-aligned and vtable_len is even, so the
                // u16 entries stay aligned without padding.
                let at = self.make_space(vtable_len)?;
                self.buf[at..at + vtable_len].copy_from_slice(&vtable);
                let vtable_offset = self.used_space();
                trace!(len = vtable_len, entries, "wire.vtable.new");
                self.vtables.insert(vtable, vtable_offset);
                vtable_offset
            }
        };

        let soffset = vtable_offset as i64 - object_offset as i64;
        let table_pos = self.buf.len() - object_offset;
        (soffset as i32).write_le(&mut self.buf[table_pos..table_pos + SOFFSET_SIZE]);
        Ok(Offset::new(object_offset as u32))
    }

    // ── strings and vectors ─────────────────────────────────────────

    pub fn create_string(&mut self, value: &str) -> Result<Offset<&'fbb str>, BuildError> {
        self.create_byte_string(value.as_bytes()).map(Offset::retype)
    }

    /// Length-prefixed bytes followed by one NUL that is not counted.
    pub fn create_byte_string(&mut self, bytes: &[u8]) -> Result<Offset<&'fbb [u8]>, BuildError> {
        self.ensure_idle("string")?;
        self.prep(UOFFSET_SIZE, bytes.len() + 1)?;
        self.push::<u8>(0)?;
        let at = self.make_space(bytes.len())?;
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        self.end_vector(bytes.len())
    }

    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Result<Offset<Vector<'fbb, T>>, BuildError> {
        self.ensure_idle("vector")?;
        let byte_len = self.vector_byte_len(items.len(), T::SIZE)?;
        self.start_vector(T::SIZE, byte_len)?;
        let at = self.make_space(byte_len)?;
        for (index, item) in items.iter().enumerate() {
            item.write_le(&mut self.buf[at + index * T::SIZE..]);
        }
        self.end_vector(items.len())
    }

    pub fn create_vector_of_structs<S: WireStruct>(
        &mut self,
        items: &[S],
    ) -> Result<Offset<Vector<'fbb, S>>, BuildError> {
        self.ensure_idle("vector")?;
        let byte_len = self.vector_byte_len(items.len(), S::SIZE)?;
        self.start_vector(S::ALIGN, byte_len)?;
        let at = self.make_space(byte_len)?;
        for (index, item) in items.iter().enumerate() {
            let slot = at + index * S::SIZE;
            item.write_to(&mut self.buf[slot..slot + S::SIZE]);
        }
        self.end_vector(items.len())
    }

    pub fn create_vector_of_offsets<T>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<Vector<'fbb, ForwardsOffset<T>>>, BuildError> {
        self.ensure_idle("vector")?;
        for item in items {
            self.check_reference(item.value())?;
        }
        let byte_len = self.vector_byte_len(items.len(), UOFFSET_SIZE)?;
        self.start_vector(UOFFSET_SIZE, byte_len)?;
        for item in items.iter().rev() {
            self.push_uoffset(item.value())?;
        }
        self.end_vector(items.len())
    }

    // ── finishing ───────────────────────────────────────────────────

    pub fn finish<T>(&mut self, root: Offset<T>) -> Result<(), BuildError> {
        self.finish_with(root.value(), false)
    }

    /// Finish with a u32 byte length in front of the buffer, for
    /// concatenating several buffers into one stream.
    pub fn finish_size_prefixed<T>(&mut self, root: Offset<T>) -> Result<(), BuildError> {
        self.finish_with(root.value(), true)
    }

    pub fn finished_data(&self) -> Result<&[u8], BuildError> {
        if !self.finished {
            return Err(BuildError::NotFinished);
        }
        Ok(&self.buf[self.head..])
    }

    pub fn into_finished(mut self) -> Result<Vec<u8>, BuildError> {
        if !self.finished {
            return Err(BuildError::NotFinished);
        }
        Ok(self.buf.split_off(self.head))
    }

    fn finish_with(&mut self, root: u32, size_prefixed: bool) -> Result<(), BuildError> {
        self.ensure_idle("root")?;
        self.check_reference(root)?;
        let prefix = if size_prefixed { UOFFSET_SIZE } else { 0 };
        self.prep(self.min_align, UOFFSET_SIZE + prefix)?;
        self.push_uoffset(root)?;
        if size_prefixed {
            let size = self.used_space() as u32;
            self.push::<u32>(size)?;
        }
        self.finished = true;
        debug!(
            bytes = self.used_space(),
            vtables = self.vtables.len(),
            size_prefixed,
            "wire.finish"
        );
        Ok(())
    }

    // ── internals ───────────────────────────────────────────────────

    fn ensure_idle(&self, requested: &'static str) -> Result<(), BuildError> {
        if self.finished {
            return Err(BuildError::AlreadyFinished);
        }
        if self.open_table.is_some() {
            return Err(BuildError::NestedConstruction {
                requested,
                open: "table",
            });
        }
        Ok(())
    }

    fn claim_field(&mut self, field: u16) -> Result<(), BuildError> {
        let table = self.open_table.as_mut().ok_or(BuildError::NoOpenTable)?;
        let slot = table
            .written
            .get_mut(field as usize)
            .ok_or(BuildError::FieldOutOfRange {
                field,
                declared: table.declared,
            })?;
        if *slot {
            return Err(BuildError::DuplicateField { field });
        }
        *slot = true;
        Ok(())
    }

    fn check_reference(&self, target: u32) -> Result<(), BuildError> {
        if target == 0 || target as usize > self.used_space() {
            return Err(BuildError::DanglingOffset {
                offset: target,
                used: self.used_space(),
            });
        }
        Ok(())
    }

    fn write_slot<T: Scalar>(&mut self, field: u16, value: T) -> Result<(), BuildError> {
        let offset = self.push(value)?;
        self.field_locs.push(FieldLoc {
            field,
            offset,
            size: T::SIZE,
        });
        Ok(())
    }

    fn vector_byte_len(&self, len: usize, elem_size: usize) -> Result<usize, BuildError> {
        len.checked_mul(elem_size)
            .filter(|bytes| *bytes <= self.max_buffer_size)
            .ok_or(BuildError::BufferTooLarge {
                requested: len.saturating_mul(elem_size),
                limit: self.max_buffer_size,
            })
    }

    fn start_vector(&mut self, alignment: usize, byte_len: usize) -> Result<(), BuildError> {
        self.prep(UOFFSET_SIZE, byte_len)?;
        self.prep(alignment, byte_len)
    }

    fn end_vector<T>(&mut self, len: usize) -> Result<Offset<T>, BuildError> {
        let offset = self.push::<u32>(len as u32)?;
        Ok(Offset::new(offset as u32))
    }

    /// Push a scalar aligned to its size; returns the new used space, which
    /// is the scalar's handle.
    fn push<T: Scalar>(&mut self, value: T) -> Result<usize, BuildError> {
        self.prep(T::SIZE, 0)?;
        let at = self.make_space(T::SIZE)?;
        value.write_le(&mut self.buf[at..at + T::SIZE]);
        Ok(self.used_space())
    }

    fn push_uoffset(&mut self, target: u32) -> Result<usize, BuildError> {
        self.prep(UOFFSET_SIZE, 0)?;
        self.check_reference(target)?;
        let relative = self.used_space() as u32 - target + UOFFSET_SIZE as u32;
        self.push::<u32>(relative)
    }

    /// Pad so that after writing `additional` bytes the used space is a
    /// multiple of `size`.
    fn prep(&mut self, size: usize, additional: usize) -> Result<(), BuildError> {
        self.min_align = self.min_align.max(size);
        let padding = (!(self.used_space() + additional)).wrapping_add(1) & (size - 1);
        let at = self.make_space(padding)?;
        self.buf[at..at + padding].fill(0);
        Ok(())
    }

    fn make_space(&mut self, want: usize) -> Result<usize, BuildError> {
        if want > self.head {
            self.grow(want)?;
        }
        self.head -= want;
        Ok(self.head)
    }

    fn grow(&mut self, want: usize) -> Result<(), BuildError> {
        let used = self.used_space();
        let required = used
            .checked_add(want)
            .filter(|required| *required <= self.max_buffer_size)
            .ok_or(BuildError::BufferTooLarge {
                requested: used.saturating_add(want),
                limit: self.max_buffer_size,
            })?;
        let mut capacity = self.buf.len().max(MIN_CAPACITY);
        while capacity < required {
            capacity = capacity.saturating_mul(2);
        }
        let capacity = capacity.min(self.max_buffer_size).max(required);
        let mut grown = vec![0u8; capacity];
        grown[capacity - used..].copy_from_slice(&self.buf[self.head..]);
        self.head = capacity - used;
        self.buf = grown;
        trace!(capacity, "wire.grow");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{root_table, DecodeError, Table};

    #[test]
    fn footer_layout_is_bit_exact() {
        let mut builder = Builder::new();
        builder.start_table(2).expect("start");
        builder.push_slot::<i32>(1, 450, 0).expect("rounds");
        builder.push_slot::<u8>(0, 1, 0).expect("winner");
        let footer = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(footer).expect("finish");

        let expected: [u8; 24] = [
            12, 0, 0, 0, // root offset
            8, 0, 12, 0, 7, 0, 8, 0, // vtable
            8, 0, 0, 0, // vtable offset
            0, 0, 0, // padding
            1, // winner
            0xC2, 0x01, 0, 0, // total rounds
        ];
        assert_eq!(builder.finished_data().expect("data"), &expected[..]);
    }

    #[test]
    fn trailing_absent_fields_shrink_the_vtable() {
        let mut builder = Builder::new();
        builder.start_table(2).expect("start");
        builder.push_slot::<i32>(1, 0, 0).expect("rounds");
        builder.push_slot::<u8>(0, 1, 0).expect("winner");
        let footer = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(footer).expect("finish");

        let data = builder.finished_data().expect("data");
        let table = root_table(data).expect("root");
        let vtable = table.vtable().expect("vtable");
        assert_eq!(vtable.entry_count(), 1);
        assert_eq!(vtable.byte_len(), 6);
        assert_eq!(table.get::<i32>(1, 0), Ok(0));
        assert_eq!(table.get::<u8>(0, 0), Ok(1));
    }

    #[test]
    fn force_defaults_writes_default_values() {
        let mut builder = Builder::new();
        builder.force_defaults(true);
        builder.start_table(2).expect("start");
        builder.push_slot::<i32>(1, 0, 0).expect("rounds");
        let footer = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(footer).expect("finish");

        let table = root_table(builder.finished_data().expect("data")).expect("root");
        assert_eq!(table.has_field(1), Ok(true));
    }

    #[test]
    fn identical_vtables_are_shared() {
        let mut builder = Builder::new();
        let mut tables = Vec::new();
        for id in 1..=3i32 {
            builder.start_table(1).expect("start");
            builder.push_slot::<i32>(0, id, 0).expect("id");
            tables.push(builder.end_table::<Table<'_>>().expect("end"));
        }
        assert_eq!(builder.vtable_count(), 1);

        let list = builder.create_vector_of_offsets(&tables).expect("list");
        builder.start_table(2).expect("start");
        builder.push_offset_slot(1, list).expect("list slot");
        let root = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(root).expect("finish");
        assert_eq!(builder.vtable_count(), 2);

        let data = builder.finished_data().expect("data");
        let root = root_table(data).expect("root");
        let items = root.get_vector::<ForwardsOffset<Table<'_>>>(1).expect("items");
        let locations: Vec<usize> = items
            .iter()
            .map(|item| item.and_then(|t| t.vtable()).map(|v| v.location()))
            .collect::<Result<_, DecodeError>>()
            .expect("locations");
        assert_eq!(locations.len(), 3);
        assert!(locations.iter().all(|loc| *loc == locations[0]));
        let ids: Vec<i32> = items
            .iter()
            .map(|item| item.and_then(|t| t.get::<i32>(0, 0)))
            .collect::<Result<_, DecodeError>>()
            .expect("ids");
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn strings_and_vectors_survive_growth() {
        let mut builder = Builder::with_capacity(0);
        let name = builder.create_string("arena1").expect("name");
        let values: Vec<u64> = (0..100).collect();
        let numbers = builder.create_vector(&values).expect("numbers");
        builder.start_table(2).expect("start");
        builder.push_offset_slot(1, numbers).expect("numbers slot");
        builder.push_offset_slot(0, name).expect("name slot");
        let root = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(root).expect("finish");

        let data = builder.into_finished().expect("data");
        let table = root_table(&data).expect("root");
        assert_eq!(table.get_str(0), Ok(Some("arena1")));
        let numbers = table.get_vector::<u64>(1).expect("numbers");
        assert_eq!(numbers.len(), 100);
        assert_eq!(numbers.get(99), Ok(99));
    }

    #[test]
    fn misuse_is_reported_immediately() {
        let mut builder = Builder::new();
        assert_eq!(
            builder.push_slot::<u8>(0, 1, 0),
            Err(BuildError::NoOpenTable)
        );
        assert_eq!(
            builder.end_table::<Table<'_>>(),
            Err(BuildError::NoOpenTable)
        );

        builder.start_table(2).expect("start");
        builder.push_slot::<u8>(0, 1, 0).expect("first write");
        assert_eq!(
            builder.push_slot::<u8>(0, 2, 0),
            Err(BuildError::DuplicateField { field: 0 })
        );
        assert_eq!(
            builder.push_slot::<u8>(2, 2, 0),
            Err(BuildError::FieldOutOfRange {
                field: 2,
                declared: 2
            })
        );
        assert_eq!(
            builder.create_string("late"),
            Err(BuildError::NestedConstruction {
                requested: "string",
                open: "table"
            })
        );
        assert_eq!(
            builder.start_table(1),
            Err(BuildError::NestedConstruction {
                requested: "table",
                open: "table"
            })
        );
        assert!(matches!(
            builder.push_offset_slot(1, Offset::<Table<'_>>::new(4096)),
            Err(BuildError::DanglingOffset { offset: 4096, .. })
        ));
        let table = builder.end_table::<Table<'_>>().expect("end");
        builder.finish(table).expect("finish");
        assert_eq!(builder.start_table(1), Err(BuildError::AlreadyFinished));

        builder.reset();
        assert_eq!(builder.finished_data(), Err(BuildError::NotFinished));
        builder.start_table(0).expect("start after reset");
    }

    #[test]
    fn buffer_limit_is_enforced() {
        let mut builder = Builder::with_options(&BuilderOptions {
            initial_capacity: 16,
            force_defaults: false,
            max_buffer_size: 32,
        });
        let big = [0u8; 64];
        assert!(matches!(
            builder.create_vector(&big),
            Err(BuildError::BufferTooLarge { limit: 32, .. })
        ));
    }

    #[test]
    fn size_prefixed_buffer_reports_its_length() {
        let mut builder = Builder::new();
        builder.start_table(1).expect("start");
        builder.push_slot::<i32>(0, 9, 0).expect("value");
        let root = builder.end_table::<Table<'_>>().expect("end");
        builder.finish_size_prefixed(root).expect("finish");

        let data = builder.finished_data().expect("data");
        let (body, rest) = crate::split_size_prefixed(data).expect("split");
        assert!(rest.is_empty());
        assert_eq!(body.len() + UOFFSET_SIZE, data.len());
        assert_eq!(root_table(body).and_then(|t| t.get::<i32>(0, 0)), Ok(9));
    }
}
