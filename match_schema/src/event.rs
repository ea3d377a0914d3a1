//! The event union carried by a match stream, and the header that opens it.

use std::fmt;

use match_wire::{Builder, DecodeError, Follow, Offset, Table};
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::footer::MatchFooter;
use crate::map::Map;
use crate::round::Round;

/// Opens a match: the map and the round limit.
#[derive(Debug, Clone, Copy)]
pub struct MatchHeader<'buf> {
    table: Table<'buf>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchHeaderArgs<'fbb> {
    pub map: Option<Offset<Map<'fbb>>>,
    pub max_rounds: i32,
}

impl<'buf> Follow<'buf> for MatchHeader<'buf> {
    type Inner = MatchHeader<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

impl<'buf> MatchHeader<'buf> {
    pub const FIELD_MAP: u16 = 0;
    pub const FIELD_MAX_ROUNDS: u16 = 1;
    pub const FIELD_COUNT: u16 = 2;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn map(&self) -> Result<Option<Map<'buf>>, DecodeError> {
        self.table.get_offset::<Map<'buf>>(Self::FIELD_MAP)
    }

    pub fn max_rounds(&self) -> Result<i32, DecodeError> {
        self.table.get::<i32>(Self::FIELD_MAX_ROUNDS, 0)
    }

    pub fn create<'fbb>(
        builder: &mut Builder<'fbb>,
        args: &MatchHeaderArgs<'fbb>,
    ) -> Result<Offset<MatchHeader<'fbb>>, EncodeError> {
        builder.start_table(Self::FIELD_COUNT)?;
        if let Some(map) = args.map {
            builder.push_offset_slot(Self::FIELD_MAP, map)?;
        }
        builder.push_slot::<i32>(Self::FIELD_MAX_ROUNDS, args.max_rounds, 0)?;
        Ok(builder.end_table()?)
    }
}

closed_enum! {
    /// Discriminant of the event union.
    pub enum EventType ("event type") {
        None = 0 => "NONE",
        MatchHeader = 1 => "MatchHeader",
        Round = 2 => "Round",
        MatchFooter = 3 => "MatchFooter",
    }
}

/// A resolved event payload.
#[derive(Debug, Clone, Copy)]
pub enum Event<'buf> {
    MatchHeader(MatchHeader<'buf>),
    Round(Round<'buf>),
    MatchFooter(MatchFooter<'buf>),
}

impl Event<'_> {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::MatchHeader(_) => EventType::MatchHeader,
            Event::Round(_) => EventType::Round,
            Event::MatchFooter(_) => EventType::MatchFooter,
        }
    }
}

/// A finished but not yet wrapped event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOffset<'fbb> {
    MatchHeader(Offset<MatchHeader<'fbb>>),
    Round(Offset<Round<'fbb>>),
    MatchFooter(Offset<MatchFooter<'fbb>>),
}

impl<'fbb> EventOffset<'fbb> {
    pub fn event_type(&self) -> EventType {
        match self {
            EventOffset::MatchHeader(_) => EventType::MatchHeader,
            EventOffset::Round(_) => EventType::Round,
            EventOffset::MatchFooter(_) => EventType::MatchFooter,
        }
    }

    fn untyped(&self) -> Offset<Table<'fbb>> {
        match self {
            EventOffset::MatchHeader(offset) => offset.retype(),
            EventOffset::Round(offset) => offset.retype(),
            EventOffset::MatchFooter(offset) => offset.retype(),
        }
    }
}

/// Root record of every buffer in a match stream.
#[derive(Debug, Clone, Copy)]
pub struct EventWrapper<'buf> {
    table: Table<'buf>,
}

impl<'buf> Follow<'buf> for EventWrapper<'buf> {
    type Inner = EventWrapper<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

pub fn root_as_event_wrapper(buf: &[u8]) -> Result<EventWrapper<'_>, DecodeError> {
    match_wire::root::<EventWrapper<'_>>(buf)
}

impl<'buf> EventWrapper<'buf> {
    pub const FIELD_E_TYPE: u16 = 0;
    pub const FIELD_E: u16 = 1;
    pub const FIELD_COUNT: u16 = 2;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn event_type(&self) -> Result<EventType, DecodeError> {
        EventType::from_code(self.table.get::<u8>(Self::FIELD_E_TYPE, 0)?)
    }

    /// The payload, read as the table type named by the discriminant.
    /// `None` when the discriminant is NONE or the payload is absent.
    pub fn event(&self) -> Result<Option<Event<'buf>>, DecodeError> {
        let event_type = self.event_type()?;
        if event_type == EventType::None {
            return Ok(None);
        }
        let Some(payload) = self.table.get_table(Self::FIELD_E)? else {
            return Ok(None);
        };
        Ok(Some(match event_type {
            EventType::MatchHeader => Event::MatchHeader(MatchHeader::init_from_table(payload)),
            EventType::Round => Event::Round(Round::init_from_table(payload)),
            EventType::MatchFooter => Event::MatchFooter(MatchFooter::init_from_table(payload)),
            EventType::None => return Ok(None),
        }))
    }

    pub fn as_match_header(&self) -> Result<Option<MatchHeader<'buf>>, DecodeError> {
        Ok(match self.event()? {
            Some(Event::MatchHeader(header)) => Some(header),
            _ => None,
        })
    }

    pub fn as_round(&self) -> Result<Option<Round<'buf>>, DecodeError> {
        Ok(match self.event()? {
            Some(Event::Round(round)) => Some(round),
            _ => None,
        })
    }

    pub fn as_match_footer(&self) -> Result<Option<MatchFooter<'buf>>, DecodeError> {
        Ok(match self.event()? {
            Some(Event::MatchFooter(footer)) => Some(footer),
            _ => None,
        })
    }

    pub fn create<'fbb>(
        builder: &mut Builder<'fbb>,
        event: EventOffset<'fbb>,
    ) -> Result<Offset<EventWrapper<'fbb>>, EncodeError> {
        builder.start_table(Self::FIELD_COUNT)?;
        builder.push_offset_slot(Self::FIELD_E, event.untyped())?;
        builder.push_slot::<u8>(Self::FIELD_E_TYPE, event.event_type().code(), 0)?;
        Ok(builder.end_table()?)
    }
}
