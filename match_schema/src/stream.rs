//! Match streams: size-prefixed `EventWrapper` buffers back to back.
//!
//! A well-formed stream opens with exactly one MatchHeader, carries any
//! number of Rounds and closes with exactly one MatchFooter. Both the writer
//! and the reader enforce that order.

use std::io::Write;

use match_wire::{split_size_prefixed, Builder, BuilderOptions, DecodeError};
use tracing::{debug, trace};

use crate::error::StreamError;
use crate::event::{root_as_event_wrapper, EventType, EventWrapper};
use crate::state::{build_event, MatchEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Opening,
    Rounds,
    Closed,
}

/// Ordering state shared by the writer and the reader.
#[derive(Debug, Clone, Copy, Default)]
struct OrderCheck {
    phase: Phase,
    index: usize,
}

impl OrderCheck {
    fn admit(&mut self, event_type: EventType) -> Result<(), StreamError> {
        let index = self.index;
        match (self.phase, event_type) {
            (_, EventType::None) => {
                return Err(StreamError::UnexpectedEventType {
                    index,
                    found: event_type,
                })
            }
            (Phase::Closed, _) => return Err(StreamError::AfterFooter { index }),
            (Phase::Opening, EventType::MatchHeader) => self.phase = Phase::Rounds,
            (Phase::Opening, found) => return Err(StreamError::MissingHeader { found }),
            (Phase::Rounds, EventType::MatchHeader) => {
                return Err(StreamError::DuplicateHeader { index })
            }
            (Phase::Rounds, EventType::Round) => {}
            (Phase::Rounds, EventType::MatchFooter) => self.phase = Phase::Closed,
        }
        self.index += 1;
        Ok(())
    }

    fn closed(&self) -> bool {
        self.phase == Phase::Closed
    }
}

/// Writes a match stream event by event, reusing one builder.
pub struct MatchStreamWriter<W: Write> {
    writer: W,
    builder: Builder<'static>,
    order: OrderCheck,
    bytes_written: usize,
}

impl<W: Write> MatchStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, &BuilderOptions::default())
    }

    pub fn with_options(writer: W, options: &BuilderOptions) -> Self {
        Self {
            writer,
            builder: Builder::with_options(options),
            order: OrderCheck::default(),
            bytes_written: 0,
        }
    }

    pub fn events_written(&self) -> usize {
        self.order.index
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn write_event(&mut self, event: &MatchEvent) -> Result<(), StreamError> {
        let mut order = self.order;
        order.admit(event.event_type())?;
        self.builder.reset();
        let root = build_event(&mut self.builder, event)?;
        self.builder.finish_size_prefixed(root)?;
        let data = self.builder.finished_data()?;
        self.writer.write_all(data)?;
        self.bytes_written += data.len();
        trace!(
            index = self.order.index,
            event = %event.event_type(),
            bytes = data.len(),
            "stream.event.write"
        );
        self.order = order;
        Ok(())
    }

    /// Flush and hand back the writer. Fails if no footer was written.
    pub fn finish(mut self) -> Result<W, StreamError> {
        if !self.order.closed() {
            return Err(StreamError::MissingFooter);
        }
        self.writer.flush()?;
        debug!(
            events = self.order.index,
            bytes = self.bytes_written,
            "stream.finish"
        );
        Ok(self.writer)
    }
}

/// Walks a match stream, yielding each event wrapper once its position in
/// the stream has been checked. Stops after the first error.
pub struct MatchStream<'buf> {
    rest: &'buf [u8],
    order: OrderCheck,
    done: bool,
}

impl<'buf> MatchStream<'buf> {
    pub fn new(stream: &'buf [u8]) -> Self {
        Self {
            rest: stream,
            order: OrderCheck::default(),
            done: false,
        }
    }

    fn next_wrapper(&mut self) -> Result<EventWrapper<'buf>, StreamError> {
        let (body, rest) = split_size_prefixed(self.rest)?;
        self.rest = rest;
        let wrapper = root_as_event_wrapper(body)?;
        self.order.admit(wrapper.event_type()?)?;
        Ok(wrapper)
    }
}

impl<'buf> Iterator for MatchStream<'buf> {
    type Item = Result<EventWrapper<'buf>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.rest.is_empty() {
            self.done = true;
            return if self.order.closed() {
                None
            } else {
                Some(Err(StreamError::MissingFooter))
            };
        }
        let item = self.next_wrapper();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

/// Materialize every event of a stream.
pub fn read_match(stream: &[u8]) -> Result<Vec<MatchEvent>, StreamError> {
    let mut events = Vec::new();
    for wrapper in MatchStream::new(stream) {
        let wrapper = wrapper?;
        let event = MatchEvent::from_wire(&wrapper)?.ok_or(DecodeError::Corrupt {
            what: "event payload",
            position: wrapper.table().location(),
        })?;
        events.push(event);
    }
    debug!(events = events.len(), bytes = stream.len(), "stream.read");
    Ok(events)
}

/// Write a whole match to an in-memory stream.
pub fn write_match(events: &[MatchEvent]) -> Result<Vec<u8>, StreamError> {
    write_match_with(events, &BuilderOptions::default())
}

pub fn write_match_with(
    events: &[MatchEvent],
    options: &BuilderOptions,
) -> Result<Vec<u8>, StreamError> {
    let mut writer = MatchStreamWriter::with_options(Vec::new(), options);
    for event in events {
        writer.write_event(event)?;
    }
    writer.finish()
}
