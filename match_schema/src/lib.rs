//! Record types of the match replay format.
//!
//! Every record is a table in a `match_wire` buffer. The borrowed views
//! (`Map`, `Round`, `MatchFooter`, ...) read fields lazily and never copy;
//! `create` functions write a record through a [`match_wire::Builder`]. The
//! [`state`] module holds owned counterparts for tooling, and [`stream`]
//! concatenates events into a replay file.
//!
//! Layout of a replay:
//!
//! ```text
//! [u32 len][EventWrapper{MatchHeader{Map, maxRounds}}]
//! [u32 len][EventWrapper{Round}] ...
//! [u32 len][EventWrapper{MatchFooter{winner, totalRounds}}]
//! ```

#[macro_use]
pub mod tags;

pub mod error;
pub mod event;
pub mod footer;
pub mod geometry;
pub mod map;
pub mod round;
pub mod state;
pub mod stream;

pub use error::{EncodeError, StreamError};
pub use event::{
    root_as_event_wrapper, Event, EventOffset, EventType, EventWrapper, MatchHeader,
    MatchHeaderArgs,
};
pub use footer::{root_as_match_footer, MatchFooter, MatchFooterArgs};
pub use geometry::Vec2;
pub use map::{root_as_map, Map, MapArgs, SpawnedBody, SpawnedBodyArgs};
pub use round::{ActionRecord, ActionRecordArgs, Round, RoundArgs};
pub use state::{
    build_event, build_map, build_match_footer, build_match_header, build_round,
    decode_event, decode_event_json, decode_map, decode_match_footer, decode_match_json,
    decode_round, encode_event, encode_event_json, encode_event_with, encode_map,
    encode_map_with, encode_match_footer, encode_match_footer_with, encode_match_json,
    encode_round, encode_round_with, ActionState, MapState, MatchEvent, MatchFooterState,
    MatchHeaderState, RoundState, SpawnedBodyState,
};
pub use stream::{read_match, write_match, write_match_with, MatchStream, MatchStreamWriter};
pub use tags::{action_name, body_type_name, team_name, Action, BodyType, TargetShape, Team};
