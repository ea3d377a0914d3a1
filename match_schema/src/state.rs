//! Owned, serde-friendly mirrors of the wire records.
//!
//! The wire views borrow the buffer they were read from; these states own
//! their data and can be built into a fresh buffer, materialized from one,
//! or moved through JSON for fixtures and tooling.

use match_wire::{Builder, BuilderOptions, DecodeError, Offset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EncodeError;
use crate::event::{
    root_as_event_wrapper, Event, EventOffset, EventType, EventWrapper, MatchHeader,
    MatchHeaderArgs,
};
use crate::footer::{root_as_match_footer, MatchFooter, MatchFooterArgs};
use crate::geometry::Vec2;
use crate::map::{root_as_map, Map, MapArgs, SpawnedBody, SpawnedBodyArgs};
use crate::round::{ActionRecord, ActionRecordArgs, Round, RoundArgs};
use crate::tags::{Action, BodyType, Team};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnedBodyState {
    pub robot_id: i32,
    pub team: Team,
    pub body_type: BodyType,
    pub loc: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapState {
    pub name: Option<String>,
    pub min_corner: Vec2,
    pub max_corner: Vec2,
    pub bodies: Vec<SpawnedBodyState>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionState {
    pub actor_id: i32,
    pub action: Action,
    pub targets: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundState {
    pub round_id: i32,
    pub moved_ids: Vec<i32>,
    pub moved_locs: Vec<Vec2>,
    pub spawned_bodies: Vec<SpawnedBodyState>,
    pub died_ids: Vec<i32>,
    pub actions: Vec<ActionState>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchHeaderState {
    pub map: Option<MapState>,
    pub max_rounds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchFooterState {
    pub winner: Team,
    pub total_rounds: i32,
}

/// One event of a match stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MatchEvent {
    MatchHeader(MatchHeaderState),
    Round(RoundState),
    MatchFooter(MatchFooterState),
}

impl MatchEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            MatchEvent::MatchHeader(_) => EventType::MatchHeader,
            MatchEvent::Round(_) => EventType::Round,
            MatchEvent::MatchFooter(_) => EventType::MatchFooter,
        }
    }
}

// ── building ────────────────────────────────────────────────────────

pub fn build_spawned_body<'fbb>(
    builder: &mut Builder<'fbb>,
    body: &SpawnedBodyState,
) -> Result<Offset<SpawnedBody<'fbb>>, EncodeError> {
    SpawnedBody::create(
        builder,
        &SpawnedBodyArgs {
            robot_id: body.robot_id,
            team: body.team,
            body_type: body.body_type,
            loc: body.loc,
        },
    )
}

fn create_bodies<'fbb>(
    builder: &mut Builder<'fbb>,
    bodies: &[SpawnedBodyState],
) -> Result<Vec<Offset<SpawnedBody<'fbb>>>, EncodeError> {
    bodies
        .iter()
        .map(|body| build_spawned_body(builder, body))
        .collect()
}

pub fn build_map<'fbb>(
    builder: &mut Builder<'fbb>,
    map: &MapState,
) -> Result<Offset<Map<'fbb>>, EncodeError> {
    let bodies = create_bodies(builder, &map.bodies)?;
    Map::create(
        builder,
        &MapArgs {
            name: map.name.as_deref(),
            min_corner: map.min_corner,
            max_corner: map.max_corner,
            bodies: &bodies,
        },
    )
}

pub fn build_action<'fbb>(
    builder: &mut Builder<'fbb>,
    action: &ActionState,
) -> Result<Offset<ActionRecord<'fbb>>, EncodeError> {
    ActionRecord::create(
        builder,
        &ActionRecordArgs {
            actor_id: action.actor_id,
            action: action.action,
            targets: &action.targets,
        },
    )
}

pub fn build_round<'fbb>(
    builder: &mut Builder<'fbb>,
    round: &RoundState,
) -> Result<Offset<Round<'fbb>>, EncodeError> {
    let spawned = create_bodies(builder, &round.spawned_bodies)?;
    let actions = round
        .actions
        .iter()
        .map(|action| build_action(builder, action))
        .collect::<Result<Vec<_>, _>>()?;
    Round::create(
        builder,
        &RoundArgs {
            round_id: round.round_id,
            moved_ids: &round.moved_ids,
            moved_locs: &round.moved_locs,
            spawned_bodies: &spawned,
            died_ids: &round.died_ids,
            actions: &actions,
        },
    )
}

pub fn build_match_header<'fbb>(
    builder: &mut Builder<'fbb>,
    header: &MatchHeaderState,
) -> Result<Offset<MatchHeader<'fbb>>, EncodeError> {
    let map = header
        .map
        .as_ref()
        .map(|map| build_map(builder, map))
        .transpose()?;
    MatchHeader::create(
        builder,
        &MatchHeaderArgs {
            map,
            max_rounds: header.max_rounds,
        },
    )
}

pub fn build_match_footer<'fbb>(
    builder: &mut Builder<'fbb>,
    footer: &MatchFooterState,
) -> Result<Offset<MatchFooter<'fbb>>, EncodeError> {
    MatchFooter::create(
        builder,
        &MatchFooterArgs {
            winner: footer.winner,
            total_rounds: footer.total_rounds,
        },
    )
}

pub fn build_event<'fbb>(
    builder: &mut Builder<'fbb>,
    event: &MatchEvent,
) -> Result<Offset<EventWrapper<'fbb>>, EncodeError> {
    let payload = match event {
        MatchEvent::MatchHeader(header) => {
            EventOffset::MatchHeader(build_match_header(builder, header)?)
        }
        MatchEvent::Round(round) => EventOffset::Round(build_round(builder, round)?),
        MatchEvent::MatchFooter(footer) => {
            EventOffset::MatchFooter(build_match_footer(builder, footer)?)
        }
    };
    EventWrapper::create(builder, payload)
}

// ── encoding ────────────────────────────────────────────────────────

fn encode_with<T>(
    record: &'static str,
    options: &BuilderOptions,
    build: impl FnOnce(&mut Builder<'static>) -> Result<Offset<T>, EncodeError>,
) -> Result<Vec<u8>, EncodeError> {
    let mut builder = Builder::with_options(options);
    let root = build(&mut builder)?;
    builder.finish(root)?;
    let data = builder.into_finished()?;
    debug!(record, bytes = data.len(), "schema.encode");
    Ok(data)
}

pub fn encode_map(map: &MapState) -> Result<Vec<u8>, EncodeError> {
    encode_map_with(map, &BuilderOptions::default())
}

pub fn encode_map_with(map: &MapState, options: &BuilderOptions) -> Result<Vec<u8>, EncodeError> {
    encode_with("map", options, |builder| build_map(builder, map))
}

pub fn encode_round(round: &RoundState) -> Result<Vec<u8>, EncodeError> {
    encode_round_with(round, &BuilderOptions::default())
}

pub fn encode_round_with(
    round: &RoundState,
    options: &BuilderOptions,
) -> Result<Vec<u8>, EncodeError> {
    encode_with("round", options, |builder| build_round(builder, round))
}

pub fn encode_match_footer(footer: &MatchFooterState) -> Result<Vec<u8>, EncodeError> {
    encode_match_footer_with(footer, &BuilderOptions::default())
}

pub fn encode_match_footer_with(
    footer: &MatchFooterState,
    options: &BuilderOptions,
) -> Result<Vec<u8>, EncodeError> {
    encode_with("match_footer", options, |builder| {
        build_match_footer(builder, footer)
    })
}

pub fn encode_event(event: &MatchEvent) -> Result<Vec<u8>, EncodeError> {
    encode_event_with(event, &BuilderOptions::default())
}

pub fn encode_event_with(
    event: &MatchEvent,
    options: &BuilderOptions,
) -> Result<Vec<u8>, EncodeError> {
    encode_with("event", options, |builder| build_event(builder, event))
}

pub fn encode_event_json(event: &MatchEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn decode_event_json(data: &str) -> serde_json::Result<MatchEvent> {
    serde_json::from_str(data)
}

pub fn encode_match_json(events: &[MatchEvent]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(events)
}

pub fn decode_match_json(data: &str) -> serde_json::Result<Vec<MatchEvent>> {
    serde_json::from_str(data)
}

// ── materializing ───────────────────────────────────────────────────

impl SpawnedBodyState {
    pub fn from_wire(body: &SpawnedBody<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            robot_id: body.robot_id()?,
            team: body.team()?,
            body_type: body.body_type()?,
            loc: body.loc()?.unwrap_or_default(),
        })
    }
}

impl MapState {
    pub fn from_wire(map: &Map<'_>) -> Result<Self, DecodeError> {
        let bodies = map
            .bodies()?
            .iter()
            .map(|body| SpawnedBodyState::from_wire(&body?))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            name: map.name()?.map(str::to_owned),
            min_corner: map.min_corner()?.unwrap_or_default(),
            max_corner: map.max_corner()?.unwrap_or_default(),
            bodies,
        })
    }
}

impl ActionState {
    pub fn from_wire(action: &ActionRecord<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            actor_id: action.actor_id()?,
            action: action.action()?,
            targets: action.targets()?.iter().collect::<Result<_, _>>()?,
        })
    }
}

impl RoundState {
    pub fn from_wire(round: &Round<'_>) -> Result<Self, DecodeError> {
        let (moved_ids, moved_locs) = round.movements()?.into_iter().unzip();
        Ok(Self {
            round_id: round.round_id()?,
            moved_ids,
            moved_locs,
            spawned_bodies: round
                .spawned_bodies()?
                .iter()
                .map(|body| SpawnedBodyState::from_wire(&body?))
                .collect::<Result<_, _>>()?,
            died_ids: round.died_ids()?.iter().collect::<Result<_, _>>()?,
            actions: round
                .actions()?
                .iter()
                .map(|action| ActionState::from_wire(&action?))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl MatchHeaderState {
    pub fn from_wire(header: &MatchHeader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            map: header.map()?.map(|map| MapState::from_wire(&map)).transpose()?,
            max_rounds: header.max_rounds()?,
        })
    }
}

impl MatchFooterState {
    pub fn from_wire(footer: &MatchFooter<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            winner: footer.winner()?,
            total_rounds: footer.total_rounds()?,
        })
    }
}

impl MatchEvent {
    /// `None` for a wrapper with no payload.
    pub fn from_wire(wrapper: &EventWrapper<'_>) -> Result<Option<Self>, DecodeError> {
        Ok(match wrapper.event()? {
            None => None,
            Some(Event::MatchHeader(header)) => {
                Some(MatchEvent::MatchHeader(MatchHeaderState::from_wire(&header)?))
            }
            Some(Event::Round(round)) => Some(MatchEvent::Round(RoundState::from_wire(&round)?)),
            Some(Event::MatchFooter(footer)) => {
                Some(MatchEvent::MatchFooter(MatchFooterState::from_wire(&footer)?))
            }
        })
    }
}

pub fn decode_map(buf: &[u8]) -> Result<MapState, DecodeError> {
    MapState::from_wire(&root_as_map(buf)?)
}

pub fn decode_round(buf: &[u8]) -> Result<RoundState, DecodeError> {
    RoundState::from_wire(&match_wire::root::<Round<'_>>(buf)?)
}

pub fn decode_match_footer(buf: &[u8]) -> Result<MatchFooterState, DecodeError> {
    MatchFooterState::from_wire(&root_as_match_footer(buf)?)
}

pub fn decode_event(buf: &[u8]) -> Result<Option<MatchEvent>, DecodeError> {
    MatchEvent::from_wire(&root_as_event_wrapper(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_round() -> RoundState {
        RoundState {
            round_id: 2,
            moved_ids: vec![1, 2],
            moved_locs: vec![Vec2::new(1.5, 2.0), Vec2::new(3.0, 4.5)],
            spawned_bodies: vec![SpawnedBodyState {
                robot_id: 9,
                team: Team::A,
                body_type: BodyType::Bullet,
                loc: Vec2::new(1.0, 1.0),
            }],
            died_ids: vec![4],
            actions: vec![
                ActionState {
                    actor_id: 1,
                    action: Action::FireTriad,
                    targets: vec![9, 10, 11],
                },
                ActionState {
                    actor_id: 2,
                    action: Action::DieSuicide,
                    targets: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn round_state_survives_the_wire() {
        let round = sample_round();
        let bytes = encode_round(&round).expect("encode");
        assert_eq!(decode_round(&bytes).expect("decode"), round);
    }

    #[test]
    fn map_state_survives_the_wire() {
        let map = MapState {
            name: Some("arena1".to_string()),
            min_corner: Vec2::ZERO,
            max_corner: Vec2::new(100.0, 100.0),
            bodies: vec![SpawnedBodyState {
                robot_id: 1,
                team: Team::Neutral,
                body_type: BodyType::TreeNeutral,
                loc: Vec2::new(50.0, 50.0),
            }],
        };
        let bytes = encode_map(&map).expect("encode");
        assert_eq!(decode_map(&bytes).expect("decode"), map);
    }

    #[test]
    fn named_only_map_is_written_with_corners() {
        let map = MapState {
            name: Some("y".to_string()),
            ..MapState::default()
        };
        let bytes = encode_map(&map).expect("encode");
        let view = root_as_map(&bytes).expect("root");
        assert!(view.table().has_field(Map::FIELD_MIN_CORNER).expect("min"));
        assert!(view.table().has_field(Map::FIELD_MAX_CORNER).expect("max"));
        assert_eq!(view.min_corner(), Ok(Some(Vec2::ZERO)));
        assert_eq!(decode_map(&bytes).expect("decode"), map);
    }

    #[test]
    fn event_json_is_tagged_by_kind() {
        let event = MatchEvent::MatchFooter(MatchFooterState {
            winner: Team::B,
            total_rounds: 450,
        });
        let json = encode_event_json(&event).expect("json");
        assert_eq!(
            json,
            r#"{"kind":"MatchFooter","winner":"B","total_rounds":450}"#
        );
        assert_eq!(decode_event_json(&json).expect("parse"), event);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let event = decode_event_json(r#"{"kind":"Round","round_id":7}"#).expect("parse");
        assert_eq!(
            event,
            MatchEvent::Round(RoundState {
                round_id: 7,
                ..RoundState::default()
            })
        );
    }

    #[test]
    fn forced_defaults_keep_every_field() {
        let footer = MatchFooterState::default();
        let lean = encode_match_footer(&footer).expect("lean");
        let options = BuilderOptions {
            force_defaults: true,
            ..BuilderOptions::default()
        };
        let full = encode_match_footer_with(&footer, &options).expect("full");
        assert!(full.len() > lean.len());
        assert_eq!(decode_match_footer(&lean).expect("lean"), footer);
        assert_eq!(decode_match_footer(&full).expect("full"), footer);
        let table = match_wire::root_table(&full).expect("root");
        assert_eq!(table.has_field(MatchFooter::FIELD_TOTAL_ROUNDS), Ok(true));
    }

    #[test]
    fn event_round_trip() {
        let event = MatchEvent::Round(sample_round());
        let bytes = encode_event(&event).expect("encode");
        assert_eq!(decode_event(&bytes).expect("decode"), Some(event));
    }

    #[test]
    fn bad_target_count_fails_encode() {
        let mut round = sample_round();
        round.actions[0].targets.clear();
        assert!(matches!(
            encode_round(&round),
            Err(EncodeError::TargetCount { .. })
        ));
    }
}
