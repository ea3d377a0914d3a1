//! Field-by-field text rendering. A field that fails to decode is shown as
//! an error in place; its neighbours are still rendered.

use std::fmt::Display;

use match_schema::{
    ActionRecord, Event, EventWrapper, Map, MatchFooter, MatchHeader, Round, SpawnedBody,
};
use match_wire::DecodeError;

fn show<T: Display>(value: Result<T, DecodeError>) -> String {
    match value {
        Ok(value) => value.to_string(),
        Err(err) => format!("<{err}>"),
    }
}

fn show_debug<T: std::fmt::Debug>(value: Result<T, DecodeError>) -> String {
    match value {
        Ok(value) => format!("{value:?}"),
        Err(err) => format!("<{err}>"),
    }
}

pub fn body_line(body: &SpawnedBody<'_>) -> String {
    format!(
        "id={} team={} type={} loc={}",
        show(body.robot_id()),
        show(body.team()),
        show(body.body_type()),
        show_debug(body.loc()),
    )
}

pub fn map_lines(map: &Map<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("name: {}", show_debug(map.name())),
        format!("min_corner: {}", show_debug(map.min_corner())),
        format!("max_corner: {}", show_debug(map.max_corner())),
    ];
    match map.bodies() {
        Ok(bodies) => {
            lines.push(format!("bodies: {}", bodies.len()));
            for (index, body) in bodies.iter().enumerate() {
                let line = match body {
                    Ok(body) => body_line(&body),
                    Err(err) => format!("<{err}>"),
                };
                lines.push(format!("  [{index}] {line}"));
            }
        }
        Err(err) => lines.push(format!("bodies: <{err}>")),
    }
    lines
}

pub fn footer_lines(footer: &MatchFooter<'_>) -> Vec<String> {
    vec![
        format!("winner: {}", show(footer.winner())),
        format!("total_rounds: {}", show(footer.total_rounds())),
    ]
}

fn action_line(action: &ActionRecord<'_>) -> String {
    let targets = action
        .targets()
        .and_then(|targets| targets.iter().collect::<Result<Vec<i32>, _>>());
    format!(
        "actor={} action={} targets={}",
        show(action.actor_id()),
        show(action.action()),
        show_debug(targets),
    )
}

pub fn round_lines(round: &Round<'_>) -> Vec<String> {
    let mut lines = vec![
        format!("round_id: {}", show(round.round_id())),
        format!("movements: {}", show(round.movement_count())),
    ];
    match round.spawned_bodies() {
        Ok(bodies) => {
            lines.push(format!("spawned: {}", bodies.len()));
            for body in bodies.iter() {
                lines.push(format!("  {}", show(body.map(|b| body_line(&b)))));
            }
        }
        Err(err) => lines.push(format!("spawned: <{err}>")),
    }
    let died = round
        .died_ids()
        .and_then(|ids| ids.iter().collect::<Result<Vec<i32>, _>>());
    lines.push(format!("died: {}", show_debug(died)));
    match round.actions() {
        Ok(actions) => {
            lines.push(format!("actions: {}", actions.len()));
            for action in actions.iter() {
                lines.push(format!("  {}", show(action.map(|a| action_line(&a)))));
            }
        }
        Err(err) => lines.push(format!("actions: <{err}>")),
    }
    lines
}

pub fn header_lines(header: &MatchHeader<'_>) -> Vec<String> {
    let mut lines = vec![format!("max_rounds: {}", show(header.max_rounds()))];
    match header.map() {
        Ok(Some(map)) => {
            lines.push("map:".to_string());
            lines.extend(map_lines(&map).into_iter().map(|line| format!("  {line}")));
        }
        Ok(None) => lines.push("map: absent".to_string()),
        Err(err) => lines.push(format!("map: <{err}>")),
    }
    lines
}

pub fn event_lines(wrapper: &EventWrapper<'_>) -> Vec<String> {
    let mut lines = vec![format!("event: {}", show(wrapper.event_type()))];
    let body = match wrapper.event() {
        Ok(Some(Event::MatchHeader(header))) => header_lines(&header),
        Ok(Some(Event::Round(round))) => round_lines(&round),
        Ok(Some(Event::MatchFooter(footer))) => footer_lines(&footer),
        Ok(None) => vec!["payload: absent".to_string()],
        Err(err) => vec![format!("payload: <{err}>")],
    };
    lines.extend(body.into_iter().map(|line| format!("  {line}")));
    lines
}

/// One line per stream event.
pub fn event_summary(index: usize, wrapper: &EventWrapper<'_>) -> String {
    let detail = match wrapper.event() {
        Ok(Some(Event::MatchHeader(header))) => {
            let map_name = header
                .map()
                .and_then(|map| map.map(|m| m.name()).transpose())
                .map(|name| name.flatten().unwrap_or("-"));
            format!(
                "map={} max_rounds={}",
                show(map_name),
                show(header.max_rounds())
            )
        }
        Ok(Some(Event::Round(round))) => format!(
            "round={} moved={} spawned={} died={} actions={}",
            show(round.round_id()),
            show(round.movement_count()),
            show(round.spawned_bodies().map(|v| v.len())),
            show(round.died_ids().map(|v| v.len())),
            show(round.actions().map(|v| v.len())),
        ),
        Ok(Some(Event::MatchFooter(footer))) => format!(
            "winner={} total_rounds={}",
            show(footer.winner()),
            show(footer.total_rounds())
        ),
        Ok(None) => "empty".to_string(),
        Err(err) => format!("<{err}>"),
    };
    format!("#{index} {} {detail}", show(wrapper.event_type()))
}
