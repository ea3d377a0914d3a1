#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::OnceLock;

use match_schema::{BodyType, MapState, MatchEvent, SpawnedBodyState, Team, Vec2};
use match_wire::BuilderOptions;

static OPTIONS: OnceLock<BuilderOptions> = OnceLock::new();

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Builder options with a deliberately small starting buffer, so every test
/// that uses them also exercises growth.
pub fn test_options() -> &'static BuilderOptions {
    OPTIONS.get_or_init(|| {
        let path = fixture_path("test_builder_options.json");
        BuilderOptions::from_file(&path)
            .unwrap_or_else(|err| panic!("loading {}: {err}", path.display()))
    })
}

pub fn short_match() -> anyhow::Result<Vec<MatchEvent>> {
    let text = std::fs::read_to_string(fixture_path("short_match.json"))?;
    Ok(match_schema::decode_match_json(&text)?)
}

pub fn arena1() -> MapState {
    MapState {
        name: Some("arena1".to_string()),
        min_corner: Vec2::new(0.0, 0.0),
        max_corner: Vec2::new(100.0, 100.0),
        bodies: vec![
            SpawnedBodyState {
                robot_id: 11,
                team: Team::A,
                body_type: BodyType::Archon,
                loc: Vec2::new(12.0, 20.0),
            },
            SpawnedBodyState {
                robot_id: 22,
                team: Team::B,
                body_type: BodyType::Soldier,
                loc: Vec2::new(80.0, 75.5),
            },
            SpawnedBodyState {
                robot_id: 33,
                team: Team::Neutral,
                body_type: BodyType::TreeNeutral,
                loc: Vec2::new(50.0, 50.0),
            },
        ],
    }
}
