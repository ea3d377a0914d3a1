use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use match_schema::{
    encode_event_json, encode_match_json, read_match, root_as_event_wrapper, root_as_map,
    root_as_match_footer, Action, ActionState, BodyType, MapState, MatchEvent, MatchFooterState,
    MatchHeader, MatchHeaderState, MatchStream, MatchStreamWriter, Round, RoundState,
    SpawnedBodyState, Team, Vec2,
};
use match_wire::BuilderOptions;
use tracing::{info, warn};

mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Match replay inspector", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a single finished buffer.
    Dump {
        file: PathBuf,
        /// Record type at the root of the buffer.
        #[arg(long, value_enum, default_value_t = RootKind::Event)]
        kind: RootKind,
        /// Materialize the whole record and print it as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Walk a replay file event by event.
    Stream {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a synthetic replay.
    Demo {
        file: PathBuf,
        /// Builder options JSON; the built-in options are used otherwise.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 20)]
        rounds: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RootKind {
    Map,
    Footer,
    Round,
    Header,
    Event,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Dump { file, kind, json } => dump(&file, kind, json),
        Command::Stream { file, json } => stream(&file, json),
        Command::Demo {
            file,
            config,
            rounds,
        } => demo(&file, config.as_deref(), rounds),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))
}

fn dump(path: &Path, kind: RootKind, json: bool) -> Result<()> {
    let bytes = read_file(path)?;
    info!(path = %path.display(), bytes = bytes.len(), ?kind, "inspector.dump");

    if json {
        let text = match kind {
            RootKind::Map => serde_json::to_string_pretty(&MapState::from_wire(&root_as_map(&bytes)?)?)?,
            RootKind::Footer => serde_json::to_string_pretty(&MatchFooterState::from_wire(
                &root_as_match_footer(&bytes)?,
            )?)?,
            RootKind::Round => serde_json::to_string_pretty(&RoundState::from_wire(
                &match_wire::root::<Round<'_>>(&bytes)?,
            )?)?,
            RootKind::Header => serde_json::to_string_pretty(&MatchHeaderState::from_wire(
                &match_wire::root::<MatchHeader<'_>>(&bytes)?,
            )?)?,
            RootKind::Event => {
                let event = MatchEvent::from_wire(&root_as_event_wrapper(&bytes)?)?
                    .ok_or_else(|| eyre!("event wrapper carries no payload"))?;
                encode_event_json(&event)?
            }
        };
        println!("{text}");
        return Ok(());
    }

    let lines = match kind {
        RootKind::Map => render::map_lines(&root_as_map(&bytes)?),
        RootKind::Footer => render::footer_lines(&root_as_match_footer(&bytes)?),
        RootKind::Round => render::round_lines(&match_wire::root::<Round<'_>>(&bytes)?),
        RootKind::Header => render::header_lines(&match_wire::root::<MatchHeader<'_>>(&bytes)?),
        RootKind::Event => render::event_lines(&root_as_event_wrapper(&bytes)?),
    };
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn stream(path: &Path, json: bool) -> Result<()> {
    let bytes = read_file(path)?;
    if json {
        let events = read_match(&bytes)?;
        println!("{}", encode_match_json(&events)?);
        return Ok(());
    }

    let mut count = 0;
    for (index, wrapper) in MatchStream::new(&bytes).enumerate() {
        match wrapper {
            Ok(wrapper) => {
                println!("{}", render::event_summary(index, &wrapper));
                count += 1;
            }
            Err(err) => {
                warn!(index, error = %err, "inspector.stream.invalid");
                return Err(err.into());
            }
        }
    }
    info!(events = count, bytes = bytes.len(), "inspector.stream.done");
    Ok(())
}

fn demo(path: &Path, config: Option<&Path>, rounds: i32) -> Result<()> {
    let options = match config {
        Some(config) => BuilderOptions::from_file(config)?,
        None => BuilderOptions::builtin(),
    };
    let file = fs::File::create(path).wrap_err_with(|| format!("creating {}", path.display()))?;
    let mut writer = MatchStreamWriter::with_options(std::io::BufWriter::new(file), &options);
    for event in demo_match(rounds.max(0)) {
        writer.write_event(&event)?;
    }
    let bytes = writer.bytes_written();
    let events = writer.events_written();
    writer.finish()?;
    info!(path = %path.display(), events, bytes, "inspector.demo.written");
    Ok(())
}

fn demo_map() -> MapState {
    let body = |robot_id: i32, team: Team, body_type: BodyType, x: f32, y: f32| SpawnedBodyState {
        robot_id,
        team,
        body_type,
        loc: Vec2::new(x, y),
    };
    MapState {
        name: Some("arena1".to_string()),
        min_corner: Vec2::ZERO,
        max_corner: Vec2::new(100.0, 100.0),
        bodies: vec![
            body(1, Team::A, BodyType::Archon, 10.0, 10.0),
            body(2, Team::B, BodyType::Archon, 90.0, 90.0),
            body(3, Team::Neutral, BodyType::TreeNeutral, 50.0, 50.0),
        ],
    }
}

/// Two archons drifting toward the centre; every tenth round one of them
/// fires at a freshly spawned bullet.
fn demo_match(rounds: i32) -> Vec<MatchEvent> {
    let mut events = vec![MatchEvent::MatchHeader(MatchHeaderState {
        map: Some(demo_map()),
        max_rounds: rounds,
    })];
    let mut next_id = 100;
    for round_id in 1..=rounds {
        let step = round_id as f32 * 0.5;
        let mut round = RoundState {
            round_id,
            moved_ids: vec![1, 2],
            moved_locs: vec![
                Vec2::new((10.0 + step).min(50.0), 10.0),
                Vec2::new((90.0 - step).max(50.0), 90.0),
            ],
            ..RoundState::default()
        };
        if round_id % 10 == 0 {
            round.spawned_bodies.push(SpawnedBodyState {
                robot_id: next_id,
                team: Team::A,
                body_type: BodyType::Bullet,
                loc: round.moved_locs[0],
            });
            round.actions.push(ActionState {
                actor_id: 1,
                action: Action::Fire,
                targets: vec![next_id],
            });
            next_id += 1;
        }
        events.push(MatchEvent::Round(round));
    }
    events.push(MatchEvent::MatchFooter(MatchFooterState {
        winner: Team::A,
        total_rounds: rounds,
    }));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_schema::write_match;

    #[test]
    fn demo_match_is_a_valid_stream() {
        let events = demo_match(25);
        assert_eq!(events.len(), 27);
        let bytes = write_match(&events).expect("write");
        assert_eq!(read_match(&bytes).expect("read"), events);
    }

    #[test]
    fn cli_parses_dump_kind() {
        let cli = Cli::try_parse_from(["match_inspector", "dump", "f.bin", "--kind", "footer"])
            .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Dump {
                kind: RootKind::Footer,
                json: false,
                ..
            }
        ));
    }
}
