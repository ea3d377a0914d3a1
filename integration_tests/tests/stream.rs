mod common;

use anyhow::Result;
use match_schema::{
    read_match, write_match, write_match_with, Event, EventType, MatchEvent, MatchStream,
    StreamError,
};
use match_wire::split_size_prefixed;

#[test]
fn fixture_match_round_trips_through_a_stream() -> Result<()> {
    let events = common::short_match()?;
    assert_eq!(events.len(), 4);

    let bytes = write_match_with(&events, common::test_options())?;
    assert_eq!(read_match(&bytes)?, events);

    let kinds = MatchStream::new(&bytes)
        .map(|wrapper| -> Result<EventType> { Ok(wrapper?.event_type()?) })
        .collect::<Result<Vec<EventType>>>()?;
    assert_eq!(
        kinds,
        vec![
            EventType::MatchHeader,
            EventType::Round,
            EventType::Round,
            EventType::MatchFooter
        ]
    );
    Ok(())
}

#[test]
fn stream_events_read_lazily() -> Result<()> {
    let bytes = write_match(&common::short_match()?)?;
    let mut stream = MatchStream::new(&bytes);

    let header = stream.next().expect("header")?;
    let Some(Event::MatchHeader(header)) = header.event()? else {
        anyhow::bail!("first event is not a header");
    };
    let map = header.map()?.expect("map present");
    assert_eq!(map.name()?, Some("shrine"));
    assert_eq!(map.bodies_len()?, 3);

    let round = stream.next().expect("round")?.as_round()?.expect("round payload");
    assert_eq!(round.round_id()?, 1);
    let spawn = round.actions()?.get(0)?;
    assert_eq!(spawn.target()?, Some(10));

    let round = stream.next().expect("round")?.as_round()?.expect("round payload");
    assert_eq!(round.died_ids()?.get(0)?, 2);

    let footer = stream
        .next()
        .expect("footer")?
        .as_match_footer()?
        .expect("footer payload");
    assert_eq!(footer.total_rounds()?, 2);
    assert!(stream.next().is_none());
    Ok(())
}

#[test]
fn header_must_come_first() -> Result<()> {
    let events = common::short_match()?;
    let bytes = write_match(&events)?;
    let (_, without_header) = split_size_prefixed(&bytes)?;

    assert!(matches!(
        read_match(without_header),
        Err(StreamError::MissingHeader {
            found: EventType::Round
        })
    ));
    Ok(())
}

#[test]
fn missing_footer_is_reported_on_both_sides() -> Result<()> {
    let mut events = common::short_match()?;
    let footer = events.pop().expect("footer");
    assert!(matches!(footer, MatchEvent::MatchFooter(_)));

    assert!(matches!(
        write_match(&events),
        Err(StreamError::MissingFooter)
    ));

    let full = write_match(&common::short_match()?)?;
    let mut rest: &[u8] = &full;
    let mut kept = 0;
    for _ in 0..3 {
        let (body, next) = split_size_prefixed(rest)?;
        kept += 4 + body.len();
        rest = next;
    }
    assert!(matches!(
        read_match(&full[..kept]),
        Err(StreamError::MissingFooter)
    ));
    Ok(())
}

#[test]
fn nothing_may_follow_the_footer() -> Result<()> {
    let events = common::short_match()?;
    let mut bytes = write_match(&events)?;
    let (_, after_header) = split_size_prefixed(&bytes)?;
    let (round, _) = split_size_prefixed(after_header)?;
    let mut trailing = (round.len() as u32).to_le_bytes().to_vec();
    trailing.extend_from_slice(round);
    bytes.extend_from_slice(&trailing);

    assert!(matches!(
        read_match(&bytes),
        Err(StreamError::AfterFooter { index: 4 })
    ));
    Ok(())
}
