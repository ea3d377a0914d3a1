mod common;

use anyhow::Result;
use match_schema::{
    body_type_name, encode_map, root_as_map, BodyType, Map, MapArgs, SpawnedBody, Team,
};
use match_wire::{BuildError, Builder, DecodeError};

fn field_position(bytes: &[u8], body: usize, field: u16) -> Result<usize> {
    let map = root_as_map(bytes)?;
    let body = map.body(body)?;
    Ok(body
        .table()
        .field_location(field)?
        .expect("field is present"))
}

#[test]
fn body_type_past_the_end_is_unknown() -> Result<()> {
    assert_eq!(
        body_type_name(10),
        Err(DecodeError::UnknownVariant {
            enumeration: "body type",
            value: 10
        })
    );

    let bytes = encode_map(&common::arena1())?;
    let at = field_position(&bytes, 1, SpawnedBody::FIELD_BODY_TYPE)?;
    let mut patched = bytes.clone();
    patched[at] = 10;

    let map = root_as_map(&patched)?;
    let body = map.body(1)?;
    assert!(matches!(
        body.body_type(),
        Err(DecodeError::UnknownVariant { value: 10, .. })
    ));
    // The rest of the record, and its siblings, still decode.
    assert_eq!(body.robot_id()?, 22);
    assert_eq!(body.team()?, Team::B);
    assert_eq!(map.body(2)?.body_type()?, BodyType::TreeNeutral);
    assert_eq!(map.name()?, Some("arena1"));
    Ok(())
}

#[test]
fn corrupt_vtable_entry_is_reported() -> Result<()> {
    let bytes = encode_map(&common::arena1())?;
    let (vtable_at, slot) = {
        let map = root_as_map(&bytes)?;
        let vtable = map.body(0)?.table().vtable()?;
        (vtable.location(), match_wire::field_slot(SpawnedBody::FIELD_ROBOT_ID))
    };
    let mut patched = bytes.clone();
    patched[vtable_at + slot..vtable_at + slot + 2].copy_from_slice(&0x7FFFu16.to_le_bytes());

    let map = root_as_map(&patched)?;
    assert!(matches!(
        map.body(0)?.robot_id(),
        Err(DecodeError::Corrupt {
            what: "vtable entry",
            ..
        })
    ));
    assert_eq!(map.bodies_len()?, 3);
    assert_eq!(map.max_corner()?.map(|corner| corner.x), Some(100.0));
    Ok(())
}

#[test]
fn truncated_buffer_is_out_of_bounds() -> Result<()> {
    let bytes = encode_map(&common::arena1())?;
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(
        match_schema::decode_map(truncated),
        Err(DecodeError::OutOfBounds { .. }) | Err(DecodeError::Corrupt { .. })
    ));
    Ok(())
}

#[test]
fn invalid_utf8_name_is_local() -> Result<()> {
    let bytes = encode_map(&common::arena1())?;
    let name_at = root_as_map(&bytes)?
        .table()
        .offset_target(Map::FIELD_NAME)?
        .expect("name present");
    let mut patched = bytes.clone();
    patched[name_at + 4] = 0xFF;

    let map = root_as_map(&patched)?;
    assert!(matches!(map.name(), Err(DecodeError::InvalidUtf8 { .. })));
    assert_eq!(map.body(0)?.robot_id()?, 11);
    Ok(())
}

#[test]
fn children_must_close_before_their_parent_opens() -> Result<()> {
    let mut builder = Builder::new();
    builder.start_table(Map::FIELD_COUNT)?;
    assert!(matches!(
        builder.create_string("late"),
        Err(BuildError::NestedConstruction { .. })
    ));
    assert!(matches!(
        Map::create(&mut builder, &MapArgs::default()),
        Err(match_schema::EncodeError::Build(
            BuildError::NestedConstruction { .. }
        ))
    ));
    Ok(())
}

#[test]
fn finished_builder_refuses_more_records() -> Result<()> {
    let mut builder = Builder::new();
    let map = Map::create(&mut builder, &MapArgs::default())?;
    builder.finish(map)?;
    assert!(matches!(
        builder.create_string("after"),
        Err(BuildError::AlreadyFinished)
    ));
    builder.reset();
    builder.create_string("after")?;
    Ok(())
}
