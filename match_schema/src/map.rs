//! The map a match is played on and the bodies spawned onto it.

use match_wire::{Builder, DecodeError, Follow, ForwardsOffset, Offset, Table, Vector};

use crate::error::EncodeError;
use crate::geometry::Vec2;
use crate::tags::{BodyType, Team};

/// A body entering play: a robot, tree or bullet.
#[derive(Debug, Clone, Copy)]
pub struct SpawnedBody<'buf> {
    table: Table<'buf>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnedBodyArgs {
    pub robot_id: i32,
    pub team: Team,
    pub body_type: BodyType,
    pub loc: Vec2,
}

impl<'buf> Follow<'buf> for SpawnedBody<'buf> {
    type Inner = SpawnedBody<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

impl<'buf> SpawnedBody<'buf> {
    pub const FIELD_ROBOT_ID: u16 = 0;
    pub const FIELD_TEAM: u16 = 1;
    pub const FIELD_BODY_TYPE: u16 = 2;
    pub const FIELD_LOC: u16 = 3;
    pub const FIELD_COUNT: u16 = 4;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn robot_id(&self) -> Result<i32, DecodeError> {
        self.table.get::<i32>(Self::FIELD_ROBOT_ID, 0)
    }

    pub fn team(&self) -> Result<Team, DecodeError> {
        Team::from_code(self.table.get::<u8>(Self::FIELD_TEAM, 0)?)
    }

    pub fn body_type(&self) -> Result<BodyType, DecodeError> {
        BodyType::from_code(self.table.get::<u8>(Self::FIELD_BODY_TYPE, 0)?)
    }

    pub fn loc(&self) -> Result<Option<Vec2>, DecodeError> {
        self.table.get_struct::<Vec2>(Self::FIELD_LOC)
    }

    pub fn create<'fbb>(
        builder: &mut Builder<'fbb>,
        args: &SpawnedBodyArgs,
    ) -> Result<Offset<SpawnedBody<'fbb>>, EncodeError> {
        builder.start_table(Self::FIELD_COUNT)?;
        builder.push_struct_slot(Self::FIELD_LOC, &args.loc)?;
        builder.push_slot::<i32>(Self::FIELD_ROBOT_ID, args.robot_id, 0)?;
        builder.push_slot::<u8>(Self::FIELD_BODY_TYPE, args.body_type.code(), 0)?;
        builder.push_slot::<u8>(Self::FIELD_TEAM, args.team.code(), 0)?;
        Ok(builder.end_table()?)
    }
}

/// The static layout of a match.
#[derive(Debug, Clone, Copy)]
pub struct Map<'buf> {
    table: Table<'buf>,
}

pub type BodyList<'buf> = Vector<'buf, ForwardsOffset<SpawnedBody<'buf>>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct MapArgs<'a, 'fbb> {
    pub name: Option<&'a str>,
    pub min_corner: Vec2,
    pub max_corner: Vec2,
    pub bodies: &'a [Offset<SpawnedBody<'fbb>>],
}

impl<'buf> Follow<'buf> for Map<'buf> {
    type Inner = Map<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

pub fn root_as_map(buf: &[u8]) -> Result<Map<'_>, DecodeError> {
    match_wire::root::<Map<'_>>(buf)
}

impl<'buf> Map<'buf> {
    pub const FIELD_NAME: u16 = 0;
    pub const FIELD_MIN_CORNER: u16 = 1;
    pub const FIELD_MAX_CORNER: u16 = 2;
    pub const FIELD_BODIES: u16 = 3;
    pub const FIELD_COUNT: u16 = 4;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn name(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::FIELD_NAME)
    }

    /// The bottom corner of the map. Always written by [`Map::create`], but a
    /// buffer from elsewhere may leave it out.
    pub fn min_corner(&self) -> Result<Option<Vec2>, DecodeError> {
        self.table.get_struct::<Vec2>(Self::FIELD_MIN_CORNER)
    }

    /// The top corner of the map.
    pub fn max_corner(&self) -> Result<Option<Vec2>, DecodeError> {
        self.table.get_struct::<Vec2>(Self::FIELD_MAX_CORNER)
    }

    pub fn bodies(&self) -> Result<BodyList<'buf>, DecodeError> {
        self.table.get_vector(Self::FIELD_BODIES)
    }

    pub fn bodies_len(&self) -> Result<usize, DecodeError> {
        Ok(self.bodies()?.len())
    }

    pub fn body(&self, index: usize) -> Result<SpawnedBody<'buf>, DecodeError> {
        self.bodies()?.get(index)
    }

    /// Children are written first, then the map table. Both corners are
    /// always written and must not be inverted.
    pub fn create<'a, 'fbb>(
        builder: &mut Builder<'fbb>,
        args: &MapArgs<'a, 'fbb>,
    ) -> Result<Offset<Map<'fbb>>, EncodeError> {
        let (min, max) = (args.min_corner, args.max_corner);
        if !min.le_both(max) {
            return Err(EncodeError::InvertedCorners { min, max });
        }
        let name = args.name.map(|name| builder.create_string(name)).transpose()?;
        let bodies = if args.bodies.is_empty() {
            None
        } else {
            Some(builder.create_vector_of_offsets(args.bodies)?)
        };

        builder.start_table(Self::FIELD_COUNT)?;
        if let Some(bodies) = bodies {
            builder.push_offset_slot(Self::FIELD_BODIES, bodies)?;
        }
        builder.push_struct_slot(Self::FIELD_MAX_CORNER, &max)?;
        builder.push_struct_slot(Self::FIELD_MIN_CORNER, &min)?;
        if let Some(name) = name {
            builder.push_offset_slot(Self::FIELD_NAME, name)?;
        }
        Ok(builder.end_table()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body<'fbb>(
        builder: &mut Builder<'fbb>,
        robot_id: i32,
        body_type: BodyType,
    ) -> Offset<SpawnedBody<'fbb>> {
        SpawnedBody::create(
            builder,
            &SpawnedBodyArgs {
                robot_id,
                team: Team::A,
                body_type,
                loc: Vec2::new(robot_id as f32, 1.0),
            },
        )
        .expect("body")
    }

    #[test]
    fn arena_map_round_trips() {
        let mut builder = Builder::new();
        let bodies = [
            body(&mut builder, 1, BodyType::Archon),
            body(&mut builder, 2, BodyType::Gardener),
            body(&mut builder, 3, BodyType::TreeNeutral),
        ];
        let map = Map::create(
            &mut builder,
            &MapArgs {
                name: Some("arena1"),
                min_corner: Vec2::ZERO,
                max_corner: Vec2::new(100.0, 100.0),
                bodies: &bodies,
            },
        )
        .expect("map");
        builder.finish(map).expect("finish");

        let map = root_as_map(builder.finished_data().expect("data")).expect("root");
        assert_eq!(map.name(), Ok(Some("arena1")));
        assert_eq!(map.bodies_len(), Ok(3));
        assert_eq!(map.min_corner().expect("min").map(|c| c.x), Some(0.0));
        assert_eq!(map.max_corner().expect("max").map(|c| c.y), Some(100.0));
        let types: Vec<BodyType> = map
            .bodies()
            .expect("bodies")
            .iter()
            .map(|body| body.and_then(|b| b.body_type()))
            .collect::<Result<_, _>>()
            .expect("types");
        assert_eq!(
            types,
            vec![BodyType::Archon, BodyType::Gardener, BodyType::TreeNeutral]
        );
        let tree = map.body(2).expect("tree");
        assert_eq!(tree.robot_id(), Ok(3));
        assert_eq!(tree.team(), Ok(Team::A));
        assert_eq!(tree.loc(), Ok(Some(Vec2::new(3.0, 1.0))));
    }

    #[test]
    fn default_map_still_writes_both_corners() {
        let mut builder = Builder::new();
        let map = Map::create(&mut builder, &MapArgs::default()).expect("map");
        builder.finish(map).expect("finish");

        let map = root_as_map(builder.finished_data().expect("data")).expect("root");
        assert_eq!(map.name(), Ok(None));
        assert_eq!(map.min_corner(), Ok(Some(Vec2::ZERO)));
        assert_eq!(map.max_corner(), Ok(Some(Vec2::ZERO)));
        assert_eq!(map.bodies_len(), Ok(0));
    }

    #[test]
    fn absent_fields_use_defaults() {
        let mut builder = Builder::new();
        builder.start_table(Map::FIELD_COUNT).expect("start");
        let map: Offset<Map<'_>> = builder.end_table().expect("end");
        builder.finish(map).expect("finish");

        let map = root_as_map(builder.finished_data().expect("data")).expect("root");
        assert_eq!(map.name(), Ok(None));
        assert_eq!(map.min_corner(), Ok(None));
        assert_eq!(map.max_corner(), Ok(None));
        assert_eq!(map.bodies_len(), Ok(0));
        assert!(matches!(
            map.body(0),
            Err(DecodeError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn inverted_corners_are_rejected() {
        let mut builder = Builder::new();
        let err = Map::create(
            &mut builder,
            &MapArgs {
                min_corner: Vec2::new(10.0, 0.0),
                max_corner: Vec2::new(5.0, 5.0),
                ..MapArgs::default()
            },
        )
        .expect_err("inverted");
        assert!(matches!(err, EncodeError::InvertedCorners { .. }));
    }

    #[test]
    fn default_body_keeps_only_its_location() {
        let mut builder = Builder::new();
        let body = SpawnedBody::create(&mut builder, &SpawnedBodyArgs::default()).expect("body");
        builder.finish(body).expect("finish");

        let body = match_wire::root::<SpawnedBody<'_>>(builder.finished_data().expect("data"))
            .expect("root");
        let vtable = body.table().vtable().expect("vtable");
        assert_eq!(vtable.entry_count(), SpawnedBody::FIELD_COUNT as usize);
        assert_eq!(vtable.field_offset(SpawnedBody::FIELD_ROBOT_ID), Ok(None));
        assert_eq!(body.robot_id(), Ok(0));
        assert_eq!(body.team(), Ok(Team::Neutral));
        assert_eq!(body.body_type(), Ok(BodyType::Archon));
        assert_eq!(body.loc(), Ok(Some(Vec2::ZERO)));
    }
}
