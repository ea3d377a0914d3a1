//! Per-round event batches and the actions recorded inside them.

use match_wire::{Builder, DecodeError, Follow, ForwardsOffset, Offset, Table, Vector};

use crate::error::EncodeError;
use crate::geometry::Vec2;
use crate::map::SpawnedBody;
use crate::tags::Action;

/// An action performed by one robot. Targets are body ids, not offsets; a
/// target may name a body that is no longer alive.
#[derive(Debug, Clone, Copy)]
pub struct ActionRecord<'buf> {
    table: Table<'buf>,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionRecordArgs<'a> {
    pub actor_id: i32,
    pub action: Action,
    pub targets: &'a [i32],
}

impl<'buf> Follow<'buf> for ActionRecord<'buf> {
    type Inner = ActionRecord<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

impl<'buf> ActionRecord<'buf> {
    pub const FIELD_ACTOR_ID: u16 = 0;
    pub const FIELD_ACTION: u16 = 1;
    pub const FIELD_TARGETS: u16 = 2;
    pub const FIELD_COUNT: u16 = 3;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn actor_id(&self) -> Result<i32, DecodeError> {
        self.table.get::<i32>(Self::FIELD_ACTOR_ID, 0)
    }

    pub fn action(&self) -> Result<Action, DecodeError> {
        Action::from_code(self.table.get::<u8>(Self::FIELD_ACTION, 0)?)
    }

    /// The target ids, checked against the action's target shape.
    pub fn targets(&self) -> Result<Vector<'buf, i32>, DecodeError> {
        let action = self.action()?;
        let targets = self.raw_targets()?;
        let shape = action.target_shape();
        if !shape.accepts(targets.len()) {
            return Err(DecodeError::ConstraintViolation {
                record: "ActionRecord",
                detail: format!("{action} takes {shape} targets, found {}", targets.len()),
            });
        }
        Ok(targets)
    }

    /// The target list as stored, without consulting the action.
    pub fn raw_targets(&self) -> Result<Vector<'buf, i32>, DecodeError> {
        self.table.get_vector::<i32>(Self::FIELD_TARGETS)
    }

    /// The first target, for actions that take exactly one.
    pub fn target(&self) -> Result<Option<i32>, DecodeError> {
        let targets = self.targets()?;
        if targets.is_empty() {
            return Ok(None);
        }
        targets.get(0).map(Some)
    }

    pub fn create<'fbb>(
        builder: &mut Builder<'fbb>,
        args: &ActionRecordArgs<'_>,
    ) -> Result<Offset<ActionRecord<'fbb>>, EncodeError> {
        let shape = args.action.target_shape();
        if !shape.accepts(args.targets.len()) {
            return Err(EncodeError::TargetCount {
                action: args.action,
                expected: shape,
                found: args.targets.len(),
            });
        }
        let targets = if args.targets.is_empty() {
            None
        } else {
            Some(builder.create_vector(args.targets)?)
        };

        builder.start_table(Self::FIELD_COUNT)?;
        if let Some(targets) = targets {
            builder.push_offset_slot(Self::FIELD_TARGETS, targets)?;
        }
        builder.push_slot::<i32>(Self::FIELD_ACTOR_ID, args.actor_id, 0)?;
        builder.push_slot::<u8>(Self::FIELD_ACTION, args.action.code(), 0)?;
        Ok(builder.end_table()?)
    }
}

/// Everything that changed in one round.
#[derive(Debug, Clone, Copy)]
pub struct Round<'buf> {
    table: Table<'buf>,
}

pub type SpawnedList<'buf> = Vector<'buf, ForwardsOffset<SpawnedBody<'buf>>>;
pub type ActionList<'buf> = Vector<'buf, ForwardsOffset<ActionRecord<'buf>>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct RoundArgs<'a, 'fbb> {
    pub round_id: i32,
    pub moved_ids: &'a [i32],
    pub moved_locs: &'a [Vec2],
    pub spawned_bodies: &'a [Offset<SpawnedBody<'fbb>>],
    pub died_ids: &'a [i32],
    pub actions: &'a [Offset<ActionRecord<'fbb>>],
}

impl<'buf> Follow<'buf> for Round<'buf> {
    type Inner = Round<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

impl<'buf> Round<'buf> {
    pub const FIELD_ROUND_ID: u16 = 0;
    pub const FIELD_MOVED_IDS: u16 = 1;
    pub const FIELD_MOVED_LOCS: u16 = 2;
    pub const FIELD_SPAWNED_BODIES: u16 = 3;
    pub const FIELD_DIED_IDS: u16 = 4;
    pub const FIELD_ACTIONS: u16 = 5;
    pub const FIELD_COUNT: u16 = 6;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn round_id(&self) -> Result<i32, DecodeError> {
        self.table.get::<i32>(Self::FIELD_ROUND_ID, 0)
    }

    pub fn moved_ids(&self) -> Result<Vector<'buf, i32>, DecodeError> {
        self.table.get_vector::<i32>(Self::FIELD_MOVED_IDS)
    }

    pub fn moved_locs(&self) -> Result<Vector<'buf, Vec2>, DecodeError> {
        self.table.get_vector::<Vec2>(Self::FIELD_MOVED_LOCS)
    }

    fn movement_vectors(&self) -> Result<(Vector<'buf, i32>, Vector<'buf, Vec2>), DecodeError> {
        let ids = self.moved_ids()?;
        let locs = self.moved_locs()?;
        if ids.len() != locs.len() {
            return Err(DecodeError::ConstraintViolation {
                record: "Round",
                detail: format!("{} moved ids but {} moved locations", ids.len(), locs.len()),
            });
        }
        Ok((ids, locs))
    }

    pub fn movement_count(&self) -> Result<usize, DecodeError> {
        Ok(self.movement_vectors()?.0.len())
    }

    /// The `index`-th movement as `(body id, new location)`.
    pub fn movement(&self, index: usize) -> Result<(i32, Vec2), DecodeError> {
        let (ids, locs) = self.movement_vectors()?;
        Ok((ids.get(index)?, locs.get(index)?))
    }

    pub fn movements(&self) -> Result<Vec<(i32, Vec2)>, DecodeError> {
        let (ids, locs) = self.movement_vectors()?;
        ids.iter().zip(locs.iter()).map(|(id, loc)| Ok((id?, loc?))).collect()
    }

    pub fn spawned_bodies(&self) -> Result<SpawnedList<'buf>, DecodeError> {
        self.table.get_vector(Self::FIELD_SPAWNED_BODIES)
    }

    pub fn died_ids(&self) -> Result<Vector<'buf, i32>, DecodeError> {
        self.table.get_vector::<i32>(Self::FIELD_DIED_IDS)
    }

    pub fn actions(&self) -> Result<ActionList<'buf>, DecodeError> {
        self.table.get_vector(Self::FIELD_ACTIONS)
    }

    /// Empty lists are omitted from the record entirely.
    pub fn create<'a, 'fbb>(
        builder: &mut Builder<'fbb>,
        args: &RoundArgs<'a, 'fbb>,
    ) -> Result<Offset<Round<'fbb>>, EncodeError> {
        if args.moved_ids.len() != args.moved_locs.len() {
            return Err(EncodeError::MovementLength {
                round_id: args.round_id,
                ids: args.moved_ids.len(),
                locs: args.moved_locs.len(),
            });
        }
        let moved_ids = non_empty(args.moved_ids, |ids| builder.create_vector(ids))?;
        let moved_locs = non_empty(args.moved_locs, |locs| builder.create_vector_of_structs(locs))?;
        let spawned = non_empty(args.spawned_bodies, |bodies| {
            builder.create_vector_of_offsets(bodies)
        })?;
        let died_ids = non_empty(args.died_ids, |ids| builder.create_vector(ids))?;
        let actions = non_empty(args.actions, |actions| builder.create_vector_of_offsets(actions))?;

        builder.start_table(Self::FIELD_COUNT)?;
        if let Some(actions) = actions {
            builder.push_offset_slot(Self::FIELD_ACTIONS, actions)?;
        }
        if let Some(died_ids) = died_ids {
            builder.push_offset_slot(Self::FIELD_DIED_IDS, died_ids)?;
        }
        if let Some(spawned) = spawned {
            builder.push_offset_slot(Self::FIELD_SPAWNED_BODIES, spawned)?;
        }
        if let Some(moved_locs) = moved_locs {
            builder.push_offset_slot(Self::FIELD_MOVED_LOCS, moved_locs)?;
        }
        if let Some(moved_ids) = moved_ids {
            builder.push_offset_slot(Self::FIELD_MOVED_IDS, moved_ids)?;
        }
        builder.push_slot::<i32>(Self::FIELD_ROUND_ID, args.round_id, 0)?;
        Ok(builder.end_table()?)
    }
}

fn non_empty<T, O, E>(
    items: &[T],
    create: impl FnOnce(&[T]) -> Result<O, E>,
) -> Result<Option<O>, E> {
    if items.is_empty() {
        Ok(None)
    } else {
        create(items).map(Some)
    }
}
