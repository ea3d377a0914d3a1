use match_wire::{Builder, DecodeError, Follow, Offset, Table};

use crate::error::EncodeError;
use crate::tags::Team;

/// The terminal record of a match. `total_rounds` is absent-defaulted to 0.
#[derive(Debug, Clone, Copy)]
pub struct MatchFooter<'buf> {
    table: Table<'buf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFooterArgs {
    pub winner: Team,
    pub total_rounds: i32,
}

impl<'buf> Follow<'buf> for MatchFooter<'buf> {
    type Inner = MatchFooter<'buf>;

    fn follow(buf: &'buf [u8], loc: usize) -> Result<Self::Inner, DecodeError> {
        Ok(Self::init_from_table(Table::new(buf, loc)))
    }
}

pub fn root_as_match_footer(buf: &[u8]) -> Result<MatchFooter<'_>, DecodeError> {
    match_wire::root::<MatchFooter<'_>>(buf)
}

impl<'buf> MatchFooter<'buf> {
    pub const FIELD_WINNER: u16 = 0;
    pub const FIELD_TOTAL_ROUNDS: u16 = 1;
    pub const FIELD_COUNT: u16 = 2;

    pub fn init_from_table(table: Table<'buf>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> Table<'buf> {
        self.table
    }

    pub fn winner(&self) -> Result<Team, DecodeError> {
        Team::from_code(self.table.get::<u8>(Self::FIELD_WINNER, 0)?)
    }

    pub fn total_rounds(&self) -> Result<i32, DecodeError> {
        self.table.get::<i32>(Self::FIELD_TOTAL_ROUNDS, 0)
    }

    pub fn create<'fbb>(
        builder: &mut Builder<'fbb>,
        args: &MatchFooterArgs,
    ) -> Result<Offset<MatchFooter<'fbb>>, EncodeError> {
        builder.start_table(Self::FIELD_COUNT)?;
        builder.push_slot::<i32>(Self::FIELD_TOTAL_ROUNDS, args.total_rounds, 0)?;
        builder.push_slot::<u8>(Self::FIELD_WINNER, args.winner.code(), 0)?;
        Ok(builder.end_table()?)
    }
}
