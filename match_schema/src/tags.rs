//! Closed one-byte enumerations.
//!
//! Each enumeration owns its own code space: a raw byte only means something
//! once the declared type of the field holding it is known. Codes outside the
//! defined range are rejected rather than mapped to a default, because they
//! change how neighbouring fields would be read.

use std::fmt;

use match_wire::DecodeError;
use serde::{Deserialize, Serialize};

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant = $code,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
            pub const NAMES: &'static [&'static str] = &[$($text,)+];

            pub fn code(self) -> u8 {
                self as u8
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn from_code(code: u8) -> Result<Self, DecodeError> {
                match code {
                    $($code => Ok($name::$variant),)+
                    _ => Err(DecodeError::UnknownVariant {
                        enumeration: $label,
                        value: code,
                    }),
                }
            }
        }

        /// Code 0, which is also what an absent field decodes to.
        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl TryFrom<u8> for $name {
            type Error = DecodeError;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                Self::from_code(code)
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

closed_enum! {
    /// The kinds of things that can exist on the map.
    pub enum BodyType ("body type") {
        /// Mobile headquarters that hires gardeners.
        Archon = 0 => "ARCHON",
        /// Plants and waters bullet trees, builds other robots.
        Gardener = 1 => "GARDENER",
        /// Melee unit for felling trees.
        Lumberjack = 2 => "LUMBERJACK",
        Recruit = 3 => "RECRUIT",
        Soldier = 4 => "SOLDIER",
        /// Large, slow, powerful bullets.
        Tank = 5 => "TANK",
        /// Fast, moves without obstruction.
        Scout = 6 => "SCOUT",
        /// Moves in a straight line; position updates are never sent, it is
        /// at `loc + dt * vel` after `dt`.
        Bullet = 7 => "BULLET",
        /// Unowned tree that may contain objects.
        TreeNeutral = 8 => "TREE_NEUTRAL",
        /// Team-owned tree that produces bullets.
        TreeBullet = 9 => "TREE_BULLET",
    }
}

closed_enum! {
    /// Actions performed during a round. Purely presentational: the engine has
    /// already applied their effects.
    pub enum Action ("action") {
        Fire = 0 => "FIRE",
        FireTriad = 1 => "FIRE_TRIAD",
        FirePentad = 2 => "FIRE_PENTAD",
        Chop = 3 => "CHOP",
        ShakeTree = 4 => "SHAKE_TREE",
        PlantTree = 5 => "PLANT_TREE",
        WaterTree = 6 => "WATER_TREE",
        SpawnUnit = 7 => "SPAWN_UNIT",
        DieException = 8 => "DIE_EXCEPTION",
        DieSuicide = 9 => "DIE_SUICIDE",
    }
}

closed_enum! {
    pub enum Team ("team") {
        Neutral = 0 => "NEUTRAL",
        A = 1 => "A",
        B = 2 => "B",
    }
}

/// How many body ids an action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetShape {
    /// No targets.
    None,
    /// Exactly one target.
    One,
    /// One or more targets.
    Many,
}

impl TargetShape {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            TargetShape::None => count == 0,
            TargetShape::One => count == 1,
            TargetShape::Many => count >= 1,
        }
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetShape::None => "no",
            TargetShape::One => "exactly one",
            TargetShape::Many => "one or more",
        })
    }
}

impl Action {
    pub fn target_shape(self) -> TargetShape {
        match self {
            // spawned bullet
            Action::Fire => TargetShape::One,
            // spawned bullets
            Action::FireTriad | Action::FirePentad => TargetShape::Many,
            Action::Chop => TargetShape::None,
            // tree
            Action::ShakeTree | Action::PlantTree | Action::WaterTree => TargetShape::One,
            // spawned unit
            Action::SpawnUnit => TargetShape::One,
            Action::DieException | Action::DieSuicide => TargetShape::None,
        }
    }
}

impl BodyType {
    pub fn is_tree(self) -> bool {
        matches!(self, BodyType::TreeNeutral | BodyType::TreeBullet)
    }

    pub fn is_robot(self) -> bool {
        !self.is_tree() && self != BodyType::Bullet
    }
}

pub fn body_type_name(code: u8) -> Result<&'static str, DecodeError> {
    BodyType::from_code(code).map(BodyType::name)
}

pub fn action_name(code: u8) -> Result<&'static str, DecodeError> {
    Action::from_code(code).map(Action::name)
}

pub fn team_name(code: u8) -> Result<&'static str, DecodeError> {
    Team::from_code(code).map(Team::name)
}
