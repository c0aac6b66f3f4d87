//! The closed set of agent kinds.
//!
//! Kinds decide how far an agent moves per tick, how close another agent
//! must be before it picks a fight, and which fights it wins. The per-kind
//! numbers live in configuration; the win rules live in
//! `skirmish-agents::rules`. Adding a variant here makes every exhaustive
//! match over [`Kind`] fail to compile until the new kind is handled.

use serde::{Deserialize, Serialize};

/// The category of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Fast, long-legged, mid-range aggression.
    Dragon,
    /// Slow, but picks fights from far away.
    Elf,
    /// Wanders at a medium pace, only engages at close quarters.
    KnightErrant,
}

impl Kind {
    /// Every kind, in roster-code order.
    pub const ALL: [Self; 3] = [Self::Dragon, Self::Elf, Self::KnightErrant];

    /// Numeric code used by the roster file format.
    pub const fn code(self) -> u8 {
        match self {
            Self::Dragon => 1,
            Self::Elf => 2,
            Self::KnightErrant => 3,
        }
    }

    /// Parse a roster code back into a kind.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Dragon),
            2 => Some(Self::Elf),
            3 => Some(Self::KnightErrant),
            _ => None,
        }
    }

    /// Single-letter glyph used by the grid renderer.
    pub const fn glyph(self) -> char {
        match self {
            Self::Dragon => 'D',
            Self::Elf => 'E',
            Self::KnightErrant => 'K',
        }
    }
}

impl core::fmt::Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Dragon => "dragon",
            Self::Elf => "elf",
            Self::KnightErrant => "knight_errant",
        };
        f.write_str(name)
    }
}
