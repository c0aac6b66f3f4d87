//! Movement policies for the detection loop's move phase.
//!
//! A policy only proposes a step for a kind; clamping to the field happens
//! in [`Agent::move_by`](skirmish_agents::Agent::move_by).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skirmish_types::{Displacement, Kind};

use crate::config::KindsConfig;

/// Supplies the displacement an agent of a given kind takes this tick.
pub trait MovementPolicy: Send {
    /// Propose a step for an agent of `kind`.
    fn displacement_for(&mut self, kind: Kind) -> Displacement;
}

/// Random walk: each axis moves uniformly within `[-d, d]`, where `d` is the
/// kind's configured move distance.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: StdRng,
    kinds: KindsConfig,
}

impl RandomWalk {
    /// Create a seeded random walk over the given kind table.
    pub fn new(seed: u64, kinds: KindsConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            kinds,
        }
    }
}

impl MovementPolicy for RandomWalk {
    fn displacement_for(&mut self, kind: Kind) -> Displacement {
        let reach = i32::try_from(self.kinds.move_distance(kind)).unwrap_or(i32::MAX);
        let low = 0_i32.saturating_sub(reach);
        Displacement::new(
            self.rng.random_range(low..=reach),
            self.rng.random_range(low..=reach),
        )
    }
}

/// A constant step per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedStep {
    dragon: Displacement,
    elf: Displacement,
    knight_errant: Displacement,
}

impl FixedStep {
    /// Fixed steps for each kind.
    pub const fn new(dragon: Displacement, elf: Displacement, knight_errant: Displacement) -> Self {
        Self {
            dragon,
            elf,
            knight_errant,
        }
    }

    /// The same step for every kind.
    pub const fn uniform(step: Displacement) -> Self {
        Self::new(step, step, step)
    }

    /// Nobody moves.
    pub const fn still() -> Self {
        Self::uniform(Displacement::new(0, 0))
    }
}

impl MovementPolicy for FixedStep {
    fn displacement_for(&mut self, kind: Kind) -> Displacement {
        match kind {
            Kind::Dragon => self.dragon,
            Kind::Elf => self.elf,
            Kind::KnightErrant => self.knight_errant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_walk_stays_within_reach() {
        let kinds = KindsConfig::default();
        let mut walk = RandomWalk::new(7, kinds);
        for _ in 0..500 {
            for kind in Kind::ALL {
                let step = walk.displacement_for(kind);
                let reach = kinds.move_distance(kind);
                assert!(step.dx.unsigned_abs() <= reach);
                assert!(step.dy.unsigned_abs() <= reach);
            }
        }
    }

    #[test]
    fn random_walk_is_seeded() {
        let kinds = KindsConfig::default();
        let mut a = RandomWalk::new(99, kinds);
        let mut b = RandomWalk::new(99, kinds);
        for _ in 0..20 {
            assert_eq!(a.displacement_for(Kind::Dragon), b.displacement_for(Kind::Dragon));
        }
    }

    #[test]
    fn fixed_step_per_kind() {
        let mut steps = FixedStep::new(
            Displacement::new(1, 1),
            Displacement::new(2, 2),
            Displacement::new(3, 3),
        );
        assert_eq!(steps.displacement_for(Kind::Dragon), Displacement::new(1, 1));
        assert_eq!(steps.displacement_for(Kind::Elf), Displacement::new(2, 2));
        assert_eq!(steps.displacement_for(Kind::KnightErrant), Displacement::new(3, 3));
        assert_eq!(FixedStep::still().displacement_for(Kind::Elf), Displacement::default());
    }
}
