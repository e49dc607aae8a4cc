/// Food / special-item placement policy.
///
/// Spawn points are biased toward the interior of the field. Each axis is
/// drawn independently from three tiers:
///
///   ┌──────┬──────────────────────┬───────────────────────────────┐
///   │ Tier │ Probability          │ Edge distance                 │
///   ├──────┼──────────────────────┼───────────────────────────────┤
///   │ A    │ safe_zone_chance     │ >= safe_inset (safe zone)     │
///   │ B    │ near_edge_chance     │ 2 .. safe_inset               │
///   │ C    │ remainder            │ exactly 1 (outer non-wall)    │
///   └──────┴──────────────────────┴───────────────────────────────┘
///
/// Distance 0 (the wall ring) is never produced by the tiered draw.
/// Searches are bounded; when they run out a deterministic scan of the
/// free cells guarantees termination on a crowded board.

use log::debug;
use rand::Rng;

use super::grid::{Coord, Grid};
use super::snake::Snake;

#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPolicy {
    pub safe_inset: i32,
    pub safe_zone_chance: f64,
    pub near_edge_chance: f64,
    pub max_attempts: u32,
    pub fallback_inset: i32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy {
            safe_inset: 3,
            safe_zone_chance: 0.85,
            near_edge_chance: 0.12,
            max_attempts: 100,
            fallback_inset: 2,
        }
    }
}

impl PlacementPolicy {
    /// Probability of the outer non-wall ring tier.
    pub fn outer_ring_chance(&self) -> f64 {
        (1.0 - self.safe_zone_chance - self.near_edge_chance).max(0.0)
    }

    /// Draw one axis value in `[0, size)` using the tiered policy.
    pub fn sample_axis<R: Rng>(&self, size: i32, rng: &mut R) -> i32 {
        let d_max = (size - 1) / 2;
        if d_max <= 0 {
            // 1- and 2-wide fields have no interior at all.
            return rng.random_range(0..size.max(1));
        }
        let k = self.safe_inset.clamp(1, d_max);
        let roll: f64 = rng.random();

        let distance = if roll < self.safe_zone_chance {
            None
        } else if roll < self.safe_zone_chance + self.near_edge_chance && k > 2 {
            Some(rng.random_range(2..k))
        } else if roll < self.safe_zone_chance + self.near_edge_chance {
            None
        } else {
            Some(1)
        };

        match distance {
            None => rng.random_range(k..size - k),
            Some(d) => {
                if rng.random_bool(0.5) { d } else { size - 1 - d }
            }
        }
    }

    /// Tiered draw on both axes.
    pub fn sample<R: Rng>(&self, grid: &Grid, rng: &mut R) -> Coord {
        Coord::new(self.sample_axis(grid.size, rng), self.sample_axis(grid.size, rng))
    }

    /// Pick a food cell disjoint from the snake and from `avoid` (the live
    /// special item, if any). Returns None only when no such cell exists.
    ///
    /// Fallback order: free cells at least `fallback_inset` from the edge,
    /// then any non-wall-ring cell, then any free cell.
    pub fn place_food<R: Rng>(
        &self,
        grid: &Grid,
        snake: &Snake,
        avoid: Option<Coord>,
        rng: &mut R,
    ) -> Option<Coord> {
        let blocked = |c: Coord| Some(c) == avoid || snake.contains(c);
        for _ in 0..self.max_attempts {
            let c = self.sample(grid, rng);
            if !blocked(c) {
                return Some(c);
            }
        }
        debug!("food placement exhausted {} attempts, scanning free cells", self.max_attempts);

        let free: Vec<Coord> = grid.cells().filter(|c| !blocked(*c)).collect();
        let inset = self.fallback_inset.max(1);
        pick_from(rng, free.iter().copied().filter(|c| grid.edge_distance(*c) >= inset))
            .or_else(|| pick_from(rng, free.iter().copied().filter(|c| grid.edge_distance(*c) >= 1)))
            .or_else(|| pick_from(rng, free.iter().copied()))
    }

    /// Pick a special-item cell disjoint from the snake and the food.
    /// Falls back to any free cell, without tier bias.
    pub fn place_special<R: Rng>(
        &self,
        grid: &Grid,
        snake: &Snake,
        food: Coord,
        rng: &mut R,
    ) -> Option<Coord> {
        let blocked = |c: Coord| c == food || snake.contains(c);
        for _ in 0..self.max_attempts {
            let c = self.sample(grid, rng);
            if !blocked(c) {
                return Some(c);
            }
        }
        debug!("special placement exhausted {} attempts, scanning free cells", self.max_attempts);
        pick_from(rng, grid.cells().filter(|c| !blocked(*c)))
    }
}

fn pick_from<R: Rng>(rng: &mut R, cells: impl Iterator<Item = Coord>) -> Option<Coord> {
    let pool: Vec<Coord> = cells.collect();
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.random_range(0..pool.len())])
    }
}
