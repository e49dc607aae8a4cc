/// Board: the entity state of one session.
///
/// Everything here is recreated by `Game::start`. Only the step function
/// mutates a board while a session is running; input handlers may write
/// `pending` and nothing else.
///
/// ## Direction latch
///
///   - `direction`: committed; what the last tick moved along.
///   - `pending`:   requested; committed at the start of the next tick.
///
/// A request on the same axis as `direction` is rejected when it is
/// written, so a reversal can never be committed.

use crate::domain::grid::{Coord, Direction, Grid};
use crate::domain::mystery::SpecialItem;
use crate::domain::placement::PlacementPolicy;
use crate::domain::snake::Snake;
use crate::sim::rng::SessionRng;

pub const START_LENGTH: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    GameOver,
}

/// Title + message pair shown over the board on state transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub title: String,
    pub message: String,
}

impl Overlay {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Overlay { title: title.to_string(), message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    pub snake: Snake,
    pub direction: Direction,
    pub pending: Direction,
    pub food: Coord,
    pub special: Option<SpecialItem>,
    pub score: u32,
    /// Current tick interval; shrinks toward the floor as food is eaten.
    pub tick_ms: u32,
    /// `armed[i]`: mystery window `i` already spawned its item.
    pub armed: Vec<bool>,
    pub ticks: u64,
}

impl Board {
    /// Fresh layout: three segments centered on the grid, heading right,
    /// with food placed by the policy.
    pub fn fresh(
        grid: &Grid,
        tick_ms: u32,
        windows: usize,
        placement: &PlacementPolicy,
        rng: &mut SessionRng,
    ) -> Self {
        let snake = Snake::straight(grid.center(), Direction::Right, START_LENGTH);
        // Grids are at least 5 wide, so a 3-cell snake leaves room.
        let food = placement.place_food(grid, &snake, None, rng).unwrap_or(Coord::new(0, 0));
        Board {
            snake,
            direction: Direction::Right,
            pending: Direction::Right,
            food,
            special: None,
            score: 0,
            tick_ms,
            armed: vec![false; windows],
            ticks: 0,
        }
    }

    /// Record a steering request. Returns false if it was rejected for
    /// lying on the committed direction's axis.
    pub fn request(&mut self, dir: Direction) -> bool {
        if dir.same_axis(self.direction) {
            return false;
        }
        self.pending = dir;
        true
    }

    /// Cell the head enters on the next tick.
    pub fn next_head(&self) -> Coord {
        self.snake.head().step(self.pending)
    }
}
