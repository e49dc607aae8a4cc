/// Events emitted during a simulation step or a session transition.
/// The presentation layer consumes these for sound and logging.

use crate::domain::grid::Coord;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CollisionKind {
    Wall,
    Body,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    SessionStarted,
    Paused,
    Resumed,
    FoodEaten { at: Coord, score: u32 },
    SpecialSpawned { at: Coord, value: u32 },
    SpecialEaten { at: Coord, value: u32 },
    SpecialExpired { at: Coord },
    Collision { kind: CollisionKind, at: Coord },
    BoardFull,
    SessionEnded { score: u32 },
    NewRecord { score: u32 },
}
