pub mod grid;
pub mod mystery;
pub mod placement;
pub mod snake;
