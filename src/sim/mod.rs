pub mod driver;
pub mod event;
pub mod rng;
pub mod save;
pub mod session;
pub mod step;
pub mod world;
