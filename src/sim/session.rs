/// Session state machine.
///
///   Idle ──start──▶ Playing ◀──resume── Paused
///                    │  └──────pause──────▶┘
///                    └──end (collision)──▶ GameOver ──start──▶ Playing
///
/// `Game` owns the phase, the board and the high score. Commands arriving
/// in the wrong phase are ignored. The step function is the only code
/// that calls `end`.

use log::{debug, info};

use crate::config::GameConfig;
use crate::domain::grid::{Coord, Direction, Grid};
use crate::domain::mystery::SpecialItem;
use crate::domain::snake::Snake;
use crate::sim::event::GameEvent;
use crate::sim::rng::SessionRng;
use crate::sim::save::HighScoreStore;
use crate::sim::world::{Board, Overlay, Phase};

/// Discrete input events, already decoded from the device.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Steer(Direction),
    TogglePause,
    ToggleMystery,
}

/// Read-only snapshot handed to the renderer once per frame.
pub struct FrameView<'a> {
    pub grid: Grid,
    pub snake: &'a Snake,
    pub food: Coord,
    pub special: Option<&'a SpecialItem>,
    pub score: u32,
    pub high_score: u32,
    pub phase: Phase,
    pub overlay: Option<&'a Overlay>,
    pub mystery: bool,
    pub tick_ms: u32,
}

pub struct Game {
    pub config: GameConfig,
    pub grid: Grid,
    pub phase: Phase,
    pub board: Board,
    pub high_score: u32,
    pub mystery: bool,
    pub overlay: Option<Overlay>,
    pub(crate) rng: SessionRng,
    store: Box<dyn HighScoreStore>,
}

impl Game {
    /// New game in the Idle phase. The high score is read once, here.
    pub fn new(config: GameConfig, store: Box<dyn HighScoreStore>, mut rng: SessionRng) -> Self {
        let grid = Grid::new(config.grid_size);
        let board = Board::fresh(
            &grid,
            config.speed.base_tick_ms(),
            config.mystery.table.len(),
            &config.placement,
            &mut rng,
        );
        let high_score = store.load();
        let mystery = config.mystery.enabled;
        Game {
            config,
            grid,
            phase: Phase::Idle,
            board,
            high_score,
            mystery,
            overlay: Some(Overlay::new("SNAKE", "Press Space to start")),
            rng,
            store,
        }
    }

    /// Current tick interval in milliseconds.
    pub fn tick_ms(&self) -> u32 {
        self.board.tick_ms
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            grid: self.grid,
            snake: &self.board.snake,
            food: self.board.food,
            special: self.board.special.as_ref(),
            score: self.board.score,
            high_score: self.high_score,
            phase: self.phase,
            overlay: self.overlay.as_ref(),
            mystery: self.mystery,
            tick_ms: self.board.tick_ms,
        }
    }

    // ── Transitions ──

    /// Idle/GameOver → Playing with a freshly laid out board.
    pub fn start(&mut self) -> Option<GameEvent> {
        match self.phase {
            Phase::Idle | Phase::GameOver => {}
            Phase::Playing | Phase::Paused => return None,
        }
        self.board = Board::fresh(
            &self.grid,
            self.config.speed.base_tick_ms(),
            self.config.mystery.table.len(),
            &self.config.placement,
            &mut self.rng,
        );
        self.phase = Phase::Playing;
        self.overlay = None;
        info!(
            "session started (grid {}, tick {} ms, mystery {})",
            self.grid.size, self.board.tick_ms, if self.mystery { "on" } else { "off" },
        );
        Some(GameEvent::SessionStarted)
    }

    pub fn pause(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Playing {
            return None;
        }
        self.phase = Phase::Paused;
        self.overlay = Some(Overlay::new("PAUSED", "Press Space to continue"));
        Some(GameEvent::Paused)
    }

    pub fn resume(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Paused {
            return None;
        }
        self.phase = Phase::Playing;
        self.overlay = None;
        Some(GameEvent::Resumed)
    }

    /// Playing → GameOver. Persists the score if it beats the record.
    pub(crate) fn end(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase != Phase::Playing {
            return;
        }
        self.phase = Phase::GameOver;
        let score = self.board.score;
        events.push(GameEvent::SessionEnded { score });

        if score > self.high_score {
            self.high_score = score;
            self.store.save(score);
            info!("session ended with new record {score} (length {}, {} ticks)", self.board.snake.len(), self.board.ticks);
            self.overlay = Some(Overlay::new("GAME OVER", format!("New record: {score}!")));
            events.push(GameEvent::NewRecord { score });
        } else {
            info!(
                "session ended with score {score} (best {}, length {}, {} ticks)",
                self.high_score, self.board.snake.len(), self.board.ticks,
            );
            self.overlay = Some(Overlay::new("GAME OVER", format!("Score: {score}")));
        }
    }

    // ── Input ──

    /// Space: start/restart, pause or resume depending on the phase.
    pub fn toggle_pause(&mut self) -> Option<GameEvent> {
        match self.phase {
            Phase::Idle | Phase::GameOver => self.start(),
            Phase::Playing => self.pause(),
            Phase::Paused => self.resume(),
        }
    }

    /// Only honored while playing; writes the pending direction only.
    pub fn steer(&mut self, dir: Direction) -> bool {
        if self.phase != Phase::Playing {
            debug!("steer {:?} ignored in {:?}", dir, self.phase);
            return false;
        }
        self.board.request(dir)
    }

    /// Mystery rules are fixed for a session's lifetime, so the toggle is
    /// only honored between sessions.
    pub fn toggle_mystery(&mut self) -> bool {
        match self.phase {
            Phase::Idle | Phase::GameOver => {
                self.mystery = !self.mystery;
                info!("mystery mode {}", if self.mystery { "on" } else { "off" });
                true
            }
            Phase::Playing | Phase::Paused => {
                debug!("mystery toggle ignored in {:?}", self.phase);
                false
            }
        }
    }

    pub fn handle(&mut self, cmd: Command) -> Option<GameEvent> {
        match cmd {
            Command::Steer(dir) => {
                self.steer(dir);
                None
            }
            Command::TogglePause => self.toggle_pause(),
            Command::ToggleMystery => {
                self.toggle_mystery();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::save::MemoryStore;
    use crate::sim::step::step;

    fn game_with(store: MemoryStore) -> Game {
        Game::new(GameConfig::default(), Box::new(store), SessionRng::new(11))
    }

    fn game() -> Game {
        game_with(MemoryStore::new())
    }

    #[test]
    fn starts_idle_with_overlay() {
        let g = game();
        assert_eq!(g.phase, Phase::Idle);
        assert_eq!(g.overlay.as_ref().map(|o| o.title.as_str()), Some("SNAKE"));
        assert_eq!(g.board.snake.len(), 3);
    }

    #[test]
    fn toggle_pause_walks_the_state_machine() {
        let mut g = game();
        assert_eq!(g.toggle_pause(), Some(GameEvent::SessionStarted));
        assert_eq!(g.phase, Phase::Playing);
        assert!(g.overlay.is_none());

        assert_eq!(g.toggle_pause(), Some(GameEvent::Paused));
        assert_eq!(g.phase, Phase::Paused);
        assert_eq!(g.overlay.as_ref().unwrap().title, "PAUSED");

        assert_eq!(g.toggle_pause(), Some(GameEvent::Resumed));
        assert_eq!(g.phase, Phase::Playing);
    }

    #[test]
    fn illegal_transitions_are_ignored() {
        let mut g = game();
        assert_eq!(g.pause(), None);
        assert_eq!(g.resume(), None);
        g.start();
        assert_eq!(g.start(), None);
        assert_eq!(g.resume(), None);
        assert_eq!(g.phase, Phase::Playing);
    }

    #[test]
    fn pause_then_resume_leaves_board_untouched() {
        let mut g = game();
        g.start();
        g.steer(Direction::Up);
        let before = g.board.clone();
        g.pause();
        g.resume();
        assert_eq!(g.board, before);
    }

    #[test]
    fn steering_only_while_playing() {
        let mut g = game();
        assert!(!g.steer(Direction::Up));
        g.start();
        g.pause();
        assert!(!g.steer(Direction::Up));
        assert_eq!(g.board.pending, Direction::Right);
        g.resume();
        assert!(g.steer(Direction::Up));
    }

    #[test]
    fn mystery_toggle_only_between_sessions() {
        let mut g = game();
        assert!(g.toggle_mystery());
        assert!(g.mystery);
        g.start();
        assert!(!g.toggle_mystery());
        assert!(g.mystery);
    }

    #[test]
    fn start_resets_session_state() {
        let mut g = game();
        g.start();
        g.board.score = 70;
        g.board.tick_ms = 60;
        g.board.armed[0] = true;
        let mut events = vec![];
        g.end(&mut events);
        assert_eq!(g.phase, Phase::GameOver);

        g.start();
        assert_eq!(g.board.score, 0);
        assert_eq!(g.board.tick_ms, 100);
        assert_eq!(g.board.direction, Direction::Right);
        assert!(g.board.armed.iter().all(|a| !a));
        assert!(g.board.special.is_none());
        let cells: Vec<Coord> = g.board.snake.iter().copied().collect();
        assert_eq!(cells, vec![Coord::new(10, 10), Coord::new(9, 10), Coord::new(8, 10)]);
    }

    #[test]
    fn lower_score_keeps_record() {
        let store = MemoryStore::with_value(120);
        let mut g = game_with(store.clone());
        assert_eq!(g.high_score, 120);
        g.start();
        g.board.score = 45;
        let mut events = vec![];
        g.end(&mut events);

        assert_eq!(store.load(), 120);
        assert_eq!(g.high_score, 120);
        assert_eq!(events, vec![GameEvent::SessionEnded { score: 45 }]);
        let overlay = g.overlay.as_ref().unwrap();
        assert_eq!(overlay.message, "Score: 45");
        assert!(!overlay.message.contains("record"));
    }

    #[test]
    fn new_record_is_saved_and_announced() {
        let store = MemoryStore::with_value(30);
        let mut g = game_with(store.clone());
        g.start();
        g.board.score = 40;
        let mut events = vec![];
        g.end(&mut events);

        assert_eq!(store.load(), 40);
        assert!(events.contains(&GameEvent::NewRecord { score: 40 }));
        assert_eq!(g.overlay.as_ref().unwrap().message, "New record: 40!");

        // a fresh game sharing the store sees the record
        let again = game_with(store);
        assert_eq!(again.high_score, 40);
    }

    #[test]
    fn space_restarts_after_game_over() {
        let mut g = game();
        g.start();
        // drive into the right wall
        for _ in 0..20 {
            step(&mut g);
        }
        assert_eq!(g.phase, Phase::GameOver);
        assert_eq!(g.handle(Command::TogglePause), Some(GameEvent::SessionStarted));
        assert_eq!(g.phase, Phase::Playing);
    }
}
