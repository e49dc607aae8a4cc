/// The step function: advances the game by one tick.
///
/// Processing order:
///   1. Commit pending direction
///   2. Compute the new head
///   3. Wall collision   → end session
///   4. Body collision   → end session (current tail excluded)
///   5. Push head
///   6. Special item     → score := value, no growth, new food, done
///   7. Food             → score += per_food, grow, new food, speed up,
///                         evaluate mystery triggers
///   8. Otherwise pop tail
///
/// A fatal collision is not an error: it is the Playing → GameOver
/// transition, and the tick stops there.

use log::debug;

use crate::domain::mystery::{SpecialItem, Trigger};
use super::event::{CollisionKind, GameEvent};
use super::session::Game;
use super::world::Phase;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(game: &mut Game) -> Vec<GameEvent> {
    if game.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    game.board.ticks += 1;

    game.board.direction = game.board.pending;
    let head = game.board.next_head();

    if !game.grid.contains(head) {
        events.push(GameEvent::Collision { kind: CollisionKind::Wall, at: head });
        game.end(&mut events);
        return events;
    }
    if game.board.snake.hits_body(head) {
        events.push(GameEvent::Collision { kind: CollisionKind::Body, at: head });
        game.end(&mut events);
        return events;
    }

    game.board.snake.push_head(head);

    if !resolve_special(game, &mut events) && !resolve_food(game, &mut events) {
        game.board.snake.pop_tail();
    }

    debug_assert!(game.board.snake.is_well_formed(), "malformed body after tick {}", game.board.ticks);
    events
}

// ══════════════════════════════════════════════════════════════
// Consumption
// ══════════════════════════════════════════════════════════════

/// Returns true if the head landed on the special item (tick ends).
fn resolve_special(game: &mut Game, events: &mut Vec<GameEvent>) -> bool {
    if !game.mystery { return false; }
    let item = match game.board.special {
        Some(item) if item.at == game.board.snake.head() => item,
        _ => return false,
    };

    game.board.score = item.value;
    game.board.special = None;
    game.board.snake.pop_tail();
    events.push(GameEvent::SpecialEaten { at: item.at, value: item.value });
    regenerate_food(game, events);
    true
}

/// Returns true if food was eaten (snake grows).
fn resolve_food(game: &mut Game, events: &mut Vec<GameEvent>) -> bool {
    let head = game.board.snake.head();
    if head != game.board.food { return false; }

    game.board.score = game.board.score.saturating_add(game.config.score_per_food);
    events.push(GameEvent::FoodEaten { at: head, score: game.board.score });
    if !regenerate_food(game, events) {
        return true;
    }

    let speed = &game.config.speed;
    game.board.tick_ms = game.board.tick_ms
        .saturating_sub(speed.speedup_step_ms)
        .max(speed.min_tick_ms);

    if game.mystery {
        resolve_mystery(game, events);
    }
    true
}

/// Place new food. A board with no free cell ends the session.
fn regenerate_food(game: &mut Game, events: &mut Vec<GameEvent>) -> bool {
    let avoid = game.board.special.map(|item| item.at);
    let placed = game.config.placement.place_food(&game.grid, &game.board.snake, avoid, &mut game.rng);
    match placed {
        Some(c) => {
            game.board.food = c;
            true
        }
        None => {
            events.push(GameEvent::BoardFull);
            game.end(events);
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Mystery triggers
// ══════════════════════════════════════════════════════════════

/// Runs in the tick that changed the score, so an item whose window was
/// just passed never survives into the next rendered frame.
fn resolve_mystery(game: &mut Game, events: &mut Vec<GameEvent>) {
    let table = &game.config.mystery.table;

    if let Trigger::Expire = table.evaluate(game.board.score, game.board.special.as_ref(), &game.board.armed) {
        if let Some(old) = game.board.special.take() {
            debug!("special item {} expired at score {}", old.value, game.board.score);
            events.push(GameEvent::SpecialExpired { at: old.at });
        }
    }

    if let Trigger::Arm { index, value } = table.evaluate(game.board.score, game.board.special.as_ref(), &game.board.armed) {
        game.board.armed[index] = true;
        let placed = game.config.placement.place_special(
            &game.grid, &game.board.snake, game.board.food, &mut game.rng,
        );
        match placed {
            Some(at) => {
                game.board.special = Some(SpecialItem { at, value, window: index });
                events.push(GameEvent::SpecialSpawned { at, value });
            }
            None => debug!("no free cell for special item {value}"),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::grid::{Coord, Direction};
    use crate::domain::snake::Snake;
    use crate::sim::rng::SessionRng;
    use crate::sim::save::MemoryStore;

    fn playing(seed: u64, mystery: bool) -> Game {
        let mut cfg = GameConfig::default();
        cfg.mystery.enabled = mystery;
        let mut g = Game::new(cfg, Box::new(MemoryStore::new()), SessionRng::new(seed));
        g.start();
        g
    }

    fn cells(g: &Game) -> Vec<Coord> {
        g.board.snake.iter().copied().collect()
    }

    /// Food somewhere the snake will not reach in the next few ticks.
    fn park_food(g: &mut Game) {
        g.board.food = Coord::new(1, 1);
    }

    #[test]
    fn one_tick_translates_the_snake() {
        let mut g = playing(1, false);
        park_food(&mut g);
        let events = step(&mut g);
        assert!(events.is_empty());
        assert_eq!(cells(&g), vec![Coord::new(11, 10), Coord::new(10, 10), Coord::new(9, 10)]);
        assert_eq!(g.board.score, 0);
    }

    #[test]
    fn no_tick_outside_playing() {
        let mut g = playing(1, false);
        g.pause();
        let before = g.board.clone();
        assert!(step(&mut g).is_empty());
        assert_eq!(g.board, before);
    }

    #[test]
    fn right_wall_ends_session() {
        let mut g = playing(2, false);
        g.board.snake = Snake::straight(Coord::new(19, 10), Direction::Right, 3);
        g.board.score = 250;
        park_food(&mut g);
        let events = step(&mut g);
        assert_eq!(g.phase, Phase::GameOver);
        assert_eq!(events[0], GameEvent::Collision { kind: CollisionKind::Wall, at: Coord::new(20, 10) });
        // the body is left where it died
        assert_eq!(g.board.snake.head(), Coord::new(19, 10));
    }

    #[test]
    fn running_into_own_body_ends_session() {
        let mut g = playing(3, false);
        // head (5,5) moving up into a loop: (5,4) is a body segment
        let body = [
            Coord::new(5, 5), Coord::new(6, 5), Coord::new(6, 4),
            Coord::new(5, 4), Coord::new(4, 4), Coord::new(4, 3),
        ];
        g.board.snake = Snake::from_cells(&body).unwrap();
        g.board.direction = Direction::Left;
        g.board.pending = Direction::Up;
        park_food(&mut g);
        let events = step(&mut g);
        assert_eq!(g.phase, Phase::GameOver);
        assert!(matches!(events[0], GameEvent::Collision { kind: CollisionKind::Body, .. }));
    }

    #[test]
    fn chasing_the_tail_is_allowed() {
        let mut g = playing(4, false);
        // 2x2 loop: head moves into the cell the tail vacates
        let body = [Coord::new(5, 5), Coord::new(6, 5), Coord::new(6, 6), Coord::new(5, 6)];
        g.board.snake = Snake::from_cells(&body).unwrap();
        g.board.direction = Direction::Left;
        g.board.pending = Direction::Down;
        park_food(&mut g);
        step(&mut g);
        assert_eq!(g.phase, Phase::Playing);
        assert_eq!(g.board.snake.head(), Coord::new(5, 6));
        assert!(g.board.snake.is_well_formed());
    }

    #[test]
    fn eating_grows_scores_and_speeds_up() {
        let mut g = playing(5, false);
        g.board.food = Coord::new(11, 10);
        let events = step(&mut g);
        assert_eq!(g.board.snake.len(), 4);
        assert_eq!(g.board.score, 10);
        assert_eq!(g.board.tick_ms, 99);
        assert!(!g.board.snake.contains(g.board.food));
        assert_eq!(events[0], GameEvent::FoodEaten { at: Coord::new(11, 10), score: 10 });
    }

    #[test]
    fn huge_food_value_saturates_score() {
        let mut g = playing(11, false);
        g.config.score_per_food = u32::MAX;
        g.board.score = 10;
        g.board.food = Coord::new(11, 10);
        let events = step(&mut g);
        assert_eq!(g.board.score, u32::MAX);
        assert_eq!(g.phase, Phase::Playing);
        assert_eq!(events[0], GameEvent::FoodEaten { at: Coord::new(11, 10), score: u32::MAX });
    }

    #[test]
    fn new_food_stays_off_the_live_item() {
        let dirs = [Direction::Up, Direction::Right];
        let mut g = playing(13, true);
        let item = SpecialItem { at: Coord::new(2, 2), value: 99, window: 3 };
        for i in 0..40 {
            g.board.special = Some(item);
            let ahead = g.board.snake.head().step(g.board.direction);
            if !g.grid.contains(ahead) || ahead == item.at {
                break;
            }
            g.board.food = ahead;
            step(&mut g);
            assert_ne!(g.board.food, item.at);
            g.steer(dirs[i % 2]);
        }
    }

    #[test]
    fn speed_is_clamped_at_the_floor() {
        let mut g = playing(6, false);
        g.board.tick_ms = 50;
        g.board.food = Coord::new(11, 10);
        step(&mut g);
        assert_eq!(g.board.tick_ms, 50);
    }

    #[test]
    fn reversal_within_one_tick_is_impossible() {
        let mut g = playing(7, false);
        park_food(&mut g);
        assert!(!g.steer(Direction::Left));
        assert!(g.steer(Direction::Up));
        assert!(!g.steer(Direction::Left)); // committed is still Right
        step(&mut g);
        assert_eq!(g.phase, Phase::Playing);
        assert_eq!(g.board.snake.head(), Coord::new(10, 9));
        assert_eq!(g.board.direction, Direction::Up);
    }

    #[test]
    fn score_ten_arms_one_item_worth_thirteen() {
        let mut g = playing(8, true);
        g.board.food = Coord::new(11, 10);
        let events = step(&mut g);
        assert_eq!(g.board.score, 10);

        let item = g.board.special.expect("item armed at exactly 10");
        assert_eq!(item.value, 13);
        assert_ne!(item.at, g.board.food);
        assert!(!g.board.snake.contains(item.at));
        let spawned = events.iter()
            .filter(|e| matches!(e, GameEvent::SpecialSpawned { .. }))
            .count();
        assert_eq!(spawned, 1);

        // put the item right in front of the head and eat it
        let before_len = g.board.snake.len();
        let ahead = g.board.snake.head().step(Direction::Right);
        g.board.special = Some(SpecialItem { at: ahead, ..item });
        if g.board.food == ahead {
            g.board.food = Coord::new(1, 1);
        }
        let events = step(&mut g);
        assert_eq!(g.board.score, 13);
        assert_eq!(g.board.snake.len(), before_len);
        assert!(g.board.special.is_none());
        assert!(events.contains(&GameEvent::SpecialEaten { at: ahead, value: 13 }));
        assert!(!g.board.snake.contains(g.board.food));
    }

    #[test]
    fn window_never_rearms_in_the_same_session() {
        let mut g = playing(9, true);
        g.board.food = Coord::new(11, 10);
        step(&mut g);
        assert!(g.board.special.is_some());

        // drop the item and come back to exactly 10 by another route
        g.board.special = None;
        g.board.score = 0;
        let head = g.board.snake.head();
        g.board.food = head.step(Direction::Right);
        step(&mut g);
        assert_eq!(g.board.score, 10);
        assert!(g.board.special.is_none());
    }

    #[test]
    fn mystery_off_spawns_nothing() {
        let mut g = playing(10, false);
        g.board.food = Coord::new(11, 10);
        step(&mut g);
        assert_eq!(g.board.score, 10);
        assert!(g.board.special.is_none());
    }

    #[test]
    fn passed_window_clears_uneaten_item_same_tick() {
        let mut g = playing(12, true);
        g.board.armed = vec![true, true, false, false];
        g.board.score = 60;
        g.board.special = Some(SpecialItem { at: Coord::new(2, 17), value: 66, window: 1 });
        g.board.food = Coord::new(11, 10);
        let events = step(&mut g);

        assert_eq!(g.board.score, 70);
        assert!(events.contains(&GameEvent::SpecialExpired { at: Coord::new(2, 17) }));
        // 70 sits in the next window, which arms in the same tick
        let item = g.board.special.expect("next window armed");
        assert_eq!(item.value, 77);
        assert_eq!(item.window, 2);
    }

    #[test]
    fn random_play_keeps_invariants() {
        let dirs = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];
        for seed in 0..20u64 {
            let mut g = playing(seed, true);
            let mut rng = SessionRng::new(seed ^ 0xABCD);
            for t in 0..400 {
                if g.phase != Phase::Playing {
                    g.start();
                }
                if t % 3 == 0 {
                    use rand::Rng;
                    g.steer(dirs[rng.random_range(0..4)]);
                }
                let len = g.board.snake.len();
                let was_playing = g.phase == Phase::Playing;
                step(&mut g);
                if !was_playing || g.phase != Phase::Playing {
                    continue;
                }
                let now = g.board.snake.len();
                assert!(now == len || now == len + 1, "length jumped {len} -> {now}");
                assert!(g.board.snake.is_well_formed());
                assert!(!g.board.snake.contains(g.board.food));
                if let Some(item) = g.board.special {
                    assert_ne!(item.at, g.board.food);
                    assert!(!g.board.snake.contains(item.at));
                }
            }
        }
    }
}
