/// Mystery-mode trigger table.
///
/// Each window `[start, end)` arms at most one special item per session.
/// Eating the item overwrites the score with its value. An uneaten item
/// is retired as soon as the score moves past the end of its window.

use super::grid::Coord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MysteryWindow {
    pub start: u32,
    pub end: u32,
    pub value: u32,
}

impl MysteryWindow {
    pub const fn new(start: u32, end: u32, value: u32) -> Self {
        MysteryWindow { start, end, value }
    }

    #[inline]
    pub fn contains(&self, score: u32) -> bool {
        score >= self.start && score < self.end
    }

    /// Score has moved beyond this window.
    #[inline]
    pub fn is_past(&self, score: u32) -> bool {
        score >= self.end
    }
}

/// The active special item. `window` indexes the table entry that armed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialItem {
    pub at: Coord,
    pub value: u32,
    pub window: usize,
}

/// What the table wants done after a score change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Nothing to do.
    Idle,
    /// Active item's window has been passed; remove it.
    Expire,
    /// Spawn an item for window `index` with `value`.
    Arm { index: usize, value: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MysteryTable {
    windows: Vec<MysteryWindow>,
}

impl Default for MysteryTable {
    fn default() -> Self {
        MysteryTable::new(vec![
            MysteryWindow::new(10, 11, 13),
            MysteryWindow::new(50, 70, 66),
            MysteryWindow::new(70, 79, 77),
            MysteryWindow::new(79, 100, 99),
        ])
    }
}

impl MysteryTable {
    /// Empty windows (`start >= end`) are dropped.
    pub fn new(mut windows: Vec<MysteryWindow>) -> Self {
        windows.retain(|w| w.start < w.end);
        MysteryTable { windows }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn windows(&self) -> &[MysteryWindow] {
        &self.windows
    }

    /// Decide the next action for `score`.
    ///
    /// `active` is the item currently on the board, `armed[i]` records that
    /// window `i` already spawned this session. Expiry takes precedence so a
    /// stale item is removed before a new one may be considered on a later
    /// evaluation.
    pub fn evaluate(&self, score: u32, active: Option<&SpecialItem>, armed: &[bool]) -> Trigger {
        if let Some(item) = active {
            let past = self.windows.get(item.window).map_or(true, |w| w.is_past(score));
            return if past { Trigger::Expire } else { Trigger::Idle };
        }
        self.windows.iter()
            .enumerate()
            .find(|(i, w)| w.contains(score) && !armed.get(*i).copied().unwrap_or(false))
            .map_or(Trigger::Idle, |(index, w)| Trigger::Arm { index, value: w.value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(window: usize, value: u32) -> SpecialItem {
        SpecialItem { at: Coord::new(3, 3), value, window }
    }

    #[test]
    fn exactly_ten_arms_thirteen() {
        let t = MysteryTable::default();
        let armed = vec![false; t.len()];
        assert_eq!(t.evaluate(10, None, &armed), Trigger::Arm { index: 0, value: 13 });
        assert_eq!(t.evaluate(20, None, &armed), Trigger::Idle);
        assert_eq!(t.evaluate(0, None, &armed), Trigger::Idle);
    }

    #[test]
    fn window_arms_once() {
        let t = MysteryTable::default();
        let mut armed = vec![false; t.len()];
        armed[0] = true;
        assert_eq!(t.evaluate(10, None, &armed), Trigger::Idle);
    }

    #[test]
    fn active_item_blocks_new_window() {
        let t = MysteryTable::default();
        let armed = vec![false; t.len()];
        let active = item(1, 66);
        // 60 is still inside [50,70): keep it, no second spawn
        assert_eq!(t.evaluate(60, Some(&active), &armed), Trigger::Idle);
    }

    #[test]
    fn item_expires_once_window_is_passed() {
        let t = MysteryTable::default();
        let armed = vec![true, true, false, false];
        let active = item(1, 66);
        assert_eq!(t.evaluate(70, Some(&active), &armed), Trigger::Expire);
        // after expiry the next window is free to arm
        assert_eq!(t.evaluate(70, None, &armed), Trigger::Arm { index: 2, value: 77 });
    }

    #[test]
    fn degenerate_windows_are_dropped() {
        let t = MysteryTable::new(vec![
            MysteryWindow::new(5, 5, 1),
            MysteryWindow::new(30, 40, 35),
        ]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.evaluate(30, None, &[false]), Trigger::Arm { index: 0, value: 35 });
    }
}
