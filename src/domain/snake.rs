/// Snake body: ordered cells, head first.
///
/// The body is never empty. Between ticks consecutive segments are
/// grid-adjacent and no cell repeats; during a tick the head is pushed
/// before the tail is popped, so one overlap can exist momentarily.

use std::collections::VecDeque;

use super::grid::{Coord, Direction};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snake {
    body: VecDeque<Coord>,
}

impl Snake {
    /// Straight line of `len` cells starting at `head`, trailing away
    /// from `facing`.
    pub fn straight(head: Coord, facing: Direction, len: usize) -> Self {
        let back = facing.opposite();
        let mut body = VecDeque::with_capacity(len.max(1) + 8);
        let mut c = head;
        body.push_back(c);
        for _ in 1..len.max(1) {
            c = c.step(back);
            body.push_back(c);
        }
        Snake { body }
    }

    /// Build from explicit segments (head first). Returns None if empty.
    #[cfg(test)]
    pub fn from_cells(cells: &[Coord]) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }
        Some(Snake { body: cells.iter().copied().collect() })
    }

    #[inline]
    pub fn head(&self) -> Coord {
        self.body[0]
    }

    #[inline]
    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.body.contains(&c)
    }

    /// Does `c` hit the body, ignoring the tail cell (which moves away
    /// this tick unless the snake grows)?
    pub fn hits_body(&self, c: Coord) -> bool {
        c != self.tail() && self.contains(c)
    }

    pub fn push_head(&mut self, c: Coord) {
        self.body.push_front(c);
    }

    /// Drop the last segment. A single-segment snake keeps its head.
    pub fn pop_tail(&mut self) -> Option<Coord> {
        if self.body.len() > 1 {
            self.body.pop_back()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.body.iter()
    }

    /// Every adjacent pair is one step apart and no cell repeats.
    pub fn is_well_formed(&self) -> bool {
        let adjacent = self.body.iter()
            .zip(self.body.iter().skip(1))
            .all(|(a, b)| a.manhattan(*b) == 1);
        let mut seen: Vec<Coord> = self.body.iter().copied().collect();
        seen.sort_by_key(|c| (c.y, c.x));
        seen.dedup();
        adjacent && seen.len() == self.body.len()
    }
}
