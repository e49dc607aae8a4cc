/// Grid model: coordinates, directions and the square play field.
///
/// Coordinates are signed so a candidate head can be computed one step
/// outside the field before the wall check rejects it.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// One step in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Coord {
        let (dx, dy) = dir.delta();
        Coord { x: self.x + dx, y: self.y + dy }
    }

    /// Manhattan distance; 1 means grid-adjacent.
    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector (dx, dy). Screen convention: y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up    => (0, -1),
            Direction::Down  => (0, 1),
            Direction::Left  => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up    => Direction::Down,
            Direction::Down  => Direction::Up,
            Direction::Left  => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Both directions lie on the same axis (equal or opposite).
    pub fn same_axis(self, other: Direction) -> bool {
        self.is_horizontal() == other.is_horizontal()
    }
}

/// Square N×N play field. Every cell in `[0, size)` on both axes is
/// playable; leaving that range is a wall hit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Grid {
    pub size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        Grid { size }
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.x >= 0 && c.x < self.size && c.y >= 0 && c.y < self.size
    }

    /// Distance to the nearest edge (0 on the outermost ring).
    pub fn edge_distance(&self, c: Coord) -> i32 {
        let dx = c.x.min(self.size - 1 - c.x);
        let dy = c.y.min(self.size - 1 - c.y);
        dx.min(dy)
    }

    pub fn center(&self) -> Coord {
        Coord::new(self.size / 2, self.size / 2)
    }

    /// Row-major iterator over every cell.
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        let n = self.size;
        (0..n).flat_map(move |y| (0..n).map(move |x| Coord::new(x, y)))
    }
}
