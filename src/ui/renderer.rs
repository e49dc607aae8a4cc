/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout (each board cell is two terminal columns):
///
///   row 0      HUD: score, best, speed, mystery flag
///   row 2..    bordered board, overlay centered on top of it
///   below      help line
///
/// The renderer only reads a `FrameView`; it never touches game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::Theme;
use crate::domain::grid::Coord;
use crate::sim::session::FrameView;
use crate::sim::world::Phase;

// ── Palette ──

#[derive(Clone, Copy, Debug)]
struct Palette {
    bg: Color,
    board: Color,
    border: Color,
    text: Color,
    dim: Color,
    hud_bg: Color,
    head: Color,
    body: Color,
    food: Color,
    special: Color,
    overlay_bg: Color,
    title: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                bg: Color::Rgb { r: 22, g: 22, b: 35 },
                board: Color::Rgb { r: 30, g: 30, b: 46 },
                border: Color::Rgb { r: 90, g: 90, b: 130 },
                text: Color::White,
                dim: Color::DarkGrey,
                hud_bg: Color::Rgb { r: 20, g: 20, b: 60 },
                head: Color::Rgb { r: 120, g: 255, b: 120 },
                body: Color::Rgb { r: 40, g: 180, b: 60 },
                food: Color::Rgb { r: 255, g: 80, b: 80 },
                special: Color::Rgb { r: 255, g: 220, b: 50 },
                overlay_bg: Color::Rgb { r: 40, g: 40, b: 40 },
                title: Color::Rgb { r: 255, g: 220, b: 50 },
            },
            Theme::Light => Palette {
                bg: Color::Rgb { r: 235, g: 235, b: 225 },
                board: Color::Rgb { r: 250, g: 250, b: 242 },
                border: Color::Rgb { r: 120, g: 120, b: 110 },
                text: Color::Black,
                dim: Color::Rgb { r: 110, g: 110, b: 110 },
                hud_bg: Color::Rgb { r: 200, g: 210, b: 230 },
                head: Color::Rgb { r: 0, g: 110, b: 30 },
                body: Color::Rgb { r: 40, g: 150, b: 60 },
                food: Color::Rgb { r: 200, g: 30, b: 30 },
                special: Color::Rgb { r: 170, g: 110, b: 0 },
                overlay_bg: Color::Rgb { r: 215, g: 215, b: 205 },
                title: Color::Rgb { r: 140, g: 60, b: 0 },
            },
        }
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }

    fn blank(bg: Color) -> Self {
        Cell { ch: ' ', fg: Color::White, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::INVALID; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::INVALID; w * h];
        }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::INVALID
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Renderer ──

/// Each board cell = 2 terminal columns, which keeps cells roughly square.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    theme: Theme,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            theme,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch palettes; the next frame repaints everything.
    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.back.fill(Cell::INVALID);
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let bg = Palette::for_theme(self.theme).bg;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(bg),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &FrameView) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.fill(Cell::INVALID);
            let bg = Palette::for_theme(self.theme).bg;
            queue!(self.writer, SetBackgroundColor(bg), Clear(ClearType::All))?;
        }

        compose(&mut self.front, view, &Palette::for_theme(self.theme));
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_colors: Option<(Color, Color)> = None;
        let mut cursor_at: Option<(usize, usize)> = None;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if last_colors != Some((cell.fg, cell.bg)) {
                    queue!(self.writer, SetForegroundColor(cell.fg), SetBackgroundColor(cell.bg))?;
                    last_colors = Some((cell.fg, cell.bg));
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ════════════════════════════════════════════════════════════
//  Compose: build front buffer content
// ════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, view: &FrameView, pal: &Palette) {
    buf.fill(Cell::blank(pal.bg));

    let size = view.grid.size.max(0) as usize;
    let board_w = size * CELL_W + 2;

    compose_hud(buf, view, pal);
    compose_board(buf, view, pal, size);

    if let Some(overlay) = view.overlay {
        let center_row = BOARD_ROW + 1 + size / 2;
        compose_overlay(buf, pal, &overlay.title, &overlay.message, board_w, center_row);
    }

    let help_row = BOARD_ROW + size + 3;
    let help = match view.phase {
        Phase::Playing => " Arrows/WASD: Steer  Space: Pause  T: Theme  Q: Quit",
        Phase::Paused => " Space: Resume  T: Theme  Q: Quit",
        Phase::Idle | Phase::GameOver => " Space: Start  M: Mystery  T: Theme  Q: Quit",
    };
    buf.put_str(0, help_row, help, pal.dim, pal.bg);
}

fn compose_hud(buf: &mut FrameBuffer, view: &FrameView, pal: &Palette) {
    for x in 0..buf.width {
        buf.set(x, HUD_ROW, Cell::blank(pal.hud_bg));
    }
    let hud = format!(
        " Score:{:<6} Best:{:<6} Speed:{:>3}ms  {}",
        view.score,
        view.high_score,
        view.tick_ms,
        if view.mystery { "[?] Mystery" } else { "" },
    );
    buf.put_str(0, HUD_ROW, &hud, pal.text, pal.hud_bg);
}

fn compose_board(buf: &mut FrameBuffer, view: &FrameView, pal: &Palette, size: usize) {
    let right = size * CELL_W + 1;
    let bottom = BOARD_ROW + size + 1;

    // Border
    buf.set(0, BOARD_ROW, Cell::new('┌', pal.border, pal.bg));
    buf.set(right, BOARD_ROW, Cell::new('┐', pal.border, pal.bg));
    buf.set(0, bottom, Cell::new('└', pal.border, pal.bg));
    buf.set(right, bottom, Cell::new('┘', pal.border, pal.bg));
    for x in 1..right {
        buf.set(x, BOARD_ROW, Cell::new('─', pal.border, pal.bg));
        buf.set(x, bottom, Cell::new('─', pal.border, pal.bg));
    }
    for y in BOARD_ROW + 1..bottom {
        buf.set(0, y, Cell::new('│', pal.border, pal.bg));
        buf.set(right, y, Cell::new('│', pal.border, pal.bg));
        for x in 1..right {
            buf.set(x, y, Cell::blank(pal.board));
        }
    }

    put_board_cell(buf, view.food, "()", pal.food, pal.board);
    if let Some(item) = view.special {
        let label = if item.value < 100 { format!("{:>2}", item.value) } else { "??".to_string() };
        put_board_cell(buf, item.at, &label, pal.special, pal.board);
    }
    // Body before head so the head wins if they momentarily coincide.
    for seg in view.snake.iter().skip(1) {
        put_board_cell(buf, *seg, "██", pal.body, pal.board);
    }
    put_board_cell(buf, view.snake.head(), "██", pal.head, pal.board);
}

fn put_board_cell(buf: &mut FrameBuffer, at: Coord, glyph: &str, fg: Color, bg: Color) {
    if at.x < 0 || at.y < 0 {
        return;
    }
    let col = 1 + at.x as usize * CELL_W;
    let row = BOARD_ROW + 1 + at.y as usize;
    buf.put_str(col, row, glyph, fg, bg);
}

fn compose_overlay(buf: &mut FrameBuffer, pal: &Palette, title: &str, message: &str, board_w: usize, center_row: usize) {
    let inner = title.chars().count().max(message.chars().count()) + 4;
    let box_w = inner.min(board_w.saturating_sub(2)).max(1);
    let box_x = board_w.saturating_sub(box_w) / 2;
    let box_y = center_row.saturating_sub(2);

    for y in box_y..box_y + 5 {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Cell::blank(pal.overlay_bg));
        }
    }
    let centered = |s: &str| box_x + box_w.saturating_sub(s.chars().count()) / 2;
    buf.put_str(centered(title), box_y + 1, title, pal.title, pal.overlay_bg);
    buf.put_str(centered(message), box_y + 3, message, pal.text, pal.overlay_bg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::rng::SessionRng;
    use crate::sim::save::MemoryStore;
    use crate::sim::session::Game;

    fn frame(g: &Game) -> FrameBuffer {
        let mut buf = FrameBuffer::new(60, 30);
        compose(&mut buf, &g.view(), &Palette::for_theme(Theme::Dark));
        buf
    }

    fn game() -> Game {
        Game::new(GameConfig::default(), Box::new(MemoryStore::with_value(42)), SessionRng::new(5))
    }

    #[test]
    fn idle_frame_shows_prompt_and_best() {
        let buf = frame(&game());
        assert!(buf.row_text(HUD_ROW).contains("Best:42"));
        let all: String = (0..buf.height).map(|y| buf.row_text(y)).collect();
        assert!(all.contains("SNAKE"));
        assert!(all.contains("Press Space to start"));
    }

    #[test]
    fn playing_frame_draws_head_at_board_offset() {
        let mut g = game();
        g.start();
        let buf = frame(&g);
        let head = g.board.snake.head();
        let col = 1 + head.x as usize * CELL_W;
        let row = BOARD_ROW + 1 + head.y as usize;
        assert_eq!(buf.get(col, row).ch, '█');
        let food = g.board.food;
        assert_eq!(buf.get(1 + food.x as usize * CELL_W, BOARD_ROW + 1 + food.y as usize).ch, '(');
        assert_eq!(buf.get(0, BOARD_ROW).ch, '┌');
    }

    #[test]
    fn mystery_flag_in_hud() {
        let mut g = game();
        assert!(!frame(&g).row_text(HUD_ROW).contains("Mystery"));
        g.toggle_mystery();
        assert!(frame(&g).row_text(HUD_ROW).contains("Mystery"));
    }

    #[test]
    fn themes_use_distinct_backgrounds() {
        let dark = Palette::for_theme(Theme::Dark);
        let light = Palette::for_theme(Theme::Light);
        assert_ne!(dark.bg, light.bg);
        assert_ne!(dark.board, light.board);
    }
}
