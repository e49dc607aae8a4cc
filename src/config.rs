/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD), or from
/// an explicit path given on the command line.
/// Falls back to sensible defaults if the file is missing or incomplete.

use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::mystery::{MysteryTable, MysteryWindow};
use crate::domain::placement::PlacementPolicy;

/// Least outer-ring share `validated()` leaves when the tiers fill the budget.
const MIN_OUTER_RING: f64 = 0.01;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid_size: i32,
    pub speed: SpeedConfig,
    pub score_per_food: u32,
    pub placement: PlacementPolicy,
    pub mystery: MysteryConfig,
    pub theme: Theme,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Handheld,
}

impl DeviceClass {
    pub fn from_name(s: &str) -> Option<DeviceClass> {
        match s.to_lowercase().as_str() {
            "desktop" | "pc" => Some(DeviceClass::Desktop),
            "handheld" | "mobile" | "touch" => Some(DeviceClass::Handheld),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub device: DeviceClass,
    pub desktop_tick_ms: u32,
    pub handheld_tick_ms: u32,
    pub min_tick_ms: u32,       // floor the speed-up never goes below
    pub speedup_step_ms: u32,   // shaved off the interval per food
    pub max_frame_ms: u32,      // longest frame delta the driver accepts
}

impl SpeedConfig {
    /// Tick interval a fresh session starts with.
    pub fn base_tick_ms(&self) -> u32 {
        match self.device {
            DeviceClass::Desktop => self.desktop_tick_ms,
            DeviceClass::Handheld => self.handheld_tick_ms,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MysteryConfig {
    pub enabled: bool,
    pub table: MysteryTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub pause: Vec<String>,
    pub mystery: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    placement: TomlPlacement,
    #[serde(default)]
    mystery: TomlMystery,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_grid_size")]
    size: i32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_device")]
    device: String,
    #[serde(default = "default_desktop_tick")]
    desktop_tick_ms: u32,
    #[serde(default = "default_handheld_tick")]
    handheld_tick_ms: u32,
    #[serde(default = "default_min_tick")]
    min_tick_ms: u32,
    #[serde(default = "default_speedup_step")]
    speedup_step_ms: u32,
    #[serde(default = "default_max_frame")]
    max_frame_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_per_food")]
    per_food: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPlacement {
    #[serde(default = "default_safe_inset")]
    safe_inset: i32,
    #[serde(default = "default_safe_zone_chance")]
    safe_zone_chance: f64,
    #[serde(default = "default_near_edge_chance")]
    near_edge_chance: f64,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_fallback_inset")]
    fallback_inset: i32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
struct TomlWindow {
    start: u32,
    end: u32,
    value: u32,
}

#[derive(Deserialize, Debug)]
struct TomlMystery {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_windows")]
    window: Vec<TomlWindow>,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_theme")]
    theme: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_mystery")]
    mystery: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_grid_size() -> i32 { 20 }
fn default_device() -> String { "desktop".into() }
fn default_desktop_tick() -> u32 { 100 }
fn default_handheld_tick() -> u32 { 130 }   // touch steering needs more reaction time
fn default_min_tick() -> u32 { 50 }
fn default_speedup_step() -> u32 { 1 }
fn default_max_frame() -> u32 { 250 }
fn default_per_food() -> u32 { 10 }
fn default_safe_inset() -> i32 { 3 }
fn default_safe_zone_chance() -> f64 { 0.85 }
fn default_near_edge_chance() -> f64 { 0.12 }
fn default_max_attempts() -> u32 { 100 }
fn default_fallback_inset() -> i32 { 2 }
fn default_theme() -> String { "dark".into() }

fn default_windows() -> Vec<TomlWindow> {
    MysteryTable::default().windows().iter()
        .map(|w| TomlWindow { start: w.start, end: w.end, value: w.value })
        .collect()
}

fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }
fn default_pad_mystery() -> Vec<String> { vec!["Y".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { size: default_grid_size() }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            device: default_device(),
            desktop_tick_ms: default_desktop_tick(),
            handheld_tick_ms: default_handheld_tick(),
            min_tick_ms: default_min_tick(),
            speedup_step_ms: default_speedup_step(),
            max_frame_ms: default_max_frame(),
        }
    }
}

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring { per_food: default_per_food() }
    }
}

impl Default for TomlPlacement {
    fn default() -> Self {
        TomlPlacement {
            safe_inset: default_safe_inset(),
            safe_zone_chance: default_safe_zone_chance(),
            near_edge_chance: default_near_edge_chance(),
            max_attempts: default_max_attempts(),
            fallback_inset: default_fallback_inset(),
        }
    }
}

impl Default for TomlMystery {
    fn default() -> Self {
        TomlMystery { enabled: false, window: default_windows() }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { theme: default_theme() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            pause: default_pad_pause(),
            mystery: default_pad_mystery(),
            quit: default_pad_quit(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// An explicit path wins; otherwise search (1) exe directory,
    /// (2) current working directory, (3) data directories.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => load_toml(&candidate_dirs()),
        };
        GameConfig::from_toml(toml_cfg).validated()
    }

    /// Parse config text directly. Parse errors fall back to defaults.
    #[cfg(test)]
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => GameConfig::from_toml(cfg).validated(),
            Err(e) => {
                warn!("config parse error: {e}; using default settings");
                GameConfig::default()
            }
        }
    }

    fn from_toml(t: TomlConfig) -> Self {
        let device = DeviceClass::from_name(&t.speed.device).unwrap_or_else(|| {
            warn!("unknown device class {:?}, using desktop", t.speed.device);
            DeviceClass::Desktop
        });
        let theme = match t.display.theme.to_lowercase().as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            other => {
                warn!("unknown theme {other:?}, using dark");
                Theme::Dark
            }
        };

        GameConfig {
            grid_size: t.grid.size,
            speed: SpeedConfig {
                device,
                desktop_tick_ms: t.speed.desktop_tick_ms,
                handheld_tick_ms: t.speed.handheld_tick_ms,
                min_tick_ms: t.speed.min_tick_ms,
                speedup_step_ms: t.speed.speedup_step_ms,
                max_frame_ms: t.speed.max_frame_ms,
            },
            score_per_food: t.scoring.per_food,
            placement: PlacementPolicy {
                safe_inset: t.placement.safe_inset,
                safe_zone_chance: t.placement.safe_zone_chance,
                near_edge_chance: t.placement.near_edge_chance,
                max_attempts: t.placement.max_attempts,
                fallback_inset: t.placement.fallback_inset,
            },
            mystery: MysteryConfig {
                enabled: t.mystery.enabled,
                table: MysteryTable::new(
                    t.mystery.window.iter()
                        .map(|w| MysteryWindow::new(w.start, w.end, w.value))
                        .collect(),
                ),
            },
            theme,
            gamepad: GamepadConfig {
                pause: t.gamepad.pause,
                mystery: t.gamepad.mystery,
                quit: t.gamepad.quit,
            },
        }
    }

    /// Clamp values the engine cannot work with.
    pub fn validated(mut self) -> Self {
        // 3-segment start line plus one free cell ahead needs 5 columns
        if !(5..=100).contains(&self.grid_size) {
            let clamped = self.grid_size.clamp(5, 100);
            warn!("grid size {} out of range, using {}", self.grid_size, clamped);
            self.grid_size = clamped;
        }

        let s = &mut self.speed;
        if s.min_tick_ms == 0 {
            warn!("min_tick_ms must be positive, using 1");
            s.min_tick_ms = 1;
        }
        if s.desktop_tick_ms < s.min_tick_ms {
            warn!("desktop_tick_ms below floor, raising to {}", s.min_tick_ms);
            s.desktop_tick_ms = s.min_tick_ms;
        }
        if s.handheld_tick_ms < s.min_tick_ms {
            warn!("handheld_tick_ms below floor, raising to {}", s.min_tick_ms);
            s.handheld_tick_ms = s.min_tick_ms;
        }
        if s.max_frame_ms == 0 {
            s.max_frame_ms = default_max_frame();
        }

        let p = &mut self.placement;
        p.safe_zone_chance = p.safe_zone_chance.clamp(0.0, 1.0);
        p.near_edge_chance = p.near_edge_chance.clamp(0.0, 1.0 - p.safe_zone_chance);
        // A sum that rounds to 1.0 leaves only a float-noise residual, and
        // the outer ring is then never drawn.
        if p.outer_ring_chance() < MIN_OUTER_RING / 2.0 {
            warn!("placement tiers leave no outer-ring chance; reserving 1%");
            let budget = 1.0 - MIN_OUTER_RING;
            p.safe_zone_chance = p.safe_zone_chance.min(budget);
            p.near_edge_chance = p.near_edge_chance.min(budget - p.safe_zone_chance);
        }
        p.safe_inset = p.safe_inset.max(1);
        p.fallback_inset = p.fallback_inset.max(1);

        self
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/gridsnake)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridsnake");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/gridsnake");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            if let Some(cfg) = read_toml(&path) {
                return cfg;
            }
            return TomlConfig::default();
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                warn!("{} parse error: {e}; using default settings", path.display());
                None
            }
        },
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let c = GameConfig::default();
        assert_eq!(c.grid_size, 20);
        assert_eq!(c.speed.base_tick_ms(), 100);
        assert_eq!(c.speed.min_tick_ms, 50);
        assert_eq!(c.speed.speedup_step_ms, 1);
        assert_eq!(c.score_per_food, 10);
        assert!(!c.mystery.enabled);
        assert_eq!(c.mystery.table, MysteryTable::default());
        assert_eq!(c.theme, Theme::Dark);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = GameConfig::parse(
            r#"
            [grid]
            size = 30

            [speed]
            device = "handheld"
            "#,
        );
        assert_eq!(c.grid_size, 30);
        assert_eq!(c.speed.device, DeviceClass::Handheld);
        assert_eq!(c.speed.base_tick_ms(), 130);
        assert_eq!(c.score_per_food, 10);
    }

    #[test]
    fn mystery_windows_from_file() {
        let c = GameConfig::parse(
            r#"
            [mystery]
            enabled = true
            window = [
                { start = 20, end = 21, value = 25 },
                { start = 40, end = 40, value = 1 },
            ]
            "#,
        );
        assert!(c.mystery.enabled);
        assert_eq!(c.mystery.table.windows(), &[MysteryWindow::new(20, 21, 25)]);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let c = GameConfig::parse(include_str!("../config.toml"));
        let d = GameConfig::default();
        assert_eq!(c.grid_size, d.grid_size);
        assert_eq!(c.speed.base_tick_ms(), d.speed.base_tick_ms());
        assert_eq!(c.placement, d.placement);
        assert_eq!(c.mystery.table, d.mystery.table);
        assert_eq!(c.gamepad.pause, vec!["Start".to_string()]);
    }

    #[test]
    fn broken_file_falls_back() {
        let c = GameConfig::parse("[grid\nsize = ");
        assert_eq!(c.grid_size, 20);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let c = GameConfig::parse(
            r#"
            [grid]
            size = 2

            [speed]
            min_tick_ms = 0
            desktop_tick_ms = 0

            [placement]
            safe_zone_chance = 1.5
            near_edge_chance = 0.3
            "#,
        );
        assert_eq!(c.grid_size, 5);
        assert_eq!(c.speed.min_tick_ms, 1);
        assert_eq!(c.speed.desktop_tick_ms, 1);
        assert!(c.placement.outer_ring_chance() > 0.0);
        assert!(c.placement.safe_zone_chance + c.placement.near_edge_chance <= 1.0);
    }

    #[test]
    fn edge_ring_stays_reachable_after_rounding() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        // 0.85 + 0.15 rounds to exactly 1.0 in f64
        let c = GameConfig::parse("[placement]\nsafe_zone_chance = 0.85\nnear_edge_chance = 0.15\n");
        let p = &c.placement;
        assert!(p.outer_ring_chance() >= MIN_OUTER_RING / 2.0);
        assert!(p.safe_zone_chance + p.near_edge_chance < 1.0);

        let mut rng = StdRng::seed_from_u64(7);
        let ring = (0..20_000)
            .map(|_| p.sample_axis(20, &mut rng))
            .filter(|&v| v == 1 || v == 18)
            .count();
        assert!(ring > 0, "outer ring never drawn");
    }
}
