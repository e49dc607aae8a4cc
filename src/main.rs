/// Entry point and host loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

use config::{DeviceClass, GameConfig};
use sim::driver::{CancelToken, Clock, FixedStep, MonotonicClock};
use sim::event::GameEvent;
use sim::rng::SessionRng;
use sim::save::{FileStore, HighScoreStore, MemoryStore};
use sim::session::Game;
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState};
use ui::renderer::Renderer;
use ui::sound::{sfx_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

#[derive(Parser)]
#[command(name = "gridsnake")]
#[command(version, about = "Terminal snake with a mystery scoring mode")]
struct Cli {
    /// Config file (default: search exe dir, CWD, data dirs)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid edge length in cells (overrides config)
    #[arg(long)]
    grid: Option<i32>,

    /// Start with mystery mode enabled
    #[arg(long)]
    mystery: bool,

    /// Seed for food and item placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Device class, selects the base tick interval
    #[arg(long)]
    device: Option<DeviceArg>,

    /// Keep the high score in memory only
    #[arg(long)]
    no_save: bool,

    /// Log file (the terminal is in raw mode while playing)
    #[arg(long, default_value = "gridsnake.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Desktop,
    Handheld,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = build_config(&cli);
    let store: Box<dyn HighScoreStore> = if cli.no_save {
        Box::new(MemoryStore::new())
    } else {
        let file = FileStore::in_save_dir();
        info!("high score file: {}", file.path().display());
        Box::new(file)
    };
    let rng = match cli.seed {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_random(),
    };
    info!("placement seed {}", rng.seed());

    let mut renderer = Renderer::new(config.theme);
    let mut game = Game::new(config, store, rng);

    renderer.init().context("Failed to initialize terminal")?;
    let sound = SoundEngine::new();
    let result = run(&mut game, &mut renderer, sound.as_ref());

    // Restore the terminal before anything is reported.
    let cleanup = renderer.cleanup().context("Failed to restore terminal");
    result?;
    cleanup?;

    println!("Thanks for playing gridsnake!");
    println!("Best score: {}", game.high_score);
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level: LevelFilter = cli.log_level.into();
    if level == LevelFilter::Off {
        return;
    }
    match File::create(&cli.log_file) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, LogConfig::default(), file) {
                eprintln!("logger init failed: {e}");
            }
        }
        Err(e) => eprintln!("cannot open log file {}: {e}", cli.log_file.display()),
    }
}

/// Config file first, then command-line overrides.
fn build_config(cli: &Cli) -> GameConfig {
    let mut config = GameConfig::load(cli.config.as_deref());
    if let Some(size) = cli.grid {
        config.grid_size = size;
    }
    if cli.mystery {
        config.mystery.enabled = true;
    }
    if let Some(device) = cli.device {
        config.speed.device = match device {
            DeviceArg::Desktop => DeviceClass::Desktop,
            DeviceArg::Handheld => DeviceClass::Handheld,
        };
    }
    config.validated()
}

fn run(game: &mut Game, renderer: &mut Renderer, sound: Option<&SoundEngine>) -> Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&game.config.gamepad);
    if gp.connected {
        info!("gamepad input enabled");
    }

    let clock = MonotonicClock::new();
    let mut stepper = FixedStep::new(game.config.speed.max_frame_ms);
    let cancel = CancelToken::new();

    while !cancel.is_cancelled() {
        kb.drain_events();
        gp.update();

        let mut events: Vec<GameEvent> = Vec::new();
        for action in kb.actions().iter().copied().chain(gp.actions()) {
            match action {
                Action::Quit => cancel.cancel(),
                Action::ToggleTheme => {
                    let next = renderer.theme().toggled();
                    renderer.set_theme(next);
                }
                Action::Game(cmd) => {
                    debug!("command {:?}", cmd);
                    events.extend(game.handle(cmd));
                }
            }
        }
        if cancel.is_cancelled() {
            break;
        }

        let report = stepper.advance(clock.now(), game);
        events.extend(report.events);
        process_events(sound, &events);

        renderer.render(&game.view()).context("Failed to draw frame")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    info!("quit");
    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::SpecialSpawned { at, value } => info!("special item {value} at {at:?}"),
            GameEvent::SpecialEaten { value, .. } => info!("special item eaten, score set to {value}"),
            GameEvent::Collision { kind, at } => info!("{kind:?} collision at {at:?}"),
            GameEvent::FoodEaten { at, score } => debug!("food eaten at {at:?}, score {score}"),
            GameEvent::SpecialExpired { at } => debug!("special item at {at:?} expired"),
            GameEvent::BoardFull => info!("board full, no cell left for food"),
            GameEvent::NewRecord { score } => info!("new record {score}"),
            GameEvent::SessionEnded { score } => debug!("session over at {score}"),
            _ => {}
        }
        if let (Some(sfx), Some(effect)) = (sound, sfx_for(event)) {
            sfx.play(effect);
        }
    }
}
