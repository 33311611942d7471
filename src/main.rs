/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use config::GameConfig;
use sim::level::{LevelError, LevelLibrary};
use sim::session::Session;
use sim::timer::SystemClock;
use sim::world::{GameState, LevelMode};
use ui::gamepad::GamepadState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Cut the Tree: find the right axe, chop your way to the finish.
#[derive(Parser, Debug)]
#[command(name = "cutthetree")]
#[command(version, about, long_about = None)]
struct Args {
    /// Level family to play
    #[arg(short, long, value_enum, default_value = "normal")]
    mode: ModeArg,

    /// Level number to start from
    #[arg(short, long, default_value = "1")]
    level: u32,

    /// Path to config.toml (default: next to the executable, then the CWD)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Normal,
    Tutorial,
    Bonus,
}

impl From<ModeArg> for LevelMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Normal => LevelMode::Normal,
            ModeArg::Tutorial => LevelMode::Tutorial,
            ModeArg::Bonus => LevelMode::Bonus,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = GameConfig::load(args.config.as_deref());
    init_logging(&config);

    let levels = LevelLibrary::new(Some(config.levels_dir.clone()));
    let mut session = Session::new(SystemClock, Box::new(levels), config.timing);
    let mode = LevelMode::from(args.mode);
    if let Err(e) = session.new_game(mode, args.level) {
        error!("cannot start {} level {}: {e}", mode.slug(), args.level);
        eprintln!("Cannot start {} level {}: {e}", mode.slug(), args.level);
        return ExitCode::FAILURE;
    }

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            println!("Thanks for playing Cut the Tree!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("game loop failed: {e}");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `general.log_level`. The terminal is in raw
/// alternate-screen mode, so a configured log file is preferred.
fn init_logging(config: &GameConfig) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {e}", path.display()),
        }
    }

    if builder.try_init().is_err() {
        eprintln!("Logger already initialised");
    }
}

fn game_loop(
    session: &mut Session<SystemClock>,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut last_held = None;
    // Set once the last level of a family is done.
    let mut all_done = false;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.any_pressed() || gp.any_pressed() {
            session.clear_message();
        }

        // ── One-shot commands ──
        let mut commands: Vec<Command> = kb.commands().collect();
        if gp.cut_pressed() { commands.push(Command::Cut); }
        if gp.pause_pressed() { commands.push(Command::TogglePause); }
        if gp.confirm_pressed() { commands.push(Command::NextLevel); }

        for cmd in commands {
            match cmd {
                Command::Quit => return Ok(()),
                Command::Cut => session.submit_cut(),
                Command::TogglePause => { session.toggle_pause(); }
                Command::Restart => {
                    all_done = false;
                    last_held = None;
                    if let Err(e) = session.restart() {
                        warn!("restart failed: {e}");
                    }
                }
                Command::NextLevel if session.state() == Some(GameState::Finished) => {
                    last_held = None;
                    match session.next_level() {
                        Ok(()) => {}
                        Err(LevelError::NotFound { mode, number }) => {
                            info!("no {} level {number}, all done", mode.slug());
                            all_done = true;
                        }
                        Err(e) => warn!("next level failed: {e}"),
                    }
                }
                Command::NextLevel => {}
            }
        }

        // ── Held direction: only changes are forwarded ──
        let held = kb.held_direction().or_else(|| gp.held_direction());
        if held != last_held {
            match (held, last_held) {
                (Some(_), _) => session.submit_direction(held),
                (None, Some(prev)) => session.release_direction(prev),
                (None, None) => {}
            }
            last_held = held;
        }

        if last_tick.elapsed() >= tick_rate {
            let events = session.tick();
            sound::play_events(sound, &events);
            last_tick = Instant::now();
        }

        if all_done {
            renderer.render_message(&[
                "All levels in this set are done. Well chopped!",
                "",
                "R  play the last level again",
                "Q  quit",
            ])?;
        } else if let Some(snap) = session.snapshot() {
            renderer.render(&snap)?;
        }
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
