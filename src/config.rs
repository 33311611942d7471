/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or from the executable's
/// directory, or from the CWD. Falls back to sensible defaults if the file
/// is missing, unreadable or incomplete.

use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub step_ticks: u32,  // frames one step occupies
    pub cut_ticks: u32,   // frames until a chopped tree falls
    pub bonus_seconds: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_rate_ms: default_tick_rate(),
            step_ticks: default_step_ticks(),
            cut_ticks: default_cut_ticks(),
            bonus_seconds: default_bonus_seconds(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub cut: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_step_ticks")]
    step_ticks: u32,
    #[serde(default = "default_cut_ticks")]
    cut_ticks: u32,
    #[serde(default = "default_bonus_seconds")]
    bonus_seconds: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_cut")]
    cut: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 60 }
fn default_step_ticks() -> u32 { 3 }
fn default_cut_ticks() -> u32 { 8 }     // ~0.5s of chopping at 60ms
fn default_bonus_seconds() -> u64 { 60 }

/// Longest bonus countdown accepted from config.toml (one day).
const MAX_BONUS_SECONDS: u64 = 86_400;

fn default_pad_cut() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["B".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_level() -> String { "warn".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            step_ticks: default_step_ticks(),
            cut_ticks: default_cut_ticks(),
            bonus_seconds: default_bonus_seconds(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            cut: default_pad_cut(),
            pause: default_pad_pause(),
            confirm: default_pad_confirm(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config. An explicit path wins; otherwise search
    /// (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();

        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => search_dirs
                .iter()
                .map(|d| d.join("config.toml"))
                .find(|p| p.exists())
                .and_then(|p| read_toml(&p))
                .unwrap_or_default(),
        };

        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory against the search dirs
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let log_file = Some(toml_cfg.general.log_file.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                step_ticks: toml_cfg.timing.step_ticks.max(1),
                cut_ticks: toml_cfg.timing.cut_ticks.max(1),
                bonus_seconds: toml_cfg.timing.bonus_seconds.clamp(1, MAX_BONUS_SECONDS),
            },
            gamepad: GamepadConfig {
                cut: toml_cfg.gamepad.cut,
                pause: toml_cfg.gamepad.pause,
                confirm: toml_cfg.gamepad.confirm,
            },
            levels_dir,
            log_level: toml_cfg.general.log_level,
            log_file,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data is found next to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Read and parse one config file. Errors are logged, never fatal.
fn read_toml(path: &Path) -> Option<TomlConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            return None;
        }
    };
    match toml::from_str::<TomlConfig>(&text) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!("{} parse error, using default settings: {e}", path.display());
            None
        }
    }
}
