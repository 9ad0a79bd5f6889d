//! Puyotui - falling-pair colour matching puzzle (Puyo Puyo style) in the terminal.

mod app;
mod cascade;
mod game;
mod grid;
mod groups;
mod input;
mod piece;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use thiserror::Error;

/// Largest palette the themes provide colours for.
pub const MAX_COLORS: u8 = 6;
/// Largest grid side; keeps the terminal layout math in `u16` range.
pub const MAX_GRID_SIDE: usize = 64;

/// Options derived from CLI that affect game behaviour (grid size, palette, pacing).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub colors: u8,
    pub drop_interval_ms: u64,
    /// How long marked cells flash before they vanish.
    pub clear_delay_ms: u64,
    /// Pause after a chain before the next pair appears.
    pub spawn_delay_ms: u64,
    pub no_animation: bool,
    pub seed: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 12,
            cols: 6,
            colors: 4,
            drop_interval_ms: 700,
            clear_delay_ms: 300,
            spawn_delay_ms: 200,
            no_animation: false,
            seed: 1,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid needs at least 2 columns, got {0}")]
    TooNarrow(usize),
    #[error("grid needs at least 3 rows, got {0}")]
    TooShort(usize),
    #[error("grid {cols}x{rows} is too large, at most 64 columns and 64 rows")]
    TooLarge { cols: usize, rows: usize },
    #[error("colour count must be between 4 and 6, got {0}")]
    Colors(u8),
    #[error("drop interval must be greater than zero")]
    ZeroDropInterval,
}

impl GameConfig {
    /// Reject sizes the spawn position or the palette cannot support.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols < 2 {
            return Err(ConfigError::TooNarrow(self.cols));
        }
        if self.rows < 3 {
            return Err(ConfigError::TooShort(self.rows));
        }
        if self.cols > MAX_GRID_SIDE || self.rows > MAX_GRID_SIDE {
            return Err(ConfigError::TooLarge {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !(4..=MAX_COLORS).contains(&self.colors) {
            return Err(ConfigError::Colors(self.colors));
        }
        if self.drop_interval_ms == 0 {
            return Err(ConfigError::ZeroDropInterval);
        }
        Ok(())
    }

    fn from_args(args: &Args) -> Self {
        Self {
            rows: args.rows,
            cols: args.cols,
            colors: args.colors,
            drop_interval_ms: args.drop_interval_ms,
            clear_delay_ms: args.clear_delay_ms,
            spawn_delay_ms: args.spawn_delay_ms,
            no_animation: args.no_animation,
            seed: args.seed.unwrap_or_else(clock_seed),
        }
    }
}

fn clock_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0x1234_5678)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args);
    config.validate().context("invalid game configuration")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Puyo Puyo style puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "puyotui",
    version,
    about = "Puyo Puyo style falling-pair puzzle in the terminal. Connect four of a colour to pop them; chains multiply the score.",
    long_about = "Puyotui is a terminal puzzle game inspired by Puyo Puyo.\n\n\
        Steer falling pairs of coloured puyos. Four or more connected puyos of one colour pop; \
        everything above falls, and new groups formed by the fall pop again as a chain. \
        Each chain scores cleared puyos x 10 x chain depth.\n\n\
        CONTROLS:\n  Left/Right  Move    Down       Soft drop   Space/Enter Hard drop\n  \
        Z / X       Rotate CCW / CW (also U, Up, K)\n  P           Pause   R          Restart     Q / Esc    Quit\n\n\
        Vim keys h/j/l move and soft drop. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Playfield height in rows.
    #[arg(long, default_value = "12", value_name = "ROWS")]
    pub rows: usize,

    /// Playfield width in columns.
    #[arg(long, default_value = "6", value_name = "COLS")]
    pub cols: usize,

    /// Number of puyo colours (4 to 6).
    #[arg(short, long, default_value = "4", value_name = "N")]
    pub colors: u8,

    /// Automatic descent interval in ms.
    #[arg(long, default_value = "700", value_name = "MS")]
    pub drop_interval_ms: u64,

    /// How long popping puyos flash before they vanish, in ms.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub clear_delay_ms: u64,

    /// Pause after a chain before the next pair appears, in ms.
    #[arg(long, default_value = "200", value_name = "MS")]
    pub spawn_delay_ms: u64,

    /// Disable chain animation (instant clear + gravity).
    #[arg(long)]
    pub no_animation: bool,

    /// Seed for the colour sequence (random if not set).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u32>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
