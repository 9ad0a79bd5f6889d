//! App: terminal init, main loop, drop timer, chain pacing and key handling.

use crate::GameConfig;
use crate::cascade::CascadeEvent;
use crate::game::{GameSession, MoveOutcome, Phase, Step};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ClearFx};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;
/// Target frame time (~60 FPS).
const FRAME_MS: u64 = 16;

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameSession,
    paused: bool,
    last_tick: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    /// Earliest time the chain may advance again (flash and post-chain pauses).
    hold_until: Option<Instant>,
    clear_fx: ClearFx,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = GameSession::new(&config);
        Self {
            config,
            theme,
            state,
            paused: false,
            last_tick: Instant::now(),
            repeat_state: None,
            last_repeat_fire: None,
            hold_until: None,
            clear_fx: ClearFx::default(),
        }
    }

    fn reset_game(&mut self, now: Instant) {
        self.state.restart();
        self.paused = false;
        self.last_tick = now;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.hold_until = None;
        self.clear_fx.reset();
    }

    /// Apply one key action. Returns false when the app should exit.
    fn handle_action(&mut self, action: Action, now: Instant) -> bool {
        match action {
            Action::Quit => return false,
            Action::Restart => self.reset_game(now),
            Action::Pause if !self.state.is_game_over() => self.paused = !self.paused,
            _ if self.paused || self.state.is_game_over() => {}
            _ => {
                if self.apply_move(action, now) == MoveOutcome::Locked {
                    // A lock ends any held key so it doesn't steer the next pair.
                    self.repeat_state = None;
                    self.last_repeat_fire = None;
                } else if action.repeats() {
                    self.repeat_state = Some((action, now));
                    self.last_repeat_fire = None;
                }
            }
        }
        true
    }

    fn apply_move(&mut self, action: Action, now: Instant) -> MoveOutcome {
        match action {
            Action::MoveLeft => self.state.move_left(),
            Action::MoveRight => self.state.move_right(),
            Action::RotateCw => self.state.rotate_cw(),
            Action::RotateCcw => self.state.rotate_ccw(),
            Action::SoftDrop => {
                // Manual descent restarts the drop timer.
                self.last_tick = now;
                self.state.soft_drop()
            }
            Action::HardDrop => self.state.hard_drop(),
            Action::Restart | Action::Pause | Action::Quit | Action::None => MoveOutcome::Rejected,
        }
    }

    fn tick_repeat(&mut self, now: Instant) {
        let Some((action, first)) = self.repeat_state else {
            return;
        };
        if now.saturating_duration_since(first) < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            if self.apply_move(action, now) == MoveOutcome::Locked {
                self.repeat_state = None;
                self.last_repeat_fire = None;
            } else {
                self.last_repeat_fire = Some(now);
            }
        }
    }

    /// Drop timer while falling; chain pacing otherwise.
    fn update(&mut self, now: Instant) {
        if self.paused || self.state.is_game_over() {
            return;
        }
        match self.state.phase() {
            Phase::Falling(_) => {
                self.tick_repeat(now);
                let interval = Duration::from_millis(self.config.drop_interval_ms);
                if now.saturating_duration_since(self.last_tick) >= interval {
                    self.last_tick = now;
                    if self.state.tick() == MoveOutcome::Locked {
                        self.repeat_state = None;
                    }
                }
            }
            Phase::Resolving(_) | Phase::Spawning => self.pace_chain(now),
            Phase::GameOver => {}
        }
    }

    /// Advance the chain by at most one stage, honouring the configured pauses.
    fn pace_chain(&mut self, now: Instant) {
        if self.config.no_animation {
            self.state.settle();
            self.last_tick = now;
            return;
        }
        if let Some(until) = self.hold_until {
            if now < until && !self.clear_fx.done() {
                return;
            }
            self.hold_until = None;
        }
        match self.state.advance() {
            Step::Cascade(CascadeEvent::Marked { .. }) => {
                self.clear_fx.reset();
                self.hold_until = Some(now + Duration::from_millis(self.config.clear_delay_ms));
            }
            Step::Cascade(CascadeEvent::Cleared { .. }) => self.clear_fx.reset(),
            Step::Cascade(CascadeEvent::Settled) => {}
            Step::Cascade(CascadeEvent::Finished(outcome)) => {
                let pause = if outcome.cleared_anything() {
                    self.config.spawn_delay_ms
                } else {
                    0
                };
                self.hold_until = Some(now + Duration::from_millis(pause));
            }
            Step::Spawned(_) => self.last_tick = now,
            Step::GameOver => {
                self.repeat_state = None;
                self.last_repeat_fire = None;
            }
            Step::Idle => {}
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        // Release events let held keys stop repeating; not every terminal supports them.
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.last_tick = Instant::now();

        let result = self.run_loop(&mut terminal);

        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                ui::draw(
                    f,
                    &self.state,
                    &self.theme,
                    self.paused,
                    &mut self.clear_fx,
                    self.config.clear_delay_ms.min(u32::MAX as u64) as u32,
                    self.config.no_animation,
                    now,
                )
            })?;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    let action = key_to_action(key);
                    if key.kind != KeyEventKind::Press {
                        if key.kind == KeyEventKind::Release
                            && self.repeat_state.map(|(a, _)| a) == Some(action)
                        {
                            self.repeat_state = None;
                            self.last_repeat_fire = None;
                        }
                        continue;
                    }
                    // Already repeating this action ourselves; skip OS auto-repeat presses.
                    if self.repeat_state.map(|(a, _)| a) == Some(action) {
                        continue;
                    }
                    if !self.handle_action(action, Instant::now()) {
                        return Ok(());
                    }
                }
            }

            self.update(Instant::now());
        }
    }
}
