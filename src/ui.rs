//! Layout and drawing: playfield, sidebar, pause, game over, popping fade.

use crate::game::GameSession;
use crate::grid::Cell;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count};

/// Each puyo is two terminal columns wide so cells look roughly square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const PUYO: &str = "██";
const GHOST: &str = "░░";
const SIDEBAR_WIDTH: u16 = 24;

/// Playfield size in terminal cells (border + grid) for given grid dimensions.
fn playfield_outer_size(cols: usize, rows: usize) -> (u16, u16) {
    (cols as u16 * CELL_WIDTH + 2, rows as u16 * CELL_HEIGHT + 2)
}

/// Centered area holding playfield + sidebar.
fn game_area(area: Rect, state: &GameSession) -> (Rect, Rect) {
    let (pw, ph) = playfield_outer_size(state.grid().cols, state.grid().rows);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Board rect inside the playfield border.
fn board_rect(playfield: Rect, state: &GameSession) -> Rect {
    let inner = Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: playfield.width.saturating_sub(2),
        height: playfield.height.saturating_sub(2),
    };
    Rect {
        width: (state.grid().cols as u16 * CELL_WIDTH).min(inner.width),
        height: (state.grid().rows as u16 * CELL_HEIGHT).min(inner.height),
        ..inner
    }
}

/// Buffer positions covered by the given grid cells.
fn clearing_buffer_positions(board: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = board.x + gx as u16 * CELL_WIDTH;
        let y0 = board.y + gy as u16 * CELL_HEIGHT;
        for bx in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            for by in y0..(y0 + CELL_HEIGHT).min(board.y + board.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Mutable animation state owned by the app and threaded through drawing.
#[derive(Default)]
pub struct ClearFx {
    pub effect: Option<Effect>,
    pub last_process: Option<Instant>,
}

impl ClearFx {
    pub fn reset(&mut self) {
        self.effect = None;
        self.last_process = None;
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Draw the current frame: game, then overlays for pause / game over, then the popping fade.
pub fn draw(
    frame: &mut Frame,
    state: &GameSession,
    theme: &Theme,
    paused: bool,
    clear_fx: &mut ClearFx,
    fade_ms: u32,
    no_animation: bool,
    now: Instant,
) {
    let area = frame.area();
    let (playfield, sidebar) = game_area(area, state);
    draw_playfield(frame, state, theme, playfield);
    draw_sidebar(frame, state, theme, sidebar);

    if state.is_game_over() {
        draw_game_over(frame, state, theme, area);
    } else if paused {
        draw_pause_overlay(frame, theme, area);
    }

    if !state.clearing_cells().is_empty() && !no_animation {
        apply_clear_effect(frame, state, theme, board_rect(playfield, state), clear_fx, fade_ms, now);
    }
}

/// Create or update the fade over popping puyos and process it.
fn apply_clear_effect(
    frame: &mut Frame,
    state: &GameSession,
    theme: &Theme,
    board: Rect,
    clear_fx: &mut ClearFx,
    fade_ms: u32,
    now: Instant,
) {
    let delta = clear_fx
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    clear_fx.last_process = Some(now);

    if clear_fx.effect.is_none() {
        let clearing_set = clearing_buffer_positions(board, state.clearing_cells());
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            clearing_set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (fade_ms, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        clear_fx.effect = Some(effect);
    }

    if let Some(effect) = clear_fx.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_playfield(frame: &mut Frame, state: &GameSession, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Puyotui ", theme.title));
    frame.render_widget(block, area);
    let board = board_rect(area, state);

    let display = state.display_grid();
    let clearing: HashSet<(usize, usize)> = state.clearing_cells().iter().copied().collect();
    let ghost: Vec<(i32, i32)> = state
        .ghost()
        .map(|g| vec![g.main_pos(), g.sub_pos()])
        .unwrap_or_default();

    let buf = frame.buffer_mut();
    for (y, row) in display.rows_iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let rx = board.x + x as u16 * CELL_WIDTH;
            let ry = board.y + y as u16 * CELL_HEIGHT;
            if rx + CELL_WIDTH > board.x + board.width || ry >= board.y + board.height {
                continue;
            }
            let (symbol, style) = match *cell {
                Cell::Puyo(_) if clearing.contains(&(x, y)) => {
                    (PUYO, Style::default().fg(Color::White).bg(theme.bg))
                }
                Cell::Puyo(i) => (PUYO, Style::default().fg(theme.puyo_color(i)).bg(theme.bg)),
                Cell::Empty if ghost.contains(&(x as i32, y as i32)) => {
                    (GHOST, Style::default().fg(theme.inactive_fg).bg(theme.bg))
                }
                Cell::Empty => ("  ", Style::default().bg(theme.bg)),
            };
            buf.set_string(rx, ry, symbol, style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameSession, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours
            Constraint::Fill(1),   // Controls
        ])
        .split(area);

    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };
    let stats = Paragraph::new(Text::from(vec![
        stat("Score: ", state.score),
        stat("Chain: ", state.chain),
        stat("Best chain: ", state.max_chain),
        stat("Pieces: ", state.pieces_placed),
        stat("Popped: ", state.puyos_cleared),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(border_style));
    frame.render_widget(stats, chunks[0]);

    let colours_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Colours", title_style));
    let colours_inner = colours_block.inner(chunks[2]);
    frame.render_widget(colours_block, chunks[2]);
    let swatches: Vec<Span> = (0..state.palette_size())
        .flat_map(|i| {
            [
                Span::styled(PUYO, Style::default().fg(theme.puyo_color(i))),
                Span::from(" "),
            ]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(swatches)), colours_inner);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![Span::styled(k, title_style), Span::styled(what, fg_style)])
    };
    let controls = Paragraph::new(Text::from(vec![
        key(" ← →    ", "move"),
        key(" ↓      ", "soft drop"),
        key(" Z / X  ", "rotate"),
        key(" Space  ", "hard drop"),
        key(" P      ", "pause"),
        key(" R      ", "restart"),
        key(" Q      ", "quit"),
    ]));
    frame.render_widget(controls, chunks[3]);
}

fn centered_popup(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}

fn draw_game_over(frame: &mut Frame, state: &GameSession, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 30, 10);
    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score), fg)),
        Line::from(Span::styled(format!(" Best chain: {} ", state.max_chain), fg)),
        Line::from(Span::styled(format!(" Popped: {} ", state.puyos_cleared), fg)),
        Line::from(""),
        Line::from(Span::styled(
            " R: Restart    Q: Quit ",
            fg.add_modifier(Modifier::BOLD),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Puyotui ", theme.title)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(p, popup);
}
