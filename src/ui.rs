//! UI rendering helpers for the terminal user interface.
//!
//! This module draws the desk with `ratatui` from the view state and a
//! read-only view of the session controller.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, Focus};
use crate::audio::AudioEngine;
use crate::config::{TimeField, UiSettings};
use crate::error::Severity;
use crate::library::Track;
use crate::pads::PadSlot;
use crate::player::{PlaybackStatus, RemainingLevel, TimeText, format_clock};
use crate::session::{Controller, LibraryState};

const PAD_COLUMNS: usize = 4;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("space", "play/pause");
    map.insert("esc", "stop all");
    map.insert("1-9", "pads");
    map.insert("←/→", "prev/next");
    map.insert("↑/↓", "music vol");
    map.insert("⇧↑/⇧↓", "fx vol");
    map.insert("tab", "panel");
    map.insert("j/k", "move");
    map.insert("enter", "open/play/fire");
    map.insert("H/L", "seek -/+5%");
    map.insert("r", "mode");
    map.insert("/", "filter");
    map.insert("a/n/x", "pad assign/name/clear");
    map.insert("X", "stop fx");
    map.insert("c/C", "countdown set/stop");
    map.insert("f/R", "folder/rescan");
    map.insert("K", "metadata");
    map.insert("l", "lock");
    map.insert("m", "panic mute");
    map.insert("q", "quit");
    map
});

/// Render the controls help text.
fn controls_text() -> String {
    let order = [
        "space", "esc", "1-9", "←/→", "↑/↓", "⇧↑/⇧↓", "tab", "j/k", "enter", "H/L", "r", "/",
        "a/n/x", "X", "c/C", "f/R", "K", "l", "m", "q",
    ];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}")))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn level_style(level: RemainingLevel) -> Style {
    match level {
        RemainingLevel::Normal => Style::default(),
        RemainingLevel::Warning => Style::default().fg(Color::Yellow),
        RemainingLevel::Danger => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::default(),
        Severity::Success => Style::default().fg(Color::Green),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

/// Build the now-playing time text per `UiSettings`.
fn now_playing_time_text(text: &TimeText, ui: &UiSettings) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .map(|f| match f {
            TimeField::Elapsed => text.elapsed.clone(),
            TimeField::Total => text.total.clone(),
            TimeField::Remaining => format!("-{}", text.remaining),
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Start, end and cursor offset of a list window that keeps `sel_pos`
/// centred where possible.
fn visible_window(total: usize, height: usize, sel_pos: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, sel_pos);
    }
    let half = height / 2;
    let mut start = sel_pos.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, sel_pos - start)
}

/// Render the whole desk.
pub fn draw<E: AudioEngine>(frame: &mut Frame, app: &App, desk: &Controller<E>, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], desk, now);
    draw_now_playing(frame, chunks[1], desk);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(38),
            Constraint::Percentage(40),
        ])
        .split(chunks[2]);
    draw_playlists(frame, main[0], app, desk);
    draw_tracks(frame, main[1], app, desk);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(main[2]);
    draw_pads(frame, right[0], app, desk);
    draw_history(frame, right[1], desk);

    draw_meters(frame, chunks[3], desk);
    draw_status(frame, chunks[4], desk);

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);

    if app.metadata_window {
        draw_metadata_popup(frame, chunks[2], app, desk);
    }
    if let Some(prompt) = &app.prompt {
        let area = centered_rect_sized(64, 3, chunks[2]);
        frame.render_widget(Clear, area);
        let input = Paragraph::new(format!("{}▏", prompt.input)).block(
            Block::bordered()
                .title(prompt.kind.title())
                .title_bottom(" enter confirms, esc cancels "),
        );
        frame.render_widget(input, area);
    }
}

fn draw_header<E: AudioEngine>(frame: &mut Frame, area: Rect, desk: &Controller<E>, now: Instant) {
    let mut parts = vec![
        desk.settings().ui.header_text.clone(),
        desk.clock_text().to_string(),
        format!("session {}", desk.session_time(now)),
        format!("played {}", desk.stats().tracks_played),
    ];
    if desk.is_locked() {
        parts.push("LOCKED".to_string());
    }
    let header = Paragraph::new(parts.join(" • "))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" stagemix ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, area);
}

fn draw_now_playing<E: AudioEngine>(frame: &mut Frame, area: Rect, desk: &Controller<E>) {
    let player = desk.player();
    let progress = player.progress();
    let state = match player.status() {
        PlaybackStatus::Playing => "Playing",
        PlaybackStatus::Paused => "Paused",
        PlaybackStatus::Stopped if player.is_loading() => "Loading",
        PlaybackStatus::Stopped => "Stopped",
    };

    let mut title = vec![Span::raw(format!(" {state} "))];
    if let Some(track) = player.current_track() {
        title.push(Span::styled(
            track.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        title.push(Span::raw(format!(" - {}", track.artist_or_unknown())));
    }
    if let Some((pos, total)) = desk.track_counter() {
        title.push(Span::raw(format!("  [{pos} / {total}]")));
    }
    title.push(Span::raw(format!("  mode: {}", player.mode().label())));

    let label = now_playing_time_text(progress.text(), &desk.settings().ui).unwrap_or_default();
    let gauge = Gauge::default()
        .block(Block::bordered().title(Line::from(title)))
        .gauge_style(level_style(progress.level()).fg(match progress.level() {
            RemainingLevel::Normal => Color::Green,
            RemainingLevel::Warning => Color::Yellow,
            RemainingLevel::Danger => Color::Red,
        }))
        .ratio(progress.fraction().clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

/// Text shown in place of the playlist list, if any. A first run gets a
/// welcome instead of the missing-folder reason.
fn library_notice(state: &LibraryState, first_run: bool) -> Option<String> {
    match state {
        LibraryState::NeedsSetup(_) if first_run => Some(
            "Welcome to stagemix.\n\nPress [f] to choose the folder that holds your playlists. \
             Each subfolder becomes one playlist."
                .to_string(),
        ),
        LibraryState::NeedsSetup(reason) => Some(format!(
            "{reason}\n\nPress [f] to choose the folder that holds your playlists."
        )),
        LibraryState::Empty => Some(
            "No playlists found.\n\nAdd folders with audio files, or press [f] to pick another folder."
                .to_string(),
        ),
        LibraryState::Error(message) => Some(format!("{message}\n\nPress [f] to pick another folder.")),
        LibraryState::Ready => None,
    }
}

fn draw_playlists<E: AudioEngine>(frame: &mut Frame, area: Rect, app: &App, desk: &Controller<E>) {
    let block = panel_block(" playlists ", app.focus == Focus::Playlists);
    if let Some(text) = library_notice(desk.library_state(), desk.is_first_run()) {
        let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(p, area);
        return;
    }

    let open = desk.playlist_index();
    let items: Vec<ListItem> = desk
        .playlists()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let text = format!("{} ({})", p.name, p.track_count);
            if open == Some(i) {
                ListItem::new(text).style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(text)
            }
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !desk.playlists().is_empty() {
        state.select(Some(app.playlist_cursor));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn track_line(track: &Track, playing: bool) -> Line<'static> {
    let duration = track
        .duration
        .map(|d| format_clock(d.as_secs_f64()))
        .unwrap_or_else(|| "--:--".to_string());
    let marker = if playing { "♪ " } else { "  " };
    Line::from(vec![
        Span::raw(marker),
        Span::raw(track.display_name.clone()),
        Span::raw(format!("  {}", track.artist_or_unknown())).dark_gray(),
        Span::raw(format!("  {duration}")).dark_gray(),
    ])
}

fn draw_tracks<E: AudioEngine>(frame: &mut Frame, area: Rect, app: &App, desk: &Controller<E>) {
    let playlist = desk.playlist();
    let q = app.filter_query.trim();
    let title = if app.filter_mode || !q.is_empty() {
        format!(" {} • filter: {q} ", playlist.name)
    } else if playlist.name.is_empty() {
        " tracks ".to_string()
    } else {
        format!(" {} ", playlist.name)
    };
    let block = panel_block(&title, app.focus == Focus::Tracks);

    let display = app.display_indices(playlist);
    let current = desk.player().index();

    // Only build items for the visible window.
    let height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_in_window) = visible_window(display.len(), height, sel_pos);
    let items: Vec<ListItem> = display[start..end]
        .iter()
        .filter_map(|&i| playlist.get(i).map(|t| ListItem::new(track_line(t, current == Some(i)))))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !display.is_empty() {
        state.select(Some(selected_in_window));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn pad_gauge(slot: &PadSlot, selected: bool) -> Gauge<'_> {
    let colour = if slot.is_playing() {
        Color::Green
    } else if slot.is_loading() {
        Color::Yellow
    } else if slot.is_assigned() {
        Color::Blue
    } else {
        Color::DarkGray
    };
    let mut block = Block::bordered().title(format!(" {} ", slot.index + 1));
    if selected {
        block = block.border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    }
    Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(colour))
        .ratio(slot.progress().clamp(0.0, 1.0))
        .label(slot.display_name.clone())
}

fn draw_pads<E: AudioEngine>(frame: &mut Frame, area: Rect, app: &App, desk: &Controller<E>) {
    let focused = app.focus == Focus::Pads;
    let playing = desk.pads().playing_count();
    let title = if playing > 0 {
        format!(" effects ({playing} playing) ")
    } else {
        " effects ".to_string()
    };
    let block = panel_block(&title, focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let slots = desk.pads().slots();
    let rows = slots.len().div_ceil(PAD_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows.max(1) as u32); rows])
        .split(inner);
    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, PAD_COLUMNS as u32); PAD_COLUMNS])
            .split(*row_area);
        for (col, cell) in cells.iter().enumerate() {
            let index = row * PAD_COLUMNS + col;
            if let Some(slot) = slots.get(index) {
                frame.render_widget(pad_gauge(slot, focused && app.pad_cursor == index), *cell);
            }
        }
    }
}

fn draw_history<E: AudioEngine>(frame: &mut Frame, area: Rect, desk: &Controller<E>) {
    let items: Vec<ListItem> = desk
        .history()
        .entries()
        .map(|e| ListItem::new(format!("{}  {} - {}", e.time_text(), e.track_name, e.artist)))
        .collect();
    let list = List::new(items).block(Block::bordered().title(" history "));
    frame.render_widget(list, area);
}

fn volume_gauge(title: &str, volume: f32, level: f32, muted: bool) -> Gauge<'static> {
    let label = if muted {
        format!("{:.0}% MUTED", volume * 100.0)
    } else {
        format!("{:.0}%", volume * 100.0)
    };
    let colour = if muted {
        Color::DarkGray
    } else if level > 0.9 {
        Color::Red
    } else if level > 0.7 {
        Color::Yellow
    } else {
        Color::Green
    };
    Gauge::default()
        .block(Block::bordered().title(format!(" {title} ")))
        .gauge_style(Style::default().fg(colour))
        .ratio(f64::from(level).clamp(0.0, 1.0))
        .label(label)
}

fn draw_meters<E: AudioEngine>(frame: &mut Frame, area: Rect, desk: &Controller<E>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ])
        .split(area);
    let levels = desk.levels();
    let muted = desk.is_panic_muted();
    frame.render_widget(
        volume_gauge("music", desk.music_volume(), levels.music, muted),
        cols[0],
    );
    frame.render_widget(
        volume_gauge("effects", desk.effects_volume(), levels.effects, muted),
        cols[1],
    );

    let countdown = desk.countdown();
    let state = if countdown.is_running() { "running" } else { "stopped" };
    let timer = Paragraph::new(vec![
        Line::styled(countdown.text(), level_style(desk.countdown_level())),
        Line::from(state).dark_gray(),
    ])
    .alignment(Alignment::Center)
    .block(Block::bordered().title(" countdown "));
    frame.render_widget(timer, cols[2]);
}

fn draw_status<E: AudioEngine>(frame: &mut Frame, area: Rect, desk: &Controller<E>) {
    let status = desk.status();
    let p = Paragraph::new(Line::styled(status.message.clone(), severity_style(status.severity)))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        );
    frame.render_widget(p, area);
}

fn draw_metadata_popup<E: AudioEngine>(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    desk: &Controller<E>,
) {
    let popup = centered_rect_sized(72, 8, area);
    frame.render_widget(Clear, popup);

    let meta = match desk.playlist().get(app.selected) {
        Some(track) => format!(
            "Title: {}\nArtist: {}\nDuration: {}\nPath: {}",
            track.display_name,
            track.artist_or_unknown(),
            track
                .duration
                .map(|d| format_clock(d.as_secs_f64()))
                .unwrap_or_else(|| "-".to_string()),
            track.path.display()
        ),
        None => "No track selected".to_string(),
    };
    let p = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(p, popup);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_gets_a_welcome_instead_of_the_folder_error() {
        let missing = LibraryState::NeedsSetup("Music folder not found".into());
        let welcome = library_notice(&missing, true).unwrap_or_default();
        assert!(welcome.starts_with("Welcome"));
        assert!(!welcome.contains("not found"));

        let later = library_notice(&missing, false).unwrap_or_default();
        assert!(later.starts_with("Music folder not found"));

        assert_eq!(library_notice(&LibraryState::Ready, true), None);
        assert!(library_notice(&LibraryState::Empty, false).is_some());
    }

    #[test]
    fn controls_text_lists_every_binding() {
        let text = controls_text();
        assert_eq!(text.matches('[').count(), CONTROLS_MAP.len());
        assert!(text.starts_with("[space] play/pause"));
    }

    #[test]
    fn time_text_follows_configured_fields() {
        let text = TimeText {
            elapsed: "1:00".into(),
            total: "3:00".into(),
            remaining: "2:00".into(),
        };
        let mut ui = UiSettings::default();
        assert_eq!(
            now_playing_time_text(&text, &ui).as_deref(),
            Some("1:00 / 3:00 / -2:00")
        );
        ui.now_playing_time_fields = vec![TimeField::Remaining];
        assert_eq!(now_playing_time_text(&text, &ui).as_deref(), Some("-2:00"));
        ui.now_playing_time_fields.clear();
        assert_eq!(now_playing_time_text(&text, &ui), None);
    }

    #[test]
    fn list_window_keeps_selection_centred() {
        assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
        assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
        assert_eq!(visible_window(100, 10, 98), (90, 100, 8));
    }

    #[test]
    fn popup_fits_inside_small_areas() {
        let r = Rect::new(0, 0, 20, 6);
        let popup = centered_rect_sized(72, 8, r);
        assert!(popup.width <= 18);
        assert!(popup.height <= 4);
    }
}
