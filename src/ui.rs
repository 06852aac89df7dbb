use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::App;
use crate::notifier::Alert;
use crate::state::restore_flow::DetailView;
use crate::types::{ConflictResolution, Outcome, RestoreState, Severity, Theme};

const ALERT_ROWS: u16 = 3;

struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    highlight_bg: Color,
    border: Color,
}

// Nord-ish dark palette and its light counterpart
const DARK: Palette = Palette {
    fg: Color::Rgb(216, 222, 233),
    bg: Color::Rgb(46, 52, 64),
    accent: Color::Rgb(136, 192, 208),
    success: Color::Rgb(163, 190, 140),
    warning: Color::Rgb(235, 203, 139),
    danger: Color::Rgb(191, 97, 106),
    highlight_bg: Color::Rgb(59, 66, 82),
    border: Color::Rgb(76, 86, 106),
};

const LIGHT: Palette = Palette {
    fg: Color::Rgb(46, 52, 64),
    bg: Color::Rgb(236, 239, 244),
    accent: Color::Rgb(94, 129, 172),
    success: Color::Rgb(88, 129, 87),
    warning: Color::Rgb(176, 122, 20),
    danger: Color::Rgb(168, 50, 60),
    highlight_bg: Color::Rgb(216, 222, 233),
    border: Color::Rgb(129, 161, 193),
};

fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    app.initialize().await;
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.process_pending_events();
        terminal.draw(|f| ui(f, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_normal_input(&mut app, key.code, key.modifiers).await?;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick(Instant::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

pub async fn handle_normal_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
    if key == KeyCode::Char('q')
        || (key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL))
    {
        app.should_quit = true;
        return Ok(());
    }

    if app.show_help {
        if matches!(key, KeyCode::Char('h') | KeyCode::Esc) {
            app.toggle_help();
        }
        return Ok(());
    }

    if app.state() == RestoreState::Confirming {
        match key {
            KeyCode::Char(' ') => app.toggle_acknowledge(),
            KeyCode::Enter => {
                app.confirm_restore();
            }
            KeyCode::Esc => app.cancel_confirmation(),
            _ => {}
        }
        return Ok(());
    }

    if app.has_pending_conflicts() {
        match key {
            KeyCode::Char('1') => app.resolve_conflict(ConflictResolution::KeepExisting),
            KeyCode::Char('2') => app.resolve_conflict(ConflictResolution::UseBackup),
            KeyCode::Char('3') => app.resolve_conflict(ConflictResolution::KeepBoth),
            KeyCode::Char('a') => app.toggle_conflict_apply_to_all(),
            KeyCode::Char('x') => app.dismiss_alert(),
            _ => {}
        }
        return Ok(());
    }

    match key {
        KeyCode::Esc | KeyCode::Char('x') => app.dismiss_alert(),
        KeyCode::Char('h') => app.toggle_help(),
        KeyCode::Up => app.move_selection_up(),
        KeyCode::Down => app.move_selection_down(),
        KeyCode::Enter => app.select_current_version(),
        KeyCode::Char('r') => {
            app.request_restore();
        }
        KeyCode::Char('b') => app.toggle_backup_first(),
        KeyCode::Char('d') => app.toggle_restore_dot_files(),
        KeyCode::Char('c') => app.cycle_conflict_resolution(),
        KeyCode::Char('a') => app.toggle_apply_to_all(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('R') => app.refresh_versions(),
        _ => {}
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let p = palette(app.theme);
    f.render_widget(Block::default().style(Style::default().bg(p.bg)), f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(ALERT_ROWS + 2),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, main_chunks[0], app);
    render_content(f, main_chunks[1], app);
    render_alerts(f, main_chunks[2], app);
    render_footer(f, main_chunks[3], app);

    if app.controller.is_busy() {
        render_loading(f, app, "Restoring backup...");
    }
    if app.state() == RestoreState::Confirming {
        render_restore_warning_popup(f, app);
    }
    if app.has_pending_conflicts() {
        render_conflict_popup(f, app);
    }
    if app.show_help {
        render_help_popup(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let title = if app.config.dry_run {
        format!(" Restore {} - DRY RUN MODE ", app.controller.app_name())
    } else {
        format!(" Restore {} ", app.controller.app_name())
    };

    let subtitle = match app.state() {
        RestoreState::Idle => "Select a backup version",
        RestoreState::Selected => "Review the version and press [r] to restore",
        RestoreState::Confirming => "Confirm restoration",
        RestoreState::Submitting => "Restoring...",
        RestoreState::Completed(Outcome::Succeeded) => "Restore completed",
        RestoreState::Completed(Outcome::Failed) => "Restore failed - adjust options and retry",
    };

    let header_block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(if app.config.dry_run {
            Style::default().fg(p.warning).bg(p.bg)
        } else {
            Style::default().fg(p.fg).bg(p.bg)
        });

    let header_content = Paragraph::new(subtitle)
        .style(Style::default().fg(p.accent))
        .alignment(Alignment::Center)
        .block(header_block);

    f.render_widget(header_content, area);
}

fn render_content(f: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    render_version_list(f, columns[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(columns[1]);

    render_version_details(f, right[0], app);
    render_options(f, right[1], app);
}

fn render_version_list(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let title = format!("Backup Versions ({})", app.versions.order().label());

    if app.loading {
        let loading = Paragraph::new("Loading backup versions...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(p.warning))
            .block(rounded_block(&title, p.accent));
        f.render_widget(loading, area);
        return;
    }

    let selected_id = app.controller.selection().map(|v| v.id.as_str());
    let items: Vec<ListItem> = app
        .versions
        .versions()
        .iter()
        .enumerate()
        .map(|(i, version)| {
            let marker = if Some(version.id.as_str()) == selected_id {
                "● "
            } else {
                "  "
            };
            let style = if i == app.versions.cursor() {
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.fg)
            };
            ListItem::new(format!(
                "{}{} | {}",
                marker,
                version.display_timestamp(),
                version.size
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items)
        .block(rounded_block(&title, p.accent))
        .highlight_style(Style::default().bg(p.highlight_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("► ");

    let mut state = ListState::default();
    if !app.versions.is_empty() {
        state.select(Some(app.versions.cursor()));
    }

    f.render_stateful_widget(list, area, &mut state);
}

fn render_version_details(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let label = Style::default().fg(p.accent).add_modifier(Modifier::BOLD);

    let mut lines = match app.controller.detail() {
        DetailView::Hidden => vec![Line::from(Span::styled(
            "Select a version and press [Enter] to see its details.",
            Style::default().fg(p.border),
        ))],
        DetailView::Loading(backup_id) => vec![Line::from(Span::styled(
            format!("Loading details for {}...", backup_id),
            Style::default().fg(p.warning),
        ))],
        DetailView::Loaded(detail) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Created: ", label),
                    Span::styled(detail.timestamp.clone(), Style::default().fg(p.fg)),
                ]),
                Line::from(vec![
                    Span::styled("Size:    ", label),
                    Span::styled(detail.size.to_string(), Style::default().fg(p.fg)),
                ]),
                Line::from(vec![
                    Span::styled("Notes:   ", label),
                    Span::styled(
                        detail.notes_or_placeholder().to_string(),
                        Style::default().fg(p.fg),
                    ),
                ]),
                Line::from(""),
                Line::from(Span::styled("Included paths:", label)),
            ];
            lines.extend(
                detail
                    .paths
                    .iter()
                    .map(|path| Line::from(Span::styled(format!("  • {}", path), Style::default().fg(p.fg)))),
            );
            lines
        }
    };

    if let Some(banner) = app.controller.restore_banner() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("✔ {}", banner),
            Style::default().fg(p.success).add_modifier(Modifier::BOLD),
        )));
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(rounded_block("Version Details", p.accent))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_options(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let options = app.controller.options();
    let check = |on: bool| if on { "[x]" } else { "[ ]" };

    let lines = vec![
        Line::from(format!(
            "{} [b] Back up current data before restoring",
            check(options.backup_first)
        )),
        Line::from(format!(
            "{} [d] Restore dot files",
            check(options.restore_dot_files)
        )),
        Line::from(format!(
            "    [c] On conflict: {}",
            options.conflict_resolution.label()
        )),
        Line::from(format!(
            "{} [a] Apply resolution to all conflicts",
            check(options.apply_to_all)
        )),
        Line::from(""),
        Line::from(Span::styled(
            if app.controller.can_request_restore() {
                "[r] Restore selected version"
            } else {
                "Restore unavailable"
            },
            Style::default().fg(if app.controller.can_request_restore() {
                p.success
            } else {
                p.border
            }),
        )),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(p.fg))
            .block(rounded_block("Restore Options", p.accent)),
        area,
    );
}

fn severity_color(p: &Palette, severity: Severity) -> Color {
    match severity {
        Severity::Info => p.accent,
        Severity::Success => p.success,
        Severity::Warning => p.warning,
        Severity::Danger => p.danger,
    }
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with an ellipsis.
fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn alert_line<'a>(alert: &Alert, p: &Palette, width: usize) -> Line<'a> {
    let color = severity_color(p, alert.severity);
    let tag = format!("[{}] ", alert.severity.label());
    let room = width.saturating_sub(tag.width());
    Line::from(vec![
        Span::styled(tag, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(truncate_to_width(&alert.message, room), Style::default().fg(color)),
    ])
}

fn render_alerts(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let alerts = app.controller.notifier().active();
    let width = area.width.saturating_sub(2) as usize;

    let lines: Vec<Line> = alerts
        .iter()
        .rev()
        .take(ALERT_ROWS as usize)
        .map(|alert| alert_line(alert, p, width))
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(rounded_block("Alerts", p.border)),
        area,
    );
}

fn render_loading(f: &mut Frame, app: &App, message: &str) {
    let p = palette(app.theme);
    let popup_area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, popup_area);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(p.warning).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(rounded_block("Please wait", p.warning))
        .style(Style::default().bg(p.bg)),
        popup_area,
    );
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let p = palette(app.theme);
    let help_text = if app.show_help {
        " [h/Esc] Close help "
    } else {
        match app.state() {
            RestoreState::Confirming => " [Space] I understand | [Enter] Restore | [Esc] Cancel ",
            RestoreState::Submitting => " Restore in progress... | [q] Quit ",
            _ if app.has_pending_conflicts() => {
                " [1] Keep existing | [2] Use backup | [3] Keep both | [a] Apply to all "
            }
            _ => " [↑/↓] Navigate | [Enter] Select | [r] Restore | [s] Sort | [R] Refresh | [t] Theme | [h] Help | [q] Quit ",
        }
    };

    f.render_widget(
        Paragraph::new(help_text)
            .block(
                Block::default()
                    .title("Controls")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(p.border)),
            )
            .alignment(Alignment::Center)
            .style(Style::default().fg(p.fg)),
        area,
    );
}

fn render_restore_warning_popup(f: &mut Frame, app: &App) {
    let Some(version) = app.controller.selection() else {
        return;
    };
    let popup_area = centered_rect(70, 50, f.area());
    f.render_widget(Clear, popup_area);

    let warning_bg = Color::Rgb(139, 0, 0);
    let white = Style::default().fg(Color::White);
    let strong = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let gate = if app.controller.gate() { "[x]" } else { "[ ]" };
    let confirm_style = if app.controller.confirm_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut text = vec![
        Line::from(Span::styled(
            "⚠️  RESTORE WILL OVERWRITE CURRENT DATA  ⚠️",
            strong.add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Application: ", white.add_modifier(Modifier::BOLD)),
            Span::styled(app.controller.app_name().to_string(), strong),
        ]),
        Line::from(vec![
            Span::styled("Backup from: ", white.add_modifier(Modifier::BOLD)),
            Span::styled(version.display_timestamp(), strong),
        ]),
    ];

    if let Some(options) = app.controller.attempt_options() {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            format!(
                "Back up first: {} | Dot files: {} | Conflicts: {}{}",
                if options.backup_first { "yes" } else { "no" },
                if options.restore_dot_files { "yes" } else { "no" },
                options.conflict_resolution.label(),
                if options.apply_to_all { " (all)" } else { "" }
            ),
            white,
        )));
    }

    text.extend([
        Line::from(""),
        Line::from(Span::styled(
            "Existing files of this application may be replaced. This cannot be undone.",
            white,
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} [Space] I understand the risk", gate),
            white.add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Enter] RESTORE  ", confirm_style),
            Span::styled("[Esc] ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled("CANCEL", white),
        ]),
    ]);

    let block = Block::default()
        .title(" Confirm Restore ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .style(Style::default().fg(Color::White).bg(warning_bg));

    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn render_conflict_popup(f: &mut Frame, app: &App) {
    let p = palette(app.theme);
    let conflicts = app.controller.conflicts();
    let Some(path) = conflicts.current() else {
        return;
    };
    let popup_area = centered_rect(70, 40, f.area());
    f.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(Span::styled(
            "A file already exists at the restore destination:",
            Style::default().fg(p.fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            path.to_string(),
            Style::default().fg(p.warning).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} conflict(s) remaining", conflicts.remaining()),
            Style::default().fg(p.border),
        )),
        Line::from(""),
        Line::from(format!(
            "[1] {}   [2] {}   [3] {}",
            ConflictResolution::KeepExisting.label(),
            ConflictResolution::UseBackup.label(),
            ConflictResolution::KeepBoth.label()
        )),
        Line::from(format!(
            "{} [a] Apply to all remaining conflicts",
            if app.conflict_apply_to_all { "[x]" } else { "[ ]" }
        )),
    ];

    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(" File Conflict ")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .style(Style::default().fg(p.warning).bg(p.bg)),
            ),
        popup_area,
    );
}

fn render_help_popup(f: &mut Frame, app: &App) {
    let p = palette(app.theme);
    let popup_area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, popup_area);

    let heading = Style::default().fg(p.warning).add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled(
            "HELP - Restore Panel",
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Navigation:", heading)),
        Line::from("  ↑/↓       Move through backup versions"),
        Line::from("  Enter     Select version (or restore inside the confirmation)"),
        Line::from("  Esc/X     Dismiss newest alert, close popups"),
        Line::from(""),
        Line::from(Span::styled("Restore:", heading)),
        Line::from("  R         Restore selected version"),
        Line::from("  Space     Acknowledge the overwrite warning"),
        Line::from("  B / D     Toggle back-up-first / dot files"),
        Line::from("  C / A     Cycle conflict resolution / apply to all"),
        Line::from(""),
        Line::from(Span::styled("View:", heading)),
        Line::from("  S         Cycle sort order"),
        Line::from("  Shift+R   Reload backup versions"),
        Line::from("  T         Toggle light/dark theme"),
        Line::from("  H         Toggle this help screen"),
        Line::from("  Q         Quit application"),
        Line::from(""),
        Line::from(Span::styled("Press H or Esc to close this help", Style::default().fg(p.warning))),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(p.fg).bg(p.bg));

    f.render_widget(help, popup_area);
}

fn rounded_block(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title.to_string())
        .style(Style::default().fg(color))
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::MockRestoreTransport;
    use crate::types::{BackupVersion, Size};
    use ratatui::backend::TestBackend;
    use reqwest::Url;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn create_test_app() -> App {
        let config = Config {
            server_url: Url::parse("http://localhost:5000").unwrap(),
            app_id: "firefox".to_string(),
            app_name: "Firefox".to_string(),
            alert_lifetime: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            log_dir: PathBuf::from("./logs"),
            theme: Theme::Dark,
            dry_run: false,
            settings_file: None,
        };
        App::new(config, Arc::new(MockRestoreTransport::new()))
    }

    fn version(id: &str, timestamp: &str) -> BackupVersion {
        BackupVersion {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            size: Size::Bytes(2 * 1024 * 1024),
            notes: None,
            paths: Vec::new(),
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_handle_normal_input_toggle_help() {
        let mut app = create_test_app();
        assert!(!app.show_help);

        handle_normal_input(&mut app, KeyCode::Char('h'), KeyModifiers::NONE)
            .await
            .unwrap();
        assert!(app.show_help);

        handle_normal_input(&mut app, KeyCode::Esc, KeyModifiers::NONE)
            .await
            .unwrap();
        assert!(!app.show_help);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = create_test_app();
        handle_normal_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL)
            .await
            .unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_option_keys_edit_form() {
        let mut app = create_test_app();
        let before = app.controller.options().clone();

        for key in ['b', 'd', 'c', 'a'] {
            handle_normal_input(&mut app, KeyCode::Char(key), KeyModifiers::NONE)
                .await
                .unwrap();
        }

        let after = app.controller.options();
        assert_eq!(after.backup_first, !before.backup_first);
        assert_eq!(after.restore_dot_files, !before.restore_dot_files);
        assert_eq!(after.conflict_resolution, ConflictResolution::UseBackup);
        assert_eq!(after.apply_to_all, !before.apply_to_all);
    }

    #[tokio::test]
    async fn test_confirmation_keys() {
        let mut app = create_test_app();
        app.controller
            .select_version(version("v1", "20240101-120000"))
            .unwrap();

        handle_normal_input(&mut app, KeyCode::Char('r'), KeyModifiers::NONE)
            .await
            .unwrap();
        assert_eq!(app.state(), RestoreState::Confirming);

        // Enter is inert until the gate is ticked
        handle_normal_input(&mut app, KeyCode::Enter, KeyModifiers::NONE)
            .await
            .unwrap();
        assert_eq!(app.state(), RestoreState::Confirming);

        handle_normal_input(&mut app, KeyCode::Char(' '), KeyModifiers::NONE)
            .await
            .unwrap();
        assert!(app.controller.confirm_enabled());

        handle_normal_input(&mut app, KeyCode::Esc, KeyModifiers::NONE)
            .await
            .unwrap();
        assert_eq!(app.state(), RestoreState::Selected);
        assert!(!app.controller.gate());
    }

    #[test]
    fn test_confirmation_popup_shows_app_and_timestamp() {
        let mut app = create_test_app();
        app.controller
            .select_version(version("v1", "20240101-120000"))
            .unwrap();
        app.controller.request_restore().unwrap();

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Firefox"));
        assert!(screen.contains("January 01, 2024 at 12:00 PM"));
        assert!(screen.contains("I understand the risk"));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a long message", 6), "a lon…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }
}
