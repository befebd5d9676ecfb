//! TUI Dashboard using ratatui.

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;
use tunnel_core::{Health, HealthSnapshot, LogSeverity, ProcessHealth};

use crate::input::{Field, FormOutcome, RouteForm};
use crate::state::{DashboardState, NoticeLevel};

const EDGE_ORANGE: Color = Color::Rgb(243, 128, 32);

/// Operator request raised from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    /// Stop a running tunnel, start a stopped one
    Toggle,
    Restart,
    AddRoute { hostname: String, service: String },
    RemoveRoute { hostname: String },
}

/// Local interaction state, never shared with the controller.
#[derive(Debug, Default)]
struct View {
    selected: usize,
    form: Option<RouteForm>,
    tick: usize,
}

/// TUI Dashboard.
pub struct Dashboard {
    refresh_ms: u64,
}

impl Dashboard {
    /// Create a new dashboard.
    pub fn new(refresh_ms: u64) -> Self {
        Self { refresh_ms }
    }

    /// Run the dashboard until the operator quits.
    ///
    /// `get_state` is called once per frame and must not block; actions go
    /// out through `actions` and are never awaited here.
    pub fn run<F>(
        &self,
        mut get_state: F,
        actions: UnboundedSender<DashboardAction>,
    ) -> io::Result<()>
    where
        F: FnMut() -> DashboardState,
    {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal, &mut get_state, &actions);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    fn run_loop<B, F>(
        &self,
        terminal: &mut Terminal<B>,
        get_state: &mut F,
        actions: &UnboundedSender<DashboardAction>,
    ) -> io::Result<()>
    where
        B: Backend,
        F: FnMut() -> DashboardState,
    {
        let mut view = View::default();
        loop {
            let state = get_state();
            view.selected = view.selected.min(state.routes.len().saturating_sub(1));
            terminal.draw(|f| render(f, &state, &view))?;
            view.tick = view.tick.wrapping_add(1);

            if event::poll(Duration::from_millis(self.refresh_ms))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && handle_key(&mut view, key, &state, actions) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Apply a key press. Returns true to quit.
fn handle_key(
    view: &mut View,
    key: KeyEvent,
    state: &DashboardState,
    actions: &UnboundedSender<DashboardAction>,
) -> bool {
    let send = |action: DashboardAction| {
        if actions.send(action).is_err() {
            warn!("Dashboard controller is gone, action dropped");
        }
    };

    if let Some(form) = view.form.as_mut() {
        match form.handle_key(key) {
            FormOutcome::Editing => {}
            FormOutcome::Cancel => view.form = None,
            FormOutcome::Submit { hostname, service } => {
                send(DashboardAction::AddRoute { hostname, service });
                view.form = None;
            }
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('s') => send(DashboardAction::Toggle),
        KeyCode::Char('r') => send(DashboardAction::Restart),
        KeyCode::Char('a') => view.form = Some(RouteForm::new()),
        KeyCode::Char('d') => {
            if let Some(route) = state.routes.get(view.selected) {
                send(DashboardAction::RemoveRoute {
                    hostname: route.display_hostname().to_string(),
                });
            }
        }
        KeyCode::Up => view.selected = view.selected.saturating_sub(1),
        KeyCode::Down => {
            if view.selected + 1 < state.routes.len() {
                view.selected += 1;
            }
        }
        _ => {}
    }
    false
}

fn render(frame: &mut Frame, state: &DashboardState, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(6), // Topology
            Constraint::Length(3), // Details
            Constraint::Min(8),    // Routes and log
            Constraint::Length(5), // Notices
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    render_topology(frame, chunks[1], &state.health, view.tick);
    render_details(frame, chunks[2], state);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    render_routes(frame, middle[0], state, view);
    render_log(frame, middle[1], &state.health);
    render_notices(frame, chunks[4], state);

    if let Some(form) = &view.form {
        render_form(frame, form);
    }
}

fn health_color(health: Health) -> Color {
    match health {
        Health::Unknown => Color::Gray,
        Health::Ok => Color::Green,
        Health::Error => Color::Red,
    }
}

fn process_color(health: ProcessHealth) -> Color {
    match health {
        ProcessHealth::Unknown => Color::Gray,
        ProcessHealth::Ok => Color::Green,
        ProcessHealth::Stopped => Color::Yellow,
        ProcessHealth::Error => Color::Red,
    }
}

fn severity_color(severity: LogSeverity) -> Color {
    match severity {
        LogSeverity::Ok => Color::Green,
        LogSeverity::Warning => Color::Yellow,
        LogSeverity::Error => Color::Red,
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let status = match &state.busy {
        Some(op) => Span::styled(op.clone(), Style::default().fg(Color::Yellow)),
        None => Span::styled(
            state.health.process_label(),
            Style::default().fg(process_color(state.health.process)),
        ),
    };

    let header = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "TunnelFlare",
            Style::default().fg(EDGE_ORANGE).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        status,
        Span::raw(" | "),
        Span::raw(Local::now().format("%H:%M:%S").to_string()),
        Span::styled(
            " | q quit  s start/stop  r restart  a add  d remove",
            Style::default().fg(Color::DarkGray),
        ),
    ])])
    .block(Block::default().borders(Borders::ALL).title("Tunnel"));
    frame.render_widget(header, area);
}

/// Connector line with a moving marker while traffic can flow.
fn connector(tick: usize, live: bool, width: u16) -> Line<'static> {
    let width = usize::from(width.max(1));
    if !live {
        return Line::styled("╌".repeat(width), Style::default().fg(Color::DarkGray));
    }
    let pos = (tick % 4) * 2 % width;
    let line: String = (0..width)
        .map(|i| if i == pos { '►' } else { '─' })
        .collect();
    Line::styled(line, Style::default().fg(Color::Green))
}

fn render_topology(frame: &mut Frame, area: Rect, health: &HealthSnapshot, tick: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(EDGE_ORANGE))
        .title("Network Diagnostics");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(2, 13),
            Constraint::Ratio(1, 13),
            Constraint::Ratio(2, 13),
            Constraint::Ratio(1, 13),
            Constraint::Ratio(2, 13),
            Constraint::Ratio(1, 13),
            Constraint::Ratio(2, 13),
            Constraint::Ratio(1, 13),
            Constraint::Ratio(2, 13),
        ])
        .split(inner);

    let live = health.is_live();
    let downstream_color = if matches!(health.process, ProcessHealth::Stopped | ProcessHealth::Error) {
        Color::Yellow
    } else {
        health_color(health.downstream)
    };

    let nodes = [
        ("Client", "You", Color::Cyan),
        ("Internet", health.upstream_label(), health_color(health.upstream)),
        ("Edge", "Anycast", EDGE_ORANGE),
        ("Tunnel", health.process_label(), process_color(health.process)),
        ("App", health.downstream_label(), downstream_color),
    ];

    for (i, (name, label, color)) in nodes.into_iter().enumerate() {
        let node = Paragraph::new(vec![
            Line::styled(name, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Line::styled(label, Style::default().fg(color)),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        frame.render_widget(node, columns[i * 2]);

        if let Some(gap) = columns.get(i * 2 + 1) {
            let wire = Paragraph::new(vec![Line::raw(""), connector(tick, live, gap.width)]);
            frame.render_widget(wire, *gap);
        }
    }
}

fn render_details(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let network = &state.health.network;
    let value = |v: Option<&str>| v.unwrap_or("Unavailable").to_string();

    let details = Paragraph::new(Line::from(vec![
        Span::raw("Public IP: "),
        Span::styled(value(network.public_ip.as_deref()), Style::default().fg(Color::White)),
        Span::raw("  |  Tunnel: "),
        Span::styled(value(state.tunnel_id.as_deref()), Style::default().fg(Color::White)),
        Span::raw("  |  Local IP: "),
        Span::styled(value(network.local_ip.as_deref()), Style::default().fg(Color::White)),
        Span::raw("  |  PID: "),
        Span::raw(
            state
                .health
                .pid
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(details, area);
}

fn render_routes(frame: &mut Frame, area: Rect, state: &DashboardState, view: &View) {
    let header_cells = ["Hostname", "Service", "Status"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let live = state.health.is_live();
    let rows = state.routes.iter().map(|route| {
        let (status, color) = if live {
            ("Active", Color::Green)
        } else {
            ("Inactive", Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(route.display_hostname().to_string()),
            Cell::from(route.service.clone()),
            Cell::from(status).style(Style::default().fg(color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("> ")
    .block(Block::default().borders(Borders::ALL).title("Routes"));

    let mut table_state = TableState::default();
    if !state.routes.is_empty() {
        table_state.select(Some(view.selected));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_log(frame: &mut Frame, area: Rect, health: &HealthSnapshot) {
    let visible = usize::from(area.height.saturating_sub(2));
    let skip = health.recent_log.len().saturating_sub(visible);
    let lines: Vec<Line> = health.recent_log[skip..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();

    let title = Line::from(vec![
        Span::raw("Log "),
        Span::styled(
            health.log_label(),
            Style::default().fg(severity_color(health.log_severity)),
        ),
    ]);
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

fn render_notices(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let visible = usize::from(area.height.saturating_sub(2));
    let notices: Vec<Line> = state
        .notices
        .iter()
        .rev()
        .take(visible)
        .map(|n| {
            let color = match n.level {
                NoticeLevel::Info => Color::White,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(n.at.format("%H:%M:%S ").to_string(), Style::default().fg(Color::DarkGray)),
                Span::styled(n.text.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    let paragraph =
        Paragraph::new(notices).block(Block::default().borders(Borders::ALL).title("Notifications"));
    frame.render_widget(paragraph, area);
}

fn render_form(frame: &mut Frame, form: &RouteForm) {
    let area = centered(frame.area(), 60, 8);
    frame.render_widget(Clear, area);

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::raw(format!("{:<10}", label)),
            Span::styled(format!("{}{}", value, cursor), style),
        ])
    };

    let mut lines = vec![
        field("Hostname", &form.hostname, form.focus == Field::Hostname),
        field("Service", &form.service, form.focus == Field::Service),
        Line::raw(""),
    ];
    match &form.error {
        Some(error) => lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red))),
        None => lines.push(Line::styled(
            "Enter next/save  Tab switch  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(EDGE_ORANGE))
            .title("Add Route"),
    );
    frame.render_widget(popup, area);
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;
    use tunnel_core::{IngressRule, NetworkInfo};

    use crate::state::Notice;

    fn sample_state() -> DashboardState {
        let health = HealthSnapshot {
            upstream: Health::Ok,
            process: ProcessHealth::Ok,
            downstream: Health::Error,
            log_severity: LogSeverity::Warning,
            pid: Some(4242),
            recent_log: vec!["INF Registered tunnel connection".to_string()],
            network: NetworkInfo {
                public_ip: Some("203.0.113.7".to_string()),
                local_ip: Some("192.168.1.20".to_string()),
            },
            ..Default::default()
        };

        let mut state = DashboardState {
            health,
            tunnel_id: Some("6ff42ae2...".to_string()),
            routes: vec![
                IngressRule::route("app.example.com", "http://localhost:8000"),
                IngressRule::route("api.example.com", "http://localhost:9000"),
            ],
            ..Default::default()
        };
        state.push_notice(Notice::info("Tunnel restarted"));
        state
    }

    fn draw(state: &DashboardState, view: &View) -> String {
        let backend = TestBackend::new(140, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, state, view)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_render_panels() {
        let content = draw(&sample_state(), &View::default());

        assert!(content.contains("TunnelFlare"));
        assert!(content.contains("Connected"));
        assert!(content.contains("Active"));
        assert!(content.contains("Unreachable"));
        assert!(content.contains("203.0.113.7"));
        assert!(content.contains("6ff42ae2..."));
        assert!(content.contains("192.168.1.20"));
        assert!(content.contains("app.example.com"));
        assert!(content.contains("http://localhost:9000"));
        assert!(content.contains("Registered tunnel connection"));
        assert!(content.contains("Warnings"));
        assert!(content.contains("Tunnel restarted"));
    }

    #[test]
    fn test_render_before_first_reading() {
        let content = draw(&DashboardState::default(), &View::default());
        assert!(content.contains("Checking..."));
        assert!(content.contains("Unavailable"));
    }

    #[test]
    fn test_render_stopped_tunnel_isolates_app() {
        let mut state = sample_state();
        state.health.process = ProcessHealth::Stopped;
        state.health.downstream = Health::Ok;

        let content = draw(&state, &View::default());
        assert!(content.contains("Stopped"));
        assert!(content.contains("Isolated"));
        assert!(content.contains("Inactive"));
    }

    #[test]
    fn test_render_form() {
        let view = View {
            form: Some(RouteForm::new()),
            ..Default::default()
        };
        let content = draw(&sample_state(), &view);
        assert!(content.contains("Add Route"));
        assert!(content.contains("http://localhost:"));
    }

    #[test]
    fn test_render_tiny_terminal() {
        let backend = TestBackend::new(20, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render(f, &sample_state(), &View::default()))
            .unwrap();
    }

    #[test]
    fn test_keys_send_actions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = sample_state();
        let mut view = View::default();

        assert!(!handle_key(&mut view, key(KeyCode::Char('s')), &state, &tx));
        assert!(!handle_key(&mut view, key(KeyCode::Char('r')), &state, &tx));
        handle_key(&mut view, key(KeyCode::Down), &state, &tx);
        handle_key(&mut view, key(KeyCode::Down), &state, &tx);
        assert_eq!(view.selected, 1);
        handle_key(&mut view, key(KeyCode::Char('d')), &state, &tx);

        assert_eq!(rx.try_recv().unwrap(), DashboardAction::Toggle);
        assert_eq!(rx.try_recv().unwrap(), DashboardAction::Restart);
        assert_eq!(
            rx.try_recv().unwrap(),
            DashboardAction::RemoveRoute {
                hostname: "api.example.com".to_string()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_form_submits_add_route() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let state = sample_state();
        let mut view = View::default();

        handle_key(&mut view, key(KeyCode::Char('a')), &state, &tx);
        assert!(view.form.is_some());
        // Keys go to the form while it is open.
        for c in "new.example.com".chars() {
            assert!(!handle_key(&mut view, key(KeyCode::Char(c)), &state, &tx));
        }
        handle_key(&mut view, key(KeyCode::Enter), &state, &tx);
        for c in "3000".chars() {
            handle_key(&mut view, key(KeyCode::Char(c)), &state, &tx);
        }
        handle_key(&mut view, key(KeyCode::Enter), &state, &tx);

        assert!(view.form.is_none());
        assert_eq!(
            rx.try_recv().unwrap(),
            DashboardAction::AddRoute {
                hostname: "new.example.com".to_string(),
                service: "http://localhost:3000".to_string(),
            }
        );
    }

    #[test]
    fn test_quit_keys() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let state = DashboardState::default();
        let mut view = View::default();

        assert!(handle_key(&mut view, key(KeyCode::Char('q')), &state, &tx));
        assert!(handle_key(&mut view, key(KeyCode::Esc), &state, &tx));
        assert!(handle_key(
            &mut view,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &state,
            &tx
        ));

        // Esc only closes the form.
        view.form = Some(RouteForm::new());
        assert!(!handle_key(&mut view, key(KeyCode::Esc), &state, &tx));
        assert!(view.form.is_none());
    }

    #[test]
    fn test_remove_without_routes_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = View::default();
        handle_key(&mut view, key(KeyCode::Char('d')), &DashboardState::default(), &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_connector_animates_only_when_live() {
        let moving: Vec<String> = (0..4)
            .map(|tick| connector(tick, true, 8).to_string())
            .collect();
        assert_ne!(moving[0], moving[1]);
        assert_eq!(connector(0, false, 8).to_string(), connector(3, false, 8).to_string());
    }
}
