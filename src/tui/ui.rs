use ratatui::{prelude::*, widgets::*};

use crate::{
    core::{registry::PortSelection, OutputSink, Severity, SubmitController},
    tui::app::{App, Focus},
};

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default()
            .fg(Color::Rgb(255, 140, 0))
            .add_modifier(Modifier::BOLD),
        Severity::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Info => Style::default().fg(Color::Blue),
        Severity::Success => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Severity::Plain => Style::default(),
    }
}

fn log_lines(sink: &OutputSink) -> Vec<Line<'_>> {
    sink.rows()
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|segment| Span::styled(segment.text, severity_style(segment.severity)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Plain);
    if focused {
        block.border_style(
            Style::default()
                .fg(Color::Rgb(0, 150, 0))
                .add_modifier(Modifier::BOLD),
        )
    } else {
        block
    }
}

fn port_line(selection: &PortSelection) -> Line<'_> {
    let value = if selection.selected.is_empty() {
        Span::styled("<none>", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(selection.selected.as_str())
    };
    Line::from(vec![Span::raw("Port:  "), value])
}

fn status_line(controller: &SubmitController, key: &str) -> Line<'static> {
    if controller.is_submit_enabled() {
        Line::from(Span::styled(
            format!("[{key}] ready"),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            "running...".to_string(),
            Style::default().fg(Color::Yellow),
        ))
    }
}

fn render_log(f: &mut Frame, area: Rect, sink: &OutputSink) {
    let lines = log_lines(sink);
    let block = Block::default().borders(Borders::TOP).title(" Output ");
    let visible = block.inner(area).height as usize;
    let offset = lines.len().saturating_sub(visible) as u16;
    f.render_widget(Paragraph::new(lines).block(block).scroll((offset, 0)), area);
}

fn render_flash(f: &mut Frame, area: Rect, app: &App) {
    let block = pane_block("Firmware", app.focus == Focus::Flash);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(Paragraph::new(port_line(app.bench.flash_ports())), rows[0]);

    let file = match &app.path_input {
        Some(input) => Line::from(vec![
            Span::raw("File:  "),
            Span::styled(
                format!("{input}_"),
                Style::default().add_modifier(Modifier::REVERSED),
            ),
        ]),
        None => Line::from(vec![
            Span::raw("File:  "),
            match app.bench.flash_image() {
                Some(path) => Span::raw(path.display().to_string()),
                None => Span::styled("<none>", Style::default().fg(Color::DarkGray)),
            },
        ]),
    };
    f.render_widget(Paragraph::new(file), rows[1]);
    f.render_widget(Paragraph::new(status_line(app.bench.flash(), "F5")), rows[2]);
    render_log(f, rows[3], app.bench.flash().sink());
}

fn render_test(f: &mut Frame, area: Rect, app: &App) {
    let block = pane_block("Functional test", app.focus == Focus::Test);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(Paragraph::new(port_line(app.bench.test_ports())), rows[0]);
    f.render_widget(Paragraph::new(status_line(app.bench.test(), "F6")), rows[1]);
    render_log(f, rows[2], app.bench.test().sink());
}

pub fn render_ui(f: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Min(0),
            Constraint::Length(1), // help
        ])
        .split(f.area());

    let title = Paragraph::new("Probe Bench")
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Rgb(0, 150, 0))
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(title, main_chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);
    render_flash(f, panes[0], app);
    render_test(f, panes[1], app);

    let help = if app.path_input.is_some() {
        "Type the .hex path  Enter: confirm  Esc: cancel"
    } else {
        "Tab: switch pane  Up/Down: port  o: firmware file  Enter/F5/F6: run  q: quit"
    };
    f.render_widget(
        Paragraph::new(help)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray)),
        main_chunks[2],
    );
}
