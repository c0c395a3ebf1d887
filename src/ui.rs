use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::time::Duration;

use crate::config::STALE_AFTER;
use crate::data::{ChainMetrics, ConnectionStatus};
use crate::heatmap::{DAY_NAMES, DAYS, HOURS, HeatmapGrid};
use crate::regime::Regime;
use crate::rolling::{RollingWindow, WindowSummary};
use crate::snapshot::MarketSnapshot;

pub struct Dashboard {
    pub should_quit: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        Self { should_quit: false }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        metrics: &ChainMetrics,
        snapshot: Option<&MarketSnapshot>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // connection
                Constraint::Length(5),  // regime banner
                Constraint::Length(3),  // totals
                Constraint::Length(6),  // rolling comparison
                Constraint::Length(3),  // regime mix
                Constraint::Length(10), // heatmap
                Constraint::Length(3),  // chains
                Constraint::Min(6),     // recent blocks
                Constraint::Length(3),  // help
            ])
            .split(frame.area());

        self.render_connection_status(frame, chunks[0], metrics);
        self.render_regime_banner(frame, chunks[1], snapshot);
        self.render_totals(frame, chunks[2], snapshot);
        self.render_rolling(frame, chunks[3], snapshot);
        self.render_regime_mix(frame, chunks[4], snapshot);
        self.render_heatmap(frame, chunks[5], snapshot);
        self.render_chains(frame, chunks[6], snapshot);
        self.render_recent_blocks(frame, chunks[7], snapshot);
        self.render_help(frame, chunks[8]);
    }

    fn render_connection_status(&self, frame: &mut Frame, area: Rect, metrics: &ChainMetrics) {
        let status_text = match &metrics.connection_status {
            ConnectionStatus::Connected => "Connected".to_string(),
            ConnectionStatus::Stale => "Stale".to_string(),
            ConnectionStatus::Disconnected => "Disconnected".to_string(),
            ConnectionStatus::Error(err) => format!("Error: {}", err),
        };

        let status_style = match &metrics.connection_status {
            ConnectionStatus::Connected => Style::default().fg(Color::Green),
            ConnectionStatus::Stale => Style::default().fg(Color::Yellow),
            ConnectionStatus::Disconnected | ConnectionStatus::Error(_) => {
                Style::default().fg(Color::Red)
            }
        };

        let elapsed = metrics.last_updated.elapsed();
        let last_update = if elapsed < Duration::from_secs(1) {
            "< 1s ago".to_string()
        } else {
            format!("{}s ago", elapsed.as_secs())
        };

        let chain_text = metrics
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let mut line_parts = vec![
            Span::styled("Status: ", Style::default()),
            Span::styled(&status_text, status_style),
            Span::styled(" | ", Style::default()),
            Span::styled("RPC: ", Style::default()),
            Span::styled(&metrics.rpc_url, Style::default().fg(Color::Cyan)),
            Span::styled(" | Chain: ", Style::default()),
            Span::styled(chain_text, Style::default().fg(Color::Blue)),
            Span::styled(" | Updated: ", Style::default()),
            Span::styled(last_update, Style::default().fg(Color::Yellow)),
        ];

        if matches!(metrics.connection_status, ConnectionStatus::Stale) {
            line_parts.push(Span::styled(" | Stale > ", Style::default()));
            line_parts.push(Span::styled(
                format!("{}s", STALE_AFTER.as_secs()),
                Style::default().fg(Color::Yellow),
            ));
        }

        let paragraph = Paragraph::new(vec![Line::from(line_parts)])
            .block(Block::default().title("Connection").borders(Borders::ALL));

        frame.render_widget(paragraph, area);
    }

    fn render_regime_banner(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(latest) = snapshot.and_then(|s| s.latest.as_ref()) {
            lines.push(Line::from(vec![
                Span::styled("Regime: ", Style::default()),
                Span::styled(
                    latest.regime.label(),
                    regime_style(latest.regime).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  -  "),
                Span::styled(latest.regime.describe(), Style::default().fg(Color::Gray)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Target util: ", Style::default()),
                Span::styled(
                    format!("{:.1}%", latest.utilization_pct),
                    regime_style(latest.regime),
                ),
                Span::raw("  |  Saturation: "),
                Span::styled(
                    // Display-clamped; the raw index is unclamped.
                    format!("{:.1}%", latest.saturation_pct.min(100.0)),
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw("  |  "),
                Span::styled(
                    format!("{} blobs ({} KiB)", latest.blob_count, latest.blob_bytes / 1024),
                    Style::default().fg(Color::Cyan),
                ),
            ]));
            if let Some(snap) = snapshot {
                let mut parts = vec![
                    Span::styled("Capacity: ", Style::default()),
                    Span::styled(
                        format!(
                            "target {} / max {} blobs per block",
                            snap.params.target_blobs_per_block, snap.params.max_blobs_per_block
                        ),
                        Style::default().fg(Color::Blue),
                    ),
                ];
                if let Some(excess) = latest.excess_gas {
                    parts.push(Span::raw("  |  excess gas: "));
                    parts.push(Span::styled(
                        excess.to_string(),
                        Style::default().fg(Color::Gray),
                    ));
                }
                lines.push(Line::from(parts));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "(waiting for first block)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Blob Market").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_totals(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let content = if let Some(snap) = snapshot {
            let stats = &snap.stats;
            Line::from(vec![
                Span::styled("Blocks: ", Style::default()),
                Span::styled(stats.total_blocks.to_string(), Style::default().fg(Color::Green)),
                Span::raw("  |  Blobs: "),
                Span::styled(stats.total_blobs.to_string(), Style::default().fg(Color::Cyan)),
                Span::raw("  |  Blob txs: "),
                Span::styled(
                    stats.total_transactions.to_string(),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw("  |  Avg blobs/block: "),
                Span::styled(
                    format!("{:.2}", stats.avg_blobs_per_block),
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw("  |  Gas: "),
                Span::styled(
                    format!("{:.3} gwei", stats.latest_gas_price as f64 / 1e9),
                    Style::default().fg(Color::Blue),
                ),
            ])
        } else {
            Line::from(Span::styled("N/A", Style::default().fg(Color::DarkGray)))
        };

        let paragraph = Paragraph::new(vec![content])
            .block(Block::default().title("Totals").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_rolling(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(snap) = snapshot {
            for window in &snap.rolling.windows {
                lines.push(rolling_line(window));
            }
            let base = &snap.rolling.baseline;
            lines.push(Line::from(vec![
                Span::styled("7d  ", Style::default().fg(Color::Gray)),
                Span::raw(format!("blocks {:>6}", base.block_count)),
                Span::raw("  blobs/blk "),
                Span::styled(fmt_opt(base.avg_blobs_per_block, 2), Style::default().fg(Color::Cyan)),
                Span::raw("  gas "),
                Span::styled(fmt_gas(base.avg_gas_price), Style::default().fg(Color::Blue)),
                Span::raw("  (baseline)"),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                "N/A",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Rolling vs 7d baseline").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_regime_mix(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let day_summary: Option<&WindowSummary> = snapshot.and_then(|s| {
            s.rolling
                .windows
                .iter()
                .find(|w| w.spec.name == "24h")
                .map(|w| &w.summary)
        });

        let content = if let Some(summary) = day_summary {
            if summary.block_count == 0 {
                Line::from(Span::styled(
                    "(no blocks in the last 24h)",
                    Style::default().fg(Color::DarkGray),
                ))
            } else {
                let mut parts: Vec<Span> = Vec::new();
                for (regime, count) in summary.regime_counts.iter() {
                    if !parts.is_empty() {
                        parts.push(Span::raw("  "));
                    }
                    parts.push(Span::styled(
                        format!("{} {}", regime.label(), count),
                        regime_style(regime),
                    ));
                }
                if let Some(dominant) = summary.dominant_regime() {
                    parts.push(Span::raw("   mostly "));
                    parts.push(Span::styled(
                        dominant.label(),
                        regime_style(dominant).add_modifier(Modifier::BOLD),
                    ));
                }
                Line::from(parts)
            }
        } else {
            Line::from(Span::styled("N/A", Style::default().fg(Color::DarkGray)))
        };

        let paragraph = Paragraph::new(vec![content])
            .block(Block::default().title("Regime mix (24h)").borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_heatmap(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(grid) = snapshot.map(|s| &s.heatmap) {
            for day in 0..DAYS {
                let mut parts: Vec<Span> = vec![Span::styled(
                    format!("{} ", DAY_NAMES[day]),
                    Style::default().fg(Color::Gray),
                )];
                for hour in 0..HOURS {
                    parts.push(heatmap_cell_span(grid, day, hour));
                }
                lines.push(Line::from(parts));
            }
            if let Some(spread) = &grid.utilization_spread {
                lines.push(Line::from(vec![
                    Span::styled("util ", Style::default().fg(Color::Gray)),
                    Span::raw(format!(
                        "min {:.0}%  avg {:.0}%  max {:.0}%",
                        spread.min, spread.avg, spread.max
                    )),
                ]));
            } else {
                lines.push(Line::from(Span::styled(
                    "(no data in the last 7 days)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "N/A",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .title("Congestion by UTC weekday/hour")
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_chains(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let content = match snapshot.map(|s| &s.chains) {
            Some(chains) if !chains.is_empty() => {
                let mut parts: Vec<Span> = Vec::new();
                for profile in chains.iter().take(5) {
                    if !parts.is_empty() {
                        parts.push(Span::raw("  |  "));
                    }
                    parts.push(Span::styled(
                        profile.chain.clone(),
                        Style::default().fg(Color::Cyan),
                    ));
                    parts.push(Span::raw(format!(
                        " {:.1}% ({} blobs, {:.1}/tx)",
                        profile.percentage, profile.total_blobs, profile.avg_blobs_per_tx
                    )));
                }
                Line::from(parts)
            }
            _ => Line::from(Span::styled(
                "(no blob transactions in window)",
                Style::default().fg(Color::DarkGray),
            )),
        };

        let paragraph = Paragraph::new(vec![content])
            .block(Block::default().title("Posters (24h)").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_recent_blocks(&self, frame: &mut Frame, area: Rect, snapshot: Option<&MarketSnapshot>) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(snap) = snapshot {
            let now_secs = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);

            for (idx, block) in snap.recent_blocks.iter().enumerate() {
                let num_style = if idx == 0 {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let age = now_secs.saturating_sub(block.timestamp);
                lines.push(Line::from(vec![
                    Span::styled(format!("#{}", block.block_number), num_style),
                    Span::styled(
                        format!(" blobs:{:<2}", block.blob_count),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::styled(
                        format!(" util:{:>5.1}%", block.utilization_pct),
                        regime_style(block.regime),
                    ),
                    Span::styled(
                        format!(" [{}]", block.regime.label()),
                        regime_style(block.regime),
                    ),
                    Span::styled(
                        format!(" gas:{:.3}g", block.gas_price as f64 / 1e9),
                        Style::default().fg(Color::Blue),
                    ),
                    Span::styled(format!(" {}s ago", age), Style::default().fg(Color::Yellow)),
                ]));
            }
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "(no blocks yet)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Recent Blocks (newest first)")
                .borders(Borders::ALL),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help_text = vec![Line::from(vec![
            Span::styled("Press ", Style::default()),
            Span::styled("'q'", Style::default().fg(Color::Yellow)),
            Span::styled(" to quit", Style::default()),
        ])];

        let paragraph =
            Paragraph::new(help_text).block(Block::default().title("Help").borders(Borders::ALL));

        frame.render_widget(paragraph, area);
    }
}

fn rolling_line(window: &RollingWindow) -> Line<'_> {
    let summary = &window.summary;
    let mut parts = vec![
        Span::styled(format!("{:<3} ", window.spec.name), Style::default().fg(Color::Gray)),
        Span::raw(format!("blocks {:>6}", summary.block_count)),
        Span::raw("  blobs/blk "),
        Span::styled(fmt_opt(summary.avg_blobs_per_block, 2), Style::default().fg(Color::Cyan)),
        delta_span(window.vs_baseline.blobs_change_pct),
        Span::raw("  gas "),
        Span::styled(fmt_gas(summary.avg_gas_price), Style::default().fg(Color::Blue)),
        delta_span(window.vs_baseline.gas_change_pct),
    ];
    if let Some(dominant) = summary.dominant_regime() {
        parts.push(Span::raw("  mostly "));
        parts.push(Span::styled(dominant.label(), regime_style(dominant)));
    }
    Line::from(parts)
}

fn delta_span(change_pct: Option<f64>) -> Span<'static> {
    match change_pct {
        Some(change) => {
            let style = if change >= 0.0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            Span::styled(format!(" ({:+.1}%)", change), style)
        }
        None => Span::styled(" (n/a)", Style::default().fg(Color::DarkGray)),
    }
}

fn heatmap_cell_span(grid: &HeatmapGrid, day: usize, hour: usize) -> Span<'static> {
    match grid.cell(day, hour) {
        Some(cell) => {
            let regime = Regime::classify(cell.avg_utilization_pct);
            Span::styled("\u{2588}\u{2588}", regime_style(regime))
        }
        None => Span::styled("\u{00b7}\u{00b7}", Style::default().fg(Color::DarkGray)),
    }
}

/// Terminal color for a regime's semantic token.
fn regime_style(regime: Regime) -> Style {
    let color = match regime.color_token() {
        "blue" => Color::Blue,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "orange" => Color::LightRed,
        "red" => Color::Red,
        _ => Color::White,
    };
    Style::default().fg(color)
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

fn fmt_gas(avg_wei: Option<f64>) -> String {
    match avg_wei {
        Some(wei) => format!("{:.3} gwei", wei / 1e9),
        None => "N/A".to_string(),
    }
}
