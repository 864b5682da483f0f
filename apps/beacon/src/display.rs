//! Output rendering and formatting

use beacon_config::Config;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;
use std::path::Path;

use crate::replay::ReplaySummary;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            term: Term::stdout(),
        }
    }

    /// Render the outcome of a replay
    pub fn render_replay(&self, summary: &ReplaySummary) -> io::Result<()> {
        if self.json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(summary).map_err(io::Error::other)?
            );
            return Ok(());
        }

        let stats = &summary.stats;
        println!(
            "{} {} ({} lines)",
            self.style(Style::new().bold(), "Replayed"),
            summary.file.display(),
            summary.lines
        );

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Events").add_attribute(Attribute::Bold),
        ]);

        let rows: [(&str, u64, Option<Color>); 11] = [
            ("invalid json", summary.invalid_json, Some(Color::Red)),
            ("accepted", stats.accepted, Some(Color::Green)),
            ("malformed", stats.malformed, Some(Color::Red)),
            ("below min level", stats.below_min_level, None),
            ("sampled out", stats.sampled_out, None),
            ("rate limited", stats.rate_limited, Some(Color::Yellow)),
            ("deduplicated", stats.deduplicated, None),
            ("queue full", stats.queue_full, Some(Color::Yellow)),
            ("stopped", stats.stopped, None),
            ("delivered", stats.delivered, Some(Color::Green)),
            ("failed", stats.failed, Some(Color::Red)),
        ];
        for (label, count, color) in rows {
            let mut cell = Cell::new(count);
            if let (Some(color), true) = (color, count > 0) {
                cell = cell.fg(color);
            }
            table.add_row(vec![Cell::new(label), cell]);
        }
        println!("{table}");

        for failure in &summary.failures {
            println!(
                "  {} {}: {}",
                self.style(Style::new().red(), "failed"),
                failure.event_id,
                failure.error
            );
        }
        Ok(())
    }

    /// Render the effective configuration, or only its path
    pub fn render_config(
        &self,
        config: &Config,
        toml: &str,
        path: &Path,
        path_only: bool,
    ) -> io::Result<()> {
        if path_only {
            if self.json_output {
                println!("{}", serde_json::json!({ "path": path }));
            } else {
                println!("{}", path.display());
            }
            return Ok(());
        }

        if self.json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(config).map_err(io::Error::other)?
            );
        } else {
            println!("{}", self.style(Style::new().dim(), &format!("# {}", path.display())));
            print!("{toml}");
        }
        Ok(())
    }

    fn style(&self, style: Style, text: &str) -> String {
        if self.term.features().colors_supported() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}
