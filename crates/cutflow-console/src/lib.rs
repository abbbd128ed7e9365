//! Colorful console output for cutflow jobs.
//!
//! Provides a `tracing` layer that prints setup and job lifecycle events
//! and [`render_cut_flow`] for cut-flow tables.
//!
//! ## Log Levels
//!
//! - **INFO**: Lifecycle events (scopes, groups, systematics, cut flows, job start/end)
//! - **DEBUG**: Per-event decisions
//! - **ERROR**: Values read before they were produced

mod table;

#[cfg(test)]
mod tests;

pub use table::{render_all, render_cut_flow};

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_DIRECTIVE: &str = "cutflow=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect.
/// Prints the banner and installs the tracing subscriber.
pub fn init() {
    INIT.get_or_init(|| {
        EPOCH.get_or_init(Instant::now);
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(CutflowConsoleLayer)
            .try_init();
    });
}

fn elapsed_secs() -> f64 {
    EPOCH.get().map_or(0.0, |epoch| epoch.elapsed().as_secs_f64())
}

fn print_banner() {
    let banner = format!("cutflow v{} - variation-aware event selection", VERSION);
    let rule = "─".repeat(banner.chars().count());

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", rule.bright_cyan());
    let _ = writeln!(stdout, "{}", banner.bright_white().bold());
    let _ = writeln!(stdout, "{}", rule.bright_cyan());
    let _ = stdout.flush();
}

/// A tracing layer that formats cutflow lifecycle events with colors.
pub struct CutflowConsoleLayer;

impl<S: Subscriber> Layer<S> for CutflowConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("cutflow") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    scope: Option<String>,
    group: Option<String>,
    object: Option<String>,
    service: Option<String>,
    cut_flow: Option<String>,
    analysis: Option<String>,
    reason: Option<String>,
    scopes: Option<u64>,
    variables: Option<u64>,
    containers: Option<u64>,
    kinematic: Option<u64>,
    weights: Option<u64>,
    services: Option<u64>,
    cuts: Option<u64>,
    standard_cuts: Option<u64>,
    cut_flows: Option<u64>,
    histograms: Option<u64>,
    events: Option<u64>,
    accepted: Option<u64>,
}

impl EventVisitor {
    fn text(&mut self, name: &str, value: String) {
        let slot = match name {
            "event" => &mut self.event,
            "scope" => &mut self.scope,
            "group" => &mut self.group,
            "object" => &mut self.object,
            "service" => &mut self.service,
            "cut_flow" => &mut self.cut_flow,
            "analysis" => &mut self.analysis,
            "reason" => &mut self.reason,
            _ => return,
        };
        *slot = Some(value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        self.text(field.name(), s.trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let slot = match field.name() {
            "scopes" => &mut self.scopes,
            "variables" => &mut self.variables,
            "containers" => &mut self.containers,
            "kinematic" => &mut self.kinematic,
            "weights" => &mut self.weights,
            "services" => &mut self.services,
            "cuts" => &mut self.cuts,
            "standard_cuts" => &mut self.standard_cuts,
            "cut_flows" => &mut self.cut_flows,
            "histograms" => &mut self.histograms,
            "events" => &mut self.events,
            "accepted" => &mut self.accepted,
            _ => return,
        };
        *slot = Some(value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }
}

fn format_event(v: &EventVisitor) -> String {
    let event = v.event.as_deref().unwrap_or("");

    match event {
        "scope_opened" => format_line("▶".bright_blue().to_string(), format!("Scope {} opened", name(&v.scope))),
        "registry_locked" => format_line(
            "■".bright_cyan().bold().to_string(),
            format!(
                "Registry locked │ {} scopes │ {} variables │ {} containers",
                count(v.scopes),
                count(v.variables),
                count(v.containers)
            ),
        ),
        "registry_reset" => format_line("↺".bright_black().to_string(), "Registry reset".to_string()),
        "group_created" => format_line(
            "◆".bright_magenta().to_string(),
            format!("Group {} │ {}", name(&v.group), v.object.as_deref().unwrap_or("?")),
        ),
        "tool_service_added" => format_line(
            "+".bright_green().to_string(),
            format!("Tool service {}", name(&v.service)),
        ),
        "truth_disabled" => format_line(
            "!".yellow().bold().to_string(),
            format!(
                "Truth objects disabled ({})",
                v.reason.as_deref().unwrap_or("configuration")
            ),
        ),
        "systematics_fixed" => format_line(
            "■".bright_cyan().bold().to_string(),
            format!(
                "Systematics fixed │ {} kinematic │ {} weights │ {} tool services",
                count(v.kinematic),
                count(v.weights),
                count(v.services)
            ),
        ),
        "cut_flow_added" => format_line(
            "✓".bright_green().to_string(),
            format!(
                "Cut flow {} │ {} cuts │ {} standard cuts",
                name(&v.cut_flow),
                count(v.cuts),
                count(v.standard_cuts)
            ),
        ),
        "cut_flow_skipped" => format_line(
            "✗".bright_black().to_string(),
            format!("Cut flow {} is not active, skipped", v.cut_flow.as_deref().unwrap_or("?"))
                .bright_black()
                .to_string(),
        ),
        "analysis_config_built" => format_line(
            "■".bright_cyan().bold().to_string(),
            format!(
                "Selection built │ {} cut flows │ {} histograms",
                count(v.cut_flows),
                count(v.histograms)
            ),
        ),
        "job_started" => format_line(
            "▶".bright_green().bold().to_string(),
            format!(
                "Analysis {} │ {} kinematic variations",
                name(&v.analysis),
                count(v.kinematic)
            ),
        ),
        "job_finished" => format_line(
            "■".bright_green().bold().to_string(),
            format!(
                "Analysis {} finished │ {} events │ {} accepted",
                name(&v.analysis),
                count(v.events),
                count(v.accepted)
            ),
        ),
        _ => String::new(),
    }
}

fn format_line(icon: String, text: String) -> String {
    format!(
        "{} {} {}",
        format!("{:>7.3}s", elapsed_secs()).bright_black(),
        icon,
        text
    )
}

fn name(value: &Option<String>) -> String {
    value.as_deref().unwrap_or("?").white().bold().to_string()
}

fn count(value: Option<u64>) -> String {
    value
        .unwrap_or(0)
        .to_formatted_string(&Locale::en)
        .bright_yellow()
        .to_string()
}
