use crate::host::SimulatedHost;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

fn style(template: &str, chars: Option<&str>) -> ProgressStyle {
    let style = ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar());
    match chars {
        Some(chars) => style.progress_chars(chars),
        None => style,
    }
}

pub fn create_cycle_progress(cycles: u64) -> ProgressBar {
    let pb = ProgressBar::new(cycles);
    pb.set_style(style(
        "{prefix:.bold} [{bar:40.cyan}] {pos}/{len}",
        Some("⣀⣤⣦⣶⣷⣿ "),
    ));
    pb.set_prefix("Cycle");
    pb
}

pub fn create_transport_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Transport");
    pb
}

/// Formats the unit's view of the transport for the spinner line.
pub fn transport_line(host: &SimulatedHost) -> String {
    let unit = host.unit();
    let anchor = unit.anchor();
    let trigger = if unit.trigger().is_armed() {
        "armed".to_string()
    } else {
        format!("holdoff {}", unit.trigger().holdoff_remaining())
    };
    format!(
        "@{} | beat {:.2} | {:.1} bpm x{:.2} | {} | on {} off {}",
        anchor.sample_origin,
        anchor.beat_origin,
        anchor.bpm,
        anchor.speed,
        trigger,
        host.report().note_ons,
        host.report().note_offs,
    )
}

/// Cycle counter and transport line drawn to stderr while the host runs.
pub struct CycleMonitor {
    _multi: MultiProgress,
    cycles: ProgressBar,
    transport: ProgressBar,
}

impl CycleMonitor {
    pub fn new(total_cycles: u64) -> Self {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let cycles = multi.add(create_cycle_progress(total_cycles));
        let transport = multi.add(create_transport_spinner());
        Self {
            _multi: multi,
            cycles,
            transport,
        }
    }

    pub fn update(&self, host: &SimulatedHost) {
        self.cycles.set_position(host.cycle());
        self.transport.set_message(transport_line(host));
        self.transport.tick();
    }

    pub fn finish(&self) {
        self.cycles.finish();
        self.transport.finish_with_message("done");
    }
}
