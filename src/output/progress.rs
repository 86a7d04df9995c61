use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{failure, heading, success, value};

/// Spinner for one step of the analysis job.
pub struct PhaseProgress {
    pb: ProgressBar,
    label: String,
}

impl PhaseProgress {
    /// Print the phases header; call once before the first phase.
    pub fn header() {
        eprintln!("{}  {}", heading("⚙️"), heading("Phases").underlined());
    }

    pub fn start(index: usize, total: usize, action: &str) -> Self {
        let label = format!("Phase {index}/{total}");
        let pb = create_spinner(value(format!("{label}: {action}")).to_string());
        Self { pb, label }
    }

    pub fn finish(self, done: &str) {
        self.pb
            .finish_with_message(success(format!("{}: {done} ✓", self.label)).to_string());
    }

    /// Finish a best-effort phase that did not succeed.
    pub fn warn(self, message: &str) {
        self.pb
            .finish_with_message(failure(format!("{}: {message} ✗", self.label)).to_string());
    }

    pub fn abandon(self) {
        self.pb.abandon();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
