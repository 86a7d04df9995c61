mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PhaseProgress;
pub use styling::{label, title};
pub use summary::{print_summary, RunSummary};

/// Prints the `RepoLens` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        title("🔍 RepoLens"),
        label(env!("CARGO_PKG_VERSION")),
        label("Repository Engagement Analysis")
    );
}
