use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use crate::error::AnalysisError;
use crate::job::AnalysisJob;
use crate::output::{print_summary, PhaseProgress, RunSummary};

const PHASES: usize = 4;
const COMPLETION_MESSAGE: &str = "Repository engagement analysis complete";

#[derive(Parser)]
#[command(name = "repolens")]
#[command(author, version, about = "Repository Engagement Analysis", long_about = None)]
pub struct Cli {
    /// Job configuration file, layered over configs/system_config.yml and configs/user_config.yml
    #[arg(default_value = "configs/job_file.yml")]
    job_config: PathBuf,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        info!("Running analysis job: {}", self.job_config.display());

        let mut job = AnalysisJob::new(&self.job_config).with_context(|| {
            format!("Failed to configure job from {}", self.job_config.display())
        })?;
        debug!("Effective configuration: {}", job.config());

        PhaseProgress::header();

        let progress = PhaseProgress::start(1, PHASES, "Fetching repositories");
        match job.load_data().await {
            Ok(dataset) if dataset.is_empty() => progress.warn("No repositories returned"),
            Ok(dataset) => progress.finish(&format!("Fetched {} repositories", dataset.len())),
            Err(e) => {
                progress.abandon();
                return Err(e).context("Failed to load repository data");
            }
        }

        let progress = PhaseProgress::start(2, PHASES, "Computing engagement");
        let insights = match job.compute_analysis() {
            Ok(insights) => {
                progress.finish("Computed engagement means");
                insights
            }
            Err(e) => {
                progress.abandon();
                return Err(e).context("Failed to compute engagement");
            }
        };

        let progress = PhaseProgress::start(3, PHASES, "Rendering plot");
        let plot = match job.plot_data(None) {
            Ok(plot) => plot,
            Err(e) => {
                progress.abandon();
                return Err(e).context("Failed to plot engagement");
            }
        };
        let (width, height) = plot.figure.size();
        info!(
            "Rendered {width}x{height} engagement scatter plot ({} bytes of SVG)",
            plot.figure.svg().len()
        );
        if plot.save.is_saved() {
            progress.finish(&format!("Plot saved to {}", plot.save.path().display()));
        } else {
            progress.warn("Plot rendered but not saved");
        }

        let progress = PhaseProgress::start(4, PHASES, "Sending notification");
        let notification = match job.notify_done(COMPLETION_MESSAGE).await {
            Ok(outcome) => {
                if outcome.is_delivered() {
                    progress.finish("Notification sent");
                } else {
                    progress.warn("Notification not delivered");
                }
                Some(outcome)
            }
            Err(AnalysisError::MissingConfiguration { key }) => {
                info!("Skipping notification: {key} is not configured");
                progress.warn("Notification skipped");
                None
            }
            Err(e) => {
                progress.abandon();
                return Err(e).context("Failed to send notification");
            }
        };
        eprintln!();

        print_summary(&RunSummary {
            dataset: job.dataset()?,
            insights: &insights,
            save: &plot.save,
            notification: notification.as_ref(),
        });

        Ok(())
    }
}
