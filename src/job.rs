use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::{ConfigPaths, Configuration, FetchSettings, NotifySettings, PlotSettings};
use crate::dataset::Dataset;
use crate::error::{AnalysisError, Result};
use crate::insights::EngagementInsights;
use crate::notify::{Notifier, NotifyOutcome};
use crate::plot::{Figure, PlotReport, ScatterData};
use crate::providers::GitHubClient;

/// Whether the repository listing has been fetched yet.
#[derive(Debug, Clone)]
pub enum JobState {
    Uninitialized,
    Loaded(Dataset),
}

/// One end-to-end engagement analysis: configure, fetch, analyze, plot, notify.
///
/// Each stage checks its own preconditions. `compute_analysis` and
/// `plot_data` require a prior successful `load_data`; `notify_done` only
/// needs its topic to be configured.
#[derive(Debug)]
pub struct AnalysisJob {
    config: Configuration,
    state: JobState,
}

impl AnalysisJob {
    /// Build a job from `job_config` layered over the system and user files.
    pub fn new(job_config: impl Into<PathBuf>) -> Result<Self> {
        Self::from_paths(&ConfigPaths::for_job(job_config))
    }

    pub fn from_paths(paths: &ConfigPaths) -> Result<Self> {
        let config = Configuration::load(paths)?;
        info!("Loaded {} configuration keys", config.len());
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Configuration) -> Self {
        Self {
            config,
            state: JobState::Uninitialized,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// The loaded dataset, or [`AnalysisError::DataNotLoaded`].
    pub fn dataset(&self) -> Result<&Dataset> {
        match &self.state {
            JobState::Loaded(dataset) => Ok(dataset),
            JobState::Uninitialized => Err(AnalysisError::DataNotLoaded),
        }
    }

    /// Fetch the repository listing and keep it as the job's dataset.
    ///
    /// The fetch keys are validated before any request is made. On failure
    /// the previous state is kept.
    pub async fn load_data(&mut self) -> Result<&Dataset> {
        let settings = FetchSettings::from_config(&self.config)?;
        let dataset = GitHubClient::new(settings)?.fetch_repositories().await?;

        if let JobState::Loaded(previous) = self.state() {
            debug!("Replacing previously loaded dataset of {} rows", previous.len());
        }

        let (rows, columns) = dataset.shape();
        debug!("Loaded dataset with {rows} rows and {columns} columns: {:?}", dataset.columns());

        self.state = JobState::Loaded(dataset);
        self.dataset()
    }

    /// Mean forks, open issues and watchers across the loaded dataset.
    pub fn compute_analysis(&self) -> Result<EngagementInsights> {
        let insights = EngagementInsights::from_dataset(self.dataset()?)?;
        debug!("Computed engagement insights: {insights:?}");
        Ok(insights)
    }

    /// Render the engagement scatter plot and save it.
    ///
    /// `save_path` overrides the configured destination. Saving is best
    /// effort: the figure is returned even when the file could not be written.
    pub fn plot_data(&self, save_path: Option<&Path>) -> Result<PlotReport> {
        let dataset = self.dataset()?;
        let settings = PlotSettings::from_config(&self.config)?;
        let data = ScatterData::from_dataset(dataset)?;

        let figure = Figure::render(&data, &settings)?;
        let target = save_path.unwrap_or(settings.save_path.as_path());
        info!("Saving engagement scatter plot to {}", target.display());
        let save = figure.save(target);

        Ok(PlotReport { figure, save })
    }

    /// Send a completion notification; only a missing topic is an error.
    pub async fn notify_done(&self, message: &str) -> Result<NotifyOutcome> {
        let settings = NotifySettings::from_config(&self.config)?;
        Ok(Notifier::new(settings).send(message).await)
    }
}

#[cfg(test)]
mod tests;
