use std::fmt;

use crate::dataset::Dataset;
use crate::error::Result;

/// The engagement metrics tracked per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Forks,
    OpenIssues,
    Watchers,
}

impl Metric {
    pub const ALL: [Self; 3] = [Self::Forks, Self::OpenIssues, Self::Watchers];

    /// Field name in the API records.
    pub fn column(self) -> &'static str {
        match self {
            Self::Forks => "forks_count",
            Self::OpenIssues => "open_issues_count",
            Self::Watchers => "watchers_count",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Forks => "Forks",
            Self::OpenIssues => "Open Issues",
            Self::Watchers => "Watchers",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Mean engagement across every repository in a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementInsights {
    pub forks_mean: f64,
    pub open_issues_mean: f64,
    pub watchers_mean: f64,
}

impl EngagementInsights {
    /// Compute the three means independently; null cells are skipped.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        Ok(Self {
            forks_mean: column_mean(dataset, Metric::Forks)?,
            open_issues_mean: column_mean(dataset, Metric::OpenIssues)?,
            watchers_mean: column_mean(dataset, Metric::Watchers)?,
        })
    }

    pub fn mean(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Forks => self.forks_mean,
            Metric::OpenIssues => self.open_issues_mean,
            Metric::Watchers => self.watchers_mean,
        }
    }

    /// Each metric paired with its mean, in [`Metric::ALL`] order.
    pub fn named_values(&self) -> [(Metric, f64); 3] {
        Metric::ALL.map(|metric| (metric, self.mean(metric)))
    }
}

#[allow(clippy::cast_precision_loss)]
fn column_mean(dataset: &Dataset, metric: Metric) -> Result<f64> {
    let values: Vec<f64> = dataset
        .numeric_column(metric.column())?
        .into_iter()
        .flatten()
        .collect();

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
