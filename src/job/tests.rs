use std::path::Path;

use super::*;
use crate::config::LayerSource;
use crate::insights::Metric;
use crate::plot::SaveOutcome;

const REPOSITORIES: &str = r#"[
    {"name": "alpha", "forks_count": 2, "open_issues_count": 1, "watchers_count": 10},
    {"name": "beta", "forks_count": 4, "open_issues_count": 3, "watchers_count": 20}
]"#;

/// System, user and job files reproducing a complete merged configuration.
fn write_configs(dir: &Path, api_base_path: &str, job_extra: &str) -> ConfigPaths {
    let paths = ConfigPaths {
        system: dir.join("system_config.yml"),
        user: dir.join("user_config.yml"),
        job: dir.join("job_file.yml"),
    };

    std::fs::write(
        &paths.system,
        format!(
            "api_base_path: '{api_base_path}'\nfigure_size_x: 8\nfigure_size_y: 6\nplot_color: red\nplot_title: System Title\nplot_x_title: Watchers\nplot_y_title: Count\nfigure_dpi: 40\n"
        ),
    )
    .unwrap();
    std::fs::write(
        &paths.user,
        format!(
            "plot_color: blue\nntfy_topic: test-topic\nrequest_timeout_secs: 5\nowner: acme\nsave_path: '{}'\n",
            dir.join("out.png").display()
        ),
    )
    .unwrap();
    std::fs::write(
        &paths.job,
        format!("endpoint: orgs\nresource: repos\nplot_title: Engagement\n{job_extra}"),
    )
    .unwrap();

    paths
}

async fn repositories_server() -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/orgs/acme/repos")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPOSITORIES)
        .create_async()
        .await;
    (server, mock)
}

#[test]
fn test_new_with_missing_job_file() {
    let err = AnalysisJob::new("does-not-exists.yml").unwrap_err();
    assert!(matches!(err, AnalysisError::ConfigurationNotFound { .. }));

    let err = AnalysisJob::new("").unwrap_err();
    assert!(matches!(err, AnalysisError::ConfigurationNotFound { .. }));
}

#[test]
fn test_from_paths_merges_layers() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), "https://api.example.com", "");

    let job = AnalysisJob::from_paths(&paths).unwrap();
    let config = job.config();

    assert_eq!(config.require_string("plot_color").unwrap(), "blue");
    assert_eq!(config.require_string("plot_title").unwrap(), "Engagement");
    assert_eq!(config.require_string("plot_x_title").unwrap(), "Watchers");
    assert_eq!(config.source_of("plot_color"), Some(LayerSource::User));
    assert_eq!(config.source_of("save_path"), Some(LayerSource::User));
    assert_eq!(config.source_of("plot_title"), Some(LayerSource::Job));
    assert!(matches!(job.state(), JobState::Uninitialized));
}

#[test]
fn test_stages_before_load_data_fail() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), "https://api.example.com", "");
    let job = AnalysisJob::from_paths(&paths).unwrap();

    assert!(matches!(job.compute_analysis().unwrap_err(), AnalysisError::DataNotLoaded));
    assert!(matches!(job.plot_data(None).unwrap_err(), AnalysisError::DataNotLoaded));
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn test_load_data_requires_fetch_keys() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), "https://api.example.com", "owner: ~\n");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();

    let err = job.load_data().await.unwrap_err();

    assert!(matches!(err, AnalysisError::MissingConfiguration { ref key } if key == "owner"));
    assert!(matches!(job.state(), JobState::Uninitialized));
}

#[tokio::test]
async fn test_failed_load_keeps_previous_state() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/orgs/acme/repos")
        .with_status(503)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();

    assert!(matches!(
        job.load_data().await.unwrap_err(),
        AnalysisError::DataLoad { .. }
    ));
    assert!(matches!(job.state(), JobState::Uninitialized));
}

#[tokio::test]
async fn test_end_to_end_analysis() {
    let (server, mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();

    let dataset = job.load_data().await.unwrap();
    assert_eq!(dataset.shape(), (2, 4));
    mock.assert_async().await;

    let insights = job.compute_analysis().unwrap();
    assert_eq!(insights.mean(Metric::Forks), 3.0);
    assert_eq!(insights.mean(Metric::OpenIssues), 2.0);
    assert_eq!(insights.mean(Metric::Watchers), 15.0);
    assert_eq!(job.compute_analysis().unwrap(), insights);

    let report = job.plot_data(None).unwrap();
    let out = dir.path().join("out.png");
    assert!(report.save.is_saved(), "{:?}", report.save);
    assert_eq!(report.save.path(), out);
    assert!(std::fs::read(&out).unwrap().starts_with(b"\x89PNG"));
    assert_eq!(report.figure.size(), (320, 240));
    assert!(report.figure.svg().contains("Engagement"));
}

#[tokio::test]
async fn test_reload_replaces_dataset() {
    let (server, _mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();

    job.load_data().await.unwrap();
    let dataset = job.load_data().await.unwrap();

    assert_eq!(dataset.len(), 2);
    assert!(matches!(job.state(), JobState::Loaded(_)));
}

#[tokio::test]
async fn test_plot_data_explicit_path() {
    let (server, _mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    let explicit = dir.path().join("local_file.svg");
    let report = job.plot_data(Some(explicit.as_path())).unwrap();

    assert!(report.save.is_saved());
    assert!(explicit.is_file());
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn test_plot_data_directory_save_path() {
    let (server, _mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let figures = dir.path().join("output_figures");
    std::fs::create_dir(&figures).unwrap();
    let paths = write_configs(
        dir.path(),
        &server.url(),
        &format!("save_path: '{}'\n", figures.display()),
    );
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    let report = job.plot_data(None).unwrap();

    assert!(report.save.is_saved());
    assert!(figures.join("engagement_scatter.png").is_file());
}

#[tokio::test]
async fn test_plot_data_save_failure_still_returns_figure() {
    let (server, _mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    let missing = dir.path().join("no-such-dir").join("plot.png");
    let report = job.plot_data(Some(missing.as_path())).unwrap();

    assert!(matches!(report.save, SaveOutcome::Failed { .. }));
    assert!(report.figure.svg().contains("Open Issues"));
}

#[tokio::test]
async fn test_plot_data_rejects_dataset_without_metrics() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/orgs/acme/repos")
        .with_status(200)
        .with_body(r#"[{"name": "alpha"}, {"name": "beta"}]"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    assert!(matches!(
        job.plot_data(None).unwrap_err(),
        AnalysisError::MissingColumn { .. }
    ));
    assert!(matches!(
        job.compute_analysis().unwrap_err(),
        AnalysisError::MissingColumn { .. }
    ));
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn test_empty_listing_is_empty_dataset() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/orgs/acme/repos")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    assert!(matches!(
        job.compute_analysis().unwrap_err(),
        AnalysisError::EmptyDataset
    ));
}

#[tokio::test]
async fn test_plot_data_requires_plot_keys() {
    let (server, _mock) = repositories_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), &server.url(), "plot_y_title: ~\n");
    let mut job = AnalysisJob::from_paths(&paths).unwrap();
    job.load_data().await.unwrap();

    assert!(matches!(
        job.plot_data(None).unwrap_err(),
        AnalysisError::MissingConfiguration { ref key } if key == "plot_y_title"
    ));
}

#[tokio::test]
async fn test_notify_done_requires_topic() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(dir.path(), "https://api.example.com", "ntfy_topic: ~\n");
    let job = AnalysisJob::from_paths(&paths).unwrap();

    assert!(matches!(
        job.notify_done("done").await.unwrap_err(),
        AnalysisError::MissingConfiguration { ref key } if key == "ntfy_topic"
    ));
}

#[tokio::test]
async fn test_notify_done_delivers_and_tolerates_failures() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/test-topic")
        .match_body("Hello ntfy")
        .with_status(200)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let paths = write_configs(
        dir.path(),
        "https://api.example.com",
        &format!("ntfy_base_url: '{}'\n", server.url()),
    );
    let job = AnalysisJob::from_paths(&paths).unwrap();

    let outcome = job.notify_done("Hello ntfy").await.unwrap();
    mock.assert_async().await;
    assert!(outcome.is_delivered());

    let paths = write_configs(
        dir.path(),
        "https://api.example.com",
        "ntfy_base_url: 'http://127.0.0.1:1'\n",
    );
    let job = AnalysisJob::from_paths(&paths).unwrap();
    let outcome = job.notify_done("Hello ntfy").await.unwrap();
    assert!(matches!(outcome, NotifyOutcome::Failed { .. }));
}
