mod github;

pub use github::GitHubClient;
