mod client;


pub use client::GitHubClient;
