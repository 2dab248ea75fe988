//! # autoeval
//!
//! Automated filling of SPA course-evaluation forms. Watches a fragment-routed
//! single-page app, reconstructs question groups from unlabeled radio inputs,
//! picks the best answer per group (numeric value, then sentiment score, then
//! first option), and fills free-text fields from configurable answer pools.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autoeval::{Config, PageWatcher};
//!
//! # #[tokio::main]
//! # async fn main() -> autoeval::Result<()> {
//! let config = Config::load("autoeval.yaml")?;
//! let browser = eoka::Browser::launch().await?;
//! let page = browser.new_page(&config.target.url).await?;
//!
//! let mut watcher = PageWatcher::new(config);
//! watcher.run(&page).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dom;
pub mod fill;
pub mod group;
pub mod guard;
pub mod retry;
pub mod score;
pub mod select;
pub mod watch;

pub use config::{BrowserConfig, Config, FillConfig, MarkupConfig, TargetUrl};
pub use dom::{ChoiceWidget, FreeTextField, PageSnapshot};
pub use retry::RetryState;
pub use select::{PassOutcome, ScoreRegime};
pub use watch::PageWatcher;

/// Result type for autoeval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or page interaction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("snapshot parse error: {0}")]
    Snapshot(String),
}
