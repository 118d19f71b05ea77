//! Semantic Scholar Resolver
//!
//! A client for the Semantic Scholar Graph API that turns free-text paper
//! titles into paper IDs and fetches normalized paper and author records.
//!
//! # Features
//!
//! - **Failure-aware retries**: every request is classified on failure and
//!   waits according to a per-kind backoff table, within a fixed retry budget
//! - **Fuzzy title matching**: ROUGE-L over normalized titles, first candidate
//!   strictly above the threshold wins
//! - **Total normalization**: absent or mistyped optional fields fall back to
//!   declared defaults, required ones surface as typed errors
//! - **Cached**: optional TTL cache for paper and author lookups
//!
//! # Example
//!
//! ```no_run
//! use semantic_scholar_resolver::{Config, SemanticScholarClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = SemanticScholarClient::new(config)?;
//!
//!     if let Some(paper_id) = client.get_paper_id_from_title("Attention Is All You Need").await? {
//!         let paper = client.get_paper(&paper_id).await?;
//!         println!("{} ({}) by {}", paper.title, paper.year(), paper.author_names());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod resolver;

pub use cache::{MemoryCache, RecordCache};
pub use client::SemanticScholarClient;
pub use config::Config;
pub use error::{ClientError, ScholarError};
pub use models::{Author, Candidate, Paper, Reference};
pub use resolver::{TitleResolver, normalize_title};
