//! thinkcap: conversational client for reasoning-mode models.
//!
//! Drives an OpenAI-compatible endpoint whose model deliberates before it
//! answers. Each user turn gets a bounded thinking pass; when the budget runs
//! out mid-thought the reasoning is closed with a synthetic directive and a
//! continuation pass produces the answer, so a turn always ends with one
//! coherent assistant message.
//!
//! # Quick Start
//!
//! ```no_run
//! use thinkcap::prelude::*;
//!
//! # async fn example() -> thinkcap::error::Result<()> {
//! let config = SessionConfig::builder().thinking_budget(1024).build();
//! let mut session = Session::from_config(config)?;
//! let outcome = session.submit_turn("What is 2+2?").await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod protocol;
pub mod provider;
pub mod session;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
