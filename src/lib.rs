//! Stream a multimodal Gemini generation to a writer.
//!
//! [`v1beta`] holds strongly typed wrappers over the public **v1beta** REST
//! endpoints, with [`v1beta::rest::Client`] for unary and server-sent-event
//! streamed generation. [`runner::Runner`] assembles the one request this crate
//! exists to send (an inline PNG plus text parts, Google Search enabled, JSON
//! output) and writes the streamed text as it arrives.
//!
//! ## Example
//!
//! ```no_run
//! use gemini::{config::Config, runner::Runner};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let runner = Runner::new(config.client())?.with_input("a fox, flat style");
//!
//! let summary = runner.run(&mut std::io::stdout()).await?;
//! eprintln!("{} fragments", summary.fragments);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod runner;
pub mod v1beta;
