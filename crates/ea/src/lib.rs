//! **ea** -- an Elm-architecture update loop for [`tokio`] applications.
//!
//! This is the umbrella crate that re-exports everything you need from a
//! single dependency:
//!
//! ```toml
//! [dependencies]
//! ea = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`ea_core`] are available at the crate root
//!   ([`Model`], [`Command`], [`Message`], [`Loop`], [`Handle`], [`run`],
//!   etc.).
//! * [`tokio`] and [`tokio_util`] are re-exported so downstream crates do
//!   not need to depend on them directly; [`CancellationToken`] is
//!   re-exported at the root because every [`Loop::run`] call needs one.
//!
//! # Quick start
//!
//! ```ignore
//! use ea::{CancellationToken, Command, Model};
//!
//! struct Hello;
//! enum Msg {}
//!
//! impl Model for Hello {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Command<Msg> {
//!         match msg {}
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     ea::run(Hello, CancellationToken::new(), Command::quit()).await;
//! }
//! ```

pub use ea_core::*;

// Re-export dependencies for use in demos and downstream crates
pub use tokio;
pub use tokio_util;
pub use tokio_util::sync::CancellationToken;
