//! Core update loop for **ea**.
//!
//! `ea-core` drives a state machine the way the [Elm Architecture] does: the
//! only place state changes is [`Model::update`], and every side effect is
//! pushed to the edges as a [`Command`] that runs concurrently and reports
//! back with a new message.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Model`] | The state machine (`update`) |
//! | [`Message`] | A queued value: `Quit`, `Batch`, or an ordinary message |
//! | [`Command`] | Deferred work producing exactly one [`Message`] |
//! | [`Loop`] | Owns the model and its queue; runs the dispatch cycle |
//! | [`Handle`] | Cloneable sender/stopper for code outside the loop |
//! | [`TestLoop`](testing::TestLoop) | Headless harness for unit-testing a [`Model`] |
//!
//! # Dispatch cycle
//!
//! 1. **enqueue** -- Messages arrive through a [`Handle`] or as the result
//!    of a [`Command`].
//! 2. **dequeue** -- The loop takes the next message.  `Quit` stops the loop,
//!    `Batch` launches its commands.
//! 3. **update** -- Any other message goes to [`Model::update`], which
//!    mutates state and returns a [`Command`].
//! 4. **launch** -- The command runs on its own task; its message re-enters
//!    the queue.
//! 5. **repeat** -- until the model quits, a handle stops the loop, or the
//!    caller's cancellation token fires.
//!
//! Updates never overlap.  Messages from different commands arrive in no
//! particular order; messages from a single producer keep theirs.
//!
//! # Quick example
//!
//! ```rust
//! use ea_core::{Command, Loop, Model};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Counter { count: i32 }
//!
//! enum Msg { Increment, Done }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!
//!     fn update(&mut self, msg: Msg) -> Command<Msg> {
//!         match msg {
//!             Msg::Increment => self.count += 1,
//!             Msg::Done => return Command::quit(),
//!         }
//!         Command::none()
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let ea = Loop::new(Counter { count: 0 });
//! let handle = ea.handle();
//! handle.send(Msg::Increment).await;
//! handle.send(Msg::Done).await;
//!
//! let model = ea.run(CancellationToken::new(), Command::none()).await;
//! assert_eq!(model.count, 1);
//! # }
//! ```
//!
//! [Elm Architecture]: https://guide.elm-lang.org/architecture/

pub mod command;
pub mod logging;
pub mod message;
pub mod model;
mod queue;
pub mod runtime;
pub mod testing;

pub use command::Command;
#[cfg(feature = "log-file")]
pub use logging::log_to_file;
pub use message::Message;
pub use model::Model;
pub use runtime::{Handle, Loop, LoopError, LoopOptions};

use tokio_util::sync::CancellationToken;

/// Run `model` on a fresh loop with default options.
///
/// Messages can only come from `init` and the commands that follow it; use
/// [`Loop::handle`] when outside code needs to send messages too.
pub async fn run<M: Model>(model: M, cancel: CancellationToken, init: Command<M::Message>) -> M {
    Loop::new(model).run(cancel, init).await
}
