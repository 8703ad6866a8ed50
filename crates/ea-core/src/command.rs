use crate::message::Message;
use crate::queue::Outbox;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A side effect returned from [`Model::update`](crate::Model::update) or
/// passed to [`Loop::run`](crate::Loop::run) as the initial command.
///
/// A command is a deferred unit of work that produces exactly one
/// [`Message`] when it finishes.  The runtime launches every command on its
/// own task and feeds the result back into the loop's queue, so commands run
/// concurrently with each other but never with `update` itself.
///
/// A command holds no reference to the model.  If it can fail, encode the
/// failure in the message it returns (e.g. a `Result` payload) and decide
/// what to do about it in `update`.
///
/// # Examples
///
/// ```rust,ignore
/// // Do nothing:
/// let cmd = Command::none();
///
/// // Run an async task and map the result to a message:
/// let cmd = Command::perform(
///     async { fetch_data().await },
///     |data| Msg::DataLoaded(data),
/// );
///
/// // Run blocking code on the blocking pool:
/// let cmd = Command::from_fn(|| Msg::Loaded(std::fs::read_to_string("a.txt")).into());
///
/// // Stop the loop:
/// let cmd = Command::quit();
/// ```
pub struct Command<Msg: Send + 'static> {
    pub(crate) inner: CommandInner<Msg>,
}

pub(crate) enum CommandInner<Msg: Send + 'static> {
    None,
    Ready(Message<Msg>),
    Future(BoxFuture<'static, Message<Msg>>),
    Blocking(Box<dyn FnOnce() -> Message<Msg> + Send>),
    Batch(Vec<Command<Msg>>),
    Sequence(Vec<Command<Msg>>),
}

impl<Msg: Send + 'static> Command<Msg> {
    /// No-op command.
    pub fn none() -> Self {
        Command {
            inner: CommandInner::None,
        }
    }

    /// Run a zero-argument closure and deliver whatever it returns.
    ///
    /// The closure runs on tokio's blocking thread pool, so it may perform
    /// blocking I/O.  It may return any [`Message`], including
    /// [`Message::Quit`].
    pub fn from_fn(f: impl FnOnce() -> Message<Msg> + Send + 'static) -> Self {
        Command {
            inner: CommandInner::Blocking(Box::new(f)),
        }
    }

    /// Await a future and deliver the message it resolves to.
    pub fn from_future(future: impl Future<Output = Message<Msg>> + Send + 'static) -> Self {
        Command {
            inner: CommandInner::Future(Box::pin(future)),
        }
    }

    /// Run an async future, map the result to a message.
    pub fn perform<F, T>(future: F, map: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Command {
            inner: CommandInner::Future(Box::pin(async move {
                Message::User(map(future.await))
            })),
        }
    }

    /// Send a message without doing any work.
    pub fn message(msg: Msg) -> Self {
        Command {
            inner: CommandInner::Ready(Message::User(msg)),
        }
    }

    /// Stop the loop.
    pub fn quit() -> Self {
        Command {
            inner: CommandInner::Ready(Message::Quit),
        }
    }

    /// Run multiple commands concurrently.
    ///
    /// `none` commands are dropped.  If nothing is left the result is
    /// [`Command::none()`]; otherwise the command yields a
    /// [`Message::Batch`] and the runtime launches every member in order,
    /// each on its own task.
    pub fn batch(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let cmds: Vec<_> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        if cmds.is_empty() {
            return Command::none();
        }
        Command {
            inner: CommandInner::Batch(cmds),
        }
    }

    /// Run commands sequentially: each command's message is enqueued
    /// before the next command starts.
    ///
    /// A member that yields [`Message::Quit`] ends the sequence; the commands
    /// after it never run.
    pub fn sequence(cmds: impl IntoIterator<Item = Command<Msg>>) -> Self {
        let cmds: Vec<_> = cmds.into_iter().filter(|cmd| !cmd.is_none()).collect();
        if cmds.is_empty() {
            return Command::none();
        }
        Command {
            inner: CommandInner::Sequence(cmds),
        }
    }

    /// One-shot timer: fires once after `duration`, mapping the instant to a message.
    pub fn tick(
        duration: std::time::Duration,
        map: impl FnOnce(std::time::Instant) -> Msg + Send + 'static,
    ) -> Self {
        Command {
            inner: CommandInner::Future(Box::pin(async move {
                tokio::time::sleep(duration).await;
                Message::User(map(std::time::Instant::now()))
            })),
        }
    }

    /// Transform the message type (for composing models).
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Command<NewMsg> {
        self.map_with(Arc::new(f))
    }

    pub(crate) fn map_with<NewMsg: Send + 'static>(
        self,
        f: Arc<dyn Fn(Msg) -> NewMsg + Send + Sync>,
    ) -> Command<NewMsg> {
        let inner = match self.inner {
            CommandInner::None => CommandInner::None,
            CommandInner::Ready(msg) => CommandInner::Ready(msg.map_with(f)),
            CommandInner::Future(fut) => {
                CommandInner::Future(Box::pin(async move { fut.await.map_with(f) }))
            }
            CommandInner::Blocking(run) => {
                CommandInner::Blocking(Box::new(move || run().map_with(f)))
            }
            CommandInner::Batch(cmds) => CommandInner::Batch(
                cmds.into_iter()
                    .map(|cmd| cmd.map_with(f.clone()))
                    .collect(),
            ),
            CommandInner::Sequence(cmds) => CommandInner::Sequence(
                cmds.into_iter()
                    .map(|cmd| cmd.map_with(f.clone()))
                    .collect(),
            ),
        };
        Command { inner }
    }

    /// Run the command to completion and enqueue its message.
    ///
    /// Resolves to `true` if a [`Message::Quit`] was produced.  Executed on a
    /// task of its own; never called from the dispatch task.
    pub(crate) fn execute(self, outbox: Outbox<Msg>) -> BoxFuture<'static, bool> {
        Box::pin(async move {
            let msg = match self.inner {
                CommandInner::None => return false,
                CommandInner::Ready(msg) => msg,
                CommandInner::Future(fut) => fut.await,
                CommandInner::Blocking(run) => match tokio::task::spawn_blocking(run).await {
                    Ok(msg) => msg,
                    Err(err) => {
                        tracing::warn!(error = %err, "command failed without producing a message");
                        return false;
                    }
                },
                CommandInner::Batch(cmds) => Message::Batch(cmds),
                CommandInner::Sequence(cmds) => {
                    for cmd in cmds {
                        if outbox.is_stopped() {
                            break;
                        }
                        if cmd.execute(outbox.clone()).await {
                            return true;
                        }
                    }
                    return false;
                }
            };
            let quit = msg.is_quit();
            outbox.send(msg).await;
            quit
        })
    }

    // --- Inspection methods (useful for testing) ---

    /// Returns `true` if this is a no-op command.
    pub fn is_none(&self) -> bool {
        matches!(self.inner, CommandInner::None)
    }

    /// Returns `true` if this command stops the loop without doing any work.
    pub fn is_quit(&self) -> bool {
        matches!(self.inner, CommandInner::Ready(Message::Quit))
    }

    /// If this command is an immediate message, return it.
    pub fn into_message(self) -> Option<Msg> {
        match self.inner {
            CommandInner::Ready(Message::User(msg)) => Some(msg),
            _ => None,
        }
    }

    /// If this command is a batch, return the inner commands.
    pub fn into_batch(self) -> Option<Vec<Command<Msg>>> {
        match self.inner {
            CommandInner::Batch(cmds) => Some(cmds),
            _ => None,
        }
    }
}

impl<Msg: Send + 'static> Default for Command<Msg> {
    fn default() -> Self {
        Command::none()
    }
}
