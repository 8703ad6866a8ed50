use crate::command::Command;
use crate::message::Message;
use crate::model::Model;
use crate::queue::{self, Inbox, Outbox};
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Errors that can occur while configuring a [`Loop`] or its logging.
///
/// A running loop never fails: command failures travel as ordinary messages
/// and are handled in [`Model::update`].
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// A bounded queue was requested with a capacity of zero.
    #[error("queue capacity must be greater than zero")]
    ZeroCapacity,
    /// An I/O error, e.g. while opening a log file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A global tracing subscriber could not be installed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// Configuration options for a [`Loop`].
///
/// All fields have sensible defaults (see [`Default`] impl).  Use struct
/// update syntax to override only the options you need:
///
/// ```rust
/// use ea_core::LoopOptions;
///
/// let opts = LoopOptions {
///     capacity: Some(64),
///     name: "downloader".into(),
///     ..LoopOptions::default()
/// };
/// assert!(!opts.handle_signals);
/// ```
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Maximum number of queued messages (default: `None`, unbounded).
    ///
    /// When the queue is full, enqueueing waits for room, unless the loop
    /// stops first.
    pub capacity: Option<usize>,
    /// Stop the loop on Ctrl+C (default: false).
    pub handle_signals: bool,
    /// Name recorded on the loop's tracing span (default: `"ea"`).
    pub name: String,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            capacity: None,
            handle_signals: false,
            name: "ea".to_string(),
        }
    }
}

/// A cloneable handle to a [`Loop`] for external control.
///
/// `Handle` can be sent across threads or into async tasks.  Obtain one with
/// [`Loop::handle`] before calling [`Loop::run`].  Every method is safe to
/// call after the loop has stopped: messages are then dropped silently.
pub struct Handle<Msg: Send + 'static> {
    outbox: Outbox<Msg>,
}

impl<Msg: Send + 'static> Clone for Handle<Msg> {
    fn clone(&self) -> Self {
        Self {
            outbox: self.outbox.clone(),
        }
    }
}

impl<Msg: Send + 'static> Handle<Msg> {
    /// Send a message to the loop.
    ///
    /// On a bounded queue this waits for capacity.  Returns immediately,
    /// without enqueueing, once the loop has stopped.
    pub async fn send(&self, msg: Msg) {
        self.outbox.send(Message::User(msg)).await;
    }

    /// Send a message without waiting.
    ///
    /// Returns `false`, dropping the message, if the queue is full or the
    /// loop has stopped.
    pub fn try_send(&self, msg: Msg) -> bool {
        self.outbox.try_send(Message::User(msg))
    }

    /// Enqueue a [`Message::Quit`].
    ///
    /// Unlike [`stop`](Handle::stop), messages this handle sent earlier are
    /// still processed before the loop exits.
    pub async fn quit(&self) {
        self.outbox.send(Message::Quit).await;
    }

    /// Stop the loop immediately, discarding anything still queued.
    ///
    /// Idempotent; safe to call from any task or thread.
    pub fn stop(&self) {
        self.outbox.stop();
    }

    /// Returns `true` once the loop has stopped (or [`stop`](Handle::stop)
    /// was called).
    pub fn is_stopped(&self) -> bool {
        self.outbox.is_stopped()
    }

    /// Wait until the loop stops.
    pub async fn stopped(&self) {
        self.outbox.stop_token().cancelled().await;
    }

    /// Pipe every item of `stream` into the loop.
    ///
    /// Spawns a task that forwards items in order until the stream ends or
    /// the loop stops.  Abort it early through the returned handle.  Must be
    /// called from within a tokio runtime.
    pub fn forward<S>(&self, stream: S) -> AbortHandle
    where
        S: Stream<Item = Msg> + Send + 'static,
    {
        let outbox = self.outbox.clone();
        let task = tokio::spawn(async move {
            futures::pin_mut!(stream);
            loop {
                let next = tokio::select! {
                    biased;

                    _ = outbox.stop_token().cancelled() => break,
                    next = stream.next() => next,
                };
                match next {
                    Some(msg) => {
                        if !outbox.send(Message::User(msg)).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
        });
        task.abort_handle()
    }
}

type Filter<Msg> = Box<dyn Fn(Msg) -> Option<Msg> + Send>;
type Observer<M> = Box<dyn FnMut(&M) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    Stopped,
    Signal,
    Quit,
    Closed,
}

/// The update loop.  Owns a [`Model`] and its message queue, and drives
/// the model until it quits, is stopped, or is cancelled.
///
/// A single dispatch task pulls messages off the queue one at a time:
///
/// * [`Message::Quit`] ends the loop; anything queued behind it is dropped.
/// * [`Message::Batch`] launches each of its commands on its own task.
/// * Any other message goes through the optional filter into
///   [`Model::update`]; observers then see the new state and the returned
///   command is launched on its own task.
///
/// Commands feed their results back into the same queue, so `update` never
/// overlaps with itself, while commands run freely in parallel.
///
/// # Example
///
/// ```rust,ignore
/// use ea_core::{Command, Loop};
/// use tokio_util::sync::CancellationToken;
///
/// let ea = Loop::new(Counter { count: 0 });
/// let handle = ea.handle();
/// handle.send(Msg::Increment).await;
/// handle.quit().await;
///
/// let model = ea.run(CancellationToken::new(), Command::none()).await;
/// assert_eq!(model.count, 1);
/// ```
pub struct Loop<M: Model> {
    model: M,
    outbox: Outbox<M::Message>,
    inbox: Inbox<M::Message>,
    options: LoopOptions,
    filter: Option<Filter<M::Message>>,
    observers: Vec<Observer<M>>,
    updates: u64,
}

impl<M: Model> Loop<M> {
    /// Create a loop with an unbounded queue and default options.
    pub fn new(model: M) -> Self {
        Self::build(model, LoopOptions::default())
    }

    /// Create a loop with custom options.
    ///
    /// Returns an error if the options are invalid.
    pub fn with_options(model: M, options: LoopOptions) -> Result<Self, LoopError> {
        if options.capacity == Some(0) {
            return Err(LoopError::ZeroCapacity);
        }
        Ok(Self::build(model, options))
    }

    fn build(model: M, options: LoopOptions) -> Self {
        let (outbox, inbox) = queue::channel(options.capacity, CancellationToken::new());
        Self {
            model,
            outbox,
            inbox,
            options,
            filter: None,
            observers: Vec::new(),
            updates: 0,
        }
    }

    /// Set a message filter. Messages pass through the filter before reaching `update`.
    /// Return `Some(msg)` to pass (possibly transformed), `None` to drop.
    pub fn with_filter(
        mut self,
        filter: impl Fn(M::Message) -> Option<M::Message> + Send + 'static,
    ) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Register an observer, called with the new state after every update.
    ///
    /// Observers run on the dispatch task and hold up every later message
    /// while they run.  Messages dropped by a Quit are never observed.
    pub fn on_update(mut self, observer: impl FnMut(&M) + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Get a receiver that always holds the latest committed model.
    ///
    /// The receiver can be read from any task while the loop runs.
    pub fn snapshots(&mut self) -> watch::Receiver<M>
    where
        M: Clone + Sync,
    {
        let (tx, rx) = watch::channel(self.model.clone());
        self.observers.push(Box::new(move |model: &M| {
            tx.send_replace(model.clone());
        }));
        rx
    }

    /// Get a handle for external control (send messages, quit, stop).
    pub fn handle(&self) -> Handle<M::Message> {
        Handle {
            outbox: self.outbox.clone(),
        }
    }

    /// Get a shared reference to the model before the loop runs.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the loop until it quits, is stopped, or `cancel` fires.
    ///
    /// `init` is launched before the first message is awaited, exactly like
    /// a command returned from `update`; pass [`Command::none()`] to skip it.
    /// Returns the model as of the moment the loop stopped.  Commands still
    /// in flight are not awaited; whatever they produce later is dropped.
    pub async fn run(self, cancel: CancellationToken, init: Command<M::Message>) -> M {
        let span = tracing::debug_span!("loop", name = %self.options.name);
        self.event_loop(cancel, init).instrument(span).await
    }

    async fn event_loop(mut self, cancel: CancellationToken, init: Command<M::Message>) -> M {
        tracing::debug!(capacity = ?self.options.capacity, "loop started");
        self.launch(init);

        let stopped = self.outbox.stop_token().clone();
        let handle_signals = self.options.handle_signals;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let reason = loop {
            let msg = tokio::select! {
                biased;

                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = stopped.cancelled() => break StopReason::Stopped,
                _ = &mut ctrl_c, if handle_signals => {
                    tracing::debug!("received ctrl+c signal");
                    break StopReason::Signal;
                }
                msg = self.inbox.recv() => msg,
            };

            match msg {
                None => break StopReason::Closed,
                Some(Message::Quit) => break StopReason::Quit,
                Some(Message::Batch(cmds)) => {
                    tracing::trace!(commands = cmds.len(), "launching batch");
                    for cmd in cmds {
                        self.launch(cmd);
                    }
                }
                Some(Message::User(msg)) => self.process_message(msg),
            }
        };

        // Stop first so in-flight commands drop their results instead of
        // queueing behind a closed inbox.
        self.outbox.stop();
        let discarded = self.inbox.close();
        tracing::debug!(?reason, updates = self.updates, discarded, "loop stopped");

        self.model
    }

    fn process_message(&mut self, msg: M::Message) {
        // Apply filter if set
        let msg = if let Some(ref filter) = self.filter {
            match filter(msg) {
                Some(msg) => msg,
                None => {
                    tracing::trace!("message filtered out");
                    return;
                }
            }
        } else {
            msg
        };

        let cmd = self.model.update(msg);
        self.updates += 1;
        tracing::trace!(update = self.updates, "model updated");

        for observer in &mut self.observers {
            observer(&self.model);
        }

        self.launch(cmd);
    }

    fn launch(&self, cmd: Command<M::Message>) {
        if cmd.is_none() {
            return;
        }
        tokio::spawn(cmd.execute(self.outbox.clone()));
    }
}
