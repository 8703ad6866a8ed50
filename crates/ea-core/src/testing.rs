use crate::command::{Command, CommandInner};
use crate::message::Message;
use crate::model::Model;
use std::collections::VecDeque;

/// A headless test harness that drives a [`Model`] without a runtime.
///
/// `TestLoop` exercises `update` in a plain `#[test]` function -- no tokio
/// runtime required.  Commands that can run synchronously
/// ([`Command::message`], [`Command::quit`], [`Command::from_fn`], and
/// batches or sequences of them) are collected in order and can be flushed
/// with [`drain_messages`](TestLoop::drain_messages); async commands are
/// silently ignored.
///
/// A quit behaves like it does in a real [`Loop`](crate::Loop): it waits its
/// turn in the queue, then discards everything behind it, and later sends
/// are ignored.
///
/// # Example
///
/// ```rust,ignore
/// use ea_core::testing::TestLoop;
///
/// let mut ea = TestLoop::new(Counter { count: 0 });
/// ea.send(Msg::Increment);
/// ea.send(Msg::Increment);
/// assert_eq!(ea.model().count, 2);
/// ```
pub struct TestLoop<M: Model> {
    model: M,
    pending_messages: VecDeque<Message<M::Message>>,
    quit: bool,
    updates: usize,
}

impl<M: Model> TestLoop<M> {
    /// Create a harness around `model`.
    pub fn new(model: M) -> Self {
        Self {
            model,
            pending_messages: VecDeque::new(),
            quit: false,
            updates: 0,
        }
    }

    /// Create a harness and collect the messages of an initial command, as
    /// [`Loop::run`](crate::Loop::run) would launch it.
    pub fn with_init(model: M, init: Command<M::Message>) -> Self {
        let mut harness = Self::new(model);
        harness.collect_sync_messages(init);
        harness
    }

    /// Send a message.
    ///
    /// With nothing pending this triggers a single update cycle right away;
    /// otherwise the message joins the back of the queue, behind anything
    /// (including a quit) collected earlier.  Ignored once the model has
    /// quit.  Synchronous commands returned by `update` are enqueued; call
    /// [`drain_messages`](TestLoop::drain_messages) to flush them.
    pub fn send(&mut self, msg: M::Message) {
        if self.quit {
            return;
        }
        if !self.pending_messages.is_empty() {
            self.pending_messages.push_back(Message::User(msg));
            return;
        }
        self.dispatch(msg);
    }

    fn dispatch(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.updates += 1;
        self.collect_sync_messages(cmd);
    }

    /// Process pending messages in order until none are left or the model
    /// quits.
    ///
    /// Useful for testing command chains where one update produces a
    /// message that triggers another.
    pub fn drain_messages(&mut self) {
        while let Some(msg) = self.pending_messages.pop_front() {
            match msg {
                Message::Quit => {
                    self.quit = true;
                    self.pending_messages.clear();
                }
                Message::User(msg) => self.dispatch(msg),
                // Batches are flattened when collected
                Message::Batch(_) => {}
            }
        }
    }

    /// Get a shared reference to the model for assertions.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the model for direct test setup.
    ///
    /// This bypasses the normal message-driven update cycle, which can be
    /// useful for arranging test state before sending messages.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Consume the harness and return the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Returns `true` once a quit has been drained.
    pub fn has_quit(&self) -> bool {
        self.quit
    }

    /// Number of messages waiting to be drained.
    pub fn pending(&self) -> usize {
        self.pending_messages.len()
    }

    /// Number of times `update` has been called.
    pub fn updates(&self) -> usize {
        self.updates
    }

    fn collect_sync_messages(&mut self, cmd: Command<M::Message>) {
        match cmd.inner {
            CommandInner::None => {}
            CommandInner::Ready(msg) => self.collect_message(msg),
            CommandInner::Blocking(run) => self.collect_message(run()),
            CommandInner::Batch(cmds) | CommandInner::Sequence(cmds) => {
                for cmd in cmds {
                    self.collect_sync_messages(cmd);
                }
            }
            // Async commands can't be executed synchronously in tests
            CommandInner::Future(_) => {}
        }
    }

    fn collect_message(&mut self, msg: Message<M::Message>) {
        match msg {
            Message::Batch(cmds) => {
                for cmd in cmds {
                    self.collect_sync_messages(cmd);
                }
            }
            msg => self.pending_messages.push_back(msg),
        }
    }
}
