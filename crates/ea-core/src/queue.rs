//! The loop's inbox: many producers, one consumer.
//!
//! Producers hold an [`Outbox`] (cloned into every command task and every
//! [`Handle`](crate::Handle)); the dispatch task owns the single [`Inbox`].
//! Order is preserved per producer only.  Once the shared stop token is
//! cancelled every send is dropped silently, including sends already waiting
//! for capacity on a bounded queue.

use crate::message::Message;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Create a connected outbox/inbox pair.
///
/// `capacity` of `None` gives an unbounded queue.  A bounded capacity must be
/// non-zero; [`Loop::with_options`](crate::Loop::with_options) checks this
/// before calling here.
pub(crate) fn channel<Msg: Send + 'static>(
    capacity: Option<usize>,
    stopped: CancellationToken,
) -> (Outbox<Msg>, Inbox<Msg>) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                Outbox {
                    tx: Sender::Bounded(tx),
                    stopped,
                },
                Inbox::Bounded(rx),
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Outbox {
                    tx: Sender::Unbounded(tx),
                    stopped,
                },
                Inbox::Unbounded(rx),
            )
        }
    }
}

enum Sender<Msg: Send + 'static> {
    Bounded(mpsc::Sender<Message<Msg>>),
    Unbounded(mpsc::UnboundedSender<Message<Msg>>),
}

impl<Msg: Send + 'static> Clone for Sender<Msg> {
    fn clone(&self) -> Self {
        match self {
            Sender::Bounded(tx) => Sender::Bounded(tx.clone()),
            Sender::Unbounded(tx) => Sender::Unbounded(tx.clone()),
        }
    }
}

/// Producer side of the queue.
pub(crate) struct Outbox<Msg: Send + 'static> {
    tx: Sender<Msg>,
    stopped: CancellationToken,
}

impl<Msg: Send + 'static> Clone for Outbox<Msg> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stopped: self.stopped.clone(),
        }
    }
}

impl<Msg: Send + 'static> Outbox<Msg> {
    /// Enqueue a message, waiting for capacity if the queue is bounded.
    ///
    /// Returns `false` (and drops the message) once the loop has stopped.
    pub(crate) async fn send(&self, msg: Message<Msg>) -> bool {
        if self.stopped.is_cancelled() {
            tracing::trace!("loop stopped, dropping message");
            return false;
        }
        let sent = match &self.tx {
            Sender::Unbounded(tx) => tx.send(msg).is_ok(),
            Sender::Bounded(tx) => tokio::select! {
                biased;

                _ = self.stopped.cancelled() => false,
                res = tx.send(msg) => res.is_ok(),
            },
        };
        if !sent {
            tracing::trace!("loop stopped, dropping message");
        }
        sent
    }

    /// Enqueue without waiting.  Returns `false` if the queue is full or the
    /// loop has stopped.
    pub(crate) fn try_send(&self, msg: Message<Msg>) -> bool {
        if self.stopped.is_cancelled() {
            return false;
        }
        match &self.tx {
            Sender::Unbounded(tx) => tx.send(msg).is_ok(),
            Sender::Bounded(tx) => tx.try_send(msg).is_ok(),
        }
    }

    pub(crate) fn stop(&self) {
        self.stopped.cancel();
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    pub(crate) fn stop_token(&self) -> &CancellationToken {
        &self.stopped
    }
}

/// Consumer side of the queue, owned by the dispatch task.
pub(crate) enum Inbox<Msg: Send + 'static> {
    Bounded(mpsc::Receiver<Message<Msg>>),
    Unbounded(mpsc::UnboundedReceiver<Message<Msg>>),
}

impl<Msg: Send + 'static> Inbox<Msg> {
    /// Wait for the next message.  `None` means every producer is gone.
    pub(crate) async fn recv(&mut self) -> Option<Message<Msg>> {
        match self {
            Inbox::Bounded(rx) => rx.recv().await,
            Inbox::Unbounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Option<Message<Msg>> {
        match self {
            Inbox::Bounded(rx) => rx.try_recv().ok(),
            Inbox::Unbounded(rx) => rx.try_recv().ok(),
        }
    }

    /// Close the queue and throw away whatever is still in it.
    ///
    /// Returns the number of discarded messages.
    pub(crate) fn close(&mut self) -> usize {
        match self {
            Inbox::Bounded(rx) => rx.close(),
            Inbox::Unbounded(rx) => rx.close(),
        }
        let mut discarded = 0;
        while self.try_recv().is_some() {
            discarded += 1;
        }
        discarded
    }
}
