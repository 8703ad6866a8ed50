use crate::command::Command;

/// A value travelling through the loop's queue.
///
/// Two variants are reserved for the runtime itself and never reach
/// [`Model::update`](crate::Model::update):
///
/// * [`Quit`](Message::Quit) stops the loop as soon as it is dequeued.
///   Anything still queued behind it is discarded.
/// * [`Batch`](Message::Batch) carries commands that are launched
///   concurrently, each on its own task.
///
/// Everything else is a [`User`](Message::User) message, handed to the model
/// unchanged.  Most code never builds a `Message` directly: commands such as
/// [`Command::message`], [`Command::quit`] and [`Command::batch`] produce them,
/// and `Msg` converts into `Message<Msg>` through [`From`].
pub enum Message<Msg: Send + 'static> {
    /// Terminate the loop.
    Quit,
    /// Launch every command concurrently.
    Batch(Vec<Command<Msg>>),
    /// An ordinary domain message.
    User(Msg),
}

impl<Msg: Send + 'static> Message<Msg> {
    /// Returns `true` for [`Message::Quit`].
    pub fn is_quit(&self) -> bool {
        matches!(self, Message::Quit)
    }

    /// Returns `true` for [`Message::Batch`].
    pub fn is_batch(&self) -> bool {
        matches!(self, Message::Batch(_))
    }

    /// Returns the domain payload, if this is an ordinary message.
    pub fn into_user(self) -> Option<Msg> {
        match self {
            Message::User(msg) => Some(msg),
            _ => None,
        }
    }

    /// Transform the payload type.  Control messages keep their meaning;
    /// commands inside a batch are mapped as well.
    pub fn map<NewMsg: Send + 'static>(
        self,
        f: impl Fn(Msg) -> NewMsg + Send + Sync + 'static,
    ) -> Message<NewMsg> {
        self.map_with(std::sync::Arc::new(f))
    }

    pub(crate) fn map_with<NewMsg: Send + 'static>(
        self,
        f: std::sync::Arc<dyn Fn(Msg) -> NewMsg + Send + Sync>,
    ) -> Message<NewMsg> {
        match self {
            Message::Quit => Message::Quit,
            Message::Batch(cmds) => Message::Batch(
                cmds.into_iter()
                    .map(|cmd| cmd.map_with(f.clone()))
                    .collect(),
            ),
            Message::User(msg) => Message::User(f(msg)),
        }
    }
}

impl<Msg: Send + 'static> From<Msg> for Message<Msg> {
    fn from(msg: Msg) -> Self {
        Message::User(msg)
    }
}

impl<Msg: Send + std::fmt::Debug + 'static> std::fmt::Debug for Message<Msg> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Quit => f.write_str("Quit"),
            Message::Batch(cmds) => write!(f, "Batch({} commands)", cmds.len()),
            Message::User(msg) => f.debug_tuple("User").field(msg).finish(),
        }
    }
}
