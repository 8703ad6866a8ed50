use crate::command::Command;

/// The state machine driven by a [`Loop`](crate::Loop), following the
/// [Elm Architecture].
///
/// The loop owns the model exclusively and calls [`update`](Model::update)
/// once for every ordinary message it dequeues, strictly one call at a time.
/// `update` is the only place where state changes; everything that touches
/// the outside world goes into the returned [`Command`], which the loop runs
/// on a separate task and whose result comes back as a new message.
///
/// # Example
///
/// ```rust
/// use ea_core::{Command, Model};
///
/// struct Counter {
///     count: i32,
/// }
///
/// #[derive(Debug)]
/// enum Msg {
///     Increment,
///     Decrement,
///     Done,
/// }
///
/// impl Model for Counter {
///     type Message = Msg;
///
///     fn update(&mut self, msg: Msg) -> Command<Msg> {
///         match msg {
///             Msg::Increment => self.count += 1,
///             Msg::Decrement => self.count -= 1,
///             Msg::Done => return Command::quit(),
///         }
///         Command::none()
///     }
/// }
/// ```
///
/// [Elm Architecture]: https://guide.elm-lang.org/architecture/
pub trait Model: Sized + Send + 'static {
    /// The application's message type.
    ///
    /// Every event that can affect the state is a value of this type.
    /// Messages arrive through a [`Handle`](crate::Handle) or as the result
    /// of a [`Command`].
    type Message: Send + 'static;

    /// Process a message, mutate state, and return a command for side effects.
    ///
    /// The new state is committed as soon as this returns, before the
    /// command is launched.  Return [`Command::none()`] when there is nothing
    /// to do.
    ///
    /// `update` runs on the dispatch task: while it runs, no other message
    /// is processed.  It must return promptly and must not panic.
    fn update(&mut self, msg: Self::Message) -> Command<Self::Message>;
}
