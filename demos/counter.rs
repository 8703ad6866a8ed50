//! # Counter Example
//!
//! A minimal counter demonstrating the core ea loop:
//! - Implementing the [`Model`] trait
//! - Feeding an external event source into the loop with `Handle::forward`
//! - Watching committed state from another task with `Loop::snapshots`
//! - Stopping from inside `update` with `Command::quit()`
//!
//! Run with: `cargo run --example counter [log-file]`

use ea::{CancellationToken, Command, Loop, Model};
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

#[derive(Clone)]
struct Counter {
    count: i64,
    limit: i64,
}

#[derive(Debug)]
enum Msg {
    Tick,
    Reset,
}

impl Model for Counter {
    type Message = Msg;

    // Each tick bumps the count; once the limit is reached the loop quits
    // and `run` hands the final model back to `main`.
    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Tick => self.count += 1,
            Msg::Reset => self.count = 0,
        }
        if self.count >= self.limit {
            return Command::quit();
        }
        Command::none()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = std::env::args().nth(1) {
        ea::log_to_file(path)?;
    }

    let mut ea = Loop::new(Counter { count: 0, limit: 5 });
    let mut snapshots = ea.snapshots();
    let handle = ea.handle();

    let ticks = IntervalStream::new(tokio::time::interval(Duration::from_millis(200)))
        .map(|_| Msg::Tick);
    handle.forward(ticks);
    handle.send(Msg::Reset).await;

    // The watch sender lives inside the loop; `changed` errors once it is gone.
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            println!("count: {}", snapshots.borrow().count);
        }
    });

    let model = ea.run(CancellationToken::new(), Command::none()).await;
    printer.await?;
    println!("Final count: {}", model.count);
    Ok(())
}
