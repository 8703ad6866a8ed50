//! # Fan-out Example
//!
//! Launches several simulated downloads at once with `Command::batch` and
//! collects their results as they arrive, in whatever order they finish.
//! Failures come back as ordinary messages; the model decides to retry.
//! Press Ctrl+C to stop early.
//!
//! Run with: `cargo run --example fan_out`

use ea::{CancellationToken, Command, Loop, LoopOptions, Model};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Default)]
struct Downloads {
    results: BTreeMap<String, usize>,
    attempts: BTreeMap<String, u32>,
    pending: usize,
}

#[derive(Debug)]
enum Msg {
    Start(Vec<String>),
    Fetched {
        name: String,
        result: Result<usize, String>,
    },
}

fn fetch(name: String, attempt: u32) -> Command<Msg> {
    Command::perform(
        async move {
            let delay = 50 + (name.len() as u64 * 37) % 200;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            // Every odd-length name fails on its first attempt.
            let result = if name.len() % 2 == 1 && attempt == 1 {
                Err(format!("{name}: connection reset"))
            } else {
                Ok(name.len() * 1024)
            };
            (name, result)
        },
        |(name, result)| Msg::Fetched { name, result },
    )
}

impl Model for Downloads {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match msg {
            Msg::Start(names) => {
                self.pending = names.len();
                Command::batch(names.into_iter().map(|name| {
                    self.attempts.insert(name.clone(), 1);
                    fetch(name, 1)
                }))
            }
            Msg::Fetched {
                name,
                result: Ok(bytes),
            } => {
                tracing::info!(%name, bytes, "fetched");
                println!("{name}: {bytes} bytes");
                self.results.insert(name, bytes);
                self.pending -= 1;
                if self.pending == 0 {
                    Command::quit()
                } else {
                    Command::none()
                }
            }
            Msg::Fetched {
                name,
                result: Err(err),
            } => {
                println!("{err}, retrying");
                let attempt = self.attempts.entry(name.clone()).or_insert(1);
                *attempt += 1;
                fetch(name, *attempt)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = LoopOptions {
        capacity: Some(16),
        handle_signals: true,
        name: "fan_out".into(),
    };
    let ea = Loop::with_options(Downloads::default(), options)?;

    let names = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"]
        .into_iter()
        .map(String::from)
        .collect();
    let model = ea
        .run(CancellationToken::new(), Command::message(Msg::Start(names)))
        .await;

    println!(
        "done: {} of {} downloads, {} bytes",
        model.results.len(),
        model.attempts.len(),
        model.results.values().sum::<usize>()
    );
    Ok(())
}
