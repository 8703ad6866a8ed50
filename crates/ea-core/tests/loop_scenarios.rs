#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use ea_core::{Command, Loop, LoopOptions, Message, Model};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration, Instant};
use tokio_util::sync::CancellationToken;

async fn run_bounded<M: Model>(ea: Loop<M>, init: Command<M::Message>) -> M {
    timeout(Duration::from_secs(5), ea.run(CancellationToken::new(), init))
        .await
        .expect("loop should stop within 5 seconds")
}

// Counter: increments, quits on request

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    count: i64,
}

#[derive(Debug)]
enum CounterMsg {
    Increment,
    Go,
}

impl Model for Counter {
    type Message = CounterMsg;

    fn update(&mut self, msg: CounterMsg) -> Command<CounterMsg> {
        match msg {
            CounterMsg::Increment => {
                self.count += 1;
                Command::none()
            }
            CounterMsg::Go => Command::from_fn(|| Message::Quit),
        }
    }
}

#[tokio::test]
async fn three_increments_yield_three() {
    let ea = Loop::new(Counter { count: 0 });
    let handle = ea.handle();
    for _ in 0..3 {
        handle.send(CounterMsg::Increment).await;
    }
    handle.quit().await;

    let model = run_bounded(ea, Command::none()).await;
    assert_eq!(model, Counter { count: 3 });
}

#[tokio::test]
async fn command_returning_quit_stops_with_unchanged_model() {
    let ea = Loop::new(Counter { count: 9 });
    let handle = ea.handle();
    let task = tokio::spawn(ea.run(CancellationToken::new(), Command::none()));

    handle.send(CounterMsg::Go).await;

    let model = timeout(Duration::from_secs(5), task)
        .await
        .expect("loop should quit")
        .unwrap();
    assert_eq!(model, Counter { count: 9 });
}

#[tokio::test]
async fn quit_discards_messages_behind_it() {
    let ea = Loop::new(Counter { count: 0 });
    let handle = ea.handle();
    handle.send(CounterMsg::Increment).await;
    handle.quit().await;
    handle.send(CounterMsg::Increment).await;
    handle.send(CounterMsg::Increment).await;

    let model = run_bounded(ea, Command::none()).await;
    assert_eq!(model.count, 1);
}

#[tokio::test]
async fn initial_quit_stops_before_any_update() {
    let ea = Loop::new(Counter { count: 0 });
    let handle = ea.handle();
    handle.send(CounterMsg::Increment).await;

    // The quit races the queued increment; either way the loop stops.
    let model = run_bounded(ea, Command::quit()).await;
    assert!(model.count <= 1);
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn cancellation_skips_queued_messages() {
    let ea = Loop::new(Counter { count: 0 });
    let handle = ea.handle();
    for _ in 0..1000 {
        handle.send(CounterMsg::Increment).await;
    }

    let cancel = CancellationToken::new();
    cancel.cancel();
    let model = timeout(Duration::from_secs(1), ea.run(cancel, Command::none()))
        .await
        .expect("cancelled loop should return promptly");
    assert_eq!(model.count, 0);
}

#[tokio::test]
async fn cancellation_does_not_wait_for_in_flight_commands() {
    let ea = Loop::new(Counter { count: 0 });
    let cancel = CancellationToken::new();
    let slow = Command::perform(sleep(Duration::from_secs(30)), |_| CounterMsg::Increment);

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
    };

    let start = Instant::now();
    let model = timeout(Duration::from_secs(5), ea.run(cancel, slow))
        .await
        .expect("loop should stop on cancellation");
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(model.count, 0);
    canceller.await.unwrap();
}

#[tokio::test]
async fn sends_after_stop_are_silent() {
    let opts = LoopOptions {
        capacity: Some(1),
        ..LoopOptions::default()
    };
    let ea = Loop::with_options(Counter { count: 0 }, opts).unwrap();
    let handle = ea.handle();
    handle.send(CounterMsg::Go).await;

    let late = Command::perform(sleep(Duration::from_millis(200)), |_| CounterMsg::Increment);
    let model = run_bounded(ea, late).await;
    assert_eq!(model.count, 0);
    assert!(handle.is_stopped());

    // Let the in-flight command finish and try to enqueue.
    sleep(Duration::from_millis(300)).await;

    timeout(Duration::from_secs(1), async {
        handle.send(CounterMsg::Increment).await;
        handle.send(CounterMsg::Increment).await;
        handle.quit().await;
    })
    .await
    .expect("sends after stop must not block");
    assert!(!handle.try_send(CounterMsg::Increment));
}

#[tokio::test]
async fn sends_after_cancellation_are_silent() {
    let opts = LoopOptions {
        capacity: Some(1),
        ..LoopOptions::default()
    };
    let ea = Loop::with_options(Counter { count: 0 }, opts).unwrap();
    let handle = ea.handle();
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        }
    });

    let in_flight = Command::perform(sleep(Duration::from_millis(100)), |_| CounterMsg::Increment);
    let model = timeout(Duration::from_secs(5), ea.run(cancel, in_flight))
        .await
        .expect("loop should stop on cancellation");
    assert_eq!(model.count, 0);
    assert!(handle.is_stopped());

    // The in-flight command finishes and enqueues into the stopped loop.
    sleep(Duration::from_millis(200)).await;

    timeout(Duration::from_secs(1), async {
        handle.send(CounterMsg::Increment).await;
        handle.send(CounterMsg::Increment).await;
    })
    .await
    .expect("sends after cancellation must not block");
    assert!(!handle.try_send(CounterMsg::Increment));
}

#[tokio::test]
async fn external_threads_can_enqueue() {
    let ea = Loop::new(Counter { count: 0 });
    let handle = ea.handle();
    let task = tokio::spawn(ea.run(CancellationToken::new(), Command::none()));

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    assert!(handle.try_send(CounterMsg::Increment));
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }
    handle.quit().await;

    let model = timeout(Duration::from_secs(5), task)
        .await
        .expect("loop should quit")
        .unwrap();
    assert_eq!(model.count, 100);
}

#[tokio::test]
async fn deadline_stops_idle_loop() {
    let ea = Loop::new(Counter { count: 0 });
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        }
    });

    let model = timeout(Duration::from_secs(5), ea.run(cancel, Command::none()))
        .await
        .expect("loop should stop at the deadline");
    assert_eq!(model.count, 0);
}

// Fan-out: batches of concurrent commands

#[derive(Default)]
struct Fan {
    received: Vec<String>,
    expected: usize,
}

#[derive(Debug)]
enum FanMsg {
    Fan,
    Got(String),
}

impl Model for Fan {
    type Message = FanMsg;

    fn update(&mut self, msg: FanMsg) -> Command<FanMsg> {
        match msg {
            FanMsg::Fan => {
                self.expected = 2;
                let cmd_a = Command::from_fn(|| Message::User(FanMsg::Got("a".into())));
                let cmd_b = Command::perform(
                    async {
                        sleep(Duration::from_millis(5)).await;
                        "b".to_string()
                    },
                    FanMsg::Got,
                );
                Command::batch(vec![cmd_a, cmd_b])
            }
            FanMsg::Got(s) => {
                self.received.push(s);
                if self.received.len() == self.expected {
                    Command::quit()
                } else {
                    Command::none()
                }
            }
        }
    }
}

#[tokio::test]
async fn batch_delivers_every_result_once() {
    let ea = Loop::new(Fan::default());
    let model = run_bounded(ea, Command::message(FanMsg::Fan)).await;

    let mut received = model.received;
    received.sort();
    assert_eq!(received, vec!["a", "b"]);
}

#[tokio::test]
async fn empty_batch_has_no_effect() {
    assert!(Command::<FanMsg>::batch(vec![]).is_none());
    assert!(Command::<FanMsg>::batch(vec![Command::none(), Command::none()]).is_none());

    let ea = Loop::new(Fan::default());
    let handle = ea.handle();
    let init = Command::sequence(vec![
        Command::batch(vec![Command::none()]),
        Command::message(FanMsg::Got("only".into())),
    ]);
    let task = tokio::spawn(ea.run(CancellationToken::new(), init));

    sleep(Duration::from_millis(20)).await;
    handle.quit().await;
    let model = timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(model.received, vec!["only"]);
}

// Serialization: many commands completing at once

struct Tally {
    seen: HashMap<usize, usize>,
    total: usize,
    in_update: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

#[derive(Debug)]
enum TallyMsg {
    Start(usize),
    Done(usize),
}

impl Model for Tally {
    type Message = TallyMsg;

    fn update(&mut self, msg: TallyMsg) -> Command<TallyMsg> {
        if self.in_update.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let cmd = match msg {
            TallyMsg::Start(n) => {
                self.total = n;
                Command::batch((0..n).map(|i| {
                    Command::perform(
                        async move {
                            sleep(Duration::from_millis((i % 7) as u64)).await;
                            i
                        },
                        TallyMsg::Done,
                    )
                }))
            }
            TallyMsg::Done(i) => {
                *self.seen.entry(i).or_default() += 1;
                if self.seen.values().sum::<usize>() == self.total {
                    Command::quit()
                } else {
                    Command::none()
                }
            }
        };
        self.in_update.store(false, Ordering::SeqCst);
        cmd
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn updates_never_overlap_under_concurrent_completion() {
    let overlaps = Arc::new(AtomicUsize::new(0));
    let ea = Loop::new(Tally {
        seen: HashMap::new(),
        total: 0,
        in_update: Arc::new(AtomicBool::new(false)),
        overlaps: overlaps.clone(),
    });

    let updates = Arc::new(AtomicUsize::new(0));
    let ea = ea.on_update({
        let updates = updates.clone();
        move |_: &Tally| {
            updates.fetch_add(1, Ordering::SeqCst);
        }
    });

    let model = run_bounded(ea, Command::message(TallyMsg::Start(200))).await;

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(model.seen.len(), 200);
    assert!(model.seen.values().all(|&count| count == 1));
    // One Start plus one update per result.
    assert_eq!(updates.load(Ordering::SeqCst), 201);
}
