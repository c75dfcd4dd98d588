//! The single serialization lane: one dedicated task owns the `Game` and
//! runs every mutating API call and every internal tick, strictly in the
//! order they were enqueued. Static file requests never touch this
//! channel.

use crate::engine::game::Game;
use crate::rng::RandomSource;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Command = Box<dyn FnOnce(&mut Game) + Send>;

#[derive(Clone)]
pub struct Lane {
    sender: mpsc::Sender<Command>,
}

impl Lane {
    /// Spawns the owning task and returns a cheaply cloneable handle.
    /// `rng` is shared read-only by every closure dispatched on the lane.
    pub fn spawn(mut game: Game, rng: Arc<dyn RandomSource>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Command>(256);

        tokio::spawn(async move {
            let _rng_keepalive = rng;
            while let Some(cmd) = rx.recv().await {
                cmd(&mut game);
            }
            tracing::debug!("game lane shut down: channel closed");
        });

        Self { sender: tx }
    }

    /// Enqueues `f` and awaits its result. Ordering relative to other
    /// `run`/`tick` calls on this `Lane` is exactly enqueue order.
    pub async fn run<T, F>(&self, f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(&mut Game) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd: Command = Box::new(move |game| {
            let result = f(game);
            let _ = reply_tx.send(result);
        });
        self.sender
            .send(cmd)
            .await
            .expect("game lane task has not been dropped");
        reply_rx.await.expect("game lane task did not drop the reply sender")
    }
}

/// Spawns the internal ticker: every `period`, enqueues a `SetTimeShift`
/// command onto `lane`. Runs until the process exits; there is no
/// external tick endpoint while this task is alive (see `--tick-period`).
pub fn spawn_internal_ticker(lane: Lane, period: std::time::Duration, rng: Arc<dyn RandomSource>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last = tokio::time::Instant::now();
        loop {
            interval.tick().await;
            let now = tokio::time::Instant::now();
            let dt = (now - last).as_secs_f64();
            last = now;
            let rng = rng.clone();
            let tick_start = std::time::Instant::now();
            lane.run(move |game| {
                game.set_time_shift(dt, rng.as_ref());
            })
            .await;
            crate::metrics::TICK_DURATION_MS.observe(tick_start.elapsed().as_secs_f64() * 1000.0);
        }
    });
}
