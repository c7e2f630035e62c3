// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::dag::DependencyResolver;
use crate::engine::event_handlers::handle_pool_event;
use crate::engine::tick::poll_tick;
use crate::engine::SchedulerEvent;
use crate::exec::{ExecutionPool, PoolEvent};
use crate::store::TaskStore;

/// Sent by `Scheduler::stop`; the actor replies on the inner sender once the
/// pool is shut down and every cancellation has been persisted.
pub type StopRequest = oneshot::Sender<()>;

/// The scheduling actor.
///
/// Owns the resolver, the pool and the receiving ends of the pool and stop
/// channels. Ticks run inline in [`SchedulerRuntime::run`], so two ticks can
/// never overlap. Out-of-band tick requests go through a [`Notify`], which
/// holds at most one permit: requests made while a tick is in progress
/// collapse into a single follow-up tick.
pub struct SchedulerRuntime {
    store: Arc<dyn TaskStore>,
    resolver: DependencyResolver,
    pool: ExecutionPool,
    pool_rx: mpsc::UnboundedReceiver<PoolEvent>,
    stop_rx: oneshot::Receiver<StopRequest>,
    tick_requests: Arc<Notify>,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    polling_interval: Duration,
}

impl fmt::Debug for SchedulerRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerRuntime")
            .field("resolver", &self.resolver)
            .field("pool", &self.pool)
            .field("polling_interval", &self.polling_interval)
            .finish_non_exhaustive()
    }
}

impl SchedulerRuntime {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn TaskStore>,
        resolver: DependencyResolver,
        pool: ExecutionPool,
        pool_rx: mpsc::UnboundedReceiver<PoolEvent>,
        stop_rx: oneshot::Receiver<StopRequest>,
        tick_requests: Arc<Notify>,
        events: mpsc::UnboundedSender<SchedulerEvent>,
        polling_interval: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            pool,
            pool_rx,
            stop_rx,
            tick_requests,
            events,
            polling_interval: polling_interval.max(Duration::from_millis(1)),
        }
    }

    /// Main loop.
    ///
    /// - Runs a tick immediately, then every `polling_interval` measured from
    ///   the end of the previous tick.
    /// - Handles pool events as they arrive; a completion runs one extra tick
    ///   and pushes the next regular tick a full interval out.
    /// - Exits on a stop request or when the handle is dropped.
    pub async fn run(mut self) {
        info!(
            max_concurrent_tasks = self.pool.max_concurrent_tasks(),
            polling_interval_ms = self.polling_interval.as_millis() as u64,
            "scheduler loop started"
        );

        let mut next_tick = Instant::now();

        loop {
            tokio::select! {
                biased;

                stop = &mut self.stop_rx => {
                    self.shutdown().await;
                    match stop {
                        Ok(ack) => {
                            let _ = ack.send(());
                        }
                        Err(_) => info!("scheduler handle dropped; shut down"),
                    }
                    break;
                }

                Some(event) = self.pool_rx.recv() => {
                    if self.drain_pool_events(event).await {
                        self.run_tick(&mut next_tick).await;
                    }
                }

                _ = self.tick_requests.notified() => {
                    debug!("out-of-band tick requested");
                    self.run_tick(&mut next_tick).await;
                }

                _ = tokio::time::sleep_until(next_tick) => {
                    self.run_tick(&mut next_tick).await;
                }
            }
        }

        info!("scheduler loop exiting");
    }

    async fn run_tick(&mut self, next_tick: &mut Instant) {
        poll_tick(self.store.as_ref(), &self.resolver, &self.pool).await;
        *next_tick = Instant::now() + self.polling_interval;
    }

    /// Handle `first` plus every pool event already waiting. Returns whether
    /// any of them asked for an extra tick.
    async fn drain_pool_events(&mut self, first: PoolEvent) -> bool {
        let mut extra_tick = self.handle_event(first).await;
        while let Ok(event) = self.pool_rx.try_recv() {
            extra_tick |= self.handle_event(event).await;
        }
        extra_tick
    }

    async fn handle_event(&mut self, event: PoolEvent) -> bool {
        debug!(?event, "scheduler received pool event");
        handle_pool_event(self.store.as_ref(), &mut self.resolver, &self.events, event)
            .await
            .extra_tick
    }

    /// Cancel everything still running and wait until every resulting event,
    /// including the `Failed` writes for cancelled tasks, has been handled.
    async fn shutdown(&mut self) {
        let cancelled = self.pool.shutdown();
        info!(cancelled, "scheduler stopping");

        // The pool emits under its lock, so every event for the runs it just
        // cancelled is already queued.
        while let Ok(event) = self.pool_rx.try_recv() {
            self.handle_event(event).await;
        }
    }
}
