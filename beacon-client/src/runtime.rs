//! Engine runner: the timer and lifecycle event loop.
//!
//! Main loop that drives:
//! - Dispatch cycles on a fixed interval
//! - Heartbeat events on a slower interval
//! - Lifecycle commands (page hidden, unload, reachability, flush, stop)
//!
//! Every trigger funnels into `TelemetryEngine::dispatch`, so flush logic
//! lives in exactly one place.

use crate::engine::TelemetryEngine;
use crate::error::{BeaconError, BeaconResult};
use crate::types::{DispatchOutcome, EngineCommand, ExitReason};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle for sending lifecycle signals to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn page_hidden(&self) -> BeaconResult<()> {
        self.send(EngineCommand::PageHidden).await
    }

    pub async fn unload(&self) -> BeaconResult<()> {
        self.send(EngineCommand::Unload).await
    }

    pub async fn set_reachable(&self, online: bool) -> BeaconResult<()> {
        self.send(EngineCommand::Reachability(online)).await
    }

    pub async fn flush(&self) -> BeaconResult<()> {
        self.send(EngineCommand::Flush).await
    }

    pub async fn stop(&self) -> BeaconResult<()> {
        self.send(EngineCommand::Stop).await
    }

    /// Non-blocking signal for host callbacks that cannot await.
    pub fn try_signal(&self, command: EngineCommand) -> BeaconResult<()> {
        self.command_tx
            .try_send(command)
            .map_err(|_| BeaconError::EngineStopped)
    }

    async fn send(&self, command: EngineCommand) -> BeaconResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| BeaconError::EngineStopped)
    }
}

/// Owns the event loop for one engine.
pub struct EngineRunner {
    engine: Arc<TelemetryEngine>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

/// Creates a runner for `engine` and the handle that signals it.
pub fn create_engine_runtime(engine: Arc<TelemetryEngine>) -> (EngineHandle, EngineRunner) {
    let (command_tx, command_rx) = mpsc::channel(64);
    (
        EngineHandle { command_tx },
        EngineRunner { engine, command_rx },
    )
}

impl EngineRunner {
    pub fn engine(&self) -> &Arc<TelemetryEngine> {
        &self.engine
    }

    /// Runs until `Stop`, `Unload`, or every handle is dropped.
    pub async fn run(&mut self) {
        let config = self.engine.config();
        info!("engine runner started for site {}", config.site_id);

        let mut dispatch_interval = tokio::time::interval(config.dispatch_interval());
        let mut heartbeat_interval = tokio::time::interval(config.heartbeat_interval());
        dispatch_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip first immediate tick
        dispatch_interval.tick().await;
        heartbeat_interval.tick().await;

        loop {
            tokio::select! {
                _ = dispatch_interval.tick() => {
                    log_outcome("tick", self.engine.dispatch().await);
                }
                _ = heartbeat_interval.tick() => {
                    self.engine.heartbeat();
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::PageHidden) => {
                            log_outcome("hidden", self.engine.flush_on_exit(ExitReason::Hidden).await);
                        }
                        Some(EngineCommand::Unload) => {
                            log_outcome("unload", self.engine.flush_on_exit(ExitReason::Unload).await);
                            break;
                        }
                        Some(EngineCommand::Reachability(online)) => {
                            self.engine.set_online(online);
                            if online {
                                log_outcome("reconnect", self.engine.dispatch().await);
                            }
                        }
                        Some(EngineCommand::Flush) => {
                            log_outcome("flush", self.engine.dispatch().await);
                        }
                        Some(EngineCommand::Stop) => {
                            info!("engine runner stopping");
                            self.engine.persist_pending();
                            log_outcome("stop", self.engine.dispatch().await);
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping engine runner");
                            self.engine.persist_pending();
                            break;
                        }
                    }
                }
            }
        }

        info!("engine runner stopped");
    }
}

fn log_outcome(trigger: &str, outcome: DispatchOutcome) {
    match outcome {
        DispatchOutcome::Idle => {}
        other => debug!("dispatch ({trigger}): {other:?}"),
    }
}
