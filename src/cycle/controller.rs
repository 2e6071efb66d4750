use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    audio::Chime,
    db::{Database, PhaseRecord},
    store::CyclePersistence,
};

use super::{
    config::{ConfigError, PhaseConfig, PhaseConfigUpdate},
    machine::{CycleMachine, Effect, PhaseCompletion},
    state::{TimerState, TimerStatus},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub status: TimerStatus,
    pub config: PhaseConfig,
    pub completed_cycles: u32,
}

impl TimerSnapshot {
    fn of(machine: &CycleMachine) -> Self {
        Self {
            state: machine.state().clone(),
            status: machine.state().status(),
            config: *machine.config(),
            completed_cycles: machine.completed_cycles(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum CycleEvent {
    StateChanged(TimerSnapshot),
    PhaseCompleted(PhaseCompletion),
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Ticker {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Performs the side effects the state machine asks for. Every failure is
/// logged and swallowed; the in-memory state is already correct.
#[derive(Clone)]
struct EffectRunner {
    persistence: CyclePersistence,
    chime: Arc<dyn Chime>,
    history: Option<Database>,
    events: broadcast::Sender<CycleEvent>,
}

impl EffectRunner {
    async fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Chime { ended } => {
                    if let Err(err) = self.chime.play(ended) {
                        log_warn!("Chime for {} not played: {err:#}", ended.label());
                    }
                }
                Effect::SaveConfig(config) => self.persistence.save_config(&config).await,
                Effect::SaveCompletedCycles(count) => {
                    self.persistence.save_completed_cycles(count).await
                }
                Effect::PhaseCompleted(completion) => {
                    log_info!(
                        "Finished {} -> {} ({}s), completed cycles: {}",
                        completion.ended.label(),
                        completion.next.label(),
                        completion.next_duration_seconds,
                        completion.completed_cycles
                    );
                    if let Some(db) = &self.history {
                        let record = PhaseRecord::from_completion(&completion, Utc::now());
                        if let Err(err) = db.insert_phase_record(&record).await {
                            log_error!("Failed to record phase history: {err:#}");
                        }
                    }
                    let _ = self.events.send(CycleEvent::PhaseCompleted(completion));
                }
            }
        }
    }
}

/// Async host for one [`CycleMachine`]: owns the 1 Hz ticker and runs
/// effects. Clones control the same timer.
#[derive(Clone)]
pub struct CycleController {
    machine: Arc<Mutex<CycleMachine>>,
    effects: EffectRunner,
    events: broadcast::Sender<CycleEvent>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    verbose_ticks: bool,
}

impl CycleController {
    /// Builds a timer from persisted configuration and counter, in
    /// `(Focus, Idle)`.
    pub async fn load(persistence: CyclePersistence, chime: Arc<dyn Chime>) -> Self {
        let config = persistence.load_config().await;
        let completed_cycles = persistence.load_completed_cycles().await;
        log_info!(
            "Loaded cycle config {:?}, completed cycles: {}",
            config,
            completed_cycles
        );

        let debug_mode = std::env::var("FOCUSCYCLE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            machine: Arc::new(Mutex::new(CycleMachine::new(config, completed_cycles))),
            effects: EffectRunner {
                persistence,
                chime,
                history: None,
                events: events.clone(),
            },
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            verbose_ticks: debug_mode,
        }
    }

    /// Records every finished phase in `db`.
    pub fn with_history(mut self, db: Database) -> Self {
        self.effects.history = Some(db);
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::of(&*self.machine.lock().await)
    }

    pub async fn start(&self) -> TimerSnapshot {
        let mut machine = self.machine.lock().await;
        if machine.start() {
            log_info!(
                "Timer started: {} with {}s left",
                machine.state().current_phase.label(),
                machine.state().remaining_seconds
            );
            self.spawn_ticker(machine.generation()).await;
        }
        self.emit_state_changed(&machine)
    }

    pub async fn pause(&self) -> TimerSnapshot {
        let mut machine = self.machine.lock().await;
        if machine.pause() {
            self.cancel_ticker().await;
            log_info!(
                "Timer paused with {}s left",
                machine.state().remaining_seconds
            );
        }
        self.emit_state_changed(&machine)
    }

    pub async fn reset(&self) -> TimerSnapshot {
        let mut machine = self.machine.lock().await;
        let effects = machine.reset();
        self.cancel_ticker().await;
        self.effects.run(effects).await;
        log_info!("Timer reset");
        self.emit_state_changed(&machine)
    }

    /// Rejected updates leave the timer and the stored configuration as they
    /// were.
    pub async fn configure(&self, update: PhaseConfigUpdate) -> Result<TimerSnapshot, ConfigError> {
        let mut machine = self.machine.lock().await;
        let effects = machine.configure(&update)?;
        self.effects.run(effects).await;
        Ok(self.emit_state_changed(&machine))
    }

    /// Stops ticking without touching the timer state. Waits for an
    /// in-flight tick so its effects are not cut off halfway.
    pub async fn shutdown(&self) {
        let _machine = self.machine.lock().await;
        self.cancel_ticker().await;
    }

    async fn spawn_ticker(&self, generation: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.take() {
            ticker.stop();
        }

        let machine = self.machine.clone();
        let runner = self.effects.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;
        let verbose = self.verbose_ticks;
        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                tokio::select! {
                    _ = cancel_for_task.cancelled() => break,
                    _ = interval.tick() => {}
                }

                // Effects run under the lock so persisted order matches
                // transition order.
                let mut guard = machine.lock().await;
                let Some(effects) = guard.tick_for(generation) else {
                    break;
                };
                if verbose {
                    log_debug!(
                        "tick gen={} phase={} remaining={}",
                        generation,
                        guard.state().current_phase.as_str(),
                        guard.state().remaining_seconds
                    );
                }
                runner.run(effects).await;
                let _ = events.send(CycleEvent::StateChanged(TimerSnapshot::of(&guard)));
            }
        });

        *ticker_guard = Some(Ticker { handle, cancel });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.stop();
        }
    }

    fn emit_state_changed(&self, machine: &CycleMachine) -> TimerSnapshot {
        let snapshot = TimerSnapshot::of(machine);
        let _ = self.events.send(CycleEvent::StateChanged(snapshot.clone()));
        snapshot
    }
}
