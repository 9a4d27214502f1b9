use std::{
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{CaptureGuard, EmotionDetector},
    models::{LogEntry, UserStateSnapshot},
    notify::{Notifier, NOTIFICATION_TITLE},
    quotes::QuoteService,
    sensing::ActivitySampler,
    settings::SettingsStore,
    store::EventLog,
};
use crate::{log_error, log_info, log_warn};

use super::{interval_minutes, minutes_to_duration, CycleState, SchedulerState};

const ENABLE_LOGS: bool = true;

pub const VIDEO_CALL_MESSAGE: &str = "Video call detected. Skipping detection...";
pub const NO_FACE_MESSAGE: &str = "Face not found, are you on a break?";

/// Everything one detection cycle touches.
pub struct CycleComponents {
    pub settings: Arc<SettingsStore>,
    pub guard: CaptureGuard,
    pub emotions: EmotionDetector,
    pub activity: Arc<ActivitySampler>,
    pub quotes: Arc<QuoteService>,
    pub event_log: EventLog,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    SkippedVideoCall,
    SkippedNoFace,
    Completed(LogEntry),
}

struct ArmedTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    state: Mutex<SchedulerState>,
    timer: StdMutex<Option<ArmedTimer>>,
    /// Held for the whole cycle body; timer fires and manual triggers queue here.
    cycle_lock: Mutex<()>,
    components: CycleComponents,
}

/// Recurring detection cycle driven by a single-shot timer that re-arms after each run.
#[derive(Clone)]
pub struct CycleScheduler {
    inner: Arc<SchedulerInner>,
}

impl CycleScheduler {
    pub fn new(components: CycleComponents) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(SchedulerState::new()),
                timer: StdMutex::new(None),
                cycle_lock: Mutex::new(()),
                components,
            }),
        }
    }

    /// No-op while `Scheduled` or `Running`.
    pub async fn start(&self) -> SchedulerState {
        let interval = self.inner.current_interval();
        let mut state = self.inner.state.lock().await;
        if state.status.is_active() {
            log_info!("[Scheduler] Already running; next cycle at {}", state.next_trigger_label());
            return state.clone();
        }

        state.started_at = Some(now_local());
        arm_timer(&self.inner, &mut state, interval);
        log_info!("[Scheduler] Started; next cycle at {}", state.next_trigger_label());
        state.clone()
    }

    /// Cancels the armed timer. A cycle already running finishes and is not rescheduled.
    pub async fn stop(&self) -> SchedulerState {
        let mut state = self.inner.state.lock().await;
        state.stop();
        self.inner.cancel_timer();
        log_info!("[Scheduler] Stopped");
        state.clone()
    }

    /// Runs a cycle now, waiting for any cycle in flight. `None` if stopped or the body failed.
    pub async fn trigger_now(&self) -> Option<CycleOutcome> {
        run_cycle(Arc::clone(&self.inner)).await
    }

    pub async fn get_next_trigger_time(&self) -> String {
        self.inner.state.lock().await.next_trigger_label()
    }

    pub async fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.inner.state.lock().await.next_trigger
    }

    pub async fn status(&self) -> CycleState {
        self.inner.state.lock().await.status
    }

    pub async fn snapshot(&self) -> SchedulerState {
        self.inner.state.lock().await.clone()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.token.is_cancelled() && !timer.handle.is_finished())
    }
}

impl SchedulerInner {
    /// Re-read every scheduling step so schedule edits apply from the next cycle.
    fn current_interval(&self) -> Duration {
        let schedule = self.components.settings.monitoring_schedule();
        minutes_to_duration(interval_minutes(&schedule))
    }

    fn cancel_timer(&self) {
        let previous = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = previous {
            timer.token.cancel();
        }
    }

    async fn cycle_body(&self) -> Result<CycleOutcome> {
        let components = &self.components;

        if components.guard.is_video_conference_active().await {
            log_info!("[Scheduler] Video call in progress, skipping cycle");
            self.notify(VIDEO_CALL_MESSAGE);
            return Ok(CycleOutcome::SkippedVideoCall);
        }

        if !components.guard.is_face_found().await {
            log_info!("[Scheduler] No face in frame, skipping cycle");
            self.notify(NO_FACE_MESSAGE);
            return Ok(CycleOutcome::SkippedNoFace);
        }

        let emotion = components.emotions.detect_emotion().await;
        let activity = components.activity.snapshot_and_reset();
        let snapshot = UserStateSnapshot::new(emotion, activity);

        let quote = components.quotes.quote_for(&snapshot).await;
        self.notify(&quote);

        let entry = LogEntry::from_snapshot(snapshot, quote);
        components.event_log.append(&entry)?;

        self.state.lock().await.started_at = Some(now_local());
        Ok(CycleOutcome::Completed(entry))
    }

    fn notify(&self, message: &str) {
        if let Err(err) = self
            .components
            .notifier
            .notify(NOTIFICATION_TITLE, message)
        {
            log_warn!("[Scheduler] Notification failed: {err:#}");
        }
    }
}

async fn run_cycle(inner: Arc<SchedulerInner>) -> Option<CycleOutcome> {
    let _cycle = inner.cycle_lock.lock().await;

    if !inner.state.lock().await.begin_cycle() {
        log_info!("[Scheduler] Not active, cycle skipped");
        return None;
    }

    let body = Arc::clone(&inner);
    let outcome = match tokio::spawn(async move { body.cycle_body().await }).await {
        Ok(Ok(outcome)) => Some(outcome),
        Ok(Err(err)) => {
            log_error!("[Scheduler] Cycle failed: {err:#}");
            None
        }
        Err(err) => {
            log_error!("[Scheduler] Cycle task crashed: {err}");
            None
        }
    };

    schedule_next(&inner).await;
    outcome
}

async fn schedule_next(inner: &Arc<SchedulerInner>) {
    let interval = inner.current_interval();
    let mut state = inner.state.lock().await;
    if !state.status.is_active() {
        log_info!("[Scheduler] Stopped during cycle, not rescheduling");
        return;
    }

    arm_timer(inner, &mut state, interval);
    log_info!("[Scheduler] Next cycle at {}", state.next_trigger_label());
}

/// Replaces any armed timer with one firing after `interval`.
fn arm_timer(inner: &Arc<SchedulerInner>, state: &mut SchedulerState, interval: Duration) {
    let offset = chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::hours(1));
    state.arm(now_local() + offset);

    let token = CancellationToken::new();
    let timer_token = token.clone();
    let timer_inner = Arc::clone(inner);

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = timer_token.cancelled() => {}
            _ = time::sleep(interval) => {
                run_cycle(timer_inner).await;
            }
        }
    });

    let previous = inner
        .timer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(ArmedTimer { token, handle });
    if let Some(previous) = previous {
        previous.token.cancel();
    }
}

fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}
