use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use vibesync_lib::{
    capture::{
        CaptureDevice, CaptureGuard, CommandAnalyzer, EmotionClassifier, EmotionDetector,
        FaceDetector, Frame,
    },
    models::Emotion,
    notify::Notifier,
    quotes::{FallbackQuotes, QuoteService, TextGenerator},
    scheduler::{
        controller::{NO_FACE_MESSAGE, VIDEO_CALL_MESSAGE},
        state::NOT_SCHEDULED,
        CycleComponents, CycleOutcome, CycleScheduler, CycleState,
    },
    sensing::{ActivitySampler, ProcessSource, WindowTitleSource},
    settings::SettingsStore,
    store::EventLog,
};

struct FakeCamera {
    available: bool,
}

impl CaptureDevice for FakeCamera {
    fn open(&self) -> Result<()> {
        if !self.available {
            bail!("device in use");
        }
        Ok(())
    }

    fn read_frame(&self) -> Result<Frame> {
        Ok(Frame::new_rgb8(4, 4))
    }

    fn release(&self) {}
}

struct FakeProcesses(Vec<String>);

impl ProcessSource for FakeProcesses {
    fn process_names(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

struct FakeFaces(usize);

impl FaceDetector for FakeFaces {
    fn count_faces(&self, _frame: &Frame) -> Result<usize> {
        Ok(self.0)
    }
}

struct FakeClassifier(Emotion);

impl EmotionClassifier for FakeClassifier {
    fn classify(&self, _frame: &Frame) -> Result<Emotion> {
        Ok(self.0)
    }
}

struct FixedTitle;

impl WindowTitleSource for FixedTitle {
    fn foreground_title(&self) -> Result<String> {
        Ok("Editor".into())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, _title: &str, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Gate {
    entered: Notify,
    release: Notify,
}

/// Hands out "Quote #1", "Quote #2", ... optionally pausing inside each call.
#[derive(Default)]
struct FakeGenerator {
    calls: AtomicUsize,
    gate: Option<Gate>,
    panics: bool,
}

impl FakeGenerator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panics {
            panic!("generator blew up");
        }
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(format!("Quote #{call}"))
    }
}

struct Setup {
    camera_available: bool,
    processes: Vec<&'static str>,
    faces: usize,
    face_detector: Option<Arc<dyn FaceDetector>>,
    gated: bool,
    panicking_generator: bool,
    broken_log: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            camera_available: true,
            processes: vec!["bash", "code"],
            faces: 1,
            face_detector: None,
            gated: false,
            panicking_generator: false,
            broken_log: false,
        }
    }
}

struct Harness {
    _dir: TempDir,
    scheduler: CycleScheduler,
    notifier: Arc<RecordingNotifier>,
    generator: Arc<FakeGenerator>,
    activity: Arc<ActivitySampler>,
    settings: Arc<SettingsStore>,
    event_log: EventLog,
}

fn harness(setup: Setup) -> Harness {
    let dir = tempfile::tempdir().unwrap();

    let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")).unwrap());
    let faces: Arc<dyn FaceDetector> = match setup.face_detector {
        Some(detector) => detector,
        None => Arc::new(FakeFaces(setup.faces)),
    };
    let guard = CaptureGuard::new(
        Arc::new(FakeCamera {
            available: setup.camera_available,
        }),
        Arc::new(FakeProcesses(
            setup.processes.iter().map(|name| name.to_string()).collect(),
        )),
        faces,
    );
    let emotions = EmotionDetector::new(
        guard.clone(),
        Arc::new(FakeClassifier(Emotion::Happy)),
        dir.path().join("snapshots"),
    );
    let activity = Arc::new(ActivitySampler::new(Arc::new(FixedTitle)));

    let generator = Arc::new(FakeGenerator {
        gate: setup.gated.then(Gate::default),
        panics: setup.panicking_generator,
        ..FakeGenerator::default()
    });
    let quotes = Arc::new(QuoteService::new(
        generator.clone(),
        dir.path().join("last_quote.json"),
        FallbackQuotes::builtin(),
        Duration::from_secs(5),
    ));

    let log_path = if setup.broken_log {
        let path = dir.path().join("log-is-a-directory");
        std::fs::create_dir_all(&path).unwrap();
        path
    } else {
        dir.path().join("log.json")
    };
    let event_log = EventLog::new(log_path);

    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = CycleScheduler::new(CycleComponents {
        settings: settings.clone(),
        guard,
        emotions,
        activity: activity.clone(),
        quotes,
        event_log: event_log.clone(),
        notifier: notifier.clone(),
    });

    Harness {
        _dir: dir,
        scheduler,
        notifier,
        generator,
        activity,
        settings,
        event_log,
    }
}

#[tokio::test]
async fn starting_twice_keeps_one_schedule() {
    let h = harness(Setup::default());

    let first = h.scheduler.start().await;
    let second = h.scheduler.start().await;

    assert_eq!(first.status, CycleState::Scheduled);
    assert_eq!(second.status, CycleState::Scheduled);
    assert!(first.next_trigger.is_some());
    assert_eq!(first.next_trigger, second.next_trigger);
    assert!(h.scheduler.has_pending_timer());
    assert_ne!(h.scheduler.get_next_trigger_time().await, NOT_SCHEDULED);
}

#[tokio::test]
async fn stop_clears_trigger_and_start_rearms() {
    let h = harness(Setup::default());
    assert_eq!(h.scheduler.status().await, CycleState::Idle);
    assert_eq!(h.scheduler.get_next_trigger_time().await, NOT_SCHEDULED);

    let first = h.scheduler.start().await.next_trigger.unwrap();
    let stopped = h.scheduler.stop().await;

    assert_eq!(stopped.status, CycleState::Stopped);
    assert_eq!(h.scheduler.next_trigger().await, None);
    assert_eq!(h.scheduler.get_next_trigger_time().await, NOT_SCHEDULED);
    assert!(!h.scheduler.has_pending_timer());

    h.settings.update_schedule("Every 30 seconds").unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let restart_floor = chrono::Local::now().naive_local();

    let restarted = h.scheduler.start().await;
    let second = restarted.next_trigger.unwrap();
    assert_eq!(restarted.status, CycleState::Scheduled);
    assert!(second > restart_floor);
    assert!(second < first);
    assert!(h.scheduler.has_pending_timer());
}

#[tokio::test]
async fn running_call_app_skips_the_cycle() {
    let h = harness(Setup {
        processes: vec!["bash", "Zoom.us"],
        ..Setup::default()
    });
    h.scheduler.start().await;

    let outcome = h.scheduler.trigger_now().await;

    assert_eq!(outcome, Some(CycleOutcome::SkippedVideoCall));
    assert_eq!(h.notifier.messages(), vec![VIDEO_CALL_MESSAGE.to_string()]);
    assert!(h.event_log.entries().is_empty());
    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.scheduler.status().await, CycleState::Scheduled);
}

#[tokio::test]
async fn busy_camera_counts_as_a_call() {
    let h = harness(Setup {
        camera_available: false,
        ..Setup::default()
    });
    h.scheduler.start().await;

    assert_eq!(
        h.scheduler.trigger_now().await,
        Some(CycleOutcome::SkippedVideoCall)
    );
    assert!(h.event_log.entries().is_empty());
}

#[tokio::test]
async fn empty_frame_skips_with_break_message() {
    let h = harness(Setup {
        faces: 0,
        ..Setup::default()
    });
    h.scheduler.start().await;

    let outcome = h.scheduler.trigger_now().await;

    assert_eq!(outcome, Some(CycleOutcome::SkippedNoFace));
    assert_eq!(h.notifier.messages(), vec![NO_FACE_MESSAGE.to_string()]);
    assert!(h.event_log.entries().is_empty());
    assert!(h.scheduler.has_pending_timer());
}

#[tokio::test]
async fn full_cycle_notifies_and_logs() {
    let h = harness(Setup::default());
    h.scheduler.start().await;
    for _ in 0..4 {
        h.activity.record_keypress();
    }

    let Some(CycleOutcome::Completed(entry)) = h.scheduler.trigger_now().await else {
        panic!("cycle did not complete");
    };

    assert_eq!(entry.emotion, Emotion::Happy);
    assert_eq!(entry.quote, "Quote #1");
    assert_eq!(entry.activity.active_window, "Editor");
    assert!(entry.activity.typing_speed > 0.0);
    assert_eq!(h.activity.pending().0, 0);

    assert_eq!(h.notifier.messages(), vec!["Quote #1".to_string()]);
    assert_eq!(h.event_log.entries(), vec![entry]);
    assert_eq!(h.scheduler.status().await, CycleState::Scheduled);
    assert!(h.scheduler.snapshot().await.started_at.is_some());
}

#[tokio::test]
async fn consecutive_cycles_append_in_order() {
    let h = harness(Setup::default());
    h.scheduler.start().await;

    for _ in 0..3 {
        h.scheduler.trigger_now().await;
    }

    let quotes: Vec<String> = h
        .event_log
        .entries()
        .into_iter()
        .map(|entry| entry.quote)
        .collect();
    assert_eq!(quotes, vec!["Quote #1", "Quote #2", "Quote #3"]);
}

#[tokio::test]
async fn trigger_without_an_active_schedule_does_nothing() {
    let h = harness(Setup::default());

    assert_eq!(h.scheduler.trigger_now().await, None);
    assert_eq!(h.scheduler.status().await, CycleState::Idle);

    h.scheduler.start().await;
    h.scheduler.stop().await;

    assert_eq!(h.scheduler.trigger_now().await, None);
    assert!(h.notifier.messages().is_empty());
    assert!(h.event_log.entries().is_empty());
    assert_eq!(h.generator.calls(), 0);
    assert!(!h.scheduler.has_pending_timer());
}

#[tokio::test]
async fn crashed_cycle_still_reschedules() {
    let h = harness(Setup {
        panicking_generator: true,
        ..Setup::default()
    });
    h.scheduler.start().await;

    assert_eq!(h.scheduler.trigger_now().await, None);

    assert_eq!(h.scheduler.status().await, CycleState::Scheduled);
    assert!(h.scheduler.has_pending_timer());
    assert!(h.event_log.entries().is_empty());
}

#[tokio::test]
async fn failed_log_write_still_reschedules() {
    let h = harness(Setup {
        broken_log: true,
        ..Setup::default()
    });
    h.scheduler.start().await;

    assert_eq!(h.scheduler.trigger_now().await, None);

    assert_eq!(h.notifier.messages(), vec!["Quote #1".to_string()]);
    assert_eq!(h.scheduler.status().await, CycleState::Scheduled);
    assert!(h.scheduler.has_pending_timer());
}

#[tokio::test]
async fn stop_lets_the_running_cycle_finish_without_rearming() {
    let h = harness(Setup {
        gated: true,
        ..Setup::default()
    });
    h.scheduler.start().await;

    let scheduler = h.scheduler.clone();
    let running = tokio::spawn(async move { scheduler.trigger_now().await });

    let gate = h.generator.gate.as_ref().unwrap();
    gate.entered.notified().await;
    assert_eq!(h.scheduler.status().await, CycleState::Running);

    h.scheduler.stop().await;
    gate.release.notify_one();

    let outcome = running.await.unwrap();
    assert!(matches!(outcome, Some(CycleOutcome::Completed(_))));
    assert_eq!(h.event_log.entries().len(), 1);
    assert_eq!(h.scheduler.status().await, CycleState::Stopped);
    assert_eq!(h.scheduler.get_next_trigger_time().await, NOT_SCHEDULED);
    assert!(!h.scheduler.has_pending_timer());
}

#[tokio::test]
async fn overlapping_triggers_run_one_at_a_time() {
    let h = harness(Setup {
        gated: true,
        ..Setup::default()
    });
    h.scheduler.start().await;
    let gate = h.generator.gate.as_ref().unwrap();

    let first = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.trigger_now().await }
    });
    gate.entered.notified().await;

    let second = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.trigger_now().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.generator.calls(), 1);

    gate.release.notify_one();
    gate.entered.notified().await;
    gate.release.notify_one();

    assert!(matches!(first.await.unwrap(), Some(CycleOutcome::Completed(_))));
    assert!(matches!(second.await.unwrap(), Some(CycleOutcome::Completed(_))));
    assert_eq!(h.event_log.entries().len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn hung_face_analyzer_skips_instead_of_wedging() {
    let work = tempfile::tempdir().unwrap();
    let analyzer = CommandAnalyzer::new(
        vec!["sh".into(), "-c".into(), "sleep 30".into(), "analyzer".into()],
        work.path().to_path_buf(),
        Duration::from_millis(500),
    )
    .unwrap();
    let h = harness(Setup {
        face_detector: Some(Arc::new(analyzer)),
        ..Setup::default()
    });
    h.scheduler.start().await;

    let outcome = tokio::time::timeout(Duration::from_secs(10), h.scheduler.trigger_now())
        .await
        .expect("cycle should finish once the analyzer is killed");

    assert_eq!(outcome, Some(CycleOutcome::SkippedNoFace));
    assert_eq!(h.notifier.messages(), vec![NO_FACE_MESSAGE.to_string()]);
    assert_eq!(h.scheduler.status().await, CycleState::Scheduled);
    assert!(h.scheduler.has_pending_timer());
}

#[tokio::test(start_paused = true)]
async fn armed_timer_fires_a_cycle() {
    let h = harness(Setup::default());
    h.settings.update_schedule("Every 30 seconds").unwrap();
    h.scheduler.start().await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    for _ in 0..100 {
        if !h.event_log.entries().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let entries = h.event_log.entries();
    assert!(!entries.is_empty());
    assert_eq!(entries[0].quote, "Quote #1");
    assert!(h.scheduler.has_pending_timer());
}
