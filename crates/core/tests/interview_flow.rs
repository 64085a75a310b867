use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use mockview_core::{
    CaptureDevice, InterviewBackend, InterviewConfig, InterviewSession, InterviewType,
    MediaCapture, MockviewError, ProcessResponse, Recording, Result, SessionCommand,
    SessionOutcome, SessionStore,
    capture::{AudioChunk, StreamFormat},
    events::{SessionEvent, SharedEvent},
    session::SessionHandle,
    store::{SessionContext, keys, load_report},
    types::{DomainScores, Summary},
};
use tempfile::TempDir;
use tokio::{
    sync::{broadcast, mpsc},
    time::Instant,
};

#[derive(Clone, Default)]
struct Device {
    samples: Vec<i16>,
    deny: bool,
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl CaptureDevice for Device {
    async fn acquire(&mut self) -> Result<StreamFormat> {
        if self.deny {
            return Err(MockviewError::PermissionDenied {
                reason: "blocked by the user".into(),
            });
        }
        Ok(StreamFormat::default())
    }

    fn start(&mut self, sink: mpsc::UnboundedSender<AudioChunk>) -> Result<()> {
        if !self.samples.is_empty() {
            let _ = sink.send(AudioChunk {
                samples: self.samples.clone(),
            });
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "test-device"
    }
}

#[derive(Default)]
struct Backend {
    uploads: Mutex<Vec<(String, usize)>>,
    fail_uploads: bool,
    no_roadmap: bool,
    upload_delay: Duration,
}

#[async_trait]
impl InterviewBackend for Backend {
    async fn process_answer(&self, recording: &Recording, question: &str) -> Result<ProcessResponse> {
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((question.to_string(), recording.sample_count));
        if self.fail_uploads {
            return Err(MockviewError::NetworkFailure {
                endpoint: "/api/process",
                reason: "HTTP 502: Bad Gateway".into(),
            });
        }
        let score = 5.0 + uploads.len() as f64;
        Ok(ProcessResponse {
            actual: Some(format!("answer to {question}")),
            expected: None,
            feedback: Some("Clear and specific.".into()),
            domain_scores: Some(DomainScores {
                clarity_score: Some(score),
                technical_score: Some(score),
                ..Default::default()
            }),
        })
    }

    async fn generate_roadmap(&self, _summary: &Summary) -> Result<Vec<String>> {
        if self.no_roadmap {
            return Err(MockviewError::UnexpectedResponse {
                endpoint: "/api/roadmap/generate",
                reason: "response has no roadmap list".into(),
            });
        }
        Ok(vec!["Structure answers with STAR".into()])
    }
}

struct Harness {
    _dir: TempDir,
    store_path: std::path::PathBuf,
    backend: Arc<Backend>,
    releases: Arc<AtomicUsize>,
}

impl Harness {
    fn new(backend: Backend) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            store_path: dir.path().join("session.json"),
            _dir: dir,
            backend: Arc::new(backend),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn start(
        &self,
        questions: usize,
        device: Device,
        question_secs: u64,
    ) -> Result<(SessionHandle, broadcast::Receiver<SharedEvent>)> {
        let device = Device {
            releases: self.releases.clone(),
            ..device
        };
        let config = InterviewConfig {
            question_duration: Duration::from_secs(question_secs),
            finalize_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let store = SessionStore::open(&self.store_path).await?;
        let context = SessionContext {
            interview_type: Some(InterviewType::Managerial),
            resume_name: Some("resume.pdf".into()),
            ..Default::default()
        };
        let session = InterviewSession::new(
            context,
            (0..questions).map(|i| format!("Question {i}")).collect(),
            MediaCapture::new(device, config.finalize_timeout),
            self.backend.clone(),
            store,
            config,
        );
        let events = session.subscribe();
        let handle = session.start().await?;
        Ok((handle, events))
    }

    async fn stored(&self) -> SessionStore {
        SessionStore::open(&self.store_path).await.unwrap()
    }

    fn uploads(&self) -> Vec<(String, usize)> {
        self.backend.uploads.lock().unwrap().clone()
    }
}

async fn wait_for(
    events: &mut broadcast::Receiver<SharedEvent>,
    wanted: impl Fn(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = events.recv().await.expect("session bus closed");
        if wanted(&event.event) {
            return event.event.clone();
        }
    }
}

async fn answer(handle: &SessionHandle, events: &mut broadcast::Receiver<SharedEvent>) {
    handle.send(SessionCommand::StartRecording).await.unwrap();
    handle.send(SessionCommand::StopRecording).await.unwrap();
    wait_for(events, |e| {
        matches!(
            e,
            SessionEvent::AnswerEvaluated { .. } | SessionEvent::AnswerFailed { .. }
        )
    })
    .await;
}

async fn next(handle: &SessionHandle, events: &mut broadcast::Receiver<SharedEvent>, index: usize) {
    handle.send(SessionCommand::NextQuestion).await.unwrap();
    wait_for(
        events,
        |e| matches!(e, SessionEvent::QuestionPresented { index: i, .. } if *i == index),
    )
    .await;
}

#[tokio::test]
async fn ending_early_keeps_only_answered_questions() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness
        .start(
            3,
            Device {
                samples: vec![1, 2, 3],
                ..Default::default()
            },
            120,
        )
        .await
        .unwrap();

    answer(&handle, &mut events).await;
    next(&handle, &mut events, 1).await;
    answer(&handle, &mut events).await;
    next(&handle, &mut events, 2).await;
    handle.send(SessionCommand::EndInterview).await.unwrap();

    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("interview should complete");
    };
    assert_eq!(report.evaluations.len(), 2);
    assert_eq!(report.evaluations[0].question, "Question 0");
    assert_eq!(report.evaluations[1].question, "Question 1");
    assert_eq!(report.summary.average_clarity_score, 6.5);
    assert_eq!(
        report.learning_path,
        Some(vec!["Structure answers with STAR".to_string()])
    );

    let stored = harness.stored().await;
    assert_eq!(load_report(&stored).unwrap(), Some(report));
    assert_eq!(stored.get(keys::ATTEMPTED), Some("2"));
    assert_eq!(harness.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn silent_answer_is_still_evaluated_once() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness.start(1, Device::default(), 120).await.unwrap();

    answer(&handle, &mut events).await;
    assert_eq!(harness.uploads(), vec![("Question 0".to_string(), 0)]);

    handle.send(SessionCommand::NextQuestion).await.unwrap();
    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("last question should finish the interview");
    };
    assert_eq!(report.evaluations.len(), 1);
    assert_eq!(harness.uploads().len(), 1);
}

#[tokio::test]
async fn failed_evaluation_is_visible_and_not_appended() {
    let harness = Harness::new(Backend {
        fail_uploads: true,
        ..Default::default()
    });
    let (handle, mut events) = harness.start(2, Device::default(), 120).await.unwrap();

    handle.send(SessionCommand::StartRecording).await.unwrap();
    handle.send(SessionCommand::StopRecording).await.unwrap();
    let failed = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::AnswerFailed { .. })
    })
    .await;
    assert!(matches!(failed, SessionEvent::AnswerFailed { index: 0, .. }));

    handle.send(SessionCommand::EndInterview).await.unwrap();
    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("end should complete the interview");
    };
    assert!(report.evaluations.is_empty());
    assert_eq!(report.summary.average_clarity_score, 0.0);
}

#[tokio::test]
async fn next_is_rejected_while_recording() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness.start(2, Device::default(), 120).await.unwrap();

    handle.send(SessionCommand::StartRecording).await.unwrap();
    handle.send(SessionCommand::NextQuestion).await.unwrap();
    let rejected = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CommandRejected { .. })
    })
    .await;
    assert!(matches!(
        rejected,
        SessionEvent::CommandRejected { command: "next", .. }
    ));

    handle.send(SessionCommand::StartRecording).await.unwrap();
    let rejected = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CommandRejected { .. })
    })
    .await;
    assert!(matches!(
        rejected,
        SessionEvent::CommandRejected {
            command: "record",
            ..
        }
    ));

    assert_eq!(handle.abandon().await.unwrap(), SessionOutcome::Abandoned);
}

#[tokio::test]
async fn abandoning_releases_devices_and_saves_nothing() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness.start(2, Device::default(), 120).await.unwrap();

    handle.send(SessionCommand::StartRecording).await.unwrap();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::RecordingStarted { .. })
    })
    .await;

    assert_eq!(handle.abandon().await.unwrap(), SessionOutcome::Abandoned);
    assert_eq!(harness.releases.load(Ordering::SeqCst), 1);

    let stored = harness.stored().await;
    assert!(stored.get(keys::REPORT).is_none());
    assert!(harness.uploads().is_empty());
}

#[tokio::test]
async fn denied_devices_prevent_the_start() {
    let harness = Harness::new(Backend::default());
    let err = harness
        .start(
            2,
            Device {
                deny: true,
                ..Default::default()
            },
            120,
        )
        .await
        .err()
        .unwrap();
    assert!(matches!(err, MockviewError::PermissionDenied { .. }));
}

#[tokio::test]
async fn empty_question_list_is_rejected() {
    let harness = Harness::new(Backend::default());
    let err = harness
        .start(0, Device::default(), 120)
        .await
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "No questions loaded.");
    assert_eq!(harness.releases.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn expiring_clocks_walk_to_the_end_without_a_roadmap() {
    let harness = Harness::new(Backend {
        no_roadmap: true,
        ..Default::default()
    });
    let (handle, mut events) = harness.start(3, Device::default(), 2).await.unwrap();

    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("expiry should walk through every question");
    };
    assert!(report.evaluations.is_empty());
    assert!(report.learning_path.is_none());

    let mut presented = Vec::new();
    let mut ticks = Vec::new();
    while let Ok(event) = events.try_recv() {
        match &event.event {
            SessionEvent::QuestionPresented { index, .. } => presented.push(*index),
            SessionEvent::TimerTick {
                index: 0,
                remaining_secs,
            } => ticks.push(*remaining_secs),
            _ => {}
        }
    }
    assert_eq!(presented, vec![0, 1, 2]);
    assert_eq!(ticks, vec![1, 0]);

    let stored = harness.stored().await;
    assert!(load_report(&stored).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn expiry_while_recording_submits_then_moves_on() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness
        .start(
            2,
            Device {
                samples: vec![7; 160],
                ..Default::default()
            },
            3,
        )
        .await
        .unwrap();

    handle.send(SessionCommand::StartRecording).await.unwrap();

    let stopped = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::RecordingStopped { .. })
    })
    .await;
    assert!(matches!(stopped, SessionEvent::RecordingStopped { index: 0, .. }));
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::AnswerEvaluated { index: 0, .. })
    })
    .await;
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::QuestionPresented { index: 1, .. })
    })
    .await;

    assert_eq!(harness.uploads(), vec![("Question 0".to_string(), 160)]);
    handle.send(SessionCommand::EndInterview).await.unwrap();
    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("end should complete the interview");
    };
    assert_eq!(report.evaluations.len(), 1);
}

#[tokio::test]
async fn opening_event_names_the_resume() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness.start(1, Device::default(), 120).await.unwrap();

    let started = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::InterviewStarted { .. })
    })
    .await;
    assert!(matches!(
        started,
        SessionEvent::InterviewStarted {
            resume_name: Some(ref name),
            total_questions: 1,
            ..
        } if name == "resume.pdf"
    ));
    assert_eq!(handle.abandon().await.unwrap(), SessionOutcome::Abandoned);
}

#[tokio::test]
async fn unwritable_store_still_ends_the_interview() {
    let harness = Harness::new(Backend::default());
    let (handle, mut events) = harness.start(1, Device::default(), 120).await.unwrap();

    std::fs::remove_file(&harness.store_path).unwrap();
    std::fs::create_dir(&harness.store_path).unwrap();
    handle.send(SessionCommand::EndInterview).await.unwrap();

    let ended = tokio::time::timeout(
        Duration::from_secs(2),
        wait_for(&mut events, |e| {
            matches!(e, SessionEvent::InterviewEnded { .. })
        }),
    )
    .await
    .expect("interview.ended should be published");
    let SessionEvent::InterviewEnded {
        report,
        persist_error,
        ..
    } = ended
    else {
        unreachable!();
    };
    assert!(report.evaluations.is_empty());
    assert!(persist_error.is_some());

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, MockviewError::IoError(_)), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn expiry_during_a_slow_upload_waits_for_the_evaluation() {
    let harness = Harness::new(Backend {
        upload_delay: Duration::from_secs(10),
        ..Default::default()
    });
    let (handle, mut events) = harness
        .start(
            2,
            Device {
                samples: vec![3; 16],
                ..Default::default()
            },
            5,
        )
        .await
        .unwrap();

    handle.send(SessionCommand::StartRecording).await.unwrap();
    handle.send(SessionCommand::StopRecording).await.unwrap();
    wait_for(&mut events, |e| {
        matches!(e, SessionEvent::RecordingStopped { index: 0, .. })
    })
    .await;
    let stopped_at = Instant::now();

    handle.send(SessionCommand::NextQuestion).await.unwrap();
    let rejected = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::CommandRejected { .. })
    })
    .await;
    assert!(matches!(
        rejected,
        SessionEvent::CommandRejected { command: "next", .. }
    ));

    let mut first_ticks = Vec::new();
    let mut evaluated = false;
    loop {
        let event = events.recv().await.unwrap();
        match &event.event {
            SessionEvent::TimerTick {
                index: 0,
                remaining_secs,
            } => first_ticks.push(*remaining_secs),
            SessionEvent::AnswerEvaluated { index: 0, .. } => evaluated = true,
            SessionEvent::QuestionPresented { index: 1, .. } => break,
            _ => {}
        }
    }
    assert!(evaluated, "the advance waits for the pending evaluation");
    assert!(stopped_at.elapsed() > Duration::from_secs(5));
    assert_eq!(first_ticks, vec![4, 3, 2, 1, 0]);

    let tick = wait_for(&mut events, |e| matches!(e, SessionEvent::TimerTick { .. })).await;
    assert_eq!(
        tick,
        SessionEvent::TimerTick {
            index: 1,
            remaining_secs: 4,
        }
    );

    handle.send(SessionCommand::EndInterview).await.unwrap();
    let SessionOutcome::Completed(report) = handle.wait().await.unwrap() else {
        panic!("end should complete the interview");
    };
    assert_eq!(report.evaluations.len(), 1);
    assert_eq!(harness.uploads(), vec![("Question 0".to_string(), 16)]);
}
