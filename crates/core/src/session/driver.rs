//! The task that owns a running interview: its machine, its capture device,
//! its per-question timer and its evaluation worker.

use std::sync::Arc;

use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    capture::{CaptureDevice, MediaCapture},
    client::InterviewBackend,
    config::InterviewConfig,
    error::{MockviewError, Result},
    events::{BusConfig, EventBus, SessionEvent, SharedEvent},
    session::{Advance, InterviewMachine},
    store::{SessionContext, SessionStore, keys, persist_report},
    timer::Timer,
    types::InterviewReport,
    workers::{EvaluateAnswerWorker, EvaluationJob, EvaluationOutcome, Worker},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    StartRecording,
    StopRecording,
    NextQuestion,
    EndInterview,
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::StartRecording => "record",
            SessionCommand::StopRecording => "stop",
            SessionCommand::NextQuestion => "next",
            SessionCommand::EndInterview => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(InterviewReport),
    /// The handle went away before the interview ended. Nothing was persisted.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerSignal {
    Tick { generation: u64, remaining: u32 },
    Expired { generation: u64 },
}

impl TimerSignal {
    fn generation(&self) -> u64 {
        match self {
            TimerSignal::Tick { generation, .. } | TimerSignal::Expired { generation } => *generation,
        }
    }

    /// Signals from a timer armed for an earlier question.
    fn is_stale(&self, current: u64) -> bool {
        self.generation() != current
    }
}

/// A configured interview that has not started yet.
pub struct InterviewSession<D: CaptureDevice> {
    context: SessionContext,
    questions: Vec<String>,
    capture: MediaCapture<D>,
    backend: Arc<dyn InterviewBackend>,
    store: SessionStore,
    config: InterviewConfig,
    bus: EventBus,
}

impl<D: CaptureDevice + 'static> InterviewSession<D> {
    pub fn new(
        context: SessionContext,
        questions: Vec<String>,
        capture: MediaCapture<D>,
        backend: Arc<dyn InterviewBackend>,
        store: SessionStore,
        config: InterviewConfig,
    ) -> Self {
        Self {
            context,
            questions,
            capture,
            backend,
            store,
            config,
            bus: EventBus::new(BusConfig::default()),
        }
    }

    /// Subscribe before `start` to see the opening events.
    pub fn subscribe(&self) -> broadcast::Receiver<SharedEvent> {
        self.bus.subscribe()
    }

    /// Acquire the devices, present the first question and hand the session
    /// to its own task.
    pub async fn start(self) -> Result<SessionHandle> {
        let Self {
            context,
            questions,
            mut capture,
            backend,
            mut store,
            config,
            bus,
        } = self;

        let mut machine = InterviewMachine::new(questions);
        if machine.cursor().total == 0 {
            return Err(MockviewError::validation("No questions loaded."));
        }
        capture.acquire().await?;
        let first = machine.start()?.to_string();
        info!(
            resume = context.resume_name.as_deref().unwrap_or("-"),
            questions = machine.cursor().total,
            "interview starting"
        );

        store.set(keys::STARTED, "true");
        store.save().await?;

        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (jobs_tx, jobs_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let worker = EvaluateAnswerWorker::new(Arc::clone(&backend), outcomes_tx);
        let worker_task = tokio::spawn(worker.run(jobs_rx, shutdown_rx));

        let task = SessionTask {
            context,
            machine,
            capture,
            timer: Timer::new(),
            timer_generation: 0,
            timer_tx,
            question_secs: config.question_duration.as_secs().min(u32::MAX as u64) as u32,
            bus: bus.clone(),
            backend,
            store,
            jobs: jobs_tx,
            worker_task,
            shutdown: shutdown_tx,
            pending: None,
            advance_when_resolved: false,
        };

        let join = tokio::spawn(task.run(first, commands_rx, timer_rx, outcomes_rx));
        Ok(SessionHandle {
            commands: commands_tx,
            bus,
            task: join,
        })
    }
}

pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    bus: EventBus,
    task: JoinHandle<Result<SessionOutcome>>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| MockviewError::InvalidState("the interview session has ended".into()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SharedEvent> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end on its own (last question or End).
    pub async fn wait(self) -> Result<SessionOutcome> {
        let Self { commands, task, .. } = self;
        let outcome = join(task).await;
        drop(commands);
        outcome
    }

    /// Leave the interview: timers stop, devices are released, no report.
    pub async fn abandon(self) -> Result<SessionOutcome> {
        let Self { commands, task, .. } = self;
        drop(commands);
        join(task).await
    }
}

async fn join(task: JoinHandle<Result<SessionOutcome>>) -> Result<SessionOutcome> {
    task.await
        .map_err(|e| MockviewError::InvalidState(format!("interview session task failed: {e}")))?
}

struct SessionTask<D: CaptureDevice> {
    context: SessionContext,
    machine: InterviewMachine,
    capture: MediaCapture<D>,
    timer: Timer,
    timer_generation: u64,
    timer_tx: mpsc::UnboundedSender<TimerSignal>,
    question_secs: u32,
    bus: EventBus,
    backend: Arc<dyn InterviewBackend>,
    store: SessionStore,
    jobs: mpsc::Sender<EvaluationJob>,
    worker_task: JoinHandle<()>,
    shutdown: broadcast::Sender<()>,
    /// Question index whose answer is being evaluated.
    pending: Option<usize>,
    advance_when_resolved: bool,
}

impl<D: CaptureDevice + 'static> SessionTask<D> {
    async fn run(
        mut self,
        first: String,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerSignal>,
        mut outcomes: mpsc::UnboundedReceiver<EvaluationOutcome>,
    ) -> Result<SessionOutcome> {
        self.bus.publish(SessionEvent::InterviewStarted {
            resume_name: self.context.resume_name.clone(),
            total_questions: self.machine.cursor().total,
            question_secs: self.question_secs,
        });
        self.present(0, first);

        loop {
            let finished = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await?,
                    None => {
                        self.abandon();
                        return Ok(SessionOutcome::Abandoned);
                    }
                },
                Some(signal) = timer_rx.recv() => self.on_timer(signal).await?,
                Some(outcome) = outcomes.recv() => self.on_outcome(outcome).await?,
            };

            if let Some(report) = finished {
                return Ok(SessionOutcome::Completed(report));
            }
        }
    }

    fn present(&mut self, index: usize, question: String) {
        self.bus.publish(SessionEvent::QuestionPresented {
            index,
            total: self.machine.cursor().total,
            question,
        });
        self.arm_timer();
    }

    fn arm_timer(&mut self) {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let tick_tx = self.timer_tx.clone();
        let expire_tx = self.timer_tx.clone();

        self.timer.start(
            self.question_secs,
            move |remaining| {
                let _ = tick_tx.send(TimerSignal::Tick {
                    generation,
                    remaining,
                });
            },
            move || {
                let _ = expire_tx.send(TimerSignal::Expired { generation });
            },
        );
    }

    fn reject(&self, command: SessionCommand, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(command = command.name(), reason = %reason, "command rejected");
        self.bus.publish(SessionEvent::CommandRejected {
            command: command.name(),
            reason,
        });
    }

    async fn on_command(&mut self, command: SessionCommand) -> Result<Option<InterviewReport>> {
        match command {
            SessionCommand::StartRecording => {
                if self.capture.is_recording() {
                    self.reject(command, "A recording is already in progress.");
                } else if self.pending.is_some() {
                    self.reject(command, "The previous answer is still being evaluated.");
                } else if let Err(e) = self.capture.start_recording() {
                    self.reject(command, e.to_string());
                } else {
                    self.machine.begin_answer();
                    self.bus.publish(SessionEvent::RecordingStarted {
                        index: self.machine.cursor().index,
                    });
                }
                Ok(None)
            }
            SessionCommand::StopRecording => {
                if self.capture.is_recording() {
                    self.stop_and_submit().await;
                } else {
                    self.reject(command, "No recording is in progress.");
                }
                Ok(None)
            }
            SessionCommand::NextQuestion | SessionCommand::EndInterview => {
                if self.capture.is_recording() {
                    self.reject(command, "Stop the recording first.");
                    return Ok(None);
                }
                if self.pending.is_some() {
                    self.reject(command, "The previous answer is still being evaluated.");
                    return Ok(None);
                }

                if command == SessionCommand::NextQuestion {
                    self.advance().await
                } else {
                    match self.machine.end() {
                        Some(report) => self.finish(report).await.map(Some),
                        None => Ok(None),
                    }
                }
            }
        }
    }

    async fn on_timer(&mut self, signal: TimerSignal) -> Result<Option<InterviewReport>> {
        if signal.is_stale(self.timer_generation) {
            debug!(generation = signal.generation(), "dropping stale timer signal");
            return Ok(None);
        }

        match signal {
            TimerSignal::Tick { remaining, .. } => {
                self.bus.publish(SessionEvent::TimerTick {
                    index: self.machine.cursor().index,
                    remaining_secs: remaining,
                });
                Ok(None)
            }
            TimerSignal::Expired { .. } => {
                info!(index = self.machine.cursor().index, "question time is up");
                if self.capture.is_recording() {
                    self.stop_and_submit().await;
                }
                if self.pending.is_some() {
                    self.advance_when_resolved = true;
                    Ok(None)
                } else {
                    self.advance().await
                }
            }
        }
    }

    async fn on_outcome(&mut self, outcome: EvaluationOutcome) -> Result<Option<InterviewReport>> {
        if self.pending != Some(outcome.index()) {
            warn!(index = outcome.index(), "evaluation for an answer that is not pending");
            return Ok(None);
        }
        self.pending = None;

        match outcome {
            EvaluationOutcome::Evaluated {
                index,
                question,
                response,
            } => {
                self.machine.record_evaluation(question.clone(), &response);
                self.bus.publish(SessionEvent::AnswerEvaluated {
                    index,
                    question,
                    response,
                });
            }
            EvaluationOutcome::Failed { index, message } => {
                self.machine.record_failure();
                self.bus
                    .publish(SessionEvent::AnswerFailed { index, message });
            }
        }

        if std::mem::take(&mut self.advance_when_resolved) {
            return self.advance().await;
        }
        Ok(None)
    }

    /// Finalize the open recording and queue exactly one evaluation for it.
    async fn stop_and_submit(&mut self) {
        let index = self.machine.cursor().index;
        let Some(question) = self.machine.current_question().map(str::to_string) else {
            return;
        };

        let recording = match self.capture.stop_recording().await {
            Ok(recording) => recording,
            Err(e) => {
                self.machine.record_failure();
                self.bus.publish(SessionEvent::AnswerFailed {
                    index,
                    message: e.to_string(),
                });
                return;
            }
        };

        self.bus.publish(SessionEvent::RecordingStopped {
            index,
            bytes: recording.bytes.len(),
            duration_secs: recording.duration_secs(),
        });

        let job = EvaluationJob {
            index,
            question,
            recording,
        };
        if self.jobs.send(job).await.is_err() {
            self.machine.record_failure();
            self.bus.publish(SessionEvent::AnswerFailed {
                index,
                message: "evaluation worker is not running".into(),
            });
            return;
        }
        self.pending = Some(index);
    }

    async fn advance(&mut self) -> Result<Option<InterviewReport>> {
        match self.machine.advance() {
            Advance::Next { index, question } => {
                self.present(index, question);
                Ok(None)
            }
            Advance::Finished(report) => self.finish(report).await.map(Some),
            Advance::Ignored => Ok(None),
        }
    }

    /// Tear down, then try for a learning path and persist the report either way.
    /// `InterviewEnded` is published even when persisting fails.
    async fn finish(&mut self, mut report: InterviewReport) -> Result<InterviewReport> {
        self.timer.cancel();
        self.capture.release();
        let _ = self.shutdown.send(());

        let roadmap_error = match self.backend.generate_roadmap(&report.summary).await {
            Ok(path) => {
                report.learning_path = Some(path);
                None
            }
            Err(e) => {
                warn!(error = %e, "learning path unavailable, saving report without it");
                Some(e.to_string())
            }
        };

        let persisted = self.persist(&report).await;
        if let Err(e) = &persisted {
            warn!(error = %e, "interview report could not be saved");
        }

        self.bus.publish(SessionEvent::InterviewEnded {
            report: report.clone(),
            roadmap_error,
            persist_error: persisted.as_ref().err().map(ToString::to_string),
        });
        persisted.map(|()| report)
    }

    async fn persist(&mut self, report: &InterviewReport) -> Result<()> {
        persist_report(&mut self.store, report)?;
        self.store.set(keys::STARTED, "false");
        self.store.save().await
    }

    fn abandon(&mut self) {
        self.timer.cancel();
        self.capture.release();
        self.worker_task.abort();
        info!(
            index = self.machine.cursor().index,
            "interview abandoned, nothing saved"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_from_earlier_questions_are_stale() {
        let tick = TimerSignal::Tick {
            generation: 1,
            remaining: 4,
        };
        let expired = TimerSignal::Expired { generation: 2 };

        assert!(tick.is_stale(2));
        assert!(!expired.is_stale(2));
        assert!(expired.is_stale(3));
    }

    #[test]
    fn commands_have_short_names() {
        assert_eq!(SessionCommand::StartRecording.name(), "record");
        assert_eq!(SessionCommand::EndInterview.name(), "end");
    }
}
