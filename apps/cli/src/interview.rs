//! `mockview interview run`: drives a session from line commands on stdin and
//! renders its events as they arrive.

use std::{path::Path, sync::Arc};

use anyhow::{Result, bail};
use console::style;
use indicatif::ProgressBar;
use mockview_core::{
    InterviewBackend, InterviewConfig, InterviewSession, InterviewType, MediaCapture,
    MockviewError, SessionCommand, SessionOutcome, SessionStore, WavFileDevice,
    events::{SessionEvent, SharedEvent},
    format::{format_clock, format_evaluation, format_summary_chart},
    session::{PROCESSING_ERROR, SessionHandle},
    store::{InterviewPlan, SessionContext},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::debug;

use crate::{
    backend,
    ui::{create_clock, create_spinner, fail, ok, rule, warn_line},
};

const HELP: &str = "r = record, s = stop, n = next question, e = end interview, q = quit";

enum Input {
    Command(SessionCommand),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "record" => Some(Input::Command(SessionCommand::StartRecording)),
        "s" | "stop" => Some(Input::Command(SessionCommand::StopRecording)),
        "n" | "next" => Some(Input::Command(SessionCommand::NextQuestion)),
        "e" | "end" => Some(Input::Command(SessionCommand::EndInterview)),
        "q" | "quit" => Some(Input::Quit),
        _ => None,
    }
}

/// Terminal view of one session.
#[derive(Default)]
struct Renderer {
    question_secs: u32,
    clock: Option<ProgressBar>,
    recording: bool,
    evaluating: bool,
}

impl Renderer {
    fn say(&self, line: impl AsRef<str>) {
        match &self.clock {
            Some(pb) => pb.println(line.as_ref()),
            None => println!("{}", line.as_ref()),
        }
    }

    fn close_clock(&mut self) {
        if let Some(pb) = self.clock.take() {
            pb.finish_and_clear();
        }
    }

    fn is_busy(&self) -> bool {
        self.recording || self.evaluating
    }

    fn render(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::InterviewStarted {
                resume_name,
                total_questions,
                question_secs,
            } => {
                self.question_secs = *question_secs;
                ok(&format!(
                    "Interview started{}: {} questions, {} per answer",
                    resume_name
                        .as_deref()
                        .map(|r| format!(" for {}", style(r).cyan()))
                        .unwrap_or_default(),
                    total_questions,
                    format_clock(*question_secs)
                ));
                println!("{}", style(HELP).dim());
            }
            SessionEvent::QuestionPresented {
                index,
                total,
                question,
            } => {
                self.close_clock();
                println!("\n{}", rule());
                println!(
                    "{} {}\n",
                    style(format!("Question {}/{}", index + 1, total)).cyan().bold(),
                    question
                );
                let pb = create_clock(self.question_secs);
                pb.set_message(format_clock(self.question_secs));
                self.clock = Some(pb);
            }
            SessionEvent::TimerTick { remaining_secs, .. } => {
                if let Some(pb) = &self.clock {
                    pb.set_position(u64::from(self.question_secs.saturating_sub(*remaining_secs)));
                    pb.set_message(format_clock(*remaining_secs));
                }
            }
            SessionEvent::RecordingStarted { .. } => {
                self.recording = true;
                self.say(format!("{} Recording...", style("●").red().bold()));
            }
            SessionEvent::RecordingStopped { duration_secs, .. } => {
                self.recording = false;
                self.evaluating = true;
                self.say(format!(
                    "{} Answer captured ({:.1}s), evaluating...",
                    style("■").dim(),
                    duration_secs
                ));
            }
            SessionEvent::AnswerEvaluated { response, .. } => {
                self.evaluating = false;
                let transcript = response.actual.as_deref().unwrap_or_default();
                self.say(format!("{} {}", style("Transcript:").dim(), transcript));
                self.say(format_evaluation(response));
                if let Some(expected) = response.expected.as_deref().filter(|e| !e.is_empty()) {
                    self.say(format!("{} {}", style("Expected answer:").dim(), expected));
                }
            }
            SessionEvent::AnswerFailed { message, .. } => {
                self.evaluating = false;
                self.recording = false;
                self.say(format!(
                    "{} {} {}",
                    style("✗").red().bold(),
                    PROCESSING_ERROR,
                    style(message).dim()
                ));
            }
            SessionEvent::CommandRejected { reason, .. } => {
                self.say(format!("{} {}", style("!").yellow().bold(), reason));
            }
            SessionEvent::InterviewEnded {
                report,
                roadmap_error,
                persist_error,
            } => {
                self.close_clock();
                println!("\n{}", rule());
                ok(&format!(
                    "Interview ended with {} evaluated answers",
                    report.evaluations.len()
                ));
                println!("\n{}\n", format_summary_chart(&report.summary));
                if let Some(error) = roadmap_error {
                    warn_line(&format!("Learning path unavailable: {error}"));
                }
                if let Some(error) = persist_error {
                    fail(&format!("The report could not be saved: {error}"));
                }
            }
        }
    }
}

pub async fn run(answers: &Path, store: SessionStore, config: InterviewConfig) -> Result<()> {
    let plan = InterviewPlan::load(&store)?;
    let context = SessionContext::load(&store);
    if context.interview_type == Some(InterviewType::Coding) {
        bail!(
            "Coding interviews run from the DSA dashboard: {}",
            style("mockview coding pick").cyan()
        );
    }

    println!(
        "\n{}  {}\n",
        style("mockview").cyan().bold(),
        style(format!("[{} total]", format_clock(plan.timer_secs))).dim()
    );

    let backend: Arc<dyn InterviewBackend> = Arc::new(backend()?);
    let capture = MediaCapture::new(WavFileDevice::new(answers), config.finalize_timeout);
    let session = InterviewSession::new(context, plan.questions, capture, backend, store, config);
    let mut events = session.subscribe();

    let spinner = create_spinner("Requesting camera and microphone...");
    let started = session.start().await;
    spinner.finish_and_clear();
    let handle = match started {
        Ok(handle) => handle,
        Err(e @ MockviewError::PermissionDenied { .. }) => {
            fail("Camera and microphone access denied or not available.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    drive(handle, &mut events).await
}

/// The session may already be over; the event stream says so.
async fn send(handle: &SessionHandle, command: SessionCommand) {
    if let Err(e) = handle.send(command).await {
        debug!(command = command.name(), error = %e, "command not delivered");
    }
}

async fn drive(
    handle: SessionHandle,
    events: &mut broadcast::Receiver<SharedEvent>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut renderer = Renderer::default();
    let mut input_open = true;
    let mut end_requested = false;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line? {
                Some(line) => match parse_input(&line) {
                    Some(Input::Command(command)) => send(&handle, command).await,
                    Some(Input::Quit) => {
                        renderer.close_clock();
                        handle.abandon().await?;
                        warn_line("Interview abandoned. Nothing was saved.");
                        return Ok(());
                    }
                    None if line.trim().is_empty() => {}
                    None => renderer.say(format!("{} {}", style("?").yellow(), HELP)),
                },
                None => {
                    // Input ran out: wrap up once the last answer is in.
                    input_open = false;
                    end_requested = true;
                    if renderer.recording {
                        send(&handle, SessionCommand::StopRecording).await;
                    } else if !renderer.evaluating {
                        send(&handle, SessionCommand::EndInterview).await;
                    }
                }
            },
            event = events.recv() => match event {
                Ok(event) => {
                    renderer.render(&event.event);
                    match &event.event {
                        SessionEvent::InterviewEnded { .. } => break,
                        SessionEvent::AnswerEvaluated { .. } | SessionEvent::AnswerFailed { .. }
                            if end_requested && !renderer.is_busy() =>
                        {
                            send(&handle, SessionCommand::EndInterview).await;
                        }
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "renderer fell behind"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    match handle.wait().await? {
        SessionOutcome::Completed(_) => println!(
            "Report saved. View it with {}",
            style("mockview results show").cyan()
        ),
        SessionOutcome::Abandoned => warn_line("Interview abandoned. Nothing was saved."),
    }
    Ok(())
}
