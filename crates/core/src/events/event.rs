use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{client::ProcessResponse, types::InterviewReport};

/// Everything an interview session reports to its observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    InterviewStarted {
        resume_name: Option<String>,
        total_questions: usize,
        question_secs: u32,
    },
    QuestionPresented {
        index: usize,
        total: usize,
        question: String,
    },
    TimerTick {
        index: usize,
        remaining_secs: u32,
    },
    RecordingStarted {
        index: usize,
    },
    RecordingStopped {
        index: usize,
        bytes: usize,
        duration_secs: f64,
    },
    AnswerEvaluated {
        index: usize,
        question: String,
        response: ProcessResponse,
    },
    AnswerFailed {
        index: usize,
        message: String,
    },
    CommandRejected {
        command: &'static str,
        reason: String,
    },
    InterviewEnded {
        report: InterviewReport,
        roadmap_error: Option<String>,
        /// Set when the report could not be written to the session store.
        persist_error: Option<String>,
    },
}

impl SessionEvent {
    pub const INTERVIEW_STARTED: &'static str = "interview.started";
    pub const QUESTION_PRESENTED: &'static str = "question.presented";
    pub const TIMER_TICK: &'static str = "timer.tick";
    pub const RECORDING_STARTED: &'static str = "recording.started";
    pub const RECORDING_STOPPED: &'static str = "recording.stopped";
    pub const ANSWER_EVALUATED: &'static str = "answer.evaluated";
    pub const ANSWER_FAILED: &'static str = "answer.failed";
    pub const COMMAND_REJECTED: &'static str = "command.rejected";
    pub const INTERVIEW_ENDED: &'static str = "interview.ended";

    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::InterviewStarted { .. } => Self::INTERVIEW_STARTED,
            SessionEvent::QuestionPresented { .. } => Self::QUESTION_PRESENTED,
            SessionEvent::TimerTick { .. } => Self::TIMER_TICK,
            SessionEvent::RecordingStarted { .. } => Self::RECORDING_STARTED,
            SessionEvent::RecordingStopped { .. } => Self::RECORDING_STOPPED,
            SessionEvent::AnswerEvaluated { .. } => Self::ANSWER_EVALUATED,
            SessionEvent::AnswerFailed { .. } => Self::ANSWER_FAILED,
            SessionEvent::CommandRejected { .. } => Self::COMMAND_REJECTED,
            SessionEvent::InterviewEnded { .. } => Self::INTERVIEW_ENDED,
        }
    }

    /// Ticks are frequent; everything else is worth a log line.
    pub fn is_noisy(&self) -> bool {
        matches!(self, SessionEvent::TimerTick { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedEvent {
    pub event: SessionEvent,
    pub event_id: Uuid,
    pub session_id: Uuid,
    pub ingest_seq: u64,
    pub timestamp: DateTime<Utc>,
}

impl EnrichedEvent {
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

pub type SharedEvent = Arc<EnrichedEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_events_are_tagged() {
        let event = SessionEvent::AnswerFailed {
            index: 1,
            message: "Error processing audio.".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "answer_failed");
        assert_eq!(value["index"], 1);
        assert_eq!(event.event_type(), "answer.failed");
    }
}
