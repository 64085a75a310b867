//! The question-advance state machine, free of timers and I/O.

use tracing::{debug, info};

use crate::{
    client::ProcessResponse,
    error::{MockviewError, Result},
    format::format_evaluation,
    summary::compile_report,
    types::{Evaluation, Feedback, InterviewReport},
};

/// Transcript shown when an answer could not be evaluated.
pub const PROCESSING_ERROR: &str = "Error processing audio.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionCursor {
    pub index: usize,
    pub total: usize,
}

impl QuestionCursor {
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next { index: usize, question: String },
    Finished(InterviewReport),
    /// The interview is not in progress.
    Ignored,
}

/// What the candidate sees for the current answer. Reset on every new question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerView {
    pub transcript: String,
    pub evaluation: String,
    pub expected_answer: String,
}

#[derive(Debug, Clone)]
pub struct InterviewMachine {
    phase: Phase,
    questions: Vec<String>,
    cursor: QuestionCursor,
    evaluations: Vec<Evaluation>,
    view: AnswerView,
}

impl InterviewMachine {
    pub fn new(questions: Vec<String>) -> Self {
        let total = questions.len();
        Self {
            phase: Phase::NotStarted,
            questions,
            cursor: QuestionCursor { index: 0, total },
            evaluations: Vec::new(),
            view: AnswerView::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> QuestionCursor {
        self.cursor
    }

    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn view(&self) -> &AnswerView {
        &self.view
    }

    pub fn current_question(&self) -> Option<&str> {
        match self.phase {
            Phase::InProgress => self.questions.get(self.cursor.index).map(String::as_str),
            Phase::NotStarted | Phase::Ended => None,
        }
    }

    pub fn start(&mut self) -> Result<&str> {
        if self.questions.is_empty() {
            return Err(MockviewError::validation("No questions loaded."));
        }
        if self.phase != Phase::NotStarted {
            return Err(MockviewError::InvalidState(
                "the interview has already started".into(),
            ));
        }

        self.phase = Phase::InProgress;
        self.cursor.index = 0;
        self.evaluations.clear();
        self.view = AnswerView::default();
        info!(total = self.cursor.total, "interview started");
        Ok(&self.questions[0])
    }

    pub fn can_record(&self) -> bool {
        self.phase == Phase::InProgress
    }

    /// A new recording replaces whatever the previous attempt showed.
    pub fn begin_answer(&mut self) {
        self.view.transcript.clear();
        self.view.evaluation.clear();
    }

    /// Append the evaluation of an answer to `question`. Returns false, and
    /// records nothing, once the interview is no longer in progress.
    pub fn record_evaluation(&mut self, question: String, response: &ProcessResponse) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }

        let transcription = response.actual.clone().unwrap_or_default();
        self.view.transcript = transcription.clone();
        self.view.evaluation = format_evaluation(response);
        self.view.expected_answer = response.expected.clone().unwrap_or_default();

        self.evaluations.push(Evaluation {
            question,
            transcription,
            feedback: Feedback {
                gpt: response.feedback.clone().unwrap_or_default(),
            },
            scores: response.domain_scores.clone().unwrap_or_default(),
        });
        debug!(count = self.evaluations.len(), "evaluation appended");
        true
    }

    /// A failed evaluation is shown, never appended.
    pub fn record_failure(&mut self) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        self.view.transcript = PROCESSING_ERROR.to_string();
        self.view.evaluation.clear();
        true
    }

    pub fn advance(&mut self) -> Advance {
        if self.phase != Phase::InProgress {
            return Advance::Ignored;
        }

        if self.cursor.is_last() {
            return Advance::Finished(self.finish());
        }

        self.cursor.index += 1;
        self.view = AnswerView::default();
        debug!(index = self.cursor.index, "question advanced");
        Advance::Next {
            index: self.cursor.index,
            question: self.questions[self.cursor.index].clone(),
        }
    }

    /// Finish now with whatever was collected. `None` unless the interview
    /// was in progress; ending before the start just closes it.
    pub fn end(&mut self) -> Option<InterviewReport> {
        match self.phase {
            Phase::InProgress => Some(self.finish()),
            Phase::NotStarted => {
                self.phase = Phase::Ended;
                None
            }
            Phase::Ended => None,
        }
    }

    fn finish(&mut self) -> InterviewReport {
        self.phase = Phase::Ended;
        self.view = AnswerView::default();
        info!(
            presented = self.cursor.index + 1,
            evaluated = self.evaluations.len(),
            "interview ended"
        );
        compile_report(self.evaluations.clone())
    }
}
