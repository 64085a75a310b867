use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    capture::Recording,
    client::{InterviewBackend, ProcessResponse},
    workers::Worker,
};

pub struct EvaluationJob {
    pub index: usize,
    pub question: String,
    pub recording: Recording,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Evaluated {
        index: usize,
        question: String,
        response: ProcessResponse,
    },
    Failed {
        index: usize,
        message: String,
    },
}

impl EvaluationOutcome {
    pub fn index(&self) -> usize {
        match self {
            EvaluationOutcome::Evaluated { index, .. } | EvaluationOutcome::Failed { index, .. } => {
                *index
            }
        }
    }
}

/// Sends each finalized answer to the evaluation backend, one at a time.
pub struct EvaluateAnswerWorker {
    backend: Arc<dyn InterviewBackend>,
    results: mpsc::UnboundedSender<EvaluationOutcome>,
}

impl EvaluateAnswerWorker {
    pub fn new(
        backend: Arc<dyn InterviewBackend>,
        results: mpsc::UnboundedSender<EvaluationOutcome>,
    ) -> Self {
        Self { backend, results }
    }
}

impl Worker for EvaluateAnswerWorker {
    const SUBSCRIBER_ID: &'static str = "evaluate_answer";

    type Job = EvaluationJob;

    async fn handle(&mut self, job: EvaluationJob) -> anyhow::Result<()> {
        let outcome = match self
            .backend
            .process_answer(&job.recording, &job.question)
            .await
        {
            Ok(response) => {
                info!(index = job.index, "answer evaluated");
                EvaluationOutcome::Evaluated {
                    index: job.index,
                    question: job.question,
                    response,
                }
            }
            Err(e) => {
                warn!(index = job.index, error = %e, "answer evaluation failed");
                EvaluationOutcome::Failed {
                    index: job.index,
                    message: e.to_string(),
                }
            }
        };

        self.results
            .send(outcome)
            .map_err(|_| anyhow!("session task is gone, dropping evaluation"))
    }
}
