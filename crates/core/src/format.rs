use chrono::Local;

use crate::{
    client::ProcessResponse,
    types::{Evaluation, InterviewReport, Submission, Summary},
};

const BAR_WIDTH: usize = 20;
const SCORE_MAX: f64 = 10.0;

/// Format seconds as MM:SS
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Per-answer feedback block: one `DOMAIN: n/10` line per score, then the feedback.
pub fn format_evaluation(response: &ProcessResponse) -> String {
    let Some(feedback) = response.feedback.as_deref().filter(|f| !f.is_empty()) else {
        return "No evaluation returned.".to_string();
    };

    let score_lines = response
        .domain_scores
        .as_ref()
        .map(|scores| {
            scores
                .entries()
                .iter()
                .map(|(domain, score)| format!("{}: {}/10", domain.to_uppercase(), score))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    format!("{score_lines}\n\nFeedback: {feedback}")
}

fn score_bar(value: f64) -> String {
    let filled = ((value.clamp(0.0, SCORE_MAX) / SCORE_MAX) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn format_summary_chart(summary: &Summary) -> String {
    summary
        .rows()
        .iter()
        .map(|(label, value)| format!("{:<16} {} {:>4.1}", label, score_bar(*value), value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn score_or_na(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), |s| s.to_string())
}

pub fn format_evaluation_card(index: usize, evaluation: &Evaluation) -> String {
    let scores = &evaluation.scores;
    let mut output = String::new();
    output.push_str(&format!("### Question {}\n\n", index + 1));
    output.push_str(&format!("**Question:** {}\n\n", evaluation.question));
    output.push_str(&format!("**Answer:** {}\n\n", evaluation.transcription));
    if !evaluation.feedback.gpt.is_empty() {
        output.push_str(&format!("**Feedback:** {}\n\n", evaluation.feedback.gpt));
    }
    output.push_str(&format!(
        "Clarity Score: {}\nTechnical Score: {}\nStructure Score: {}\nAnswer Score: {}\nFace Confidence: {}\n",
        score_or_na(scores.clarity_score),
        score_or_na(scores.technical_score),
        score_or_na(scores.structure_score),
        score_or_na(scores.answer_score),
        score_or_na(scores.face_confidence),
    ));
    output
}

pub fn format_report_readable(report: &InterviewReport) -> String {
    let mut output = String::new();
    output.push_str("# Interview Evaluation Scores\n\n");
    output.push_str(&format_summary_chart(&report.summary));
    output.push_str("\n\n");

    output.push_str("## Overall feedback\n\n");
    output.push_str(&report.overall_feedback);
    output.push_str("\n\n");

    output.push_str(&format!("## Answers ({})\n\n", report.evaluations.len()));
    for (i, evaluation) in report.evaluations.iter().enumerate() {
        output.push_str(&format_evaluation_card(i, evaluation));
        output.push('\n');
    }

    if let Some(path) = &report.learning_path {
        output.push_str("## Learning path\n\n");
        for step in path {
            output.push_str(&format!("• {}\n", step));
        }
        output.push('\n');
    }

    output
}

pub fn format_submission(submission: &Submission) -> String {
    let result = if submission.output.is_empty() {
        "No output returned."
    } else {
        submission.output.as_str()
    };
    format!(
        "{}\nRole: {} | Difficulty: {}\n\n{}\n\nResult:\n{}\n",
        submission.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        submission.role,
        submission.difficulty,
        submission.code,
        result
    )
}
