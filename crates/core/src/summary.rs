use crate::types::{Evaluation, InterviewReport, Summary};

pub const OVERALL_FEEDBACK: &str = "Great job! Keep refining your communication.";

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average each tracked domain over all evaluations, one decimal place.
///
/// A missing score counts as 0 and an empty list averages to 0.
pub fn compute_summary(evaluations: &[Evaluation]) -> Summary {
    let count = evaluations.len().max(1) as f64;
    // Summed in sorted order so permutations agree bit for bit.
    let average = |score: fn(&Evaluation) -> Option<f64>| {
        let mut values: Vec<f64> = evaluations
            .iter()
            .map(|e| score(e).unwrap_or(0.0))
            .collect();
        values.sort_by(f64::total_cmp);
        round1(values.iter().sum::<f64>() / count)
    };

    Summary {
        average_clarity_score: average(|e| e.scores.clarity_score),
        average_technical_score: average(|e| e.scores.technical_score),
        average_structure_score: average(|e| e.scores.structure_score),
        average_face_confidence: average(|e| e.scores.face_confidence),
    }
}

pub fn compile_report(evaluations: Vec<Evaluation>) -> InterviewReport {
    InterviewReport {
        summary: compute_summary(&evaluations),
        evaluations,
        overall_feedback: OVERALL_FEEDBACK.to_string(),
        learning_path: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DomainScores, Feedback};

    fn evaluation(clarity: Option<f64>, technical: Option<f64>, face: Option<f64>) -> Evaluation {
        Evaluation {
            question: "q".into(),
            transcription: String::new(),
            feedback: Feedback::default(),
            scores: DomainScores {
                clarity_score: clarity,
                technical_score: technical,
                structure_score: None,
                face_confidence: face,
                answer_score: Some(9.0),
            },
        }
    }

    #[test]
    fn empty_list_is_all_zero_not_nan() {
        let summary = compute_summary(&[]);
        for (_, value) in summary.rows() {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn missing_scores_count_as_zero() {
        let summary = compute_summary(&[
            evaluation(Some(8.0), None, Some(5.0)),
            evaluation(Some(6.0), Some(7.0), None),
        ]);
        assert_eq!(summary.average_clarity_score, 7.0);
        assert_eq!(summary.average_technical_score, 3.5);
        assert_eq!(summary.average_structure_score, 0.0);
        assert_eq!(summary.average_face_confidence, 2.5);
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let summary = compute_summary(&[
            evaluation(Some(7.0), None, None),
            evaluation(Some(8.0), None, None),
            evaluation(Some(8.0), None, None),
        ]);
        assert_eq!(summary.average_clarity_score, 7.7);
    }

    #[test]
    fn order_does_not_matter() {
        let a = evaluation(Some(3.3), Some(9.1), Some(4.0));
        let b = evaluation(Some(7.7), None, Some(6.6));
        let c = evaluation(None, Some(2.2), Some(8.8));

        let expected = compute_summary(&[a.clone(), b.clone(), c.clone()]);
        for permutation in [
            vec![a.clone(), c.clone(), b.clone()],
            vec![b.clone(), a.clone(), c.clone()],
            vec![b.clone(), c.clone(), a.clone()],
            vec![c.clone(), a.clone(), b.clone()],
            vec![c.clone(), b.clone(), a.clone()],
        ] {
            assert_eq!(compute_summary(&permutation), expected);
        }
    }

    #[test]
    fn report_keeps_evaluations_in_order() {
        let first = evaluation(Some(1.0), None, None);
        let second = evaluation(Some(2.0), None, None);
        let report = compile_report(vec![first.clone(), second.clone()]);
        assert_eq!(report.evaluations, vec![first, second]);
        assert_eq!(report.overall_feedback, OVERALL_FEEDBACK);
        assert!(report.learning_path.is_none());
    }
}
