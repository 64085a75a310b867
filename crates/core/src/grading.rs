/// Outcome of comparing a submission's output against the stored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Mismatch { output: String },
    /// No expected output to compare with, or the run used custom input.
    Ungraded { output: String },
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn message(&self) -> String {
        match self {
            Verdict::Correct => "Successfully submitted.".to_string(),
            Verdict::Mismatch { output } => format!(
                "{}\nOutput did not match expected output.",
                or_submitted(output)
            ),
            Verdict::Ungraded { output } => or_submitted(output).to_string(),
        }
    }
}

fn or_submitted(output: &str) -> &str {
    if output.is_empty() {
        "Code submitted."
    } else {
        output
    }
}

/// Trimmed string equality between `actual` and `expected`.
///
/// Free-form runs (`custom_input`) and questions without a non-blank expected
/// output are never graded.
pub fn grade_output(expected: Option<&str>, actual: &str, custom_input: bool) -> Verdict {
    let expected = match expected.map(str::trim) {
        Some(e) if !custom_input && !e.is_empty() => e,
        _ => {
            return Verdict::Ungraded {
                output: actual.to_string(),
            };
        }
    };

    if actual.trim() == expected {
        Verdict::Correct
    } else {
        Verdict::Mismatch {
            output: actual.to_string(),
        }
    }
}
