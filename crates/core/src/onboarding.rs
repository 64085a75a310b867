//! Getting a session going: credentials, the Get Started form and the DSA
//! dashboard. Each step persists what the next screen reads.

use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::{
    client::BackendClient,
    config::InterviewConfig,
    error::{MockviewError, Result},
    question_bank::{self, Difficulty},
    store::{CodingChallenge, Credentials, InterviewPlan, SessionStore},
    types::InterviewType,
};

pub fn login(store: &mut SessionStore, token: &str, user_id: Option<&str>) -> Result<Credentials> {
    let token = token.trim();
    if token.is_empty() {
        return Err(MockviewError::validation("A login token is required."));
    }
    let credentials = Credentials {
        token: token.to_string(),
        user_id: user_id
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
    };
    credentials.persist(store);
    Ok(credentials)
}

/// Every key goes, not just the credentials.
pub fn logout(store: &mut SessionStore) {
    store.clear();
}

fn resume_name(resume: &Path) -> Result<String> {
    if !resume.is_file() {
        return Err(MockviewError::validation("Please upload your resume file."));
    }
    Ok(resume
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resume.display().to_string()))
}

/// Validate the Get Started form and persist the interview plan.
///
/// Managerial interviews get their questions generated from the resume;
/// coding interviews continue at the DSA dashboard.
pub async fn get_started(
    client: &BackendClient,
    store: &mut SessionStore,
    resume: &Path,
    interview_type: Option<InterviewType>,
    config: &InterviewConfig,
) -> Result<InterviewPlan> {
    let name = resume_name(resume)?;
    let interview_type = interview_type
        .ok_or_else(|| MockviewError::validation("Please select the type of interview."))?;

    let plan = match interview_type {
        InterviewType::Managerial => {
            let questions = client.upload_resume(resume).await?;
            info!(count = questions.len(), "interview questions generated");
            InterviewPlan::managerial(name, questions, config)
        }
        InterviewType::Coding => InterviewPlan::coding(name, config),
    };

    plan.persist(store)?;
    Ok(plan)
}

/// Pick a random question for `difficulty` and persist it as the current challenge.
pub fn start_coding<R: Rng + ?Sized>(
    store: &mut SessionStore,
    role: &str,
    difficulty: Option<Difficulty>,
    rng: &mut R,
) -> Result<CodingChallenge> {
    let role = role.trim();
    let Some(difficulty) = difficulty.filter(|_| !role.is_empty()) else {
        return Err(MockviewError::validation(
            "Please choose a role and a difficulty.",
        ));
    };

    let question = question_bank::sample(difficulty, rng)?;
    info!(id = %question.id, role, %difficulty, "coding question picked");
    let challenge = CodingChallenge::new(role, difficulty, &question);
    challenge.persist(store);
    Ok(challenge)
}
