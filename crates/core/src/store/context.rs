use crate::{
    config::InterviewConfig,
    error::{MockviewError, Result},
    question_bank::Difficulty,
    store::{SessionStore, keys},
    types::{InterviewReport, InterviewType, Question},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: Option<String>,
}

impl Credentials {
    /// Fails with `AuthRequired` naming `action` when no token is stored.
    pub fn load(store: &SessionStore, action: &'static str) -> Result<Self> {
        let token = store
            .get_non_empty(keys::TOKEN)
            .ok_or(MockviewError::AuthRequired { action })?;

        Ok(Self {
            token: token.to_string(),
            user_id: store.get_non_empty(keys::USER_ID).map(str::to_string),
        })
    }

    pub fn persist(&self, store: &mut SessionStore) {
        store.set(keys::TOKEN, self.token.clone());
        match &self.user_id {
            Some(user_id) => store.set(keys::USER_ID, user_id.clone()),
            None => {
                store.remove(keys::USER_ID);
            }
        }
    }
}

/// Who the candidate is practising as.
///
/// Read from the store once when a session starts and handed to it, so the
/// running session never goes back to the store for these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub role: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub interview_type: Option<InterviewType>,
    pub resume_name: Option<String>,
}

impl SessionContext {
    pub fn load(store: &SessionStore) -> Self {
        Self {
            role: store.get_non_empty(keys::ROLE).map(str::to_string),
            difficulty: store
                .get_non_empty(keys::DIFFICULTY)
                .and_then(|d| d.parse().ok()),
            interview_type: store
                .get_non_empty(keys::INTERVIEW_TYPE)
                .and_then(|t| t.parse().ok()),
            resume_name: store.get_non_empty(keys::RESUME_NAME).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingChallenge {
    pub role: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub input: Option<String>,
    pub expected_output: Option<String>,
}

impl CodingChallenge {
    pub fn new(role: impl Into<String>, difficulty: Difficulty, question: &Question) -> Self {
        Self {
            role: role.into(),
            difficulty,
            question: question.text.clone(),
            input: question.input.clone(),
            expected_output: question.expected_output.clone(),
        }
    }

    pub fn load(store: &SessionStore) -> Result<Self> {
        let missing = || MockviewError::validation("Please start from the DSA dashboard.");

        let context = SessionContext::load(store);
        let role = context.role.ok_or_else(missing)?;
        let difficulty = context.difficulty.ok_or_else(missing)?;
        let question = store.get_non_empty(keys::QUESTION).ok_or_else(missing)?;

        Ok(Self {
            role,
            difficulty,
            question: question.to_string(),
            input: store.get_non_empty(keys::INPUT).map(str::to_string),
            expected_output: store.get_non_empty(keys::EXPECTED_OUTPUT).map(str::to_string),
        })
    }

    pub fn persist(&self, store: &mut SessionStore) {
        store.set(keys::ROLE, self.role.clone());
        store.set(keys::DIFFICULTY, self.difficulty.to_string());
        store.set(keys::QUESTION, self.question.clone());
        store.set(keys::INPUT, self.input.clone().unwrap_or_default());
        store.set(
            keys::EXPECTED_OUTPUT,
            self.expected_output.clone().unwrap_or_default(),
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewPlan {
    pub resume_name: String,
    pub interview_type: InterviewType,
    pub questions: Vec<String>,
    pub question_count: u32,
    pub attempted: u32,
    pub timer_secs: u32,
    pub started: bool,
}

impl InterviewPlan {
    pub fn managerial(
        resume_name: impl Into<String>,
        questions: Vec<String>,
        config: &InterviewConfig,
    ) -> Self {
        let count = questions.len() as u32;
        Self {
            resume_name: resume_name.into(),
            interview_type: InterviewType::Managerial,
            question_count: count,
            attempted: 0,
            timer_secs: count * config.minutes_per_managerial_question * 60,
            started: false,
            questions,
        }
    }

    pub fn coding(resume_name: impl Into<String>, config: &InterviewConfig) -> Self {
        Self {
            resume_name: resume_name.into(),
            interview_type: InterviewType::Coding,
            questions: Vec::new(),
            question_count: config.coding_question_count,
            attempted: 0,
            timer_secs: config.coding_timer_secs,
            started: false,
        }
    }

    pub fn load(store: &SessionStore) -> Result<Self> {
        let missing = || MockviewError::validation("Please start from the Get Started screen.");

        let resume_name = store.get_non_empty(keys::RESUME_NAME).ok_or_else(missing)?;
        let interview_type = store
            .get_non_empty(keys::INTERVIEW_TYPE)
            .ok_or_else(missing)?
            .parse()?;
        let questions: Vec<String> = store.get_json(keys::QUESTIONS)?.unwrap_or_default();

        let number = |key: &str| {
            store
                .get(key)
                .and_then(|v| v.trim().parse::<u32>().ok())
                .unwrap_or(0)
        };

        Ok(Self {
            resume_name: resume_name.to_string(),
            interview_type,
            question_count: number(keys::QUESTION_COUNT),
            attempted: number(keys::ATTEMPTED),
            timer_secs: number(keys::TIMER),
            started: store.get(keys::STARTED) == Some("true"),
            questions,
        })
    }

    pub fn persist(&self, store: &mut SessionStore) -> Result<()> {
        if self.interview_type == InterviewType::Managerial {
            store.set_json(keys::QUESTIONS, &self.questions)?;
        }
        store.set(keys::RESUME_NAME, self.resume_name.clone());
        store.set(keys::INTERVIEW_TYPE, self.interview_type.as_str());
        store.set(keys::QUESTION_COUNT, self.question_count.to_string());
        store.set(keys::ATTEMPTED, self.attempted.to_string());
        store.set(keys::TIMER, self.timer_secs.to_string());
        store.set(keys::STARTED, self.started.to_string());
        Ok(())
    }
}

pub fn load_report(store: &SessionStore) -> Result<Option<InterviewReport>> {
    store.get_json(keys::REPORT)
}

pub fn persist_report(store: &mut SessionStore, report: &InterviewReport) -> Result<()> {
    store.set_json(keys::REPORT, report)?;
    store.set(keys::ATTEMPTED, report.evaluations.len().to_string());
    Ok(())
}
