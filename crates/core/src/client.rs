//! HTTP client for the evaluation backend.

use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    capture::Recording,
    config::ClientConfig,
    error::{MockviewError, Result},
    grading::{Verdict, grade_output},
    store::{CodingChallenge, Credentials},
    types::{DomainScores, Language, Submission, Summary},
};

pub const COMPILE_ENDPOINT: &str = "/api/dsa/compile-code";
pub const SUBMIT_ENDPOINT: &str = "/api/dsa/submit-code";
pub const UPLOAD_RESUME_ENDPOINT: &str = "/api/upload-resume";
pub const PROCESS_ENDPOINT: &str = "/api/process";
pub const ROADMAP_ENDPOINT: &str = "/api/roadmap/generate";
pub const SUBMISSIONS_ENDPOINT: &str = "/api/submissions";

#[derive(Debug, Serialize)]
pub struct CompileRequest<'a> {
    pub code: &'a str,
    pub language: Language,
    pub stdin: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SubmitRequest<'a> {
    pub code: &'a str,
    pub language: Language,
    pub role: &'a str,
    pub difficulty: String,
    pub question: &'a str,
    pub stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompileResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled { output: String },
    Failed { error: String },
}

impl CompileOutcome {
    fn from_response(response: CompileResponse) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        if response.success {
            CompileOutcome::Compiled {
                output: non_empty(response.output)
                    .unwrap_or_else(|| "Code compiled successfully.".to_string()),
            }
        } else {
            CompileOutcome::Failed {
                error: non_empty(response.error).unwrap_or_else(|| "Compilation failed.".to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub output: Option<String>,
}

/// What `/api/process` says about one recorded answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub domain_scores: Option<DomainScores>,
}

#[derive(Debug, Deserialize)]
struct UploadResumeResponse {
    #[serde(default)]
    questions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RoadmapResponse {
    #[serde(default)]
    roadmap: Option<Vec<String>>,
}

/// Interpret a finished HTTP exchange.
///
/// Non-2xx is a `NetworkFailure` carrying the backend's `error`/`message`
/// when it sent one; an unparseable success body is `UnexpectedResponse`.
fn parse_body<T: DeserializeOwned>(
    endpoint: &'static str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["error", "message"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(MockviewError::NetworkFailure {
            endpoint,
            reason: format!("HTTP {}: {}", status.as_u16(), detail),
        });
    }

    serde_json::from_str(body).map_err(|e| MockviewError::UnexpectedResponse {
        endpoint,
        reason: e.to_string(),
    })
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl BackendClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(MockviewError::network("client setup"))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn read<T: DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(MockviewError::network(endpoint))?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "response received");
        parse_body(endpoint, status, &body)
    }

    pub async fn compile(
        &self,
        credentials: &Credentials,
        request: &CompileRequest<'_>,
    ) -> Result<CompileOutcome> {
        info!(language = %request.language, "compiling code");
        let response = self
            .http
            .post(self.config.endpoint(COMPILE_ENDPOINT))
            .bearer_auth(&credentials.token)
            .json(request)
            .send()
            .await
            .map_err(MockviewError::network(COMPILE_ENDPOINT))?;

        let body: CompileResponse = Self::read(COMPILE_ENDPOINT, response).await?;
        Ok(CompileOutcome::from_response(body))
    }

    pub async fn submit(
        &self,
        credentials: &Credentials,
        request: &SubmitRequest<'_>,
    ) -> Result<SubmitResponse> {
        info!(language = %request.language, role = request.role, "submitting code");
        let response = self
            .http
            .post(self.config.endpoint(SUBMIT_ENDPOINT))
            .bearer_auth(&credentials.token)
            .json(request)
            .send()
            .await
            .map_err(MockviewError::network(SUBMIT_ENDPOINT))?;

        Self::read(SUBMIT_ENDPOINT, response).await
    }

    /// Upload a resume and get back the generated interview questions.
    pub async fn upload_resume(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MockviewError::validation("Please upload your resume file."));
            }
            Err(e) => return Err(e.into()),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume.pdf".to_string());

        info!(file = %file_name, bytes = bytes.len(), "uploading resume");
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(self.config.endpoint(UPLOAD_RESUME_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(MockviewError::network(UPLOAD_RESUME_ENDPOINT))?;

        let body: UploadResumeResponse = Self::read(UPLOAD_RESUME_ENDPOINT, response).await?;
        body.questions
            .ok_or_else(|| MockviewError::UnexpectedResponse {
                endpoint: UPLOAD_RESUME_ENDPOINT,
                reason: "No questions received from backend.".to_string(),
            })
    }

    pub async fn process_answer(
        &self,
        recording: &Recording,
        question: &str,
    ) -> Result<ProcessResponse> {
        let question = if question.trim().is_empty() {
            "No question"
        } else {
            question
        };

        let audio = Part::bytes(recording.bytes.clone())
            .file_name(Recording::FILE_NAME)
            .mime_str(Recording::MIME_TYPE)
            .map_err(MockviewError::network(PROCESS_ENDPOINT))?;
        let form = Form::new()
            .part("audio", audio)
            .text("question", question.to_string());

        info!(
            bytes = recording.bytes.len(),
            seconds = recording.duration_secs(),
            "sending answer for evaluation"
        );
        let response = self
            .http
            .post(self.config.endpoint(PROCESS_ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(MockviewError::network(PROCESS_ENDPOINT))?;

        Self::read(PROCESS_ENDPOINT, response).await
    }

    pub async fn generate_roadmap(&self, summary: &Summary) -> Result<Vec<String>> {
        let response = self
            .http
            .post(self.config.endpoint(ROADMAP_ENDPOINT))
            .json(&serde_json::json!({ "scores": summary }))
            .send()
            .await
            .map_err(MockviewError::network(ROADMAP_ENDPOINT))?;

        let body: RoadmapResponse = Self::read(ROADMAP_ENDPOINT, response).await?;
        body.roadmap.ok_or_else(|| MockviewError::UnexpectedResponse {
            endpoint: ROADMAP_ENDPOINT,
            reason: "response has no roadmap list".to_string(),
        })
    }

    pub async fn list_submissions(&self, credentials: &Credentials) -> Result<Vec<Submission>> {
        if credentials.user_id.is_none() {
            return Err(MockviewError::AuthRequired {
                action: "view past submissions",
            });
        }

        let response = self
            .http
            .get(self.config.endpoint(SUBMISSIONS_ENDPOINT))
            .bearer_auth(&credentials.token)
            .send()
            .await
            .map_err(MockviewError::network(SUBMISSIONS_ENDPOINT))?;

        Self::read(SUBMISSIONS_ENDPOINT, response).await
    }
}

/// Backend calls an interview session depends on.
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    async fn process_answer(&self, recording: &Recording, question: &str)
    -> Result<ProcessResponse>;

    async fn generate_roadmap(&self, summary: &Summary) -> Result<Vec<String>>;
}

#[async_trait]
impl InterviewBackend for BackendClient {
    async fn process_answer(
        &self,
        recording: &Recording,
        question: &str,
    ) -> Result<ProcessResponse> {
        BackendClient::process_answer(self, recording, question).await
    }

    async fn generate_roadmap(&self, summary: &Summary) -> Result<Vec<String>> {
        BackendClient::generate_roadmap(self, summary).await
    }
}

/// Admits one in-progress action at a time.
#[derive(Debug, Default)]
pub struct ActionGate {
    busy: AtomicBool,
}

pub struct GateGuard<'a> {
    gate: &'a ActionGate,
}

impl ActionGate {
    pub fn try_begin(&self, action: &'static str) -> Result<GateGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MockviewError::Busy(action))?;
        Ok(GateGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stdin {
    /// The question's stored sample input.
    Stored,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub output: String,
    pub verdict: Verdict,
}

/// Compile and Submit for one coding challenge; never both at once.
pub struct CodeRunner {
    client: BackendClient,
    gate: ActionGate,
}

impl CodeRunner {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            gate: ActionGate::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    fn stdin<'a>(challenge: &'a CodingChallenge, stdin: &'a Stdin) -> &'a str {
        match stdin {
            Stdin::Custom(input) => input,
            Stdin::Stored => challenge.input.as_deref().unwrap_or(""),
        }
    }

    pub async fn compile(
        &self,
        credentials: &Credentials,
        challenge: &CodingChallenge,
        code: &str,
        language: Language,
        stdin: &Stdin,
    ) -> Result<CompileOutcome> {
        if code.trim().is_empty() {
            return Err(MockviewError::validation(
                "Please write your code before compiling.",
            ));
        }
        let _guard = self.gate.try_begin("compile")?;

        let request = CompileRequest {
            code,
            language,
            stdin: Self::stdin(challenge, stdin),
        };
        self.client.compile(credentials, &request).await
    }

    pub async fn submit(
        &self,
        credentials: &Credentials,
        challenge: &CodingChallenge,
        code: &str,
        language: Language,
        stdin: &Stdin,
    ) -> Result<SubmitResult> {
        if code.trim().is_empty() {
            return Err(MockviewError::validation(
                "Please write your code before submitting.",
            ));
        }
        let _guard = self.gate.try_begin("submit")?;

        let request = SubmitRequest {
            code,
            language,
            role: &challenge.role,
            difficulty: challenge.difficulty.to_string(),
            question: &challenge.question,
            stdin: Self::stdin(challenge, stdin),
        };
        let response = self.client.submit(credentials, &request).await?;
        let output = response.output.unwrap_or_default();
        let verdict = grade_output(
            challenge.expected_output.as_deref(),
            &output,
            matches!(stdin, Stdin::Custom(_)),
        );
        Ok(SubmitResult { output, verdict })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::Difficulty;

    fn challenge() -> CodingChallenge {
        CodingChallenge {
            role: "SDE".into(),
            difficulty: Difficulty::Easy,
            question: "Reverse a string".into(),
            input: Some("hello".into()),
            expected_output: Some("olleh".into()),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            token: "t0k3n".into(),
            user_id: Some("u1".into()),
        }
    }

    fn unreachable_runner() -> CodeRunner {
        let config = ClientConfig {
            backend_url: "http://127.0.0.1:9".into(),
            request_timeout: std::time::Duration::from_secs(2),
        };
        CodeRunner::new(BackendClient::new(config).unwrap())
    }

    #[test]
    fn compile_request_uses_wire_names() {
        let request = CompileRequest {
            code: "int main(){}",
            language: Language::Cpp,
            stdin: "5",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "code": "int main(){}", "language": "cpp", "stdin": "5" })
        );
    }

    #[test]
    fn submit_request_carries_role_and_difficulty() {
        let request = SubmitRequest {
            code: "x",
            language: Language::Python,
            role: "ML",
            difficulty: Difficulty::Hard.to_string(),
            question: "Solve the N-Queens problem",
            stdin: "4",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["difficulty"], "Hard");
        assert_eq!(value["language"], "python");
        assert_eq!(value["role"], "ML");
    }

    #[test]
    fn compile_outcome_falls_back_to_stock_messages() {
        let ok: CompileResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(
            CompileOutcome::from_response(ok),
            CompileOutcome::Compiled {
                output: "Code compiled successfully.".into()
            }
        );

        let failed: CompileResponse =
            serde_json::from_str(r#"{"success": false, "error": "line 3: expected ';'"}"#)
                .unwrap();
        assert_eq!(
            CompileOutcome::from_response(failed),
            CompileOutcome::Failed {
                error: "line 3: expected ';'".into()
            }
        );
    }

    #[test]
    fn non_success_status_is_a_network_failure_with_detail() {
        let err = parse_body::<SubmitResponse>(
            SUBMIT_ENDPOINT,
            StatusCode::UNAUTHORIZED,
            r#"{"error": "token expired"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request to /api/dsa/submit-code failed: HTTP 401: token expired"
        );
    }

    #[test]
    fn garbage_success_body_is_unexpected() {
        let err = parse_body::<ProcessResponse>(PROCESS_ENDPOINT, StatusCode::OK, "<html>")
            .unwrap_err();
        assert!(matches!(err, MockviewError::UnexpectedResponse { .. }));
    }

    #[test]
    fn process_response_tolerates_missing_fields() {
        let response: ProcessResponse = parse_body(
            PROCESS_ENDPOINT,
            StatusCode::OK,
            r#"{"actual": "I led the migration", "domain_scores": {"clarity_score": 8}}"#,
        )
        .unwrap();
        assert_eq!(response.actual.as_deref(), Some("I led the migration"));
        assert!(response.feedback.is_none());
        assert_eq!(response.domain_scores.unwrap().clarity_score, Some(8.0));
    }

    #[test]
    fn upload_response_without_questions_parses_to_none() {
        let body: UploadResumeResponse =
            parse_body(UPLOAD_RESUME_ENDPOINT, StatusCode::OK, r#"{"status": "ok"}"#).unwrap();
        assert!(body.questions.is_none());
    }

    #[test]
    fn gate_admits_one_action_at_a_time() {
        let gate = ActionGate::default();
        let guard = gate.try_begin("compile").unwrap();
        assert!(gate.is_busy());
        assert!(matches!(
            gate.try_begin("submit"),
            Err(MockviewError::Busy("submit"))
        ));
        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_begin("submit").is_ok());
    }

    #[test]
    fn custom_stdin_overrides_the_stored_input() {
        let challenge = challenge();
        assert_eq!(CodeRunner::stdin(&challenge, &Stdin::Stored), "hello");
        assert_eq!(
            CodeRunner::stdin(&challenge, &Stdin::Custom("abc".into())),
            "abc"
        );
    }

    #[tokio::test]
    async fn empty_code_is_rejected_before_any_request() {
        let runner = unreachable_runner();
        let err = runner
            .compile(
                &credentials(),
                &challenge(),
                "   ",
                Language::Cpp,
                &Stdin::Stored,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please write your code before compiling.");
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_an_error_and_frees_the_gate() {
        let runner = unreachable_runner();
        let err = runner
            .submit(
                &credentials(),
                &challenge(),
                "print(input()[::-1])",
                Language::Python,
                &Stdin::Stored,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MockviewError::NetworkFailure { .. }));
        assert!(!runner.is_busy());
    }

    #[tokio::test]
    async fn submissions_need_a_user_id() {
        let client = unreachable_runner().client;
        let err = client
            .list_submissions(&Credentials {
                token: "t".into(),
                user_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MockviewError::AuthRequired { .. }));
    }
}
