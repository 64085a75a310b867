pub mod capture;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod grading;
pub mod onboarding;
pub mod question_bank;
pub mod results;
pub mod session;
pub mod store;
pub mod submissions;
pub mod summary;
pub mod timer;
pub mod types;
pub mod workers;

pub use capture::{CaptureDevice, MediaCapture, Recording, WavFileDevice};
pub use client::{
    BackendClient, CodeRunner, CompileOutcome, InterviewBackend, ProcessResponse, Stdin,
};
pub use config::{ClientConfig, InterviewConfig, get_root_data_dir, get_store_path};
pub use error::{MockviewError, Result};
pub use format::{format_clock, format_evaluation, format_report_readable, format_submission};
pub use grading::{Verdict, grade_output};
pub use session::{InterviewSession, SessionCommand, SessionHandle, SessionOutcome};
pub use store::SessionStore;
pub use summary::compute_summary;
pub use timer::Timer;
pub use types::{
    Evaluation, InterviewReport, InterviewType, Language, Question, Submission, Summary,
};
