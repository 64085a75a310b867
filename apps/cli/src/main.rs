use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use mockview_core::{
    BackendClient, ClientConfig, InterviewConfig, InterviewType, Language, SessionStore,
    format::{format_report_readable, format_submission},
    get_store_path, onboarding,
    question_bank::Difficulty,
    results::{self, LearningPath},
    store::Credentials,
    submissions::{SortOrder, sort_submissions},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ui::{create_spinner, fail, ok, rule, warn_line};

mod coding;
mod interview;
mod ui;

const LOG_ENV: &str = "MOCKVIEW_LOG";

/// CLI wrapper for InterviewType (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliInterviewType {
    Managerial,
    Coding,
}

impl From<CliInterviewType> for InterviewType {
    fn from(cli: CliInterviewType) -> Self {
        match cli {
            CliInterviewType::Managerial => InterviewType::Managerial,
            CliInterviewType::Coding => InterviewType::Coding,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<CliDifficulty> for Difficulty {
    fn from(cli: CliDifficulty) -> Self {
        match cli {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Medium => Difficulty::Medium,
            CliDifficulty::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum CliLanguage {
    #[default]
    Cpp,
    Python,
    Java,
    Javascript,
}

impl From<CliLanguage> for Language {
    fn from(cli: CliLanguage) -> Self {
        match cli {
            CliLanguage::Cpp => Language::Cpp,
            CliLanguage::Python => Language::Python,
            CliLanguage::Java => Language::Java,
            CliLanguage::Javascript => Language::Javascript,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum CliSortOrder {
    #[default]
    Newest,
    Oldest,
    Difficulty,
    Role,
}

impl From<CliSortOrder> for SortOrder {
    fn from(cli: CliSortOrder) -> Self {
        match cli {
            CliSortOrder::Newest => SortOrder::Newest,
            CliSortOrder::Oldest => SortOrder::Oldest,
            CliSortOrder::Difficulty => SortOrder::Difficulty,
            CliSortOrder::Role => SortOrder::Role,
        }
    }
}

#[derive(Parser)]
#[command(name = "mockview")]
#[command(about = "Practice mock interviews and coding questions, and get scored feedback")]
struct Cli {
    /// Session file (defaults to the user data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save the credentials issued by the login page
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Forget the credentials and every saved session value
    Logout,
    /// Upload a resume and prepare an interview
    Start {
        #[arg(long)]
        resume: PathBuf,
        #[arg(long = "type")]
        interview_type: Option<CliInterviewType>,
    },
    #[command(subcommand)]
    Coding(CodingCommand),
    #[command(subcommand)]
    Interview(InterviewCommand),
    #[command(subcommand)]
    Results(ResultsCommand),
    /// List past code submissions
    Submissions {
        #[arg(long, default_value = "newest")]
        sort: CliSortOrder,
    },
}

#[derive(Subcommand)]
enum CodingCommand {
    /// Pick a random question for a role and difficulty
    Pick {
        #[arg(long)]
        role: String,
        #[arg(long)]
        difficulty: Option<CliDifficulty>,
    },
    /// Show the current question
    Show,
    /// Run the code without grading it
    Compile(CodeArgs),
    /// Submit the code for grading
    Submit(CodeArgs),
    /// Run the exam clock
    Timer {
        #[arg(long, default_value_t = 30)]
        minutes: u32,
    },
}

#[derive(Args)]
struct CodeArgs {
    /// Source file to send
    #[arg(long)]
    file: PathBuf,

    #[arg(long, default_value = "cpp")]
    language: CliLanguage,

    /// Custom input instead of the question's sample input
    #[arg(long)]
    stdin: Option<String>,
}

#[derive(Subcommand)]
enum InterviewCommand {
    /// Run the interview, replaying recorded answers from a directory of .wav files
    Run {
        #[arg(long)]
        answers: PathBuf,
    },
}

#[derive(Subcommand)]
enum ResultsCommand {
    /// Print the saved interview report
    Show,
    /// Generate a learning path for the saved report
    Roadmap,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub(crate) fn backend() -> Result<BackendClient> {
    Ok(BackendClient::new(ClientConfig::from_env()?)?)
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store_path = cli.store.unwrap_or_else(get_store_path);
    let mut store = SessionStore::open(&store_path).await?;
    let config = InterviewConfig::default();

    match cli.command {
        Command::Login { token, user_id } => {
            let credentials = onboarding::login(&mut store, &token, user_id.as_deref())?;
            store.save().await?;
            ok(&format!(
                "Logged in{}",
                credentials
                    .user_id
                    .map(|u| format!(" as {}", style(u).cyan()))
                    .unwrap_or_default()
            ));
        }
        Command::Logout => {
            onboarding::logout(&mut store);
            store.save().await?;
            ok("Logged out. Session data cleared.");
        }
        Command::Start {
            resume,
            interview_type,
        } => start(&mut store, resume, interview_type, &config).await?,
        Command::Coding(command) => match command {
            CodingCommand::Pick { role, difficulty } => {
                coding::pick(&mut store, &role, difficulty.map(Into::into)).await?
            }
            CodingCommand::Show => coding::show(&store)?,
            CodingCommand::Compile(args) => coding::compile(&mut store, &args).await?,
            CodingCommand::Submit(args) => coding::submit(&mut store, &args).await?,
            CodingCommand::Timer { minutes } => coding::exam_clock(minutes).await?,
        },
        Command::Interview(InterviewCommand::Run { answers }) => {
            interview::run(&answers, store, config).await?
        }
        Command::Results(ResultsCommand::Show) => {
            let report = results::saved_report(&store)?;
            println!("{}", format_report_readable(&report));
        }
        Command::Results(ResultsCommand::Roadmap) => roadmap(&mut store).await?,
        Command::Submissions { sort } => list_submissions(&store, sort.into()).await?,
    }

    Ok(())
}

async fn start(
    store: &mut SessionStore,
    resume: PathBuf,
    interview_type: Option<CliInterviewType>,
    config: &InterviewConfig,
) -> Result<()> {
    let client = backend()?;
    let interview_type = interview_type.map(InterviewType::from);

    let spinner = (interview_type == Some(InterviewType::Managerial))
        .then(|| create_spinner("Generating interview questions from your resume..."));
    let result = onboarding::get_started(&client, store, &resume, interview_type, config).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let plan = result?;
    store.save().await?;

    ok(&format!(
        "Interview ready for {} {}",
        style(&plan.resume_name).cyan(),
        style(format!(
            "[{} questions, {} min]",
            plan.question_count,
            plan.timer_secs / 60
        ))
        .dim()
    ));
    println!("{}", rule());
    match plan.interview_type {
        InterviewType::Managerial => {
            for (i, question) in plan.questions.iter().enumerate() {
                println!("  {} {}", style(format!("{}.", i + 1)).dim(), question);
            }
            println!(
                "\nNext: {}",
                style("mockview interview run --answers <DIR>").cyan()
            );
        }
        InterviewType::Coding => println!(
            "Next: {}",
            style("mockview coding pick --role <ROLE> --difficulty <LEVEL>").cyan()
        ),
    }
    Ok(())
}

async fn roadmap(store: &mut SessionStore) -> Result<()> {
    let client = backend()?;
    let spinner = create_spinner("Generating your learning path...");
    let result = results::generate_learning_path(&client, store).await;
    spinner.finish_and_clear();

    match result {
        Ok(LearningPath::Generated(path)) => {
            store.save().await?;
            ok("Learning path");
            for step in path {
                println!("  • {}", step);
            }
        }
        Ok(LearningPath::Unavailable(message)) => warn_line(&message),
        Err(e) => {
            fail("Something went wrong while generating the roadmap.");
            return Err(e.into());
        }
    }
    Ok(())
}

async fn list_submissions(store: &SessionStore, order: SortOrder) -> Result<()> {
    let credentials = Credentials::load(store, "view past submissions")?;
    let client = backend()?;

    let spinner = create_spinner("Loading submissions...");
    let result = client.list_submissions(&credentials).await;
    spinner.finish_and_clear();

    let mut submissions = result?;
    if submissions.is_empty() {
        println!("{}", style("No submissions yet.").dim());
        return Ok(());
    }

    sort_submissions(&mut submissions, order);
    for submission in &submissions {
        println!("{}", rule());
        println!("{}", format_submission(submission));
    }
    Ok(())
}
