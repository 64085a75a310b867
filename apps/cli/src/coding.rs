use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use mockview_core::{
    CodeRunner, CompileOutcome, MockviewError, SessionStore, Stdin, Timer,
    format::format_clock,
    onboarding,
    question_bank::Difficulty,
    store::{CodingChallenge, Credentials, keys},
    timer::exam_preset,
};
use tokio::{
    fs,
    sync::{mpsc, oneshot},
};
use tracing::debug;

use crate::{
    CodeArgs, backend,
    ui::{create_clock, create_spinner, fail, ok, rule, warn_line},
};

pub async fn pick(
    store: &mut SessionStore,
    role: &str,
    difficulty: Option<Difficulty>,
) -> Result<()> {
    let challenge = onboarding::start_coding(store, role, difficulty, &mut rand::thread_rng())?;
    store.save().await?;
    print_challenge(&challenge);
    println!(
        "\nNext: {}",
        style("mockview coding submit --file <SOURCE> --language <LANG>").cyan()
    );
    Ok(())
}

pub fn show(store: &SessionStore) -> Result<()> {
    let challenge = CodingChallenge::load(store)?;
    print_challenge(&challenge);
    Ok(())
}

fn print_challenge(challenge: &CodingChallenge) {
    println!(
        "\n{}  {}\n",
        style(&challenge.question).cyan().bold(),
        style(format!("[{} · {}]", challenge.role, challenge.difficulty)).dim()
    );
    if let Some(input) = &challenge.input {
        println!("{} {}", style("Input:").dim(), input);
    }
    if let Some(expected) = &challenge.expected_output {
        println!("{} {}", style("Expected output:").dim(), expected);
    }
}

async fn read_code(path: &Path) -> Result<String> {
    match fs::read_to_string(path).await {
        Ok(code) => Ok(code),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MockviewError::validation(
            format!("No source file at {}", path.display()),
        )
        .into()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Custom input wins and is remembered; otherwise the question's sample input.
fn stdin_choice(store: &mut SessionStore, args: &CodeArgs) -> Stdin {
    match &args.stdin {
        Some(custom) => {
            store.set(keys::CUSTOM_INPUT, custom.clone());
            Stdin::Custom(custom.clone())
        }
        None => Stdin::Stored,
    }
}

struct Prepared {
    challenge: CodingChallenge,
    credentials: Credentials,
    code: String,
    stdin: Stdin,
}

async fn prepare(
    store: &mut SessionStore,
    args: &CodeArgs,
    action: &'static str,
) -> Result<Prepared> {
    let challenge = CodingChallenge::load(store)?;
    let credentials = Credentials::load(store, action)?;
    let code = read_code(&args.file).await?;
    let stdin = stdin_choice(store, args);
    store.save().await?;
    Ok(Prepared {
        challenge,
        credentials,
        code,
        stdin,
    })
}

pub async fn compile(store: &mut SessionStore, args: &CodeArgs) -> Result<()> {
    let prepared = prepare(store, args, "compile code").await?;
    let runner = CodeRunner::new(backend()?);

    let spinner = create_spinner("Compiling...");
    let result = runner
        .compile(
            &prepared.credentials,
            &prepared.challenge,
            &prepared.code,
            args.language.into(),
            &prepared.stdin,
        )
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(CompileOutcome::Compiled { output }) => {
            ok("Compilation successful!");
            println!("{}\n{}", rule(), output);
        }
        Ok(CompileOutcome::Failed { error }) => {
            warn_line("Something went wrong.");
            println!("{}\n{}", rule(), error);
        }
        Err(e @ MockviewError::NetworkFailure { .. }) => {
            fail("Compilation failed due to timeout or network issue.");
            debug!(error = %e, "compile request failed");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

pub async fn submit(store: &mut SessionStore, args: &CodeArgs) -> Result<()> {
    let prepared = prepare(store, args, "submit code").await?;
    let runner = CodeRunner::new(backend()?);

    let spinner = create_spinner("Submitting...");
    let result = runner
        .submit(
            &prepared.credentials,
            &prepared.challenge,
            &prepared.code,
            args.language.into(),
            &prepared.stdin,
        )
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(submitted) if submitted.verdict.is_correct() => ok(&submitted.verdict.message()),
        Ok(submitted) => {
            println!("{}", rule());
            println!("{}", submitted.verdict.message());
        }
        Err(e @ MockviewError::NetworkFailure { .. }) => {
            fail("Submission failed due to timeout or network error.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// The soft exam clock: it only announces the end, nothing is submitted.
pub async fn exam_clock(minutes: u32) -> Result<()> {
    let total = exam_preset(minutes)?;
    let pb = create_clock(total);
    pb.set_message(format_clock(total));

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let (expired_tx, mut expired_rx) = oneshot::channel();
    let mut timer = Timer::new();
    timer.start(
        total,
        move |remaining| {
            let _ = tick_tx.send(remaining);
        },
        move || {
            let _ = expired_tx.send(());
        },
    );

    loop {
        tokio::select! {
            Some(remaining) = tick_rx.recv() => {
                pb.set_position(u64::from(total - remaining));
                pb.set_message(format_clock(remaining));
            }
            _ = &mut expired_rx => break,
            _ = tokio::signal::ctrl_c() => {
                timer.cancel();
                pb.abandon();
                println!("{}", style("Clock stopped.").dim());
                return Ok(());
            }
        }
    }

    pb.set_position(u64::from(total));
    pb.finish_with_message(format_clock(0));
    warn_line("Time's up!");
    Ok(())
}
