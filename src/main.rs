//! prpilot - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use prpilot::commit::{DraftOutcome, OptimizeOutcome};
use prpilot::confirm::{AutoConfirm, ConfirmationGate, DialoguerGate};
use prpilot::llm::{ModelClient, ProviderRegistry};
use prpilot::progress::{ProgressEvent, ProgressSink, Severity};
use prpilot::{
    GhCli, GitCli, ManualInstructions, PrOutcome, RunOptions, RunOutcome, RunReport, Settings,
    Workflow, logging,
};

/// Exit code for a run the user cancelled.
const EXIT_CANCELLED: u8 = 130;

/// Commit your work, tidy the latest commit message and open or update a pull request.
#[derive(Parser, Debug)]
#[command(name = "prpilot")]
#[command(about = "Commit, polish and open a pull request with an AI assistant")]
#[command(version)]
struct Cli {
    /// Answer yes to every confirmation and take default selections
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Open new pull requests as drafts
    #[arg(long)]
    draft: bool,

    /// Completion backend (claude, codex); overrides PRPILOT_PROVIDER
    #[arg(long)]
    provider: Option<String>,

    /// Model passed to the backend; overrides PRPILOT_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Repository to work in
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Debug logging for prpilot (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

/// Renders progress events on the terminal.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn notify(&self, event: ProgressEvent) {
        match event.severity {
            Severity::Info => println!("{}", event.message),
            Severity::Success => println!("✓ {}", event.message),
            Severity::Warning => eprintln!("Warning: {}", event.message),
            Severity::Error => eprintln!("Error ({}): {}", event.stage, event.message),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(RunOutcome::Completed(report)) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Cancelled) => {
            eprintln!("Cancelled.");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let settings = Settings::from_env().with_overrides(cli.provider, cli.model);
    let options = RunOptions {
        auto_confirm: cli.yes,
        draft: cli.draft,
    };

    let git = GitCli::discover(&cli.repo)
        .context("Not a git repository. Run prpilot from within a git repository.")?;
    let host = GhCli::new(git.workdir());

    let provider = ProviderRegistry::with_builtin()
        .create(&settings.provider, &settings.provider_options())
        .context("Could not select a completion backend")?;
    let model = ModelClient::new(provider, settings.model.clone());

    let confirm: Box<dyn ConfirmationGate> = if options.auto_confirm {
        Box::new(AutoConfirm)
    } else {
        Box::new(DialoguerGate)
    };

    println!("Using {} in {}", model.provider_name(), git.workdir().display());

    let outcome = Workflow::new(&git, &host, &model, confirm.as_ref(), &ConsoleProgress)
        .run(&options)
        .await?;
    Ok(outcome)
}

fn print_report(report: &RunReport) {
    println!("\n--- Summary ---");
    println!("Target: {}", report.upstream);

    match &report.commit {
        Some(DraftOutcome::Committed { hash, message }) => println!(
            "Commit: created {} {}",
            &hash[..hash.len().min(7)],
            message.lines().next().unwrap_or("")
        ),
        Some(DraftOutcome::Declined) => println!("Commit: declined, changes left uncommitted"),
        Some(DraftOutcome::NothingEligible) => {
            println!("Commit: only ignored files changed, left uncommitted")
        }
        None => println!("Commit: working tree was clean"),
    }

    match &report.optimization {
        Some(OptimizeOutcome::Amended { message, .. }) => println!(
            "Message: amended to \"{}\"",
            message.lines().next().unwrap_or("")
        ),
        Some(OptimizeOutcome::Skipped(reason)) => println!("Message: unchanged ({})", reason.as_str()),
        None => println!("Message: review failed, see above"),
    }

    match &report.pull_request {
        PrOutcome::Created(pr) => println!("Pull request: opened #{} {}", pr.number, pr.url),
        PrOutcome::Updated(pr) => println!("Pull request: updated #{} {}", pr.number, pr.url),
        PrOutcome::Pushed(pr) => println!("Pull request: pushed to #{} {}", pr.number, pr.url),
        PrOutcome::Manual(manual) => print_manual(manual),
        PrOutcome::Skipped(skip) => println!("Pull request: skipped ({skip:?})"),
    }
}

fn print_manual(manual: &ManualInstructions) {
    println!("Pull request: open it manually");
    println!("  From:  {}", manual.from);
    println!("  Into:  {}", manual.to);
    println!("  Title: {}", manual.title);
    println!("\n{}\n", manual.description);
}
