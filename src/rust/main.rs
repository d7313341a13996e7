use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use email_triage::{ArtifactStore, Classifier, ClassifierError, Decision, Triage, ARTIFACTS_ENV_VAR};
use log::info;

const EXIT_UNAVAILABLE: u8 = 2;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Email text to classify; read from stdin when omitted
    text: Option<String>,

    /// Directory holding vectorizer.json and model.json
    #[arg(short, long, env = ARTIFACTS_ENV_VAR)]
    artifacts: Option<PathBuf>,

    /// Skip loading the statistical model
    #[arg(long)]
    heuristic_only: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print classifier configuration and exit
    #[arg(long)]
    info: bool,
}

fn build_classifier(args: &Args) -> Classifier {
    let artifacts = if args.heuristic_only {
        info!("Heuristic-only mode requested, not loading artifacts");
        None
    } else {
        let store = match &args.artifacts {
            Some(dir) => ArtifactStore::new(dir),
            None => ArtifactStore::new_default(),
        };
        store.load_or_absent()
    };

    Classifier::builder().with_optional_artifacts(artifacts).build()
}

/// Returns the positional text, or stdin with invalid UTF-8 replaced by U+FFFD
fn read_input(args: &Args) -> anyhow::Result<String> {
    match &args.text {
        Some(text) => Ok(text.clone()),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read email text from stdin")?;
            Ok(String::from_utf8_lossy(&buffer).into_owned())
        }
    }
}

fn exit_code(outcome: &Result<Decision, ClassifierError>) -> ExitCode {
    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(ClassifierError::ArtifactUnavailable) => ExitCode::from(EXIT_UNAVAILABLE),
        Err(_) => ExitCode::FAILURE,
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    // usage errors exit 1 so they never look like "classifier unavailable"
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print()?;
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let classifier = build_classifier(&args);

    if args.info {
        let info = classifier.info();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            println!("{:#?}", info);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let text = read_input(&args)?;
    let outcome = classifier.classify_decision(&text);
    let code = exit_code(&outcome);
    let triage = Triage::new(text, outcome);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&triage)?);
    } else if triage.is_classified() {
        println!("{}", triage);
    } else {
        eprintln!("{}", triage);
    }

    Ok(code)
}
