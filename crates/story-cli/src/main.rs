use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use story_cli::{commands, logging, AppConfig, SubmitOutcome};

fn cli() -> Command {
    Command::new("chain-story")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Add one sentence at a time to an endless shared story")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Configuration file (defaults to ./chain-story.toml if present)"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Story document path, overrides the configuration"),
        )
        .arg(
            Arg::new("device-id")
                .long("device-id")
                .global(true)
                .help("Use this device identifier instead of the local one"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("story").about("Show the story so far"))
        .subcommand(Command::new("summary").about("Show the running summary"))
        .subcommand(Command::new("rules").about("Show the participation guidelines"))
        .subcommand(
            Command::new("submit")
                .about("Submit the next sentence")
                .arg(Arg::new("text").required(true).help("Sentence to add")),
        )
        .subcommand(
            Command::new("seed-summary")
                .about("Write the initial summary if the story has none")
                .arg(Arg::new("text").required(true).help("Summary text")),
        )
        .subcommand(Command::new("whoami").about("Show this device's identifier"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config.store_path.clone_from(store);
    }
    let device_override = matches.get_one::<String>("device-id").map(String::as_str);

    let store = story_cli::open_store(&config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match matches.subcommand() {
        Some(("story", _)) => {
            commands::show_story(store.as_ref(), chrono::Utc::now(), &mut out).await?;
        }
        Some(("summary", _)) => commands::show_summary(store.as_ref(), &mut out).await?,
        Some(("rules", _)) => commands::show_rules(&config.story, &mut out)?,
        Some(("submit", args)) => {
            let text = args
                .get_one::<String>("text")
                .context("missing sentence text")?;
            let device = story_cli::resolve_device(&config, device_override).await?;
            let workflow = story_cli::gemini_workflow(&config, store)?;

            let outcome = commands::submit(&workflow, &device, text, &mut out).await?;
            out.flush()?;
            if let SubmitOutcome::Refused(_) = outcome {
                return Ok(ExitCode::from(2));
            }
        }
        Some(("seed-summary", args)) => {
            let text = args
                .get_one::<String>("text")
                .context("missing summary text")?;
            commands::seed_summary(store.as_ref(), text, &mut out).await?;
        }
        Some(("whoami", _)) => {
            let device = story_cli::resolve_device(&config, device_override).await?;
            commands::show_device(&device, &mut out)?;
        }
        _ => unreachable!("subcommand is required"),
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from([
                "chain-story",
                "submit",
                "The door creaked open.",
                "--device-id",
                "abc",
                "--log-json",
            ])
            .unwrap();
        assert!(matches.get_flag("log-json"));
        assert_eq!(matches.get_one::<String>("device-id").unwrap(), "abc");
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "submit");
        assert_eq!(args.get_one::<String>("text").unwrap(), "The door creaked open.");
    }

    #[test]
    fn submit_requires_text() {
        assert!(cli().try_get_matches_from(["chain-story", "submit"]).is_err());
    }
}
