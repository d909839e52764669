pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use slashgate_core::setup::{DeploymentDetails, SetupOptions};

#[derive(Debug, Parser)]
#[command(
    name = "slashgate",
    about = "Slashgate operator CLI",
    long_about = "Configure Slack credentials after a deploy and inspect the effective gateway configuration.",
    after_help = "Examples:\n  slashgate setup --configure-slack-slash-command --api-url https://api.example.com --api-id abc123\n  slashgate config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Prompt for Slack credentials and write them to the gateway config file")]
    Setup(SetupArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

#[derive(Debug, Args)]
struct SetupArgs {
    #[arg(long, help = "Collect the verification token for a single-team slash command")]
    configure_slack_slash_command: bool,
    #[arg(long, help = "Collect OAuth credentials for a distributable Slack app")]
    configure_slack_slash_app: bool,
    #[arg(long, help = "Public base URL of the deployed gateway")]
    api_url: String,
    #[arg(long, help = "Identifier of the deployed API")]
    api_id: String,
    #[arg(long, default_value = "latest", help = "Deployment stage name")]
    stage: String,
    #[arg(long, default_value = "slashgate.toml", help = "Config file that receives the credentials")]
    output: PathBuf,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Setup(args) => {
            let options = SetupOptions {
                configure_slash_command: args.configure_slack_slash_command,
                configure_slash_app: args.configure_slack_slash_app,
            };
            let details = DeploymentDetails {
                api_url: args.api_url,
                api_id: args.api_id,
                stage_name: args.stage,
            };
            commands::setup::run(options, &details, &args.output)
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
