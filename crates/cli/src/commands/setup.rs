use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use slashgate_core::setup::{
    run_post_deploy, DeploymentDetails, SecretPrompter, SetupError, SetupOptions,
    StageDeployment, StageVariableStore,
};
use toml::{Table, Value};

use crate::commands::CommandResult;

/// Asks for each label on `output` and reads one line per answer from `input`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, label: &'static str) -> Result<String, SetupError> {
        write!(self.output, "{label}: ")
            .and_then(|_| self.output.flush())
            .map_err(|error| SetupError::Prompt(error.to_string()))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|error| SetupError::Prompt(error.to_string()))?;
        if read == 0 {
            return Err(SetupError::MissingAnswer(label));
        }
        Ok(line.trim().to_owned())
    }
}

impl<R: BufRead, W: Write> SecretPrompter for LinePrompter<R, W> {
    fn announce(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn prompt(&mut self, labels: &[&'static str]) -> Result<Vec<String>, SetupError> {
        labels.iter().map(|label| self.ask(*label)).collect()
    }
}

/// Persists stage variables into the `[slack]` table of the gateway config file,
/// keeping every other key already in the file.
pub struct ConfigFileStore {
    path: PathBuf,
}

impl ConfigFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_table(&self) -> Result<Table, SetupError> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|error| self.store_error(error))?;
        raw.parse::<Table>().map_err(|error| self.store_error(error))
    }

    fn store_error(&self, error: impl std::fmt::Display) -> SetupError {
        SetupError::Store(format!("{}: {error}", self.path.display()))
    }
}

impl StageVariableStore for ConfigFileStore {
    fn deploy(&mut self, deployment: &StageDeployment) -> Result<(), SetupError> {
        let mut document = self.read_table()?;
        let slack = document
            .entry("slack")
            .or_insert(Value::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| self.store_error("`slack` is not a table"))?;

        for (variable, value) in &deployment.variables {
            slack.insert(variable.config_key().to_owned(), Value::String(value.clone()));
        }

        let rendered = toml::to_string_pretty(&document).map_err(|error| self.store_error(error))?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| self.store_error(error))?;
        }
        fs::write(&self.path, rendered).map_err(|error| self.store_error(error))
    }
}

pub fn run(options: SetupOptions, details: &DeploymentDetails, output: &Path) -> CommandResult {
    let stdin = io::stdin();
    let mut prompter = LinePrompter::new(stdin.lock(), io::stderr());
    let mut store = ConfigFileStore::new(output);
    run_with(options, details, &mut prompter, &mut store)
}

pub fn run_with(
    options: SetupOptions,
    details: &DeploymentDetails,
    prompter: &mut dyn SecretPrompter,
    store: &mut dyn StageVariableStore,
) -> CommandResult {
    let configured = options.mode().is_some();
    match run_post_deploy(options, details, prompter, store) {
        Ok(request_url) => {
            let message = if configured {
                format!("stored slack credentials for stage `{}`", details.stage_name)
            } else {
                "no slack configuration requested".to_string()
            };
            CommandResult::success("setup", message, request_url)
        }
        Err(error @ SetupError::Store(_)) => {
            CommandResult::failure("setup", "store", error.to_string(), 4)
        }
        Err(error) => CommandResult::failure("setup", "prompt", error.to_string(), 3),
    }
}
