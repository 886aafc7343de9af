//! Command-line runtime for the tether language server client.
//!
//! The module owns argument parsing, configuration loading, and the
//! `complete` and `probe` commands. It is exercised both from the binary
//! entrypoint and from tests where the output streams are substituted.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tether_lsp::completion::{CompletionEngine, CompletionItem, RequestOutcome};
use tether_lsp::{
    ClientConfig, DocumentSync, Language, LspManager, SharedManager, lock_manager, telemetry,
    workspace_root_for,
};
use tracing::info;

mod cli;
mod config;
mod document;
mod errors;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use document::FileDocument;
use errors::AppError;

/// Extra wait on top of the completion budget before giving up on the
/// worker.
const SETTLE_SLACK: Duration = Duration::from_secs(1);

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
fn run_with_loader<I, W, E, L>(args: I, stdout: &mut W, stderr: &mut E, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(&cli, &config.client_config(), stdout));
    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    cli: &Cli,
    config: &ClientConfig,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    telemetry::initialise(&config.logging)?;

    let manager = LspManager::with_defaults(config).into_shared();
    let result = match &cli.command {
        CliCommand::Complete {
            file,
            line,
            character,
            workspace,
        } => {
            let target = CompletionTarget {
                file,
                line: *line,
                character: *character,
                workspace: workspace.as_deref(),
            };
            complete(&manager, config, &target, stdout)
        }
        CliCommand::Probe { file, workspace } => probe(&manager, file, workspace.as_deref(), stdout),
    };
    lock_manager(&manager).shutdown();
    result
}

fn language_of(path: &Path) -> Result<Language, AppError> {
    Language::from_path(path).ok_or_else(|| AppError::UnsupportedFile {
        path: path.to_path_buf(),
    })
}

/// Selects the adapter for `file` and runs its handshake.
fn start_server(
    manager: &SharedManager,
    file: &Path,
    workspace: Option<&Path>,
) -> Result<Language, AppError> {
    let language = language_of(file)?;
    let workspace = workspace.map_or_else(|| workspace_root_for(file), Path::to_path_buf);
    let mut manager = lock_manager(manager);
    if !(manager.select_adapter_for_file(file) && manager.initialize(&workspace)) {
        return Err(AppError::ServerUnavailable { language });
    }
    Ok(language)
}

fn probe<W: Write>(
    manager: &SharedManager,
    file: &Path,
    workspace: Option<&Path>,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let language = start_server(manager, file, workspace)?;
    writeln!(stdout, "{language} server ready")?;
    Ok(ExitCode::SUCCESS)
}

struct CompletionTarget<'a> {
    file: &'a Path,
    line: u32,
    character: u32,
    workspace: Option<&'a Path>,
}

#[derive(Serialize)]
struct ItemLine<'a> {
    #[serde(flatten)]
    item: &'a CompletionItem,
    selected: bool,
}

fn complete<W: Write>(
    manager: &SharedManager,
    config: &ClientConfig,
    target: &CompletionTarget<'_>,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let language = language_of(target.file)?;
    let text = fs::read_to_string(target.file).map_err(|source| AppError::ReadDocument {
        path: target.file.to_path_buf(),
        source,
    })?;
    start_server(manager, target.file, target.workspace)?;

    let mut sync = DocumentSync::from_config(Arc::clone(manager), config);
    if !sync.did_open(target.file, &text) {
        return Err(AppError::ServerUnavailable { language });
    }
    let document = Arc::new(FileDocument::new(text, target.line, target.character));
    let engine = CompletionEngine::new(Arc::clone(manager), document, config)
        .map_err(AppError::Worker)?;
    let id = engine.request_completion(target.file, target.line, target.character);
    let settled = engine.wait_until_settled(id, config.completion.total() + SETTLE_SLACK);
    let view = engine.view();
    drop(engine);
    sync.did_close(target.file);
    if !settled {
        return Err(AppError::Unsettled { id });
    }

    let Some(RequestOutcome::Resolved { count }) = view.last_outcome else {
        return Err(AppError::Completion {
            outcome: view.last_outcome,
        });
    };
    for (index, item) in view.items.iter().enumerate() {
        let line = ItemLine {
            item,
            selected: index == view.selected_index,
        };
        let json = serde_json::to_string(&line).map_err(AppError::Serialise)?;
        writeln!(stdout, "{json}")?;
    }
    info!(language = %language, request_id = id, count, "completion printed");
    Ok(ExitCode::SUCCESS)
}
