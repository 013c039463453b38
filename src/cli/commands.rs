//! Command dispatch: loads settings and records, runs one query, prints the result.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{
    disabled_options, grouped_options, load_tree, ApplicationError, IoResultExt, SelectControl,
    SortDirection,
};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{FieldValue, Tree, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli)?;
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::List {
            file,
            value,
            label,
            no_prefix,
        }) => cmd_list(&settings, file, value.as_deref(), label.as_deref(), *no_prefix),
        Some(Commands::Values { file, from, value }) => {
            cmd_values(&settings, file, from.as_deref(), value.as_deref())
        }
        Some(Commands::Level { file, level }) => cmd_level(&settings, file, *level),
        Some(Commands::Tree { file, label }) => cmd_tree(&settings, file, label.as_deref()),
        Some(Commands::Disabled { file, pk }) => cmd_disabled(&settings, file, pk),
        Some(Commands::Groups { file, label, sort }) => {
            cmd_groups(&settings, file, label.as_deref(), *sort)
        }
        Some(Commands::Select {
            file,
            label,
            current,
            prompt,
        }) => cmd_select(&settings, file, label.as_deref(), current.as_deref(), prompt),
        Some(Commands::Config { command }) => cmd_config(&settings, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".to_string(),
        )),
    }
}

/// Settings from config files and env, with command line flags on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().with_path_context("resolve cwd", Path::new("."))?,
    };
    let mut settings = Settings::load(Some(dir.as_path()))?;

    if let Some(key_field) = &cli.key_field {
        settings.key_field = key_field.clone();
    }
    if let Some(parent_key_field) = &cli.parent_key_field {
        settings.parent_key_field = parent_key_field.clone();
    }
    if let Some(prefix) = &cli.prefix {
        settings.prefix = prefix.clone();
    }
    Ok(settings)
}

fn open_tree(settings: &Settings, file: &Path) -> CliResult<Tree<Value>> {
    Ok(load_tree(file, settings.tree_config())?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        ApplicationError::OperationFailed {
            context: "serialize output".to_string(),
            source: Box::new(e),
        }
    })?;
    output::info(&json);
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_list(
    settings: &Settings,
    file: &Path,
    value: Option<&str>,
    label: Option<&str>,
    no_prefix: bool,
) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let mut options = settings.list_options();
    if no_prefix {
        options.prefix = None;
    }

    let value_field = value.unwrap_or(settings.value_field());
    let label_field = label.unwrap_or(&settings.label_field);
    for (key, text) in tree.list(value_field, label_field, &options) {
        output::info(&format!("{}\t{}", key, text));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_values(
    settings: &Settings,
    file: &Path,
    from: Option<&str>,
    value: Option<&str>,
) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let value_field = value.unwrap_or(settings.value_field());

    let start = match from {
        Some(raw) => tree
            .find_by_pk(&FieldValue::parse_key(raw))
            .ok_or_else(|| ApplicationError::NotFound(raw.to_string()))?,
        None => tree.root(),
    };
    for v in tree.values_by_node(&start, value_field, &settings.list_options()) {
        output::info(&v);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_level(settings: &Settings, file: &Path, level: usize) -> CliResult<()> {
    if level == 0 {
        return Err(CliError::InvalidArgs(
            "level 0 is the synthetic root, top-level records are level 1".to_string(),
        ));
    }
    let tree = open_tree(settings, file)?;
    let nodes = tree.level_roots(level);
    if nodes.is_empty() {
        output::warning(&format!("no records at level {} (depth is {})", level, tree.depth()));
    }
    for node in nodes {
        let key = node.key().map(|k| k.to_string()).unwrap_or_default();
        let label = node
            .field(&settings.label_field)
            .map(|l| l.to_string())
            .unwrap_or_default();
        output::info(&format!("{}\t{}", key, label));
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_tree(settings: &Settings, file: &Path, label: Option<&str>) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let label_field = label.unwrap_or(&settings.label_field);
    let rendered = tree
        .to_tree_string(label_field)
        .map_err(ApplicationError::from)?;
    output::info(&rendered);
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_disabled(settings: &Settings, file: &Path, pk: &str) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let disabled = disabled_options(&tree, &FieldValue::parse_key(pk));
    if disabled.is_empty() {
        output::warning(&format!("no record with key {}", pk));
    }
    for key in disabled.keys() {
        output::info(key);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_groups(
    settings: &Settings,
    file: &Path,
    label: Option<&str>,
    sort: Option<SortDirection>,
) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let label_field = label.unwrap_or(&settings.label_field);
    print_json(&grouped_options(&tree, label_field, sort))
}

#[instrument(skip(settings))]
fn cmd_select(
    settings: &Settings,
    file: &Path,
    label: Option<&str>,
    current: Option<&str>,
    prompt: &str,
) -> CliResult<()> {
    let tree = open_tree(settings, file)?;
    let label_field = label.unwrap_or(&settings.label_field);
    let current = current.map(FieldValue::parse_key);
    let control = SelectControl::build(
        &tree,
        label_field,
        current.as_ref(),
        &settings.list_options(),
        prompt,
    );
    print_json(&control)
}

fn cmd_config(settings: &Settings, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header("Effective configuration");
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
