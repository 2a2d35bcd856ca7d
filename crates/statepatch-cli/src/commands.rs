use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use statepatch_diff::{array, patch_shallow, patch_tree, ChangeRecord, ChangeStats, EditOp, Equality};
use statepatch_sync::{
    JsonCodec, PayloadCodec, StatePublisher, StateReplica, StrategyKind, SyncConfig, SyncMessage,
    SyncStrategy,
};
use statepatch_types::{State, Value};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let output = match cli.command {
        Command::Diff(args) => cmd_diff(args, format)?,
        Command::Patch(args) => cmd_patch(args, format)?,
        Command::Edits(args) => cmd_edits(args, format)?,
        Command::Same(args) => cmd_same(args, format)?,
        Command::Stream(args) => cmd_stream(args, format)?,
        Command::Config(args) => cmd_config(args, format)?,
    };
    println!("{output}");
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: OutputFormat) -> anyhow::Result<String> {
    let mut config = load_config(args.config.as_deref())?;
    if args.shallow {
        config.strategy = StrategyKind::Shallow;
    }
    if args.max_depth.is_some() {
        config.max_depth = args.max_depth;
    }
    config.opaque_paths.extend(args.opaque);
    if args.structural {
        config.equality = Equality::Structural;
    }
    config.validate()?;

    let old = read_state(&args.old)?;
    let new = read_state(&args.new)?;
    let changes = config.build_strategy().diff(&old, &new);
    let stats = ChangeStats::of(&changes);
    debug!(
        strategy = %config.strategy,
        records = stats.records(),
        edit_ops = stats.edit_ops,
        "computed diff"
    );

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&changes)?),
        OutputFormat::Text if changes.is_empty() => Ok("No changes.".to_string()),
        OutputFormat::Text => Ok(render_changes(&changes).join("\n")),
    }
}

fn cmd_patch(args: PatchArgs, format: OutputFormat) -> anyhow::Result<String> {
    let old = read_state(&args.old)?;
    let changes: Vec<ChangeRecord> = serde_json::from_value(read_json(&args.patch)?)
        .with_context(|| format!("{} is not a change list", args.patch.display()))?;
    let patched = if args.shallow {
        patch_shallow(&old, &changes)
    } else {
        patch_tree(&old, &changes)
    }
    .with_context(|| format!("applying {}", args.patch.display()))?;
    debug!(records = ChangeStats::of(&changes).records(), "applied patch");

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&patched)?),
        OutputFormat::Text => Ok(render_state(&patched).join("\n")),
    }
}

fn cmd_edits(args: PairArgs, format: OutputFormat) -> anyhow::Result<String> {
    let a = read_array(&args.a)?;
    let b = read_array(&args.b)?;
    let ops = array::get_patch(&a, &b);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ops)?),
        OutputFormat::Text if ops.is_empty() => Ok("No changes.".to_string()),
        OutputFormat::Text => Ok(ops.iter().map(|op| render_edit("", op)).collect::<Vec<_>>().join("\n")),
    }
}

fn cmd_same(args: PairArgs, format: OutputFormat) -> anyhow::Result<String> {
    let a = read_array(&args.a)?;
    let b = read_array(&args.b)?;
    let common = array::same(&a, &b);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&common)?),
        OutputFormat::Text => {
            let mut lines = vec![format!(
                "{} of {} / {} items in common",
                common.len().to_string().bold(),
                a.len(),
                b.len()
            )];
            lines.extend(common.iter().map(|item| format!("  {}", compact(item))));
            Ok(lines.join("\n"))
        }
    }
}

fn cmd_stream(args: StreamArgs, format: OutputFormat) -> anyhow::Result<String> {
    let config = load_config(args.config.as_deref())?;
    let codec = config.codec();
    let mut states = args.states.iter();
    let Some(first) = states.next() else {
        bail!("no state files given");
    };

    let mut publisher = StatePublisher::new(config.build_strategy(), read_state(first)?);
    let mut replica = StateReplica::new(config.build_strategy());
    let mut lines = Vec::new();

    lines.push(relay(&codec, publisher.snapshot(), &mut replica, format)?);
    for path in states {
        let state = read_state(path)?;
        match publisher.publish(state) {
            Some(msg) => lines.push(relay(&codec, msg, &mut replica, format)?),
            None if format == OutputFormat::Text => {
                lines.push(format!("{} {}", "unchanged".dimmed(), path.display()));
            }
            None => {}
        }
    }

    if replica.state() != Some(publisher.current()) {
        bail!("replica diverged from publisher at seq {}", publisher.seq());
    }
    if format == OutputFormat::Text {
        lines.push(format!(
            "{} replica in sync at seq {}",
            "✓".green().bold(),
            replica.seq()
        ));
    }
    Ok(lines.join("\n"))
}

/// Send one message through the codec to the replica, returning its output line.
fn relay<S: SyncStrategy>(
    codec: &JsonCodec,
    msg: SyncMessage,
    replica: &mut StateReplica<S>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let bytes = codec.encode(&msg)?;
    replica.apply(codec.decode(&bytes)?)?;
    Ok(match format {
        OutputFormat::Json => String::from_utf8_lossy(&bytes).into_owned(),
        OutputFormat::Text => render_message(&msg, bytes.len()),
    })
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<String> {
    let config = load_config(args.config.as_deref())?;
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => Ok(config.to_toml_string()?),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_state(path: &Path) -> anyhow::Result<State> {
    State::try_from(read_json(path)?)
        .with_context(|| format!("{} does not hold a JSON object", path.display()))
}

fn read_array(path: &Path) -> anyhow::Result<Vec<Value>> {
    let value = Value::from(read_json(path)?);
    let items = value
        .try_array()
        .with_context(|| format!("{} does not hold a JSON array", path.display()))?;
    Ok(items.to_vec())
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.kind().to_string())
}

/// One line per top-level key.
fn render_state(state: &State) -> Vec<String> {
    state
        .iter()
        .map(|(key, value)| format!("{} = {}", key.bold(), compact(value)))
        .collect()
}

/// One line per leaf change, nested records flattened to dotted paths.
fn render_changes(changes: &[ChangeRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    render_into(changes, "", &mut lines);
    lines
}

fn render_into(changes: &[ChangeRecord], prefix: &str, lines: &mut Vec<String>) {
    for change in changes {
        let path = if prefix.is_empty() {
            change.key().to_string()
        } else {
            format!("{prefix}.{}", change.key())
        };
        match change {
            ChangeRecord::Updated { value, .. } => {
                lines.push(format!("{} {} = {}", "~".yellow(), path.bold(), compact(value)));
            }
            ChangeRecord::Removed { .. } => {
                lines.push(format!("{} {}", "-".red(), path.bold()));
            }
            ChangeRecord::KeysUpdated { changes, .. } => render_into(changes, &path, lines),
            ChangeRecord::ArrayUpdated { edits, .. } => {
                lines.extend(edits.iter().map(|op| render_edit(&path, op)));
            }
        }
    }
}

fn render_edit(path: &str, op: &EditOp<Value>) -> String {
    match op {
        EditOp::Add { old_pos, items, .. } => format!(
            "{} {}[{}] {}",
            "+".green(),
            path.bold(),
            old_pos,
            compact(&Value::from(items.clone()))
        ),
        EditOp::Remove { old_pos, span, .. } => format!(
            "{} {}[{}..{}]",
            "-".red(),
            path.bold(),
            old_pos,
            old_pos + span.len()
        ),
    }
}

fn render_message(msg: &SyncMessage, size: usize) -> String {
    let detail = match msg {
        SyncMessage::State { payload, .. } => format!("{} keys", payload.len()),
        SyncMessage::PatchState { payload, .. } => {
            let stats = ChangeStats::of(payload);
            format!("{} records, {} edit ops", stats.records(), stats.edit_ops)
        }
    };
    format!(
        "{} {} {} ({}, {} bytes)",
        "seq".dimmed(),
        msg.seq().to_string().yellow(),
        msg.type_name().cyan(),
        detail,
        size
    )
}
