use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waystones::config::{parse_durability, parse_format};
use waystones::{ConfigEdit, RegistryConfig, SaveOutcome, Waystone, WaystoneEdit, WaystoneRegistry};

#[derive(Parser)]
#[command(name = "waystones")]
#[command(about = "Inspect and edit a waystone data directory")]
struct Cli {
    /// Directory holding waystones.json and waystones-players.json
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Snapshot encoding: json or msgpack
    #[arg(long, default_value = "json")]
    format: String,

    /// Write mode: sync, async or none
    #[arg(long, default_value = "sync")]
    durability: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List waystones in display order
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show every field of one waystone
    Show { name: String },
    /// Change one property of a waystone
    Edit {
        name: String,
        property: String,
        value: String,
    },
    /// Change a runtime switch (debugLogs, requireDiscover)
    Config { property: String, value: String },
    /// Delete a waystone and its discovery entries
    Remove { name: String },
    /// Waystones a player has discovered
    Discoveries { principal: String },
    /// Counts and file locations
    Stats,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = RegistryConfig::new(&cli.data_dir)
        .format(parse_format(&cli.format)?)
        .durability(parse_durability(&cli.durability)?);
    let (waystones, discovery) = waystones::open_registries(&config);

    match cli.command {
        Command::List { owner, search } => list(&waystones, owner.as_deref(), search.as_deref()),
        Command::Show { name } => show(&waystones, &name),
        Command::Edit { name, property, value } => edit(&waystones, &config, &name, &property, &value),
        Command::Config { property, value } => {
            let edit = ConfigEdit::parse(&property, &value)?;
            waystones.apply_config(edit);
            flushed("waystones", waystones.save())?;
            println!("Config updated: {:?}", edit);
            Ok(())
        }
        Command::Remove { name } => {
            let waystone = find(&waystones, &name)?;
            waystones.unregister(waystone.id());
            discovery.forget_waystone(waystone.id());
            flushed("waystones", waystones.save())?;
            flushed("player discoveries", discovery.save())?;
            println!("Removed '{}' ({})", waystone.name(), waystone.id());
            Ok(())
        }
        Command::Discoveries { principal } => {
            for id in discovery.get_discovered(&principal) {
                match waystones.get(&id) {
                    Some(waystone) => println!("{}  {}", id, waystone.name()),
                    None => println!("{}", id),
                }
            }
            Ok(())
        }
        Command::Stats => {
            let settings = waystones.settings();
            println!("waystones:    {} ({})", waystones.count(), waystones.path().display());
            println!("players:      {} ({})", discovery.player_count(), discovery.path().display());
            println!("debugLogs:    {}", settings.debug_logs);
            println!("requireDiscover: {}", settings.require_discover);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn find(waystones: &WaystoneRegistry, name: &str) -> Result<Waystone> {
    waystones
        .find_by_name(name)
        .ok_or_else(|| anyhow!("Waystone '{}' not found", name))
}

fn flushed(label: &str, outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Failed => Err(anyhow!("Failed to write {} snapshot", label)),
        _ => Ok(()),
    }
}

fn list(waystones: &WaystoneRegistry, owner: Option<&str>, search: Option<&str>) -> Result<()> {
    let all = match owner {
        Some(owner) => waystones.get_by_owner(owner),
        None => waystones.get_all(),
    };
    let needle = search.map(str::to_lowercase);
    for waystone in all {
        if let Some(needle) = &needle {
            if !waystone.name().to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        println!(
            "{:>4}  {:<32} {:<8} {:<16} {} {}",
            waystone.priority(),
            waystone.name(),
            if waystone.is_public() { "public" } else { "private" },
            waystone.owner_name(),
            waystone.world(),
            waystone.block()
        );
    }
    Ok(())
}

fn show(waystones: &WaystoneRegistry, name: &str) -> Result<()> {
    let waystone = find(waystones, name)?;
    let json = serde_json::to_string_pretty(&waystone).context("Failed to render waystone")?;
    println!("{}", json);
    Ok(())
}

fn edit(
    waystones: &WaystoneRegistry,
    config: &RegistryConfig,
    name: &str,
    property: &str,
    value: &str,
) -> Result<()> {
    let waystone = find(waystones, name)?;
    let edit = WaystoneEdit::parse(property, value)?.validated(config)?;
    if edit.is_risky() {
        info!("Changing {} may break ownership checks for '{}'", edit.property(), waystone.name());
    }
    if !waystones.apply_edit(waystone.id(), &edit)? {
        return Err(anyhow!("Waystone '{}' disappeared while editing", name));
    }
    flushed("waystones", waystones.save())?;
    println!("Updated {} of '{}'", edit.property(), waystone.name());
    Ok(())
}
