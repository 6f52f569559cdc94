//! Config command - manage the configuration file.
//!
//! Every command reads the same file: the global `-c` path when given,
//! otherwise `<config dir>/invostar/config.json`.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;
use tracing::debug;

use invostar_core::StarConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Print one value (e.g., "export.output_dir")
    Get {
        /// Dotted configuration key
        key: String,
    },

    /// Change one value and save the file
    Set {
        /// Dotted configuration key
        key: String,
        /// New value, as JSON or a bare string
        value: String,
    },

    /// Show which configuration file is used
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path (defaults to the active configuration file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

/// Where the configuration lives and whether the user named it.
pub struct ConfigLocation {
    pub path: PathBuf,
    explicit: bool,
}

impl ConfigLocation {
    /// The `-c` path when given, otherwise the per-user default.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(path) => Self {
                path: PathBuf::from(path),
                explicit: true,
            },
            None => Self {
                path: default_config_path(),
                explicit: false,
            },
        }
    }

    /// Load the file. A missing default file means defaults; a missing
    /// file named with `-c` is an error.
    pub fn load(&self) -> anyhow::Result<StarConfig> {
        if self.path.exists() {
            debug!("Loading configuration from {}", self.path.display());
            StarConfig::from_file(&self.path).map_err(|e| {
                anyhow::anyhow!("Invalid configuration file {}: {}", self.path.display(), e)
            })
        } else if self.explicit {
            anyhow::bail!("Config file not found: {}", self.path.display())
        } else {
            Ok(StarConfig::default())
        }
    }

    fn save(&self, config: &StarConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        config.save(&self.path)?;
        Ok(())
    }
}

/// Effective configuration for a command run with the given `-c` flag.
pub fn resolve_config(flag: Option<&str>) -> anyhow::Result<StarConfig> {
    ConfigLocation::from_flag(flag).load()
}

pub fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let location = ConfigLocation::from_flag(config_path);

    match args.command {
        ConfigCommand::Show => show_config(&location),
        ConfigCommand::Init(init_args) => init_config(&location, init_args),
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(location.load()?)?;
            println!("{}", serde_json::to_string_pretty(get_key(&json, &key)?)?);
            Ok(())
        }
        ConfigCommand::Set { key, value } => set_config(&location, &key, &value),
        ConfigCommand::Path => show_path(&location),
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invostar")
        .join("config.json")
}

fn show_config(location: &ConfigLocation) -> anyhow::Result<()> {
    if !location.path.exists() {
        println!(
            "{} No config file at {}, showing defaults.",
            style("ℹ").blue(),
            location.path.display()
        );
    }
    println!("{}", serde_json::to_string_pretty(&location.load()?)?);
    Ok(())
}

fn init_config(location: &ConfigLocation, args: InitArgs) -> anyhow::Result<()> {
    let target = match args.output {
        Some(path) => ConfigLocation {
            path,
            explicit: true,
        },
        None => ConfigLocation {
            path: location.path.clone(),
            explicit: location.explicit,
        },
    };

    if target.path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            target.path.display()
        );
    }

    target.save(&StarConfig::default())?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        target.path.display()
    );
    Ok(())
}

fn set_config(location: &ConfigLocation, key: &str, value: &str) -> anyhow::Result<()> {
    // An explicit file may be created by `set`; only a default file may be absent.
    let config = if location.path.exists() {
        location.load()?
    } else {
        StarConfig::default()
    };

    let parsed = parse_value(value);
    let mut json = serde_json::to_value(&config)?;
    set_key(&mut json, key, parsed.clone())?;

    let config: StarConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    location.save(&config)?;

    println!(
        "{} Set {} = {} in {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed)?,
        location.path.display()
    );
    Ok(())
}

fn show_path(location: &ConfigLocation) -> anyhow::Result<()> {
    println!("Configuration file: {}", location.path.display());

    if location.path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'invostar config init' to create a configuration file.");
    }
    Ok(())
}

/// Bare words that are not valid JSON are taken as strings.
fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn get_key<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Replace an existing leaf; unknown keys are rejected.
fn set_key(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };

    let mut current = json;
    if let Some(parent) = parent {
        for part in parent.split('.') {
            current = current
                .get_mut(part)
                .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
        }
    }

    match current.as_object_mut() {
        Some(section) if section.contains_key(leaf) => {
            section.insert(leaf.to_string(), value);
            Ok(())
        }
        Some(_) => anyhow::bail!("Configuration key not found: {}", key),
        None => anyhow::bail!("Cannot set value at non-object path: {}", key),
    }
}
