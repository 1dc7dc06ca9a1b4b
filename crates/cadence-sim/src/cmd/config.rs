use std::path::Path;

use anyhow::{bail, Context};
use clap::Subcommand;

use cadence_core::config::{Config, WarnLevel};

use crate::output::print_json;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(path: &Path, subcommand: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        ConfigSubcommand::Init { force } => init(path, force),
        ConfigSubcommand::Show => show(path, json),
        ConfigSubcommand::Validate => validate(path, json),
    }
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let cfg = Config::default();
    cfg.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = super::load_config(path)?;
    if json {
        return print_json(&cfg);
    }
    print!("{}", serde_yaml::to_string(&cfg)?);
    Ok(())
}

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let cfg = super::load_config(path)?;
    let warnings = cfg.validate();

    if json {
        return print_json(&warnings);
    }
    if warnings.is_empty() {
        println!("config ok");
        return Ok(());
    }
    let mut errors = 0;
    for w in &warnings {
        let tag = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => {
                errors += 1;
                "error"
            }
        };
        println!("{tag}: {}", w.message);
    }
    if errors > 0 {
        bail!("{errors} config error(s)");
    }
    Ok(())
}
