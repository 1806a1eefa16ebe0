use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::{Settings, config_path};

pub fn run(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        Settings::create_default_config(&path)?;
        println!("{} {}", "Created".green(), path.display());
    }

    let settings = Settings::load(Some(&path))?;

    println!("{}", "Paths".bold());
    println!("  Config:       {}", path.display());
    if let Some(secret_file) = &settings.secret_file {
        println!("  Credentials:  {}", secret_file.display());
    }
    println!();
    println!("{}", "Effective settings".bold());
    print!("{}", toml::to_string_pretty(&settings.redacted())?);

    Ok(())
}
