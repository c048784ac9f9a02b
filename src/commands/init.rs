use std::io::{self, Write};

use crate::config::{data_dir, ensure_directories, env_file_path};
use crate::error::{Error, Result};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Render the .env file; blank optional entries are left out
fn render_env(entries: &[(&str, &str)]) -> String {
    entries
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

pub fn run(
    api_key: Option<String>,
    spreadsheet: Option<String>,
    channel: Option<String>,
    force: bool,
) -> Result<()> {
    ensure_directories()?;

    let env_file = env_file_path();

    if env_file.exists() && !force {
        println!("Config already exists at {}", env_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    let api_key = match api_key {
        Some(key) => key,
        None => prompt("Enter your YouTube Data API key")?,
    };

    if api_key.is_empty() {
        return Err(Error::ApiKeyMissing);
    }

    let spreadsheet = match spreadsheet {
        Some(id) => id,
        None => prompt("Spreadsheet ID (leave blank to skip)")?,
    };
    let channel = match channel {
        Some(id) => id,
        None => prompt("Channel ID (leave blank to skip)")?,
    };

    let contents = render_env(&[
        ("YOUTUBE_API_KEY", api_key.as_str()),
        ("SPREADSHEET_ID", spreadsheet.as_str()),
        ("CHANNEL_ID", channel.as_str()),
    ]);
    std::fs::write(&env_file, contents)?;

    println!("Config saved to {}", env_file.display());
    println!("Data directory: {}", data_dir().display());
    println!("Set SERVICE_ACCOUNT (key JSON) or SERVICE_ACCOUNT_FILE before running `sync`.");

    Ok(())
}
