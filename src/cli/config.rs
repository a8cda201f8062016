use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

const SYSTEM_CONFIG_PATH: &str = "/etc/notify-tally/config.yml";

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    // Prefer ~/.config/notify-tally/config.yml, fall back to /etc
    let config_path = match crate::config::default_user_config_path() {
        Some(user_config) => match user_config.parent().map(fs::create_dir_all) {
            Some(Err(e)) => {
                eprintln!("Warning: Could not create config directory: {}", e);
                eprintln!("Falling back to {}", SYSTEM_CONFIG_PATH);
                PathBuf::from(SYSTEM_CONFIG_PATH)
            }
            _ => user_config,
        },
        None => PathBuf::from(SYSTEM_CONFIG_PATH),
    };

    if config_path.exists() {
        eprintln!(
            "Error: Config file already exists at {}",
            config_path.display()
        );
        eprintln!("Remove it first or use --stdout to print the config");
        std::process::exit(1);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    println!("Set SLACK_TOKEN and edit the channel list before running.");
    Ok(())
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.ok_or("No config file found. Use --config to specify a path.")?;

    println!("Validating config file: {}", path.display());

    match crate::config::load_config(&path) {
        Ok(config) => {
            println!("✓ Config is valid");
            println!("  Channels: {}", config.channels.len());
            println!(
                "  Sinks: {}",
                match (&config.sinks.chat, &config.sinks.sheet) {
                    (Some(_), Some(_)) => "chat, sheet",
                    (Some(_), None) => "chat",
                    (None, Some(_)) => "sheet",
                    (None, None) => "none",
                }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Config validation failed:\n{}", e);
            std::process::exit(1);
        }
    }
}
