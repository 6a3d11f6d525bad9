use clap::Subcommand;
use drillroom_core::{Config, Preset};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as JSON
    Show,
    /// Set the default preset for new sessions
    SetPreset { preset: String },
    /// Enable or disable audio capture
    SetAudio { enabled: bool },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::SetPreset { preset } => {
            let mut config = Config::load()?;
            config.defaults.preset = preset.parse::<Preset>()?;
            config.save()?;
            println!("default preset: {}", config.defaults.preset);
        }
        ConfigAction::SetAudio { enabled } => {
            let mut config = Config::load()?;
            config.audio.enabled = enabled;
            config.save()?;
            println!("audio capture: {}", if enabled { "on" } else { "off" });
        }
    }
    Ok(())
}
