use clap::Subcommand;
use drillroom_core::Preset;
use serde_json::json;

#[derive(Subcommand)]
pub enum PresetAction {
    /// List presets with their timing and budget knobs
    List {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PresetAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PresetAction::List { json: as_json } => {
            if as_json {
                let value: Vec<_> = Preset::ALL
                    .iter()
                    .map(|p| json!({ "name": p.as_str(), "config": p.config() }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                for preset in Preset::ALL {
                    let c = preset.config();
                    println!(
                        "{:<10} prep {:>2}m  coding {:>2}m  silent {:>2}m  nudges {}",
                        preset.as_str(),
                        c.prep_duration_ms / 60_000,
                        c.coding_duration_ms / 60_000,
                        c.silent_duration_ms / 60_000,
                        c.nudge_budget,
                    );
                }
            }
        }
    }
    Ok(())
}
