use clap::Subcommand;
use drillroom_core::problem;

#[derive(Subcommand)]
pub enum ProblemAction {
    /// List the built-in problems
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one problem in full
    Show { id: String },
}

pub fn run(action: ProblemAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProblemAction::List { json } => {
            let catalog = problem::builtin_catalog();
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                for p in catalog {
                    println!("{:<18} {:<7} {}", p.id, format!("{:?}", p.difficulty), p.title);
                }
            }
        }
        ProblemAction::Show { id } => {
            let p = problem::find(&id).ok_or_else(|| format!("unknown problem '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&p)?);
        }
    }
    Ok(())
}
