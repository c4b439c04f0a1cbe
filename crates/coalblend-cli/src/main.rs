use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use coalblend_core::{Material, Scenario, SolveStatus, Specification};

#[derive(Parser)]
#[command(name = "coalblend")]
#[command(about = "Optimal coal blending against a buyer specification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a scenario file and print the optimal blend
    Solve {
        /// JSON scenario file
        file: PathBuf,
    },
    /// Validate a scenario file without solving it
    Check {
        /// JSON scenario file
        file: PathBuf,
    },
}

/// On-disk scenario shape: the materials table, the scenario proper, and the
/// buyer specification in one document
#[derive(serde::Deserialize)]
struct ScenarioFile {
    materials: BTreeMap<String, Material>,
    selected: Vec<String>,
    total_quantity: f64,
    #[serde(default)]
    fixed: BTreeMap<String, f64>,
    specification: Specification,
}

fn read_scenario(file: &PathBuf) -> ScenarioFile {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", file.display(), e);
            std::process::exit(2);
        }
    };
    match serde_json::from_str(&source) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Error parsing {}: {}", file.display(), e);
            std::process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file } => {
            let input = read_scenario(&file);
            let scenario = Scenario {
                selected: input.selected,
                total_quantity: input.total_quantity,
                fixed: input.fixed,
            };

            let result =
                match coalblend_core::solve(&input.materials, &scenario, &input.specification) {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("Invalid scenario: {}", e);
                        std::process::exit(2);
                    }
                };

            match result.status {
                SolveStatus::Optimal => {
                    let blend = result.blend.expect("optimal result carries a blend");
                    println!("Status: OPTIMAL");
                    println!("Total quantity: {:.3}", scenario.total_quantity);
                    println!();
                    println!("Composition:");
                    for a in &blend.allocation {
                        let origin = if a.pinned { "pinned" } else { "solved" };
                        println!("  {:12} {:10.3}  ({})", a.id, a.quantity, origin);
                    }
                    println!();
                    println!("Predicted average quality:");
                    println!("  CV   {:10.2} kcal/kg", blend.quality.cv);
                    println!("  TM   {:10.2} %", blend.quality.tm);
                    println!("  Ash  {:10.2} %", blend.quality.ash);
                    println!("  TS   {:10.2} %", blend.quality.ts);
                }
                SolveStatus::Infeasible => {
                    println!("Status: INFEASIBLE");
                    println!("No blend satisfies all constraints. Relax the specification or change the selection.");
                    std::process::exit(1);
                }
                SolveStatus::Unbounded => {
                    println!("Status: UNBOUNDED");
                    println!("The problem has no finite optimum.");
                    std::process::exit(1);
                }
                SolveStatus::Undefined => {
                    println!("Status: UNDEFINED");
                    println!("The solver stopped without reaching a verdict.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let input = read_scenario(&file);
            let scenario = Scenario {
                selected: input.selected,
                total_quantity: input.total_quantity,
                fixed: input.fixed,
            };

            match coalblend_core::validate(&input.materials, &scenario) {
                Ok(_) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} materials in table", input.materials.len());
                    println!("  {} selected", scenario.selected.len());
                    println!("  {} pinned", scenario.fixed.len());
                    println!("  {:.3} residual for the optimizer", scenario.residual());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
