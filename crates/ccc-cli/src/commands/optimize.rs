use clap::Args;
use serde_json::Value;

use ccc_core::optimizer::bounds::OptimizationBounds;
use ccc_core::optimizer::lp;

use crate::input;

/// Arguments for solving the policy program on its own
#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON file of bounds and constraints (defaults when omitted)
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_optimize(args: OptimizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bounds: OptimizationBounds = match args.config {
        Some(ref path) => input::file::read_json(path)?,
        None => OptimizationBounds::default(),
    };
    let result = lp::optimize_policy(&bounds)?;
    Ok(serde_json::to_value(result)?)
}
