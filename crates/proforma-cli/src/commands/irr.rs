use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use proforma_core::returns;
use proforma_core::types::CashFlowPoint;

use crate::input;

/// Arguments for the IRR solver
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file: an array of amounts, or of
    /// {year, cash_flow} objects
    #[arg(long)]
    pub input: Option<String>,

    /// Annual amounts starting at year 0, comma-separated
    /// (e.g. "-456000,24838,24838,770000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let series: Vec<CashFlowPoint> = if let Some(ref path) = args.input {
        parse_series(input::file::read_json(path)?)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        parse_series(data)?
    } else {
        let amounts = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        from_amounts(&amounts)
    };

    if series.len() < 2 {
        return Err("IRR requires at least two cash flows".into());
    }

    let outcome = returns::calculate_irr(&series);
    Ok(json!({
        "irr": outcome.rate(),
        "outcome": outcome,
    }))
}

fn parse_series(data: Value) -> Result<Vec<CashFlowPoint>, Box<dyn std::error::Error>> {
    if let Ok(points) = serde_json::from_value::<Vec<CashFlowPoint>>(data.clone()) {
        return Ok(points);
    }
    let amounts: Vec<Decimal> = serde_json::from_value(data)
        .map_err(|e| format!("Expected an array of amounts or cash-flow points: {}", e))?;
    Ok(from_amounts(&amounts))
}

fn from_amounts(amounts: &[Decimal]) -> Vec<CashFlowPoint> {
    amounts
        .iter()
        .enumerate()
        .map(|(year, &cash_flow)| CashFlowPoint {
            year: year as u32,
            cash_flow,
        })
        .collect()
}
