use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use proforma_core::metrics::{self, InvestmentInputs};

use crate::input;

/// Arguments for the full metrics run
#[derive(Args)]
pub struct MetricsArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Gross annual rent at acquisition
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Annual operating expenses
    #[arg(long)]
    pub expenses: Option<Decimal>,

    /// Vacancy rate as a decimal (0.05 = 5%)
    #[arg(long, default_value_t = dec!(0))]
    pub vacancy: Decimal,

    /// Loan amount (0 for all-cash)
    #[arg(long, default_value_t = dec!(0))]
    pub loan: Decimal,

    /// Annual interest rate as a decimal
    #[arg(long, default_value_t = dec!(0))]
    pub rate: Decimal,

    /// Amortization term in years
    #[arg(long, default_value = "30")]
    pub amortization_years: u32,

    /// Interest-only phase in years
    #[arg(long)]
    pub interest_only_years: Option<u32>,

    /// Closing costs as a fraction of price
    #[arg(long, default_value_t = dec!(0))]
    pub closing_costs: Decimal,

    /// Hold period in years
    #[arg(long, default_value = "5")]
    pub hold_years: u32,

    /// Annual rent growth rate
    #[arg(long)]
    pub rent_growth: Option<Decimal>,

    /// Exit cap rate for the terminal sale
    #[arg(long)]
    pub exit_cap: Option<Decimal>,

    /// Selling costs as a fraction of sale price (default 3%)
    #[arg(long)]
    pub selling_costs: Option<Decimal>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: InvestmentInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let price = args
            .price
            .ok_or("--price is required (or provide --input)")?;
        let rent = args.rent.ok_or("--rent is required (or provide --input)")?;
        let expenses = args
            .expenses
            .ok_or("--expenses is required (or provide --input)")?;

        InvestmentInputs {
            purchase_price: price,
            annual_rent: rent,
            operating_expenses: expenses,
            vacancy_rate: args.vacancy,
            loan_amount: args.loan,
            interest_rate: args.rate,
            amortization_years: args.amortization_years,
            interest_only_years: args.interest_only_years,
            closing_costs: args.closing_costs,
            hold_years: args.hold_years,
            rent_growth_rate: args.rent_growth,
            expense_growth_rate: None,
            exit_cap_rate: args.exit_cap,
            selling_costs: args.selling_costs,
        }
    };

    let result = metrics::calculate_investment_metrics(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the quick screen
#[derive(Args)]
pub struct QuickArgs {
    /// Purchase price
    #[arg(long)]
    pub price: Decimal,

    /// Gross annual rent
    #[arg(long)]
    pub rent: Decimal,

    /// Annual operating expenses
    #[arg(long)]
    pub expenses: Decimal,
}

pub fn run_quick(args: QuickArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = metrics::quick_metrics(args.price, args.rent, args.expenses);
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: MetricsArgs,
    }

    #[test]
    fn test_metrics_flag_defaults() {
        let parsed = Harness::parse_from([
            "proforma",
            "--price",
            "1200000",
            "--rent",
            "108000",
            "--expenses",
            "24000",
        ]);
        let args = parsed.args;
        assert_eq!(args.vacancy, dec!(0));
        assert_eq!(args.loan, dec!(0));
        assert_eq!(args.rate, dec!(0));
        assert_eq!(args.closing_costs, dec!(0));
        assert_eq!(args.amortization_years, 30);
        assert_eq!(args.hold_years, 5);
    }
}
