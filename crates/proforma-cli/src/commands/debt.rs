use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use proforma_core::debt::{self, LoanTerms};

use crate::input;

/// Arguments for annual debt service
#[derive(Args)]
pub struct DebtServiceArgs {
    /// Path to JSON input file with loan terms
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, default_value = "30")]
    pub amortization_years: u32,

    /// Interest-only phase in years
    #[arg(long)]
    pub interest_only_years: Option<u32>,
}

pub fn run_debt_service(args: DebtServiceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = loan_terms_from(args.input.as_deref(), || {
        let loan = args.loan.ok_or("--loan is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        Ok(LoanTerms {
            loan_amount: loan,
            interest_rate: rate,
            amortization_years: args.amortization_years,
            interest_only_years: args.interest_only_years,
        })
    })?;

    Ok(json!({
        "annual_debt_service": debt::annual_debt_service(&terms),
        "monthly_payment": debt::monthly_payment(&terms),
        "interest_only_payment": debt::interest_only_payment(&terms),
    }))
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file with loan terms
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub loan: Option<Decimal>,

    /// Annual interest rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization term in years
    #[arg(long, default_value = "30")]
    pub amortization_years: u32,

    /// Interest-only phase in years
    #[arg(long)]
    pub interest_only_years: Option<u32>,

    /// Only emit the first N months
    #[arg(long)]
    pub months: Option<usize>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = loan_terms_from(args.input.as_deref(), || {
        let loan = args.loan.ok_or("--loan is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
        Ok(LoanTerms {
            loan_amount: loan,
            interest_rate: rate,
            amortization_years: args.amortization_years,
            interest_only_years: args.interest_only_years,
        })
    })?;

    let mut schedule = debt::amortization_schedule(&terms);
    if let Some(months) = args.months {
        schedule.truncate(months);
    }
    Ok(serde_json::to_value(schedule)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_loan_terms_bounds() {
        let terms = |years: u32| LoanTerms {
            loan_amount: dec!(780000),
            interest_rate: dec!(0.065),
            amortization_years: years,
            interest_only_years: None,
        };
        assert!(check_term_bounds(&terms(30)).is_ok());
        assert!(check_term_bounds(&terms(0)).is_err());
        assert!(check_term_bounds(&terms(200)).is_err());
    }
}

fn loan_terms_from(
    path: Option<&str>,
    from_flags: impl FnOnce() -> Result<LoanTerms, Box<dyn std::error::Error>>,
) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    let terms = if let Some(path) = path {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        from_flags()?
    };

    check_term_bounds(&terms)?;
    Ok(terms)
}

fn check_term_bounds(terms: &LoanTerms) -> Result<(), Box<dyn std::error::Error>> {
    if terms.amortization_years == 0 || terms.amortization_years > 100 {
        return Err("Amortization term must be between 1 and 100 years".into());
    }
    Ok(())
}
