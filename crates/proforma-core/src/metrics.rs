use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::debt::{self, LoanTerms};
use crate::error::ProformaError;
use crate::noi::{self, NoiInput};
use crate::returns::{self, CashFlowProjection, IrrOutcome};
use crate::types::{with_metadata, CashFlowPoint, ComputationOutput, Money, Multiple, Rate};
use crate::ProformaResult;

const DEFAULT_SELLING_COSTS: Decimal = dec!(0.03);

/// Upper bound on amortization and hold periods. Keeps month counts
/// well inside u32 and rejects nonsense inputs early.
const MAX_TERM_YEARS: u32 = 100;

/// One full acquisition underwriting: property income, financing, and
/// exit assumptions. All rates are decimal fractions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInputs {
    pub purchase_price: Money,
    pub annual_rent: Money,
    pub operating_expenses: Money,
    pub vacancy_rate: Rate,
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub amortization_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_only_years: Option<u32>,
    /// Acquisition closing costs as a fraction of the purchase price
    pub closing_costs: Rate,
    pub hold_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_growth_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_growth_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cap_rate: Option<Rate>,
    /// Defaults to 3% of the sale price when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_costs: Option<Rate>,
}

/// Aggregate result of one orchestrated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub noi: Money,
    pub cap_rate: Rate,
    pub grm: Multiple,
    pub debt_service: Money,
    /// `Decimal::MAX` sentinel for an all-cash deal (unbounded coverage)
    pub dscr: Multiple,
    pub ltv: Rate,
    pub cash_on_cash_return: Rate,
    /// Unlevered, property-level IRR: full price plus closing costs
    /// against NOI and gross sale proceeds
    pub irr: Rate,
    /// Equity IRR from the levered series, net of the loan payoff at
    /// sale. None for all-cash deals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levered_irr: Option<Rate>,
    /// The levered annual equity series the levered IRR is solved on
    pub cash_flows: Vec<CashFlowPoint>,
}

/// Pared-down screening metrics for a quick look at a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickMetrics {
    pub noi: Money,
    pub cap_rate: Rate,
    pub grm: Multiple,
}

/// Compute the full metric set for one acquisition scenario.
///
/// Leaf calculators stay total; this entry point is where inputs are
/// validated and soft diagnostics are collected.
pub fn calculate_investment_metrics(
    inputs: &InvestmentInputs,
) -> ProformaResult<ComputationOutput<InvestmentMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_inputs(inputs, &mut warnings)?;

    // --- Income ---
    let noi = noi::calculate_noi(&NoiInput {
        annual_rent: inputs.annual_rent,
        operating_expenses: inputs.operating_expenses,
        vacancy_rate: inputs.vacancy_rate,
    });
    let cap_rate = noi::calculate_cap_rate(noi, inputs.purchase_price);
    let grm = noi::calculate_grm(inputs.purchase_price, inputs.annual_rent);

    // --- Financing ---
    let loan_terms = LoanTerms {
        loan_amount: inputs.loan_amount,
        interest_rate: inputs.interest_rate,
        amortization_years: inputs.amortization_years,
        interest_only_years: inputs.interest_only_years,
    };
    let debt_service = debt::annual_debt_service(&loan_terms);
    let dscr = debt::calculate_dscr(noi, debt_service);
    let ltv = debt::calculate_ltv(inputs.loan_amount, inputs.purchase_price);

    if !debt_service.is_zero() && dscr < dec!(1.2) {
        warnings.push(format!("DSCR of {dscr:.2} is below 1.20x — lender covenant risk"));
    }
    if ltv > dec!(0.80) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80% — high leverage",
            ltv * dec!(100)
        ));
    }

    // --- Equity returns ---
    let initial_cash_investment = inputs.purchase_price * (Decimal::ONE - ltv)
        + inputs.purchase_price * inputs.closing_costs;
    let cash_on_cash_return =
        returns::calculate_cash_on_cash(noi, debt_service, initial_cash_investment);

    let rent_growth_rate = inputs.rent_growth_rate.unwrap_or(Decimal::ZERO);
    let expense_growth_rate = inputs.expense_growth_rate.unwrap_or(Decimal::ZERO);
    let selling_costs = inputs.selling_costs.unwrap_or(DEFAULT_SELLING_COSTS);

    if inputs.exit_cap_rate.is_none() {
        warnings.push("No exit cap rate provided — terminal year excludes sale proceeds".into());
    }

    // --- Levered equity series and IRR ---
    let loan_payoff = if inputs.loan_amount > Decimal::ZERO {
        debt::loan_balance_after(&loan_terms, inputs.hold_years * 12)
    } else {
        Decimal::ZERO
    };

    let levered_projection = CashFlowProjection {
        initial_investment: initial_cash_investment,
        annual_noi: noi,
        debt_service,
        hold_years: inputs.hold_years,
        rent_growth_rate,
        expense_growth_rate,
        exit_cap_rate: inputs.exit_cap_rate,
        selling_costs,
        loan_payoff,
    };
    let cash_flows = returns::build_cash_flow_series(&levered_projection);

    let levered_irr = if inputs.loan_amount > Decimal::ZERO {
        let outcome = returns::calculate_irr(&cash_flows);
        note_irr_outcome("Levered IRR", &outcome, &mut warnings);
        Some(outcome.rate())
    } else {
        None
    };

    // --- Unlevered IRR: whole price against undebted NOI ---
    let unlevered_projection = CashFlowProjection {
        initial_investment: inputs.purchase_price
            + inputs.purchase_price * inputs.closing_costs,
        annual_noi: noi,
        debt_service: Decimal::ZERO,
        hold_years: inputs.hold_years,
        rent_growth_rate,
        expense_growth_rate,
        exit_cap_rate: inputs.exit_cap_rate,
        selling_costs,
        loan_payoff: Decimal::ZERO,
    };
    let unlevered_series = returns::build_cash_flow_series(&unlevered_projection);
    let unlevered_outcome = returns::calculate_irr(&unlevered_series);
    note_irr_outcome("Unlevered IRR", &unlevered_outcome, &mut warnings);
    let irr = unlevered_outcome.rate();

    let result = InvestmentMetrics {
        noi,
        cap_rate,
        grm,
        debt_service,
        dscr,
        ltv,
        cash_on_cash_return,
        irr,
        levered_irr,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CRE Investment Metrics (Income, Debt Service, IRR)",
        inputs,
        warnings,
        elapsed,
        result,
    ))
}

/// Screening metrics only: NOI, cap rate, and GRM from price, rent and
/// expenses, with vacancy ignored.
pub fn quick_metrics(
    purchase_price: Money,
    annual_rent: Money,
    operating_expenses: Money,
) -> QuickMetrics {
    let noi = noi::calculate_noi(&NoiInput {
        annual_rent,
        operating_expenses,
        vacancy_rate: Decimal::ZERO,
    });
    QuickMetrics {
        noi,
        cap_rate: noi::calculate_cap_rate(noi, purchase_price),
        grm: noi::calculate_grm(purchase_price, annual_rent),
    }
}

fn validate_inputs(inputs: &InvestmentInputs, warnings: &mut Vec<String>) -> ProformaResult<()> {
    if inputs.purchase_price <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "purchase_price".into(),
            reason: "Purchase price must be positive".into(),
        });
    }
    if inputs.annual_rent < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "annual_rent".into(),
            reason: "Annual rent cannot be negative".into(),
        });
    }
    if inputs.operating_expenses < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "operating_expenses".into(),
            reason: "Operating expenses cannot be negative".into(),
        });
    }
    if inputs.vacancy_rate < Decimal::ZERO || inputs.vacancy_rate > Decimal::ONE {
        return Err(ProformaError::InvalidInput {
            field: "vacancy_rate".into(),
            reason: "Vacancy rate must be between 0 and 1".into(),
        });
    }
    if inputs.loan_amount < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "loan_amount".into(),
            reason: "Loan amount cannot be negative".into(),
        });
    }
    if inputs.interest_rate < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "interest_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if inputs.loan_amount > Decimal::ZERO && inputs.amortization_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization term must be at least 1 year".into(),
        });
    }
    if inputs.amortization_years > MAX_TERM_YEARS {
        return Err(ProformaError::InvalidInput {
            field: "amortization_years".into(),
            reason: format!("Amortization term cannot exceed {MAX_TERM_YEARS} years"),
        });
    }
    if let Some(io) = inputs.interest_only_years {
        if io > inputs.amortization_years {
            return Err(ProformaError::InvalidInput {
                field: "interest_only_years".into(),
                reason: "Interest-only phase cannot exceed the amortization term".into(),
            });
        }
    }
    if inputs.hold_years < 1 {
        return Err(ProformaError::InvalidInput {
            field: "hold_years".into(),
            reason: "Hold period must be at least 1 year".into(),
        });
    }
    if inputs.hold_years > MAX_TERM_YEARS {
        return Err(ProformaError::InvalidInput {
            field: "hold_years".into(),
            reason: format!("Hold period cannot exceed {MAX_TERM_YEARS} years"),
        });
    }

    if inputs.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            inputs.vacancy_rate * dec!(100)
        ));
    }

    Ok(())
}

fn note_irr_outcome(label: &str, outcome: &IrrOutcome, warnings: &mut Vec<String>) {
    match outcome {
        IrrOutcome::Converged(_) => {}
        IrrOutcome::NonProfitable => {
            warnings.push(format!("{label}: no investment-then-return pattern; reported as 0"));
        }
        IrrOutcome::TotalLoss => {
            warnings.push(format!("{label}: series sums to a loss; reported as -99%"));
        }
        IrrOutcome::BestEffort { residual, .. } => {
            warnings.push(format!(
                "{label}: solver did not fully converge (residual NPV {residual}); best-effort estimate reported"
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// The documented acceptance scenario: $1.2M purchase at a 7% cap,
    /// 65% LTV at 6.5% over 30 years, 5-year hold, 2% growth, 7.25%
    /// exit cap.
    fn acceptance_inputs() -> InvestmentInputs {
        InvestmentInputs {
            purchase_price: dec!(1200000),
            annual_rent: dec!(108000),
            operating_expenses: dec!(24000),
            vacancy_rate: Decimal::ZERO,
            loan_amount: dec!(780000),
            interest_rate: dec!(0.065),
            amortization_years: 30,
            interest_only_years: None,
            closing_costs: dec!(0.03),
            hold_years: 5,
            rent_growth_rate: Some(dec!(0.02)),
            expense_growth_rate: Some(dec!(0.02)),
            exit_cap_rate: Some(dec!(0.0725)),
            selling_costs: Some(dec!(0.03)),
        }
    }

    #[test]
    fn test_acceptance_scenario() {
        let output = calculate_investment_metrics(&acceptance_inputs()).unwrap();
        let m = &output.result;

        assert_eq!(m.noi, dec!(84000));
        assert_eq!(m.cap_rate, dec!(0.07));
        assert!((m.grm - dec!(11.111)).abs() < dec!(0.001));
        assert!((m.debt_service - dec!(59161.57)).abs() < dec!(0.1));
        assert!((m.dscr - dec!(1.42)).abs() < dec!(0.01));
        assert_eq!(m.ltv, dec!(0.65));
        assert!((m.cash_on_cash_return - dec!(0.0545)).abs() < dec!(0.001));

        // Documented property-level IRR ≈ 7.3%
        assert!((m.irr - dec!(0.073)).abs() < dec!(0.003), "irr {}", m.irr);
    }

    #[test]
    fn test_acceptance_levered_irr() {
        let output = calculate_investment_metrics(&acceptance_inputs()).unwrap();
        let levered = output.result.levered_irr.unwrap();

        // Equity IRR net of the ~$730k payoff at sale ≈ 8.5%
        assert!(
            (levered - dec!(0.0854)).abs() < dec!(0.005),
            "levered {levered}"
        );
        assert!(levered > output.result.irr);
    }

    #[test]
    fn test_cash_flow_series_shape() {
        let output = calculate_investment_metrics(&acceptance_inputs()).unwrap();
        let flows = &output.result.cash_flows;

        assert_eq!(flows.len(), 6);
        assert_eq!(flows[0].year, 0);
        assert_eq!(flows[0].cash_flow, dec!(-456000));
        for window in flows.windows(2) {
            assert_eq!(window[1].year, window[0].year + 1);
        }
    }

    #[test]
    fn test_all_cash_deal() {
        let mut inputs = acceptance_inputs();
        inputs.loan_amount = Decimal::ZERO;

        let output = calculate_investment_metrics(&inputs).unwrap();
        let m = &output.result;

        assert_eq!(m.debt_service, Decimal::ZERO);
        assert_eq!(m.dscr, Decimal::MAX);
        assert_eq!(m.ltv, Decimal::ZERO);
        assert!(m.levered_irr.is_none());

        // With no loan the equity series is the property series
        assert_eq!(m.cash_flows[0].cash_flow, dec!(-1236000));
        assert!((m.irr - dec!(0.073)).abs() < dec!(0.003));
    }

    #[test]
    fn test_interest_only_scenario() {
        let mut inputs = acceptance_inputs();
        inputs.interest_only_years = Some(5);

        let output = calculate_investment_metrics(&inputs).unwrap();
        let m = &output.result;
        // Blended debt service exceeds the straight-amortizing figure's
        // interest-only floor
        assert!(m.debt_service > dec!(50700));
        assert!(m.levered_irr.is_some());
    }

    #[test]
    fn test_zero_purchase_price_rejected() {
        let mut inputs = acceptance_inputs();
        inputs.purchase_price = Decimal::ZERO;
        let err = calculate_investment_metrics(&inputs).unwrap_err();
        match err {
            ProformaError::InvalidInput { field, .. } => assert_eq!(field, "purchase_price"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_hold_rejected() {
        let mut inputs = acceptance_inputs();
        inputs.hold_years = 0;
        assert!(calculate_investment_metrics(&inputs).is_err());
    }

    #[test]
    fn test_excessive_hold_rejected() {
        let mut inputs = acceptance_inputs();
        inputs.hold_years = 200;
        let err = calculate_investment_metrics(&inputs).unwrap_err();
        match err {
            ProformaError::InvalidInput { field, .. } => assert_eq!(field, "hold_years"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_excessive_amortization_rejected() {
        let mut inputs = acceptance_inputs();
        inputs.amortization_years = 200;
        let err = calculate_investment_metrics(&inputs).unwrap_err();
        match err {
            ProformaError::InvalidInput { field, .. } => {
                assert_eq!(field, "amortization_years")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_io_beyond_term_rejected() {
        let mut inputs = acceptance_inputs();
        inputs.interest_only_years = Some(40);
        assert!(calculate_investment_metrics(&inputs).is_err());
    }

    #[test]
    fn test_high_leverage_warning() {
        let mut inputs = acceptance_inputs();
        inputs.loan_amount = dec!(1020000); // 85% LTV
        let output = calculate_investment_metrics(&inputs).unwrap();
        assert!(output.warnings.iter().any(|w| w.contains("exceeds 80%")));
    }

    #[test]
    fn test_low_dscr_warning() {
        let mut inputs = acceptance_inputs();
        inputs.loan_amount = dec!(1020000);
        let output = calculate_investment_metrics(&inputs).unwrap();
        assert!(output.warnings.iter().any(|w| w.contains("DSCR")));
    }

    #[test]
    fn test_missing_exit_cap_warning() {
        let mut inputs = acceptance_inputs();
        inputs.exit_cap_rate = None;
        let output = calculate_investment_metrics(&inputs).unwrap();
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("exit cap rate")));
    }

    #[test]
    fn test_selling_costs_default() {
        let mut inputs = acceptance_inputs();
        inputs.selling_costs = None;
        let output = calculate_investment_metrics(&inputs).unwrap();
        // Default 3% matches the explicit acceptance scenario
        let explicit = calculate_investment_metrics(&acceptance_inputs()).unwrap();
        assert_eq!(output.result.irr, explicit.result.irr);
    }

    #[test]
    fn test_quick_metrics() {
        let quick = quick_metrics(dec!(1200000), dec!(108000), dec!(24000));
        assert_eq!(quick.noi, dec!(84000));
        assert_eq!(quick.cap_rate, dec!(0.07));
        assert!((quick.grm - dec!(11.111)).abs() < dec!(0.001));
    }

    #[test]
    fn test_methodology_string() {
        let output = calculate_investment_metrics(&acceptance_inputs()).unwrap();
        assert_eq!(
            output.methodology,
            "CRE Investment Metrics (Income, Debt Service, IRR)"
        );
    }
}
