use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CashFlowPoint, Money, Rate};

const IRR_TOLERANCE: Decimal = dec!(0.0001);
const MAX_IRR_ITERATIONS: u32 = 100;
const NEWTON_INITIAL_GUESS: Decimal = dec!(0.1);
const RATE_FLOOR: Decimal = dec!(-0.99);
const NEWTON_RATE_CEILING: Decimal = dec!(10);
const BISECTION_RATE_CEILING: Decimal = dec!(1.0);

/// Legacy sentinel for a total-loss series, kept for callers that want
/// a plain number instead of matching on [`IrrOutcome`].
pub const TOTAL_LOSS_RATE: Rate = dec!(-0.99);

/// Cash-on-Cash return: first-year levered cash flow over the cash
/// actually invested.
pub fn calculate_cash_on_cash(
    noi: Money,
    annual_debt_service: Money,
    initial_cash_investment: Money,
) -> Rate {
    if initial_cash_investment.is_zero() {
        return Decimal::ZERO;
    }
    (noi - annual_debt_service) / initial_cash_investment
}

// ---------------------------------------------------------------------------
// Cash-flow projection
// ---------------------------------------------------------------------------

/// Assumptions for projecting the annual cash-flow series over a hold
/// period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowProjection {
    /// Cash invested at year 0 (entered as a positive magnitude)
    pub initial_investment: Money,
    /// Stabilised year-1 NOI
    pub annual_noi: Money,
    /// Annual debt service deducted from every projected year
    pub debt_service: Money,
    /// Hold period in years (at least 1)
    pub hold_years: u32,
    /// Annual NOI growth. Expense growth is not modelled separately:
    /// NOI is grown wholesale at this rate.
    #[serde(default)]
    pub rent_growth_rate: Rate,
    /// Accepted for input compatibility; not applied to the projection.
    #[serde(default)]
    pub expense_growth_rate: Rate,
    /// Reversion cap rate at sale; without one, no sale proceeds are
    /// added to the terminal year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cap_rate: Option<Rate>,
    /// Disposition costs as a fraction of the sale price
    #[serde(default)]
    pub selling_costs: Rate,
    /// Outstanding loan balance repaid out of sale proceeds
    #[serde(default)]
    pub loan_payoff: Money,
}

/// Build the ordered annual series consumed by the IRR solver: the
/// year-0 outlay, grown interim flows, and a terminal flow carrying net
/// sale proceeds less the loan payoff.
///
/// Output always has `hold_years + 1` points with strictly increasing
/// years (a zero hold period degenerates to the outlay alone).
pub fn build_cash_flow_series(projection: &CashFlowProjection) -> Vec<CashFlowPoint> {
    let mut flows = Vec::with_capacity(projection.hold_years as usize + 1);
    flows.push(CashFlowPoint {
        year: 0,
        cash_flow: -projection.initial_investment,
    });

    if projection.hold_years == 0 {
        return flows;
    }

    let growth = Decimal::ONE + projection.rent_growth_rate;
    let mut projected_noi = projection.annual_noi;

    for year in 1..projection.hold_years {
        projected_noi *= growth;
        flows.push(CashFlowPoint {
            year,
            cash_flow: projected_noi - projection.debt_service,
        });
    }

    // Terminal year: operating flow plus net reversion
    projected_noi *= growth;
    let mut terminal = projected_noi - projection.debt_service;

    if let Some(exit_cap) = projection.exit_cap_rate {
        if exit_cap > Decimal::ZERO {
            let sale_price = projected_noi / exit_cap;
            terminal += sale_price * (Decimal::ONE - projection.selling_costs);
        }
    }
    terminal -= projection.loan_payoff;

    flows.push(CashFlowPoint {
        year: projection.hold_years,
        cash_flow: terminal,
    });

    flows
}

// ---------------------------------------------------------------------------
// IRR solver
// ---------------------------------------------------------------------------

/// Outcome of an IRR solve. The solver is total: every input maps to
/// one of these variants instead of a magic number in the rate range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrrOutcome {
    /// Root found within tolerance
    Converged(Rate),
    /// No sign change and non-negative sum; nothing to discount
    NonProfitable,
    /// No sign change and the series sums to a loss
    TotalLoss,
    /// Bisection exhausted its iterations; `rate` is the bracket
    /// midpoint and `residual` the NPV left at that rate
    BestEffort { rate: Rate, residual: Money },
}

impl IrrOutcome {
    /// Collapse to the legacy numeric contract: 0 for a non-profitable
    /// series, -0.99 for a total loss, the estimate otherwise.
    pub fn rate(&self) -> Rate {
        match self {
            IrrOutcome::Converged(rate) => *rate,
            IrrOutcome::NonProfitable => Decimal::ZERO,
            IrrOutcome::TotalLoss => TOTAL_LOSS_RATE,
            IrrOutcome::BestEffort { rate, .. } => *rate,
        }
    }
}

/// Solve for the rate that zeroes the NPV of the series. Newton-Raphson
/// first, bisection as the robust fallback. Pure and stateless; safe to
/// call from any number of threads.
///
/// Discounting uses ordinal position in the series, so the `year`
/// fields are expected to be contiguous from zero as produced by
/// [`build_cash_flow_series`].
pub fn calculate_irr(series: &[CashFlowPoint]) -> IrrOutcome {
    if series.len() < 2 {
        return IrrOutcome::NonProfitable;
    }

    let amounts: Vec<Money> = series.iter().map(|point| point.cash_flow).collect();

    let all_non_negative = amounts.iter().all(|a| *a >= Decimal::ZERO);
    let all_non_positive = amounts.iter().all(|a| *a <= Decimal::ZERO);
    if all_non_negative || all_non_positive {
        let total: Decimal = amounts.iter().sum();
        return if total >= Decimal::ZERO {
            IrrOutcome::NonProfitable
        } else {
            IrrOutcome::TotalLoss
        };
    }

    let mut rate = NEWTON_INITIAL_GUESS;
    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((npv, derivative)) = npv_and_derivative(&amounts, rate) else {
            break;
        };

        if npv.abs() < IRR_TOLERANCE {
            return IrrOutcome::Converged(rate);
        }

        // Near-flat tangent makes the Newton step unsafe
        if derivative.abs() < IRR_TOLERANCE {
            break;
        }

        let Some(step) = npv.checked_div(derivative) else {
            break;
        };
        let new_rate = rate - step;

        if new_rate < RATE_FLOOR || new_rate > NEWTON_RATE_CEILING {
            break;
        }

        if (new_rate - rate).abs() < IRR_TOLERANCE {
            return IrrOutcome::Converged(new_rate);
        }

        rate = new_rate;
    }

    bisection_irr(&amounts)
}

/// NPV(r) = Σ amounts[t] / (1+r)^t and its derivative with respect to
/// r. Returns None when the discount factors leave Decimal range, which
/// sends the caller to the bisection fallback.
fn npv_and_derivative(amounts: &[Money], rate: Rate) -> Option<(Money, Money)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, amount) in amounts.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
            if discount.is_zero() {
                return None;
            }
        }
        npv = npv.checked_add(amount.checked_div(discount)?)?;

        if t > 0 {
            let term = Decimal::from(t as u32)
                .checked_mul(*amount)?
                .checked_div(discount.checked_mul(one_plus_r)?)?;
            derivative = derivative.checked_sub(term)?;
        }
    }

    Some((npv, derivative))
}

/// NPV for the bisection bracket. Close to -100% the discount factors
/// underflow; the latest flow dominates there, so saturate to its sign.
fn bracketed_npv(amounts: &[Money], rate: Rate) -> Money {
    if let Some((npv, _)) = npv_and_derivative(amounts, rate) {
        return npv;
    }
    let dominant = amounts
        .iter()
        .rev()
        .find(|a| !a.is_zero())
        .copied()
        .unwrap_or(Decimal::ZERO);
    if dominant >= Decimal::ZERO {
        Decimal::MAX
    } else {
        Decimal::MIN
    }
}

/// Bisection fallback over [-0.99, 1.0]. Always produces an estimate:
/// `Converged` when the residual is inside tolerance, `BestEffort`
/// otherwise.
fn bisection_irr(amounts: &[Money]) -> IrrOutcome {
    let mut lower = RATE_FLOOR;
    let mut upper = BISECTION_RATE_CEILING;
    let mut mid = (lower + upper) / dec!(2);

    for _ in 0..MAX_IRR_ITERATIONS {
        mid = (lower + upper) / dec!(2);
        let npv = bracketed_npv(amounts, mid);

        if npv.abs() < IRR_TOLERANCE {
            return IrrOutcome::Converged(mid);
        }

        // Positive NPV means the true root sits at a higher discount rate
        if npv > Decimal::ZERO {
            lower = mid;
        } else {
            upper = mid;
        }

        if upper - lower < IRR_TOLERANCE {
            break;
        }
    }

    let residual = bracketed_npv(amounts, mid);
    if residual.abs() < IRR_TOLERANCE {
        IrrOutcome::Converged(mid)
    } else {
        IrrOutcome::BestEffort {
            rate: mid,
            residual,
        }
    }
}
