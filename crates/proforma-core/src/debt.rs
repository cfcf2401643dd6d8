use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Rate};

const MONTHS_PER_YEAR: u32 = 12;

/// Terms of a single commercial mortgage. Consumed, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Principal at origination
    pub loan_amount: Money,
    /// Annual interest rate as a decimal (0.065 = 6.5%)
    pub interest_rate: Rate,
    /// Amortization term in years
    pub amortization_years: u32,
    /// Optional interest-only phase at the start of the term.
    /// Values beyond the amortization term are clamped to it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_only_years: Option<u32>,
}

impl LoanTerms {
    fn monthly_rate(&self) -> Rate {
        self.interest_rate / dec!(12)
    }

    fn io_years(&self) -> u32 {
        self.interest_only_years
            .unwrap_or(0)
            .min(self.amortization_years)
    }
}

/// A single month in an amortization schedule. `balance` is the
/// outstanding principal after the payment, clamped at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub month: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub balance: Money,
}

/// Level payment that amortizes `principal` over `total_months` at
/// `monthly_rate`: P * r(1+r)^n / ((1+r)^n - 1). Zero-rate loans fall
/// back to straight-line principal.
fn level_payment(principal: Money, monthly_rate: Rate, total_months: u32) -> Money {
    if principal.is_zero() || total_months == 0 {
        return Decimal::ZERO;
    }
    if monthly_rate.is_zero() {
        return principal / Decimal::from(total_months);
    }

    // (1 + r)^n via iterative multiplication
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound *= Decimal::ONE + monthly_rate;
    }

    principal * monthly_rate * compound / (compound - Decimal::ONE)
}

/// Monthly payment for the fully-amortizing case (no interest-only
/// phase), over the full amortization term.
pub fn monthly_payment(terms: &LoanTerms) -> Money {
    level_payment(
        terms.loan_amount,
        terms.monthly_rate(),
        terms.amortization_years * MONTHS_PER_YEAR,
    )
}

/// Monthly payment during an interest-only phase: principal is
/// untouched, so the payment is pure interest.
pub fn interest_only_payment(terms: &LoanTerms) -> Money {
    terms.loan_amount * terms.interest_rate / dec!(12)
}

/// Annual debt service, averaged over the full amortization term.
///
/// With an interest-only phase the figure blends the IO years and the
/// subsequent amortizing years (balance re-amortized over the remaining
/// term) into a single average annual payment, not the actual
/// first-year payment. Without one it is simply 12x the level payment.
pub fn annual_debt_service(terms: &LoanTerms) -> Money {
    let io_years = terms.io_years();
    if io_years == 0 {
        return monthly_payment(terms) * dec!(12);
    }

    let mut total = interest_only_payment(terms) * dec!(12) * Decimal::from(io_years);

    let remaining_years = terms.amortization_years - io_years;
    if remaining_years > 0 {
        // No principal is repaid during the IO phase, so the balance
        // entering amortization is the original loan amount.
        let amortizing = level_payment(
            terms.loan_amount,
            terms.monthly_rate(),
            remaining_years * MONTHS_PER_YEAR,
        );
        total += amortizing * dec!(12) * Decimal::from(remaining_years);
    }

    total / Decimal::from(terms.amortization_years)
}

/// Full month-by-month amortization schedule: the IO phase first
/// (payment = interest, principal = 0, balance unchanged), then level
/// amortizing payments on the outstanding balance over the remaining
/// years, with the balance clamped at zero in the final months.
pub fn amortization_schedule(terms: &LoanTerms) -> Vec<AmortizationEntry> {
    let monthly_rate = terms.monthly_rate();
    let total_months = terms.amortization_years * MONTHS_PER_YEAR;
    let io_months = terms.io_years() * MONTHS_PER_YEAR;

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut balance = terms.loan_amount;

    let io_pay = interest_only_payment(terms);
    for month in 1..=io_months {
        schedule.push(AmortizationEntry {
            month,
            payment: io_pay,
            principal: Decimal::ZERO,
            interest: io_pay,
            balance,
        });
    }

    let payment = level_payment(balance, monthly_rate, total_months - io_months);
    for month in (io_months + 1)..=total_months {
        let interest = balance * monthly_rate;
        let principal = payment - interest;
        balance = (balance - principal).max(Decimal::ZERO);

        schedule.push(AmortizationEntry {
            month,
            payment,
            principal,
            interest,
            balance,
        });
    }

    schedule
}

/// Outstanding principal after `months` of payments. During the IO
/// phase the balance is the original amount; afterwards it follows the
/// level-payment paydown.
pub fn loan_balance_after(terms: &LoanTerms, months: u32) -> Money {
    let monthly_rate = terms.monthly_rate();
    let total_months = terms.amortization_years * MONTHS_PER_YEAR;
    let io_months = terms.io_years() * MONTHS_PER_YEAR;

    let months = months.min(total_months);
    if months <= io_months {
        return terms.loan_amount;
    }

    let mut balance = terms.loan_amount;
    let payment = level_payment(balance, monthly_rate, total_months - io_months);
    for _ in io_months..months {
        let interest = balance * monthly_rate;
        balance -= payment - interest;
        if balance < Decimal::ZERO {
            return Decimal::ZERO;
        }
    }

    balance
}

/// Debt Service Coverage Ratio: NOI / annual debt service. An unlevered
/// deal has unbounded coverage; rust_decimal has no infinity, so
/// `Decimal::MAX` is the sentinel and callers guard before display.
pub fn calculate_dscr(noi: Money, annual_debt_service: Money) -> Multiple {
    if annual_debt_service.is_zero() {
        return Decimal::MAX;
    }
    noi / annual_debt_service
}

/// Loan-to-Value: loan amount / purchase price.
pub fn calculate_ltv(loan_amount: Money, purchase_price: Money) -> Rate {
    if purchase_price.is_zero() {
        return Decimal::ZERO;
    }
    loan_amount / purchase_price
}
