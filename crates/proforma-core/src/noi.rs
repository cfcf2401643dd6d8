use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Rate};

/// Income assumptions for a single property year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiInput {
    /// Annual gross rental income
    pub annual_rent: Money,
    /// Annual operating expenses (taxes, insurance, maintenance, management)
    pub operating_expenses: Money,
    /// Vacancy and collection loss rate (e.g. 0.05 = 5%)
    pub vacancy_rate: Rate,
}

/// Net Operating Income: rent after vacancy, minus operating expenses.
/// Floored at zero: a property cannot have negative NOI for
/// underwriting purposes.
pub fn calculate_noi(input: &NoiInput) -> Money {
    let effective_rent = input.annual_rent * (Decimal::ONE - input.vacancy_rate);
    (effective_rent - input.operating_expenses).max(Decimal::ZERO)
}

/// Capitalisation rate: NOI / purchase price. Zero when the price is
/// zero rather than erroring; callers pre-validate prices.
pub fn calculate_cap_rate(noi: Money, purchase_price: Money) -> Rate {
    if purchase_price.is_zero() {
        return Decimal::ZERO;
    }
    noi / purchase_price
}

/// Gross Rent Multiplier: purchase price / annual rent.
pub fn calculate_grm(purchase_price: Money, annual_rent: Money) -> Multiple {
    if annual_rent.is_zero() {
        return Decimal::ZERO;
    }
    purchase_price / annual_rent
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_noi_no_vacancy() {
        let noi = calculate_noi(&NoiInput {
            annual_rent: dec!(108000),
            operating_expenses: dec!(24000),
            vacancy_rate: Decimal::ZERO,
        });
        assert_eq!(noi, dec!(84000));
    }

    #[test]
    fn test_noi_with_vacancy() {
        // (100000 * 0.95) - 20000 = 75000
        let noi = calculate_noi(&NoiInput {
            annual_rent: dec!(100000),
            operating_expenses: dec!(20000),
            vacancy_rate: dec!(0.05),
        });
        assert_eq!(noi, dec!(75000));
    }

    #[test]
    fn test_noi_floored_at_zero() {
        let noi = calculate_noi(&NoiInput {
            annual_rent: dec!(10000),
            operating_expenses: dec!(50000),
            vacancy_rate: Decimal::ZERO,
        });
        assert_eq!(noi, Decimal::ZERO);
    }

    #[test]
    fn test_noi_full_vacancy() {
        let noi = calculate_noi(&NoiInput {
            annual_rent: dec!(60000),
            operating_expenses: dec!(5000),
            vacancy_rate: Decimal::ONE,
        });
        assert_eq!(noi, Decimal::ZERO);
    }

    #[test]
    fn test_cap_rate() {
        let cap = calculate_cap_rate(dec!(84000), dec!(1200000));
        assert_eq!(cap, dec!(0.07));
    }

    #[test]
    fn test_cap_rate_zero_price() {
        assert_eq!(calculate_cap_rate(dec!(84000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_grm() {
        let grm = calculate_grm(dec!(1200000), dec!(108000));
        assert!((grm - dec!(11.111)).abs() < dec!(0.001));
    }

    #[test]
    fn test_grm_zero_rent() {
        assert_eq!(calculate_grm(dec!(1200000), Decimal::ZERO), Decimal::ZERO);
    }
}
