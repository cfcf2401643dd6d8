use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ProformaError;
use crate::types::{Money, Rate};
use crate::ProformaResult;

/// Net Present Value of a series of annual cash flows, index 0 being
/// today (undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProformaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(ProformaError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Present Value of a single future amount: FV / (1 + r)^n
pub fn present_value(future: Money, rate: Rate, periods: u32) -> Money {
    let mut discount = Decimal::ONE;
    for _ in 0..periods {
        discount *= Decimal::ONE + rate;
    }
    if discount.is_zero() {
        return Decimal::ZERO;
    }
    future / discount
}

/// Future Value of a single present amount: PV * (1 + r)^n
pub fn future_value(present: Money, rate: Rate, periods: u32) -> Money {
    let mut compound = Decimal::ONE;
    for _ in 0..periods {
        compound *= Decimal::ONE + rate;
    }
    present * compound
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_npv_rate_floor() {
        assert!(npv(dec!(-1), &[dec!(-100), dec!(200)]).is_err());
    }

    #[test]
    fn test_present_future_round_trip() {
        let pv = present_value(dec!(1100), dec!(0.10), 1);
        assert_eq!(pv, dec!(1000));
        let fv = future_value(pv, dec!(0.10), 1);
        assert!((fv - dec!(1100)).abs() < dec!(0.0000001));
    }
}
