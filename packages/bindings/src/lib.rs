use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use proforma_core::debt::{self, LoanTerms};
use proforma_core::metrics;
use proforma_core::returns::{self, CashFlowProjection};
use proforma_core::types::CashFlowPoint;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[napi]
pub fn investment_metrics(input_json: String) -> NapiResult<String> {
    let input: metrics::InvestmentInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::calculate_investment_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct QuickInput {
    purchase_price: rust_decimal::Decimal,
    annual_rent: rust_decimal::Decimal,
    operating_expenses: rust_decimal::Decimal,
}

#[napi]
pub fn quick_metrics(input_json: String) -> NapiResult<String> {
    let input: QuickInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = metrics::quick_metrics(
        input.purchase_price,
        input.annual_rent,
        input.operating_expenses,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn annual_debt_service(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debt::annual_debt_service(&terms);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debt::amortization_schedule(&terms);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn cash_flow_series(input_json: String) -> NapiResult<String> {
    let projection: CashFlowProjection =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = returns::build_cash_flow_series(&projection);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn irr(input_json: String) -> NapiResult<String> {
    let series: Vec<CashFlowPoint> = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let outcome = returns::calculate_irr(&series);
    serde_json::to_string(&outcome.rate()).map_err(to_napi_error)
}
