//! Valuation ratios and data quality heuristics derived from the info record.

use fundamentals_market_data::{FinancialStatement, InstrumentInfo};

use super::model::{DataQualityFlags, Ratios, SummaryRatios};

const DEBT_TO_EQUITY_CEILING: f64 = 200.0;
const PB_CEILING: f64 = 100.0;
const PE_CEILING: f64 = 200.0;
const CURRENT_RATIO_FLOOR: f64 = 0.5;
const CURRENT_RATIO_CEILING: f64 = 50.0;

/// Numeric field treated the way the report expects: absent, non-numeric or
/// non-finite all read as `0`.
fn field(info: &InstrumentInfo, key: &str) -> f64 {
    info.get_f64(key).filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn percent(info: &InstrumentInfo, key: &str) -> f64 {
    field(info, key) * 100.0
}

/// Trailing P/E, falling back to forward P/E when trailing is missing or zero.
fn price_to_earnings(info: &InstrumentInfo) -> f64 {
    let trailing = field(info, "trailingPE");
    if trailing != 0.0 {
        trailing
    } else {
        field(info, "forwardPE")
    }
}

/// EBIT over interest expense for the latest annual period, `0` when either
/// side is missing, NaN or zero.
pub fn interest_coverage(income: &FinancialStatement) -> f64 {
    let Some(latest) = income.latest() else {
        return 0.0;
    };
    match (latest.value("EBIT"), latest.value("InterestExpense")) {
        (Some(ebit), Some(interest))
            if ebit.is_finite() && interest.is_finite() && ebit != 0.0 && interest != 0.0 =>
        {
            ebit / interest
        }
        _ => 0.0,
    }
}

pub fn compute_ratios(info: &InstrumentInfo, interest_coverage: f64) -> Ratios {
    Ratios {
        pe: price_to_earnings(info),
        pb: field(info, "priceToBook"),
        ps: field(info, "priceToSalesTrailing12Months"),
        current_ratio: field(info, "currentRatio"),
        debt_to_equity: field(info, "debtToEquity"),
        interest_coverage,
        roe: percent(info, "returnOnEquity"),
        roic: percent(info, "returnOnCapital"),
        roa: percent(info, "returnOnAssets"),
        gross_margin: percent(info, "grossMargins"),
        operating_margin: percent(info, "operatingMargins"),
        net_margin: percent(info, "profitMargins"),
        dividend_yield: percent(info, "dividendYield"),
        revenue_growth: field(info, "revenueGrowth"),
        earnings_growth: field(info, "earningsGrowth"),
    }
}

/// Flags are evaluated on the raw info fields, except `interestCoverageZero`
/// which looks at the coverage actually reported.
pub fn quality_flags(info: &InstrumentInfo, ratios: &Ratios) -> DataQualityFlags {
    let trailing_pe = field(info, "trailingPE");
    let forward_pe = field(info, "forwardPE");
    let pb = field(info, "priceToBook");
    let current_ratio = field(info, "currentRatio");

    DataQualityFlags {
        debt_to_equity_anomalous: field(info, "debtToEquity") > DEBT_TO_EQUITY_CEILING,
        roic_zero: ratios.roic == 0.0,
        interest_coverage_zero: ratios.interest_coverage == 0.0,
        pe_negative: trailing_pe < 0.0 || forward_pe < 0.0,
        market_cap_zero: field(info, "marketCap") == 0.0,
        pb_anomalous: !(0.0..=PB_CEILING).contains(&pb),
        pe_anomalous: trailing_pe > PE_CEILING,
        roe_negative: ratios.roe < 0.0,
        current_ratio_anomalous: !(CURRENT_RATIO_FLOOR..=CURRENT_RATIO_CEILING)
            .contains(&current_ratio),
    }
}

/// Ratio subset for basic mode. P/E here is trailing only.
pub fn summary_ratios(info: &InstrumentInfo) -> SummaryRatios {
    SummaryRatios {
        pe: field(info, "trailingPE"),
        pb: field(info, "priceToBook"),
        ps: field(info, "priceToSalesTrailing12Months"),
        roe: percent(info, "returnOnEquity"),
        roa: percent(info, "returnOnAssets"),
        dividend_yield: percent(info, "dividendYield"),
    }
}
