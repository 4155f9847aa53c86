//! Statement summaries: TTM, annual and quarterly rows plus the balance sheet.
//!
//! Monetary totals are scaled to billions and then converted with the
//! resolved rate. Per-share figures are converted but not scaled.

use chrono::Datelike;
use fundamentals_market_data::{FinancialStatement, StatementPeriod};

use super::model::{BalanceSheetSummary, PeriodFinancials};
use crate::fx::ResolvedRate;

const BILLION: f64 = 1e9;
const TTM_QUARTERS: usize = 4;
const ANNUAL_PERIODS: usize = 3;
const QUARTERLY_PERIODS: usize = 8;

const REVENUE: &str = "TotalRevenue";
const NET_INCOME: &str = "NetIncome";
const OPERATING_INCOME: &str = "OperatingIncome";
const DILUTED_EPS: &str = "DilutedEPS";
const FREE_CASH_FLOW: &str = "FreeCashFlow";

const TOTAL_ASSETS: &[&str] = &["TotalAssets"];
const TOTAL_LIABILITIES: &[&str] = &["TotalLiabilitiesNetMinorityInterest"];
const TOTAL_EQUITY: &[&str] = &["StockholdersEquity", "TotalEquityGrossMinorityInterest"];
const CURRENT_DEBT: &[&str] = &["CurrentDebt", "CurrentDebtAndCapitalLeaseObligation"];
const LONG_TERM_DEBT: &[&str] = &["LongTermDebt", "LongTermDebtAndCapitalLeaseObligation"];
const TOTAL_DEBT: &[&str] = &["TotalDebt"];
const CASH: &[&str] = &[
    "CashCashEquivalentsAndShortTermInvestments",
    "CashAndCashEquivalents",
];
const TANGIBLE_BOOK_VALUE: &[&str] = &["TangibleBookValue"];
const SHARES: &[&str] = &["OrdinarySharesNumber"];

fn billions(value: f64, rate: &ResolvedRate) -> f64 {
    rate.apply(value / BILLION)
}

/// Line item value, `0` when the period does not report it. NaN is kept and
/// left to the response sanitizer.
fn item(period: &StatementPeriod, name: &str) -> f64 {
    period.value(name).unwrap_or(0.0)
}

fn finite_item(period: &StatementPeriod, name: &str) -> f64 {
    period.value(name).filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn finite_first(period: &StatementPeriod, names: &[&str]) -> f64 {
    period
        .first_value(names)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Free cash flow reported for the same period end as `period`.
fn matching_fcf(cash_flow: &FinancialStatement, period: &StatementPeriod) -> f64 {
    cash_flow
        .period(period.as_of)
        .map(|p| finite_item(p, FREE_CASH_FLOW))
        .unwrap_or(0.0)
}

fn period_row(
    period: &StatementPeriod,
    cash_flow: &FinancialStatement,
    rate: &ResolvedRate,
) -> PeriodFinancials {
    PeriodFinancials {
        period: period.as_of.format("%Y-%m-%d").to_string(),
        quarter: None,
        fiscal_year: period.as_of.year(),
        revenue: billions(item(period, REVENUE), rate),
        net_income: billions(item(period, NET_INCOME), rate),
        eps: rate.apply(finite_item(period, DILUTED_EPS)),
        operating_income: billions(item(period, OPERATING_INCOME), rate),
        free_cash_flow: billions(matching_fcf(cash_flow, period), rate),
    }
}

/// Calendar quarter label (`Q1`..`Q4`) for a period ending in `month`.
pub fn quarter_label(month: u32) -> String {
    format!("Q{}", (month.clamp(1, 12) - 1) / 3 + 1)
}

/// Trailing twelve months from the latest four quarters.
///
/// Missing or non-finite quarter values count as zero. Returns `None` unless
/// revenue or operating income comes out positive.
pub fn ttm_row(
    quarterly_income: &FinancialStatement,
    quarterly_cash_flow: &FinancialStatement,
    trailing_eps: f64,
    fiscal_year: i32,
    rate: &ResolvedRate,
) -> Option<PeriodFinancials> {
    let quarters = quarterly_income.recent(TTM_QUARTERS);
    let sum = |name: &str| -> f64 { quarters.iter().map(|q| finite_item(q, name)).sum() };

    let revenue = sum(REVENUE);
    let net_income = sum(NET_INCOME);
    let operating_income = sum(OPERATING_INCOME);
    let free_cash_flow: f64 = quarterly_cash_flow
        .recent(TTM_QUARTERS)
        .iter()
        .map(|q| finite_item(q, FREE_CASH_FLOW))
        .sum();

    if revenue <= 0.0 && operating_income <= 0.0 {
        return None;
    }

    Some(PeriodFinancials {
        period: "TTM".to_string(),
        quarter: None,
        fiscal_year,
        revenue: billions(revenue, rate),
        net_income: billions(net_income, rate),
        eps: if trailing_eps.is_finite() { trailing_eps } else { 0.0 },
        operating_income: billions(operating_income, rate),
        free_cash_flow: billions(free_cash_flow, rate),
    })
}

/// Up to three most recent fiscal years, FCF matched by period end date.
pub fn annual_rows(
    income: &FinancialStatement,
    cash_flow: &FinancialStatement,
    rate: &ResolvedRate,
) -> Vec<PeriodFinancials> {
    income
        .recent(ANNUAL_PERIODS)
        .iter()
        .map(|period| period_row(period, cash_flow, rate))
        .collect()
}

/// Up to eight most recent quarters, each labelled with its calendar quarter.
pub fn quarterly_rows(
    income: &FinancialStatement,
    cash_flow: &FinancialStatement,
    rate: &ResolvedRate,
) -> Vec<PeriodFinancials> {
    income
        .recent(QUARTERLY_PERIODS)
        .iter()
        .map(|period| PeriodFinancials {
            quarter: Some(quarter_label(period.as_of.month())),
            ..period_row(period, cash_flow, rate)
        })
        .collect()
}

/// Summary of the latest annual balance sheet; all zeros when there is none.
pub fn balance_sheet_summary(
    balance_sheet: &FinancialStatement,
    rate: &ResolvedRate,
) -> BalanceSheetSummary {
    let Some(latest) = balance_sheet.latest() else {
        return BalanceSheetSummary::default();
    };

    let total_equity = finite_first(latest, TOTAL_EQUITY);
    let total_debt = match (
        latest.first_value(CURRENT_DEBT),
        latest.first_value(LONG_TERM_DEBT),
    ) {
        (None, None) => finite_first(latest, TOTAL_DEBT),
        _ => finite_first(latest, CURRENT_DEBT) + finite_first(latest, LONG_TERM_DEBT),
    };

    let shares = finite_first(latest, SHARES);
    let per_share = |total: f64| -> f64 {
        if shares > 0.0 {
            rate.apply(total / shares)
        } else {
            0.0
        }
    };

    BalanceSheetSummary {
        total_assets: billions(finite_first(latest, TOTAL_ASSETS), rate),
        total_liabilities: billions(finite_first(latest, TOTAL_LIABILITIES), rate),
        total_equity: billions(total_equity, rate),
        book_value_per_share: per_share(total_equity),
        tangible_book_value_per_share: per_share(finite_first(latest, TANGIBLE_BOOK_VALUE)),
        total_debt: billions(total_debt, rate),
        cash: billions(finite_first(latest, CASH), rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::RateSource;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quarter(as_of: NaiveDate, revenue: f64, net: f64, operating: f64) -> StatementPeriod {
        StatementPeriod::new(as_of)
            .with_item(REVENUE, revenue)
            .with_item(NET_INCOME, net)
            .with_item(OPERATING_INCOME, operating)
    }

    fn fcf(as_of: NaiveDate, value: f64) -> StatementPeriod {
        StatementPeriod::new(as_of).with_item(FREE_CASH_FLOW, value)
    }

    fn quarterly_income() -> FinancialStatement {
        FinancialStatement::from_periods(vec![
            quarter(date(2024, 3, 31), 10e9, 1e9, 2e9),
            quarter(date(2024, 6, 30), 11e9, 1e9, 2e9),
            quarter(date(2024, 9, 30), 12e9, 1e9, 2e9),
            quarter(date(2024, 12, 31), 13e9, 1e9, 2e9),
            quarter(date(2023, 12, 31), 100e9, 100e9, 100e9),
        ])
    }

    fn cny() -> ResolvedRate {
        ResolvedRate {
            rate: 1.0 / 7.0,
            source: RateSource::Fallback,
        }
    }

    #[test]
    fn test_quarter_label() {
        assert_eq!(quarter_label(1), "Q1");
        assert_eq!(quarter_label(3), "Q1");
        assert_eq!(quarter_label(4), "Q2");
        assert_eq!(quarter_label(9), "Q3");
        assert_eq!(quarter_label(12), "Q4");
    }

    #[test]
    fn test_ttm_sums_latest_four_quarters() {
        let cash = FinancialStatement::from_periods(vec![
            fcf(date(2024, 12, 31), 1e9),
            fcf(date(2024, 9, 30), f64::NAN),
            fcf(date(2024, 6, 30), 1e9),
        ]);

        let row = ttm_row(
            &quarterly_income(),
            &cash,
            6.1,
            2025,
            &ResolvedRate::identity(),
        )
        .unwrap();

        assert_eq!(row.period, "TTM");
        assert_eq!(row.fiscal_year, 2025);
        assert_relative_eq!(row.revenue, 46.0, epsilon = 1e-9);
        assert_relative_eq!(row.net_income, 4.0, epsilon = 1e-9);
        assert_relative_eq!(row.operating_income, 8.0, epsilon = 1e-9);
        assert_relative_eq!(row.free_cash_flow, 2.0, epsilon = 1e-9);
        assert_eq!(row.eps, 6.1);
    }

    #[test]
    fn test_ttm_omitted_without_positive_revenue_or_operating_income() {
        let income = FinancialStatement::from_periods(vec![quarter(
            date(2024, 12, 31),
            0.0,
            -1e9,
            -2e9,
        )]);
        let none = FinancialStatement::default();

        assert!(ttm_row(&income, &none, 0.0, 2025, &ResolvedRate::identity()).is_none());
        assert!(ttm_row(&none, &none, 0.0, 2025, &ResolvedRate::identity()).is_none());
    }

    #[test]
    fn test_annual_rows_match_fcf_by_date_and_convert() {
        let income = FinancialStatement::from_periods(vec![
            quarter(date(2021, 12, 31), 70e9, 7e9, 14e9),
            quarter(date(2022, 12, 31), 70e9, 7e9, 14e9),
            quarter(date(2023, 12, 31), 70e9, 7e9, 14e9),
            quarter(date(2024, 12, 31), 700e9, 70e9, 140e9),
        ]);
        let cash = FinancialStatement::from_periods(vec![fcf(date(2023, 12, 31), 35e9)]);

        let rows = annual_rows(&income, &cash, &cny());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].period, "2024-12-31");
        assert_eq!(rows[0].fiscal_year, 2024);
        assert!(rows[0].quarter.is_none());
        assert_relative_eq!(rows[0].revenue, 100.0, epsilon = 1e-9);
        assert_eq!(rows[0].free_cash_flow, 0.0);
        assert_relative_eq!(rows[1].free_cash_flow, 5.0, epsilon = 1e-9);
        assert_eq!(rows[2].period, "2022-12-31");
    }

    #[test]
    fn test_missing_line_items_read_as_zero_and_nan_is_kept() {
        let income = FinancialStatement::from_periods(vec![StatementPeriod::new(date(
            2024, 12, 31,
        ))
        .with_item(NET_INCOME, f64::NAN)]);

        let rows = annual_rows(&income, &FinancialStatement::default(), &cny());

        assert_eq!(rows[0].revenue, 0.0);
        assert!(rows[0].net_income.is_nan());
    }

    #[test]
    fn test_quarterly_rows_are_labelled() {
        let rows = quarterly_rows(
            &quarterly_income(),
            &FinancialStatement::default(),
            &ResolvedRate::identity(),
        );

        assert_eq!(rows.len(), 5);
        let labels: Vec<_> = rows.iter().filter_map(|r| r.quarter.as_deref()).collect();
        assert_eq!(labels, vec!["Q4", "Q3", "Q2", "Q1", "Q4"]);
        assert_eq!(rows[4].fiscal_year, 2023);
    }

    #[test]
    fn test_quarterly_rows_capped_at_eight() {
        let periods = (1..=12)
            .map(|m| quarter(date(2022, m, 28), 1e9, 0.0, 0.0))
            .collect();
        let income = FinancialStatement::from_periods(periods);

        let rows = quarterly_rows(
            &income,
            &FinancialStatement::default(),
            &ResolvedRate::identity(),
        );

        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].period, "2022-12-28");
    }

    #[test]
    fn test_balance_sheet_uses_alternative_names() {
        let sheet = FinancialStatement::from_periods(vec![
            StatementPeriod::new(date(2024, 12, 31))
                .with_item("TotalAssets", 70e9)
                .with_item("TotalLiabilitiesNetMinorityInterest", f64::NAN)
                .with_item("TotalEquityGrossMinorityInterest", 35e9)
                .with_item("TangibleBookValue", 14e9)
                .with_item("CurrentDebtAndCapitalLeaseObligation", 7e9)
                .with_item("LongTermDebt", 14e9)
                .with_item("CashAndCashEquivalents", 21e9)
                .with_item("OrdinarySharesNumber", 1e9),
            StatementPeriod::new(date(2023, 12, 31)).with_item("TotalAssets", 1.0),
        ]);

        let summary = balance_sheet_summary(&sheet, &cny());

        assert_relative_eq!(summary.total_assets, 10.0, epsilon = 1e-9);
        assert_eq!(summary.total_liabilities, 0.0);
        assert_relative_eq!(summary.total_equity, 5.0, epsilon = 1e-9);
        assert_relative_eq!(summary.total_debt, 3.0, epsilon = 1e-9);
        assert_relative_eq!(summary.cash, 3.0, epsilon = 1e-9);
        assert_relative_eq!(summary.book_value_per_share, 5.0, epsilon = 1e-9);
        assert_relative_eq!(summary.tangible_book_value_per_share, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_balance_sheet_total_debt_fallback() {
        let sheet = FinancialStatement::from_periods(vec![
            StatementPeriod::new(date(2024, 12, 31)).with_item("TotalDebt", 4e9)
        ]);

        let summary = balance_sheet_summary(&sheet, &ResolvedRate::identity());

        assert_relative_eq!(summary.total_debt, 4.0, epsilon = 1e-9);
        assert_eq!(summary.book_value_per_share, 0.0);
    }

    #[test]
    fn test_empty_balance_sheet() {
        let summary = balance_sheet_summary(&FinancialStatement::default(), &cny());
        assert_eq!(summary, BalanceSheetSummary::default());
    }
}
