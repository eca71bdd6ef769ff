use super::engine::{simulate_buy, simulate_invest};
use super::types::{
    BuyScenarioResult, Checkpoint, Comparison, ComparisonSeries, Configuration, FlowPoint,
    InvestScenarioResult, Strategy, Summary, ValuePoint, YearRecord,
};

/// Fixed horizons reported alongside the configured one.
pub const CHECKPOINT_YEARS: [u32; 2] = [5, 10];

pub fn compare(config: &Configuration, years: u32) -> Comparison {
    let buy = simulate_buy(config, years);
    let invest = simulate_invest(config, years);
    let series = align(&buy, &invest);
    let summary = summarize(&buy, &invest);

    Comparison {
        years,
        buy,
        invest,
        series,
        summary,
    }
}

pub fn align(buy: &BuyScenarioResult, invest: &InvestScenarioResult) -> ComparisonSeries {
    let len = buy.records.len().max(invest.records.len());
    let mut value_series = Vec::with_capacity(len);
    let mut flow_series = Vec::with_capacity(len);

    for idx in 0..len {
        let year = idx as u32 + 1;
        let buy_total = value_at(&buy.records, idx);
        let invest_total = value_at(&invest.records, idx);
        value_series.push(ValuePoint {
            year,
            buy_total,
            invest_total,
            difference: buy_total - invest_total,
        });
        flow_series.push(FlowPoint {
            year,
            buy_flow: flow_at(&buy.records, idx),
            invest_flow: flow_at(&invest.records, idx),
        });
    }

    ComparisonSeries {
        value_series,
        flow_series,
    }
}

pub fn summarize(buy: &BuyScenarioResult, invest: &InvestScenarioResult) -> Summary {
    let buy_total = buy.net_worth;
    let invest_total = invest.final_capital;
    let difference = buy_total - invest_total;
    // Ties go to buying.
    let winner = if difference >= 0.0 {
        Strategy::Buy
    } else {
        Strategy::Invest
    };

    Summary {
        buy_total,
        invest_total,
        difference,
        winner,
    }
}

/// Summaries at 5 and 10 years and at the configured horizon, in that order.
pub fn checkpoint_report(config: &Configuration) -> Vec<Checkpoint> {
    CHECKPOINT_YEARS
        .iter()
        .copied()
        .chain(std::iter::once(config.years))
        .map(|years| checkpoint(config, years))
        .collect()
}

pub fn checkpoint(config: &Configuration, years: u32) -> Checkpoint {
    Checkpoint::from(&compare(config, years))
}

impl From<&Comparison> for Checkpoint {
    fn from(comparison: &Comparison) -> Self {
        Self {
            years: comparison.years,
            property_value: comparison.buy.final_property_value,
            cash: comparison.buy.final_cash,
            exit_cost: comparison.buy.exit_cost,
            summary: comparison.summary,
        }
    }
}

// Past the end of a shorter series the last known value is held, never
// extrapolated.
fn value_at<R: YearRecord>(records: &[R], idx: usize) -> f64 {
    records
        .get(idx)
        .or_else(|| records.last())
        .map(|record| record.net_worth())
        .unwrap_or(0.0)
}

fn flow_at<R: YearRecord>(records: &[R], idx: usize) -> f64 {
    records.get(idx).map(|record| record.net_flow()).unwrap_or(0.0)
}
