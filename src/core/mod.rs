mod cache;
mod compare;
mod config;
mod engine;
mod types;

pub use cache::ComparisonCache;
pub use compare::{CHECKPOINT_YEARS, align, checkpoint, checkpoint_report, compare, summarize};
pub use config::{GROWTH_FLOOR, MONTH_RANGE, MONTHS_PER_YEAR, SHARE_RANGE};
pub use engine::{simulate_buy, simulate_invest};
pub use types::{
    BuyScenarioResult, BuyYearRecord, Checkpoint, Comparison, ComparisonSeries, Configuration,
    FlowPoint, InvestScenarioResult, InvestYearRecord, RentBasis, RentTaxMode, Strategy, Summary,
    ValuePoint, YearRecord,
};
