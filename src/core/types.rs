use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RentTaxMode {
    BlindDeduction,
    RealExpenses,
}

/// How the buy scenario derives the rent it collects.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RentBasis {
    /// Annual rent is a share of the property's current value.
    #[serde(rename_all = "camelCase")]
    Yield { rental_yield_pct: f64 },
    /// Rent is a fixed monthly amount, optionally indexed to inflation.
    #[serde(rename_all = "camelCase")]
    Fixed {
        monthly_rent_received: f64,
        indexed_to_inflation: bool,
    },
}

/// Every parameter of one comparison. Percent fields are in percent units
/// (`4.0` means 4 %); the engines divide by 100 themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub price: f64,
    pub purchase_cost_pct: f64,
    pub annual_inflation_pct: f64,
    pub real_appreciation_pct: f64,
    pub property_tax_pct: f64,
    pub maintenance_months_per_year: f64,

    pub rent_basis: RentBasis,
    pub annual_top_up_buy: f64,
    pub vacancy_months_per_year: f64,
    pub annual_insurance: f64,
    pub monthly_condo_fee: f64,
    pub management_fee_pct: f64,
    pub capex_amount: f64,
    pub capex_interval_years: u32,
    pub sale_commission_pct: f64,
    pub sale_closing_cost_pct: f64,

    pub rent_tax_mode: RentTaxMode,
    pub blind_deduction_pct: f64,
    pub rent_tax_rate_pct: f64,

    pub monthly_rent_paid: f64,
    pub rent_paid_indexed_to_inflation: bool,
    pub investment_rate_pct: f64,
    pub annual_top_up_invest: f64,

    pub interest_tax_rate_pct: f64,
    pub tax_only_real_interest: bool,

    pub years: u32,
}

/// Common view over the per-year rows of either scenario.
pub trait YearRecord {
    fn year(&self) -> u32;
    fn net_flow(&self) -> f64;
    fn net_worth(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyYearRecord {
    pub year: u32,
    pub gross_rent: f64,
    pub collected_rent: f64,
    pub maintenance: f64,
    pub property_tax: f64,
    pub management_fee: f64,
    pub insurance: f64,
    pub condo_fee: f64,
    pub capex: f64,
    pub rent_tax_base: f64,
    pub rent_tax: f64,
    pub top_up: f64,
    pub net_flow: f64,
    pub property_value: f64,
    pub cash: f64,
    pub total: f64,
}

impl YearRecord for BuyYearRecord {
    fn year(&self) -> u32 {
        self.year
    }

    fn net_flow(&self) -> f64 {
        self.net_flow
    }

    fn net_worth(&self) -> f64 {
        self.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestYearRecord {
    pub year: u32,
    pub interest: f64,
    pub real_interest: f64,
    pub interest_tax_base: f64,
    pub interest_tax: f64,
    pub rent_paid: f64,
    pub top_up: f64,
    pub net_flow: f64,
    pub capital: f64,
}

impl YearRecord for InvestYearRecord {
    fn year(&self) -> u32 {
        self.year
    }

    fn net_flow(&self) -> f64 {
        self.net_flow
    }

    fn net_worth(&self) -> f64 {
        self.capital
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyScenarioResult {
    pub records: Vec<BuyYearRecord>,
    pub final_property_value: f64,
    pub final_cash: f64,
    /// Property plus cash, before selling costs.
    pub gross_net_worth: f64,
    pub exit_cost: f64,
    /// Gross net worth minus exit cost; the figure compared against investing.
    pub net_worth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestScenarioResult {
    pub records: Vec<InvestYearRecord>,
    pub final_capital: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuePoint {
    pub year: u32,
    pub buy_total: f64,
    pub invest_total: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPoint {
    pub year: u32,
    pub buy_flow: f64,
    pub invest_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSeries {
    pub value_series: Vec<ValuePoint>,
    pub flow_series: Vec<FlowPoint>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Buy,
    Invest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub buy_total: f64,
    pub invest_total: f64,
    pub difference: f64,
    pub winner: Strategy,
}

/// Terminal summary at one horizon, with the buy-side breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub years: u32,
    pub property_value: f64,
    pub cash: f64,
    pub exit_cost: f64,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub years: u32,
    pub buy: BuyScenarioResult,
    pub invest: InvestScenarioResult,
    pub series: ComparisonSeries,
    pub summary: Summary,
}
