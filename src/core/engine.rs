use tracing::debug;

use super::config::MONTHS_PER_YEAR;
use super::types::{
    BuyScenarioResult, BuyYearRecord, Configuration, InvestScenarioResult, InvestYearRecord,
    RentBasis, RentTaxMode,
};

/// Cost levels of the owned property that index with inflation between years.
#[derive(Debug)]
struct PropertyState {
    value: f64,
    cash: f64,
    fixed_monthly_rent: f64,
    insurance: f64,
    condo_fee: f64,
    capex: f64,
}

impl PropertyState {
    fn gross_annual_rent(&self, basis: &RentBasis) -> f64 {
        match *basis {
            RentBasis::Yield { rental_yield_pct } => self.value * rental_yield_pct / 100.0,
            RentBasis::Fixed { .. } => self.fixed_monthly_rent * MONTHS_PER_YEAR,
        }
    }

    fn advance(&mut self, config: &Configuration, inflation: f64, appreciation: f64) {
        self.value *= (1.0 + inflation) * (1.0 + appreciation);
        index_if_nonzero(&mut self.insurance, inflation);
        index_if_nonzero(&mut self.condo_fee, inflation);
        index_if_nonzero(&mut self.capex, inflation);
        if let RentBasis::Fixed {
            indexed_to_inflation: true,
            ..
        } = config.rent_basis
        {
            self.fixed_monthly_rent *= 1.0 + inflation;
        }
    }
}

pub fn simulate_buy(config: &Configuration, years: u32) -> BuyScenarioResult {
    let config = config.clamped();
    let inflation = config.annual_inflation_pct / 100.0;
    let appreciation = config.real_appreciation_pct / 100.0;
    let property_tax_rate = config.property_tax_pct / 100.0;
    let management_rate = config.management_fee_pct / 100.0;
    let rent_tax_rate = config.rent_tax_rate_pct / 100.0;
    let collection_factor =
        (MONTHS_PER_YEAR - config.vacancy_months_per_year) / MONTHS_PER_YEAR;

    let mut state = PropertyState {
        value: config.price,
        cash: -config.purchase_costs(),
        fixed_monthly_rent: match config.rent_basis {
            RentBasis::Fixed {
                monthly_rent_received,
                ..
            } => monthly_rent_received,
            RentBasis::Yield { .. } => 0.0,
        },
        insurance: config.annual_insurance,
        condo_fee: config.monthly_condo_fee,
        capex: config.capex_amount,
    };

    let mut records = Vec::new();
    for year in 1..=years {
        let gross_rent = state.gross_annual_rent(&config.rent_basis);
        let collected_rent = gross_rent * collection_factor;
        let maintenance = gross_rent / MONTHS_PER_YEAR * config.maintenance_months_per_year;
        let property_tax = state.value * property_tax_rate;
        let management_fee = collected_rent * management_rate;
        let insurance = state.insurance;
        let condo_fee = state.condo_fee * MONTHS_PER_YEAR;
        let capex = if capex_due(year, config.capex_interval_years) {
            state.capex
        } else {
            0.0
        };

        let rent_tax_base = rent_tax_base(&config, collected_rent, maintenance, property_tax);
        let rent_tax = rent_tax_base * rent_tax_rate;

        let net_flow = collected_rent
            - maintenance
            - property_tax
            - management_fee
            - insurance
            - condo_fee
            - capex
            - rent_tax
            + config.annual_top_up_buy;
        state.cash += net_flow;

        records.push(BuyYearRecord {
            year,
            gross_rent,
            collected_rent,
            maintenance,
            property_tax,
            management_fee,
            insurance,
            condo_fee,
            capex,
            rent_tax_base,
            rent_tax,
            top_up: config.annual_top_up_buy,
            net_flow,
            property_value: state.value,
            cash: state.cash,
            total: state.value + state.cash,
        });

        state.advance(&config, inflation, appreciation);
    }

    // Terminal figures are the closing values of the last recorded year,
    // not the state already advanced into the following year.
    let (final_property_value, final_cash) = records
        .last()
        .map(|r| (r.property_value, r.cash))
        .unwrap_or((config.price, -config.purchase_costs()));
    let gross_net_worth = final_property_value + final_cash;
    let exit_cost = final_property_value
        * (config.sale_commission_pct + config.sale_closing_cost_pct)
        / 100.0;
    let net_worth = gross_net_worth - exit_cost;

    debug!(
        years,
        final_property_value, final_cash, exit_cost, net_worth, "buy scenario simulated"
    );

    BuyScenarioResult {
        records,
        final_property_value,
        final_cash,
        gross_net_worth,
        exit_cost,
        net_worth,
    }
}

pub fn simulate_invest(config: &Configuration, years: u32) -> InvestScenarioResult {
    let config = config.clamped();
    let inflation = config.annual_inflation_pct / 100.0;
    let rate = config.investment_rate_pct / 100.0;
    let tax_rate = config.interest_tax_rate_pct / 100.0;

    // The purchase costs are invested too, since they were never spent.
    let mut capital = config.price + config.purchase_costs();
    let mut monthly_rent = config.monthly_rent_paid;

    let mut records = Vec::new();
    for year in 1..=years {
        let interest = capital * rate;
        // Linear approximation of the real return, kept on purpose.
        let real_interest = interest - capital * inflation;
        let interest_tax_base = if config.tax_only_real_interest {
            real_interest
        } else {
            interest
        }
        .max(0.0);
        let interest_tax = interest_tax_base * tax_rate;

        let rent_paid = monthly_rent * MONTHS_PER_YEAR;
        let net_flow = interest + config.annual_top_up_invest - rent_paid - interest_tax;
        capital += net_flow;

        records.push(InvestYearRecord {
            year,
            interest,
            real_interest,
            interest_tax_base,
            interest_tax,
            rent_paid,
            top_up: config.annual_top_up_invest,
            net_flow,
            capital,
        });

        if config.rent_paid_indexed_to_inflation {
            monthly_rent *= 1.0 + inflation;
        }
    }

    debug!(years, final_capital = capital, "invest scenario simulated");

    InvestScenarioResult {
        records,
        final_capital: capital,
    }
}

fn rent_tax_base(
    config: &Configuration,
    collected_rent: f64,
    maintenance: f64,
    property_tax: f64,
) -> f64 {
    match config.rent_tax_mode {
        RentTaxMode::BlindDeduction => {
            collected_rent * (1.0 - config.blind_deduction_pct / 100.0)
        }
        RentTaxMode::RealExpenses => collected_rent - maintenance - property_tax,
    }
    .max(0.0)
}

fn capex_due(year: u32, interval: u32) -> bool {
    interval > 0 && year % interval == 0
}

fn index_if_nonzero(level: &mut f64, inflation: f64) {
    if *level != 0.0 {
        *level *= 1.0 + inflation;
    }
}
