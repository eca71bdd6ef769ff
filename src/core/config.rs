use super::types::{Configuration, RentBasis, RentTaxMode};

pub const MONTHS_PER_YEAR: f64 = 12.0;

pub const SHARE_RANGE: (f64, f64) = (0.0, 100.0);
pub const MONTH_RANGE: (f64, f64) = (0.0, MONTHS_PER_YEAR);
/// Growth rates have no ceiling; below -100 % the yearly factor turns negative.
pub const GROWTH_FLOOR: f64 = -100.0;

impl Default for Configuration {
    fn default() -> Self {
        Self {
            price: 2_000_000.0,
            purchase_cost_pct: 5.0,
            annual_inflation_pct: 4.0,
            real_appreciation_pct: 1.0,
            property_tax_pct: 0.2,
            maintenance_months_per_year: 1.0,

            rent_basis: RentBasis::Yield {
                rental_yield_pct: 4.0,
            },
            annual_top_up_buy: 0.0,
            vacancy_months_per_year: 0.0,
            annual_insurance: 0.0,
            monthly_condo_fee: 0.0,
            management_fee_pct: 0.0,
            capex_amount: 0.0,
            capex_interval_years: 0,
            sale_commission_pct: 5.0,
            sale_closing_cost_pct: 1.5,

            rent_tax_mode: RentTaxMode::BlindDeduction,
            blind_deduction_pct: 35.0,
            rent_tax_rate_pct: 20.0,

            monthly_rent_paid: 8_000.0,
            rent_paid_indexed_to_inflation: true,
            investment_rate_pct: 6.0,
            annual_top_up_invest: 0.0,

            interest_tax_rate_pct: 20.0,
            tax_only_real_interest: true,

            years: 10,
        }
    }
}

impl Configuration {
    /// Copy of this configuration with every ranged field forced into its
    /// domain. Both engines call this before their first year.
    pub fn clamped(&self) -> Self {
        let rent_basis = match self.rent_basis {
            RentBasis::Yield { rental_yield_pct } => RentBasis::Yield {
                rental_yield_pct: clamp(rental_yield_pct, SHARE_RANGE),
            },
            RentBasis::Fixed {
                monthly_rent_received,
                indexed_to_inflation,
            } => RentBasis::Fixed {
                monthly_rent_received: monthly_rent_received.max(0.0),
                indexed_to_inflation,
            },
        };

        Self {
            price: self.price.max(0.0),
            purchase_cost_pct: clamp(self.purchase_cost_pct, SHARE_RANGE),
            annual_inflation_pct: self.annual_inflation_pct.max(GROWTH_FLOOR),
            real_appreciation_pct: self.real_appreciation_pct.max(GROWTH_FLOOR),
            property_tax_pct: clamp(self.property_tax_pct, SHARE_RANGE),
            maintenance_months_per_year: clamp(self.maintenance_months_per_year, MONTH_RANGE),

            rent_basis,
            annual_top_up_buy: self.annual_top_up_buy,
            vacancy_months_per_year: clamp(self.vacancy_months_per_year, MONTH_RANGE),
            annual_insurance: self.annual_insurance.max(0.0),
            monthly_condo_fee: self.monthly_condo_fee.max(0.0),
            management_fee_pct: clamp(self.management_fee_pct, SHARE_RANGE),
            capex_amount: self.capex_amount.max(0.0),
            capex_interval_years: self.capex_interval_years,
            sale_commission_pct: clamp(self.sale_commission_pct, SHARE_RANGE),
            sale_closing_cost_pct: clamp(self.sale_closing_cost_pct, SHARE_RANGE),

            rent_tax_mode: self.rent_tax_mode,
            blind_deduction_pct: clamp(self.blind_deduction_pct, SHARE_RANGE),
            rent_tax_rate_pct: clamp(self.rent_tax_rate_pct, SHARE_RANGE),

            monthly_rent_paid: self.monthly_rent_paid.max(0.0),
            rent_paid_indexed_to_inflation: self.rent_paid_indexed_to_inflation,
            investment_rate_pct: self.investment_rate_pct.max(GROWTH_FLOOR),
            annual_top_up_invest: self.annual_top_up_invest,

            interest_tax_rate_pct: clamp(self.interest_tax_rate_pct, SHARE_RANGE),
            tax_only_real_interest: self.tax_only_real_interest,

            years: self.years,
        }
    }

    pub fn purchase_costs(&self) -> f64 {
        self.price * self.purchase_cost_pct / 100.0
    }

    /// Bit-exact encoding of every field, used as a memoisation key.
    pub fn fingerprint(&self) -> Vec<u64> {
        let (basis_kind, basis_amount, basis_indexed) = match self.rent_basis {
            RentBasis::Yield { rental_yield_pct } => (0, rental_yield_pct, false),
            RentBasis::Fixed {
                monthly_rent_received,
                indexed_to_inflation,
            } => (1, monthly_rent_received, indexed_to_inflation),
        };
        let tax_mode = match self.rent_tax_mode {
            RentTaxMode::BlindDeduction => 0,
            RentTaxMode::RealExpenses => 1,
        };

        vec![
            self.price.to_bits(),
            self.purchase_cost_pct.to_bits(),
            self.annual_inflation_pct.to_bits(),
            self.real_appreciation_pct.to_bits(),
            self.property_tax_pct.to_bits(),
            self.maintenance_months_per_year.to_bits(),
            basis_kind,
            basis_amount.to_bits(),
            u64::from(basis_indexed),
            self.annual_top_up_buy.to_bits(),
            self.vacancy_months_per_year.to_bits(),
            self.annual_insurance.to_bits(),
            self.monthly_condo_fee.to_bits(),
            self.management_fee_pct.to_bits(),
            self.capex_amount.to_bits(),
            u64::from(self.capex_interval_years),
            self.sale_commission_pct.to_bits(),
            self.sale_closing_cost_pct.to_bits(),
            tax_mode,
            self.blind_deduction_pct.to_bits(),
            self.rent_tax_rate_pct.to_bits(),
            self.monthly_rent_paid.to_bits(),
            u64::from(self.rent_paid_indexed_to_inflation),
            self.investment_rate_pct.to_bits(),
            self.annual_top_up_invest.to_bits(),
            self.interest_tax_rate_pct.to_bits(),
            u64::from(self.tax_only_real_interest),
            u64::from(self.years),
        ]
    }
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    value.clamp(min, max)
}
