//! Pricing Engine
//!
//! Pure computation over an input snapshot: cost rollup, tax-inclusive
//! price solve, margin/profit derivation and what-if volume simulation.
//! No I/O and no persistence; the caller decides what subset of the
//! output to save as a catalog snapshot.
//!
//! Two modes with structurally different inputs:
//! - Product: desired margin is an input, price is solved so the margin
//!   fraction of the final price is reserved as profit.
//! - Service: margin is an output, price is built from the seller's
//!   desired hourly compensation plus costs, then grossed up for tax.
//!
//! The time unit is hours throughout. Hourly profit is `profit / hours`
//! in both modes; product output still reports minutes-per-unit for the
//! persisted snapshot, which stores `time_minutes`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Month approximation used by the hours-based volume basis.
///
/// `weekly_hours * 4` is a deliberate simplification, not a
/// calendar-accurate month.
pub const WEEKS_PER_MONTH: f64 = 4.0;

// ============ Input Types ============

/// One line of the fixed monthly cost list (rent, energy, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedCost {
    pub label: String,
    pub amount: f64,
}

/// How monthly production volume is estimated for the product mode.
///
/// The two bases are mutually exclusive: either the user estimates a
/// direct unit count, or the count is derived from available hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum VolumeBasis {
    MonthlyUnits { estimated_units: f64 },
    Hours { weekly_hours: f64, hours_per_unit: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    /// Variable cost components per unit. Absent fields are zero cost,
    /// never a validation error.
    #[serde(default)]
    pub raw_material_unit: f64,
    #[serde(default)]
    pub packaging_unit: f64,
    #[serde(default)]
    pub other_variable_unit: f64,

    #[serde(default)]
    pub fixed_costs: Vec<FixedCost>,

    pub volume: VolumeBasis,

    /// Platform/payment tax as a percentage of the final selling price.
    #[serde(default)]
    pub tax_percent: f64,
    /// Desired profit as a percentage of the final selling price.
    #[serde(default)]
    pub margin_percent: f64,

    /// Hypothetical monthly volume for a secondary profit projection.
    #[serde(default)]
    pub simulation_units: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInput {
    pub hours_per_appointment: f64,
    pub desired_hourly_rate: f64,

    #[serde(default)]
    pub direct_cost_per_appointment: f64,
    #[serde(default)]
    pub fixed_costs: Vec<FixedCost>,
    pub monthly_hours_committed: f64,

    #[serde(default)]
    pub tax_percent: f64,

    #[serde(default)]
    pub appointments_per_month: Option<f64>,
    #[serde(default)]
    pub simulation_appointments: Option<f64>,
}

/// Mode selector, dispatched by exhaustive match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuoteRequest {
    Product(ProductInput),
    Service(ServiceInput),
}

// ============ Output Types ============

#[derive(Debug, Clone, Serialize)]
pub struct ProductQuote {
    pub variable_cost_per_unit: f64,
    pub fixed_cost_monthly: f64,
    pub fixed_cost_per_unit: f64,
    pub total_cost_per_unit: f64,
    /// Breakeven under tax: recovers exactly the cost, zero profit.
    pub minimum_price: f64,
    /// Recovers cost, tax and the desired margin.
    pub ideal_price: f64,
    pub profit_per_unit: f64,
    /// Present only when the hours basis was used.
    pub profit_per_hour: Option<f64>,
    /// Production time per unit in minutes (hours basis only).
    pub time_per_unit_minutes: Option<f64>,
    pub estimated_units: Option<f64>,
    /// Present only when a direct unit estimate was given.
    pub projected_monthly_profit: Option<f64>,
    pub simulated_profit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceQuote {
    /// Seller's desired compensation for the appointment. Embedded in
    /// the price but not counted as a cost.
    pub time_value: f64,
    pub fixed_cost_monthly: f64,
    pub fixed_cost_per_appointment: f64,
    pub total_cost_per_appointment: f64,
    /// Pre-tax base price: time value + direct + fixed per appointment.
    pub minimum_price: f64,
    pub ideal_price: f64,
    pub net_after_tax: f64,
    pub profit_per_appointment: f64,
    /// Derived margin, an output in this mode.
    pub real_margin_percent: f64,
    pub profit_per_hour: f64,
    pub projected_monthly_profit: Option<f64>,
    pub simulated_profit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Quote {
    Product(ProductQuote),
    Service(ServiceQuote),
}

// ============ Errors ============

/// Field-scoped validation failure. Recomputation is cheap and
/// side-effect-free, so the caller corrects the field and retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct PricingError {
    pub field: &'static str,
    pub message: &'static str,
}

impl PricingError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

// ============ Validation ============

/// Positivity checks the calculator form enforces before computing.
///
/// The compute functions themselves are lenient (zero denominators
/// yield zero, not an error); this is the strict layer applied at the
/// API boundary.
pub fn validate(request: &QuoteRequest) -> Result<(), PricingError> {
    match request {
        QuoteRequest::Product(input) => validate_product(input),
        QuoteRequest::Service(input) => validate_service(input),
    }
}

fn validate_product(input: &ProductInput) -> Result<(), PricingError> {
    for (field, value) in [
        ("raw_material_unit", input.raw_material_unit),
        ("packaging_unit", input.packaging_unit),
        ("other_variable_unit", input.other_variable_unit),
    ] {
        if value < 0.0 {
            return Err(PricingError::new(field, "cost must not be negative"));
        }
    }

    match input.volume {
        VolumeBasis::MonthlyUnits { estimated_units } => {
            if estimated_units <= 0.0 {
                return Err(PricingError::new(
                    "estimated_units",
                    "inform a valid monthly quantity or switch to the hours basis",
                ));
            }
        }
        VolumeBasis::Hours {
            weekly_hours,
            hours_per_unit,
        } => {
            if weekly_hours <= 0.0 {
                return Err(PricingError::new(
                    "weekly_hours",
                    "inform how many hours per week you will dedicate",
                ));
            }
            if hours_per_unit <= 0.0 {
                return Err(PricingError::new(
                    "hours_per_unit",
                    "inform how many hours one unit takes to produce",
                ));
            }
        }
    }

    if input.tax_percent / 100.0 + input.margin_percent / 100.0 >= 1.0 {
        return Err(PricingError::new(
            "tax_and_margin",
            "tax plus margin cannot reach 100% of the price",
        ));
    }

    Ok(())
}

fn validate_service(input: &ServiceInput) -> Result<(), PricingError> {
    if input.hours_per_appointment <= 0.0 {
        return Err(PricingError::new(
            "hours_per_appointment",
            "inform how many hours one appointment takes",
        ));
    }
    if input.desired_hourly_rate <= 0.0 {
        return Err(PricingError::new(
            "desired_hourly_rate",
            "inform how much you want to earn per hour",
        ));
    }
    if input.monthly_hours_committed <= 0.0 {
        return Err(PricingError::new(
            "monthly_hours_committed",
            "inform how many monthly hours you will dedicate",
        ));
    }
    if input.tax_percent / 100.0 >= 1.0 {
        return Err(PricingError::new(
            "tax_percent",
            "tax cannot reach 100% of the price",
        ));
    }
    Ok(())
}

// ============ Computation ============

pub fn quote(request: &QuoteRequest) -> Result<Quote, PricingError> {
    match request {
        QuoteRequest::Product(input) => quote_product(input).map(Quote::Product),
        QuoteRequest::Service(input) => quote_service(input).map(Quote::Service),
    }
}

/// Product mode: cost rollup, then solve the price so tax and margin
/// are fractions of the *final* price.
///
/// `price = cost / (1 - tax - margin)` comes from
/// `price = cost + tax*price + margin*price`.
pub fn quote_product(input: &ProductInput) -> Result<ProductQuote, PricingError> {
    let tax = input.tax_percent / 100.0;
    let margin = input.margin_percent / 100.0;

    // Division by zero (or a negative denominator) past this point.
    if tax + margin >= 1.0 {
        return Err(PricingError::new(
            "tax_and_margin",
            "tax plus margin cannot reach 100% of the price",
        ));
    }

    let variable_cost_per_unit =
        input.raw_material_unit + input.packaging_unit + input.other_variable_unit;
    let fixed_cost_monthly: f64 = input.fixed_costs.iter().map(|c| c.amount).sum();

    let (fixed_cost_per_unit, estimated_units, hours_per_unit) = match input.volume {
        VolumeBasis::MonthlyUnits { estimated_units } => {
            let fixed = if estimated_units > 0.0 {
                fixed_cost_monthly / estimated_units
            } else {
                0.0
            };
            let units = (estimated_units > 0.0).then_some(estimated_units);
            (fixed, units, None)
        }
        VolumeBasis::Hours {
            weekly_hours,
            hours_per_unit,
        } => {
            let monthly_hours = weekly_hours * WEEKS_PER_MONTH;
            let fixed_per_hour = if monthly_hours > 0.0 {
                fixed_cost_monthly / monthly_hours
            } else {
                0.0
            };
            (fixed_per_hour * hours_per_unit, None, Some(hours_per_unit))
        }
    };

    let total_cost_per_unit = variable_cost_per_unit + fixed_cost_per_unit;

    let minimum_price = total_cost_per_unit / (1.0 - tax);
    let ideal_price = total_cost_per_unit / (1.0 - tax - margin);
    // Tax is paid on the ideal price actually charged, not the minimum.
    let profit_per_unit = ideal_price - (total_cost_per_unit + tax * ideal_price);

    let profit_per_hour = hours_per_unit
        .filter(|h| *h > 0.0)
        .map(|h| profit_per_unit / h);
    let time_per_unit_minutes = hours_per_unit.map(|h| h * 60.0);

    let projected_monthly_profit = estimated_units.map(|units| profit_per_unit * units);
    let simulated_profit = input
        .simulation_units
        .filter(|units| *units > 0.0)
        .map(|units| profit_per_unit * units);

    Ok(ProductQuote {
        variable_cost_per_unit,
        fixed_cost_monthly,
        fixed_cost_per_unit,
        total_cost_per_unit,
        minimum_price,
        ideal_price,
        profit_per_unit,
        profit_per_hour,
        time_per_unit_minutes,
        estimated_units,
        projected_monthly_profit,
        simulated_profit,
    })
}

/// Service mode: the price is built up from desired compensation and
/// costs, then grossed up so the tax comes out of the final price. The
/// margin is whatever remains, reported as an output.
pub fn quote_service(input: &ServiceInput) -> Result<ServiceQuote, PricingError> {
    let tax = input.tax_percent / 100.0;
    if tax >= 1.0 {
        return Err(PricingError::new(
            "tax_percent",
            "tax cannot reach 100% of the price",
        ));
    }

    let time_value = input.desired_hourly_rate * input.hours_per_appointment;
    let fixed_cost_monthly: f64 = input.fixed_costs.iter().map(|c| c.amount).sum();

    let fixed_per_hour = if input.monthly_hours_committed > 0.0 {
        fixed_cost_monthly / input.monthly_hours_committed
    } else {
        0.0
    };
    let fixed_cost_per_appointment = fixed_per_hour * input.hours_per_appointment;

    let pre_tax_base = time_value + input.direct_cost_per_appointment + fixed_cost_per_appointment;
    let ideal_price = if tax == 0.0 {
        pre_tax_base
    } else {
        pre_tax_base / (1.0 - tax)
    };

    let net_after_tax = ideal_price * (1.0 - tax);
    // Time value is the seller's compensation, already embedded in the
    // price; it is not a cost of delivering the appointment.
    let total_cost_per_appointment =
        input.direct_cost_per_appointment + fixed_cost_per_appointment;
    let profit_per_appointment = net_after_tax - total_cost_per_appointment;

    let real_margin_percent = if ideal_price > 0.0 {
        (profit_per_appointment / ideal_price) * 100.0
    } else {
        0.0
    };
    let profit_per_hour = if input.hours_per_appointment > 0.0 {
        profit_per_appointment / input.hours_per_appointment
    } else {
        0.0
    };

    let projected_monthly_profit = input
        .appointments_per_month
        .filter(|n| *n > 0.0)
        .map(|n| profit_per_appointment * n);
    let simulated_profit = input
        .simulation_appointments
        .filter(|n| *n > 0.0)
        .map(|n| profit_per_appointment * n);

    Ok(ServiceQuote {
        time_value,
        fixed_cost_monthly,
        fixed_cost_per_appointment,
        total_cost_per_appointment,
        minimum_price: pre_tax_base,
        ideal_price,
        net_after_tax,
        profit_per_appointment,
        real_margin_percent,
        profit_per_hour,
        projected_monthly_profit,
        simulated_profit,
    })
}
