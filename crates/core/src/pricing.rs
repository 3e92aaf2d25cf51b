//! Quote pricing: deliverable roll-ups and version totals.
//!
//! All money arithmetic is carried out in integer cents. Each deliverable's
//! contribution is rounded half-up to the cent on its own, contributions are
//! summed as `i64`, and GST is derived from the cent subtotal with a single
//! final rounding. The summation is therefore order-independent and the same
//! inputs always produce bit-identical outputs.
//!
//! Hours are not money and are never rounded to cents. They are summed in
//! whole micro-hours, and only `rate * hours` is rounded.
//!
//! Sums are checked. A total beyond the range an `f64` holds exactly is
//! reported as an error instead of wrapping.

use serde::{Deserialize, Serialize};

/// Deliverable priced by a single fixed amount.
pub const PRICING_FIXED: &str = "fixed_price";

/// Deliverable priced by `default_client_rate * total_hours`.
pub const PRICING_ROLLED_UP: &str = "rolled_up_hours";

/// All valid pricing mode values.
pub const VALID_PRICING_MODES: &[&str] = &[PRICING_FIXED, PRICING_ROLLED_UP];

/// GST rate applied to new versions when none is given.
pub const DEFAULT_GST_RATE: f64 = 0.10;

/// Absorbs binary representation error (e.g. `1.005 * 100 = 100.4999...`)
/// before rounding to whole cents.
const ROUNDING_NUDGE: f64 = 1e-7;

/// Largest amount, rate, or hour count accepted on input.
pub const MAX_INPUT_VALUE: f64 = 1e12;

/// 2^53: every cent value up to here converts to `f64` exactly.
const MAX_TOTAL_CENTS: i64 = 1 << 53;

const MICRO_HOURS_PER_HOUR: f64 = 1_000_000.0;

const OUT_OF_RANGE: &str = "Quote amounts exceed the supported range";

/// How a deliverable contributes to the version subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    FixedPrice,
    #[default]
    RolledUpHours,
}

impl PricingMode {
    /// Parse a stored pricing mode, returning `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            PRICING_FIXED => Some(Self::FixedPrice),
            PRICING_ROLLED_UP => Some(Self::RolledUpHours),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FixedPrice => PRICING_FIXED,
            Self::RolledUpHours => PRICING_ROLLED_UP,
        }
    }
}

/// Validate that a pricing mode string is one of the accepted values.
pub fn validate_pricing_mode(mode: &str) -> Result<(), String> {
    if VALID_PRICING_MODES.contains(&mode) {
        Ok(())
    } else {
        Err(format!(
            "Invalid pricing_mode '{mode}'. Must be one of: {}",
            VALID_PRICING_MODES.join(", ")
        ))
    }
}

/// Validate a GST rate expressed as a fraction (`0.10` for 10%).
pub fn validate_gst_rate(rate: f64) -> Result<(), String> {
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(format!(
            "gst_rate must be a fraction between 0 and 1, got {rate}"
        ));
    }
    Ok(())
}

/// Validate that an optional money or hours field is finite, non-negative,
/// and at most [`MAX_INPUT_VALUE`].
pub fn validate_non_negative(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || !(0.0..=MAX_INPUT_VALUE).contains(&v) => Err(format!(
            "{field} must be a non-negative number no greater than {MAX_INPUT_VALUE:e}"
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Cent conversion
// ---------------------------------------------------------------------------

/// Convert a dollar amount to whole cents, rounding half-up.
pub fn to_cents(amount: f64) -> i64 {
    if !amount.is_finite() {
        return 0;
    }
    let scaled = amount * 100.0;
    (scaled + scaled.signum() * ROUNDING_NUDGE).round() as i64
}

/// Convert whole cents back to a dollar amount.
pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Round to two decimal places, half-up.
pub fn round2(amount: f64) -> f64 {
    from_cents(to_cents(amount))
}

fn checked_cents(amount: f64) -> Result<i64, String> {
    if amount.is_finite() && (amount * 100.0).abs() <= MAX_TOTAL_CENTS as f64 {
        Ok(to_cents(amount))
    } else {
        Err(OUT_OF_RANGE.to_string())
    }
}

fn add_cents(a: i64, b: i64) -> Result<i64, String> {
    a.checked_add(b)
        .filter(|sum| sum.abs() <= MAX_TOTAL_CENTS)
        .ok_or_else(|| OUT_OF_RANGE.to_string())
}

fn to_micro_hours(hours: f64) -> i64 {
    (hours * MICRO_HOURS_PER_HOUR).round() as i64
}

// ---------------------------------------------------------------------------
// Version totals
// ---------------------------------------------------------------------------

/// GST settings held on a quote version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GstConfig {
    pub gst_enabled: bool,
    pub gst_rate: f64,
}

/// The pricing-relevant fields of one deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeliverableLine {
    pub pricing_mode: PricingMode,
    pub fixed_price_ex_gst: Option<f64>,
    pub default_client_rate: Option<f64>,
    pub total_hours: Option<f64>,
}

/// Derived monetary fields of a quote version.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VersionTotals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// The cent value a single deliverable adds to the version subtotal.
///
/// Missing optional fields count as zero.
pub fn contribution_cents(line: &DeliverableLine) -> Result<i64, String> {
    match line.pricing_mode {
        PricingMode::FixedPrice => checked_cents(line.fixed_price_ex_gst.unwrap_or(0.0)),
        PricingMode::RolledUpHours => checked_cents(
            line.default_client_rate.unwrap_or(0.0) * line.total_hours.unwrap_or(0.0),
        ),
    }
}

/// Compute subtotal, GST and total for a version from its deliverables.
///
/// `tax_amount` is zero whenever GST is disabled, regardless of the rate.
pub fn compute_totals(
    gst: GstConfig,
    lines: &[DeliverableLine],
) -> Result<VersionTotals, String> {
    let subtotal_cents = lines
        .iter()
        .try_fold(0, |acc, line| add_cents(acc, contribution_cents(line)?))?;
    let tax_cents = if gst.gst_enabled {
        checked_cents(from_cents(subtotal_cents) * gst.gst_rate)?
    } else {
        0
    };
    let total_cents = add_cents(subtotal_cents, tax_cents)?;

    Ok(VersionTotals {
        subtotal: from_cents(subtotal_cents),
        tax_amount: from_cents(tax_cents),
        total: from_cents(total_cents),
    })
}

// ---------------------------------------------------------------------------
// Deliverable roll-ups
// ---------------------------------------------------------------------------

/// The pricing-relevant fields of one milestone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MilestoneLine {
    pub hours: Option<f64>,
    pub is_billable: bool,
    pub client_rate: Option<f64>,
    pub cost_rate: Option<f64>,
}

/// Deliverable-level aggregates derived from its milestones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeliverableRollup {
    /// Billable hours across milestones, or the deliverable's default hours
    /// when it has no milestones.
    pub total_hours: f64,
    /// Internal cost: every milestone's hours at its cost rate.
    pub total_cost: f64,
    /// What the client pays for this deliverable (its subtotal contribution).
    pub client_value: f64,
    pub margin: f64,
    /// `None` when the client value is zero.
    pub margin_percent: Option<f64>,
}

/// Deliverable fields consulted by [`rollup_deliverable`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeliverableDefaults {
    pub pricing_mode: PricingMode,
    pub fixed_price_ex_gst: Option<f64>,
    pub default_client_rate: Option<f64>,
    pub default_hours: Option<f64>,
}

/// Roll milestone hours and costs up to their deliverable.
pub fn rollup_deliverable(
    deliverable: DeliverableDefaults,
    milestones: &[MilestoneLine],
) -> Result<DeliverableRollup, String> {
    let micro_hours = if milestones.is_empty() {
        to_micro_hours(deliverable.default_hours.unwrap_or(0.0))
    } else {
        milestones
            .iter()
            .filter(|m| m.is_billable)
            .try_fold(0i64, |acc, m| acc.checked_add(to_micro_hours(m.hours.unwrap_or(0.0))))
            .ok_or_else(|| OUT_OF_RANGE.to_string())?
    };

    let cost_cents = milestones.iter().try_fold(0, |acc, m| {
        add_cents(
            acc,
            checked_cents(m.hours.unwrap_or(0.0) * m.cost_rate.unwrap_or(0.0))?,
        )
    })?;

    let total_hours = micro_hours as f64 / MICRO_HOURS_PER_HOUR;
    let value_cents = contribution_cents(&DeliverableLine {
        pricing_mode: deliverable.pricing_mode,
        fixed_price_ex_gst: deliverable.fixed_price_ex_gst,
        default_client_rate: deliverable.default_client_rate,
        total_hours: Some(total_hours),
    })?;
    let margin_cents = value_cents - cost_cents;

    let margin_percent = if value_cents == 0 {
        None
    } else {
        Some(round2(margin_cents as f64 / value_cents as f64 * 100.0))
    };

    Ok(DeliverableRollup {
        total_hours,
        total_cost: from_cents(cost_cents),
        client_value: from_cents(value_cents),
        margin: from_cents(margin_cents),
        margin_percent,
    })
}
