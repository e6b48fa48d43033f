//! Calculation request and result types.
//!
//! Operations mirror the HR calculator tools: the projection and leave
//! balance cases plus the payroll breakdown family. Operands are fully
//! structured before evaluation; the parser rejects anything incomplete
//! back to the knowledge path rather than guessing.

use serde::{Deserialize, Serialize};

use std::fmt;

/// A fully-parsed calculator operation with numeric operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcOperation {
    /// `principal * (1 + rate * periods)`.
    SalaryProjection {
        principal: f64,
        rate: f64,
        periods: f64,
    },
    /// `min(accrued, cap) - taken`, floored at zero.
    LeaveBalance { accrued: f64, taken: f64, cap: f64 },
    /// Component split of a gross salary (basic 31.25%, allowances from basic).
    SalaryBreakdown { gross: f64 },
    /// Festival bonus: 50% of gross at six months service, prorated before.
    EidBonus { gross: f64, months_served: f64 },
    /// Late-arrival deduction from the threshold table.
    LateDeduction { late_days: u32, daily_salary: f64 },
    /// Flat-rate deduction per unmet work hour.
    LossHourDeduction { hours: f64 },
    /// Encashment of unused quarterly leave, capped at four days.
    LeaveEncashment { unused_days: f64, daily_wage: f64 },
    /// Provident fund entitlement by years of service.
    ProvidentFund { years: f64, basic: f64 },
}

impl CalcOperation {
    /// Short name used in logs and answer metadata.
    pub fn name(&self) -> &'static str {
        match self {
            CalcOperation::SalaryProjection { .. } => "salary_projection",
            CalcOperation::LeaveBalance { .. } => "leave_balance",
            CalcOperation::SalaryBreakdown { .. } => "salary_breakdown",
            CalcOperation::EidBonus { .. } => "eid_bonus",
            CalcOperation::LateDeduction { .. } => "late_deduction",
            CalcOperation::LossHourDeduction { .. } => "loss_hour_deduction",
            CalcOperation::LeaveEncashment { .. } => "leave_encashment",
            CalcOperation::ProvidentFund { .. } => "provident_fund",
        }
    }
}

impl fmt::Display for CalcOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A calculator request extracted from an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub operation: CalcOperation,
}

/// Deterministic result of evaluating a [`CalculationRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Headline numeric value, rounded to 2 decimal places, half-up.
    pub value: f64,
    /// User-facing summary including component lines where applicable.
    pub summary: String,
}
