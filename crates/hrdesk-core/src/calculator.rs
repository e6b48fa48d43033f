//! Deterministic HR arithmetic.
//!
//! Parses structured calculation requests out of an utterance and evaluates
//! them with fixed, auditable formulas. Every result is rounded to 2 decimal
//! places, half-up. A request with any missing or non-numeric operand is not
//! evaluated: `parse` returns `None` and the orchestrator reroutes the
//! message to the knowledge path.

use std::sync::LazyLock;

use regex::Regex;

use hrdesk_types::calc::{CalcOperation, CalculationRequest, CalculationResult};

/// Round to 2 decimal places, half-up.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").unwrap());
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent)").unwrap());
static RATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rate\s*(?:of\s*)?(\d+(?:\.\d+)?)").unwrap());
static PRINCIPAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"principal\s*(?:of\s*)?(\d+(?:,\d{3})*(?:\.\d+)?)").unwrap()
});
static PERIOD_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:years?|yrs?|periods?)\b").unwrap()
});
static PERIOD_NAMED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"periods?\s*(?:of\s*)?(\d+(?:\.\d+)?)").unwrap());
static MONTHS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*months?\b").unwrap());
static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*years?\b").unwrap());
static DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*days?\b").unwrap());
static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)\b").unwrap());
static DAILY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"daily\s+(?:salary|wage|rate)\s*(?:of\s*|is\s*)?(\d+(?:,\d{3})*(?:\.\d+)?)")
        .unwrap()
});
static GROSS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"gross\s*(?:salary\s*)?(?:of\s*|is\s*)?(\d+(?:,\d{3})*(?:\.\d+)?)").unwrap()
});
static BASIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"basic\s*(?:salary\s*)?(?:of\s*|is\s*)?(\d+(?:,\d{3})*(?:\.\d+)?)").unwrap()
});
static ACCRUED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:accrued|earned)\s*(?:of\s*|:\s*)?(\d+(?:\.\d+)?)").unwrap()
});
static TAKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:taken|used)\s*(?:of\s*|:\s*)?(\d+(?:\.\d+)?)").unwrap()
});
static CAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:cap|maximum|max)\s*(?:of\s*|is\s*|:\s*)?(\d+(?:\.\d+)?)").unwrap()
});
static LATE_DAYS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:late\s*days?|days?\s*late)").unwrap()
});
// "late" must stand alone: "calculate" contains it as a substring.
static LATE_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\blate\b").unwrap());

/// A numeric token with its position, so named patterns can claim it and
/// positional fallbacks only see what remains.
#[derive(Debug)]
struct NumberToken {
    value: f64,
    start: usize,
    end: usize,
    consumed: bool,
}

fn number_tokens(text: &str) -> Vec<NumberToken> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| {
            m.as_str()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .map(|value| NumberToken {
                    value,
                    start: m.start(),
                    end: m.end(),
                    consumed: false,
                })
        })
        .collect()
}

/// Claim the number matched by `re`'s first capture group, if any token
/// overlaps the capture and is still free.
fn take_pattern(re: &Regex, text: &str, tokens: &mut [NumberToken]) -> Option<f64> {
    let caps = re.captures(text)?;
    let group = caps.get(1)?;
    for token in tokens.iter_mut() {
        if !token.consumed && token.start >= group.start() && token.end <= group.end() {
            token.consumed = true;
            return Some(token.value);
        }
    }
    None
}

/// Claim the first unconsumed number.
fn take_first_free(tokens: &mut [NumberToken]) -> Option<f64> {
    for token in tokens.iter_mut() {
        if !token.consumed {
            token.consumed = true;
            return Some(token.value);
        }
    }
    None
}

/// Claim the first unconsumed number strictly between 0 and 1 (a rate
/// written as a decimal fraction).
fn take_free_fraction(tokens: &mut [NumberToken]) -> Option<f64> {
    for token in tokens.iter_mut() {
        if !token.consumed && token.value > 0.0 && token.value < 1.0 {
            token.consumed = true;
            return Some(token.value);
        }
    }
    None
}

fn free_values(tokens: &[NumberToken]) -> Vec<f64> {
    tokens
        .iter()
        .filter(|t| !t.consumed)
        .map(|t| t.value)
        .collect()
}

/// Extract a structured calculation request from an utterance.
///
/// Returns `None` whenever an operand is missing or non-numeric; partial
/// financial answers are never produced.
pub fn parse(utterance: &str) -> Option<CalculationRequest> {
    let text = utterance.to_lowercase();

    let operation = if text.contains("projection")
        || (text.contains("project") && text.contains("salary"))
    {
        parse_projection(&text)?
    } else if text.contains("leave balance")
        || text.contains("remaining leave")
        || text.contains("leave remaining")
    {
        parse_leave_balance(&text)?
    } else if text.contains("breakdown") {
        parse_breakdown(&text)?
    } else if text.contains("encash") {
        parse_encashment(&text)?
    } else if text.contains("provident") {
        parse_provident(&text)?
    } else if text.contains("loss hour") {
        parse_loss_hours(&text)?
    } else if LATE_WORD_RE.is_match(&text) {
        parse_late_deduction(&text)?
    } else if text.contains("bonus") {
        parse_eid_bonus(&text)?
    } else {
        return None;
    };

    Some(CalculationRequest { operation })
}

fn parse_projection(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let rate = take_pattern(&PERCENT_RE, text, &mut tokens)
        .map(|v| v / 100.0)
        .or_else(|| take_pattern(&RATE_RE, text, &mut tokens))
        .or_else(|| take_free_fraction(&mut tokens))?;
    let periods = take_pattern(&PERIOD_UNIT_RE, text, &mut tokens)
        .or_else(|| take_pattern(&PERIOD_NAMED_RE, text, &mut tokens))?;
    let principal = take_pattern(&PRINCIPAL_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::SalaryProjection {
        principal,
        rate,
        periods,
    })
}

fn parse_leave_balance(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let accrued = take_pattern(&ACCRUED_RE, text, &mut tokens);
    let taken = take_pattern(&TAKEN_RE, text, &mut tokens);
    let cap = take_pattern(&CAP_RE, text, &mut tokens);

    match (accrued, taken, cap) {
        (Some(accrued), Some(taken), Some(cap)) => {
            Some(CalcOperation::LeaveBalance { accrued, taken, cap })
        }
        _ => {
            // Positional fallback only when the shape is unambiguous.
            let free = free_values(&tokens);
            if accrued.is_none() && taken.is_none() && cap.is_none() && free.len() == 3 {
                Some(CalcOperation::LeaveBalance {
                    accrued: free[0],
                    taken: free[1],
                    cap: free[2],
                })
            } else {
                None
            }
        }
    }
}

fn parse_breakdown(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let gross = take_pattern(&GROSS_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::SalaryBreakdown { gross })
}

fn parse_eid_bonus(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let months_served = take_pattern(&MONTHS_RE, text, &mut tokens)?;
    let gross = take_pattern(&GROSS_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::EidBonus {
        gross,
        months_served,
    })
}

fn parse_late_deduction(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let late_days = take_pattern(&LATE_DAYS_RE, text, &mut tokens)
        .or_else(|| take_pattern(&DAYS_RE, text, &mut tokens))?;
    if late_days.fract() != 0.0 || late_days < 0.0 {
        return None;
    }
    let daily_salary = take_pattern(&DAILY_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::LateDeduction {
        late_days: late_days as u32,
        daily_salary,
    })
}

fn parse_loss_hours(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let hours = take_pattern(&HOURS_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::LossHourDeduction { hours })
}

fn parse_encashment(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let unused_days = take_pattern(&DAYS_RE, text, &mut tokens)?;
    let daily_wage = take_pattern(&DAILY_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::LeaveEncashment {
        unused_days,
        daily_wage,
    })
}

fn parse_provident(text: &str) -> Option<CalcOperation> {
    let mut tokens = number_tokens(text);
    let years = take_pattern(&YEARS_RE, text, &mut tokens)?;
    let basic = take_pattern(&BASIC_RE, text, &mut tokens)
        .or_else(|| take_first_free(&mut tokens))?;
    Some(CalcOperation::ProvidentFund { years, basic })
}

/// Late-arrival deduction table: late days threshold to days of salary
/// deducted. The highest reached threshold applies.
const LATE_DEDUCTION_TABLE: &[(u32, f64)] = &[
    (3, 0.5),
    (5, 1.0),
    (8, 2.0),
    (10, 3.0),
    (13, 3.5),
    (15, 4.0),
    (18, 5.0),
];

/// Deduction per unmet work hour.
const LOSS_HOUR_RATE: f64 = 80.0;

/// Maximum encashable unused leave days per quarter.
const MAX_ENCASHABLE_DAYS: f64 = 4.0;

/// Evaluate a parsed calculation request.
///
/// Deterministic: the same request always yields the same rounded result.
pub fn evaluate(request: &CalculationRequest) -> CalculationResult {
    match &request.operation {
        CalcOperation::SalaryProjection {
            principal,
            rate,
            periods,
        } => {
            let value = round2(principal * (1.0 + rate * periods));
            CalculationResult {
                value,
                summary: format!(
                    "Projected amount: {value:.2} (principal {principal:.2} at rate {rate} over {periods} period(s))"
                ),
            }
        }
        CalcOperation::LeaveBalance { accrued, taken, cap } => {
            let value = round2((accrued.min(*cap) - taken).max(0.0));
            CalculationResult {
                value,
                summary: format!(
                    "Remaining leave: {value:.2} days (accrued {accrued}, taken {taken}, policy cap {cap})"
                ),
            }
        }
        CalcOperation::SalaryBreakdown { gross } => {
            let basic = round2(gross * 0.3125);
            let house_rent = round2(basic * 1.0);
            let medical = round2(basic * 0.6);
            let transport = round2(basic * 0.35);
            let mobile = round2(basic * 0.15);
            let internet = round2(basic * 0.10);
            let total = round2(basic + house_rent + medical + transport + mobile + internet);
            CalculationResult {
                value: total,
                summary: format!(
                    "Salary breakdown for gross {gross:.2}:\n\
                     - Basic: {basic:.2} (31.25% of gross)\n\
                     - House rent: {house_rent:.2} (100% of basic)\n\
                     - Medical: {medical:.2} (60% of basic)\n\
                     - Transport: {transport:.2} (35% of basic)\n\
                     - Mobile: {mobile:.2} (15% of basic)\n\
                     - Internet: {internet:.2} (10% of basic)\n\
                     Total: {total:.2}"
                ),
            }
        }
        CalcOperation::EidBonus {
            gross,
            months_served,
        } => {
            if *months_served >= 6.0 {
                let value = round2(gross * 0.5);
                CalculationResult {
                    value,
                    summary: format!(
                        "Eid bonus: {value:.2} (50% of gross salary at 6+ months of service)"
                    ),
                }
            } else {
                let value = round2(gross * 0.25 * months_served / 6.0);
                CalculationResult {
                    value,
                    summary: format!(
                        "Eid bonus: {value:.2} (prorated for {months_served} months of service)"
                    ),
                }
            }
        }
        CalcOperation::LateDeduction {
            late_days,
            daily_salary,
        } => {
            let mut days_deducted = 0.0;
            for (threshold, days) in LATE_DEDUCTION_TABLE {
                if late_days >= threshold {
                    days_deducted = *days;
                }
            }
            if days_deducted == 0.0 {
                CalculationResult {
                    value: 0.0,
                    summary: format!(
                        "No deduction for {late_days} late days (fewer than 3)."
                    ),
                }
            } else {
                let value = round2(daily_salary * days_deducted);
                CalculationResult {
                    value,
                    summary: format!(
                        "Late deduction: {value:.2} ({days_deducted} days of salary for {late_days} late days)"
                    ),
                }
            }
        }
        CalcOperation::LossHourDeduction { hours } => {
            let value = round2(hours * LOSS_HOUR_RATE);
            CalculationResult {
                value,
                summary: format!(
                    "Loss hour deduction: {value:.2} ({hours} hours at {LOSS_HOUR_RATE} per hour)"
                ),
            }
        }
        CalcOperation::LeaveEncashment {
            unused_days,
            daily_wage,
        } => {
            let encashable = unused_days.min(MAX_ENCASHABLE_DAYS);
            let value = round2(encashable * daily_wage);
            let note = if *unused_days > MAX_ENCASHABLE_DAYS {
                " (capped at 4 days per quarter)"
            } else {
                ""
            };
            CalculationResult {
                value,
                summary: format!(
                    "Leave encashment: {value:.2} for {encashable} days at {daily_wage:.2} daily wage{note}"
                ),
            }
        }
        CalcOperation::ProvidentFund { years, basic } => {
            if *years < 3.0 {
                CalculationResult {
                    value: 0.0,
                    summary:
                        "Provident fund requires at least 3 years of continuous service."
                            .to_string(),
                }
            } else {
                let months_entitled = if *years <= 10.0 { years * 1.0 } else { years * 1.5 };
                let value = round2(basic * months_entitled);
                CalculationResult {
                    value,
                    summary: format!(
                        "Provident fund: {value:.2} ({months_entitled} months of basic salary for {years} years of service)"
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(52500.0), 52500.0);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(2.346), 2.35);
        // Exactly-representable halves round up
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_projection_example() {
        let request = CalculationRequest {
            operation: CalcOperation::SalaryProjection {
                principal: 50000.0,
                rate: 0.05,
                periods: 1.0,
            },
        };
        let result = evaluate(&request);
        assert_eq!(result.value, 52500.00);
        assert!(result.summary.contains("52500.00"));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let request = CalculationRequest {
            operation: CalcOperation::SalaryBreakdown { gross: 25000.0 },
        };
        let first = evaluate(&request);
        let second = evaluate(&request);
        assert_eq!(first.value, second.value);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_parse_projection_with_percent() {
        let request =
            parse("Project my salary of 50000 at 5% for 1 year please").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::SalaryProjection {
                principal: 50000.0,
                rate: 0.05,
                periods: 1.0,
            }
        );
    }

    #[test]
    fn test_parse_projection_with_decimal_rate() {
        let request =
            parse("salary projection: principal 50000, rate 0.05, period 1").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::SalaryProjection {
                principal: 50000.0,
                rate: 0.05,
                periods: 1.0,
            }
        );
    }

    #[test]
    fn test_parse_projection_missing_periods_rejected() {
        assert!(parse("Project my salary of 50000 at 5%").is_none());
    }

    #[test]
    fn test_parse_leave_balance_named() {
        let request =
            parse("What is my leave balance? Accrued 12, taken 5, cap 16").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::LeaveBalance {
                accrued: 12.0,
                taken: 5.0,
                cap: 16.0,
            }
        );
    }

    #[test]
    fn test_parse_leave_balance_positional() {
        let request = parse("leave balance with 12 8 16").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::LeaveBalance {
                accrued: 12.0,
                taken: 8.0,
                cap: 16.0,
            }
        );
    }

    #[test]
    fn test_parse_leave_balance_incomplete_rejected() {
        assert!(parse("what's my leave balance?").is_none());
        assert!(parse("leave balance accrued 12 taken 5").is_none());
    }

    #[test]
    fn test_leave_balance_floors_at_zero_and_caps() {
        let result = evaluate(&CalculationRequest {
            operation: CalcOperation::LeaveBalance {
                accrued: 20.0,
                taken: 3.0,
                cap: 16.0,
            },
        });
        // Accrued above cap counts only up to the cap
        assert_eq!(result.value, 13.0);

        let exhausted = evaluate(&CalculationRequest {
            operation: CalcOperation::LeaveBalance {
                accrued: 4.0,
                taken: 9.0,
                cap: 16.0,
            },
        });
        assert_eq!(exhausted.value, 0.0);
    }

    #[test]
    fn test_parse_breakdown() {
        let request = parse("calculate salary breakdown for gross 25000").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::SalaryBreakdown { gross: 25000.0 }
        );
    }

    #[test]
    fn test_breakdown_components() {
        let result = evaluate(&CalculationRequest {
            operation: CalcOperation::SalaryBreakdown { gross: 25000.0 },
        });
        assert!(result.summary.contains("Basic: 7812.50"));
        assert!(result.summary.contains("House rent: 7812.50"));
        assert!(result.summary.contains("Medical: 4687.50"));
    }

    #[test]
    fn test_parse_eid_bonus() {
        let request = parse("calculate eid bonus for gross 25000 with 8 months served").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::EidBonus {
                gross: 25000.0,
                months_served: 8.0,
            }
        );
        let result = evaluate(&request);
        assert_eq!(result.value, 12500.0);
    }

    #[test]
    fn test_eid_bonus_prorated_under_six_months() {
        let result = evaluate(&CalculationRequest {
            operation: CalcOperation::EidBonus {
                gross: 30000.0,
                months_served: 4.0,
            },
        });
        // 30000 * 0.25 * 4 / 6
        assert_eq!(result.value, 5000.0);
    }

    #[test]
    fn test_late_deduction_thresholds() {
        let cases = [(2u32, 0.0), (3, 0.5), (5, 1.0), (9, 2.0), (18, 5.0), (25, 5.0)];
        for (late_days, expected_days) in cases {
            let result = evaluate(&CalculationRequest {
                operation: CalcOperation::LateDeduction {
                    late_days,
                    daily_salary: 1000.0,
                },
            });
            assert_eq!(
                result.value,
                expected_days * 1000.0,
                "late_days {late_days} should deduct {expected_days} days"
            );
        }
    }

    #[test]
    fn test_parse_late_deduction() {
        let request = parse("calculate deduction for 5 late days, daily salary 1000").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::LateDeduction {
                late_days: 5,
                daily_salary: 1000.0,
            }
        );
    }

    #[test]
    fn test_loss_hours() {
        let request = parse("calculate loss hour deduction for 15 hours").unwrap();
        let result = evaluate(&request);
        assert_eq!(result.value, 1200.0);
    }

    #[test]
    fn test_encashment_capped_at_four_days() {
        let result = evaluate(&CalculationRequest {
            operation: CalcOperation::LeaveEncashment {
                unused_days: 6.0,
                daily_wage: 800.0,
            },
        });
        assert_eq!(result.value, 3200.0);
        assert!(result.summary.contains("capped"));
    }

    #[test]
    fn test_provident_fund_tiers() {
        let under = evaluate(&CalculationRequest {
            operation: CalcOperation::ProvidentFund {
                years: 2.0,
                basic: 10000.0,
            },
        });
        assert_eq!(under.value, 0.0);

        let mid = evaluate(&CalculationRequest {
            operation: CalcOperation::ProvidentFund {
                years: 5.0,
                basic: 10000.0,
            },
        });
        assert_eq!(mid.value, 50000.0);

        let senior = evaluate(&CalculationRequest {
            operation: CalcOperation::ProvidentFund {
                years: 12.0,
                basic: 15000.0,
            },
        });
        assert_eq!(senior.value, 270000.0);
    }

    #[test]
    fn test_parse_provident() {
        let request = parse("calculate provident fund for 5 years, basic salary 10000").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::ProvidentFund {
                years: 5.0,
                basic: 10000.0,
            }
        );
    }

    #[test]
    fn test_non_calculator_text_rejected() {
        assert!(parse("What is the sick leave policy?").is_none());
        assert!(parse("Who is the COO?").is_none());
    }

    #[test]
    fn test_calculate_does_not_trigger_late_branch() {
        // "calculate" contains "late" as a substring; it must not parse as
        // a late deduction
        assert!(parse("calculate something with 5 days at 1000").is_none());
    }

    #[test]
    fn test_comma_grouped_numbers() {
        let request = parse("salary breakdown for gross 1,250,000").unwrap();
        assert_eq!(
            request.operation,
            CalcOperation::SalaryBreakdown { gross: 1_250_000.0 }
        );
    }
}
