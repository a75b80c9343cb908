/// Coerces an optional text field into a number.
///
/// Returns `default` when the field is absent, blank after trimming, not a
/// number, or not finite. Never fails.
pub fn safe_parse_float(raw: Option<&str>, default: Option<f64>) -> Option<f64> {
    let trimmed = match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return default,
    };

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => default,
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is zero.
pub fn margin_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }

    let pct = numerator / denominator * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// `value` when it is finite, otherwise `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Percentage change from `previous` to `current`; `None` when there is no
/// comparison value or it is zero.
pub fn growth_pct(current: f64, previous: Option<f64>) -> Option<f64> {
    let previous = previous.filter(|p| *p != 0.0)?;
    let pct = (current - previous) / previous * 100.0;
    pct.is_finite().then_some(pct)
}

/// Actual-minus-plan difference and that difference as a percentage of plan.
///
/// Both are `None` without a plan value; the percentage alone is `None` when the
/// plan is exactly zero.
pub fn variance(actual: f64, plan: Option<f64>) -> (Option<f64>, Option<f64>) {
    match plan {
        None => (None, None),
        Some(plan) => {
            let absolute = actual - plan;
            let pct = if plan == 0.0 {
                None
            } else {
                Some(absolute / plan * 100.0).filter(|p| p.is_finite())
            };
            (Some(absolute).filter(|a| a.is_finite()), pct)
        }
    }
}

/// Yields the three values only when every one of them is present.
pub fn all_present(a: Option<f64>, b: Option<f64>, c: Option<f64>) -> Option<(f64, f64, f64)> {
    Some((a?, b?, c?))
}
