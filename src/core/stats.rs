//! Numeric helpers for cross-caller statistics
//!
//! Values are rendered the way the merged files have always carried them:
//! rounded to two decimals, with integral values keeping one decimal
//! place (`22.5`, `15.0`, `0.33`).

use log::debug;

/// Round to two decimal places, exact halves to the even neighbour
///
/// A tie is only a tie if the unrounded product is one: `0.125` rounds
/// to `0.12`, while `2.675` (stored just below) rounds to `2.67`.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if (scaled - scaled.trunc()).abs() != 0.5 {
        return scaled.round() / 100.0;
    }
    // sign of the rounding error in `scaled` breaks the apparent tie
    let residual = value.mul_add(100.0, -scaled);
    let rounded = if residual > 0.0 {
        scaled.ceil()
    } else if residual < 0.0 {
        scaled.floor()
    } else {
        2.0 * (scaled / 2.0).round()
    };
    rounded / 100.0
}

/// Render a value rounded to two decimals
pub fn format_decimal(value: f64) -> String {
    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Parse a comma-separated list of numbers; `None` if any component is not numeric
pub fn parse_components(value: &str) -> Option<Vec<f64>> {
    value
        .split(',')
        .map(|v| v.trim().parse::<f64>().ok().filter(|f| f.is_finite()))
        .collect()
}

/// Mean and standard deviation of one column across contributors
///
/// Each contributor value may be a comma-separated list (per-allele
/// counts); statistics are taken elementwise over the shortest list.
/// Non-numeric contributors are skipped. With a single numeric
/// contributor its value passes through verbatim and the deviation
/// is `.`.
pub fn column_summary(values: &[&str]) -> (String, String) {
    let numeric: Vec<(&str, Vec<f64>)> = values
        .iter()
        .filter_map(|raw| match parse_components(raw) {
            Some(parsed) => Some((*raw, parsed)),
            None => {
                debug!("Skipping non-numeric value '{}' in statistics", raw);
                None
            }
        })
        .collect();

    match numeric.len() {
        0 => (".".to_string(), ".".to_string()),
        1 => (numeric[0].0.to_string(), ".".to_string()),
        _ => {
            let width = numeric.iter().map(|(_, v)| v.len()).min().unwrap_or(0);
            let mut means = Vec::with_capacity(width);
            let mut sds = Vec::with_capacity(width);
            for i in 0..width {
                let column: Vec<f64> = numeric.iter().map(|(_, v)| v[i]).collect();
                means.push(mean(&column).map(format_decimal).unwrap_or_else(|| ".".to_string()));
                sds.push(sample_sd(&column).map(format_decimal).unwrap_or_else(|| ".".to_string()));
            }
            (means.join(","), sds.join(","))
        }
    }
}
