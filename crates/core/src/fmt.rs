//! Display formatting helpers shared by alerts and reports.

/// Format a USD amount with thousands grouping and no decimals.
/// `1234567.0` → `"1,234,567"`.
pub fn format_usd(value: f64) -> String {
    let negative = value < 0.0;
    let whole = value.abs().round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Compact USD amount: `2.31B`, `45.20M`, `8.10K`, `0.95`.
pub fn format_usd_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

/// Optional metric for tabular output, `"N/A"` when absent.
pub fn format_opt(value: Option<f64>, unit: Unit) -> String {
    match value {
        Some(v) => match unit {
            Unit::Usd => format!("${}", format_usd_compact(v)),
            Unit::UsdExact => format!("${v:.4}"),
            Unit::Percent => format!("{v:.2}%"),
            Unit::SignedPercent => format!("{v:+.2}%"),
        },
        None => "N/A".to_string(),
    }
}

/// Display unit for [`format_opt`].
#[derive(Debug, Clone, Copy)]
pub enum Unit {
    Usd,
    UsdExact,
    Percent,
    SignedPercent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd(1_234_567.0), "1,234,567");
        assert_eq!(format_usd(999.4), "999");
        assert_eq!(format_usd(0.0), "0");
        assert_eq!(format_usd(-1_000.0), "-1,000");
    }

    #[test]
    fn test_format_usd_compact_scales() {
        assert_eq!(format_usd_compact(2_310_000_000.0), "2.31B");
        assert_eq!(format_usd_compact(45_200_000.0), "45.20M");
        assert_eq!(format_usd_compact(8_100.0), "8.10K");
        assert_eq!(format_usd_compact(0.95), "0.95");
    }

    #[test]
    fn test_format_opt_absent_is_na() {
        assert_eq!(format_opt(None, Unit::Usd), "N/A");
        assert_eq!(format_opt(Some(4.5), Unit::Percent), "4.50%");
        assert_eq!(format_opt(Some(-2.5), Unit::SignedPercent), "-2.50%");
        assert_eq!(format_opt(Some(3.1), Unit::SignedPercent), "+3.10%");
    }
}
