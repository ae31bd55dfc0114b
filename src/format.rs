// display helpers for amounts and calendar months (en-IN conventions)

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn round(amt: f64, dec: f64) -> f64 {
    if amt == 0. {
        0.
    } else {
        (amt * 10_f64.powf(dec)).round() / 10_f64.powf(dec)
    }
}

/// Rupee amount rounded to whole units, e.g. `₹12,34,568`.
pub fn format_currency(amount: f64) -> String {
    with_sign(amount, |abs| {
        format!("₹{}", group_indian(&format!("{:.0}", round(abs, 0.))))
    })
}

/// Rupee amount with paise, e.g. `₹9,650.22`.
pub fn format_currency_detailed(amount: f64) -> String {
    with_sign(amount, |abs| {
        let fixed = format!("{:.2}", round(abs, 2.));
        let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        format!("₹{}.{}", group_indian(whole), frac)
    })
}

/// Plain grouped integer, e.g. `10,00,000`.
pub fn format_number(num: f64) -> String {
    with_sign(num, |abs| group_indian(&format!("{:.0}", round(abs, 0.))))
}

pub fn format_month_year(month: u32, year: i32) -> String {
    match MONTH_NAMES.get((month as usize).wrapping_sub(1)) {
        Some(name) => format!("{} {}", name, year),
        None => format!("{:02}/{}", month, year),
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

fn with_sign(amount: f64, body: impl FnOnce(f64) -> String) -> String {
    let text = body(amount.abs());
    // -0.4 rounds to zero and must not print as "-₹0"
    if amount < 0. && text.chars().any(|c| matches!(c, '1'..='9')) {
        format!("-{}", text)
    } else {
        text
    }
}

// Indian grouping: the last three digits, then pairs (12,34,56,789).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_round() {
        assert_eq!(round(9650.2165, 2.), 9650.22);
        assert_eq!(round(0., 4.), 0.);
        assert_eq!(round(1799.86914, 4.), 1799.8691);
    }

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_number(999.), "999");
        assert_eq!(format_number(1000.), "1,000");
        assert_eq!(format_number(100000.), "1,00,000");
        assert_eq!(format_number(12345678.4), "1,23,45,678");
        assert_eq!(format_number(-2500.), "-2,500");
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(1000000.), "₹10,00,000");
        assert_eq!(format_currency(1234567.8), "₹12,34,568");
        assert_eq!(format_currency_detailed(9650.2165), "₹9,650.22");
        assert_eq!(format_currency_detailed(0.5), "₹0.50");
        assert_eq!(format_currency(-0.2), "₹0");
        assert_eq!(format_currency(-1500.), "-₹1,500");
    }

    #[test]
    fn test_halves_round_away_from_zero() {
        assert_eq!(format_currency(2.5), "₹3");
        assert_eq!(format_currency(-2.5), "-₹3");
        assert_eq!(format_currency_detailed(0.125), "₹0.13");
        assert_eq!(format_number(1000.5), "1,001");
    }

    #[test]
    fn test_month_year_and_percentage() {
        assert_eq!(format_month_year(1, 2024), "Jan 2024");
        assert_eq!(format_month_year(12, 2030), "Dec 2030");
        assert_eq!(format_month_year(13, 2030), "13/2030");
        assert_eq!(format_percentage(8.5), "8.50%");
    }
}
