//! Chilean peso and quantity formatting.

/// Formats an amount as Chilean pesos: `$12.500`.
///
/// Amounts are rounded to whole pesos; thousands are separated with dots.
#[must_use]
pub fn format_clp(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

/// Formats a quantity, dropping a zero fractional part: `10`, `2,5`.
#[must_use]
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        let text = format!("{quantity:.2}");
        text.trim_end_matches('0').replace('.', ",")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}
