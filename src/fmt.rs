pub fn currency_symbol(code: &str) -> &'static str {
    match code {
        "INR" => "\u{20b9}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        _ => "",
    }
}

/// Format an amount with thousands separators and a currency symbol:
/// money(1234.56, "INR") -> "₹1,234.56"
pub fn money(val: f64, currency: &str) -> String {
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    let sign = if val < 0.0 { "-" } else { "" };
    format!("{sign}{}{grouped}.{dec_part}", currency_symbol(currency))
}
