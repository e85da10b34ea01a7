//! Price and currency parsing for storefront text such as `$1,299.99`
//! or `12,50 €`.

/// Parses the first number in `text` as a price
///
/// Both `1,299.99` and `1.299,99` read as 1299.99; a lone comma followed by
/// one or two digits is taken as the decimal separator.
pub fn parse_price(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let raw: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let raw = raw.trim_end_matches([',', '.']);

    let last_comma = raw.rfind(',');
    let last_dot = raw.rfind('.');

    let cleaned = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(c), None) => {
            let decimals = raw.len() - c - 1;
            if raw.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                raw.replace(',', ".")
            } else {
                raw.replace(',', "")
            }
        }
        (None, Some(_)) if raw.matches('.').count() > 1 => raw.replace('.', ""),
        _ => raw.to_string(),
    };

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Reads a JSON price that may be a number or a string
pub fn price_from_json(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(parse_price))
        .filter(|p| p.is_finite() && *p >= 0.0)
}

/// Guesses an ISO currency code from a symbol or code in `text`
pub fn detect_currency(text: &str) -> Option<String> {
    const SYMBOLS: &[(&str, &str)] = &[
        ("US$", "USD"),
        ("C$", "CAD"),
        ("A$", "AUD"),
        ("R$", "BRL"),
        ("$", "USD"),
        ("€", "EUR"),
        ("£", "GBP"),
        ("¥", "JPY"),
        ("₹", "INR"),
        ("₩", "KRW"),
    ];
    const CODES: &[&str] = &[
        "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "CHF", "SEK", "NOK", "DKK", "PLN", "INR", "BRL",
        "MXN",
    ];

    let upper = text.to_ascii_uppercase();
    if let Some(code) = CODES.iter().find(|code| upper.contains(*code)) {
        return Some(code.to_string());
    }

    // Multi-character symbols are listed before the bare ones they contain.
    SYMBOLS
        .iter()
        .find(|(symbol, _)| text.contains(symbol))
        .map(|(_, code)| code.to_string())
}
