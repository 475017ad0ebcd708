/// Decimal places used for a price of this magnitude.
pub fn price_decimals(price: f64) -> u32 {
    let magnitude = price.abs();
    if magnitude < 0.1 {
        6
    } else if magnitude < 1.0 {
        5
    } else if magnitude < 10.0 {
        4
    } else if magnitude < 100.0 {
        3
    } else if magnitude < 1000.0 {
        2
    } else {
        1
    }
}

/// Round a price to its magnitude-dependent precision.
///
/// Halves round away from zero.
pub fn format_price(price: f64) -> f64 {
    let scale = 10f64.powi(price_decimals(price) as i32);
    (price * scale).round() / scale
}

/// Fixed-precision text for a price, matching `format_price`.
pub fn price_text(price: f64) -> String {
    format!("{:.*}", price_decimals(price) as usize, format_price(price))
}
