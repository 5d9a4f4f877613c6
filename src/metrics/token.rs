/// Converts a raw on-chain amount into token units: `raw / 10^decimals`.
///
/// The integer and fractional parts are converted separately so amounts far
/// beyond `f64`'s integer range keep their leading digits exact.
pub fn to_decimal(raw: u128, decimals: u32) -> f64 {
    if raw == 0 {
        return 0.0;
    }

    match 10u128.checked_pow(decimals) {
        Some(scale) => {
            let whole = (raw / scale) as f64;
            let fraction = (raw % scale) as f64 / scale as f64;
            whole + fraction
        }
        None => raw as f64 / 10f64.powi(decimals.min(i32::MAX as u32) as i32),
    }
}

pub fn format_amount(value: f64, decimals: u32) -> String {
    let precision = decimals.min(6) as usize;
    let text = format!("{value:.precision$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        text
    }
}
