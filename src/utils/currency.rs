// utils/currency.rs
//
// Money is carried as i64 cents everywhere past the request boundary.
// Dollar floats exist only in request DTOs and rendered responses.

/// Convert a dollar amount from a request body to cents, rounding to the
/// nearest cent so float noise from JSON parsing cannot shave one off.
pub fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Render cents as "$123.45" for responses and notification emails.
pub fn format_cents_as_dollars(cents: i64) -> String {
    format!("${:.2}", cents_to_dollars(cents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_amounts_round_to_whole_cents() {
        // Typical cleaner fees arrive as two-decimal dollar amounts
        assert_eq!(dollars_to_cents(85.00), 8500);
        assert_eq!(dollars_to_cents(62.50), 6250);
        assert_eq!(dollars_to_cents(149.99), 14999);
        // 0.1 + 0.2 is not exactly 0.3 in a float
        assert_eq!(dollars_to_cents(0.1 + 0.2), 30);
    }

    #[test]
    fn test_cents_to_dollars_inverts_whole_amounts() {
        assert_eq!(cents_to_dollars(8500), 85.0);
        assert_eq!(cents_to_dollars(1), 0.01);
    }

    #[test]
    fn test_formatting_pads_to_two_decimals() {
        // $60 guest charge for a $50 cleaner fee
        assert_eq!(format_cents_as_dollars(6000), "$60.00");
        // Sub-dollar platform margins still render both decimals
        assert_eq!(format_cents_as_dollars(35), "$0.35");
        assert_eq!(format_cents_as_dollars(0), "$0.00");
        // Estimated gateway fee on a $150 charge
        assert_eq!(format_cents_as_dollars(465), "$4.65");
    }
}
