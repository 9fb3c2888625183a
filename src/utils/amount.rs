/// Amount utility functions for rupee values.
///
/// The backend is inconsistent about amounts: some fields arrive as JSON
/// numbers, others as strings like "350.00". Everything is normalized to
/// f64 rupees at the API boundary and formatted here.

/// Fraction of the estimated total collected as the initial deposit.
pub const INITIAL_DEPOSIT_RATE: f64 = 0.20;

/// Format rupees with 2 decimal places
pub fn format_rupees(amount: f64) -> String {
    format!("Rs{:.2}", amount)
}

/// The 20% deposit due once a cost estimate is published
pub fn initial_deposit(total: f64) -> f64 {
    total * INITIAL_DEPOSIT_RATE
}

/// Validate and parse an amount string to rupees
pub fn parse_amount(amount_str: &str) -> Result<f64, String> {
    amount_str
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid amount format".to_string())
        .and_then(|amount| {
            if amount < 0.0 {
                Err("Amount cannot be negative".to_string())
            } else {
                Ok(amount)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(200.0), "Rs200.00");
        assert_eq!(format_rupees(0.5), "Rs0.50");
        assert_eq!(format_rupees(350.0), "Rs350.00");
    }

    #[test]
    fn test_initial_deposit() {
        assert_eq!(initial_deposit(1000.0), 200.0);
        assert_eq!(initial_deposit(0.0), 0.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("350.00"), Ok(350.0));
        assert_eq!(parse_amount(" 1000 "), Ok(1000.0));
        assert_eq!(parse_amount("-100"), Err("Amount cannot be negative".to_string()));
        assert_eq!(parse_amount("abc"), Err("Invalid amount format".to_string()));
    }
}
