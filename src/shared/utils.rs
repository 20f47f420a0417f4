//! Utility functions and helpers

/// Percentage change from an old value to a new one
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

/// Format a price with its currency code
pub fn format_price(value: f64, currency: &str) -> String {
    format!("{} {:.2}", currency, value)
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change() {
        assert!((calculate_percentage_change(3000.0, 3200.0) - 6.666666).abs() < 0.001);
        assert!(calculate_percentage_change(3000.0, 2850.0) < 0.0);
        assert_eq!(calculate_percentage_change(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(2950.5, "SGD"), "SGD 2950.50");
    }
}
