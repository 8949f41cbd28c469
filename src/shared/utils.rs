//! Utility functions and helpers

/// Format a raw amount with proper decimals
pub fn format_amount(amount: u128, decimals: u8) -> String {
    format!("{:.6}", to_ui_amount(amount, decimals))
}

/// Raw integer amount -> UI amount
pub fn to_ui_amount(amount: u128, decimals: u8) -> f64 {
    amount as f64 / 10_f64.powi(i32::from(decimals))
}

/// UI amount -> raw integer amount (truncating)
pub fn to_raw_amount(ui_amount: f64, decimals: u8) -> u128 {
    if !ui_amount.is_finite() || ui_amount <= 0.0 {
        return 0;
    }
    (ui_amount * 10_f64.powi(i32::from(decimals))) as u128
}

/// Calculate percentage change
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
