//! Pricing policy: effective (special) price of a product.

/// Computes the effective price from a base price and a discount percentage.
///
/// The discount amount is computed separately and then subtracted; the
/// operation order is fixed because callers compare stored doubles for
/// consistency and floating-point results differ by operation order.
pub fn special_price(price: f64, discount_percent: f64) -> f64 {
    price - (discount_percent * 0.01) * price
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_price_applies_discount() {
        assert_eq!(special_price(100.0, 10.0), 90.0);
        assert_eq!(special_price(200.0, 25.0), 150.0);
    }

    #[test]
    fn test_zero_discount_keeps_base_price() {
        assert_eq!(special_price(49.99, 0.0), 49.99);
    }

    #[test]
    fn test_full_discount_is_free() {
        assert_eq!(special_price(80.0, 100.0), 0.0);
    }

    #[test]
    fn test_operation_order_is_stable() {
        // Matches `price - (discount * 0.01) * price` exactly, not the
        // algebraically equal `price * (1.0 - discount * 0.01)`.
        let price = 19.99_f64;
        let discount = 12.5_f64;
        let expected = price - (discount * 0.01) * price;
        assert_eq!(special_price(price, discount), expected);
    }
}
