use rust_decimal::Decimal;

use crate::application::errors::InvalidNumber;

/// A currency and its exchange rate against the reference currency.
///
/// `rate` is the value of one unit of `name` expressed in the reference
/// currency. Names are case-sensitive and unique within the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    pub name: String,
    pub rate: Decimal,
}

impl Currency {
    pub fn new(name: impl Into<String>, rate: Decimal) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }

    /// The stored rate quantized to two fractional digits, the precision
    /// conversion arithmetic works at.
    pub fn quantized_rate(&self) -> Decimal {
        self.rate.round_dp(2)
    }

    /// Convert `amount` units of this currency into the reference currency.
    pub fn convert(&self, amount: Decimal) -> Decimal {
        amount * self.quantized_rate()
    }
}

/// Parse user input as a strictly positive decimal.
pub fn parse_positive_decimal(input: &str) -> Result<Decimal, InvalidNumber> {
    let value: Decimal = input
        .trim()
        .parse()
        .map_err(|_| InvalidNumber(input.trim().to_string()))?;
    if value <= Decimal::ZERO {
        return Err(InvalidNumber(input.trim().to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_positive_decimals() {
        assert_eq!(parse_positive_decimal("90.50"), Ok(dec!(90.50)));
        assert_eq!(parse_positive_decimal(" 2 "), Ok(dec!(2)));
        assert_eq!(parse_positive_decimal("0.01"), Ok(dec!(0.01)));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(parse_positive_decimal("ninety").is_err());
        assert!(parse_positive_decimal("").is_err());
        assert!(parse_positive_decimal("90,50").is_err());
    }

    #[test]
    fn rejects_non_positive_input() {
        assert!(parse_positive_decimal("0").is_err());
        assert!(parse_positive_decimal("-1.5").is_err());
    }

    #[test]
    fn conversion_quantizes_the_rate_first() {
        let usd = Currency::new("USD", dec!(90.50));
        assert_eq!(usd.convert(dec!(2)), dec!(181.00));

        // A rate carrying extra precision is clamped to two digits before
        // multiplying, so drift does not accumulate.
        let noisy = Currency::new("EUR", dec!(98.4999));
        assert_eq!(noisy.quantized_rate(), dec!(98.50));
        assert_eq!(noisy.convert(dec!(10)), dec!(985.00));
    }
}
