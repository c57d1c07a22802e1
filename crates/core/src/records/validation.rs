//! Input validation that runs before any state is touched.
//!
//! Quantities and money are bounded to what the storage columns hold
//! exactly: quantities carry at most three decimals, rates and amounts at
//! most two. Anything finer would be rounded on write and stop matching the
//! stock and ledger effects computed here.

use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{LineInput, LineItem, PartyInput, PaymentInput, TradeInput};
use crate::billing::BillingError;
use crate::numbering;

/// Decimal places a quantity in kilograms may carry.
pub const QUANTITY_SCALE: u32 = 3;

/// Decimal places a rate or amount may carry.
pub const MONEY_SCALE: u32 = 2;

/// Largest quantity in kilograms on one line.
pub const MAX_QUANTITY_KG: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0); // 1_000_000_000_000

/// Largest rate, line total, record total, or payment amount.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_316_134_912, 2_328, 0, false, 0); // 10_000_000_000_000

fn fits(value: Decimal, scale: u32, max: Decimal) -> bool {
    value.normalize().scale() <= scale && value <= max
}

/// Validates the party fields of a transaction.
///
/// # Errors
///
/// Returns `MissingField` if the name or phone is blank.
pub fn validate_party(party: &PartyInput) -> Result<(), BillingError> {
    if party.name.trim().is_empty() {
        return Err(BillingError::MissingField("party name"));
    }
    if party.phone.trim().is_empty() {
        return Err(BillingError::MissingField("party phone"));
    }
    Ok(())
}

/// Validates a sale or purchase: reference format, party, and every line.
///
/// The format check runs first so that malformed numbers never reach the
/// uniqueness query.
///
/// # Errors
///
/// Returns the first validation failure found.
pub fn validate_trade(input: &TradeInput) -> Result<(), BillingError> {
    numbering::validate_format(&input.reference_no)?;
    validate_party(&input.party)?;

    if input.lines.is_empty() {
        return Err(BillingError::NoLines);
    }

    for (index, line) in input.lines.iter().enumerate() {
        let line_no = index + 1;
        if line.item_name.trim().is_empty() {
            return Err(BillingError::InvalidLine {
                line: line_no,
                reason: "item name is required",
            });
        }
        if line.quantity_kg <= Decimal::ZERO {
            return Err(BillingError::InvalidLine {
                line: line_no,
                reason: "quantity must be positive",
            });
        }
        if !fits(line.quantity_kg, QUANTITY_SCALE, MAX_QUANTITY_KG) {
            return Err(BillingError::InvalidLine {
                line: line_no,
                reason: "quantity is too large or has more than 3 decimals",
            });
        }
        if line.rate <= Decimal::ZERO {
            return Err(BillingError::InvalidLine {
                line: line_no,
                reason: "rate must be positive",
            });
        }
        if !fits(line.rate, MONEY_SCALE, MAX_AMOUNT) {
            return Err(BillingError::InvalidLine {
                line: line_no,
                reason: "rate is too large or has more than 2 decimals",
            });
        }
    }

    Ok(())
}

/// Validates a payment.
///
/// # Errors
///
/// Returns `MissingField`, `NonPositiveAmount`, or `InvalidAmount`.
pub fn validate_payment(input: &PaymentInput) -> Result<(), BillingError> {
    validate_party(&input.party)?;
    if input.amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveAmount(input.amount));
    }
    if !fits(input.amount, MONEY_SCALE, MAX_AMOUNT) {
        return Err(BillingError::InvalidAmount {
            amount: input.amount,
            reason: "too large or more than 2 decimals",
        });
    }
    Ok(())
}

/// Validates a stock count or threshold in bags.
///
/// # Errors
///
/// Returns `InvalidItem` if the value is out of range or too precise.
pub fn validate_bags(bags: Decimal) -> Result<(), BillingError> {
    if fits(bags.abs(), QUANTITY_SCALE, MAX_QUANTITY_KG) {
        Ok(())
    } else {
        Err(BillingError::InvalidItem(
            "stock is too large or has more than 3 decimals",
        ))
    }
}

/// Derives persisted lines and the record total from validated input.
///
/// `total = quantity_kg * rate` rounded half away from zero to two
/// decimals per line, `total_amount = Σ line.total`.
///
/// # Errors
///
/// Returns `InvalidLine` if a line total rounds to zero or exceeds
/// [`MAX_AMOUNT`], and `InvalidAmount` if the record total does.
pub fn build_lines(lines: &[LineInput]) -> Result<(Vec<LineItem>, Decimal), BillingError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut total_amount = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        let too_large = BillingError::InvalidLine {
            line: index + 1,
            reason: "line total is too large",
        };
        let total = line
            .quantity_kg
            .checked_mul(line.rate)
            .map(|t| t.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or(too_large)?;
        if total.is_zero() {
            return Err(BillingError::InvalidLine {
                line: index + 1,
                reason: "line total rounds to zero",
            });
        }

        total_amount = total_amount
            .checked_add(total)
            .filter(|t| *t <= MAX_AMOUNT)
            .ok_or(BillingError::InvalidAmount {
                amount: total_amount,
                reason: "record total is too large",
            })?;
        items.push(LineItem {
            item_name: line.item_name.trim().to_string(),
            quantity_kg: line.quantity_kg,
            rate: line.rate,
            total,
        });
    }
    Ok((items, total_amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PaymentDirection;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(reference_no: &str, lines: Vec<LineInput>) -> TradeInput {
        TradeInput {
            reference_no: reference_no.to_string(),
            party: PartyInput {
                name: "Acme".to_string(),
                phone: "9000000001".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            lines,
            notes: None,
        }
    }

    fn line(name: &str, quantity_kg: Decimal, rate: Decimal) -> LineInput {
        LineInput {
            item_name: name.to_string(),
            quantity_kg,
            rate,
        }
    }

    #[test]
    fn test_valid_trade_passes() {
        let input = trade("INV-1", vec![line("Plastic-A", dec!(90), dec!(10))]);
        assert!(validate_trade(&input).is_ok());
    }

    #[test]
    fn test_bad_reference_rejected_before_lines() {
        let input = trade("INV 1", vec![]);
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_empty_lines_rejected() {
        let input = trade("INV-1", vec![]);
        assert!(matches!(validate_trade(&input), Err(BillingError::NoLines)));
    }

    #[test]
    fn test_non_positive_quantity_and_rate_rejected() {
        let input = trade("INV-1", vec![line("Plastic-A", dec!(0), dec!(10))]);
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidLine { line: 1, .. })
        ));

        let input = trade(
            "INV-1",
            vec![
                line("Plastic-A", dec!(10), dec!(10)),
                line("Plastic-B", dec!(10), dec!(-1)),
            ],
        );
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_blank_party_rejected() {
        let mut input = trade("INV-1", vec![line("Plastic-A", dec!(1), dec!(1))]);
        input.party.phone = "  ".to_string();
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::MissingField("party phone"))
        ));
    }

    #[test]
    fn test_build_lines_derives_totals() {
        let (lines, total) = build_lines(&[
            line(" Plastic-A ", dec!(90), dec!(10)),
            line("Plastic-B", dec!(12.5), dec!(4)),
        ])
        .unwrap();
        assert_eq!(lines[0].item_name, "Plastic-A");
        assert_eq!(lines[0].total, dec!(900));
        assert_eq!(lines[1].total, dec!(50.0));
        assert_eq!(total, dec!(950));
    }

    #[test]
    fn test_line_total_rounds_to_two_decimals() {
        let (lines, total) = build_lines(&[line("Plastic-A", dec!(10.005), dec!(10.01))]).unwrap();
        assert_eq!(lines[0].total, dec!(100.15));
        assert_eq!(total, dec!(100.15));
    }

    #[test]
    fn test_line_total_rounding_to_zero_rejected() {
        let err = build_lines(&[line("Plastic-A", dec!(0.001), dec!(0.01))]).unwrap_err();
        assert!(matches!(err, BillingError::InvalidLine { line: 1, .. }));
    }

    #[test]
    fn test_huge_line_is_rejected_without_overflow() {
        let input = trade(
            "INV-1",
            vec![line("Plastic-A", dec!(100000000000000000000), dec!(1000000000))],
        );
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidLine { line: 1, .. })
        ));

        let err = build_lines(&input.lines).unwrap_err();
        assert!(matches!(err, BillingError::InvalidLine { line: 1, .. }));
    }

    #[test]
    fn test_record_total_over_limit_rejected() {
        let lines = vec![
            line("Plastic-A", dec!(1000000000000), dec!(9)),
            line("Plastic-B", dec!(1000000000000), dec!(9)),
        ];
        let input = trade("INV-1", lines.clone());
        assert!(validate_trade(&input).is_ok());
        assert!(matches!(
            build_lines(&lines),
            Err(BillingError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_precision_beyond_storage_rejected() {
        let input = trade("INV-1", vec![line("Plastic-A", dec!(30.0004), dec!(10))]);
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidLine { line: 1, .. })
        ));

        let input = trade("INV-1", vec![line("Plastic-A", dec!(30), dec!(10.005))]);
        assert!(matches!(
            validate_trade(&input),
            Err(BillingError::InvalidLine { line: 1, .. })
        ));

        let input = trade("INV-1", vec![line("Plastic-A", dec!(30.000), dec!(10.50))]);
        assert!(validate_trade(&input).is_ok());
    }

    #[test]
    fn test_payment_amount_bounds() {
        let mut input = PaymentInput {
            party: PartyInput {
                name: "Acme".to_string(),
                phone: "9000000001".to_string(),
            },
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            amount: dec!(0.004),
            direction: PaymentDirection::PaymentIn,
            notes: None,
        };
        assert!(matches!(
            validate_payment(&input),
            Err(BillingError::InvalidAmount { .. })
        ));

        input.amount = dec!(10000000000001);
        assert!(matches!(
            validate_payment(&input),
            Err(BillingError::InvalidAmount { .. })
        ));

        input.amount = dec!(400.50);
        assert!(validate_payment(&input).is_ok());
    }

    #[test]
    fn test_bags_bounds() {
        assert!(validate_bags(dec!(-3)).is_ok());
        assert!(validate_bags(dec!(12.125)).is_ok());
        assert!(matches!(
            validate_bags(dec!(1.0005)),
            Err(BillingError::InvalidItem(_))
        ));
    }
}
