use rust_decimal::Decimal;

use crate::core::{CalculationMethod, RoundingMode};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Base and VAT amounts for one taxable amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxAmounts {
    pub base_amount: Decimal,
    pub vat_amount: Decimal,
}

/// Compute VAT on `taxable_amount` at `rate` percent.
///
/// - Reverse charge: VAT on top, but the base stays the taxable amount;
///   the recipient self-assesses, so the method is irrelevant.
/// - Inclusive: VAT is extracted, `base = taxable − vat` after rounding,
///   so base and VAT always add back up to the taxable amount.
/// - Exclusive: VAT on top, `base = taxable`.
///
/// VAT is rounded to cents with `rounding`. Any amount and rate is
/// accepted; a VAT amount beyond the `Decimal` range saturates.
pub fn compute_tax(
    taxable_amount: Decimal,
    rate: Decimal,
    method: CalculationMethod,
    is_reverse_charge: bool,
    rounding: RoundingMode,
) -> TaxAmounts {
    if is_reverse_charge || method == CalculationMethod::Exclusive {
        return TaxAmounts {
            base_amount: taxable_amount,
            vat_amount: rounding.round_money(rate_share(taxable_amount, rate, HUNDRED)),
        };
    }

    let divisor = HUNDRED.saturating_add(rate);
    let vat = if divisor.is_zero() {
        Decimal::ZERO
    } else {
        rounding.round_money(rate_share(taxable_amount, rate, divisor))
    };
    TaxAmounts {
        base_amount: taxable_amount.saturating_sub(vat),
        vat_amount: vat,
    }
}

/// `amount × rate / divisor` without panicking. `divisor` must be non-zero.
///
/// Multiplying first keeps every digit for ordinary amounts. When the
/// product overflows, the fraction `rate / divisor` is taken first, which
/// fits whenever the result does. Results outside the `Decimal` range
/// saturate at [`Decimal::MAX`] or [`Decimal::MIN`].
pub(crate) fn rate_share(amount: Decimal, rate: Decimal, divisor: Decimal) -> Decimal {
    amount
        .checked_mul(rate)
        .and_then(|product| product.checked_div(divisor))
        .or_else(|| {
            rate.checked_div(divisor)
                .and_then(|fraction| amount.checked_mul(fraction))
        })
        .unwrap_or_else(|| {
            let fraction = rate.checked_div(divisor).unwrap_or_else(|| {
                if rate.is_sign_negative() == divisor.is_sign_negative() {
                    Decimal::MAX
                } else {
                    Decimal::MIN
                }
            });
            amount.saturating_mul(fraction)
        })
}
