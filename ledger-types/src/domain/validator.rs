//! Balance rules over a wallet and an investment fund.
//!
//! Pure and synchronous. A failing call leaves the wallet untouched.

use rust_decimal::Decimal;

use super::catalog::{CurrencyId, FundId, InvestmentFund};
use super::wallet::Wallet;
use crate::error::LedgerError;

/// Returns true iff `amount` is positive and covered by the balance.
pub fn can_debit(wallet: &Wallet, amount: Decimal) -> bool {
    amount > Decimal::ZERO && wallet.balance >= amount
}

/// Removes `amount` from the wallet balance.
pub fn debit(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
    ensure_positive(amount)?;
    if !can_debit(wallet, amount) {
        return Err(LedgerError::InsufficientFunds {
            available: wallet.balance,
            requested: amount,
        });
    }
    wallet.balance -= amount;
    wallet.touch();
    Ok(())
}

/// Adds `amount` to the wallet balance.
pub fn credit(wallet: &mut Wallet, amount: Decimal) -> Result<(), LedgerError> {
    ensure_positive(amount)?;
    wallet.balance = wallet
        .balance
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount(amount))?;
    wallet.touch();
    Ok(())
}

/// Checks that an investment of `amount` may go into `fund`.
///
/// Checks run in a fixed order and stop at the first failure:
/// existence, active flag, currency, minimum investment.
pub fn validate_investment_eligibility(
    amount: Decimal,
    currency_id: &CurrencyId,
    fund_id: &FundId,
    fund: Option<&InvestmentFund>,
) -> Result<(), LedgerError> {
    let fund = fund.ok_or_else(|| LedgerError::FundNotFound(fund_id.clone()))?;

    if !fund.active {
        return Err(LedgerError::FundInactive(fund.id.clone()));
    }

    if &fund.currency_id != currency_id {
        return Err(LedgerError::CurrencyMismatch {
            expected: fund.currency_id.clone(),
            got: currency_id.clone(),
        });
    }

    if amount < fund.min_investment {
        return Err(LedgerError::BelowMinimumInvestment {
            amount,
            minimum: fund.min_investment,
        });
    }

    Ok(())
}

pub(crate) fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientId;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn funded_wallet(balance: Decimal) -> Wallet {
        let mut wallet = Wallet::new(ClientId::new("c1"), CurrencyId::new("usd"));
        wallet.update_balance(balance).unwrap();
        wallet
    }

    fn usd_fund() -> InvestmentFund {
        InvestmentFund::new("f1", "Growth", "usd", dec!(100.00))
    }

    #[test]
    fn test_can_debit() {
        let wallet = funded_wallet(dec!(100.00));
        assert!(can_debit(&wallet, dec!(100.00)));
        assert!(!can_debit(&wallet, dec!(100.01)));
        assert!(!can_debit(&wallet, Decimal::ZERO));
        assert!(!can_debit(&wallet, dec!(-1)));
    }

    #[test]
    fn test_debit_reduces_balance() {
        let mut wallet = funded_wallet(dec!(1000.00));
        debit(&mut wallet, dec!(200.00)).unwrap();
        assert_eq!(wallet.balance(), dec!(800.00));
    }

    #[test]
    fn test_debit_insufficient_funds_leaves_wallet_untouched() {
        let mut wallet = funded_wallet(dec!(50.00));
        let before = wallet.clone();
        let err = debit(&mut wallet, dec!(50.01)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(wallet, before);
    }

    #[test]
    fn test_debit_rejects_non_positive() {
        let mut wallet = funded_wallet(dec!(50.00));
        let err = debit(&mut wallet, Decimal::ZERO).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
    }

    #[test]
    fn test_credit_then_debit_is_exact() {
        let mut wallet = funded_wallet(dec!(0.30));
        credit(&mut wallet, dec!(0.10)).unwrap();
        credit(&mut wallet, dec!(0.20)).unwrap();
        debit(&mut wallet, dec!(0.30)).unwrap();
        assert_eq!(wallet.balance(), dec!(0.30));
    }

    #[test]
    fn test_credit_rejects_negative() {
        let mut wallet = funded_wallet(dec!(10));
        let err = credit(&mut wallet, dec!(-10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert_eq!(wallet.balance(), dec!(10));
    }

    #[test]
    fn test_eligibility_ok() {
        let fund = usd_fund();
        let result =
            validate_investment_eligibility(dec!(100.00), &CurrencyId::new("usd"), &fund.id, Some(&fund));
        assert!(result.is_ok());
    }

    #[test]
    fn test_eligibility_missing_fund() {
        let err = validate_investment_eligibility(
            dec!(100.00),
            &CurrencyId::new("usd"),
            &FundId::new("ghost"),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FundNotFound);
    }

    #[test]
    fn test_eligibility_order_is_fixed() {
        // Inactive, wrong currency and below minimum: inactive wins.
        let fund = InvestmentFund::new("f1", "Growth", "eur", dec!(100.00)).deactivated();
        let err =
            validate_investment_eligibility(dec!(1), &CurrencyId::new("usd"), &fund.id, Some(&fund))
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FundInactive);

        // Wrong currency and below minimum: currency wins.
        let fund = InvestmentFund::new("f1", "Growth", "eur", dec!(100.00));
        let err =
            validate_investment_eligibility(dec!(1), &CurrencyId::new("usd"), &fund.id, Some(&fund))
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CurrencyMismatch);
    }

    #[test]
    fn test_eligibility_below_minimum() {
        let fund = usd_fund();
        let err = validate_investment_eligibility(
            dec!(99.99),
            &CurrencyId::new("usd"),
            &fund.id,
            Some(&fund),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BelowMinimumInvestment { minimum, .. } if minimum == dec!(100.00)
        ));
    }
}
