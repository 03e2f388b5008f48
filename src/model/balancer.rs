use rust_decimal::Decimal;

use super::{
    entities::{Commodity, Transaction},
    error::ModelError,
};

/// Infers the omitted posting amount, if any, and checks that the postings
/// sum to zero for every commodity code.
///
/// A zero amount counts as omitted. At most one posting may omit its amount;
/// it takes the residual of the first unbalanced commodity.
pub fn balance_transaction(tx: &mut Transaction) -> Result<(), ModelError> {
    let mut balances: Vec<(Commodity, Decimal)> = Vec::new();
    let mut inferred = None;
    let mut missing = 0;
    for (i, posting) in tx.postings.iter().enumerate() {
        let lot = &posting.lot;
        if lot.amount.is_zero() {
            missing += 1;
            inferred = Some(i);
            continue;
        }
        match balances
            .iter_mut()
            .find(|(c, _)| c.code == lot.commodity.code)
        {
            Some((c, sum)) => {
                *sum = sum
                    .checked_add(lot.amount)
                    .ok_or_else(|| ModelError::Overflow(c.clone()))?
            }
            None => balances.push((lot.commodity.clone(), lot.amount)),
        }
    }
    if missing > 1 {
        return Err(ModelError::TooManyInferred);
    }
    for (commodity, residual) in balances {
        if residual.is_zero() {
            continue;
        }
        match inferred.take() {
            Some(i) => {
                let lot = &mut tx.postings[i].lot;
                lot.commodity = commodity;
                lot.amount = -residual;
            }
            None => return Err(ModelError::Unbalanced { commodity, residual }),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entities::{CommodityType, Lot, Posting};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn tx(postings: Vec<(&str, i64, &str)>) -> Transaction {
        let mut tx = Transaction::new(NaiveDate::from_ymd_opt(2023, 11, 24).unwrap(), "test");
        tx.postings = postings
            .into_iter()
            .map(|(account, amount, code)| {
                let kind = if code == "AAPL" {
                    CommodityType::Stock
                } else {
                    CommodityType::Currency
                };
                Posting::new(
                    account,
                    Lot::new(Decimal::from(amount), Commodity::new(kind, code)),
                )
            })
            .collect();
        tx
    }

    #[test]
    fn test_infer_amount() {
        let mut t = tx(vec![("assets:cash", 420, "USD"), ("income:employer", 0, "USD")]);
        balance_transaction(&mut t).unwrap();
        assert_eq!(t.postings[1].lot.amount, Decimal::from(-420));
        assert_eq!(t.postings[1].lot.commodity, Commodity::currency("USD"));
    }

    #[test]
    fn test_infer_takes_commodity() {
        let mut t = tx(vec![
            ("assets:broker", 10, "AAPL"),
            ("assets:broker", -10, "AAPL"),
            ("assets:cash", 25, "EUR"),
            ("equity", 0, "USD"),
        ]);
        balance_transaction(&mut t).unwrap();
        assert_eq!(t.postings[3].lot.amount, Decimal::from(-25));
        assert_eq!(t.postings[3].lot.commodity, Commodity::currency("EUR"));
    }

    #[test]
    fn test_balanced() {
        let mut t = tx(vec![("assets:cash", 100, "USD"), ("expenses:rent", -100, "USD")]);
        let before = t.clone();
        balance_transaction(&mut t).unwrap();
        assert_eq!(t, before);

        let mut empty = tx(vec![]);
        assert_eq!(balance_transaction(&mut empty), Ok(()));
    }

    #[test]
    fn test_idempotent() {
        let mut t = tx(vec![("assets:cash", 420, "USD"), ("income:employer", 0, "USD")]);
        balance_transaction(&mut t).unwrap();
        let once = t.clone();
        balance_transaction(&mut t).unwrap();
        assert_eq!(t, once);
    }

    #[test]
    fn test_too_many_inferred() {
        let mut t = tx(vec![
            ("assets:cash", 420, "USD"),
            ("income:employer", 0, "USD"),
            ("income:bonus", 0, "USD"),
        ]);
        assert_eq!(balance_transaction(&mut t), Err(ModelError::TooManyInferred));
        assert_eq!(
            ModelError::TooManyInferred.to_string(),
            "missing posting amount, cannot infer more than one"
        );
    }

    #[test]
    fn test_unbalanced() {
        let mut t = tx(vec![("assets:cash", 420, "USD"), ("income:employer", -400, "USD")]);
        assert_eq!(
            balance_transaction(&mut t),
            Err(ModelError::Unbalanced {
                commodity: Commodity::currency("USD"),
                residual: Decimal::from(20),
            })
        );
    }

    #[test]
    fn test_sum_out_of_range() {
        let mut t = tx(vec![("assets:cash", 1, "USD"), ("income:employer", 0, "USD")]);
        t.postings[0].lot.amount = Decimal::MAX;
        t.postings.push(t.postings[0].clone());
        assert_eq!(
            balance_transaction(&mut t),
            Err(ModelError::Overflow(Commodity::currency("USD")))
        );
    }

    #[test]
    fn test_two_residuals_one_slot() {
        let mut t = tx(vec![
            ("assets:cash", 420, "USD"),
            ("assets:cash", 30, "EUR"),
            ("income:employer", 0, "USD"),
        ]);
        assert!(matches!(
            balance_transaction(&mut t),
            Err(ModelError::Unbalanced { .. })
        ));
    }
}
