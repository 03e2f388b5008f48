use std::collections::BTreeMap;

use log::warn;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::model::entities::{Commodity, CommodityType, Lot, Transaction, Value};

use super::table::{Cell, Row, Table};

const ASSETS: &[&str] = &["asset"];
const LIABILITIES: &[&str] = &["liability", "liabilities"];
const REVENUE: &[&str] = &["income", "revenue"];
const EXPENSES: &[&str] = &["expense"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalanceStatement {
    pub assets: BTreeMap<String, Vec<Lot>>,
    pub liabilities: BTreeMap<String, Vec<Lot>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IncomeStatement {
    /// Positive amounts: revenue is booked negative in the journal.
    pub revenue: BTreeMap<String, Vec<Lot>>,
    pub expenses: BTreeMap<String, Vec<Lot>>,
    /// Revenue minus expenses, per commodity code.
    pub net_income: Vec<Lot>,
}

fn matches(account: &str, keywords: &[&str]) -> bool {
    let account = account.to_lowercase();
    keywords.iter().any(|k| account.contains(k))
}

/// Adds the asset and liability postings of `transactions` to `starting` and
/// aggregates every account down to one lot per commodity code.
pub fn compute_balance_statement(
    starting: &BalanceStatement,
    transactions: &[Transaction],
) -> BalanceStatement {
    let mut res = starting.clone();
    for p in transactions.iter().flat_map(|tx| &tx.postings) {
        let section = if matches(&p.account, ASSETS) {
            &mut res.assets
        } else if matches(&p.account, LIABILITIES) {
            &mut res.liabilities
        } else {
            continue;
        };
        section
            .entry(p.account.clone())
            .or_default()
            .push(p.lot.clone());
    }
    for lots in res.assets.values_mut().chain(res.liabilities.values_mut()) {
        *lots = aggregate_lots(lots);
    }
    res
}

/// Sums the currency postings of revenue and expense accounts.
pub fn compute_income_statement(transactions: &[Transaction]) -> IncomeStatement {
    let mut revenue = BTreeMap::<String, Vec<Lot>>::new();
    let mut expenses = BTreeMap::<String, Vec<Lot>>::new();
    for p in transactions.iter().flat_map(|tx| &tx.postings) {
        if p.lot.commodity.kind != CommodityType::Currency {
            continue;
        }
        if matches(&p.account, REVENUE) {
            let mut lot = p.lot.clone();
            lot.amount = -lot.amount;
            revenue.entry(p.account.clone()).or_default().push(lot);
        } else if matches(&p.account, EXPENSES) {
            expenses
                .entry(p.account.clone())
                .or_default()
                .push(p.lot.clone());
        }
    }
    for lots in revenue.values_mut().chain(expenses.values_mut()) {
        *lots = aggregate_lots(lots);
    }

    let mut net = BTreeMap::<String, Lot>::new();
    let mut add = |lot: &Lot, amount: Decimal| {
        let acc = net
            .entry(lot.commodity.code.clone())
            .or_insert_with(|| Lot::new(Decimal::ZERO, lot.commodity.clone()));
        match acc.amount.checked_add(amount) {
            Some(sum) => acc.amount = sum,
            None => warn!("net income out of range for {}", lot.commodity),
        }
    };
    revenue.values().flatten().for_each(|l| add(l, l.amount));
    expenses.values().flatten().for_each(|l| add(l, -l.amount));

    IncomeStatement {
        revenue,
        expenses,
        net_income: net.into_values().collect(),
    }
}

/// Merges lots into one lot per commodity code, in code order.
///
/// Currency amounts are summed. Other commodities keep the amount-weighted
/// average unit value, which drops to zero when the amounts cancel out.
/// A lot that would take the aggregate out of range is skipped with a warning.
pub fn aggregate_lots(lots: &[Lot]) -> Vec<Lot> {
    let mut by_code = BTreeMap::<&str, Lot>::new();
    for lot in lots {
        let acc = by_code
            .entry(lot.commodity.code.as_str())
            .or_insert_with(|| {
                Lot::new(Decimal::ZERO, lot.commodity.clone()).with_unit_value(Value::new(
                    Decimal::ZERO,
                    lot.unit_value.commodity.clone(),
                ))
            });
        if merge(acc, lot).is_none() {
            warn!(
                "skipping lot of {} {}: aggregate out of range",
                lot.amount, lot.commodity
            );
        }
    }
    by_code.into_values().collect()
}

/// Adds `lot` to `acc`, leaving `acc` untouched on overflow.
///
/// The average moves by `(unit - avg) * amount / total`, which avoids forming
/// the product of amount and unit value.
fn merge(acc: &mut Lot, lot: &Lot) -> Option<()> {
    let amount = acc.amount.checked_add(lot.amount)?;
    if acc.commodity.kind == CommodityType::Currency {
        acc.amount = amount;
        return Some(());
    }
    let unit = if amount.is_zero() {
        Decimal::ZERO
    } else {
        let share = lot.amount.checked_div(amount)?;
        let delta = lot.unit_value.amount.checked_sub(acc.unit_value.amount)?;
        acc.unit_value.amount.checked_add(delta.checked_mul(share)?)?
    };
    acc.amount = amount;
    acc.unit_value.amount = unit;
    Some(())
}

impl BalanceStatement {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(4);
        table.add_section("Assets", &self.assets);
        table.add_section("Liabilities", &self.liabilities);
        table.add_row(Row::Separator);
        table
    }
}

impl IncomeStatement {
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(4);
        table.add_section("Revenue", &self.revenue);
        table.add_section("Expenses", &self.expenses);
        table.add_row(Row::Separator);
        for lot in &self.net_income {
            table.add_row(lot_row(Cell::text("Net income"), lot));
        }
        table.add_row(Row::Separator);
        table
    }
}

impl Table {
    fn add_section(&mut self, title: &str, accounts: &BTreeMap<String, Vec<Lot>>) {
        self.add_row(Row::Separator);
        self.add_row(Row::Cells(vec![Cell::text(title)]));
        self.add_row(Row::Separator);
        for (account, lots) in accounts {
            for lot in lots {
                self.add_row(lot_row(Cell::indented(account, 2), lot));
            }
        }
    }
}

fn lot_row(label: Cell, lot: &Lot) -> Row {
    let unit = if lot.unit_value.is_zero() {
        Cell::Empty
    } else {
        Cell::Decimal(lot.unit_value.amount)
    };
    Row::Cells(vec![
        label,
        Cell::Decimal(lot.amount),
        Cell::text(&display_code(&lot.commodity)),
        unit,
    ])
}

fn display_code(c: &Commodity) -> String {
    match c.kind {
        CommodityType::Other => format!("\"{}\"", c.code),
        _ => c.code.clone(),
    }
}
