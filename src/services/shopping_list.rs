//! Shopping list aggregation and plain-text rendering.

use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sums amounts per distinct (name, unit), ordered by name then unit.
#[must_use]
pub fn aggregate(lines: Vec<(String, String, i32)>) -> Vec<ShoppingItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for (name, unit, amount) in lines {
        *totals.entry((name, unit)).or_default() += i64::from(amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// One `name amount unit` line per item, each newline-terminated.
#[must_use]
pub fn render(items: &[ShoppingItem]) -> String {
    items.iter().fold(String::new(), |mut out, item| {
        let _ = writeln!(out, "{} {} {}", item.name, item.amount, item.measurement_unit);
        out
    })
}
