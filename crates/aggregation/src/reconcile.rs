//! Full outer join of the import and export aggregates.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Summed amount and quantity for one grouping key on one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowTotals {
    pub amount: Decimal,
    pub qty: Decimal,
}

impl FlowTotals {
    pub fn add(&mut self, amount: Decimal, qty: Decimal) {
        self.amount += amount;
        self.qty += qty;
    }
}

/// One reconciled key with both sides filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<K> {
    pub key: K,
    pub imports: FlowTotals,
    pub exports: FlowTotals,
}

impl<K> Reconciled<K> {
    #[must_use]
    pub fn net_exports(&self) -> Decimal {
        self.exports.amount - self.imports.amount
    }

    #[must_use]
    pub fn net_qty(&self) -> Decimal {
        self.exports.qty - self.imports.qty
    }
}

/// Joins both sides on the key.
///
/// Every key of either side appears exactly once in the output, in
/// ascending key order. A side without the key contributes zeros.
#[must_use]
pub fn outer_join<K: Ord + Clone>(
    imports: &BTreeMap<K, FlowTotals>,
    exports: &BTreeMap<K, FlowTotals>,
) -> Vec<Reconciled<K>> {
    let mut joined: BTreeMap<K, Reconciled<K>> = BTreeMap::new();

    for (key, totals) in imports {
        joined
            .entry(key.clone())
            .or_insert_with(|| empty(key))
            .imports = *totals;
    }
    for (key, totals) in exports {
        joined
            .entry(key.clone())
            .or_insert_with(|| empty(key))
            .exports = *totals;
    }

    joined.into_values().collect()
}

fn empty<K: Clone>(key: &K) -> Reconciled<K> {
    Reconciled {
        key: key.clone(),
        imports: FlowTotals::default(),
        exports: FlowTotals::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(amount: Decimal, qty: Decimal) -> FlowTotals {
        FlowTotals { amount, qty }
    }

    #[test]
    fn test_one_sided_keys_are_kept() {
        let imports = BTreeMap::from([("a", totals(dec!(100), dec!(10))), ("b", totals(dec!(5), dec!(1)))]);
        let exports = BTreeMap::from([("b", totals(dec!(7), dec!(2))), ("c", totals(dec!(50), dec!(5)))]);

        let joined = outer_join(&imports, &exports);
        let keys: Vec<_> = joined.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        assert_eq!(joined[0].exports, FlowTotals::default());
        assert_eq!(joined[0].net_exports(), dec!(-100));
        assert_eq!(joined[1].net_exports(), dec!(2));
        assert_eq!(joined[1].net_qty(), dec!(1));
        assert_eq!(joined[2].imports, FlowTotals::default());
        assert_eq!(joined[2].net_qty(), dec!(5));
    }

    #[test]
    fn test_empty_sides() {
        let empty: BTreeMap<i32, FlowTotals> = BTreeMap::new();
        assert!(outer_join(&empty, &empty).is_empty());

        let exports = BTreeMap::from([(1, totals(dec!(1), dec!(1)))]);
        let joined = outer_join(&empty, &exports);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].imports.amount, Decimal::ZERO);
    }

    #[test]
    fn test_add_accumulates() {
        let mut t = FlowTotals::default();
        t.add(dec!(1.5), dec!(2));
        t.add(dec!(2.5), dec!(3));
        assert_eq!(t, totals(dec!(4), dec!(5)));
    }
}
