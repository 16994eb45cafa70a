// ==========================================
// 属性测试
// ==========================================
// 职责: 数量规则 / 价格区间 / 发货拆分 / 区域分配 的不变量
// 工具: proptest
// ==========================================


use posm_cost_calc::domain::{InputTables, PriceBand};
use posm_cost_calc::engine::{apply_quantity_rule, price_range, PosmCostCalculator};
use posm_cost_calc::CalcConfig;
use proptest::prelude::*;
use std::collections::BTreeMap;
use test_helpers::TablesBuilder;

const REGIONS: [&str; 3] = ["R0", "R1", "R2"];
const POSM_TYPES: [&str; 2] = ["P0", "P1"];

// ==========================================
// 输入生成
// ==========================================

#[derive(Debug, Clone)]
struct StoreCase {
    region: Option<usize>,
}

#[derive(Debug, Clone)]
struct ModelCase {
    priority: i64,
    posm: usize,
    care: bool,
}

fn arb_store() -> impl Strategy<Value = StoreCase> {
    prop::option::weighted(0.9, 0..REGIONS.len()).prop_map(|region| StoreCase { region })
}

fn arb_model() -> impl Strategy<Value = ModelCase> {
    (1..=2i64, 0..POSM_TYPES.len(), any::<bool>())
        .prop_map(|(priority, posm, care)| ModelCase { priority, posm, care })
}

/// (门店, 型号, 陈列行)
fn arb_scenario() -> impl Strategy<Value = (Vec<StoreCase>, Vec<ModelCase>, Vec<(usize, usize, u64)>)> {
    (
        prop::collection::vec(arb_store(), 1..5),
        prop::collection::vec(arb_model(), 1..5),
    )
        .prop_flat_map(|(stores, models)| {
            let displays = prop::collection::vec(
                (0..stores.len(), 0..models.len(), 0..3000u64),
                0..30,
            );
            (Just(stores), Just(models), displays)
        })
}

fn build_tables(
    stores: &[StoreCase],
    models: &[ModelCase],
    displays: &[(usize, usize, u64)],
) -> InputTables {
    let mut builder = TablesBuilder::new();
    for (idx, store) in stores.iter().enumerate() {
        let name = format!("S{}", idx);
        builder = match store.region {
            Some(region) => builder.store(&name, REGIONS[region]),
            None => builder.store_without_region(&name),
        };
    }
    for (idx, model) in models.iter().enumerate() {
        let name = format!("M{}", idx);
        let category = if model.care { Some("Care") } else { None };
        builder = builder
            .model(&name, model.priority, category)
            .posm(&name, POSM_TYPES[model.posm]);
    }
    for posm_type in POSM_TYPES {
        builder = builder.flat_price(posm_type, 1.5);
    }
    for &(store, model, quantity) in displays {
        builder = builder.display(&format!("S{}", store), &format!("M{}", model), quantity);
    }
    builder.build()
}

fn calculator() -> PosmCostCalculator {
    PosmCostCalculator::new(CalcConfig::default()).unwrap()
}

// ==========================================
// 属性
// ==========================================

proptest! {
    #[test]
    fn buffered_rule_has_minimum_and_step(quantity in 0..1_000_000u64) {
        let adjusted = apply_quantity_rule(quantity, 1).unwrap();
        prop_assert!(adjusted >= 210);
        prop_assert_eq!(adjusted % 10, 0);
        prop_assert!(adjusted >= quantity);
    }

    #[test]
    fn plain_rule_rounds_up_to_five(quantity in 0..1_000_000u64) {
        let adjusted = apply_quantity_rule(quantity, 2).unwrap();
        prop_assert_eq!(adjusted % 5, 0);
        prop_assert!(adjusted >= quantity);
        prop_assert!(adjusted < quantity + 5);
    }

    #[test]
    fn exactly_one_band_contains_quantity(quantity in prop_oneof![
        0..6000u64,
        prop::sample::select(vec![
            200u64, 201, 500, 501, 1000, 1001, 2000, 2001, 3000, 3001, 4000, 4001, 5000, 5001,
        ]),
        any::<u64>(),
    ]) {
        let matching: Vec<PriceBand> = PriceBand::ALL
            .into_iter()
            .filter(|band| band.contains(quantity))
            .collect();
        prop_assert_eq!(matching.len(), 1);
        prop_assert_eq!(matching[0], price_range(quantity));
    }

    #[test]
    fn send_and_backup_partition_adjusted((stores, models, displays) in arb_scenario()) {
        let report = calculator()
            .calculate(&build_tables(&stores, &models, &displays))
            .unwrap();

        for row in &report.posm_summary {
            prop_assert_eq!(row.send_quantity + row.backup_quantity, row.adjusted_quantity);
            prop_assert!(row.raw_quantity <= row.send_quantity);
            prop_assert!(row.send_quantity <= row.adjusted_quantity);
        }
    }

    #[test]
    fn region_allocation_is_conserved((stores, models, displays) in arb_scenario()) {
        let report = calculator()
            .calculate(&build_tables(&stores, &models, &displays))
            .unwrap();

        // (posm, region, priority) → raw, 独立于引擎重新计算
        let mut groups: BTreeMap<(usize, usize, i64), u64> = BTreeMap::new();
        for &(store, model, quantity) in &displays {
            if let Some(region) = stores[store].region {
                let case = &models[model];
                *groups.entry((case.posm, region, case.priority)).or_default() += quantity;
            }
        }
        let mut expected: BTreeMap<&str, u64> = BTreeMap::new();
        for ((posm, _, priority), raw) in groups {
            *expected.entry(POSM_TYPES[posm]).or_default() +=
                apply_quantity_rule(raw, priority).unwrap();
        }

        let mut allocated: BTreeMap<&str, u64> = BTreeMap::new();
        for row in &report.region_summary {
            *allocated.entry(row.posm_type.as_str()).or_default() += row.allocated_quantity;
        }
        prop_assert_eq!(allocated, expected);
    }

    #[test]
    fn region_percentages_sum_to_hundred((stores, models, displays) in arb_scenario()) {
        let report = calculator()
            .calculate(&build_tables(&stores, &models, &displays))
            .unwrap();

        let mut sums: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
        for row in &report.region_summary {
            let entry = sums.entry(row.posm_type.as_str()).or_default();
            entry.0 += row.needed_quantity;
            entry.1 += row.percent_of_total;
        }
        for (raw_total, percent) in sums.values() {
            if *raw_total > 0 {
                prop_assert!((percent - 100.0).abs() <= 0.01);
            } else {
                prop_assert_eq!(*percent, 0.0);
            }
        }
    }

    #[test]
    fn category_splits_partition_region_demand((stores, models, displays) in arb_scenario()) {
        let report = calculator()
            .calculate(&build_tables(&stores, &models, &displays))
            .unwrap();

        let needed = |rows: &[posm_cost_calc::domain::RegionAllocationRow]| -> u64 {
            rows.iter().map(|r| r.needed_quantity).sum()
        };
        let care = &report.category_allocations[0];
        let non_care = &report.category_allocations[1];
        prop_assert_eq!(
            needed(&care.rows) + needed(&non_care.rows),
            needed(&report.region_summary)
        );
    }
}
