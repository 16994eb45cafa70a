// ==========================================
// POSM 成本计算 - 连接阶段
// ==========================================
// DisplayRecord
//   LEFT JOIN StoreInfo    ON store
//   LEFT JOIN ModelInfo    ON model
//   LEFT JOIN ModelPosmMap ON model
// 未匹配行保留（字段为 None）, 不丢弃
// 维度表主键重复: 第一行生效, 计入诊断
// 一个型号映射多个 POSM: 按 POSM 复制行（预期内的扇出）
// ==========================================

use crate::domain::records::{InputTables, JoinedRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

// ==========================================
// JoinStats - 连接统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub unmatched_store_rows: usize,
    pub unmatched_model_rows: usize,
    pub unmapped_posm_rows: usize,
    pub fanout_rows: usize,
    pub duplicate_store_keys: usize,
    pub duplicate_model_keys: usize,
    pub duplicate_posm_mappings: usize,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub records: Vec<JoinedRecord>,
    pub stats: JoinStats,
}

/// 按主键建索引, 第一行生效; 返回 (索引, 重复键数)
fn index_first<'a, T>(
    rows: &'a [T],
    key: impl Fn(&'a T) -> &'a str,
) -> (HashMap<&'a str, &'a T>, usize) {
    let mut index = HashMap::with_capacity(rows.len());
    let mut duplicates = 0;
    for row in rows {
        let k = key(row);
        if index.contains_key(k) {
            duplicates += 1;
            continue;
        }
        index.insert(k, row);
    }
    (index, duplicates)
}

pub struct Joiner;

impl Joiner {
    #[instrument(skip(self, tables), fields(displays = tables.displays.len()))]
    pub fn join(&self, tables: &InputTables) -> JoinOutput {
        let mut stats = JoinStats::default();

        let (stores, dup_stores) = index_first(&tables.stores, |s| s.store.as_str());
        let (models, dup_models) = index_first(&tables.models, |m| m.model.as_str());
        stats.duplicate_store_keys = dup_stores;
        stats.duplicate_model_keys = dup_models;

        // model → [posm_type], 保持首次出现顺序, 相同映射去重
        let mut posm_by_model: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut seen_pairs: HashSet<(&str, &str)> = HashSet::new();
        for mapping in &tables.posm_map {
            let pair = (mapping.model.as_str(), mapping.posm_type.as_str());
            if !seen_pairs.insert(pair) {
                stats.duplicate_posm_mappings += 1;
                continue;
            }
            posm_by_model.entry(pair.0).or_default().push(pair.1);
        }

        let mut records = Vec::with_capacity(tables.displays.len());
        for display in &tables.displays {
            let store = stores.get(display.store.as_str());
            let model = models.get(display.model.as_str());

            if store.is_none() {
                stats.unmatched_store_rows += 1;
            }
            if model.is_none() {
                stats.unmatched_model_rows += 1;
            }

            let base = JoinedRecord {
                store: display.store.clone(),
                model: display.model.clone(),
                quantity: display.quantity,
                address: store.and_then(|s| s.address.clone()),
                region: store.and_then(|s| s.region.clone()),
                priority: model.and_then(|m| m.priority),
                category: model.and_then(|m| m.category.clone()),
                posm_type: None,
            };

            match posm_by_model.get(display.model.as_str()) {
                None => {
                    stats.unmapped_posm_rows += 1;
                    records.push(base);
                }
                Some(posm_types) => {
                    stats.fanout_rows += posm_types.len() - 1;
                    for posm_type in posm_types {
                        records.push(JoinedRecord {
                            posm_type: Some(posm_type.to_string()),
                            ..base.clone()
                        });
                    }
                }
            }
        }

        if stats.unmatched_store_rows > 0 || stats.unmatched_model_rows > 0 {
            warn!(
                unmatched_store_rows = stats.unmatched_store_rows,
                unmatched_model_rows = stats.unmatched_model_rows,
                "存在未匹配的连接键"
            );
        }
        if stats.unmapped_posm_rows > 0 {
            warn!(
                unmapped_posm_rows = stats.unmapped_posm_rows,
                "部分陈列行无 POSM 映射, 不计入 POSM 汇总"
            );
        }
        debug!(?stats, "连接统计");
        info!(joined_rows = records.len(), "连接阶段完成");

        JoinOutput { records, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{DisplayRecord, ModelInfo, ModelPosmMap, StoreInfo};

    fn display(store: &str, model: &str, quantity: u64) -> DisplayRecord {
        DisplayRecord {
            store: store.to_string(),
            model: model.to_string(),
            quantity,
        }
    }

    fn tables() -> InputTables {
        InputTables {
            displays: vec![display("S1", "M1", 100), display("S2", "M2", 50)],
            stores: vec![StoreInfo {
                store: "S1".to_string(),
                address: Some("A1".to_string()),
                region: Some("R1".to_string()),
            }],
            models: vec![ModelInfo {
                model: "M1".to_string(),
                priority: Some(1),
                category: Some("Care".to_string()),
            }],
            posm_map: vec![ModelPosmMap {
                model: "M1".to_string(),
                posm_type: "P1".to_string(),
            }],
            prices: vec![],
        }
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let output = Joiner.join(&tables());

        assert_eq!(output.records.len(), 2);
        let matched = &output.records[0];
        assert_eq!(matched.region.as_deref(), Some("R1"));
        assert_eq!(matched.priority, Some(1));
        assert_eq!(matched.posm_type.as_deref(), Some("P1"));

        let unmatched = &output.records[1];
        assert_eq!(unmatched.quantity, 50);
        assert_eq!(unmatched.region, None);
        assert_eq!(unmatched.priority, None);
        assert_eq!(unmatched.posm_type, None);

        assert_eq!(output.stats.unmatched_store_rows, 1);
        assert_eq!(output.stats.unmatched_model_rows, 1);
        assert_eq!(output.stats.unmapped_posm_rows, 1);
    }

    #[test]
    fn test_multiple_posm_types_fan_out() {
        let mut input = tables();
        input.posm_map.push(ModelPosmMap {
            model: "M1".to_string(),
            posm_type: "P2".to_string(),
        });
        // 完全相同的映射不重复扇出
        input.posm_map.push(ModelPosmMap {
            model: "M1".to_string(),
            posm_type: "P1".to_string(),
        });

        let output = Joiner.join(&input);

        let m1_rows: Vec<_> = output.records.iter().filter(|r| r.model == "M1").collect();
        assert_eq!(m1_rows.len(), 2);
        assert!(m1_rows.iter().all(|r| r.quantity == 100));
        assert_eq!(output.stats.fanout_rows, 1);
        assert_eq!(output.stats.duplicate_posm_mappings, 1);
    }

    #[test]
    fn test_duplicate_store_key_first_wins() {
        let mut input = tables();
        input.stores.push(StoreInfo {
            store: "S1".to_string(),
            address: None,
            region: Some("R9".to_string()),
        });

        let output = Joiner.join(&input);

        assert_eq!(output.records[0].region.as_deref(), Some("R1"));
        assert_eq!(output.stats.duplicate_store_keys, 1);
        assert_eq!(output.records.len(), 2);
    }
}
