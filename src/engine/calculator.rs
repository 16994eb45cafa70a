// ==========================================
// POSM 成本计算 - 计算编排器
// ==========================================
// 流程（单向, 后一阶段不回读前一阶段以外的数据）:
// 1. 连接: 陈列事实 + 门店/型号/POSM 维度
// 2. 规则: (POSM, 优先级) 分组 → 数量规则 → 跨优先级求和
// 3. 定价: 原始 / 调整后数量分别查阶梯价
// 4. 分配: 区域需求 → 区域分配 → 发货/备货拆分
// 5. 组装: 结果表 + 诊断
// 红线: 纯函数, 无 I/O, 无跨调用共享状态
// ==========================================

use crate::config::{CalcConfig, ConfigResult};
use crate::domain::records::{InputTables, JoinedRecord};
use crate::domain::report::{CategoryAllocation, Diagnostics, PosmReport};
use crate::engine::aggregation::{self, DemandAggregator};
use crate::engine::allocation::RegionAllocator;
use crate::engine::assembler::ResultAssembler;
use crate::engine::error::EngineResult;
use crate::engine::joiner::Joiner;
use crate::engine::pricing::{self, PriceBook};
use crate::engine::quantity_rule::QuantityRule;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// CategoryScope - 品类过滤
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope<'a> {
    Within(&'a str),
    Outside(&'a str),
}

impl CategoryScope<'_> {
    fn matches(&self, record: &JoinedRecord) -> bool {
        let in_category = |category: &str| {
            record
                .category
                .as_deref()
                .is_some_and(|c| c.trim().eq_ignore_ascii_case(category.trim()))
        };
        match self {
            CategoryScope::Within(category) => in_category(category),
            CategoryScope::Outside(category) => !in_category(category),
        }
    }

    pub fn label(&self) -> String {
        match self {
            CategoryScope::Within(category) => category.to_string(),
            CategoryScope::Outside(category) => format!("Non-{}", category),
        }
    }
}

// ==========================================
// PosmCostCalculator
// ==========================================
pub struct PosmCostCalculator {
    config: CalcConfig,
    rule: QuantityRule,
    allocator: RegionAllocator,
}

impl PosmCostCalculator {
    /// 创建计算器（参数先校验）
    pub fn new(config: CalcConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            rule: QuantityRule::new(&config),
            allocator: RegionAllocator::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &CalcConfig {
        &self.config
    }

    pub fn rule(&self) -> &QuantityRule {
        &self.rule
    }

    /// 执行一次完整计算; 任一致命错误时不返回任何结果表
    #[instrument(skip(self, tables), fields(displays = tables.displays.len()))]
    pub fn calculate(&self, tables: &InputTables) -> EngineResult<PosmReport> {
        info!("开始 POSM 计算");

        // ==========================================
        // 步骤1: 连接
        // ==========================================
        let joined = Joiner.join(tables);
        let records = &joined.records;
        let exclusions = aggregation::exclusion_counts(records);

        // ==========================================
        // 步骤2: 规则
        // ==========================================
        let aggregator = DemandAggregator::new(&self.rule);
        let posm_demand = aggregator.posm_demand(records)?;
        let totals = aggregation::posm_totals(&posm_demand)?;
        let region_demand = aggregator.region_demand(records)?;
        debug!(
            posm_groups = posm_demand.len(),
            posm_types = totals.len(),
            region_groups = region_demand.len(),
            "规则阶段完成"
        );

        // ==========================================
        // 步骤3: 定价
        // ==========================================
        let book = PriceBook::new(&tables.prices);
        let (priced, missing_price_tiers) = pricing::price_totals(&book, &totals);

        // ==========================================
        // 步骤4: 区域分配 + 发货/备货
        // ==========================================
        let region_summary = self.allocator.allocate(&region_demand, &book)?;
        let allocated_totals = RegionAllocator::allocated_totals(&region_summary)?;

        // ==========================================
        // 步骤5: 组装
        // ==========================================
        let posm_summary = priced
            .iter()
            .map(|p| {
                let allocated = allocated_totals.get(&p.total.posm_type).copied();
                if let Some(allocated) = allocated {
                    if allocated != p.total.adjusted_quantity {
                        // 区域口径与 POSM 口径分组不同, 合计可不一致
                        debug!(
                            posm = %p.total.posm_type,
                            region_allocated = allocated,
                            posm_adjusted = p.total.adjusted_quantity,
                            "区域分配合计与 POSM 调整后数量不一致"
                        );
                    }
                }
                let split = self.allocator.split_send(&p.total, allocated);
                ResultAssembler.posm_row(p, book.name_of(&p.total.posm_type), split)
            })
            .collect();

        let priority_detail = ResultAssembler.priority_rows(&posm_demand, &book);
        let address_summary = aggregation::address_summary(records)?;
        let category_allocations = self.category_allocations(records, &book)?;

        let diagnostics = Diagnostics {
            display_rows: tables.displays.len(),
            joined_rows: records.len(),
            unmatched_store_rows: joined.stats.unmatched_store_rows,
            unmatched_model_rows: joined.stats.unmatched_model_rows,
            unmapped_posm_rows: joined.stats.unmapped_posm_rows,
            missing_priority_rows: exclusions.missing_priority_rows,
            missing_region_rows: exclusions.missing_region_rows,
            fanout_rows: joined.stats.fanout_rows,
            duplicate_store_keys: joined.stats.duplicate_store_keys,
            duplicate_model_keys: joined.stats.duplicate_model_keys,
            duplicate_posm_mappings: joined.stats.duplicate_posm_mappings,
            duplicate_price_entries: book.duplicate_entries(),
            missing_price_tiers,
        };

        if diagnostics.has_warnings() {
            warn!(
                excluded_rows = diagnostics.excluded_from_posm(),
                missing_region_rows = diagnostics.missing_region_rows,
                missing_price_tiers = diagnostics.missing_price_tiers.len(),
                "计算完成, 存在数据质量问题, 请核对诊断信息"
            );
        }

        let report = PosmReport {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            posm_summary,
            priority_detail,
            region_summary,
            address_summary,
            category_allocations,
            diagnostics,
        };

        info!(
            run_id = %report.run_id,
            posm_types = report.posm_summary.len(),
            region_rows = report.region_summary.len(),
            total_cost_adjusted = report.total_cost_adjusted(),
            "POSM 计算完成"
        );
        Ok(report)
    }

    /// 按品类过滤后重新执行区域聚合与分配
    pub fn category_allocation(
        &self,
        records: &[JoinedRecord],
        book: &PriceBook,
        scope: CategoryScope<'_>,
    ) -> EngineResult<CategoryAllocation> {
        let filtered: Vec<JoinedRecord> = records
            .iter()
            .filter(|r| scope.matches(r))
            .cloned()
            .collect();

        let region_demand = DemandAggregator::new(&self.rule).region_demand(&filtered)?;
        Ok(CategoryAllocation {
            label: scope.label(),
            rows: self.allocator.allocate(&region_demand, book)?,
        })
    }

    fn category_allocations(
        &self,
        records: &[JoinedRecord],
        book: &PriceBook,
    ) -> EngineResult<Vec<CategoryAllocation>> {
        let mut allocations = Vec::with_capacity(self.config.category_splits.len() * 2);
        for category in &self.config.category_splits {
            for scope in [CategoryScope::Within(category), CategoryScope::Outside(category)] {
                allocations.push(self.category_allocation(records, book, scope)?);
            }
        }
        Ok(allocations)
    }
}
