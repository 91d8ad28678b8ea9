//! 生產計劃主計算器

use prodplan_core::{
    PlannerConfig, Product, ProductionPlan, ProductionPlanItem, RawMaterial, RemainingStock,
};

use crate::{PlanOutcome, PlanWarning, StockPool};

/// 生產計劃計算器
///
/// 貪婪演算法：依單價由高至低處理候選產品，每個產品生產到受限原物料耗盡為止，
/// 再處理下一個產品。這不保證全域最佳解。
#[derive(Debug, Clone, Default)]
pub struct ProductionCalculator {
    config: PlannerConfig,
}

impl ProductionCalculator {
    /// 創建新的計算器
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// 主計算入口
    ///
    /// 不修改輸入快照；庫存扣減只發生在本次計算私有的 [`StockPool`]。
    pub fn calculate(
        &self,
        products: &[Product],
        raw_materials: &[RawMaterial],
    ) -> prodplan_core::Result<PlanOutcome> {
        tracing::info!(
            "開始生產計劃計算：產品 {} 筆，原物料 {} 筆",
            products.len(),
            raw_materials.len()
        );

        let start_time = std::time::Instant::now();

        // Step 1: 驗證快照
        tracing::debug!("Step 1: 驗證快照");
        crate::validation::validate_snapshot(products, raw_materials)?;

        // Step 2: 建立庫存池
        tracing::debug!("Step 2: 建立庫存池");
        let mut pool = StockPool::from_materials(raw_materials);
        tracing::debug!("可用原物料數量: {}", pool.len());

        // Step 3: 篩選並排序候選產品
        tracing::debug!("Step 3: 篩選候選產品");
        let mut warnings = Vec::new();
        let candidates = crate::candidates::select_candidates(
            products,
            raw_materials,
            &pool,
            &self.config,
            &mut warnings,
        )?;
        tracing::debug!("候選產品數量: {}", candidates.len());

        // Step 4: 貪婪分配
        tracing::debug!("Step 4: 貪婪分配");
        let mut items = Vec::new();
        for product in candidates {
            let units = pool.max_producible(&product.materials)?;
            if units == 0 {
                tracing::debug!("產品 {} 原物料不足，跳過", product.sku);
                warnings.push(PlanWarning::info(
                    product.sku.clone(),
                    "原物料不足，無法生產".to_string(),
                ));
                continue;
            }

            pool.consume(&product.materials, units)?;
            tracing::debug!(
                "產品 {} 生產 {} 單位（單價 {}）",
                product.sku,
                units,
                product.unit_price
            );
            items.push(ProductionPlanItem::for_product(product, units)?);
        }

        // Step 5: 組裝結果
        tracing::debug!("Step 5: 組裝結果");
        let plan = ProductionPlan::assemble(items, remaining_stock(raw_materials, &pool))?;

        let mut outcome = PlanOutcome::new(plan);
        for warning in warnings {
            outcome.add_warning(warning);
        }
        outcome.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            run_id = %outcome.run_id,
            "生產計劃計算完成，耗時 {:?}",
            start_time.elapsed()
        );
        tracing::info!(
            "計劃明細 {} 筆，總數量 {}，總值 {}",
            outcome.plan.items.len(),
            outcome.plan.total_units,
            outcome.plan.total_production_value
        );

        Ok(outcome)
    }

    /// 獲取配置引用
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}

/// 每項原物料的剩餘數量；停用原物料不在池中，回報其原始庫存
fn remaining_stock(raw_materials: &[RawMaterial], pool: &StockPool) -> Vec<RemainingStock> {
    raw_materials
        .iter()
        .map(|material| {
            let quantity = pool
                .remaining(material.id)
                .unwrap_or(material.stock_quantity);
            RemainingStock::new(material, quantity)
        })
        .collect()
}
