//! 候選產品篩選與排序

use prodplan_core::{
    PlanError, PlannerConfig, Product, RawMaterial, RawMaterialId, Result, TieBreakRule,
};
use std::collections::HashMap;

use crate::{PlanWarning, StockPool};

/// 篩選可參與計劃的產品，並依單價由高至低排序
///
/// 排除：停用產品、BOM 為空的產品、BOM 引用停用或不存在原物料的產品。
/// 嚴格模式下，引用不存在的原物料會使整個計算失敗。
pub fn select_candidates<'a>(
    products: &'a [Product],
    raw_materials: &[RawMaterial],
    pool: &StockPool,
    config: &PlannerConfig,
    warnings: &mut Vec<PlanWarning>,
) -> Result<Vec<&'a Product>> {
    let known: HashMap<RawMaterialId, &RawMaterial> =
        raw_materials.iter().map(|m| (m.id, m)).collect();

    let mut candidates = Vec::new();
    for product in products {
        if !product.is_plannable() {
            tracing::debug!("產品 {} 已停用或沒有 BOM，跳過", product.sku);
            continue;
        }
        if !references_resolve(product, &known, pool, config, warnings)? {
            continue;
        }
        candidates.push(product);
    }

    // 穩定排序：InputOrder 規則下同單價保持輸入順序
    match config.tie_break {
        TieBreakRule::ProductId => candidates.sort_by(|a, b| {
            b.unit_price
                .cmp(&a.unit_price)
                .then_with(|| a.id.cmp(&b.id))
        }),
        TieBreakRule::InputOrder => candidates.sort_by(|a, b| b.unit_price.cmp(&a.unit_price)),
    }

    Ok(candidates)
}

/// 檢查 BOM 引用的原物料是否都存在且啟用
fn references_resolve(
    product: &Product,
    known: &HashMap<RawMaterialId, &RawMaterial>,
    pool: &StockPool,
    config: &PlannerConfig,
    warnings: &mut Vec<PlanWarning>,
) -> Result<bool> {
    for line in &product.materials {
        match known.get(&line.raw_material_id) {
            None => {
                if config.strict_references {
                    return Err(PlanError::UnknownMaterialReference {
                        product_id: product.id,
                        raw_material_id: line.raw_material_id,
                    });
                }
                tracing::warn!(
                    "產品 {} 引用不存在的原物料 {}，視為不可生產",
                    product.sku,
                    line.raw_material_id
                );
                warnings.push(PlanWarning::warning(
                    product.sku.clone(),
                    format!("BOM 引用不存在的原物料 {}", line.raw_material_id),
                ));
                return Ok(false);
            }
            Some(material) if !pool.contains(material.id) => {
                tracing::warn!(
                    "產品 {} 引用停用的原物料 {}，視為不可生產",
                    product.sku,
                    material.code
                );
                warnings.push(PlanWarning::warning(
                    product.sku.clone(),
                    format!("BOM 引用停用的原物料 {}", material.code),
                ));
                return Ok(false);
            }
            Some(_) => {}
        }
    }
    Ok(true)
}
