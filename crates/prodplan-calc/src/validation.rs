//! 快照驗證
//!
//! 在任何分配之前檢查目錄快照，發現以下情況即拒絕計算（不產生部分計劃）：
//! - 產品ID或原物料ID重複
//! - 庫存為負
//! - 單價為負
//! - BOM 單位用量不為正
//! - 同一 BOM 內原物料重複

use prodplan_core::{PlanError, Product, RawMaterial, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// 驗證產品與原物料快照
pub fn validate_snapshot(products: &[Product], raw_materials: &[RawMaterial]) -> Result<()> {
    let mut material_ids = HashSet::new();
    for material in raw_materials {
        if !material_ids.insert(material.id) {
            return Err(PlanError::invalid(format!(
                "原物料ID重複: {}",
                material.id
            )));
        }
        if material.stock_quantity < Decimal::ZERO {
            return Err(PlanError::invalid(format!(
                "原物料 {} 庫存為負: {}",
                material.code, material.stock_quantity
            )));
        }
    }

    let mut product_ids = HashSet::new();
    for product in products {
        if !product_ids.insert(product.id) {
            return Err(PlanError::invalid(format!("產品ID重複: {}", product.id)));
        }
        if product.unit_price < Decimal::ZERO {
            return Err(PlanError::invalid(format!(
                "產品 {} 單價為負: {}",
                product.sku, product.unit_price
            )));
        }
        validate_bom(product)?;
    }

    Ok(())
}

fn validate_bom(product: &Product) -> Result<()> {
    let mut seen = HashSet::new();
    for line in &product.materials {
        if line.quantity_required <= Decimal::ZERO {
            return Err(PlanError::invalid(format!(
                "產品 {} 的 BOM 用量必須為正: 原物料 {} 用量 {}",
                product.sku, line.raw_material_id, line.quantity_required
            )));
        }
        if !seen.insert(line.raw_material_id) {
            return Err(PlanError::invalid(format!(
                "產品 {} 的 BOM 中原物料重複: {}",
                product.sku, line.raw_material_id
            )));
        }
    }
    Ok(())
}
