//! 生產計劃模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PlanError, Product, ProductId, RawMaterial, RawMaterialId, Result};

/// 生產計劃明細（單一產品的生產數量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlanItem {
    /// 產品ID
    pub product_id: ProductId,

    /// 產品名稱
    pub product_name: String,

    /// 產品 SKU
    pub product_sku: String,

    /// 生產數量
    pub quantity: u64,

    /// 單價
    pub unit_price: Decimal,

    /// 小計（數量 × 單價）
    pub total_value: Decimal,
}

impl ProductionPlanItem {
    /// 由產品與生產數量創建明細，數量必須為正
    pub fn for_product(product: &Product, quantity: u64) -> Result<Self> {
        if quantity == 0 {
            return Err(PlanError::CalculationError(format!(
                "產品 {} 的生產數量必須為正",
                product.id
            )));
        }
        let total_value = product
            .unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| {
                PlanError::CalculationError(format!("產品 {} 的生產總值溢位", product.id))
            })?;

        Ok(Self {
            product_id: product.id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            quantity,
            unit_price: product.unit_price,
            total_value,
        })
    }
}

/// 計劃後的原物料剩餘庫存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingStock {
    pub raw_material_id: RawMaterialId,
    pub name: String,
    pub code: String,
    pub quantity: Decimal,
}

impl RemainingStock {
    pub fn new(material: &RawMaterial, quantity: Decimal) -> Self {
        Self {
            raw_material_id: material.id,
            name: material.name.clone(),
            code: material.code.clone(),
            quantity,
        }
    }
}

/// 生產計劃（計算引擎輸出）
///
/// `items` 依選擇順序排列（單價高者在前），`remaining_stock` 依原物料ID排序，
/// 並包含快照中的每一項原物料。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPlan {
    pub items: Vec<ProductionPlanItem>,
    pub total_production_value: Decimal,
    pub total_units: u64,
    pub remaining_stock: Vec<RemainingStock>,
}

impl ProductionPlan {
    /// 由明細與剩餘庫存組裝計劃，總值與總數量由明細加總
    pub fn assemble(
        items: Vec<ProductionPlanItem>,
        mut remaining_stock: Vec<RemainingStock>,
    ) -> Result<Self> {
        let mut total_production_value = Decimal::ZERO;
        let mut total_units: u64 = 0;
        for item in &items {
            total_production_value = total_production_value
                .checked_add(item.total_value)
                .ok_or_else(|| PlanError::CalculationError("生產總值溢位".to_string()))?;
            total_units = total_units
                .checked_add(item.quantity)
                .ok_or_else(|| PlanError::CalculationError("生產總數量溢位".to_string()))?;
        }
        remaining_stock.sort_by_key(|entry| entry.raw_material_id);

        Ok(Self {
            items,
            total_production_value,
            total_units,
            remaining_stock,
        })
    }


    /// 是否有任何生產
    pub fn has_production(&self) -> bool {
        !self.items.is_empty()
    }

    /// 查詢原物料剩餘庫存
    pub fn remaining_for(&self, raw_material_id: RawMaterialId) -> Option<Decimal> {
        self.remaining_stock
            .iter()
            .find(|entry| entry.raw_material_id == raw_material_id)
            .map(|entry| entry.quantity)
    }

    /// 查詢產品的計劃明細
    pub fn item_for(&self, product_id: ProductId) -> Option<&ProductionPlanItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MeasurementUnit;

    fn product(id: u64, price: i64) -> Product {
        Product::new(
            ProductId::new(id).unwrap(),
            &format!("Product {id}"),
            &format!("SKU-{id}"),
            Decimal::from(price),
        )
        .unwrap()
    }

    fn material(id: u64, stock: i64) -> RawMaterial {
        RawMaterial::new(
            RawMaterialId::new(id).unwrap(),
            &format!("Material {id}"),
            &format!("RM-{id}"),
            MeasurementUnit::Kilogram,
            Decimal::from(stock),
            Decimal::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_item_total_value() {
        let item = ProductionPlanItem::for_product(&product(1, 85), 50).unwrap();

        assert_eq!(item.total_value, Decimal::from(4250));
        assert_eq!(item.product_sku, "SKU-1");
        assert!(ProductionPlanItem::for_product(&product(1, 85), 0).is_err());
    }

    #[test]
    fn test_assemble_totals() {
        let items = vec![
            ProductionPlanItem::for_product(&product(2, 100), 2).unwrap(),
            ProductionPlanItem::for_product(&product(1, 30), 1).unwrap(),
        ];
        let remaining = vec![
            RemainingStock::new(&material(2, 7), Decimal::from(7)),
            RemainingStock::new(&material(1, 25), Decimal::ZERO),
        ];

        let plan = ProductionPlan::assemble(items, remaining).unwrap();

        assert!(plan.has_production());
        assert_eq!(plan.total_production_value, Decimal::from(230));
        assert_eq!(plan.total_units, 3);
        // 選擇順序保留，剩餘庫存依ID排序
        assert_eq!(plan.items[0].product_id.value(), 2);
        assert_eq!(plan.remaining_stock[0].raw_material_id.value(), 1);
        assert_eq!(
            plan.remaining_for(RawMaterialId::new(2).unwrap()),
            Some(Decimal::from(7))
        );
        assert!(plan.item_for(ProductId::new(1).unwrap()).is_some());
    }

    #[test]
    fn test_empty_plan() {
        let plan = ProductionPlan::assemble(
            Vec::new(),
            vec![RemainingStock::new(&material(1, 10), Decimal::from(10))],
        )
        .unwrap();

        assert!(!plan.has_production());
        assert_eq!(plan.total_production_value, Decimal::ZERO);
        assert_eq!(plan.total_units, 0);
        assert_eq!(plan.remaining_stock.len(), 1);
    }
}
