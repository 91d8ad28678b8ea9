//! 庫存池：單次計劃的原物料剩餘帳

use prodplan_core::{BillOfMaterialItem, PlanError, RawMaterial, RawMaterialId, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// 庫存池
///
/// 只由啟用中的原物料建立；停用原物料不提供可用庫存。
/// 池中數量只減不增，且永不為負。
#[derive(Debug, Clone, Default)]
pub struct StockPool {
    available: BTreeMap<RawMaterialId, Decimal>,
}

impl StockPool {
    /// 由原物料快照建立庫存池（複製數量，不持有快照）
    pub fn from_materials(raw_materials: &[RawMaterial]) -> Self {
        let available = raw_materials
            .iter()
            .filter(|m| m.active)
            .map(|m| (m.id, m.stock_quantity))
            .collect();
        Self { available }
    }

    /// 原物料是否在池中
    pub fn contains(&self, raw_material_id: RawMaterialId) -> bool {
        self.available.contains_key(&raw_material_id)
    }

    /// 可用數量（不在池中視為 0）
    pub fn available(&self, raw_material_id: RawMaterialId) -> Decimal {
        self.available
            .get(&raw_material_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 計算最大可生產數量
    ///
    /// 對每條 BOM 明細取 `floor(可用 / 單位用量)`，回傳其最小值。
    /// BOM 為空、任一原物料不在池中或可用量為 0 時回傳 0。
    /// 數量超過 `u64` 上限時回傳 `InvalidCatalogData`。
    pub fn max_producible(&self, materials: &[BillOfMaterialItem]) -> Result<u64> {
        let mut max_units: Option<u64> = None;

        for line in materials {
            let available = self.available(line.raw_material_id);
            if available <= Decimal::ZERO {
                return Ok(0);
            }
            if line.quantity_required <= Decimal::ZERO {
                return Err(PlanError::invalid(format!(
                    "原物料 {} 的 BOM 用量必須為正",
                    line.raw_material_id
                )));
            }

            let possible = units_from_line(line, available)?;
            if possible == 0 {
                return Ok(0);
            }
            max_units = Some(max_units.map_or(possible, |current| current.min(possible)));
        }

        Ok(max_units.unwrap_or(0))
    }

    /// 扣減生產 `units` 單位所需的原物料
    ///
    /// 先檢查所有明細再扣減，任一不足則不做任何變更。
    pub fn consume(&mut self, materials: &[BillOfMaterialItem], units: u64) -> Result<()> {
        let mut deductions = Vec::with_capacity(materials.len());
        for line in materials {
            let needed = line.consumption_for(units)?;
            let available = self.available(line.raw_material_id);
            if needed > available {
                return Err(PlanError::CalculationError(format!(
                    "原物料 {} 不足：需要 {}, 可用 {}",
                    line.raw_material_id, needed, available
                )));
            }
            deductions.push((line.raw_material_id, available - needed));
        }

        for (raw_material_id, remaining) in deductions {
            self.available.insert(raw_material_id, remaining);
        }
        Ok(())
    }

    /// 原物料剩餘數量（池外原物料回傳 None）
    pub fn remaining(&self, raw_material_id: RawMaterialId) -> Option<Decimal> {
        self.available.get(&raw_material_id).copied()
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

/// 單一明細可支撐的整數單位數
fn units_from_line(line: &BillOfMaterialItem, available: Decimal) -> Result<u64> {
    let ratio = available
        .checked_div(line.quantity_required)
        .ok_or_else(|| quantity_limit(line.raw_material_id))?;
    let mut units = ratio
        .floor()
        .to_u64()
        .ok_or_else(|| quantity_limit(line.raw_material_id))?;

    // 商只保留 28 位有效數字，可能進位到下一個整數
    while units > 0 && line.consumption_for(units)? > available {
        units -= 1;
    }
    Ok(units)
}

fn quantity_limit(raw_material_id: RawMaterialId) -> PlanError {
    PlanError::invalid(format!(
        "原物料 {raw_material_id} 可生產數量超出上限 {}",
        u64::MAX
    ))
}
