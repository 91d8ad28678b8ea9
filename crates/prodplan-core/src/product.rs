//! 產品與 BOM 模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::material::normalize_description;
use crate::{validate_code, validate_name, PlanError, RawMaterialId, Result};

/// 產品ID（正整數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ProductId(u64);

impl ProductId {
    /// 創建產品ID，0 不是合法值
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(PlanError::invalid("產品ID必須為正整數"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ProductId {
    type Error = PlanError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProductId> for u64 {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// BOM 明細：每生產一單位產品所需的原物料數量
///
/// 反序列化不經過建構子檢查，計算引擎會再次驗證 `quantity_required > 0`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterialItem {
    /// 原物料ID
    pub raw_material_id: RawMaterialId,

    /// 單位用量
    pub quantity_required: Decimal,
}

impl BillOfMaterialItem {
    /// 創建 BOM 明細，用量必須為正
    pub fn new(raw_material_id: RawMaterialId, quantity_required: Decimal) -> Result<Self> {
        validate_quantity_required(quantity_required)?;
        Ok(Self {
            raw_material_id,
            quantity_required,
        })
    }

    /// 計算生產 `units` 單位所需的用量
    pub fn consumption_for(&self, units: u64) -> Result<Decimal> {
        self.quantity_required
            .checked_mul(Decimal::from(units))
            .ok_or_else(|| {
                PlanError::CalculationError(format!(
                    "原物料 {} 用量計算溢位",
                    self.raw_material_id
                ))
            })
    }
}

/// 產品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 產品ID
    pub id: ProductId,

    /// 顯示名稱
    pub name: String,

    /// 說明
    #[serde(default)]
    pub description: Option<String>,

    /// SKU（大寫）
    pub sku: String,

    /// 單價
    pub unit_price: Decimal,

    /// 成品庫存
    #[serde(default)]
    pub stock_quantity: u32,

    /// 是否啟用
    #[serde(default = "default_active")]
    pub active: bool,

    /// 物料清單
    #[serde(default)]
    pub materials: Vec<BillOfMaterialItem>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// 創建新的產品（預設啟用、空 BOM）
    pub fn new(id: ProductId, name: &str, sku: &str, unit_price: Decimal) -> Result<Self> {
        let name = validate_name("產品", name)?;
        let sku = validate_code("產品 SKU", sku)?;
        validate_unit_price(unit_price)?;

        let now = Utc::now();
        Ok(Self {
            id,
            name,
            description: None,
            sku,
            unit_price,
            stock_quantity: 0,
            active: true,
            materials: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// 建構器模式：設置說明
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = normalize_description(Some(description));
        self
    }

    /// 建構器模式：設置成品庫存
    pub fn with_stock_quantity(mut self, stock_quantity: u32) -> Self {
        self.stock_quantity = stock_quantity;
        self
    }

    /// 建構器模式：加入 BOM 明細
    pub fn with_material(
        mut self,
        raw_material_id: RawMaterialId,
        quantity: Decimal,
    ) -> Result<Self> {
        self.add_material(raw_material_id, quantity)?;
        Ok(self)
    }

    /// 更新基本資料
    pub fn update(
        &mut self,
        name: &str,
        description: Option<&str>,
        sku: &str,
        unit_price: Decimal,
    ) -> Result<()> {
        let name = validate_name("產品", name)?;
        let sku = validate_code("產品 SKU", sku)?;
        validate_unit_price(unit_price)?;

        self.name = name;
        self.description = normalize_description(description);
        self.sku = sku;
        self.unit_price = unit_price;
        self.touch();
        Ok(())
    }

    /// 重新檢查反序列化的資料：名稱、SKU（正規化為大寫）、單價與 BOM 明細
    pub fn validated(mut self) -> Result<Self> {
        self.name = validate_name("產品", &self.name)?;
        self.sku = validate_code("產品 SKU", &self.sku)?;
        self.description = normalize_description(self.description.as_deref());
        validate_unit_price(self.unit_price)?;

        let mut seen = HashSet::new();
        for line in &self.materials {
            validate_quantity_required(line.quantity_required)?;
            if !seen.insert(line.raw_material_id) {
                return Err(PlanError::invalid(format!(
                    "產品 {} 的 BOM 中原物料重複: {}",
                    self.sku, line.raw_material_id
                )));
            }
        }
        Ok(self)
    }

    /// 調整成品庫存
    pub fn adjust_stock(&mut self, delta: i64) -> Result<()> {
        let new_quantity = i64::from(self.stock_quantity) + delta;
        if new_quantity < 0 {
            return Err(PlanError::InsufficientStock(format!(
                "{} 成品庫存 {}，無法調整 {}",
                self.sku, self.stock_quantity, delta
            )));
        }
        self.stock_quantity = u32::try_from(new_quantity)
            .map_err(|_| PlanError::invalid(format!("成品庫存超出上限: {new_quantity}")))?;
        self.touch();
        Ok(())
    }

    pub fn has_sufficient_stock(&self, required: u32) -> bool {
        self.stock_quantity >= required
    }

    pub fn activate(&mut self) {
        self.active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    /// 加入 BOM 明細（同一原物料不可重複）
    pub fn add_material(
        &mut self,
        raw_material_id: RawMaterialId,
        quantity: Decimal,
    ) -> Result<()> {
        if self.bom_line(raw_material_id).is_some() {
            return Err(PlanError::Conflict(format!(
                "原物料 {raw_material_id} 已在 {} 的 BOM 中",
                self.sku
            )));
        }
        self.materials
            .push(BillOfMaterialItem::new(raw_material_id, quantity)?);
        self.touch();
        Ok(())
    }

    /// 移除 BOM 明細
    pub fn remove_material(&mut self, raw_material_id: RawMaterialId) -> Result<()> {
        let before = self.materials.len();
        self.materials
            .retain(|line| line.raw_material_id != raw_material_id);
        if self.materials.len() == before {
            return Err(PlanError::NotFound(format!(
                "原物料 {raw_material_id} 不在 {} 的 BOM 中",
                self.sku
            )));
        }
        self.touch();
        Ok(())
    }

    /// 更新 BOM 單位用量
    pub fn update_material_quantity(
        &mut self,
        raw_material_id: RawMaterialId,
        quantity: Decimal,
    ) -> Result<()> {
        validate_quantity_required(quantity)?;
        let sku = self.sku.clone();
        let line = self
            .materials
            .iter_mut()
            .find(|line| line.raw_material_id == raw_material_id)
            .ok_or_else(|| {
                PlanError::NotFound(format!("原物料 {raw_material_id} 不在 {sku} 的 BOM 中"))
            })?;
        line.quantity_required = quantity;
        self.touch();
        Ok(())
    }

    /// 查詢 BOM 明細
    pub fn bom_line(&self, raw_material_id: RawMaterialId) -> Option<&BillOfMaterialItem> {
        self.materials
            .iter()
            .find(|line| line.raw_material_id == raw_material_id)
    }

    /// 是否可參與生產計劃（啟用且 BOM 非空）
    pub fn is_plannable(&self) -> bool {
        self.active && !self.materials.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_unit_price(unit_price: Decimal) -> Result<()> {
    if unit_price < Decimal::ZERO {
        return Err(PlanError::invalid(format!("單價不可為負: {unit_price}")));
    }
    Ok(())
}

fn validate_quantity_required(quantity: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(PlanError::invalid(format!("BOM 單位用量必須為正: {quantity}")));
    }
    Ok(())
}
