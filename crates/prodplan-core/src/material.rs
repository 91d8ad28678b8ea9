//! 原物料模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{validate_code, validate_name, PlanError, Result};

/// 原物料ID（正整數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RawMaterialId(u64);

impl RawMaterialId {
    /// 創建原物料ID，0 不是合法值
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(PlanError::invalid("原物料ID必須為正整數"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for RawMaterialId {
    type Error = PlanError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RawMaterialId> for u64 {
    fn from(id: RawMaterialId) -> Self {
        id.0
    }
}

impl fmt::Display for RawMaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RM-{}", self.0)
    }
}

/// 計量單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementUnit {
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "mL")]
    Milliliter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "un")]
    Unit,
    #[serde(rename = "pc")]
    Piece,
    #[serde(rename = "pr")]
    Pair,
    #[serde(rename = "box")]
    Box,
    #[serde(rename = "roll")]
    Roll,
    #[serde(rename = "sheet")]
    Sheet,
}

impl MeasurementUnit {
    pub const ALL: [MeasurementUnit; 12] = [
        Self::Kilogram,
        Self::Gram,
        Self::Liter,
        Self::Milliliter,
        Self::Meter,
        Self::Centimeter,
        Self::Unit,
        Self::Piece,
        Self::Pair,
        Self::Box,
        Self::Roll,
        Self::Sheet,
    ];

    /// 單位縮寫
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Kilogram => "kg",
            Self::Gram => "g",
            Self::Liter => "L",
            Self::Milliliter => "mL",
            Self::Meter => "m",
            Self::Centimeter => "cm",
            Self::Unit => "un",
            Self::Piece => "pc",
            Self::Pair => "pr",
            Self::Box => "box",
            Self::Roll => "roll",
            Self::Sheet => "sheet",
        }
    }

    /// 顯示名稱
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Kilogram => "Kilogram",
            Self::Gram => "Gram",
            Self::Liter => "Liter",
            Self::Milliliter => "Milliliter",
            Self::Meter => "Meter",
            Self::Centimeter => "Centimeter",
            Self::Unit => "Unit",
            Self::Piece => "Piece",
            Self::Pair => "Pair",
            Self::Box => "Box",
            Self::Roll => "Roll",
            Self::Sheet => "Sheet",
        }
    }

    /// 由縮寫解析（不分大小寫）
    pub fn from_abbreviation(abbreviation: &str) -> Result<Self> {
        let wanted = abbreviation.trim();
        if wanted.is_empty() {
            return Err(PlanError::invalid("計量單位縮寫不可為空"));
        }
        Self::ALL
            .into_iter()
            .find(|unit| unit.abbreviation().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PlanError::invalid(format!("未知的計量單位: {wanted}")))
    }
}

/// 原物料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    /// 原物料ID
    pub id: RawMaterialId,

    /// 顯示名稱
    pub name: String,

    /// 說明
    #[serde(default)]
    pub description: Option<String>,

    /// 原物料代碼（大寫）
    pub code: String,

    /// 計量單位
    pub unit: MeasurementUnit,

    /// 現有庫存
    pub stock_quantity: Decimal,

    /// 單位成本
    #[serde(default)]
    pub unit_cost: Decimal,

    /// 是否啟用
    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl RawMaterial {
    /// 創建新的原物料（預設啟用）
    pub fn new(
        id: RawMaterialId,
        name: &str,
        code: &str,
        unit: MeasurementUnit,
        stock_quantity: Decimal,
        unit_cost: Decimal,
    ) -> Result<Self> {
        let name = validate_name("原物料", name)?;
        let code = validate_code("原物料代碼", code)?;
        validate_stock_quantity(stock_quantity)?;
        validate_unit_cost(unit_cost)?;

        let now = Utc::now();
        Ok(Self {
            id,
            name,
            description: None,
            code,
            unit,
            stock_quantity,
            unit_cost,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// 建構器模式：設置說明
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = normalize_description(Some(description));
        self
    }

    /// 更新基本資料（庫存需透過 `adjust_stock` 調整）
    pub fn update(
        &mut self,
        name: &str,
        description: Option<&str>,
        code: &str,
        unit: MeasurementUnit,
        unit_cost: Decimal,
    ) -> Result<()> {
        let name = validate_name("原物料", name)?;
        let code = validate_code("原物料代碼", code)?;
        validate_unit_cost(unit_cost)?;

        self.name = name;
        self.description = normalize_description(description);
        self.code = code;
        self.unit = unit;
        self.unit_cost = unit_cost;
        self.touch();
        Ok(())
    }

    /// 重新檢查反序列化的資料，代碼正規化為大寫
    pub fn validated(mut self) -> Result<Self> {
        self.name = validate_name("原物料", &self.name)?;
        self.code = validate_code("原物料代碼", &self.code)?;
        self.description = normalize_description(self.description.as_deref());
        validate_stock_quantity(self.stock_quantity)?;
        validate_unit_cost(self.unit_cost)?;
        Ok(self)
    }

    /// 調整庫存（正數入庫、負數出庫）
    pub fn adjust_stock(&mut self, delta: Decimal) -> Result<()> {
        let new_quantity = self.stock_quantity + delta;
        if new_quantity < Decimal::ZERO {
            return Err(PlanError::InsufficientStock(format!(
                "{} 庫存 {} {}，無法調整 {}",
                self.code,
                self.stock_quantity,
                self.unit.abbreviation(),
                delta
            )));
        }
        self.stock_quantity = new_quantity;
        self.touch();
        Ok(())
    }

    /// 檢查庫存是否足夠
    pub fn has_sufficient_stock(&self, required: Decimal) -> bool {
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

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_stock_quantity(quantity: Decimal) -> Result<()> {
    if quantity < Decimal::ZERO {
        return Err(PlanError::invalid(format!("庫存數量不可為負: {quantity}")));
    }
    Ok(())
}

fn validate_unit_cost(unit_cost: Decimal) -> Result<()> {
    if unit_cost < Decimal::ZERO {
        return Err(PlanError::invalid(format!("單位成本不可為負: {unit_cost}")));
    }
    Ok(())
}

pub(crate) fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
