//! 計劃輸出格式（前端使用的 JSON 結構）

use chrono::{DateTime, Utc};
use prodplan_core::{PlanError, ProductionPlan, ProductionPlanItem, RemainingStock};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 生產計劃回應
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub items: Vec<PlanReportItem>,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_production_value: Decimal,

    pub total_units: u64,

    /// 原物料顯示名稱 → 剩餘數量
    #[serde(with = "decimal_map")]
    pub remaining_stock: BTreeMap<String, Decimal>,
}

/// 生產計劃回應明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReportItem {
    pub product_id: u64,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u64,

    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
}

impl From<&ProductionPlanItem> for PlanReportItem {
    fn from(item: &ProductionPlanItem) -> Self {
        Self {
            product_id: item.product_id.value(),
            product_name: item.product_name.clone(),
            product_sku: item.product_sku.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_value: item.total_value,
        }
    }
}

impl PlanReport {
    /// 由生產計劃轉換
    ///
    /// 剩餘庫存以顯示名稱為鍵；名稱重複時，ID較大者改用 `"名稱 [代碼]"`，
    /// 仍衝突則再加序號 `"名稱 [代碼] (n)"`，每項原物料都保有一個鍵。
    pub fn from_plan(plan: &ProductionPlan) -> Self {
        let mut remaining_stock = BTreeMap::new();
        for entry in &plan.remaining_stock {
            let key = free_key(&remaining_stock, entry);
            remaining_stock.insert(key, entry.quantity);
        }

        Self {
            items: plan.items.iter().map(PlanReportItem::from).collect(),
            total_production_value: plan.total_production_value,
            total_units: plan.total_units,
            remaining_stock,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn free_key(taken: &BTreeMap<String, Decimal>, entry: &RemainingStock) -> String {
    if !taken.contains_key(&entry.name) {
        return entry.name.clone();
    }
    let fallback = format!("{} [{}]", entry.name, entry.code);
    if !taken.contains_key(&fallback) {
        return fallback;
    }
    (2..)
        .map(|n| format!("{fallback} ({n})"))
        .find(|key| !taken.contains_key(key))
        .unwrap_or(fallback)
}

/// 錯誤回應
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: &'static str,
    pub message: String,
}

impl ErrorBody {
    /// 將計劃錯誤對應為 HTTP 狀態碼
    pub fn from_error(error: &PlanError) -> Self {
        let (status, reason) = match error {
            PlanError::InvalidCatalogData(_)
            | PlanError::UnknownMaterialReference { .. }
            | PlanError::InsufficientStock(_) => (400, "Bad Request"),
            PlanError::NotFound(_) => (404, "Not Found"),
            PlanError::Conflict(_) => (409, "Conflict"),
            PlanError::CalculationError(_) => (500, "Internal Server Error"),
        };

        Self {
            timestamp: Utc::now(),
            status,
            error: reason,
            message: error.to_string(),
        }
    }
}

/// 以 JSON 數字序列化 `BTreeMap<String, Decimal>`
mod decimal_map {
    use rust_decimal::Decimal;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    struct AsFloat<'a>(&'a Decimal);

    impl Serialize for AsFloat<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            rust_decimal::serde::float::serialize(self.0, serializer)
        }
    }

    #[derive(Deserialize)]
    struct FromFloat(#[serde(with = "rust_decimal::serde::float")] Decimal);

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (key, value) in map {
            out.serialize_entry(key, &AsFloat(value))?;
        }
        out.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Decimal>, D::Error> {
        let raw = BTreeMap::<String, FromFloat>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(key, FromFloat(value))| (key, value)).collect())
    }
}
