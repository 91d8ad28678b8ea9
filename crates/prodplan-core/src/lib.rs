//! # Production Planning Core
//!
//! 核心資料模型與類型定義：原物料、產品、BOM、生產計劃

pub mod config;
pub mod material;
pub mod plan;
pub mod product;

// Re-export 主要類型
pub use config::{PlannerConfig, TieBreakRule};
pub use material::{MeasurementUnit, RawMaterial, RawMaterialId};
pub use plan::{ProductionPlan, ProductionPlanItem, RemainingStock};
pub use product::{BillOfMaterialItem, Product, ProductId};

/// 生產計劃錯誤類型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("無效的目錄資料: {0}")]
    InvalidCatalogData(String),

    #[error("產品 {product_id} 的 BOM 引用了不存在的原物料 {raw_material_id}")]
    UnknownMaterialReference {
        product_id: ProductId,
        raw_material_id: RawMaterialId,
    },

    #[error("庫存不足: {0}")]
    InsufficientStock(String),

    #[error("找不到資料: {0}")]
    NotFound(String),

    #[error("資料衝突: {0}")]
    Conflict(String),

    #[error("計算錯誤: {0}")]
    CalculationError(String),
}

impl PlanError {
    /// 便利建構：無效資料
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidCatalogData(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;

/// 名稱驗證（原物料與產品共用）
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PlanError::invalid(format!("{kind}名稱不可為空")));
    }
    if trimmed.chars().count() > 255 {
        return Err(PlanError::invalid(format!("{kind}名稱不可超過 255 個字元")));
    }
    Ok(trimmed.to_string())
}

/// 代碼驗證（原物料代碼與產品 SKU 共用），回傳大寫正規化結果
pub(crate) fn validate_code(kind: &str, code: &str) -> Result<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(PlanError::invalid(format!("{kind}不可為空")));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(PlanError::invalid(format!(
            "{kind}只能包含英數字與連字號: {trimmed}"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}
