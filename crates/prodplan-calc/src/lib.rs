//! # Production Planning Engine
//!
//! 貪婪生產計劃引擎：依單價由高至低分配原物料庫存

pub mod calculator;
pub mod candidates;
pub mod stock_pool;
pub mod validation;

// Re-export 主要類型
pub use calculator::ProductionCalculator;
pub use stock_pool::StockPool;

use prodplan_core::{PlannerConfig, Product, ProductionPlan, RawMaterial};
use serde::Serialize;
use uuid::Uuid;

/// 以預設配置計算生產計劃
pub fn compute_plan(
    products: &[Product],
    raw_materials: &[RawMaterial],
) -> prodplan_core::Result<ProductionPlan> {
    ProductionCalculator::new(PlannerConfig::default())
        .calculate(products, raw_materials)
        .map(|outcome| outcome.plan)
}

/// 計算結果
///
/// `plan` 只由輸入決定；`run_id` 與耗時屬於診斷資訊。
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    /// 生產計劃
    pub plan: ProductionPlan,

    /// 警告信息
    pub warnings: Vec<PlanWarning>,

    /// 計算批次ID
    pub run_id: Uuid,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl PlanOutcome {
    /// 創建結果
    pub fn new(plan: ProductionPlan) -> Self {
        Self {
            plan,
            warnings: Vec::new(),
            run_id: Uuid::new_v4(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: PlanWarning) {
        self.warnings.push(warning);
    }

    /// 是否有指定嚴重度以上的警告
    pub fn has_warnings_at(&self, severity: WarningSeverity) -> bool {
        self.warnings.iter().any(|w| w.severity >= severity)
    }
}

/// 計劃警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanWarning {
    /// 相關對象（產品 SKU 或原物料代碼）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl PlanWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}
