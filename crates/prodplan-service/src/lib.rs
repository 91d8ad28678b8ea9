//! # Production Planning Service
//!
//! 目錄維護、生產計劃計算與 JSON 輸出

pub mod catalog;
pub mod logging;
pub mod production;
pub mod report;

// Re-export 主要類型
pub use catalog::{CatalogDocument, CatalogSource, InMemoryCatalog};
pub use production::{ProductionService, Scenario};
pub use report::{ErrorBody, PlanReport, PlanReportItem};
