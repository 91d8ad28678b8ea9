//! # prodplan
//!
//! 依單價優先分配原物料的生產計劃系統
//!
//! - [`model`]：原物料、產品、BOM 與計劃模型
//! - [`engine`]：貪婪分配引擎
//! - [`service`]：目錄維護、計劃服務與 JSON 輸出

pub use prodplan_calc as engine;
pub use prodplan_core as model;
pub use prodplan_service as service;

pub use prodplan_calc::{compute_plan, ProductionCalculator};
pub use prodplan_core::{PlanError, PlannerConfig, ProductionPlan, Result};
pub use prodplan_service::{InMemoryCatalog, PlanReport, ProductionService};
