//! 生產計劃服務

use prodplan_calc::{PlanOutcome, ProductionCalculator, WarningSeverity};
use prodplan_core::{PlanError, PlannerConfig, RawMaterialId, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::CatalogSource;
use crate::report::PlanReport;

/// 假設情境：以覆寫庫存重新計算
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    /// 原物料ID → 覆寫後的庫存數量
    #[serde(default)]
    pub stock_overrides: BTreeMap<RawMaterialId, Decimal>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stock_overrides: BTreeMap::new(),
        }
    }

    pub fn with_stock(mut self, raw_material_id: RawMaterialId, quantity: Decimal) -> Self {
        self.stock_overrides.insert(raw_material_id, quantity);
        self
    }
}

/// 生產計劃服務
///
/// 每次計算都向目錄來源取得新快照，計算本身不寫回目錄。
pub struct ProductionService<C: CatalogSource> {
    catalog: C,
    calculator: ProductionCalculator,
}

impl<C: CatalogSource> ProductionService<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, PlannerConfig::default())
    }

    pub fn with_config(catalog: C, config: PlannerConfig) -> Self {
        Self {
            catalog,
            calculator: ProductionCalculator::new(config),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// 計算目前目錄的生產計劃
    pub fn calculate_production_plan(&self) -> Result<PlanReport> {
        self.calculate_outcome()
            .map(|outcome| PlanReport::from_plan(&outcome.plan))
    }

    /// 計算並保留警告與診斷資訊
    pub fn calculate_outcome(&self) -> Result<PlanOutcome> {
        let products = self.catalog.list_active_products()?;
        let raw_materials = self.catalog.list_active_raw_materials()?;
        let outcome = self.calculator.calculate(&products, &raw_materials)?;

        if outcome.has_warnings_at(WarningSeverity::Warning) {
            tracing::warn!("生產計劃有目錄引用問題，部分產品未參與計算");
        }
        for warning in &outcome.warnings {
            tracing::info!("{}: {}", warning.subject, warning.message);
        }
        Ok(outcome)
    }

    /// 並行計算多個假設情境
    ///
    /// 所有情境共用同一份快照，各自複製後套用覆寫；結果順序與輸入一致。
    pub fn calculate_scenarios(&self, scenarios: &[Scenario]) -> Result<Vec<Result<PlanReport>>> {
        let products = self.catalog.list_active_products()?;
        let raw_materials = self.catalog.list_active_raw_materials()?;
        tracing::info!("計算 {} 個假設情境", scenarios.len());

        Ok(scenarios
            .par_iter()
            .map(|scenario| {
                let mut materials = raw_materials.clone();
                for (&id, &quantity) in &scenario.stock_overrides {
                    let material = materials
                        .iter_mut()
                        .find(|m| m.id == id)
                        .ok_or_else(|| {
                            PlanError::NotFound(format!("情境 {} 的原物料 {id}", scenario.name))
                        })?;
                    material.stock_quantity = quantity;
                }

                let outcome = self.calculator.calculate(&products, &materials)?;
                tracing::debug!(
                    "情境 {} 完成，總值 {}",
                    scenario.name,
                    outcome.plan.total_production_value
                );
                Ok(PlanReport::from_plan(&outcome.plan))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use prodplan_core::{MeasurementUnit, ProductId};
    use rstest::rstest;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// Steel 100 kg；Widget(50) 每件 10 kg，Gadget(30) 每件 5 kg
    fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        let steel = catalog
            .create_raw_material(
                "Steel",
                "RM-STEEL",
                MeasurementUnit::Kilogram,
                dec("100"),
                dec("1"),
            )
            .unwrap();
        let widget = catalog.create_product("Widget", "WDG-1", dec("50"), 0).unwrap();
        let gadget = catalog.create_product("Gadget", "GDG-1", dec("30"), 0).unwrap();
        catalog
            .add_material_to_product(widget.id, steel.id, dec("10"))
            .unwrap();
        catalog
            .add_material_to_product(gadget.id, steel.id, dec("5"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_plan_from_catalog() {
        let service = ProductionService::new(catalog());

        let report = service.calculate_production_plan().unwrap();

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].product_sku, "WDG-1");
        assert_eq!(report.items[0].quantity, 10);
        assert_eq!(report.total_production_value, dec("500"));
        assert_eq!(report.remaining_stock.get("Steel"), Some(&Decimal::ZERO));
    }

    #[test]
    fn test_calculation_does_not_touch_catalog() {
        let service = ProductionService::new(catalog());

        service.calculate_production_plan().unwrap();
        service.calculate_production_plan().unwrap();

        let steel = service.catalog().raw_material_by_code("RM-STEEL").unwrap();
        assert_eq!(steel.stock_quantity, dec("100"));
    }

    #[test]
    fn test_deactivated_product_is_skipped() {
        let service = ProductionService::new(catalog());
        service
            .catalog()
            .set_product_active(ProductId::new(1).unwrap(), false)
            .unwrap();

        let report = service.calculate_production_plan().unwrap();

        assert_eq!(report.items[0].product_sku, "GDG-1");
        assert_eq!(report.items[0].quantity, 20);
        assert_eq!(report.total_production_value, dec("600"));
    }

    #[test]
    fn test_outcome_keeps_warnings() {
        crate::logging::init_test();
        let service = ProductionService::new(catalog());

        let outcome = service.calculate_outcome().unwrap();

        // Widget 用盡鋼材後 Gadget 無法生產
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].subject, "GDG-1");
    }

    #[rstest]
    #[case("105", 10, "530", "0")]
    #[case("9.99", 0, "30", "4.99")]
    #[case("250", 25, "1250", "0")]
    fn test_scenarios(
        #[case] steel: &str,
        #[case] widgets: u64,
        #[case] value: &str,
        #[case] left: &str,
    ) {
        let service = ProductionService::new(catalog());
        let steel_id = RawMaterialId::new(1).unwrap();
        let scenarios = vec![
            Scenario::new("baseline"),
            Scenario::new("override").with_stock(steel_id, dec(steel)),
        ];

        let results = service.calculate_scenarios(&scenarios).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().total_units, 10);

        let report = results[1].as_ref().unwrap();
        assert_eq!(report.total_production_value, dec(value));
        assert_eq!(report.remaining_stock.get("Steel"), Some(&dec(left)));
        let widget_units = report
            .items
            .iter()
            .find(|i| i.product_sku == "WDG-1")
            .map_or(0, |i| i.quantity);
        assert_eq!(widget_units, widgets);
    }

    #[test]
    fn test_scenario_with_unknown_material() {
        let service = ProductionService::new(catalog());
        let scenarios =
            vec![Scenario::new("typo").with_stock(RawMaterialId::new(42).unwrap(), dec("1"))];

        let results = service.calculate_scenarios(&scenarios).unwrap();

        assert!(matches!(results[0], Err(PlanError::NotFound(_))));
    }
}
