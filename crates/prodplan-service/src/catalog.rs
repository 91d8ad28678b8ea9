//! 目錄來源：原物料與產品的快照讀取與維護

use prodplan_core::{
    MeasurementUnit, PlanError, Product, ProductId, RawMaterial, RawMaterialId, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// 目錄來源
///
/// 每次呼叫回傳一份獨立的快照，呼叫端可任意修改而不影響來源。
pub trait CatalogSource: Send + Sync {
    /// 啟用中的產品（含 BOM）
    fn list_active_products(&self) -> Result<Vec<Product>>;

    /// 啟用中的原物料
    fn list_active_raw_materials(&self) -> Result<Vec<RawMaterial>>;
}

/// 目錄文件（JSON 載入/匯出格式）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub raw_materials: Vec<RawMaterial>,

    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Default)]
struct CatalogState {
    raw_materials: BTreeMap<RawMaterialId, RawMaterial>,
    products: BTreeMap<ProductId, Product>,
    next_raw_material_id: u64,
    next_product_id: u64,
}

/// 記憶體目錄
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    /// 創建空目錄
    pub fn new() -> Self {
        Self::default()
    }

    /// 由目錄文件建立
    ///
    /// 每筆資料重新檢查名稱與代碼規則（代碼、SKU 正規化為大寫），
    /// 再檢查ID、代碼、SKU 唯一性。
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let mut state = CatalogState::default();

        let mut codes = HashSet::new();
        for material in document.raw_materials {
            let material = material.validated()?;
            if !codes.insert(material.code.clone()) {
                return Err(PlanError::Conflict(format!("原物料代碼重複: {}", material.code)));
            }
            state.next_raw_material_id = state.next_raw_material_id.max(material.id.value());
            if state.raw_materials.insert(material.id, material).is_some() {
                return Err(PlanError::invalid("原物料ID重複"));
            }
        }

        let mut skus = HashSet::new();
        for product in document.products {
            let product = product.validated()?;
            if !skus.insert(product.sku.clone()) {
                return Err(PlanError::Conflict(format!("產品 SKU 重複: {}", product.sku)));
            }
            state.next_product_id = state.next_product_id.max(product.id.value());
            if state.products.insert(product.id, product).is_some() {
                return Err(PlanError::invalid("產品ID重複"));
            }
        }

        tracing::info!(
            "載入目錄：原物料 {} 筆，產品 {} 筆",
            state.raw_materials.len(),
            state.products.len()
        );

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// 由 JSON 文字建立
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| PlanError::invalid(format!("目錄 JSON 解析失敗: {e}")))?;
        Self::from_document(document)
    }

    /// 匯出目錄文件（包含停用資料）
    pub fn to_document(&self) -> CatalogDocument {
        let state = self.read();
        CatalogDocument {
            raw_materials: state.raw_materials.values().cloned().collect(),
            products: state.products.values().cloned().collect(),
        }
    }

    // =========================================================================
    // 原物料
    // =========================================================================

    pub fn create_raw_material(
        &self,
        name: &str,
        code: &str,
        unit: MeasurementUnit,
        stock_quantity: Decimal,
        unit_cost: Decimal,
    ) -> Result<RawMaterial> {
        let mut state = self.write();
        let id = RawMaterialId::new(state.next_raw_material_id + 1)?;
        let material = RawMaterial::new(id, name, code, unit, stock_quantity, unit_cost)?;
        ensure_unique_code(&state, &material.code, None)?;

        state.next_raw_material_id = id.value();
        state.raw_materials.insert(id, material.clone());
        tracing::debug!("新增原物料 {} ({})", material.code, id);
        Ok(material)
    }

    pub fn update_raw_material(
        &self,
        id: RawMaterialId,
        name: &str,
        description: Option<&str>,
        code: &str,
        unit: MeasurementUnit,
        unit_cost: Decimal,
    ) -> Result<RawMaterial> {
        let mut state = self.write();
        let normalized = normalize_code(code);
        ensure_unique_code(&state, &normalized, Some(id))?;
        let material = raw_material_mut(&mut state, id)?;
        material.update(name, description, code, unit, unit_cost)?;
        Ok(material.clone())
    }

    pub fn adjust_raw_material_stock(
        &self,
        id: RawMaterialId,
        delta: Decimal,
    ) -> Result<RawMaterial> {
        let mut state = self.write();
        let material = raw_material_mut(&mut state, id)?;
        material.adjust_stock(delta)?;
        Ok(material.clone())
    }

    pub fn set_raw_material_active(&self, id: RawMaterialId, active: bool) -> Result<()> {
        let mut state = self.write();
        let material = raw_material_mut(&mut state, id)?;
        if active {
            material.activate();
        } else {
            material.deactivate();
        }
        Ok(())
    }

    /// 刪除原物料；引用它的 BOM 明細保留，計劃時該產品視為不可生產
    pub fn delete_raw_material(&self, id: RawMaterialId) -> Result<()> {
        let mut state = self.write();
        state
            .raw_materials
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PlanError::NotFound(format!("原物料 {id}")))
    }

    pub fn raw_material(&self, id: RawMaterialId) -> Result<RawMaterial> {
        self.read()
            .raw_materials
            .get(&id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("原物料 {id}")))
    }

    pub fn raw_material_by_code(&self, code: &str) -> Option<RawMaterial> {
        let code = normalize_code(code);
        self.read()
            .raw_materials
            .values()
            .find(|m| m.code == code)
            .cloned()
    }

    pub fn list_raw_materials(&self) -> Vec<RawMaterial> {
        self.read().raw_materials.values().cloned().collect()
    }

    /// 名稱搜尋（不分大小寫）；空白關鍵字回傳啟用中的原物料
    pub fn search_raw_materials(&self, term: &str) -> Vec<RawMaterial> {
        let term = term.trim().to_lowercase();
        self.read()
            .raw_materials
            .values()
            .filter(|m| {
                if term.is_empty() {
                    m.active
                } else {
                    m.name.to_lowercase().contains(&term)
                }
            })
            .cloned()
            .collect()
    }

    // =========================================================================
    // 產品
    // =========================================================================

    pub fn create_product(
        &self,
        name: &str,
        sku: &str,
        unit_price: Decimal,
        stock_quantity: u32,
    ) -> Result<Product> {
        let mut state = self.write();
        let id = ProductId::new(state.next_product_id + 1)?;
        let product = Product::new(id, name, sku, unit_price)?.with_stock_quantity(stock_quantity);
        ensure_unique_sku(&state, &product.sku, None)?;

        state.next_product_id = id.value();
        state.products.insert(id, product.clone());
        tracing::debug!("新增產品 {} ({})", product.sku, id);
        Ok(product)
    }

    pub fn update_product(
        &self,
        id: ProductId,
        name: &str,
        description: Option<&str>,
        sku: &str,
        unit_price: Decimal,
    ) -> Result<Product> {
        let mut state = self.write();
        ensure_unique_sku(&state, &normalize_code(sku), Some(id))?;
        let product = product_mut(&mut state, id)?;
        product.update(name, description, sku, unit_price)?;
        Ok(product.clone())
    }

    pub fn adjust_product_stock(&self, id: ProductId, delta: i64) -> Result<Product> {
        let mut state = self.write();
        let product = product_mut(&mut state, id)?;
        product.adjust_stock(delta)?;
        Ok(product.clone())
    }

    pub fn set_product_active(&self, id: ProductId, active: bool) -> Result<()> {
        let mut state = self.write();
        let product = product_mut(&mut state, id)?;
        if active {
            product.activate();
        } else {
            product.deactivate();
        }
        Ok(())
    }

    pub fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.write();
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PlanError::NotFound(format!("產品 {id}")))
    }

    pub fn product(&self, id: ProductId) -> Result<Product> {
        self.read()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| PlanError::NotFound(format!("產品 {id}")))
    }

    pub fn product_by_sku(&self, sku: &str) -> Option<Product> {
        let sku = normalize_code(sku);
        self.read()
            .products
            .values()
            .find(|p| p.sku == sku)
            .cloned()
    }

    pub fn list_products(&self) -> Vec<Product> {
        self.read().products.values().cloned().collect()
    }

    /// 名稱搜尋（不分大小寫）；空白關鍵字回傳啟用中的產品
    pub fn search_products(&self, term: &str) -> Vec<Product> {
        let term = term.trim().to_lowercase();
        self.read()
            .products
            .values()
            .filter(|p| {
                if term.is_empty() {
                    p.active
                } else {
                    p.name.to_lowercase().contains(&term)
                }
            })
            .cloned()
            .collect()
    }

    // =========================================================================
    // BOM
    // =========================================================================

    /// 加入 BOM 明細，原物料必須存在
    pub fn add_material_to_product(
        &self,
        product_id: ProductId,
        raw_material_id: RawMaterialId,
        quantity: Decimal,
    ) -> Result<Product> {
        let mut state = self.write();
        if !state.raw_materials.contains_key(&raw_material_id) {
            return Err(PlanError::NotFound(format!("原物料 {raw_material_id}")));
        }
        let product = product_mut(&mut state, product_id)?;
        product.add_material(raw_material_id, quantity)?;
        Ok(product.clone())
    }

    pub fn remove_material_from_product(
        &self,
        product_id: ProductId,
        raw_material_id: RawMaterialId,
    ) -> Result<Product> {
        let mut state = self.write();
        let product = product_mut(&mut state, product_id)?;
        product.remove_material(raw_material_id)?;
        Ok(product.clone())
    }

    pub fn update_material_quantity(
        &self,
        product_id: ProductId,
        raw_material_id: RawMaterialId,
        quantity: Decimal,
    ) -> Result<Product> {
        let mut state = self.write();
        let product = product_mut(&mut state, product_id)?;
        product.update_material_quantity(raw_material_id, quantity)?;
        Ok(product.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogSource for InMemoryCatalog {
    fn list_active_products(&self) -> Result<Vec<Product>> {
        Ok(self
            .read()
            .products
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect())
    }

    fn list_active_raw_materials(&self) -> Result<Vec<RawMaterial>> {
        Ok(self
            .read()
            .raw_materials
            .values()
            .filter(|m| m.active)
            .cloned()
            .collect())
    }
}

/// 代碼正規化（與模型驗證一致：去空白、大寫）
fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn ensure_unique_code(
    state: &CatalogState,
    code: &str,
    except: Option<RawMaterialId>,
) -> Result<()> {
    let taken = state
        .raw_materials
        .values()
        .any(|m| m.code == code && Some(m.id) != except);
    if taken {
        return Err(PlanError::Conflict(format!("原物料代碼已存在: {code}")));
    }
    Ok(())
}

fn ensure_unique_sku(state: &CatalogState, sku: &str, except: Option<ProductId>) -> Result<()> {
    let taken = state
        .products
        .values()
        .any(|p| p.sku == sku && Some(p.id) != except);
    if taken {
        return Err(PlanError::Conflict(format!("產品 SKU 已存在: {sku}")));
    }
    Ok(())
}

fn raw_material_mut(state: &mut CatalogState, id: RawMaterialId) -> Result<&mut RawMaterial> {
    state
        .raw_materials
        .get_mut(&id)
        .ok_or_else(|| PlanError::NotFound(format!("原物料 {id}")))
}

fn product_mut(state: &mut CatalogState, id: ProductId) -> Result<&mut Product> {
    state
        .products
        .get_mut(&id)
        .ok_or_else(|| PlanError::NotFound(format!("產品 {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn seeded() -> (InMemoryCatalog, RawMaterial, Product) {
        let catalog = InMemoryCatalog::new();
        let steel = catalog
            .create_raw_material(
                "Steel",
                "rm-steel",
                MeasurementUnit::Kilogram,
                dec("100"),
                dec("2"),
            )
            .unwrap();
        let widget = catalog
            .create_product("Widget", "wdg-1", dec("50"), 0)
            .unwrap();
        (catalog, steel, widget)
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let (catalog, steel, widget) = seeded();
        let copper = catalog
            .create_raw_material("Copper", "RM-CU", MeasurementUnit::Kilogram, dec("5"), dec("9"))
            .unwrap();

        assert_eq!(steel.id.value(), 1);
        assert_eq!(copper.id.value(), 2);
        assert_eq!(widget.id.value(), 1);
        assert_eq!(catalog.list_raw_materials().len(), 2);
    }

    #[test]
    fn test_unique_code_and_sku() {
        let (catalog, steel, widget) = seeded();

        let err = catalog
            .create_raw_material(
                "Steel 2",
                " RM-STEEL ",
                MeasurementUnit::Kilogram,
                dec("1"),
                dec("1"),
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::Conflict(_)));

        let err = catalog.create_product("Other", "WDG-1", dec("1"), 0).unwrap_err();
        assert!(matches!(err, PlanError::Conflict(_)));

        // 更新自己的代碼不算衝突
        catalog
            .update_raw_material(
                steel.id,
                "Steel",
                None,
                "rm-steel",
                MeasurementUnit::Kilogram,
                dec("3"),
            )
            .unwrap();
        catalog
            .update_product(widget.id, "Widget v2", Some("new"), "wdg-1", dec("55"))
            .unwrap();
        assert_eq!(catalog.product(widget.id).unwrap().unit_price, dec("55"));
    }

    #[test]
    fn test_bom_requires_existing_material() {
        let (catalog, steel, widget) = seeded();
        let ghost = RawMaterialId::new(99).unwrap();

        assert!(matches!(
            catalog.add_material_to_product(widget.id, ghost, dec("1")),
            Err(PlanError::NotFound(_))
        ));

        let updated = catalog
            .add_material_to_product(widget.id, steel.id, dec("2.5"))
            .unwrap();
        assert!(updated.is_plannable());

        catalog
            .update_material_quantity(widget.id, steel.id, dec("3"))
            .unwrap();
        let removed = catalog
            .remove_material_from_product(widget.id, steel.id)
            .unwrap();
        assert!(removed.materials.is_empty());
    }

    #[test]
    fn test_active_snapshots() {
        let (catalog, steel, widget) = seeded();
        catalog.set_raw_material_active(steel.id, false).unwrap();
        catalog.set_product_active(widget.id, false).unwrap();

        assert!(catalog.list_active_raw_materials().unwrap().is_empty());
        assert!(catalog.list_active_products().unwrap().is_empty());

        catalog.set_product_active(widget.id, true).unwrap();
        assert_eq!(catalog.list_active_products().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (catalog, steel, _) = seeded();
        let mut snapshot = catalog.list_active_raw_materials().unwrap();
        snapshot[0].stock_quantity = Decimal::ZERO;

        assert_eq!(catalog.raw_material(steel.id).unwrap().stock_quantity, dec("100"));
    }

    #[test]
    fn test_stock_adjustments() {
        let (catalog, steel, widget) = seeded();

        let adjusted = catalog.adjust_raw_material_stock(steel.id, dec("-40.5")).unwrap();
        assert_eq!(adjusted.stock_quantity, dec("59.5"));
        assert!(matches!(
            catalog.adjust_raw_material_stock(steel.id, dec("-60")),
            Err(PlanError::InsufficientStock(_))
        ));

        assert_eq!(catalog.adjust_product_stock(widget.id, 4).unwrap().stock_quantity, 4);
        assert!(catalog.adjust_product_stock(widget.id, -5).is_err());
    }

    #[test]
    fn test_search_and_lookup() {
        let (catalog, steel, widget) = seeded();
        catalog
            .create_raw_material(
                "Stainless Steel",
                "RM-SS",
                MeasurementUnit::Kilogram,
                dec("1"),
                dec("1"),
            )
            .unwrap();

        assert_eq!(catalog.search_raw_materials("STEEL").len(), 2);
        assert_eq!(catalog.search_raw_materials("  ").len(), 2);
        assert_eq!(catalog.search_products("widg").len(), 1);
        assert_eq!(catalog.raw_material_by_code("rm-steel").unwrap().id, steel.id);
        assert_eq!(catalog.product_by_sku("wdg-1").unwrap().id, widget.id);
    }

    #[test]
    fn test_delete() {
        let (catalog, steel, widget) = seeded();

        catalog.delete_raw_material(steel.id).unwrap();
        assert!(matches!(
            catalog.delete_raw_material(steel.id),
            Err(PlanError::NotFound(_))
        ));
        catalog.delete_product(widget.id).unwrap();
        assert!(catalog.product(widget.id).is_err());
    }

    #[test]
    fn test_document_round_trip_keeps_id_sequence() {
        let json = r#"{
            "raw_materials": [
                {"id": 5, "name": "Steel", "code": "RM-STEEL", "unit": "kg",
                 "stock_quantity": "100"}
            ],
            "products": [
                {"id": 3, "name": "Widget", "sku": "WDG-1", "unit_price": "85.0",
                 "materials": [{"raw_material_id": 5, "quantity_required": "2"}]}
            ]
        }"#;
        let catalog = InMemoryCatalog::from_json(json).unwrap();

        let next = catalog
            .create_raw_material("Gold", "RM-AU", MeasurementUnit::Gram, dec("1"), dec("1"))
            .unwrap();
        assert_eq!(next.id.value(), 6);

        let document = catalog.to_document();
        assert_eq!(document.raw_materials.len(), 2);
        assert_eq!(document.products[0].materials.len(), 1);
    }

    #[test]
    fn test_document_rejects_duplicates() {
        let json = r#"{
            "raw_materials": [
                {"id": 1, "name": "Steel", "code": "RM-1", "unit": "kg", "stock_quantity": "1"},
                {"id": 2, "name": "Steel", "code": "RM-1", "unit": "kg", "stock_quantity": "1"}
            ]
        }"#;
        assert!(matches!(
            InMemoryCatalog::from_json(json),
            Err(PlanError::Conflict(_))
        ));
        assert!(InMemoryCatalog::from_json("{not json").is_err());
    }

    #[test]
    fn test_document_rows_are_validated_and_normalized() {
        let json = r#"{
            "raw_materials": [
                {"id": 1, "name": " Steel ", "code": "rm-1", "unit": "kg", "stock_quantity": 1}
            ],
            "products": [
                {"id": 1, "name": "Widget", "sku": "wdg-1", "unit_price": 5}
            ]
        }"#;
        let catalog = InMemoryCatalog::from_json(json).unwrap();
        let steel = catalog.raw_material_by_code("RM-1").unwrap();
        assert_eq!(steel.name, "Steel");
        assert_eq!(steel.code, "RM-1");
        assert!(catalog.product_by_sku("WDG-1").is_some());

        // 正規化後才檢查唯一性
        let case_clash = r#"{
            "raw_materials": [
                {"id": 1, "name": "Steel", "code": "rm-1", "unit": "kg", "stock_quantity": 1},
                {"id": 2, "name": "Iron", "code": "RM-1", "unit": "kg", "stock_quantity": 1}
            ]
        }"#;
        assert!(matches!(
            InMemoryCatalog::from_json(case_clash),
            Err(PlanError::Conflict(_))
        ));

        for bad in [
            json.replace("\" Steel \"", "\"   \""),
            json.replace("rm-1", "rm 1"),
            json.replace("wdg-1", "wdg_1"),
            json.replace("\"unit_price\": 5", "\"unit_price\": -5"),
        ] {
            assert!(matches!(
                InMemoryCatalog::from_json(&bad),
                Err(PlanError::InvalidCatalogData(_))
            ));
        }
    }
}
