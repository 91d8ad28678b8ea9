//! 生產計劃配置

use serde::{Deserialize, Serialize};

/// 計劃器參數配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// 同單價產品的排序規則
    pub tie_break: TieBreakRule,

    /// 是否嚴格檢查 BOM 引用
    /// - false: 引用不存在的原物料時，該產品視為不可生產並記錄警告（預設）
    /// - true: 引用不存在的原物料時，整個計算失敗
    pub strict_references: bool,
}

impl PlannerConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            tie_break: TieBreakRule::ProductId,
            strict_references: false,
        }
    }

    /// 建構器模式：設置同單價排序規則
    pub fn with_tie_break(mut self, rule: TieBreakRule) -> Self {
        self.tie_break = rule;
        self
    }

    /// 建構器模式：設置是否嚴格檢查 BOM 引用
    ///
    /// # 範例
    /// ```
    /// # use prodplan_core::PlannerConfig;
    /// let config = PlannerConfig::new().with_strict_references(true);
    /// assert!(config.strict_references);
    /// ```
    pub fn with_strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 同單價排序規則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreakRule {
    /// 產品ID遞增
    ProductId,

    /// 保持輸入順序（穩定排序）
    InputOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.tie_break, TieBreakRule::ProductId);
        assert!(!config.strict_references);
    }

    #[test]
    fn test_config_builder() {
        let config = PlannerConfig::new()
            .with_tie_break(TieBreakRule::InputOrder)
            .with_strict_references(true);

        assert_eq!(config.tie_break, TieBreakRule::InputOrder);
        assert!(config.strict_references);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"tie_break": "input-order"}"#).unwrap();

        assert_eq!(config.tie_break, TieBreakRule::InputOrder);
        assert!(!config.strict_references);
    }
}
