//! Pricing rule table and resolver.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::types::kind;

/// Fallback allowance when the table carries no usable `gumpaste_allowance` rule.
pub const DEFAULT_ALLOWANCE: f64 = 100.0;

pub const ALLOWANCE_KEY: &str = "gumpaste_allowance";
pub const DRIP_KEY: &str = "drip_per_tier";
pub const BASE_BOARD_KEY: &str = "gumpaste_base_board";

/// How quantity scales a rule's unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityRule {
    PerPiece,
    #[serde(rename = "per_3_pieces")]
    Per3Pieces,
    #[serde(rename = "buy_3_get_1_free")]
    Buy3Get1Free,
    PerDigit,
}

impl QuantityRule {
    /// Price for `quantity` units, or for the digits in `description`.
    pub fn apply(self, unit: f64, quantity: u32, description: &str) -> f64 {
        match self {
            QuantityRule::PerPiece => unit * f64::from(quantity),
            QuantityRule::Per3Pieces => unit * f64::from(quantity.div_ceil(3)),
            QuantityRule::Buy3Get1Free => {
                let qty = quantity.max(1);
                unit * f64::from(qty - qty / 3)
            }
            QuantityRule::PerDigit => {
                let digits = description.chars().filter(char::is_ascii_digit).count().max(1);
                unit * digits as f64
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierRule {
    TierCount,
}

/// Allowance routing assigned by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleClassification {
    Hero,
    Support,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SpecialConditions {
    /// Flat price replacing the computed one on Bento cakes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bento_price: Option<f64>,
    #[serde(default)]
    pub allowance_eligible: bool,
}

/// One row of the merchant-editable rule table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PricingRule {
    #[serde(rename = "item_key")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_rule: Option<QuantityRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier_rule: Option<MultiplierRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<RuleClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_conditions: Option<SpecialConditions>,
}

impl PricingRule {
    /// A global flat-price rule.
    pub fn flat(key: impl Into<String>, price: f64) -> Self {
        Self {
            key: key.into(),
            size: None,
            subtype: None,
            merchant_id: None,
            price,
            quantity_rule: None,
            multiplier_rule: None,
            classification: None,
            special_conditions: None,
        }
    }

    pub fn with_quantity_rule(mut self, rule: QuantityRule) -> Self {
        self.quantity_rule = Some(rule);
        self
    }

    pub fn with_classification(mut self, classification: RuleClassification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn tier_multiplied(mut self) -> Self {
        self.multiplier_rule = Some(MultiplierRule::TierCount);
        self
    }

    pub fn allowance_eligible(mut self) -> Self {
        self.special_conditions
            .get_or_insert_with(SpecialConditions::default)
            .allowance_eligible = true;
        self
    }

    pub fn is_allowance_eligible(&self) -> bool {
        self.special_conditions
            .as_ref()
            .is_some_and(|c| c.allowance_eligible)
    }

    pub fn bento_price(&self) -> Option<f64> {
        self.special_conditions.as_ref().and_then(|c| c.bento_price)
    }
}

/// Which part of the design a lookup is for. Drives legacy type mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    MainTopper,
    SupportElement,
    Message,
    IcingFeature,
    Special,
}

/// Immutable snapshot of the rule table for one merchant.
///
/// Rules are grouped by key with merchant-specific rules ahead of global ones,
/// so the first rule under a key is always the most specific.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    by_key: HashMap<String, Vec<PricingRule>>,
    merchant_id: Option<String>,
    fallback_allowance: Option<f64>,
}

impl RuleSet {
    /// Build the view of `rules` for `merchant_id`.
    ///
    /// Without a merchant only global rules are kept; rules belonging to
    /// other merchants are always dropped.
    pub fn new(rules: Vec<PricingRule>, merchant_id: Option<&str>) -> Self {
        let mut visible: Vec<PricingRule> = rules
            .into_iter()
            .filter(|r| match (&r.merchant_id, merchant_id) {
                (None, _) => true,
                (Some(owner), Some(m)) => owner == m,
                (Some(_), None) => false,
            })
            .collect();
        // Stable: table order survives within each tier.
        visible.sort_by_key(|r| r.merchant_id.is_none());

        let mut by_key: HashMap<String, Vec<PricingRule>> = HashMap::new();
        for rule in visible {
            by_key.entry(rule.key.clone()).or_default().push(rule);
        }
        Self {
            by_key,
            merchant_id: merchant_id.map(str::to_string),
            fallback_allowance: None,
        }
    }

    /// Override the hardcoded allowance used when the table has none.
    pub fn with_fallback_allowance(mut self, allowance: f64) -> Self {
        self.fallback_allowance = Some(allowance);
        self
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// First rule under an exact key.
    pub fn get(&self, key: &str) -> Option<&PricingRule> {
        self.by_key.get(key).and_then(|rules| rules.first())
    }

    /// Resolve a rule: `{type}_{subtype}`, then `{type}_{size}`, then `{type}`
    /// preferring a rule whose size column matches.
    pub fn resolve(
        &self,
        item_type: &str,
        size: Option<&str>,
        subtype: Option<&str>,
        category: RuleCategory,
    ) -> Option<&PricingRule> {
        let effective = effective_type(item_type, category);

        if let Some(rule) = subtype
            .filter(|s| !s.is_empty())
            .and_then(|s| self.get(&format!("{effective}_{s}")))
        {
            trace!(target: "cake_customizer::pricing", key = %rule.key, "Resolved by subtype");
            return Some(rule);
        }

        if let Some(rule) = size.and_then(|s| self.get(&format!("{effective}_{s}"))) {
            trace!(target: "cake_customizer::pricing", key = %rule.key, "Resolved by size");
            return Some(rule);
        }

        let generic = self.by_key.get(effective)?;
        size.and_then(|s| {
            generic
                .iter()
                .find(|r| r.size.as_deref().is_some_and(|rs| rs.eq_ignore_ascii_case(s)))
        })
        .or_else(|| generic.first())
    }

    /// Allowance subtracted from the discountable pool.
    pub fn allowance(&self) -> f64 {
        match self.get(ALLOWANCE_KEY) {
            Some(rule) if rule.price > 0.0 => rule.price,
            _ => self.fallback_allowance.unwrap_or(DEFAULT_ALLOWANCE),
        }
    }
}

/// Map legacy type names onto their current rule keys.
fn effective_type(item_type: &str, category: RuleCategory) -> &str {
    match (item_type, category) {
        (kind::EDIBLE_2D_GUMPASTE, RuleCategory::MainTopper) => kind::EDIBLE_2D_SHAPES,
        (kind::EDIBLE_2D_GUMPASTE, _) => kind::EDIBLE_2D_SUPPORT,
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<PricingRule> {
        vec![
            PricingRule::flat("chocolates", 80.0),
            PricingRule::flat("chocolates_small", 60.0),
            PricingRule::flat("chocolates_ferrero", 150.0),
            PricingRule::flat("printout", 40.0),
            PricingRule::flat("printout", 55.0).with_merchant("shop-a"),
            PricingRule::flat("printout", 99.0).with_merchant("shop-b"),
            PricingRule::flat("edible_3d_complex", 300.0).with_size("small"),
            PricingRule::flat("edible_3d_complex", 500.0).with_size("large"),
            PricingRule::flat(kind::EDIBLE_2D_SHAPES, 20.0),
            PricingRule::flat(kind::EDIBLE_2D_SUPPORT, 10.0),
        ]
    }

    #[test]
    fn test_resolution_precedence() {
        let rules = RuleSet::new(table(), None);
        let by_subtype = rules
            .resolve("chocolates", Some("small"), Some("ferrero"), RuleCategory::SupportElement)
            .unwrap();
        assert_eq!(by_subtype.price, 150.0);

        let by_size = rules
            .resolve("chocolates", Some("small"), Some("lindt"), RuleCategory::SupportElement)
            .unwrap();
        assert_eq!(by_size.price, 60.0);

        let bare = rules
            .resolve("chocolates", Some("large"), None, RuleCategory::SupportElement)
            .unwrap();
        assert_eq!(bare.price, 80.0);
    }

    #[test]
    fn test_bare_key_prefers_size_column() {
        let rules = RuleSet::new(table(), None);
        let large = rules
            .resolve("edible_3d_complex", Some("LARGE"), None, RuleCategory::MainTopper)
            .unwrap();
        assert_eq!(large.price, 500.0);
        let medium = rules
            .resolve("edible_3d_complex", Some("medium"), None, RuleCategory::MainTopper)
            .unwrap();
        assert_eq!(medium.price, 300.0);
    }

    #[test]
    fn test_merchant_rules_first() {
        let shop_a = RuleSet::new(table(), Some("shop-a"));
        assert_eq!(shop_a.get("printout").unwrap().price, 55.0);
        assert_eq!(shop_a.len(), 9);

        let global = RuleSet::new(table(), None);
        assert_eq!(global.get("printout").unwrap().price, 40.0);
        assert_eq!(global.len(), 8);
    }

    #[test]
    fn test_legacy_gumpaste_mapping() {
        let rules = RuleSet::new(table(), None);
        let topper = rules
            .resolve(kind::EDIBLE_2D_GUMPASTE, None, None, RuleCategory::MainTopper)
            .unwrap();
        let support = rules
            .resolve(kind::EDIBLE_2D_GUMPASTE, None, None, RuleCategory::SupportElement)
            .unwrap();
        assert_eq!(topper.price, 20.0);
        assert_eq!(support.price, 10.0);
    }

    #[test]
    fn test_unknown_type_unresolved() {
        let rules = RuleSet::new(table(), None);
        assert!(rules
            .resolve("sparklers", Some("small"), None, RuleCategory::SupportElement)
            .is_none());
    }

    #[test]
    fn test_quantity_rules() {
        assert_eq!(QuantityRule::Per3Pieces.apply(50.0, 7, ""), 150.0);
        assert_eq!(QuantityRule::PerPiece.apply(15.0, 4, ""), 60.0);
        assert_eq!(QuantityRule::Buy3Get1Free.apply(10.0, 7, ""), 50.0);
        assert_eq!(QuantityRule::Buy3Get1Free.apply(10.0, 0, ""), 10.0);
        assert_eq!(QuantityRule::PerDigit.apply(25.0, 1, "number 18 candle"), 50.0);
        assert_eq!(QuantityRule::PerDigit.apply(25.0, 1, "star candle"), 25.0);
    }

    #[test]
    fn test_allowance_fallbacks() {
        let rules = RuleSet::new(table(), None);
        assert_eq!(rules.allowance(), DEFAULT_ALLOWANCE);
        assert_eq!(rules.clone().with_fallback_allowance(80.0).allowance(), 80.0);

        let mut with_rule = table();
        with_rule.push(PricingRule::flat(ALLOWANCE_KEY, 120.0));
        assert_eq!(RuleSet::new(with_rule, None).allowance(), 120.0);
    }

    #[test]
    fn test_rule_row_deserializes() {
        let json = r#"{"item_key":"candle","price":25,"quantity_rule":"per_digit",
            "special_conditions":{"bento_price":15,"allowance_eligible":true}}"#;
        let rule: PricingRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.quantity_rule, Some(QuantityRule::PerDigit));
        assert_eq!(rule.bento_price(), Some(15.0));
        assert!(rule.is_allowance_eligible());
    }
}
