//! Price computation over the live design state.
//!
//! Every enabled item resolves a rule, gets its quantity and tier policies
//! applied, and is routed into one of three totals:
//!
//! | Routing | Total |
//! |---------|-------|
//! | rule classification `hero` | hero total, never discounted |
//! | classification `support` or allowance-eligible | discountable pool |
//! | anything else | fixed total |
//!
//! The allowance is subtracted once from the pool and surfaced as a single
//! negative line. Unresolvable items price at zero and are reported as
//! [`DataGap`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rules::{
    PricingRule, RuleCategory, RuleClassification, RuleSet, BASE_BOARD_KEY, DRIP_KEY,
};
use crate::types::{kind, CakeType, Decoration, DesignState, ItemSize};

pub const DRIP_PRICE_KEY: &str = "icing_drip";
pub const BASE_BOARD_PRICE_KEY: &str = "icing_gumpasteBaseBoard";

/// One entry of the itemized breakdown.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceLine {
    pub label: String,
    /// Positive for charges, negative for the allowance.
    pub amount: f64,
}

/// An item that priced at zero because no rule matched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataGap {
    pub item_type: String,
    pub size: Option<String>,
    pub subtype: Option<String>,
    pub category: RuleCategory,
}

/// Result of a price computation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
    /// Sum of `lines`.
    pub total: f64,
    pub hero_total: f64,
    /// Discountable pool before the allowance.
    pub pool_total: f64,
    pub allowance_applied: f64,
    pub fixed_total: f64,
    /// Per-item contribution keyed by item id, plus the icing feature keys.
    pub item_prices: BTreeMap<String, f64>,
    pub data_gaps: Vec<DataGap>,
}

impl PriceBreakdown {
    /// Contribution of a single item or icing feature.
    pub fn item_price(&self, key: &str) -> Option<f64> {
        self.item_prices.get(key).copied()
    }
}

#[derive(Debug, Default)]
struct Totals {
    hero: f64,
    pool: f64,
    fixed: f64,
}

impl Totals {
    fn route(&mut self, rule: &PricingRule, amount: f64) {
        match rule.classification {
            Some(RuleClassification::Hero) => self.hero += amount,
            Some(RuleClassification::Support) => self.pool += amount,
            None if rule.is_allowance_eligible() => self.pool += amount,
            None => self.fixed += amount,
        }
    }
}

/// Quantity inferred from size for countable support items analysed without a count.
fn inferred_quantity(item: &Decoration) -> u32 {
    let countable = matches!(
        item.item_type.as_str(),
        kind::PLASTIC_BALL_REGULAR | kind::PLASTIC_BALL_DISCO | kind::GUMPASTE_BUNDLE
    );
    if item.quantity > 0 || !countable {
        return item.quantity;
    }
    match item.size {
        ItemSize::Large => 12,
        ItemSize::Medium => 8,
        ItemSize::Small => 4,
        _ => 1,
    }
}

fn price_item(
    rule: &PricingRule,
    item: &Decoration,
    quantity: u32,
    cake_type: CakeType,
) -> f64 {
    let mut price = match rule.quantity_rule {
        Some(q) => q.apply(rule.price, quantity, &item.description),
        None => rule.price,
    };
    if rule.multiplier_rule.is_some() {
        price *= f64::from(cake_type.tier_count());
    }
    if let Some(bento) = rule.bento_price().filter(|_| cake_type == CakeType::Bento) {
        price = bento;
    }
    if price < 0.0 {
        warn!(
            target: "cake_customizer::pricing",
            key = %rule.key,
            price,
            "Negative rule price clamped to zero"
        );
        price = 0.0;
    }
    price
}

fn record_gap(
    gaps: &mut Vec<DataGap>,
    item_type: &str,
    size: Option<&str>,
    subtype: Option<&str>,
    category: RuleCategory,
) {
    warn!(
        target: "cake_customizer::pricing",
        item_type,
        size,
        subtype,
        ?category,
        "No pricing rule found"
    );
    gaps.push(DataGap {
        item_type: item_type.to_string(),
        size: size.map(str::to_string),
        subtype: subtype.map(str::to_string),
        category,
    });
}

/// Compute the itemized price of `state` under `rules`.
///
/// Never fails: rule gaps degrade to zero-priced items.
pub fn compute_price(state: &DesignState, rules: &RuleSet) -> PriceBreakdown {
    let cake_type = state.cake_info.cake_type;
    let mut out = PriceBreakdown::default();
    let mut totals = Totals::default();

    let decorations = state
        .toppers
        .iter()
        .map(|t| (t, RuleCategory::MainTopper))
        .chain(
            state
                .support_elements
                .iter()
                .map(|s| (s, RuleCategory::SupportElement)),
        );

    for (item, category) in decorations {
        let key = item.id.to_string();
        if !item.enabled {
            out.item_prices.insert(key, 0.0);
            continue;
        }

        let size = item.size.as_str();
        let subtype = item.subtype.as_deref();
        let Some(rule) = rules.resolve(&item.item_type, Some(size), subtype, category) else {
            record_gap(&mut out.data_gaps, &item.item_type, Some(size), subtype, category);
            out.item_prices.insert(key, 0.0);
            continue;
        };

        let quantity = match category {
            RuleCategory::SupportElement => {
                let qty = inferred_quantity(item);
                if rule.quantity_rule.is_some() {
                    qty.max(1)
                } else {
                    qty
                }
            }
            _ => item.quantity,
        };
        let price = price_item(rule, item, quantity, cake_type);
        totals.route(rule, price);
        out.item_prices.insert(key, price);
        if price > 0.0 {
            out.lines.push(PriceLine {
                label: item.description.clone(),
                amount: price,
            });
        }
    }

    for msg in &state.messages {
        let key = msg.id.to_string();
        if !msg.is_visible() {
            out.item_prices.insert(key, 0.0);
            continue;
        }
        let msg_kind = msg.kind.as_str();
        let Some(rule) = rules.resolve(msg_kind, None, None, RuleCategory::Message) else {
            record_gap(&mut out.data_gaps, msg_kind, None, None, RuleCategory::Message);
            out.item_prices.insert(key, 0.0);
            continue;
        };
        let price = rule.price.max(0.0);
        totals.route(rule, price);
        out.item_prices.insert(key, price);
        if price > 0.0 {
            out.lines.push(PriceLine {
                label: format!("\"{}\" ({})", msg.text, msg_kind),
                amount: price,
            });
        }
    }

    let mut drip_price = 0.0;
    if state.icing.drip {
        match rules.resolve(DRIP_KEY, None, None, RuleCategory::IcingFeature) {
            Some(rule) => {
                drip_price = rule.price.max(0.0) * f64::from(cake_type.tier_count());
                totals.fixed += drip_price;
                if drip_price > 0.0 {
                    out.lines.push(PriceLine {
                        label: "Drip Effect".to_string(),
                        amount: drip_price,
                    });
                }
            }
            None => record_gap(&mut out.data_gaps, DRIP_KEY, None, None, RuleCategory::IcingFeature),
        }
    }
    out.item_prices.insert(DRIP_PRICE_KEY.to_string(), drip_price);

    let mut board_price = 0.0;
    if state.icing.gumpaste_base_board {
        match rules.resolve(BASE_BOARD_KEY, None, None, RuleCategory::IcingFeature) {
            Some(rule) => {
                board_price = rule.price.max(0.0);
                totals.fixed += board_price;
                if board_price > 0.0 {
                    out.lines.push(PriceLine {
                        label: "Gumpaste Covered Base Board".to_string(),
                        amount: board_price,
                    });
                }
            }
            None => record_gap(
                &mut out.data_gaps,
                BASE_BOARD_KEY,
                None,
                None,
                RuleCategory::IcingFeature,
            ),
        }
    }
    out.item_prices.insert(BASE_BOARD_PRICE_KEY.to_string(), board_price);

    let allowance = rules.allowance();
    let applied = allowance.min(totals.pool).max(0.0);
    if applied > 0.0 {
        out.lines.push(PriceLine {
            label: "Gumpaste Allowance".to_string(),
            amount: -applied,
        });
    }

    out.hero_total = totals.hero;
    out.pool_total = totals.pool;
    out.fixed_total = totals.fixed;
    out.allowance_applied = applied;
    out.total = totals.hero + (totals.pool - applied) + totals.fixed;

    debug!(
        target: "cake_customizer::pricing",
        total = out.total,
        hero = out.hero_total,
        pool = out.pool_total,
        allowance = applied,
        gaps = out.data_gaps.len(),
        "Price computed"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::QuantityRule;
    use crate::types::{
        AnalyzedItem, AnalyzedMessage, CakeInfo, ItemId, Message, MessageKind, MessagePosition,
    };

    fn deco(seq: u32, item_type: &str, desc: &str) -> Decoration {
        Decoration::from_analysis(ItemId { generation: 1, seq }, &AnalyzedItem::new(item_type, desc))
    }

    fn rules() -> RuleSet {
        RuleSet::new(
            vec![
                PricingRule::flat("edible_3d_complex", 200.0)
                    .with_classification(RuleClassification::Hero),
                PricingRule::flat("edible_3d_support", 150.0)
                    .with_classification(RuleClassification::Support),
                PricingRule::flat("edible_2d_support", 100.0).allowance_eligible(),
                PricingRule::flat("printout", 50.0),
                PricingRule::flat("plastic_ball_regular", 5.0)
                    .with_quantity_rule(QuantityRule::PerPiece),
                PricingRule::flat("icing_script", 0.0),
                PricingRule::flat("gumpaste_letters", 30.0).allowance_eligible(),
                PricingRule::flat(DRIP_KEY, 40.0),
                PricingRule::flat(BASE_BOARD_KEY, 60.0),
            ],
            None,
        )
    }

    #[test]
    fn test_routing_and_allowance() {
        let mut state = DesignState::default();
        state.toppers.push(deco(0, "edible_3d_complex", "unicorn"));
        state.toppers.push(deco(1, "edible_3d_support", "stars"));
        state.support_elements.push(deco(2, "edible_2d_support", "clouds"));
        state.support_elements.push(deco(3, "printout", "banner"));

        let b = compute_price(&state, &rules());
        assert_eq!(b.hero_total, 200.0);
        assert_eq!(b.pool_total, 250.0);
        assert_eq!(b.fixed_total, 50.0);
        assert_eq!(b.allowance_applied, 100.0);
        assert_eq!(b.total, 400.0);
        assert_eq!(b.lines.last().unwrap().amount, -100.0);
    }

    #[test]
    fn test_total_equals_sum_of_lines() {
        let mut state = DesignState::default();
        state.toppers.push(deco(0, "edible_3d_complex", "unicorn"));
        state.support_elements.push(deco(1, "edible_2d_support", "clouds"));
        state.icing.drip = true;
        state.icing.gumpaste_base_board = true;
        state.cake_info = CakeInfo::for_type(CakeType::ThreeTier);

        let b = compute_price(&state, &rules());
        let sum: f64 = b.lines.iter().map(|l| l.amount).sum();
        assert!((sum - b.total).abs() < 1e-9);
        assert_eq!(b.item_price(DRIP_PRICE_KEY), Some(120.0));
    }

    #[test]
    fn test_allowance_bounded_by_pool() {
        let mut state = DesignState::default();
        state.support_elements.push(deco(0, "edible_2d_support", "clouds"));
        let b = compute_price(&state, &rules().with_fallback_allowance(500.0));
        assert_eq!(b.allowance_applied, 100.0);
        assert_eq!(b.total, 0.0);
    }

    #[test]
    fn test_disabled_items_price_zero() {
        let mut state = DesignState::default();
        let mut topper = deco(0, "printout", "logo");
        topper.enabled = false;
        let key = topper.id.to_string();
        state.toppers.push(topper);

        let b = compute_price(&state, &rules());
        assert_eq!(b.item_price(&key), Some(0.0));
        assert!(b.lines.is_empty());
        assert_eq!(b.total, 0.0);
    }

    #[test]
    fn test_missing_rule_is_data_gap() {
        let mut state = DesignState::default();
        state.toppers.push(deco(0, "sparkler", "gold sparkler"));

        let b = compute_price(&state, &rules());
        assert_eq!(b.total, 0.0);
        assert_eq!(b.data_gaps.len(), 1);
        assert_eq!(b.data_gaps[0].item_type, "sparkler");
    }

    #[test]
    fn test_countable_support_quantity_inferred() {
        let mut state = DesignState::default();
        let mut balls = deco(0, "plastic_ball_regular", "gold balls");
        balls.quantity = 0;
        balls.size = ItemSize::Large;
        state.support_elements.push(balls);

        let b = compute_price(&state, &rules());
        assert_eq!(b.total, 60.0);
    }

    #[test]
    fn test_messages_priced_by_kind() {
        let mut state = DesignState::default();
        let msg = |seq, kind, text: &str| {
            Message::from_analysis(
                ItemId { generation: 1, seq },
                &AnalyzedMessage {
                    kind,
                    text: text.to_string(),
                    position: MessagePosition::Top,
                    color: "#000000".to_string(),
                    x: None,
                    y: None,
                },
            )
        };
        state.messages.push(msg(0, MessageKind::IcingScript, "Happy Birthday"));
        state.messages.push(msg(1, MessageKind::GumpasteLetters, "MIA"));
        state.messages.push(msg(2, MessageKind::GumpasteLetters, "  "));

        let b = compute_price(&state, &rules());
        assert_eq!(b.pool_total, 30.0);
        assert_eq!(b.lines[0].label, "\"MIA\" (gumpaste_letters)");
        assert_eq!(b.lines.len(), 2);
        assert_eq!(b.total, 0.0);
    }
}
