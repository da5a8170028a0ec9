//! TTL cache in front of the rule table store.
//!
//! A fetch failure serves the last good snapshot for that merchant, however
//! old. Only a cold failure, with nothing cached, reaches the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::rules::{PricingRule, RuleSet};
use crate::prelude::Result;

pub const DEFAULT_RULE_TTL: Duration = Duration::from_secs(300);

/// Millisecond time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

/// Source of rule table rows.
///
/// Implementations return global rows plus the rows of `merchant_id`;
/// [`RuleSet::new`] does the filtering and ordering.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn fetch_rules(&self, merchant_id: Option<&str>) -> Result<Vec<PricingRule>>;
}

/// In-memory store, used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleStore {
    rules: Vec<PricingRule>,
}

impl StaticRuleStore {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl RuleStore for StaticRuleStore {
    async fn fetch_rules(&self, _merchant_id: Option<&str>) -> Result<Vec<PricingRule>> {
        Ok(self.rules.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Global,
    Merchant(String),
}

impl CacheKey {
    fn for_merchant(merchant_id: Option<&str>) -> Self {
        match merchant_id {
            Some(m) => CacheKey::Merchant(m.to_string()),
            None => CacheKey::Global,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    rules: Arc<RuleSet>,
    fetched_at_ms: u64,
}

/// Rule snapshots per merchant, refreshed after the TTL.
pub struct RuleCache<S> {
    store: S,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fallback_allowance: Option<f64>,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl<S: RuleStore> RuleCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_RULE_TTL,
            fallback_allowance: None,
            entries: HashMap::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Allowance applied to every snapshot built by this cache.
    pub fn with_fallback_allowance(mut self, allowance: f64) -> Self {
        self.fallback_allowance = Some(allowance);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Rule snapshot for `merchant_id`, fetching when missing or expired.
    pub async fn get(&mut self, merchant_id: Option<&str>) -> Result<Arc<RuleSet>> {
        let key = CacheKey::for_merchant(merchant_id);
        let now = self.clock.now_ms();

        if let Some(entry) = self.entries.get(&key) {
            let age = now.saturating_sub(entry.fetched_at_ms);
            if age < self.ttl.as_millis() as u64 {
                debug!(target: "cake_customizer::pricing", ?key, age_ms = age, "Rule cache hit");
                return Ok(Arc::clone(&entry.rules));
            }
        }

        match self.store.fetch_rules(merchant_id).await {
            Ok(rows) => {
                let mut rules = RuleSet::new(rows, merchant_id);
                if let Some(allowance) = self.fallback_allowance {
                    rules = rules.with_fallback_allowance(allowance);
                }
                let rules = Arc::new(rules);
                info!(
                    target: "cake_customizer::pricing",
                    ?key,
                    rules = rules.len(),
                    "Rule table refreshed"
                );
                self.entries.insert(
                    key,
                    CacheEntry {
                        rules: Arc::clone(&rules),
                        fetched_at_ms: self.clock.now_ms(),
                    },
                );
                Ok(rules)
            }
            Err(e) => match self.entries.get(&key) {
                Some(stale) => {
                    warn!(
                        target: "cake_customizer::pricing",
                        ?key,
                        error = %e,
                        "Rule table fetch failed, serving stale snapshot"
                    );
                    Ok(Arc::clone(&stale.rules))
                }
                None => Err(e),
            },
        }
    }

    /// Drop the snapshot for one merchant.
    pub fn invalidate(&mut self, merchant_id: Option<&str>) {
        self.entries.remove(&CacheKey::for_merchant(merchant_id));
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Service;
    use crate::Error;
    use std::sync::atomic::AtomicBool;

    /// Store that counts fetches and can be switched into failure mode.
    struct FlakyStore {
        fetches: AtomicU64,
        failing: AtomicBool,
        price: f64,
    }

    impl FlakyStore {
        fn new(price: f64) -> Self {
            Self {
                fetches: AtomicU64::new(0),
                failing: AtomicBool::new(false),
                price,
            }
        }
    }

    #[async_trait]
    impl RuleStore for Arc<FlakyStore> {
        async fn fetch_rules(&self, _merchant_id: Option<&str>) -> Result<Vec<PricingRule>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::upstream(Service::RuleTable, "connection reset"));
            }
            Ok(vec![PricingRule::flat("printout", self.price)])
        }
    }

    #[tokio::test]
    async fn test_cached_within_ttl() {
        let store = Arc::new(FlakyStore::new(40.0));
        let clock = Arc::new(ManualClock::new(1_000_000));
        let mut cache = RuleCache::with_clock(Arc::clone(&store), clock.clone());

        cache.get(None).await.unwrap();
        clock.advance(Duration::from_secs(299));
        cache.get(None).await.unwrap();
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(2));
        cache.get(None).await.unwrap();
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_served_on_failure() {
        let store = Arc::new(FlakyStore::new(40.0));
        let clock = Arc::new(ManualClock::new(0));
        let mut cache = RuleCache::with_clock(Arc::clone(&store), clock.clone());

        cache.get(Some("shop-a")).await.unwrap();
        store.failing.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(3600));

        let rules = cache.get(Some("shop-a")).await.unwrap();
        assert_eq!(rules.get("printout").unwrap().price, 40.0);
    }

    #[tokio::test]
    async fn test_cold_failure_propagates() {
        let store = Arc::new(FlakyStore::new(40.0));
        store.failing.store(true, Ordering::SeqCst);
        let mut cache = RuleCache::with_clock(store, Arc::new(ManualClock::new(0)));

        let err = cache.get(None).await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_merchants_cached_separately() {
        let store = Arc::new(FlakyStore::new(40.0));
        let mut cache = RuleCache::with_clock(Arc::clone(&store), Arc::new(ManualClock::new(0)));

        cache.get(None).await.unwrap();
        cache.get(Some("shop-a")).await.unwrap();
        cache.get(Some("shop-a")).await.unwrap();
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);

        cache.invalidate(Some("shop-a"));
        cache.get(Some("shop-a")).await.unwrap();
        cache.get(None).await.unwrap();
        assert_eq!(store.fetches.load(Ordering::SeqCst), 3);

        cache.invalidate_all();
        cache.get(None).await.unwrap();
        assert_eq!(store.fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fallback_allowance_applied() {
        let mut cache = RuleCache::with_clock(
            StaticRuleStore::new(vec![PricingRule::flat("printout", 40.0)]),
            Arc::new(ManualClock::new(0)),
        )
        .with_fallback_allowance(75.0);
        let rules = cache.get(None).await.unwrap();
        assert_eq!(rules.allowance(), 75.0);
    }
}
