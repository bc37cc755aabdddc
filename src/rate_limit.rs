use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;

/// Endpoints that cost money upstream and are therefore limited per client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Generate,
    Translate,
    Upload,
}

/// Sliding window in-memory rate limiter (process local).
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    hits: Arc<DashMap<(Action, String), VecDeque<Instant>>>,
    pub enabled: bool,
}

impl InMemoryRateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self { hits: Arc::new(DashMap::new()), enabled }
    }

    /// Records the hit and returns true when `client` is still under `limit` in `window`.
    pub fn check(&self, action: Action, client: &str, limit: usize, window: Duration) -> bool {
        if !self.enabled { return true; }
        let now = Instant::now();
        let mut entry = self.hits.entry((action, client.to_string())).or_default();
        while entry.front().is_some_and(|t| now.duration_since(*t) >= window) {
            entry.pop_front();
        }
        if entry.len() >= limit {
            return false;
        }
        entry.push_back(now);
        true
    }

    /// Drops clients with no hit inside `window`; keeps the map from growing unbounded.
    pub fn prune(&self, window: Duration) {
        let now = Instant::now();
        self.hits.retain(|_, q| q.back().is_some_and(|t| now.duration_since(*t) < window));
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Limit {
    pub max: usize,
    pub window: Duration,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub generate: Limit,
    pub translate: Limit,
    pub upload: Limit,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let hour = Duration::from_secs(3600);
        Self {
            enabled: true,
            generate: Limit { max: 20, window: hour },
            translate: Limit { max: 30, window: hour },
            upload: Limit { max: 10, window: hour },
        }
    }
}

impl RateLimitConfig {
    fn for_action(&self, action: Action) -> Limit {
        match action {
            Action::Generate => self.generate,
            Action::Translate => self.translate,
            Action::Upload => self.upload,
        }
    }

    pub fn longest_window(&self) -> Duration {
        self.generate.window.max(self.translate.window).max(self.upload.window)
    }
}

/// High level guard used by handlers.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self { Self { limiter, cfg } }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(InMemoryRateLimiter::new(cfg.enabled), cfg.clone())
    }

    pub fn allow(&self, action: Action, client: &str) -> bool {
        let l = self.cfg.for_action(action);
        self.limiter.check(action, client, l.max, l.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_basic() {
        let rl = InMemoryRateLimiter::new(true);
        let window = Duration::from_secs(60);
        for _ in 0..3 { assert!(rl.check(Action::Translate, "1.2.3.4", 3, window)); }
        assert!(!rl.check(Action::Translate, "1.2.3.4", 3, window));
        // other clients and other actions have their own buckets
        assert!(rl.check(Action::Translate, "5.6.7.8", 3, window));
        assert!(rl.check(Action::Upload, "1.2.3.4", 3, window));
    }

    #[test]
    fn window_expiry_frees_slots() {
        let rl = InMemoryRateLimiter::new(true);
        let window = Duration::from_millis(20);
        assert!(rl.check(Action::Generate, "c", 1, window));
        assert!(!rl.check(Action::Generate, "c", 1, window));
        std::thread::sleep(Duration::from_millis(30));
        assert!(rl.check(Action::Generate, "c", 1, window));
    }

    #[test]
    fn disabled_always_allows() {
        let rl = InMemoryRateLimiter::new(false);
        for _ in 0..10 { assert!(rl.check(Action::Upload, "c", 1, Duration::from_secs(60))); }
    }

    #[test]
    fn prune_drops_idle_clients() {
        let rl = InMemoryRateLimiter::new(true);
        rl.check(Action::Upload, "idle", 5, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(5));
        rl.prune(Duration::from_millis(1));
        assert!(rl.hits.is_empty());
    }
}
