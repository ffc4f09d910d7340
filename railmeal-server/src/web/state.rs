//! Application state for the web layer.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::AppConfig;
use crate::drafts::DraftSessions;
use crate::eligibility::{EligibilityConfig, MenuConfig};
use crate::pricing::PricingConfig;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<S> {
    /// Timetable, restaurant and order store
    pub store: Arc<S>,

    /// Eligibility rules
    pub eligibility: Arc<EligibilityConfig>,

    /// Pricing parameters
    pub pricing: Arc<PricingConfig>,

    /// Menu display order
    pub menu: Arc<MenuConfig>,

    /// Drafts between search and checkout
    pub drafts: DraftSessions,

    clock: Clock,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            eligibility: Arc::clone(&self.eligibility),
            pricing: Arc::clone(&self.pricing),
            menu: Arc::clone(&self.menu),
            drafts: self.drafts.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(store: S, config: &AppConfig) -> Self {
        Self {
            store: Arc::new(store),
            eligibility: Arc::new(config.eligibility.clone()),
            pricing: Arc::new(config.pricing.clone()),
            menu: Arc::new(config.menu.clone()),
            drafts: DraftSessions::new(&config.drafts),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The current time in the timetable's local offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)().with_timezone(&self.eligibility.local_offset())
    }
}
