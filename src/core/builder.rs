use std::sync::Arc;

use crate::{
    config::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::dispatch::{Dispatch, NullDispatch};
use super::service::LotService;

/// Builder for constructing a [`LotService`] with optional subscribers and dispatcher.
pub struct LotServiceBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    dispatch: Option<Arc<dyn Dispatch>>,
}

impl LotServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            dispatch: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive service events (connections, reports, edges, rejections)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the dispatcher that delivers notices to station groups.
    ///
    /// Without one, notices are dropped.
    pub fn with_dispatcher(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Builds the service and starts its event listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<LotService> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let dispatch = self
            .dispatch
            .unwrap_or_else(|| Arc::new(NullDispatch) as Arc<dyn Dispatch>);

        let svc = Arc::new(LotService::new_internal(self.cfg, bus, subs, dispatch));
        svc.event_listener();
        svc
    }
}
