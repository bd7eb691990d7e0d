//! Construct source pollers from configuration using provided factories.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PollerConfig, PollingConfig, TriggerConfig};
use crate::core::trigger::{ImmediateTrigger, PeriodicTrigger};
use crate::core::{
    MessageChannel, NoTransactionDriver, PollPayload, PollerError, PollingEndpoint,
    PseudoTransactionDriver, PseudoTransactionalSource, ResourceHandle, SourcePoller,
    TransactionDriver, Trigger,
};

/// Build a trigger from its configuration.
pub fn build_trigger(cfg: &TriggerConfig) -> Arc<dyn Trigger> {
    match cfg {
        TriggerConfig::FixedRate { period_ms } => {
            Arc::new(PeriodicTrigger::fixed_rate(Duration::from_millis(*period_ms)))
        }
        TriggerConfig::FixedDelay { period_ms } => {
            Arc::new(PeriodicTrigger::fixed_delay(Duration::from_millis(*period_ms)))
        }
        TriggerConfig::Immediate => Arc::new(ImmediateTrigger),
    }
}

/// A poller paired with the trigger it should be scheduled under.
pub struct BuiltPoller<P, R, S, C> {
    /// The schedulable poller.
    pub poller: Arc<SourcePoller<P, R, S, C>>,
    /// Trigger policy from the configuration.
    pub trigger: Arc<dyn Trigger>,
}

/// Build pollers from configuration using source and channel factories.
///
/// The caller schedules each returned poller on a
/// [`crate::core::TaskScheduler`] under its paired trigger.
pub fn build_pollers<P, R, S, C, FS, FC>(
    cfg: &PollingConfig,
    mut source_factory: FS,
    mut channel_factory: FC,
) -> Result<HashMap<String, BuiltPoller<P, R, S, C>>, PollerError>
where
    P: PollPayload,
    R: ResourceHandle,
    S: PseudoTransactionalSource<P, R>,
    C: MessageChannel<P>,
    FS: FnMut(&str, &PollerConfig) -> Result<Arc<S>, PollerError>,
    FC: FnMut(&str, &PollerConfig) -> Result<Arc<C>, PollerError>,
{
    cfg.validate()
        .map_err(|e| PollerError::Backend(format!("config invalid: {e}")))?;

    let mut pollers = HashMap::new();
    for (name, poller_cfg) in &cfg.pollers {
        let source = source_factory(name, poller_cfg)?;
        let output = channel_factory(name, poller_cfg)?;
        let endpoint = Arc::new(
            PollingEndpoint::new(source, output)
                .with_send_timeout(Duration::from_millis(poller_cfg.send_timeout_ms)),
        );
        let driver: Arc<dyn TransactionDriver> = if poller_cfg.transactional {
            Arc::new(PseudoTransactionDriver)
        } else {
            Arc::new(NoTransactionDriver)
        };
        let poller = Arc::new(
            SourcePoller::new(endpoint, driver)
                .with_max_messages_per_poll(poller_cfg.max_messages_per_poll),
        );
        pollers.insert(
            name.clone(),
            BuiltPoller {
                poller,
                trigger: build_trigger(&poller_cfg.trigger),
            },
        );
    }

    Ok(pollers)
}
