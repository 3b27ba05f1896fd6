use std::sync::{Arc, Mutex};

use battwise_core::telemetry::normalize;
use battwise_core::{BatterySnapshot, Capability};
use battwise_platform::BatteryProvider;
use chrono::Utc;
use tracing::{trace, warn};

/// Reads the platform provider and normalizes the result.
///
/// The provider is chosen once and shared; reads run on the blocking pool.
#[derive(Clone)]
pub struct Acquisition {
    provider: Arc<Mutex<Box<dyn BatteryProvider>>>,
    capability: Capability,
    name: &'static str,
}

impl Acquisition {
    pub fn new(provider: Box<dyn BatteryProvider>) -> Self {
        let capability = provider.capability();
        let name = provider.name();
        Self {
            provider: Arc::new(Mutex::new(provider)),
            capability,
            name,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn provider_name(&self) -> &'static str {
        self.name
    }

    /// Take a fresh snapshot. Returns `None` when the provider fails.
    pub async fn acquire(&self) -> Option<BatterySnapshot> {
        let provider = Arc::clone(&self.provider);
        let read = tokio::task::spawn_blocking(move || {
            let mut provider = provider
                .lock()
                .map_err(|_| color_eyre::eyre::eyre!("Battery provider lock poisoned"))?;
            provider.read()
        })
        .await;

        let raw = match read {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(provider = self.name, error = %e, "Battery read failed");
                return None;
            }
            Err(e) => {
                warn!(provider = self.name, error = %e, "Battery read task failed");
                return None;
            }
        };

        let snapshot = normalize(&raw, self.capability, Utc::now().timestamp_millis());
        trace!(
            level = ?snapshot.level,
            status = %snapshot.status,
            "Snapshot acquired"
        );
        Some(snapshot)
    }
}

#[cfg(test)]
pub mod fake {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use battwise_core::{Capability, RawBatteryInfo};
    use battwise_platform::BatteryProvider;
    use color_eyre::eyre::{eyre, Result};

    /// Provider that replays scripted readings; `None` entries fail.
    #[derive(Clone, Default)]
    pub struct ScriptedBattery {
        readings: Arc<Mutex<VecDeque<Option<RawBatteryInfo>>>>,
        pub capability: Capability,
    }

    impl ScriptedBattery {
        pub fn new(capability: Capability) -> Self {
            Self {
                readings: Arc::default(),
                capability,
            }
        }

        pub fn push_level(&self, level: i64, status: &str) {
            self.push(Some(RawBatteryInfo {
                level,
                charging_status: status.to_string(),
                ..Default::default()
            }));
        }

        pub fn push(&self, reading: Option<RawBatteryInfo>) {
            self.readings.lock().unwrap().push_back(reading);
        }
    }

    impl BatteryProvider for ScriptedBattery {
        fn read(&mut self) -> Result<RawBatteryInfo> {
            match self.readings.lock().unwrap().pop_front() {
                Some(Some(raw)) => Ok(raw),
                Some(None) => Err(eyre!("scripted failure")),
                None => Err(eyre!("script exhausted")),
            }
        }

        fn capability(&self) -> Capability {
            self.capability
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }
}
