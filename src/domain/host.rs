use crate::domain::LightState;
use async_trait::async_trait;
use tracing::info;

/// The home-automation host that owns the light entities the engine creates.
#[async_trait]
pub trait Host: Send {
    async fn add_entities(&mut self, entities: Vec<LightState>);

    async fn remove_entity(&mut self, unique_id: &str);

    /// Tells the host to re-read an entity's state.
    async fn write_state(&mut self, state: LightState);
}

/// Host that only reports what happens to its entities.
#[derive(Debug, Default)]
pub struct LogHost;

#[async_trait]
impl Host for LogHost {
    async fn add_entities(&mut self, entities: Vec<LightState>) {
        for entity in entities {
            info!(unique_id = %entity.unique_id, "💡 Added light '{}'", entity.name.as_deref().unwrap_or_default());
        }
    }

    async fn remove_entity(&mut self, unique_id: &str) {
        info!(unique_id, "💡 Removed light");
    }

    async fn write_state(&mut self, state: LightState) {
        info!(
            unique_id = %state.unique_id,
            "💡 '{}' is {}, brightness {:?}, {:?}",
            state.name.as_deref().unwrap_or_default(),
            if state.is_on { "on" } else { "off" },
            state.brightness,
            state.color_mode
        );
    }
}
