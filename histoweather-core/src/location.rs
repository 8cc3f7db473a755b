use async_trait::async_trait;
use std::fmt::Debug;

use crate::{geocoding::Place, request::Coordinates};

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// `None` when the position is unknown or access was refused.
    async fn current_coordinates(&self) -> Option<Coordinates>;
}

/// Device location as a [`Place`], or the pending sentinel when unavailable.
pub async fn resolve_current_place(provider: &dyn LocationProvider) -> Place {
    match provider.current_coordinates().await {
        Some(coords) => {
            tracing::debug!(
                latitude = coords.latitude,
                longitude = coords.longitude,
                "device location resolved"
            );
            Place::current(coords.latitude, coords.longitude)
        }
        None => {
            tracing::info!("device location unavailable");
            Place::pending_current()
        }
    }
}
