//! Serialize a frame and hand it to the registry.

use serde::Serialize;

use crate::domain::{ConnectionRegistry, UserId};

use super::error::DeliveryError;

/// Serialize `frame` once and write it to every live connection of `user_id`.
///
/// Returns the number of connections written to.
pub async fn send_json<T>(
    registry: &dyn ConnectionRegistry,
    user_id: &UserId,
    frame: &T,
) -> Result<usize, DeliveryError>
where
    T: Serialize + ?Sized,
{
    let payload =
        serde_json::to_string(frame).map_err(|e| DeliveryError::Serialization(e.to_string()))?;
    Ok(registry.send_to_user(user_id, &payload).await?)
}
