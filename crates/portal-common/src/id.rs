use serde::Serialize;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derives an idempotency token from the serialized form of a message.
///
/// Two structurally identical messages get the same token, so a receiver
/// that has already evaluated one will skip the other.
pub fn once_id_for<T: Serialize>(message: &T) -> String {
    match serde_json::to_string(message) {
        Ok(json) => format!("id_{json}"),
        Err(e) => {
            tracing::warn!("could not serialize message for once id: {e}");
            format!("id_{}", new_id())
        }
    }
}
