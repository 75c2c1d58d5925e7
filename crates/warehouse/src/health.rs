//! Warehouse health checks.

use crate::client::WarehouseClient;
use tracing::{debug, error};

/// Check warehouse connection health.
pub async fn check_connection(client: &WarehouseClient) -> bool {
    let mut conn = client.connection().await;
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&mut *conn)
        .await
    {
        Ok(_) => {
            debug!("Warehouse connection healthy");
            true
        }
        Err(e) => {
            error!("Warehouse health check failed: {}", e);
            false
        }
    }
}
