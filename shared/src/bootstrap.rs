//! Startup provisioning.

use tracing::info;

use crate::{CalendarService, Config, Result};

/// Create the configured test user if it does not exist yet.
///
/// Returns whether a user was created. Does nothing when no token is
/// configured.
pub async fn provision_test_user(config: &Config, service: &CalendarService) -> Result<bool> {
    let Some(token) = config.test_user_token() else {
        info!("no test user token configured");
        return Ok(false);
    };

    if service.user_exists(token).await? {
        info!("test user already exists");
        return Ok(false);
    }

    service.create_user(token).await?;
    info!("created test user");
    Ok(true)
}
