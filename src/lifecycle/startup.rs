//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend client and gateway service from the resolved config
//! - Inject the logging sink into both
//! - Start the service under a lifecycle controller
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The backend connects before the listener binds

use crate::backend::NatsClient;
use crate::config::ResolvedConfig;
use crate::lifecycle::controller::{LifecycleController, LifecycleError};
use crate::observability::Logger;
use crate::service::GatewayService;

/// Construct the gateway service without starting it.
pub fn build_service(config: &ResolvedConfig, logger: &Logger) -> GatewayService {
    let client = NatsClient::new(
        config.nats_url.clone(),
        config.request_timeout(),
        logger.clone(),
    );
    GatewayService::new(client, config.clone(), logger.clone())
}

/// Build and start the gateway.
pub async fn launch(
    config: &ResolvedConfig,
    logger: &Logger,
) -> Result<LifecycleController<GatewayService>, LifecycleError> {
    let mut controller = LifecycleController::new(build_service(config, logger));
    controller.start().await.map_err(LifecycleError::Start)?;
    Ok(controller)
}
