use std::sync::Arc;

use tracing::{error, info};

use linebus::broker::TopicRegistry;
use linebus::client::SessionRegistry;
use linebus::config::load_config;
use linebus::transport::server::start_server;
use linebus::utils::logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = load_config().expect("Failed to load configuration");
    logging::init(&config.server.log_level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let topics = Arc::new(TopicRegistry::new(
        config.bus.message_limit,
        config.bus.publisher_limit,
        config.bus.subscriber_limit,
    ));
    let sessions = Arc::new(SessionRegistry::new(topics.clone()));

    tokio::select! {
        result = start_server(&addr, sessions) => {
            if let Err(err) = result {
                error!(%err, "server failed");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    topics.close().await;
}
