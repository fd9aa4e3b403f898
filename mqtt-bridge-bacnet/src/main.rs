//! BACnet to cloud MQTT bridge.
//!
//! Polls BACnet/IP points and publishes their values as device telemetry.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use fieldsight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
use mqtt_bridge_bacnet::bacnet::BacnetClient;
use mqtt_bridge_bacnet::config::{BacnetBridgeConfig, PointSourceConfig};
use mqtt_bridge_bacnet::poller::Poller;
use mqtt_bridge_bacnet::scheduler::Scheduler;
use mqtt_bridge_bacnet::source::{BrokerPointSource, FilePointSource, PointSource};

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("bacnet.json5");

    let config = BacnetBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let mut runner = BridgeRunner::new_with_args("bacnet", config, Some(&args))
        .context("Failed to start bridge")?
        .with_status_publishing();

    let bacnet = runner.config().bacnet.clone();

    let client = match BacnetClient::bind(bacnet.bind, bacnet.apdu_timeout()).await {
        Ok(client) => client,
        Err(e) => {
            runner
                .report_error(format!("Failed to bind {}: {}", bacnet.bind, e))
                .await;
            return Err(e).with_context(|| format!("Failed to bind {}", bacnet.bind));
        }
    };
    info!(
        "BACnet client on {} as '{}' (instance {})",
        bacnet.bind, bacnet.local_device.name, bacnet.local_device.instance
    );

    let source_kind = match &bacnet.points {
        PointSourceConfig::Broker => "broker",
        PointSourceConfig::File { .. } => "file",
    };
    let source: Arc<dyn PointSource> = match &bacnet.points {
        PointSourceConfig::Broker => {
            let topic = runner.config().device.config_topic();
            info!("Point set source: broker topic {}", topic);
            Arc::new(BrokerPointSource::new(runner.link().clone(), topic))
        }
        PointSourceConfig::File { path } => {
            info!("Point set source: file {:?}", path);
            Arc::new(FilePointSource::new(path.clone()))
        }
    };

    let poller = Poller::new(
        source,
        Arc::new(client),
        Arc::new(runner.publisher()),
        runner.minter(),
    );
    runner.spawn(Scheduler::new(poller, bacnet.poll_interval()).run());

    let metadata = json!({
        "local_device": bacnet.local_device.name,
        "local_instance": bacnet.local_device.instance,
        "poll_interval_secs": bacnet.poll_interval_secs,
        "point_source": source_kind,
    });

    runner.run_with_metadata(Some(metadata)).await?;

    Ok(())
}
