use std::sync::Arc;
use std::time::Duration;

use rlconfig::Config;
use rllink::{DeepLinkRouter, NavigationTarget};
use rlmeta::{MetadataClient, MetadataPoller};
use rlplayer::{HttpStreamTransport, PlaybackEngine};
use rlsession::{
    create_handler, detect_platform, NowPlayingSynchronizer, NullBridge, SessionOptions,
    SyncOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Configuration & logging ==========

    let config = Arc::new(Config::load_config("")?);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(config.get_log_min_level().unwrap_or_else(|_| "info".into()))
        });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source = config.get_stream_source()?;
    let scheme = config.get_app_scheme()?;
    info!("📻 Starting Radiolink for {}", source.display_name);

    // ========== PHASE 2 : Session layer ==========

    let mut router = DeepLinkRouter::new(&scheme);
    router.register("news", NavigationTarget::Screen("news".to_string()));
    router.register("polls", NavigationTarget::Screen("polls".to_string()));

    // The hosting mobile shell injects its FFI bridge here; the standalone
    // binary runs with the no-op bridge.
    let handler = create_handler(detect_platform(), Arc::new(NullBridge), router);

    let options = SessionOptions::new("radiolink.playback", &source.display_name, &scheme);
    handler.configure(&options).await?;
    handler.register_for_background().await?;
    info!("✅ Background handler ready ({})", handler.platform());

    // ========== PHASE 3 : Playback engine ==========

    let transport = Arc::new(HttpStreamTransport::new()?);
    let engine = Arc::new(PlaybackEngine::new(
        &source.stream_url,
        transport,
        Duration::from_millis(config.get_connect_timeout_ms()?),
    ));

    // ========== PHASE 4 : Metadata pipeline ==========

    let fetch_timeout = Duration::from_millis(config.get_fetch_timeout_ms()?);
    let client = Arc::new(
        MetadataClient::builder()
            .endpoint(&source.metadata_url)
            .timeout(fetch_timeout)
            .build()?,
    );

    let synchronizer = Arc::new(NowPlayingSynchronizer::new(
        handler.clone(),
        engine.clone(),
        SyncOptions {
            settle_delay: Duration::from_millis(config.get_settle_delay_ms()?),
        },
    ));

    let poller = Arc::new(MetadataPoller::new(client, synchronizer, fetch_timeout));

    // Keep the poller's suspend inputs in sync with playback.
    {
        let poller = Arc::clone(&poller);
        let mut events = engine.subscribe();
        tokio::spawn(async move {
            while let Ok(change) = events.recv().await {
                poller.set_playback_active(change.to.is_active());
            }
        });
    }

    // ========== PHASE 5 : Go live ==========

    if let Err(e) = engine.play().await {
        // Connection errors surface to the user for an explicit retry;
        // the process stays up with the metadata pipeline armed.
        warn!("⚠️ Stream did not start: {e}");
    }
    poller.start(Duration::from_millis(config.get_poll_interval_ms()?));
    info!("✅ Radiolink is live, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    // ========== PHASE 6 : Shutdown ==========

    info!("Shutting down");
    poller.stop();
    engine.stop().await?;
    handler.teardown().await?;

    Ok(())
}
