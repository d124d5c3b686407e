//! Integration tests for the now-playing update protocol, driven through a
//! recording native bridge and a fake playback control.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rllink::DeepLinkRouter;
use rlmeta::{MetadataPoller, MetadataSource, NowPlayingSink, TrackInfo, TrackMetadata};
use rlplayer::{PlaybackControl, PlaybackState};
use rlsession::android::AndroidHandler;
use rlsession::{
    create_handler, BridgeError, NativeBridge, NowPlayingInfo, NowPlayingSynchronizer, Platform,
    SyncOptions,
};
use serde_json::Value;

const SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
struct RecordedCall {
    method: String,
    payload: Value,
    at: tokio::time::Instant,
}

#[derive(Default)]
struct RecordingBridge {
    calls: Mutex<Vec<RecordedCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingBridge {
    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn fail_on(&self, method: &str) {
        self.failing.lock().unwrap().insert(method.to_string());
    }

    fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }
}

#[async_trait]
impl NativeBridge for RecordingBridge {
    async fn invoke(&self, method: &str, payload: Value) -> Result<Value, BridgeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            payload,
            at: tokio::time::Instant::now(),
        });
        if self.failing.lock().unwrap().contains(method) {
            return Err(BridgeError::new(method, "injected native failure"));
        }
        Ok(Value::Null)
    }
}

struct FakePlayback {
    state: Mutex<PlaybackState>,
    resumes: AtomicUsize,
}

impl FakePlayback {
    fn new(state: PlaybackState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            resumes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PlaybackControl for FakePlayback {
    fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap()
    }

    async fn resume(&self) -> rlplayer::Result<()> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = PlaybackState::Playing;
        Ok(())
    }
}

fn synchronizer(
    bridge: Arc<RecordingBridge>,
    playback: Arc<FakePlayback>,
) -> NowPlayingSynchronizer {
    let handler = Arc::new(AndroidHandler::new(
        bridge,
        DeepLinkRouter::new("radiolink"),
    ));
    NowPlayingSynchronizer::new(handler, playback, SyncOptions::default())
}

fn info(title: &str) -> NowPlayingInfo {
    NowPlayingInfo::new(title, "Some Artist", None)
}

#[tokio::test(start_paused = true)]
async fn test_protocol_runs_all_five_steps_in_order() {
    let bridge = Arc::new(RecordingBridge::default());
    let playback = FakePlayback::new(PlaybackState::Playing);
    let sync = synchronizer(bridge.clone(), playback.clone());

    sync.update_now_playing(info("So What")).await;

    let calls = bridge.calls();
    let methods: Vec<&str> = calls.iter().map(|c| c.method.as_str()).collect();
    assert_eq!(
        methods,
        vec![
            "mediaNotification.setVisible",
            "mediaSession.setMetadata",
            "mediaNotification.setVisible",
        ]
    );
    assert_eq!(calls[0].payload["visible"], Value::Bool(false));
    assert_eq!(calls[2].payload["visible"], Value::Bool(true));

    // The surface is re-enabled only after the settle delay has elapsed.
    assert!(calls[2].at - calls[1].at >= SETTLE);

    // Playback was active beforehand, so the protocol resumed it.
    assert_eq!(playback.resumes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_resume_when_playback_was_idle() {
    let bridge = Arc::new(RecordingBridge::default());
    let playback = FakePlayback::new(PlaybackState::Stopped);
    let sync = synchronizer(bridge.clone(), playback.clone());

    sync.update_now_playing(info("So What")).await;

    assert_eq!(bridge.count("mediaSession.setMetadata"), 1);
    assert_eq!(playback.resumes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_native_failure_never_propagates() {
    let bridge = Arc::new(RecordingBridge::default());
    bridge.fail_on("mediaSession.setMetadata");
    let playback = FakePlayback::new(PlaybackState::Playing);
    let sync = synchronizer(bridge.clone(), playback.clone());

    // Must complete without panicking; the error stays inside.
    sync.update_now_playing(info("So What")).await;

    // The protocol aborted before the resume step.
    assert_eq!(playback.resumes.load(Ordering::SeqCst), 0);

    // A later update is unaffected.
    bridge.failing.lock().unwrap().clear();
    sync.update_now_playing(info("Freddie Freeloader")).await;
    assert_eq!(bridge.count("mediaSession.setMetadata"), 2);
    assert_eq!(playback.resumes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_updates_are_serialized() {
    let bridge = Arc::new(RecordingBridge::default());
    let playback = FakePlayback::new(PlaybackState::Playing);
    let sync = Arc::new(synchronizer(bridge.clone(), playback.clone()));

    tokio::join!(
        sync.update_now_playing(info("First")),
        sync.update_now_playing(info("Second")),
    );

    // Two complete, non-interleaved protocol runs.
    let visible_flags: Vec<bool> = bridge
        .calls()
        .iter()
        .filter(|c| c.method == "mediaNotification.setVisible")
        .map(|c| c.payload["visible"].as_bool().unwrap())
        .collect();
    assert_eq!(visible_flags, vec![false, true, false, true]);
}

#[tokio::test(start_paused = true)]
async fn test_sink_derives_fresh_info_per_update() {
    let bridge = Arc::new(RecordingBridge::default());
    let playback = FakePlayback::new(PlaybackState::Playing);
    let sync = synchronizer(bridge.clone(), playback.clone());

    sync.now_playing_changed(TrackMetadata {
        track: TrackInfo::new("Blue in Green", "Miles Davis"),
        artwork: Some("https://img.example/kob.jpg".to_string()),
    })
    .await;

    let calls = bridge.calls();
    let metadata_call = calls
        .iter()
        .find(|c| c.method == "mediaSession.setMetadata")
        .unwrap();
    assert_eq!(metadata_call.payload["title"], "Blue in Green");
    assert_eq!(metadata_call.payload["artist"], "Miles Davis");
    assert_eq!(
        metadata_call.payload["artworkUri"],
        "https://img.example/kob.jpg"
    );
}

/// End-to-end scenario: a 5-second poller feeding the synchronizer. Three
/// identical fetch results produce no native traffic; the fourth, changed
/// result triggers exactly one full protocol run.
#[tokio::test(start_paused = true)]
async fn test_poller_to_session_scenario() {
    struct SwitchingSource {
        current: Mutex<TrackMetadata>,
    }

    #[async_trait]
    impl MetadataSource for SwitchingSource {
        async fn now_playing(&self) -> rlmeta::Result<TrackMetadata> {
            Ok(self.current.lock().unwrap().clone())
        }
    }

    let track_a = TrackMetadata {
        track: TrackInfo::new("So What", "Miles Davis"),
        artwork: None,
    };
    let track_b = TrackMetadata {
        track: TrackInfo::new("All Blues", "Miles Davis"),
        artwork: None,
    };

    let source = Arc::new(SwitchingSource {
        current: Mutex::new(track_a),
    });
    let bridge = Arc::new(RecordingBridge::default());
    let playback = FakePlayback::new(PlaybackState::Playing);
    let sync = Arc::new(synchronizer(bridge.clone(), playback.clone()));

    let poller = MetadataPoller::new(source.clone(), sync, Duration::from_millis(3000));
    poller.start(Duration::from_millis(5000));

    // Prime with the first result, then three identical results over 15 s.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let after_prime = bridge.count("mediaSession.setMetadata");
    assert_eq!(after_prime, 1);

    tokio::time::sleep(Duration::from_millis(15_000)).await;
    assert_eq!(bridge.count("mediaSession.setMetadata"), after_prime);

    // The fourth result differs: exactly one more protocol run, with the
    // surface disabled before and re-enabled after the settle delay.
    *source.current.lock().unwrap() = track_b;
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    poller.stop();

    assert_eq!(bridge.count("mediaSession.setMetadata"), 2);
    let calls = bridge.calls();
    let last_three = &calls[calls.len() - 3..];
    assert_eq!(last_three[0].method, "mediaNotification.setVisible");
    assert_eq!(last_three[0].payload["visible"], Value::Bool(false));
    assert_eq!(last_three[1].method, "mediaSession.setMetadata");
    assert_eq!(last_three[2].payload["visible"], Value::Bool(true));
    assert!(last_three[2].at - last_three[1].at >= SETTLE);
}

#[tokio::test]
async fn test_factory_handler_survives_repeated_teardown() {
    let handler = create_handler(
        Platform::Ios,
        Arc::new(RecordingBridge::default()),
        DeepLinkRouter::new("radiolink"),
    );
    handler.teardown().await.unwrap();
    handler.teardown().await.unwrap();
    assert_eq!(handler.platform(), Platform::Ios);
}
