use feed::domain::{LoadOutcome, SkipReason};
use feed::stubs::{InMemoryCollection, RecordingView};
use feed::{FeedEngine, FeedEngineConfig, IgnoreReason, TriggerHub, TriggerOutcome, Viewport, ViewportMetrics};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn setup(total: usize, view: RecordingView, config: FeedEngineConfig)
         -> (Arc<InMemoryCollection>, Arc<RecordingView>, Arc<FeedEngine<InMemoryCollection>>, TriggerHub<InMemoryCollection>) {
  let repo = Arc::new(InMemoryCollection::numbered("i", total));
  let view = Arc::new(view);
  let engine = Arc::new(FeedEngine::new(repo.clone(), view.clone(), config));
  let hub = TriggerHub::new(engine.clone(), view.clone());
  (repo, view, engine, hub)
}

/// Viewport siempre pegado al final del documento.
struct PinnedToBottom;

impl Viewport for PinnedToBottom {
  fn metrics(&self) -> ViewportMetrics {
    ViewportMetrics { scroll_top: 1000.0, viewport_height: 500.0, content_height: 1500.0 }
  }
}

#[tokio::test]
async fn sentinel_fires_only_inside_the_margin() {
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;

  assert_eq!(hub.on_sentinel(token, 1000.0).await, TriggerOutcome::Ignored(IgnoreReason::OutOfRange));
  let fired = hub.on_sentinel(token, 120.0).await;
  assert!(fired.loaded());
  assert_eq!(repo.request_count(), 2);
  assert_eq!(view.ids().len(), 20);
}

#[tokio::test]
async fn scroll_probe_is_throttled_and_distance_gated() {
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;
  let t0 = Instant::now();

  // arriba del todo: 500px hasta el final, por encima del umbral
  assert_eq!(hub.on_scroll(token, view.metrics(), t0).await, TriggerOutcome::Ignored(IgnoreReason::OutOfRange));

  view.scroll_to_bottom();
  let near = view.metrics();
  assert_eq!(hub.on_scroll(token, near, t0 + Duration::from_millis(50)).await,
             TriggerOutcome::Ignored(IgnoreReason::Throttled));
  assert!(hub.on_scroll(token, near, t0 + Duration::from_millis(250)).await.loaded());
  assert_eq!(repo.request_count(), 2);
}

#[tokio::test]
async fn redundant_triggers_hit_the_single_flight_gate() {
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;
  view.scroll_to_bottom();

  repo.hold();
  let (sentinel, others) = tokio::join!(hub.on_sentinel(token, 0.0), async {
    while repo.in_flight() == 0 {
      tokio::task::yield_now().await;
    }
    let scroll = hub.on_scroll(token, view.metrics(), Instant::now()).await;
    let again = hub.on_sentinel(token, 0.0).await;
    repo.release(1);
    (scroll, again)
  });

  assert!(sentinel.loaded());
  assert_eq!(others.0, TriggerOutcome::Fired(LoadOutcome::Skipped(SkipReason::InFlight)));
  assert_eq!(others.1, TriggerOutcome::Fired(LoadOutcome::Skipped(SkipReason::InFlight)));
  assert_eq!(repo.max_in_flight(), 1);
  assert_eq!(repo.request_count(), 2);
}

#[tokio::test]
async fn stale_tokens_are_ignored_after_reset() {
  let (repo, _view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), FeedEngineConfig::default());
  let old = hub.arm();
  engine.load_initial().await;
  engine.reset().await;

  assert_eq!(hub.on_sentinel(old, 0.0).await, TriggerOutcome::Ignored(IgnoreReason::StaleSession));
  assert_eq!(hub.fill_viewport(old).await, 0);
  assert_eq!(repo.request_count(), 1);

  let fresh = hub.arm();
  assert_ne!(fresh, old);
  engine.load_initial().await;
  assert!(hub.on_sentinel(fresh, 0.0).await.loaded());
}

#[tokio::test]
async fn short_viewport_probe_loads_until_content_fills() {
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 2500.0), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;

  assert_eq!(hub.fill_viewport(token).await, 2);
  assert_eq!(view.ids().len(), 30);
  assert_eq!(repo.request_count(), 3);
  assert_eq!(hub.fill_attempts(), 0);
}

#[tokio::test]
async fn short_viewport_probe_is_bounded_on_empty_pages() {
  let config = FeedEngineConfig { max_fill_attempts: 3, ..Default::default() };
  let (repo, view, engine, hub) = setup(50, RecordingView::short(), config);
  repo.stall(true);
  let token = hub.arm();
  engine.load_initial().await;

  assert_eq!(hub.fill_viewport(token).await, 3);
  assert_eq!(repo.request_count(), 4);
  // los intentos son consecutivos: sigue sin llenarse, no se insiste
  assert_eq!(hub.fill_viewport(token).await, 0);
  assert_eq!(repo.request_count(), 4);
  assert!(view.ids().is_empty());
  assert!(engine.state().has_more());
}

#[tokio::test]
async fn short_viewport_probe_stops_when_collection_ends() {
  let (repo, _view, engine, hub) = setup(15, RecordingView::short(), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;

  assert_eq!(hub.fill_viewport(token).await, 1);
  assert!(!engine.state().has_more());
  assert_eq!(repo.request_count(), 2);
}

#[tokio::test]
async fn periodic_scroll_probe_runs_until_exhausted() {
  let config = FeedEngineConfig { scroll_probe_period: Duration::from_millis(5),
                                  scroll_throttle: Duration::from_millis(1),
                                  ..Default::default() };
  let repo = Arc::new(InMemoryCollection::numbered("i", 25));
  let view = Arc::new(RecordingView::tall_content());
  let engine = Arc::new(FeedEngine::new(repo.clone(), view.clone(), config));
  let hub = TriggerHub::new(engine.clone(), Arc::new(PinnedToBottom));
  let token = hub.arm();
  engine.load_initial().await;

  tokio::time::timeout(Duration::from_secs(2), hub.run_scroll_probe(token)).await.expect("probe ends");
  assert_eq!(repo.request_count(), 3);
  assert_eq!(view.ids().len(), 25);
}

#[tokio::test]
async fn periodic_scroll_probe_stops_on_reset() {
  let config = FeedEngineConfig { scroll_probe_period: Duration::from_millis(5), ..Default::default() };
  let (repo, _view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), config);
  let token = hub.arm();
  engine.load_initial().await;
  engine.reset().await;

  tokio::time::timeout(Duration::from_secs(2), hub.run_scroll_probe(token)).await.expect("probe ends");
  assert_eq!(repo.request_count(), 1);
}

#[tokio::test]
async fn failed_initial_load_silences_every_trigger() {
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 500.0), FeedEngineConfig::default());
  repo.fail_request(0);
  let token = hub.arm();
  assert!(matches!(engine.load_initial().await, LoadOutcome::Failed(_)));

  assert_eq!(hub.on_sentinel(token, 0.0).await, TriggerOutcome::Fired(LoadOutcome::Skipped(SkipReason::Exhausted)));
  let far_later = Instant::now() + Duration::from_secs(5);
  assert_eq!(hub.on_scroll(token, view.metrics(), far_later).await,
             TriggerOutcome::Fired(LoadOutcome::Skipped(SkipReason::Exhausted)));
  assert_eq!(hub.fill_viewport(token).await, 0);
  assert_eq!(repo.request_count(), 1);
}

#[tokio::test]
async fn exactly_full_viewport_is_not_short() {
  // 10 filas de 100px llenan justo un viewport de 1000px
  let (repo, view, engine, hub) = setup(50, RecordingView::new(100.0, 1000.0), FeedEngineConfig::default());
  let token = hub.arm();
  engine.load_initial().await;

  assert!(!view.metrics().is_short());
  assert_eq!(hub.fill_viewport(token).await, 0);
  assert_eq!(repo.request_count(), 1);
  assert_eq!(view.ids().len(), 10);
}

#[tokio::test]
async fn sentinel_load_restarts_the_short_viewport_streak() {
  let config = FeedEngineConfig { max_fill_attempts: 3, ..Default::default() };
  let (repo, _view, engine, hub) = setup(50, RecordingView::short(), config);
  repo.stall(true);
  let token = hub.arm();
  engine.load_initial().await;

  assert_eq!(hub.fill_viewport(token).await, 3);
  assert_eq!(hub.fill_viewport(token).await, 0);
  assert_eq!(repo.request_count(), 4);

  // la carga del centinela rompe la racha: la sonda vuelve a intentarlo
  assert!(hub.on_sentinel(token, 0.0).await.loaded());
  assert_eq!(repo.request_count(), 8);
  assert_eq!(hub.fill_attempts(), 3);
}
