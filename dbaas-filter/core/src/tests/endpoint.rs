use super::*;
use crate::EndpointResolver;
use tokio::time;

#[tokio::test]
async fn one_listing_populates_every_zone() {
    init_tracing();

    let api = FakeApi::new();
    api.add_zone("de-fra-1");
    let resolver = EndpointResolver::new(TIMEOUT);

    let gva = resolver.resolve(&api, ZONE).await;
    assert_eq!(gva.endpoint, "https://ch-gva-2.api.test/v2");

    let fra = resolver.resolve(&api, "de-fra-1").await;
    assert_eq!(fra.name, "de-fra-1");
    assert_eq!(fra.endpoint, "https://de-fra-1.api.test/v2");

    assert_eq!(api.zone_listings(), 1);
}

#[tokio::test]
async fn unknown_zone_falls_back() {
    init_tracing();

    let api = FakeApi::new();
    let resolver = EndpointResolver::new(TIMEOUT);

    let zone = resolver.resolve(&api, "at-vie-9").await;
    assert_eq!(zone, EndpointResolver::fallback("at-vie-9"));
    assert_eq!(zone.endpoint, "https://api-at-vie-9.exoscale.com/v2");

    // Known zones were still cached by the listing.
    resolver.resolve(&api, ZONE).await;
    assert_eq!(api.zone_listings(), 1);
}

#[tokio::test]
async fn failed_listing_falls_back_and_retries() {
    init_tracing();

    let api = FakeApi::new();
    api.fail("zones");
    let resolver = EndpointResolver::new(TIMEOUT);

    let zone = resolver.resolve(&api, ZONE).await;
    assert_eq!(zone, EndpointResolver::fallback(ZONE));

    api.recover("zones");
    let zone = resolver.resolve(&api, ZONE).await;
    assert_eq!(zone.endpoint, "https://ch-gva-2.api.test/v2");
    assert_eq!(api.zone_listings(), 2);
}

#[tokio::test]
async fn concurrent_misses_share_one_listing() {
    init_tracing();

    let api = FakeApi::new();
    api.add_zone("de-fra-1");
    let resolver = EndpointResolver::new(TIMEOUT);

    let (gva, fra, again) = tokio::join!(
        resolver.resolve(&api, ZONE),
        resolver.resolve(&api, "de-fra-1"),
        resolver.resolve(&api, ZONE),
    );
    assert_eq!(gva, again);
    assert_eq!(fra.endpoint, "https://de-fra-1.api.test/v2");
    assert_eq!(api.zone_listings(), 1);
}

#[tokio::test]
async fn concurrent_unknown_zone_misses_share_one_listing() {
    init_tracing();

    let api = FakeApi::new();
    let resolver = EndpointResolver::new(TIMEOUT);

    let (a, b, c) = tokio::join!(
        resolver.resolve(&api, "at-vie-9"),
        resolver.resolve(&api, "at-vie-9"),
        resolver.resolve(&api, "at-vie-9"),
    );
    let fallback = EndpointResolver::fallback("at-vie-9");
    assert_eq!(a, fallback);
    assert_eq!(b, fallback);
    assert_eq!(c, fallback);
    assert_eq!(api.zone_listings(), 1);

    // A later miss lists again.
    resolver.resolve(&api, "at-vie-9").await;
    assert_eq!(api.zone_listings(), 2);
}

#[tokio::test(start_paused = true)]
async fn stalled_listing_times_out_once_for_concurrent_misses() {
    init_tracing();

    let api = FakeApi::new();
    api.stall("zones");
    let resolver = EndpointResolver::new(TIMEOUT);

    let start = time::Instant::now();
    let (a, b, c) = tokio::join!(
        resolver.resolve(&api, ZONE),
        resolver.resolve(&api, ZONE),
        resolver.resolve(&api, ZONE),
    );
    // The waiters reuse the timed out listing instead of each issuing one.
    let elapsed = start.elapsed();
    assert!(elapsed >= TIMEOUT && elapsed < 2 * TIMEOUT, "{elapsed:?}");

    let fallback = EndpointResolver::fallback(ZONE);
    assert_eq!(a, fallback);
    assert_eq!(b, fallback);
    assert_eq!(c, fallback);
    assert_eq!(api.zone_listings(), 1);
}
