use anyhow::Context;
use ridemap::{
    animation::PathAnimator,
    core::{
        config::{MapConfig, MapProfile},
        geo::{densify, path_length, LatLng},
        map::MapView,
        viewport::CanvasSize,
    },
    layers::{
        landmark::taichung_landmarks,
        marker::{Marker, MarkerKind},
    },
    rendering::{context::RecordingSurface, renderer::RenderScene},
    services::{
        geocoding::format_coordinate, NominatimGeocoder, OsrmRouter, RateLimiter, ReverseGeocode,
        Route, RouteProducer, ThrottledCache,
    },
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Waypoints the simulated car visits at minimum
const MIN_TRIP_POINTS: usize = 24;

enum TripEvent {
    Moved { progress: f64, position: LatLng },
    Arrived,
}

struct Options {
    config: MapConfig,
    /// Ask the public geocoding and routing services instead of staying offline
    online: bool,
}

fn parse_args() -> anyhow::Result<Options> {
    let mut config = MapProfile::Balanced.resolve();
    let mut online = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--online" => online = true,
            "--lite" => config = MapProfile::Lite.resolve(),
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path))?;
                config = MapConfig::from_json_str(&json)
                    .with_context(|| format!("parsing {}", path))?;
            }
            "--speed" => {
                let speed = args.next().context("--speed needs a value")?;
                config.animation.speed = speed
                    .parse()
                    .with_context(|| format!("invalid speed {:?}", speed))?;
            }
            other => anyhow::bail!("unknown argument {:?}", other),
        }
    }
    config.validate()?;
    Ok(Options { config, online })
}

async fn plan_route(options: &Options, pickup: LatLng, dropoff: LatLng) -> Route {
    if !options.online {
        return Route::straight(&[pickup, dropoff]);
    }
    let limiter = Arc::new(RateLimiter::new(
        "router",
        options.config.cache.router_min_interval(),
    ));
    let routes = ThrottledCache::new(
        RouteProducer::new(OsrmRouter::public_demo(), options.config.cache.key_precision),
        limiter,
        options.config.cache.max_entries,
    );
    routes.get(&[pickup, dropoff][..]).await
}

async fn describe(options: &Options, coord: LatLng) -> String {
    if !options.online {
        return format_coordinate(&coord);
    }
    let limiter = Arc::new(RateLimiter::new(
        "geocoder",
        options.config.cache.geocoder_min_interval(),
    ));
    let addresses = ThrottledCache::new(
        ReverseGeocode::new(NominatimGeocoder::openstreetmap(), options.config.cache.key_precision),
        limiter,
        options.config.cache.max_entries,
    );
    addresses.get(&coord).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args()?;

    let pickup = LatLng::new(24.1618, 120.6468);
    let dropoff = LatLng::new(24.1372, 120.6869);

    let route = plan_route(&options, pickup, dropoff).await;
    let path = densify(&route.coordinates, MIN_TRIP_POINTS);
    log::info!(
        "trip: {} waypoints, {:.0} m, about {:.0} s",
        path.len(),
        path_length(&path),
        route.duration_seconds
    );

    let mut map = MapView::new(options.config.clone())?.with_canvas(CanvasSize::new(800.0, 600.0));
    map.on_center_change(|center| log::info!("map: centered on {:.5}, {:.5}", center.lat, center.lng));
    map.on_zoom_change(|zoom| log::info!("map: zoom {}", zoom));
    map.fit_path(&path, 40.0);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let animator = PathAnimator::from_config(&options.config.animation);
    {
        let tx = tx.clone();
        animator.on_progress(move |progress, position| {
            let _ = tx.send(TripEvent::Moved { progress, position });
        });
    }
    animator.on_complete(move || {
        let _ = tx.send(TripEvent::Arrived);
    });
    animator.set_path(path.clone());
    animator.start();

    let landmarks = taichung_landmarks();
    let mut surface = RecordingSurface::new();
    let mut markers = vec![
        Marker::pickup(pickup).with_label("Pickup"),
        Marker::dropoff(dropoff).with_label("Dropoff"),
        Marker::new("car", pickup, MarkerKind::Car),
    ];

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(TripEvent::Moved { progress, position }) => {
                    markers[2].set_position(position);
                    let scene = RenderScene::new(&markers)
                        .with_landmarks(&landmarks)
                        .with_route(&path);
                    if let Some((reasons, stats)) = map.render(&mut surface, &scene, Some(position)) {
                        log::debug!("frame {:?}: {:?}", reasons, stats);
                    }
                    log::info!(
                        "car at {:.5}, {:.5} ({:.0}%), {} draw commands",
                        position.lat,
                        position.lng,
                        progress * 100.0,
                        surface.len()
                    );
                }
                Some(TripEvent::Arrived) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::warn!("interrupted");
                break;
            }
        }
    }

    animator.shutdown();
    if let Some(position) = animator.position() {
        log::info!("arrived at {}", describe(&options, position).await);
    }
    Ok(())
}
