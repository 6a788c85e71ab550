//! replay: drive a trip session from a scripted trip.
//!
//! Usage: `replay [trip.json]`.  Without an argument the bundled trip is
//! replayed.  Log verbosity follows `RUST_LOG` (default `info`).
//!
//! The script stands in for the engine's status stream; a small channel
//! stands in for the reroute subsystem, answering every off-route signal
//! with a fetch notification and, if the script names one, a new route.

mod engine;
mod script;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nav_core::{GeoPoint, Location, ManualClock, RouteId};
use nav_progress::RouteProgress;
use nav_route::{BannerInstruction, NavigationRoute, VoiceInstruction};
use nav_session::{
    FallbackVersionsEvent, SessionState, SetRoutes, SetRoutesError, TripObserver, TripSession,
};

use engine::ReplayEngine;
use script::{ReplayConfig, ScriptEvent};

const BUNDLED_TRIP: &str = include_str!("../trip.json");

// ── Console observer ──────────────────────────────────────────────────────────

#[derive(Default)]
struct ConsoleObserver {
    progress_updates: AtomicUsize,
    banners:          AtomicUsize,
    voices:           AtomicUsize,
}

impl TripObserver for ConsoleObserver {
    fn on_route_progress(&self, progress: &RouteProgress) {
        self.progress_updates.fetch_add(1, Ordering::Relaxed);
        info!(
            route = %progress.route().id,
            leg = progress.leg_index(),
            state = ?progress.state(),
            remaining_m = progress.distance_remaining(),
            fraction = progress.fraction_traveled(),
            eta_s = progress.duration_remaining().as_secs(),
            objects_ahead = progress.upcoming_road_objects().len(),
            "progress"
        );
    }

    fn on_banner_instruction(&self, banner: &BannerInstruction) {
        self.banners.fetch_add(1, Ordering::Relaxed);
        info!(text = %banner.primary.text, "banner");
    }

    fn on_voice_instruction(&self, voice: &VoiceInstruction) {
        self.voices.fetch_add(1, Ordering::Relaxed);
        info!(announcement = %voice.announcement, "voice");
    }

    fn on_off_route_changed(&self, off_route: bool) {
        info!(off_route, "off-route state");
    }

    fn on_session_state(&self, state: SessionState) {
        info!(?state, "session state");
    }

    fn on_fallback_versions(&self, event: &FallbackVersionsEvent) {
        info!(?event, "fallback map data");
    }
}

// ── Script driver ─────────────────────────────────────────────────────────────

fn find_routes(routes: &[Arc<NavigationRoute>], ids: &[u64]) -> Result<Vec<Arc<NavigationRoute>>> {
    ids.iter()
        .map(|&id| match routes.iter().find(|r| r.id == RouteId(id)) {
            Some(route) => Ok(Arc::clone(route)),
            None => bail!("unknown route {id}"),
        })
        .collect()
}

/// Run one route replacement.  Engine rejections are logged; only a dead
/// session is an error.
async fn replace_routes(
    session:    &TripSession,
    routes:     Vec<Arc<NavigationRoute>>,
    set_routes: SetRoutes,
) -> Result<()> {
    match session.set_routes(routes, set_routes).await {
        Ok(value) => {
            info!(routes = value.routes.len(), alternatives = value.alternatives.len(), "routes applied");
            Ok(())
        }
        Err(SetRoutesError::Session(e)) => Err(e.into()),
        Err(e) => {
            warn!(error = %e, "routes rejected");
            Ok(())
        }
    }
}

async fn apply(
    session: &TripSession,
    routes:  &[Arc<NavigationRoute>],
    clock:   &ManualClock,
    event:   &ScriptEvent,
) -> Result<()> {
    match event {
        ScriptEvent::Start => session.start().await?,
        ScriptEvent::Stop => session.stop().await?,
        ScriptEvent::Wait { secs } => clock.advance(std::time::Duration::from_secs(*secs)),
        ScriptEvent::SetRoutes { routes: ids, reason, leg_index } => {
            let selected = find_routes(routes, ids)?;
            replace_routes(session, selected, reason.with_leg_index(*leg_index)).await?;
        }
        ScriptEvent::LegIndex { leg_index } => {
            let leg_index = *leg_index;
            let update = session
                .update_leg_index(leg_index, move |applied| {
                    info!(leg_index, applied, "leg index update finished");
                })
                .await?;
            update.finished().await;
        }
        ScriptEvent::Fix { lat, lon } => {
            let fix = Location::at(GeoPoint::new(*lat, *lon), clock.elapsed());
            session.push_raw_location(fix).await?;
        }
        ScriptEvent::Status(spec) => {
            session.push_status(spec.to_status(routes, clock.elapsed())?).await?;
        }
        ScriptEvent::FallbackVersions { update } => {
            session.push_fallback_versions(update.clone()).await?;
        }
    }
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load the script.
    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => BUNDLED_TRIP.to_string(),
    };
    let config = ReplayConfig::from_json(&json)?;
    let routes = config.build_routes()?;

    println!("=== replay: trip session ===");
    println!(
        "Routes: {}  |  Events: {}  |  Repeat reroute: {:?}",
        routes.len(),
        config.events.len(),
        config.session.repeat_reroute
    );
    println!();

    // 2. Session over the in-process engine, on a clock the script drives.
    let clock = ManualClock::new();
    let engine = Arc::new(ReplayEngine::default());
    let session = TripSession::with_clock(engine.clone(), config.session.clone(), Arc::new(clock.clone()))?;

    let console = Arc::new(ConsoleObserver::default());
    let handle = session.observers().register(console.clone());

    // 3. Reroute subsystem stand-in.
    let (reroute_tx, mut reroute_rx) = mpsc::unbounded_channel();
    session
        .set_reroute_trigger(Arc::new(move |off_route: bool| {
            // Fails only once the replay loop has exited.
            let _ = reroute_tx.send(off_route);
        }))
        .await?;

    // 4. Replay.
    let mut reroutes = 0usize;
    for (i, event) in config.events.iter().enumerate() {
        apply(&session, &routes, &clock, event)
            .await
            .with_context(|| format!("event {i} ({event:?})"))?;

        // Wait for the processor to catch up before reading trigger output.
        session.snapshot().await?;
        while let Ok(off_route) = reroute_rx.try_recv() {
            if !off_route {
                continue;
            }
            reroutes += 1;
            session.notify_reroute_fetch_started().await?;
            if let Some(id) = config.reroute_to {
                let target = find_routes(&routes, &[id])?;
                replace_routes(&session, target, SetRoutes::Reroute { initial_leg_index: 0 }).await?;
            }
        }
    }

    // 5. Summary.
    let snapshot = session.snapshot().await?;
    session.observers().unregister(&handle);
    session.shutdown().await?;

    println!();
    println!("--- summary ---");
    println!("Final state:        {:?}", snapshot.state);
    println!("Active route:       {:?}", snapshot.active_route.map(|id| id.get()));
    println!("Engine leg:         {}", engine.leg());
    println!("Fixes forwarded:    {}", engine.fixes());
    println!("Route changes:      {}", engine.route_changes());
    println!("Route refreshes:    {}", engine.refreshes());
    println!("Reroute signals:    {reroutes}");
    println!("Progress updates:   {}", console.progress_updates.load(Ordering::Relaxed));
    println!("Banners delivered:  {}", console.banners.load(Ordering::Relaxed));
    println!("Voice delivered:    {}", console.voices.load(Ordering::Relaxed));

    Ok(())
}
