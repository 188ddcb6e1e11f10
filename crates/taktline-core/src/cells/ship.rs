//! Ship cell: packages the bootstrap catalog. Catalog entries whose
//! artifact exists on disk get enqueued; queued items whose artifact still
//! exists are released queue→WIP→archive within a single pulse.

use crate::cells::{log_pulse, recount, PulseSummary};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::item::{self, ItemStatus, WorkItem};
use crate::paths::{self, Area};
use crate::status::{CellStatus, RevenuePipeline, ShippedProduct};
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict, Priority};
use std::collections::HashSet;
use tracing::warn;

const QUEUE_CAP: usize = 10;

pub fn pulse(store: &StateStore, config: &Config, clock: &dyn Clock) -> Result<PulseSummary> {
    store.ensure_layout()?;
    let now = clock.now();
    let mut status = CellStatus::load(store.root(), CellName::Ship);
    recount(store, &mut status)?;

    let enqueued = enqueue_ready(store, config, &mut status, now)?;
    let (shipped, rejected) = release_queue(store, config, &mut status, now)?;
    recount(store, &mut status)?;

    let shipped_count = status.bootstraps_shipped.len();
    let catalog_len = config.ship.catalog.len().max(1);
    status.revenue_pipeline = Some(RevenuePipeline {
        shipped_count,
        target_week_1: config.ship.week_1_target,
        target_month_1: config.ship.month_1_target,
        target_month_6: config.ship.month_6_target,
        progress_week_1: shipped_count as f64 * config.ship.week_1_target / catalog_len as f64,
    });

    if shipped > 0 {
        status.last_output = Some(now);
    }
    let (verdict, reason) = if shipped > 0 || status.wip > 0 {
        (GateVerdict::Passed, None)
    } else {
        (GateVerdict::Unknown, Some("nothing to release".to_string()))
    };
    status.apply_gate(verdict, reason, now);
    status.last_pulse = Some(now);
    status.save(store.root())?;

    log_pulse(
        store,
        CellName::Ship,
        now,
        &format!(
            "pulse complete | queued {enqueued} shipped {shipped} held {rejected} total {}/{}",
            shipped_count,
            config.ship.catalog.len()
        ),
    )?;

    let mut summary = PulseSummary::from_status(&status, shipped, shipped);
    summary.detail = Some(format!(
        "shipped {shipped} this pulse, {shipped_count}/{} total",
        config.ship.catalog.len()
    ));
    Ok(summary)
}

/// Enqueue catalog entries that are not yet shipped, not already in flight,
/// and whose artifact exists — up to the queue cap.
fn enqueue_ready(
    store: &StateStore,
    config: &Config,
    status: &mut CellStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<usize> {
    let shipped: HashSet<&str> = status
        .bootstraps_shipped
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    let in_flight: HashSet<String> = store
        .list_items(CellName::Ship, Area::Inputs)?
        .iter()
        .chain(store.list_items(CellName::Ship, Area::Wip)?.iter())
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();

    let mut enqueued = 0;
    for entry in &config.ship.catalog {
        if status.queue_depth >= QUEUE_CAP {
            break;
        }
        if shipped.contains(entry.id.as_str()) || in_flight.contains(&entry.id) {
            continue;
        }
        if !artifact_exists(store, &entry.id) {
            continue;
        }
        let item = WorkItem {
            id: entry.id.clone(),
            kind: Some("bootstrap".to_string()),
            priority: Priority::Medium,
            source: None,
            actionable: true,
            status: ItemStatus::Queued,
            text: None,
            created_at: Some(now),
            deadline: None,
            payload: serde_json::json!({ "name": entry.name }),
        };
        let path = store
            .area_dir(CellName::Ship, Area::Inputs)
            .join(format!("{}.json", entry.id));
        store.write(&path, &item)?;
        status.queue_depth += 1;
        enqueued += 1;
    }
    Ok(enqueued)
}

/// Release queued items whose artifact still exists. An item passes through
/// queue→WIP→archive within the same pulse (simulated release); a real
/// pipeline would keep in-progress state across pulses.
fn release_queue(
    store: &StateStore,
    config: &Config,
    status: &mut CellStatus,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<(usize, usize)> {
    let scan = item::scan_dir(&store.area_dir(CellName::Ship, Area::Inputs))?;
    for (path, reason) in &scan.malformed {
        warn!(path = %path.display(), %reason, "quarantined malformed ship item");
        status.quality_gate_fails += 1;
    }

    let mut shipped = 0;
    let mut rejected = 0;
    for queued in &scan.items {
        // Releases complete within the pulse, so WIP alone would never hit
        // the cap; count this pulse's shipments against it as well.
        if status.wip + shipped >= status.wip_cap {
            break;
        }
        let id = &queued.item.id;
        if !artifact_exists(store, id) {
            status.quality_gate_fails += 1;
            rejected += 1;
            log_pulse(store, CellName::Ship, now, &format!("artifact missing for {id}"))?;
            continue;
        }

        let in_wip = store.move_item(&queued.path, CellName::Ship, Area::Wip)?;
        status.wip += 1;
        status.quality_gate_passes += 1;

        store.move_item(&in_wip, CellName::Ship, Area::Archive)?;
        status.wip = status.wip.saturating_sub(1);
        status.completed_total += 1;

        let name = config
            .ship
            .catalog
            .iter()
            .find(|e| e.id == *id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.clone());
        status.bootstraps_shipped.push(ShippedProduct {
            id: id.clone(),
            name,
            shipped_at: now,
        });
        shipped += 1;
        log_pulse(store, CellName::Ship, now, &format!("shipped {id}"))?;
    }
    Ok((shipped, rejected))
}

fn artifact_exists(store: &StateStore, id: &str) -> bool {
    paths::product_dir(store.root(), id).is_dir()
        || paths::deliverable_path(store.root(), id).is_file()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (StateStore, Config, FixedClock) {
        let store = StateStore::new(dir.path());
        store.ensure_layout().unwrap();
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap());
        (store, Config::default(), clock)
    }

    fn provide_artifacts(store: &StateStore, config: &Config) {
        for entry in &config.ship.catalog {
            std::fs::create_dir_all(paths::product_dir(store.root(), &entry.id)).unwrap();
        }
    }

    #[test]
    fn nothing_ready_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let (store, config, clock) = setup(&dir);
        let summary = pulse(&store, &config, &clock).unwrap();
        assert_eq!(summary.queue_depth, 0);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.quality_gate, GateVerdict::Unknown);
    }

    #[test]
    fn ships_at_most_cap_per_pulse() {
        let dir = TempDir::new().unwrap();
        let (store, config, clock) = setup(&dir);
        provide_artifacts(&store, &config);

        let first = pulse(&store, &config, &clock).unwrap();
        assert_eq!(first.completed, 2);
        assert_eq!(first.quality_gate, GateVerdict::Passed);

        let status = CellStatus::load(store.root(), CellName::Ship);
        assert_eq!(status.bootstraps_shipped.len(), 2);
    }

    #[test]
    fn repeated_pulses_drain_entire_catalog() {
        let dir = TempDir::new().unwrap();
        let (store, config, clock) = setup(&dir);
        provide_artifacts(&store, &config);

        for _ in 0..6 {
            pulse(&store, &config, &clock).unwrap();
        }
        let status = CellStatus::load(store.root(), CellName::Ship);
        assert_eq!(status.bootstraps_shipped.len(), 6);
        assert_eq!(status.queue_depth, 0);
        assert_eq!(
            store.list_items(CellName::Ship, Area::Archive).unwrap().len(),
            6
        );
        // Nothing is shipped twice.
        let ids: HashSet<&str> = status
            .bootstraps_shipped
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn deliverable_document_counts_as_artifact() {
        let dir = TempDir::new().unwrap();
        let (store, mut config, clock) = setup(&dir);
        config.ship.catalog.truncate(1);
        let deliverable = paths::deliverable_path(store.root(), &config.ship.catalog[0].id);
        std::fs::create_dir_all(deliverable.parent().unwrap()).unwrap();
        std::fs::write(&deliverable, "# product").unwrap();

        let summary = pulse(&store, &config, &clock).unwrap();
        assert_eq!(summary.completed, 1);
    }

    #[test]
    fn queue_cap_drops_excess_enqueues() {
        let dir = TempDir::new().unwrap();
        let (store, mut config, clock) = setup(&dir);
        // A catalog wider than the queue cap, with a full WIP so nothing drains.
        config.ship.catalog = (0..15)
            .map(|i| crate::config::ProductEntry {
                id: format!("p{i:02}"),
                name: format!("Product {i}"),
            })
            .collect();
        provide_artifacts(&store, &config);
        let wip = store.area_dir(CellName::Ship, Area::Wip);
        std::fs::write(wip.join("w1.json"), r#"{"id":"w1"}"#).unwrap();
        std::fs::write(wip.join("w2.json"), r#"{"id":"w2"}"#).unwrap();

        pulse(&store, &config, &clock).unwrap();
        let status = CellStatus::load(store.root(), CellName::Ship);
        assert_eq!(status.queue_depth, QUEUE_CAP);
    }

    #[test]
    fn revenue_pipeline_tracks_progress() {
        let dir = TempDir::new().unwrap();
        let (store, config, clock) = setup(&dir);
        provide_artifacts(&store, &config);
        pulse(&store, &config, &clock).unwrap();

        let status = CellStatus::load(store.root(), CellName::Ship);
        let pipeline = status.revenue_pipeline.unwrap();
        assert_eq!(pipeline.shipped_count, 2);
        let expected = 2.0 * 100.0 / 6.0;
        assert!((pipeline.progress_week_1 - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_artifact_holds_item_in_queue() {
        let dir = TempDir::new().unwrap();
        let (store, config, clock) = setup(&dir);
        // Producer-queued item with no artifact behind it.
        let inputs = store.area_dir(CellName::Ship, Area::Inputs);
        std::fs::write(inputs.join("ghost.json"), r#"{"id":"ghost"}"#).unwrap();

        let summary = pulse(&store, &config, &clock).unwrap();
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.queue_depth, 1);
        let status = CellStatus::load(store.root(), CellName::Ship);
        assert!(status.quality_gate_fails >= 1);
    }
}
