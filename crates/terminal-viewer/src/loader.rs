//! Background dataset loading. Jobs run on the rayon pool; results come back
//! over a channel that the render loop drains once per frame.

use crossbeam_channel::{Receiver, Sender};
use floorplan::dataset::run_job;
use floorplan::{DatasetConfig, LoadJob, LoadOutput, LoadTracker, Manifest};
use std::sync::Arc;

/// One resolved load.
#[derive(Debug)]
pub struct LoadEvent {
    pub job: LoadJob,
    pub result: floorplan::Result<LoadOutput>,
}

pub struct Loader {
    rx: Receiver<LoadEvent>,
    tracker: LoadTracker,
}

impl Loader {
    /// Starts every job of `manifest` in the background.
    pub fn spawn(manifest: Manifest, config: DatasetConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let tracker = LoadTracker::new(manifest.len());
        let config = Arc::new(config);

        log::info!(
            "Loading {} datasets from '{}'",
            manifest.len(),
            config.data_dir.display()
        );

        for job in manifest.jobs {
            spawn_job(job, config.clone(), tx.clone());
        }

        Self { rx, tracker }
    }

    /// Takes every load that finished since the last call, without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.rx.try_iter().collect();

        for event in &events {
            match &event.result {
                Ok(_) => self.tracker.record(true),
                Err(e) => {
                    log::error!("Failed to load {}: {}", event.job.label(), e);
                    self.tracker.record(false);
                }
            }
        }

        events
    }

    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    /// `true` once, on the first call after every load has resolved.
    pub fn take_finished(&mut self) -> bool {
        let finished = self.tracker.take_finished();
        if finished {
            log::info!(
                "All datasets resolved: {} loaded, {} failed",
                self.tracker.completed() - self.tracker.failed(),
                self.tracker.failed()
            );
        }
        finished
    }
}

fn spawn_job(job: LoadJob, config: Arc<DatasetConfig>, tx: Sender<LoadEvent>) {
    rayon::spawn(move || {
        let result = run_job(&job, &config);
        // A closed channel means the viewer is already gone.
        if tx.send(LoadEvent { job, result }).is_err() {
            log::debug!("Load result dropped; receiver closed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn fixture_config() -> DatasetConfig {
        DatasetConfig {
            data_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("../floorplan/tests/data"),
            prefix: "TestTerminal".to_string(),
            floor_tokens: vec!["2".to_string(), "B1".to_string()],
            origin: glam::DVec2::new(100.0, 200.0),
            ..DatasetConfig::default()
        }
    }

    fn drain_until_finished(loader: &mut Loader) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(30);
        let mut events = Vec::new();
        while !loader.tracker().is_finished() {
            assert!(Instant::now() < deadline, "loads did not resolve in time");
            events.extend(loader.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn test_loads_resolve_and_finish_once() {
        let config = fixture_config();
        let manifest = Manifest::standard(&config).unwrap();
        // 2 tokens x 3 kinds, network, context
        assert_eq!(manifest.len(), 8);

        let mut loader = Loader::spawn(manifest, config);
        let events = drain_until_finished(&mut loader);

        assert_eq!(events.len(), 8);
        // No B1 files in the fixture set
        assert_eq!(loader.tracker().failed(), 3);
        assert!(loader.take_finished());
        assert!(!loader.take_finished());
        assert!(loader.poll().is_empty());

        let floors: Vec<_> = events
            .iter()
            .filter_map(|e| match &e.result {
                Ok(LoadOutput::Floor(layer)) => Some(layer.floor),
                _ => None,
            })
            .collect();
        assert_eq!(floors, vec![2, 2, 2]);
    }

    #[test]
    fn test_empty_manifest_finishes_immediately() {
        let mut loader = Loader::spawn(Manifest::default(), fixture_config());
        assert!(loader.poll().is_empty());
        assert!(loader.take_finished());
    }
}
