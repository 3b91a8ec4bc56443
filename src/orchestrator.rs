//! Analysis orchestration with a single cached report and single-flight runs.
//!
//! State lives in one mutex-guarded slot:
//! - idle, nothing cached
//! - running (exactly one pipeline in flight)
//! - idle, report cached
//!
//! Callers arriving while a run is in flight block on a condvar and receive
//! that run's outcome. A failed run leaves the previously cached report in
//! place.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use chrono::Utc;
use crossbeam_channel::Sender;
use tracing::{info, instrument, warn};

use crate::analysis::run_heuristics;
use crate::config::KnotConfig;
use crate::core::{AnalysisEvent, AnalysisReport, FileSource, FsSource, notify};
use crate::error::{AnalysisError, AnalysisResult};
use crate::graph::build_graph;
use crate::graph::imports::ResolveRules;
use crate::semantic::{SemanticAnalyzer, create_analyzer};

/// What a non-blocking consumer sees
#[derive(Debug, Clone)]
pub enum Status {
    /// Nothing cached, nothing running
    Empty,
    /// A run is in flight; `previous` is the report it will replace, if any
    Running {
        previous: Option<Arc<AnalysisReport>>,
    },
    Cached(Arc<AnalysisReport>),
}

#[derive(Debug, Default)]
struct Slot {
    running: Option<u64>,
    last_run: u64,
    report: Option<Arc<AnalysisReport>>,
    last_failure: Option<(u64, AnalysisError)>,
}

/// Owns the report cache and runs the analysis pipeline.
pub struct Orchestrator<S, A> {
    source: S,
    analyzer: A,
    rules: ResolveRules,
    hub_threshold: usize,
    tx: Option<Sender<AnalysisEvent>>,
    slot: Mutex<Slot>,
    finished: Condvar,
}

impl Orchestrator<FsSource, Box<dyn SemanticAnalyzer>> {
    /// Filesystem source plus the analyzer selected by `config.semantic`.
    pub fn from_config(config: &KnotConfig) -> Self {
        Self::new(
            FsSource::from_config(config),
            create_analyzer(&config.semantic),
            ResolveRules::from_config(config),
            config.hub_threshold,
        )
    }
}

impl<S, A> Orchestrator<S, A>
where
    S: FileSource,
    A: SemanticAnalyzer,
{
    pub fn new(source: S, analyzer: A, rules: ResolveRules, hub_threshold: usize) -> Self {
        Self {
            source,
            analyzer,
            rules,
            hub_threshold,
            tx: None,
            slot: Mutex::new(Slot::default()),
            finished: Condvar::new(),
        }
    }

    /// Progress events are sent here for the lifetime of the orchestrator.
    pub fn with_events(mut self, tx: Sender<AnalysisEvent>) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Returns the cached report, computing it if there is none.
    /// Joins the in-flight run instead of starting a second one.
    pub fn get_or_compute(&self) -> AnalysisResult<Arc<AnalysisReport>> {
        let mut slot = self.lock();
        if let Some(run) = slot.running {
            return self.wait_for(slot, run);
        }
        if let Some(report) = &slot.report {
            return Ok(Arc::clone(report));
        }
        let run = Self::begin(&mut slot);
        drop(slot);
        self.execute(run)
    }

    /// Runs the pipeline regardless of the cache. If a run is already in
    /// flight, its outcome is returned instead.
    pub fn force_refresh(&self) -> AnalysisResult<Arc<AnalysisReport>> {
        let mut slot = self.lock();
        if let Some(run) = slot.running {
            return self.wait_for(slot, run);
        }
        let run = Self::begin(&mut slot);
        drop(slot);
        self.execute(run)
    }

    pub fn status(&self) -> Status {
        let slot = self.lock();
        match (&slot.running, &slot.report) {
            (Some(_), previous) => Status::Running {
                previous: previous.clone(),
            },
            (None, Some(report)) => Status::Cached(Arc::clone(report)),
            (None, None) => Status::Empty,
        }
    }

    pub fn cached(&self) -> Option<Arc<AnalysisReport>> {
        self.lock().report.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(slot: &mut Slot) -> u64 {
        slot.last_run += 1;
        slot.running = Some(slot.last_run);
        slot.last_run
    }

    fn wait_for(
        &self,
        mut slot: MutexGuard<'_, Slot>,
        run: u64,
    ) -> AnalysisResult<Arc<AnalysisReport>> {
        while slot.running == Some(run) {
            slot = self
                .finished
                .wait(slot)
                .unwrap_or_else(|e| e.into_inner());
        }

        // A later run may already have finished; never hand out anything older than `run`.
        if let Some(report) = &slot.report
            && report.run >= run
        {
            return Ok(Arc::clone(report));
        }
        match &slot.last_failure {
            Some((failed, err)) if *failed >= run => Err(err.clone()),
            _ => Err(AnalysisError::Worker(format!("outcome of run {} was lost", run))),
        }
    }

    fn execute(&self, run: u64) -> AnalysisResult<Arc<AnalysisReport>> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.pipeline(run)))
            .unwrap_or_else(|panic| Err(AnalysisError::Worker(panic_message(&*panic))));

        let mut slot = self.lock();
        slot.running = None;
        let result = match outcome {
            Ok(report) => {
                let report = Arc::new(report);
                slot.report = Some(Arc::clone(&report));
                info!(
                    run,
                    cycles = report.heuristic.cycles.len(),
                    hubs = report.heuristic.hubs.len(),
                    "analysis complete"
                );
                notify(&self.tx, AnalysisEvent::Complete(run));
                Ok(report)
            }
            Err(err) => {
                warn!(run, error = %err, "analysis failed; keeping previous report");
                slot.last_failure = Some((run, err.clone()));
                notify(&self.tx, AnalysisEvent::Error(err.to_string()));
                Err(err)
            }
        };
        drop(slot);
        self.finished.notify_all();
        result
    }

    #[instrument(skip(self))]
    fn pipeline(&self, run: u64) -> AnalysisResult<AnalysisReport> {
        notify(&self.tx, AnalysisEvent::RunStarted(run));

        let files = self
            .source
            .discover()
            .map_err(|e| AnalysisError::Discovery(format!("{:#}", e)))?;
        notify(&self.tx, AnalysisEvent::FilesFound(files.len()));

        let outcome = build_graph(files, &self.rules, &self.tx);
        if outcome.graph.is_empty() {
            return Err(AnalysisError::EmptyGraph {
                root: self.source.describe(),
            });
        }

        let graph = &outcome.graph;
        let (heuristic, semantic) = std::thread::scope(|s| {
            let semantic = s.spawn(|| self.analyzer.analyze(graph));
            let heuristic = run_heuristics(graph, self.hub_threshold);
            notify(
                &self.tx,
                AnalysisEvent::HeuristicsDone {
                    cycles: heuristic.cycles.len(),
                    hubs: heuristic.hubs.len(),
                },
            );
            (heuristic, semantic.join())
        });

        let semantic = semantic.map_err(|panic| AnalysisError::Worker(panic_message(&*panic)))??;
        notify(&self.tx, AnalysisEvent::SemanticDone);

        Ok(AnalysisReport {
            run,
            generated_at: Utc::now(),
            stats: outcome.graph.stats(),
            graph: outcome.graph,
            skipped: outcome.skipped,
            heuristic,
            semantic,
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFile;
    use crate::core::{SemanticResult, SemanticHub};
    use crate::error::SemanticError;
    use crate::graph::DependencyGraph;
    use crate::semantic::OfflineAnalyzer;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("src/a.ts", "import './b';"),
            SourceFile::new("src/b.ts", "import './a';"),
        ]
    }

    /// Counts discoveries and blocks each one until released.
    struct GatedSource {
        calls: AtomicUsize,
        gate: crossbeam_channel::Receiver<()>,
    }

    impl FileSource for GatedSource {
        fn discover(&self) -> anyhow::Result<Vec<SourceFile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(files())
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    struct FlakyAnalyzer {
        fail: AtomicBool,
    }

    impl SemanticAnalyzer for FlakyAnalyzer {
        fn analyze(&self, _graph: &DependencyGraph) -> Result<SemanticResult, SemanticError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(SemanticError::Unavailable("no credentials".into()))
            } else {
                Ok(SemanticResult {
                    hubs: vec![SemanticHub {
                        module: "src/a.ts".into(),
                        recommendation: "fine".into(),
                    }],
                    ..SemanticResult::default()
                })
            }
        }
    }

    fn wait_until_running<S: FileSource, A: SemanticAnalyzer>(orch: &Orchestrator<S, A>) {
        for _ in 0..500 {
            if matches!(orch.status(), Status::Running { .. }) {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("run never started");
    }

    #[test]
    fn test_get_during_refresh_waits_for_newer_report() {
        let (release, gate) = crossbeam_channel::unbounded();
        let orch = Orchestrator::new(
            GatedSource {
                calls: AtomicUsize::new(0),
                gate,
            },
            OfflineAnalyzer,
            ResolveRules::default(),
            3,
        );

        release.send(()).unwrap();
        let first = orch.get_or_compute().unwrap();
        assert_eq!(first.run, 1);

        let (refreshed, joined) = std::thread::scope(|s| {
            let refresh = s.spawn(|| orch.force_refresh());
            wait_until_running(&orch);
            match orch.status() {
                Status::Running { previous } => assert_eq!(previous.unwrap().run, 1),
                other => panic!("expected a running refresh, got {:?}", other),
            }
            let get = s.spawn(|| orch.get_or_compute());
            std::thread::sleep(Duration::from_millis(50));
            release.send(()).unwrap();
            (refresh.join().unwrap(), get.join().unwrap())
        });

        let refreshed = refreshed.unwrap();
        let joined = joined.unwrap();
        assert_eq!(refreshed.run, 2);
        assert!(Arc::ptr_eq(&refreshed, &joined));
        assert_eq!(orch.source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_single_flight_shares_one_report() {
        let (release, gate) = crossbeam_channel::unbounded();
        let orch = Orchestrator::new(
            GatedSource {
                calls: AtomicUsize::new(0),
                gate,
            },
            OfflineAnalyzer,
            ResolveRules::default(),
            3,
        );

        let (first, second) = std::thread::scope(|s| {
            let first = s.spawn(|| orch.get_or_compute());
            wait_until_running(&orch);
            let second = s.spawn(|| orch.get_or_compute());
            std::thread::sleep(Duration::from_millis(50));
            release.send(()).unwrap();
            (first.join().unwrap(), second.join().unwrap())
        });

        let first = first.unwrap();
        let second = second.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(orch.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.heuristic.cycles.len(), 1);
    }

    #[test]
    fn test_cached_report_is_reused() {
        let orch = Orchestrator::new(files(), OfflineAnalyzer, ResolveRules::default(), 3);
        let first = orch.get_or_compute().unwrap();
        let again = orch.get_or_compute().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(matches!(orch.status(), Status::Cached(_)));

        let refreshed = orch.force_refresh().unwrap();
        assert_eq!(refreshed.run, first.run + 1);
        assert!(Arc::ptr_eq(&refreshed, &orch.cached().unwrap()));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_report() {
        let orch = Orchestrator::new(
            files(),
            FlakyAnalyzer {
                fail: AtomicBool::new(false),
            },
            ResolveRules::default(),
            3,
        );
        let good = orch.get_or_compute().unwrap();
        assert_eq!(good.semantic.hubs.len(), 1);

        orch.analyzer.fail.store(true, Ordering::SeqCst);
        let err = orch.force_refresh().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Semantic(SemanticError::Unavailable(_))
        ));

        let still = orch.get_or_compute().unwrap();
        assert!(Arc::ptr_eq(&good, &still));
        assert!(Arc::ptr_eq(&good, &orch.cached().unwrap()));
    }

    #[test]
    fn test_analyzer_failure_without_cache_leaves_slot_empty() {
        let orch = Orchestrator::new(
            files(),
            FlakyAnalyzer {
                fail: AtomicBool::new(true),
            },
            ResolveRules::default(),
            3,
        );
        assert!(orch.get_or_compute().is_err());
        assert!(matches!(orch.status(), Status::Empty));
    }

    #[test]
    fn test_empty_source_is_reported() {
        let orch = Orchestrator::new(
            Vec::<SourceFile>::new(),
            OfflineAnalyzer,
            ResolveRules::default(),
            3,
        );
        assert!(matches!(
            orch.get_or_compute(),
            Err(AnalysisError::EmptyGraph { .. })
        ));
    }

    #[test]
    fn test_all_files_unreadable_is_empty_graph() {
        let orch = Orchestrator::new(
            vec![SourceFile::unreadable("src/a.ts", "denied")],
            OfflineAnalyzer,
            ResolveRules::default(),
            3,
        );
        assert!(matches!(
            orch.get_or_compute(),
            Err(AnalysisError::EmptyGraph { .. })
        ));
    }

    #[test]
    fn test_waiters_receive_failure_of_joined_run() {
        struct FailingGatedSource {
            gate: crossbeam_channel::Receiver<()>,
        }
        impl FileSource for FailingGatedSource {
            fn discover(&self) -> anyhow::Result<Vec<SourceFile>> {
                let _ = self.gate.recv_timeout(Duration::from_secs(5));
                anyhow::bail!("disk vanished")
            }
            fn describe(&self) -> String {
                "failing".to_string()
            }
        }

        let (release, gate) = crossbeam_channel::unbounded();
        let orch = Orchestrator::new(
            FailingGatedSource { gate },
            OfflineAnalyzer,
            ResolveRules::default(),
            3,
        );

        let (first, second) = std::thread::scope(|s| {
            let first = s.spawn(|| orch.get_or_compute());
            wait_until_running(&orch);
            let second = s.spawn(|| orch.get_or_compute());
            std::thread::sleep(Duration::from_millis(50));
            release.send(()).unwrap();
            (first.join().unwrap(), second.join().unwrap())
        });

        assert!(matches!(first, Err(AnalysisError::Discovery(_))));
        assert!(second.is_err());
    }

    #[test]
    fn test_events_are_emitted_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let orch = Orchestrator::new(files(), OfflineAnalyzer, ResolveRules::default(), 3)
            .with_events(tx);
        orch.get_or_compute().unwrap();

        let events: Vec<AnalysisEvent> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(AnalysisEvent::RunStarted(1))));
        assert!(matches!(events.last(), Some(AnalysisEvent::Complete(1))));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, AnalysisEvent::GraphBuilt { modules: 2, edges: 2 }))
        );
    }
}
