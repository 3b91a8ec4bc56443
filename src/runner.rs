use crate::config::KnotConfig;
use crate::core::{AnalysisEvent, AnalysisReport, FileSource};
use crate::error::{AnalysisError, AnalysisResult};
use crate::format::render;
use crate::orchestrator::Orchestrator;
use crate::semantic::SemanticAnalyzer;
use crate::watch::{Debouncer, FileWatcher, is_relevant};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Main entry point for knot in CLI mode.
///
/// Runs one analysis (printing progress if `verbose` is enabled), writes the
/// report, and in watch mode keeps re-running it whenever sources change.
pub fn run(config: KnotConfig) -> Result<()> {
    config.validate()?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let orchestrator = Orchestrator::from_config(&config).with_events(tx);

    let report = run_with_progress(&orchestrator, &rx, config.verbose, |o| o.get_or_compute())?;
    emit_report(&config, &report)?;

    if config.watch {
        watch_loop(&config, &orchestrator, &rx)?;
    }

    Ok(())
}

/// Runs `op` on a worker thread and consumes progress events on this one
/// until the run reports completion or failure.
pub fn run_with_progress<S, A, F>(
    orchestrator: &Orchestrator<S, A>,
    rx: &Receiver<AnalysisEvent>,
    verbose: bool,
    op: F,
) -> AnalysisResult<Arc<AnalysisReport>>
where
    S: FileSource,
    A: SemanticAnalyzer,
    F: FnOnce(&Orchestrator<S, A>) -> AnalysisResult<Arc<AnalysisReport>> + Send,
{
    std::thread::scope(|s| {
        let worker = s.spawn(|| op(orchestrator));

        // A cached result produces no events, so also stop once the worker is done.
        loop {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(event) => {
                    let terminal =
                        matches!(event, AnalysisEvent::Complete(_) | AnalysisEvent::Error(_));
                    if verbose {
                        print_event(&event);
                    }
                    if terminal {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) if !worker.is_finished() => {}
                Err(_) => break,
            }
        }

        worker
            .join()
            .unwrap_or_else(|_| Err(AnalysisError::Worker("analysis thread panicked".into())))
    })
}

fn print_event(event: &AnalysisEvent) {
    match event {
        AnalysisEvent::RunStarted(run) => println!("Analysis run {} started...", run),
        AnalysisEvent::FilesFound(n) => println!("Found {} source files.", n),
        AnalysisEvent::FileSkipped { id, reason } => eprintln!("Skipped {}: {}", id, reason),
        AnalysisEvent::GraphBuilt { modules, edges } => {
            println!("Graph built: {} modules, {} edges.", modules, edges)
        }
        AnalysisEvent::HeuristicsDone { cycles, hubs } => {
            println!("Heuristics: {} cycles, {} hubs.", cycles, hubs)
        }
        AnalysisEvent::SemanticDone => println!("Semantic review finished."),
        AnalysisEvent::Complete(run) => println!("Run {} complete.", run),
        AnalysisEvent::Error(e) => eprintln!("Error: {}", e),
    }
}

/// Writes the rendered report to the configured output file or stdout.
pub fn emit_report(config: &KnotConfig, report: &AnalysisReport) -> Result<()> {
    let rendered = render(config.output_format, report)?;
    match &config.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            if config.verbose {
                println!("Written to {:?}", path);
            }
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn watch_loop<S, A>(
    config: &KnotConfig,
    orchestrator: &Orchestrator<S, A>,
    rx: &Receiver<AnalysisEvent>,
) -> Result<()>
where
    S: FileSource,
    A: SemanticAnalyzer,
{
    let watcher = FileWatcher::new(&config.path)
        .with_context(|| format!("Failed to watch {:?}", config.path))?;
    let mut debouncer = Debouncer::new(Duration::from_millis(300));
    eprintln!("Watching {:?} for changes (Ctrl-C to stop)", config.path);

    loop {
        let Some(first) = watcher.next_event(Duration::from_secs(1)) else {
            debouncer.cleanup();
            continue;
        };

        let mut changed = false;
        for event in std::iter::once(first).chain(watcher.pending_events()) {
            match event.path() {
                Some(path) => {
                    if is_relevant(path, &config.source_extensions)
                        && debouncer.should_process(path)
                    {
                        changed = true;
                    }
                }
                None => warn!(?event, "file watcher error"),
            }
        }
        if !changed {
            continue;
        }

        match run_with_progress(orchestrator, rx, config.verbose, |o| o.force_refresh()) {
            Ok(report) => emit_report(config, &report)?,
            Err(e) => {
                let kept = orchestrator
                    .cached()
                    .map(|r| format!(" (keeping report from run {})", r.run))
                    .unwrap_or_default();
                eprintln!("Error: {}{}", e, kept);
            }
        }
    }
}
