pub mod decode;
pub mod detect;
pub mod encode;
pub mod inspect;
pub mod install;

use anyhow::{Result, anyhow};
use std::{sync::mpsc, thread, time::Instant};
use tracing::info;

use odb_format::{ConversionSummary, OdbResult, Progress};

/// Runs `job` on a worker thread and logs the progress it sends until the
/// job drops its sender.
pub(crate) fn run_with_progress<F>(
    label: &'static str,
    progress_every: u8,
    job: F,
) -> Result<ConversionSummary>
where
    F: FnOnce(mpsc::Sender<Progress>) -> OdbResult<ConversionSummary> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Progress>();
    let start = Instant::now();
    let worker = thread::Builder::new()
        .name(format!("odbconv-{label}"))
        .spawn(move || job(tx))?;

    let mut last_logged: Option<u8> = None;
    for p in rx {
        if should_log(last_logged, p.percentage, progress_every) {
            info!(
                pct = p.percentage,
                file = %p.current_file,
                elapsed_s = start.elapsed().as_secs(),
                "{label} progress"
            );
            last_logged = Some(p.percentage);
        }
    }

    let summary = worker
        .join()
        .map_err(|_| anyhow!("{label} worker panicked"))??;

    info!(
        "{label} done version={} records={} tables={} in {:.1}s",
        summary.version,
        summary.records,
        summary.tables,
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

fn should_log(last: Option<u8>, pct: u8, every: u8) -> bool {
    match last {
        None => true,
        Some(last) if pct == 100 => last != 100,
        Some(last) => pct >= last.saturating_add(every.max(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines_are_thinned() {
        let mut last = None;
        let mut logged = Vec::new();
        for pct in [0u8, 3, 9, 10, 15, 21, 99, 100, 100] {
            if should_log(last, pct, 10) {
                logged.push(pct);
                last = Some(pct);
            }
        }
        assert_eq!(logged, vec![0, 10, 21, 99, 100]);
    }

    #[test]
    fn zero_logs_every_change() {
        assert!(should_log(Some(4), 5, 0));
        assert!(!should_log(Some(5), 5, 0));
    }
}
