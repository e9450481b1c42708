use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::navigator::FormNavigator;
use crate::notify::NtfyNotifier;
use crate::report::{ReportEntry, ReportWriter};
use crate::utils::error::{AppError, Result};

/// Delay between the two navigation attempts inside one cycle.
const ATTEMPT_DELAY: Duration = Duration::from_secs(10);
const NAVIGATION_ATTEMPTS: usize = 2;

const NOTIFICATION_TITLE: &str = "New shifts available";

/// One full attempt to read the currently offered shift options.
pub trait ShiftSource: Send + Sync {
    fn check_once(&self) -> Result<Vec<String>>;
}

impl ShiftSource for FormNavigator {
    fn check_once(&self) -> Result<Vec<String>> {
        FormNavigator::check_once(self)
    }
}

/// Options present now but absent from the previous poll, sorted.
pub fn new_shifts(current: &[String], previous: &BTreeSet<String>) -> Vec<String> {
    let mut fresh: Vec<String> = current
        .iter()
        .filter(|option| !previous.contains(*option))
        .cloned()
        .collect();
    fresh.sort();
    fresh.dedup();
    fresh
}

/// The notification fires on any content-level change of the offered set,
/// removals included, not only on additions.
pub fn should_notify(
    notify_on_found: bool,
    current: &BTreeSet<String>,
    previous: &BTreeSet<String>,
) -> bool {
    notify_on_found && current != previous
}

pub fn notification_body(options: &[String]) -> String {
    format!("Available shifts:\n{}", options.join("\n"))
}

/// Repeats the form navigation at a fixed interval, diffs the result
/// against the previous poll, and dispatches the side effects: log line,
/// notification, report entry.
pub struct Poller<S: ShiftSource + 'static = FormNavigator> {
    config: AppConfig,
    source: Arc<S>,
    notifier: NtfyNotifier,
    report: ReportWriter,
}

impl Poller<FormNavigator> {
    pub fn new(config: AppConfig) -> Result<Self> {
        let navigator = FormNavigator::new(&config);
        Self::with_source(config, navigator)
    }
}

impl<S: ShiftSource + 'static> Poller<S> {
    pub fn with_source(config: AppConfig, source: S) -> Result<Self> {
        let notifier = NtfyNotifier::new(&config.ntfy_server, config.ntfy_topic.clone())?;
        let report = ReportWriter::new(config.report_path.clone());
        Ok(Self {
            config,
            source: Arc::new(source),
            notifier,
            report,
        })
    }

    /// Run cycles until the process is interrupted.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting form checker, polling every {} minutes",
            self.config.poll_minutes
        );
        let mut previous: BTreeSet<String> = BTreeSet::new();
        loop {
            self.run_cycle(&mut previous).await;
            info!("Sleeping for {} minutes...", self.config.poll_minutes);
            tokio::time::sleep(Duration::from_secs(self.config.poll_minutes * 60)).await;
        }
    }

    /// One poll cycle: navigate, diff, notify, record. Errors never
    /// propagate to the caller; they become report entries.
    pub async fn run_cycle(&self, previous: &mut BTreeSet<String>) -> bool {
        let (entry, ok) = match self.cycle_inner(previous).await {
            Ok(entry) => (entry, true),
            Err(e) => {
                error!("Error: {e}");
                (ReportEntry::failure(e.to_string()), false)
            }
        };
        if let Err(e) = self.report.append(entry) {
            error!("Failed to write report entry: {e}");
        }
        ok
    }

    async fn cycle_inner(&self, previous: &mut BTreeSet<String>) -> Result<ReportEntry> {
        let options = self.fetch_shifts().await?;
        if options.is_empty() {
            info!("No available shifts.");
        } else {
            info!("Available shifts found: {:?}", options);
        }

        let current: BTreeSet<String> = options.iter().cloned().collect();
        let fresh = new_shifts(&options, previous);

        if should_notify(self.config.notify_on_found, &current, previous) {
            let body = notification_body(&options);
            if self.notifier.send(NOTIFICATION_TITLE, &body).await? {
                info!("Notification sent ({} shifts)", options.len());
            }
        }

        *previous = current;
        Ok(ReportEntry::success(options, fresh))
    }

    /// Up to two full navigation attempts with a fixed delay in between.
    /// Browser work runs on a blocking worker thread.
    async fn fetch_shifts(&self) -> Result<Vec<String>> {
        let strategy = FixedInterval::new(ATTEMPT_DELAY).take(NAVIGATION_ATTEMPTS - 1);
        Retry::spawn(strategy, || {
            let source = Arc::clone(&self.source);
            async move {
                tokio::task::spawn_blocking(move || source.check_once())
                    .await
                    .map_err(|e| AppError::Browser(format!("navigation task failed: {e}")))?
            }
        })
        .await
    }
}
