// Poll-cycle scenarios: novelty diffing, failure handling, notification
// gating, and report side effects.

use std::collections::BTreeSet;

use super::{build_poller, test_config, StubSource};
use shift_watcher::report::ReportWriter;
use shift_watcher::Poller;

fn list(options: &[&str]) -> Vec<String> {
    options.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_first_poll_treats_everything_as_new() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    let poller = build_poller(
        &report_path,
        StubSource::new(vec![Ok(list(&["Mon 08:00-16:00", "Tue 10:00-18:00"]))]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].available);
    assert_eq!(entries[0].shifts, list(&["Mon 08:00-16:00", "Tue 10:00-18:00"]));
    assert_eq!(
        entries[0].new_shifts,
        list(&["Mon 08:00-16:00", "Tue 10:00-18:00"])
    );
    assert!(entries[0].error.is_none());

    // remembered state updated for the next cycle
    assert!(previous.contains("Mon 08:00-16:00"));
    assert!(previous.contains("Tue 10:00-18:00"));

    Ok(())
}

#[tokio::test]
async fn test_second_identical_poll_has_no_novelty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    let shifts = list(&["Mon 08:00-16:00", "Tue 10:00-18:00"]);
    let poller = build_poller(
        &report_path,
        StubSource::new(vec![Ok(shifts.clone()), Ok(shifts.clone())]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(poller.run_cycle(&mut previous).await);
    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].available);
    assert_eq!(entries[1].shifts, shifts);
    assert!(entries[1].new_shifts.is_empty());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_records_error_and_loop_survives() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    // both navigation attempts of the first cycle fail, the second cycle
    // succeeds with the same remembered state
    let poller = build_poller(
        &report_path,
        StubSource::new(vec![
            Err(shift_watcher::AppError::Navigation(
                "next control not clickable after 3 retries".to_string(),
            )),
            Err(shift_watcher::AppError::Browser(
                "Failed to launch browser: no chrome".to_string(),
            )),
            Ok(list(&["Wed 12:00-20:00"])),
        ]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(!poller.run_cycle(&mut previous).await);
    // failed cycle leaves the remembered state untouched
    assert!(previous.is_empty());

    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 2);

    assert!(!entries[0].available);
    assert!(entries[0].shifts.is_empty());
    assert!(entries[0].new_shifts.is_empty());
    let error = entries[0].error.as_deref().unwrap();
    assert!(!error.is_empty());

    assert!(entries[1].available);
    assert_eq!(entries[1].new_shifts, list(&["Wed 12:00-20:00"]));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_one_failed_attempt_is_retried_within_the_cycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    let source = StubSource::new(vec![
        Err(shift_watcher::AppError::Navigation("flaky".to_string())),
        Ok(list(&["Mon 08:00-16:00"])),
    ]);
    let poller = build_poller(&report_path, source)?;

    let mut previous = BTreeSet::new();
    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].available);

    Ok(())
}

#[tokio::test]
async fn test_no_topic_still_writes_report_entry() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    // ntfy_topic is None in the test config: the changed option set must
    // not produce any network traffic, only a report entry
    let poller = build_poller(
        &report_path,
        StubSource::new(vec![Ok(list(&["Mon 08:00-16:00"]))]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].available);

    Ok(())
}

#[tokio::test]
async fn test_notification_failure_fails_the_cycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    // a topic is configured but the relay is unreachable; delivery failure
    // takes the same per-cycle error path as navigation failure
    let mut config = test_config(&report_path);
    config.ntfy_topic = Some("shifts".to_string());
    config.ntfy_server = "http://127.0.0.1:1".to_string();

    let poller = Poller::with_source(
        config,
        StubSource::new(vec![Ok(list(&["Mon 08:00-16:00"]))]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(!poller.run_cycle(&mut previous).await);
    // the failed delivery also leaves the remembered state untouched, so
    // the next successful cycle re-reports the options as new
    assert!(previous.is_empty());

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].available);
    assert!(entries[0].error.is_some());

    Ok(())
}

#[tokio::test]
async fn test_unchanged_empty_polls_record_unavailable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report_path = dir.path().join("reports.json");

    let poller = build_poller(
        &report_path,
        StubSource::new(vec![Ok(Vec::new()), Ok(Vec::new())]),
    )?;

    let mut previous = BTreeSet::new();
    assert!(poller.run_cycle(&mut previous).await);
    assert!(poller.run_cycle(&mut previous).await);

    let entries = ReportWriter::new(&report_path).read_entries();
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].available);
    assert!(!entries[1].available);
    assert!(entries[0].error.is_none());

    Ok(())
}
