#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the zone radar toolchain.
//!
//! Renders [`ScanEvent`] streams as `indicatif` progress bars, and
//! provides [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while progress bars redraw.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use zone_radar_zones::ScanEvent;
use zone_radar_zones::progress::ScanEventReceiver;

pub use indicatif::MultiProgress;

/// One bar per area scan, driven by [`ScanEvent`]s.
pub struct ScanProgress {
    multi: MultiProgress,
    bar: Option<ProgressBar>,
    bar_style: ProgressStyle,
    label: String,
    found: u64,
}

impl ScanProgress {
    #[must_use]
    pub fn new(multi: MultiProgress) -> Self {
        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} points {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self {
            multi,
            bar: None,
            bar_style,
            label: String::new(),
            found: 0,
        }
    }

    pub fn handle(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Started {
                label,
                total_points,
            } => {
                if let Some(previous) = self.bar.take() {
                    previous.finish_and_clear();
                }
                let bar = self.multi.add(ProgressBar::new(total_points));
                bar.set_style(self.bar_style.clone());
                bar.set_message(label.clone());
                self.label = label;
                self.found = 0;
                self.bar = Some(bar);
            }
            ScanEvent::PointProbed { new_parcel, .. } => {
                if new_parcel {
                    self.found += 1;
                }
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                    bar.set_message(format!("{} ({} parcels)", self.label, self.found));
                }
            }
            ScanEvent::Finished { unique_parcels } => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_with_message(format!(
                        "{}: {unique_parcels} unique parcels",
                        self.label
                    ));
                }
            }
        }
    }

    /// Clears a bar left unfinished by an interrupted scan.
    pub fn abandon(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon_with_message(format!("{} (interrupted)", self.label));
        }
    }
}

/// Renders `events` until every sender is dropped.
#[must_use]
pub fn spawn_scan_progress(multi: &MultiProgress, mut events: ScanEventReceiver) -> JoinHandle<()> {
    let mut progress = ScanProgress::new(multi.clone());
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            progress.handle(event);
        }
        progress.abandon();
    })
}

/// Creates a progress bar for step-level progress (e.g., zones 3/12).
/// Total is known up front so this starts as a bar immediately.
#[must_use]
pub fn steps_bar(multi: &MultiProgress, message: &str, total: u64) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(total));
    bar.set_style(
        ProgressStyle::with_template("{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(250));
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn bar_follows_scan_events() {
        let mut progress = ScanProgress::new(hidden());
        progress.handle(ScanEvent::Started {
            label: "Triana".to_string(),
            total_points: 4,
        });

        let bar = progress.bar.clone().unwrap();
        assert_eq!(bar.length(), Some(4));

        progress.handle(ScanEvent::PointProbed {
            index: 0,
            new_parcel: true,
        });
        progress.handle(ScanEvent::PointProbed {
            index: 1,
            new_parcel: false,
        });
        assert_eq!(bar.position(), 2);
        assert_eq!(progress.found, 1);
        assert_eq!(bar.message(), "Triana (1 parcels)");

        progress.handle(ScanEvent::Finished { unique_parcels: 1 });
        assert!(progress.bar.is_none());
        assert!(bar.is_finished());
    }

    #[test]
    fn new_scan_resets_counters() {
        let mut progress = ScanProgress::new(hidden());
        for label in ["first", "second"] {
            progress.handle(ScanEvent::Started {
                label: label.to_string(),
                total_points: 9,
            });
            progress.handle(ScanEvent::PointProbed {
                index: 0,
                new_parcel: true,
            });
        }
        assert_eq!(progress.label, "second");
        assert_eq!(progress.found, 1);
    }

    #[test]
    fn probes_without_a_scan_are_ignored() {
        let mut progress = ScanProgress::new(hidden());
        progress.handle(ScanEvent::PointProbed {
            index: 0,
            new_parcel: true,
        });
        progress.abandon();
        assert!(progress.bar.is_none());
    }

    #[tokio::test]
    async fn spawned_renderer_ends_with_channel() {
        let (tx, rx) = zone_radar_zones::progress::channel();
        let handle = spawn_scan_progress(&hidden(), rx);
        tx.send(ScanEvent::Started {
            label: "x".to_string(),
            total_points: 1,
        })
        .unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
