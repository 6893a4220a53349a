//! Progress events for long-running area scans.
//!
//! Scans push [`ScanEvent`]s into an unbounded channel; whoever renders
//! progress owns the receiving end. Sends to a closed channel are ignored.

use tokio::sync::mpsc;

/// Something that happened during an area scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A scan is about to probe `total_points` grid points.
    Started {
        /// What is being scanned (zone or seed name).
        label: String,
        total_points: u64,
    },
    /// Grid point `index` (0-based) was queried.
    PointProbed {
        index: u64,
        /// Whether the point yielded a parcel not seen before in this scan.
        new_parcel: bool,
    },
    /// The scan ended with `unique_parcels` distinct parcels.
    Finished { unique_parcels: u64 },
}

pub type ScanEventSender = mpsc::UnboundedSender<ScanEvent>;
pub type ScanEventReceiver = mpsc::UnboundedReceiver<ScanEvent>;

#[must_use]
pub fn channel() -> (ScanEventSender, ScanEventReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(events: Option<&ScanEventSender>, event: ScanEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}
