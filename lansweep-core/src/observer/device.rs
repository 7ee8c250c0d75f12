use crate::{RunningAverage, SimTime, frame::FrameRef};
use log::debug;
use std::time::Duration;

/// Per-device statistics observer for a shared-medium link layer.
///
/// One instance is attached to every device of a freshly built topology
/// and fed the device's link-layer trace events for the duration of one
/// simulation run. After the run halts the three metrics are read out
/// and the observer is discarded; state never survives across runs.
///
/// There are no discrete named states: the observer is a continuously
/// updated counter machine. The attempt counter starts at 1 because a
/// collision-free packet still takes one attempt.
///
/// # Echo matching
///
/// A request/response pair is matched only by recency: the observer
/// keeps a single pending-request timestamp and assumes a device never
/// has more than one echo request in flight (the configured
/// inter-request interval exceeds the round-trip time). If a second
/// request goes out before the first response arrives, the stale
/// timestamp is silently overwritten and the eventual response is timed
/// against the newer request. This is an accepted modelling assumption
/// carried over from the experiment design, not an oversight.
#[derive(Debug, Clone)]
pub struct DeviceObserver {
    /// device index within the topology, for diagnostics only
    device_id: usize,

    /// attempts consumed by the packet currently being transmitted
    attempts: u32,

    /// timestamp of the last outgoing echo request, if any
    pending_request: Option<SimTime>,

    /// packets discarded after exhausting the retry limit
    discarded: u64,

    attempts_acc: RunningAverage<u32>,

    /// echo round-trip times, in microseconds
    echo_acc: RunningAverage<i64>,
}

impl DeviceObserver {
    pub fn new(device_id: usize) -> Self {
        Self {
            device_id,
            attempts: 1,
            pending_request: None,
            discarded: 0,
            attempts_acc: RunningAverage::new(),
            echo_acc: RunningAverage::new(),
        }
    }

    /// the device index this observer is attached to.
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// the medium was busy or a collision was detected; the device
    /// backed off and will retry.
    pub fn on_backoff_retry(&mut self, frame: FrameRef<'_>) {
        self.attempts += 1;
        debug!(
            "device {}: packet {}: backoff, attempt {}",
            self.device_id,
            frame.id(),
            self.attempts
        );
    }

    /// the payload was fully transmitted after however many attempts
    /// the current packet consumed.
    pub fn on_transmit_complete(&mut self, frame: FrameRef<'_>) {
        self.attempts_acc.update(self.attempts);
        debug!(
            "device {}: packet {}: sent after {} attempts",
            self.device_id,
            frame.id(),
            self.attempts
        );
        self.attempts = 1;
    }

    /// the retry limit was exhausted and the packet was permanently
    /// discarded.
    ///
    /// The attempt counter is reset without folding it in: a discarded
    /// packet must not pollute the attempts-per-success statistic.
    pub fn on_transmit_dropped(&mut self, frame: FrameRef<'_>) {
        self.discarded += 1;
        debug!(
            "device {}: packet {}: discarded after {} attempts",
            self.device_id,
            frame.id(),
            self.attempts
        );
        self.attempts = 1;
    }

    /// a frame was handed from the network layer to the link layer — a
    /// candidate echo request.
    ///
    /// Only UDP-over-IPv4 frames are timed; ICMP or ARP traffic sharing
    /// the device passes the same hook and must be ignored.
    pub fn on_frame_from_network_layer(&mut self, frame: FrameRef<'_>, now: SimTime) {
        if !frame.is_echo_candidate() {
            return;
        }
        self.pending_request = Some(now);
        debug!(
            "device {}: packet {}: echo request at {now}",
            self.device_id,
            frame.id()
        );
    }

    /// a frame was delivered from the link layer toward the network
    /// layer — a candidate echo response.
    ///
    /// A response with no preceding pending request (for example the
    /// first event after construction) is ignored, not timed as zero.
    pub fn on_frame_to_network_layer(&mut self, frame: FrameRef<'_>, now: SimTime) {
        if !frame.is_echo_candidate() {
            return;
        }
        let Some(request) = self.pending_request else {
            return;
        };
        let delay = now.duration_since(request);
        self.echo_acc.update(delay.as_micros() as i64);
        debug!(
            "device {}: packet {}: echo response at {now}, delay {delay:?}",
            self.device_id,
            frame.id()
        );
    }

    /// mean attempts needed to successfully transmit a packet.
    ///
    /// [`f64::NAN`] when the device transmitted nothing.
    pub fn mean_attempts(&self) -> f64 {
        self.attempts_acc.mean()
    }

    /// mean echo round-trip time, or `None` when no echo completed.
    pub fn mean_echo_delay(&self) -> Option<Duration> {
        if self.echo_acc.is_empty() {
            return None;
        }
        // the accumulator works in whole microseconds; truncation is
        // below the clock resolution
        Some(Duration::from_micros(self.echo_acc.mean() as u64))
    }

    /// percentage of packet outcomes that ended in a discard.
    ///
    /// The denominator is every packet outcome, successful or
    /// discarded. [`f64::NAN`] when the device saw no outcome at all.
    pub fn percent_dropped(&self) -> f64 {
        let total = self.attempts_acc.count() + self.discarded;
        if total == 0 {
            return f64::NAN;
        }
        100.0 * self.discarded as f64 / total as f64
    }

    /// packets discarded after exhausting the retry limit.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// packets successfully transmitted.
    pub fn packets_sent(&self) -> u64 {
        self.attempts_acc.count()
    }
}
