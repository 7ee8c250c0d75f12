/*!
# lansweep-core

Statistics engine for shared-medium (CSMA/Ethernet-like) echo
experiments. The simulation engine itself lives elsewhere; this crate
consumes its link-layer trace events — backoff, completed transmission,
drop after the retry limit, and the frame hand-offs between the network
and link layers — and turns them into three per-device metrics:

- mean transmission attempts per successfully sent packet,
- mean echo (request/response) round-trip time,
- percentage of packets discarded after exhausting the retry limit.

[`DeviceObserver`] classifies the event stream of one device;
[`TopologyObserver`] owns one observer per device and aggregates the
metrics over device ranges; [`RunningAverage`] is the numerically
stable accumulator underneath all of it.
*/

pub mod average;
pub mod defaults;
pub mod frame;
pub mod observer;
pub mod time;

pub use self::{
    average::{RunningAverage, Sample},
    frame::{EtherType, FrameRef, FrameView, IpProtocol},
    observer::{DeviceObserver, LinkEvent, RangeError, TopologyObserver},
    time::SimTime,
};
