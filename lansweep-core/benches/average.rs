use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lansweep_core::{DeviceObserver, RunningAverage, SimTime, frame::FrameRef};

fn average(c: &mut Criterion) {
    let mut acc = RunningAverage::<i64>::new();

    c.bench_function("update", |b| b.iter(|| acc.update(black_box(1_234_i64))));

    c.bench_function("mean", |b| b.iter(|| black_box(acc.mean())));
}

fn observer(c: &mut Criterion) {
    // smallest valid UDP-over-IPv4 frame: Ethernet + IPv4 headers
    let mut bytes = vec![0u8; 34];
    bytes[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
    bytes[14] = 0x45;
    bytes[14 + 9] = 17;

    let mut obs = DeviceObserver::new(0);
    let mut now = 0_u64;

    c.bench_function("echo_round_trip", |b| {
        b.iter(|| {
            let frame = FrameRef::new(black_box(1), &bytes);
            obs.on_frame_from_network_layer(frame, SimTime::from_micros(now));
            now += 100;
            obs.on_frame_to_network_layer(frame, SimTime::from_micros(now));
            now += 900;
        })
    });
}

criterion_group!(benches, average, observer);
criterion_main!(benches);
