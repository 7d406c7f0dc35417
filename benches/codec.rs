use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use ccslave::protocol::{
    Assignment, FrameParser, Message, Mode, Str16, SyncCycle, Update, decode_frame, encode_frame,
};

fn sample_assignment() -> Message {
    Message::Assignment(Assignment {
        id: 1,
        actuator_id: 0,
        label: Str16::new("Bypass").unwrap(),
        value: 0.0,
        min: 0.0,
        max: 1.0,
        def: 0.0,
        mode: Mode::new().with(Mode::TOGGLE),
        steps: 2,
        unit: Str16::new("ms").unwrap(),
    })
}

fn full_update() -> Message {
    Message::DataUpdate(
        (0..10)
            .map(|id| Update {
                assignment_id: id,
                value: f32::from(id) * 0.1,
            })
            .collect(),
    )
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let sync = Message::ChainSync {
        cycle: SyncCycle::Regular,
    };
    group.bench_function("encode_chain_sync", |b| {
        b.iter(|| {
            black_box(encode_frame(5, &sync));
        });
    });

    let assignment = sample_assignment();
    group.bench_function("encode_assignment", |b| {
        b.iter(|| {
            black_box(encode_frame(5, &assignment));
        });
    });

    let update = full_update();
    group.bench_function("encode_data_update", |b| {
        b.iter(|| {
            black_box(encode_frame(5, &update));
        });
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let assignment = encode_frame(5, &sample_assignment());
    group.throughput(Throughput::Bytes(assignment.len() as u64));
    group.bench_function("decode_assignment", |b| {
        b.iter(|| {
            let frame = decode_frame(&assignment).unwrap();
            black_box(frame.message_from_master().unwrap());
        });
    });

    let update = encode_frame(5, &full_update());
    group.throughput(Throughput::Bytes(update.len() as u64));
    group.bench_function("decode_data_update", |b| {
        b.iter(|| {
            let frame = decode_frame(&update).unwrap();
            black_box(frame.message_from_device().unwrap());
        });
    });

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");

    // a realistic burst: sync, assignment, sync, all byte-at-a-time
    let mut stream = encode_frame(
        5,
        &Message::ChainSync {
            cycle: SyncCycle::Regular,
        },
    );
    stream.extend_from_slice(&encode_frame(5, &sample_assignment()));
    stream.extend_from_slice(&encode_frame(
        5,
        &Message::ChainSync {
            cycle: SyncCycle::Regular,
        },
    ));

    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("bytewise_burst", |b| {
        b.iter(|| {
            let mut parser = FrameParser::new();
            parser.set_local_address(5);
            for &byte in &stream {
                parser.push(byte);
            }
            while let Some(frame) = parser.next_frame() {
                black_box(frame);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_parser);
criterion_main!(benches);
