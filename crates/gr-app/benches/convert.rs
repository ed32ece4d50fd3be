use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use gr_app::pipeline::Converter;
use gr_core::config::RenderConfig;
use gr_core::frame::FrameBuffer;

fn gradient(width: u32, height: u32) -> FrameBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = ((x + y) * 255 / (width + height)) as u8;
            data.extend_from_slice(&[v, v / 2, 255 - v, 255]);
        }
    }
    FrameBuffer {
        data,
        width,
        height,
    }
}

fn bench_convert(c: &mut Criterion) {
    let frame = gradient(640, 360);
    let mut converter = Converter::new(&RenderConfig::default()).expect("default config");

    for width in [150_u32, 300] {
        c.bench_function(&format!("convert_frame 640x360 -> {width}"), |b| {
            b.iter(|| converter.convert_frame(black_box(&frame), (1920, 1080), black_box(width)));
        });
    }
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
