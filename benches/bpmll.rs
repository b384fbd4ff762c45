use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bpmll::{Activation, Backprop, DataPair, NeuralNet};

fn feed_forward_bench(c: &mut Criterion) {
    let mut net = NeuralNet::new_with_seed(&[64, 128, 16], 1.0, Activation::Tanh, 0).unwrap();
    let input = vec![0.1_f64; net.input_dim()];

    c.bench_function("feed_forward_64_128_16", |b| {
        b.iter(|| {
            let out = net.feed_forward(black_box(&input)).unwrap();
            black_box(out);
        })
    });
}

fn learn_bench(c: &mut Criterion) {
    let mut net = NeuralNet::new_with_seed(&[64, 128, 16], 1.0, Activation::Tanh, 0).unwrap();
    let mut learner = Backprop::new(1e-5).unwrap();

    let input = vec![0.1_f64; net.input_dim()];
    let mut target = vec![-1.0_f64; net.output_dim()];
    for t in target.iter_mut().step_by(3) {
        *t = 1.0;
    }
    let pair = DataPair::new(&input, &target);

    c.bench_function("learn_64_128_16", |b| {
        b.iter(|| {
            let err = learner.learn(&mut net, black_box(&pair), 0.05).unwrap();
            black_box(err);
        })
    });
}

criterion_group!(benches, feed_forward_bench, learn_bench);
criterion_main!(benches);
