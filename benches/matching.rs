// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Throughput benchmarks for the matching core.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use matchbook::{AssetBook, AssetId, Order, OrderId, OrderRequest, Price, Side, Size, UserId};

fn order(id: u64, side: Side, price: i64, size: i64) -> Order {
    let req = OrderRequest::limit(side, Price(price), Size(size)).unwrap();
    Order::new(OrderId(id), UserId(1), AssetId(1), req, id)
}

/// Build a book with N price levels on each side, one order per level.
fn build_book(levels: usize) -> (AssetBook, u64) {
    let mut book = AssetBook::new();
    let mut next = 1u64;
    for i in 0..levels {
        book.place(order(next, Side::Buy, 99_00 - (i as i64) * 100, 1_00));
        next += 1;
        book.place(order(next, Side::Sell, 101_00 + (i as i64) * 100, 1_00));
        next += 1;
    }
    (book, next)
}

/// Benchmark: rest a limit order that never matches.
fn bench_rest_no_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("rest_no_match");
    for levels in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let (mut book, mut next) = build_book(levels);
            let mut offset = 0i64;
            b.iter(|| {
                let price = 50_00 - offset;
                offset = (offset + 1) % 1000;
                let placement = book.place(order(next, Side::Buy, price, 1_00));
                next += 1;
                black_box(placement)
            });
        });
    }
    group.finish();
}

/// Benchmark: aggressive buy sweeping several levels.
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_five_levels");
    group.throughput(Throughput::Elements(1));
    group.bench_function("sweep", |b| {
        b.iter_batched(
            || build_book(100),
            |(mut book, next)| {
                // Crosses five ask levels
                black_box(book.place(order(next, Side::Buy, 105_00, 5_00)))
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

/// Benchmark: cancel an order from a deep level.
fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");
    group.throughput(Throughput::Elements(1));
    group.bench_function("cancel_resting", |b| {
        b.iter_batched(
            || build_book(100),
            |(mut book, _)| black_box(book.remove(OrderId(1))),
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

/// Benchmark: depth snapshot of a populated book.
fn bench_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth");
    let (book, _) = build_book(1000);
    for levels in [10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            b.iter(|| black_box(book.depth(levels).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rest_no_match,
    bench_sweep,
    bench_cancel,
    bench_depth
);
criterion_main!(benches);
