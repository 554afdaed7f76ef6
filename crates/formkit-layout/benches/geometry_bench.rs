//! Benchmarks for geometry derivation and hit testing on deep trees.
//!
//! Run with: cargo bench -p formkit-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use formkit_core::geometry::{Point, Rect};
use formkit_layout::hit::{VisibilityPolicy, container_at, hit_test};
use formkit_layout::transform::absolute_rect;
use formkit_layout::{ControlId, ControlKind, ControlTree, MainWindowFrame, ParentRef};
use rustc_hash::FxHashSet;
use std::hint::black_box;

/// A chain of nested containers `depth` deep with `leaves` buttons at the
/// bottom, plus the same number of root-level buttons as hit-test noise.
fn nested_tree(depth: usize, leaves: usize) -> (ControlTree, ControlId) {
    let mut tree = ControlTree::new();
    let mut parent = ParentRef::Root;
    let kinds = [
        ControlKind::PlainContainer,
        ControlKind::TitledContainer,
        ControlKind::TabContainer,
    ];
    for level in 0..depth {
        let size = 700 - (level as i32 * 600 / depth.max(1) as i32);
        let id = tree
            .create(kinds[level % kinds.len()], Rect::new(2, 2, size, size), parent)
            .expect("container");
        parent = ParentRef::Control(id);
    }
    let mut deepest = None;
    for i in 0..leaves {
        let id = tree
            .create(ControlKind::Button, Rect::new((i % 4) as i32, 0, 10, 10), parent)
            .expect("leaf");
        deepest = Some(id);
        tree.create(
            ControlKind::Label,
            Rect::new(600 + (i % 100) as i32, (i / 100) as i32, 5, 5),
            ParentRef::Root,
        )
        .expect("noise");
    }
    (tree, deepest.expect("at least one leaf"))
}

fn bench_absolute_rect(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry/absolute_rect");
    let frame = MainWindowFrame::default();
    for depth in [1, 8, 32, 64] {
        let (tree, leaf) = nested_tree(depth, 4);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &tree, |b, tree| {
            b.iter(|| black_box(absolute_rect(tree, &frame, black_box(leaf))))
        });
    }
    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry/hit_test");
    let frame = MainWindowFrame::default();
    for (depth, leaves) in [(4, 16), (16, 64), (32, 256)] {
        let (tree, leaf) = nested_tree(depth, leaves);
        let target = absolute_rect(&tree, &frame, leaf)
            .expect("leaf rect")
            .center();
        for policy in [VisibilityPolicy::OwnFlag, VisibilityPolicy::Inherited] {
            group.bench_with_input(
                BenchmarkId::new(format!("{policy:?}"), format!("{depth}x{leaves}")),
                &tree,
                |b, tree| b.iter(|| black_box(hit_test(tree, &frame, black_box(target), policy))),
            );
        }
    }
    group.finish();
}

fn bench_container_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry/container_at");
    let frame = MainWindowFrame::default();
    let exclude = FxHashSet::default();
    for depth in [4, 16, 48] {
        let (tree, _) = nested_tree(depth, 8);
        let point = Point::new(20, 80);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &tree, |b, tree| {
            b.iter(|| {
                black_box(container_at(
                    tree,
                    &frame,
                    black_box(point),
                    VisibilityPolicy::Inherited,
                    &exclude,
                ))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_absolute_rect, bench_hit_test, bench_container_at);
criterion_main!(benches);
