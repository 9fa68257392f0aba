use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relaymesh_topology::{NodeId, PathFinder, SecurityScorer, TopologyStore};
use std::sync::Arc;

/// Ring of `n` nodes with chords every third node
fn chorded_ring(n: u64) -> Arc<TopologyStore> {
    let store = Arc::new(TopologyStore::with_limits(
        Arc::new(relaymesh_topology::MemoryMirror::default()),
        n as usize,
        8,
    ));
    for id in 0..n {
        store.add_node(NodeId(id), &format!("node{id}")).unwrap();
    }
    for id in 0..n {
        store.add_edge(NodeId(id), NodeId((id + 1) % n), 1).unwrap();
        if id % 3 == 0 {
            store.add_edge(NodeId(id), NodeId((id + 5) % n), 2).unwrap();
        }
    }
    store
}

fn benchmark_shortest_path(c: &mut Criterion) {
    let store = chorded_ring(60);
    let finder = PathFinder::new(store);

    c.bench_function("shortest path ring-60", |b| {
        b.iter(|| {
            finder
                .shortest_path(black_box(NodeId(0)), black_box(NodeId(30)))
                .unwrap()
        });
    });
}

fn benchmark_betweenness(c: &mut Criterion) {
    let store = chorded_ring(60);
    let scorer = SecurityScorer::new(store);

    c.bench_function("betweenness ring-60", |b| {
        b.iter(|| scorer.betweenness_centrality());
    });
}

fn benchmark_stats(c: &mut Criterion) {
    let store = chorded_ring(60);

    c.bench_function("stats ring-60", |b| {
        b.iter(|| store.stats());
    });
}

criterion_group!(
    benches,
    benchmark_shortest_path,
    benchmark_betweenness,
    benchmark_stats
);
criterion_main!(benches);
