use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rankwise_core::catalog::{BillingCycle, Feature, PricingPlan};
use rankwise_core::comparison::canonical_comparisons;
use rankwise_core::probe::CandidateParser;
use rankwise_core::ranking::{alternatives, comparison_pairs, sort_by_rating, summarize};
use rankwise_core::{InMemoryCatalog, Product, Vertical};

fn catalog(n: u64) -> InMemoryCatalog {
    let products = (1..=n)
        .map(|i| {
            let mut p = Product::new(i, "vpn", format!("vpn-{i}"), format!("VPN {i}"), (i % 11) as f64);
            p.pricing = vec![
                PricingPlan::new("Monthly", 9.99 + i as f64, BillingCycle::Monthly),
                PricingPlan::new("Yearly", 59.0 + i as f64, BillingCycle::Yearly),
            ];
            p.features = vec![Feature::new("kill_switch", i % 2 == 0)];
            p
        })
        .collect();
    InMemoryCatalog::new(vec![Vertical::new("vpn", "VPNs")], products).unwrap()
}

fn bench_ranking(c: &mut Criterion) {
    use rankwise_core::Catalog;

    let catalog = catalog(20);
    let products = catalog.products("vpn");

    c.bench_function("sort_by_rating_20", |b| {
        b.iter(|| sort_by_rating(black_box(products.iter().copied())))
    });

    c.bench_function("comparison_pairs_20", |b| {
        b.iter(|| comparison_pairs(black_box(&products)))
    });

    c.bench_function("canonical_comparisons_20", |b| {
        b.iter(|| canonical_comparisons(black_box(&products)))
    });

    c.bench_function("alternatives_20", |b| {
        b.iter(|| alternatives(black_box(&products), products[0], 7))
    });

    c.bench_function("summarize_20", |b| b.iter(|| summarize(black_box(&products))));
}

fn bench_candidates(c: &mut Criterion) {
    let parser = CandidateParser::new();
    let candidates = [
        "candidate:842163049 1 udp 2122260223 192.168.1.5 54321 typ host generation 0",
        "candidate:1467250027 1 udp 1686052607 203.0.113.7 54321 typ srflx raddr 192.168.1.5 rport 54321",
        "candidate:2 1 udp 2122262783 2001:db8:85a3::8a2e:370:7334 61000 typ host",
        "candidate:1 1 udp 2122260223 1f4712db-ea17-4bcf-a596-105139dfd8bf.local 50000 typ host",
    ];

    c.bench_function("analyze_candidates", |b| {
        b.iter(|| parser.analyze(black_box(candidates)))
    });
}

criterion_group!(benches, bench_ranking, bench_candidates);
criterion_main!(benches);
