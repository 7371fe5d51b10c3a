//! Exhaustive search benchmark: filter + parallel scoring over random unit vectors.
//! Reports QPS per worker count so partitioning overhead is visible.
//!
//! Usage: cargo bench --bench exhaustive_search

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simquery_core::config;
use simquery_core::search::{filter_documents_with, most_similar_with};
use simquery_core::similarity::normalize;
use simquery_core::{CancelToken, Document, DocumentPredicate, MetadataFilter};
use std::collections::HashMap;
use std::time::Instant;

const NUM_DOCS: usize = 100_000;
const DIM: usize = 384;
const NUM_QUERIES: usize = 50;
const K: usize = 10;

fn random_unit(rng: &mut StdRng, dim: usize) -> Vec<f32> {
    let v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    normalize(&v)
}

fn main() {
    let mut rng = StdRng::seed_from_u64(42);

    println!("Generating {NUM_DOCS} documents (dim={DIM})...");
    let t0 = Instant::now();
    let docs: HashMap<String, Document> = (0..NUM_DOCS)
        .map(|i| {
            let lang = if i % 4 == 0 { "fr" } else { "en" };
            let doc = Document::new(
                format!("doc-{i}"),
                random_unit(&mut rng, DIM),
                format!("content number {i}"),
            )
            .with_metadata("lang", lang);
            (doc.id.clone(), doc)
        })
        .collect();
    println!("  done in {:.2}s", t0.elapsed().as_secs_f64());

    let queries: Vec<Vec<f32>> = (0..NUM_QUERIES)
        .map(|_| random_unit(&mut rng, DIM))
        .collect();
    let all: Vec<&Document> = docs.values().collect();
    let max_workers = config::available_parallelism();

    println!("\n=== Search only (k={K}) ===");
    let mut workers = 1;
    loop {
        let t = Instant::now();
        for q in &queries {
            let results =
                most_similar_with(&CancelToken::new(), q, &[], 0.0, &all, K, workers).unwrap();
            assert_eq!(results.len(), K);
        }
        let secs = t.elapsed().as_secs_f64();
        println!(
            "  workers={workers:<3} {:>8.1} QPS  {:>7.2} ms/query",
            NUM_QUERIES as f64 / secs,
            secs * 1000.0 / NUM_QUERIES as f64
        );
        if workers >= max_workers {
            break;
        }
        workers = (workers * 2).min(max_workers);
    }

    println!("\n=== Filter + search (lang=en, content contains \"1\") ===");
    let mut filter = MetadataFilter::new();
    filter.insert("lang".into(), "en".into());
    let predicates = vec![DocumentPredicate::contains("1")];
    let t = Instant::now();
    let mut eligible_total = 0;
    for q in &queries {
        let eligible = filter_documents_with(&docs, &filter, &predicates, max_workers);
        eligible_total += eligible.len();
        most_similar_with(&CancelToken::new(), q, &[], 0.0, &eligible, K, max_workers).unwrap();
    }
    let secs = t.elapsed().as_secs_f64();
    println!(
        "  {:>8.1} QPS  avg eligible={}",
        NUM_QUERIES as f64 / secs,
        eligible_total / NUM_QUERIES
    );

    println!("\n=== Negative filter (threshold=0.05) ===");
    let negative = random_unit(&mut rng, DIM);
    let t = Instant::now();
    for q in &queries {
        most_similar_with(&CancelToken::new(), q, &negative, 0.05, &all, K, max_workers).unwrap();
    }
    let secs = t.elapsed().as_secs_f64();
    println!("  {:>8.1} QPS", NUM_QUERIES as f64 / secs);
}
