// Criterion benchmarks for Audit Match

use async_trait::async_trait;
use audit_match::core::{extract_features, rank, MatchingEngine};
use audit_match::error::EmbeddingError;
use audit_match::models::{
    AuditorProfile, Availability, BudgetRange, MatchResult, MatchingCriteria, ModelMetrics,
};
use audit_match::services::{
    EmbeddingProvider, FileModelLoader, SemanticOptions, SemanticScorer, StructuredScorer,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use std::collections::HashMap;
use std::sync::Arc;

const CHAINS: [&str; 4] = ["ethereum", "solana", "polygon", "arbitrum"];

/// Deterministic letter-frequency embeddings, no network
struct LetterProvider;

#[async_trait]
impl EmbeddingProvider for LetterProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; 26];
                for b in text.bytes().filter(u8::is_ascii_alphabetic) {
                    vector[(b.to_ascii_lowercase() - b'a') as usize] += 1.0;
                }
                vector
            })
            .collect())
    }
}

fn create_candidate(id: usize) -> AuditorProfile {
    AuditorProfile {
        id: format!("auditor-{}", id),
        description: format!("{} security reviews, batch {}", CHAINS[id % 4], id % 7),
        expertise: vec!["Solidity".to_string(), "DeFi".to_string()],
        experience_years: (id % 12) as u32,
        rating: 3.0 + (id % 20) as f64 / 10.0,
        hourly_rate: 80.0 + (id % 50) as f64 * 4.0,
        availability: if id % 3 == 0 { Availability::Busy } else { Availability::Available },
        specializations: vec![],
        past_audits: (id % 90) as u32,
        success_rate: 0.6 + (id % 40) as f64 / 100.0,
        response_time_avg: (id % 24) as f64,
        blockchain_expertise: vec![CHAINS[id % 4].to_string()],
    }
}

fn create_criteria() -> MatchingCriteria {
    MatchingCriteria {
        blockchain: "ethereum".to_string(),
        project_type: "defi".to_string(),
        project_description: "Ethereum DeFi lending security review".to_string(),
        budget_range: BudgetRange { min: 10_000.0, max: 50_000.0 },
        timeline: "1 month".to_string(),
        complexity: "medium".to_string(),
        specific_requirements: vec!["solidity".to_string(), "defi".to_string()],
        quality_threshold: 0.8,
        experience_preference: "senior".to_string(),
        audit_type: vec![],
    }
}

fn bench_extract_features(c: &mut Criterion) {
    let criteria = create_criteria();
    let candidate = create_candidate(7);

    c.bench_function("extract_features", |b| {
        b.iter(|| extract_features(black_box(&criteria), black_box(&candidate)));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let candidates: Vec<AuditorProfile> = (0..1000).map(create_candidate).collect();
    let metrics = ModelMetrics { precision: 0.8, recall: 0.8, f1_score: 0.8 };
    let results: Vec<MatchResult<'_>> = candidates
        .iter()
        .enumerate()
        .map(|(i, auditor)| MatchResult {
            auditor,
            structured_score: (i % 17) as f64 / 17.0,
            semantic_score: (i % 11) as f64 / 11.0,
            combined_score: (i % 13) as f64 / 13.0,
            recommendation_reason: String::new(),
            feature_importance: HashMap::new(),
            precision_metrics: metrics,
        })
        .collect();

    c.bench_function("rank_1000_results", |b| {
        b.iter_batched(
            || results.clone(),
            |mut batch| {
                rank(&mut batch);
                batch
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_find_matches(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let artifact = format!("{}/config/structured_model.json", env!("CARGO_MANIFEST_DIR"));
    let engine = MatchingEngine::new(
        StructuredScorer::new(Arc::new(FileModelLoader::new(artifact)), 8),
        SemanticScorer::new(Arc::new(LetterProvider), SemanticOptions::default()),
    );
    runtime.block_on(engine.initialize()).unwrap();

    let criteria = create_criteria();
    let mut group = c.benchmark_group("matching");

    for candidate_count in [10, 100, 500].iter() {
        let candidates: Vec<AuditorProfile> = (0..*candidate_count).map(create_candidate).collect();

        group.bench_with_input(
            BenchmarkId::new("find_matches", candidate_count),
            candidate_count,
            |b, _| {
                b.to_async(&runtime).iter(|| async {
                    let results = engine
                        .find_matches(black_box(&criteria), black_box(&candidates))
                        .await
                        .unwrap();
                    black_box(results.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_extract_features, bench_ranking, bench_find_matches);

criterion_main!(benches);
