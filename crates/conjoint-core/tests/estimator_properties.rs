//! Statistical properties of the estimator, checked through the public API.

use conjoint_core::estimator::mnl;
use conjoint_core::{
    analyze, bootstrap_shares, willingness_to_pay, Alternative, BootstrapConfig, Choice,
    EstimationInput, EstimatorConfig, Feature, MnlConfig, Observation, Response,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

fn resp(task: &str, agent: &str, segment: &str, chosen: &str) -> Response {
    Response::new(task, agent, Choice::from(chosen.to_string())).with_segment(segment)
}

fn hotel() -> (Vec<Feature>, Vec<Alternative>) {
    let features = vec![
        Feature::continuous("price", "Nightly Price", 50.0, 300.0).with_unit("USD"),
        Feature::continuous("quality", "Quality", 0.0, 10.0),
        Feature::categorical("view", "View", &["street", "garden", "sea"]),
    ];
    let alternatives = vec![
        Alternative::new("a", "Harbour")
            .with("price", 100.0)
            .with("quality", 8.0)
            .with("view", "sea"),
        Alternative::new("b", "Central")
            .with("price", 200.0)
            .with("quality", 8.0)
            .with("view", "street"),
        Alternative::new("c", "Hostel")
            .with("price", 100.0)
            .with("quality", 3.0)
            .with("view", "garden"),
        Alternative::new("d", "Airport")
            .with("price", 200.0)
            .with("quality", 3.0)
            .with("view", "street"),
    ];
    (features, alternatives)
}

fn mixed_responses() -> Vec<Response> {
    let picks = ["a", "b", "NONE", "a", "c", "d", "a", "NONE", "b", "a", "c", "a"];
    picks
        .iter()
        .enumerate()
        .map(|(i, pick)| {
            let segment = if i % 3 == 0 { "families" } else { "business" };
            let agent = format!("{}_{}", segment, i);
            resp(&format!("{}_task_{}", agent, i), &agent, segment, pick)
                .with_reasons(&["price", "quality"])
                .with_confidence(0.7)
        })
        .collect()
}

#[test]
fn overall_and_segment_shares_sum_to_one() {
    let (features, alternatives) = hotel();
    let responses = mixed_responses();
    let input = EstimationInput::new(&features, &alternatives, &responses);
    let doc = analyze(&input, &EstimatorConfig::default(), &mut ChaCha8Rng::seed_from_u64(1));

    let total: f64 = doc.shares.overall.values().sum();
    assert!((total - 1.0).abs() < 1e-9, "overall shares sum to {}", total);
    assert!(doc.shares.overall.contains_key("NONE"));

    assert_eq!(doc.shares.by_segment.len(), 2);
    for (segment, shares) in &doc.shares.by_segment {
        let total: f64 = shares.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "{} shares sum to {}", segment, total);
    }
    assert!((doc.response_stats.none_rate - 2.0 / 12.0).abs() < 1e-12);
}

#[test]
fn mnl_recovers_signs_from_noiseless_pairwise_choices() {
    // columns: x1, x2; true utility = x1 - 2 * x2
    let design = vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
    ];
    let utility = |row: usize| design[row][0] - 2.0 * design[row][1];

    let mut observations = Vec::new();
    for _ in 0..20 {
        for i in 0..4 {
            for j in (i + 1)..4 {
                let chosen = if utility(i) >= utility(j) { 0 } else { 1 };
                observations.push(Observation {
                    alternatives: vec![i, j],
                    chosen,
                });
            }
        }
    }
    assert!(observations.len() > 100);

    let config = MnlConfig::default();
    let fit = mnl::fit(&design, &observations, &config).expect("enough observations");
    assert!(fit.beta[0] > 0.0, "beta = {:?}", fit.beta);
    assert!(fit.beta[1] < 0.0, "beta = {:?}", fit.beta);

    let again = mnl::fit(&design, &observations, &config).expect("refit");
    assert_eq!(fit.beta, again.beta);
    assert_eq!(fit.log_likelihood, again.log_likelihood);
}

#[test]
fn bootstrap_intervals_bracket_the_mean_and_replay_with_a_seed() {
    let responses = mixed_responses();
    let keys: Vec<String> = ["NONE", "a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let config = BootstrapConfig::default();

    let first = bootstrap_shares(
        &responses,
        &keys,
        &config,
        true,
        &mut ChaCha8Rng::seed_from_u64(42),
    );
    assert_eq!(first.len(), keys.len());
    for (key, ci) in &first {
        assert!(ci.lo <= ci.mean && ci.mean <= ci.hi, "{}: {:?}", key, ci);
    }

    let second = bootstrap_shares(
        &responses,
        &keys,
        &config,
        false,
        &mut ChaCha8Rng::seed_from_u64(42),
    );
    assert_eq!(first, second);
}

#[test]
fn wtp_is_positive_for_a_liked_attribute_when_price_hurts() {
    let (features, _) = hotel();
    let part_worths = BTreeMap::from([
        ("price".to_string(), -2.0),
        ("quality".to_string(), 1.0),
    ]);
    let wtp = willingness_to_pay(&features, &part_worths, "price|cost|fee|premium", |_| {
        Some(50.0)
    })
    .expect("price feature present");
    assert_eq!(wtp.price_feature, "price");
    assert_eq!(wtp.price_unit.as_deref(), Some("USD"));
    assert!(wtp.values["quality"] > 0.0);
    // one quality point is worth half a 50 USD price std
    assert!((wtp.values["quality"] - 25.0).abs() < 1e-12);
    assert!(!wtp.values.contains_key("price"));
}

#[test]
fn too_few_responses_give_zero_part_worths() {
    let (features, alternatives) = hotel();
    let responses: Vec<Response> = mixed_responses().into_iter().take(4).collect();
    let input = EstimationInput::new(&features, &alternatives, &responses);
    let doc = analyze(&input, &EstimatorConfig::default(), &mut ChaCha8Rng::seed_from_u64(2));

    assert!(!doc.part_worths.overall.is_empty());
    assert!(doc.part_worths.overall.values().all(|b| *b == 0.0));
    assert!(doc.part_worths.by_segment.is_empty());
    assert!(doc.wtp.is_none());
}

#[test]
fn no_price_feature_means_no_wtp() {
    let features = vec![
        Feature::continuous("quality", "Quality", 0.0, 10.0),
        Feature::binary("breakfast", "Breakfast Included"),
    ];
    let alternatives = vec![
        Alternative::new("a", "A").with("quality", 9.0).with("breakfast", true),
        Alternative::new("b", "B").with("quality", 2.0).with("breakfast", false),
    ];
    let responses: Vec<Response> = (0..20)
        .map(|i| resp(&format!("t{}", i), &format!("s_{}", i), "s", if i % 4 == 0 { "b" } else { "a" }))
        .collect();
    let input = EstimationInput::new(&features, &alternatives, &responses);
    let doc = analyze(&input, &EstimatorConfig::default(), &mut ChaCha8Rng::seed_from_u64(3));

    assert!(doc.part_worths.overall["quality"] > 0.0);
    assert!(doc.wtp.is_none());
    let raw = serde_json::to_value(&doc).expect("serialize");
    assert!(raw["wtp"].is_null());
}

#[test]
fn empty_input_yields_empty_results() {
    let (features, alternatives) = hotel();
    let input = EstimationInput::new(&features, &alternatives, &[]);
    let doc = analyze(&input, &EstimatorConfig::default(), &mut ChaCha8Rng::seed_from_u64(4));

    assert!(doc.shares.overall.values().all(|s| *s == 0.0));
    assert!(doc.shares.by_segment.is_empty());
    assert!(doc.confidence.is_empty());
    assert_eq!(doc.response_stats.total_responses, 0);
    assert_eq!(doc.response_stats.none_rate, 0.0);
    assert!(doc.validation.holdout_hit_rate.is_none());
}

#[test]
fn forecast_prefers_the_concept_the_model_likes() {
    let (features, alternatives) = hotel();
    let responses: Vec<Response> = (0..60)
        .map(|i| {
            let pick = match i % 6 {
                0..=3 => "a",
                4 => "b",
                _ => "c",
            };
            resp(&format!("t{}", i), &format!("s_{}", i), "s", pick)
        })
        .collect();
    let input = EstimationInput::new(&features, &alternatives, &responses);
    let doc = analyze(&input, &EstimatorConfig::default(), &mut ChaCha8Rng::seed_from_u64(5));

    let concepts = vec![
        Alternative::new("budget_sea", "Budget Sea")
            .with("price", 90.0)
            .with("quality", 8.0)
            .with("view", "sea"),
        Alternative::new("pricey_street", "Pricey Street")
            .with("price", 250.0)
            .with("quality", 3.0)
            .with("view", "street"),
    ];
    let shares = doc.forecast(&concepts);
    let total: f64 = shares.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(shares["budget_sea"] > shares["pricey_street"]);
}
