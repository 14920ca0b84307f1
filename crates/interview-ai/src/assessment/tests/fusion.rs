use super::common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assessment::{Channel, FusionConfig, FusionError, ModalityScore, ScoreFusion};

fn all_channels(text: f64, voice: f64, video: f64) -> Vec<ModalityScore> {
    vec![
        score(Channel::Text, text),
        score(Channel::Voice, voice),
        score(Channel::Video, video),
    ]
}

fn random_subset(rng: &mut StdRng) -> Vec<ModalityScore> {
    loop {
        let subset: Vec<ModalityScore> = Channel::ALL
            .iter()
            .filter_map(|channel| {
                rng.gen_bool(0.6)
                    .then(|| score(*channel, rng.gen_range(0.0..=100.0)))
            })
            .collect();
        if !subset.is_empty() {
            return subset;
        }
    }
}

#[test]
fn text_only_keeps_its_score_with_lower_reliability() {
    let fusion = ScoreFusion::default();

    let single = fusion
        .fuse(&[score(Channel::Text, 80.0)])
        .expect("text alone fuses");
    let full = fusion
        .fuse(&all_channels(80.0, 80.0, 80.0))
        .expect("all channels fuse");

    assert!((single.overall_score - 80.0).abs() < 1e-9);
    assert!(single.reliability < full.reliability);
    assert_eq!(single.confidence, 80.0);
    assert_eq!(single.effective_weights[&Channel::Text], 1.0);
}

#[test]
fn disagreement_lowers_confidence() {
    let fusion = ScoreFusion::default();

    let divergent = fusion
        .fuse(&all_channels(90.0, 50.0, 90.0))
        .expect("divergent fuses");
    let agreeing = fusion
        .fuse(&all_channels(90.0, 88.0, 90.0))
        .expect("agreeing fuses");

    assert!(divergent.confidence < agreeing.confidence);
    let expected = 0.35 * 90.0 + 0.30 * 50.0 + 0.35 * 90.0;
    assert!((divergent.overall_score - expected).abs() < 1e-9);
    assert_eq!(divergent.reliability, agreeing.reliability);
}

#[test]
fn absent_channel_weight_is_redistributed_proportionally() {
    let fusion = ScoreFusion::default();

    let fused = fusion
        .fuse(&[score(Channel::Text, 70.0), score(Channel::Voice, 40.0)])
        .expect("two channels fuse");

    let text_weight = 0.35 / 0.65;
    let voice_weight = 0.30 / 0.65;
    assert!((fused.effective_weights[&Channel::Text] - text_weight).abs() < 1e-9);
    assert!((fused.effective_weights[&Channel::Voice] - voice_weight).abs() < 1e-9);
    assert!((fused.overall_score - (text_weight * 70.0 + voice_weight * 40.0)).abs() < 1e-9);
}

#[test]
fn effective_weights_sum_to_one_for_any_subset() {
    let fusion = ScoreFusion::default();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..500 {
        let subset = random_subset(&mut rng);
        let fused = fusion.fuse(&subset).expect("valid subset fuses");

        let total: f64 = fused.effective_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "weights summed to {total}");

        let lowest = subset.iter().map(|s| s.score).fold(f64::INFINITY, f64::min);
        let highest = subset.iter().map(|s| s.score).fold(f64::NEG_INFINITY, f64::max);
        assert!(fused.overall_score >= lowest - 1e-9 && fused.overall_score <= highest + 1e-9);
        assert!((0.0..=100.0).contains(&fused.confidence));
        assert!((0.0..=100.0).contains(&fused.reliability));
    }
}

#[test]
fn fusion_is_deterministic() {
    let fusion = ScoreFusion::default();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..100 {
        let subset = random_subset(&mut rng);
        assert_eq!(fusion.fuse(&subset), fusion.fuse(&subset));
    }
}

#[test]
fn raising_one_channel_never_lowers_the_overall_score() {
    let fusion = ScoreFusion::default();
    let mut rng = StdRng::seed_from_u64(23);

    for _ in 0..300 {
        let mut subset = random_subset(&mut rng);
        let before = fusion.fuse(&subset).expect("fuses").overall_score;

        let index = rng.gen_range(0..subset.len());
        let bump = rng.gen_range(0.0..=(100.0 - subset[index].score));
        subset[index].score = (subset[index].score + bump).min(100.0);
        let after = fusion.fuse(&subset).expect("fuses").overall_score;

        assert!(after + 1e-9 >= before, "{before} dropped to {after}");
    }
}

#[test]
fn more_channels_means_more_reliability() {
    let fusion = ScoreFusion::default();

    let one = fusion.fuse(&[score(Channel::Video, 50.0)]).expect("fuses");
    let two = fusion
        .fuse(&[score(Channel::Video, 50.0), score(Channel::Voice, 50.0)])
        .expect("fuses");
    let three = fusion.fuse(&all_channels(50.0, 50.0, 50.0)).expect("fuses");

    assert!(one.reliability < two.reliability);
    assert!(two.reliability < three.reliability);
    assert!((three.reliability - 100.0).abs() < 1e-9);
}

#[test]
fn degraded_channel_counts_for_less_reliability() {
    let fusion = ScoreFusion::default();
    let mut degraded = score(Channel::Text, 70.0);
    degraded.degraded = true;

    let healthy = fusion.fuse(&[score(Channel::Text, 70.0)]).expect("fuses");
    let fallback = fusion.fuse(&[degraded]).expect("fuses");

    assert!(fallback.reliability < healthy.reliability);
    assert_eq!(fallback.overall_score, healthy.overall_score);
}

#[test]
fn rejects_invalid_input() {
    let fusion = ScoreFusion::default();

    assert_eq!(
        fusion.fuse(&Vec::<ModalityScore>::new()),
        Err(FusionError::NoModalities)
    );
    assert!(matches!(
        fusion.fuse(&[score(Channel::Voice, 101.0)]),
        Err(FusionError::ScoreOutOfRange {
            channel: Channel::Voice,
            ..
        })
    ));
    assert!(matches!(
        fusion.fuse(&[score(Channel::Text, f64::NAN)]),
        Err(FusionError::ScoreOutOfRange { .. })
    ));
    assert_eq!(
        fusion.fuse(&[score(Channel::Text, 10.0), score(Channel::Text, 20.0)]),
        Err(FusionError::DuplicateChannel(Channel::Text))
    );
}

#[test]
fn zero_canonical_weights_share_evenly() {
    let fusion = ScoreFusion::new(FusionConfig::default().with_weights(0.0, 0.0, 0.6));

    let fused = fusion
        .fuse(&[score(Channel::Text, 40.0), score(Channel::Voice, 80.0)])
        .expect("fuses");

    assert!((fused.overall_score - 60.0).abs() < 1e-9);
    assert_eq!(fused.effective_weights[&Channel::Text], 0.5);
}
