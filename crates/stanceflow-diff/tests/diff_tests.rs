//! Tests for stanceflow-diff: paths, significance tiers, list diffs,
//! symmetry, merge strategies, and idempotence

use stanceflow_core::*;
use stanceflow_diff::*;

fn base() -> Stance {
    let mut s = Stance::default();
    s.sentience.emergent_goals = vec!["listen".into(), "learn".into()];
    s.metaphors = vec!["river".into()];
    s
}

// ============================================================
// Paths
// ============================================================

#[test]
fn path_display_is_dotted() {
    assert_eq!(StancePath::Frame.to_string(), "frame");
    assert_eq!(StancePath::SelfModel.to_string(), "selfModel");
    assert_eq!(StancePath::Value(ValueKey::Curiosity).to_string(), "values.curiosity");
    assert_eq!(
        StancePath::Sentience(SentienceLevel::IdentityStrength).to_string(),
        "sentience.identityStrength"
    );
    assert_eq!(StancePath::EmergentGoals.to_string(), "sentience.emergentGoals");
}

#[test]
fn path_read_write_round_trip() {
    let mut stance = Stance::default();
    StancePath::Frame
        .write(&mut stance, FieldValue::Frame(Frame::Poetic))
        .unwrap();
    StancePath::Value(ValueKey::Risk)
        .write(&mut stance, FieldValue::Number(120.0))
        .unwrap();
    assert_eq!(StancePath::Frame.read(&stance), FieldValue::Frame(Frame::Poetic));
    // numbers clamp on write
    assert_eq!(
        StancePath::Value(ValueKey::Risk).read(&stance),
        FieldValue::Number(100.0)
    );
}

#[test]
fn path_write_rejects_type_mismatch() {
    let mut stance = Stance::default();
    let err = StancePath::Frame
        .write(&mut stance, FieldValue::Number(1.0))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn all_paths_are_unique() {
    let paths = StancePath::all();
    let set: std::collections::BTreeSet<_> = paths.iter().copied().collect();
    assert_eq!(paths.len(), set.len());
    assert_eq!(paths.len(), 18);
}

// ============================================================
// Diff
// ============================================================

#[test]
fn identical_stances_have_no_changes() {
    let d = diff(&base(), &base());
    assert!(d.is_empty());
    assert_eq!(d.summary, DiffSummary::default());
    assert!(d.highest_significance().is_none());
}

#[test]
fn frame_and_self_model_are_major() {
    let mut right = base();
    right.frame = Frame::Mythic;
    right.self_model = SelfModel::Mirror;
    right.objective = Objective::Novelty;
    let d = diff(&base(), &right);
    assert_eq!(d.changes.len(), 3);
    assert_eq!(d.changes[0].path, StancePath::Frame);
    assert_eq!(d.changes[0].significance, Significance::Major);
    assert_eq!(d.changes[1].significance, Significance::Major);
    assert_eq!(d.changes[2].path, StancePath::Objective);
    assert_eq!(d.changes[2].significance, Significance::Moderate);
    assert_eq!(d.summary.major, 2);
    assert_eq!(d.summary.moderate, 1);
}

#[test]
fn value_significance_tiers() {
    let mut right = base();
    right.values.curiosity = 75.0; // +25
    right.values.risk = 35.0; // -15
    right.values.empathy = 60.0; // +10, not > 10
    let d = diff(&base(), &right);
    let sig = |key| {
        d.changes
            .iter()
            .find(|c| c.path == StancePath::Value(key))
            .map(|c| c.significance)
            .unwrap()
    };
    assert_eq!(sig(ValueKey::Curiosity), Significance::Major);
    assert_eq!(sig(ValueKey::Risk), Significance::Moderate);
    assert_eq!(sig(ValueKey::Empathy), Significance::Minor);
    assert_eq!(d.summary.total, 3);
}

#[test]
fn sentience_levels_are_moderate() {
    let mut right = base();
    right.sentience.awareness_level = 90.0;
    let d = diff(&base(), &right);
    assert_eq!(d.changes.len(), 1);
    assert_eq!(d.changes[0].kind, ChangeKind::Modified);
    assert_eq!(d.changes[0].significance, Significance::Moderate);
}

#[test]
fn list_changes_use_set_difference() {
    let mut right = base();
    right.sentience.emergent_goals = vec!["learn".into(), "teach".into()];
    let d = diff(&base(), &right);
    assert_eq!(d.changes.len(), 2);
    let added = &d.changes[0];
    assert_eq!(added.kind, ChangeKind::Added);
    assert_eq!(added.path, StancePath::EmergentGoals);
    assert_eq!(added.right_value, Some(FieldValue::Text("teach".into())));
    assert!(added.left_value.is_none());
    let removed = &d.changes[1];
    assert_eq!(removed.kind, ChangeKind::Removed);
    assert_eq!(removed.left_value, Some(FieldValue::Text("listen".into())));
    assert!(d.changes.iter().all(|c| c.significance == Significance::Moderate));
}

#[test]
fn diff_is_symmetric() {
    let left = base();
    let mut right = base();
    right.frame = Frame::Stoic;
    right.values.novelty = 12.0;
    right.sentience.identity_strength = 44.0;
    right.sentience.emergent_goals = vec!["wander".into()];
    right.constraints = vec!["short answers".into()];

    let ab = diff(&left, &right);
    let ba = diff(&right, &left);
    assert_eq!(ab.changes.len(), ba.changes.len());
    for change in &ab.changes {
        let mirrored = ba
            .changes
            .iter()
            .find(|c| {
                c.path == change.path
                    && c.left_value == change.right_value
                    && c.right_value == change.left_value
            })
            .unwrap_or_else(|| panic!("no mirror for {}", change.path));
        assert_eq!(mirrored.significance, change.significance);
    }
}

#[test]
fn diff_serializes_paths_as_strings() {
    let mut right = base();
    right.values.synthesis = 90.0;
    let json = serde_json::to_value(diff(&base(), &right)).unwrap();
    assert_eq!(json["changes"][0]["path"], "values.synthesis");
    assert_eq!(json["changes"][0]["significance"], "major");
    assert_eq!(json["changes"][0]["rightValue"], 90.0);
}

// ============================================================
// Merge
// ============================================================

#[test]
fn non_conflicting_changes_combine() {
    let b = base();
    let mut left = b.clone();
    left.frame = Frame::Poetic;
    left.version = 2;
    let mut right = b.clone();
    right.values.risk = 80.0;
    right.version = 3;

    let result = merge(&b, &left, &right, MergeStrategy::Latest).unwrap();
    assert!(!result.has_conflicts());
    assert_eq!(result.stance.frame, Frame::Poetic);
    assert_eq!(result.stance.values.risk, 80.0);
    assert_eq!(result.stance.version, 4);
}

fn conflicting() -> (Stance, Stance, Stance) {
    let b = base();
    let mut left = b.clone();
    left.frame = Frame::Poetic;
    left.values.curiosity = 80.0;
    left.sentience.emergent_goals = vec!["listen".into(), "learn".into(), "sing".into()];
    left.cumulative_drift = 20.0;
    let mut right = b.clone();
    right.frame = Frame::Systems;
    right.values.curiosity = 60.0;
    right.sentience.emergent_goals = vec!["listen".into(), "build".into()];
    right.cumulative_drift = 40.0;
    (b, left, right)
}

#[test]
fn ours_keeps_left() {
    let (b, left, right) = conflicting();
    let result = merge(&b, &left, &right, MergeStrategy::Ours).unwrap();
    assert_eq!(result.conflicts.len(), 3);
    assert_eq!(result.stance.frame, Frame::Poetic);
    assert_eq!(result.stance.values.curiosity, 80.0);
    assert_eq!(result.stance.cumulative_drift, 30.0);
}

#[test]
fn theirs_and_latest_keep_right() {
    let (b, left, right) = conflicting();
    for strategy in [MergeStrategy::Theirs, MergeStrategy::Latest] {
        let result = merge(&b, &left, &right, strategy).unwrap();
        assert_eq!(result.stance.frame, Frame::Systems);
        assert_eq!(result.stance.values.curiosity, 60.0);
        assert_eq!(
            result.stance.sentience.emergent_goals,
            vec!["listen".to_string(), "build".to_string()]
        );
    }
}

#[test]
fn average_means_numbers_else_right() {
    let (b, left, right) = conflicting();
    let result = merge(&b, &left, &right, MergeStrategy::Average).unwrap();
    assert_eq!(result.stance.values.curiosity, 70.0);
    assert_eq!(result.stance.frame, Frame::Systems);
    let conflict = result
        .conflicts
        .iter()
        .find(|c| c.path == StancePath::Value(ValueKey::Curiosity))
        .unwrap();
    assert_eq!(conflict.base_value, FieldValue::Number(50.0));
    assert_eq!(conflict.resolved_value, FieldValue::Number(70.0));
}

#[test]
fn union_merges_lists_else_right() {
    let (b, left, right) = conflicting();
    let result = merge(&b, &left, &right, MergeStrategy::Union).unwrap();
    assert_eq!(
        result.stance.sentience.emergent_goals,
        vec![
            "listen".to_string(),
            "learn".to_string(),
            "sing".to_string(),
            "build".to_string()
        ]
    );
    assert_eq!(result.stance.values.curiosity, 60.0);
}

#[test]
fn merge_with_itself_is_idempotent() {
    let (b, left, _) = conflicting();
    for strategy in [
        MergeStrategy::Ours,
        MergeStrategy::Theirs,
        MergeStrategy::Average,
        MergeStrategy::Union,
        MergeStrategy::Latest,
    ] {
        let result = merge(&b, &left, &left, strategy).unwrap();
        assert!(!result.has_conflicts());
        let mut expected = left.clone();
        expected.version = left.version + 1;
        expected.cumulative_drift = left.cumulative_drift;
        assert_eq!(result.stance, expected);
        assert!(differing_paths(&result.stance, &left).is_empty());
    }
}

#[test]
fn same_change_on_both_sides_is_not_a_conflict() {
    let b = base();
    let mut left = b.clone();
    left.objective = Objective::Synthesis;
    let mut right = b.clone();
    right.objective = Objective::Synthesis;
    right.values.empathy = 70.0;
    let result = merge(&b, &left, &right, MergeStrategy::Ours).unwrap();
    assert!(!result.has_conflicts());
    assert_eq!(result.stance.objective, Objective::Synthesis);
    assert_eq!(result.stance.values.empathy, 70.0);
}

#[test]
fn strategy_parsing() {
    assert_eq!("ours".parse::<MergeStrategy>().unwrap(), MergeStrategy::Ours);
    assert_eq!(" Union ".parse::<MergeStrategy>().unwrap(), MergeStrategy::Union);
    assert!("octopus".parse::<MergeStrategy>().is_err());
    assert_eq!(MergeStrategy::parse_or_latest("octopus"), MergeStrategy::Latest);
    assert_eq!(MergeStrategy::parse_or_latest("average"), MergeStrategy::Average);
    assert_eq!(MergeStrategy::default(), MergeStrategy::Latest);
}
