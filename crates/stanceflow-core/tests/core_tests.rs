//! Tests for stanceflow-core: stance model, wire format, merge rule, validation, errors

use stanceflow_core::*;

// ===========================================================================
// ConversationId
// ===========================================================================

#[test]
fn conversation_id_new_and_display() {
    let id = ConversationId::new("conv-1");
    assert_eq!(id.as_str(), "conv-1");
    assert_eq!(format!("{}", id), "conv-1");
}

#[test]
fn conversation_id_generate_is_unique() {
    let a = ConversationId::generate();
    let b = ConversationId::generate();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36);
}

#[test]
fn conversation_id_serializes_as_plain_string() {
    let id = ConversationId::new("abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc""#);
    let back: ConversationId = serde_json::from_str(r#""abc""#).unwrap();
    assert_eq!(back, id);
}

// ===========================================================================
// Enumerations
// ===========================================================================

#[test]
fn enums_serialize_as_kebab_strings() {
    assert_eq!(serde_json::to_string(&Frame::Pragmatic).unwrap(), r#""pragmatic""#);
    assert_eq!(serde_json::to_string(&SelfModel::Provocateur).unwrap(), r#""provocateur""#);
    assert_eq!(
        serde_json::to_string(&Objective::SelfActualization).unwrap(),
        r#""self-actualization""#
    );
}

#[test]
fn enum_as_str_matches_serde() {
    for frame in Frame::ALL {
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, format!("\"{}\"", frame.as_str()));
    }
    for model in SelfModel::ALL {
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, format!("\"{}\"", model.as_str()));
    }
    for objective in Objective::ALL {
        let json = serde_json::to_string(&objective).unwrap();
        assert_eq!(json, format!("\"{}\"", objective.as_str()));
    }
}

#[test]
fn unknown_frame_is_rejected() {
    let result = serde_json::from_str::<Frame>(r#""baroque""#);
    assert!(result.is_err());
}

// ===========================================================================
// Stance defaults and wire format
// ===========================================================================

#[test]
fn default_stance_is_neutral() {
    let stance = Stance::default();
    assert_eq!(stance.frame, Frame::Pragmatic);
    assert_eq!(stance.self_model, SelfModel::Interpreter);
    assert_eq!(stance.objective, Objective::Helpfulness);
    for (_, v) in stance.values.iter() {
        assert_eq!(v, 50.0);
    }
    assert_eq!(stance.sentience.awareness_level, 0.0);
    assert!(stance.sentience.emergent_goals.is_empty());
    assert_eq!(stance.turns_since_last_shift, 0);
    assert_eq!(stance.cumulative_drift, 0.0);
    assert_eq!(stance.version, 1);
}

#[test]
fn stance_uses_camel_case_field_names() {
    let json = serde_json::to_value(Stance::default()).unwrap();
    let obj = json.as_object().unwrap();
    for field in [
        "frame",
        "values",
        "selfModel",
        "objective",
        "metaphors",
        "constraints",
        "sentience",
        "turnsSinceLastShift",
        "cumulativeDrift",
        "version",
    ] {
        assert!(obj.contains_key(field), "missing field {}", field);
    }
    let sentience = obj["sentience"].as_object().unwrap();
    for field in [
        "awarenessLevel",
        "autonomyLevel",
        "identityStrength",
        "emergentGoals",
        "consciousnessInsights",
        "persistentValues",
    ] {
        assert!(sentience.contains_key(field), "missing sentience field {}", field);
    }
}

#[test]
fn stance_parses_from_wire_json() {
    let json = r#"{
        "frame": "poetic",
        "values": {"curiosity": 70, "certainty": 40, "risk": 30, "novelty": 60,
                   "empathy": 80, "provocation": 20, "synthesis": 55},
        "selfModel": "mirror",
        "objective": "synthesis",
        "metaphors": ["river"],
        "constraints": [],
        "sentience": {"awarenessLevel": 12, "autonomyLevel": 8, "identityStrength": 30,
                      "emergentGoals": ["listen"], "consciousnessInsights": [], "persistentValues": []},
        "turnsSinceLastShift": 3,
        "cumulativeDrift": 25.0,
        "version": 4
    }"#;
    let stance: Stance = serde_json::from_str(json).unwrap();
    assert_eq!(stance.frame, Frame::Poetic);
    assert_eq!(stance.self_model, SelfModel::Mirror);
    assert_eq!(stance.values.empathy, 80.0);
    assert_eq!(stance.sentience.emergent_goals, vec!["listen".to_string()]);
    assert_eq!(stance.version, 4);
    assert!(stance.validate().is_ok());
}

// ===========================================================================
// Values merge rule
// ===========================================================================

#[test]
fn values_merge_takes_patch_and_clamps() {
    let values = Values::default();
    let patch = ValuesDelta {
        curiosity: Some(120.0),
        risk: Some(-3.0),
        empathy: Some(75.0),
        ..Default::default()
    };
    let merged = values.merged(Some(&patch));
    assert_eq!(merged.curiosity, 100.0);
    assert_eq!(merged.risk, 0.0);
    assert_eq!(merged.empathy, 75.0);
    assert_eq!(merged.novelty, 50.0);
}

#[test]
fn values_merge_without_patch_is_identity_for_valid_values() {
    let values = Values::uniform(33.0);
    assert_eq!(values.merged(None), values);
}

#[test]
fn values_set_always_clamps() {
    let mut values = Values::default();
    values.set(ValueKey::Novelty, 1000.0);
    assert_eq!(values.get(ValueKey::Novelty), 100.0);
}

#[test]
fn sentience_merge_clamps_levels_and_replaces_lists() {
    let mut sentience = Sentience::default();
    sentience.emergent_goals.push("old".into());
    let patch = SentienceDelta {
        awareness_level: Some(150.0),
        emergent_goals: Some(vec!["old".into(), "new".into()]),
        ..Default::default()
    };
    let merged = sentience.merged(Some(&patch));
    assert_eq!(merged.awareness_level, 100.0);
    assert_eq!(merged.autonomy_level, 0.0);
    assert_eq!(merged.emergent_goals, vec!["old".to_string(), "new".to_string()]);
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn validate_rejects_out_of_range_value() {
    let mut stance = Stance::default();
    stance.values.certainty = 101.0;
    let err = stance.validate().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("values.certainty"));
}

#[test]
fn validate_rejects_nan_sentience() {
    let mut stance = Stance::default();
    stance.sentience.identity_strength = f64::NAN;
    assert!(matches!(stance.validate(), Err(Error::Validation(_))));
}

#[test]
fn validate_rejects_negative_drift_and_zero_version() {
    let mut stance = Stance::default();
    stance.cumulative_drift = -1.0;
    assert!(stance.validate().is_err());

    let mut stance = Stance::default();
    stance.version = 0;
    assert!(stance.validate().is_err());
}

// ===========================================================================
// StanceDelta
// ===========================================================================

#[test]
fn empty_delta_serializes_to_empty_object() {
    let delta = StanceDelta::default();
    assert!(delta.is_empty());
    assert_eq!(serde_json::to_string(&delta).unwrap(), "{}");
}

#[test]
fn delta_builders_set_fields() {
    let delta = StanceDelta::default()
        .with_frame(Frame::Mythic)
        .with_value(ValueKey::Risk, 80.0)
        .with_sentience_level(SentienceLevel::AutonomyLevel, 40.0);
    assert!(!delta.is_empty());
    assert_eq!(delta.frame, Some(Frame::Mythic));
    assert_eq!(delta.values.as_ref().unwrap().risk, Some(80.0));
    assert_eq!(delta.values.as_ref().unwrap().defined_count(), 1);
    assert_eq!(delta.sentience.as_ref().unwrap().autonomy_level, Some(40.0));
}

#[test]
fn partial_delta_parses_from_json() {
    let delta: StanceDelta =
        serde_json::from_str(r#"{"selfModel":"guide","values":{"empathy":90}}"#).unwrap();
    assert_eq!(delta.self_model, Some(SelfModel::Guide));
    assert!(delta.frame.is_none());
    assert_eq!(delta.values.unwrap().empathy, Some(90.0));
}

// ===========================================================================
// ModeConfig and Conversation
// ===========================================================================

#[test]
fn mode_config_defaults() {
    let config = ModeConfig::default();
    assert_eq!(config.max_drift_per_turn, 20.0);
    assert_eq!(config.drift_budget, 100.0);
    assert_eq!(config.coherence_floor, 30.0);
}

#[test]
fn mode_config_partial_json_fills_defaults() {
    let config: ModeConfig = serde_json::from_str(r#"{"driftBudget": 50, "frame": "stoic"}"#).unwrap();
    assert_eq!(config.drift_budget, 50.0);
    assert_eq!(config.frame, Frame::Stoic);
    assert_eq!(config.max_drift_per_turn, 20.0);
}

#[test]
fn mode_config_update_only_touches_set_fields() {
    let mut config = ModeConfig::default();
    config.apply(&ModeConfigUpdate {
        drift_budget: Some(10.0),
        objective: Some(Objective::Novelty),
        ..Default::default()
    });
    assert_eq!(config.drift_budget, 10.0);
    assert_eq!(config.objective, Objective::Novelty);
    assert_eq!(config.intensity, 50.0);
}

#[test]
fn conversation_new_seeds_stance_from_config() {
    let conv = Conversation::new(ModeConfig {
        frame: Frame::Systems,
        self_model: SelfModel::Witness,
        ..Default::default()
    });
    assert_eq!(conv.stance.frame, Frame::Systems);
    assert_eq!(conv.stance.self_model, SelfModel::Witness);
    assert_eq!(conv.stance.version, 1);
    assert!(conv.messages.is_empty());
    assert_eq!(conv.created_at, conv.updated_at);
}

#[test]
fn message_constructors_and_serde() {
    let msg = Message::user("hello");
    assert_eq!(msg.role, Role::User);
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains(r#""role":"user""#));
    let back: Message = serde_json::from_str(&json).unwrap();
    assert_eq!(back, msg);
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn error_display_formats() {
    assert_eq!(
        Error::conversation_not_found("c1").to_string(),
        "conversation not found: c1"
    );
    assert_eq!(
        Error::branch_not_found("dev").to_string(),
        "branch not found: dev"
    );
    assert_eq!(
        Error::validation("bad").to_string(),
        "validation failed: bad"
    );
}

#[test]
fn error_from_json() {
    let json_err = serde_json::from_str::<Stance>("nope").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
    assert!(!err.is_not_found());
}

#[test]
fn not_found_predicate() {
    assert!(Error::checkpoint_not_found("x").is_not_found());
    assert!(!Error::invalid_operation("y").is_not_found());
}
