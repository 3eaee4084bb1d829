// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `readiness.rs`
//!
//! The snapshot space is small (64 combinations), so the derivation rules are
//! checked exhaustively in addition to the named scenarios.

#[cfg(test)]
mod tests {
    use crate::crd::Condition;
    use crate::readiness::{derive, materialize, DerivedFlags, ReadinessSnapshot};
    use crate::status_reasons::{
        ConditionType, CONDITION_TYPE_CONFIG_NOT_AVAILABLE,
        CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT, CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT,
        PENDING_DEPROVISIONING_MSG, REASON_ALL_COMPONENTS_READY,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap()
    }

    fn all_snapshots() -> Vec<ReadinessSnapshot> {
        (0u8..64)
            .map(|bits| ReadinessSnapshot {
                controller_available: bits & 0b00_0001 != 0,
                webhook_available: bits & 0b00_0010 != 0,
                controller_up_to_date: bits & 0b00_0100 != 0,
                webhook_up_to_date: bits & 0b00_1000 != 0,
                config_registered: bits & 0b01_0000 != 0,
                deprovisioning: bits & 0b10_0000 != 0,
            })
            .collect()
    }

    fn all_ready() -> ReadinessSnapshot {
        ReadinessSnapshot {
            controller_available: true,
            webhook_available: true,
            controller_up_to_date: true,
            webhook_up_to_date: true,
            config_registered: true,
            deprovisioning: false,
        }
    }

    fn get<'a>(conditions: &'a [Condition], condition_type: ConditionType) -> &'a Condition {
        conditions
            .iter()
            .find(|c| c.r#type == condition_type.as_str())
            .unwrap()
    }

    fn reason(condition: &Condition) -> &str {
        condition.reason.as_deref().unwrap()
    }

    fn message(condition: &Condition) -> &str {
        condition.message.as_deref().unwrap()
    }

    // ============================================================================
    // Derivation rules (exhaustive)
    // ============================================================================

    #[test]
    fn test_flags_follow_rules_for_every_snapshot() {
        for s in all_snapshots() {
            let f = DerivedFlags::from_snapshot(&s);
            assert_eq!(
                f.controller_not_ready,
                !s.controller_available || !s.controller_up_to_date,
                "{s:?}"
            );
            assert_eq!(
                f.webhook_not_ready,
                !s.webhook_available || !s.webhook_up_to_date,
                "{s:?}"
            );
            assert_eq!(f.config_not_available, !s.config_registered, "{s:?}");
            assert_eq!(
                f.available,
                s.config_registered && s.webhook_available && s.controller_available,
                "{s:?}"
            );
            assert_eq!(f.degraded, !f.available && !s.deprovisioning, "{s:?}");
            assert_eq!(
                f.can_register_config,
                s.webhook_available && s.controller_available && !s.deprovisioning,
                "{s:?}"
            );
            assert_eq!(
                f.progressing,
                (!s.controller_up_to_date || !s.webhook_up_to_date || !s.config_registered)
                    && !s.deprovisioning,
                "{s:?}"
            );
            assert_eq!(f.deprovisioning, s.deprovisioning, "{s:?}");
        }
    }

    #[test]
    fn test_available_and_degraded_never_both_true() {
        for s in all_snapshots() {
            let f = derive(&s).flags;
            assert!(!(f.available && f.degraded), "{s:?}");
        }
    }

    #[test]
    fn test_deprovisioning_suppresses_degraded_progressing_and_registration() {
        for s in all_snapshots().into_iter().filter(|s| s.deprovisioning) {
            let f = derive(&s).flags;
            assert!(!f.degraded, "{s:?}");
            assert!(!f.progressing, "{s:?}");
            assert!(!f.can_register_config, "{s:?}");

            let report = derive(&s);
            assert!(message(get(&report.conditions, ConditionType::Deprovisioning))
                .ends_with(PENDING_DEPROVISIONING_MSG));
        }
    }

    #[test]
    fn test_exactly_one_of_available_and_degraded_when_not_deprovisioning() {
        for s in all_snapshots().into_iter().filter(|s| !s.deprovisioning) {
            let f = derive(&s).flags;
            assert!(f.available ^ f.degraded, "{s:?}");
        }
    }

    #[test]
    fn test_available_implies_can_register_unless_deprovisioning() {
        for s in all_snapshots() {
            let f = derive(&s).flags;
            if f.available && !s.deprovisioning {
                assert!(f.can_register_config, "{s:?}");
            }
        }
    }

    #[test]
    fn test_up_to_date_never_affects_availability() {
        for s in all_snapshots() {
            let stale = ReadinessSnapshot {
                controller_up_to_date: false,
                webhook_up_to_date: false,
                ..s
            };
            assert_eq!(derive(&s).flags.available, derive(&stale).flags.available);
        }
    }

    #[test]
    fn test_every_report_has_seven_conditions_in_fixed_order() {
        for s in all_snapshots() {
            let report = derive(&s);
            let types: Vec<&str> = report.conditions.iter().map(|c| c.r#type.as_str()).collect();
            let expected: Vec<&str> = ConditionType::ALL.iter().map(|t| t.as_str()).collect();
            assert_eq!(types, expected);
            assert!(report.conditions.iter().all(|c| c.last_transition_time.is_none()));
        }
    }

    #[test]
    fn test_condition_status_mirrors_flag() {
        for s in all_snapshots() {
            let report = derive(&s);
            let f = report.flags;
            let expect = |t: ConditionType, v: bool| {
                assert_eq!(
                    get(&report.conditions, t).status,
                    if v { "True" } else { "False" },
                    "{t} for {s:?}"
                );
            };
            expect(ConditionType::Available, f.available);
            expect(ConditionType::Progressing, f.progressing);
            expect(ConditionType::Degraded, f.degraded);
            expect(ConditionType::Deprovisioning, f.deprovisioning);
            expect(ConditionType::ControllerNotRolledOut, f.controller_not_ready);
            expect(ConditionType::WebhookNotRolledOut, f.webhook_not_ready);
            expect(ConditionType::ConfigNotAvailable, f.config_not_available);
        }
    }

    #[test]
    fn test_derive_is_deterministic() {
        for s in all_snapshots() {
            assert_eq!(derive(&s), derive(&s));
        }
    }

    // ============================================================================
    // Composite reason
    // ============================================================================

    #[test]
    fn test_composite_reason_all_ready() {
        let flags = derive(&all_ready()).flags;
        assert!(flags.reason_tokens().is_empty());
        assert_eq!(flags.composite_reason(), REASON_ALL_COMPONENTS_READY);
    }

    #[test]
    fn test_composite_reason_keeps_token_order() {
        let flags = derive(&ReadinessSnapshot::default()).flags;
        assert_eq!(
            flags.reason_tokens(),
            vec![
                CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT,
                CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT,
                CONDITION_TYPE_CONFIG_NOT_AVAILABLE,
            ]
        );
        assert_eq!(
            flags.composite_reason(),
            "PodPlacementControllerNotRolledOut,PodPlacementWebhookNotRolledOut,MutatingWebhookConfigurationNotAvailable"
        );
    }

    #[test]
    fn test_composite_reason_single_token_has_no_separator() {
        let s = ReadinessSnapshot {
            webhook_up_to_date: false,
            ..all_ready()
        };
        assert_eq!(
            derive(&s).flags.composite_reason(),
            CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT
        );
    }

    #[test]
    fn test_composite_reason_shared_by_available_progressing_and_config() {
        for s in all_snapshots() {
            let report = derive(&s);
            let expected = report.flags.composite_reason();
            assert_eq!(reason(get(&report.conditions, ConditionType::Available)), expected);
            assert_eq!(reason(get(&report.conditions, ConditionType::Progressing)), expected);
            assert_eq!(
                reason(get(&report.conditions, ConditionType::ConfigNotAvailable)),
                expected
            );
        }
    }

    // ============================================================================
    // Scenarios
    // ============================================================================

    #[test]
    fn test_scenario_components_ready_config_missing() {
        let s = ReadinessSnapshot {
            config_registered: false,
            ..all_ready()
        };
        let report = derive(&s);
        let f = report.flags;

        assert!(!f.available);
        assert!(f.degraded);
        assert!(f.progressing);
        assert!(f.can_register_config);
        assert!(!f.controller_not_ready);
        assert!(!f.webhook_not_ready);
        assert!(f.config_not_available);

        let available = get(&report.conditions, ConditionType::Available);
        assert_eq!(available.status, "False");
        assert_eq!(reason(available), CONDITION_TYPE_CONFIG_NOT_AVAILABLE);
        assert_eq!(
            message(available),
            "The pod placement operand is not ready. We cannot gate and place pods."
        );
    }

    #[test]
    fn test_scenario_everything_ready() {
        let report = derive(&all_ready());
        let f = report.flags;

        assert!(f.available);
        assert!(!f.degraded);
        assert!(!f.progressing);
        assert!(f.can_register_config);

        let available = get(&report.conditions, ConditionType::Available);
        assert_eq!(available.status, "True");
        assert_eq!(reason(available), REASON_ALL_COMPONENTS_READY);
        assert_eq!(
            message(available),
            "The pod placement operand is ready. We can gate and place pods."
        );

        let degraded = get(&report.conditions, ConditionType::Degraded);
        assert_eq!(degraded.status, "False");
        assert_eq!(reason(degraded), "NotDegraded");
        assert_eq!(message(degraded), "The pod placement operand is not degraded.");

        let deprovisioning = get(&report.conditions, ConditionType::Deprovisioning);
        assert_eq!(deprovisioning.status, "False");
        assert_eq!(reason(deprovisioning), "NotDeprovisioning");
        assert_eq!(
            message(deprovisioning),
            "The pod placement operand is not being deprovisioned."
        );
    }

    #[test]
    fn test_scenario_controller_down() {
        let s = ReadinessSnapshot {
            controller_available: false,
            ..all_ready()
        };
        let report = derive(&s);
        let f = report.flags;

        assert!(!f.available);
        assert!(f.degraded);
        assert!(!f.progressing);
        assert!(!f.can_register_config);
        assert!(f.controller_not_ready);

        assert_eq!(
            reason(get(&report.conditions, ConditionType::Available)),
            CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT
        );
        let controller = get(&report.conditions, ConditionType::ControllerNotRolledOut);
        assert_eq!(controller.status, "True");
        assert_eq!(reason(controller), "PodPlacementControllerNotReady");
        assert_eq!(
            message(controller),
            "The pod placement controller is not fully rolled out."
        );
    }

    #[test]
    fn test_scenario_deprovisioning_with_everything_running() {
        let s = ReadinessSnapshot {
            deprovisioning: true,
            ..all_ready()
        };
        let report = derive(&s);
        let f = report.flags;

        assert!(f.available);
        assert!(!f.degraded);
        assert!(!f.progressing);
        assert!(!f.can_register_config);
        assert_eq!(f.composite_reason(), REASON_ALL_COMPONENTS_READY);

        let deprovisioning = get(&report.conditions, ConditionType::Deprovisioning);
        assert_eq!(deprovisioning.status, "True");
        assert_eq!(reason(deprovisioning), "Deprovisioning");
        assert_eq!(
            message(deprovisioning),
            format!("The pod placement operand is being deprovisioned. {PENDING_DEPROVISIONING_MSG}")
        );
    }

    #[test]
    fn test_scenario_deprovisioning_with_nothing_left() {
        let s = ReadinessSnapshot {
            deprovisioning: true,
            ..ReadinessSnapshot::default()
        };
        let report = derive(&s);
        let f = report.flags;

        assert!(!f.available);
        assert!(!f.degraded);
        assert!(!f.progressing);
        assert!(!f.can_register_config);
        assert_eq!(
            get(&report.conditions, ConditionType::Deprovisioning).status,
            "True"
        );
        assert_eq!(get(&report.conditions, ConditionType::Degraded).status, "False");
    }

    #[test]
    fn test_scenario_rolling_update_keeps_availability() {
        let s = ReadinessSnapshot {
            controller_up_to_date: false,
            ..all_ready()
        };
        let report = derive(&s);
        let f = report.flags;

        assert!(f.available);
        assert!(f.progressing);
        assert!(!f.degraded);
        assert!(f.controller_not_ready);
        assert_eq!(
            reason(get(&report.conditions, ConditionType::Progressing)),
            CONDITION_TYPE_CONTROLLER_NOT_ROLLED_OUT
        );
        assert_eq!(
            message(get(&report.conditions, ConditionType::Progressing)),
            "The pod placement operand is progressing."
        );
    }

    #[test]
    fn test_webhook_rollout_reason_and_message() {
        let ready = derive(&all_ready());
        let webhook = get(&ready.conditions, ConditionType::WebhookNotRolledOut);
        assert_eq!(webhook.status, "False");
        assert_eq!(reason(webhook), "PodPlacementWebhookReady");
        assert_eq!(message(webhook), "The pod placement webhook is fully rolled out.");

        let down = derive(&ReadinessSnapshot {
            webhook_available: false,
            ..all_ready()
        });
        let webhook = get(&down.conditions, ConditionType::WebhookNotRolledOut);
        assert_eq!(webhook.status, "True");
        assert_eq!(reason(webhook), "PodPlacementWebhookNotReady");
    }

    #[test]
    fn test_config_condition_message() {
        let missing = derive(&ReadinessSnapshot {
            config_registered: false,
            ..all_ready()
        });
        assert_eq!(
            message(get(&missing.conditions, ConditionType::ConfigNotAvailable)),
            "The mutating webhook configuration is not available."
        );

        let present = derive(&all_ready());
        assert_eq!(
            message(get(&present.conditions, ConditionType::ConfigNotAvailable)),
            "The mutating webhook configuration is available."
        );
    }

    // ============================================================================
    // Materialization
    // ============================================================================

    #[test]
    fn test_materialize_into_empty_stamps_every_condition() {
        let conditions = materialize(&[], &derive(&all_ready()), t0());
        assert_eq!(conditions.len(), 7);
        assert!(conditions
            .iter()
            .all(|c| c.last_transition_time.as_deref() == Some("2025-01-01T00:00:00Z")));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let report = derive(&all_ready());
        let first = materialize(&[], &report, t0());
        let second = materialize(&first, &report, t1());
        assert_eq!(first, second);
    }

    #[test]
    fn test_materialize_moves_timestamps_only_for_flipped_conditions() {
        let first = materialize(&[], &derive(&all_ready()), t0());
        let controller_down = derive(&ReadinessSnapshot {
            controller_available: false,
            ..all_ready()
        });
        let second = materialize(&first, &controller_down, t1());

        let stamp = |c: &[Condition], t| get(c, t).last_transition_time.clone().unwrap();
        let later = "2025-01-01T00:05:00Z";
        let earlier = "2025-01-01T00:00:00Z";

        assert_eq!(stamp(&second, ConditionType::Available), later);
        assert_eq!(stamp(&second, ConditionType::Degraded), later);
        assert_eq!(stamp(&second, ConditionType::ControllerNotRolledOut), later);
        assert_eq!(stamp(&second, ConditionType::Progressing), earlier);
        assert_eq!(stamp(&second, ConditionType::Deprovisioning), earlier);
        assert_eq!(stamp(&second, ConditionType::WebhookNotRolledOut), earlier);
        assert_eq!(stamp(&second, ConditionType::ConfigNotAvailable), earlier);
    }

    #[test]
    fn test_materialize_refreshes_reason_without_moving_timestamp() {
        // Progressing stays True while its reason changes
        let first = materialize(
            &[],
            &derive(&ReadinessSnapshot {
                controller_up_to_date: false,
                ..all_ready()
            }),
            t0(),
        );
        let second = materialize(
            &first,
            &derive(&ReadinessSnapshot {
                webhook_up_to_date: false,
                ..all_ready()
            }),
            t1(),
        );

        let progressing = get(&second, ConditionType::Progressing);
        assert_eq!(progressing.status, "True");
        assert_eq!(reason(progressing), CONDITION_TYPE_WEBHOOK_NOT_ROLLED_OUT);
        assert_eq!(
            progressing.last_transition_time.as_deref(),
            Some("2025-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_materialize_keeps_foreign_conditions() {
        let foreign = Condition {
            r#type: "Upgradeable".to_string(),
            status: "True".to_string(),
            reason: Some("AsExpected".to_string()),
            message: None,
            last_transition_time: Some("2024-06-01T00:00:00Z".to_string()),
        };
        let conditions = materialize(std::slice::from_ref(&foreign), &derive(&all_ready()), t0());

        assert_eq!(conditions.len(), 8);
        assert_eq!(conditions[0], foreign);
    }
}
