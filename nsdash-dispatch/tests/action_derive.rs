//! Tests for #[derive(Action)] macro

#![allow(dead_code)]

use nsdash_dispatch::{Action, ActionCategory};

#[derive(Action, Clone, Debug)]
#[action(infer_categories)]
enum TestAction {
    StatsFetch,
    StatsDidLoad(Vec<String>),
    StatsDidError { message: String },
    SpeciesLociFetch { species: String },
    #[action(category = "auth")]
    SessionExpired,
    #[action(skip_category)]
    AuthReset,
    Quit,
}

#[test]
fn test_name_matches_variant() {
    assert_eq!(TestAction::StatsFetch.name(), "StatsFetch");
    assert_eq!(TestAction::StatsDidLoad(vec![]).name(), "StatsDidLoad");
    assert_eq!(
        TestAction::StatsDidError {
            message: "boom".into()
        }
        .name(),
        "StatsDidError"
    );
}

#[test]
fn test_category_inferred_from_leading_word() {
    assert_eq!(TestAction::StatsFetch.category(), Some("stats"));
    assert_eq!(TestAction::StatsDidLoad(vec![]).category(), Some("stats"));
    assert_eq!(
        TestAction::SpeciesLociFetch {
            species: "1".into()
        }
        .category(),
        Some("species")
    );
    assert_eq!(TestAction::Quit.category(), None);
}

#[test]
fn test_category_overrides() {
    assert_eq!(TestAction::SessionExpired.category(), Some("auth"));
    assert_eq!(TestAction::AuthReset.category(), None);
}

#[test]
fn test_category_predicates() {
    assert!(TestAction::StatsFetch.is_stats());
    assert!(!TestAction::StatsFetch.is_species());
    assert!(TestAction::SessionExpired.is_auth());
    assert!(!TestAction::AuthReset.is_auth());
}

#[test]
fn test_trait_category_matches_inherent() {
    fn via_trait<A: ActionCategory>(action: &A) -> Option<&'static str> {
        ActionCategory::category(action)
    }
    assert_eq!(via_trait(&TestAction::StatsFetch), Some("stats"));
    assert_eq!(via_trait(&TestAction::Quit), None);
}
