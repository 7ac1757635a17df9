// SPDX-License-Identifier: MIT OR Apache-2.0
use gitgov_factory::ids::{generate_task_id, id_timestamp, slugify, validate_actor_id, validate_timestamped_id};
use proptest::prelude::*;

proptest! {
    #[test]
    fn slugify_is_idempotent(text in ".*") {
        let once = slugify(&text);
        let twice = slugify(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn slugify_never_empty_or_over_60_chars(text in ".*") {
        let slug = slugify(&text);
        prop_assert!(!slug.is_empty());
        prop_assert!(slug.len() <= 60);
    }

    #[test]
    fn slugify_only_lowercase_alphanumeric_and_dashes(text in ".*") {
        let slug = slugify(&text);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    }

    #[test]
    fn task_id_round_trips_through_validation(title in ".*", epoch in 1i64..4_102_444_800) {
        let id = generate_task_id(&title, epoch);
        let parsed = validate_timestamped_id(&id, "task").unwrap();
        prop_assert_eq!(parsed, epoch);
        prop_assert_eq!(id_timestamp(&id), Some(epoch));
    }

    #[test]
    fn task_id_rejected_under_wrong_kind(title in ".*", epoch in 1i64..4_102_444_800) {
        let id = generate_task_id(&title, epoch);
        prop_assert!(validate_timestamped_id(&id, "cycle").is_err());
    }

    #[test]
    fn actor_id_validation_matches_type_colon_slug_shape(
        actor_type in prop::sample::select(vec!["human", "agent"]),
        name in "[a-zA-Z0-9 ]{1,30}",
    ) {
        let id = format!("{actor_type}:{}", slugify(&name));
        prop_assert!(validate_actor_id(&id).is_ok());
    }

    #[test]
    fn actor_id_rejects_unknown_type_prefix(prefix in "[a-z]{1,10}", name in "[a-zA-Z0-9]{1,20}") {
        prop_assume!(prefix != "human" && prefix != "agent");
        let id = format!("{prefix}:{}", slugify(&name));
        prop_assert!(validate_actor_id(&id).is_err());
    }
}
