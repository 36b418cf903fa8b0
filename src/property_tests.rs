//! Property-based tests for the permission store.
//!
//! These use `proptest` to verify the cache-invalidation and deduplication
//! invariants under arbitrary sequences of writes.

#[cfg(test)]
mod tests {
    use crate::{
        cache::{CacheService, PERMISSIONS_NAMESPACE},
        core::PermissionStore,
        permission::Decision,
        subject::SubjectRef,
    };
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashSet;

    /// Generate controller-style action paths.
    fn action_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("controllers/Posts".to_string()),
            Just("controllers/Users".to_string()),
            Just("controllers/Settings".to_string()),
            Just("controllers/AclActions".to_string()),
            prop::string::string_regex("controllers/[A-Z][a-zA-Z]{0,12}").unwrap(),
        ]
    }

    /// Generate role identifiers drawn from a small pool so writes collide.
    fn role_strategy() -> impl Strategy<Value = i64> {
        1i64..=4
    }

    fn decision_strategy() -> impl Strategy<Value = Decision> {
        prop_oneof![
            Just(Decision::Allow),
            Just(Decision::Deny),
            Just(Decision::Inherit),
        ]
    }

    fn write_sequence_strategy() -> impl Strategy<Value = Vec<(i64, String, Decision)>> {
        prop::collection::vec(
            (role_strategy(), action_strategy(), decision_strategy()),
            1..20,
        )
    }

    fn store_with_roles() -> PermissionStore {
        let store = PermissionStore::new();
        for role_id in 1..=4 {
            store.register_subject(SubjectRef::role(role_id));
        }
        store.register_user(3, &[1, 2]).unwrap();
        store
    }

    proptest! {
        /// Every write clears the permissions namespace, whatever was
        /// cached before it.
        #[test]
        fn any_write_clears_permissions_namespace(writes in write_sequence_strategy()) {
            let mut store = store_with_roles();

            for (role_id, action, decision) in writes {
                store
                    .cache()
                    .write("sentinel", json!("stale"), PERMISSIONS_NAMESPACE)
                    .unwrap();

                let subject = SubjectRef::role(role_id);
                match decision {
                    Decision::Allow => store.allow(&subject, &action).unwrap(),
                    Decision::Deny => store.deny(&subject, &action).unwrap(),
                    Decision::Inherit => store.inherit(&subject, &action).unwrap(),
                }

                prop_assert_eq!(
                    store.cache().read("sentinel", PERMISSIONS_NAMESPACE).unwrap(),
                    None
                );
            }
        }

        /// Allowed-action results never contain duplicates, whatever grants
        /// accumulated beforehand.
        #[test]
        fn allowed_actions_have_no_duplicates(writes in write_sequence_strategy()) {
            let mut store = store_with_roles();

            for (role_id, action, decision) in writes {
                let subject = SubjectRef::role(role_id);
                match decision {
                    Decision::Allow => store.allow(&subject, &action).unwrap(),
                    Decision::Deny => store.deny(&subject, &action).unwrap(),
                    Decision::Inherit => store.inherit(&subject, &action).unwrap(),
                }
            }

            let actions: Vec<_> = store
                .get_allowed_actions_by_user_id(3)
                .unwrap()
                .into_iter()
                .collect();
            let unique: HashSet<_> = actions.iter().cloned().collect();
            prop_assert_eq!(unique.len(), actions.len());
        }

        /// A cached lookup equals the recomputed one: reading twice with no
        /// intervening write returns identical results.
        #[test]
        fn cached_lookup_matches_recomputation(writes in write_sequence_strategy()) {
            let mut store = store_with_roles();

            for (role_id, action, decision) in writes {
                let subject = SubjectRef::role(role_id);
                match decision {
                    Decision::Allow => store.allow(&subject, &action).unwrap(),
                    Decision::Deny => store.deny(&subject, &action).unwrap(),
                    Decision::Inherit => store.inherit(&subject, &action).unwrap(),
                }
            }

            let first = store.get_allowed_actions_by_user_id(3).unwrap();
            let second = store.get_allowed_actions_by_user_id(3).unwrap();
            prop_assert_eq!(&first, &second);

            // And every allowed action resolves to Allow individually.
            for action in &first {
                prop_assert!(store.is_allowed(3, action.as_str()).unwrap());
            }
        }
    }
}
