//! Property tests for the connection surface.

use ormkv_codec::Value;
use ormkv_core::{Connection, ListOptions, OrmError, OrmResult, ReadConnection};
use ormkv_storage::InMemoryBackend;
use ormkv_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn get_after_insert_by_every_unique_index(users in distinct_users_strategy(24)) {
        let schema = user_schema();
        let backend = with_memory_connection(&schema, |conn| {
            for user in &users {
                conn.insert(user).unwrap();
            }
        });
        let conn = ReadConnection::new(&schema, &backend);
        for user in &users {
            let by_id: Option<User> = conn.get(&fields("id"), &[Value::Unsigned(user.id)]).unwrap();
            prop_assert_eq!(by_id.as_ref(), Some(user));
            let by_email: Option<User> = conn
                .get(&fields("email"), &[Value::from(user.email.as_str())])
                .unwrap();
            prop_assert_eq!(by_email.as_ref(), Some(user));
        }
    }

    #[test]
    fn list_returns_every_record_once(users in distinct_users_strategy(40)) {
        let schema = user_schema();
        let backend = with_memory_connection(&schema, |conn| {
            for user in &users {
                conn.save(user).unwrap();
            }
        });
        let listed: Vec<User> = ReadConnection::new(&schema, &backend)
            .list(ListOptions::<User>::new())
            .unwrap()
            .collect::<OrmResult<_>>()
            .unwrap();
        let mut expected = users.clone();
        expected.sort_by_key(|user| user.id);
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn paged_list_matches_full_list(users in distinct_users_strategy(30), limit in 1usize..7) {
        let schema = user_schema();
        let backend = with_memory_connection(&schema, |conn| {
            for user in &users {
                conn.save(user).unwrap();
            }
        });
        let conn = ReadConnection::new(&schema, &backend);

        let mut paged = Vec::new();
        let mut options = ListOptions::<User>::new().limit(limit);
        loop {
            let page = conn.list(options).unwrap().collect_page().unwrap();
            prop_assert!(page.records.len() <= limit);
            paged.extend(page.records);
            match page.next_cursor {
                Some(cursor) => options = ListOptions::new().limit(limit).cursor(cursor),
                None => break,
            }
        }
        let ids: Vec<u64> = paged.iter().map(|user| user.id).collect();
        let mut expected: Vec<u64> = users.iter().map(|user| user.id).collect();
        expected.sort_unstable();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(backend.open_iterators(), 0);
    }

    #[test]
    fn has_agrees_with_get(users in distinct_users_strategy(12), probe in 0u64..1_000) {
        let schema = user_schema();
        let backend = with_memory_connection(&schema, |conn| {
            for user in &users {
                conn.insert(user).unwrap();
            }
        });
        let conn = ReadConnection::new(&schema, &backend);
        let key = [Value::Unsigned(probe)];
        let got: Option<User> = conn.get(&fields("id"), &key).unwrap();
        prop_assert_eq!(conn.has::<User>(&fields("id"), &key).unwrap(), got.is_some());
    }

    #[test]
    fn unmatched_field_set_fails_regardless_of_values(values in value_list_strategy()) {
        let schema = user_schema();
        let backend = InMemoryBackend::new();
        let conn = ReadConnection::new(&schema, &backend);
        let result = conn.get::<User>(&fields("name"), &values);
        prop_assert!(matches!(result, Err(OrmError::IndexNotFound { .. })), "expected IndexNotFound, got {:?}", result);
        let result = conn.has::<User>(&fields("id,name"), &values);
        prop_assert!(matches!(result, Err(OrmError::IndexNotFound { .. })), "expected IndexNotFound, got {:?}", result);
    }

    #[test]
    fn delete_then_get_is_none(user in user_strategy()) {
        let schema = user_schema();
        let mut backend = InMemoryBackend::new();
        let mut conn = Connection::new(&schema, &mut backend);
        conn.insert(&user).unwrap();
        conn.delete(&user).unwrap();
        let got: Option<User> = conn.get(&fields("id"), &[Value::Unsigned(user.id)]).unwrap();
        prop_assert_eq!(got, None);
        prop_assert!(conn.delete(&user).is_ok());
        prop_assert!(backend.is_empty());
    }

    #[test]
    fn operation_sequences_match_model(ops in user_ops_strategy(40)) {
        let mut harness = UserHarness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.verify_all();
    }
}
