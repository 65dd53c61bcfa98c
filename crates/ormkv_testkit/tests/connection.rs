//! Integration tests for the connection surface.

use ormkv_codec::Value;
use ormkv_core::{Config, Connection, ListOptions, OrmError, ReadConnection, SaveMode};
use ormkv_storage::InMemoryBackend;
use ormkv_testkit::prelude::*;

#[test]
fn user_directory_scenario() {
    let schema = user_schema();
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);

    let alice = User::new(1, "a@x.com");
    conn.insert(&alice).unwrap();

    let by_id: Option<User> = conn.get(&fields("id"), &[Value::Unsigned(1)]).unwrap();
    assert_eq!(by_id, Some(alice.clone()));
    let by_email: Option<User> = conn.get(&fields("email"), &[Value::from("a@x.com")]).unwrap();
    assert_eq!(by_email, Some(alice));

    let err = conn.insert(&User::new(1, "b@x.com")).unwrap_err();
    assert!(matches!(err, OrmError::AlreadyExists { .. }), "{err}");

    let err = conn.update(&User::new(2, "c@x.com")).unwrap_err();
    assert!(matches!(err, OrmError::NotFound { .. }), "{err}");

    conn.delete(&User::new(1, "a@x.com")).unwrap();
    let gone: Option<User> = conn.get(&fields("id"), &[Value::Unsigned(1)]).unwrap();
    assert_eq!(gone, None);
}

#[test]
fn save_succeeds_whether_present_or_absent() {
    let schema = user_schema();
    let backend = with_memory_connection(&schema, |conn| {
        conn.save(&User::new(1, "a@x.com")).unwrap();
        conn.save(&User::new(1, "b@x.com")).unwrap();
    });
    let conn = ReadConnection::new(&schema, &backend);
    let user: User = conn
        .get(&fields("id"), &[Value::Unsigned(1)])
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "b@x.com");
    assert!(!conn
        .has::<User>(&fields("email"), &[Value::from("a@x.com")])
        .unwrap());
    assert_eq!(backend.len(), ENTRIES_PER_USER);
}

#[test]
fn has_and_get_agree() {
    let schema = user_schema();
    let backend = scenarios::populated_users(&schema, 4);
    let conn = ReadConnection::new(&schema, &backend);
    for id in 0..6u64 {
        let key = [Value::Unsigned(id)];
        let got: Option<User> = conn.get(&fields("id"), &key).unwrap();
        assert_eq!(conn.has::<User>(&fields("id"), &key).unwrap(), got.is_some());
    }
    for email in ["user2@example.com", "nobody@example.com"] {
        let key = [Value::from(email)];
        let got: Option<User> = conn.get(&fields("email"), &key).unwrap();
        assert_eq!(conn.has::<User>(&fields("email"), &key).unwrap(), got.is_some());
    }
}

#[test]
fn unmatched_field_set_is_index_not_found() {
    let schema = user_schema();
    let backend = scenarios::populated_users(&schema, 2);
    let conn = ReadConnection::new(&schema, &backend);

    for (list, values) in [
        ("name", vec![Value::from("name1")]),
        ("id,email", vec![Value::Unsigned(1), Value::from("user1@example.com")]),
        ("nickname", vec![Value::from("x")]),
        ("email,name", vec![]),
    ] {
        let err = conn.get::<User>(&fields(list), &values).unwrap_err();
        match err {
            OrmError::IndexNotFound {
                type_name,
                fields: requested,
            } => {
                assert_eq!(type_name, "testkit.User");
                assert_eq!(requested, list);
            }
            other => panic!("{list}: unexpected error {other}"),
        }
        assert!(matches!(
            conn.has::<User>(&fields(list), &values),
            Err(OrmError::IndexNotFound { .. })
        ));
    }
}

#[test]
fn unregistered_type_is_table_not_found() {
    let schema = user_schema();
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);
    let record = Unregistered { id: 1 };
    assert!(matches!(conn.save(&record), Err(OrmError::TableNotFound { .. })));
    assert!(matches!(conn.delete(&record), Err(OrmError::TableNotFound { .. })));
    assert!(matches!(
        conn.has::<Unregistered>(&fields("id"), &[Value::Unsigned(1)]),
        Err(OrmError::TableNotFound { .. })
    ));
}

#[test]
fn lookup_values_follow_field_order() {
    let schema = blog_schema();
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);
    let post = Post::new(7, 3, "hello");
    conn.insert(&post).unwrap();

    let forward: Option<Post> = conn
        .get(&fields("author,id"), &[Value::Unsigned(7), Value::Unsigned(3)])
        .unwrap();
    let swapped: Option<Post> = conn
        .get(&fields("id,author"), &[Value::Unsigned(3), Value::Unsigned(7)])
        .unwrap();
    assert_eq!(forward, Some(post.clone()));
    assert_eq!(swapped, Some(post));

    let err = conn
        .get::<Post>(&fields("author,id"), &[Value::Unsigned(7)])
        .unwrap_err();
    assert!(matches!(err, OrmError::ArityMismatch { expected: 2, actual: 1, .. }));

    let err = conn
        .get::<Post>(&fields("author,id"), &[Value::from("7"), Value::Unsigned(3)])
        .unwrap_err();
    assert!(matches!(err, OrmError::ValueKindMismatch { .. }));
}

#[test]
fn unique_index_rejects_second_owner() {
    let schema = user_schema();
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);
    conn.insert(&User::new(1, "a@x.com")).unwrap();

    let err = conn.insert(&User::new(2, "a@x.com")).unwrap_err();
    assert!(matches!(err, OrmError::UniqueKeyViolation { .. }), "{err}");
    let missing: Option<User> = conn.get(&fields("id"), &[Value::Unsigned(2)]).unwrap();
    assert_eq!(missing, None);

    // the owner itself may keep its key
    conn.update(&User::named(1, "a@x.com", "ann")).unwrap();
}

#[test]
fn delete_is_idempotent_by_default() {
    let schema = user_schema();
    let backend = with_memory_connection(&schema, |conn| {
        conn.insert(&User::named(1, "a@x.com", "ann")).unwrap();
        conn.delete(&User::new(1, "")).unwrap();
        conn.delete(&User::new(1, "")).unwrap();
        conn.delete(&User::new(99, "")).unwrap();
    });
    assert!(backend.is_empty());
}

#[test]
fn strict_delete_reports_missing_records() {
    let schema = user_schema_with(Config::new().strict_delete(true));
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);
    conn.insert(&User::new(1, "a@x.com")).unwrap();
    conn.delete(&User::new(1, "")).unwrap();
    let err = conn.delete(&User::new(1, "")).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn save_with_explicit_mode() {
    let schema = user_schema();
    let mut backend = InMemoryBackend::new();
    let mut conn = Connection::new(&schema, &mut backend);
    conn.save_with(&User::new(1, "a@x.com"), SaveMode::Insert).unwrap();
    assert!(conn
        .save_with(&User::new(1, "a@x.com"), SaveMode::Insert)
        .unwrap_err()
        .is_already_exists());
    conn.save_with(&User::new(1, "b@x.com"), SaveMode::Update).unwrap();
    conn.save_with(&User::new(1, "c@x.com"), SaveMode::default()).unwrap();
}

#[test]
fn list_without_options_returns_every_record_once() {
    let schema = user_schema();
    let backend = scenarios::populated_users(&schema, 50);
    let conn = ReadConnection::new(&schema, &backend);
    let ids: Vec<u64> = conn
        .list(ListOptions::<User>::new())
        .unwrap()
        .map(|user| user.unwrap().id)
        .collect();
    assert_eq!(ids, (1..=50).collect::<Vec<_>>());
    assert_eq!(backend.open_iterators(), 0);
}

#[test]
fn key_prefix_isolates_schemas() {
    let plain = user_schema();
    let prefixed = user_schema_with(Config::new().key_prefix(b"tenant-b/".to_vec()));
    let mut backend = InMemoryBackend::new();

    Connection::new(&plain, &mut backend)
        .insert(&User::new(1, "a@x.com"))
        .unwrap();
    Connection::new(&prefixed, &mut backend)
        .insert(&User::new(1, "b@x.com"))
        .unwrap();

    let a: User = ReadConnection::new(&plain, &backend)
        .get(&fields("id"), &[Value::Unsigned(1)])
        .unwrap()
        .unwrap();
    let b: User = ReadConnection::new(&prefixed, &backend)
        .get(&fields("id"), &[Value::Unsigned(1)])
        .unwrap()
        .unwrap();
    assert_eq!(a.email, "a@x.com");
    assert_eq!(b.email, "b@x.com");

    let listed = ReadConnection::new(&prefixed, &backend)
        .list(ListOptions::<User>::new())
        .unwrap()
        .count();
    assert_eq!(listed, 1);
}
