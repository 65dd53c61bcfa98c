//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use crate::fixtures::User;
use ormkv_codec::{Value, ValueKind};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating any value kind.
pub fn value_kind_strategy() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::Bool),
        Just(ValueKind::Integer),
        Just(ValueKind::Unsigned),
        Just(ValueKind::Text),
        Just(ValueKind::Bytes),
    ]
}

/// Strategy for generating values of one kind.
pub fn value_of_kind(kind: ValueKind) -> BoxedStrategy<Value> {
    match kind {
        ValueKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        ValueKind::Integer => any::<i64>().prop_map(Value::Integer).boxed(),
        ValueKind::Unsigned => any::<u64>().prop_map(Value::Unsigned).boxed(),
        ValueKind::Text => ".{0,16}".prop_map(Value::Text).boxed(),
        ValueKind::Bytes => prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(Value::Bytes)
            .boxed(),
    }
}

/// Strategy for generating values of any kind.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    value_kind_strategy().prop_flat_map(value_of_kind)
}

/// Strategy for generating lists of values, as used for composite keys.
pub fn value_list_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(value_strategy(), 0..4)
}

/// Strategy for generating plausible email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}@[a-z]{1,6}\\.(com|org|net)").expect("Invalid regex")
}

/// Strategy for generating a single user.
pub fn user_strategy() -> impl Strategy<Value = User> {
    (
        1u64..1_000,
        email_strategy(),
        prop::string::string_regex("[a-z]{0,6}").expect("Invalid regex"),
    )
        .prop_map(|(id, email, name)| User::named(id, &email, &name))
}

/// Strategy for generating users with distinct ids and distinct emails.
pub fn distinct_users_strategy(max: usize) -> impl Strategy<Value = Vec<User>> {
    prop::collection::vec(user_strategy(), 0..max).prop_map(|users| {
        let mut by_id: BTreeMap<u64, User> = BTreeMap::new();
        for user in users {
            let taken = by_id.values().any(|other| other.email == user.email);
            if !taken {
                by_id.entry(user.id).or_insert(user);
            }
        }
        by_id.into_values().collect()
    })
}

/// An operation applied by the model tests.
#[derive(Debug, Clone)]
pub enum UserOp {
    /// `Connection::save`.
    Save(User),
    /// `Connection::insert`.
    Insert(User),
    /// `Connection::update`.
    Update(User),
    /// `Connection::delete` by id.
    Delete(u64),
}

/// Strategy for generating operation sequences over a small id space, so
/// that collisions are frequent.
pub fn user_ops_strategy(max: usize) -> impl Strategy<Value = Vec<UserOp>> {
    let small_user = (1u64..8, 0u8..6, "[a-c]{0,2}")
        .prop_map(|(id, mailbox, name)| User::named(id, &format!("m{mailbox}@x.com"), &name));
    let op = prop_oneof![
        small_user.clone().prop_map(UserOp::Save),
        small_user.clone().prop_map(UserOp::Insert),
        small_user.prop_map(UserOp::Update),
        (1u64..8).prop_map(UserOp::Delete),
    ];
    prop::collection::vec(op, 0..max)
}
