//! Integration tests for list scans through connections.

use ormkv_codec::Value;
use ormkv_core::{Config, Connection, ListOptions, OrmError, OrmResult, ReadConnection};
use ormkv_storage::InMemoryBackend;
use ormkv_testkit::prelude::*;

fn blog() -> (ormkv_core::Schema, InMemoryBackend) {
    let schema = blog_schema();
    let mut backend = InMemoryBackend::new();
    {
        let mut conn = Connection::new(&schema, &mut backend);
        for author in 1..=3u64 {
            for id in 1..=4u64 {
                let post = Post::new(author, id, &format!("post {author}/{id}"));
                let post = if id % 2 == 0 { post.published() } else { post };
                conn.insert(&post).unwrap();
            }
        }
    }
    (schema, backend)
}

fn keys(posts: &[Post]) -> Vec<(u64, u64)> {
    posts.iter().map(|p| (p.author, p.id)).collect()
}

#[test]
fn composite_prefix_selects_one_author() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let posts: Vec<Post> = conn
        .list(ListOptions::new().prefix(vec![Value::Unsigned(2)]))
        .unwrap()
        .collect::<OrmResult<_>>()
        .unwrap();
    assert_eq!(keys(&posts), vec![(2, 1), (2, 2), (2, 3), (2, 4)]);
}

#[test]
fn secondary_index_scan() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let posts: Vec<Post> = conn
        .list(
            ListOptions::new()
                .index(fields("published"))
                .prefix(vec![Value::Bool(true)]),
        )
        .unwrap()
        .collect::<OrmResult<_>>()
        .unwrap();
    assert_eq!(posts.len(), 6);
    assert!(posts.iter().all(|p| p.published));
    // entries with one index value are ordered by primary key
    assert_eq!(keys(&posts)[..2], [(1, 2), (1, 4)]);
}

#[test]
fn pages_cover_the_table_exactly_once() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);

    let mut seen = Vec::new();
    let mut cursor = None;
    let mut pages = 0;
    loop {
        let mut options = ListOptions::<Post>::new().limit(5);
        if let Some(cursor) = cursor.take() {
            options = options.cursor(cursor);
        }
        let page = conn.list(options).unwrap().collect_page().unwrap();
        pages += 1;
        seen.extend(keys(&page.records));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    let all: Vec<(u64, u64)> = (1..=3)
        .flat_map(|author| (1..=4).map(move |id| (author, id)))
        .collect();
    assert_eq!(seen, all);
    assert_eq!(pages, 3);
    assert_eq!(backend.open_iterators(), 0);
}

#[test]
fn reverse_pages() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let first = conn
        .list(ListOptions::<Post>::new().reverse().limit(2))
        .unwrap()
        .collect_page()
        .unwrap();
    assert_eq!(keys(&first.records), vec![(3, 4), (3, 3)]);

    let second = conn
        .list(
            ListOptions::<Post>::new()
                .reverse()
                .limit(2)
                .cursor(first.next_cursor.unwrap()),
        )
        .unwrap()
        .collect_page()
        .unwrap();
    assert_eq!(keys(&second.records), vec![(3, 2), (3, 1)]);
}

#[test]
fn filter_and_offset() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let posts: Vec<Post> = conn
        .list(
            ListOptions::new()
                .filter(|p: &Post| !p.published)
                .offset(2)
                .limit(3),
        )
        .unwrap()
        .collect::<OrmResult<_>>()
        .unwrap();
    assert_eq!(keys(&posts), vec![(2, 1), (2, 3), (3, 1)]);
}

#[test]
fn range_on_leading_field() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let posts: Vec<Post> = conn
        .list(
            ListOptions::new()
                .start(vec![Value::Unsigned(2)])
                .end(vec![Value::Unsigned(3)]),
        )
        .unwrap()
        .collect::<OrmResult<_>>()
        .unwrap();
    assert_eq!(keys(&posts), vec![(2, 1), (2, 2), (2, 3), (2, 4)]);
}

#[test]
fn keys_only() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let pks: Vec<Vec<Value>> = conn
        .list(ListOptions::<Post>::new().prefix(vec![Value::Unsigned(1)]).limit(2))
        .unwrap()
        .into_keys()
        .unwrap()
        .collect::<OrmResult<_>>()
        .unwrap();
    assert_eq!(
        pks,
        vec![
            vec![Value::Unsigned(1), Value::Unsigned(1)],
            vec![Value::Unsigned(1), Value::Unsigned(2)],
        ]
    );
}

#[test]
fn dropped_iterator_releases_cursor() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    {
        let mut iter = conn.list(ListOptions::<Post>::new()).unwrap();
        assert!(iter.next().is_some());
        assert_eq!(backend.open_iterators(), 1);
    }
    assert_eq!(backend.open_iterators(), 0);
}

#[test]
fn default_limit_from_config() {
    let schema = blog_schema_with(Config::new().default_list_limit(3));
    let mut backend = InMemoryBackend::new();
    {
        let mut conn = Connection::new(&schema, &mut backend);
        for id in 1..=10 {
            conn.insert(&Post::new(1, id, "t")).unwrap();
        }
    }
    let conn = ReadConnection::new(&schema, &backend);
    assert_eq!(conn.list(ListOptions::<Post>::new()).unwrap().count(), 3);
    assert_eq!(
        conn.list(ListOptions::<Post>::new().limit(8)).unwrap().count(),
        8
    );
}

#[test]
fn list_on_non_unique_index_without_prefix() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    let flags: Vec<bool> = conn
        .list(ListOptions::<Post>::new().index(fields("published")))
        .unwrap()
        .map(|p| p.unwrap().published)
        .collect();
    assert_eq!(flags.len(), 12);
    // false sorts before true
    assert!(flags[..6].iter().all(|f| !f));
    assert!(flags[6..].iter().all(|f| *f));
}

#[test]
fn list_rejects_bad_options() {
    let (schema, backend) = blog();
    let conn = ReadConnection::new(&schema, &backend);
    assert!(matches!(
        conn.list(ListOptions::<Post>::new().index(fields("title"))),
        Err(OrmError::IndexNotFound { .. })
    ));
    assert!(matches!(
        conn.list(
            ListOptions::<Post>::new()
                .prefix(vec![Value::Unsigned(1)])
                .end(vec![Value::Unsigned(2)])
        ),
        Err(OrmError::InvalidListOptions { .. })
    ));
    assert!(matches!(
        conn.list(ListOptions::<Post>::new().prefix(vec![
            Value::Unsigned(1),
            Value::Unsigned(1),
            Value::Unsigned(1)
        ])),
        Err(OrmError::InvalidListOptions { .. })
    ));
}
