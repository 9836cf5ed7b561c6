use super::{generate_users, insert_people, User};
use kvdoc::filter::field;
use kvdoc::store::KvStore;
use kvdoc::Document;
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test};
use std::collections::BTreeSet;

#[test]
fn test_cursor_walks_every_document() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut generate_users(111))?;

            let mut cursor = users.find_all().cursor()?;
            let mut user = User::default();
            let mut seen = BTreeSet::new();
            while cursor.next(&mut user)? {
                assert!(!user.id.is_empty());
                assert!(user.created_at.is_some());
                seen.insert(user.id.clone());
            }
            assert_eq!(seen.len(), 111);
            assert!(!cursor.is_open());

            assert_eq!(users.count()?, 111);
            assert_eq!(users.get_all::<User>()?.len(), 111);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cursor_after_exhaustion() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let mut cursor = users.find([field("name").eq("rob")]).cursor()?;
            let mut user = User::default();
            assert!(cursor.next(&mut user)?);
            assert_eq!(user.name, "rob");
            assert!(!cursor.next(&mut user)?);
            assert!(!cursor.next(&mut user)?);
            assert_eq!(user.name, "rob");
            cursor.close()?;
            cursor.close()?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_cursor_close_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let mut cursor = users.find_all().sort(&["-age"]).cursor()?;
            let first = cursor.next_document()?;
            assert_eq!(first.as_ref().and_then(|d| d.get_str("name")), Some("ben"));
            cursor.close()?;
            assert!(!cursor.is_open());
            cursor.close()?;
            assert!(cursor.next_document()?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_open_cursor_does_not_block_writers() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let mut cursor = users.find_all().cursor()?;
            let first: Option<Document> = cursor.next_document()?;
            assert!(first.is_some());

            users.insert(&mut [super::user("ann", 40)])?;
            assert_eq!(users.count()?, 4);

            let mut remaining = 0;
            while cursor.next_document()?.is_some() {
                remaining += 1;
            }
            assert_eq!(remaining, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dropped_cursor_releases_its_transaction() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            for _ in 0..10 {
                let mut cursor = users.find_all().cursor()?;
                cursor.next_document()?;
            }

            // a write transaction still begins and commits
            let tx = ctx.kv().begin(true)?;
            tx.commit()?;
            users.insert(&mut [super::user("ann", 40)])?;
            Ok(())
        },
        cleanup,
    )
}
