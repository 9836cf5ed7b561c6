use super::{generate_user, user, User};
use kvdoc::common::Value;
use kvdoc::{doc, Document};
use kvdoc_int_test::test_util::{cleanup, create_logging_test_context, create_test_context, run_test};

#[test]
fn test_insert_and_get_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            let mut batch = [generate_user()];
            let ids = users.insert(&mut batch)?;
            assert_eq!(ids, vec!["1"]);

            let stored: User = users.get("1")?;
            assert_eq!(stored.name, batch[0].name);
            assert_eq!(stored.email, batch[0].email);
            assert_eq!(stored.age, batch[0].age);
            assert_eq!(stored.id, "1");
            assert!(stored.created_at.is_some());
            assert_eq!(stored.created_at, stored.updated_at);
            assert_eq!(stored, batch[0]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let notes = ctx.store().collection("notes")?;
            let mut batch = [
                doc! { title: "first", tags: ["a", "b"], meta: { pages: 3 } },
                doc! { title: "second" },
            ];
            let ids = notes.insert(&mut batch)?;
            assert_eq!(ids, vec!["1", "2"]);
            assert_eq!(batch[1].id(), Some("2"));

            let first: Document = notes.get("1")?;
            assert_eq!(first.get_str("title"), Some("first"));
            assert_eq!(
                first.get("tags"),
                Some(&Value::Array(vec![Value::from("a"), Value::from("b")]))
            );
            assert_eq!(first.id(), Some("1"));
            assert!(first.created_at().is_some());
            assert_eq!(first.created_at(), first.updated_at());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_ids_continue_across_batches() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut [user("bob", 20), user("rob", 25)])?;
            let ids = users.insert(&mut [user("ben", 30)])?;
            assert_eq!(ids, vec!["3"]);

            users.delete("3")?;
            let ids = users.insert(&mut [user("ann", 40)])?;
            assert_eq!(ids, vec!["4"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_collections_are_independent() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let users = store.collection("users")?;
            let admins = store.collection("admins")?;
            users.insert(&mut [user("bob", 20), user("rob", 25)])?;
            admins.insert(&mut [user("ann", 40)])?;

            assert_eq!(users.count()?, 2);
            assert_eq!(admins.count()?, 1);
            assert_eq!(admins.get::<User>("1")?.name, "ann");

            let again = store.collection("users")?;
            assert_eq!(again.count()?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_typed_and_document_views_agree() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut [user("bob", 20)])?;

            let typed: User = users.get("1")?;
            let raw: Document = users.get("1")?;
            assert_eq!(raw.get_str("name"), Some(typed.name.as_str()));
            assert_eq!(raw.get("age"), Some(&Value::from(20)));
            assert_eq!(raw.created_at(), typed.created_at);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operations_with_logging_enabled() {
    run_test(
        create_logging_test_context,
        |ctx| {
            let store = ctx.store();
            assert!(store.config().log_operations());
            let users = store.collection("users")?;
            users.insert(&mut [user("bob", 20), user("rob", 25)])?;
            assert_eq!(users.get_all::<User>()?.len(), 2);
            assert_eq!(users.delete("1")?, 1);
            assert_eq!(users.count()?, 1);
            Ok(())
        },
        cleanup,
    )
}
