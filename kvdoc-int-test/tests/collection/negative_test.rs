use super::{insert_people, user, User};
use kvdoc::common::Value;
use kvdoc::errors::ErrorKind;
use kvdoc::filter::{and, field, or, Filter};
use kvdoc::store::memory::InMemoryStore;
use kvdoc::{DocStore, Document, Selector};
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_get_missing_document() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            let err = users.get::<User>("99").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            assert!(err.message().starts_with("get:"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_one_on_empty_result() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            let err = users.find_all().one::<User>().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_malformed_filters() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let malformed: Vec<Filter> = vec![
                and(vec![]),
                or(vec![]),
                or(vec![field("name").eq("bob"), and(vec![])]),
            ];
            for filter in malformed {
                let err = users.find([filter.clone()]).all::<User>().unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
                let err = users.delete(filter).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
            }
            assert_eq!(users.count()?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_malformed_sort_field() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            let err = users.find_all().sort(&[""]).all::<User>().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_all_into_wrong_target() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            for mut target in [Value::Null, Value::from("x"), Value::Object(Default::default())] {
                let err = users.find_all().all_into(&mut target).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::InvalidResultTarget);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_and_delete_missing_targets() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let err = users.update("42", &mut user("x", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            assert!(err.message().starts_with("update:"));

            let err = users.update(field("name").eq("nobody"), &mut user("x", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);

            let err = users.update(Selector::All, &mut user("x", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            let err = users.delete("42").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            assert!(err.message().starts_with("delete:"));
            assert_eq!(users.count()?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_type_mismatch_on_read() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [kvdoc::doc! { name: 5 }])?;

            let err = docs.get::<User>("1").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::SerializationError);

            let mut cursor = docs.find_all().cursor()?;
            let mut user = User::default();
            let err = cursor.next(&mut user).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::SerializationError);
            assert!(!cursor.is_open());

            let doc: Document = docs.get("1")?;
            assert_eq!(doc.get("name"), Some(&Value::from(5)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_collection_names() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            assert_eq!(store.collection("").err().map(|e| e.kind().clone()), Some(ErrorKind::InvalidOperation));
            assert_eq!(
                store.collection("idx_users").err().map(|e| e.kind().clone()),
                Some(ErrorKind::InvalidOperation)
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operations_after_close() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let users = store.collection("users")?;
            insert_people(&users)?;
            store.close()?;

            assert_eq!(users.count().unwrap_err().kind(), &ErrorKind::InvalidOperation);
            assert_eq!(
                users.insert(&mut [user("x", 1)]).unwrap_err().kind(),
                &ErrorKind::InvalidOperation
            );
            assert_eq!(
                users.get::<User>("1").unwrap_err().kind(),
                &ErrorKind::InvalidOperation
            );
            assert!(store.collection("other").is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_builder_errors() {
    let err = DocStore::builder().open().err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::InvalidOperation));

    let err = DocStore::builder()
        .kv_store(InMemoryStore::new())
        .index_prefix("")
        .open()
        .err()
        .map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::InvalidOperation));
}
