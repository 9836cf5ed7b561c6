use super::{insert_people, names, user, User};
use kvdoc::filter::{field, or};
use kvdoc::{doc, Document, Selector};
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_update_refreshes_updated_at_only() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            let before: User = users.get("2")?;

            let mut changed = before.clone();
            changed.age = 26;
            users.update("2", &mut changed)?;

            let after: User = users.get("2")?;
            assert_eq!(after.age, 26);
            assert_eq!(after.created_at, before.created_at);
            assert!(after.updated_at > before.updated_at);
            assert_eq!(changed, after);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_keeps_stored_created_at_over_callers_value() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            let original: User = users.get("1")?;

            let mut forged = user("bob", 21);
            forged.created_at = Some(chrono::Utc::now() + chrono::TimeDelta::days(365));
            users.update("1", &mut forged)?;

            let stored: User = users.get("1")?;
            assert_eq!(stored.created_at, original.created_at);
            assert_eq!(forged.created_at, original.created_at);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_repeated_updates_keep_increasing_updated_at() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [doc! { n: 0 }])?;

            let mut last = docs.get::<Document>("1")?.updated_at();
            for n in 1..50 {
                let mut next = doc! { n: n };
                docs.update("1", &mut next)?;
                let stored: Document = docs.get("1")?;
                assert!(stored.updated_at() > last);
                last = stored.updated_at();
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_by_filter_changes_first_match_only() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            users.update(field("age").gte(25), &mut user("max", 99))?;
            let all = users.get_all::<User>()?;
            assert_eq!(names(&all), vec!["bob", "max", "ben"]);

            users.update(or(vec![field("name").eq("ben"), field("name").eq("bob")]), &mut user("zoe", 1))?;
            let all = users.get_all::<User>()?;
            assert_eq!(names(&all), vec!["zoe", "max", "ben"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_by_id_filter_and_all() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            users.insert(&mut [user("ann", 40), user("amy", 41)])?;

            assert_eq!(users.delete("2")?, 1);
            assert_eq!(names(&users.get_all::<User>()?), vec!["bob", "ben", "ann", "amy"]);

            assert_eq!(users.delete(field("age").gt(35))?, 2);
            assert_eq!(names(&users.get_all::<User>()?), vec!["bob", "ben"]);

            assert_eq!(users.delete(field("age").gt(100))?, 0);
            assert_eq!(users.delete(Selector::All)?, 2);
            assert_eq!(users.count()?, 0);
            assert_eq!(users.delete(Selector::All)?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_count_matches_all() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            users.insert(&mut super::generate_users(20))?;

            let views = [
                users.find_all(),
                users.find([field("name").eq("bob")]),
                users.find([field("age").gte(30)]),
                users.find_all().skip(3).limit(7),
                users.find([field("age").lt(50)]).sort(&["-age"]).limit(5),
            ];
            for view in views {
                assert_eq!(view.count()?, view.all::<User>()?.len());
            }
            Ok(())
        },
        cleanup,
    )
}
