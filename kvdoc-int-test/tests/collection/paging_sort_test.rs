use super::{generate_users, insert_people, names, user, User};
use kvdoc::filter::field;
use kvdoc::{doc, Document};
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_sort_by_name() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let ascending = users.find_all().sort(&["name"]).all::<User>()?;
            assert_eq!(names(&ascending), vec!["ben", "bob", "rob"]);

            let descending = users.find_all().sort(&["-name"]).all::<User>()?;
            assert_eq!(names(&descending), vec!["rob", "bob", "ben"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_by_age_descending_is_stable() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut [
                user("a", 20),
                user("b", 30),
                user("c", 25),
                user("d", 30),
                user("e", 20),
            ])?;

            let sorted = users.find_all().sort(&["-age"]).all::<User>()?;
            assert_eq!(names(&sorted), vec!["b", "d", "c", "a", "e"]);

            let sorted = users.find_all().sort(&["age", "-name"]).all::<User>()?;
            assert_eq!(names(&sorted), vec!["e", "a", "c", "d", "b"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_limit_and_skip() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let limited = users.find_all().limit(2).all::<User>()?;
            assert_eq!(names(&limited), vec!["bob", "rob"]);

            let skipped = users.find_all().skip(2).all::<User>()?;
            assert_eq!(names(&skipped), vec!["ben"]);

            let none = users.find_all().skip(5).all::<User>()?;
            assert!(none.is_empty());

            let window = users.find([field("age").gte(25)]).skip(1).limit(1).all::<User>()?;
            assert_eq!(names(&window), vec!["ben"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_orders_the_selected_window() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let page = users.find_all().sort(&["name"]).limit(2).all::<User>()?;
            assert_eq!(names(&page), vec!["bob", "rob"]);

            let page = users.find_all().skip(1).sort(&["-age"]).all::<User>()?;
            assert_eq!(names(&page), vec!["ben", "rob"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_paging_matches_slices_of_all() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            let mut batch = generate_users(23);
            for (i, u) in batch.iter_mut().enumerate() {
                u.name = format!("user-{:02}", i);
            }
            users.insert(&mut batch)?;

            let all: Vec<String> = users.get_all::<User>()?.into_iter().map(|u| u.id).collect();
            assert_eq!(all.len(), 23);

            for skip in [0usize, 1, 5, 22, 23, 30] {
                for limit in [1usize, 4, 10, 23] {
                    let page: Vec<String> = users
                        .find_all()
                        .skip(skip)
                        .limit(limit)
                        .all::<User>()?
                        .into_iter()
                        .map(|u| u.id)
                        .collect();
                    let expected = limit.min(23usize.saturating_sub(skip));
                    assert_eq!(page.len(), expected, "skip {} limit {}", skip, limit);
                    let end = (skip + limit).min(all.len());
                    let start = skip.min(all.len());
                    assert_eq!(page, all[start..end].to_vec());
                }
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_mixed_value_types() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [
                doc! { label: "s", v: "text" },
                doc! { label: "n", v: 3 },
                doc! { label: "m" },
                doc! { label: "a", v: [1, 2] },
                doc! { label: "f", v: 1.5 },
                doc! { label: "o", v: { x: 1 } },
            ])?;

            let sorted = docs.find_all().sort(&["v"]).all::<Document>()?;
            let labels: Vec<&str> = sorted.iter().filter_map(|d| d.get_str("label")).collect();
            assert_eq!(labels, vec!["m", "f", "n", "a", "o", "s"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_by_id_is_lexicographic() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut generate_users(12))?;

            let ids: Vec<String> = users
                .find_all()
                .sort(&["-id"])
                .all::<User>()?
                .into_iter()
                .map(|u| u.id)
                .collect();
            assert_eq!(ids.first().map(String::as_str), Some("9"));
            assert_eq!(ids.last().map(String::as_str), Some("1"));
            Ok(())
        },
        cleanup,
    )
}
