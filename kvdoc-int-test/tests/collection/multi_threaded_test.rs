use super::{generate_user, generate_users, user, User};
use kvdoc::filter::field;
use kvdoc::store::KvStore;
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test};
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_inserts_get_unique_ids() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let users = users.clone();
                    thread::spawn(move || {
                        let mut ids = Vec::new();
                        for _ in 0..25 {
                            ids.extend(users.insert(&mut [generate_user()])?);
                        }
                        Ok::<_, kvdoc::errors::KvDocError>(ids)
                    })
                })
                .collect();

            let mut all_ids = BTreeSet::new();
            for handle in handles {
                let ids = match handle.join() {
                    Ok(ids) => ids?,
                    Err(_) => panic!("insert thread panicked"),
                };
                all_ids.extend(ids);
            }
            assert_eq!(all_ids.len(), 100);
            assert_eq!(users.count()?, 100);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_readers_and_writers_interleave() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let users = store.collection("users")?;
            users.insert(&mut generate_users(20))?;

            let writer = {
                let users = users.clone();
                thread::spawn(move || {
                    for i in 0..30 {
                        let mut user = generate_user();
                        user.name = format!("writer-{}", i);
                        users.insert(&mut [user])?;
                    }
                    users.delete(field("age").lt(0))
                })
            };

            let readers: Vec<_> = (0..3)
                .map(|_| {
                    let users = users.clone();
                    thread::spawn(move || {
                        for _ in 0..20 {
                            let count = users.count()?;
                            let all = users.get_all::<User>()?;
                            assert!(count >= 20 && all.len() >= 20);
                        }
                        Ok::<_, kvdoc::errors::KvDocError>(())
                    })
                })
                .collect();

            match writer.join() {
                Ok(result) => assert_eq!(result?, 0),
                Err(_) => panic!("writer thread panicked"),
            }
            for reader in readers {
                match reader.join() {
                    Ok(result) => result?,
                    Err(_) => panic!("reader thread panicked"),
                }
            }
            assert_eq!(users.count()?, 50);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_waiting_writer_stamps_after_the_permit() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut [user("bob", 20)])?;

            for round in 0..10 {
                // hold the writer permit so the next update has to wait for it
                let blocker = ctx.kv().begin(true)?;
                let waiting = {
                    let users = users.clone();
                    thread::spawn(move || {
                        let mut first = user("first", round);
                        users.update("1", &mut first)?;
                        Ok::<_, kvdoc::errors::KvDocError>(first.updated_at)
                    })
                };
                thread::sleep(Duration::from_millis(5));
                blocker.rollback()?;

                let mut second = user("second", round);
                users.update("1", &mut second)?;
                let first_at = match waiting.join() {
                    Ok(result) => result?,
                    Err(_) => panic!("update thread panicked"),
                };

                let stored: User = users.get("1")?;
                let latest = first_at.max(second.updated_at);
                assert_eq!(stored.updated_at, latest);
                let expected = if latest == first_at { "first" } else { "second" };
                assert_eq!(stored.name, expected);
            }
            Ok(())
        },
        cleanup,
    )
}
