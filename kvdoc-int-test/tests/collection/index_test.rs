use super::{generate_users, insert_people, names, user, PlainUser, User};
use kvdoc::filter::{and, by_id, field, or, Filter};
use kvdoc::store::KvStore;
use kvdoc::{doc, m, Document, Entity, IndexFields};
use kvdoc_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};
use serde::{Deserialize, Serialize};

/// Declares only `tag`, while sharing a collection with plain documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tagged {
    #[serde(default)]
    id: String,
    name: String,
    tag: String,
}

impl Entity for Tagged {
    fn id(&self) -> Option<String> {
        Some(self.id.clone()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn index_fields() -> IndexFields {
        IndexFields::Declared(&["tag"])
    }
}

fn tagged(name: &str, tag: &str) -> Tagged {
    Tagged {
        name: name.to_string(),
        tag: tag.to_string(),
        ..Tagged::default()
    }
}

fn index_ids(ctx: &TestContext, bucket: &str, value: &str) -> Vec<String> {
    let tx = match ctx.kv().begin(false) {
        Ok(tx) => tx,
        Err(e) => panic!("begin failed: {:?}", e),
    };
    let ids = match tx.bucket(bucket, false).and_then(|b| match b {
        Some(b) => b.get(value.as_bytes()),
        None => Ok(None),
    }) {
        Ok(Some(bytes)) => bytes
            .split(|b| *b == 0)
            .filter(|id| !id.is_empty())
            .map(|id| String::from_utf8_lossy(id).into_owned())
            .collect(),
        Ok(None) => Vec::new(),
        Err(e) => panic!("index read failed: {:?}", e),
    };
    let _ = tx.rollback();
    ids
}

#[test]
fn test_insert_builds_declared_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            users.insert(&mut [user("bob", 20), user("bob", 25), user("ben", 30)])?;

            assert_eq!(index_ids(&ctx, "idx_users_name", "bob"), vec!["1", "2"]);
            assert_eq!(index_ids(&ctx, "idx_users_email", "ben@mail.net"), vec!["3"]);

            let buckets = ctx.kv().bucket_names();
            assert!(!buckets.iter().any(|b| b == "idx_users_age"));
            assert!(!buckets.iter().any(|b| b == "idx_users_createdAt"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_documents_index_their_string_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [
                doc! { kind: "a", size: 3, blank: "" },
                doc! { kind: "b", tag: "x" },
            ])?;

            assert_eq!(index_ids(&ctx, "idx_docs_kind", "a"), vec!["1"]);
            assert_eq!(index_ids(&ctx, "idx_docs_tag", "x"), vec!["2"]);
            let buckets = ctx.kv().bucket_names();
            assert!(!buckets.iter().any(|b| b == "idx_docs_size"));
            assert!(!buckets.iter().any(|b| b == "idx_docs_blank"));
            assert!(!buckets.iter().any(|b| b == "idx_docs_id"));

            // empty strings are not indexed, so this falls back to a scan
            assert_eq!(docs.find([field("blank").eq("")]).count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_and_scan_paths_agree() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            let indexed = store.collection("indexed")?;
            let plain = store.collection("plain")?;

            let mut people = generate_users(60);
            for (i, person) in people.iter_mut().enumerate() {
                person.name = ["bob", "rob", "ben", "ann"][i % 4].to_string();
            }
            let mut copies: Vec<PlainUser> = people.iter().map(PlainUser::from).collect();
            indexed.insert(&mut people)?;
            plain.insert(&mut copies)?;

            let queries: Vec<Vec<Filter>> = vec![
                vec![field("name").eq("bob")],
                vec![m! { "name" => "rob", "email" => people[1].email.clone() }],
                vec![or(vec![field("name").eq("ben"), by_id("7"), by_id("nope")])],
                vec![and(vec![field("name").eq("ann"), or(vec![by_id("4"), by_id("8")])])],
                vec![field("name").eq("bob"), field("name").eq("rob")],
                vec![field("name").eq("zed")],
                vec![m! { "_id" => "12" }],
            ];
            for filters in queries {
                let via_index: Vec<String> = indexed
                    .find(filters.clone())
                    .all::<User>()?
                    .into_iter()
                    .map(|u| u.id)
                    .collect();
                let via_scan: Vec<String> = plain
                    .find(filters.clone())
                    .all::<PlainUser>()?
                    .into_iter()
                    .map(|u| u.id)
                    .collect();
                assert_eq!(via_index, via_scan, "results differ for {:?}", filters);
                assert_eq!(indexed.find(filters).count()?, via_scan.len());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_cleans_indexes() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            users.insert(&mut [user("bob", 40)])?;

            users.delete("1")?;
            assert_eq!(index_ids(&ctx, "idx_users_name", "bob"), vec!["4"]);
            assert!(index_ids(&ctx, "idx_users_email", "bob@mail.net") == vec!["4"]);

            users.delete(field("name").eq("bob"))?;
            assert!(index_ids(&ctx, "idx_users_name", "bob").is_empty());
            assert!(index_ids(&ctx, "idx_users_email", "bob@mail.net").is_empty());
            assert_eq!(users.find([field("name").eq("bob")]).count()?, 0);
            assert_eq!(users.find([field("email").eq("bob@mail.net")]).count()?, 0);

            users.delete(kvdoc::Selector::All)?;
            assert!(index_ids(&ctx, "idx_users_name", "rob").is_empty());
            assert!(index_ids(&ctx, "idx_users_name", "ben").is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_moves_index_entries() {
    run_test(
        create_test_context,
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;

            let mut renamed = user("bobby", 21);
            renamed.email = "bob@mail.net".to_string();
            users.update("1", &mut renamed)?;

            assert!(index_ids(&ctx, "idx_users_name", "bob").is_empty());
            assert_eq!(index_ids(&ctx, "idx_users_name", "bobby"), vec!["1"]);
            assert_eq!(index_ids(&ctx, "idx_users_email", "bob@mail.net"), vec!["1"]);

            let found = users.find([field("name").eq("bobby")]).all::<User>()?;
            assert_eq!(names(&found), vec!["bobby"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_reconciles_against_stored_document() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [doc! { kind: "a", color: "red" }])?;

            // the replacement drops `color` entirely
            let mut stale: Document = docs.get("1")?;
            stale.remove("color");
            stale.put("kind", "b")?;
            docs.update("1", &mut stale)?;

            assert!(index_ids(&ctx, "idx_docs_color", "red").is_empty());
            assert!(index_ids(&ctx, "idx_docs_kind", "a").is_empty());
            assert_eq!(index_ids(&ctx, "idx_docs_kind", "b"), vec!["1"]);
            assert_eq!(docs.find([field("color").eq("red")]).count()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_index_prefix() {
    run_test(
        || {
            let kv = kvdoc::store::memory::InMemoryStore::new();
            let store = kvdoc::DocStore::builder()
                .kv_store(kv.clone())
                .index_prefix("ix_")
                .open()?;
            Ok(TestContext::new(kv, store))
        },
        |ctx| {
            let users = ctx.store().collection("users")?;
            insert_people(&users)?;
            assert_eq!(index_ids(&ctx, "ix_users_name", "rob"), vec!["2"]);
            assert!(ctx.store().collection("ix_users").is_err());
            assert!(ctx.store().collection("idx_users").is_ok());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_mixed_index_policies_keep_index_and_scan_in_step() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [doc! { name: "bob", tag: "x" }])?;

            // a writer declaring only `tag` must not drop the `name` entry
            docs.update("1", &mut tagged("bob", "y"))?;
            assert_eq!(index_ids(&ctx, "idx_docs_name", "bob"), vec!["1"]);
            assert_eq!(index_ids(&ctx, "idx_docs_tag", "y"), vec!["1"]);

            let indexed = docs.find([field("name").eq("bob")]).count()?;
            let scanned = docs.find([field("name").in_array(vec!["bob"])]).count()?;
            assert_eq!((indexed, scanned), (1, 1));

            // nor may it skip an existing bucket when inserting
            docs.insert(&mut [tagged("ann", "z")])?;
            assert_eq!(index_ids(&ctx, "idx_docs_name", "ann"), vec!["2"]);
            assert_eq!(docs.find([field("name").eq("ann")]).count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_new_index_bucket_covers_earlier_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let docs = ctx.store().collection("docs")?;
            docs.insert(&mut [tagged("ann", "x"), tagged("ben", "x")])?;
            assert!(!ctx.kv().bucket_names().iter().any(|b| b == "idx_docs_name"));

            // the first document indexing `name` creates the bucket for everyone
            docs.insert(&mut [doc! { name: "ann", color: "red" }])?;
            assert_eq!(index_ids(&ctx, "idx_docs_name", "ann"), vec!["1", "3"]);
            assert_eq!(index_ids(&ctx, "idx_docs_name", "ben"), vec!["2"]);

            let found = docs.find([field("name").eq("ann")]).all::<Document>()?;
            let ids: Vec<&str> = found.iter().filter_map(|d| d.id()).collect();
            assert_eq!(ids, vec!["1", "3"]);
            assert_eq!(docs.find([field("name").eq("ben")]).count()?, 1);
            Ok(())
        },
        cleanup,
    )
}
