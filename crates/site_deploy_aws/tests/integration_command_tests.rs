use std::fs;
use std::path::Path;

use site_deploy_aws::handlers::commands::{domain_info, invalidate_cache, sync_to_s3};
use site_deploy_aws::handlers::invalidate::InvalidationOutcome;
use site_deploy_aws::test_helpers::{InMemoryObjectStore, RecordingCdn, StaticStackOutputs};
use site_deploy_core::config::{normalize_config, DeployConfig, DeployConfigFile};
use site_deploy_core::invalidation::DISTRIBUTION_DOMAIN_OUTPUT_KEY;

const BUCKET: &str = "app-prod-site";

fn app_prod_config(local_root: Option<&Path>) -> DeployConfig {
    normalize_config(DeployConfigFile {
        bucket_name: Some(BUCKET.to_string()),
        local_path: local_root.map(Path::to_path_buf),
        service: Some("app".to_string()),
        stage: Some("prod".to_string()),
        upload_concurrency: Some(4),
        ..DeployConfigFile::default()
    })
    .expect("config should pass")
}

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (relative, body) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("dirs should be created");
        }
        fs::write(path, body).expect("write should pass");
    }
}

#[tokio::test]
async fn invalidate_cache_targets_distribution_of_app_prod_stack() {
    let stacks = StaticStackOutputs::new().with_stack(
        "app-prod",
        &[(DISTRIBUTION_DOMAIN_OUTPUT_KEY, "d123.cdn.example")],
    );
    let cdn = RecordingCdn::new().with_distribution("E1", "d123.cdn.example");

    let outcome = invalidate_cache(&app_prod_config(None), &stacks, &cdn)
        .await
        .expect("invalidation should succeed");

    assert!(matches!(
        outcome,
        InvalidationOutcome::Submitted { ref distribution_id, .. } if distribution_id == "E1"
    ));
    let invalidations = cdn.invalidations();
    assert_eq!(invalidations.len(), 1);
    assert_eq!(invalidations[0].0, "E1");
    assert_eq!(invalidations[0].1.paths, vec!["/*".to_string()]);
}

#[tokio::test]
async fn invalidate_cache_without_matching_distribution_sends_nothing() {
    let stacks = StaticStackOutputs::new().with_stack(
        "app-prod",
        &[(DISTRIBUTION_DOMAIN_OUTPUT_KEY, "d123.cdn.example")],
    );
    let cdn = RecordingCdn::new().with_distribution("E9", "d999.cdn.example");

    let outcome = invalidate_cache(&app_prod_config(None), &stacks, &cdn)
        .await
        .expect("no match should not fail");

    assert!(matches!(
        outcome,
        InvalidationOutcome::DistributionNotFound { .. }
    ));
    assert!(cdn.invalidations().is_empty());
}

#[tokio::test]
async fn domain_info_fails_for_missing_stack() {
    let stacks = StaticStackOutputs::new().with_stack("app-dev", &[]);

    let error = domain_info(&app_prod_config(None), &stacks)
        .await
        .expect_err("missing stack should fail");

    assert_eq!(error.kind(), "domain_lookup");
    assert!(error.to_string().contains("app-prod"));
}

#[tokio::test]
async fn sync_replaces_previous_deploy_with_local_tree() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let files: &[(&str, &[u8])] = &[
        ("index.html", b"<html>v2</html>".as_slice()),
        ("404.html", b"<html>missing</html>".as_slice()),
        ("static/js/main.js", b"console.log('v2')".as_slice()),
        ("static/media/font.woff2", b"wOF2".as_slice()),
        ("favicon.ico", b"\x00\x00\x01\x00".as_slice()),
    ];
    write_tree(dir.path(), files);

    let store = InMemoryObjectStore::with_page_size(2).with_bucket(BUCKET);
    store.seed_object(BUCKET, "index.html", b"<html>v1</html>".as_slice());
    store.seed_object(BUCKET, "static/js/main.old.js", b"console.log('v1')".as_slice());
    store.seed_object(BUCKET, "static/css/main.css", b"body{}".as_slice());

    let report = sync_to_s3(&app_prod_config(Some(dir.path())), &store)
        .await
        .expect("sync should succeed");

    let mut expected: Vec<String> = files.iter().map(|(key, _)| key.to_string()).collect();
    expected.sort();
    assert_eq!(store.keys(BUCKET), expected);
    for (key, body) in files {
        let stored = store.object(BUCKET, key).expect("object should exist");
        assert_eq!(stored.body, body.to_vec(), "content mismatch for {key}");
    }
    assert_eq!(report.deleted_objects, 3);
    assert_eq!(report.uploaded_objects, files.len());
    assert_eq!(store.delete_calls(), 2);
}

#[tokio::test]
async fn sync_clears_large_bucket_in_two_pages() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_tree(dir.path(), &[("index.html", b"<html></html>".as_slice())]);

    let store = InMemoryObjectStore::new().with_bucket(BUCKET);
    for index in 0..1_050 {
        store.seed_object(BUCKET, &format!("old/{index:04}.html"), b"old".as_slice());
    }

    let report = sync_to_s3(&app_prod_config(Some(dir.path())), &store)
        .await
        .expect("sync should succeed");

    assert_eq!(report.deleted_objects, 1_050);
    assert_eq!(store.list_calls(), 2);
    assert_eq!(store.delete_calls(), 2);
    assert_eq!(store.keys(BUCKET), vec!["index.html".to_string()]);
}
