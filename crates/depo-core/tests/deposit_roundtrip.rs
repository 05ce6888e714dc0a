//! Integration test: local repository server, full validate → aggregate →
//! deposit pipeline over libcurl.
//!
//! Loads a sheet, fills vocabularies from the server, validates every row,
//! then deposits the valid ones and checks the server received the exact
//! file bytes.

mod common;

use std::sync::Arc;

use depo_core::batch::Batch;
use depo_core::checks::CheckContext;
use depo_core::config::DepoConfig;
use depo_core::files::RootDir;
use depo_core::flow::Flow;
use depo_core::registry::RegistryLimits;
use depo_core::repository::{HttpRepository, RepositoryApi, RepositoryError};
use depo_core::row::RowState;
use depo_core::sheet::Sheet;
use depo_core::upload::{deposit_batch, UploadOptions};
use tempfile::tempdir;

const SHEET: &str = "\
Title,Description,Item Type,Keywords,Categories,Files
Soil cores,Cores from site A,Dataset,\"soil, carbon\",ecology,cores.csv
River map,Sketch of the delta,figure,rivers,Geology,\"map.png, notes.txt\"
Untitled,,dataset,x,Geology,
";

#[tokio::test]
async fn validated_rows_are_deposited_with_their_files() {
    let server = common::repo_server::start(Default::default());
    let root = tempdir().unwrap();
    let cores: Vec<u8> = (0u8..100).cycle().take(1000).collect();
    std::fs::write(root.path().join("cores.csv"), &cores).unwrap();
    std::fs::write(root.path().join("map.png"), b"PNG....").unwrap();
    std::fs::write(root.path().join("notes.txt"), b"").unwrap();

    let repo = HttpRepository::new(&server.base_url, Some(common::repo_server::TOKEN.into()))
        .unwrap();
    let account = repo.account().await.unwrap();
    let enums = repo.enumerations().await.unwrap();

    let sheet = Sheet::from_reader(SHEET.as_bytes()).unwrap();
    let cfg = DepoConfig::default();
    let mut ctx = CheckContext::from_config(&cfg, sheet.headers.clone(), Some(RootDir::new(root.path())));
    enums.apply_to(&mut ctx);

    let outcome = Batch::new(sheet.rows, ctx, RegistryLimits::from_config(&cfg))
        .run()
        .await;
    let states: Vec<RowState> = outcome.rows.iter().map(|r| r.status.state).collect();
    assert_eq!(states, vec![RowState::Valid, RowState::Valid, RowState::Error]);
    // Coerced vocabulary values and the empty file show up as warnings.
    assert!(outcome.rows[0].status.warnings.iter().any(|w| w.contains("'ecology' was changed to 'Ecology'")));
    assert!(outcome.rows[1].status.warnings.iter().any(|w| w.contains("notes.txt")));
    assert_eq!(outcome.rows[0].quota_used, 1000);

    let report = outcome.aggregate(Some(account.remaining()));
    assert!(report.ready_for_upload(false), "{:?}", report.upload_blockers(false));

    let opts = UploadOptions::new(Some(Arc::new(RootDir::new(root.path()))), 64);
    let mut snapshots = 0usize;
    let results = deposit_batch(&repo, &cfg.fields, &outcome, &opts, |_, _| {
        snapshots += 1;
        Flow::Continue
    })
    .await
    .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_complete()), "{:?}", results);
    assert!(snapshots > 0);

    let st = server.state.lock().unwrap();
    assert_eq!(st.records.len(), 2);
    assert_eq!(st.records[0]["title"], "Soil cores");
    assert_eq!(st.records[0]["categories"], serde_json::json!(["Ecology"]));
    assert_eq!(st.records[0]["item_type"], "dataset");
    assert!(st.records[0].get("files").is_none());

    assert_eq!(st.files.len(), 3);
    assert!(st.files.iter().all(|f| f.completed));
    assert_eq!(st.files[0].content(), cores);
    assert_eq!(st.files[0].parts.len(), 4);
    assert_eq!(st.files[1].record_id, 2);
    assert_eq!(st.files[2].name, "notes.txt");
    assert!(st.files[2].parts.is_empty());
}

#[tokio::test]
async fn bad_token_is_a_status_error() {
    let server = common::repo_server::start(Default::default());
    let repo = HttpRepository::new(&server.base_url, Some("wrong".into())).unwrap();
    match repo.account().await {
        Err(RepositoryError::Status { code, .. }) => assert_eq!(code, 401),
        other => panic!("expected 401, got {:?}", other),
    }
}

#[tokio::test]
async fn quota_blocks_oversized_batch() {
    let server = common::repo_server::start(common::repo_server::ServerOptions {
        quota: 500,
        ..Default::default()
    });
    let root = tempdir().unwrap();
    std::fs::write(root.path().join("cores.csv"), vec![0u8; 1000]).unwrap();
    std::fs::write(root.path().join("map.png"), b"PNG").unwrap();
    std::fs::write(root.path().join("notes.txt"), b"").unwrap();

    let repo = HttpRepository::new(&server.base_url, Some(common::repo_server::TOKEN.into()))
        .unwrap();
    let sheet = Sheet::from_reader(SHEET.as_bytes()).unwrap();
    let cfg = DepoConfig::default();
    let mut ctx = CheckContext::from_config(&cfg, sheet.headers.clone(), Some(RootDir::new(root.path())));
    repo.enumerations().await.unwrap().apply_to(&mut ctx);
    let outcome = Batch::new(sheet.rows, ctx, RegistryLimits::default()).run().await;

    let remaining = repo.account().await.unwrap().remaining();
    let report = outcome.aggregate(Some(remaining));
    assert!(!report.ready_for_upload(true));
    assert!(report.upload_blockers(true)[0].contains("1003"));
    assert!(server.state.lock().unwrap().records.is_empty());
}
