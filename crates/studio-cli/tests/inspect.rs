//! The inspect subcommand against export manifests on disk.

use std::fs;

use studio_cli::discover_router;
use studio_cli::inspect::{run_inspect, InspectArgs};
use studio_router::WireTransformer;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  appRouter: {
    _def: {
      router: true,
      _config: { transformer: 'superjson' },
      procedures: {
        'post.list': { _def: { type: 'query' } },
        'post.add': {
          _def: {
            type: 'mutation',
            inputs: [{ typeName: 'ZodObject', shape: { title: { typeName: 'ZodString' } } }],
          },
        },
      },
    },
  },
}"#;

fn manifest_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("router.json5"), MANIFEST).unwrap();
    dir
}

#[tokio::test]
async fn discovers_through_the_extension_loader() {
    let dir = manifest_dir();
    let discovered = discover_router(&dir.path().join("router.json5")).await.unwrap();
    assert_eq!(discovered.router.transformer, WireTransformer::Superjson);
    assert_eq!(discovered.catalog.len(), 2);
}

#[tokio::test]
async fn inspect_prints_the_catalog() {
    let dir = manifest_dir();
    let code = run_inspect(&InspectArgs::default(), &dir.path().join("router.json5"))
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn inspect_rejects_unknown_procedures() {
    let dir = manifest_dir();
    let args = InspectArgs {
        procedure: Some("post.remove".into()),
        compact: true,
    };
    let err = run_inspect(&args, &dir.path().join("router.json5"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("post.remove"));
}

#[tokio::test]
async fn discovery_failures_carry_context() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("empty.json"), "{}").unwrap();
    let err = discover_router(&dir.path().join("empty.json")).await.unwrap_err();
    assert!(format!("{err:#}").starts_with("failed to discover a tRPC router"));
}
