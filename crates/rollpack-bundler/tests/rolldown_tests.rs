//! Real bundling through Rolldown on a temporary workspace.

use std::fs;
use std::path::Path;

use rollpack_bundler::{BuildOutcome, BundleOptions, Orchestrator};
use serde_json::json;
use tempfile::TempDir;

fn create_ui_library() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let lib = dir.path().join("libs/ui");
    let src = lib.join("src");
    fs::create_dir_all(src.join("lib")).expect("create src");

    fs::write(
        src.join("index.ts"),
        r#"
export { greet } from './lib/greet';
export const VERSION: string = '1.0.0';
"#,
    )
    .expect("write index");

    fs::write(
        src.join("lib/greet.ts"),
        r#"
export function greet(name: string): string {
    return `Hello, ${name}!`;
}
"#,
    )
    .expect("write greet");

    fs::write(
        lib.join("package.json"),
        "{\n  \"name\": \"example\",\n  \"version\": \"1.0.0\"\n}\n",
    )
    .expect("write manifest");

    fs::write(
        lib.join("tsconfig.json"),
        r#"{ "compilerOptions": { "target": "es2020", "strict": true } }"#,
    )
    .expect("write tsconfig");

    dir
}

fn ui_options() -> BundleOptions {
    BundleOptions::new(
        "libs/ui/src/index.ts",
        "dist/ui",
        "libs/ui/package.json",
        "libs/ui/tsconfig.json",
    )
}

fn read_manifest(root: &Path) -> serde_json::Value {
    let content = fs::read_to_string(root.join("libs/ui/package.json")).expect("read manifest");
    serde_json::from_str(&content).expect("parse manifest")
}

#[tokio::test]
async fn packages_esm_and_umd_and_updates_manifest() {
    let project = create_ui_library();
    let root = project.path();

    let outcome = Orchestrator::native(root)
        .run(&ui_options())
        .await
        .expect("configuration is valid");
    assert!(outcome.success(), "bundle failed: {:?}", outcome.failure());

    let dist = root.join("dist/ui");
    let esm = fs::read_to_string(dist.join("example.esm.js")).expect("esm bundle");
    let umd = fs::read_to_string(dist.join("example.umd.js")).expect("umd bundle");

    assert!(esm.contains("Hello, "));
    assert!(esm.contains("export"));
    assert!(umd.contains("Hello, "));
    assert!(umd.contains("Example"), "UMD wrapper should assign the global");
    assert!(dist.join("example.esm.js.map").exists());
    assert!(dist.join("example.umd.js.map").exists());

    assert_eq!(
        read_manifest(root),
        json!({
            "name": "example",
            "version": "1.0.0",
            "main": "./example.umd.js",
            "module": "./example.esm.js",
            "typings": "./index.d.ts"
        })
    );
}

#[tokio::test]
async fn source_maps_can_be_disabled() {
    let project = create_ui_library();
    let root = project.path();

    let outcome = Orchestrator::native(root)
        .run(&ui_options().source_map(false))
        .await
        .unwrap();
    assert!(outcome.success());

    let dist = root.join("dist/ui");
    assert!(dist.join("example.esm.js").exists());
    assert!(!dist.join("example.esm.js.map").exists());
}

#[tokio::test]
async fn unresolved_import_fails_without_touching_manifest() {
    let project = create_ui_library();
    let root = project.path();
    fs::write(
        root.join("libs/ui/src/index.ts"),
        "export { missing } from './does-not-exist';\n",
    )
    .unwrap();
    let before = read_manifest(root);

    let outcome = Orchestrator::native(root).run(&ui_options()).await.unwrap();

    match outcome {
        BuildOutcome::Failed(failure) => assert!(!failure.diagnostics.is_empty()),
        BuildOutcome::Succeeded => panic!("expected bundle failure"),
    }
    assert_eq!(read_manifest(root), before);
    assert!(!root.join("dist/ui/example.esm.js").exists());
    assert!(!root.join("dist/ui/example.umd.js").exists());
}

#[tokio::test]
async fn manifest_dependencies_stay_external() {
    let project = create_ui_library();
    let root = project.path();
    fs::write(
        root.join("libs/ui/src/index.ts"),
        "import { of } from 'rxjs';\nexport const stream = of(1, 2, 3);\n",
    )
    .unwrap();
    fs::write(
        root.join("libs/ui/package.json"),
        r#"{ "name": "example", "peerDependencies": { "rxjs": "^7.0.0" } }"#,
    )
    .unwrap();

    let options = ui_options().global("rxjs", "rxjs");
    let outcome = Orchestrator::native(root).run(&options).await.unwrap();
    assert!(outcome.success(), "bundle failed: {:?}", outcome.failure());

    let esm = fs::read_to_string(root.join("dist/ui/example.esm.js")).unwrap();
    assert!(esm.contains("rxjs"));
}
