// Catalog tests - built-in packages, catalog files and tool lookup

use std::fs;
use std::path::Path;

use tempfile::tempdir;
use toolpipe_core::catalog::{Catalog, CatalogError, paginate};
use toolpipe_core::definition::{create_tool_definition, tool_key};
use toolpipe_core::executor::LocalPackageExecutor;
use toolpipe_tools::ToolRegistry;

#[path = "../support/mod.rs"]
mod support;

const EXTRA: &str = r#"
[[packages]]
name = "@acme/pdf-tools"
version = "1.2.0"
downloads = 40

[[packages.tools]]
export_name = "extractText"
description = "Extract text from a PDF"
parameters = [{ name = "url", type = "string", description = "PDF URL", required = true }]
"#;

#[test]
fn builtin_catalog_lists_every_registered_package() {
    let (registry, catalog) = support::builtin_catalog();
    assert_eq!(catalog.len(), registry.len());
    assert_eq!(catalog.tool_count(), 10);

    let names: Vec<&str> = catalog.packages().iter().map(|p| p.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "built-in packages are listed in name order");
}

#[test]
fn builtin_tools_produce_valid_definitions() {
    let (registry, catalog) = support::builtin_catalog();
    let executor = support::local_executor(&registry);
    for (package, tool) in catalog.tools() {
        let definition =
            create_tool_definition(package, tool, executor.clone(), support::options())
                .unwrap_or_else(|err| panic!("{} failed: {err}", package.name));
        assert_eq!(definition.name(), tool_key(&package.name, &tool.export_name));
        assert_eq!(definition.schema()["type"], "object");
        assert!(definition.name().len() <= 64);
    }
}

#[test]
fn catalog_file_extends_builtin_packages() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, EXTRA).expect("write catalog");

    let registry = ToolRegistry::builtin();
    let catalog = Catalog::load(&registry, Some(&path)).expect("catalog loads");
    assert_eq!(catalog.len(), registry.len() + 1);

    let (package, tool) = catalog.find("@acme/pdf-tools", None).expect("first tool");
    assert_eq!(package.npm.downloads, 40);
    assert_eq!(tool.export_name, "extractText");
    assert_eq!(tool.id, "acme_pdf-tools_extractText");
    assert!(catalog.find("@acme/pdf-tools", Some("missing")).is_none());
}

#[test]
fn catalog_file_cannot_shadow_builtin_package() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(
        &path,
        r#"
[[packages]]
name = "@toolpipe/text-chunk"
version = "9.9.9"

[[packages.tools]]
export_name = "textChunk"
"#,
    )
    .expect("write catalog");

    let result = Catalog::load(&ToolRegistry::builtin(), Some(&path));
    assert!(
        matches!(result, Err(CatalogError::DuplicatePackage(ref name)) if name == "@toolpipe/text-chunk")
    );
}

#[test]
fn package_without_tools_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, "[[packages]]\nname = \"@acme/empty\"\nversion = \"0.1.0\"\n")
        .expect("write catalog");

    let result = Catalog::load(&ToolRegistry::builtin(), Some(&path));
    assert!(matches!(result, Err(CatalogError::NoTools(_))));
}

#[test]
fn unreadable_or_invalid_files_report_their_path() {
    let missing = Path::new("/nonexistent/catalog.toml");
    let err = Catalog::load(&ToolRegistry::builtin(), Some(missing)).unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.user_message().contains("/nonexistent/catalog.toml"));

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, "[[packages]\n").expect("write catalog");
    let err = Catalog::load(&ToolRegistry::builtin(), Some(&path)).unwrap_err();
    assert!(matches!(err, CatalogError::Parse { .. }));
}

#[test]
fn shipped_sample_catalog_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/catalog.toml");
    let catalog = Catalog::load(&ToolRegistry::builtin(), Some(&path)).expect("sample loads");
    let (_, tool) = catalog
        .find("@acme/pdf-tools", Some("extractText"))
        .expect("sample tool");
    assert_eq!(tool.parameters.len(), 2);
    assert!(tool.parameters[0].required);
}

#[tokio::test]
async fn hosted_package_fails_on_local_executor() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("catalog.toml");
    fs::write(&path, EXTRA).expect("write catalog");

    let registry = ToolRegistry::builtin();
    let catalog = Catalog::load(&registry, Some(&path)).expect("catalog loads");
    let (package, tool) = catalog.find("@acme/pdf-tools", None).expect("tool");
    let definition = create_tool_definition(
        package,
        tool,
        std::sync::Arc::new(LocalPackageExecutor::new(registry)),
        support::options(),
    )
    .expect("definition");

    let err = definition
        .execute(serde_json::json!({"url": "https://example.com/a.pdf"}))
        .await
        .unwrap_err();
    assert!(err.user_message().contains("not available"));
}

#[test]
fn pagination_clamps_page_and_limit() {
    let items: Vec<u32> = (1..=45).collect();

    let page = paginate(&items, None, None);
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_more());

    let last = paginate(&items, Some(3), Some(20));
    assert_eq!(last.items, (41..=45).collect::<Vec<_>>());
    assert!(!last.has_more());

    let clamped = paginate(&items, Some(0), Some(1_000));
    assert_eq!(clamped.page, 1);
    assert_eq!(clamped.limit, 100);
    assert_eq!(clamped.items.len(), 45);

    assert!(paginate(&items, Some(9), Some(10)).items.is_empty());
}
