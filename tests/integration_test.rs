use apidoc_from_source::{
    error::Error,
    input::Encoding,
    language::GrammarRegistry,
    pipeline::{generate, BuildOutcome},
    scanner::FileScanner,
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop")
}

/// Helper function to create a temporary project from `(path, content)` pairs
fn create_test_project(files: Vec<(String, String)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn generate_from(root: &Path, jobs: usize) -> BuildOutcome {
    let registry = GrammarRegistry::builtin();
    let scan = FileScanner::new(root.to_path_buf(), &registry)
        .recursive(true)
        .scan()
        .expect("Failed to scan directory");
    generate(&registry, scan.sources, jobs)
}

fn as_json(outcome: &BuildOutcome) -> Value {
    serde_json::to_value(&outcome.documents).unwrap()
}

#[test]
fn test_scan_finds_every_language() {
    let registry = GrammarRegistry::builtin();
    let scan = FileScanner::new(fixture_dir(), &registry).scan().unwrap();

    let found: Vec<(String, String)> = scan
        .sources
        .iter()
        .map(|s| {
            (
                s.path.file_name().unwrap().to_string_lossy().to_string(),
                s.language.clone(),
            )
        })
        .collect();
    assert_eq!(
        found,
        vec![
            ("catalog.h".to_string(), "cpp".to_string()),
            ("inventory.js".to_string(), "js".to_string()),
            ("legacy.rb".to_string(), "ruby".to_string()),
            ("main.go".to_string(), "go".to_string()),
            ("orders.php".to_string(), "php".to_string()),
            ("stock.c".to_string(), "c".to_string()),
        ]
    );
}

#[test]
fn test_end_to_end_generation() {
    let outcome = generate_from(&fixture_dir(), 0);

    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    assert_eq!(
        outcome.documents.keys().cloned().collect::<Vec<_>>(),
        vec!["index".to_string(), "orders".to_string()]
    );

    let index = &outcome.documents["index"];
    assert_eq!(
        index.paths.keys().cloned().collect::<Vec<_>>(),
        vec![
            "/inventory".to_string(),
            "/products/{id}".to_string(),
            "/stock/{sku}".to_string()
        ]
    );

    let orders = &outcome.documents["orders"];
    assert_eq!(
        orders.paths.keys().cloned().collect::<Vec<_>>(),
        vec!["/orders".to_string(), "/orders/{id}".to_string()]
    );
}

#[test]
fn test_info_is_collected() {
    let documents = as_json(&generate_from(&fixture_dir(), 2));
    let index = &documents["index"];

    assert_eq!(index["openapi"], "3.0.3");
    assert_eq!(
        index["info"],
        json!({
            "title": "Shop API",
            "description": "the shop backend",
            "contact": { "name": "shop team", "email": "team@example.com" },
            "license": { "name": "MIT", "url": "https://opensource.org/licenses/MIT" },
            "version": "1.2.0"
        })
    );
    assert_eq!(
        index["servers"],
        json!([{ "url": "https://api.example.com/v1", "description": "production" }])
    );
    assert_eq!(documents["orders"]["info"]["title"], "Orders API");
    assert_eq!(documents["orders"]["info"]["version"], "0.3.0");
}

#[test]
fn test_operation_details() {
    let documents = as_json(&generate_from(&fixture_dir(), 2));

    let get = &documents["index"]["paths"]["/products/{id}"]["get"];
    assert_eq!(get["summary"], "get a product");
    assert_eq!(get["operationId"], "getProduct");
    assert_eq!(get["tags"], json!(["products"]));
    assert_eq!(
        get["parameters"],
        json!([{
            "name": "id",
            "in": "path",
            "description": "product id",
            "required": true,
            "schema": { "type": "integer" }
        }])
    );
    let schema = &get["responses"]["200"]["content"]["application/json"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["name"]["type"], "string");
    assert_eq!(schema["properties"]["price"]["type"], "number");
    assert_eq!(get["responses"]["404"], json!({ "description": "no such product" }));

    let put = &documents["index"]["paths"]["/products/{id}"]["put"];
    assert_eq!(put["requestBody"]["content"]["application/json"]["schema"]["type"], "object");

    let query = &documents["index"]["paths"]["/inventory"]["get"]["parameters"][0];
    assert_eq!(query["in"], "query");
    assert_eq!(query["schema"], json!({ "type": "array", "items": { "type": "string" } }));
    assert_eq!(query["style"], "form");
    assert_eq!(query["explode"], true);

    let stock = &documents["index"]["paths"]["/inventory"]["get"]["responses"]["200"]["content"]["application/json"]["schema"];
    assert_eq!(stock["type"], "array");
    assert_eq!(stock["items"]["properties"]["sku"]["description"], "stock keeping unit");
    assert_eq!(stock["items"]["properties"]["level"]["type"], "integer");
}

#[test]
fn test_request_example_and_headers() {
    let documents = as_json(&generate_from(&fixture_dir(), 1));
    let post = &documents["orders"]["paths"]["/orders"]["post"];

    assert_eq!(post["parameters"][0]["name"], "X-Token");
    assert_eq!(post["parameters"][0]["in"], "header");
    let media = &post["requestBody"]["content"]["application/json"];
    assert_eq!(media["schema"]["properties"]["quantity"]["type"], "integer");
    assert_eq!(media["examples"]["order"]["value"], json!({ "product": 1, "quantity": 2 }));
    assert_eq!(post["responses"]["201"]["description"], "created");

    let delete = &documents["orders"]["paths"]["/orders/{id}"]["delete"];
    assert_eq!(delete["responses"]["204"], json!({ "description": "cancelled" }));
}

#[test]
fn test_hidden_and_ignored_markers_produce_nothing() {
    let yaml = serialize_yaml(&generate_from(&fixture_dir(), 0).documents).unwrap();

    for path in ["/hidden", "/nope", "/never", "/internal/health", "/readme"] {
        assert!(!yaml.contains(path), "{} should not be documented", path);
    }
}

#[test]
fn test_output_does_not_depend_on_worker_count() {
    let single = serialize_json(&generate_from(&fixture_dir(), 1).documents).unwrap();
    for jobs in [2, 4, 16] {
        let parallel = serialize_json(&generate_from(&fixture_dir(), jobs).documents).unwrap();
        assert_eq!(single, parallel);
    }
}

#[test]
fn test_many_files_into_one_group() {
    const FILES: usize = 40;

    let mut files: Vec<(String, String)> = (0..FILES)
        .map(|i| {
            (
                format!("items/item_{:02}.go", i),
                format!(
                    "package items\n\n// @api GET /items/{i} item {i}\n// @apiGroup bulk\n// @apiSuccess 200 item {i}\nfunc Item{i}() {{}}\n",
                    i = i
                ),
            )
        })
        .collect();
    files.push((
        "doc.js".to_string(),
        "/**\n * @apiDoc Bulk\n * @apiGroup bulk\n * @apiVersion 2.0.0\n */\n".to_string(),
    ));
    let project = create_test_project(files);

    let outcome = generate_from(project.path(), 8);

    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    let bulk = &outcome.documents["bulk"];
    assert_eq!(bulk.paths.len(), FILES);
    assert_eq!(bulk.info.title, "Bulk");
}

#[test]
fn test_failing_group_does_not_block_others() {
    let project = create_test_project(vec![
        (
            "good.go".to_string(),
            "// @apiDoc Good\n// @apiVersion 1.0.0\n\n// @api GET /ok fine\n// @apiSuccess 200 ok\n".to_string(),
        ),
        (
            "bad.rb".to_string(),
            "# @apiDoc Bad\n# @apiGroup bad\n# @apiVersion one\n".to_string(),
        ),
        (
            "broken.php".to_string(),
            "<?php\n// @api GET /broken nope\n// @apiSuccess 2000 not a status\n".to_string(),
        ),
    ]);

    let outcome = generate_from(project.path(), 0);

    assert_eq!(outcome.documents.keys().cloned().collect::<Vec<_>>(), vec!["index".to_string()]);
    assert!(!outcome.documents["index"].paths.contains_key("/broken"));
    assert_eq!(outcome.errors.len(), 2);

    // scan errors come before group errors
    match &outcome.errors[0] {
        Error::Syntax(e) => {
            assert!(e.file.ends_with("broken.php"));
            assert_eq!(e.line, 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    match &outcome.errors[1] {
        Error::Validation { group, error } => {
            assert_eq!(group, "bad");
            assert_eq!(error.field, "info.version");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unterminated_comment_reports_file_and_line() {
    let project = create_test_project(vec![
        (
            "ok.c".to_string(),
            "/* @apiDoc Fine\n   @apiVersion 1.0.0 */\n\n// @api GET /found found\n// @apiSuccess 200 ok\n".to_string(),
        ),
        (
            "open.c".to_string(),
            "int a;\n\n/* @api GET /lost lost\n   @apiSuccess 200 ok\n".to_string(),
        ),
    ]);

    let outcome = generate_from(project.path(), 2);

    assert_eq!(outcome.errors.len(), 1);
    match &outcome.errors[0] {
        Error::Syntax(e) => {
            assert!(e.file.ends_with("open.c"));
            assert_eq!(e.line, 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    let paths: Vec<_> = outcome.documents["index"].paths.keys().cloned().collect();
    assert_eq!(paths, vec!["/found".to_string()]);
}

#[test]
fn test_gbk_sources_are_decoded() {
    let project = TempDir::new().unwrap();
    let mut bytes = b"// @apiDoc Shop\n// @apiVersion 1.0.0\n\n// @api GET /users ".to_vec();
    // "用户列表" in GBK
    bytes.extend([0xd3, 0xc3, 0xbb, 0xa7, 0xc1, 0xd0, 0xb1, 0xed]);
    bytes.extend(b"\n// @apiSuccess 200 ok\n");
    std::fs::write(project.path().join("users.go"), &bytes).unwrap();

    let registry = GrammarRegistry::builtin();
    let scan = FileScanner::new(project.path().to_path_buf(), &registry)
        .encoding(Encoding::Gbk)
        .scan()
        .unwrap();
    let outcome = generate(&registry, scan.sources, 1);

    assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
    let documents = as_json(&outcome);
    assert_eq!(documents["index"]["paths"]["/users"]["get"]["summary"], "用户列表");
}
