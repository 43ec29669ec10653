mod common;

use common::{Fixture, TestResult, context_url, xml_context};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use xchain::{
    Catalog, CatalogBuilder, CatalogError, EngineBuilder, EngineConfig, EngineError,
    JsonCatalogBuilder, Outcome,
};
use xchain_resource::{BaseUrlTranslationStrategy, FileUrlExists, ResourceError, Url};

const XHTML: &str = "http://www.w3.org/1999/xhtml";

fn greeting_catalog() -> String {
    json!({
        "namespaces": { "h": XHTML },
        "commands": {
            "greet": { "type": "chain", "commands": [
                { "type": "variable", "name": "who", "value": "World" },
                { "type": "template", "body": [
                    { "type": "element", "name": "h:p", "attributes": { "class": "greeting" }, "body": [
                        { "type": "text", "value": "Hello, " },
                        { "type": "text", "value": "$who" }
                    ]}
                ]}
            ]},
            "halt": { "type": "chain", "commands": [
                { "type": "stop" },
                { "type": "fail", "message": "not reached" }
            ]},
            "broken": { "type": "fail", "message": "boom" }
        }
    })
    .to_string()
}

#[test]
fn test_execute_writes_xml() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("site/catalog.json", &greeting_catalog());
    let engine = fixture.engine()?;

    let (mut context, buffer) = xml_context();
    let outcome = engine.execute(&context_url("site/catalog.json"), "greet", &mut context)?;

    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(
        buffer.contents(),
        format!("<h:p xmlns:h=\"{}\" class=\"greeting\">Hello, World</h:p>", XHTML)
    );
    Ok(())
}

#[test]
fn test_stop_and_failure_outcomes() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("catalog.json", &greeting_catalog());
    let engine = fixture.engine()?;
    let id = context_url("catalog.json");

    let (mut context, _) = xml_context();
    assert_eq!(engine.execute(&id, "halt", &mut context)?, Outcome::Stop);

    let err = engine.execute(&id, "broken", &mut context).unwrap_err();
    assert!(matches!(err, EngineError::Command(_)));
    assert!(err.to_string().contains("boom"));

    let err = engine.execute(&id, "missing", &mut context).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Catalog(CatalogError::UnknownCommand { .. })
    ));
    Ok(())
}

#[test]
fn test_search_path_order() -> TestResult {
    let first = Fixture::new();
    let second = Fixture::new();
    first.write("only-first.json", r#"{ "commands": { "a": { "type": "stop" } } }"#);
    second.write("only-first.json", r#"{ "commands": { "b": { "type": "stop" } } }"#);
    second.write("only-second.json", r#"{ "commands": { "c": { "type": "stop" } } }"#);

    let config = EngineConfig {
        search_path: vec![first.path().to_path_buf(), second.path().to_path_buf()],
        ..EngineConfig::default()
    };
    let engine = EngineBuilder::new().with_config(config).build()?;

    assert_eq!(engine.catalog(&context_url("only-first.json"))?.command_names(), vec!["a"]);
    assert_eq!(engine.catalog(&context_url("only-second.json"))?.command_names(), vec!["c"]);
    Ok(())
}

#[test]
fn test_unknown_authority_is_not_found() -> TestResult {
    let fixture = Fixture::new();
    let engine = fixture.engine()?;

    let err = engine.catalog("resource://nowhere/catalog.json").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Catalog(CatalogError::Resource(ResourceError::NotFound(_)))
    ));
    Ok(())
}

#[test]
fn test_cached_translation_wins_over_search_path() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("catalog.json", r#"{ "commands": { "searched": { "type": "stop" } } }"#);
    let pinned = fixture.write("pinned/other.json", r#"{ "commands": { "pinned": { "type": "stop" } } }"#);

    let mut config = fixture.config();
    config
        .cached_translations
        .insert(context_url("catalog.json"), Url::from_file_path(&pinned).unwrap().to_string());
    let engine = EngineBuilder::new().with_config(config).build()?;

    assert_eq!(engine.catalog(&context_url("catalog.json"))?.command_names(), vec!["pinned"]);
    Ok(())
}

#[test]
fn test_install_and_remove_strategy() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("one.json", r#"{ "commands": { "one": { "type": "stop" } } }"#);
    fixture.write("two.json", r#"{ "commands": { "two": { "type": "stop" } } }"#);
    let engine = EngineBuilder::new().build()?;

    let base = Url::from_directory_path(fixture.path()).unwrap();
    let strategy = Arc::new(BaseUrlTranslationStrategy::new(base, Arc::new(FileUrlExists)));
    assert!(engine.install_strategy("app", strategy).is_none());
    assert_eq!(engine.registry().authorities(), vec!["app".to_string()]);

    engine.catalog("resource://app/one.json")?;
    assert!(engine.remove_strategy("app").is_some());

    // Already built catalogs stay cached; new ones can no longer be resolved.
    assert!(engine.catalog("resource://app/one.json").is_ok());
    assert!(engine.catalog("resource://app/two.json").is_err());
    Ok(())
}

#[test]
fn test_plain_file_system_id() -> TestResult {
    let fixture = Fixture::new();
    let path = fixture.write("catalog.json", &greeting_catalog());
    let engine = EngineBuilder::new().build()?;

    let (mut context, buffer) = xml_context();
    engine.execute(path.to_str().unwrap(), "greet", &mut context)?;
    assert!(buffer.contents().ends_with("Hello, World</h:p>"));
    Ok(())
}

/// Counts how often a catalog is actually built.
#[derive(Debug, Default)]
struct CountingBuilder {
    builds: AtomicUsize,
}

impl CatalogBuilder for CountingBuilder {
    fn build(&self, system_id: &str, source: &[u8]) -> Result<Catalog, CatalogError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        JsonCatalogBuilder.build(system_id, source)
    }
}

#[test]
fn test_concurrent_first_requests_build_once() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("catalog.json", &greeting_catalog());
    let builder = Arc::new(CountingBuilder::default());
    let engine = Arc::new(
        EngineBuilder::new()
            .with_config(fixture.config())
            .with_catalog_builder(builder.clone())
            .build()?,
    );

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.catalog(&context_url("catalog.json")).unwrap()
            })
        })
        .collect();
    let catalogs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(builder.builds.load(Ordering::SeqCst), 1);
    assert!(catalogs.iter().all(|c| Arc::ptr_eq(c, &catalogs[0])));
    Ok(())
}

#[test]
fn test_failed_build_is_retried() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("catalog.json", "{ not json");
    let builder = Arc::new(CountingBuilder::default());
    let engine = EngineBuilder::new()
        .with_config(fixture.config())
        .with_catalog_builder(builder.clone())
        .build()?;
    let id = context_url("catalog.json");

    assert!(matches!(
        engine.catalog(&id),
        Err(EngineError::Catalog(CatalogError::Build { .. }))
    ));

    fixture.write("catalog.json", &greeting_catalog());
    engine.catalog(&id)?;
    assert_eq!(builder.builds.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_templates_persisted_to_output_dir() -> TestResult {
    let fixture = Fixture::new();
    fixture.write("page.tpl", "<page/>");
    let out = tempfile::tempdir()?;
    let config = EngineConfig {
        templates_output_dir: Some(out.path().to_path_buf()),
        ..fixture.config()
    };
    let engine = EngineBuilder::new().with_config(config).build()?;

    let compiled = engine.templates(&context_url("page.tpl"))?;
    assert_eq!(compiled.bytes, b"<page/>");
    let path = compiled.path.as_ref().unwrap();
    assert!(path.starts_with(out.path()));
    assert_eq!(std::fs::read(path)?, b"<page/>");

    let again = engine.templates(&context_url("page.tpl"))?;
    assert!(Arc::ptr_eq(&compiled, &again));
    Ok(())
}

#[test]
fn test_execute_opens_an_execution_scope() -> TestResult {
    let fixture = Fixture::new();
    fixture.write(
        "catalog.json",
        &json!({
            "commands": {
                "stamp": { "type": "chain", "commands": [
                    { "type": "variable", "name": "stamp", "value": "run", "scope": "execution" },
                    { "type": "template", "body": [
                        { "type": "element", "name": "p", "body": [ { "type": "text", "value": "$stamp" } ] }
                    ]}
                ]}
            }
        })
        .to_string(),
    );
    let engine = fixture.engine()?;
    let id = context_url("catalog.json");
    let stamp = xchain::QName::local("stamp");

    let (mut context, buffer) = xml_context();
    assert_eq!(engine.execute(&id, "stamp", &mut context)?, Outcome::Continue);
    assert_eq!(buffer.contents(), "<p>run</p>");
    assert!(!context.is_open(xchain::Scope::Execution));
    assert!(context.get(&stamp).is_none());

    // A scope the caller opened is reused and left open.
    let (mut context, _) = xml_context();
    context.start_scope(xchain::Scope::Execution);
    engine.execute(&id, "stamp", &mut context)?;
    assert!(context.is_open(xchain::Scope::Execution));
    assert_eq!(context.get(&stamp), Some(&json!("run")));
    Ok(())
}
