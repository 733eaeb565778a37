//! Integration tests for the parselab authoring pipeline.
//!
//! These tests exercise the full flow: document loading from disk, session
//! mutations through the command layer, persistence, and re-running the
//! saved parselet. They write real files to a temp directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde_json::json;

use parselab::cli::Args;
use parselab::command::{Command, Outcome, dispatch};
use parselab::config::ShellConfig;
use parselab::error::SessionError;
use parselab::formatter::create_formatter;
use parselab::parselet::Parselet;
use parselab::parselet::key::decode_name;
use parselab::repl::run_script;
use parselab::session::{Session, SessionState};

const CATALOG: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Catalog</title></head>
  <body>
    <h1 class="page-title">Spring catalog</h1>
    <div class="person">
      <h2>Ada Lovelace</h2>
      <a class="mail" href="mailto:ada@example.com">contact</a>
    </div>
    <ul class="products">
      <li><a href="/p/1">Teapot</a><span class="price">12</span></li>
      <li><a href="/p/2">Kettle</a><span class="price">30</span></li>
      <li><a href="/p/3">Mug</a></li>
    </ul>
  </body>
</html>
"#;

/// Create a temporary directory with a unique name for each test.
fn temp_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("parselab_integration_{test_name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn open(dir: &Path, output: &str) -> Session {
    let page = write_file(dir, "catalog.html", CATALOG);
    Session::open(
        page.to_str().unwrap(),
        dir.join(output),
        &ShellConfig::default(),
    )
    .unwrap()
}

fn run_line(session: &mut Session, line: &str) -> Result<Outcome, SessionError> {
    dispatch(session, Command::parse(line).unwrap().unwrap())
}

fn args(parselet: PathBuf, input: &Path) -> Args {
    Args {
        parselet,
        input: input.to_str().unwrap().to_string(),
        config: Some(PathBuf::from("/nonexistent/.parselab.yml")),
        format: None,
        script: None,
        resume: false,
        debug: false,
    }
}

// ---------- Full workflow ----------

#[test]
fn build_save_and_extract_catalog() {
    let dir = temp_dir("workflow");
    let mut s = open(&dir, "catalog.json");

    assert_eq!(
        run_line(&mut s, "test ul.products li a").unwrap(),
        Outcome::Value(json!(["Teapot", "Kettle", "Mug"]))
    );

    for line in [
        "add title h1.page-title",
        "add_object person div.person",
        "add_nested person name h2",
        "add_nested person email a.mail@href",
        "add_list products ul.products > li",
        "add_nested products name a",
        "add_nested products url a@href",
        "add_nested products price span.price",
    ] {
        run_line(&mut s, line).unwrap();
    }

    let saved = run_line(&mut s, "save").unwrap();
    assert_eq!(saved, Outcome::Saved(dir.join("catalog.json")));
    assert_eq!(s.state(), SessionState::Persisted);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("catalog.json")).unwrap()).unwrap();
    assert_eq!(
        written,
        json!({
            "title": "h1.page-title",
            "person(div.person)": {"name": "h2", "email": "a.mail@href"},
            "products(ul.products > li)": [{"name": "a", "url": "a@href", "price": "span.price"}],
        })
    );

    let Outcome::Value(result) = run_line(&mut s, "extract").unwrap() else {
        panic!("extract should return a value");
    };
    assert_eq!(
        result,
        json!({
            "title": "Spring catalog",
            "person": {"name": "Ada Lovelace", "email": "mailto:ada@example.com"},
            "products": [
                {"name": "Teapot", "url": "/p/1", "price": "12"},
                {"name": "Kettle", "url": "/p/2", "price": "30"},
                {"name": "Mug", "url": "/p/3"},
            ],
        })
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn saved_file_is_indented_with_four_spaces() {
    let dir = temp_dir("indent");
    let mut s = open(&dir, "spec.json");
    s.add_simple("title", "h1").unwrap();
    s.save().unwrap();
    assert_eq!(
        fs::read_to_string(dir.join("spec.json")).unwrap(),
        "{\n    \"title\": \"h1\"\n}\n"
    );
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn persist_round_trip_json_and_yaml() {
    let dir = temp_dir("round_trip");
    let mut s = open(&dir, "spec.json");
    s.add_simple("title", "h1").unwrap();
    s.add_list("products", "li").unwrap();
    s.add_nested("products", "name", "a").unwrap();
    s.add_object("person", "div.person").unwrap();
    s.add_nested("person", "name", "h2").unwrap();

    for name in ["spec.json", "spec.yaml"] {
        let path = dir.join(name);
        s.persist(&path).unwrap();
        assert_eq!(&Parselet::load(&path).unwrap(), s.parselet(), "{name}");
    }
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn save_overwrites_previous_content() {
    let dir = temp_dir("overwrite");
    let out = write_file(&dir, "spec.json", r#"{"old": "stuff", "more": "keys"}"#);
    let mut s = open(&dir, "spec.json");
    s.add_simple("fresh", "h1").unwrap();
    s.save().unwrap();
    let loaded = Parselet::load(&out).unwrap();
    assert_eq!(loaded.names(), vec!["fresh"]);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn adds_continue_after_save() {
    let dir = temp_dir("continue");
    let mut s = open(&dir, "spec.json");
    s.add_list("items", "li").unwrap();
    s.save().unwrap();
    s.add_nested("items", "title", "a").unwrap();
    assert_eq!(s.state(), SessionState::Unsaved);
    s.save().unwrap();

    let loaded = Parselet::load(&dir.join("spec.json")).unwrap();
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        json!({"items(li)": [{"title": "a"}]})
    );
    fs::remove_dir_all(&dir).ok();
}

// ---------- Key handling ----------

#[test]
fn every_stored_key_decodes_to_a_unique_name() {
    let dir = temp_dir("unique_names");
    let mut s = open(&dir, "spec.json");
    s.add_simple("a", "x").unwrap();
    s.add_list("a", "li").unwrap();
    s.add_object("b", "div").unwrap();
    s.add_simple("b", "p").unwrap();
    s.add_list("c", "li:nth-child(2n)").unwrap();

    let names: Vec<&str> = s.parselet().iter().map(|(k, _)| decode_name(k)).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_parent_error_lists_registered_names() {
    let dir = temp_dir("invalid_parent");
    let mut s = open(&dir, "spec.json");
    s.add_object("person", "div.person").unwrap();
    let err = s.add_nested("missing", "x", "y").unwrap_err();
    assert!(matches!(err, SessionError::InvalidParent { .. }));
    assert!(err.to_string().contains("person"));
    fs::remove_dir_all(&dir).ok();
}

// ---------- Documents ----------

#[test]
fn fetch_switches_document_but_keeps_parselet() {
    let dir = temp_dir("fetch");
    let mut s = open(&dir, "spec.json");
    s.add_simple("title", "h1").unwrap();

    let other = write_file(&dir, "other.html", "<h1>Another page</h1>");
    run_line(&mut s, &format!("fetch {}", other.display())).unwrap();
    assert_eq!(
        run_line(&mut s, "extract").unwrap(),
        Outcome::Value(json!({"title": "Another page"}))
    );
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fetch_with_parselet_starts_over() {
    let dir = temp_dir("fetch_new");
    let mut s = open(&dir, "spec.json");
    s.add_simple("title", "h1").unwrap();

    let other = write_file(&dir, "other.html", "<h1>Another page</h1>");
    let target = dir.join("other.json");
    run_line(
        &mut s,
        &format!("fetch {} {}", other.display(), target.display()),
    )
    .unwrap();
    assert!(s.parselet().is_empty());
    assert_eq!(s.output(), target.as_path());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn failed_fetch_keeps_session_intact() {
    let dir = temp_dir("fetch_fail");
    let mut s = open(&dir, "spec.json");
    s.add_simple("title", "h1").unwrap();
    let before = s.document().source().to_string();

    let err = run_line(&mut s, "fetch /no/such/file.html").unwrap_err();
    assert!(matches!(err, SessionError::Load(_)));
    assert_eq!(s.document().source(), before);
    assert_eq!(s.parselet().len(), 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn open_missing_document_fails() {
    let result = Session::open(
        "/no/such/catalog.html",
        "spec.json",
        &ShellConfig::default(),
    );
    assert!(matches!(result, Err(SessionError::Load(_))));
}

// ---------- Scripts and the binary entry point ----------

#[test]
fn script_builds_parselet() {
    let dir = temp_dir("script");
    let mut s = open(&dir, "spec.json");
    let script = format!(
        "add_list products ul.products > li\nadd_nested products name a\nsave {}\n",
        dir.join("from_script.json").display()
    );
    let mut out = Vec::new();
    let formatter = create_formatter("text");
    let count = run_script(&mut s, Cursor::new(script), &mut out, &*formatter).unwrap();
    assert_eq!(count, 3);
    assert!(dir.join("from_script.json").exists());
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Wrote parselet:"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_with_script_returns_zero() {
    let dir = temp_dir("run_ok");
    let page = write_file(&dir, "catalog.html", CATALOG);
    let out = dir.join("spec.json");
    let script = write_file(&dir, "build.txt", "add title h1\nsave\n");

    let mut a = args(out.clone(), &page);
    a.script = Some(script);
    assert_eq!(parselab::run(a).unwrap(), 0);
    assert_eq!(Parselet::load(&out).unwrap().names(), vec!["title"]);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_with_failing_script_returns_one() {
    let dir = temp_dir("run_fail");
    let page = write_file(&dir, "catalog.html", CATALOG);
    let script = write_file(&dir, "build.txt", "add_nested nothing a b\n");

    let mut a = args(dir.join("spec.json"), &page);
    a.script = Some(script);
    assert_eq!(parselab::run(a).unwrap(), 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_resume_extends_existing_parselet() {
    let dir = temp_dir("run_resume");
    let page = write_file(&dir, "catalog.html", CATALOG);
    let out = write_file(&dir, "spec.json", r#"{"products(li)": [{"name": "a"}]}"#);
    let script = write_file(&dir, "build.txt", "add_nested products url a@href\nsave\n");

    let mut a = args(out.clone(), &page);
    a.script = Some(script);
    a.resume = true;
    assert_eq!(parselab::run(a).unwrap(), 0);

    let loaded = Parselet::load(&out).unwrap();
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        json!({"products(li)": [{"name": "a", "url": "a@href"}]})
    );
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_with_missing_input_is_fatal() {
    let dir = temp_dir("run_missing");
    let a = args(dir.join("spec.json"), Path::new("/no/such/page.html"));
    let err = parselab::run(a).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load /no/such/page.html"));
    fs::remove_dir_all(&dir).ok();
}
