//! Behaviour-driven tests for adapter selection and completion.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use super::support::{Harness, MemoryDocument, Reply, SETTLE_TIMEOUT, document_path};
use crate::completion::{COMPLETION_METHOD, CompletionView};
use crate::config::ClientConfig;
use crate::language::Language;
use crate::manager::lock_manager;

/// State shared across steps.
#[derive(Default)]
struct SelectionWorld {
    harness: Option<Harness>,
    last_selection: Option<bool>,
    view: Option<CompletionView>,
}

impl SelectionWorld {
    fn harness(&self) -> &Harness {
        self.harness.as_ref().expect("manager not created")
    }
}

#[fixture]
fn world() -> RefCell<SelectionWorld> {
    RefCell::new(SelectionWorld::default())
}

fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}

fn parse_language(value: &str) -> Language {
    strip_quotes(value).parse().expect("known language")
}

// --- Given steps ---

#[given("a manager with go and luau adapters")]
fn given_manager(world: &RefCell<SelectionWorld>) {
    world.borrow_mut().harness = Some(Harness::new(&[Language::Go, Language::Luau]));
}

#[given("the file {path} is open")]
fn given_open_file(world: &RefCell<SelectionWorld>, path: String) {
    world
        .borrow()
        .harness()
        .open(&document_path(strip_quotes(&path)));
}

#[given("the luau server answers completions with print and local")]
fn given_luau_completions(world: &RefCell<SelectionWorld>) {
    world.borrow().harness().handle(Language::Luau).script(
        COMPLETION_METHOD,
        Reply::Result(json!([
            { "label": "print", "kind": 2, "sortText": "b" },
            { "label": "print", "kind": 2, "sortText": "a" },
            { "label": "local", "kind": 14, "sortText": "c" }
        ])),
    );
}

// --- When steps ---

#[when("the file {path} is selected")]
fn when_file_selected(world: &RefCell<SelectionWorld>, path: String) {
    let mut borrow = world.borrow_mut();
    let selected = lock_manager(&borrow.harness().manager)
        .select_adapter_for_file(&document_path(strip_quotes(&path)));
    borrow.last_selection = Some(selected);
}

#[when("the file {path} is opened")]
fn when_file_opened(world: &RefCell<SelectionWorld>, path: String) {
    given_open_file(world, path);
}

#[when("completion is requested after {text}")]
fn when_completion_requested(world: &RefCell<SelectionWorld>, text: String) {
    let mut borrow = world.borrow_mut();
    let text = strip_quotes(&text);
    let character = u32::try_from(text.len()).expect("short line");
    let view = {
        let engine = borrow
            .harness()
            .engine(Arc::new(MemoryDocument::at_end(text)), &ClientConfig::default());
        let id = engine.request_completion(&document_path("init.luau"), 0, character);
        assert!(engine.wait_until_settled(id, SETTLE_TIMEOUT), "completion never settled");
        engine.view()
    };
    borrow.view = Some(view);
}

// --- Then steps ---

#[then("the active adapter is {language}")]
fn then_active_adapter(world: &RefCell<SelectionWorld>, language: String) {
    let borrow = world.borrow();
    let active = lock_manager(&borrow.harness().manager).active_language();
    assert_eq!(active, Some(parse_language(&language)));
}

#[then("the selection is rejected")]
fn then_selection_rejected(world: &RefCell<SelectionWorld>) {
    assert_eq!(world.borrow().last_selection, Some(false));
}

#[then("the {language} server is still running")]
fn then_server_running(world: &RefCell<SelectionWorld>, language: String) {
    let borrow = world.borrow();
    let language = parse_language(&language);
    assert!(lock_manager(&borrow.harness().manager).is_ready(language));
    assert_eq!(borrow.harness().handle(language).shutdown_calls(), 0);
}

#[then("the completion list is {labels}")]
fn then_completion_list(world: &RefCell<SelectionWorld>, labels: String) {
    let borrow = world.borrow();
    let view = borrow.view.as_ref().expect("no completion requested");
    let actual: Vec<&str> = view.items.iter().map(|item| item.label.as_str()).collect();
    let expected: Vec<&str> = strip_quotes(&labels).split(", ").collect();
    assert_eq!(actual, expected);
}

#[then("the first item is selected")]
fn then_first_selected(world: &RefCell<SelectionWorld>) {
    let borrow = world.borrow();
    let view = borrow.view.as_ref().expect("no completion requested");
    assert!(view.visible);
    assert_eq!(view.selected_index, 0);
}

// --- Scenario bindings ---

#[scenario(
    path = "tests/features/adapter_selection.feature",
    name = "Go files activate the Go adapter"
)]
fn go_files_activate_go(world: RefCell<SelectionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/adapter_selection.feature",
    name = "Luau files activate the Luau adapter"
)]
fn luau_files_activate_luau(world: RefCell<SelectionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/adapter_selection.feature",
    name = "Unrecognised files leave the active adapter untouched"
)]
fn unrecognised_files_are_rejected(world: RefCell<SelectionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/adapter_selection.feature",
    name = "Switching adapters keeps the previous server running"
)]
fn switching_keeps_previous_server(world: RefCell<SelectionWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/adapter_selection.feature",
    name = "Completion ranks prefix matches first"
)]
fn completion_ranks_prefix_matches(world: RefCell<SelectionWorld>) {
    let _ = world;
}
