use std::collections::VecDeque;
use std::fs;

use tabula_core::Location;
use tabula_settings::SettingsStore;
use tabula_shell::{PromptAnswer, Prompter, SaveChoice, Shell};
use tempfile::tempdir;

#[derive(Default)]
struct Script {
    choices: VecDeque<SaveChoice>,
}

impl Prompter for Script {
    fn confirm_continue(&mut self, _title: &str, _text: &str) -> PromptAnswer {
        PromptAnswer::proceed()
    }

    fn resolve_unsaved(&mut self, _caption: &str) -> SaveChoice {
        self.choices.pop_front().unwrap_or(SaveChoice::Cancel)
    }

    fn ask_save_location(&mut self, _caption: &str) -> Option<Location> {
        None
    }
}

#[test]
fn session_state_survives_restart() {
    let temp = tempdir().expect("tempdir");
    let settings = temp.path().join("config").join("settings.json");
    for name in ["a.txt", "b.txt"] {
        fs::write(temp.path().join(name), name).expect("seed file");
    }

    let store = SettingsStore::load(&settings).expect("load settings");
    let mut shell = Shell::new(store, None, Script::default());
    let a = shell
        .open(Location::new(temp.path().join("a.txt")).expect("location"))
        .expect("open a");
    shell
        .open(Location::new(temp.path().join("b.txt")).expect("location"))
        .expect("open b");
    shell.edit(a, "edited").expect("edit");
    shell.set_path_visible(true);
    shell.prompter_mut().choices.push_back(SaveChoice::Save);
    assert!(shell.quit());
    assert_eq!(
        fs::read_to_string(temp.path().join("a.txt")).expect("read back"),
        "edited"
    );

    let store = SettingsStore::load(&settings).expect("reload settings");
    let shell = Shell::new(store, None, Script::default());
    let recent: Vec<_> = shell.recent().iter().map(Location::file_name).collect();
    assert_eq!(recent, vec!["a.txt", "b.txt"]);
    assert!(shell.path_visible());
    assert!(shell.registry().is_empty());
}

#[test]
fn same_file_name_in_two_directories_is_numbered() {
    let temp = tempdir().expect("tempdir");
    for dir in ["one", "two"] {
        fs::create_dir(temp.path().join(dir)).expect("mkdir");
        fs::write(temp.path().join(dir).join("notes.txt"), dir).expect("seed file");
    }

    let mut shell = Shell::new(SettingsStore::in_memory(), None, Script::default());
    let first = shell
        .open(Location::new(temp.path().join("one/notes.txt")).expect("location"))
        .expect("open one");
    let second = shell
        .open(Location::new(temp.path().join("two/notes.txt")).expect("location"))
        .expect("open two");

    assert_eq!(shell.caption(first), "notes.txt");
    assert_eq!(shell.caption(second), "notes.txt (2)");
    assert_eq!(shell.window_title(), "notes.txt (2)");
}

#[test]
fn json_documents_round_trip_through_the_shell() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("snippet.json");
    fs::write(&path, r#"{ "language": "python", "text": "print(1)", "extra": 3 }"#)
        .expect("seed file");

    let mut shell = Shell::new(SettingsStore::in_memory(), None, Script::default());
    let id = shell
        .open(Location::new(&path).expect("location"))
        .expect("open json");
    let document = shell.registry().get(id).expect("document");
    assert_eq!(document.language(), Some("python"));
    assert_eq!(document.contents(), "print(1)");

    shell.edit(id, "print(2)").expect("edit");
    shell.save(id).expect("save");
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read back")).expect("json");
    assert_eq!(value["language"], "python");
    assert_eq!(value["text"], "print(2)");
}
