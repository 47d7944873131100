use tabula_core::Location;
use tabula_settings::{RecentLocations, SettingsStore, ViewPreferences};
use tempfile::tempdir;

#[test]
fn recent_list_survives_a_restart() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("settings.json");

    let mut store = SettingsStore::load(&path).expect("load empty");
    let mut recent = RecentLocations::load(&store);
    for name in ["a.txt", "b.txt", "c.txt"] {
        let location = Location::new(temp.path().join(name)).expect("location");
        recent.add_location(location);
    }
    recent.save(&mut store).expect("save recent");
    store.save().expect("persist");

    let reloaded = SettingsStore::load(&path).expect("reload");
    let recent = RecentLocations::load(&reloaded);
    let names: Vec<_> = recent.iter().map(Location::file_name).collect();
    assert_eq!(names, vec!["c.txt", "b.txt", "a.txt"]);
}

#[test]
fn smaller_maximum_keeps_most_recent_on_reload() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("settings.json");

    let mut store = SettingsStore::load(&path).expect("load empty");
    let mut recent = RecentLocations::new();
    for name in ["a", "b", "c", "d"] {
        recent.add_location(Location::new(temp.path().join(name)).expect("location"));
    }
    recent.save(&mut store).expect("save recent");
    store
        .write("Application/MaximumRecentDocuments", 2)
        .expect("write maximum");
    store.save().expect("persist");

    let recent = RecentLocations::load(&SettingsStore::load(&path).expect("reload"));
    let names: Vec<_> = recent.iter().map(Location::file_name).collect();
    assert_eq!(names, vec!["d", "c"]);
}

#[test]
fn preferences_and_recent_share_one_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("config").join("settings.json");

    let mut store = SettingsStore::load(&path).expect("load empty");
    let mut prefs = ViewPreferences::load(&store);
    prefs.show_path = true;
    prefs.save(&mut store).expect("save prefs");
    let mut recent = RecentLocations::load(&store);
    recent.add_location(Location::new(temp.path().join("notes.json")).expect("location"));
    recent.save(&mut store).expect("save recent");
    store.save().expect("persist");

    let reloaded = SettingsStore::load(&path).expect("reload");
    assert!(ViewPreferences::load(&reloaded).show_path);
    assert_eq!(RecentLocations::load(&reloaded).len(), 1);
}
