use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settings_store::{
    Color, DataStore, MemorySink, PassphraseCipher, StoreEvent, StoreOptions, clean,
    symbolic_enum,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Theme {
    Light,
    Dark,
    HighContrast,
}

symbolic_enum!(Theme {
    Light,
    Dark,
    HighContrast
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Connection {
    host: String,
    port: u16,
    secure: bool,
}

fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Test Settings.xml");
    (dir, path)
}

fn open(path: &Path) -> DataStore {
    let mut store = StoreOptions::new(path)
        .cipher(PassphraseCipher::new(1_000))
        .open();
    store.registry_mut().register_enum::<Theme>();
    store.registry_mut().register_structured::<Connection>();
    store
}

#[test]
fn values_round_trip_through_the_file() {
    let (_dir, path) = scratch();
    let at = NaiveDate::from_ymd_opt(2021, 11, 30)
        .unwrap()
        .and_hms_milli_opt(8, 15, 0, 250)
        .unwrap();
    let blob: Vec<u8> = (0..=255).collect();
    let connection = Connection {
        host: "db.local".into(),
        port: 5432,
        secure: true,
    };

    {
        let mut store = open(&path);
        store.set("Types", "I32", &-42i32);
        store.set("Types", "U64", &u64::MAX);
        store.set("Types", "F64", &std::f64::consts::PI);
        store.set("Types", "Bool", &true);
        store.set("Types", "Char", &'λ');
        store.set("Types", "Text", "  spaced <markup> & \"quotes\"  ");
        store.set("Types", "Empty", "");
        store.set("Types", "When", &at);
        store.set("Types", "Blob", &blob);
        store.set("Types", "Color", &Color::argb(10, 20, 30, 40));
        store.set("Types", "Theme", &Theme::HighContrast);
        store.set("Types", "Connection", &connection);
    }

    let store = open(&path);
    assert_eq!(store.get("Types", "I32", 0i32), -42);
    assert_eq!(store.get("Types", "U64", 0u64), u64::MAX);
    assert_eq!(store.get("Types", "F64", 0f64), std::f64::consts::PI);
    assert!(store.get("Types", "Bool", false));
    assert_eq!(store.get("Types", "Char", ' '), 'λ');
    assert_eq!(
        store.get("Types", "Text", String::new()),
        "  spaced <markup> & \"quotes\"  "
    );
    assert_eq!(store.get("Types", "Empty", String::from("x")), "");
    assert_eq!(store.get("Types", "When", at.date().and_hms_opt(0, 0, 0).unwrap()), at);
    assert_eq!(store.get("Types", "Blob", Vec::<u8>::new()), blob);
    assert_eq!(
        store.get("Types", "Color", Color::rgb(0, 0, 0)),
        Color::argb(10, 20, 30, 40)
    );
    assert_eq!(store.get("Types", "Theme", Theme::Light), Theme::HighContrast);
    assert_eq!(
        store.get(
            "Types",
            "Connection",
            Connection {
                host: String::new(),
                port: 0,
                secure: false
            }
        ),
        connection
    );
}

#[test]
fn structured_values_are_child_content() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set(
        "Db",
        "Primary",
        &Connection {
            host: "h".into(),
            port: 1,
            secure: false,
        },
    );

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.contains("<Primary><Connection>"), "{xml}");
}

#[test]
fn missing_values_yield_the_default() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("Present", "k", &1i32);

    assert_eq!(store.get("Absent", "k", 9i32), 9);
    assert_eq!(store.get("Present", "absent", 9i32), 9);
    assert_eq!(store.get("Absent", "k", String::from("d")), "d");
    assert_eq!(store.get("Absent", "k", Theme::Dark), Theme::Dark);
}

#[test]
fn unreadable_values_yield_the_default() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("g", "text", "not a number");

    assert_eq!(store.get("g", "text", 5i32), 5);
    assert_eq!(store.get("g", "text", Theme::Light), Theme::Light);
    assert!(store.get("g", "text", true));
}

#[test]
fn stored_null_is_distinct_from_missing_and_empty() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set_null("g", "nothing");
    store.set("g", "empty", "");

    assert!(store.contains("g", "nothing"));
    assert!(store.is_null("g", "nothing"));
    assert!(!store.is_null("g", "empty"));
    assert!(!store.contains("g", "never"));
    assert_eq!(store.get("g", "empty", String::from("sentinel")), "");

    let sentinel = Some(String::from("sentinel"));
    assert_eq!(store.get_nullable("g", "nothing", sentinel.clone()), None);
    assert_eq!(store.get_nullable("g", "never", sentinel.clone()), sentinel);
    assert_eq!(
        store.get_nullable("g", "empty", sentinel.clone()),
        Some(String::new())
    );

    let reopened = open(&path);
    assert!(reopened.is_null("g", "nothing"));
    assert_eq!(reopened.get_nullable("g", "nothing", Some(7i32)), None);
    assert!(fs::read_to_string(&path).unwrap().contains("xsi:nil=\"true\""));
}

#[test]
fn cleaned_and_raw_names_address_the_same_entry() {
    let (_dir, path) = scratch();
    let mut store = open(&path);

    for name in ["Window Width", "<Window/Width>", "Window\tWidth "] {
        assert_eq!(clean(&clean(name)), clean(name));
        store.set("Main Form", name, &name.len());
        assert_eq!(
            store.get("MainForm", &clean(name), 0usize),
            name.len(),
            "{name:?}"
        );
    }
    assert_eq!(store.keys("Main Form"), vec!["WindowWidth".to_string()]);
}

#[test]
fn groups_do_not_share_keys() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("A", "k", &1i32);

    assert_eq!(store.get("B", "k", -1i32), -1);
    store.set("B", "k", &2i32);
    assert_eq!(store.get("A", "k", 0i32), 1);
    assert_eq!(store.get("B", "k", 0i32), 2);
    assert_eq!(store.get("a", "k", 0i32), 0);
}

#[test]
fn secrets_are_not_stored_in_clear() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    let secret = "correct horse battery staple";

    store.set_secret("Sync", "Password", secret, "passphrase");

    let raw = store.raw_value("Sync", "Password").unwrap();
    assert_ne!(raw, secret);
    assert!(!raw.contains("horse"));
    assert!(!fs::read_to_string(&path).unwrap().contains("horse"));

    assert_eq!(
        store.get_secret("Sync", "Password", String::new(), "passphrase"),
        secret
    );
    assert_eq!(
        store.get_secret("Sync", "Password", String::from("denied"), "wrong"),
        "denied"
    );
}

#[test]
fn encrypted_structured_values_round_trip() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    let connection = Connection {
        host: "secret.host".into(),
        port: 443,
        secure: true,
    };

    store.set_secret("Db", "Primary", &connection, "k");

    assert!(!fs::read_to_string(&path).unwrap().contains("secret.host"));
    let fallback = Connection {
        host: String::new(),
        port: 0,
        secure: false,
    };
    assert_eq!(store.get_secret("Db", "Primary", fallback, "k"), connection);
}

#[test]
fn auto_save_controls_when_the_file_is_written() {
    let (_dir, path) = scratch();
    let mut store = StoreOptions::new(path.clone()).auto_save(false).open();

    store.set("g", "k", &1i32);
    assert!(!path.exists());
    assert!(store.save());
    assert!(path.exists());

    store.set("g", "k", &2i32);
    assert_eq!(open(&path).get("g", "k", 0i32), 1);
    store.save();
    assert_eq!(open(&path).get("g", "k", 0i32), 2);

    store.set_auto_save(true);
    store.set("g", "k", &3i32);
    assert_eq!(open(&path).get("g", "k", 0i32), 3);
}

#[test]
fn removed_groups_are_gone() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("Recent", "File1", "a.txt");
    store.set("Recent", "File2", "b.txt");
    store.set("Other", "k", "v");

    store.remove_group("Recent");

    assert!(!store.group_exists("Recent"));
    assert_eq!(store.get("Recent", "File1", String::from("none")), "none");
    assert_eq!(store.groups(), vec!["Other".to_string()]);
    assert!(!open(&path).group_exists("Recent"));

    store.remove_group("Recent");
    store.remove("Nowhere", "k");
}

#[test]
fn remove_deletes_a_single_entry() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("g", "a", &1i32);
    store.set("g", "b", &2i32);

    store.remove("g", "a");

    assert!(!store.contains("g", "a"));
    assert_eq!(open(&path).keys("g"), vec!["b".to_string()]);
}

#[test]
fn refresh_picks_up_external_changes() {
    let (_dir, path) = scratch();
    let mut first = open(&path);
    let mut second = open(&path);

    second.set("g", "k", "from second");
    assert_eq!(first.get("g", "k", String::new()), "");

    first.refresh_data();
    assert_eq!(first.get("g", "k", String::new()), "from second");
}

#[test]
fn delete_file_resets_the_store() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("g", "k", &1i32);
    assert!(path.exists());

    store.delete_file();

    assert!(!path.exists());
    assert!(store.groups().is_empty());
    store.delete_file();
}

#[test]
fn nullable_reads_decode_values() {
    let (_dir, path) = scratch();
    let mut store = open(&path);
    store.set("g", "count", &3i32);
    store.set("g", "word", "three");

    assert_eq!(store.get_nullable("g", "count", None), Some(3i32));
    assert_eq!(store.get_nullable("g", "word", Some(9i32)), Some(9));
    assert_eq!(store.get_nullable::<i32>("g", "missing", None), None);
}

#[test]
fn failed_delete_keeps_the_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Test Settings.xml");
    fs::create_dir(&path).unwrap();
    let sink = MemorySink::new();

    let mut store = StoreOptions::new(path.clone())
        .auto_save(false)
        .log_sink(sink.clone())
        .open();
    let errors_after_open = sink.errors().len();
    store.set("g", "k", &1i32);

    store.delete_file();

    assert!(path.exists());
    assert_eq!(store.get("g", "k", 0i32), 1);
    assert_eq!(store.groups(), vec!["g".to_string()]);
    assert_eq!(sink.errors().len(), errors_after_open + 1);
}

#[test]
fn refresh_of_a_corrupted_file_starts_empty() {
    let (_dir, path) = scratch();
    let sink = MemorySink::new();
    let mut store = StoreOptions::new(path.clone()).log_sink(sink.clone()).open();
    store.set("g", "k", &1i32);
    assert!(sink.errors().is_empty());

    fs::write(&path, "<Settings><Group Name=\"g\">").unwrap();
    store.refresh_data();

    assert!(store.groups().is_empty());
    assert_eq!(store.get("g", "k", 0i32), 0);
    assert_eq!(sink.errors().len(), 1);
}

#[test]
fn names_starting_with_digits_stay_valid_elements() {
    let (_dir, path) = scratch();
    let mut store = open(&path);

    store.set("1st", "2key", &5i32);

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.contains("<_2key>5</_2key>"), "{xml}");
    assert!(xml.contains("Name=\"_1st\""), "{xml}");
    assert_eq!(open(&path).get("1st", "2key", 0i32), 5);
}

#[test]
fn corrupt_file_is_logged_and_replaced() {
    let (_dir, path) = scratch();
    fs::write(&path, "<Settings><Group Name=\"g\"><k>1</k>").unwrap();
    let sink = MemorySink::new();

    let mut store = StoreOptions::new(path.clone()).log_sink(sink.clone()).open();

    assert!(store.groups().is_empty());
    assert_eq!(sink.errors().len(), 1);

    store.set("g", "k", &2i32);
    assert_eq!(open(&path).get("g", "k", 0i32), 2);
}

#[test]
fn unwritable_location_never_fails_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").unwrap();
    let sink = MemorySink::new();

    let mut store = StoreOptions::new(blocker.join("Settings.xml"))
        .log_sink(sink.clone())
        .open();
    store.set("g", "k", &1i32);

    assert_eq!(store.get("g", "k", 0i32), 1);
    assert!(!store.save());
    assert!(!sink.errors().is_empty());
}

#[test]
fn loaded_is_the_first_event() {
    let (_dir, path) = scratch();
    open(&path).set("g", "k", &1i32);

    let (mut store, mut events) = StoreOptions::new(path.clone()).open_with_events();
    assert_eq!(
        events.try_recv().unwrap(),
        StoreEvent::Loaded {
            path: path.clone(),
            groups: 1
        }
    );

    store.set("g", "k", &2i32);
    assert_eq!(events.try_recv().unwrap(), StoreEvent::Saved { path });
}

#[test]
fn default_group_helpers() {
    let (_dir, path) = scratch();
    let mut store = StoreOptions::new(path).default_group("Prefs").open();

    store.put("Zoom", &1.5f64);

    assert_eq!(store.default_group(), "Prefs");
    assert_eq!(store.get("Prefs", "Zoom", 1.0f64), 1.5);
    assert_eq!(store.fetch("Zoom", 1.0f64), 1.5);
}

#[tokio::test]
async fn opens_in_the_background() {
    let (_dir, path) = scratch();
    open(&path).set("g", "k", "ready");

    let (store, mut events) = StoreOptions::new(path).open_in_background().await.unwrap();

    assert!(matches!(events.try_recv(), Ok(StoreEvent::Loaded { .. })));
    assert_eq!(store.get("g", "k", String::new()), "ready");
}
