use stride_core::db::migrations::latest_version;
use stride_core::db::open_db_in_memory;
use stride_core::{
    EntryKind, EntryListQuery, EntryRepository, InjuryCheckIn, InjurySide, JournalEntry,
    JournalPhoto, RepoError, Sport, SqliteEntryRepository,
};
use rusqlite::Connection;

fn run_entry(title: &str, date: i64) -> JournalEntry {
    JournalEntry::new(
        EntryKind::Activity {
            sport: Sport::Run,
            golf_score: None,
        },
        date,
        title,
        "easy miles",
    )
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let mut entry = run_entry("Morning run", 1_700_000_000_000);
    entry.feeling = Some(8);
    entry.strava_link = Some("https://strava.com/activities/1".to_string());
    let id = repo.create_entry(&entry).unwrap();

    let loaded = repo.get_entry(id).unwrap().unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn every_subtype_roundtrips() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let golf = JournalEntry::new(
        EntryKind::Activity {
            sport: Sport::Golf,
            golf_score: Some(84),
        },
        1,
        "Back nine",
        "",
    );
    let reflection = JournalEntry::new(EntryKind::Reflection, 2, "Thoughts", "long week");
    let recap = JournalEntry::new(
        EntryKind::WeeklyRecap {
            end_date: 1_700_000_000_000,
            week_feeling: 6,
        },
        3,
        "Week 46",
        "solid volume",
    );
    let injury = JournalEntry::new(
        EntryKind::Injury {
            injury_name: "Shin splints".to_string(),
            injury_start_date: 4,
            injury_details: "left shin".to_string(),
            injury_side: InjurySide::Left,
            check_ins: vec![InjuryCheckIn {
                date: 5,
                pain: 4,
                notes: Some("better after rest".to_string()),
            }],
        },
        4,
        "Shin",
        "",
    );
    let milestone = JournalEntry::new(
        EntryKind::Milestone {
            milestone_title: "First marathon".to_string(),
            achievement_value: "3:45:23".to_string(),
            milestone_date: 6,
            milestone_notes: "negative split".to_string(),
        },
        6,
        "Marathon",
        "",
    );

    for entry in [&golf, &reflection, &recap, &injury, &milestone] {
        repo.create_entry(entry).unwrap();
        let loaded = repo.get_entry(entry.id).unwrap().unwrap();
        assert_eq!(&loaded, entry);
    }
}

#[test]
fn update_existing_entry_replaces_photo_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let mut entry = run_entry("Long run", 10);
    entry.photos = vec![
        JournalPhoto::new(Some("start".to_string())),
        JournalPhoto::new(None),
    ];
    repo.create_entry(&entry).unwrap();

    entry.title = "Long run (updated)".to_string();
    entry.photos.remove(0);
    entry.photos.push(JournalPhoto::new(Some("finish".to_string())));
    repo.update_entry(&entry).unwrap();

    let loaded = repo.get_entry(entry.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Long run (updated)");
    assert_eq!(loaded.photos, entry.photos);
}

#[test]
fn update_not_found_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let entry = run_entry("Missing", 0);
    let err = repo.update_entry(&entry).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == entry.id));
}

#[test]
fn delete_cascades_to_photo_rows_and_returns_their_ids() {
    let mut conn = open_db_in_memory().unwrap();

    let entry_id;
    let photo_ids;
    {
        let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

        let mut entry = run_entry("With photos", 20);
        entry.photos = vec![JournalPhoto::new(None), JournalPhoto::new(None)];
        entry_id = repo.create_entry(&entry).unwrap();

        let removed = repo.delete_entry(entry_id).unwrap();
        photo_ids = removed;
        assert!(repo.get_entry(entry_id).unwrap().is_none());
    }

    assert_eq!(photo_ids.len(), 2);
    let photo_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM photos;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(photo_rows, 0);
}

#[test]
fn delete_not_found_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let entry = run_entry("Never stored", 0);
    let err = repo.delete_entry(entry.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == entry.id));
}

#[test]
fn validation_failure_blocks_create_and_update() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let mut invalid = run_entry("Bad feeling", 0);
    invalid.feeling = Some(11);
    let create_err = repo.create_entry(&invalid).unwrap_err();
    assert!(matches!(create_err, RepoError::Validation(_)));

    let mut valid = run_entry("Good feeling", 0);
    valid.feeling = Some(5);
    repo.create_entry(&valid).unwrap();

    valid.feeling = Some(0);
    let update_err = repo.update_entry(&valid).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));

    let query = EntryListQuery::default();
    assert_eq!(repo.list_entries(&query).unwrap().len(), 1);
}

#[test]
fn entry_ids_lists_all_stored_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let first = run_entry("a", 1);
    let second = run_entry("b", 2);
    repo.create_entry(&first).unwrap();
    repo.create_entry(&second).unwrap();

    let ids = repo.entry_ids().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteEntryRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_entries_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteEntryRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("entries"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_entries_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE entries (
            id TEXT PRIMARY KEY NOT NULL,
            date INTEGER NOT NULL,
            title TEXT NOT NULL,
            text TEXT NOT NULL
        );
        CREATE TABLE photos (
            id TEXT PRIMARY KEY NOT NULL,
            entry_id TEXT NOT NULL,
            caption TEXT
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteEntryRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "entries",
            column: "activity_type"
        })
    ));
}
