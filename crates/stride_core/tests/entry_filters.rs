use stride_core::db::open_db_in_memory;
use stride_core::{
    ActivityType, EntryKind, EntryListQuery, EntryRepository, JournalEntry, Sport,
    SqliteEntryRepository,
};
use uuid::Uuid;

const DAY: i64 = 86_400_000;

fn sport_entry(sport: Sport, title: &str, date: i64) -> JournalEntry {
    JournalEntry::new(
        EntryKind::Activity {
            sport,
            golf_score: None,
        },
        date,
        title,
        "body",
    )
}

fn entry_with_fixed_id(id: &str, title: &str, date: i64) -> JournalEntry {
    JournalEntry::with_id(
        Uuid::parse_str(id).unwrap(),
        EntryKind::Activity {
            sport: Sport::Run,
            golf_score: None,
        },
        date,
        title,
        "body",
    )
}

#[test]
fn list_sorts_by_date_descending() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let oldest = sport_entry(Sport::Run, "oldest", 1 * DAY);
    let newest = sport_entry(Sport::Run, "newest", 3 * DAY);
    let middle = sport_entry(Sport::Run, "middle", 2 * DAY);
    repo.create_entry(&oldest).unwrap();
    repo.create_entry(&newest).unwrap();
    repo.create_entry(&middle).unwrap();

    let listed = repo.list_entries(&EntryListQuery::default()).unwrap();
    let titles: Vec<&str> = listed.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, ["newest", "middle", "oldest"]);
}

#[test]
fn weekly_recap_sorts_by_end_date_not_start_date() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    // Recap covering days 4..=10; its envelope date is day 4.
    let recap = JournalEntry::new(
        EntryKind::WeeklyRecap {
            end_date: 10 * DAY,
            week_feeling: 7,
        },
        4 * DAY,
        "Week recap",
        "",
    );
    // A run on day 7, inside the recapped week.
    let run = sport_entry(Sport::Run, "midweek run", 7 * DAY);
    repo.create_entry(&run).unwrap();
    repo.create_entry(&recap).unwrap();

    let listed = repo.list_entries(&EntryListQuery::default()).unwrap();
    let titles: Vec<&str> = listed.iter().map(|entry| entry.title.as_str()).collect();
    // The recap ends after the run, so it lists first despite starting earlier.
    assert_eq!(titles, ["Week recap", "midweek run"]);
}

#[test]
fn list_filters_by_activity_types() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let run = sport_entry(Sport::Run, "run", 1);
    let swim = sport_entry(Sport::Swim, "swim", 2);
    let reflection = JournalEntry::new(EntryKind::Reflection, 3, "thoughts", "");
    repo.create_entry(&run).unwrap();
    repo.create_entry(&swim).unwrap();
    repo.create_entry(&reflection).unwrap();

    let query = EntryListQuery {
        kinds: Some(vec![ActivityType::Run, ActivityType::Reflection]),
        ..EntryListQuery::default()
    };
    let listed = repo.list_entries(&query).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|entry| {
        entry.activity_type() == ActivityType::Run
            || entry.activity_type() == ActivityType::Reflection
    }));
}

#[test]
fn empty_type_set_matches_no_entries() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    repo.create_entry(&sport_entry(Sport::Run, "run", 1)).unwrap();

    // Deselecting every type yields an empty result, while no filter at
    // all still matches everything.
    let none_selected = EntryListQuery {
        kinds: Some(Vec::new()),
        ..EntryListQuery::default()
    };
    assert!(repo.list_entries(&none_selected).unwrap().is_empty());
    assert_eq!(repo.list_entries(&EntryListQuery::default()).unwrap().len(), 1);
}

#[test]
fn list_filters_by_inclusive_date_range() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    for (title, date) in [("a", 1 * DAY), ("b", 2 * DAY), ("c", 3 * DAY)] {
        repo.create_entry(&sport_entry(Sport::Run, title, date)).unwrap();
    }

    let query = EntryListQuery {
        date_from: Some(2 * DAY),
        date_to: Some(3 * DAY),
        ..EntryListQuery::default()
    };
    let listed = repo.list_entries(&query).unwrap();
    let titles: Vec<&str> = listed.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, ["c", "b"]);
}

#[test]
fn text_search_is_case_insensitive_over_title_and_body() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let by_title = sport_entry(Sport::Run, "Tempo Tuesday", 1);
    let mut by_body = sport_entry(Sport::Bike, "ride", 2);
    by_body.text = "felt like a TEMPO effort".to_string();
    let unrelated = sport_entry(Sport::Swim, "laps", 3);
    repo.create_entry(&by_title).unwrap();
    repo.create_entry(&by_body).unwrap();
    repo.create_entry(&unrelated).unwrap();

    let query = EntryListQuery {
        text_query: Some("tempo".to_string()),
        ..EntryListQuery::default()
    };
    let listed = repo.list_entries(&query).unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn text_search_treats_like_wildcards_literally() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let with_percent = sport_entry(Sport::Run, "100% effort", 1);
    let without = sport_entry(Sport::Run, "100 effort", 2);
    repo.create_entry(&with_percent).unwrap();
    repo.create_entry(&without).unwrap();

    let query = EntryListQuery {
        text_query: Some("100%".to_string()),
        ..EntryListQuery::default()
    };
    let listed = repo.list_entries(&query).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "100% effort");
}

#[test]
fn blank_text_query_matches_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    repo.create_entry(&sport_entry(Sport::Run, "a", 1)).unwrap();
    repo.create_entry(&sport_entry(Sport::Run, "b", 2)).unwrap();

    let query = EntryListQuery {
        text_query: Some("   ".to_string()),
        ..EntryListQuery::default()
    };
    assert_eq!(repo.list_entries(&query).unwrap().len(), 2);
}

#[test]
fn pagination_with_limit_and_offset_is_stable() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    // Same date on purpose: ordering falls back to id ascending.
    let entry_a = entry_with_fixed_id("00000000-0000-4000-8000-000000000001", "a", 5);
    let entry_b = entry_with_fixed_id("00000000-0000-4000-8000-000000000002", "b", 5);
    let entry_c = entry_with_fixed_id("00000000-0000-4000-8000-000000000003", "c", 5);
    repo.create_entry(&entry_c).unwrap();
    repo.create_entry(&entry_a).unwrap();
    repo.create_entry(&entry_b).unwrap();

    let query = EntryListQuery {
        limit: Some(2),
        offset: 1,
        ..EntryListQuery::default()
    };
    let page = repo.list_entries(&query).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, entry_b.id);
    assert_eq!(page[1].id, entry_c.id);
}

#[test]
fn pagination_with_offset_only_path_is_stable() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteEntryRepository::try_new(&mut conn).unwrap();

    let entry_a = entry_with_fixed_id("00000000-0000-4000-8000-000000000001", "a", 5);
    let entry_b = entry_with_fixed_id("00000000-0000-4000-8000-000000000002", "b", 5);
    let entry_c = entry_with_fixed_id("00000000-0000-4000-8000-000000000003", "c", 5);
    repo.create_entry(&entry_a).unwrap();
    repo.create_entry(&entry_b).unwrap();
    repo.create_entry(&entry_c).unwrap();

    let query = EntryListQuery {
        offset: 1,
        ..EntryListQuery::default()
    };
    let page = repo.list_entries(&query).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, entry_b.id);
    assert_eq!(page[1].id, entry_c.id);
}
