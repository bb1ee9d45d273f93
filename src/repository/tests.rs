use super::{Repository, StoreError};
use crate::domain::{CheckState, NoteItemPatch, NotePatch, TimeField, TimeRange};
use crate::feed::Table;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const T0: OffsetDateTime = datetime!(2026-03-01 08:00 UTC);

fn repo() -> Repository {
    Repository::open_in_memory().expect("in-memory repository should open")
}

#[test]
fn create_counter_assigns_random_positive_id_and_stamps() {
    let repo = repo();
    let counter = repo.create_counter("  push-ups ", T0).expect("create");
    assert!(counter.id > 0);
    assert_eq!(counter.name, "push-ups");
    assert_eq!(counter.time_created, T0);
    assert_eq!(counter.time_modified, T0);

    let loaded = repo
        .counter(counter.id)
        .expect("lookup")
        .expect("counter should exist");
    assert_eq!(loaded, counter);
}

#[test]
fn blank_names_are_rejected() {
    let repo = repo();
    let err = repo.create_counter("   ", T0).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "counter name must not be empty");
}

#[test]
fn rename_bumps_modified_time_and_reports_missing_rows() {
    let repo = repo();
    let counter = repo.create_counter("water", T0).expect("create");
    let later = T0 + Duration::hours(1);
    let renamed = repo
        .rename_counter(counter.id, "water (l)", later)
        .expect("rename")
        .expect("counter should exist");
    assert_eq!(renamed.name, "water (l)");
    assert_eq!(renamed.time_created, T0);
    assert_eq!(renamed.time_modified, later);

    assert!(repo
        .rename_counter(counter.id + 1, "ghost", later)
        .expect("rename")
        .is_none());
}

#[test]
fn modified_time_never_precedes_creation() {
    let repo = repo();
    let counter = repo.create_counter("clock skew", T0).expect("create");
    let renamed = repo
        .rename_counter(counter.id, "still here", T0 - Duration::days(1))
        .expect("rename")
        .expect("counter should exist");
    assert_eq!(renamed.time_modified, T0);
}

#[test]
fn ticks_require_an_existing_counter() {
    let repo = repo();
    let err = repo.add_tick(12345, 1.0, None, T0).unwrap_err();
    match err {
        StoreError::ParentMissing { table, id } => {
            assert_eq!(table, Table::Counter);
            assert_eq!(id, 12345);
        }
        other => panic!("expected ParentMissing, got {other:?}"),
    }
}

#[test]
fn non_finite_amounts_are_rejected() {
    let repo = repo();
    let counter = repo.create_counter("c", T0).expect("create");
    assert!(repo.add_tick(counter.id, f64::NAN, None, T0).is_err());
    assert!(repo
        .add_tick(counter.id, f64::INFINITY, None, T0)
        .is_err());
}

#[test]
fn add_tick_defaults_data_time_to_now() {
    let repo = repo();
    let counter = repo.create_counter("steps", T0).expect("create");
    let tick = repo.add_tick(counter.id, 250.0, None, T0).expect("tick");
    assert_eq!(tick.time_for_data, T0);

    let backdated = T0 - Duration::days(2);
    let tick = repo
        .add_tick(counter.id, 100.0, Some(backdated), T0)
        .expect("tick");
    assert_eq!(tick.time_for_data, backdated);
    assert_eq!(tick.time_created, T0);
}

#[test]
fn update_tick_patches_only_given_fields() {
    let repo = repo();
    let counter = repo.create_counter("c", T0).expect("create");
    let tick = repo.add_tick(counter.id, 1.0, None, T0).expect("tick");
    let later = T0 + Duration::minutes(10);

    let updated = repo
        .update_tick(tick.id, Some(-3.0), None, later)
        .expect("update")
        .expect("tick should exist");
    assert_eq!(updated.amount, -3.0);
    assert_eq!(updated.time_for_data, T0);
    assert_eq!(updated.time_modified, later);

    assert!(repo
        .update_tick(tick.id + 1, Some(1.0), None, later)
        .expect("update")
        .is_none());
}

#[test]
fn deleting_counter_removes_its_ticks() {
    let repo = repo();
    let counter = repo.create_counter("c", T0).expect("create");
    let tick = repo.add_tick(counter.id, 1.0, None, T0).expect("tick");

    assert!(repo.delete_counter(counter.id).expect("delete"));
    assert!(repo.tick(tick.id).expect("lookup").is_none());
    assert!(!repo.delete_counter(counter.id).expect("second delete"));
    assert!(!repo.delete_tick(tick.id).expect("tick delete"));
}

#[test]
fn tick_queries_filter_by_parent_field_and_range() {
    let repo = repo();
    let a = repo.create_counter("a", T0).expect("create");
    let b = repo.create_counter("b", T0).expect("create");
    let day = |n: i64| T0 + Duration::days(n);
    let first = repo.add_tick(a.id, 1.0, Some(day(0)), T0).expect("tick");
    let second = repo.add_tick(a.id, 2.0, Some(day(1)), T0).expect("tick");
    let _third = repo.add_tick(a.id, 4.0, Some(day(2)), T0).expect("tick");
    let _other = repo.add_tick(b.id, 8.0, Some(day(1)), T0).expect("tick");

    let range = TimeRange::new(Some(day(0)), Some(day(1))).expect("range");
    let ticks = repo
        .ticks(Some(a.id), TimeField::ForData, &range)
        .expect("ticks");
    let ids: Vec<i64> = ticks.iter().map(|tick| tick.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert_eq!(
        repo.sum(Some(a.id), TimeField::ForData, &range).expect("sum"),
        3.0
    );
    assert_eq!(
        repo.average(Some(a.id), TimeField::ForData, &range)
            .expect("avg"),
        Some(1.5)
    );
    assert_eq!(
        repo.sum(None, TimeField::ForData, &range).expect("sum"),
        11.0
    );
}

#[test]
fn aggregates_over_empty_sets() {
    let repo = repo();
    let counter = repo.create_counter("empty", T0).expect("create");
    let all = TimeRange::ALL;
    assert_eq!(
        repo.sum(Some(counter.id), TimeField::Created, &all)
            .expect("sum"),
        0.0
    );
    assert_eq!(
        repo.average(Some(counter.id), TimeField::Created, &all)
            .expect("avg"),
        None
    );
    assert!(repo
        .sums_by_counter(TimeField::Created, &all)
        .expect("grouped")
        .is_empty());
}

#[test]
fn grouped_aggregates_are_keyed_by_counter() {
    let repo = repo();
    let a = repo.create_counter("a", T0).expect("create");
    let b = repo.create_counter("b", T0).expect("create");
    repo.add_tick(a.id, 1.0, None, T0).expect("tick");
    repo.add_tick(a.id, 3.0, None, T0).expect("tick");
    repo.add_tick(b.id, -5.0, None, T0).expect("tick");

    let sums = repo
        .sums_by_counter(TimeField::Created, &TimeRange::ALL)
        .expect("sums");
    assert_eq!(sums.get(&a.id), Some(&4.0));
    assert_eq!(sums.get(&b.id), Some(&-5.0));

    let averages = repo
        .averages_by_counter(TimeField::Created, &TimeRange::ALL)
        .expect("averages");
    assert_eq!(averages.get(&a.id), Some(&2.0));
}

#[test]
fn data_field_is_rejected_for_counters_and_notes() {
    let repo = repo();
    assert!(repo.counters(TimeField::ForData, &TimeRange::ALL).is_err());
    assert!(repo.notes(TimeField::ForData, &TimeRange::ALL).is_err());
    assert!(repo
        .watch_counters(TimeField::ForData, TimeRange::ALL)
        .is_err());
}

#[test]
fn summaries_carry_per_counter_stats() {
    let repo = repo();
    let a = repo.create_counter("a", T0).expect("create");
    let b = repo.create_counter("b", T0 + Duration::seconds(1)).expect("create");
    repo.add_tick(a.id, 2.0, None, T0).expect("tick");
    repo.add_tick(a.id, 6.0, None, T0).expect("tick");

    let summaries = repo.summaries(&TimeRange::ALL).expect("summaries");
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].counter.id, b.id);
    assert_eq!(summaries[0].stats.count, 0);
    assert_eq!(summaries[1].stats.total, 8.0);
    assert_eq!(summaries[1].stats.max_amount, Some(6.0));
}

#[test]
fn counter_flow_reruns_after_writes() {
    let repo = repo();
    let mut flow = repo
        .watch_counters(TimeField::Created, TimeRange::ALL)
        .expect("flow");
    assert_eq!(flow.poll().expect("poll").map(|c| c.len()), Some(0));
    assert!(flow.poll().expect("poll").is_none());

    let counter = repo.create_counter("a", T0).expect("create");
    let names: Vec<String> = flow
        .poll()
        .expect("poll")
        .expect("flow should yield after insert")
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["a".to_string()]);

    repo.add_tick(counter.id, 1.0, None, T0).expect("tick");
    assert!(
        flow.poll().expect("poll").is_none(),
        "tick writes do not affect the counter list"
    );
}

#[test]
fn sum_flow_follows_ticks_and_cascades() {
    let repo = repo();
    let counter = repo.create_counter("a", T0).expect("create");
    let mut flow = repo.watch_sum(Some(counter.id), TimeField::Created, TimeRange::ALL);
    assert_eq!(flow.poll().expect("poll"), Some(0.0));

    let tick = repo.add_tick(counter.id, 2.5, None, T0).expect("tick");
    repo.add_tick(counter.id, 2.5, None, T0).expect("tick");
    assert_eq!(flow.poll().expect("poll"), Some(5.0));

    repo.update_tick(tick.id, Some(0.5), None, T0)
        .expect("update")
        .expect("tick should exist");
    assert_eq!(flow.poll().expect("poll"), Some(3.0));

    repo.delete_counter(counter.id).expect("delete");
    assert_eq!(flow.poll().expect("poll"), Some(0.0));
}

#[test]
fn tick_flow_filters_by_parent() {
    let repo = repo();
    let a = repo.create_counter("a", T0).expect("create");
    let mut flow = repo.watch_ticks(Some(a.id), TimeField::ForData, TimeRange::ALL);
    assert_eq!(flow.poll().expect("poll").map(|t| t.len()), Some(0));
    repo.add_tick(a.id, 1.0, None, T0).expect("tick");
    assert_eq!(flow.poll().expect("poll").map(|t| t.len()), Some(1));
}

#[test]
fn notes_and_items_round_trip_through_the_store() {
    let repo = repo();
    let note = repo
        .create_note("Groceries", " weekly ", "", T0)
        .expect("note");
    assert_eq!(note.subtitle, "weekly");

    let milk = repo
        .add_note_item(note.id, "milk", "2l", "", CheckState::Unchecked, T0)
        .expect("item");
    let later = T0 + Duration::minutes(1);
    let bread = repo
        .add_note_item(note.id, "bread", "", "rye", CheckState::Default, later)
        .expect("item");

    let items = repo.note_items(note.id).expect("items");
    assert_eq!(
        items.iter().map(|item| item.id).collect::<Vec<_>>(),
        vec![milk.id, bread.id]
    );

    let checked = repo
        .set_note_item_state(milk.id, CheckState::Checked, later)
        .expect("state")
        .expect("item should exist");
    assert_eq!(checked.state, CheckState::Checked);

    let renamed = repo
        .update_note_item(
            bread.id,
            NoteItemPatch {
                name: Some("sourdough".to_string()),
                ..NoteItemPatch::default()
            },
            later,
        )
        .expect("update")
        .expect("item should exist");
    assert_eq!(renamed.name, "sourdough");
    assert_eq!(renamed.description, "rye");

    let updated = repo
        .update_note(
            note.id,
            NotePatch {
                description: Some("for the week".to_string()),
                ..NotePatch::default()
            },
            later,
        )
        .expect("update")
        .expect("note should exist");
    assert_eq!(updated.title, "Groceries");
    assert_eq!(updated.description, "for the week");

    assert!(repo.delete_note(note.id).expect("delete"));
    assert!(repo.note_item(milk.id).expect("lookup").is_none());
}

#[test]
fn note_items_require_existing_note() {
    let repo = repo();
    let err = repo
        .add_note_item(77, "orphan", "", "", CheckState::Default, T0)
        .unwrap_err();
    assert_eq!(err.to_string(), "note '77' does not exist");
}

#[test]
fn note_item_flow_tracks_state_changes() {
    let repo = repo();
    let note = repo.create_note("todo", "", "", T0).expect("note");
    let item = repo
        .add_note_item(note.id, "write tests", "", "", CheckState::Unchecked, T0)
        .expect("item");
    let mut flow = repo.watch_note_items(note.id);
    let initial = flow.poll().expect("poll").expect("initial value");
    assert_eq!(initial[0].state, CheckState::Unchecked);

    repo.set_note_item_state(item.id, CheckState::Checked, T0)
        .expect("state");
    let after = flow.poll().expect("poll").expect("flow should yield");
    assert_eq!(after[0].state, CheckState::Checked);

    let mut notes = repo.watch_notes(TimeField::Modified).expect("flow");
    assert_eq!(notes.poll().expect("poll").map(|n| n.len()), Some(1));
    repo.delete_note(note.id).expect("delete");
    assert_eq!(notes.poll().expect("poll").map(|n| n.len()), Some(0));
    assert_eq!(flow.poll().expect("poll").map(|i| i.len()), Some(0));
}

#[test]
fn schema_version_is_recorded() {
    let repo = repo();
    assert_eq!(
        repo.schema_version().expect("meta"),
        Some(crate::db::CURRENT_SCHEMA_VERSION.to_string())
    );
}
