use std::fs;

use tome_todo_list::library::{
    import_from_path, load_from_path, save_to_path, Header, SchemaIssue,
};
use tome_todo_list::{BookDraft, LibraryError, RecordStore};

fn draft(title: &str, author: &str, status: &str) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: author.to_string(),
        status: status.to_string(),
        ..BookDraft::default()
    }
}

#[test]
fn missing_file_starts_an_empty_library() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_from_path(&dir.path().join("nothing-here.csv")).unwrap();

    assert!(loaded.store.is_empty());
    assert!(loaded.report.is_clean());
}

#[test]
fn saved_library_loads_back_with_the_same_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");

    let mut store = RecordStore::default();
    store
        .add(BookDraft {
            rating: "4".to_string(),
            review: "Sharp, funny and \"strange\".\nWould reread.".to_string(),
            date_added: "2024/01/05".to_string(),
            ..draft("The Dispossessed", "Ursula K. Le Guin", "read")
        })
        .unwrap();
    store
        .add(BookDraft {
            date_added: "2024/02/11".to_string(),
            ..draft("Hyperion", "Dan Simmons", "currently-reading")
        })
        .unwrap();

    save_to_path(&path, &store).unwrap();
    let loaded = load_from_path(&path).unwrap();

    assert!(loaded.report.is_clean());
    assert_eq!(loaded.store.len(), 2);
    for (before, after) in store.records().iter().zip(loaded.store.records()) {
        assert_eq!(before.title, after.title);
        assert_eq!(before.author, after.author);
        assert_eq!(before.rating, after.rating);
        assert_eq!(before.review, after.review);
        assert_eq!(before.status, after.status);
        assert_eq!(before.date_added, after.date_added);
    }
}

#[test]
fn unknown_columns_survive_load_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(
        &path,
        "Book Id,Title,Author,Exclusive Shelf,Owned Copies\n\
         42,Emma,Jane Austen,read,2\n",
    )
    .unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.store.records()[0].extra["Book Id"], "42");
    save_to_path(&path, &loaded.store).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Book Id,Title,Author,Exclusive Shelf,Owned Copies,"));
    assert!(header.contains("My Rating"));
    assert!(lines.next().unwrap().starts_with("42,Emma,Jane Austen,read,2,"));

    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded.store.records()[0].extra["Owned Copies"], "2");
}

#[test]
fn short_rows_are_padded_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "Title,Author,My Rating\nWatership Down\n").unwrap();

    let loaded = load_from_path(&path).unwrap();
    let record = &loaded.store.records()[0];

    assert_eq!(record.title, "Watership Down");
    assert_eq!(record.author, "");
    assert_eq!(record.rating, None);
    assert_eq!(
        loaded.report.issues,
        vec![SchemaIssue::ShortRow {
            row: 1,
            expected: 3,
            found: 1
        }]
    );
}

#[test]
fn reading_books_come_first_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(
        &path,
        "Title,Exclusive Shelf\n\
         A,read\n\
         B,currently-reading\n\
         C,to-read\n\
         D,currently-reading\n",
    )
    .unwrap();

    let loaded = load_from_path(&path).unwrap();
    let titles: Vec<&str> = loaded
        .store
        .ordered_view()
        .into_iter()
        .map(|record| record.title.as_str())
        .collect();

    assert_eq!(titles, vec!["B", "D", "A", "C"]);
}

#[test]
fn directory_path_is_a_file_access_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_from_path(dir.path()).unwrap_err();
    assert!(matches!(err, LibraryError::FileAccess { .. }));
}

#[test]
fn saving_into_a_missing_directory_fails_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent").join("library.csv");

    let err = save_to_path(&path, &RecordStore::default()).unwrap_err();
    assert!(matches!(err, LibraryError::FileAccess { .. }));
    assert!(!path.exists());
}

#[test]
fn failed_save_leaves_the_previous_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    let mut store = RecordStore::default();
    store.add(draft("Kindred", "Octavia E. Butler", "read")).unwrap();
    save_to_path(&path, &store).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let blocked = dir.path().join("library.csv").join("nested.csv");
    assert!(save_to_path(&blocked, &store).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn goodreads_import_cleans_isbns_and_reviews() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("goodreads_library_export.csv");
    fs::write(
        &export,
        "Book Id,Title,Author,ISBN,ISBN13,My Rating,My Review,Exclusive Shelf\n\
         7,Dune,Frank Herbert,\"=\"\"0441013597\"\"\",\"=\"\"9780441013593\"\"\",5,Great.<br/><br/>Spice.,read\n",
    )
    .unwrap();

    let imported = import_from_path(&export).unwrap();
    let record = &imported.store.records()[0];

    assert_eq!(record.isbn, "0441013597");
    assert_eq!(record.extra["ISBN13"], "9780441013593");
    assert_eq!(record.review, "Great.\n\nSpice.");
    assert_eq!(record.rating.map(|r| r.value()), Some(5));
}

#[test]
fn leading_byte_order_mark_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "\u{feff}Title,Author\nNight,Elie Wiesel\n").unwrap();

    let loaded = load_from_path(&path).unwrap();

    assert_eq!(loaded.store.records()[0].title, "Night");
    assert_eq!(loaded.store.header().names().next(), Some("Title"));
}

#[test]
fn zero_length_file_loads_as_an_empty_canonical_library() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "").unwrap();

    let loaded = load_from_path(&path).unwrap();

    assert!(loaded.store.is_empty());
    assert!(loaded.report.is_clean());
    assert_eq!(loaded.store.header(), &Header::canonical());
}

#[test]
fn unparsed_ratings_are_written_back_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "Title,My Rating\nEmma,3.5\nDune,7\n").unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.report.issues.len(), 2);
    assert!(loaded.store.records().iter().all(|record| record.rating.is_none()));
    save_to_path(&path, &loaded.store).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines().skip(1);
    assert!(lines.next().unwrap().starts_with("Emma,3.5,"));
    assert!(lines.next().unwrap().starts_with("Dune,7,"));
}

#[test]
fn repeated_column_names_are_saved_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "Title,Notes,Notes\nEmma,first,second\n").unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert!(loaded.report.is_clean());
    save_to_path(&path, &loaded.store).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Title,Notes,Notes,"));
    assert!(lines.next().unwrap().starts_with("Emma,first,second,"));

    let reloaded = load_from_path(&path).unwrap();
    assert_eq!(reloaded.store.records()[0].extra["Notes (2)"], "second");
}

#[cfg(unix)]
#[test]
fn save_keeps_the_library_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.csv");
    fs::write(&path, "Title\nEmma\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let loaded = load_from_path(&path).unwrap();
    save_to_path(&path, &loaded.store).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
