use crate::error::FsError;
use crate::layout::fcb::Fcb;
use crate::oft::OpenFileTable;

fn file(name: &str, block: i32, size: i32) -> Fcb {
    Fcb::new(name, false, block, size)
}

#[test]
fn add_returns_the_first_empty_slot() {
    let mut oft = OpenFileTable::new(4);
    assert_eq!(oft.add(file("a", 10, 5), 0).unwrap(), 0);
    assert_eq!(oft.add(file("b", 11, 5), 0).unwrap(), 1);

    oft.remove(0).expect("close a");
    assert_eq!(
        oft.add(file("c", 12, 5), 0).unwrap(),
        0,
        "freed slots are reused first"
    );
    assert_eq!(oft.len(), 2);
}

#[test]
fn add_validates_the_offset() {
    let mut oft = OpenFileTable::new(2);
    assert_eq!(oft.add(file("a", 10, 5), -1), Err(FsError::InvalidWrite));
    assert_eq!(oft.add(file("a", 10, 5), 6), Err(FsError::InvalidWrite));
    oft.add(file("a", 10, 5), 5).expect("offset at size is valid");
}

#[test]
fn full_table_rejects_opens() {
    let mut oft = OpenFileTable::new(2);
    oft.add(file("a", 1, 0), 0).unwrap();
    oft.add(file("b", 2, 0), 0).unwrap();
    assert!(oft.is_full());
    assert_eq!(oft.add(file("c", 3, 0), 0), Err(FsError::TableFull));
}

#[test]
fn lookup_matches_name_kind_and_block() {
    let mut oft = OpenFileTable::new(4);
    let fd = oft.add(file("notes", 30, 12), 0).unwrap();

    assert_eq!(oft.lookup_handle(&file("NOTES", 30, 999)), Some(fd));
    assert_eq!(oft.lookup_handle(&file("notes", 31, 12)), None);
    assert_eq!(oft.lookup_handle(&Fcb::new("notes", true, 30, 12)), None);
    assert!(oft.is_open(&file("notes", 30, 12)));
}

#[test]
fn bad_handles_are_rejected() {
    let mut oft = OpenFileTable::new(2);
    assert_eq!(oft.remove(0), Err(FsError::BadHandle));
    assert_eq!(oft.offset(5), Err(FsError::BadHandle));
    assert_eq!(oft.update_offset(1, 0), Err(FsError::BadHandle));
    assert_eq!(
        oft.update_fcb(0, file("x", 1, 1)),
        Err(FsError::BadHandle)
    );
}

#[test]
fn update_offset_is_bounded_by_current_size() {
    let mut oft = OpenFileTable::new(2);
    let fd = oft.add(file("a", 10, 8), 0).unwrap();

    oft.update_offset(fd, 8).expect("seek to end");
    assert_eq!(oft.offset(fd).unwrap(), 8);
    assert_eq!(oft.update_offset(fd, 9), Err(FsError::InvalidWrite));
}

#[test]
fn update_fcb_keeps_the_offset() {
    let mut oft = OpenFileTable::new(2);
    let fd = oft.add(file("a", 10, 8), 4).unwrap();

    oft.update_fcb(fd, file("a", 10, 20)).expect("grow");
    assert_eq!(oft.fcb(fd).unwrap().size(), 20);
    assert_eq!(oft.offset(fd).unwrap(), 4);

    oft.update_offset(fd, 20).expect("seek within grown file");
}

#[test]
fn display_reports_occupancy() {
    let mut oft = OpenFileTable::new(3);
    oft.add(file("log", 10, 2), 1).unwrap();
    let text = oft.to_string();
    assert!(text.contains("1 of 3 slots"));
    assert!(text.contains("log"));
}
