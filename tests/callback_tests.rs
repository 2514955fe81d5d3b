use std::panic::{self, AssertUnwindSafe};
use stripedmap::StripedMap;

#[test]
fn test_inspect_reads_in_place() {
    let map = StripedMap::new();
    map.insert("k", vec![1, 2, 3]);

    let mut seen = 0i32;
    assert!(map.inspect(&"k", |v| seen = v.iter().sum::<i32>()));
    assert_eq!(seen, 6);

    assert!(!map.inspect(&"missing", |_| panic!("not called for absent keys")));
}

#[test]
fn test_inspect_map_wraps_plain_result() {
    let map = StripedMap::new();
    map.insert(1u32, "hello".to_string());

    let len: Option<usize> = map.inspect_map(&1, |v| v.len());
    assert_eq!(len, Some(5));

    let absent: Option<usize> = map.inspect_map(&2, |v| v.len());
    assert_eq!(absent, None);
}

#[test]
fn test_inspect_and_then_passes_optional_through() {
    let map = StripedMap::new();
    map.insert(1u32, "hello".to_string());

    // Present key, callback yields Some
    let first: Option<char> = map.inspect_and_then(&1, |v| v.chars().next());
    assert_eq!(first, Some('h'));

    // Present key, callback yields None: not Some(None)
    let tenth: Option<char> = map.inspect_and_then(&1, |v| v.chars().nth(10));
    assert_eq!(tenth, None);

    // Absent key: empty result of the unwrapped type
    let absent: Option<char> = map.inspect_and_then(&2, |v| v.chars().next());
    assert_eq!(absent, None);
}

#[test]
fn test_inspect_map_can_return_option_explicitly() {
    let map = StripedMap::new();
    map.insert(1u32, 10u32);

    // inspect_map never flattens, so a nested option stays nested
    let nested: Option<Option<u32>> = map.inspect_map(&1, |v| v.checked_sub(20));
    assert_eq!(nested, Some(None));
}

#[test]
fn test_merge_deletes_on_none() {
    let map = StripedMap::new();
    map.insert("k", 5);

    map.merge("k", 5, |current, next| {
        if *current == next {
            None
        } else {
            Some(current + next)
        }
    });
    assert!(!map.contains_key(&"k"));
}

#[test]
fn test_merge_replaces_and_inserts() {
    let map = StripedMap::new();

    // Absent: remap is not consulted
    map.merge("k", 1, |_, _| panic!("remap called for absent key"));
    assert_eq!(map.get(&"k"), Some(1));

    map.merge("k", 10, |current, next| Some(current * next));
    assert_eq!(map.get(&"k"), Some(10));
}

#[test]
fn test_compute_if_absent_skips_create_when_present() {
    let map = StripedMap::new();
    map.insert("k", 1);

    let seen = map.compute_if_absent(
        "k",
        || panic!("create called for present key"),
        |v| {
            *v += 1;
            *v
        },
    );
    assert_eq!(seen, 2);
    assert_eq!(map.get(&"k"), Some(2));
}

#[test]
fn test_compute_if_absent_creates_and_accesses() {
    let map: StripedMap<&str, Vec<&str>> = StripedMap::new();

    map.compute_if_absent("tags", Vec::new, |v| v.push("a"));
    map.compute_if_absent("tags", Vec::new, |v| v.push("b"));

    assert_eq!(map.get(&"tags"), Some(vec!["a", "b"]));
}

#[test]
fn test_get_or_insert_with() {
    let map = StripedMap::new();

    assert_eq!(map.get_or_insert_with("k", || 7), 7);
    assert_eq!(map.get_or_insert_with("k", || 8), 7);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_panicking_update_releases_lock() {
    let map = StripedMap::new();
    map.insert("k", 1);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        map.update(&"k", |_| panic!("callback failure"));
    }));
    assert!(result.is_err());

    // Same shard, both lock modes still available
    assert_eq!(map.get(&"k"), Some(1));
    assert!(map.update(&"k", |v| *v = 2));
    assert_eq!(map.get(&"k"), Some(2));
}

#[test]
fn test_panicking_merge_keeps_entry() {
    let map = StripedMap::new();
    map.insert("k", 5);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        map.merge("k", 1, |_, _| panic!("remap failure"));
    }));
    assert!(result.is_err());

    assert_eq!(map.get(&"k"), Some(5));
    map.merge("k", 1, |current, next| Some(current + next));
    assert_eq!(map.get(&"k"), Some(6));
}

#[test]
fn test_panicking_create_inserts_nothing() {
    let map: StripedMap<&str, i32> = StripedMap::new();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        map.get_or_insert_with("k", || panic!("construction failure"))
    }));
    assert!(result.is_err());

    assert!(!map.contains_key(&"k"));
    assert_eq!(map.get_or_insert_with("k", || 3), 3);
}

#[test]
fn test_panicking_scan_releases_lock() {
    let map = StripedMap::new();
    for i in 0..10 {
        map.insert(i, i);
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        map.for_each(|_, _| panic!("scan failure"));
    }));
    assert!(result.is_err());

    assert_eq!(map.remove_if(|_, _| true), 10);
    assert!(map.is_empty());
}
