use stripedmap::{Error, StripedMap, StripedMapBuilder};

fn map_with_shards<K, V>(shard_count: usize) -> StripedMap<K, V>
where
    K: stripedmap::MapKey,
    V: Send + Sync,
{
    StripedMapBuilder::new()
        .shard_count(shard_count)
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_basic_insert_get() {
    let map = StripedMap::new();

    assert!(map.insert("key1", "value1").is_none());
    assert_eq!(map.get(&"key1"), Some("value1"));

    // Overwrite
    assert_eq!(map.insert("key1", "value2"), Some("value1"));
    assert_eq!(map.get(&"key1"), Some("value2"));
}

#[test]
fn test_remove() {
    let map = StripedMap::new();

    map.insert("key1", "value1");
    assert_eq!(map.remove(&"key1"), Some("value1"));
    assert!(map.get(&"key1").is_none());
    assert!(map.remove(&"key1").is_none());
}

#[test]
fn test_try_insert_does_not_replace() {
    let map = StripedMap::new();

    assert!(map.try_insert("k", 1));
    assert!(!map.try_insert("k", 2));
    assert_eq!(map.get(&"k"), Some(1));
}

#[test]
fn test_values_are_copied_out() {
    let map = StripedMap::new();
    map.insert("k", vec![1, 2, 3]);

    let mut copy = map.get(&"k").unwrap();
    copy.push(4);

    assert_eq!(map.get(&"k"), Some(vec![1, 2, 3]));
}

#[test]
fn test_len_and_is_empty() {
    let map = StripedMap::new();

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);

    map.insert("key1", "value1");
    assert!(!map.is_empty());
    assert_eq!(map.len(), 1);

    map.insert("key2", "value2");
    assert_eq!(map.len(), 2);

    map.remove(&"key1");
    assert_eq!(map.len(), 1);
}

#[test]
fn test_remove_if_scenario() {
    let map = map_with_shards(4);
    for k in 1..=5 {
        map.insert(k, k * 100);
    }
    assert_eq!(map.len(), 5);

    assert_eq!(map.remove_if(|k, _| k % 2 == 0), 2);
    assert_eq!(map.len(), 3);
    assert!(!map.contains_key(&2));
    assert!(!map.contains_key(&4));
    assert!(map.contains_key(&5));
}

#[test]
fn test_update_if_on_empty_map() {
    let map: StripedMap<u32, u32> = map_with_shards(4);

    let updated = map.update_if(|_, v| {
        *v += 1;
        true
    });

    assert_eq!(updated, 0);
    assert!(map.is_empty());
}

#[test]
fn test_update_if_counts_and_mutates() {
    let map = map_with_shards(4);
    for k in 0..10u32 {
        map.insert(k, k);
    }

    let updated = map.update_if(|k, v| {
        if k % 2 == 1 {
            *v *= 10;
            true
        } else {
            false
        }
    });

    assert_eq!(updated, 5);
    assert_eq!(map.get(&3), Some(30));
    assert_eq!(map.get(&4), Some(4));
}

#[test]
fn test_find_and_contains_if() {
    let map = StripedMap::new();
    for k in 0..50u32 {
        map.insert(k, format!("v{}", k));
    }

    assert_eq!(map.find(|k, _| *k == 17), Some("v17".to_string()));
    assert_eq!(map.find(|k, _| *k == 99), None);
    assert!(map.contains_if(|_, v| v == "v42"));
    assert!(!map.contains_if(|_, v| v.is_empty()));
}

#[test]
fn test_for_each_visits_every_entry() {
    let map = map_with_shards(3);
    for k in 0..30u64 {
        map.insert(k, k);
    }

    let mut sum = 0;
    let mut visited = 0;
    map.for_each(|_, v| {
        sum += *v;
        visited += 1;
    });

    assert_eq!(visited, 30);
    assert_eq!(sum, (0..30u64).sum::<u64>());
}

#[test]
fn test_for_each_until_short_circuits() {
    let map = map_with_shards(8);
    for k in 0..100u32 {
        map.insert(k, k);
    }

    let mut visited = 0;
    let completed = map.for_each_until(|_, _| {
        visited += 1;
        visited == 10
    });
    assert!(!completed);
    assert_eq!(visited, 10);

    let mut visited = 0;
    assert!(map.for_each_until(|_, _| {
        visited += 1;
        false
    }));
    assert_eq!(visited, 100);
}

#[test]
fn test_clear() {
    let map = StripedMap::new();
    for k in 0..100 {
        map.insert(k, k);
    }
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.shard_loads().iter().sum::<usize>(), 0);
}

#[test]
fn test_reserve_and_try_reserve() {
    let map: StripedMap<u64, u64> = map_with_shards(4);
    map.reserve(1000);
    assert!(map.try_reserve(1000).is_ok());
    assert_eq!(map.try_reserve(usize::MAX), Err(Error::CapacityOverflow));

    // Still usable after a failed reservation
    map.insert(1, 1);
    assert_eq!(map.get(&1), Some(1));
}

#[test]
fn test_stats() {
    let map = StripedMap::new();

    map.insert("key1", "value1");
    map.insert("key2", "value2");
    map.get(&"key1");
    map.get(&"key2");
    map.remove(&"key1");

    let stats = map.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.shard_sizes.len(), 32); // Default 32 shards
    assert_eq!(stats.operations.len(), 32);

    let total_ops: u64 = stats.operations.iter().map(|op| op.total()).sum();
    if cfg!(feature = "metrics") {
        assert_eq!(total_ops, 5);
    } else {
        assert_eq!(total_ops, 0);
    }
}

#[test]
fn test_compute_if_absent_hit_counts_as_read() {
    let map: StripedMap<u32, u32> = map_with_shards(1);

    map.insert(1, 10);
    assert_eq!(map.get_or_insert_with(1, || 99), 10);
    map.compute_if_absent(1, || 99, |v| *v += 1);
    map.compute_if_absent(2, || 20, |_| ());

    let ops = &map.stats().operations[0];
    if cfg!(feature = "metrics") {
        assert_eq!(ops.reads, 2);
        assert_eq!(ops.writes, 2);
    } else {
        assert_eq!(ops.total(), 0);
    }
}

#[test]
fn test_diagnostics() {
    let map = map_with_shards(4);
    for k in 0..400u32 {
        map.insert(k, ());
    }

    let diag = map.diagnostics();
    assert_eq!(diag.total_entries, 400);
    assert_eq!(diag.shards.len(), 4);
    assert_eq!(diag.avg_load_per_shard, 100.0);
    assert!(diag.max_load_ratio >= 1.0);
}

#[test]
fn test_iter_and_snapshot() {
    let map = StripedMap::new();

    map.insert("key1", "value1");
    map.insert("key2", "value2");
    map.insert("key3", "value3");

    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(k, _)| *k);
    assert_eq!(
        entries,
        vec![("key1", "value1"), ("key2", "value2"), ("key3", "value3")]
    );

    let mut snapshot = map.snapshot();
    snapshot.sort_by_key(|(k, _)| *k);
    assert_eq!(snapshot, entries);

    let mut borrowed: Vec<_> = (&map).into_iter().map(|(k, _)| k).collect();
    borrowed.sort();
    assert_eq!(borrowed, ["key1", "key2", "key3"]);
}

#[test]
fn test_iter_empty_map() {
    let map: StripedMap<u8, u8> = StripedMap::new();
    assert_eq!(map.iter().count(), 0);
}

#[test]
fn test_builder_invalid_shard_count() {
    assert_eq!(
        StripedMapBuilder::new().shard_count(0).unwrap_err(),
        Error::InvalidShardCount
    );

    // Non powers of two are fine
    let map: StripedMap<u32, u32> = map_with_shards(7);
    assert_eq!(map.shard_count(), 7);
}

#[test]
fn test_borrowed_lookup() {
    let map: StripedMap<String, u32> = StripedMap::new();
    map.insert("alpha".to_string(), 1);

    assert_eq!(map.get("alpha"), Some(1));
    assert!(map.contains_key("alpha"));
    assert_eq!(map.shard_index("alpha"), map.shard_index(&"alpha".to_string()));
    assert_eq!(map.remove("alpha"), Some(1));
}
