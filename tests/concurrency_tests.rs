//! Concurrent access to a shared `Config`.

use config_tree::{Config, ErrorKind};
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;
const KEYS_PER_THREAD: usize = 50;

#[test]
fn test_parallel_writers_on_distinct_keys() {
    let config = Arc::new(Config::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                for i in 0..KEYS_PER_THREAD {
                    config
                        .set(&format!("worker{}.key{}", t, i), &i.to_string(), false)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(config.len(), THREADS * KEYS_PER_THREAD);
    for t in 0..THREADS {
        assert_eq!(config.get_all(&format!("worker{}", t)).len(), KEYS_PER_THREAD);
    }
}

#[test]
fn test_exactly_one_writer_wins_without_force() {
    let config = Arc::new(Config::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let config = Arc::clone(&config);
            thread::spawn(move || config.set("leader", &format!("worker{}", t), false))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::KeyInStore)
    );
    assert!(config.get_string("leader").unwrap().starts_with("worker"));
}

#[test]
fn test_readers_see_whole_values_during_writes() {
    let config = Arc::new(Config::new());
    config.set("counter", "0", false).unwrap();

    let writer = {
        let config = Arc::clone(&config);
        thread::spawn(move || {
            for i in 1..=200 {
                config.set("counter", &i.to_string(), true).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let config = Arc::clone(&config);
            thread::spawn(move || {
                for _ in 0..200 {
                    let value = config.get_int("counter").unwrap();
                    assert!((0..=200).contains(&value));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(config.get_int("counter").unwrap(), 200);
}

#[test]
fn test_merge_while_writing() {
    let target = Arc::new(Config::new());
    let source = Config::new();
    for i in 0..100 {
        source.set(&format!("src.key{}", i), "s", false).unwrap();
    }

    let writer = {
        let target = Arc::clone(&target);
        thread::spawn(move || {
            for i in 0..100 {
                target.set(&format!("own.key{}", i), "o", false).unwrap();
            }
        })
    };
    target.merge(&source, false).unwrap();
    writer.join().unwrap();

    assert_eq!(target.len(), 200);
    target.compare(&source, true).unwrap();
}
