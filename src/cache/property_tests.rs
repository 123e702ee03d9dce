//! Property-Based Tests for the storage layer
//!
//! Uses proptest to check the cache, backup, statistics and image retention
//! guarantees over generated inputs. Async code is driven with
//! `tokio_test::block_on`.

use std::sync::Arc;

use chrono::Duration;
use proptest::prelude::*;
use serde_json::{json, Value};
use tokio_test::block_on;

use crate::backup::BackupEngine;
use crate::cache::CacheStore;
use crate::clock::ManualClock;
use crate::durable::{DurableStore, MemoryStore};
use crate::images::{ImageResult, ImageStore, MAX_IMAGES_PER_USER};
use crate::keys;
use crate::statistics::{compute_statistics, AppointmentRecord};

// == Test Setup ==
fn fresh_cache() -> (Arc<MemoryStore>, Arc<ManualClock>, Arc<CacheStore>) {
    let durable = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let cache = Arc::new(CacheStore::with_clock(durable.clone(), clock.clone()));
    (durable, clock, cache)
}

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:@]{1,64}"
}

/// Generates JSON values without floats, so text round-trips are exact
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,24}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn status_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("confirmed".to_string())),
        Just(Some("cancelled".to_string())),
        Just(Some("pending".to_string())),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

fn appointment_strategy() -> impl Strategy<Value = AppointmentRecord> {
    (status_strategy(), prop::option::of("[A-Z][a-z]{2,8}")).prop_map(|(status, specialty)| {
        AppointmentRecord {
            status,
            specialty,
            doctor_id: None,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A write is immediately readable from memory without a durable read.
    #[test]
    fn prop_set_then_get_bypasses_durable(key in valid_key_strategy(), value in json_value_strategy()) {
        let (durable, _, cache) = fresh_cache();

        let read: Option<Value> = block_on(async {
            cache.set(&key, &value, None).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        prop_assert_eq!(read, Some(value));
        prop_assert_eq!(durable.reads(), 0);
    }

    // What memory serves and what a cold read of the durable store serves agree.
    #[test]
    fn prop_memory_and_durable_agree(key in valid_key_strategy(), value in json_value_strategy()) {
        let (_, _, cache) = fresh_cache();

        let (warm, cold): (Option<Value>, Option<Value>) = block_on(async {
            cache.set(&key, &value, None).await.unwrap();
            let warm = cache.get(&key).await.unwrap();
            cache.clear_memory_cache().await;
            let cold = cache.get(&key).await.unwrap();
            (warm, cold)
        });

        prop_assert_eq!(warm, cold);
    }

    // The last write to a key wins.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        first in json_value_strategy(),
        second in json_value_strategy()
    ) {
        let (_, _, cache) = fresh_cache();

        let read: Option<Value> = block_on(async {
            cache.set(&key, &first, None).await.unwrap();
            cache.set(&key, &second, Some(10)).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        prop_assert_eq!(read, Some(second));
    }

    // After remove, neither memory nor the durable store has the key.
    #[test]
    fn prop_remove_deletes_everywhere(key in valid_key_strategy(), value in json_value_strategy()) {
        let (durable, _, cache) = fresh_cache();

        let read: Option<Value> = block_on(async {
            cache.set(&key, &value, None).await.unwrap();
            cache.remove(&key).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        prop_assert!(read.is_none());
        prop_assert!(block_on(durable.peek(&key)).is_none());
    }

    // Restoring a fresh backup reproduces the four collections exactly.
    #[test]
    fn prop_backup_round_trip(
        appointments in prop::collection::vec(json_value_strategy(), 0..6),
        notifications in prop::collection::vec(json_value_strategy(), 0..6),
        users in prop::collection::vec(json_value_strategy(), 0..6),
        settings in prop::collection::btree_map("[a-z]{1,8}", json_value_strategy(), 0..5)
    ) {
        let (_, _, cache) = fresh_cache();
        let engine = BackupEngine::new(cache.clone());
        let settings = Value::Object(settings.into_iter().collect());
        let originals = [
            (keys::APPOINTMENTS, Value::from(appointments)),
            (keys::NOTIFICATIONS, Value::from(notifications)),
            (keys::REGISTERED_USERS, Value::from(users)),
            (keys::APP_SETTINGS, settings),
        ];

        let restored: Vec<Value> = block_on(async {
            for (key, value) in &originals {
                cache.set(key, value, None).await.unwrap();
            }
            let document = engine.create_backup().await.unwrap();
            cache.clear_all().await.unwrap();
            engine.restore(&document).await.unwrap();

            let mut restored = Vec::new();
            for (key, _) in &originals {
                restored.push(cache.get_or(key, Value::Null).await.unwrap());
            }
            restored
        });

        for ((_, original), restored) in originals.iter().zip(restored) {
            prop_assert_eq!(original, &restored);
        }
    }

    // Percentages stay within [0, 100] and sum to 100 whenever there are appointments.
    #[test]
    fn prop_status_percentages_sum_to_100(
        appointments in prop::collection::vec(appointment_strategy(), 0..40)
    ) {
        let stats = compute_statistics(&appointments, &[]);
        let p = stats.status_percentages;

        for share in [p.confirmed, p.cancelled, p.pending] {
            prop_assert!((0.0..=100.0).contains(&share));
        }
        if appointments.is_empty() {
            prop_assert_eq!(p.confirmed + p.cancelled + p.pending, 0.0);
        } else {
            prop_assert!((p.confirmed + p.cancelled + p.pending - 100.0).abs() < 1e-9);
        }
        let counted: u64 = stats.specialties.iter().map(|(_, n)| n).sum();
        let with_specialty = appointments.iter().filter(|a| a.specialty.is_some()).count() as u64;
        prop_assert_eq!(counted, with_specialty);
    }
}

// Fewer cases for the image retention property; each case performs many writes.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // The index never exceeds the bound and every record it lists exists;
    // nothing else is kept.
    #[test]
    fn prop_image_index_is_bounded(saves in 1usize..12) {
        let (durable, clock, cache) = fresh_cache();
        let images = ImageStore::new(cache);

        let (ids, stored) = block_on(async {
            for i in 0..saves {
                let image = ImageResult {
                    uri: "file:///photo.jpg".to_string(),
                    base64_payload: Some(format!("payload{}", i)),
                    width: 1,
                    height: 1,
                    file_size: None,
                };
                images.save_profile_image("u1", &image).await.unwrap();
                clock.advance(Duration::milliseconds(1));
            }
            let ids = images.user_image_ids("u1").await.unwrap();
            let stored: Vec<String> = durable
                .list_keys()
                .await
                .unwrap()
                .into_iter()
                .filter(|k| k.starts_with("@MedicalApp:profileImage:"))
                .collect();
            (ids, stored)
        });

        prop_assert_eq!(ids.len(), saves.min(MAX_IMAGES_PER_USER));
        prop_assert_eq!(stored.len(), ids.len());
        for id in &ids {
            prop_assert!(stored.contains(&keys::profile_image(id)));
        }
    }
}

// Memory entries never outlive their TTL.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_ttl_expiry_reads_durable(ttl in 1u32..120, key in valid_key_strategy()) {
        let (durable, clock, cache) = fresh_cache();

        let (before, after): (Option<Value>, Option<Value>) = block_on(async {
            cache.set(&key, &json!("cached"), Some(ttl)).await.unwrap();
            durable.set(&key, "\"changed\"".to_string()).await.unwrap();

            clock.advance(Duration::minutes(i64::from(ttl)) - Duration::seconds(1));
            let before = cache.get(&key).await.unwrap();
            clock.advance(Duration::seconds(1));
            let after = cache.get(&key).await.unwrap();
            (before, after)
        });

        prop_assert_eq!(before, Some(json!("cached")));
        prop_assert_eq!(after, Some(json!("changed")));
        prop_assert_eq!(durable.reads(), 1);
    }
}
