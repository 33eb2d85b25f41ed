use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wheelrun_game::{
    CatalogIssue, ItemId, RunConfig, WheelContentGenerator, ZoneCatalog, ZoneManager, ZoneType,
    classify,
};

#[test]
fn bundled_catalog_keeps_exclusives_out_of_regular_wheels() {
    let catalog = ZoneCatalog::load_from_static();
    let generator = WheelContentGenerator::new(8);
    let exclusive: Vec<ItemId> = catalog
        .zone(ZoneType::Super)
        .reward_pool
        .iter()
        .filter(|entry| entry.super_zone_exclusive)
        .filter_map(|entry| entry.item.as_ref().map(|item| item.id.clone()))
        .collect();
    assert!(!exclusive.is_empty());

    let mut rng = ChaCha8Rng::seed_from_u64(0xFEED);
    for level in 1..=59 {
        let zone_type = classify(level);
        if zone_type == ZoneType::Super {
            continue;
        }
        let outcomes = generator.generate(catalog.zone(zone_type), level, None, &mut rng);
        assert_eq!(outcomes.len(), 8, "level {level}");
        let bombs = outcomes.iter().filter(|o| o.is_bomb()).count();
        assert_eq!(bombs, usize::from(zone_type == ZoneType::Normal));
        for outcome in &outcomes {
            if let Some(item) = outcome.item() {
                assert!(!exclusive.contains(&item.id), "level {level}: {}", item.id);
                assert!(outcome.amount() >= item.min_amount);
            }
        }
    }
}

#[test]
fn guaranteed_entries_appear_on_every_bundled_wheel() {
    let catalog = ZoneCatalog::load_from_static();
    let generator = WheelContentGenerator::new(8);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for zone_type in [ZoneType::Normal, ZoneType::Safe, ZoneType::Super] {
        let zone = catalog.zone(zone_type);
        let guaranteed: Vec<&ItemId> = zone
            .reward_pool
            .iter()
            .filter(|entry| entry.guaranteed)
            .filter_map(|entry| entry.item.as_ref().map(|item| &item.id))
            .collect();
        for _ in 0..16 {
            let outcomes = generator.generate(zone, 12, None, &mut rng);
            for id in &guaranteed {
                assert!(
                    outcomes
                        .iter()
                        .any(|o| o.item().is_some_and(|item| &item.id == *id)),
                    "{zone_type} wheel missing {id}"
                );
            }
        }
    }
}

#[test]
fn audit_reports_defects_without_rejecting_catalog() {
    let json = r#"{
        "items": [{ "id": "dust", "rarity": "common", "min_amount": 0, "max_amount": 3 }],
        "zones": {
            "normal": { "zone_type": "normal", "bomb_count": 8,
                        "reward_pool": [{ "item": "dust" }],
                        "rarity_weights": { "common": 10, "rare": 0, "epic": 0, "legendary": 0 } },
            "safe": { "zone_type": "safe", "has_bomb": false,
                      "reward_pool": [{ "item": "missing" }] },
            "super": { "zone_type": "super", "has_bomb": false,
                       "reward_pool": [{ "item": "dust" }] }
        }
    }"#;
    let catalog = ZoneCatalog::from_json(json).unwrap();
    let issues = catalog.audit(8);
    assert!(issues.contains(&CatalogIssue::BombsFillWheel {
        zone: ZoneType::Normal,
        bombs: 8,
        wheel: 8
    }));
    assert!(issues.contains(&CatalogIssue::UnbalancedWeights {
        zone: ZoneType::Normal,
        total: 10.0
    }));
    assert!(issues.contains(&CatalogIssue::NoEligibleRewards {
        zone: ZoneType::Safe
    }));
    assert!(issues.iter().any(|issue| matches!(
        issue,
        CatalogIssue::ZeroQuantity { item, .. } if item.as_str() == "dust"
    )));

    let generator = WheelContentGenerator::new(8);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let normal = generator.generate(catalog.zone(ZoneType::Normal), 1, None, &mut rng);
    assert!(normal.iter().all(|o| o.is_bomb()));
    let safe = generator.generate(catalog.zone(ZoneType::Safe), 5, None, &mut rng);
    assert!(safe.is_empty());
}

#[test]
fn zone_manager_walks_a_sixty_level_run() {
    let mut zones = ZoneManager::new(Arc::new(ZoneCatalog::load_from_static()));
    zones.initialize(1, 60);
    let mut exits = Vec::new();
    while zones.current_level() < zones.max_level() {
        zones.advance();
        if zones.can_exit_current_zone() {
            exits.push(zones.current_level());
        }
        assert_eq!(
            zones.current_zone().zone_type,
            zones.level_record(zones.current_level()).unwrap().zone_type
        );
    }
    assert_eq!(exits, (1..=12).map(|n| n * 5).collect::<Vec<_>>());
    assert_eq!(zones.next_super_level(), 90);
}

#[test]
fn run_config_reads_partial_json() {
    let config = RunConfig::from_json(r#"{ "wheel_item_count": 12, "max_revives": 3 }"#).unwrap();
    assert_eq!(config.wheel_item_count, 12);
    assert_eq!(config.max_revives, 3);
    assert_eq!(config.max_level, 60);
    assert!(config.auto_restart);
    assert!(config.validate().is_ok());
}
