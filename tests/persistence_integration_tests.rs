//! Integration tests for snapshot persistence and reload

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use waystones::{
    DiscoveryRegistry, DurabilityMode, Location, RegistryConfig, SnapshotFormat, TeleportDirection, Waystone,
    WaystoneColor, WaystoneRegistry,
};

fn stone(name: &str, owner: &str) -> Waystone {
    Waystone::new(name, Location::new("overworld", 12.5, 70.0, -8.25).with_yaw(1.5), owner, "Alice", true)
}

fn open(config: &RegistryConfig) -> (Arc<WaystoneRegistry>, DiscoveryRegistry) {
    let registry = Arc::new(WaystoneRegistry::new(config));
    let discovery = DiscoveryRegistry::new(config, Arc::clone(&registry));
    registry.load();
    discovery.load();
    (registry, discovery)
}

#[test]
fn test_round_trip_restores_records_and_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path()).durability(DurabilityMode::Sync);

    let spawn = stone("Spawn", "p-1").with_priority(7).with_default_discovered(true);
    let spawn_id = spawn.id().to_string();

    // Session 1
    {
        let (registry, discovery) = open(&config);
        registry.register(spawn).unwrap();
        registry.update_teleport_direction(&spawn_id, TeleportDirection::West);
        registry.update_color(&spawn_id, WaystoneColor::Green);
        registry.add_viewer(&spawn_id, "p-4");
        registry.set_debug_logs(true);
        registry.set_require_discover(true);
        discovery.discover_waystone("p-2", &spawn_id);
        discovery.ensure_exists("p-3");
        discovery.discover_waystone("p-3", "some-other-id");
    }

    // Session 2
    let (registry, discovery) = open(&config);
    assert!(registry.is_loaded());
    assert!(discovery.is_loaded());
    assert_eq!(registry.count(), 1);
    assert!(registry.debug_logs());
    assert!(registry.require_discover());

    let restored = registry.get(&spawn_id).unwrap();
    assert_eq!(restored.name(), "Spawn");
    assert_eq!(restored.priority(), 7);
    assert_eq!(restored.location(), Location::new("overworld", 12.5, 70.0, -8.25).with_yaw(1.5));
    assert_eq!(restored.teleport_direction(), TeleportDirection::West);
    assert_eq!(restored.color(), WaystoneColor::Green);
    assert!(restored.is_viewer("p-4"));
    assert!(restored.is_default_discovered());

    assert_eq!(discovery.player_count(), 2);
    assert!(discovery.has_discovered("p-2", &spawn_id));
    // Stale ids survive on disk until the next read prunes them.
    assert!(discovery.has_discovered("p-3", "some-other-id"));
    assert!(discovery.get_discovered("p-3").is_empty());
}

#[test]
fn test_messagepack_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path())
        .format(SnapshotFormat::MessagePack)
        .waystones_file("waystones.msgpack")
        .players_file("players.msgpack");

    let id = {
        let (registry, discovery) = open(&config);
        let placed = stone("Harbor", "p-1");
        let id = placed.id().to_string();
        registry.register(placed).unwrap();
        discovery.discover_waystone("p-1", &id);
        id
    };

    assert!(serde_json::from_slice::<serde_json::Value>(&fs::read(config.waystones_path()).unwrap()).is_err());

    let (registry, discovery) = open(&config);
    assert_eq!(registry.get(&id).unwrap().name(), "Harbor");
    assert!(discovery.has_discovered("p-1", &id));
}

#[test]
fn test_document_layout() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path());
    let (registry, _) = open(&config);
    registry.register(stone("Spawn", "p-1")).unwrap();

    let text = fs::read_to_string(config.waystones_path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(doc["Config"]["DebugLogs"], serde_json::json!(false));
    assert_eq!(doc["Config"]["RequireDiscover"], serde_json::json!(false));
    let record = &doc["Waystones"][0];
    assert_eq!(record["Name"], "Spawn");
    assert_eq!(record["World"], "overworld");
    assert_eq!(record["OwnerUuid"], "p-1");
    assert_eq!(record["IsPublic"], true);
    assert_eq!(record["TextColor"], "#ffffff");
    assert_eq!(record["TeleportDirection"], "north");
    assert_eq!(record["PlayerOrientation"], "away");
    assert_eq!(record["Color"], "default");
    assert!(record["CreatedAt"].is_string());
}

#[test]
fn test_legacy_document_without_optional_keys() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path());
    fs::write(
        config.waystones_path(),
        r#"{"Waystones": [{
            "Id": "legacy-1", "Name": "Old Mill", "World": "overworld",
            "X": 5.0, "Y": 60.0, "Z": 5.0, "Yaw": 0.0,
            "OwnerUuid": "p-1", "OwnerName": "Alice", "IsPublic": false,
            "CreatedAt": "2024-06-01T12:00:00Z"
        }]}"#,
    )
    .unwrap();

    let (registry, _) = open(&config);
    let mill = registry.get("legacy-1").unwrap();
    assert_eq!(mill.name(), "Old Mill");
    assert_eq!(mill.priority(), 0);
    assert!(!registry.require_discover());
    assert_eq!(registry.get_by_position("overworld", 5.9, 60.1, 5.5).unwrap().id(), "legacy-1");
}

#[test]
fn test_malformed_file_starts_empty_and_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path());
    fs::write(config.waystones_path(), "{ \"Waystones\": [ truncated").unwrap();
    fs::write(config.players_path(), "not json at all").unwrap();

    let (registry, discovery) = open(&config);
    assert!(registry.is_loaded());
    assert_eq!(registry.count(), 0);
    assert_eq!(discovery.player_count(), 0);

    registry.register(stone("Fresh", "p-1")).unwrap();
    let (reloaded, _) = open(&config);
    assert_eq!(reloaded.count(), 1);
}

#[test]
fn test_memory_only_mode_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = RegistryConfig::new(temp_dir.path()).durability(DurabilityMode::None);

    let (registry, discovery) = open(&config);
    let placed = stone("Ghost", "p-1");
    let id = placed.id().to_string();
    registry.register(placed).unwrap();
    discovery.discover_waystone("p-1", &id);

    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_write_failure_keeps_memory_authoritative() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, b"occupied").unwrap();
    let config = RegistryConfig::new(&blocker);

    let (registry, _) = open(&config);
    registry.register(stone("Stranded", "p-1")).unwrap();

    assert_eq!(registry.count(), 1);
    assert!(registry.find_by_name("stranded").is_some());
    assert!(registry.save_stats().failed >= 1);
}
