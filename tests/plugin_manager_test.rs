use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rtklink::{
    DeviceInfo, DevicePlugin, PluginConfig, PluginError, PluginManager, PluginResult,
};

/// Counter-backed mock device used as an in-process plugin.
#[derive(Default)]
struct MockDevice {
    device_id: String,
    started: bool,
    healthy: bool,
    fail_initialize: bool,
    fail_start: bool,
    commands_handled: Arc<AtomicU32>,
}

impl MockDevice {
    fn healthy(commands: Arc<AtomicU32>) -> Self {
        Self {
            healthy: true,
            commands_handled: commands,
            ..Self::default()
        }
    }
}

impl DevicePlugin for MockDevice {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            id: self.device_id.clone(),
            device_type: "sensor".to_string(),
            model: "mock-1000".to_string(),
            capabilities: vec!["state".to_string(), "telemetry".to_string()],
            ..DeviceInfo::default()
        }
    }

    fn state_json(&self) -> PluginResult<String> {
        Ok(format!(
            r#"{{"health":"{}"}}"#,
            if self.healthy { "ok" } else { "error" }
        ))
    }

    fn telemetry_json(&self, metric: &str) -> PluginResult<String> {
        match metric {
            "temp" => Ok(r#"{"value":21.5,"unit":"C"}"#.to_string()),
            other => Err(PluginError::NotFound {
                name: other.to_string(),
            }),
        }
    }

    fn telemetry_metrics(&self) -> Vec<String> {
        vec!["temp".to_string()]
    }

    fn handle_command(&mut self, _cmd_json: &str) -> PluginResult<String> {
        self.commands_handled.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"ok":true}"#.to_string())
    }

    fn initialize(&mut self, config: &PluginConfig) -> PluginResult<()> {
        if self.fail_initialize {
            return Err(PluginError::Config("mock refuses to initialize".to_string()));
        }
        self.device_id = config.device_id.clone();
        Ok(())
    }

    fn start(&mut self) -> PluginResult<()> {
        if self.fail_start {
            return Err(PluginError::CallFailed {
                operation: "start".to_string(),
                code: -1,
            });
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> PluginResult<()> {
        self.started = false;
        Ok(())
    }

    fn health_check(&self) -> bool {
        self.healthy
    }
}

fn manager_with_mock() -> (PluginManager, Arc<AtomicU32>) {
    let commands = Arc::new(AtomicU32::new(0));
    let factory_commands = Arc::clone(&commands);
    let mut manager = PluginManager::new();
    manager
        .register("mock-sensor", "1.0.0", "Mock sensor device", move || {
            Box::new(MockDevice::healthy(Arc::clone(&factory_commands)))
        })
        .unwrap();
    (manager, commands)
}

#[test]
fn test_register_duplicate_name_fails() {
    let (mut manager, _) = manager_with_mock();
    let err = manager
        .register("mock-sensor", "2.0.0", "duplicate", || {
            Box::new(MockDevice::default())
        })
        .unwrap_err();
    assert_eq!(
        err,
        PluginError::AlreadyLoaded {
            name: "mock-sensor".to_string()
        }
    );
}

#[test]
fn test_find_and_list() {
    let (manager, _) = manager_with_mock();
    let record = manager.find("mock-sensor").unwrap();
    assert_eq!(record.version(), "1.0.0");
    assert_eq!(manager.plugin_count(), 1);
    assert!(manager.find("missing").is_none());
}

#[test]
fn test_instance_lifecycle() {
    let (mut manager, commands) = manager_with_mock();
    let config = PluginConfig {
        device_id: "sensor-7".to_string(),
        ..PluginConfig::default()
    };
    let instance = manager
        .create_instance("mock-sensor", "sensor-7", config)
        .unwrap();
    assert!(!instance.is_running());
    assert_eq!(instance.plugin_name(), "mock-sensor");

    // initialize ran with the instance config
    assert_eq!(instance.with_driver(|d| d.device_info().id), "sensor-7");

    manager.start_instance("sensor-7").unwrap();
    assert!(instance.is_running());
    // Idempotent start
    manager.start_instance("sensor-7").unwrap();

    assert_eq!(manager.health_check("sensor-7").unwrap(), true);

    let response = instance
        .with_driver(|d| d.handle_command(r#"{"op":"noop"}"#))
        .unwrap();
    assert_eq!(response, r#"{"ok":true}"#);
    assert_eq!(commands.load(Ordering::SeqCst), 1);

    manager.stop_instance("sensor-7").unwrap();
    assert!(!instance.is_running());
    // Idempotent stop
    manager.stop_instance("sensor-7").unwrap();

    // Health of a stopped instance reports unhealthy without calling the driver
    assert_eq!(manager.health_check("sensor-7").unwrap(), false);

    manager.destroy_instance("sensor-7").unwrap();
    assert!(manager.find_instance("sensor-7").is_none());
    assert_eq!(manager.instance_count(), 0);
}

#[test]
fn test_duplicate_instance_name_fails() {
    let (mut manager, _) = manager_with_mock();
    manager
        .create_instance("mock-sensor", "dup", PluginConfig::default())
        .unwrap();
    let err = manager
        .create_instance("mock-sensor", "dup", PluginConfig::default())
        .unwrap_err();
    assert_eq!(
        err,
        PluginError::AlreadyExists {
            name: "dup".to_string()
        }
    );
}

#[test]
fn test_create_instance_unknown_plugin_fails() {
    let (mut manager, _) = manager_with_mock();
    assert!(matches!(
        manager.create_instance("ghost", "inst", PluginConfig::default()),
        Err(PluginError::NotFound { .. })
    ));
}

#[test]
fn test_failed_initialize_rolls_back_slot() {
    let mut manager = PluginManager::new();
    manager
        .register("failing", "1.0.0", "always refuses config", || {
            Box::new(MockDevice {
                fail_initialize: true,
                ..MockDevice::default()
            })
        })
        .unwrap();

    assert!(matches!(
        manager.create_instance("failing", "inst", PluginConfig::default()),
        Err(PluginError::Init { .. })
    ));
    assert!(manager.find_instance("inst").is_none());
    assert_eq!(manager.instance_count(), 0);
}

#[test]
fn test_failed_start_keeps_instance_stopped() {
    let mut manager = PluginManager::new();
    manager
        .register("flaky", "1.0.0", "start always fails", || {
            Box::new(MockDevice {
                fail_start: true,
                ..MockDevice::default()
            })
        })
        .unwrap();
    let instance = manager
        .create_instance("flaky", "inst", PluginConfig::default())
        .unwrap();

    assert!(manager.start_instance("inst").is_err());
    assert!(!instance.is_running());
}

#[test]
fn test_unload_refused_while_instances_running() {
    let (mut manager, _) = manager_with_mock();
    manager
        .create_instance("mock-sensor", "inst", PluginConfig::default())
        .unwrap();
    manager.start_instance("inst").unwrap();

    // A running instance blocks unload with the dedicated busy code
    assert_eq!(
        manager.unload("mock-sensor").unwrap_err(),
        PluginError::InUse {
            name: "mock-sensor".to_string()
        }
    );

    manager.stop_instance("inst").unwrap();
    manager.unload("mock-sensor").unwrap();
    assert!(manager.find("mock-sensor").is_none());
}

#[test]
fn test_unload_unknown_plugin_not_found() {
    let mut manager = PluginManager::new();
    assert_eq!(
        manager.unload("ghost").unwrap_err(),
        PluginError::NotFound {
            name: "ghost".to_string()
        }
    );
}

#[test]
fn test_instance_high_water_recomputed_on_destroy() {
    let (mut manager, _) = manager_with_mock();
    for name in ["a", "b", "c"] {
        manager
            .create_instance("mock-sensor", name, PluginConfig::default())
            .unwrap();
    }
    assert_eq!(manager.instance_count(), 3);

    // Clearing a middle slot keeps the high-water mark
    manager.destroy_instance("b").unwrap();
    assert_eq!(manager.instance_count(), 3);
    // Clearing the highest occupied slot lowers it
    manager.destroy_instance("c").unwrap();
    assert_eq!(manager.instance_count(), 1);
}

#[test]
fn test_shutdown_destroys_everything() {
    let (mut manager, _) = manager_with_mock();
    manager
        .create_instance("mock-sensor", "inst", PluginConfig::default())
        .unwrap();
    manager.start_instance("inst").unwrap();
    manager.shutdown();
    assert!(manager.find_instance("inst").is_none());
    assert_eq!(manager.plugin_count(), 0);
}

#[test]
fn test_dynamic_load_failure_paths() {
    let mut manager = PluginManager::new();
    assert!(matches!(
        manager.load("/nonexistent/libplugin.so"),
        Err(PluginError::LoadFailed { .. })
    ));

    // A present file that is not a loadable library also fails cleanly
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("not_a_plugin.so");
    std::fs::write(&bogus, b"definitely not an ELF").unwrap();
    assert!(matches!(
        manager.load(&bogus),
        Err(PluginError::LoadFailed { .. })
    ));
    assert!(!manager.last_error().is_empty());
}

#[test]
fn test_plugin_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.json");

    let config = PluginConfig {
        broker_host: "broker.lan".to_string(),
        broker_port: 8883,
        device_id: "gw-1".to_string(),
        tenant: "acme".to_string(),
        site: "hq".to_string(),
        plugin_config: serde_json::json!({"scan_interval": 30}),
        ..PluginConfig::default()
    };
    config.save_to_file(&path).unwrap();

    let loaded = PluginConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);

    assert!(matches!(
        PluginConfig::load_from_file(dir.path().join("missing.json")),
        Err(PluginError::NotFound { .. })
    ));

    std::fs::write(&path, "{broken").unwrap();
    assert!(matches!(
        PluginConfig::load_from_file(&path),
        Err(PluginError::Config(_))
    ));
}
