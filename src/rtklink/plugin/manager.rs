//! Plugin registration and instance lifecycle management.
//!
//! Plugins enter the manager two ways: `load` opens a shared library over
//! the C-ABI boundary, `register` installs an in-process [`DevicePlugin`]
//! factory. Both land in the same bounded, name-keyed plugin table.
//! Instances occupy a fixed slot array; destroying one clears its slot and
//! the occupancy high-water mark is recomputed by scanning.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, warn};

use super::api::DevicePlugin;
use super::config::PluginConfig;
use super::dynamic::load_plugin_library;
use super::error::{PluginError, PluginResult};

/// Capacity of the plugin table.
pub const MAX_PLUGINS: usize = 16;
/// Capacity of the instance slot array.
pub const MAX_INSTANCES: usize = 32;

type PluginFactory = Box<dyn Fn() -> Box<dyn DevicePlugin> + Send>;

/// A loaded or registered plugin.
pub struct PluginRecord {
    name: String,
    version: String,
    description: String,
    factory: PluginFactory,
}

impl PluginRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A created device instance.
///
/// The driver sits behind a `Mutex` because instances may be invoked from
/// multiple threads (a telemetry thread reading state while the poll thread
/// delivers a command); `is_running` is read lock-free.
pub struct PluginInstance {
    name: String,
    plugin_name: String,
    config: PluginConfig,
    driver: Mutex<Box<dyn DevicePlugin>>,
    running: AtomicBool,
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name)
            .field("plugin_name", &self.plugin_name)
            .field("config", &self.config)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl PluginInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run `f` against the device driver under the instance lock.
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut dyn DevicePlugin) -> R) -> R {
        let mut driver = match self.driver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(driver.as_mut())
    }
}

/// Loads device plugins and manages their instance lifecycle.
pub struct PluginManager {
    plugins: Vec<PluginRecord>,
    instances: Vec<Option<Arc<PluginInstance>>>,
    instance_high_water: usize,
    last_error: String,
}

impl PluginManager {
    pub fn new() -> Self {
        let mut instances = Vec::with_capacity(MAX_INSTANCES);
        instances.resize_with(MAX_INSTANCES, || None);
        Self {
            plugins: Vec::new(),
            instances,
            instance_high_water: 0,
            last_error: String::new(),
        }
    }

    fn fail<T>(&mut self, error: PluginError) -> PluginResult<T> {
        self.last_error = error.to_string();
        Err(error)
    }

    /// Human-readable context for the most recent failure.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    // === Plugin table ===

    /// Load a device plugin from a shared library.
    ///
    /// Resolves the three registration symbols, validates the exported
    /// vtable, and appends the plugin to the bounded table under its
    /// self-reported name.
    pub fn load(&mut self, path: impl AsRef<Path>) -> PluginResult<()> {
        let path = path.as_ref();
        if self.plugins.len() >= MAX_PLUGINS {
            return self.fail(PluginError::Capacity { limit: MAX_PLUGINS });
        }

        let template = match load_plugin_library(path) {
            Ok(template) => template,
            Err(e) => return self.fail(e),
        };
        if self.find(&template.name).is_some() {
            let name = template.name.clone();
            return self.fail(PluginError::AlreadyLoaded { name });
        }

        let record = PluginRecord {
            name: template.name.clone(),
            version: template.version.clone(),
            description: format!(
                "Plugin: {} v{} (loaded from {})",
                template.name,
                template.version,
                path.display()
            ),
            factory: Box::new(move || template.instantiate()),
        };
        info!("loaded plugin: {} v{}", record.name, record.version);
        self.plugins.push(record);
        Ok(())
    }

    /// Register an in-process device plugin factory under `name`.
    ///
    /// The factory produces a fresh driver for each created instance.
    pub fn register<F>(
        &mut self,
        name: &str,
        version: &str,
        description: &str,
        factory: F,
    ) -> PluginResult<()>
    where
        F: Fn() -> Box<dyn DevicePlugin> + Send + 'static,
    {
        if name.is_empty() {
            return self.fail(PluginError::InvalidParam("plugin name is empty".to_string()));
        }
        if self.plugins.len() >= MAX_PLUGINS {
            return self.fail(PluginError::Capacity { limit: MAX_PLUGINS });
        }
        if self.find(name).is_some() {
            return self.fail(PluginError::AlreadyLoaded {
                name: name.to_string(),
            });
        }

        self.plugins.push(PluginRecord {
            name: name.to_string(),
            version: version.to_string(),
            description: description.to_string(),
            factory: Box::new(factory),
        });
        info!("registered plugin: {} v{}", name, version);
        Ok(())
    }

    /// Remove a plugin from the table.
    ///
    /// Refused with [`PluginError::InUse`] while any instance of the plugin
    /// is running; stopped instances keep their driver alive independently.
    pub fn unload(&mut self, name: &str) -> PluginResult<()> {
        let Some(index) = self.plugins.iter().position(|p| p.name == name) else {
            return self.fail(PluginError::NotFound {
                name: name.to_string(),
            });
        };

        let busy = self.instances.iter().flatten().any(|instance| {
            instance.plugin_name == name && instance.is_running()
        });
        if busy {
            warn!("cannot unload plugin {}: instances still running", name);
            return self.fail(PluginError::InUse {
                name: name.to_string(),
            });
        }

        self.plugins.remove(index);
        info!("unloaded plugin: {}", name);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&PluginRecord> {
        self.plugins.iter().find(|p| p.name == name)
    }

    pub fn list_plugins(&self) -> impl Iterator<Item = &PluginRecord> {
        self.plugins.iter()
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    // === Instance lifecycle ===

    /// Create a device instance from a loaded plugin.
    ///
    /// Runs the plugin's `initialize` with `config`; when that fails the
    /// slot is rolled back and no instance is left behind.
    pub fn create_instance(
        &mut self,
        plugin_name: &str,
        instance_name: &str,
        config: PluginConfig,
    ) -> PluginResult<Arc<PluginInstance>> {
        if instance_name.is_empty() {
            return self.fail(PluginError::InvalidParam(
                "instance name is empty".to_string(),
            ));
        }
        if self.find_instance(instance_name).is_some() {
            return self.fail(PluginError::AlreadyExists {
                name: instance_name.to_string(),
            });
        }
        let Some(plugin) = self.find(plugin_name) else {
            return self.fail(PluginError::NotFound {
                name: plugin_name.to_string(),
            });
        };
        let Some(slot) = self.instances.iter().position(Option::is_none) else {
            return self.fail(PluginError::Capacity {
                limit: MAX_INSTANCES,
            });
        };

        let mut driver = (plugin.factory)();
        if let Err(e) = driver.initialize(&config) {
            let error = PluginError::Init {
                name: plugin_name.to_string(),
                message: e.to_string(),
            };
            return self.fail(error);
        }

        let instance = Arc::new(PluginInstance {
            name: instance_name.to_string(),
            plugin_name: plugin_name.to_string(),
            config,
            driver: Mutex::new(driver),
            running: AtomicBool::new(false),
        });

        self.instances[slot] = Some(Arc::clone(&instance));
        if slot >= self.instance_high_water {
            self.instance_high_water = slot + 1;
        }
        info!(
            "created instance: {} (plugin: {})",
            instance_name, plugin_name
        );
        Ok(instance)
    }

    /// Stop (if running) and remove an instance, freeing its slot.
    pub fn destroy_instance(&mut self, instance_name: &str) -> PluginResult<()> {
        let Some(slot) = self.instance_slot(instance_name) else {
            return self.fail(PluginError::NotFound {
                name: instance_name.to_string(),
            });
        };

        let running = self.instances[slot]
            .as_ref()
            .is_some_and(|instance| instance.is_running());
        if running {
            self.stop_instance(instance_name)?;
        }

        self.instances[slot] = None;
        self.instance_high_water = self
            .instances
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |i| i + 1);
        info!("destroyed instance: {}", instance_name);
        Ok(())
    }

    /// Idempotent: succeeds immediately when the instance is already
    /// running. `is_running` flips only after the driver's `start` succeeds.
    pub fn start_instance(&mut self, instance_name: &str) -> PluginResult<()> {
        let Some(instance) = self.find_instance(instance_name) else {
            return self.fail(PluginError::NotFound {
                name: instance_name.to_string(),
            });
        };
        if instance.is_running() {
            return Ok(());
        }

        if let Err(e) = instance.with_driver(|driver| driver.start()) {
            warn!("failed to start instance {}: {}", instance_name, e);
            return self.fail(e);
        }
        instance.running.store(true, Ordering::SeqCst);
        info!("started instance: {}", instance_name);
        Ok(())
    }

    /// Idempotent: succeeds immediately when the instance is already
    /// stopped.
    pub fn stop_instance(&mut self, instance_name: &str) -> PluginResult<()> {
        let Some(instance) = self.find_instance(instance_name) else {
            return self.fail(PluginError::NotFound {
                name: instance_name.to_string(),
            });
        };
        if !instance.is_running() {
            return Ok(());
        }

        if let Err(e) = instance.with_driver(|driver| driver.stop()) {
            warn!("failed to stop instance {}: {}", instance_name, e);
            return self.fail(e);
        }
        instance.running.store(false, Ordering::SeqCst);
        info!("stopped instance: {}", instance_name);
        Ok(())
    }

    /// Health probe: `false` when the instance is not running, otherwise the
    /// driver's own `health_check` (healthy by default).
    pub fn health_check(&self, instance_name: &str) -> PluginResult<bool> {
        let instance = self
            .find_instance(instance_name)
            .ok_or_else(|| PluginError::NotFound {
                name: instance_name.to_string(),
            })?;
        if !instance.is_running() {
            return Ok(false);
        }
        Ok(instance.with_driver(|driver| driver.health_check()))
    }

    pub fn find_instance(&self, instance_name: &str) -> Option<Arc<PluginInstance>> {
        self.instances
            .iter()
            .flatten()
            .find(|instance| instance.name == instance_name)
            .cloned()
    }

    fn instance_slot(&self, instance_name: &str) -> Option<usize> {
        self.instances.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|instance| instance.name == instance_name)
        })
    }

    /// Occupancy high-water mark of the instance slot array.
    pub fn instance_count(&self) -> usize {
        self.instance_high_water
    }

    /// Stop and destroy every instance, then drop every plugin.
    pub fn shutdown(&mut self) {
        let names: Vec<String> = self
            .instances
            .iter()
            .flatten()
            .map(|instance| instance.name.clone())
            .collect();
        for name in names {
            if let Err(e) = self.destroy_instance(&name) {
                warn!("failed to destroy instance {} during shutdown: {}", name, e);
            }
        }
        self.plugins.clear();
        info!("plugin manager shut down");
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
