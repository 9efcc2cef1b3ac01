//! Shared-library plugin loading over a stable C ABI.
//!
//! A plugin binary exports three symbols:
//!
//! ```text
//! const rtk_plugin_vtable* rtk_plugin_get_vtable(void);
//! const char*              rtk_plugin_get_version(void);
//! const char*              rtk_plugin_get_name(void);
//! ```
//!
//! The vtable is a fixed table of capability function pointers mirroring
//! [`super::api::DevicePlugin`]. Strings returned by the plugin are released
//! through its `free_json_string` entry, falling back to the C allocator's
//! `free` when the entry is absent.

use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use libloading::{Library, Symbol};
use log::{debug, warn};

use super::api::{DeviceInfo, DevicePlugin};
use super::config::PluginConfig;
use super::error::{PluginError, PluginResult};

pub const SYMBOL_GET_VTABLE: &[u8] = b"rtk_plugin_get_vtable";
pub const SYMBOL_GET_VERSION: &[u8] = b"rtk_plugin_get_version";
pub const SYMBOL_GET_NAME: &[u8] = b"rtk_plugin_get_name";

/// Device identity block filled by the plugin's `get_device_info`.
#[repr(C)]
pub struct RawDeviceInfo {
    pub id: [c_char; 64],
    pub device_type: [c_char; 32],
    pub model: [c_char; 64],
    pub serial_number: [c_char; 32],
    pub hw_version: [c_char; 16],
    pub fw_version: [c_char; 16],
    pub capability_count: c_int,
    pub capabilities: [[c_char; 32]; 16],
}

impl RawDeviceInfo {
    fn zeroed() -> Self {
        // SAFETY: all fields are plain integer types; the all-zeroes pattern
        // is a valid value (empty NUL-terminated strings, zero count).
        unsafe { std::mem::zeroed() }
    }
}

/// Instance configuration marshalled across the ABI for `initialize`.
#[repr(C)]
pub struct RawPluginConfig {
    pub broker_host: [c_char; 256],
    pub broker_port: c_int,
    pub device_id: [c_char; 64],
    pub tenant: [c_char; 64],
    pub site: [c_char; 64],
    pub username: [c_char; 64],
    pub password: [c_char; 128],
    pub plugin_config: [c_char; 1024],
    pub telemetry_interval: c_int,
    pub event_cooldown: c_int,
}

/// Capability function table exported by a plugin binary.
///
/// `get_device_info` and `initialize` are mandatory; every other entry may
/// be null. Status-returning entries use 0 for success and a negative code
/// for failure.
#[repr(C)]
pub struct RawPluginVtable {
    pub get_device_info: Option<unsafe extern "C" fn(*mut RawDeviceInfo) -> c_int>,
    pub get_capabilities: Option<unsafe extern "C" fn(*mut *mut c_char, *mut c_int) -> c_int>,
    pub get_state: Option<unsafe extern "C" fn(*mut *mut c_char, *mut usize) -> c_int>,
    pub get_attributes: Option<unsafe extern "C" fn(*mut *mut c_char, *mut usize) -> c_int>,
    pub get_telemetry:
        Option<unsafe extern "C" fn(*const c_char, *mut *mut c_char, *mut usize) -> c_int>,
    pub list_telemetry_metrics: Option<unsafe extern "C" fn(*mut *mut c_char, *mut c_int) -> c_int>,
    pub on_event_trigger: Option<unsafe extern "C" fn(*const c_char, *const c_char) -> c_int>,
    pub get_supported_events: Option<unsafe extern "C" fn(*mut *mut c_char, *mut c_int) -> c_int>,
    pub handle_command:
        Option<unsafe extern "C" fn(*const c_char, *mut *mut c_char, *mut usize) -> c_int>,
    pub get_supported_commands: Option<unsafe extern "C" fn(*mut *mut c_char, *mut c_int) -> c_int>,
    pub initialize: Option<unsafe extern "C" fn(*const RawPluginConfig) -> c_int>,
    pub start: Option<unsafe extern "C" fn() -> c_int>,
    pub stop: Option<unsafe extern "C" fn() -> c_int>,
    pub health_check: Option<unsafe extern "C" fn() -> c_int>,
    pub free_json_string: Option<unsafe extern "C" fn(*mut c_char)>,
}

type GetVtableFn = unsafe extern "C" fn() -> *const RawPluginVtable;
type GetStringFn = unsafe extern "C" fn() -> *const c_char;

/// Pointer to a plugin's exported vtable, valid while its library is loaded.
#[derive(Clone, Copy)]
pub(crate) struct VtableRef(*const RawPluginVtable);

// SAFETY: the vtable is static data inside the loaded library and the ABI
// contract requires its entries to be callable from any thread; the
// framework additionally serializes instance calls behind a lock.
unsafe impl Send for VtableRef {}
unsafe impl Sync for VtableRef {}

/// A loaded plugin binary, ready to instantiate [`DynamicPlugin`] adapters.
pub(crate) struct DynamicPluginTemplate {
    pub(crate) name: String,
    pub(crate) version: String,
    vtable: VtableRef,
    library: Arc<Library>,
}

impl std::fmt::Debug for DynamicPluginTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicPluginTemplate")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl DynamicPluginTemplate {
    pub(crate) fn instantiate(&self) -> Box<dyn DevicePlugin> {
        Box::new(DynamicPlugin {
            vtable: self.vtable,
            _library: Arc::clone(&self.library),
            info_cache: None,
        })
    }
}

/// Open a plugin binary, resolve its registration symbols, and validate the
/// vtable.
pub(crate) fn load_plugin_library(path: &Path) -> PluginResult<DynamicPluginTemplate> {
    if !path.exists() {
        return Err(PluginError::LoadFailed {
            message: format!("plugin file not found: {}", path.display()),
        });
    }

    // SAFETY: loading and calling a foreign plugin entrypoint is inherently
    // unsafe; the symbols below are validated before use.
    let library = unsafe { Library::new(path) }.map_err(|e| PluginError::LoadFailed {
        message: format!("cannot load {}: {}", path.display(), e),
    })?;

    let missing_symbol = |symbol: &[u8], e: libloading::Error| PluginError::LoadFailed {
        message: format!(
            "missing symbol `{}` in {}: {}",
            String::from_utf8_lossy(symbol),
            path.display(),
            e
        ),
    };

    // SAFETY: symbol types match the documented ABI contract.
    let (vtable_ptr, name, version) = unsafe {
        let get_vtable: Symbol<GetVtableFn> = library
            .get(SYMBOL_GET_VTABLE)
            .map_err(|e| missing_symbol(SYMBOL_GET_VTABLE, e))?;
        let get_version: Symbol<GetStringFn> = library
            .get(SYMBOL_GET_VERSION)
            .map_err(|e| missing_symbol(SYMBOL_GET_VERSION, e))?;
        let get_name: Symbol<GetStringFn> = library
            .get(SYMBOL_GET_NAME)
            .map_err(|e| missing_symbol(SYMBOL_GET_NAME, e))?;

        let vtable_ptr = get_vtable();
        let name = const_cstr_to_string(get_name());
        let version = const_cstr_to_string(get_version());
        (vtable_ptr, name, version)
    };

    if vtable_ptr.is_null() || name.is_empty() || version.is_empty() {
        return Err(PluginError::LoadFailed {
            message: format!("invalid registration data in {}", path.display()),
        });
    }

    // SAFETY: non-null vtable pointer from the plugin's registration call;
    // remains valid while the library stays loaded.
    let vtable = unsafe { &*vtable_ptr };
    validate_vtable(vtable)?;

    debug!("resolved plugin {} v{} from {}", name, version, path.display());
    Ok(DynamicPluginTemplate {
        name,
        version,
        vtable: VtableRef(vtable_ptr),
        library: Arc::new(library),
    })
}

/// The vtable must expose at minimum `get_device_info` and `initialize`.
pub(crate) fn validate_vtable(vtable: &RawPluginVtable) -> PluginResult<()> {
    if vtable.get_device_info.is_none() || vtable.initialize.is_none() {
        return Err(PluginError::InvalidVtable {
            message: "get_device_info and initialize are required".to_string(),
        });
    }
    Ok(())
}

/// Adapter presenting a loaded C-ABI plugin as a [`DevicePlugin`].
pub(crate) struct DynamicPlugin {
    vtable: VtableRef,
    /// Keeps the library mapped for as long as any instance lives.
    _library: Arc<Library>,
    info_cache: Option<DeviceInfo>,
}

impl DynamicPlugin {
    fn vtable(&self) -> &RawPluginVtable {
        // SAFETY: the Arc<Library> field keeps the mapping alive, and the
        // pointer was validated non-null at load time.
        unsafe { &*self.vtable.0 }
    }

    /// Copy a plugin-owned string out and release it through the plugin's
    /// deallocator.
    fn take_plugin_string(&self, ptr: *mut c_char) -> String {
        if ptr.is_null() {
            return String::new();
        }
        // SAFETY: the plugin returned a NUL-terminated buffer it owns; we
        // copy it before handing it back for release.
        let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        match self.vtable().free_json_string {
            // SAFETY: release protocol of the ABI contract.
            Some(free) => unsafe { free(ptr) },
            // SAFETY: plugins without a custom deallocator allocate with the
            // C allocator.
            None => unsafe { libc::free(ptr.cast()) },
        }
        value
    }

    fn call_string_out(
        &self,
        operation: &str,
        f: unsafe extern "C" fn(*mut *mut c_char, *mut usize) -> c_int,
    ) -> PluginResult<String> {
        let mut out: *mut c_char = ptr::null_mut();
        let mut len: usize = 0;
        // SAFETY: out-pointer protocol of the ABI contract.
        let code = unsafe { f(&mut out, &mut len) };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: operation.to_string(),
                code,
            });
        }
        Ok(self.take_plugin_string(out))
    }
}

impl DevicePlugin for DynamicPlugin {
    fn device_info(&self) -> DeviceInfo {
        let Some(get_device_info) = self.vtable().get_device_info else {
            return self.info_cache.clone().unwrap_or_default();
        };
        let mut raw = RawDeviceInfo::zeroed();
        // SAFETY: the plugin fills the caller-provided block; presence was
        // validated at load time.
        let code = unsafe { get_device_info(&mut raw) };
        if code < 0 {
            warn!("get_device_info failed with code {}", code);
            return self.info_cache.clone().unwrap_or_default();
        }

        let capability_count = raw.capability_count.clamp(0, 16) as usize;
        DeviceInfo {
            id: cbuf_to_string(&raw.id),
            device_type: cbuf_to_string(&raw.device_type),
            model: cbuf_to_string(&raw.model),
            serial_number: cbuf_to_string(&raw.serial_number),
            hw_version: cbuf_to_string(&raw.hw_version),
            fw_version: cbuf_to_string(&raw.fw_version),
            capabilities: raw.capabilities[..capability_count]
                .iter()
                .map(|c| cbuf_to_string(c))
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    fn state_json(&self) -> PluginResult<String> {
        let f = self.vtable().get_state.ok_or_else(|| PluginError::InvalidVtable {
            message: "get_state is not implemented".to_string(),
        })?;
        self.call_string_out("get_state", f)
    }

    fn attributes_json(&self) -> PluginResult<String> {
        match self.vtable().get_attributes {
            Some(f) => self.call_string_out("get_attributes", f),
            None => Ok("{}".to_string()),
        }
    }

    fn telemetry_json(&self, metric: &str) -> PluginResult<String> {
        let f = self
            .vtable()
            .get_telemetry
            .ok_or_else(|| PluginError::InvalidVtable {
                message: "get_telemetry is not implemented".to_string(),
            })?;
        let metric = CString::new(metric)
            .map_err(|_| PluginError::InvalidParam("metric contains NUL".to_string()))?;
        let mut out: *mut c_char = ptr::null_mut();
        let mut len: usize = 0;
        // SAFETY: out-pointer protocol of the ABI contract.
        let code = unsafe { f(metric.as_ptr(), &mut out, &mut len) };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "get_telemetry".to_string(),
                code,
            });
        }
        Ok(self.take_plugin_string(out))
    }

    fn on_event_trigger(&mut self, event_type: &str, data: &str) -> PluginResult<()> {
        let Some(f) = self.vtable().on_event_trigger else {
            return Ok(());
        };
        let event_type = CString::new(event_type)
            .map_err(|_| PluginError::InvalidParam("event type contains NUL".to_string()))?;
        let data = CString::new(data)
            .map_err(|_| PluginError::InvalidParam("event data contains NUL".to_string()))?;
        // SAFETY: both arguments are NUL-terminated for the call's duration.
        let code = unsafe { f(event_type.as_ptr(), data.as_ptr()) };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "on_event_trigger".to_string(),
                code,
            });
        }
        Ok(())
    }

    fn handle_command(&mut self, cmd_json: &str) -> PluginResult<String> {
        let f = self
            .vtable()
            .handle_command
            .ok_or_else(|| PluginError::InvalidVtable {
                message: "handle_command is not implemented".to_string(),
            })?;
        let cmd = CString::new(cmd_json)
            .map_err(|_| PluginError::InvalidParam("command JSON contains NUL".to_string()))?;
        let mut out: *mut c_char = ptr::null_mut();
        let mut len: usize = 0;
        // SAFETY: out-pointer protocol of the ABI contract.
        let code = unsafe { f(cmd.as_ptr(), &mut out, &mut len) };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "handle_command".to_string(),
                code,
            });
        }
        Ok(self.take_plugin_string(out))
    }

    fn initialize(&mut self, config: &PluginConfig) -> PluginResult<()> {
        let f = self
            .vtable()
            .initialize
            .ok_or_else(|| PluginError::InvalidVtable {
                message: "initialize is required".to_string(),
            })?;
        let raw = marshal_config(config)?;
        // SAFETY: the config block lives on our stack for the call's
        // duration; the plugin copies what it keeps.
        let code = unsafe { f(&raw) };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "initialize".to_string(),
                code,
            });
        }
        self.info_cache = Some(self.device_info());
        Ok(())
    }

    fn start(&mut self) -> PluginResult<()> {
        let Some(f) = self.vtable().start else {
            return Ok(());
        };
        // SAFETY: presence checked; no arguments cross the boundary.
        let code = unsafe { f() };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "start".to_string(),
                code,
            });
        }
        Ok(())
    }

    fn stop(&mut self) -> PluginResult<()> {
        let Some(f) = self.vtable().stop else {
            return Ok(());
        };
        // SAFETY: presence checked; no arguments cross the boundary.
        let code = unsafe { f() };
        if code < 0 {
            return Err(PluginError::CallFailed {
                operation: "stop".to_string(),
                code,
            });
        }
        Ok(())
    }

    fn health_check(&self) -> bool {
        match self.vtable().health_check {
            // SAFETY: presence checked; no arguments cross the boundary.
            Some(f) => (unsafe { f() }) > 0,
            None => true,
        }
    }
}

fn marshal_config(config: &PluginConfig) -> PluginResult<RawPluginConfig> {
    // SAFETY: all-zeroes is a valid RawPluginConfig (empty strings, zeros).
    let mut raw: RawPluginConfig = unsafe { std::mem::zeroed() };
    fill_cbuf(&mut raw.broker_host, &config.broker_host, "broker_host")?;
    raw.broker_port = config.broker_port as c_int;
    fill_cbuf(&mut raw.device_id, &config.device_id, "device_id")?;
    fill_cbuf(&mut raw.tenant, &config.tenant, "tenant")?;
    fill_cbuf(&mut raw.site, &config.site, "site")?;
    fill_cbuf(&mut raw.username, &config.username, "username")?;
    fill_cbuf(&mut raw.password, &config.password, "password")?;
    let plugin_config = config.plugin_config.to_string();
    fill_cbuf(&mut raw.plugin_config, &plugin_config, "plugin_config")?;
    raw.telemetry_interval = config.telemetry_interval_secs as c_int;
    raw.event_cooldown = config.event_cooldown_secs as c_int;
    Ok(raw)
}

/// Copy `src` into a fixed NUL-terminated buffer, rejecting values that
/// would not fit rather than truncating them silently.
fn fill_cbuf(dst: &mut [c_char], src: &str, field: &str) -> PluginResult<()> {
    let bytes = src.as_bytes();
    if bytes.contains(&0) {
        return Err(PluginError::InvalidParam(format!("{} contains NUL", field)));
    }
    if bytes.len() >= dst.len() {
        return Err(PluginError::InvalidParam(format!(
            "{} longer than {} bytes",
            field,
            dst.len() - 1
        )));
    }
    for (dst_byte, src_byte) in dst.iter_mut().zip(bytes) {
        *dst_byte = *src_byte as c_char;
    }
    dst[bytes.len()] = 0;
    Ok(())
}

/// Owned copy of a fixed NUL-terminated buffer.
fn cbuf_to_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Owned copy of a plugin-owned constant string (not released).
fn const_cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: registration strings are static, NUL-terminated plugin data.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_cbuf_rejects_overlong_values() {
        let mut buf = [0 as c_char; 8];
        assert!(fill_cbuf(&mut buf, "short", "field").is_ok());
        assert_eq!(cbuf_to_string(&buf), "short");
        assert!(fill_cbuf(&mut buf, "way too long", "field").is_err());
    }

    #[test]
    fn test_validate_vtable_requires_core_entries() {
        // SAFETY: all-None is a valid (if useless) vtable value.
        let vtable: RawPluginVtable = unsafe { std::mem::zeroed() };
        assert!(matches!(
            validate_vtable(&vtable),
            Err(PluginError::InvalidVtable { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_plugin_library(Path::new("/nonexistent/plugin.so")).unwrap_err();
        assert!(matches!(err, PluginError::LoadFailed { .. }));
    }
}
