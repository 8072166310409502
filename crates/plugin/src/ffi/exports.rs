//! C-compatible exports called by the native engine

use std::ffi::c_char;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::instrument;
use tracing_subscriber::EnvFilter;

use objbridge_core::{
    Context, CoreConfig, EngineRegistry, EventArgs, NativePtr, ObjectHandle, TypeHash,
    ENGINE_INITIALIZED,
};
use objbridge_engine::{init_engine, load_api, shutdown_engine};
use objbridge_sdk::{NativeObject, RawNativeApi, RawObjectHandle, INVALID_OBJECT_HANDLE};

// Plugin metadata - static strings with null terminators for C compatibility
static NAME: &[u8] = b"objbridge\0";
static DESCRIPTION: &[u8] = b"Cross-boundary object factory bridge\0";
static LICENSE: &[u8] = b"MIT\0";
static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
static LOG_TAG: &[u8] = b"OBJBRIDGE\0";

/// Strong reference keeping the installed context alive between calls
static CONTEXT: Mutex<Option<Arc<Context>>> = Mutex::new(None);

fn loaded_context() -> Option<Arc<Context>> {
    CONTEXT.lock().clone()
}

fn init_logging(config: &CoreConfig) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Called when the engine loads the bridge
///
/// # Safety
/// - `api` must be null or point to a valid `RawNativeApi` that outlives the bridge
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn objbridge_load(
    api: *const RawNativeApi,
    error: *mut c_char,
    maxlen: usize,
) -> bool {
    let config_result = CoreConfig::load();
    let config = config_result.as_ref().cloned().unwrap_or_default();
    init_logging(&config);

    tracing::info!("objbridge loading...");
    if let Err(e) = &config_result {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    let mut slot = CONTEXT.lock();
    if slot.is_some() {
        write_error(error, maxlen, "Bridge already loaded");
        return false;
    }

    if Context::instance().is_some() {
        write_error(error, maxlen, "Another Context is installed");
        return false;
    }

    let globals = match load_api(api) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("Failed to load native API: {}", e);
            write_error(error, maxlen, &format!("Native API error: {}", e));
            return false;
        }
    };

    // Unload clears the previous table, so a leftover one means the last
    // engine never unloaded the bridge
    if let Err(e) = init_engine(globals) {
        tracing::error!("Failed to install native API: {}", e);
        write_error(error, maxlen, &format!("Native API error: {}", e));
        return false;
    }

    *slot = Some(Context::new(config, Box::new(EngineRegistry)));

    tracing::info!("objbridge loaded successfully!");
    tracing::info!("Main thread ID: {:?}", std::thread::current().id());

    true
}

/// Called when the engine unloads the bridge
///
/// Drops the context, disposing every object the native side did not release,
/// then forgets the engine's function table.
///
/// # Safety
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn objbridge_unload(error: *mut c_char, maxlen: usize) -> bool {
    tracing::info!("objbridge unloading...");

    let context = CONTEXT.lock().take();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || drop(context)));
    shutdown_engine();

    match result {
        Ok(()) => true,
        Err(_) => {
            write_error(error, maxlen, "Panic during shutdown");
            false
        }
    }
}

/// Called once the engine's subsystems are up; runs the startup scan
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn objbridge_on_engine_initialized() {
    match loaded_context() {
        Some(context) => {
            context.send_event(ENGINE_INITIALIZED, &EventArgs::new());
        }
        None => tracing::warn!("Engine initialized before the bridge was loaded"),
    }
}

/// Instantiate the type registered under `type_hash`
///
/// On success the new handle is written to `out_handle`; it is `0` when no
/// factory is registered under `type_hash`. Returns `false` if the bridge is
/// not loaded or the constructor failed, with the error written to `error`.
/// A non-null `native` is paired with the new object.
///
/// # Safety
/// - `out_handle` must be a valid pointer or null
/// - `error` must be a valid pointer to a buffer of at least `maxlen` bytes, or null
#[no_mangle]
#[instrument(skip(native, out_handle, error, maxlen))]
pub unsafe extern "C" fn objbridge_create_object(
    type_hash: u32,
    native: *mut NativeObject,
    out_handle: *mut RawObjectHandle,
    error: *mut c_char,
    maxlen: usize,
) -> bool {
    if !out_handle.is_null() {
        *out_handle = INVALID_OBJECT_HANDLE;
    }

    let Some(context) = loaded_context() else {
        tracing::error!("Bridge not loaded");
        write_error(error, maxlen, "Bridge not loaded");
        return false;
    };

    let handle = match context.create_object(TypeHash(type_hash)) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Failed to create object {}: {}", TypeHash(type_hash), e);
            write_error(error, maxlen, &error_chain(&e));
            return false;
        }
    };

    if let Some(native) = NativePtr::new(native).filter(|_| handle.is_valid()) {
        if let Err(e) = context.bind_native(handle, native) {
            tracing::error!("Failed to bind native object: {}", e);
        }
    }

    if !out_handle.is_null() {
        *out_handle = handle.to_raw();
    }
    true
}

/// Release an object created by `objbridge_create_object`
///
/// Returns `false` if the handle is empty or already released.
#[no_mangle]
#[instrument]
pub extern "C" fn objbridge_release_object(handle: RawObjectHandle) -> bool {
    loaded_context()
        .map(|context| context.release_object(ObjectHandle::from_raw(handle)))
        .unwrap_or(false)
}

/// Whether a factory is registered under `type_hash`
#[no_mangle]
pub extern "C" fn objbridge_is_reflected(type_hash: u32) -> bool {
    loaded_context()
        .map(|context| context.is_reflected_hash(TypeHash(type_hash)))
        .unwrap_or(false)
}

/// Called by the engine on the main thread every frame
///
/// Returns the number of main thread tasks run.
#[no_mangle]
pub extern "C" fn objbridge_update() -> usize {
    loaded_context()
        .map(|context| context.process_main_thread_tasks())
        .unwrap_or(0)
}

// Metadata exports - these return static strings for the engine to display

#[no_mangle]
pub extern "C" fn objbridge_get_name() -> *const c_char {
    NAME.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn objbridge_get_description() -> *const c_char {
    DESCRIPTION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn objbridge_get_license() -> *const c_char {
    LICENSE.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn objbridge_get_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn objbridge_get_log_tag() -> *const c_char {
    LOG_TAG.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn objbridge_get_api_version() -> u32 {
    objbridge_sdk::API_VERSION
}

/// Helper to write an error message to a C buffer
///
/// # Safety
/// - `error` must be a valid pointer or null
/// - `maxlen` must accurately reflect the buffer size
unsafe fn write_error(error: *mut c_char, maxlen: usize, msg: &str) {
    if !error.is_null() && maxlen > 0 {
        let bytes = msg.as_bytes();
        let len = bytes.len().min(maxlen - 1);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), error as *mut u8, len);
        *error.add(len) = 0;
    }
}

/// Error message followed by each of its sources
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    use objbridge_core::{
        ConstructionError, Creatable, ModuleDescriptor, ObjectFactory, StaticType,
    };
    use objbridge_sdk::{NativeContext, API_VERSION};

    /// (native context, type name, base type hash, category)
    static REGISTERED: Mutex<Vec<(usize, String, u32, String)>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_register(
        context: *mut NativeContext,
        type_name: *const c_char,
        base_type_hash: u32,
        category: *const c_char,
    ) {
        REGISTERED.lock().push((
            context as usize,
            CStr::from_ptr(type_name).to_string_lossy().into_owned(),
            base_type_hash,
            CStr::from_ptr(category).to_string_lossy().into_owned(),
        ));
    }

    unsafe extern "C" fn record_remove(_context: *mut NativeContext, type_name: *const c_char) {
        let name = CStr::from_ptr(type_name).to_string_lossy().into_owned();
        REGISTERED.lock().retain(|(_, registered, _, _)| *registered != name);
    }

    #[derive(ObjectFactory)]
    #[object(category = "Gameplay")]
    pub struct Spinner {
        turns: u32,
    }

    impl Creatable for Spinner {
        fn create(_context: &Arc<Context>) -> Result<Self, ConstructionError> {
            Ok(Spinner { turns: 3 })
        }
    }

    /// Native base without attributes, so registration never constructs
    #[derive(ObjectFactory)]
    #[object(base = "objbridge_core::BaseObject", boundary, no_factory)]
    pub struct Device;

    #[derive(ObjectFactory)]
    #[object(base = "Device", category = "Devices")]
    pub struct Printer;

    impl Creatable for Printer {
        fn create(_context: &Arc<Context>) -> Result<Self, ConstructionError> {
            Err(ConstructionError::new("no paper"))
        }
    }

    static GAMEPLAY: ModuleDescriptor =
        ModuleDescriptor::new("gameplay", &[Spinner::FACTORY, Printer::FACTORY]);

    fn api(context: &mut u8) -> RawNativeApi {
        RawNativeApi {
            version: API_VERSION,
            context: (context as *mut u8).cast::<NativeContext>(),
            register_factory: Some(record_register),
            remove_factory: Some(record_remove),
        }
    }

    /// Calls `objbridge_create_object`, returning the handle or the error text
    fn create(hash: u32, native: *mut NativeObject) -> Result<RawObjectHandle, String> {
        let mut handle = RawObjectHandle::MAX;
        let mut error = [0 as c_char; 128];
        let ok = unsafe {
            objbridge_create_object(hash, native, &mut handle, error.as_mut_ptr(), error.len())
        };
        if ok {
            Ok(handle)
        } else {
            assert_eq!(handle, INVALID_OBJECT_HANDLE);
            let message = unsafe { CStr::from_ptr(error.as_ptr()) };
            Err(message.to_string_lossy().into_owned())
        }
    }

    #[test]
    fn test_write_error_truncates() {
        let mut buffer = [0x7f as c_char; 8];
        unsafe { write_error(buffer.as_mut_ptr(), buffer.len(), "far too long") };
        let written = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        assert_eq!(written.to_str().unwrap(), "far too");

        // Null buffers are ignored
        unsafe { write_error(std::ptr::null_mut(), 8, "ignored") };
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let error = objbridge_core::BridgeError::Construction {
            type_name: "Printer".to_string(),
            source: ConstructionError::new("no paper"),
        };
        assert_eq!(error_chain(&error), "Failed to construct Printer: no paper");
    }

    #[test]
    fn test_metadata() {
        let name = unsafe { CStr::from_ptr(objbridge_get_name()) };
        assert_eq!(name.to_str().unwrap(), "objbridge");
        let version = unsafe { CStr::from_ptr(objbridge_get_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
        assert_eq!(objbridge_get_api_version(), API_VERSION);
    }

    // Loads and unloads the process-wide bridge, so every step runs in this one test
    #[test]
    fn test_bridge_lifecycle() {
        let config_dir = std::env::temp_dir().join(format!("objbridge-ffi-{}", std::process::id()));
        std::env::set_var(objbridge_core::config::CONFIG_DIR_ENV, &config_dir);

        let mut error = [0 as c_char; 128];

        // A null table is rejected with a message
        assert!(!unsafe { objbridge_load(std::ptr::null(), error.as_mut_ptr(), error.len()) });
        let message = unsafe { CStr::from_ptr(error.as_ptr()) };
        assert!(message.to_str().unwrap().starts_with("Native API error"));
        assert_eq!(create(1, std::ptr::null_mut()).unwrap_err(), "Bridge not loaded");

        let mut first_engine = 0u8;
        let first_api = api(&mut first_engine);
        assert!(unsafe { objbridge_load(&first_api, error.as_mut_ptr(), error.len()) });
        assert!(crate::load_module(&GAMEPLAY));

        let hash = Spinner::type_hash().value();
        assert!(!objbridge_is_reflected(hash));
        assert_eq!(create(hash, std::ptr::null_mut()), Ok(INVALID_OBJECT_HANDLE));

        objbridge_on_engine_initialized();
        assert!(objbridge_is_reflected(hash));
        assert_eq!(
            REGISTERED.lock()[0],
            (
                first_api.context as usize,
                "Spinner".to_string(),
                TypeHash::from_name("SwigDirector_Component").value(),
                "Gameplay".to_string()
            )
        );

        let mut native_object = 0u8;
        let raw = create(hash, (&mut native_object as *mut u8).cast()).unwrap();
        assert_ne!(raw, INVALID_OBJECT_HANDLE);

        let context = crate::context().unwrap();
        let handle = ObjectHandle::from_raw(raw);
        assert_eq!(
            context.with_object(handle.typed::<Spinner>(), |s| s.turns),
            Ok(3)
        );
        assert!(context.native_object(handle).unwrap().is_some());
        drop(context);

        // A failing constructor is reported, an unknown type is not an error
        assert_eq!(
            create(Printer::type_hash().value(), std::ptr::null_mut()),
            Err("Failed to construct Printer: no paper".to_string())
        );
        assert_eq!(create(0xdead_beef, std::ptr::null_mut()), Ok(INVALID_OBJECT_HANDLE));

        assert!(objbridge_release_object(raw));
        assert!(!objbridge_release_object(raw));
        assert_eq!(objbridge_update(), 0);

        assert!(unsafe { objbridge_unload(error.as_mut_ptr(), error.len()) });
        assert!(crate::context().is_none());
        assert!(objbridge_engine::try_engine().is_none());
        assert!(!objbridge_is_reflected(hash));

        // A second engine instance gets its own registrations
        REGISTERED.lock().clear();
        let mut second_engine = 0u8;
        let second_api = api(&mut second_engine);
        assert!(unsafe { objbridge_load(&second_api, error.as_mut_ptr(), error.len()) });
        assert!(crate::load_module(&GAMEPLAY));
        objbridge_on_engine_initialized();

        let contexts: Vec<usize> = REGISTERED.lock().iter().map(|entry| entry.0).collect();
        assert_eq!(contexts, [second_api.context as usize; 2]);

        // Loading twice without unloading is refused
        assert!(!unsafe { objbridge_load(&first_api, error.as_mut_ptr(), error.len()) });
        let message = unsafe { CStr::from_ptr(error.as_ptr()) };
        assert_eq!(message.to_str().unwrap(), "Bridge already loaded");

        assert!(unsafe { objbridge_unload(error.as_mut_ptr(), error.len()) });
        let _ = std::fs::remove_dir_all(&config_dir);
    }
}
