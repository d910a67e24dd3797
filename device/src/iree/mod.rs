mod ffi;

use crate::{
    device_creation_failed, module_creation_failed, runtime_unavailable, AcquireError, Config,
    DeviceHandle, Runtime, Status,
};
use ffi::{
    iree_allocator_t, iree_string_view_t, AllocatorFree, AvailableDriverRegistry,
    HalCreateDevice, HalDeviceRelease, HalModuleCreate, HalModuleRegisterAllTypes, StatusIgnore,
    StatusToString, VmModuleRelease, IREE_HAL_MODULE_FLAG_NONE,
    IREE_HAL_MODULE_FLAG_SYNCHRONOUS,
};
use libloading::{library_filename, Library};
use log::info;
use std::{
    env::var_os,
    ffi::OsStr,
    ptr::{null_mut, NonNull},
    slice::from_raw_parts,
    sync::Arc,
};

pub use ffi::{
    iree_allocator_ctl_fn_t, iree_hal_device_t, iree_status_t, iree_vm_instance_t,
    iree_vm_module_t, StatusCode,
};

pub const RUNTIME_LIB_ENV: &str = "IREE_RUNTIME_LIB";

pub type IreeDevice = DeviceHandle<Iree>;

/// 动态加载的 IREE 运行时。
#[derive(Clone)]
pub struct Iree(Arc<Api>);

struct Api {
    available_driver_registry: AvailableDriverRegistry,
    hal_create_device: HalCreateDevice,
    hal_module_create: HalModuleCreate,
    hal_module_register_all_types: Option<HalModuleRegisterAllTypes>,
    hal_device_release: HalDeviceRelease,
    vm_module_release: VmModuleRelease,
    allocator_system_ctl: iree_allocator_ctl_fn_t,
    allocator_free: Option<AllocatorFree>,
    status_ignore: StatusIgnore,
    status_to_string: Option<StatusToString>,
    _lib: Library,
}

impl Iree {
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, AcquireError> {
        let path = path.as_ref();
        let lib = unsafe { Library::new(path) }
            .map_err(|e| runtime_unavailable(format!("{}: {e}", path.to_string_lossy())))?;

        fn required<T: Copy>(lib: &Library, name: &str) -> Result<T, AcquireError> {
            unsafe { lib.get::<T>(name.as_bytes()) }
                .map(|sym| *sym)
                .map_err(|e| runtime_unavailable(format!("{name}: {e}")))
        }
        fn optional<T: Copy>(lib: &Library, name: &str) -> Option<T> {
            unsafe { lib.get::<T>(name.as_bytes()) }.ok().map(|sym| *sym)
        }

        let api = Api {
            available_driver_registry: required(&lib, "iree_hal_available_driver_registry")?,
            hal_create_device: required(&lib, "iree_hal_create_device")?,
            hal_module_create: required(&lib, "iree_hal_module_create")?,
            hal_module_register_all_types: optional(&lib, "iree_hal_module_register_all_types"),
            hal_device_release: required(&lib, "iree_hal_device_release")?,
            vm_module_release: required(&lib, "iree_vm_module_release")?,
            allocator_system_ctl: required(&lib, "iree_allocator_system_ctl")?,
            allocator_free: optional(&lib, "iree_allocator_free"),
            status_ignore: required(&lib, "iree_status_ignore")?,
            status_to_string: optional(&lib, "iree_status_to_string"),
            _lib: lib,
        };
        info!("iree runtime loaded from {}", path.to_string_lossy());
        Ok(Self(Arc::new(api)))
    }

    /// 从 `IREE_RUNTIME_LIB` 指定的路径加载，未设置时按平台库名搜索。
    pub fn load_default() -> Result<Self, AcquireError> {
        match var_os(RUNTIME_LIB_ENV) {
            Some(path) => Self::load(path),
            None => Self::load(library_filename("iree_runtime")),
        }
    }
}

impl Api {
    #[inline]
    fn allocator(&self) -> iree_allocator_t {
        iree_allocator_t {
            self_: null_mut(),
            ctl: Some(self.allocator_system_ctl),
        }
    }

    /// 检查并消耗状态对象，失败时返回可读的错误信息。
    fn check(&self, status: iree_status_t) -> Result<(), String> {
        if status.is_null() {
            return Ok(());
        }
        let mut msg = StatusCode::of(status).to_string();
        if let (Some(to_string), Some(free)) = (self.status_to_string, self.allocator_free) {
            let allocator = self.allocator();
            let mut buf = null_mut();
            let mut len = 0;
            if unsafe { to_string(status, &allocator, &mut buf, &mut len) } && !buf.is_null() {
                let bytes = unsafe { from_raw_parts(buf.cast::<u8>(), len) };
                msg = String::from_utf8_lossy(bytes).into_owned();
                unsafe { free(allocator, buf.cast()) };
            }
        }
        unsafe { (self.status_ignore)(status) };
        Err(msg)
    }
}

/// 持有一个 HAL 设备引用。
pub struct HalDevice {
    raw: NonNull<iree_hal_device_t>,
    api: Arc<Api>,
}

impl HalDevice {
    #[inline]
    pub unsafe fn as_raw(&self) -> *mut iree_hal_device_t {
        self.raw.as_ptr()
    }
}

impl Drop for HalDevice {
    #[inline]
    fn drop(&mut self) {
        unsafe { (self.api.hal_device_release)(self.raw.as_ptr()) }
    }
}

/// 持有一个 HAL 虚拟机模块引用。
pub struct VmModule {
    raw: NonNull<iree_vm_module_t>,
    api: Arc<Api>,
}

impl VmModule {
    #[inline]
    pub unsafe fn as_raw(&self) -> *mut iree_vm_module_t {
        self.raw.as_ptr()
    }
}

impl Drop for VmModule {
    #[inline]
    fn drop(&mut self) {
        unsafe { (self.api.vm_module_release)(self.raw.as_ptr()) }
    }
}

impl Runtime for Iree {
    type Instance = iree_vm_instance_t;
    type Device = HalDevice;
    type Module = VmModule;

    fn create_device(
        &self,
        _instance: &iree_vm_instance_t,
        config: &Config,
    ) -> Result<HalDevice, AcquireError> {
        let api = &self.0;
        let uri = &config.driver;

        let registry = unsafe { (api.available_driver_registry)() };
        if registry.is_null() {
            return Err(device_creation_failed(format!("{uri}: no driver registry")));
        }

        let mut raw = null_mut();
        api.check(unsafe {
            (api.hal_create_device)(
                registry,
                iree_string_view_t::new(uri),
                api.allocator(),
                &mut raw,
            )
        })
        .map_err(|msg| device_creation_failed(format!("{uri}: {msg}")))?;

        NonNull::new(raw)
            .map(|raw| HalDevice {
                raw,
                api: api.clone(),
            })
            .ok_or_else(|| device_creation_failed(format!("{uri}: null device")))
    }

    fn create_hal_module(
        &self,
        instance: &iree_vm_instance_t,
        device: &HalDevice,
        config: &Config,
    ) -> Result<VmModule, AcquireError> {
        let api = &self.0;
        let instance = instance as *const _ as *mut iree_vm_instance_t;

        if let Some(register) = api.hal_module_register_all_types {
            api.check(unsafe { register(instance) })
                .map_err(|msg| module_creation_failed(format!("type registration: {msg}")))?;
        }

        let flags = if config.synchronous {
            IREE_HAL_MODULE_FLAG_SYNCHRONOUS
        } else {
            IREE_HAL_MODULE_FLAG_NONE
        };
        let mut devices = [device.raw.as_ptr()];
        let mut raw = null_mut();
        api.check(unsafe {
            (api.hal_module_create)(
                instance,
                devices.len(),
                devices.as_mut_ptr(),
                flags,
                api.allocator(),
                &mut raw,
            )
        })
        .map_err(|msg| module_creation_failed(msg))?;

        NonNull::new(raw)
            .map(|raw| VmModule {
                raw,
                api: api.clone(),
            })
            .ok_or_else(|| module_creation_failed("null module"))
    }
}

impl DeviceHandle<Iree> {
    /// 插件入口：以宿主错误码报告获取结果。
    ///
    /// # Safety
    ///
    /// `instance` 为空或指向存活的运行时实例。
    pub unsafe fn catch_device(&mut self, instance: *mut iree_vm_instance_t) -> Status {
        self.acquire_device(instance.as_ref()).into()
    }
}
