#![allow(non_camel_case_types)]

use std::{
    ffi::{c_char, c_void},
    fmt,
};

macro_rules! opaque {
    ($($name:ident)*) => {
        $(
            #[repr(C)]
            pub struct $name {
                _private: [u8; 0],
            }
        )*
    };
}

opaque! {
    iree_vm_instance_t
    iree_vm_module_t
    iree_hal_device_t
    iree_hal_driver_registry_t
    iree_status_handle_t
}

pub type iree_status_t = *mut iree_status_handle_t;
pub type iree_host_size_t = usize;
pub type iree_hal_module_flags_t = u32;

pub const IREE_HAL_MODULE_FLAG_NONE: iree_hal_module_flags_t = 0;
pub const IREE_HAL_MODULE_FLAG_SYNCHRONOUS: iree_hal_module_flags_t = 1 << 0;
const IREE_STATUS_CODE_MASK: usize = 0x1F;

pub type iree_allocator_ctl_fn_t = unsafe extern "C" fn(
    self_: *mut c_void,
    command: u32,
    params: *const c_void,
    inout_ptr: *mut *mut c_void,
) -> iree_status_t;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct iree_allocator_t {
    pub self_: *mut c_void,
    pub ctl: Option<iree_allocator_ctl_fn_t>,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct iree_string_view_t {
    pub data: *const c_char,
    pub size: iree_host_size_t,
}

impl iree_string_view_t {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self {
            data: s.as_ptr().cast(),
            size: s.len(),
        }
    }
}

pub(super) type AvailableDriverRegistry = unsafe extern "C" fn() -> *mut iree_hal_driver_registry_t;
pub(super) type HalCreateDevice = unsafe extern "C" fn(
    driver_registry: *mut iree_hal_driver_registry_t,
    device_uri: iree_string_view_t,
    host_allocator: iree_allocator_t,
    out_device: *mut *mut iree_hal_device_t,
) -> iree_status_t;
pub(super) type HalModuleCreate = unsafe extern "C" fn(
    instance: *mut iree_vm_instance_t,
    device_count: iree_host_size_t,
    devices: *mut *mut iree_hal_device_t,
    flags: iree_hal_module_flags_t,
    host_allocator: iree_allocator_t,
    out_module: *mut *mut iree_vm_module_t,
) -> iree_status_t;
pub(super) type HalModuleRegisterAllTypes =
    unsafe extern "C" fn(instance: *mut iree_vm_instance_t) -> iree_status_t;
pub(super) type HalDeviceRelease = unsafe extern "C" fn(device: *mut iree_hal_device_t);
pub(super) type VmModuleRelease = unsafe extern "C" fn(module: *mut iree_vm_module_t);
pub(super) type StatusIgnore = unsafe extern "C" fn(status: iree_status_t) -> iree_status_t;
pub(super) type StatusToString = unsafe extern "C" fn(
    status: iree_status_t,
    allocator: *const iree_allocator_t,
    out_buffer: *mut *mut c_char,
    out_buffer_length: *mut iree_host_size_t,
) -> bool;
pub(super) type AllocatorFree = unsafe extern "C" fn(allocator: iree_allocator_t, ptr: *mut c_void);

/// 运行时状态码，编码在状态指针的低位。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
    Deferred = 17,
    Incompatible = 18,
}

impl StatusCode {
    pub fn of(status: iree_status_t) -> Self {
        use StatusCode::*;
        match status as usize & IREE_STATUS_CODE_MASK {
            0 => Ok,
            1 => Cancelled,
            3 => InvalidArgument,
            4 => DeadlineExceeded,
            5 => NotFound,
            6 => AlreadyExists,
            7 => PermissionDenied,
            8 => ResourceExhausted,
            9 => FailedPrecondition,
            10 => Aborted,
            11 => OutOfRange,
            12 => Unimplemented,
            13 => Internal,
            14 => Unavailable,
            15 => DataLoss,
            16 => Unauthenticated,
            17 => Deferred,
            18 => Incompatible,
            _ => Unknown,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use StatusCode::*;
        let name = match self {
            Ok => "OK",
            Cancelled => "CANCELLED",
            Unknown => "UNKNOWN",
            InvalidArgument => "INVALID_ARGUMENT",
            DeadlineExceeded => "DEADLINE_EXCEEDED",
            NotFound => "NOT_FOUND",
            AlreadyExists => "ALREADY_EXISTS",
            PermissionDenied => "PERMISSION_DENIED",
            ResourceExhausted => "RESOURCE_EXHAUSTED",
            FailedPrecondition => "FAILED_PRECONDITION",
            Aborted => "ABORTED",
            OutOfRange => "OUT_OF_RANGE",
            Unimplemented => "UNIMPLEMENTED",
            Internal => "INTERNAL",
            Unavailable => "UNAVAILABLE",
            DataLoss => "DATA_LOSS",
            Unauthenticated => "UNAUTHENTICATED",
            Deferred => "DEFERRED",
            Incompatible => "INCOMPATIBLE",
        };
        f.write_str(name)
    }
}

#[test]
fn test_status_code() {
    use std::ptr::null_mut;

    assert_eq!(StatusCode::of(null_mut()), StatusCode::Ok);
    assert_eq!(StatusCode::of(5usize as iree_status_t), StatusCode::NotFound);
    // 带负载的状态：地址按 32 字节对齐，低位仍是状态码
    assert_eq!(
        StatusCode::of((0x7f00_0000usize | 14) as iree_status_t),
        StatusCode::Unavailable,
    );
    assert_eq!(StatusCode::of(31usize as iree_status_t), StatusCode::Unknown);
    assert_eq!(StatusCode::ResourceExhausted.to_string(), "RESOURCE_EXHAUSTED");
}
