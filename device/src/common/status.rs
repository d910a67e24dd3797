use super::{AcquireError, AcquireErrorKind};
use std::fmt;

/// 宿主插件框架的错误码。
///
/// 数值与引擎全局 `Error` 常量一致，可直接跨插件边界返回。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Failed = 1,
    ErrUnavailable = 2,
    ErrCantCreate = 20,
    ErrCantAcquireResource = 28,
    ErrInvalidParameter = 31,
}

impl Status {
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::ErrUnavailable => "ERR_UNAVAILABLE",
            Self::ErrCantCreate => "ERR_CANT_CREATE",
            Self::ErrCantAcquireResource => "ERR_CANT_ACQUIRE_RESOURCE",
            Self::ErrInvalidParameter => "ERR_INVALID_PARAMETER",
        };
        f.write_str(name)
    }
}

impl From<AcquireErrorKind> for Status {
    #[inline]
    fn from(kind: AcquireErrorKind) -> Self {
        match kind {
            AcquireErrorKind::InvalidInstance => Self::ErrInvalidParameter,
            AcquireErrorKind::RuntimeUnavailable => Self::ErrUnavailable,
            AcquireErrorKind::DeviceCreationFailed => Self::ErrCantAcquireResource,
            AcquireErrorKind::ModuleCreationFailed => Self::ErrCantCreate,
        }
    }
}

impl From<&AcquireError> for Status {
    #[inline]
    fn from(e: &AcquireError) -> Self {
        e.kind.into()
    }
}

impl<T> From<Result<T, AcquireError>> for Status {
    #[inline]
    fn from(result: Result<T, AcquireError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => (&e).into(),
        }
    }
}
