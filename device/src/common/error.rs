use std::{error::Error, fmt};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AcquireErrorKind {
    InvalidInstance,
    RuntimeUnavailable,
    DeviceCreationFailed,
    ModuleCreationFailed,
}

#[derive(Clone, Debug)]
pub struct AcquireError {
    pub kind: AcquireErrorKind,
    pub info: String,
}

impl Error for AcquireError {}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.kind {
            AcquireErrorKind::InvalidInstance => "invalid runtime instance",
            AcquireErrorKind::RuntimeUnavailable => "runtime unavailable",
            AcquireErrorKind::DeviceCreationFailed => "device creation failed",
            AcquireErrorKind::ModuleCreationFailed => "hal module creation failed",
        };
        if self.info.is_empty() {
            f.write_str(what)
        } else {
            write!(f, "{what}: {}", self.info)
        }
    }
}

pub(super) mod functions {
    use super::{AcquireError, AcquireErrorKind::*};

    macro_rules! builder {
        ($ty:ident: $name:ident $kind:expr) => {
            #[inline]
            pub fn $name(info: impl Into<String>) -> $ty {
                $ty {
                    kind: $kind,
                    info: info.into(),
                }
            }
        };
    }

    builder!(AcquireError: invalid_instance         InvalidInstance     );
    builder!(AcquireError: runtime_unavailable      RuntimeUnavailable  );
    builder!(AcquireError: device_creation_failed   DeviceCreationFailed);
    builder!(AcquireError: module_creation_failed   ModuleCreationFailed);
}

#[test]
fn test_display() {
    use functions::*;

    assert_eq!(invalid_instance("").to_string(), "invalid runtime instance");
    assert_eq!(
        device_creation_failed("vulkan: NOT_FOUND").to_string(),
        "device creation failed: vulkan: NOT_FOUND",
    );
}
