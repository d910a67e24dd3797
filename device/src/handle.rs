use crate::{invalid_instance, AcquireError, Config, DeviceOf, InstanceOf, ModuleOf, Runtime};
use log::{debug, info, warn};

/// 持有一个计算设备及其硬件抽象模块。
///
/// 两个句柄要么同时存在，要么同时为空。销毁时先释放模块再释放设备。
pub struct DeviceHandle<R: Runtime> {
    runtime: R,
    config: Config,
    device: Option<DeviceOf<R>>,
    hal_module: Option<ModuleOf<R>>,
}

impl<R: Runtime + Default> Default for DeviceHandle<R> {
    #[inline]
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: Runtime> DeviceHandle<R> {
    #[inline]
    pub fn new(runtime: R) -> Self {
        Self::with_config(runtime, Config::default())
    }

    #[inline]
    pub fn with_config(runtime: R, config: Config) -> Self {
        Self {
            runtime,
            config,
            device: None,
            hal_module: None,
        }
    }

    #[inline]
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_acquired(&self) -> bool {
        self.device.is_some() && self.hal_module.is_some()
    }

    #[inline]
    pub fn device(&self) -> Option<&DeviceOf<R>> {
        self.device.as_ref()
    }

    #[inline]
    pub fn hal_module(&self) -> Option<&ModuleOf<R>> {
        self.hal_module.as_ref()
    }

    /// 从运行时实例获取设备和硬件抽象模块。
    ///
    /// 已持有的设备会先被释放。任何失败都使句柄回到空状态。
    pub fn acquire_device(
        &mut self,
        instance: Option<&InstanceOf<R>>,
    ) -> Result<(), AcquireError> {
        if self.device.is_some() || self.hal_module.is_some() {
            debug!("releasing held device before reacquiring");
            self.release_device();
        }

        let Some(instance) = instance else {
            let e = invalid_instance("runtime instance is null");
            warn!("{e}");
            return Err(e);
        };

        let device = self
            .runtime
            .create_device(instance, &self.config)
            .inspect_err(|e| warn!("{e}"))?;

        let hal_module = match self
            .runtime
            .create_hal_module(instance, &device, &self.config)
        {
            Ok(module) => module,
            Err(e) => {
                warn!("{e}, releasing partially acquired device");
                drop(device);
                return Err(e);
            }
        };

        self.device = Some(device);
        self.hal_module = Some(hal_module);
        info!("device acquired with driver \"{}\"", self.config.driver);
        Ok(())
    }

    /// 释放模块和设备，对空句柄无作用。
    pub fn release_device(&mut self) {
        if let Some(module) = self.hal_module.take() {
            drop(module);
            debug!("hal module released");
        }
        if let Some(device) = self.device.take() {
            drop(device);
            debug!("device released");
        }
    }
}

impl<R: Runtime> Drop for DeviceHandle<R> {
    #[inline]
    fn drop(&mut self) {
        self.release_device()
    }
}

#[cfg(test)]
mod test {
    use super::DeviceHandle;
    use crate::{
        common::test_utils::{Event::*, MockInstance, MockRuntime},
        AcquireErrorKind, Config, Status,
    };

    fn handle() -> DeviceHandle<MockRuntime> {
        DeviceHandle::default()
    }

    #[test]
    fn test_new_is_empty() {
        let handle = handle();
        let journal = handle.runtime().journal.clone();
        assert!(!handle.is_acquired());
        assert!(handle.device().is_none());
        assert!(handle.hal_module().is_none());
        drop(handle);
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_acquire_then_drop() {
        let mut handle = handle();
        let journal = handle.runtime().journal.clone();

        handle.acquire_device(Some(&MockInstance::VALID)).unwrap();
        assert!(handle.is_acquired());
        assert_eq!(handle.hal_module().unwrap().device, handle.device().unwrap().id);

        drop(handle);
        assert_eq!(
            journal.events(),
            [CreateDevice(0), CreateModule(0), ReleaseModule(0), ReleaseDevice(0)],
        );
    }

    #[test]
    fn test_release_idempotent() {
        let mut handle = handle();
        let journal = handle.runtime().journal.clone();

        handle.acquire_device(Some(&MockInstance::VALID)).unwrap();
        handle.release_device();
        let once = journal.events();
        handle.release_device();
        assert_eq!(journal.events(), once);
        assert!(!handle.is_acquired());

        drop(handle);
        assert_eq!(journal.events(), once);
    }

    #[test]
    fn test_null_instance() {
        let mut handle = handle();
        let journal = handle.runtime().journal.clone();

        let e = handle.acquire_device(None).unwrap_err();
        assert_eq!(e.kind, AcquireErrorKind::InvalidInstance);
        assert_eq!(Status::from(&e), Status::ErrInvalidParameter);
        assert!(handle.device().is_none() && handle.hal_module().is_none());

        let e = handle.acquire_device(Some(&MockInstance::INVALID)).unwrap_err();
        assert_eq!(e.kind, AcquireErrorKind::InvalidInstance);
        assert!(handle.device().is_none() && handle.hal_module().is_none());

        drop(handle);
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_device_failure() {
        let mut handle = DeviceHandle::with_config(
            MockRuntime::default(),
            Config::default().with_driver("cuda"),
        );
        handle.runtime().fail_device.set(true);

        let e = handle.acquire_device(Some(&MockInstance::VALID)).unwrap_err();
        assert_eq!(e.kind, AcquireErrorKind::DeviceCreationFailed);
        assert_eq!(e.info, "cuda: NOT_FOUND");
        assert!(handle.device().is_none() && handle.hal_module().is_none());
        assert!(handle.runtime().journal.events().is_empty());
    }

    #[test]
    fn test_module_failure_releases_device() {
        let mut handle = handle();
        let journal = handle.runtime().journal.clone();
        handle.runtime().fail_module.set(true);

        let e = handle.acquire_device(Some(&MockInstance::VALID)).unwrap_err();
        assert_eq!(e.kind, AcquireErrorKind::ModuleCreationFailed);
        assert_eq!(Status::from(&e), Status::ErrCantCreate);
        assert!(handle.device().is_none() && handle.hal_module().is_none());
        assert_eq!(journal.events(), [CreateDevice(0), ReleaseDevice(0)]);

        drop(handle);
        assert_eq!(journal.events(), [CreateDevice(0), ReleaseDevice(0)]);
    }

    #[test]
    fn test_reacquire_releases_held_pair() {
        let mut handle = handle();
        let journal = handle.runtime().journal.clone();

        handle.acquire_device(Some(&MockInstance::VALID)).unwrap();
        handle.acquire_device(Some(&MockInstance::VALID)).unwrap();
        assert_eq!(handle.device().unwrap().id, 1);
        assert_eq!(
            journal.events(),
            [
                CreateDevice(0),
                CreateModule(0),
                ReleaseModule(0),
                ReleaseDevice(0),
                CreateDevice(1),
                CreateModule(1),
            ],
        );

        // 失败的重新获取同样不保留旧设备
        journal.clear();
        let _ = handle.acquire_device(None);
        assert!(!handle.is_acquired());
        assert_eq!(journal.events(), [ReleaseModule(1), ReleaseDevice(1)]);
    }

    #[test]
    fn test_random_lifecycle() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let mut handle = handle();
            let journal = handle.runtime().journal.clone();

            for _ in 0..rng.gen_range(1..32) {
                match rng.gen_range(0..4) {
                    0 => handle.release_device(),
                    1 => {
                        let _ = handle.acquire_device(None);
                    }
                    _ => {
                        handle.runtime().fail_device.set(rng.gen_bool(0.2));
                        handle.runtime().fail_module.set(rng.gen_bool(0.3));
                        let ok = handle.acquire_device(Some(&MockInstance::VALID)).is_ok();
                        assert_eq!(ok, handle.is_acquired());
                    }
                }
                assert_eq!(handle.device().is_some(), handle.hal_module().is_some());
            }
            drop(handle);

            let events = journal.events();
            assert_eq!(
                journal.count(|e| matches!(e, CreateDevice(_))),
                journal.count(|e| matches!(e, ReleaseDevice(_))),
            );
            assert_eq!(
                journal.count(|e| matches!(e, CreateModule(_))),
                journal.count(|e| matches!(e, ReleaseModule(_))),
            );
            for (i, e) in events.iter().enumerate() {
                if let ReleaseModule(id) = e {
                    assert_eq!(events.get(i + 1), Some(&ReleaseDevice(*id)));
                }
            }
        }
    }
}
