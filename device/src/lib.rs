mod common;
mod handle;

#[cfg(use_iree)]
pub mod iree;

pub use common::*;
pub use handle::DeviceHandle;

#[cfg(use_iree)]
pub extern crate libloading;

/// 硬件加速运行时抽象。
///
/// 约定如何从运行时实例创建计算设备和设备对应的硬件抽象模块。
/// 设备和模块类型表示对外部资源的所有权，释放即 [drop]。
pub trait Runtime {
    /// 运行时实例，由外部持有，生命周期覆盖获取过程。
    type Instance: ?Sized;
    /// 计算设备句柄。
    type Device;
    /// 绑定到设备的硬件抽象模块句柄。
    type Module;

    /// 使用运行时实例创建计算设备。
    fn create_device(
        &self,
        instance: &Self::Instance,
        config: &Config,
    ) -> Result<Self::Device, AcquireError>;

    /// 为已创建的设备创建硬件抽象模块。
    ///
    /// 失败时设备的所有权仍由调用者持有。
    fn create_hal_module(
        &self,
        instance: &Self::Instance,
        device: &Self::Device,
        config: &Config,
    ) -> Result<Self::Module, AcquireError>;
}

pub type InstanceOf<R> = <R as Runtime>::Instance;
pub type DeviceOf<R> = <R as Runtime>::Device;
pub type ModuleOf<R> = <R as Runtime>::Module;
