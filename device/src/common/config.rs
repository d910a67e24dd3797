use std::env::var;

pub const DEVICE_URI_ENV: &str = "IREE_DEVICE_URI";

/// 设备获取参数。
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    /// 创建设备使用的驱动名或设备 URI，如 `vulkan`、`local-task`。
    pub driver: String,
    /// 硬件抽象模块是否以同步模式执行。
    pub synchronous: bool,
}

impl Default for Config {
    fn default() -> Self {
        let driver = if cfg!(target_vendor = "apple") {
            "metal"
        } else {
            "vulkan"
        };
        Self {
            driver: driver.into(),
            synchronous: true,
        }
    }
}

impl Config {
    /// 默认参数，驱动可由环境变量覆盖。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(driver) = var(DEVICE_URI_ENV) {
            let driver = driver.trim();
            if !driver.is_empty() {
                config.driver = driver.into();
            }
        }
        config
    }

    #[inline]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }
}

#[test]
fn test_default() {
    let config = Config::default();
    assert!(config.synchronous);
    assert!(matches!(&*config.driver, "vulkan" | "metal"));
    assert_eq!(config.with_driver("local-task").driver, "local-task");
}
