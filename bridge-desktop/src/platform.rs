//! Desktop platform identification.

use bridge_traits::platform::PlatformInfo;

/// Reports the compile-time OS family and, on Linux, the running kernel
/// release.
#[derive(Debug, Clone, Default)]
pub struct DesktopPlatformInfo;

impl DesktopPlatformInfo {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformInfo for DesktopPlatformInfo {
    fn platform_name(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn platform_release(&self) -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/sys/kernel/osrelease")
                .map(|release| release.trim().to_string())
                .unwrap_or_default()
        }

        #[cfg(not(target_os = "linux"))]
        {
            String::new()
        }
    }
}
