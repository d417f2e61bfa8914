//! Platform identification.

/// Describes the host platform.
///
/// Backs the `getPlatformVersion` command, e.g. `"Android 14"` or
/// `"linux 6.8.0"`.
pub trait PlatformInfo: Send + Sync {
    /// Platform family name (`"Android"`, `"linux"`, ...).
    fn platform_name(&self) -> String;

    /// Platform release string.
    fn platform_release(&self) -> String;

    /// Name and release joined for display.
    fn platform_version(&self) -> String {
        let release = self.platform_release();
        if release.is_empty() {
            self.platform_name()
        } else {
            format!("{} {}", self.platform_name(), release)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPlatform(&'static str, &'static str);

    impl PlatformInfo for FixedPlatform {
        fn platform_name(&self) -> String {
            self.0.to_string()
        }

        fn platform_release(&self) -> String {
            self.1.to_string()
        }
    }

    #[test]
    fn test_platform_version_joins_name_and_release() {
        assert_eq!(FixedPlatform("Android", "14").platform_version(), "Android 14");
    }

    #[test]
    fn test_platform_version_without_release() {
        assert_eq!(FixedPlatform("wasm", "").platform_version(), "wasm");
    }
}
