//! Release asset selection for wakatime-cli downloads.

use std::fmt;

/// Pinned wakatime-cli release tag.
pub const DEFAULT_CLI_VERSION: &str = "v1.115.1";

/// Base URL of the release download tree (`<base>/<version>/<asset>`).
pub const DEFAULT_RELEASE_BASE_URL: &str =
    "https://github.com/wakatime/wakatime-cli/releases/download";

/// Target platform in wakatime-cli asset naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_consts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust `std::env::consts` names onto asset names.
    /// Unknown values fall back to `linux` / `amd64`.
    pub fn from_consts(os: &str, arch: &str) -> Self {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            "freebsd" => "freebsd",
            "netbsd" => "netbsd",
            "openbsd" => "openbsd",
            _ => "linux",
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "arm",
            _ => "amd64",
        };
        Self { os, arch }
    }

    /// `wakatime-cli-<os>-<arch>[.exe]`
    pub fn asset_name(&self) -> String {
        let suffix = if self.os == "windows" { ".exe" } else { "" };
        format!("wakatime-cli-{}-{}{suffix}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

pub fn release_url(base_url: &str, version: &str, platform: Platform) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        version,
        platform.asset_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_platforms() {
        assert_eq!(
            Platform::from_consts("macos", "aarch64"),
            Platform {
                os: "darwin",
                arch: "arm64"
            }
        );
        assert_eq!(Platform::from_consts("linux", "x86").to_string(), "linux-386");
        assert_eq!(
            Platform::from_consts("windows", "x86_64").asset_name(),
            "wakatime-cli-windows-amd64.exe"
        );
    }

    #[test]
    fn unknown_platform_falls_back() {
        let p = Platform::from_consts("haiku", "riscv64");
        assert_eq!(p.asset_name(), "wakatime-cli-linux-amd64");
    }

    #[test]
    fn url_joins_without_double_slash() {
        let p = Platform::from_consts("linux", "x86_64");
        assert_eq!(
            release_url("https://example.test/dl/", "v1.2.3", p),
            "https://example.test/dl/v1.2.3/wakatime-cli-linux-amd64"
        );
    }
}
