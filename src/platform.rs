//! Platform probing: OS family, package manager, architecture, privilege.
use std::fmt;
use std::path::Path;

use crate::exec::Executor;

/// Detected operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// macOS (Homebrew territory).
    MacOs,
    /// Ubuntu.
    Ubuntu,
    /// Debian (non-Ubuntu).
    Debian,
    /// RHEL and derivatives (CentOS, Rocky, Alma).
    Rhel,
    /// Fedora.
    Fedora,
    /// Arch Linux.
    Arch,
    /// Alpine (musl, no glibc toolchains).
    Alpine,
    /// OpenWrt (embedded, musl, opkg).
    OpenWrt,
    /// Unrecognised distribution.
    Unknown,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macos",
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Rhel => "rhel",
            Self::Fedora => "fedora",
            Self::Arch => "arch",
            Self::Alpine => "alpine",
            Self::OpenWrt => "openwrt",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Supported package managers, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Homebrew (macOS).
    Brew,
    /// APT (Debian/Ubuntu).
    Apt,
    /// DNF (Fedora, recent RHEL).
    Dnf,
    /// Yum (older RHEL).
    Yum,
    /// Pacman (Arch).
    Pacman,
    /// apk (Alpine).
    Apk,
    /// opkg (OpenWrt).
    Opkg,
    /// No supported manager found. Disables package units; must be surfaced
    /// to the caller, never silently swallowed.
    None,
}

impl PackageManager {
    /// The binary probed on PATH for this manager.
    #[must_use]
    pub const fn binary(self) -> Option<&'static str> {
        match self {
            Self::Brew => Some("brew"),
            Self::Apt => Some("apt-get"),
            Self::Dnf => Some("dnf"),
            Self::Yum => Some("yum"),
            Self::Pacman => Some("pacman"),
            Self::Apk => Some("apk"),
            Self::Opkg => Some("opkg"),
            Self::None => None,
        }
    }

    /// Whether install/update commands for this manager need elevation.
    ///
    /// Homebrew refuses to run as root; everything else writes system paths.
    #[must_use]
    pub const fn needs_elevation(self) -> bool {
        !matches!(self, Self::Brew | Self::None)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Brew => "brew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Apk => "apk",
            Self::Opkg => "opkg",
            Self::None => "none",
        };
        write!(f, "{name}")
    }
}

/// Privilege-elevation capability, probed once at run start and threaded
/// explicitly through the engine context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Running as root; write system paths directly.
    Root,
    /// sudo available with cached credentials.
    Sudo,
    /// No way to elevate; root-writing units skip with a warning.
    Unavailable,
}

impl Elevation {
    /// Probe elevation capability.
    ///
    /// Checks effective uid via `id -u`, then a cached sudo ticket via
    /// `sudo -n -v`. When `interactive` is set and no ticket is cached,
    /// runs `sudo -v` once so later steps can rely on the cached ticket
    /// (sudo prompts on the controlling terminal directly).
    pub fn probe(executor: &dyn Executor, interactive: bool) -> Self {
        if let Ok(result) = executor.run_unchecked("id", &["-u"]) {
            if result.success && result.stdout.trim() == "0" {
                return Self::Root;
            }
        }
        if !executor.which("sudo") {
            return Self::Unavailable;
        }
        if let Ok(result) = executor.run_unchecked("sudo", &["-n", "-v"]) {
            if result.success {
                return Self::Sudo;
            }
        }
        if interactive {
            if let Ok(result) = executor.run_unchecked("sudo", &["-v"]) {
                if result.success {
                    return Self::Sudo;
                }
            }
        }
        Self::Unavailable
    }

    /// Whether elevated writes are possible at all.
    #[must_use]
    pub const fn available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Detected OS family.
    pub family: OsFamily,
    /// Selected package manager (exactly one, first-match probe order).
    pub package_manager: PackageManager,
    /// CPU architecture (`x86_64`, `aarch64`, …).
    pub arch: &'static str,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// Pure query: reads os-release files and probes PATH via `executor`.
    pub fn detect(executor: &dyn Executor) -> Self {
        let family = if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            detect_linux_family()
        };
        let package_manager = detect_package_manager(family, executor);
        Self {
            family,
            package_manager,
            arch: std::env::consts::ARCH,
        }
    }

    /// Create a platform with explicit values (for testing and dispatch tables).
    #[must_use]
    pub const fn new(family: OsFamily, package_manager: PackageManager) -> Self {
        Self {
            family,
            package_manager,
            arch: std::env::consts::ARCH,
        }
    }

    /// Whether a usable package manager was found.
    #[must_use]
    pub const fn has_package_manager(&self) -> bool {
        !matches!(self.package_manager, PackageManager::None)
    }

    /// macOS check.
    #[must_use]
    pub const fn is_macos(&self) -> bool {
        matches!(self.family, OsFamily::MacOs)
    }

    /// OpenWrt check.
    #[must_use]
    pub const fn is_openwrt(&self) -> bool {
        matches!(self.family, OsFamily::OpenWrt)
    }

    /// Families without glibc toolchains. Version managers that download
    /// glibc-linked binaries must fall back to native packages here.
    #[must_use]
    pub const fn is_musl_based(&self) -> bool {
        matches!(self.family, OsFamily::Alpine | OsFamily::OpenWrt)
    }

    /// Families using `/etc/update-motd.d` drop-ins.
    #[must_use]
    pub const fn supports_motd(&self) -> bool {
        matches!(self.family, OsFamily::Ubuntu | OsFamily::Debian)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ({})", self.family, self.package_manager, self.arch)
    }
}

fn detect_linux_family() -> OsFamily {
    // OpenWrt images carry their own release file and often omit os-release.
    if Path::new("/etc/openwrt_release").exists() {
        return OsFamily::OpenWrt;
    }
    match std::fs::read_to_string("/etc/os-release") {
        Ok(content) => parse_os_release(&content),
        Err(_) => OsFamily::Unknown,
    }
}

/// Classify an os-release document by `ID=`, falling back to `ID_LIKE=`.
pub(crate) fn parse_os_release(content: &str) -> OsFamily {
    let mut id = None;
    let mut id_like = None;
    for line in content.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(unquote(value));
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            id_like = Some(unquote(value));
        }
    }

    if let Some(id) = id {
        if let Some(family) = family_for_id(&id) {
            return family;
        }
    }
    if let Some(like) = id_like {
        for token in like.split_whitespace() {
            if let Some(family) = family_for_id(token) {
                return family;
            }
        }
    }
    OsFamily::Unknown
}

fn family_for_id(id: &str) -> Option<OsFamily> {
    match id {
        "ubuntu" => Some(OsFamily::Ubuntu),
        "debian" | "raspbian" => Some(OsFamily::Debian),
        "rhel" | "centos" | "rocky" | "almalinux" => Some(OsFamily::Rhel),
        "fedora" => Some(OsFamily::Fedora),
        "arch" | "archarm" | "manjaro" => Some(OsFamily::Arch),
        "alpine" => Some(OsFamily::Alpine),
        "openwrt" => Some(OsFamily::OpenWrt),
        _ => None,
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// Probe order: the first manager whose binary is on PATH wins.
const PROBE_ORDER: &[PackageManager] = &[
    PackageManager::Apt,
    PackageManager::Dnf,
    PackageManager::Yum,
    PackageManager::Pacman,
    PackageManager::Apk,
    PackageManager::Opkg,
];

fn detect_package_manager(family: OsFamily, executor: &dyn Executor) -> PackageManager {
    if matches!(family, OsFamily::MacOs) {
        return if executor.which("brew") {
            PackageManager::Brew
        } else {
            PackageManager::None
        };
    }
    for manager in PROBE_ORDER {
        if let Some(binary) = manager.binary() {
            if executor.which(binary) {
                return *manager;
            }
        }
    }
    PackageManager::None
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn parse_os_release_ubuntu() {
        let content = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
        assert_eq!(parse_os_release(content), OsFamily::Ubuntu);
    }

    #[test]
    fn parse_os_release_debian() {
        assert_eq!(parse_os_release("ID=debian\n"), OsFamily::Debian);
    }

    #[test]
    fn parse_os_release_quoted_id() {
        assert_eq!(parse_os_release("ID=\"rocky\"\n"), OsFamily::Rhel);
    }

    #[test]
    fn parse_os_release_fedora() {
        assert_eq!(parse_os_release("ID=fedora\n"), OsFamily::Fedora);
    }

    #[test]
    fn parse_os_release_arch() {
        assert_eq!(parse_os_release("ID=arch\n"), OsFamily::Arch);
    }

    #[test]
    fn parse_os_release_alpine() {
        assert_eq!(parse_os_release("ID=alpine\nID_LIKE=\n"), OsFamily::Alpine);
    }

    #[test]
    fn parse_os_release_openwrt() {
        assert_eq!(parse_os_release("ID=openwrt\n"), OsFamily::OpenWrt);
    }

    #[test]
    fn parse_os_release_falls_back_to_id_like() {
        let content = "ID=pop\nID_LIKE=\"ubuntu debian\"\n";
        assert_eq!(parse_os_release(content), OsFamily::Ubuntu);
    }

    #[test]
    fn parse_os_release_unknown() {
        assert_eq!(parse_os_release("ID=plan9\n"), OsFamily::Unknown);
    }

    #[test]
    fn probe_order_prefers_apt() {
        let executor = MockExecutor::default()
            .with_program("apt-get")
            .with_program("pacman");
        let manager = detect_package_manager(OsFamily::Unknown, &executor);
        assert_eq!(manager, PackageManager::Apt);
    }

    #[test]
    fn probe_finds_later_manager() {
        let executor = MockExecutor::default().with_program("opkg");
        let manager = detect_package_manager(OsFamily::OpenWrt, &executor);
        assert_eq!(manager, PackageManager::Opkg);
    }

    #[test]
    fn probe_none_when_nothing_found() {
        let executor = MockExecutor::default();
        let manager = detect_package_manager(OsFamily::Unknown, &executor);
        assert_eq!(manager, PackageManager::None);
    }

    #[test]
    fn probe_macos_requires_brew() {
        let executor = MockExecutor::default();
        assert_eq!(
            detect_package_manager(OsFamily::MacOs, &executor),
            PackageManager::None
        );
        let executor = MockExecutor::default().with_program("brew");
        assert_eq!(
            detect_package_manager(OsFamily::MacOs, &executor),
            PackageManager::Brew
        );
    }

    #[test]
    fn elevation_probe_root() {
        let executor = MockExecutor::with_responses(vec![(true, "0\n".to_string())]);
        assert_eq!(Elevation::probe(&executor, false), Elevation::Root);
    }

    #[test]
    fn elevation_probe_sudo_cached() {
        let executor = MockExecutor::with_responses(vec![
            (true, "1000\n".to_string()), // id -u
            (true, String::new()),        // sudo -n -v
        ])
        .with_program("sudo");
        assert_eq!(Elevation::probe(&executor, false), Elevation::Sudo);
    }

    #[test]
    fn elevation_probe_unavailable_without_sudo_binary() {
        let executor = MockExecutor::with_responses(vec![(true, "1000\n".to_string())]);
        assert_eq!(Elevation::probe(&executor, false), Elevation::Unavailable);
    }

    #[test]
    fn elevation_probe_non_interactive_does_not_prompt() {
        // id -u, then sudo -n -v fails; no further calls expected.
        let executor = MockExecutor::with_responses(vec![
            (true, "1000\n".to_string()),
            (false, String::new()),
        ])
        .with_program("sudo");
        assert_eq!(Elevation::probe(&executor, false), Elevation::Unavailable);
        assert_eq!(executor.call_count(), 2);
    }

    #[test]
    fn platform_flags() {
        let p = Platform::new(OsFamily::Alpine, PackageManager::Apk);
        assert!(p.is_musl_based());
        assert!(!p.is_macos());
        assert!(!p.supports_motd());
        assert!(p.has_package_manager());

        let p = Platform::new(OsFamily::Ubuntu, PackageManager::None);
        assert!(p.supports_motd());
        assert!(!p.has_package_manager());
    }

    #[test]
    fn display_formats() {
        assert_eq!(OsFamily::OpenWrt.to_string(), "openwrt");
        assert_eq!(PackageManager::Apt.to_string(), "apt");
        let p = Platform::new(OsFamily::Ubuntu, PackageManager::Apt);
        assert!(p.to_string().starts_with("ubuntu / apt"));
    }

    #[test]
    fn needs_elevation_table() {
        assert!(!PackageManager::Brew.needs_elevation());
        assert!(!PackageManager::None.needs_elevation());
        assert!(PackageManager::Apt.needs_elevation());
        assert!(PackageManager::Opkg.needs_elevation());
    }
}
