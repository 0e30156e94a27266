//! Target architectures and their naming conventions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A build architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    X86_64,
    Aarch64,
    Armv7,
    Armhf,
    X86,
    Ppc64le,
    S390x,
    Riscv64,
    Loongarch64,
}

impl Arch {
    /// Architecture of the machine running this process
    pub fn host() -> Result<Self, String> {
        std::env::consts::ARCH.parse()
    }

    /// Name used by apk repositories (`x86_64`, `aarch64`, ...)
    pub fn to_apk(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Armv7 => "armv7",
            Arch::Armhf => "armhf",
            Arch::X86 => "x86",
            Arch::Ppc64le => "ppc64le",
            Arch::S390x => "s390x",
            Arch::Riscv64 => "riscv64",
            Arch::Loongarch64 => "loongarch64",
        }
    }

    /// Name used by the Go toolchain (`amd64`, `arm64`, ...)
    pub fn to_go(self) -> &'static str {
        match self {
            Arch::X86_64 => "amd64",
            Arch::Aarch64 => "arm64",
            Arch::Armv7 => "arm/v7",
            Arch::Armhf => "arm/v6",
            Arch::X86 => "386",
            Arch::Ppc64le => "ppc64le",
            Arch::S390x => "s390x",
            Arch::Riscv64 => "riscv64",
            Arch::Loongarch64 => "loong64",
        }
    }

    /// GNU target triplet for the given libc suffix (`gnu` or `musl`)
    pub fn to_triplet(self, libc: &str) -> String {
        match self {
            Arch::X86_64 => format!("x86_64-pc-linux-{}", libc),
            Arch::Aarch64 => format!("aarch64-unknown-linux-{}", libc),
            Arch::Armv7 => format!("armv7-unknown-linux-{}eabihf", libc),
            Arch::Armhf => format!("arm-unknown-linux-{}eabihf", libc),
            Arch::X86 => format!("i686-pc-linux-{}", libc),
            Arch::Ppc64le => format!("powerpc64le-unknown-linux-{}", libc),
            Arch::S390x => format!("s390x-ibm-linux-{}", libc),
            Arch::Riscv64 => format!("riscv64-unknown-linux-{}", libc),
            Arch::Loongarch64 => format!("loongarch64-unknown-linux-{}", libc),
        }
    }

    /// Rust target triplet for the given libc suffix
    pub fn to_rust_triplet(self, libc: &str) -> String {
        match self {
            Arch::X86_64 => format!("x86_64-unknown-linux-{}", libc),
            Arch::Aarch64 => format!("aarch64-unknown-linux-{}", libc),
            Arch::Armv7 => format!("armv7-unknown-linux-{}eabihf", libc),
            Arch::Armhf => format!("arm-unknown-linux-{}eabihf", libc),
            Arch::X86 => format!("i686-unknown-linux-{}", libc),
            Arch::Ppc64le => format!("powerpc64le-unknown-linux-{}", libc),
            Arch::S390x => format!("s390x-unknown-linux-{}", libc),
            Arch::Riscv64 => format!("riscv64gc-unknown-linux-{}", libc),
            Arch::Loongarch64 => format!("loongarch64-unknown-linux-{}", libc),
        }
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "armv7" | "arm/v7" => Ok(Arch::Armv7),
            "armhf" | "arm/v6" | "arm" => Ok(Arch::Armhf),
            "x86" | "386" | "i686" => Ok(Arch::X86),
            "ppc64le" | "powerpc64le" => Ok(Arch::Ppc64le),
            "s390x" => Ok(Arch::S390x),
            "riscv64" => Ok(Arch::Riscv64),
            "loongarch64" | "loong64" => Ok(Arch::Loongarch64),
            other => Err(format!("unknown architecture: {}", other)),
        }
    }
}

impl TryFrom<String> for Arch {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.to_apk().to_string()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_apk())
    }
}
