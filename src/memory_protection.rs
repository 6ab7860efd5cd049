use std::fmt;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryProtection: u32 {
        const NO_PROTECTION = 0;
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXECUTE = 1 << 2;
        const SHARED = 1 << 3;
    }
}

impl MemoryProtection {
    /// Parses the four-character permission field of a `/proc/<pid>/maps`
    /// line (e.g. `rw-p` or `r-xs`). Returns `None` for fields that do not
    /// follow the `rwx(p|s)` layout, letting the caller skip the line.
    pub fn parse(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        let mut protection = Self::NO_PROTECTION;

        match chars.next()? {
            'r' => protection |= Self::READ,
            '-' => {}
            _ => return None,
        }
        match chars.next()? {
            'w' => protection |= Self::WRITE,
            '-' => {}
            _ => return None,
        }
        match chars.next()? {
            'x' => protection |= Self::EXECUTE,
            '-' => {}
            _ => return None,
        }
        match chars.next()? {
            's' => protection |= Self::SHARED,
            'p' => {}
            _ => return None,
        }

        Some(protection)
    }

    /// Checks whether the region is both readable and writable.
    pub fn is_readwrite(&self) -> bool {
        self.contains(Self::READ | Self::WRITE)
    }
}

impl fmt::Display for MemoryProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NO_PROTECTION");
        }

        let mut parts = Vec::new();
        if self.contains(Self::READ) {
            parts.push("READ");
        }
        if self.contains(Self::WRITE) {
            parts.push("WRITE");
        }
        if self.contains(Self::EXECUTE) {
            parts.push("EXECUTE");
        }
        if self.contains(Self::SHARED) {
            parts.push("SHARED");
        }

        write!(f, "{}", parts.join(" | "))
    }
}
