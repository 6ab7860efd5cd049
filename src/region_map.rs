use std::fs;

use crate::error::{Error, Result};
use crate::memory_protection::MemoryProtection;
use crate::memory_region::MemoryRegion;

/// Parses a single `/proc/<pid>/maps` line into a region and its protection.
///
/// Lines follow `START-END PERMS OFFSET DEV INODE [PATH]`, with the addresses
/// in hex. Anything that does not fit that shape (guard pages reported
/// oddly, truncated lines) yields `None` so the caller can skip it without
/// failing the whole scan.
pub fn parse_line(line: &str) -> Option<(MemoryRegion, MemoryProtection)> {
    let mut fields = line.split_whitespace();

    let (start, end) = fields.next()?.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    if end <= start {
        return None;
    }

    let protection = MemoryProtection::parse(fields.next()?)?;

    Some((MemoryRegion::new(start, end - start), protection))
}

/// Extracts every read+write region from the text of a maps file, in the
/// order the kernel reports them. Unparseable lines are skipped.
pub fn parse_maps(contents: &str) -> Vec<MemoryRegion> {
    contents
        .lines()
        .filter_map(|line| match parse_line(line) {
            Some((region, protection)) => Some((region, protection)),
            None => {
                log::debug!("skipping unparseable maps line: {line:?}");
                None
            }
        })
        .filter(|(_, protection)| protection.is_readwrite())
        .map(|(region, _)| region)
        .collect()
}

/// Returns the writable regions of the target process by reading its
/// `/proc/<pid>/maps` file.
///
/// This does not require the target to be stopped, but the returned
/// addresses are only safe to write through once it has been.
pub fn writable_regions(pid: i32) -> Result<Vec<MemoryRegion>> {
    let contents = fs::read_to_string(format!("/proc/{pid}/maps"))
        .map_err(|source| Error::Maps { pid, source })?;

    Ok(parse_maps(&contents))
}

#[cfg(test)]
mod tests {
    use super::{parse_line, parse_maps};
    use crate::memory_protection::MemoryProtection;

    #[test]
    fn parses_readwrite_line() {
        let (region, protection) = parse_line("1000-2000 rw-p 00000000 00:00 0").unwrap();
        assert_eq!(region.start(), 0x1000);
        assert_eq!(region.len(), 0x1000);
        assert!(protection.is_readwrite());
    }

    #[test]
    fn parses_line_with_pathname() {
        let line = "7f2c7a400000-7f2c7a5c0000 r-xp 00000000 103:02 2097554 /usr/lib/libc.so.6";
        let (region, protection) = parse_line(line).unwrap();
        assert_eq!(region.start(), 0x7f2c7a400000);
        assert_eq!(region.end(), 0x7f2c7a5c0000);
        assert!(protection.contains(MemoryProtection::EXECUTE));
    }

    #[test]
    fn rejects_garbage_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("not a maps line").is_none());
        assert!(parse_line("zzzz-1000 rw-p 0 00:00 0").is_none());
        assert!(parse_line("2000-1000 rw-p 0 00:00 0").is_none());
        assert!(parse_line("1000-2000").is_none());
    }

    #[test]
    fn filters_to_writable_regions_only() {
        let maps = "1000-2000 rw-p 00000000 00:00 0\n\
                    2000-3000 r-xp 00000000 00:00 0\n\
                    3000-4000 r--p 00000000 00:00 0\n\
                    garbage line\n\
                    4000-6000 rw-s 00000000 00:00 0          [heap]\n";

        let regions = parse_maps(maps);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].start(), 0x1000);
        assert_eq!(regions[0].len(), 0x1000);
        assert_eq!(regions[1].start(), 0x4000);
        assert_eq!(regions[1].len(), 0x2000);
    }
}
