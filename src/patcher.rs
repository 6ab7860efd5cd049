use std::io;

use regex::bytes::Regex;

use crate::error::{Error, Result};
use crate::memory_region::MemoryRegion;
use crate::ptrace::TracedProcess;
use crate::region_map;

/// Byte written over every matched span.
pub const FILLER_BYTE: u8 = b'.';

/// One occurrence of a pattern inside a region's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Offset of the match from the start of the region
    pub offset: usize,
    /// Length of the matched span in bytes
    pub len: usize,
}

/// A set of literal byte patterns compiled into a single alternation.
///
/// Patterns are escaped before compilation, so regex metacharacters in a
/// supplied string match themselves. Matching is leftmost-first and
/// non-overlapping: once a match consumes a span, the search resumes at the
/// first byte past it.
#[derive(Debug)]
pub struct PatternSet {
    regex: Regex,
}

impl PatternSet {
    /// Compiles the given literals into an alternation matcher.
    ///
    /// Rejects an empty set and empty strings, both of which would make the
    /// matcher fire on every position.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() || patterns.iter().any(|p| p.as_ref().is_empty()) {
            return Err(Error::EmptyPattern);
        }

        let alternation = patterns
            .iter()
            .map(|p| regex::escape(p.as_ref()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            regex: Regex::new(&alternation)?,
        })
    }

    /// Returns a lazy iterator over the non-overlapping matches of any
    /// pattern in the set against the raw buffer.
    pub fn matches_in<'b>(&'b self, buffer: &'b [u8]) -> impl Iterator<Item = Match> + 'b {
        self.regex.find_iter(buffer).map(|m| Match {
            offset: m.start(),
            len: m.len(),
        })
    }
}

/// Counters describing one scramble pass. Skipped regions and failed writes
/// are recoverable, but they must remain distinguishable from a clean run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrambleReport {
    /// Writable regions whose contents were read and searched
    pub regions_scanned: usize,
    /// Writable regions skipped because their contents could not be read in full
    pub regions_skipped: usize,
    /// Matched spans fully overwritten with the filler byte
    pub matches_patched: usize,
    /// Matched spans whose overwrite failed or transferred short
    pub write_failures: usize,
}

/// Reads, searches, and overwrites the memory of a stopped process.
///
/// Construction requires a [`TracedProcess`], so no transfer can happen
/// against a target whose stop was never confirmed.
#[derive(Debug)]
pub struct MemoryPatcher<'t> {
    traced: &'t TracedProcess,
}

impl<'t> MemoryPatcher<'t> {
    pub fn new(traced: &'t TracedProcess) -> Self {
        Self { traced }
    }

    /// Reads the full contents of a region into a local buffer with a single
    /// `process_vm_readv` transfer.
    ///
    /// A short transfer is an error, not a truncated result: handing back
    /// partial data would let the caller patch addresses computed against
    /// bytes that were never read.
    pub fn read_region(&self, region: &MemoryRegion) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; region.len()];

        let local = libc::iovec {
            iov_base: buffer.as_mut_ptr().cast(),
            iov_len: buffer.len(),
        };
        let remote = libc::iovec {
            iov_base: region.start() as *mut libc::c_void,
            iov_len: region.len(),
        };

        let rv = unsafe { libc::process_vm_readv(self.traced.pid(), &local, 1, &remote, 1, 0) };
        if rv < 0 {
            return Err(Error::Read {
                address: region.start(),
                length: region.len(),
                source: io::Error::last_os_error(),
            });
        }
        if rv as usize != region.len() {
            return Err(Error::ShortRead {
                address: region.start(),
                expected: region.len(),
                got: rv as usize,
            });
        }

        Ok(buffer)
    }

    /// Overwrites `length` bytes at `address` in the target with the filler
    /// byte, in a single `process_vm_writev` transfer. A short transfer
    /// leaves the span undefined and is reported as a failure.
    pub fn write_region(&self, address: usize, length: usize) -> Result<()> {
        let filler = vec![FILLER_BYTE; length];

        let local = libc::iovec {
            iov_base: filler.as_ptr() as *mut libc::c_void,
            iov_len: filler.len(),
        };
        let remote = libc::iovec {
            iov_base: address as *mut libc::c_void,
            iov_len: length,
        };

        let rv = unsafe { libc::process_vm_writev(self.traced.pid(), &local, 1, &remote, 1, 0) };
        if rv < 0 {
            return Err(Error::Write {
                address,
                length,
                source: io::Error::last_os_error(),
            });
        }
        if rv as usize != length {
            return Err(Error::ShortWrite {
                address,
                expected: length,
                got: rv as usize,
            });
        }

        Ok(())
    }

    /// Runs the read-search-write cycle over every writable region of the
    /// target, sequentially.
    ///
    /// Unreadable regions are skipped whole. A failed overwrite is logged
    /// and counted, and the pass continues with the next match. Regions
    /// without matches are never written to.
    pub fn scramble(&self, patterns: &PatternSet) -> Result<ScrambleReport> {
        let mut report = ScrambleReport::default();

        for region in region_map::writable_regions(self.traced.pid())? {
            if region.is_empty() {
                continue;
            }

            let buffer = match self.read_region(&region) {
                Ok(buffer) => buffer,
                Err(err) => {
                    log::warn!("skipping region {:#x}-{:#x}: {err}", region.start(), region.end());
                    report.regions_skipped += 1;
                    continue;
                }
            };
            report.regions_scanned += 1;

            for m in patterns.matches_in(&buffer) {
                let address = region.start() + m.offset;
                match self.write_region(address, m.len) {
                    Ok(()) => {
                        log::debug!("scrambled {} bytes at {address:#x}", m.len);
                        report.matches_patched += 1;
                    }
                    Err(err) => {
                        log::error!("{err}");
                        report.write_failures += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{Match, PatternSet, FILLER_BYTE};
    use crate::error::Error;

    #[test]
    fn matches_are_increasing_and_non_overlapping() {
        let patterns = PatternSet::new(&["aa", "b"]).unwrap();
        let matches: Vec<Match> = patterns.matches_in(b"aaaabbaab").collect();

        let mut previous_end = 0;
        for m in &matches {
            assert!(m.offset >= previous_end);
            previous_end = m.offset + m.len;
        }
        assert!(previous_end <= 9);
        assert_eq!(
            matches,
            vec![
                Match { offset: 0, len: 2 },
                Match { offset: 2, len: 2 },
                Match { offset: 4, len: 1 },
                Match { offset: 5, len: 1 },
                Match { offset: 6, len: 2 },
                Match { offset: 8, len: 1 },
            ]
        );
    }

    #[test]
    fn leftmost_match_wins_and_search_resumes_past_it() {
        // "AB" consumes offsets 1-2, so the overlapping "BC" at offset 2
        // must not match.
        let patterns = PatternSet::new(&["AB", "BC"]).unwrap();
        let matches: Vec<Match> = patterns.matches_in(b"XABCX").collect();
        assert_eq!(matches, vec![Match { offset: 1, len: 2 }]);
    }

    #[test]
    fn patterns_are_literals_not_syntax() {
        let patterns = PatternSet::new(&["a.c"]).unwrap();
        assert_eq!(patterns.matches_in(b"abc").count(), 0);
        assert_eq!(patterns.matches_in(b"xa.cx").count(), 1);

        let patterns = PatternSet::new(&["$^("]).unwrap();
        assert_eq!(patterns.matches_in(b"zz$^(zz").count(), 1);
    }

    #[test]
    fn matching_is_binary_safe() {
        let patterns = PatternSet::new(&["SECRET"]).unwrap();
        let mut buffer = vec![0u8, 0xff, 0xfe];
        buffer.extend_from_slice(b"SECRET");
        buffer.extend_from_slice(&[0x80, 0x00]);

        let matches: Vec<Match> = patterns.matches_in(&buffer).collect();
        assert_eq!(matches, vec![Match { offset: 3, len: 6 }]);
    }

    #[test]
    fn filler_does_not_rematch() {
        let patterns = PatternSet::new(&["SECRET"]).unwrap();
        let mut buffer = b"hello SECRET world".to_vec();

        let matches: Vec<Match> = patterns.matches_in(&buffer).collect();
        assert_eq!(matches.len(), 1);
        for m in matches {
            buffer[m.offset..m.offset + m.len].fill(FILLER_BYTE);
        }

        assert_eq!(&buffer[..], b"hello ...... world");
        assert_eq!(patterns.matches_in(&buffer).count(), 0);
    }

    #[test]
    fn empty_buffer_yields_no_matches() {
        let patterns = PatternSet::new(&["x"]).unwrap();
        assert_eq!(patterns.matches_in(b"").count(), 0);
    }

    #[test]
    fn rejects_empty_pattern_sets() {
        assert!(matches!(
            PatternSet::new::<&str>(&[]),
            Err(Error::EmptyPattern)
        ));
        assert!(matches!(
            PatternSet::new(&["ok", ""]),
            Err(Error::EmptyPattern)
        ));
    }
}
