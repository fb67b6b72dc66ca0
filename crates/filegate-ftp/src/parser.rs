//! LIST / MLSD response parser.
//!
//! Supports three formats:
//! 1. **Unix-style** (`ls -l`): `-rwxr-xr-x 1 owner group 1234 Jan  1 12:00 file.txt`
//! 2. **Windows/IIS-style**: `01-01-26  12:00AM       1234 file.txt`
//! 3. **MLSD facts** (RFC 3659): `type=file;size=1234;modify=20260101120000; file.txt`
//!
//! MLSD is tried first (the line contains `=` and `;`), then Unix, then
//! Windows. Lines matching none of them are dropped, as are `total N`
//! headers and the `.` / `..` pseudo-entries.

use filegate_core::{EntryKind, RemoteEntry};
use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

lazy_static! {
    static ref UNIX_LINE: Option<Regex> = Regex::new(
        r"(?x)
        ^([dlcbps-][rwxsStT-]{9})[+@.]?\s+  # permissions
        (\d+)\s+                             # link count
        (\S+)\s+                             # owner
        (\S+)\s+                             # group
        (\d+)\s+                             # size
        (\w{3}\s+\d{1,2}\s+[\d:]+)\s+       # date
        (.+)$                                # filename (possibly with -> target)
        "
    )
    .ok();
    static ref WINDOWS_LINE: Option<Regex> = Regex::new(
        r"(?x)
        ^(\d{2}-\d{2}-\d{2,4})\s+           # date
        (\d{1,2}:\d{2}(?:AM|PM)?)\s+        # time
        (<DIR>|\d+)\s+                       # size or <DIR>
        (.+)$                                # filename
        "
    )
    .ok();
}

/// What a single listing line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    File,
    Directory,
    Symlink,
    Other,
}

#[derive(Debug, PartialEq, Eq)]
struct ListingLine {
    name: String,
    kind: LineKind,
    size: Option<u64>,
}

/// Parse raw LIST/MLSD lines into entries of `parent`.
///
/// Symbolic links are reported as files; device nodes, sockets and
/// unparseable lines are skipped.
pub fn parse_listing<S: AsRef<str>>(lines: &[S], parent: &str) -> Vec<RemoteEntry> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .filter_map(parse_line)
        .filter(|l| l.name != "." && l.name != "..")
        .filter_map(|l| {
            let kind = match l.kind {
                LineKind::Directory => EntryKind::Directory,
                LineKind::File | LineKind::Symlink => EntryKind::File,
                LineKind::Other => {
                    trace!("skipping special entry {}", l.name);
                    return None;
                }
            };
            let entry = RemoteEntry::new(l.name, kind, parent);
            Some(match l.size {
                Some(size) => entry.with_size(size),
                None => entry,
            })
        })
        .collect()
}

fn parse_line(line: &str) -> Option<ListingLine> {
    if line.contains(';') && line.contains('=') {
        if let Some(e) = parse_mlsd(line) {
            return Some(e);
        }
    }
    if let Some(e) = parse_unix(line) {
        return Some(e);
    }
    if let Some(e) = parse_windows(line) {
        return Some(e);
    }
    trace!("unrecognised listing line: {}", line);
    None
}

// ─── MLSD parser ─────────────────────────────────────────────────────

/// Parse MLSD fact-line: `fact1=val1;fact2=val2; filename`
fn parse_mlsd(line: &str) -> Option<ListingLine> {
    let (facts, name) = match line.find("; ") {
        Some(pos) => (&line[..pos + 1], &line[pos + 2..]),
        None => {
            let pos = line.rfind(' ')?;
            (&line[..pos], &line[pos + 1..])
        }
    };
    if name.is_empty() {
        return None;
    }

    let mut kind = LineKind::Other;
    let mut size = None;
    for fact in facts.split(';').map(str::trim) {
        let Some((key, value)) = fact.split_once('=') else {
            continue;
        };
        match key.to_lowercase().as_str() {
            "type" => {
                kind = match value.to_lowercase().as_str() {
                    "dir" | "cdir" | "pdir" => LineKind::Directory,
                    "file" => LineKind::File,
                    "os.unix=symlink" | "os.unix=slink" => LineKind::Symlink,
                    _ => LineKind::Other,
                }
            }
            "size" => size = value.parse::<u64>().ok(),
            _ => {}
        }
    }

    Some(ListingLine {
        name: name.to_string(),
        kind,
        size,
    })
}

// ─── Unix-style parser ───────────────────────────────────────────────

/// ```text
/// drwxr-xr-x   2 user group  4096 Jan  1 12:00 dirname
/// -rw-r--r--   1 user group  1234 Jan  1  2025 file.txt
/// lrwxrwxrwx   1 user group    42 Jan  1 12:00 link -> target
/// ```
fn parse_unix(line: &str) -> Option<ListingLine> {
    let caps = UNIX_LINE.as_ref()?.captures(line)?;

    let perms = caps.get(1)?.as_str();
    let size = caps.get(5)?.as_str().parse::<u64>().ok();
    let raw_name = caps.get(7)?.as_str();

    let kind = match perms.as_bytes().first() {
        Some(b'd') => LineKind::Directory,
        Some(b'l') => LineKind::Symlink,
        Some(b'-') => LineKind::File,
        _ => LineKind::Other,
    };

    let name = match (kind, raw_name.find(" -> ")) {
        (LineKind::Symlink, Some(pos)) => &raw_name[..pos],
        _ => raw_name,
    };

    Some(ListingLine {
        name: name.to_string(),
        kind,
        size,
    })
}

// ─── Windows-style parser ────────────────────────────────────────────

/// ```text
/// 01-01-26  12:00AM       1234 file.txt
/// 01-01-26  12:00PM      <DIR> Directory Name
/// ```
fn parse_windows(line: &str) -> Option<ListingLine> {
    let caps = WINDOWS_LINE.as_ref()?.captures(line)?;

    let size_or_dir = caps.get(3)?.as_str();
    let name = caps.get(4)?.as_str().to_string();

    let (kind, size) = if size_or_dir == "<DIR>" {
        (LineKind::Directory, None)
    } else {
        (LineKind::File, size_or_dir.parse::<u64>().ok())
    };

    Some(ListingLine { name, kind, size })
}
