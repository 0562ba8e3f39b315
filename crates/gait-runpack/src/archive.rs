// crates/gait-runpack/src/archive.rs
// ============================================================================
// Module: Archive Primitives
// Description: Low-level ZIP read/write helpers shared by write, verify,
//              diff, inspect, and migrate.
// Purpose: Centralize the flat-layout, fixed-epoch, normalized-permission
//          conventions a runpack archive must follow, so no call site can
//          drift from them.
// Dependencies: zip
// ============================================================================

//! ## Overview
//! A runpack archive is a flat set of named members: no directories, no
//! symlinks, every member's modified time pinned to the fixed epoch, every
//! member's unix permission bits normalized to `0o644`. Members are written
//! in lexicographic name order so two archives built from the same logical
//! content are byte-identical.

use std::collections::BTreeMap;
use std::io::Read;
use std::io::Seek;
use std::io::Write;

use zip::write::FileOptions;
use zip::DateTime;
use zip::ZipArchive;
use zip::ZipWriter;

use crate::error::RunpackError;

/// Unix permission bits applied to every member, regardless of the
/// producing platform's own file mode.
const MEMBER_UNIX_MODE: u32 = 0o644;

/// Validates that `name` is a flat member name: no path separator, no `..`
/// segment.
///
/// # Errors
///
/// Returns [`RunpackError::PathTraversal`] when `name` contains `/`, `\`, or
/// a `..` segment.
pub fn validate_member_name(name: &str) -> Result<(), RunpackError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.split('/').any(|part| part == "..") {
        return Err(RunpackError::PathTraversal { member: name.to_owned() });
    }
    Ok(())
}

/// Builds the fixed, deterministic file options every member is written
/// with: the fixed epoch as last-modified time and normalized unix
/// permissions. Deflate compression is used throughout, per the workspace's
/// only enabled zip codec.
fn file_options() -> FileOptions {
    let fixed = DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0).unwrap_or_else(|_| DateTime::default());
    FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(fixed)
        .unix_permissions(MEMBER_UNIX_MODE)
}

/// Writes `members` into a new ZIP archive at `writer`, in lexicographic
/// name order, each with the fixed deterministic file options.
///
/// # Errors
///
/// Returns [`RunpackError::PathTraversal`] if any member name is not flat,
/// and [`RunpackError::Zip`] / [`RunpackError::Io`] on archive I/O failure.
pub fn write_members<W: Write + Seek>(
    writer: W,
    members: &BTreeMap<String, Vec<u8>>,
) -> Result<(), RunpackError> {
    let mut zip = ZipWriter::new(writer);
    let options = file_options();
    for (name, bytes) in members {
        validate_member_name(name)?;
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

/// Reads every member of a ZIP archive into memory, keyed by member name.
///
/// # Errors
///
/// Returns [`RunpackError::PathTraversal`] if any stored member name is not
/// flat, and [`RunpackError::Zip`] / [`RunpackError::Io`] on archive read
/// failure.
pub fn read_all_members<R: Read + Seek>(reader: R) -> Result<BTreeMap<String, Vec<u8>>, RunpackError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut out = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_owned();
        validate_member_name(&name)?;
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        out.insert(name, bytes);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
    use std::collections::BTreeMap;
    use std::io::Cursor;

    use super::read_all_members;
    use super::validate_member_name;
    use super::write_members;

    #[test]
    fn rejects_nested_member_names() {
        assert!(validate_member_name("dir/file.json").is_err());
        assert!(validate_member_name("../escape.json").is_err());
        assert!(validate_member_name("plain.json").is_ok());
    }

    #[test]
    fn round_trips_members_through_archive_bytes() {
        let mut members = BTreeMap::new();
        members.insert("b.json".to_owned(), b"{\"b\":1}".to_vec());
        members.insert("a.json".to_owned(), b"{\"a\":1}".to_vec());

        let mut buffer = Cursor::new(Vec::new());
        write_members(&mut buffer, &members).expect("archive writes");

        buffer.set_position(0);
        let read_back = read_all_members(buffer).expect("archive reads");
        assert_eq!(read_back, members);
    }

    #[test]
    fn identical_members_produce_byte_identical_archives() {
        let mut members = BTreeMap::new();
        members.insert("a.json".to_owned(), b"{}".to_vec());

        let mut first = Cursor::new(Vec::new());
        write_members(&mut first, &members).expect("first archive writes");

        let mut second = Cursor::new(Vec::new());
        write_members(&mut second, &members).expect("second archive writes");

        assert_eq!(first.into_inner(), second.into_inner());
    }
}
