//! Binary I/O for the policy table.
//!
//! Format (all integers little-endian):
//!
//! | Field | Size |
//! |-------|------|
//! | magic "FPOL", version, venture count N, horizon H | 4 × u32 |
//! | problem fingerprint | u64 |
//! | state count S | u32 |
//! | StateSpace vectors | S × N × u32 |
//! | entries, round-major then StateSpace order | (H+1) × S × (f64 + u8 + N × u32) |
//!
//! The action flag byte is 1 when an action is stored; the N action slots are
//! written as zeros otherwise, so every record has the same size.
//!
//! The fingerprint is [`ProblemSpec::fingerprint`](crate::problem::ProblemSpec::fingerprint)
//! of the problem the table was solved for.
//!
//! Loading memory-maps the file via `memmap2` and decodes in one pass.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use memmap2::Mmap;
use tracing::info;

use crate::constants::{POLICY_FILE_MAGIC, POLICY_FILE_VERSION};
use crate::error::{Result, SolverError};
use crate::types::{PolicyEntry, PolicyTable, VentureVector};

const HEADER_SIZE: usize = 24;

/// Check if a file exists on disk.
pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().exists()
}

/// Write `table` to `path`, creating parent directories as needed.
pub fn save_policy_table<P: AsRef<Path>>(table: &PolicyTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let start_time = Instant::now();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let venture_count = table.states().first().map_or(0, |s| s.len());
    let mut w = BufWriter::new(File::create(path)?);

    w.write_all(&POLICY_FILE_MAGIC.to_le_bytes())?;
    w.write_all(&POLICY_FILE_VERSION.to_le_bytes())?;
    w.write_all(&(venture_count as u32).to_le_bytes())?;
    w.write_all(&table.horizon().to_le_bytes())?;
    w.write_all(&table.fingerprint().to_le_bytes())?;
    w.write_all(&(table.states().len() as u32).to_le_bytes())?;

    for state in table.states() {
        for &level in state.iter() {
            w.write_all(&level.to_le_bytes())?;
        }
    }

    for round in table.rounds() {
        for entry in round {
            w.write_all(&entry.value.to_le_bytes())?;
            match &entry.action {
                Some(action) => {
                    w.write_all(&[1u8])?;
                    for &level in action.iter() {
                        w.write_all(&level.to_le_bytes())?;
                    }
                }
                None => {
                    w.write_all(&[0u8])?;
                    for _ in 0..venture_count {
                        w.write_all(&0u32.to_le_bytes())?;
                    }
                }
            }
        }
    }
    w.flush()?;

    info!(
        path = %path.display(),
        entries = table.len(),
        "saved policy table in {:.2} ms",
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Load a policy table written by [`save_policy_table`].
pub fn load_policy_table<P: AsRef<Path>>(path: P) -> Result<PolicyTable> {
    let path = path.as_ref();
    let start_time = Instant::now();

    let file = File::open(path)?;
    // Safety: the map is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file)? };
    let table = decode_policy_table(&mmap)?;

    info!(
        path = %path.display(),
        entries = table.len(),
        "loaded policy table via mmap in {:.2} ms",
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(table)
}

/// Decode a policy table from its serialized bytes.
pub fn decode_policy_table(bytes: &[u8]) -> Result<PolicyTable> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(SolverError::corrupt(format!(
            "file too short for header ({} bytes)",
            bytes.len()
        )));
    }
    let mut r = ByteReader::new(bytes);

    let magic = r.read_u32()?;
    let version = r.read_u32()?;
    if magic != POLICY_FILE_MAGIC || version != POLICY_FILE_VERSION {
        return Err(SolverError::corrupt(format!(
            "invalid file format (magic=0x{:08x} version={})",
            magic, version
        )));
    }
    let venture_count = r.read_u32()? as usize;
    let horizon = r.read_u32()? as usize;
    let fingerprint = r.read_u64()?;
    let state_count = r.read_u32()? as usize;
    if venture_count == 0 || state_count == 0 {
        return Err(SolverError::corrupt(format!(
            "empty table ({} ventures, {} states)",
            venture_count, state_count
        )));
    }

    // u128 so a garbage header cannot overflow the size check.
    let record_size = 8 + 1 + 4 * venture_count as u128;
    let expected = (HEADER_SIZE + 4) as u128
        + state_count as u128 * venture_count as u128 * 4
        + (horizon as u128 + 1) * state_count as u128 * record_size;
    if bytes.len() as u128 != expected {
        return Err(SolverError::corrupt(format!(
            "size mismatch: expected {} bytes, got {}",
            expected,
            bytes.len()
        )));
    }

    // Past the size check every record is backed by input bytes, so these
    // capacities are bounded by the file length.
    let mut states = Vec::with_capacity(state_count);
    for _ in 0..state_count {
        states.push(VentureVector::new(r.read_levels(venture_count)?));
    }

    let mut rounds = Vec::with_capacity(horizon + 1);
    for _ in 0..=horizon {
        let mut round = Vec::with_capacity(state_count);
        for _ in 0..state_count {
            let value = r.read_f64()?;
            let flag = r.read_u8()?;
            let levels = r.read_levels(venture_count)?;
            let action = match flag {
                0 => None,
                1 => Some(VentureVector::new(levels)),
                other => {
                    return Err(SolverError::corrupt(format!(
                        "invalid action flag {}",
                        other
                    )))
                }
            };
            round.push(PolicyEntry { action, value });
        }
        rounds.push(round);
    }

    PolicyTable::from_parts(fingerprint, states, rounds)
}

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let chunk = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| {
                SolverError::corrupt(format!("unexpected end of data at {}", self.pos))
            })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take::<8>()?))
    }

    fn read_levels(&mut self, n: usize) -> Result<Vec<u32>> {
        (0..n).map(|_| self.read_u32()).collect()
    }
}
