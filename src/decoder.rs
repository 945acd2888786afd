//! Three-phase synchronization orchestrator.
//!
//! A tANS stream can only be decoded sequentially (every symbol's bit
//! position depends on the one before it), so the orchestrator decodes it
//! speculatively instead:
//!
//! 1. **Speculate**: every worker scans its interval from a guessed entry
//!    state and deposits tentative sync points at subsequence boundaries.
//!    Only worker 0, which starts from the stream's true entry state, is
//!    guaranteed correct.
//! 2. **Repair**: workers whose boundary still disagrees with their
//!    predecessor re-decode from the predecessor's sync point until their
//!    own boundaries match what phase 1 stored. Correct boundaries spread
//!    rightward from worker 0; the sweep repeats until every worker has
//!    flagged itself synced.
//! 3. **Emit**: a prefix sum over the per-subsequence symbol counts gives
//!    each worker its output offset; all workers then re-decode and write
//!    symbols into disjoint ranges of the output buffer.
//!
//! Workers are scoped threads; the scope exit after each phase is the join
//! barrier that publishes one phase's writes to the next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::debug;

use crate::error::{TansyncError, TansyncResult};
use crate::intervals::plan_decoder_intervals;
use crate::kernel::{decode_chunk, ChunkContext, Phase, SyncCell, SyncPoint, MAX_SUBSEQUENCE_SIZE};
use crate::output::OutputBuffer;
use crate::stream::{CompressedStream, Symbol, UNIT_BITS};
use crate::table::DecoderTable;

/// Decoder tuning knobs.
///
/// `subsequence_size` trades synchronization overhead against load balance;
/// `num_threads` must not exceed the subsequence count of the stream being
/// decoded.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Units per subsequence; a positive multiple of 4.
    pub subsequence_size: usize,
    /// Worker thread count.
    pub num_threads: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            subsequence_size: 4,
            num_threads: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Post-decode diagnostics, mainly for tests and logging.
#[allow(dead_code)]
pub(crate) struct DecodeReport {
    pub repair_iterations: usize,
    pub sync_points: Vec<SyncPoint>,
    pub out_positions: Vec<usize>,
}

/// Decode `stream` into `out` using `table`.
///
/// `out` must be sized to the exact uncompressed symbol count. On error the
/// output buffer contents are unspecified. Symbols are produced in reverse
/// order relative to the original input; see [`OutputBuffer::reverse`].
pub fn decode(
    stream: &CompressedStream,
    table: &DecoderTable,
    out: &mut OutputBuffer,
    config: &DecoderConfig,
) -> TansyncResult<()> {
    decode_with_report(stream, table, out, config).map(|_| ())
}

pub(crate) fn decode_with_report(
    stream: &CompressedStream,
    table: &DecoderTable,
    out: &mut OutputBuffer,
    config: &DecoderConfig,
) -> TansyncResult<DecodeReport> {
    let subsequence_size = config.subsequence_size;
    let num_threads = config.num_threads;

    if subsequence_size == 0 || subsequence_size % 4 != 0 {
        return Err(TansyncError::config(format!(
            "subsequence size {} is not a positive multiple of 4",
            subsequence_size
        )));
    }
    if subsequence_size > MAX_SUBSEQUENCE_SIZE {
        return Err(TansyncError::config(format!(
            "subsequence size {} exceeds the supported maximum {}",
            subsequence_size, MAX_SUBSEQUENCE_SIZE
        )));
    }
    if num_threads == 0 {
        return Err(TansyncError::config("thread count must be at least 1"));
    }

    if out.uncompressed_size() == 0 {
        return Ok(DecodeReport {
            repair_iterations: 0,
            sync_points: Vec::new(),
            out_positions: Vec::new(),
        });
    }

    let num_units = stream.num_units();
    let num_subsequences = num_units.div_ceil(subsequence_size);
    if num_subsequences < num_threads {
        return Err(TansyncError::config(format!(
            "{} subsequences cannot feed {} threads",
            num_subsequences, num_threads
        )));
    }

    let num_states = table.num_states();
    if stream.first_state() < num_states || stream.first_state() >= 2 * num_states {
        return Err(TansyncError::corrupted(format!(
            "entry state {} outside [{}, {})",
            stream.first_state(),
            num_states,
            2 * num_states
        )));
    }
    if stream.first_bit() == 0 || stream.first_bit() > UNIT_BITS {
        return Err(TansyncError::corrupted(format!(
            "entry bit offset {} outside [1, {}]",
            stream.first_bit(),
            UNIT_BITS
        )));
    }

    let intervals = plan_decoder_intervals(subsequence_size, num_threads, num_units);
    let sync: Vec<SyncCell> = (0..num_subsequences).map(|_| SyncCell::new()).collect();
    let synced: Vec<AtomicBool> = (0..num_threads).map(|_| AtomicBool::new(false)).collect();

    let ctx = ChunkContext {
        units: stream.units(),
        num_units,
        table,
        sync: &sync,
        synced: &synced,
        subsequence_size,
        first_state: stream.first_state(),
        first_bit: stream.first_bit(),
    };

    // Phase 1: speculative full scan on every interval.
    thread::scope(|scope| {
        for (thread_id, interval) in intervals.iter().enumerate() {
            let ctx = &ctx;
            scope.spawn(move || decode_chunk(ctx, interval, thread_id, Phase::Speculate, &mut []));
        }
    });
    debug!(
        "speculative pass done: {} units, {} subsequences, {} threads",
        num_units, num_subsequences, num_threads
    );

    // Phase 2: repair until every worker's boundary matches its
    // predecessor. Boundary correctness propagates rightward from worker 0
    // in at most num_threads - 1 sweeps; a worker whose entries were
    // repaired in sweep k can first observe the match in sweep k + 1, hence
    // the extra sweep in the cap. Exceeding it means the stream (or its
    // entry state) is corrupt.
    let iteration_cap = num_threads.max(2);
    let mut repair_iterations = 0;
    loop {
        let pending: Vec<usize> = (1..num_threads)
            .filter(|&i| !synced[i].load(Ordering::Relaxed))
            .collect();
        if pending.is_empty() {
            break;
        }
        if repair_iterations == iteration_cap {
            return Err(TansyncError::corrupted(format!(
                "boundary repair did not converge within {} sweeps",
                iteration_cap
            )));
        }

        thread::scope(|scope| {
            for &thread_id in &pending {
                let ctx = &ctx;
                let interval = &intervals[thread_id];
                scope.spawn(move || decode_chunk(ctx, interval, thread_id, Phase::Repair, &mut []));
            }
        });
        repair_iterations += 1;
        debug!(
            "repair sweep {}: {} workers re-decoded",
            repair_iterations,
            pending.len()
        );
    }

    let out_positions = prefix_sum(&sync, num_subsequences, num_threads);
    verify_layout(&sync, &out_positions, out.uncompressed_size())?;

    // Phase 3: emit into disjoint output ranges.
    let slices = split_output(out.as_mut_slice(), &out_positions);
    thread::scope(|scope| {
        for (thread_id, (interval, slice)) in
            intervals.iter().zip(slices.into_iter()).enumerate()
        {
            let ctx = &ctx;
            scope.spawn(move || decode_chunk(ctx, interval, thread_id, Phase::Emit, slice));
        }
    });
    debug!("emit pass done after {} repair sweeps", repair_iterations);

    Ok(DecodeReport {
        repair_iterations,
        sync_points: sync.iter().map(SyncCell::snapshot).collect(),
        out_positions,
    })
}

/// Per-thread output start offsets: thread `i` begins after the symbols of
/// all subsequences owned by threads `0..i`. The grouping deliberately uses
/// `num_subsequences / num_threads`, ignoring the planner's extended final
/// interval: the last thread's extra subsequences simply run until the end
/// of the output buffer.
fn prefix_sum(sync: &[SyncCell], num_subsequences: usize, num_threads: usize) -> Vec<usize> {
    let per_thread = num_subsequences / num_threads;
    let mut positions = vec![0usize; num_threads];
    let mut sum = 0usize;
    let mut pos = 0usize;
    for i in 1..num_threads {
        let next = i * per_thread;
        while pos < next {
            sum += sync[pos].num_symbols() as usize;
            pos += 1;
        }
        positions[i] = sum;
    }
    positions
}

/// Terminal verification: a converged sync grid must describe an output
/// that fits the buffer exactly. The final subsequence's count is excluded
/// from the total, since the kernel keeps counting through the padding
/// after the real stream ends; the checks therefore bound rather than
/// equate.
fn verify_layout(
    sync: &[SyncCell],
    out_positions: &[usize],
    uncompressed_size: usize,
) -> TansyncResult<()> {
    let non_final: usize = sync[..sync.len() - 1]
        .iter()
        .map(|c| c.num_symbols() as usize)
        .sum();
    if non_final > uncompressed_size {
        return Err(TansyncError::underflow(format!(
            "{} symbols before the final subsequence exceed the declared output size {}",
            non_final, uncompressed_size
        )));
    }
    if let Some(&last) = out_positions.last() {
        if last > uncompressed_size {
            return Err(TansyncError::underflow(format!(
                "final thread would start writing at {} in a {}-symbol buffer",
                last, uncompressed_size
            )));
        }
    }
    Ok(())
}

/// Carve the output buffer into per-thread disjoint ranges.
fn split_output<'a>(mut out: &'a mut [Symbol], out_positions: &[usize]) -> Vec<&'a mut [Symbol]> {
    let total = out.len();
    let num_threads = out_positions.len();
    let mut slices = Vec::with_capacity(num_threads);
    for i in 0..num_threads {
        let end = if i + 1 < num_threads {
            out_positions[i + 1]
        } else {
            total
        };
        let (head, tail) = out.split_at_mut(end - out_positions[i]);
        slices.push(head);
        out = tail;
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(counts: &[u32]) -> Vec<SyncCell> {
        counts
            .iter()
            .map(|&n| {
                let cell = SyncCell::new();
                cell.set_num_symbols(n);
                cell
            })
            .collect()
    }

    #[test]
    fn test_prefix_sum_groups_by_thread() {
        // 6 subsequences over 2 threads: thread 1 starts after the first 3.
        let sync = cells(&[5, 7, 11, 13, 17, 19]);
        assert_eq!(prefix_sum(&sync, 6, 2), vec![0, 23]);
    }

    #[test]
    fn test_prefix_sum_ignores_remainder_subsequences() {
        // 7 subsequences over 3 threads: q = 2, the seventh subsequence
        // belongs to the last thread and never enters a start offset.
        let sync = cells(&[1, 2, 4, 8, 16, 32, 64]);
        assert_eq!(prefix_sum(&sync, 7, 3), vec![0, 3, 15]);
    }

    #[test]
    fn test_prefix_sum_single_thread() {
        let sync = cells(&[3, 9, 27]);
        assert_eq!(prefix_sum(&sync, 3, 1), vec![0]);
    }

    #[test]
    fn test_verify_layout_accepts_exact_fit() {
        let sync = cells(&[4, 4, 4, 4]);
        assert!(verify_layout(&sync, &[0, 8], 16).is_ok());
    }

    #[test]
    fn test_verify_layout_rejects_overrun() {
        let sync = cells(&[4, 4, 4, 4]);
        assert!(matches!(
            verify_layout(&sync, &[0, 8], 10),
            Err(TansyncError::BufferUnderflow(_))
        ));
    }

    #[test]
    fn test_split_output_is_disjoint_cover() {
        let mut buf = vec![0u8; 10];
        let slices = split_output(&mut buf, &[0, 4, 7]);
        let lens: Vec<usize> = slices.iter().map(|s| s.len()).collect();
        assert_eq!(lens, vec![4, 3, 3]);
    }
}
