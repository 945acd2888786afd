//! Interval planner: split the subsequence grid across worker threads.

/// Half-open unit range `[begin, end)` owned by one worker, plus the index
/// of the first subsequence inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DecoderInterval {
    pub begin: usize,
    pub end: usize,
    pub sub: usize,
}

/// Partition `num_units` into `num_threads` contiguous spans of whole
/// subsequences. Every thread gets `num_subsequences / num_threads`
/// subsequences; the remainder is folded into the last interval, whose end
/// may extend past `num_units` (the kernel treats units beyond the stream
/// as zero).
pub(crate) fn plan_decoder_intervals(
    subsequence_size: usize,
    num_threads: usize,
    num_units: usize,
) -> Vec<DecoderInterval> {
    let num_subsequences = num_units.div_ceil(subsequence_size);
    debug_assert!(num_subsequences >= num_threads);

    let per_thread = num_subsequences / num_threads;
    let remainder = num_subsequences % num_threads;
    let span = per_thread * subsequence_size;

    let mut intervals = Vec::with_capacity(num_threads);
    let mut at = 0;
    for i in 0..num_threads {
        intervals.push(DecoderInterval {
            begin: at,
            end: at + span,
            sub: per_thread * i,
        });
        at += span;
    }
    intervals
        .last_mut()
        .expect("at least one interval")
        .end += remainder * subsequence_size;

    intervals
}
