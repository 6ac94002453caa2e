// mulberry32; the state is part of a session snapshot so random selectors replay identically.
pub(super) fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

/// Uniform index in `0..len` without modulo bias. `len` must be non-zero.
pub(super) fn random_index(state: &mut u32, len: usize) -> usize {
    let bound = u32::try_from(len).unwrap_or(u32::MAX).max(1);
    random_index_with(state, bound, next_random_u32) as usize
}

fn random_index_with<F>(state: &mut u32, bound: u32, mut next: F) -> u32
where
    F: FnMut(&mut u32) -> u32,
{
    let threshold = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    let mut candidate = next(state);
    while u64::from(candidate) >= threshold {
        candidate = next(state);
    }
    candidate % bound
}
