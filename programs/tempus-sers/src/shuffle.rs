//! Seeded bijective index shuffle for ticket -> token id assignment.
//!
//! Based on Andrew Kensler's hash-based cycle-walking permutation
//! ("Correlated Multi-Jittered Sampling", Pixar tech memo 13-01). The mixing
//! rounds form a bijection over the next power of two above `length`;
//! out-of-range intermediates are walked back through the rounds until they
//! land inside `[0, length)`, so the function is a total bijection for any
//! length, not just powers of two. The walk is bounded: the masked domain is
//! less than `2 * length`, so the expected iteration count is under two.

/// Map `index` to its shuffled position in `[0, length)` for a fixed
/// `(length, seed)` pair.
///
/// Pure and deterministic: recomputing the mapping always yields the same
/// result. Callers must never invoke this out of range; violations are logic
/// defects, not user errors, and abort immediately.
///
/// # Panics
///
/// Panics if `length == 0` or `index >= length`.
pub fn permute(index: u32, length: u32, seed: u32) -> u32 {
    assert!(length > 0, "permute: zero length");
    assert!(index < length, "permute: index out of range");

    let mut w = length - 1;
    w |= w >> 1;
    w |= w >> 2;
    w |= w >> 4;
    w |= w >> 8;
    w |= w >> 16;

    let mut i = index;
    loop {
        i ^= seed;
        i = i.wrapping_mul(0xe170893d);
        i ^= seed >> 16;
        i ^= (i & w) >> 4;
        i ^= seed >> 8;
        i = i.wrapping_mul(0x0929eb3f);
        i ^= seed >> 23;
        i ^= (i & w) >> 1;
        i = i.wrapping_mul(1 | seed >> 27);
        i = i.wrapping_mul(0x6935fa69);
        i ^= (i & w) >> 11;
        i = i.wrapping_mul(0x74dcca23);
        i ^= seed >> 2;
        i = i.wrapping_mul(0x9e501cc3);
        i ^= (i & w) >> 2;
        i = i.wrapping_mul(0xc860a3df);
        i &= w;
        i ^= i >> 5;
        if i < length {
            break;
        }
    }
    // The final rotation must happen mod `length`, not mod 2^32: widen so a
    // seed near u32::MAX cannot wrap the sum and break the bijection.
    (((i as u64) + (seed as u64)) % (length as u64)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bijection(length: u32, seed: u32) {
        let mut seen = vec![false; length as usize];
        for i in 0..length {
            let out = permute(i, length, seed);
            assert!(out < length, "out of range for l={} s={}", length, seed);
            assert!(
                !seen[out as usize],
                "collision at i={} l={} s={}",
                i, length, seed
            );
            seen[out as usize] = true;
        }
        assert!(seen.iter().all(|&v| v));
    }

    #[test]
    fn bijection_over_assorted_lengths() {
        for &length in &[1u32, 2, 3, 3333, 11111] {
            for &seed in &[0u32, 1, 0x2a, 0xdead_beef, 0xffff_ffff] {
                assert_bijection(length, seed);
            }
        }
    }

    #[test]
    fn deterministic() {
        for &(i, l, s) in &[(0u32, 11111u32, 1u32), (42, 3333, 7), (1, 2, 99)] {
            assert_eq!(permute(i, l, s), permute(i, l, s));
        }
    }

    #[test]
    fn reference_vectors() {
        assert_eq!(permute(1, 0xffff_ffff, 0), 1_361_518_847);
        assert_eq!(permute(1, 0xffff_ffff, 0xffff_ffff), 2_632_581_475);
        assert_eq!(permute(0, 0xffff_ffff, 0), 0);
        assert_eq!(permute(1, 11111, 0x2a), 2599);
        assert_eq!(permute(5, 11111, 0xdead_beef), 7528);
        assert_eq!(permute(42, 3333, 7), 755);
    }

    #[test]
    fn length_one_is_identity() {
        for &seed in &[0u32, 7, 0xffff_ffff] {
            assert_eq!(permute(0, 1, seed), 0);
        }
    }

    #[test]
    fn length_two_covers_both_outputs() {
        for &seed in &[0u32, 5, 9, 0xdead_beef] {
            let mut outs = [permute(0, 2, seed), permute(1, 2, seed)];
            outs.sort_unstable();
            assert_eq!(outs, [0, 1]);
        }
    }

    #[test]
    fn high_seed_rotation_stays_bijective() {
        // Seeds within `length` of u32::MAX overflow a 32-bit rotation sum;
        // the widened rotation must keep the mapping collision-free.
        for &length in &[2u32, 3, 5, 3333] {
            for &seed in &[u32::MAX, u32::MAX - 1, u32::MAX - 7] {
                assert_bijection(length, seed);
            }
        }
    }

    #[test]
    #[should_panic(expected = "zero length")]
    fn zero_length_panics() {
        permute(0, 0, 1);
    }

    #[test]
    #[should_panic(expected = "index out of range")]
    fn out_of_range_index_panics() {
        permute(7, 7, 0);
    }

    #[test]
    fn no_visible_clustering() {
        // Adjacent tickets should not map to adjacent tokens as a rule.
        let length = 11111;
        let mut adjacent = 0;
        for i in 0..length - 1 {
            let a = permute(i, length, 1);
            let b = permute(i + 1, length, 1);
            if a.abs_diff(b) == 1 {
                adjacent += 1;
            }
        }
        // A random permutation keeps this near 2, leave generous slack.
        assert!(adjacent < 64, "suspicious clustering: {}", adjacent);
    }
}
