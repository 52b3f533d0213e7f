//! numpy-flavoured numeric helpers shared by every backend.

mod convolve;

pub use convolve::*;

/// Smallest length `>= n` whose only prime factors are 2, 3 and 5.
///
/// Transforms of these lengths take the fast radix paths in `rustfft`.
pub fn next_fast_len(n: usize) -> usize {
    if n <= 6 {
        return n.max(1);
    }
    let mut best = n.next_power_of_two();
    let mut p5 = 1usize;
    while p5 < best {
        let mut p35 = p5;
        while p35 < best {
            // Smallest power of two lifting p35 to at least n.
            let mut quotient = n.div_ceil(p35);
            quotient = quotient.next_power_of_two();
            let candidate = p35 * quotient;
            if candidate < best {
                best = candidate;
            }
            if p35 >= n {
                break;
            }
            p35 *= 3;
        }
        if p5 >= n {
            break;
        }
        p5 *= 5;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::next_fast_len;

    #[test]
    fn fast_lengths_are_five_smooth() {
        assert_eq!(next_fast_len(1), 1);
        assert_eq!(next_fast_len(7), 8);
        assert_eq!(next_fast_len(11), 12);
        assert_eq!(next_fast_len(13), 15);
        assert_eq!(next_fast_len(1021), 1024);
        assert_eq!(next_fast_len(1025), 1080);
        assert_eq!(next_fast_len(8191 + 124), 8640);
    }

    #[test]
    fn fast_length_is_never_shorter() {
        for n in 1..2000 {
            let m = next_fast_len(n);
            assert!(m >= n);
            let mut r = m;
            for p in [2, 3, 5] {
                while r % p == 0 {
                    r /= p;
                }
            }
            assert_eq!(r, 1, "{m} is not 5-smooth");
        }
    }
}
