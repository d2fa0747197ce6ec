//! Small-modulus number theory used by the key exchange.
//!
//! The exchange works over primes below 5000, so trial division and a
//! straightforward square-and-multiply are all that is needed.

/// Computes `base ^ exp (mod modulus)` without overflow.
///
/// Intermediate products are held in `u128`, which is exact for any `u64`
/// modulus. A modulus of zero or one yields zero.
pub fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus <= 1 {
        return 0;
    }
    let m = modulus as u128;
    let mut result: u128 = 1;
    let mut acc = base as u128 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * acc % m;
        }
        acc = acc * acc % m;
        exp >>= 1;
    }
    result as u64
}

/// Primality test by trial division.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Returns the distinct prime factors of `n` in increasing order.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            factors.push(d);
            while n % d == 0 {
                n /= d;
            }
        }
        d += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Finds the smallest primitive root modulo the prime `p`.
///
/// `g` generates the multiplicative group when `g^((p-1)/q) != 1` for every
/// prime factor `q` of `p - 1`. Returns `None` when `p` is not an odd prime
/// greater than two, except for `p = 2` where the root is 1.
pub fn primitive_root(p: u64) -> Option<u64> {
    if p == 2 {
        return Some(1);
    }
    if !is_prime(p) {
        return None;
    }
    let phi = p - 1;
    let factors = prime_factors(phi);
    (2..p).find(|&g| factors.iter().all(|&q| mod_pow(g, phi / q, p) != 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_pow_known_values() {
        assert_eq!(mod_pow(3, 4, 5), 1);
        assert_eq!(mod_pow(2, 10, 1000), 24);
        assert_eq!(mod_pow(7, 0, 13), 1);
        assert_eq!(mod_pow(0, 5, 13), 0);
    }

    #[test]
    fn test_mod_pow_degenerate_modulus() {
        assert_eq!(mod_pow(5, 3, 0), 0);
        assert_eq!(mod_pow(5, 3, 1), 0);
    }

    #[test]
    fn test_mod_pow_large_operands() {
        // Squares of values near u64::MAX would overflow without u128.
        let p = 4999;
        assert_eq!(mod_pow(u64::MAX, 2, p), (u128::from(u64::MAX).pow(2) % u128::from(p)) as u64);
    }

    #[test]
    fn test_is_prime() {
        let primes = [2, 3, 5, 7, 11, 13, 4999];
        for p in primes {
            assert!(is_prime(p), "{p} should be prime");
        }
        let composites = [0, 1, 4, 9, 15, 49, 5000];
        for c in composites {
            assert!(!is_prime(c), "{c} should not be prime");
        }
    }

    #[test]
    fn test_prime_factors_distinct() {
        assert_eq!(prime_factors(12), vec![2, 3]);
        assert_eq!(prime_factors(17), vec![17]);
        assert_eq!(prime_factors(360), vec![2, 3, 5]);
        assert_eq!(prime_factors(1), Vec::<u64>::new());
    }

    #[test]
    fn test_primitive_root_known_values() {
        assert_eq!(primitive_root(2), Some(1));
        assert_eq!(primitive_root(3), Some(2));
        assert_eq!(primitive_root(7), Some(3));
        assert_eq!(primitive_root(11), Some(2));
        assert_eq!(primitive_root(23), Some(5));
    }

    #[test]
    fn test_primitive_root_rejects_composite() {
        assert_eq!(primitive_root(8), None);
    }

    #[test]
    fn test_primitive_root_generates_group() {
        let p = 103;
        let g = primitive_root(p).unwrap();
        let mut seen = std::collections::HashSet::new();
        for k in 1..p {
            seen.insert(mod_pow(g, k, p));
        }
        assert_eq!(seen.len() as u64, p - 1);
    }
}
