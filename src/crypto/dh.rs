//! Diffie-Hellman key exchange over small primes.
//!
//! The exchange is split across the three relay messages: we open by
//! publishing `(p, g)`, answer the peer's partial key with our own while
//! deriving the shared secret, and finally confirm the secret in clear.
//! Clear-text confirmation is part of the exercise; nothing here is meant
//! to withstand an eavesdropper.

use rand::Rng;

use super::numeric::{is_prime, mod_pow, primitive_root};

/// Upper bound (exclusive) for the generated prime.
const PRIME_CEILING: u64 = 5000;

/// Result of answering the peer's partial key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhResponse {
    /// Our partial key `g^b mod p`, to send to the peer.
    pub own_partial: u64,
    /// The derived shared secret `peer_partial^b mod p`.
    pub shared: u64,
}

/// Picks the public parameters for a fresh exchange.
///
/// Returns a uniformly chosen prime `p` below [`PRIME_CEILING`] together
/// with its smallest primitive root.
pub fn generate_parameters() -> (u64, u64) {
    let mut rng = rand::thread_rng();
    let primes: Vec<u64> = (3..PRIME_CEILING).filter(|&n| is_prime(n)).collect();
    loop {
        let p = primes[rng.gen_range(0..primes.len())];
        if let Some(g) = primitive_root(p) {
            return (p, g);
        }
    }
}

/// Answers the peer's partial key with a random private exponent.
///
/// # Arguments
/// * `peer_partial` - The peer's `g^a mod p`
/// * `p` - Agreed prime modulus
/// * `g` - Agreed generator
///
/// # Returns
/// Our partial key and the shared secret derived from the peer's.
pub fn respond(peer_partial: u64, p: u64, g: u64) -> DhResponse {
    let mut rng = rand::thread_rng();
    let b = rng.gen_range(2..50);
    DhResponse {
        own_partial: mod_pow(g, b, p),
        shared: mod_pow(peer_partial, b, p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::numeric::prime_factors;

    #[test]
    fn test_generate_parameters_valid() {
        for _ in 0..5 {
            let (p, g) = generate_parameters();
            assert!((3..PRIME_CEILING).contains(&p));
            assert!(is_prime(p));
            assert_eq!(Some(g), primitive_root(p));

            let phi = p - 1;
            for q in prime_factors(phi) {
                assert_ne!(mod_pow(g, phi / q, p), 1);
            }
        }
    }

    #[test]
    fn test_respond_agrees_with_peer() {
        let (p, g) = (23, 5);
        let a = 6;
        let peer_partial = mod_pow(g, a, p);

        let response = respond(peer_partial, p, g);

        // The peer derives the secret from our partial key with their own
        // exponent; both sides must land on g^(a*b).
        let peer_shared = mod_pow(response.own_partial, a, p);
        assert_eq!(peer_shared, response.shared);
    }

    #[test]
    fn test_respond_with_generated_parameters() {
        for _ in 0..5 {
            let (p, g) = generate_parameters();
            let a = 13;
            let peer_partial = mod_pow(g, a, p);

            let response = respond(peer_partial, p, g);
            assert!(response.own_partial < p);
            assert_eq!(mod_pow(response.own_partial, a, p), response.shared);
        }
    }
}
