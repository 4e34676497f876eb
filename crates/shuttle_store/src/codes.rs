use rand::Rng;

/// Uppercase letters and digits without the easily confused `0 O 1 I`.
pub const TRIP_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const TRIP_CODE_LEN: usize = 6;

/// Attempts made to find an unused code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 32;

pub fn generate_trip_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TRIP_CODE_LEN)
        .map(|_| TRIP_CODE_ALPHABET[rng.gen_range(0..TRIP_CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_use_the_unambiguous_alphabet() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let code = generate_trip_code(&mut rng);
            assert_eq!(code.len(), TRIP_CODE_LEN);
            assert!(code.bytes().all(|b| TRIP_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_trip_code(&mut StdRng::seed_from_u64(9));
        let b = generate_trip_code(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
