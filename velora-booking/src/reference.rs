use rand::Rng;
use velora_catalog::ResourceKind;

const CODE_LENGTH: usize = 8;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Two-letter tag prefixed to every booking reference.
pub fn kind_tag(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Flight => "FL",
        ResourceKind::Yacht => "YC",
        ResourceKind::Car => "CR",
        ResourceKind::HotelRoom => "HT",
    }
}

/// Generate a candidate booking reference: kind tag + 8 base-36 characters.
///
/// Uniqueness is NOT guaranteed here; the caller checks the candidate
/// against existing references and regenerates on collision.
pub fn generate(kind: ResourceKind) -> String {
    generate_with(kind, &mut rand::thread_rng())
}

pub fn generate_with<R: Rng>(kind: ResourceKind, rng: &mut R) -> String {
    let mut code = String::with_capacity(2 + CODE_LENGTH);
    code.push_str(kind_tag(kind));
    for _ in 0..CODE_LENGTH {
        let idx = rng.gen_range(0..CHARSET.len());
        code.push(CHARSET[idx] as char);
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reference_shape() {
        let code = generate(ResourceKind::Flight);
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("FL"));
        assert!(code[2..].bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn test_tags_are_distinct_per_kind() {
        let tags = [
            kind_tag(ResourceKind::Flight),
            kind_tag(ResourceKind::Yacht),
            kind_tag(ResourceKind::Car),
            kind_tag(ResourceKind::HotelRoom),
        ];
        let unique: std::collections::HashSet<_> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let a = generate_with(ResourceKind::Yacht, &mut StdRng::seed_from_u64(7));
        let b = generate_with(ResourceKind::Yacht, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);

        let c = generate_with(ResourceKind::Yacht, &mut StdRng::seed_from_u64(8));
        assert_ne!(a, c);
    }

    #[test]
    fn test_codes_spread_across_the_space() {
        let mut rng = StdRng::seed_from_u64(42);
        let codes: std::collections::HashSet<String> =
            (0..1000).map(|_| generate_with(ResourceKind::Car, &mut rng)).collect();
        assert_eq!(codes.len(), 1000);
    }
}
