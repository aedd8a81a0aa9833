// utils/invite.rs
use rand::distr::Alphanumeric;
use rand::Rng;

/// Generate an opaque alphanumeric token for invitation links.
pub fn generate_invite_token() -> String {
    let mut rng = rand::rng();
    (0..32).map(|_| rng.sample(Alphanumeric) as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_invite_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
