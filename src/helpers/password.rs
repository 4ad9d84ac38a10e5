use anyhow::Context;

// Work factor the user store was written with; changing it only affects new
// hashes, verification reads the factor from the stored hash.
const COST: u32 = 10;

pub fn hash(plain: &str) -> anyhow::Result<String> {
    bcrypt::hash(plain, COST).context("hashing password")
}

/// A malformed stored hash verifies as false rather than erroring; login
/// treats both the same way.
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hashed = hash("hunter2").unwrap();
        assert!(verify("hunter2", &hashed));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hashed = hash("hunter2").unwrap();
        assert!(!verify("hunter3", &hashed));
        assert!(!verify("", &hashed));
    }

    #[test]
    fn garbage_hash_fails_verification() {
        assert!(!verify("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("hunter2").unwrap();
        let b = hash("hunter2").unwrap();
        assert_ne!(a, b);
    }
}
