use anyhow::{anyhow, Context};
use bookshelf_kernel::settings::AuthSettings;

/// Salted one-way password hashing with a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> anyhow::Result<Self> {
        if !(AuthSettings::MIN_BCRYPT_COST..=AuthSettings::MAX_BCRYPT_COST).contains(&cost) {
            return Err(anyhow!("unsupported bcrypt cost {cost}"));
        }
        Ok(Self { cost })
    }

    pub fn from_settings(settings: &AuthSettings) -> anyhow::Result<Self> {
        Self::new(settings.bcrypt_cost)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plain` on the blocking pool.
    pub async fn hash(&self, plain: String) -> anyhow::Result<String> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_costs_bcrypt_cannot_use() {
        assert!(PasswordHasher::new(3).is_err());
        assert!(PasswordHasher::new(32).is_err());
        assert_eq!(PasswordHasher::new(10).unwrap().cost(), 10);
    }

    #[tokio::test]
    async fn hashes_are_salted_and_verifiable() {
        let hasher = PasswordHasher::new(4).unwrap();
        let first = hasher.hash("s3cret".to_string()).await.unwrap();
        let second = hasher.hash("s3cret".to_string()).await.unwrap();

        assert_ne!(first, "s3cret");
        assert_ne!(first, second);
        assert!(first.starts_with("$2b$04$"));
        assert!(bcrypt::verify("s3cret", &first).unwrap());
        assert!(!bcrypt::verify("other", &second).unwrap());
    }
}
