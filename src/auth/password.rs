//! bcrypt hashing, run on the blocking pool

use crate::error::ApiError;

/// Hash a plain-text password with the given work factor
pub async fn hash(plain: String, cost: u32) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hashed)
}

/// Compare a plain-text password with a stored hash.
///
/// A stored value that is not a bcrypt hash never verifies.
pub async fn verify(plain: String, hashed: String) -> Result<bool, ApiError> {
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed).unwrap_or(false)).await?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash("secret".to_string(), 4).await.unwrap();
        assert!(verify("secret".to_string(), hashed.clone()).await.unwrap());
        assert!(!verify("wrong".to_string(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_does_not_verify() {
        assert!(!verify("secret".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}
