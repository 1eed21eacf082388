/// Authentication primitives for TiK
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing capability
/// - [`jwt`]: HS256 access token generation and validation
///
/// # Example
///
/// ```
/// use tik_shared::auth::jwt::{create_token, validate_token, Claims};
/// use tik_shared::auth::password::PasswordHasher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(1024)?;
/// let hash = hasher.hash("SecurePass123")?;
/// assert!(hasher.verify("SecurePass123", &hash)?);
///
/// let secret = "a-secret-key-that-is-at-least-32-bytes";
/// let token = create_token(&Claims::new("johndoe"), secret)?;
/// assert_eq!(validate_token(&token, secret)?.sub, "johndoe");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
