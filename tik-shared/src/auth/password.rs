/// Password hashing using Argon2id
///
/// [`PasswordHasher`] is a small capability object: the API builds one at
/// startup from configuration and hands it to the handlers that create users,
/// change passwords or check credentials. Nothing else in the system sees a
/// plaintext password.
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: configurable, 64 MB (65536 KiB) by default
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Verification reads the parameters embedded in the stored hash, so hashes
/// created with a different memory cost keep verifying after a config change.
///
/// # Example
///
/// ```
/// use tik_shared::auth::password::PasswordHasher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = PasswordHasher::new(1024)?;
/// let hash = hasher.hash("SecurePass123")?;
///
/// assert!(hasher.verify("SecurePass123", &hash)?);
/// assert!(!hasher.verify("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

/// Memory cost used in production, in KiB
pub const DEFAULT_MEMORY_KIB: u32 = 65536;

const ITERATIONS: u32 = 3;
const PARALLELISM: u32 = 4;
const OUTPUT_LEN: usize = 32;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Hashing parameters were rejected
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes and verifies passwords with fixed Argon2id parameters
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    memory_kib: u32,
}

impl PasswordHasher {
    /// Creates a hasher with the given memory cost
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if the memory cost is below the
    /// Argon2 minimum for four lanes (32 KiB).
    pub fn new(memory_kib: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, ITERATIONS, PARALLELISM, Some(OUTPUT_LEN))
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            memory_kib,
        })
    }

    /// Memory cost this hasher was built with, in KiB
    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    /// Hashes a password with a fresh random salt
    ///
    /// # Returns
    ///
    /// PHC string format hash (algorithm, parameters, salt and hash), e.g.
    ///
    /// ```text
    /// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored hash in constant time
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("memory_kib", &self.memory_kib)
            .finish()
    }
}
