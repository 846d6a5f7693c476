use argon2::{password_hash::Output, Argon2};
use uuid::Uuid;

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the principal's id as the salt.
pub fn hash(hasher: &Argon2, password: &str, id: &Uuid) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Returns `true` if `password` hashes to `expected` for this principal.
///
/// The hashes are compared in constant time. A stored hash of the wrong
/// length never matches.
pub fn verify(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
	expected: &[u8],
) -> Result<bool, argon2::Error> {
	let actual = hash(hasher, password, id)?;

	let (Ok(actual), Ok(expected)) = (Output::new(&actual), Output::new(expected)) else {
		return Ok(false);
	};

	Ok(actual == expected)
}
