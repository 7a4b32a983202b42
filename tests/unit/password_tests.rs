use backend_lib::auth::{checksum, hasher_for, CredentialHasher, PasswordScheme, ScryptHasher};

#[test]
fn test_checksum_matches_legacy_hashes() {
    // values produced by accounts created before scrypt
    assert_eq!(checksum("pwd007").to_string(), "-975576614");
    assert_eq!(checksum("pw1").to_string(), "111370");
}

#[test]
fn test_password_hashing_and_verification() {
    let hasher = ScryptHasher::new(4).unwrap();
    let password = "SecureP@ssw0rd";
    let hash = hasher.hash(password).unwrap();

    assert_ne!(password, hash);
    assert!(hasher.verify(&hash, password));
    assert!(!hasher.verify(&hash, "securep@ssw0rd"));
}

#[test]
fn test_schemes_do_not_cross_verify() {
    let scrypt = hasher_for(PasswordScheme::Scrypt, 4).unwrap();
    let legacy = hasher_for(PasswordScheme::Checksum, 4).unwrap();

    let scrypt_hash = scrypt.hash("pw1").unwrap();
    let legacy_hash = legacy.hash("pw1").unwrap();

    assert!(!scrypt.verify(&legacy_hash, "pw1"));
    assert!(!legacy.verify(&scrypt_hash, "pw1"));
}
