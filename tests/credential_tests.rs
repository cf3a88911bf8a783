//! # 密码哈希集成测试

mod common;

use common::Suite;
use portal_auth::auth::PasswordHasher;
use rstest::rstest;

#[rstest]
#[case("Passw0rd")]
#[case("密码长度正好八个")]
#[case("  spaces  ")]
#[tokio::test]
async fn test_hash_roundtrip(#[case] plaintext: &str) {
    let hasher = PasswordHasher::new(4, 2);
    let digest = hasher.hash(plaintext).await.unwrap();

    assert!(hasher.verify(plaintext, &digest).await.unwrap());
    assert!(!hasher.verify(&format!("{plaintext}x"), &digest).await.unwrap());
}

#[tokio::test]
async fn test_stored_credential_never_plaintext() {
    let suite = Suite::setup().await;
    let users = suite.core.users();

    let user = users.create_user("frank", "Passw0rd", None).await.unwrap();
    assert!(user.hashed_psw.starts_with("$2"));
    assert!(!user.hashed_psw.contains("Passw0rd"));
    assert!(!suite.core.hasher().needs_rehash(&user.hashed_psw));

    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("hashed_psw"));
}

#[tokio::test]
async fn test_only_exact_plaintext_verifies_past_72_bytes() {
    let hasher = PasswordHasher::new(4, 1);
    let plaintext = "x".repeat(72);
    let digest = hasher.hash(&plaintext).await.unwrap();

    for suffix in ["", "y", "yyyyyyyy"] {
        let candidate = format!("{plaintext}{suffix}");
        assert_eq!(
            hasher.verify(&candidate, &digest).await.unwrap(),
            suffix.is_empty()
        );
    }
    assert!(hasher.hash(&format!("{plaintext}y")).await.is_err());
}
