//! Remote JWKS integration tests
//!
//! These tests serve a key set from a local mockito server and verify tokens
//! signed with freshly generated keys through the full verifier.

mod common;

use common::{AUDIENCE, ISSUER, Signer, TokenBuilder, jwks, now};
use jwkguard::appcheck::{AppCheckVerifier, firebase_app_check};
use jwkguard::{
    AlgorithmPolicy, ClaimsValidation, Error, RemoteKeySet, RemoteKeySetOptions, ReqwestClient,
    StandardClaims, TokenVerifier, VerifierConfig,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn verifier(url: &str, options: RemoteKeySetOptions, policy: AlgorithmPolicy) -> TokenVerifier {
    let client = Arc::new(ReqwestClient::new().unwrap());
    let keys = RemoteKeySet::new(url, client, options).unwrap();
    TokenVerifier::new(keys)
        .algorithms(policy)
        .validate(
            ClaimsValidation::new()
                .token_type("JWT")
                .audience(AUDIENCE)
                .issuer(ISSUER),
        )
        .build()
}

fn no_cooldown() -> RemoteKeySetOptions {
    RemoteKeySetOptions {
        cooldown: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_rs256_token_single_fetch() {
    let signer = Signer::rsa();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(jwks(&[signer.jwk("k1")]))
        .expect(1)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::rs256_only(),
    );
    let token = TokenBuilder::new("RS256", "k1").sign(&signer);

    for _ in 0..3 {
        let claims = verifier.verify(&token).await.expect("token should verify");
        assert_eq!(claims.subject(), Some("app-1"));
        assert_eq!(claims.audience(), vec![AUDIENCE]);
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_kid_within_cooldown_fetches_once() {
    let signer = Signer::rsa();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[signer.jwk("k1")]))
        .expect(1)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::rs256_only(),
    );

    let known = TokenBuilder::new("RS256", "k1").sign(&signer);
    verifier.verify(&known).await.unwrap();

    let unknown = TokenBuilder::new("RS256", "k2").sign(&signer);
    assert_eq!(verifier.verify(&unknown).await.unwrap_err(), Error::NoMatchingKey);
    assert!(!verifier.verify_token(&unknown).await);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_kid_forces_single_reload() {
    let signer = Signer::rsa();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[signer.jwk("k1")]))
        .expect(2)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        no_cooldown(),
        AlgorithmPolicy::rs256_only(),
    );
    let token = TokenBuilder::new("RS256", "k2").sign(&signer);

    assert_eq!(verifier.verify(&token).await.unwrap_err(), Error::NoMatchingKey);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rotated_key_picked_up_by_reload() {
    let old = Signer::rsa();
    let new = Signer::es256();
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[old.jwk("old")]))
        .expect(1)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        no_cooldown(),
        AlgorithmPolicy::allow_only(vec![
            jwkguard::AlgorithmType::RS256,
            jwkguard::AlgorithmType::ES256,
        ]),
    );
    verifier
        .verify(&TokenBuilder::new("RS256", "old").sign(&old))
        .await
        .unwrap();
    first.assert_async().await;
    first.remove_async().await;

    let second = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[old.jwk("old"), new.jwk("new")]))
        .expect(1)
        .create_async()
        .await;

    let claims = verifier
        .verify(&TokenBuilder::new("ES256", "new").sign(&new))
        .await
        .unwrap();
    assert_eq!(claims.issuer(), Some(ISSUER));
    second.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_verifications_share_fetch() {
    let signer = Signer::es256();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[signer.jwk("k1")]))
        .expect(1)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::es256_only(),
    );
    let token = TokenBuilder::new("ES256", "k1").sign(&signer);

    let results = futures::future::join_all((0..50).map(|_| verifier.verify(&token))).await;

    assert!(results.iter().all(Result::is_ok));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ambiguous_key_set() {
    let signer = Signer::rsa();
    let mut jwk = signer.jwk("k1");
    jwk.as_object_mut().unwrap().remove("use");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[jwk.clone(), jwk]))
        .expect(1)
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        no_cooldown(),
        AlgorithmPolicy::rs256_only(),
    );
    let token = TokenBuilder::new("RS256", "k1").sign(&signer);

    assert_eq!(
        verifier.verify(&token).await.unwrap_err(),
        Error::MultipleMatchingKeys { count: 2 }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_failures() {
    let signer = Signer::ed25519();
    let token = TokenBuilder::new("EdDSA", "k1").sign(&signer);
    let mut server = mockito::Server::new_async().await;

    let _not_found = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/broken")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;
    let _wrong_shape = server
        .mock("GET", "/shape")
        .with_status(200)
        .with_body(r#"{"keys":[{"kty":"OKP"}, 42]}"#)
        .create_async()
        .await;

    let url = |path: &str| format!("{}{path}", server.url());

    let missing = verifier(&url("/missing"), Default::default(), AlgorithmPolicy::eddsa_only());
    assert_eq!(
        missing.verify(&token).await.unwrap_err(),
        Error::FetchFailed("http: status 404".into())
    );

    let broken = verifier(&url("/broken"), Default::default(), AlgorithmPolicy::eddsa_only());
    assert!(matches!(
        broken.verify(&token).await,
        Err(Error::KeySetInvalid(_))
    ));

    let shape = verifier(&url("/shape"), Default::default(), AlgorithmPolicy::eddsa_only());
    assert!(matches!(
        shape.verify(&token).await,
        Err(Error::KeySetInvalid(_))
    ));
}

#[tokio::test]
async fn test_wrong_typed_entry_is_skipped() {
    let signer = Signer::rsa();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[
            signer.jwk("k1"),
            json!({"kty": "RSA", "kid": 7}),
            json!({"kty": "RSA", "kid": "k1", "key_ops": "verify"}),
        ]))
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::rs256_only(),
    );
    let token = TokenBuilder::new("RS256", "k1").sign(&signer);

    verifier.verify(&token).await.expect("valid key still verifies");
}

#[tokio::test]
async fn test_unusable_key_material_is_key_set_fault() {
    let signer = Signer::es256();
    let mut jwk = signer.jwk("ec");
    // same width as a real coordinate, but the point is not on P-256
    jwk["y"] = json!("AgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgI");

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[jwk]))
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::allow_only(vec![jwkguard::AlgorithmType::ES256]),
    );
    let token = TokenBuilder::new("ES256", "ec").sign(&signer);

    assert!(matches!(
        verifier.verify(&token).await,
        Err(Error::KeySetInvalid(_))
    ));
}

#[tokio::test]
async fn test_pss_and_eddsa_tokens() {
    let rsa = Signer::rsa();
    let ed = Signer::ed25519();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[rsa.jwk("rsa"), ed.jwk("ed")]))
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::allow_only(vec![
            jwkguard::AlgorithmType::PS256,
            jwkguard::AlgorithmType::EdDSA,
        ]),
    );

    verifier
        .verify(&TokenBuilder::new("PS256", "rsa").sign(&rsa))
        .await
        .unwrap();
    verifier
        .verify(&TokenBuilder::new("EdDSA", "ed").sign(&ed))
        .await
        .unwrap();

    // RS256 is not allowed even though the key would verify it
    assert!(matches!(
        verifier
            .verify(&TokenBuilder::new("RS256", "rsa").sign(&rsa))
            .await,
        Err(Error::AlgorithmNotAllowed { .. })
    ));
}

#[tokio::test]
async fn test_claim_failures() {
    let signer = Signer::es256();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/jwks")
        .with_status(200)
        .with_body(jwks(&[signer.jwk("k1")]))
        .create_async()
        .await;

    let verifier = verifier(
        &format!("{}/jwks", server.url()),
        Default::default(),
        AlgorithmPolicy::es256_only(),
    );
    let claim_error = |result: jwkguard::Result<_>| match result {
        Err(Error::ClaimInvalid { claim, .. }) => claim,
        other => panic!("expected claim error, got {other:?}"),
    };

    let expired = TokenBuilder::new("ES256", "k1")
        .claim("exp", json!(now() - 60))
        .sign(&signer);
    assert_eq!(claim_error(verifier.verify(&expired).await), "exp");

    let early = TokenBuilder::new("ES256", "k1")
        .claim("nbf", json!(now() + 600))
        .sign(&signer);
    assert_eq!(claim_error(verifier.verify(&early).await), "nbf");

    let wrong_audience = TokenBuilder::new("ES256", "k1")
        .claim("aud", json!(["projects/999"]))
        .sign(&signer);
    assert_eq!(claim_error(verifier.verify(&wrong_audience).await), "aud");

    let wrong_issuer = TokenBuilder::new("ES256", "k1")
        .claim("iss", json!("https://evil.example/123456"))
        .sign(&signer);
    assert_eq!(claim_error(verifier.verify(&wrong_issuer).await), "iss");

    let wrong_type = TokenBuilder::new("ES256", "k1")
        .header("typ", json!("at+jwt"))
        .sign(&signer);
    assert_eq!(claim_error(verifier.verify(&wrong_type).await), "typ");

    let lowercase_type = TokenBuilder::new("ES256", "k1")
        .header("typ", json!("jwt"))
        .sign(&signer);
    assert!(verifier.verify(&lowercase_type).await.is_ok());
}

#[tokio::test]
async fn test_app_check_preset() {
    let signer = Signer::rsa();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1beta/jwks")
        .with_status(200)
        .with_body(jwks(&[signer.jwk("app-check")]))
        .create_async()
        .await;

    let mut config: VerifierConfig = firebase_app_check("123456").unwrap();
    config.jwks_url = format!("{}/v1beta/jwks", server.url());
    let app_check =
        AppCheckVerifier::from_config(config, Arc::new(ReqwestClient::new().unwrap())).unwrap();

    let token = TokenBuilder::new("RS256", "app-check")
        .claim("iss", json!("https://firebaseappcheck.googleapis.com/123456"))
        .claim("aud", json!(["projects/123456", "projects/my-project"]))
        // inside the 5 second tolerance
        .claim("exp", json!(now() - 2))
        .sign(&signer);
    assert!(app_check.verify(&token).await);

    let other_project = TokenBuilder::new("RS256", "app-check")
        .claim("iss", json!("https://firebaseappcheck.googleapis.com/123456"))
        .claim("aud", json!("projects/654321"))
        .sign(&signer);
    assert!(!app_check.verify(&other_project).await);

    let untyped = TokenBuilder::new("RS256", "app-check")
        .without_header("typ")
        .claim("iss", json!("https://firebaseappcheck.googleapis.com/123456"))
        .sign(&signer);
    assert!(!app_check.verify(&untyped).await);
}
