//! Password-wrap engine (`alg = "PBES2-HS512+A256KW"`, `enc = "A256GCM"`).
//!
//! The setup code is stretched into a KEK, the KEK unwraps a random CEK
//! carried in the params segment, and the CEK decrypts the payload. The salt,
//! iteration count and wrapped CEK all travel inside the token.

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
    zeroize::Zeroizing,
};

use crate::{
    cipher,
    compact::{self, CompactJwe, ProtectedHeader},
    error::{JweError, Result},
    header::{ContentAlgorithm, PBES2_ALG, PasswordParams, WrapHeader},
    kdf::{self, Pbes2Params},
    key_wrap,
};

/// Wrap `plaintext` under `setup_code`. Every call uses a fresh salt, CEK
/// and IV, so identical inputs never produce identical tokens.
pub fn wrap(plaintext: &[u8], setup_code: &str, params: &Pbes2Params) -> Result<String> {
    params.validate()?;

    let p2s = kdf::generate_salt();
    let salt = URL_SAFE_NO_PAD.decode(&p2s)?;
    let kek = kdf::derive_kek(setup_code.as_bytes(), PBES2_ALG, &salt, params.iterations);

    let mut cek = Zeroizing::new([0u8; 32]);
    rand::rng().fill_bytes(cek.as_mut());
    let wrapped_cek = key_wrap::wrap_cek(&kek, &cek)?;

    let protected = ProtectedHeader::new(WrapHeader::Password(PasswordParams {
        enc: ContentAlgorithm::A256Gcm,
        p2s,
        p2c: params.iterations,
    }))?;
    let sealed = cipher::for_algorithm(ContentAlgorithm::A256Gcm).encrypt(
        &cek,
        plaintext,
        protected.aad(),
    )?;

    #[cfg(feature = "tracing")]
    tracing::debug!(iterations = params.iterations, "password-wrapped key");

    Ok(compact::encode(
        &protected,
        &wrapped_cek,
        &sealed.iv,
        &sealed.ciphertext,
        &sealed.tag,
    ))
}

/// Unwrap a password-wrapped token.
///
/// A wrong setup code and a tampered token are indistinguishable here; both
/// yield [`JweError::WrongSetupCode`].
pub fn unwrap(token: &str, setup_code: &str) -> Result<Zeroizing<Vec<u8>>> {
    let jwe = CompactJwe::decode(token)?;
    let WrapHeader::Password(params) = jwe.header() else {
        return Err(JweError::malformed(format!(
            "expected {PBES2_ALG}, found {}",
            jwe.header().kind()
        )));
    };
    kdf::check_iterations(params.p2c)?;
    let salt = URL_SAFE_NO_PAD.decode(&params.p2s)?;

    let kek = kdf::derive_kek(setup_code.as_bytes(), PBES2_ALG, &salt, params.p2c);
    let cek = key_wrap::unwrap_cek(&kek, &jwe.encrypted_key)?;

    cipher::for_algorithm(params.enc)
        .decrypt(
            &cek,
            &jwe.iv,
            &jwe.ciphertext,
            &jwe.tag,
            jwe.protected.aad(),
        )
        .map_err(|_| JweError::WrongSetupCode)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::kdf::MIN_ITERATIONS, rstest::rstest};

    const FAST: Pbes2Params = Pbes2Params {
        iterations: MIN_ITERATIONS,
    };

    #[test]
    fn round_trip() {
        let token = wrap(b"user private key", "123456", &FAST).unwrap();
        let plaintext = unwrap(&token, "123456").unwrap();
        assert_eq!(plaintext.as_slice(), b"user private key");
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let token = wrap(b"", "code", &FAST).unwrap();
        assert!(unwrap(&token, "code").unwrap().is_empty());
    }

    #[test]
    fn identical_inputs_give_distinct_tokens() {
        let a = wrap(b"same", "code", &FAST).unwrap();
        let b = wrap(b"same", "code", &FAST).unwrap();
        assert_ne!(a, b);
    }

    #[rstest]
    #[case("123457")]
    #[case("12345")]
    #[case("1234567")]
    #[case("")]
    fn wrong_setup_code_fails(#[case] attempt: &str) {
        let token = wrap(b"secret", "123456", &FAST).unwrap();
        let err = unwrap(&token, attempt).unwrap_err();
        assert!(matches!(err, JweError::WrongSetupCode), "{err:?}");
    }

    #[test]
    fn header_carries_kdf_parameters() {
        let token = wrap(b"secret", "code", &FAST).unwrap();
        let jwe = CompactJwe::decode(&token).unwrap();
        let WrapHeader::Password(params) = jwe.header() else {
            panic!("expected password header");
        };
        assert_eq!(params.p2c, MIN_ITERATIONS);
        assert_eq!(
            URL_SAFE_NO_PAD.decode(&params.p2s).unwrap().len(),
            kdf::SALT_LEN
        );
        assert_eq!(jwe.encrypted_key.len(), key_wrap::WRAPPED_CEK_LEN);
    }

    #[rstest]
    #[case::params(1)]
    #[case::iv(2)]
    #[case::ciphertext(3)]
    #[case::tag(4)]
    fn flipped_byte_fails(#[case] segment: usize) {
        let token = wrap(b"secret payload", "code", &FAST).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut bytes = URL_SAFE_NO_PAD.decode(&parts[segment]).unwrap();
        bytes[0] ^= 0x01;
        parts[segment] = URL_SAFE_NO_PAD.encode(bytes);

        let err = unwrap(&parts.join("."), "code").unwrap_err();
        assert!(matches!(err, JweError::WrongSetupCode), "{err:?}");
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let token = wrap(b"secret payload", "code", &FAST).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let bytes = URL_SAFE_NO_PAD.decode(&parts[3]).unwrap();
        parts[3] = URL_SAFE_NO_PAD.encode(&bytes[..bytes.len() - 1]);
        assert!(unwrap(&parts.join("."), "code").is_err());
    }

    #[test]
    fn tampered_header_fails() {
        let token = wrap(b"secret", "code", &FAST).unwrap();
        let jwe = CompactJwe::decode(&token).unwrap();
        let WrapHeader::Password(params) = jwe.header().clone() else {
            panic!("expected password header");
        };
        // Same members in a different order: semantically equal, different AAD.
        let reordered = serde_json::json!({
            "enc": "A256GCM",
            "p2c": params.p2c,
            "p2s": params.p2s,
            "alg": PBES2_ALG,
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&reordered).unwrap());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header_b64;

        let err = unwrap(&parts.join("."), "code").unwrap_err();
        assert!(matches!(err, JweError::WrongSetupCode));
    }

    #[test]
    fn hostile_iteration_count_is_rejected_before_derivation() {
        let token = wrap(b"secret", "code", &FAST).unwrap();
        let header = serde_json::json!({
            "alg": PBES2_ALG,
            "enc": "A256GCM",
            "p2s": "AAAAAAAAAAAAAAAAAAAAAA",
            "p2c": u32::MAX,
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header_b64;

        let err = unwrap(&parts.join("."), "code").unwrap_err();
        assert!(matches!(err, JweError::MalformedWrap(_)));
    }

    #[test]
    fn agreement_token_is_rejected() {
        let recipient = p384::SecretKey::random(&mut p384::elliptic_curve::rand_core::OsRng);
        let token = crate::ecdh_es::wrap(b"secret", &recipient.public_key()).unwrap();
        let err = unwrap(&token, "code").unwrap_err();
        assert!(matches!(err, JweError::MalformedWrap(_)));
    }

    #[test]
    fn weak_work_factor_is_refused_on_wrap() {
        let err = wrap(b"secret", "code", &Pbes2Params { iterations: 10 }).unwrap_err();
        assert!(matches!(err, JweError::InvalidParams(_)));
    }
}
