//! Agreement-wrap engine (`alg = "ECDH-ES"`, `enc = "A256GCM"`).
//!
//! Each wrap generates an ephemeral P-384 key, agrees with the recipient's
//! static key and derives the CEK with the Concat KDF of NIST SP 800-56A
//! (RFC 7518 §4.6.2). The ephemeral public key is published in `epk`; the
//! ephemeral private key is dropped as soon as the CEK exists.

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    p384::{PublicKey, ecdh::EphemeralSecret, elliptic_curve::rand_core::OsRng},
    sha2::{Digest, Sha256},
    zeroize::Zeroizing,
};

use crate::{
    agreement::KeyAgreement,
    cipher,
    compact::{self, CompactJwe, ProtectedHeader},
    error::{JweError, Result},
    header::{AgreementParams, ContentAlgorithm, ECDH_ES_ALG, WrapHeader},
};

/// Wrap `plaintext` for the holder of `recipient`'s private key.
pub fn wrap(plaintext: &[u8], recipient: &PublicKey) -> Result<String> {
    let enc = ContentAlgorithm::A256Gcm;

    let (epk, cek) = {
        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let shared = ephemeral.diffie_hellman(recipient);
        (
            ephemeral.public_key(),
            concat_kdf(shared.raw_secret_bytes(), enc, &[], &[]),
        )
    };

    let protected = ProtectedHeader::new(WrapHeader::Agreement(AgreementParams {
        enc,
        epk: epk.to_jwk(),
        apu: None,
        apv: None,
    }))?;
    let sealed = cipher::for_algorithm(enc).encrypt(&cek, plaintext, protected.aad())?;

    #[cfg(feature = "tracing")]
    tracing::debug!(enc = enc.id(), "agreement-wrapped key");

    Ok(compact::encode(
        &protected,
        &[],
        &sealed.iv,
        &sealed.ciphertext,
        &sealed.tag,
    ))
}

/// Unwrap an agreement-wrapped token with the recipient's private key.
///
/// Authentication failure, a foreign `epk` curve, or an `epk` that is not a
/// valid point all yield [`JweError::WrongKey`].
pub fn unwrap<K>(token: &str, recipient: &K) -> Result<Zeroizing<Vec<u8>>>
where
    K: KeyAgreement + ?Sized,
{
    let jwe = CompactJwe::decode(token)?;
    let WrapHeader::Agreement(params) = jwe.header() else {
        return Err(JweError::malformed(format!(
            "expected {ECDH_ES_ALG}, found {}",
            jwe.header().kind()
        )));
    };
    if !jwe.encrypted_key.is_empty() {
        return Err(JweError::malformed(
            "direct key agreement must not carry an encrypted key",
        ));
    }

    let apu = decode_party_info(params.apu.as_deref())?;
    let apv = decode_party_info(params.apv.as_deref())?;
    let epk = PublicKey::from_jwk(&params.epk).map_err(|_| JweError::WrongKey)?;

    let shared = recipient.agree(&epk)?;
    let cek = concat_kdf(&shared, params.enc, &apu, &apv);

    cipher::for_algorithm(params.enc)
        .decrypt(
            &cek,
            &jwe.iv,
            &jwe.ciphertext,
            &jwe.tag,
            jwe.protected.aad(),
        )
        .map_err(|_| JweError::WrongKey)
}

fn decode_party_info(value: Option<&str>) -> Result<Vec<u8>> {
    match value {
        Some(v) => Ok(URL_SAFE_NO_PAD.decode(v)?),
        None => Ok(Vec::new()),
    }
}

/// Single-round Concat KDF with SHA-256; one round covers a 256-bit key.
fn concat_kdf(z: &[u8], enc: ContentAlgorithm, apu: &[u8], apv: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(1u32.to_be_bytes());
    hasher.update(z);
    for field in [enc.id().as_bytes(), apu, apv] {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field);
    }
    hasher.update(enc.key_bits().to_be_bytes());

    let mut cek = Zeroizing::new([0u8; 32]);
    cek.copy_from_slice(&hasher.finalize());
    cek
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::kdf::{MIN_ITERATIONS, Pbes2Params},
        p384::SecretKey,
        rstest::rstest,
    };

    fn keypair() -> SecretKey {
        SecretKey::random(&mut OsRng)
    }

    #[test]
    fn round_trip() {
        let recipient = keypair();
        let token = wrap(b"vault key payload", &recipient.public_key()).unwrap();
        let plaintext = unwrap(&token, &recipient).unwrap();
        assert_eq!(plaintext.as_slice(), b"vault key payload");
    }

    #[test]
    fn identical_inputs_give_distinct_tokens() {
        let recipient = keypair();
        let a = wrap(b"same", &recipient.public_key()).unwrap();
        let b = wrap(b"same", &recipient.public_key()).unwrap();
        assert_ne!(a, b);

        let epk_a = match CompactJwe::decode(&a).unwrap().header() {
            WrapHeader::Agreement(p) => p.epk.clone(),
            WrapHeader::Password(_) => panic!("expected agreement header"),
        };
        let epk_b = match CompactJwe::decode(&b).unwrap().header() {
            WrapHeader::Agreement(p) => p.epk.clone(),
            WrapHeader::Password(_) => panic!("expected agreement header"),
        };
        assert_ne!(
            PublicKey::from_jwk(&epk_a).unwrap(),
            PublicKey::from_jwk(&epk_b).unwrap()
        );
    }

    #[test]
    fn unrelated_key_fails() {
        let token = wrap(b"secret", &keypair().public_key()).unwrap();
        let err = unwrap(&token, &keypair()).unwrap_err();
        assert!(matches!(err, JweError::WrongKey), "{err:?}");
    }

    #[test]
    fn epk_is_a_p384_jwk() {
        let token = wrap(b"secret", &keypair().public_key()).unwrap();
        let header_b64 = token.split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).unwrap()).unwrap();
        assert_eq!(header["alg"], ECDH_ES_ALG);
        assert_eq!(header["enc"], "A256GCM");
        assert_eq!(header["epk"]["kty"], "EC");
        assert_eq!(header["epk"]["crv"], "P-384");
        assert!(header["epk"].get("d").is_none());
        assert!(token.contains(".."), "params segment must be empty");
    }

    #[rstest]
    #[case::iv(2)]
    #[case::ciphertext(3)]
    #[case::tag(4)]
    fn flipped_byte_fails(#[case] segment: usize) {
        let recipient = keypair();
        let token = wrap(b"secret payload", &recipient.public_key()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut bytes = URL_SAFE_NO_PAD.decode(&parts[segment]).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        parts[segment] = URL_SAFE_NO_PAD.encode(bytes);

        let err = unwrap(&parts.join("."), &recipient).unwrap_err();
        assert!(matches!(err, JweError::WrongKey), "{err:?}");
    }

    #[test]
    fn truncated_tag_fails() {
        let recipient = keypair();
        let token = wrap(b"secret payload", &recipient.public_key()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let bytes = URL_SAFE_NO_PAD.decode(&parts[4]).unwrap();
        parts[4] = URL_SAFE_NO_PAD.encode(&bytes[..8]);
        assert!(unwrap(&parts.join("."), &recipient).is_err());
    }

    #[test]
    fn swapped_epk_fails() {
        let recipient = keypair();
        let token = wrap(b"secret", &recipient.public_key()).unwrap();
        let header = serde_json::json!({
            "alg": ECDH_ES_ALG,
            "enc": "A256GCM",
            "epk": keypair().public_key().to_jwk(),
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header_b64;

        let err = unwrap(&parts.join("."), &recipient).unwrap_err();
        assert!(matches!(err, JweError::WrongKey));
    }

    #[test]
    fn foreign_curve_epk_fails() {
        let recipient = keypair();
        let token = wrap(b"secret", &recipient.public_key()).unwrap();
        let header = serde_json::json!({
            "alg": ECDH_ES_ALG,
            "enc": "A256GCM",
            "epk": {
                "kty": "EC",
                "crv": "P-256",
                "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
                "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0",
            },
        });
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[0] = &header_b64;

        let err = unwrap(&parts.join("."), &recipient).unwrap_err();
        assert!(matches!(err, JweError::WrongKey), "{err:?}");
    }

    #[test]
    fn password_token_is_rejected() {
        let token = crate::pbes2::wrap(
            b"secret",
            "code",
            &Pbes2Params {
                iterations: MIN_ITERATIONS,
            },
        )
        .unwrap();
        let err = unwrap(&token, &keypair()).unwrap_err();
        assert!(matches!(err, JweError::MalformedWrap(_)));
    }

    #[test]
    fn party_info_is_bound_into_the_cek() {
        let z = [7u8; 48];
        let plain = concat_kdf(&z, ContentAlgorithm::A256Gcm, &[], &[]);
        let with_apu = concat_kdf(&z, ContentAlgorithm::A256Gcm, b"Alice", &[]);
        let with_apv = concat_kdf(&z, ContentAlgorithm::A256Gcm, &[], b"Bob");
        assert_ne!(*plain, *with_apu);
        assert_ne!(*plain, *with_apv);
        assert_ne!(*with_apu, *with_apv);
    }
}
