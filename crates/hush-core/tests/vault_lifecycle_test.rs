//! End-to-end vault lifecycle: passphrase unlock, message exchange, PIN
//! re-unlock, and the deterministic-derivation contract across sessions.

use hush_core::{VaultSession, decrypt_payload, encrypt_payload};
use hush_crypto::{CryptoError, conversation_id, decode_kdf_salt};
use hush_proto::{DirectMessagePayload, PayloadKind, PlaintextPayload};

const WORDS: &str = "abandon abandon abandon abandon abandon abandon \
                     abandon abandon abandon abandon abandon about";
const SALT_B64: &str = "dGVzdHNhbHQxMjM0NTY3OA==";

fn payload(conversation: &str) -> PlaintextPayload {
    PlaintextPayload::DirectMessage(DirectMessagePayload {
        conversation_id: conversation.to_string(),
        body: "meet at the usual place".to_string(),
        sent_at: 1_700_000_000,
    })
}

#[test]
fn two_devices_with_the_same_words_can_talk() {
    let salt = decode_kdf_salt(SALT_B64).unwrap();

    // two independent unlocks of the same deployment
    let mut device_a = VaultSession::unlock(WORDS, &salt).unwrap();
    let mut device_b = VaultSession::unlock(" Abandon  ABANDON abandon abandon abandon abandon \
                                            abandon abandon abandon abandon abandon ABOUT ", &salt)
        .unwrap();

    let conversation = conversation_id("alice", "bob");
    assert_eq!(conversation, conversation_id("bob", "alice"));

    // device A encrypts under its derived conversation key
    let key_a = *device_a.conversation_key("alice", "bob").as_bytes();
    let blob = encrypt_payload(&key_a, &payload(&conversation));

    // device B derives the same key independently and decrypts
    let key_b = *device_b.conversation_key("bob", "alice").as_bytes();
    let decrypted = decrypt_payload(&key_b, &blob, PayloadKind::DirectMessage).unwrap();

    assert_eq!(decrypted, payload(&conversation));
}

#[test]
fn pin_reunlock_recovers_the_same_hierarchy() {
    let salt = decode_kdf_salt(SALT_B64).unwrap();

    let mut session = VaultSession::unlock(WORDS, &salt).unwrap();
    let identity_key = *session.context_key(hush_crypto::KeyDomain::Identity).as_bytes();

    let envelope = session.seal_pin_envelope("4812").unwrap();
    session.lock();

    // wrong PIN fails closed
    assert!(matches!(
        VaultSession::unlock_with_pin(&envelope, "0000"),
        Err(CryptoError::DecryptionFailed)
    ));

    // right PIN recovers an identical hierarchy without the passphrase
    let mut reopened = VaultSession::unlock_with_pin(&envelope, "4812").unwrap();
    assert_eq!(
        reopened.context_key(hush_crypto::KeyDomain::Identity).as_bytes(),
        &identity_key
    );
}

#[test]
fn wrong_passphrase_cannot_read_the_vault() {
    let salt = decode_kdf_salt(SALT_B64).unwrap();

    let mut session = VaultSession::unlock(WORDS, &salt).unwrap();
    let conversation = conversation_id("alice", "bob");
    let key = *session.conversation_key("alice", "bob").as_bytes();
    let blob = encrypt_payload(&key, &payload(&conversation));

    let mut intruder = VaultSession::unlock("wrong words entirely but twelve of them \
                                            padding padding padding padding padding padding", &salt)
        .unwrap();
    let wrong_key = *intruder.conversation_key("alice", "bob").as_bytes();

    assert!(decrypt_payload(&wrong_key, &blob, PayloadKind::DirectMessage).is_err());
}
