//! End-to-end defense policy scenarios over the full authentication flow.

use hush_harness::SimEnv;
use hush_proto::AuthDenied;
use hush_server::{
    AuthOutcome, Authenticator, FailureMode, MemoryStorage, RedbStorage, ServerConfig, Storage,
};

const GOOD_HASH: &str = "dGhlLXJpZ2h0LWhhc2g-valid";
const BAD_HASH: &str = "dGhlLXdyb25nLWhhc2g-nope!";

fn config(mode: FailureMode) -> ServerConfig {
    ServerConfig {
        auth_hash: GOOD_HASH.to_string(),
        kdf_salt: "dGVzdHNhbHQxMjM0NTY3OA==".to_string(),
        session_secret: "integration-test-secret".to_string(),
        session_ttl_minutes: 60,
        max_auth_failures: 5,
        failure_mode: mode,
        ip_block_minutes: 60,
        panic_mode: false,
    }
}

fn authenticator<S: Storage>(
    storage: S,
    mode: FailureMode,
) -> (Authenticator<S, SimEnv>, SimEnv) {
    let env = SimEnv::seeded(0);
    (Authenticator::new(&config(mode), storage, env.clone()), env)
}

fn denied(remaining_attempts: u32) -> AuthOutcome {
    AuthOutcome::Denied(AuthDenied::new(remaining_attempts))
}

/// Space attempts out so the auth rate limiter (10/min, burst 3) never
/// interferes with the scenario under test.
fn attempt<S: Storage>(
    auth: &Authenticator<S, SimEnv>,
    env: &SimEnv,
    ip: &str,
    hash: &str,
) -> AuthOutcome {
    env.advance_secs(10);
    auth.authenticate(ip, hash).unwrap()
}

#[test]
fn five_failures_under_ip_temp_block_the_sixth_attempt() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);
    let ip = "10.0.0.5";

    for expected_remaining in [4, 3, 2, 1, 0] {
        let outcome = attempt(&auth, &env, ip, BAD_HASH);
        assert_eq!(outcome, denied(expected_remaining));
    }

    // 6th attempt: blocked before the credential is even examined
    assert!(matches!(attempt(&auth, &env, ip, BAD_HASH), AuthOutcome::Blocked(_)));
    // ... even with the correct credential
    assert!(matches!(attempt(&auth, &env, ip, GOOD_HASH), AuthOutcome::Blocked(_)));
}

#[test]
fn blocked_response_carries_no_attempt_count() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);
    let ip = "10.0.0.5";

    for _ in 0..5 {
        attempt(&auth, &env, ip, BAD_HASH);
    }

    let AuthOutcome::Blocked(notice) = attempt(&auth, &env, ip, BAD_HASH) else {
        panic!("expected Blocked");
    };
    assert_eq!(notice.error, "ip_blocked");
    assert_eq!(notice.message, "Access denied");
}

#[test]
fn temporary_block_lapses_after_sixty_one_minutes() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);
    let ip = "10.0.0.5";

    for _ in 0..5 {
        attempt(&auth, &env, ip, BAD_HASH);
    }
    assert!(matches!(attempt(&auth, &env, ip, GOOD_HASH), AuthOutcome::Blocked(_)));

    env.advance_secs(61 * 60);

    // evaluated again, not auto-blocked: the correct hash now authenticates
    assert!(matches!(
        attempt(&auth, &env, ip, GOOD_HASH),
        AuthOutcome::Granted(_)
    ));
}

#[test]
fn success_before_threshold_resets_the_counter() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);
    let ip = "10.0.0.5";

    for _ in 0..4 {
        attempt(&auth, &env, ip, BAD_HASH);
    }
    assert!(matches!(
        attempt(&auth, &env, ip, GOOD_HASH),
        AuthOutcome::Granted(_)
    ));

    // the streak starts over at the full budget
    assert_eq!(attempt(&auth, &env, ip, BAD_HASH), denied(4));
}

#[test]
fn failures_from_other_ips_do_not_mix() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);

    for _ in 0..4 {
        attempt(&auth, &env, "10.0.0.5", BAD_HASH);
    }

    assert_eq!(attempt(&auth, &env, "10.0.0.6", BAD_HASH), denied(4));
}

#[test]
fn permanent_block_outlives_any_wait() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpPerm);
    let ip = "10.0.0.5";

    for _ in 0..5 {
        attempt(&auth, &env, ip, BAD_HASH);
    }

    env.advance_secs(365 * 24 * 3600);
    assert!(matches!(attempt(&auth, &env, ip, GOOD_HASH), AuthOutcome::Blocked(_)));
}

#[test]
fn db_wipe_erases_vault_content() {
    let storage = MemoryStorage::new();
    storage.put_message("m1", b"ciphertext").unwrap();
    storage.put_thread("t1", b"ciphertext").unwrap();

    let (auth, env) = authenticator(storage.clone(), FailureMode::DbWipe);

    for _ in 0..4 {
        attempt(&auth, &env, "10.0.0.5", BAD_HASH);
    }
    let outcome = attempt(&auth, &env, "10.0.0.5", BAD_HASH);

    assert_eq!(outcome, AuthOutcome::Wiped { shutdown: false });
    assert_eq!(storage.message_count().unwrap(), 0);
    assert_eq!(storage.thread_count().unwrap(), 0);

    // without shutdown the service keeps serving; the (empty) vault
    // accepts the correct credential again
    assert!(matches!(
        attempt(&auth, &env, "10.0.0.5", GOOD_HASH),
        AuthOutcome::Granted(_)
    ));
}

#[test]
fn db_wipe_shutdown_demands_termination() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::DbWipeShutdown);

    for _ in 0..4 {
        attempt(&auth, &env, "10.0.0.5", BAD_HASH);
    }
    let outcome = attempt(&auth, &env, "10.0.0.5", BAD_HASH);

    assert_eq!(outcome, AuthOutcome::Wiped { shutdown: true });
    assert!(auth.defense().is_halted());
}

#[test]
fn panic_mode_wipes_on_the_first_failure() {
    let env = SimEnv::seeded(0);
    let storage = MemoryStorage::new();
    storage.put_message("m1", b"ciphertext").unwrap();

    let mut panic_config = config(FailureMode::IpTemp);
    panic_config.panic_mode = true;
    let auth = Authenticator::new(&panic_config, storage.clone(), env.clone());

    // a correct credential is unaffected
    env.advance_secs(10);
    assert!(matches!(
        auth.authenticate("10.0.0.5", GOOD_HASH).unwrap(),
        AuthOutcome::Granted(_)
    ));

    // one wrong credential destroys everything
    env.advance_secs(10);
    let outcome = auth.authenticate("10.0.0.5", BAD_HASH).unwrap();
    assert_eq!(outcome, AuthOutcome::Wiped { shutdown: true });
    assert_eq!(storage.message_count().unwrap(), 0);
}

#[test]
fn policy_state_survives_restart_with_redb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hush.redb");
    let ip = "10.0.0.5";

    {
        let storage = RedbStorage::open(&path).unwrap();
        let (auth, env) = authenticator(storage, FailureMode::IpTemp);
        for _ in 0..5 {
            attempt(&auth, &env, ip, BAD_HASH);
        }
        assert!(matches!(attempt(&auth, &env, ip, GOOD_HASH), AuthOutcome::Blocked(_)));
    }

    // a process restart does not forget the block
    let storage = RedbStorage::open(&path).unwrap();
    let (auth, env) = authenticator(storage, FailureMode::IpTemp);
    assert!(matches!(attempt(&auth, &env, ip, GOOD_HASH), AuthOutcome::Blocked(_)));
}

#[test]
fn startup_sweep_clears_expired_blocks() {
    let (auth, env) = authenticator(MemoryStorage::new(), FailureMode::IpTemp);

    for _ in 0..5 {
        attempt(&auth, &env, "10.0.0.5", BAD_HASH);
    }

    env.advance_secs(61 * 60);
    assert_eq!(auth.defense().cleanup_expired_blocks().unwrap(), 1);
}
