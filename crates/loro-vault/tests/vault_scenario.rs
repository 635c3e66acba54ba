//! End-to-end vault behavior over real storage backends.

use loro_core::config::VaultConfig;
use loro_core::types::SafetyPlan;
use loro_storage::{FileBackend, KeyValueStore, MemoryBackend, StorageBackend};
use loro_vault::{EncryptedVault, SafetyPlanVault, VaultError, VaultState};
use secrecy::SecretString;

fn fast_config() -> VaultConfig {
    VaultConfig {
        iterations: 1_000,
        ..Default::default()
    }
}

fn pass(s: &str) -> SecretString {
    SecretString::from(s)
}

fn plan_with_triggers(triggers: &str) -> SafetyPlan {
    SafetyPlan {
        triggers: triggers.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_create_save_lock_unlock_scenario() {
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(MemoryBackend::new()), &fast_config());

    // No blob yet: any passphrase opens an empty document
    let doc = vault.unlock(pass("")).unwrap();
    assert_eq!(doc, &SafetyPlan::default());
    assert_eq!(vault.state(), VaultState::Unlocked);

    // Too short: rejected with nothing written
    let err = vault
        .save_encrypted(plan_with_triggers("x"), pass("abc"))
        .unwrap_err();
    assert!(matches!(err, VaultError::WeakPassphrase { min: 4 }));
    assert!(!vault.has_blob());
    assert!(vault.store().backend().keys().unwrap().is_empty());

    vault
        .save_encrypted(plan_with_triggers("x"), pass("abcd"))
        .unwrap();
    assert!(vault.has_blob());
    assert_eq!(vault.state(), VaultState::Unlocked);

    vault.lock();
    assert_eq!(vault.state(), VaultState::Locked);
    assert!(vault.document().is_none());

    let doc = vault.unlock(pass("abcd")).unwrap();
    assert_eq!(doc.triggers, "x");

    let err = vault.unlock(pass("wrong")).unwrap_err();
    assert!(matches!(err, VaultError::UnlockFailed));
    assert_eq!(vault.state(), VaultState::Locked);
    assert!(vault.document().is_none());
}

#[test]
fn test_blob_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let backend = FileBackend::open(&path, None).unwrap();
        let mut vault: SafetyPlanVault<_> =
            EncryptedVault::with_config(KeyValueStore::new(backend), &fast_config());
        vault.unlock(pass("")).unwrap();

        let mut plan = SafetyPlan::default();
        plan.warning_signs.push("isolating".into());
        vault.save_encrypted(plan, pass("correct horse")).unwrap();
    }

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("loro:safetyplan:vault"));
    assert!(!on_disk.contains("isolating"));

    let backend = FileBackend::open(&path, None).unwrap();
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(backend), &fast_config());
    let plan = vault.unlock(pass("correct horse")).unwrap();
    assert_eq!(plan.warning_signs, vec!["isolating".to_string()]);
}

#[test]
fn test_corrupted_blob_fails_like_wrong_passphrase() {
    let mut backend = MemoryBackend::new();
    backend.set("loro:safetyplan:vault", "{not a blob").unwrap();

    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(backend), &fast_config());
    assert!(vault.has_blob());

    let err = vault.unlock(pass("abcd")).unwrap_err();
    assert!(matches!(err, VaultError::UnlockFailed));
    // The unreadable blob is left for the user to wipe explicitly
    assert!(vault.has_blob());
}

#[test]
fn test_unsupported_version_fails_unlock() {
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(MemoryBackend::new()), &fast_config());
    vault.unlock(pass("")).unwrap();
    vault.save_encrypted(plan_with_triggers("x"), pass("abcd")).unwrap();
    vault.lock();

    let store = vault.store();
    let raw = store.load_raw("safetyplan:vault").unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    json["v"] = serde_json::json!(2);

    let mut backend = MemoryBackend::new();
    backend
        .set("loro:safetyplan:vault", &json.to_string())
        .unwrap();
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(backend), &fast_config());

    assert!(matches!(
        vault.unlock(pass("abcd")),
        Err(VaultError::UnlockFailed)
    ));
}

#[test]
fn test_failed_unlock_clears_open_session() {
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(MemoryBackend::new()), &fast_config());
    vault.unlock(pass("")).unwrap();
    vault.save_encrypted(plan_with_triggers("x"), pass("abcd")).unwrap();
    assert!(vault.is_unlocked());

    assert!(vault.unlock(pass("nope")).is_err());
    assert!(!vault.is_unlocked());
    assert!(matches!(vault.save(), Err(VaultError::Locked)));
}

#[test]
fn test_storage_failure_is_reported() {
    let mut vault: SafetyPlanVault<_> = EncryptedVault::with_config(
        KeyValueStore::new(MemoryBackend::unavailable()),
        &fast_config(),
    );
    vault.unlock(pass("")).unwrap();

    let err = vault
        .save_encrypted(plan_with_triggers("x"), pass("abcd"))
        .unwrap_err();
    assert!(matches!(err, VaultError::StorageUnavailable));
}

#[test]
fn test_quota_failure_keeps_previous_blob() {
    let mut vault: SafetyPlanVault<_> = EncryptedVault::with_config(
        KeyValueStore::new(MemoryBackend::with_quota(2_048)),
        &fast_config(),
    );
    vault.unlock(pass("")).unwrap();
    vault.save_encrypted(plan_with_triggers("x"), pass("abcd")).unwrap();

    let huge = plan_with_triggers(&"y".repeat(4_096));
    assert!(matches!(
        vault.save_encrypted(huge, pass("abcd")),
        Err(VaultError::StorageUnavailable)
    ));

    vault.lock();
    assert_eq!(vault.unlock(pass("abcd")).unwrap().triggers, "x");
}

#[test]
fn test_wipe_removes_blob_and_locks() {
    let mut vault: SafetyPlanVault<_> =
        EncryptedVault::with_config(KeyValueStore::new(MemoryBackend::new()), &fast_config());
    vault.unlock(pass("")).unwrap();
    vault.save_encrypted(plan_with_triggers("x"), pass("abcd")).unwrap();

    vault.wipe().unwrap();
    assert!(!vault.has_blob());
    assert_eq!(vault.state(), VaultState::Locked);

    // Back to the create-new path
    let doc = vault.unlock(pass("anything")).unwrap();
    assert_eq!(doc.triggers, "");
}

mod proptest_suite {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn saved_plan_reopens(
            triggers in ".{0,64}",
            signs in proptest::collection::vec(".{0,32}", 0..5),
            passphrase in "[ -~]{4,20}",
        ) {
            let mut vault: SafetyPlanVault<_> = EncryptedVault::with_config(
                KeyValueStore::new(MemoryBackend::new()),
                &fast_config(),
            );
            vault.unlock(pass("")).unwrap();

            let plan = SafetyPlan { triggers, warning_signs: signs, ..Default::default() };
            vault.save_encrypted(plan.clone(), pass(&passphrase)).unwrap();
            vault.lock();

            prop_assert_eq!(vault.unlock(pass(&passphrase)).unwrap(), &plan);
        }
    }
}
