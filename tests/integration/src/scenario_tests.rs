//! Host-level scenarios
//!
//! Each test drives a whole manifest through the engine against a temporary
//! `/etc`-like tree and checks the resulting stack files line by line.

use pam_core::{
    ApplyOptions, CheckStatus, Error, Instance, Manifest, Outcome, PamConfig, StackEngine,
};
use pam_fs::NormalizedPath;
use pam_test_utils::{TestTarget, fixtures};
use pretty_assertions::assert_eq;

// =============================================================================
// Infrastructure
// =============================================================================

fn host() -> (TestTarget, StackEngine) {
    let target = TestTarget::new();
    target.write_service("system-auth", fixtures::FULL);
    target.write_combined(fixtures::PAM_CONF);
    let engine = StackEngine::new(PamConfig::rooted_at(target.root()));
    (target, engine)
}

fn apply(engine: &StackEngine, manifest: &str) -> Vec<Outcome> {
    let entries = Manifest::parse(manifest).unwrap().into_entries().unwrap();
    engine
        .apply(&entries, &ApplyOptions::default())
        .unwrap()
        .into_iter()
        .map(|report| report.outcome)
        .collect()
}

fn combined(target: &TestTarget) -> Vec<Instance> {
    let engine = StackEngine::new(PamConfig::rooted_at(target.root()));
    engine
        .instances(&NormalizedPath::new(target.combined_path()))
        .unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

const SSSD_ROLLOUT: &str = r#"
[[entry]]
service = "system-auth"
type = "auth"
control = "sufficient"
module = "pam_sss.so"
arguments = "forward_pass"
position = "before module pam_deny.so"

[[entry]]
service = "system-auth"
type = "account"
control = "[default=bad success=ok user_unknown=ignore]"
module = "pam_sss.so"

[[entry]]
service = "system-auth"
type = "session"
control = "optional"
module = "pam_mkhomedir.so"
arguments = ["umask=0077", "skel=/etc/skel"]
position = "after last"

[[entry]]
service = "system-auth"
type = "session"
control = "optional"
module = "pam_oddjob_mkhomedir.so"
ensure = "absent"
"#;

#[test]
fn test_sssd_rollout_converges() {
    let (target, engine) = host();

    let outcomes = apply(&engine, SSSD_ROLLOUT);
    assert_eq!(
        outcomes,
        vec![
            Outcome::Updated,
            Outcome::Unchanged,
            Outcome::Created,
            Outcome::Removed
        ]
    );

    let entries = target.service_entries("system-auth");
    assert_eq!(entries[3], "auth\tsufficient\tpam_sss.so forward_pass");
    assert_eq!(entries[4], "auth        required      pam_deny.so");
    assert_eq!(
        entries.last().map(String::as_str),
        Some("session\toptional\tpam_mkhomedir.so umask=0077 skel=/etc/skel")
    );
    assert!(!entries.iter().any(|line| line.contains("pam_oddjob_mkhomedir.so")));
    assert_eq!(entries.len(), 21);

    // A second run has nothing left to do.
    let again = apply(&engine, SSSD_ROLLOUT);
    assert!(again.iter().all(|outcome| *outcome == Outcome::Unchanged));

    let entries = Manifest::parse(SSSD_ROLLOUT)
        .unwrap()
        .into_entries()
        .unwrap();
    assert_eq!(engine.check(&entries).status, CheckStatus::Healthy);
}

#[test]
fn test_combined_file_edits_stay_within_their_service() {
    let (target, engine) = host();

    let outcomes = apply(
        &engine,
        &format!(
            r#"
[[entry]]
service = "sshd"
type = "auth"
control = "required"
module = "pam_faillock.so"
arguments = "preauth"
position = "before *[service='sshd' and type='auth'][1]"
target = '{combined}'

[[entry]]
service = "login"
type = "auth"
control = "required"
module = "pam_unix.so"
ensure = "absent"
target = '{combined}'
"#,
            combined = target.combined_path().display()
        ),
    );
    assert_eq!(outcomes, vec![Outcome::Created, Outcome::Removed]);

    let instances = combined(&target);
    let services: Vec<_> = instances
        .iter()
        .map(|i| (i.service.as_deref().unwrap_or(""), i.module.as_str()))
        .collect();
    assert_eq!(
        services,
        vec![
            ("login", "pam_unix.so"),
            ("sshd", "pam_faillock.so"),
            ("sshd", "pam_env.so"),
            ("sshd", "pam_unix.so"),
            ("sshd", "pam_deny.so"),
            ("other", "pam_deny.so"),
        ]
    );
    assert_eq!(instances[0].phase, "account");
}

#[test]
fn test_new_service_file_is_created_from_nothing() {
    let (target, engine) = host();

    let outcomes = apply(
        &engine,
        r#"
[[entry]]
service = "vsftpd"
type = "auth"
control = "required"
module = "pam_listfile.so"
arguments = "item=user sense=deny file=/etc/vsftpd/ftpusers onerr=succeed"

[[entry]]
service = "vsftpd"
type = "auth"
control = "include"
module = "system-auth"
position = "after last"
"#,
    );
    assert_eq!(outcomes, vec![Outcome::Created, Outcome::Created]);
    assert_eq!(
        target.service_entries("vsftpd"),
        vec![
            "auth\trequired\tpam_listfile.so item=user sense=deny file=/etc/vsftpd/ftpusers onerr=succeed",
            "auth\tinclude\tsystem-auth",
        ]
    );
}

#[test]
fn test_failing_entry_keeps_earlier_commits() {
    let (target, engine) = host();
    target.write_service("broken", fixtures::BROKEN);

    let entries = Manifest::parse(
        r#"
[[entry]]
service = "system-auth"
type = "session"
control = "optional"
module = "pam_motd.so"

[[entry]]
service = "broken"
type = "auth"
control = "optional"
module = "pam_echo.so"
"#,
    )
    .unwrap()
    .into_entries()
    .unwrap();

    let err = engine
        .apply(&entries, &ApplyOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Load { line: 4, .. }));

    target.assert_service_contains("system-auth", "pam_motd.so");
    assert_eq!(target.read_service("broken"), fixtures::BROKEN);
}

#[test]
fn test_listing_matches_json_shape() {
    let (target, engine) = host();
    let instances = engine
        .instances(&NormalizedPath::new(target.service_path("system-auth")))
        .unwrap();

    let json = serde_json::to_value(&instances[16]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "session",
            "control": "optional",
            "module": "pam_systemd.so",
            "arguments": [],
            "optional": true
        })
    );
}
