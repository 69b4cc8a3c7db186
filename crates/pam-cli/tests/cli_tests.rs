//! CLI tests that run the compiled `pamstack` binary against temporary
//! stack files.

use assert_cmd::Command;
use pam_test_utils::{TestTarget, fixtures};
use predicates::prelude::*;

const MANIFEST: &str = r#"
[[entry]]
type = "auth"
control = "required"
module = "pam_faildelay.so"
arguments = "delay=2000000"
position = "before module pam_deny.so"
"#;

fn pamstack() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pamstack"));
    cmd.env("NO_COLOR", "1").env_remove("PAMSTACK_CONFIG");
    cmd
}

/// A target with `system-auth` written and a config file pointing at it.
fn setup(system_auth: &str) -> (TestTarget, String) {
    let target = TestTarget::new();
    target.write_service("system-auth", system_auth);
    let config = format!(
        "pam_dir = '{}'\ncombined_file = '{}'\ndefault_target = '{}'\n",
        target.pam_dir().display(),
        target.combined_path().display(),
        target.service_path("system-auth").display(),
    );
    let path = target.write_file("pamstack.toml", &config);
    (target, path.display().to_string())
}

#[test]
fn test_help_lists_commands() {
    pamstack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_list_default_target() {
    let (_target, config) = setup(fixtures::FULL);

    pamstack()
        .args(["--config", &config, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pam_env.so"))
        .stdout(predicate::str::contains("pam_oddjob_mkhomedir.so umask=0077"));
}

#[test]
fn test_list_json_from_env_config() {
    let (_target, config) = setup(fixtures::FULL);

    let output = pamstack()
        .env("PAMSTACK_CONFIG", &config)
        .args(["list", "--service", "system-auth", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let instances: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let instances = instances.as_array().unwrap();
    assert_eq!(instances.len(), 21);
    assert_eq!(instances[0]["type"], "auth");
    assert_eq!(instances[0]["module"], "pam_env.so");
    assert!(instances[0].get("service").is_none());
}

#[test]
fn test_list_combined_file_shows_services() {
    let (target, config) = setup(fixtures::EMPTY);
    target.write_combined(fixtures::PAM_CONF);

    pamstack()
        .args(["--config", &config, "list", "--target"])
        .arg(target.combined_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sshd"))
        .stdout(predicate::str::contains("nullok"));
}

#[test]
fn test_apply_dry_run_leaves_file_untouched() {
    let (target, config) = setup(fixtures::FULL);
    let manifest = target.write_file("stack.toml", MANIFEST);

    pamstack()
        .args(["--config", &config, "apply", "--dry-run"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run] would be created"))
        .stdout(predicate::str::contains("+auth\trequired\tpam_faildelay.so delay=2000000"));

    assert_eq!(target.read_service("system-auth"), fixtures::FULL);
}

#[test]
fn test_apply_writes_then_is_idempotent() {
    let (target, config) = setup(fixtures::FULL);
    let manifest = target.write_file("stack.toml", MANIFEST);

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 entries changed"));

    let entries = target.service_entries("system-auth");
    assert_eq!(entries[3], "auth        sufficient    pam_sss.so use_first_pass");
    assert_eq!(entries[4], "auth\trequired\tpam_faildelay.so delay=2000000");
    assert_eq!(entries[5], "auth        required      pam_deny.so");

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("already match"));
}

#[test]
fn test_check_reports_missing_then_healthy() {
    let (target, config) = setup(fixtures::FULL);
    let manifest = target.write_file("stack.toml", MANIFEST);

    pamstack()
        .args(["--config", &config, "check"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("MISSING"))
        .stdout(predicate::str::contains("pam_faildelay.so"));
    assert_eq!(target.read_service("system-auth"), fixtures::FULL);

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(&manifest)
        .assert()
        .success();

    pamstack()
        .args(["--config", &config, "check", "--json"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Healthy\""));
}

#[test]
fn test_broken_file_fails_with_line() {
    let (target, config) = setup(fixtures::BROKEN);
    let manifest = target.write_file("stack.toml", MANIFEST);

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(&manifest)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("line 4"));

    assert_eq!(target.read_service("system-auth"), fixtures::BROKEN);
}

#[test]
fn test_missing_manifest_is_a_user_error() {
    let (target, config) = setup(fixtures::FULL);

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(target.root().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Manifest not found"));
}

#[test]
fn test_invalid_position_is_rejected() {
    let (target, config) = setup(fixtures::FULL);
    let manifest = target.write_file(
        "stack.toml",
        "[[entry]]\ntype = \"auth\"\ncontrol = \"required\"\nmodule = \"pam_x.so\"\nposition = \"beside module pam_deny.so\"\n",
    );

    pamstack()
        .args(["--config", &config, "apply"])
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("beside"));
}

#[test]
fn test_completions_bash() {
    pamstack()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pamstack"));
}
