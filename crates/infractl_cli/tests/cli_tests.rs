//! End-to-end tests of the `infractl` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const BASE: &str = r#"
config:
  version: "1.0"
product:
  name: acme
stacks:
  - name: core
    layers:
      - name: network
        components:
          - name: vpc
"#;

const DEV: &str = r#"
config:
  version: "2.0"
git:
  base_url: ${INFRACTL_CLI_TEST_GIT_URL:-github.com/acme}
"#;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn repo() -> TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir(root.join(".git")).unwrap();
    write(&root.join("infra/terragrunt/_ENVS/base.yaml"), BASE);
    write(&root.join("infra/terragrunt/_ENVS/dev.yaml"), DEV);
    write(&root.join("infra/terragrunt/core/network/vpc/component.hcl"), "");
    write(&root.join("infra/terragrunt/core/network/vpc/terragrunt.hcl"), "");
    temp
}

fn infractl() -> Command {
    let mut cmd = Command::cargo_bin("infractl").unwrap();
    cmd.env_remove("INFRACTL_CLI_TEST_GIT_URL").env_remove("CI");
    cmd
}

#[test]
fn test_help_lists_commands() {
    infractl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_plan_requires_stack() {
    infractl().arg("plan").assert().code(2);
}

#[test]
fn test_component_without_layer_is_invalid() {
    let repo = repo();
    infractl()
        .current_dir(repo.path())
        .args(["plan", "--stack", "core", "--component", "vpc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires a layer"));
}

#[test]
fn test_validate_outside_repository() {
    let temp = tempdir().unwrap();
    // Only meaningful when the temp dir is not itself inside a checkout.
    if temp.path().ancestors().any(|dir| dir.join(".git").exists()) {
        return;
    }
    infractl()
        .current_dir(temp.path())
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("repository root"));
}

#[test]
fn test_validate_compiles_repository() {
    let repo = repo();
    infractl()
        .current_dir(repo.path())
        .args(["validate", "--target-env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("core"));
}

#[test]
fn test_validate_require_env_fails_with_validation_code() {
    let repo = repo();
    infractl()
        .current_dir(repo.path())
        .args(["validate", "--target-env", "dev", "--require-env"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("INFRACTL_CLI_TEST_GIT_URL"));
}

#[test]
fn test_unknown_stack_directory_is_not_found() {
    let repo = repo();
    fs::remove_dir_all(repo.path().join("infra/terragrunt/core")).unwrap();
    infractl()
        .current_dir(repo.path())
        .args(["validate", "--target-env", "dev"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("core"));
}

#[test]
fn test_dry_run_plan_prints_command() {
    let repo = repo();
    infractl()
        .current_dir(repo.path())
        .args([
            "--dry-run",
            "plan",
            "--stack",
            "core",
            "--layer",
            "network",
            "--component",
            "vpc",
            "--target-env",
            "dev",
            "--override-json-name",
            "dev-compiled",
            "--",
            "-lock=false",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "terragrunt plan --terragrunt-non-interactive -lock=false",
        ));

    let cached = repo.path().join("infra/.infractl-cache/dev-compiled.json");
    let json = fs::read_to_string(cached).unwrap();
    assert!(json.contains("github.com/acme"));
}

#[test]
fn test_dry_run_plan_keeps_unset_placeholder() {
    let repo = repo();
    write(
        &repo.path().join("infra/terragrunt/_ENVS/stage.yaml"),
        "config:\n  version: \"1\"\n  description: ${INFRACTL_CLI_TEST_UNSET_DESC}\n",
    );

    infractl()
        .current_dir(repo.path())
        .env_remove("INFRACTL_CLI_TEST_UNSET_DESC")
        .args([
            "--dry-run",
            "plan",
            "--stack",
            "core",
            "--target-env",
            "stage",
            "--override-json-name",
            "stage",
        ])
        .assert()
        .success();

    let json =
        fs::read_to_string(repo.path().join("infra/.infractl-cache/stage.json")).unwrap();
    assert!(json.contains("${INFRACTL_CLI_TEST_UNSET_DESC}"));
}
