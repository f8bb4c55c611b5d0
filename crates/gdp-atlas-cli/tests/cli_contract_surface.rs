use assert_cmd::Command;
use predicates::prelude::*;

fn parse_commands_from_help(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_commands = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed == "Commands:" {
            in_commands = true;
            continue;
        }
        if in_commands {
            if trimmed.is_empty() {
                break;
            }
            let name = trimmed.split_whitespace().next().unwrap_or("");
            if !name.is_empty() && name != "help" {
                commands.push(name.to_string());
            }
        }
    }
    commands.sort();
    commands
}

#[test]
fn help_command_surface_is_stable() {
    let output = Command::cargo_bin("gdp-atlas")
        .expect("binary")
        .arg("--help")
        .output()
        .expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 help");
    let expected = include_str!("snapshots/help.commands.txt")
        .lines()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(parse_commands_from_help(&text), expected);
}

#[test]
fn version_output_contains_crate_version() {
    Command::cargo_bin("gdp-atlas")
        .expect("binary")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    let output = Command::cargo_bin("gdp-atlas")
        .expect("binary")
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run bad cli");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let machine: serde_json::Value =
        serde_json::from_str(stderr.trim()).expect("machine error json");
    assert_eq!(machine["code"], "usage_error");
}

#[test]
fn missing_command_is_a_usage_error() {
    Command::cargo_bin("gdp-atlas")
        .expect("binary")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing command"));
}

#[test]
fn unknown_backend_value_is_rejected_by_the_parser() {
    Command::cargo_bin("gdp-atlas")
        .expect("binary")
        .args(["--backend", "odbc", "tables"])
        .assert()
        .code(2);
}
