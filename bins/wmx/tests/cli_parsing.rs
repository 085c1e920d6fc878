//! CLI argument parsing tests for the wmx command.
//!
//! Only parsing is exercised; nothing here needs a WiMAX device or root.

use assert_cmd::Command;
use predicates::prelude::*;

fn wmx_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wmx"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        wmx_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("WiMAX device control tool"))
            .stdout(predicate::str::contains("--interface"));
    }

    #[test]
    fn test_version() {
        wmx_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("wmx"));
    }

    #[test]
    fn test_invalid_subcommand() {
        wmx_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_requires_subcommand() {
        wmx_cmd().assert().failure();
    }
}

mod rfkill_command {
    use super::*;

    #[test]
    fn test_rfkill_help_lists_positions() {
        wmx_cmd()
            .args(["rfkill", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("on"))
            .stdout(predicate::str::contains("off"))
            .stdout(predicate::str::contains("query"));
    }

    #[test]
    fn test_rfkill_rejects_unknown_position() {
        wmx_cmd()
            .args(["rfkill", "sideways"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_rf_alias() {
        wmx_cmd()
            .args(["rf", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("radio-kill"));
    }
}

mod msg_commands {
    use super::*;

    #[test]
    fn test_msg_write_requires_data() {
        wmx_cmd()
            .args(["msg-write"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn test_msg_write_help() {
        wmx_cmd()
            .args(["msg-write", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--pipe"))
            .stdout(predicate::str::contains("--hex"));
    }

    #[test]
    fn test_msg_read_pipe_conflicts_with_any() {
        wmx_cmd()
            .args(["msg-read", "diag", "--any"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }
}

mod state_commands {
    use super::*;

    #[test]
    fn test_wait_alias() {
        wmx_cmd()
            .args(["wait", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("state change"));
    }

    #[test]
    fn test_monitor_help() {
        wmx_cmd()
            .args(["mon", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--channel"))
            .stdout(predicate::str::contains("--count"));
    }
}
