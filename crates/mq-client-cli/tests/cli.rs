use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const REQUIRED: [(&str, &str); 7] = [
    ("-c", "DEV.APP.SVRCONN"),
    ("-fn", "list-message-ids"),
    ("-pw", "passw0rd"),
    ("-q", "DEV.QUEUE.1"),
    ("-qm", "QM1"),
    ("-t", "jms"),
    ("-u", "app"),
];

fn mq_client(overrides: &[(&str, &str)], skip: Option<&str>) -> Command {
    let mut cmd = Command::cargo_bin("mq-client").unwrap();
    for (flag, value) in REQUIRED {
        if Some(flag) == skip {
            continue;
        }
        let value = overrides
            .iter()
            .find(|(f, _)| *f == flag)
            .map(|(_, v)| *v)
            .unwrap_or(value);
        cmd.args([flag, value]);
    }
    for (flag, value) in overrides {
        if !REQUIRED.iter().any(|(f, _)| f == flag) {
            cmd.args([*flag, *value]);
        }
    }
    // point at a port nothing listens on, in case a broker client is linked in
    cmd.args(["-h", "127.0.0.1"]);
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn missing_required_flags_are_usage_errors() {
    for (flag, _) in REQUIRED {
        mq_client(&[], Some(flag))
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains(
                "the following required arguments were not provided",
            ));
    }
}

#[test]
fn unknown_flag_is_a_usage_error() {
    mq_client(&[("--verbose", "yes")], None)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn unsupported_function() {
    mq_client(&[("-fn", "get-message")], None)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "function value 'get-message' not supported",
        ));
}

#[test]
fn unsupported_type_for_every_function() {
    for function in ["list-message-ids", "put-message"] {
        mq_client(&[("-fn", function), ("-t", "mqi")], None)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("type value 'mqi' not supported"));
    }
}

#[test]
fn non_numeric_port_fails_before_connecting() {
    mq_client(&[("-p", "fourteen-fourteen")], None)
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("invalid port 'fourteen-fourteen'")
                .and(predicate::str::contains("connection failed").not()),
        );
}

#[cfg(not(feature = "ibmmq"))]
#[test]
fn valid_invocation_without_broker_client_reports_connection_error() {
    mq_client(&[("-p", "1414")], None)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("built without IBM MQ client support"));
}

#[test]
fn help_lists_every_flag() {
    Command::cargo_bin("mq-client")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--channel")
                .and(predicate::str::contains("--function"))
                .and(predicate::str::contains("--host-name"))
                .and(predicate::str::contains("--password"))
                .and(predicate::str::contains("--port"))
                .and(predicate::str::contains("--queue"))
                .and(predicate::str::contains("--queue-manager"))
                .and(predicate::str::contains("--type"))
                .and(predicate::str::contains("--userid")),
        );
}
