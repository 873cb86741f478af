//! SSH 会话测试
//!
//! 使用 shell 脚本模拟 ssh/scp，脚本把每次调用追加到 calls.log。

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ocp_ssh_executor::{SshClient, SshConfig, SshError};
use tempfile::TempDir;

const FAKE_SSH: &str = r#"#!/bin/sh
dir=$(dirname "$0")
log=""; ctl=""; master=0; op=""; last=""
while [ $# -gt 0 ]; do
  case "$1" in
    -E) log="$2"; shift ;;
    -O) op="$2"; shift ;;
    -o) case "$2" in ControlPath=*) ctl="${2#ControlPath=}" ;; esac; shift ;;
    -p|-i) shift ;;
    -f) master=1 ;;
    -N) ;;
    *) last="$1" ;;
  esac
  shift
done
if [ "$op" = "exit" ]; then
  echo "exit" >> "$dir/calls.log"
  rm -f "$ctl"
  exit 0
fi
if [ "$master" = "1" ]; then
  echo "master" >> "$dir/calls.log"
  @MASTER@
fi
echo "run $last" >> "$dir/calls.log"
@RUN@
"#;

const MASTER_OK: &str = r#": > "$ctl"; exit 0"#;
const MASTER_DENIED: &str = r#"echo "root@10.0.0.5: Permission denied (publickey)." > "$log"; exit 255"#;

const RUN_OK: &str = r#"sh -c "$last""#;
const RUN_BROKEN: &str =
    r#"echo "mux_client_request_session: read from master failed: Broken pipe" >&2; exit 255"#;

const SCP_OK: &str = r#"#!/bin/sh
echo "scp $*" >> "$(dirname "$0")/calls.log"
"#;

const SCP_DENIED: &str = r#"#!/bin/sh
echo "scp: /etc/ansible/playbooks/site.yml: Permission denied" >&2
exit 1
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn setup(master: &str, run: &str, scp: &str) -> (TempDir, SshClient) {
    let dir = TempDir::new().unwrap();
    let ssh = write_script(
        dir.path(),
        "ssh",
        &FAKE_SSH.replace("@MASTER@", master).replace("@RUN@", run),
    );
    let scp = write_script(dir.path(), "scp", scp);

    let config = SshConfig::with_default_key("10.0.0.5", "root")
        .connect_timeout(Duration::from_secs(5))
        .programs(ssh, scp);
    (dir, SshClient::new(config))
}

fn calls(dir: &TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_connect_execute_upload_disconnect() {
    let (dir, mut client) = setup(MASTER_OK, RUN_OK, SCP_OK);

    client.connect().await.unwrap();
    assert!(client.is_connected());

    let output = client.execute("echo hello; echo oops >&2").await.unwrap();
    assert_eq!(output.stdout, "hello\n");
    assert_eq!(output.stderr, "oops\n");
    assert_eq!(output.exit_code, Some(0));

    let local = dir.path().join("site.yml");
    std::fs::write(&local, "- hosts: all\n").unwrap();
    client.upload(&local, "/etc/ansible/playbooks/site.yml").await.unwrap();

    client.disconnect().await.unwrap();
    assert!(!client.is_connected());
    client.disconnect().await.unwrap();

    let calls = calls(&dir);
    assert_eq!(calls[0], "master");
    assert_eq!(calls[1], "run echo connected");
    let scp = calls.iter().find(|c| c.starts_with("scp ")).unwrap();
    assert!(scp.contains("ControlPath="));
    assert!(scp.ends_with("root@10.0.0.5:/etc/ansible/playbooks/site.yml"));
    assert_eq!(calls.iter().filter(|c| *c == "exit").count(), 1);
}

#[tokio::test]
async fn test_failed_verification_closes_master() {
    let (dir, mut client) = setup(MASTER_OK, RUN_BROKEN, SCP_OK);

    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, SshError::ConnectionError(_)), "{:?}", err);
    assert!(!client.is_connected());

    // 半连接状态下断开同样安全
    client.disconnect().await.unwrap();

    let calls = calls(&dir);
    assert_eq!(calls, vec!["master", "run echo connected", "exit"]);
}

#[tokio::test]
async fn test_permission_denied_is_authentication_error() {
    let (dir, mut client) = setup(MASTER_DENIED, RUN_OK, SCP_OK);

    match client.connect().await {
        Err(SshError::AuthenticationError(message)) => {
            assert!(message.contains("Permission denied"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!client.is_connected());
    client.disconnect().await.unwrap();

    assert_eq!(calls(&dir), vec!["master"]);
}

#[tokio::test]
async fn test_scp_failure_is_transfer_error() {
    let (dir, mut client) = setup(MASTER_OK, RUN_OK, SCP_DENIED);
    client.connect().await.unwrap();

    let local = dir.path().join("site.yml");
    std::fs::write(&local, "- hosts: all\n").unwrap();
    match client.upload(&local, "/etc/ansible/playbooks/site.yml").await {
        Err(SshError::TransferError(message)) => assert!(message.contains("Permission denied")),
        other => panic!("unexpected result: {:?}", other),
    }

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_drop_closes_master_in_background() {
    let (dir, mut client) = setup(MASTER_OK, RUN_OK, SCP_OK);
    client.connect().await.unwrap();

    drop(client);

    let mut closed = false;
    for _ in 0..50 {
        if calls(&dir).iter().any(|c| c == "exit") {
            closed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(closed, "master was not closed after drop");
}
