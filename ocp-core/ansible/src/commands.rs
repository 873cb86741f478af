//! 远程 shell 命令构造

use ocp_common::shell_quote;

/// 文件存在时输出 1，否则输出 0
pub fn file_exists(path: &str) -> String {
    format!("test -f {} && echo 1 || echo 0", shell_quote(path))
}

pub fn read_file(path: &str) -> String {
    format!("cat {}", shell_quote(path))
}

/// 列出目录下的 *.yml 文件（通配符不能被引号包住）
pub fn list_playbooks(dir: &str) -> String {
    format!("ls -1 {}/*.yml", shell_quote(dir.trim_end_matches('/')))
}

pub fn remove_file(path: &str) -> String {
    format!("rm {}", shell_quote(path))
}

pub fn run_playbook(dir: &str, inventory: &str, name: &str) -> String {
    format!(
        "cd {} && ansible-playbook -i {} {}",
        shell_quote(dir),
        shell_quote(inventory),
        shell_quote(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands() {
        assert_eq!(
            file_exists("/etc/ansible/playbooks/site.yml"),
            "test -f /etc/ansible/playbooks/site.yml && echo 1 || echo 0"
        );
        assert_eq!(list_playbooks("/etc/ansible/playbooks/"), "ls -1 /etc/ansible/playbooks/*.yml");
        assert_eq!(
            run_playbook("/etc/ansible/playbooks", "/etc/ansible/hosts", "web server.yml"),
            "cd /etc/ansible/playbooks && ansible-playbook -i /etc/ansible/hosts 'web server.yml'"
        );
        assert_eq!(remove_file("/tmp/a b.yml"), "rm '/tmp/a b.yml'");
    }
}
