use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn run_shell_with(lines: &[&str], dir: &Path, envs: &[(&str, &str)]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_smallsh"))
        .current_dir(dir)
        .envs(envs.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn smallsh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "exit").expect("write exit");
    }

    child.wait_with_output().expect("wait output")
}

/// Scratch directory removed on drop.
struct TempDir(PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("smallsh_redirect_{label}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        TempDir(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn file(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn output_redirect_creates_and_truncates() {
    let temp = TempDir::new("output");
    std::fs::write(temp.file("out.txt"), "previous contents, much longer than hi\n").unwrap();

    let output = run_shell_with(&["echo hi > out.txt"], temp.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(std::fs::read_to_string(temp.file("out.txt")).unwrap(), "hi\n");
    assert!(!stdout.contains("hi\n"), "output leaked to the terminal: {stdout}");
}

#[test]
fn output_redirect_uses_0664_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new("mode");
    run_shell_with(&["echo hi > fresh.txt"], temp.path(), &[]);

    let mode = std::fs::metadata(temp.file("fresh.txt")).unwrap().permissions().mode();
    // The process umask can only clear bits.
    assert_eq!(mode & 0o777 & !0o664, 0, "mode was {mode:o}");
    assert_ne!(mode & 0o600, 0, "owner read/write missing, mode was {mode:o}");
}

#[test]
fn input_redirect_feeds_stdin() {
    let temp = TempDir::new("input");
    std::fs::write(temp.file("in.txt"), "a\nb\nc\n").unwrap();

    let output = run_shell_with(&["wc -l < in.txt"], temp.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains('3'), "stdout was: {stdout}");
}

#[test]
fn missing_input_aborts_and_sets_status() {
    let temp = TempDir::new("badinput");
    let output = run_shell_with(
        &["cat < nope.txt > out.txt", "status", "echo ALIVE"],
        temp.path(),
        &[],
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(stderr.contains("cannot open nope.txt for input"), "stderr was: {stderr}");
    assert!(stdout.contains("exit value 1"), "stdout was: {stdout}");
    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(!temp.file("out.txt").exists(), "output file created despite failed input");
}

#[test]
fn unwritable_output_is_reported() {
    let temp = TempDir::new("badoutput");
    let output = run_shell_with(&["echo hi > missing_dir/out.txt", "status"], temp.path(), &[]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stderr.contains("cannot open missing_dir/out.txt for output"),
        "stderr was: {stderr}"
    );
    assert!(stdout.contains("exit value 1"), "stdout was: {stdout}");
}

#[test]
fn both_redirections_bind_requested_program() {
    let temp = TempDir::new("both");
    std::fs::write(temp.file("in.txt"), "pear\napple\nfig\n").unwrap();

    run_shell_with(&["sort < in.txt > sorted.txt"], temp.path(), &[]);
    assert_eq!(
        std::fs::read_to_string(temp.file("sorted.txt")).unwrap(),
        "apple\nfig\npear\n"
    );
}

#[test]
fn multi_redirect_filter_reproduces_word_count_quirk() {
    let temp = TempDir::new("filter");
    std::fs::write(temp.file("in.txt"), "pear\napple\nfig\n").unwrap();

    run_shell_with(
        &["sort < in.txt > counted.txt"],
        temp.path(),
        &[("SMALLSH_MULTI_REDIRECT_FILTER", "wc")],
    );
    let counted = std::fs::read_to_string(temp.file("counted.txt")).unwrap();
    let fields: Vec<&str> = counted.split_whitespace().collect();
    assert_eq!(fields, vec!["3", "3", "15"], "wc output was: {counted}");
}

#[test]
fn redirection_without_program_is_ignored() {
    let temp = TempDir::new("noprogram");
    let output = run_shell_with(&["> out.txt", "echo ALIVE"], temp.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("ALIVE"), "stdout was: {stdout}");
    assert!(!temp.file("out.txt").exists());
}

#[test]
fn redirected_filename_expands_placeholder() {
    let temp = TempDir::new("expand");
    let mut child = Command::new(env!("CARGO_BIN_EXE_smallsh"))
        .current_dir(temp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn smallsh");
    let pid = child.id();
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "echo tagged > log.$$").expect("write line");
        writeln!(stdin, "exit").expect("write exit");
    }
    child.wait_with_output().expect("wait output");

    let contents = std::fs::read_to_string(temp.file(&format!("log.{pid}"))).unwrap();
    assert_eq!(contents, "tagged\n");
}
