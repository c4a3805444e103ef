use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    wordlist: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let wordlist = dir.path().join("words.wlh");
        fs::write(&wordlist, "# sample\nab-cd\nEf-gh-ij\nxb-cy\n").unwrap();
        Self { dir, wordlist }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_patgen-tuner"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

fn s(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_translate_writes_table_beside_wordlist() {
    let ctx = TestContext::new();
    let output = run(&["translate", s(&ctx.wordlist)]);
    assert!(output.status.success(), "{:?}", output);

    let table = fs::read_to_string(ctx.path("words.wlh.tra")).unwrap();
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some(" 2 2  -"));
    let pair = Regex::new(r"^ [a-z] [A-Z]$").unwrap();
    let rest: Vec<&str> = lines.collect();
    assert!(rest.iter().all(|l| pair.is_match(l)), "{:?}", rest);
    assert_eq!(rest.len(), "abcdefghijxy".len());
}

#[test]
fn test_translate_honours_overrides() {
    let ctx = TestContext::new();
    let output = run(&[
        "translate",
        s(&ctx.wordlist),
        "--left-hyphen-min",
        "1",
        "--right-hyphen-min",
        "3",
    ]);
    assert!(output.status.success());
    let table = fs::read_to_string(ctx.path("words.wlh.tra")).unwrap();
    assert!(table.starts_with(" 1 3  -\n"));
}

#[test]
fn test_hyphenate_words_from_arguments() {
    let ctx = TestContext::new();
    let patterns = ctx.path("bc.pat");
    fs::write(&patterns, "b1c\n").unwrap();
    let table = ctx.path("bc.tra");
    fs::write(&table, " 1 1  -\n a A\n b B\n c C\n d D\n").unwrap();

    let output = run(&[
        "hyphenate",
        "--patterns",
        s(&patterns),
        "--translate",
        s(&table),
        "abcd",
        "dcba",
    ]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["ab-cd", "dcba"]);
}

#[test]
fn test_search_without_wordlist_fails() {
    let ctx = TestContext::new();
    let output = run(&[
        "search",
        "--wordlist",
        s(&ctx.path("missing.wlh")),
        "--translate",
        s(&ctx.path("missing.tra")),
    ]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_validate_rejects_single_fold() {
    let ctx = TestContext::new();
    let tra = ctx.path("words.tra");
    fs::write(&tra, " 1 1  -\n a A\n").unwrap();
    let params = ctx.path("params.in");
    fs::write(&params, "1 1 1 1 1\n").unwrap();

    let output = run(&[
        "validate",
        "--folds",
        "1",
        "--wordlist",
        s(&ctx.wordlist),
        "--translate",
        s(&tra),
        "--params",
        s(&params),
    ]);
    assert_eq!(output.status.code(), Some(1));
}

/// A stand-in for patgen that always learns `b1c`.
#[cfg(unix)]
fn fake_patgen(ctx: &TestContext) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = ctx.path("fake-patgen.sh");
    fs::write(
        &script,
        "#!/bin/sh\ncat > /dev/null\nprintf 'b1c\\n' > \"$3\"\necho \"3 good, 0 bad, 0 missed\"\n",
    )
    .unwrap();
    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn test_search_end_to_end_with_external_generator() {
    let ctx = TestContext::new();
    let patgen = fake_patgen(&ctx);
    let tra = ctx.path("words.tra");
    fs::write(&tra, " 1 1  -\n a A\n").unwrap();
    let params = ctx.path("params.in");
    fs::write(&params, "1 2 1 1 1\n").unwrap();
    let out_dir = ctx.path("out");
    let history = ctx.path("history.csv");
    let history_json = ctx.path("history.json");

    let output = run(&[
        "search",
        "--patgen",
        s(&patgen),
        "--wordlist",
        s(&ctx.wordlist),
        "--translate",
        s(&tra),
        "--params",
        s(&params),
        "--metaheuristic",
        "none",
        "--out-dir",
        s(&out_dir),
        "--name",
        "best.pat",
        "--history-csv",
        s(&history),
        "--history-json",
        s(&history_json),
    ]);
    assert!(output.status.success(), "{:?}", output);

    assert_eq!(fs::read_to_string(out_dir.join("best.pat")).unwrap(), "b1c\n");
    let csv = fs::read_to_string(&history).unwrap();
    assert!(csv.starts_with("level,run_id,prev,"));
    assert_eq!(csv.lines().count(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&history_json).unwrap()).unwrap();
    let levels = json["level_outputs"].as_array().unwrap();
    assert_eq!(levels.len(), 1);
    assert_eq!(levels[0][0]["threshold"], 1);
}

#[cfg(unix)]
#[test]
fn test_config_file_is_merged_with_flags() {
    let ctx = TestContext::new();
    let patgen = fake_patgen(&ctx);
    let tra = ctx.path("words.tra");
    fs::write(&tra, " 1 1  -\n a A\n").unwrap();
    let params = ctx.path("params.in");
    fs::write(&params, "1 2 1 1 1\n1 3 1 1 1\n").unwrap();
    let config = ctx.path("config.json");
    fs::write(
        &config,
        format!(
            r#"{{ "search": {{ "metaheuristic": "none" }},
                  "paths": {{ "patgen": "{}", "wordlist": "{}", "translate": "{}", "params": "{}" }} }}"#,
            s(&patgen),
            s(&ctx.wordlist),
            s(&tra),
            s(&params)
        ),
    )
    .unwrap();
    let out_dir = ctx.path("out");

    let output = run(&[
        "--config-file",
        s(&config),
        "search",
        "--out-dir",
        s(&out_dir),
        "--name",
        "merged.pat",
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert!(out_dir.join("merged.pat").is_file());
}
