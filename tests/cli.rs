use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const WEB_RESPONSE: &str = "Here is your game!\n--- HTML ---\n<!DOCTYPE html><html><body><canvas></canvas></body></html>\n--- INSTRUCTIONS ---\nUse the arrow keys.\n";

fn gameforge(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gameforge").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn builds_game_from_response_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("response.txt"), WEB_RESPONSE).unwrap();

    gameforge(&temp_dir)
        .args(["response.txt", "--output", "site", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved HTML to index.html"))
        .stdout(predicate::str::contains("Written: 2"));

    let site = temp_dir.path().join("site");
    assert_eq!(
        fs::read_to_string(site.join("instructions.txt")).unwrap(),
        "Use the arrow keys."
    );
    assert!(fs::read_to_string(site.join("index.html"))
        .unwrap()
        .starts_with("<!DOCTYPE html>"));
}

#[test]
fn reads_response_from_stdin() {
    let temp_dir = TempDir::new().unwrap();

    gameforge(&temp_dir)
        .args(["-", "--output", "game", "--quiet"])
        .write_stdin(WEB_RESPONSE)
        .assert()
        .success();

    assert!(temp_dir.path().join("game/index.html").is_file());
}

#[test]
fn stale_files_are_removed() {
    let temp_dir = TempDir::new().unwrap();
    let game = temp_dir.path().join("game");
    fs::create_dir_all(&game).unwrap();
    fs::write(game.join("old_level.txt"), "stale").unwrap();
    fs::write(
        temp_dir.path().join("response.txt"),
        "--- HTML ---\n<p>new</p>\n--- INSTRUCTIONS ---\n\n",
    )
    .unwrap();

    gameforge(&temp_dir)
        .args(["response.txt", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped INSTRUCTIONS, section is empty"));

    assert!(!game.join("old_level.txt").exists());
    assert!(!game.join("instructions.txt").exists());
    assert_eq!(fs::read_to_string(game.join("index.html")).unwrap(), "<p>new</p>");
}

#[test]
fn dry_run_does_not_touch_output() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("response.txt"), WEB_RESPONSE).unwrap();

    gameforge(&temp_dir)
        .args(["response.txt", "--dry-run", "--output-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dry_run\": true"))
        .stdout(predicate::str::contains("\"status\": \"written\""));

    assert!(!temp_dir.path().join("game").exists());
}

#[test]
fn pygame_schema_reads_fenced_blocks() {
    let temp_dir = TempDir::new().unwrap();
    let response = "--- PYTHON_CODE ---\n```\nimport pygame\n```\n--- INSTRUCTIONS ---\n```\nPress space\n```\n";
    fs::write(temp_dir.path().join("response.txt"), response).unwrap();

    gameforge(&temp_dir)
        .args(["response.txt", "--schema", "pygame", "--output", "pygame_game", "-q"])
        .assert()
        .success();

    let out = temp_dir.path().join("pygame_game");
    assert_eq!(fs::read_to_string(out.join("app.py")).unwrap(), "import pygame");
    assert_eq!(
        fs::read_to_string(out.join("instructions.txt")).unwrap(),
        "Press space"
    );
    assert!(!out.join("index.html").exists());
}

#[test]
fn require_sections_fails_on_empty_response() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("response.txt"), "Sorry, I cannot help.").unwrap();

    gameforge(&temp_dir)
        .args(["response.txt", "--require-sections", "--output-format", "plain"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("ERROR"));

    assert!(!temp_dir.path().join("game").exists());
}

#[test]
fn missing_response_file_is_invalid_input() {
    let temp_dir = TempDir::new().unwrap();

    gameforge(&temp_dir)
        .args(["missing.txt", "--output-format", "plain"])
        .assert()
        .code(2);
}

#[test]
fn invalid_wallet_is_rejected_before_generation() {
    let temp_dir = TempDir::new().unwrap();

    gameforge(&temp_dir)
        .args(["--prompt", "a maze game", "--wallet", "not-a-wallet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0x"));
}

#[test]
fn wallet_with_response_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("r.txt"), WEB_RESPONSE).unwrap();

    gameforge(&temp_dir)
        .args([
            "r.txt",
            "--wallet",
            "0x52908400098527886E0F7030069857D2E4169EE7",
            "--output",
            "g",
        ])
        .assert()
        .code(2);

    assert!(!temp_dir.path().join("g").exists());
}

#[test]
fn prompt_without_generator_is_config_error() {
    let temp_dir = TempDir::new().unwrap();

    gameforge(&temp_dir)
        .args(["--prompt", "a maze game", "--output-format", "plain"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("generator"));
}

#[cfg(unix)]
#[test]
fn prompt_uses_configured_generator() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("gameforge.toml"),
        r#"[generator]
command = ["sh", "-c", "cat > /dev/null; printf '%s\n%s\n%s\n%s' '--- HTML ---' '<p>made</p>' '--- INSTRUCTIONS ---' 'Click'"]

[archive]
directory = "responses"
"#,
    )
    .unwrap();

    gameforge(&temp_dir)
        .args([
            "--prompt",
            "a clicker",
            "--wallet",
            "0x52908400098527886E0F7030069857D2E4169EE7",
            "-q",
        ])
        .assert()
        .success();

    let game = temp_dir.path().join("game");
    assert_eq!(fs::read_to_string(game.join("index.html")).unwrap(), "<p>made</p>");
    assert_eq!(fs::read_dir(temp_dir.path().join("responses")).unwrap().count(), 1);
}

#[test]
fn generate_config_writes_sample() {
    let temp_dir = TempDir::new().unwrap();

    gameforge(&temp_dir)
        .args(["--generate-config", "--config", "sample.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sample.toml"));

    let content = fs::read_to_string(temp_dir.path().join("sample.toml")).unwrap();
    assert!(content.contains("[output]"));
}
