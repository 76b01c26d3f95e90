#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for the dotfile mutator: true idempotence, in-place
//! keyed updates, and preservation of unrelated lines.

use provision_cli::resources::line::{KeyedValue, LineInFile};
use provision_cli::resources::{Applicable, Resource};

#[test]
fn repeated_line_edits_converge_to_stable_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let rc = tmp.path().join(".zshrc");

    let edits = [
        "export ZSH=\"$HOME/.oh-my-zsh\"",
        "export PATH=\"$HOME/.local/bin:$PATH\"",
        ". \"$HOME/.cargo/env\"",
    ];

    for line in edits {
        LineInFile::new(rc.clone(), line.to_string()).apply().unwrap();
    }
    let first = std::fs::read_to_string(&rc).unwrap();

    // Apply the same sequence twice more.
    for _ in 0..2 {
        for line in edits {
            LineInFile::new(rc.clone(), line.to_string()).apply().unwrap();
        }
    }
    let last = std::fs::read_to_string(&rc).unwrap();
    assert_eq!(first, last, "re-application must be byte-identical");
    assert_eq!(first.lines().count(), 3, "no duplicated lines");
}

#[test]
fn keyed_update_preserves_unrelated_lines_and_order() {
    let tmp = tempfile::tempdir().unwrap();
    let rc = tmp.path().join(".zshrc");
    std::fs::write(
        &rc,
        "# managed rc\nexport EDITOR=nvim\nZSH_THEME=\"old\"\nalias ll='ls -l'\n",
    )
    .unwrap();

    KeyedValue::new(rc.clone(), "ZSH_THEME".to_string(), "\"new\"".to_string())
        .apply()
        .unwrap();

    let content = std::fs::read_to_string(&rc).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "# managed rc");
    assert_eq!(lines[1], "export EDITOR=nvim");
    assert_eq!(lines[2], "ZSH_THEME=\"new\"");
    assert_eq!(lines[3], "alias ll='ls -l'");
}

#[test]
fn keyed_value_state_reports_drift() {
    let tmp = tempfile::tempdir().unwrap();
    let rc = tmp.path().join(".zshrc");
    let resource = KeyedValue::list(rc.clone(), "plugins", &["git", "docker"]);

    assert!(resource.needs_change().unwrap(), "missing file needs change");
    resource.apply().unwrap();
    assert!(!resource.needs_change().unwrap(), "converged state is stable");

    std::fs::write(&rc, "plugins=(git)\n").unwrap();
    assert!(resource.needs_change().unwrap(), "drift must be detected");
}

#[test]
fn mixed_edit_sequence_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let rc = tmp.path().join(".zshrc");

    let run_edits = || {
        LineInFile::new(rc.clone(), "export ZSH=\"$HOME/.oh-my-zsh\"".to_string())
            .apply()
            .unwrap();
        KeyedValue::new(rc.clone(), "ZSH_THEME".to_string(), "\"robbyrussell\"".to_string())
            .apply()
            .unwrap();
        KeyedValue::list(rc.clone(), "plugins", &["git", "zsh-autosuggestions"])
            .apply()
            .unwrap();
        LineInFile::new(rc.clone(), "source $ZSH/oh-my-zsh.sh".to_string())
            .apply()
            .unwrap();
    };

    run_edits();
    let first = std::fs::read_to_string(&rc).unwrap();
    run_edits();
    let second = std::fs::read_to_string(&rc).unwrap();
    assert_eq!(first, second);
    insta::assert_snapshot!(first, @r#"
    export ZSH="$HOME/.oh-my-zsh"
    ZSH_THEME="robbyrussell"
    plugins=(git zsh-autosuggestions)
    source $ZSH/oh-my-zsh.sh
    "#);
}
