//! Keyword rules that map an instruction to commands without a model.
//!
//! Every rule group is tested independently and appends its commands in
//! declaration order, so one instruction can trigger several groups.

use crate::types::{RiskLevel, Suggestion};
use regex::Regex;
use std::sync::LazyLock;

const DEFAULT_DIRECTORY: &str = "new_directory";
const DEFAULT_FILE: &str = "new_file.txt";
const DEFAULT_SEARCH_TERM: &str = "search_term";
const DEFAULT_PACKAGE: &str = "package_name";

static DIRECTORY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:director(?:y|ies)|folders?)\s+(?:(?:called|named)\s+)?([\w./-]+)")
        .expect("directory pattern compiles")
});

static FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfiles?\s+(?:(?:called|named)\s+)?([\w./-]+)")
        .expect("file pattern compiles")
});

static SEARCH_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:find|search)\s+(?:(?:for|files?|the|all)\s+)*(?:(?:called|named)\s+)?([\w./*-]+)")
        .expect("search pattern compiles")
});

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:install|add)\s+(?:(?:the|a|package)\s+)*(?:(?:called|named)\s+)?([\w@./-]+)")
        .expect("package pattern compiles")
});

static COMMIT_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("commit message pattern compiles"));

/// Words that follow a keyword without naming anything, e.g. "file in src".
const FILLER_WORDS: &[&str] = &[
    "a", "an", "and", "at", "for", "from", "in", "into", "of", "on", "the", "to", "with",
];

const CREATE_WORDS: &[&str] = &["create", "make", "new", "touch"];
/// Stems, so plurals and inflections ("folders", "deleting") still match.
const DELETE_STEMS: &[&str] = &["delet", "remov", "erase"];
const DIRECTORY_STEMS: &[&str] = &["director", "folder"];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Single-quotes `text` for the shell so nothing inside it is expanded.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .any(|token| token == word)
}

fn has_any_word(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| has_word(text, w))
}

fn capture_or(re: &Regex, text: &str, fallback: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.'))
        .filter(|name| !name.is_empty() && !FILLER_WORDS.contains(name))
        .unwrap_or(fallback)
        .to_string()
}

pub fn directory_name(text: &str) -> String {
    capture_or(&DIRECTORY_NAME, text, DEFAULT_DIRECTORY)
}

pub fn file_name(text: &str) -> String {
    capture_or(&FILE_NAME, text, DEFAULT_FILE)
}

pub fn search_term(text: &str) -> String {
    capture_or(&SEARCH_TERM, text, DEFAULT_SEARCH_TERM)
}

pub fn package_name(text: &str) -> String {
    capture_or(&PACKAGE_NAME, text, DEFAULT_PACKAGE)
}

/// Resolves an instruction with the built-in rules. Never returns an empty
/// list: when nothing matches, a generic set of safe commands is offered.
pub fn match_patterns(instruction: &str) -> Vec<Suggestion> {
    let text = instruction.trim().to_lowercase();
    let mut out = Vec::new();

    let mentions_directory = contains_any(&text, DIRECTORY_STEMS);
    let mentions_file = text.contains("file");

    if has_word(&text, "list") || text.contains("show files") || text.contains("show all files")
    {
        out.push(Suggestion::new(
            "ls -la",
            "List all files, including hidden ones",
            RiskLevel::Low,
        ));
        out.push(Suggestion::new(
            "ls -lh",
            "List files with human-readable sizes",
            RiskLevel::Low,
        ));
    }

    if has_any_word(&text, CREATE_WORDS) && mentions_directory {
        let dir = directory_name(&text);
        out.push(Suggestion::new(
            format!("mkdir -p {dir}"),
            format!("Create directory '{dir}' (and any missing parents)"),
            RiskLevel::Low,
        ));
    }

    // touch never overwrites contents, so creation stays low.
    if has_any_word(&text, CREATE_WORDS) && mentions_file {
        let file = file_name(&text);
        out.push(Suggestion::new(
            format!("touch {file}"),
            format!("Create empty file '{file}'"),
            RiskLevel::Low,
        ));
    }

    if contains_any(&text, DELETE_STEMS) {
        if mentions_directory {
            let dir = directory_name(&text);
            out.push(Suggestion::new(
                format!("rm -rf {dir}"),
                format!("Permanently delete directory '{dir}' and everything in it"),
                RiskLevel::High,
            ));
        } else if mentions_file {
            let file = file_name(&text);
            out.push(Suggestion::new(
                format!("rm {file}"),
                format!("Delete file '{file}'"),
                RiskLevel::Medium,
            ));
        }
    }

    if has_word(&text, "git") {
        if has_word(&text, "status") {
            out.push(Suggestion::new(
                "git status",
                "Show the working tree status",
                RiskLevel::Low,
            ));
        }
        if has_word(&text, "add") {
            out.push(Suggestion::new(
                "git add .",
                "Stage all changes in the current directory",
                RiskLevel::Low,
            ));
        }
        if has_word(&text, "commit") {
            let message = COMMIT_MESSAGE
                .captures(instruction)
                .and_then(|caps| caps.get(1))
                .map_or("Update", |m| m.as_str());
            out.push(Suggestion::new(
                format!("git commit -m {}", shell_quote(message)),
                "Commit staged changes",
                RiskLevel::Medium,
            ));
        }
        if has_word(&text, "push") {
            out.push(Suggestion::new(
                "git push origin main",
                "Push local commits to the main branch on origin",
                RiskLevel::Medium,
            ));
            out.push(Suggestion::new(
                "git push",
                "Push local commits to the tracked upstream branch",
                RiskLevel::Medium,
            ));
        }
        if has_word(&text, "pull") {
            out.push(Suggestion::new(
                "git pull",
                "Fetch and merge changes from the upstream branch",
                RiskLevel::Medium,
            ));
        }
    }

    if text.contains("current directory") || text.contains("where am i") || has_word(&text, "pwd")
    {
        out.push(Suggestion::new(
            "pwd",
            "Print the current working directory",
            RiskLevel::Low,
        ));
    }

    if has_any_word(&text, &["disk", "space", "storage"]) {
        out.push(Suggestion::new(
            "df -h",
            "Show free space on mounted filesystems",
            RiskLevel::Low,
        ));
        out.push(Suggestion::new(
            "du -sh *",
            "Show the size of each item in the current directory",
            RiskLevel::Low,
        ));
    }

    if text.contains("process") {
        out.push(Suggestion::new(
            "ps aux",
            "List all running processes",
            RiskLevel::Low,
        ));
        out.push(Suggestion::new(
            "top -b -n 1 | head -n 20",
            "Show a snapshot of the busiest processes",
            RiskLevel::Low,
        ));
    }

    if has_any_word(&text, &["find", "search"]) {
        let term = search_term(&text);
        out.push(Suggestion::new(
            format!("find . -name \"*{term}*\""),
            format!("Find files whose name contains '{term}'"),
            RiskLevel::Low,
        ));
        out.push(Suggestion::new(
            format!("grep -rn \"{term}\" ."),
            format!("Search file contents for '{term}'"),
            RiskLevel::Low,
        ));
    }

    if has_word(&text, "install") {
        let package = package_name(&text);
        out.push(Suggestion::new(
            format!("npm install {package}"),
            format!("Install '{package}' with npm"),
            RiskLevel::Medium,
        ));
        out.push(Suggestion::new(
            format!("pip install {package}"),
            format!("Install '{package}' with pip"),
            RiskLevel::Medium,
        ));
    }

    if has_any_word(&text, &["start", "run"]) && has_any_word(&text, &["server", "dev"]) {
        out.push(Suggestion::new(
            "npm run dev",
            "Start the development server",
            RiskLevel::Low,
        ));
        out.push(Suggestion::new(
            "npm start",
            "Start the application",
            RiskLevel::Low,
        ));
    }

    if has_word(&text, "build") {
        out.push(Suggestion::new(
            "npm run build",
            "Build the project with npm",
            RiskLevel::Low,
        ));
        out.push(Suggestion::new("make", "Build the project with make", RiskLevel::Low));
    }

    if out.is_empty() {
        out = fallback();
    }
    out
}

fn fallback() -> Vec<Suggestion> {
    vec![
        Suggestion::new("ls -la", "List files in the current directory", RiskLevel::Low),
        Suggestion::new("pwd", "Show the current directory", RiskLevel::Low),
        Suggestion::new("help", "Show shell help", RiskLevel::Low),
    ]
}
