//! REPL text: input splitting, help screens and spam messages.

use std::io::{self, Write};

use rand::prelude::*;

const MALICIOUS_LOGS: &[&str] = &[
    "Never interrupt your enemy when he is making a mistake.",
    "The hardest thing of all for a soldier is to retreat.",
    "A soldier will fight long and hard for a bit of colored ribbon.",
    "It is well that war is so terrible, otherwise we should grow too fond of it.",
    "The art of war is simple enough. Find out where your enemy is. Get at him as soon as you can.",
    "All warfare is based on deception.",
];

/// Split a line into lowercase words.
pub fn parse_words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}

/// Pick a random line for the `spam` command.
pub fn get_malicious_log() -> String {
    let mut rng = thread_rng();
    MALICIOUS_LOGS.choose(&mut rng).copied().unwrap_or_default().to_string()
}

/// Print the input prompt without a trailing newline.
pub fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

pub fn client_help() -> &'static str {
    "Possible commands:\n\
     * spawn <location> <rank>\n\
     \x20   example:\n\
     \x20   spawn europe infantry\n\
     * move <location> <unitID> <unitID> <unitID>...\n\
     \x20   example:\n\
     \x20   move asia 1\n\
     * status\n\
     * spam <n>\n\
     \x20   example:\n\
     \x20   spam 5\n\
     * quit\n\
     * help"
}

pub fn server_help() -> &'static str {
    "Possible commands:\n\
     * pause\n\
     * resume\n\
     * quit\n\
     * help"
}
