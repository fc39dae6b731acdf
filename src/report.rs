//! Color-tagged status lines on standard output.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn success(msg: &str) {
    println!("{BOLD}{GREEN}SUCCESS:{RESET} {msg}");
}

pub fn warning(msg: &str) {
    println!("{BOLD}{YELLOW}WARNING:{RESET} {msg}");
}

pub fn error(msg: &str) {
    eprintln!("{BOLD}{RED}ERROR:{RESET} {msg}");
}

pub fn info(msg: &str) {
    println!("{CYAN}{msg}{RESET}");
}
