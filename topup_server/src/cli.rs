use std::{env, env::VarError};

/// The server takes no arguments. If any are given, print the help text and the current configuration and return
/// `true` so that the caller can exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // RAZORPAY_WEBHOOK_SECRET is deliberately absent
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "TOPUP_HOST",
        "TOPUP_PORT",
        "TOPUP_DATABASE_URL",
        "TOPUP_SIGNATURE_CHECKS",
        "TOPUP_WEBHOOK_IP_WHITELIST",
        "TOPUP_USE_X_FORWARDED_FOR",
        "TOPUP_USE_FORWARDED",
        "TOPUP_MAX_WRITE_ATTEMPTS",
        "TOPUP_PAYMENT_HISTORY_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    let secret_state = match env::var("RAZORPAY_WEBHOOK_SECRET") {
        Ok(s) if !s.trim().is_empty() => "Set",
        _ => "Not set",
    };
    println!("  {:<35} {secret_state:<15}", "RAZORPAY_WEBHOOK_SECRET");
}
