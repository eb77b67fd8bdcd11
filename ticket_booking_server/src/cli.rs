use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "TBS_HOST",
        "TBS_PORT",
        "TBS_DATABASE_URL",
        "TBS_CATALOG_URL",
        "TBS_CATALOG_TIMEOUT",
        "TBS_EXTERNAL_CALL_TIMEOUT_MS",
        "TBS_AVAILABILITY_CACHE_ENABLED",
        "TBS_AVAILABILITY_CACHE_TTL",
        "TBS_UNPAID_BOOKING_TIMEOUT",
        "TBS_RELEASE_ON_CONFIRMED_CANCEL",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
