//! Terminal logging with colored module prefixes.
//!
//! # Usage
//! ```ignore
//! log!("compile"; "{} files written", count);
//! ```

use colored::{ColoredString, Colorize};

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

#[inline]
pub fn log(module: &str, message: &str) {
    println!("{} {message}", colorize_prefix(module));
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold(),
        "error" => prefix.bright_red().bold(),
        "skip" => prefix.dimmed(),
        _ => prefix.bright_yellow().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_contains_module_name() {
        assert!(colorize_prefix("serve").to_string().contains("[serve]"));
        assert!(colorize_prefix("error").to_string().contains("[error]"));
        assert!(colorize_prefix("compile").to_string().contains("[compile]"));
    }
}
