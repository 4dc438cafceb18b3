// SPDX-License-Identifier: MIT

//! The "dated password" confirmation required before an
//! operation modifies more than `PW_CHECK_NUM` records, ported from
//! `lpad_run.py::pw_check`: either pass `--password` set to today's
//! date, or answer the interactive Y/N prompt (which the original
//! treats as equivalent to supplying that password).

use crate::exit_error::ExitError;
use std::io::Write;

/// `PW_CHECK_NUM`: bulk admin ops touching more than this
/// many records need confirmation.
pub const PW_CHECK_NUM: usize = 1;

pub fn confirm_bulk(count: usize, password: Option<&str>, yes: bool) -> Result<(), ExitError> {
    if count <= PW_CHECK_NUM {
        return Ok(());
    }
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    if let Some(given) = password {
        return if given == today {
            Ok(())
        } else {
            Err(ExitError::user(format!(
                "modifying more than {PW_CHECK_NUM} entries requires --password set to today's date ({today})"
            )))
        };
    }

    if yes {
        return Ok(());
    }

    print!("Are you sure? This will modify {count} entries. (Y/N) ");
    std::io::stdout().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(|e| ExitError::user(e.to_string()))?;
    match line.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('Y') => Ok(()),
        _ => Err(ExitError::user("operation aborted by user")),
    }
}
