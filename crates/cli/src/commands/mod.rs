// SPDX-License-Identifier: MIT

//! The flat `fwlp <command>` surface.

mod admin;
mod lifecycle;
mod query;
mod setup;
mod stub;

pub use query::QueryArgs;
pub use setup::{add as add_cmd, init as init_cmd, reset as reset_cmd};

use crate::exit_error::ExitError;
use crate::output::OutputFormat;
use clap::Subcommand;
use fwrs_core::SystemClock;
use fwrs_engine::Launchpad;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactively write a launchpad config file.
    Init,
    /// Wipe the launchpad.
    Reset {
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Insert one or more workflow files.
    Add {
        paths: Vec<PathBuf>,
        /// Treat each path as a directory of `*.json` workflow files.
        #[arg(long)]
        dir: bool,
    },
    GetFws {
        #[command(flatten)]
        query: QueryArgs,
    },
    GetWflows {
        #[command(flatten)]
        query: QueryArgs,
    },
    RerunFws {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    DefuseFws {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    PauseFws {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    ReigniteFws {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    ResumeFws {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    DefuseWflows {
        fw_ids: Vec<u64>,
        #[arg(long)]
        defuse_all_states: bool,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    PauseWflows {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    ReigniteWflows {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    ArchiveWflows {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    DeleteWflows {
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    DetectUnreserved {
        #[arg(long, default_value_t = fwrs_engine::config::DEFAULT_RESERVATION_EXPIRATION_SECS)]
        expiration_secs: u64,
        #[arg(long)]
        rerun: bool,
    },
    DetectLostruns {
        #[arg(long, default_value_t = fwrs_engine::config::DEFAULT_RUN_EXPIRATION_SECS)]
        expiration_secs: u64,
        #[arg(long)]
        rerun: bool,
        #[arg(long)]
        refresh: bool,
    },
    SetPriority {
        priority: i64,
        fw_ids: Vec<u64>,
        #[arg(long)]
        password: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    Maintain,
    Tuneup,
    Refresh,
    Unlock {
        fw_id: u64,
    },
    GetQids,
    CancelQid,
    Webgui,
    RecoverOffline,
    ForgetOffline,
    Report,
    Introspect,
}

pub fn dispatch(command: Command, launchpad: &Launchpad<SystemClock>, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        Command::Init => unreachable!("init is handled before a launchpad is opened"),
        Command::Reset { .. } => unreachable!("reset is handled before a launchpad is opened"),
        Command::Add { paths, dir } => setup::add(launchpad, paths, dir),
        Command::GetFws { query } => query::get_fws(launchpad, query, format),
        Command::GetWflows { query } => query::get_wflows(launchpad, query, format),
        Command::RerunFws { fw_ids, password, yes } => lifecycle::rerun_fws(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::DefuseFws { fw_ids, password, yes } => lifecycle::defuse_fws(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::PauseFws { fw_ids, password, yes } => lifecycle::pause_fws(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::ReigniteFws { fw_ids, password, yes } => lifecycle::reignite_fws(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::ResumeFws { fw_ids, password, yes } => lifecycle::resume_fws(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::DefuseWflows { fw_ids, defuse_all_states, password, yes } => {
            lifecycle::defuse_wflows(launchpad, fw_ids, defuse_all_states, password.as_deref(), yes, format)
        }
        Command::PauseWflows { fw_ids, password, yes } => lifecycle::pause_wflows(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::ReigniteWflows { fw_ids, password, yes } => lifecycle::reignite_wflows(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::ArchiveWflows { fw_ids, password, yes } => lifecycle::archive_wflows(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::DeleteWflows { fw_ids, password, yes } => lifecycle::delete_wflows(launchpad, fw_ids, password.as_deref(), yes, format),
        Command::DetectUnreserved { expiration_secs, rerun } => admin::detect_unreserved(launchpad, expiration_secs, rerun, format),
        Command::DetectLostruns { expiration_secs, rerun, refresh } => {
            admin::detect_lostruns(launchpad, expiration_secs, rerun, refresh, format)
        }
        Command::SetPriority { fw_ids, priority, password, yes } => {
            lifecycle::set_priority(launchpad, fw_ids, priority, password.as_deref(), yes, format)
        }
        Command::Maintain => admin::maintain(launchpad, format),
        Command::Tuneup => admin::tuneup(launchpad),
        Command::Refresh => admin::refresh(launchpad, format),
        Command::Unlock { fw_id } => admin::unlock(launchpad, fw_id),
        Command::GetQids => stub::unimplemented("get_qids"),
        Command::CancelQid => stub::unimplemented("cancel_qid"),
        Command::Webgui => stub::unimplemented("webgui"),
        Command::RecoverOffline => stub::unimplemented("recover_offline"),
        Command::ForgetOffline => stub::unimplemented("forget_offline"),
        Command::Report => stub::unimplemented("report"),
        Command::Introspect => stub::unimplemented("introspect"),
    }
}
