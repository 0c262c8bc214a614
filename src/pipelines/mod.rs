mod archive;
mod build;
mod common;
mod init;
mod install;
mod maintenance;
mod print;
mod server;

pub use archive::{archive_spec, execute_archive_pipeline};
pub use build::{
    build_targets, execute_build_pipeline, execute_dll_pipeline, BuildReport, TargetOutcome,
};
pub use init::execute_init_pipeline;
pub use install::{execute_install_pipeline, execute_upgrade_pipeline};
pub use maintenance::{
    execute_clean_pipeline, execute_deploy_pipeline, execute_kill_pipeline, execute_open_pipeline,
};
pub use print::{execute_print_pipeline, lookup_node, render};
pub use server::{execute_server_pipeline, serve_targets};
