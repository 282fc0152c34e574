//! Integration tests for efs-stress

mod cli_parse;
mod config_layers;
mod run_parity;
