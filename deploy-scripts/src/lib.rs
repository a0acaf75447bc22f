//! Scripts for deploying and initializing the staking pool & funder contracts
//! behind upgradeable proxies.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod cli;
pub mod clients;
mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod sequencer;
mod solidity;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_helpers;
